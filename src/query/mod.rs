pub mod evaluator;

pub use evaluator::{evaluate, Mode, ScoredDoc};
