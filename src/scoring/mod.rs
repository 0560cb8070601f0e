pub mod bm25;

pub use bm25::{Bm25Params, compute_idf, compute_tfs};
