//! Sorted run files: the intermediate artifact between parsing and
//! merging. A run is a sequence of `(term, doc_id, tfs)` records sorted
//! ascending by `(term, doc_id)`, written once and read sequentially
//! thereafter — never seeked into or mutated in place.

pub mod reader;
pub mod writer;

pub use reader::RunReader;
pub use writer::RunWriter;

/// One record as it appears in a run file: `termLen:u16 | term bytes |
/// docID:i32 | TFS:f32`, all little-endian.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub term: String,
    pub doc_id: u32,
    pub tfs: f32,
}
