//! Core data-model types shared across the parsing, merging and query
//! stages: postings (no position lists — this engine is append-only
//! and document-at-a-time, never phrase-aware) and document metadata.

/// One occurrence of a term in a document, reduced to the BM25
/// term-frequency-score component. The IDF half of BM25 is never
/// stored here: it depends on the corpus size at load time, not on
/// anything known while a posting is being built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc_id: u32,
    pub tfs: f32,
}

/// Metadata about one indexed document, keyed by `doc_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub doc_id: u32,
    pub name: String,
    pub length: u32,
}
