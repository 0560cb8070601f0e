//! BM25 scoring, split into its two independently-timed halves: the
//! term-frequency component (`TFS`, precomputed once at index-build
//! time and stored per posting) and the inverse-document-frequency
//! component (`IDF`, computed at load time from the size of the
//! doc-length table — never hardcoded, since the corpus size is only
//! known once the table is loaded).

#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// The term-frequency-score component of BM25, stored per posting.
pub fn compute_tfs(term_freq: u32, doc_len: u32, avg_doc_len: f32, params: Bm25Params) -> f32 {
    let tf = term_freq as f32;
    let norm = 1.0 - params.b + params.b * (doc_len as f32 / avg_doc_len);
    (tf * (params.k1 + 1.0)) / (tf + params.k1 * norm)
}

/// The inverse-document-frequency component of BM25. `n` is the number
/// of documents in the corpus (the size of the doc-length table at
/// load time); `df` is the term's document frequency.
pub fn compute_idf(n: u32, df: u32) -> f32 {
    let n = n as f32;
    let df = df as f32;
    ((n - df + 0.5) / (df + 0.5)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tfs_increases_with_term_frequency() {
        let params = Bm25Params::default();
        let low = compute_tfs(1, 100, 100.0, params);
        let high = compute_tfs(10, 100, 100.0, params);
        assert!(high > low);
    }

    #[test]
    fn tfs_penalizes_longer_documents() {
        let params = Bm25Params::default();
        let short = compute_tfs(5, 50, 100.0, params);
        let long = compute_tfs(5, 500, 100.0, params);
        assert!(short > long);
    }

    #[test]
    fn idf_is_positive_for_rare_terms() {
        let idf = compute_idf(1000, 1);
        assert!(idf > 0.0);
    }

    #[test]
    fn idf_decreases_as_document_frequency_grows() {
        let rare = compute_idf(1000, 2);
        let common = compute_idf(1000, 500);
        assert!(rare > common);
    }
}
