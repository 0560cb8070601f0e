//! Block encoding: a fixed-cardinality run of postings for one term.
//!
//! Doc IDs are varbyte-encoded, the first absolute and the rest as
//! gaps *within the block only* — gaps never carry across a block
//! boundary, so any block can be decoded independently once its
//! compressed-doc-ID byte range is known. TFS values are written as a
//! trailing dense `f32` array, not interleaved with doc IDs, so a
//! cursor can scan scores without touching the doc-ID bytes.

use crate::error::{Error, Result};
use crate::posting::Posting;
use crate::varbyte;

/// Target number of postings per block. The final block for a term may
/// hold fewer.
pub const BLOCK_SIZE: usize = 128;

pub struct EncodedBlock {
    pub doc_ids_bytes: Vec<u8>,
    pub tfs: Vec<f32>,
    pub max_doc_id: u32,
    pub doc_count: u32,
}

/// Encodes one block's worth of postings (already sorted ascending by
/// `doc_id`, deduplicated by the caller).
pub fn encode_block(postings: &[Posting]) -> EncodedBlock {
    debug_assert!(!postings.is_empty());
    let mut doc_ids_bytes = Vec::with_capacity(postings.len() * 2);
    let mut tfs = Vec::with_capacity(postings.len());
    let mut prev = 0u32;
    for (i, posting) in postings.iter().enumerate() {
        if i == 0 {
            varbyte::encode(posting.doc_id, &mut doc_ids_bytes);
        } else {
            varbyte::encode(posting.doc_id - prev, &mut doc_ids_bytes);
        }
        prev = posting.doc_id;
        tfs.push(posting.tfs);
    }
    EncodedBlock {
        doc_ids_bytes,
        tfs,
        max_doc_id: prev,
        doc_count: postings.len() as u32,
    }
}

/// Decodes a block back into parallel `(doc_ids, tfs)` vectors.
/// `tfs_bytes` must hold exactly `doc_count * 4` bytes.
pub fn decode_block(doc_ids_bytes: &[u8], doc_count: u32, tfs_bytes: &[u8]) -> Result<(Vec<u32>, Vec<f32>)> {
    let expected_tfs_len = doc_count as usize * 4;
    if tfs_bytes.len() != expected_tfs_len {
        return Err(Error::Truncated {
            needed: expected_tfs_len,
            available: tfs_bytes.len(),
        });
    }

    let mut doc_ids = Vec::with_capacity(doc_count as usize);
    let mut pos = 0usize;
    let mut prev = 0u32;
    for i in 0..doc_count {
        let value = varbyte::decode_one(doc_ids_bytes, &mut pos)?;
        let doc_id = if i == 0 { value } else { prev + value };
        doc_ids.push(doc_id);
        prev = doc_id;
    }

    let mut tfs = Vec::with_capacity(doc_count as usize);
    for chunk in tfs_bytes.chunks_exact(4) {
        let bytes: [u8; 4] = chunk.try_into().unwrap();
        tfs.push(f32::from_le_bytes(bytes));
    }

    Ok((doc_ids, tfs))
}

/// Splits a full, sorted posting list for a term into fixed-cardinality
/// blocks.
pub fn split_into_blocks(postings: &[Posting]) -> Vec<EncodedBlock> {
    postings
        .chunks(BLOCK_SIZE)
        .map(encode_block)
        .collect()
}
