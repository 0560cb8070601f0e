//! The lexicon: one entry per term, giving the byte range of its
//! block-encoded postings in `index.bin` plus per-block skip metadata
//! so a cursor can seek straight to the block containing a target doc
//! ID without decoding the ones before it.
//!
//! Superset of the original `LexiconEntry` (`offset`, `length`,
//! `docFrequency`, `blockCount`, `blockMaxDocIDs`, `blockOffsets`):
//! this also stores each block's compressed-doc-ID byte length and doc
//! count, so a block can be decoded without scanning neighboring
//! blocks to find its boundaries. `IDF` is deliberately absent —
//! computed at load time from the doc-length table, never stored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct LexiconEntry {
    pub offset: i64,
    pub length: i32,
    pub doc_frequency: i32,
    pub block_count: i32,
    pub block_max_doc_ids: Vec<i32>,
    pub block_offsets: Vec<i64>,
    pub block_compressed_doc_id_lengths: Vec<u64>,
    pub block_doc_counts: Vec<i32>,
}

pub fn write_lexicon(path: impl AsRef<Path>, entries: &[(String, LexiconEntry)]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    for (term, entry) in entries {
        let term_bytes = term.as_bytes();
        out.write_all(&(term_bytes.len() as u16).to_le_bytes())?;
        out.write_all(term_bytes)?;
        out.write_all(&entry.offset.to_le_bytes())?;
        out.write_all(&entry.length.to_le_bytes())?;
        out.write_all(&entry.doc_frequency.to_le_bytes())?;
        out.write_all(&entry.block_count.to_le_bytes())?;
        for v in &entry.block_max_doc_ids {
            out.write_all(&v.to_le_bytes())?;
        }
        for v in &entry.block_offsets {
            out.write_all(&v.to_le_bytes())?;
        }
        for v in &entry.block_compressed_doc_id_lengths {
            out.write_all(&v.to_le_bytes())?;
        }
        for v in &entry.block_doc_counts {
            out.write_all(&v.to_le_bytes())?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn read_lexicon(path: impl AsRef<Path>) -> Result<HashMap<String, LexiconEntry>> {
    let file = File::open(path)?;
    let mut input = BufReader::new(file);
    let mut map = HashMap::new();

    loop {
        let mut len_buf = [0u8; 2];
        match input.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let term_len = u16::from_le_bytes(len_buf) as usize;
        let mut term_buf = vec![0u8; term_len];
        input.read_exact(&mut term_buf)?;
        let term = String::from_utf8_lossy(&term_buf).into_owned();

        let offset = read_i64(&mut input)?;
        let length = read_i32(&mut input)?;
        let doc_frequency = read_i32(&mut input)?;
        let block_count = read_i32(&mut input)?;

        let mut block_max_doc_ids = Vec::with_capacity(block_count as usize);
        for _ in 0..block_count {
            block_max_doc_ids.push(read_i32(&mut input)?);
        }
        let mut block_offsets = Vec::with_capacity(block_count as usize);
        for _ in 0..block_count {
            block_offsets.push(read_i64(&mut input)?);
        }
        let mut block_compressed_doc_id_lengths = Vec::with_capacity(block_count as usize);
        for _ in 0..block_count {
            block_compressed_doc_id_lengths.push(read_u64(&mut input)?);
        }
        let mut block_doc_counts = Vec::with_capacity(block_count as usize);
        for _ in 0..block_count {
            block_doc_counts.push(read_i32(&mut input)?);
        }

        let entry = LexiconEntry {
            offset,
            length,
            doc_frequency,
            block_count,
            block_max_doc_ids,
            block_offsets,
            block_doc_counts,
            block_compressed_doc_id_lengths,
        };
        check_invariants(&term, &entry)?;
        map.insert(term, entry);
    }

    Ok(map)
}

/// Validates the block-level invariants a well-formed lexicon entry
/// must satisfy (§3): block doc counts sum to the term's document
/// frequency, block offsets strictly increase starting at the term's
/// own offset, and block max doc IDs strictly increase (postings are
/// sorted ascending, so later blocks hold strictly larger doc IDs).
fn check_invariants(term: &str, entry: &LexiconEntry) -> Result<()> {
    let block_count = entry.block_count as usize;
    if entry.block_max_doc_ids.len() != block_count
        || entry.block_offsets.len() != block_count
        || entry.block_compressed_doc_id_lengths.len() != block_count
        || entry.block_doc_counts.len() != block_count
    {
        return Err(crate::error::Error::InvariantViolation(format!(
            "term {term:?}: block metadata length mismatch against block_count {block_count}"
        )));
    }

    let total_docs: i64 = entry.block_doc_counts.iter().map(|&c| c as i64).sum();
    if total_docs != entry.doc_frequency as i64 {
        return Err(crate::error::Error::InvariantViolation(format!(
            "term {term:?}: sum of block_doc_counts ({total_docs}) != doc_frequency ({})",
            entry.doc_frequency
        )));
    }

    if let Some(&first) = entry.block_offsets.first() {
        if first != entry.offset {
            return Err(crate::error::Error::InvariantViolation(format!(
                "term {term:?}: first block_offset ({first}) != entry offset ({})",
                entry.offset
            )));
        }
    }
    for i in 0..block_count.saturating_sub(1) {
        let expected_gap = entry.block_compressed_doc_id_lengths[i] as i64 + entry.block_doc_counts[i] as i64 * 4;
        let actual_gap = entry.block_offsets[i + 1] - entry.block_offsets[i];
        if actual_gap != expected_gap {
            return Err(crate::error::Error::InvariantViolation(format!(
                "term {term:?}: block {i} offset gap ({actual_gap}) != compressed doc IDs + TFS array ({expected_gap})"
            )));
        }
    }
    for window in entry.block_max_doc_ids.windows(2) {
        if window[1] <= window[0] {
            return Err(crate::error::Error::InvariantViolation(format!(
                "term {term:?}: block_max_doc_ids not strictly increasing ({} then {})",
                window[0], window[1]
            )));
        }
    }

    Ok(())
}

fn read_i32(r: &mut impl Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64(r: &mut impl Read) -> Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
