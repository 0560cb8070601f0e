//! Inverted-list cursor: walks one term's postings in `index.bin`,
//! decoding one block at a time and skipping whole blocks via the
//! lexicon's `blockMaxDocIDs` when the caller asks for `next_geq`.
//!
//! Each cursor owns its own file handle, opened independently of any
//! other cursor — no handle is ever shared or mutated from more than
//! one thread, so cursors for different terms in the same query can
//! run concurrently without synchronization.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;
use crate::index::block::decode_block;
use crate::merge::lexicon::LexiconEntry;

pub struct Cursor {
    file: File,
    entry: LexiconEntry,
    idf: f32,
    block_index: usize,
    doc_ids: Vec<u32>,
    tfs: Vec<f32>,
    pos: usize,
    exhausted: bool,
}

impl Cursor {
    pub fn open(index_path: &Path, entry: LexiconEntry, idf: f32) -> Result<Self> {
        let file = File::open(index_path)?;
        let mut cursor = Self {
            file,
            entry,
            idf,
            block_index: 0,
            doc_ids: Vec::new(),
            tfs: Vec::new(),
            pos: 0,
            exhausted: false,
        };
        cursor.load_block(0)?;
        Ok(cursor)
    }

    fn load_block(&mut self, block_index: usize) -> Result<()> {
        if block_index >= self.entry.block_count as usize {
            self.exhausted = true;
            self.doc_ids.clear();
            self.tfs.clear();
            return Ok(());
        }
        let offset = self.entry.block_offsets[block_index];
        let doc_ids_len = self.entry.block_compressed_doc_id_lengths[block_index] as usize;
        let doc_count = self.entry.block_doc_counts[block_index] as u32;

        self.file.seek(SeekFrom::Start(offset as u64))?;
        let mut doc_ids_bytes = vec![0u8; doc_ids_len];
        self.file.read_exact(&mut doc_ids_bytes)?;
        let mut tfs_bytes = vec![0u8; doc_count as usize * 4];
        self.file.read_exact(&mut tfs_bytes)?;

        let (doc_ids, tfs) = decode_block(&doc_ids_bytes, doc_count, &tfs_bytes)?;
        self.doc_ids = doc_ids;
        self.tfs = tfs;
        self.block_index = block_index;
        self.pos = 0;
        self.exhausted = false;
        Ok(())
    }

    pub fn doc_id(&self) -> Option<u32> {
        if self.exhausted {
            None
        } else {
            self.doc_ids.get(self.pos).copied()
        }
    }

    /// BM25 score at the current position: precomputed TFS times the
    /// IDF supplied when this cursor was opened.
    pub fn score(&self) -> Option<f32> {
        if self.exhausted {
            None
        } else {
            self.tfs.get(self.pos).map(|tfs| tfs * self.idf)
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Advances one posting, possibly loading the next block.
    pub fn next(&mut self) -> Result<Option<u32>> {
        if self.exhausted {
            return Ok(None);
        }
        self.pos += 1;
        if self.pos >= self.doc_ids.len() {
            self.load_block(self.block_index + 1)?;
        }
        Ok(self.doc_id())
    }

    /// Advances to the first posting with `doc_id >= target`, skipping
    /// whole blocks whose max doc ID is still below `target`.
    pub fn next_geq(&mut self, target: u32) -> Result<Option<u32>> {
        if self.exhausted {
            return Ok(None);
        }
        if let Some(current) = self.doc_id() {
            if current >= target {
                return Ok(Some(current));
            }
        }

        let mut block = self.block_index;
        while block < self.entry.block_count as usize
            && self.entry.block_max_doc_ids[block] < target as i32
        {
            block += 1;
        }
        if block >= self.entry.block_count as usize {
            self.exhausted = true;
            return Ok(None);
        }
        if block != self.block_index {
            self.load_block(block)?;
        }

        while let Some(doc_id) = self.doc_id() {
            if doc_id >= target {
                return Ok(Some(doc_id));
            }
            self.next()?;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::final_pass::final_pass;
    use crate::run::RunWriter;
    use crate::scoring::compute_idf;
    use tempfile::tempdir;

    fn build_term_with_n_postings(n: u32) -> (tempfile::TempDir, std::path::PathBuf, LexiconEntry) {
        let dir = tempdir().unwrap();
        let run_path = dir.path().join("sorted.bin");
        {
            let mut writer = RunWriter::create(&run_path).unwrap();
            for doc_id in 1..=n {
                writer.write_record("widget", doc_id, 1.0).unwrap();
            }
            writer.finish().unwrap();
        }
        let index_dir = dir.path().join("index");
        let (index_path, lexicon_path) = final_pass(&run_path, &index_dir).unwrap();
        let lexicon = crate::merge::lexicon::read_lexicon(&lexicon_path).unwrap();
        let entry = lexicon.get("widget").unwrap().clone();
        (dir, index_path, entry)
    }

    #[test]
    fn walks_every_posting_in_order() {
        let (_dir, index_path, entry) = build_term_with_n_postings(300);
        let idf = compute_idf(1000, entry.doc_frequency as u32);
        let mut cursor = Cursor::open(&index_path, entry, idf).unwrap();
        let mut count = 0;
        let mut last = 0;
        while let Some(doc_id) = cursor.doc_id() {
            assert!(doc_id > last || count == 0);
            last = doc_id;
            count += 1;
            cursor.next().unwrap();
        }
        assert_eq!(count, 300);
    }

    #[test]
    fn next_geq_skips_whole_blocks() {
        let (_dir, index_path, entry) = build_term_with_n_postings(1000);
        let idf = compute_idf(1000, entry.doc_frequency as u32);
        let mut cursor = Cursor::open(&index_path, entry, idf).unwrap();
        let found = cursor.next_geq(500).unwrap();
        assert_eq!(found, Some(500));
    }

    #[test]
    fn next_geq_past_end_exhausts_cursor() {
        let (_dir, index_path, entry) = build_term_with_n_postings(10);
        let idf = compute_idf(1000, entry.doc_frequency as u32);
        let mut cursor = Cursor::open(&index_path, entry, idf).unwrap();
        let found = cursor.next_geq(999).unwrap();
        assert_eq!(found, None);
        assert!(cursor.is_exhausted());
    }
}
