use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::Result;
use crate::run::RunRecord;

/// Buffered sequential reader for a sorted run file, used both by the
/// cascade merge and the final partitioning pass. Holds its own file
/// handle — cursors are never shared across threads, each merge worker
/// opens the runs it owns.
pub struct RunReader {
    input: BufReader<File>,
}

impl RunReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            input: BufReader::with_capacity(1 << 20, file),
        })
    }

    /// Reads the next record, or `None` at end of file.
    pub fn next(&mut self) -> Result<Option<RunRecord>> {
        let mut len_buf = [0u8; 2];
        match self.input.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let term_len = u16::from_le_bytes(len_buf) as usize;

        let mut term_buf = vec![0u8; term_len];
        self.input.read_exact(&mut term_buf)?;
        let term = String::from_utf8_lossy(&term_buf).into_owned();

        let mut doc_id_buf = [0u8; 4];
        self.input.read_exact(&mut doc_id_buf)?;
        let doc_id = i32::from_le_bytes(doc_id_buf) as u32;

        let mut tfs_buf = [0u8; 4];
        self.input.read_exact(&mut tfs_buf)?;
        let tfs = f32::from_le_bytes(tfs_buf);

        Ok(Some(RunRecord { term, doc_id, tfs }))
    }

    /// Advances past records whose term sorts before `min_term`,
    /// returning the first record whose term is `>= min_term` (or
    /// `None` at EOF). Used to position a fresh reader at the start of
    /// a lexicographic partition without re-reading from elsewhere.
    pub fn jump_to(&mut self, min_term: &str) -> Result<Option<RunRecord>> {
        loop {
            match self.next()? {
                Some(record) if record.term.as_str() >= min_term => return Ok(Some(record)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunWriter;
    use tempfile::NamedTempFile;

    #[test]
    fn jump_to_skips_terms_before_the_target() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = RunWriter::create(file.path()).unwrap();
        writer.write_record("apple", 1, 0.1).unwrap();
        writer.write_record("banana", 2, 0.2).unwrap();
        writer.write_record("cherry", 3, 0.3).unwrap();
        writer.finish().unwrap();

        let mut reader = RunReader::open(file.path()).unwrap();
        let found = reader.jump_to("banana").unwrap().unwrap();
        assert_eq!(found.term, "banana");
        let next = reader.next().unwrap().unwrap();
        assert_eq!(next.term, "cherry");
    }

    #[test]
    fn jump_to_past_every_term_returns_none() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = RunWriter::create(file.path()).unwrap();
        writer.write_record("apple", 1, 0.1).unwrap();
        writer.finish().unwrap();

        let mut reader = RunReader::open(file.path()).unwrap();
        assert!(reader.jump_to("zebra").unwrap().is_none());
    }
}
