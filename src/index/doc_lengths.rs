//! `doc_lengths.bin`: one `docID:i32 | docLength:i32` record per
//! document. Loaded once at query time; its row count is the
//! canonical `N` fed into IDF — never a hardcoded corpus size.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::posting::DocumentMetadata;

pub fn write_doc_lengths(path: impl AsRef<Path>, docs: &[DocumentMetadata]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    for doc in docs {
        out.write_all(&(doc.doc_id as i32).to_le_bytes())?;
        out.write_all(&(doc.length as i32).to_le_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// The doc-length table, indexed by `doc_id`. Its length is the
/// canonical corpus size `N` used for IDF at load time.
pub struct DocLengths {
    by_doc_id: Vec<(u32, u32)>,
}

impl DocLengths {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut input = BufReader::new(file);
        let mut by_doc_id = Vec::new();
        loop {
            let mut doc_id_buf = [0u8; 4];
            match input.read_exact(&mut doc_id_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let mut len_buf = [0u8; 4];
            input.read_exact(&mut len_buf)?;
            by_doc_id.push((
                i32::from_le_bytes(doc_id_buf) as u32,
                i32::from_le_bytes(len_buf) as u32,
            ));
        }
        Ok(Self { by_doc_id })
    }

    /// The number of documents in the corpus — canonical `N` for IDF.
    pub fn corpus_size(&self) -> u32 {
        self.by_doc_id.len() as u32
    }

    pub fn length_of(&self, doc_id: u32) -> Option<u32> {
        self.by_doc_id
            .iter()
            .find(|(id, _)| *id == doc_id)
            .map(|(_, len)| *len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn corpus_size_matches_row_count() {
        let docs = vec![
            DocumentMetadata { doc_id: 1, name: "a".into(), length: 5 },
            DocumentMetadata { doc_id: 2, name: "b".into(), length: 15 },
            DocumentMetadata { doc_id: 3, name: "c".into(), length: 10 },
        ];
        let file = NamedTempFile::new().unwrap();
        write_doc_lengths(file.path(), &docs).unwrap();
        let loaded = DocLengths::load(file.path()).unwrap();
        assert_eq!(loaded.corpus_size(), 3);
        assert_eq!(loaded.length_of(2), Some(15));
    }
}
