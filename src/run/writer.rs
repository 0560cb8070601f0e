use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Buffered sequential writer for a sorted run file. Callers are
/// responsible for presenting records in `(term, doc_id)` order; the
/// writer does not sort or buffer more than one record at a time.
pub struct RunWriter {
    out: BufWriter<File>,
}

impl RunWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::with_capacity(1 << 20, file),
        })
    }

    pub fn write_record(&mut self, term: &str, doc_id: u32, tfs: f32) -> Result<()> {
        let term_bytes = term.as_bytes();
        self.out.write_all(&(term_bytes.len() as u16).to_le_bytes())?;
        self.out.write_all(term_bytes)?;
        self.out.write_all(&(doc_id as i32).to_le_bytes())?;
        self.out.write_all(&tfs.to_le_bytes())?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunReader;
    use tempfile::NamedTempFile;

    #[test]
    fn writes_and_reads_back_records_in_order() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = RunWriter::create(file.path()).unwrap();
        writer.write_record("alpha", 1, 0.5).unwrap();
        writer.write_record("alpha", 3, 0.25).unwrap();
        writer.write_record("beta", 2, 1.0).unwrap();
        writer.finish().unwrap();

        let mut reader = RunReader::open(file.path()).unwrap();
        let r1 = reader.next().unwrap().unwrap();
        assert_eq!(r1.term, "alpha");
        assert_eq!(r1.doc_id, 1);
        assert_eq!(r1.tfs, 0.5);

        let r2 = reader.next().unwrap().unwrap();
        assert_eq!(r2.term, "alpha");
        assert_eq!(r2.doc_id, 3);

        let r3 = reader.next().unwrap().unwrap();
        assert_eq!(r3.term, "beta");
        assert_eq!(r3.doc_id, 2);

        assert!(reader.next().unwrap().is_none());
    }
}
