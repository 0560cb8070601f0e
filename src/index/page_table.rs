//! `page_table.bin`: maps doc IDs back to document names for result
//! display. Record layout: `docID:i32 | nameLen:u16 | name bytes`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Result;
use crate::posting::DocumentMetadata;

pub fn write_page_table(path: impl AsRef<Path>, docs: &[DocumentMetadata]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    for doc in docs {
        out.write_all(&(doc.doc_id as i32).to_le_bytes())?;
        let name_bytes = doc.name.as_bytes();
        out.write_all(&(name_bytes.len() as u16).to_le_bytes())?;
        out.write_all(name_bytes)?;
    }
    out.flush()?;
    Ok(())
}

pub fn read_page_table(path: impl AsRef<Path>) -> Result<HashMap<u32, String>> {
    let file = File::open(path)?;
    let mut input = BufReader::new(file);
    let mut map = HashMap::new();

    loop {
        let mut doc_id_buf = [0u8; 4];
        match input.read_exact(&mut doc_id_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let doc_id = i32::from_le_bytes(doc_id_buf) as u32;

        let mut len_buf = [0u8; 2];
        input.read_exact(&mut len_buf)?;
        let name_len = u16::from_le_bytes(len_buf) as usize;

        let mut name_buf = vec![0u8; name_len];
        input.read_exact(&mut name_buf)?;
        let name = String::from_utf8_lossy(&name_buf).into_owned();

        map.insert(doc_id, name);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn round_trips_document_names() {
        let docs = vec![
            DocumentMetadata { doc_id: 1, name: "alpha.txt".into(), length: 10 },
            DocumentMetadata { doc_id: 2, name: "beta.txt".into(), length: 20 },
        ];
        let file = NamedTempFile::new().unwrap();
        write_page_table(file.path(), &docs).unwrap();
        let loaded = read_page_table(file.path()).unwrap();
        assert_eq!(loaded.get(&1).unwrap(), "alpha.txt");
        assert_eq!(loaded.get(&2).unwrap(), "beta.txt");
    }
}
