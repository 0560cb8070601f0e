//! External k-way merge, cascade phase: repeatedly merges batches of
//! `fan_in` sorted runs into fewer, larger sorted runs, until a single
//! run remains. No block encoding happens here — that's the final
//! pass's job, once there is exactly one globally sorted run to
//! partition.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::run::{RunReader, RunRecord, RunWriter};

struct Cursor {
    reader: RunReader,
    current: Option<RunRecord>,
    run_index: usize,
}

impl Cursor {
    fn open(path: &Path, run_index: usize) -> Result<Self> {
        let mut reader = RunReader::open(path)?;
        let current = reader.next()?;
        Ok(Self {
            reader,
            current,
            run_index,
        })
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.reader.next()?;
        Ok(())
    }
}

struct HeapItem {
    term: String,
    doc_id: u32,
    run_index: usize,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term && self.doc_id == other.doc_id && self.run_index == other.run_index
    }
}
impl Eq for HeapItem {}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest key first.
        (&other.term, other.doc_id, other.run_index).cmp(&(&self.term, self.doc_id, self.run_index))
    }
}
impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merges `inputs` into a single sorted run at `output_path`, keeping
/// the larger TFS when two runs hold the same `(term, doc_id)` key.
fn k_way_merge(inputs: &[PathBuf], output_path: &Path) -> Result<()> {
    let mut cursors: Vec<Cursor> = inputs
        .iter()
        .enumerate()
        .map(|(i, path)| Cursor::open(path, i))
        .collect::<Result<_>>()?;

    let mut heap = BinaryHeap::new();
    for cursor in &cursors {
        if let Some(record) = &cursor.current {
            heap.push(HeapItem {
                term: record.term.clone(),
                doc_id: record.doc_id,
                run_index: cursor.run_index,
            });
        }
    }

    let mut writer = RunWriter::create(output_path)?;
    let mut pending: Option<(String, u32, f32)> = None;

    while let Some(item) = heap.pop() {
        let cursor = &mut cursors[item.run_index];
        let record = cursor.current.take().expect("heap item without current record");
        debug_assert_eq!(record.term, item.term);
        debug_assert_eq!(record.doc_id, item.doc_id);

        match &mut pending {
            Some((term, doc_id, tfs)) if *term == record.term && *doc_id == record.doc_id => {
                if record.tfs > *tfs {
                    *tfs = record.tfs;
                }
            }
            Some((term, doc_id, tfs)) => {
                writer.write_record(term, *doc_id, *tfs)?;
                pending = Some((record.term.clone(), record.doc_id, record.tfs));
            }
            None => {
                pending = Some((record.term.clone(), record.doc_id, record.tfs));
            }
        }

        cursor.advance()?;
        if let Some(next_record) = &cursor.current {
            heap.push(HeapItem {
                term: next_record.term.clone(),
                doc_id: next_record.doc_id,
                run_index: item.run_index,
            });
        }
    }

    if let Some((term, doc_id, tfs)) = pending {
        writer.write_record(&term, doc_id, tfs)?;
    }
    writer.finish()?;
    Ok(())
}

/// Repeatedly merges batches of `fan_in` runs until a single sorted
/// run remains, returning its path.
pub fn cascade_merge(mut runs: Vec<PathBuf>, run_dir: &Path, fan_in: usize) -> Result<PathBuf> {
    assert!(fan_in >= 2, "fan_in must allow at least a 2-way merge");
    let mut next_id = 0u32;

    if runs.is_empty() {
        let path = run_dir.join("cascade_empty.bin");
        RunWriter::create(&path)?.finish()?;
        return Ok(path);
    }

    while runs.len() > 1 {
        let mut merged = Vec::new();
        for batch in runs.chunks(fan_in) {
            if batch.len() == 1 {
                merged.push(batch[0].clone());
                continue;
            }
            let output_path = run_dir.join(format!("cascade{next_id}.bin"));
            next_id += 1;
            debug!(batch_size = batch.len(), output = %output_path.display(), "cascade merging batch");
            k_way_merge(batch, &output_path)?;
            merged.push(output_path);
        }
        runs = merged;
    }

    Ok(runs.into_iter().next().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunWriter;
    use tempfile::tempdir;

    fn make_run(dir: &Path, name: &str, records: &[(&str, u32, f32)]) -> PathBuf {
        let path = dir.join(name);
        let mut writer = RunWriter::create(&path).unwrap();
        for (term, doc_id, tfs) in records {
            writer.write_record(term, *doc_id, *tfs).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn read_all(path: &Path) -> Vec<(String, u32, f32)> {
        let mut reader = RunReader::open(path).unwrap();
        let mut out = Vec::new();
        while let Some(r) = reader.next().unwrap() {
            out.push((r.term, r.doc_id, r.tfs));
        }
        out
    }

    #[test]
    fn merges_two_runs_preserving_order() {
        let dir = tempdir().unwrap();
        let a = make_run(dir.path(), "a.bin", &[("apple", 1, 0.1), ("zebra", 2, 0.2)]);
        let b = make_run(dir.path(), "b.bin", &[("banana", 1, 0.3), ("zebra", 5, 0.4)]);
        let out = dir.path().join("out.bin");
        k_way_merge(&[a, b], &out).unwrap();
        let merged = read_all(&out);
        assert_eq!(
            merged,
            vec![
                ("apple".to_string(), 1, 0.1),
                ("banana".to_string(), 1, 0.3),
                ("zebra".to_string(), 2, 0.2),
                ("zebra".to_string(), 5, 0.4),
            ]
        );
    }

    #[test]
    fn coalesces_duplicate_keys_keeping_larger_tfs() {
        let dir = tempdir().unwrap();
        let a = make_run(dir.path(), "a.bin", &[("term", 1, 0.9)]);
        let b = make_run(dir.path(), "b.bin", &[("term", 1, 0.2)]);
        let out = dir.path().join("out.bin");
        k_way_merge(&[a, b], &out).unwrap();
        let merged = read_all(&out);
        assert_eq!(merged, vec![("term".to_string(), 1, 0.9)]);
    }

    #[test]
    fn cascade_reduces_many_runs_to_one_sorted_run() {
        let dir = tempdir().unwrap();
        let runs = vec![
            make_run(dir.path(), "r0.bin", &[("a", 1, 1.0)]),
            make_run(dir.path(), "r1.bin", &[("b", 2, 1.0)]),
            make_run(dir.path(), "r2.bin", &[("c", 3, 1.0)]),
            make_run(dir.path(), "r3.bin", &[("a", 4, 2.0)]),
            make_run(dir.path(), "r4.bin", &[("d", 5, 1.0)]),
        ];
        let result = cascade_merge(runs, dir.path(), 2).unwrap();
        let merged = read_all(&result);
        let terms: Vec<&str> = merged.iter().map(|(t, _, _)| t.as_str()).collect();
        let mut sorted_terms = terms.clone();
        sorted_terms.sort();
        assert_eq!(terms, sorted_terms);
        assert_eq!(merged.len(), 5);
    }
}
