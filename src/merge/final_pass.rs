//! Final merge pass: takes the single globally-sorted run left over
//! from the cascade phase and splits it into the on-disk index.
//!
//! The term-key-space is cut into 27 lexicographic partitions — one
//! for terms whose leading byte sorts below `'a'` (digit-leading
//! tokens), and one per letter `'a'..='z'`, the last of which is the
//! trailing partition the original design calls out. Partitions are
//! disjoint in key space and each is handled by its own thread-pool
//! task: every task opens an independent reader on the single sorted
//! run, uses `jump_to` to skip straight to its partition's first term
//! without reading anything before it, and block-encodes postings into
//! its own shard file as they stream past — no term is ever buffered
//! whole in memory, and no two tasks touch the same shard.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use tracing::info;

use crate::error::Result;
use crate::index::block::split_into_blocks;
use crate::merge::lexicon::{write_lexicon, LexiconEntry};
use crate::posting::Posting;
use crate::run::RunReader;
use crate::threadpool::ThreadPool;

const PARTITION_COUNT: usize = 27;

fn partition_of(term: &str) -> usize {
    match term.as_bytes().first() {
        Some(&b) if b < b'a' => 0,
        Some(&b) if b > b'z' => PARTITION_COUNT - 1,
        Some(&b) => 1 + (b - b'a') as usize,
        None => 0,
    }
}

fn partition_label(partition: usize) -> String {
    if partition == 0 {
        "_".to_string()
    } else {
        ((b'a' + (partition - 1) as u8) as char).to_string()
    }
}

/// The lexicographically smallest term that can fall into `partition`.
fn partition_start(partition: usize) -> String {
    if partition == 0 {
        String::new()
    } else {
        ((b'a' + (partition - 1) as u8) as char).to_string()
    }
}

struct PendingTerm {
    term: String,
    postings: Vec<Posting>,
}

/// Writes one term's block-encoded postings into the open partition
/// shard, returning the local (shard-relative) lexicon entry.
fn write_term_blocks(out: &mut BufWriter<File>, term_start_offset: i64, postings: &[Posting]) -> Result<LexiconEntry> {
    let blocks = split_into_blocks(postings);
    let mut block_max_doc_ids = Vec::with_capacity(blocks.len());
    let mut block_offsets = Vec::with_capacity(blocks.len());
    let mut block_compressed_doc_id_lengths = Vec::with_capacity(blocks.len());
    let mut block_doc_counts = Vec::with_capacity(blocks.len());

    let mut cursor = term_start_offset;
    for block in &blocks {
        block_max_doc_ids.push(block.max_doc_id as i32);
        block_offsets.push(cursor);
        block_compressed_doc_id_lengths.push(block.doc_ids_bytes.len() as u64);
        block_doc_counts.push(block.doc_count as i32);

        out.write_all(&block.doc_ids_bytes)?;
        for tfs in &block.tfs {
            out.write_all(&tfs.to_le_bytes())?;
        }
        let block_len = block.doc_ids_bytes.len() as i64 + block.tfs.len() as i64 * 4;
        cursor += block_len;
    }

    let length = (cursor - term_start_offset) as i32;
    Ok(LexiconEntry {
        offset: term_start_offset,
        length,
        doc_frequency: postings.len() as i32,
        block_count: blocks.len() as i32,
        block_max_doc_ids,
        block_offsets,
        block_compressed_doc_id_lengths,
        block_doc_counts,
    })
}

struct PartitionOutput {
    partition: usize,
    shard_path: PathBuf,
    entries: Vec<(String, LexiconEntry)>,
}

/// Processes one lexicographic partition: opens its own reader on the
/// shared sorted run, jumps straight to the partition's first term,
/// and block-encodes every term in range into a dedicated shard file.
/// Returns `None` if no term in the run falls into this partition.
fn process_partition(sorted_run: &Path, index_dir: &Path, partition: usize) -> Result<Option<PartitionOutput>> {
    let mut reader = RunReader::open(sorted_run)?;
    let start = partition_start(partition);
    let Some(first) = reader.jump_to(&start)? else {
        return Ok(None);
    };
    if partition_of(&first.term) != partition {
        return Ok(None);
    }

    let label = partition_label(partition);
    let shard_path = index_dir.join(format!("index_{label}.bin"));
    let mut writer = BufWriter::new(File::create(&shard_path)?);
    let mut offset: i64 = 0;
    let mut entries: Vec<(String, LexiconEntry)> = Vec::new();

    let mut pending = PendingTerm {
        term: first.term,
        postings: vec![Posting { doc_id: first.doc_id, tfs: first.tfs }],
    };

    loop {
        match reader.next()? {
            Some(record) if record.term == pending.term => {
                pending.postings.push(Posting { doc_id: record.doc_id, tfs: record.tfs });
            }
            Some(record) if partition_of(&record.term) == partition => {
                let entry = write_term_blocks(&mut writer, offset, &pending.postings)?;
                offset += entry.length as i64;
                entries.push((pending.term, entry));
                pending = PendingTerm {
                    term: record.term,
                    postings: vec![Posting { doc_id: record.doc_id, tfs: record.tfs }],
                };
            }
            _ => {
                // either EOF or the next term belongs to a later partition.
                let entry = write_term_blocks(&mut writer, offset, &pending.postings)?;
                entries.push((pending.term, entry));
                break;
            }
        }
    }

    writer.flush()?;
    Ok(Some(PartitionOutput { partition, shard_path, entries }))
}

/// Runs the final pass, writing per-partition shards, the concatenated
/// `index.bin`, and `lexicon.bin` under `index_dir`. Returns the paths
/// to `index.bin` and `lexicon.bin`.
///
/// One thread-pool task per partition does the block-encoding; this
/// function itself only concatenates the finished shards (pure I/O,
/// no decoding) and rebases their lexicon offsets, once every task has
/// completed.
pub fn final_pass(sorted_run: &Path, index_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(index_dir)?;

    let worker_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(PARTITION_COUNT);
    let pool = ThreadPool::new(worker_count.max(1), PARTITION_COUNT);
    let (tx, rx) = mpsc::channel::<(usize, Result<Option<PartitionOutput>>)>();

    let sorted_run = sorted_run.to_path_buf();
    let index_dir_owned = index_dir.to_path_buf();
    for partition in 0..PARTITION_COUNT {
        let sorted_run = sorted_run.clone();
        let index_dir = index_dir_owned.clone();
        let tx = tx.clone();
        pool.enqueue(move || {
            let result = process_partition(&sorted_run, &index_dir, partition);
            let _ = tx.send((partition, result));
        });
    }
    drop(tx);
    pool.wait_all();

    let mut outputs: Vec<Option<PartitionOutput>> = (0..PARTITION_COUNT).map(|_| None).collect();
    for (partition, result) in rx.try_iter() {
        outputs[partition] = result?;
    }

    // Concatenate shards in partition order into index.bin, rebasing offsets.
    let index_path = index_dir.join("index.bin");
    let mut index_out = BufWriter::new(File::create(&index_path)?);
    let mut cumulative: i64 = 0;
    let mut rebased_entries: Vec<(String, LexiconEntry)> = Vec::new();
    let mut shard_count = 0usize;

    for output in outputs.into_iter().flatten() {
        shard_count += 1;
        let mut shard = BufReader::new(File::open(&output.shard_path)?);
        let mut buf = Vec::new();
        shard.read_to_end(&mut buf)?;
        index_out.write_all(&buf)?;

        let base = cumulative;
        for (term, mut entry) in output.entries {
            entry.offset += base;
            for off in &mut entry.block_offsets {
                *off += base;
            }
            rebased_entries.push((term, entry));
        }
        cumulative += buf.len() as i64;
    }
    index_out.flush()?;

    let lexicon_path = index_dir.join("lexicon.bin");
    write_lexicon(&lexicon_path, &rebased_entries)?;

    info!(
        terms = rebased_entries.len(),
        shards = shard_count,
        "final pass complete"
    );

    Ok((index_path, lexicon_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::lexicon::read_lexicon;
    use crate::run::RunWriter;
    use tempfile::tempdir;

    #[test]
    fn partitions_cover_full_alphabet_and_digits() {
        assert_eq!(partition_of("123abc"), 0);
        assert_eq!(partition_of("apple"), 1);
        assert_eq!(partition_of("zebra"), 26);
    }

    #[test]
    fn builds_index_and_lexicon_for_a_small_vocabulary() {
        let dir = tempdir().unwrap();
        let run_path = dir.path().join("sorted.bin");
        {
            let mut writer = RunWriter::create(&run_path).unwrap();
            writer.write_record("apple", 1, 0.5).unwrap();
            writer.write_record("apple", 2, 0.7).unwrap();
            writer.write_record("banana", 1, 0.3).unwrap();
            writer.write_record("zebra", 9, 1.0).unwrap();
            writer.finish().unwrap();
        }

        let index_dir = dir.path().join("index");
        let (index_path, lexicon_path) = final_pass(&run_path, &index_dir).unwrap();
        assert!(index_path.exists());
        assert!(lexicon_path.exists());

        let lexicon = read_lexicon(&lexicon_path).unwrap();
        let apple = lexicon.get("apple").unwrap();
        assert_eq!(apple.doc_frequency, 2);
        assert_eq!(apple.block_count, 1);
        assert_eq!(apple.block_max_doc_ids, vec![2]);

        let zebra = lexicon.get("zebra").unwrap();
        assert_eq!(zebra.doc_frequency, 1);

        // apple's block lives before banana's and zebra's in index.bin.
        let banana = lexicon.get("banana").unwrap();
        assert!(apple.offset < banana.offset);
    }

    #[test]
    fn handles_a_term_per_partition_boundary() {
        // one term in the digit-leading partition, one in 'a', one in 'z'.
        let dir = tempdir().unwrap();
        let run_path = dir.path().join("sorted.bin");
        {
            let mut writer = RunWriter::create(&run_path).unwrap();
            writer.write_record("2fast", 1, 1.0).unwrap();
            writer.write_record("apple", 2, 1.0).unwrap();
            writer.write_record("zebra", 3, 1.0).unwrap();
            writer.finish().unwrap();
        }
        let index_dir = dir.path().join("index");
        let (_index_path, lexicon_path) = final_pass(&run_path, &index_dir).unwrap();
        let lexicon = read_lexicon(&lexicon_path).unwrap();
        assert_eq!(lexicon.len(), 3);
        assert!(lexicon.contains_key("2fast"));
        assert!(lexicon.contains_key("apple"));
        assert!(lexicon.contains_key("zebra"));
    }
}
