//! Partial-index generation: tokenizes input documents and writes
//! sorted runs of `(term, doc_id, tfs)` records, in the style of the
//! original `Spmi::single_pass_in_memory_indexing` — an in-memory
//! buffer accumulates postings until a size threshold, then spills to
//! a new run file sorted by term.
//!
//! TFS needs the corpus's average document length, so this runs as two
//! passes over the input: the first computes per-document lengths
//! (cheap, no term counting), the second tokenizes each document with
//! that average already known and feeds `(term, doc_id, tfs)` records
//! into the buffer. Tokenization for the second pass is fanned out
//! across the thread pool, one task per document; a dedicated consumer
//! thread drains results into the `RunBuffer` concurrently with
//! production, over a bounded channel, so the spill threshold actually
//! caps how many postings sit unwritten in memory at once — the
//! producer side blocks on `send` once the consumer falls behind,
//! exactly the backpressure `ThreadPool::enqueue` already provides on
//! the task-submission side.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use crate::error::Result;
use crate::parser::tokenizer::tokenize;
use crate::posting::{DocumentMetadata, Posting};
use crate::run::RunWriter;
use crate::scoring::{compute_tfs, Bm25Params};
use crate::threadpool::ThreadPool;

/// Each input line is `<document name>\t<document text>`.
fn split_line(line: &str) -> Option<(&str, &str)> {
    line.split_once('\t')
}

/// First pass: assign doc IDs and measure document lengths without
/// materializing term counts.
fn scan_document_lengths(input_path: &Path) -> Result<Vec<DocumentMetadata>> {
    let file = File::open(input_path)?;
    let reader = BufReader::new(file);
    let mut docs = Vec::new();
    let mut next_doc_id = 0u32;
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let Some((name, text)) = split_line(&line) else {
            continue;
        };
        let length = tokenize(text).len() as u32;
        docs.push(DocumentMetadata {
            doc_id: next_doc_id,
            name: name.to_string(),
            length,
        });
        next_doc_id += 1;
    }
    Ok(docs)
}

struct RunBuffer {
    terms: BTreeMap<String, Vec<Posting>>,
    posting_count: usize,
    max_postings: usize,
    run_dir: PathBuf,
    next_run_id: u32,
    runs: Vec<PathBuf>,
}

impl RunBuffer {
    fn new(run_dir: PathBuf, max_postings: usize) -> Self {
        Self {
            terms: BTreeMap::new(),
            posting_count: 0,
            max_postings,
            run_dir,
            next_run_id: 0,
            runs: Vec::new(),
        }
    }

    fn add(&mut self, term: String, doc_id: u32, tfs: f32) -> Result<()> {
        self.terms.entry(term).or_default().push(Posting { doc_id, tfs });
        self.posting_count += 1;
        if self.posting_count >= self.max_postings {
            self.spill()?;
        }
        Ok(())
    }

    fn spill(&mut self) -> Result<()> {
        if self.terms.is_empty() {
            return Ok(());
        }
        let path = self.run_dir.join(format!("temp{}.bin", self.next_run_id));
        self.next_run_id += 1;
        debug!(path = %path.display(), postings = self.posting_count, "spilling run");
        let mut writer = RunWriter::create(&path)?;
        for (term, mut postings) in std::mem::take(&mut self.terms) {
            postings.sort_by_key(|p| p.doc_id);
            for posting in postings {
                writer.write_record(&term, posting.doc_id, posting.tfs)?;
            }
        }
        writer.finish()?;
        self.runs.push(path);
        self.posting_count = 0;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.spill()?;
        Ok(self.runs)
    }
}

/// Runs both parse passes, returning the sorted run files produced and
/// the per-document metadata table (also needed for `doc_lengths.bin`).
pub fn generate_runs(
    input_path: impl AsRef<Path>,
    run_dir: impl AsRef<Path>,
    max_buffer_postings: usize,
    worker_threads: usize,
    queue_capacity: usize,
) -> Result<(Vec<PathBuf>, Vec<DocumentMetadata>)> {
    let input_path = input_path.as_ref();
    let run_dir = run_dir.as_ref().to_path_buf();

    let docs = scan_document_lengths(input_path)?;
    let total_length: u64 = docs.iter().map(|d| d.length as u64).sum();
    let avg_doc_len = if docs.is_empty() {
        0.0
    } else {
        total_length as f32 / docs.len() as f32
    };
    info!(documents = docs.len(), avg_doc_len, "scanned document lengths");

    let doc_lengths: Arc<Vec<u32>> = Arc::new(docs.iter().map(|d| d.length).collect());
    let params = Bm25Params::default();

    let (tx, rx) = mpsc::sync_channel::<Vec<(String, u32, f32)>>(queue_capacity.max(1));
    let pool = ThreadPool::new(worker_threads.max(1), queue_capacity.max(1));

    // Drains results into the spilling buffer on its own thread, started
    // before any task is enqueued, so consumption runs concurrently with
    // production instead of only after the whole file has been read.
    let consumer = thread::spawn(move || -> Result<Vec<PathBuf>> {
        let mut buffer = RunBuffer::new(run_dir, max_buffer_postings);
        while let Ok(records) = rx.recv() {
            for (term, doc_id, tfs) in records {
                buffer.add(term, doc_id, tfs)?;
            }
        }
        buffer.finish()
    });

    let file = File::open(input_path)?;
    let reader = BufReader::new(file);
    let mut doc_id = 0u32;
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let Some((_name, text)) = split_line(&line) else {
            continue;
        };
        let text = text.to_string();
        let tx = tx.clone();
        let doc_lengths = Arc::clone(&doc_lengths);
        let this_doc_id = doc_id;
        pool.enqueue(move || {
            let tokens = tokenize(&text);
            let mut counts: BTreeMap<String, u32> = BTreeMap::new();
            for token in tokens {
                *counts.entry(token).or_insert(0) += 1;
            }
            let doc_len = doc_lengths
                .get(this_doc_id as usize)
                .copied()
                .unwrap_or(0);
            let records: Vec<(String, u32, f32)> = counts
                .into_iter()
                .map(|(term, tf)| {
                    let tfs = compute_tfs(tf, doc_len, avg_doc_len.max(1.0), params);
                    (term, this_doc_id, tfs)
                })
                .collect();
            // Blocks until the consumer has room, throttling the worker
            // (and, transitively, new task submissions) to the rate the
            // buffer is actually being drained at.
            let _ = tx.send(records);
        });
        doc_id += 1;
    }
    drop(tx);
    pool.wait_all();

    let runs = consumer.join().expect("run-buffer consumer thread panicked")?;
    info!(runs = runs.len(), "finished generating runs");
    Ok((runs, docs))
}
