//! Runtime configuration: where intermediate runs and the built index
//! live, how many worker threads and how deep a task queue to give the
//! thread pool, the target block size, and the BM25 parameters.

use std::path::PathBuf;

use crate::error::Result;
use crate::scoring::Bm25Params;

#[derive(Debug, Clone)]
pub struct Config {
    pub intermediate_dir: PathBuf,
    pub index_dir: PathBuf,
    pub worker_threads: usize,
    pub queue_capacity: usize,
    pub run_buffer_postings: usize,
    pub cascade_fan_in: usize,
    pub bm25: Bm25Params,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            intermediate_dir: PathBuf::from("data/intermediate"),
            index_dir: PathBuf::from("data/index"),
            worker_threads: 8,
            queue_capacity: 16,
            run_buffer_postings: 1_000_000,
            cascade_fan_in: 4,
            bm25: Bm25Params::default(),
        }
    }
}

impl Config {
    pub fn create_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.intermediate_dir)?;
        std::fs::create_dir_all(&self.index_dir)?;
        Ok(())
    }

    pub fn lexicon_path(&self) -> PathBuf {
        self.index_dir.join("lexicon.bin")
    }

    pub fn index_path(&self) -> PathBuf {
        self.index_dir.join("index.bin")
    }

    pub fn page_table_path(&self) -> PathBuf {
        self.index_dir.join("page_table.bin")
    }

    pub fn doc_lengths_path(&self) -> PathBuf {
        self.index_dir.join("doc_lengths.bin")
    }

    pub fn with_dirs(intermediate_dir: impl Into<PathBuf>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            intermediate_dir: intermediate_dir.into(),
            index_dir: index_dir.into(),
            ..Self::default()
        }
    }
}
