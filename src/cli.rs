use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "veridex", about = "Disk-resident BM25 inverted-index engine")]
pub struct Cli {
    #[arg(long, global = true, default_value = "data/intermediate")]
    pub intermediate_dir: PathBuf,

    #[arg(long, global = true, default_value = "data/index")]
    pub index_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Tokenize a TSV document collection and write sorted runs.
    Parse {
        /// Path to a TSV file: one `<name>\t<text>` document per line.
        #[arg(long)]
        input: PathBuf,

        /// Worker threads tokenizing documents concurrently. Defaults
        /// to the configured worker count (8).
        #[arg(long)]
        thread_count: Option<usize>,

        /// Bounded task-queue depth; `submit` blocks once it is full.
        /// Defaults to the configured queue capacity (16).
        #[arg(long)]
        queue_cap: Option<usize>,
    },
    /// Merge the sorted runs in the intermediate directory into the
    /// on-disk index and lexicon.
    Merge,
    /// Start an interactive query loop against a built index.
    Query,
}
