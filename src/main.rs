mod cli;

use std::path::{Path, PathBuf};

use clap::Parser as _;
use tracing::{info, warn};

use veridex::config::Config;
use veridex::index::doc_lengths::{write_doc_lengths, DocLengths};
use veridex::index::page_table::{read_page_table, write_page_table};
use veridex::index::Cursor;
use veridex::merge::lexicon::read_lexicon;
use veridex::merge::{cascade_merge, final_pass};
use veridex::parser::generate_runs;
use veridex::query::{evaluate, Mode};
use veridex::scoring::compute_idf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    veridex::logging::init();
    let cli = cli::Cli::parse();
    let config = Config::with_dirs(cli.intermediate_dir, cli.index_dir);
    config.create_directories()?;

    match cli.command {
        cli::Command::Parse { input, thread_count, queue_cap } => {
            let thread_count = thread_count.unwrap_or(config.worker_threads);
            let queue_cap = queue_cap.unwrap_or(config.queue_capacity);
            run_parse(&config, &input, thread_count, queue_cap)?
        }
        cli::Command::Merge => run_merge(&config)?,
        cli::Command::Query => run_query(&config)?,
    }
    Ok(())
}

fn run_parse(config: &Config, input: &Path, thread_count: usize, queue_cap: usize) -> anyhow::Result<()> {
    info!(input = %input.display(), thread_count, queue_cap, "starting parse");
    let (runs, docs) = generate_runs(
        input,
        &config.intermediate_dir,
        config.run_buffer_postings,
        thread_count,
        queue_cap,
    )?;
    write_doc_lengths(config.doc_lengths_path(), &docs)?;
    write_page_table(config.page_table_path(), &docs)?;
    info!(runs = runs.len(), documents = docs.len(), "parse complete");
    Ok(())
}

fn collect_runs(intermediate_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(intermediate_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("temp") && name.ends_with(".bin") {
            runs.push(entry.path());
        }
    }
    runs.sort();
    Ok(runs)
}

fn run_merge(config: &Config) -> anyhow::Result<()> {
    let runs = collect_runs(&config.intermediate_dir)?;
    if runs.is_empty() {
        warn!("no run files found in intermediate directory, nothing to merge");
        return Ok(());
    }
    info!(runs = runs.len(), "starting cascade merge");
    let sorted_run = cascade_merge(runs, &config.intermediate_dir, config.cascade_fan_in)?;
    info!("starting final pass");
    let (index_path, lexicon_path) = final_pass(&sorted_run, &config.index_dir)?;
    info!(index = %index_path.display(), lexicon = %lexicon_path.display(), "merge complete");
    Ok(())
}

fn run_query(config: &Config) -> anyhow::Result<()> {
    let lexicon = read_lexicon(config.lexicon_path())?;
    let doc_lengths = DocLengths::load(config.doc_lengths_path())?;
    let page_table = read_page_table(config.page_table_path())?;
    let index_path = config.index_path();
    let n = doc_lengths.corpus_size();

    let mut editor = rustyline::DefaultEditor::new()?;
    println!("veridex query loop. Enter a query, then AND or OR when prompted. Ctrl-D to quit.");

    loop {
        let query_line = match editor.readline("query> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let mode_line = match editor.readline("mode (AND/OR)> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let mode = match mode_line.trim().to_ascii_uppercase().as_str() {
            "AND" => Mode::And,
            "OR" => Mode::Or,
            other => {
                println!("unrecognized mode {other:?}, defaulting to OR");
                Mode::Or
            }
        };

        let terms = veridex::parser::tokenizer::tokenize(&query_line);
        let mut cursors = Vec::new();
        for term in &terms {
            match lexicon.get(term) {
                Some(entry) => {
                    let idf = compute_idf(n, entry.doc_frequency as u32);
                    match Cursor::open(&index_path, entry.clone(), idf) {
                        Ok(cursor) => cursors.push(cursor),
                        Err(e) => warn!(term = %term, error = %e, "failed to open cursor, dropping term from query"),
                    }
                }
                None => println!("(no postings for {term:?})"),
            }
        }

        if cursors.is_empty() {
            println!("no results");
            continue;
        }

        let results = evaluate(cursors, mode)?;
        if results.is_empty() {
            println!("no results");
        }
        for (rank, doc) in results.iter().enumerate() {
            let name = page_table.get(&doc.doc_id).map(String::as_str).unwrap_or("<unknown>");
            println!("{:>2}. doc {:>6}  score {:.4}  {name}", rank + 1, doc.doc_id, doc.score);
        }
    }

    Ok(())
}
