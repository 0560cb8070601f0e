//! End-to-end coverage of the full parse -> merge -> query pipeline
//! against a small, hand-written document collection.

use std::fs::File;
use std::io::Write;

use tempfile::tempdir;

use veridex::index::doc_lengths::DocLengths;
use veridex::index::page_table::read_page_table;
use veridex::index::Cursor;
use veridex::merge::lexicon::read_lexicon;
use veridex::merge::{cascade_merge, final_pass};
use veridex::parser::generate_runs;
use veridex::query::{evaluate, Mode};
use veridex::scoring::compute_idf;

#[test]
fn indexes_and_queries_a_small_collection() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("docs.tsv");
    {
        let mut f = File::create(&input_path).unwrap();
        writeln!(f, "doc-a\tthe quick brown fox jumps over the lazy dog").unwrap();
        writeln!(f, "doc-b\tthe lazy dog sleeps all day").unwrap();
        writeln!(f, "doc-c\ta quick fox runs fast").unwrap();
    }

    let intermediate_dir = dir.path().join("intermediate");
    std::fs::create_dir_all(&intermediate_dir).unwrap();
    let index_dir = dir.path().join("index");

    let (runs, docs) = generate_runs(&input_path, &intermediate_dir, 1_000_000, 2, 4).unwrap();
    assert_eq!(docs.len(), 3);

    // "the" must survive into the lexicon: no stopword filtering.
    let sorted_run = cascade_merge(runs, &intermediate_dir, 4).unwrap();
    let (index_path, lexicon_path) = final_pass(&sorted_run, &index_dir).unwrap();

    let lexicon = read_lexicon(&lexicon_path).unwrap();
    let the_entry = lexicon.get("the").expect("'the' must be indexed");
    assert_eq!(the_entry.doc_frequency, 2);

    veridex::index::page_table::write_page_table(index_dir.join("page_table.bin"), &docs).unwrap();
    veridex::index::doc_lengths::write_doc_lengths(index_dir.join("doc_lengths.bin"), &docs).unwrap();

    let doc_lengths = DocLengths::load(index_dir.join("doc_lengths.bin")).unwrap();
    let page_table = read_page_table(index_dir.join("page_table.bin")).unwrap();
    let n = doc_lengths.corpus_size();

    // AND query: "quick" appears in doc-a and doc-c, "fox" in both too.
    let quick = lexicon.get("quick").unwrap().clone();
    let fox = lexicon.get("fox").unwrap().clone();
    let cursors = vec![
        Cursor::open(&index_path, quick.clone(), compute_idf(n, quick.doc_frequency as u32)).unwrap(),
        Cursor::open(&index_path, fox.clone(), compute_idf(n, fox.doc_frequency as u32)).unwrap(),
    ];
    let results = evaluate(cursors, Mode::And).unwrap();
    let doc_ids: Vec<u32> = results.iter().map(|r| r.doc_id).collect();
    assert_eq!(doc_ids, vec![0, 2]);

    // OR query: "lazy" appears in doc-a and doc-b only.
    let lazy = lexicon.get("lazy").unwrap().clone();
    let cursors = vec![Cursor::open(&index_path, lazy.clone(), compute_idf(n, lazy.doc_frequency as u32)).unwrap()];
    let results = evaluate(cursors, Mode::Or).unwrap();
    let doc_ids: Vec<u32> = results.iter().map(|r| r.doc_id).collect();
    assert_eq!(doc_ids, vec![0, 1]);

    let names: Vec<&str> = doc_ids.iter().map(|id| page_table.get(id).unwrap().as_str()).collect();
    assert_eq!(names, vec!["doc-a", "doc-b"]);
}
