// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Run the whole build pipeline in-process, stage by stage, and write a
//! manifest of what was produced. Per-stage wall-clock timing is printed;
//! it is observability, not part of any contract.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use jamharah::build::{
    run_build_from_sqlite, run_build_occurrences, run_build_postings, run_build_words_index,
    run_sort_occurrences, write_manifest, CatalogPaths, IndexManifest,
};
use jamharah::error::Result;

#[derive(Parser)]
#[command(name = "build_index_pipeline", about = "Run all build stages in order")]
struct Args {
    /// Directory containing the per-book NNN.sqlite files.
    #[arg(default_value = "books")]
    books_dir: PathBuf,
}

fn timed<T>(label: &str, f: impl FnOnce() -> Result<T>) -> Result<(T, f64)> {
    let start = Instant::now();
    let value = f()?;
    let seconds = start.elapsed().as_secs_f64();
    println!("[indexer] {label} completed in {seconds:.3} s");
    Ok((value, seconds))
}

fn run(books_dir: &Path) -> Result<()> {
    let catalog_paths = CatalogPaths::default();
    let occurrences = PathBuf::from("occurrences.tmp");
    let sorted = PathBuf::from("occurrences.sorted.tmp");
    let postings = PathBuf::from("postings.bin");
    let words = PathBuf::from("words.idx");

    let (summary, t1) = timed("build_from_sqlite", || {
        run_build_from_sqlite(books_dir, &catalog_paths)
    })?;
    let (_, t2) = timed("build_occurrences", || {
        run_build_occurrences(&catalog_paths.books_bin, &catalog_paths.pages_idx, &occurrences)
    })?;
    let (_, t3) = timed("sort_occurrences", || {
        run_sort_occurrences(&occurrences, &sorted)
    })?;
    let (postings_summary, t4) =
        timed("build_postings", || run_build_postings(&sorted, &postings))?;
    let (word_count, t5) = timed("build_words_index", || {
        run_build_words_index(&sorted, &postings, &words)
    })?;
    println!("[indexer] total time {:.3} s", t1 + t2 + t3 + t4 + t5);

    let mut manifest = IndexManifest {
        book_count: summary.book_count,
        chapter_count: summary.chapter_count,
        page_count: summary.page_count,
        title_count: summary.title_count,
        block_count: summary.block_count,
        total_postings: postings_summary.total_postings,
        word_count,
        artifacts: Vec::new(),
    };
    for path in [
        &catalog_paths.books_bin,
        &catalog_paths.pages_idx,
        &catalog_paths.books_idx,
        &catalog_paths.chapters_idx,
        &catalog_paths.titles_bin,
        &postings,
        &words,
    ] {
        manifest.add_artifact(path);
    }
    write_manifest(Path::new("index.manifest.json"), &manifest)?;
    Ok(())
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run(&args.books_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[indexer] {e}");
            ExitCode::FAILURE
        }
    }
}
