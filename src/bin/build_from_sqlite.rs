// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Export per-book SQLite databases into the static text store and catalog
//! indexes (books.bin, pages.idx, books.idx, chapters.idx, titles.bin).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jamharah::build::{run_build_from_sqlite, CatalogPaths};

#[derive(Parser)]
#[command(name = "build_from_sqlite", about = "Export NNN.sqlite books into index artifacts")]
struct Args {
    /// Directory containing the per-book NNN.sqlite files.
    #[arg(default_value = "books")]
    books_dir: PathBuf,
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run_build_from_sqlite(&args.books_dir, &CatalogPaths::default()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[build_from_sqlite] {e}");
            ExitCode::FAILURE
        }
    }
}
