// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Tokenize every page into the raw occurrence stream (stage 2).
//!
//! Worker count follows `min(pages, min(32, CPUs))`; set `JH_OCC_THREADS`
//! to override.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jamharah::build::run_build_occurrences;

#[derive(Parser)]
#[command(name = "build_occurrences", about = "Emit (word_hash, page_id, position) triples")]
struct Args {
    #[arg(default_value = "books.bin")]
    books_bin: PathBuf,
    #[arg(default_value = "pages.idx")]
    pages_idx: PathBuf,
    #[arg(default_value = "occurrences.tmp")]
    out: PathBuf,
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run_build_occurrences(&args.books_bin, &args.pages_idx, &args.out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[build_occurrences] {e}");
            ExitCode::FAILURE
        }
    }
}
