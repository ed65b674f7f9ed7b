// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Build the sorted word dictionary over the postings file (stage 5).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jamharah::build::run_build_words_index;

#[derive(Parser)]
#[command(name = "build_words_index", about = "Write the word_hash -> postings dictionary")]
struct Args {
    #[arg(default_value = "occurrences.sorted.tmp")]
    occurrences: PathBuf,
    #[arg(default_value = "postings.bin")]
    postings: PathBuf,
    #[arg(default_value = "words.idx")]
    out: PathBuf,
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run_build_words_index(&args.occurrences, &args.postings, &args.out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[build_words_index] {e}");
            ExitCode::FAILURE
        }
    }
}
