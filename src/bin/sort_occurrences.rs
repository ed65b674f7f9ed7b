// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! External merge-sort of the occurrence stream (stage 3).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jamharah::build::run_sort_occurrences;

#[derive(Parser)]
#[command(name = "sort_occurrences", about = "Sort occurrences by (word_hash, page_id, position)")]
struct Args {
    #[arg(default_value = "occurrences.tmp")]
    input: PathBuf,
    #[arg(default_value = "occurrences.sorted.tmp")]
    output: PathBuf,
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run_sort_occurrences(&args.input, &args.output) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[sort_occurrences] {e}");
            ExitCode::FAILURE
        }
    }
}
