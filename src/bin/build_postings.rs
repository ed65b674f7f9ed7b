// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Fold the sorted occurrence stream into postings blocks (stage 4).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jamharah::build::run_build_postings;

#[derive(Parser)]
#[command(name = "build_postings", about = "Write one postings block per word")]
struct Args {
    #[arg(default_value = "occurrences.sorted.tmp")]
    occurrences: PathBuf,
    #[arg(default_value = "postings.bin")]
    out: PathBuf,
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run_build_postings(&args.occurrences, &args.out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[build_postings] {e}");
            ExitCode::FAILURE
        }
    }
}
