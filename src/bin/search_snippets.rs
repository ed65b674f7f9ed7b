// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Ranked search with contextual snippets. The query is one line on stdin;
//! each hit prints a `book … page … id … score …` line and a snippet with
//! the match bracketed by `«…»`.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jamharah::error::Result;
use jamharah::format::catalog::read_pages_index;
use jamharah::format::textstore::TextStore;
use jamharah::query::{print_hits, SearchIndex, SearchOutcome, SnippetOptions};

#[derive(Parser)]
#[command(name = "search_snippets", about = "Search and print contextual snippets")]
struct Args {
    #[arg(default_value = "books.bin")]
    books_bin: PathBuf,
    #[arg(default_value = "pages.idx")]
    pages_idx: PathBuf,
    #[arg(default_value = "words.idx")]
    words_idx: PathBuf,
    #[arg(default_value = "postings.bin")]
    postings_bin: PathBuf,
    /// Skip this many hits.
    #[arg(default_value_t = 0)]
    offset: usize,
    /// Print at most this many hits; 0 means all.
    #[arg(default_value_t = 0)]
    limit: usize,
    /// Only verbatim matches; suppress the normalized-token fallback.
    #[arg(long)]
    exact: bool,
}

fn run(args: &Args) -> Result<()> {
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(());
    }
    let query = line.trim_end_matches(['\r', '\n']);

    let mut index = SearchIndex::open(&args.words_idx, &args.postings_bin)?;
    let hits = match index.search(query)? {
        SearchOutcome::NoTokens => {
            println!("no tokens");
            return Ok(());
        }
        SearchOutcome::Hits(hits) if hits.is_empty() => {
            println!("no results");
            return Ok(());
        }
        SearchOutcome::Hits(hits) => hits,
    };

    let mut store = TextStore::open(&args.books_bin)?;
    let pages = read_pages_index(&args.pages_idx)?;
    let options = SnippetOptions {
        offset: args.offset,
        limit: args.limit,
        exact_only: args.exact,
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    print_hits(&mut out, &mut store, &pages, &hits, query, &options)
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[search_snippets] {e}");
            ExitCode::FAILURE
        }
    }
}
