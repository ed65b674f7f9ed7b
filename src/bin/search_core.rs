// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Core search over one or more indexes. The query is one line on stdin.
//!
//! With zero or one `words.idx postings.bin` pair: ranked `page_id score`
//! lines. With several pairs: phrase search per category, printed as
//! `category_index page_id`.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use jamharah::error::{Error, Result};
use jamharah::query::{parse_query, phrase_search_categories, SearchIndex, SearchOutcome};

#[derive(Parser)]
#[command(name = "search_core", about = "Search the index; query read from stdin")]
struct Args {
    /// words.idx/postings.bin path pairs. One pair (or none, for the
    /// defaults) ranks pages; several pairs phrase-search per category.
    paths: Vec<PathBuf>,
}

fn read_query_line() -> Result<Option<String>> {
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn search_single(words: &Path, postings: &Path, query: &str) -> Result<()> {
    let mut index = SearchIndex::open(words, postings)?;
    match index.search(query)? {
        SearchOutcome::NoTokens => println!("no tokens"),
        SearchOutcome::Hits(hits) if hits.is_empty() => println!("no results"),
        SearchOutcome::Hits(hits) => {
            for hit in hits {
                println!("{} {:.6}", hit.page_id, hit.score);
            }
        }
    }
    Ok(())
}

fn search_multi(pairs: &[(PathBuf, PathBuf)], query: &str) -> Result<()> {
    let parsed = parse_query(query)?;
    if parsed.hashes.is_empty() {
        println!("no tokens");
        return Ok(());
    }
    if parsed.hashes.len() < 2 {
        println!("need at least two tokens");
        return Ok(());
    }
    let matches = phrase_search_categories(pairs, &parsed.hashes)?;
    if matches.is_empty() {
        println!("no results");
        return Ok(());
    }
    for (category, page_id) in matches {
        println!("{category} {page_id}");
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let Some(query) = read_query_line()? else {
        return Ok(());
    };

    match args.paths.len() {
        0 => search_single(Path::new("words.idx"), Path::new("postings.bin"), &query),
        2 => search_single(&args.paths[0], &args.paths[1], &query),
        n if n % 2 == 0 => {
            let pairs: Vec<(PathBuf, PathBuf)> = args
                .paths
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            search_multi(&pairs, &query)
        }
        _ => Err(Error::Usage(
            "expected words.idx postings.bin path pairs".into(),
        )),
    }
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[search_core] {e}");
            ExitCode::FAILURE
        }
    }
}
