// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Offline full-text search for classical Arabic book corpora.
//!
//! Jamharah exports per-book SQLite databases into a static set of binary
//! artifacts, builds a positional inverted index over them, and answers
//! boolean and phrase queries with ranked results and contextual snippets.
//! The index is immutable once built; queries only ever read.
//!
//! # Architecture
//!
//! ```text
//!  NNN.sqlite ──▶ build::catalog ──▶ books.bin + pages/books/chapters/titles
//!                      │
//!                      ▼
//!              build::occurrences ──▶ (word_hash, page_id, position) stream
//!                      │
//!                      ▼
//!                 build::sort ──▶ canonical (hash, page, position) order
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//!   build::postings ──▶      build::words ──▶ words.idx
//!      postings.bin ◀─────────────┘  (offsets into)
//!
//!   query::SearchIndex = words.idx + postings.bin
//!       └─ normalize/tokenize/hash ─ cursor algebra ─ rank ─ snippets
//! ```
//!
//! The text pipeline ([`normalize`], [`tokenize`], [`hash`]) is shared
//! verbatim between build and query: a word matches iff its normalized
//! bytes hash identically on both sides. Word identity on disk is hash-only.
//!
//! # Example
//!
//! ```no_run
//! use jamharah::query::{SearchIndex, SearchOutcome};
//! use std::path::Path;
//!
//! # fn main() -> jamharah::Result<()> {
//! let mut index = SearchIndex::open(Path::new("words.idx"), Path::new("postings.bin"))?;
//! if let SearchOutcome::Hits(hits) = index.search("بسم الله")? {
//!     for hit in hits {
//!         println!("{} {:.6}", hit.page_id, hit.score);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod error;
pub mod format;
pub mod hash;
pub mod normalize;
pub mod occurrences;
pub mod postings;
pub mod query;
pub mod stem;
pub mod tokenize;

pub use error::{Error, Result};
pub use hash::{hash_word, COLLISION_PROBE_SEED, PRIMARY_SEED};
pub use normalize::normalize_arabic;
pub use occurrences::OccurrenceRecord;
pub use tokenize::{normalize_and_tokenize, tokenize, Token};

/// Install the stderr `tracing` subscriber the CLI binaries share.
///
/// Filtering follows `RUST_LOG`; the default keeps only warnings and errors
/// so the normative stdout formats of the search tools stay clean.
pub fn init_cli_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
