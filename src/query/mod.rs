// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! The query engine.
//!
//! A query is normalized and tokenized exactly like page text, so query
//! terms hash to the same values the builder persisted. The literal token
//! `OR` flips the query from all-terms-required (the default) to boolean
//! OR and is dropped from the term list. Terms resolve through the
//! dictionary, postings blocks load into materialized lists, and ranking
//! combines term frequency, adjacent-pair proximity and a phrase bonus.
//! Dictionary misses are silent: a missing word is "no results", never an
//! error.

pub mod dictionary;
pub mod phrase;
pub mod rank;
pub mod snippets;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

pub use dictionary::Dictionary;
pub use phrase::{phrase_match_pages, phrase_search_categories};
pub use rank::{rank_results, RankedHit};
pub use snippets::{print_hits, SnippetOptions};

use crate::error::{Error, Result};
use crate::format::headers::{PostingsFileHeader, WordDictEntry};
use crate::hash::{hash_word, PRIMARY_SEED};
use crate::postings::codec::PostingsList;
use crate::postings::frame;
use crate::tokenize::normalize_and_tokenize;

/// The literal token that switches a query to boolean-OR. It shadows a
/// genuine query token "OR"; a richer grammar is out of scope.
pub const OR_TOKEN: &str = "OR";

/// A parsed query: term hashes in query order plus the boolean mode.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub hashes: Vec<u64>,
    pub require_all_terms: bool,
}

/// Normalize, tokenize and hash a query string.
pub fn parse_query(query: &str) -> Result<ParsedQuery> {
    let mut workspace = vec![0u8; query.len()];
    let tokens = normalize_and_tokenize(query.as_bytes(), &mut workspace)?;

    let mut has_or_token = false;
    let mut hashes = Vec::with_capacity(tokens.len());
    for token in &tokens {
        if token.text == OR_TOKEN {
            has_or_token = true;
            continue;
        }
        hashes.push(hash_word(token.text.as_bytes(), PRIMARY_SEED));
    }
    Ok(ParsedQuery {
        hashes,
        require_all_terms: !has_or_token,
    })
}

/// Random-access reader over postings.bin.
#[derive(Debug)]
pub struct PostingsReader {
    file: File,
    file_len: u64,
    header: PostingsFileHeader,
}

impl PostingsReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let header = PostingsFileHeader::read(&mut file)?;
        let file_len = file.metadata()?.len();
        if header.blocks_data_offset > file_len {
            return Err(Error::format(format!(
                "postings.bin blocks_data_offset {} beyond file end {}",
                header.blocks_data_offset, file_len
            )));
        }
        Ok(Self {
            file,
            file_len,
            header,
        })
    }

    pub fn header(&self) -> &PostingsFileHeader {
        &self.header
    }

    /// Read one word's block and return the plain (decompressed) encoding.
    pub fn read_block(&mut self, entry: &WordDictEntry) -> Result<Vec<u8>> {
        let payload_start = entry
            .postings_offset
            .checked_add(4)
            .filter(|&start| entry.postings_offset >= self.header.blocks_data_offset
                && start <= self.file_len)
            .ok_or_else(|| {
                Error::format(format!(
                    "postings offset {} out of range",
                    entry.postings_offset
                ))
            })?;
        self.file.seek(SeekFrom::Start(entry.postings_offset))?;
        let mut len_buf = [0u8; 4];
        self.file.read_exact(&mut len_buf)?;
        let stored_len = u64::from(u32::from_le_bytes(len_buf));
        if payload_start + stored_len > self.file_len {
            return Err(Error::format(format!(
                "postings block at {} of {} bytes exceeds file end",
                entry.postings_offset, stored_len
            )));
        }

        let mut payload = vec![0u8; stored_len as usize];
        self.file.read_exact(&mut payload)?;
        if self.header.is_compressed() {
            frame::decompress(&payload)
        } else {
            Ok(payload)
        }
    }
}

/// One searchable index: an open dictionary plus its postings file.
#[derive(Debug)]
pub struct SearchIndex {
    dictionary: Dictionary,
    postings: PostingsReader,
}

/// What a query produced. "No tokens" and "no results" print differently.
#[derive(Debug)]
pub enum SearchOutcome {
    NoTokens,
    Hits(Vec<RankedHit>),
}

impl SearchIndex {
    pub fn open(words_path: &Path, postings_path: &Path) -> Result<Self> {
        Ok(Self {
            dictionary: Dictionary::open(words_path)?,
            postings: PostingsReader::open(postings_path)?,
        })
    }

    /// Resolve one term hash to a materialized list. `Ok(None)` covers both
    /// a dictionary miss and an empty block.
    pub fn load_term(&mut self, word_hash: u64) -> Result<Option<PostingsList>> {
        let Some(entry) = self.dictionary.lookup(word_hash)? else {
            return Ok(None);
        };
        if entry.postings_count == 0 {
            return Ok(None);
        }
        let plain = self.postings.read_block(&entry)?;
        let list = PostingsList::parse(&plain)?;
        if list.is_empty() {
            return Ok(None);
        }
        Ok(Some(list))
    }

    /// Run the full engine over one query string.
    pub fn search(&mut self, query: &str) -> Result<SearchOutcome> {
        let parsed = parse_query(query)?;
        if parsed.hashes.is_empty() {
            return Ok(SearchOutcome::NoTokens);
        }

        let phrase_pages = if parsed.require_all_terms && parsed.hashes.len() >= 2 {
            phrase_match_pages(self, &parsed.hashes)?
        } else {
            Vec::new()
        };

        let mut lists = Vec::with_capacity(parsed.hashes.len());
        for &hash in &parsed.hashes {
            lists.push(self.load_term(hash)?);
        }

        let hits = rank_results(&lists, parsed.require_all_terms, &phrase_pages);
        debug!(
            terms = parsed.hashes.len(),
            require_all = parsed.require_all_terms,
            phrase_pages = phrase_pages.len(),
            hits = hits.len(),
            "query ranked"
        );
        Ok(SearchOutcome::Hits(hits))
    }
}
