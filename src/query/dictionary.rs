// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Word dictionary lookup.
//!
//! words.idx is a sorted array of 24-byte entries, so lookup is a binary
//! search over the file itself — the dictionary for a large corpus is tens
//! of megabytes and queries touch a handful of words, so loading it whole
//! would be waste. A small LRU cache in front absorbs the repeat lookups a
//! query engine naturally produces (phrase pass plus ranking pass hit the
//! same words twice). Negative results are cached too.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};
use crate::format::headers::{WordDictEntry, WordsIndexHeader};

const LOOKUP_CACHE_CAPACITY: usize = 64;

/// Tiny move-to-front LRU keyed by word hash.
#[derive(Debug, Default)]
struct LookupCache {
    entries: VecDeque<(u64, Option<WordDictEntry>)>,
}

impl LookupCache {
    fn get(&mut self, word_hash: u64) -> Option<Option<WordDictEntry>> {
        let pos = self.entries.iter().position(|(h, _)| *h == word_hash)?;
        let hit = self.entries.remove(pos)?;
        let value = hit.1;
        self.entries.push_front(hit);
        Some(value)
    }

    fn insert(&mut self, word_hash: u64, value: Option<WordDictEntry>) {
        if self.entries.len() == LOOKUP_CACHE_CAPACITY {
            self.entries.pop_back();
        }
        self.entries.push_front((word_hash, value));
    }
}

/// An open words.idx with its entry count validated against the file size.
#[derive(Debug)]
pub struct Dictionary {
    file: File,
    entry_count: u64,
    cache: LookupCache,
}

impl Dictionary {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let header = WordsIndexHeader::read(&mut file)?;
        let file_len = file.metadata()?.len();
        let body = header
            .entry_count
            .checked_mul(WordDictEntry::SIZE as u64)
            .and_then(|b| b.checked_add(WordsIndexHeader::SIZE as u64))
            .ok_or_else(|| Error::format("words.idx entry count overflows"))?;
        if file_len < body {
            return Err(Error::format(format!(
                "words.idx declares {} entries but file has {} bytes",
                header.entry_count, file_len
            )));
        }
        Ok(Self {
            file,
            entry_count: header.entry_count,
            cache: LookupCache::default(),
        })
    }

    pub fn len(&self) -> u64 {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    fn read_entry(&mut self, index: u64) -> Result<WordDictEntry> {
        self.file.seek(SeekFrom::Start(
            WordsIndexHeader::SIZE as u64 + index * WordDictEntry::SIZE as u64,
        ))?;
        Ok(WordDictEntry::read_from(&mut self.file)?)
    }

    /// Binary-search the entry for `word_hash`. `Ok(None)` is a miss, not an
    /// error; query tools treat misses as "no results".
    pub fn lookup(&mut self, word_hash: u64) -> Result<Option<WordDictEntry>> {
        if let Some(cached) = self.cache.get(word_hash) {
            return Ok(cached);
        }

        let mut lo = 0u64;
        let mut hi = self.entry_count;
        let mut found = None;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let entry = self.read_entry(mid)?;
            match entry.word_hash.cmp(&word_hash) {
                std::cmp::Ordering::Equal => {
                    found = Some(entry);
                    break;
                }
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }

        self.cache.insert(word_hash, found);
        Ok(found)
    }
}
