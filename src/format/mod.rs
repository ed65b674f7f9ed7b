// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! On-disk index formats.
//!
//! Seven artifact files make up an index, each starting with a 4-byte ASCII
//! magic and a little-endian `u32` version. Everything is tightly packed —
//! no padding, no alignment games — so the byte layouts here are the
//! interchange format, not an implementation detail. Readers validate magic,
//! version and every count or offset against the actual file size before
//! trusting it; on-disk numbers are input, not truth.
//!
//! | File | Magic | Contents |
//! |---|---|---|
//! | books.bin | `BKSB` | page text in fixed-size blocks + block index |
//! | books.idx | `BKIX` | per-book ranges |
//! | pages.idx | `PGIX` | per-page locators, dense by `page_id` |
//! | chapters.idx | `CHIX` | chapter ranges |
//! | titles.bin | `TTLB` | packed UTF-8 title strings |
//! | words.idx | `WDIX` | word dictionary, sorted by hash |
//! | postings.bin | `PSTB` | length-framed postings blocks |

pub mod catalog;
pub mod headers;
pub mod textstore;

pub use headers::{
    BlockIndexEntry, BookIndexEntry, BooksFileHeader, BooksIndexHeader, ChapterIndexEntry,
    ChaptersIndexHeader, PageIndexEntry, PagesIndexHeader, PostingsFileHeader, TitleEntry,
    TitlesFileHeader, WordDictEntry, WordsIndexHeader, POSTINGS_FLAG_COMPRESSED,
};
pub use textstore::{TextStore, TextStoreWriter, DEFAULT_BLOCK_SIZE};

use crate::error::{Error, Result};

/// The single supported version for every artifact file.
pub const FORMAT_VERSION: u32 = 1;

pub(crate) fn check_magic(found: [u8; 4], expected: [u8; 4], file_kind: &str) -> Result<()> {
    if found != expected {
        return Err(Error::format(format!(
            "{file_kind}: bad magic {found:?}, expected {expected:?}"
        )));
    }
    Ok(())
}

pub(crate) fn check_version(version: u32, file_kind: &str) -> Result<()> {
    if version != FORMAT_VERSION {
        return Err(Error::format(format!(
            "{file_kind}: unsupported version {version} (expected {FORMAT_VERSION})"
        )));
    }
    Ok(())
}
