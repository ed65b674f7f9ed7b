// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Display-time snippet rendering.
//!
//! For every hit the goal is a line of context with the matched span
//! bracketed by `«…»`. Three attempts, in order:
//!
//! 1. the raw query string verbatim in the page text;
//! 2. the query straddling the boundary into the next page of the same
//!    book (tail of this page + head of the next);
//! 3. unless `--exact`, a normalized token match — the first page token
//!    equal to any query token, shown inside the normalized text.
//!
//! Snippet boundaries are byte-based like the rest of the engine; rendering
//! goes through lossy UTF-8 conversion so a context window that cuts a
//! code point mid-sequence still prints.

use std::borrow::Cow;
use std::io::Write;

use super::rank::RankedHit;
use crate::error::{Error, Result};
use crate::format::headers::PageIndexEntry;
use crate::format::textstore::TextStore;
use crate::tokenize::normalize_and_tokenize;

/// Bytes of context shown on each side of a match.
const CONTEXT_BYTES: usize = 40;

/// Bytes taken from each side of a page boundary for the straddle search.
const BOUNDARY_BYTES: usize = 200;

/// Fallback snippet length when no match can be located at all.
const FALLBACK_SNIPPET_BYTES: usize = 80;

#[derive(Debug, Clone, Copy, Default)]
pub struct SnippetOptions {
    /// Skip this many hits before printing.
    pub offset: usize,
    /// Print at most this many hits; 0 means unlimited.
    pub limit: usize,
    /// Suppress the normalized-token fallback.
    pub exact_only: bool,
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Byte offset of a token's text relative to its workspace base address.
/// The base is captured before tokenization, so the offsets stay usable
/// after the tokens (and the borrow they carry) are gone.
fn offset_from(base: usize, text: &str) -> usize {
    text.as_ptr() as usize - base
}

fn write_bracketed<W: Write>(
    out: &mut W,
    buf: &[u8],
    start: usize,
    match_len: usize,
    end_limit: usize,
) -> std::io::Result<()> {
    let head_len = start.min(CONTEXT_BYTES);
    let after = start + match_len;
    let tail_len = (end_limit - after).min(CONTEXT_BYTES);
    writeln!(
        out,
        "  ...{}«{}»{}...",
        lossy(&buf[start - head_len..start]),
        lossy(&buf[start..after]),
        lossy(&buf[after..after + tail_len]),
    )
}

/// Print one human-readable block per hit in `[offset, offset+limit)`.
pub fn print_hits<W: Write>(
    out: &mut W,
    store: &mut TextStore,
    pages: &[PageIndexEntry],
    hits: &[RankedHit],
    query: &str,
    options: &SnippetOptions,
) -> Result<()> {
    // Dense page_id -> entry table, validated like every other on-disk id.
    let mut page_by_id: Vec<Option<PageIndexEntry>> = vec![None; pages.len()];
    for entry in pages {
        let slot = page_by_id
            .get_mut(entry.page_id as usize)
            .ok_or_else(|| Error::format(format!("page_id {} out of range", entry.page_id)))?;
        *slot = Some(*entry);
    }

    if options.offset >= hits.len() {
        return Ok(());
    }
    let end = if options.limit > 0 {
        (options.offset + options.limit).min(hits.len())
    } else {
        hits.len()
    };

    let query_bytes = query.as_bytes();
    for hit in &hits[options.offset..end] {
        let page_id = hit.page_id;
        let entry = page_by_id.get(page_id as usize).copied().flatten();
        let (book_id, page_number) = entry.map_or((0, 0), |e| (e.book_id, e.page_number));

        let page_text = entry.and_then(|e| store.read_page(&e).ok());
        let Some(page_text) = page_text else {
            writeln!(
                out,
                "book {book_id} page {page_number} id {page_id} score {:.6} (failed to load text)",
                hit.score
            )?;
            continue;
        };

        // 1. Exact match in the raw page text.
        if let Some(start) = find_bytes(&page_text, query_bytes) {
            writeln!(
                out,
                "book {book_id} page {page_number} id {page_id} score {:.6}",
                hit.score
            )?;
            write_bracketed(out, &page_text, start, query_bytes.len(), page_text.len())?;
            continue;
        }

        // 2. Match straddling into the next page of the same book.
        if let Some(entry) = entry {
            if print_boundary_match(out, store, &page_by_id, &entry, &page_text, query_bytes, hit)?
            {
                continue;
            }
        }

        // 3. Normalized token fallback.
        if options.exact_only {
            continue;
        }
        writeln!(
            out,
            "book {book_id} page {page_number} id {page_id} score {:.6}",
            hit.score
        )?;
        if !print_normalized_match(out, &page_text, query)? {
            let snippet_len = page_text.len().min(FALLBACK_SNIPPET_BYTES);
            writeln!(out, "  ...{}...", lossy(&page_text[..snippet_len]))?;
        }
    }
    Ok(())
}

/// Try the tail-of-this-page + head-of-next-page window. Returns true when
/// a snippet was printed.
fn print_boundary_match<W: Write>(
    out: &mut W,
    store: &mut TextStore,
    page_by_id: &[Option<PageIndexEntry>],
    entry: &PageIndexEntry,
    page_text: &[u8],
    query_bytes: &[u8],
    hit: &RankedHit,
) -> Result<bool> {
    let next_id = entry.page_id as usize + 1;
    let Some(Some(next_entry)) = page_by_id.get(next_id) else {
        return Ok(false);
    };
    if next_entry.book_id != entry.book_id {
        return Ok(false);
    }
    let Ok(next_text) = store.read_page(next_entry) else {
        return Ok(false);
    };

    let tail_bytes = page_text.len().min(BOUNDARY_BYTES);
    let head_bytes = next_text.len().min(BOUNDARY_BYTES);
    let mut combo = Vec::with_capacity(tail_bytes + head_bytes);
    combo.extend_from_slice(&page_text[page_text.len() - tail_bytes..]);
    combo.extend_from_slice(&next_text[..head_bytes]);

    let Some(start) = find_bytes(&combo, query_bytes) else {
        return Ok(false);
    };

    writeln!(
        out,
        "book {} pages {}-{} ids {}-{} score {:.6}",
        entry.book_id,
        entry.page_number,
        next_entry.page_number,
        entry.page_id,
        next_entry.page_id,
        hit.score
    )?;
    write_bracketed(out, &combo, start, query_bytes.len(), combo.len())?;
    Ok(true)
}

/// Try to bracket the first normalized page token equal to any normalized
/// query token. Returns true when a snippet was printed.
fn print_normalized_match<W: Write>(out: &mut W, page_text: &[u8], query: &str) -> Result<bool> {
    let mut query_ws = vec![0u8; query.len()];
    let Ok(query_tokens) = normalize_and_tokenize(query.as_bytes(), &mut query_ws) else {
        return Ok(false);
    };
    let mut page_ws = vec![0u8; page_text.len()];
    let page_base = page_ws.as_ptr() as usize;
    let Ok(page_tokens) = normalize_and_tokenize(page_text, &mut page_ws) else {
        return Ok(false);
    };
    if query_tokens.is_empty() || page_tokens.is_empty() {
        return Ok(false);
    }

    let mut root: Option<(usize, usize)> = None;
    'pages: for page_token in &page_tokens {
        for query_token in &query_tokens {
            if page_token.text == query_token.text {
                root = Some((
                    offset_from(page_base, page_token.text),
                    page_token.text.len(),
                ));
                break 'pages;
            }
        }
    }
    let last = &page_tokens[page_tokens.len() - 1];
    let norm_len = offset_from(page_base, last.text) + last.text.len();

    let Some((root_start, root_len)) = root else {
        return Ok(false);
    };
    if root_len == 0 || root_start >= norm_len {
        return Ok(false);
    }
    write_bracketed(out, &page_ws, root_start, root_len, norm_len)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::textstore::TextStoreWriter;

    fn build_store(dir: &std::path::Path, pages: &[(&str, u32)]) -> (TextStore, Vec<PageIndexEntry>) {
        let path = dir.join("books.bin");
        let mut writer = TextStoreWriter::create(&path, 1 << 16).unwrap();
        let mut entries = Vec::new();
        for (i, (text, book_id)) in pages.iter().enumerate() {
            let loc = writer.append_page(text.as_bytes()).unwrap();
            entries.push(PageIndexEntry {
                page_id: i as u32,
                book_id: *book_id,
                chapter_id: 0,
                page_number: i as u32 + 1,
                block_id: loc.block_id,
                offset_in_block: loc.offset_in_block,
                length: text.len() as u32,
            });
        }
        writer.finish().unwrap();
        (TextStore::open(&path).unwrap(), entries)
    }

    fn render(
        store: &mut TextStore,
        pages: &[PageIndexEntry],
        hits: &[RankedHit],
        query: &str,
        options: &SnippetOptions,
    ) -> String {
        let mut out = Vec::new();
        print_hits(&mut out, store, pages, hits, query, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn exact_match_is_bracketed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, pages) = build_store(dir.path(), &[("قال الامام احمد بن حنبل رحمه الله", 3)]);
        let hits = [RankedHit {
            page_id: 0,
            score: 2.5,
        }];
        let text = render(&mut store, &pages, &hits, "احمد", &SnippetOptions::default());
        assert!(text.contains("book 3 page 1 id 0 score 2.500000"));
        assert!(text.contains("«احمد»"));
    }

    #[test]
    fn boundary_match_spans_two_pages() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, pages) =
            build_store(dir.path(), &[("اول الكلام بسم ", 1), ("الله الرحمن", 1)]);
        let hits = [RankedHit {
            page_id: 0,
            score: 1.0,
        }];
        let text = render(
            &mut store,
            &pages,
            &hits,
            "بسم الله",
            &SnippetOptions::default(),
        );
        assert!(text.contains("pages 1-2 ids 0-1"));
        assert!(text.contains("«بسم الله»"));
    }

    #[test]
    fn normalized_fallback_matches_despite_diacritics() {
        let dir = tempfile::tempdir().unwrap();
        // page text carries diacritics; the raw query cannot match verbatim
        let (mut store, pages) = build_store(dir.path(), &[("قَالَ الكِتَابُ المُبِينُ", 2)]);
        let hits = [RankedHit {
            page_id: 0,
            score: 1.0,
        }];
        let text = render(&mut store, &pages, &hits, "الكتاب", &SnippetOptions::default());
        assert!(text.contains("«الكتاب»"), "got: {text}");

        let exact = render(
            &mut store,
            &pages,
            &hits,
            "الكتاب",
            &SnippetOptions {
                exact_only: true,
                ..Default::default()
            },
        );
        assert!(exact.is_empty());
    }

    #[test]
    fn offset_and_limit_paginate() {
        let dir = tempfile::tempdir().unwrap();
        let (mut store, pages) = build_store(
            dir.path(),
            &[("alpha page", 1), ("beta page", 1), ("gamma page", 1)],
        );
        let hits: Vec<RankedHit> = (0..3)
            .map(|i| RankedHit {
                page_id: i,
                score: 3.0 - f64::from(i),
            })
            .collect();
        let text = render(
            &mut store,
            &pages,
            &hits,
            "page",
            &SnippetOptions {
                offset: 1,
                limit: 1,
                exact_only: false,
            },
        );
        assert!(text.contains("id 1"));
        assert!(!text.contains("id 0"));
        assert!(!text.contains("id 2"));

        let beyond = render(
            &mut store,
            &pages,
            &hits,
            "page",
            &SnippetOptions {
                offset: 10,
                limit: 0,
                exact_only: false,
            },
        );
        assert!(beyond.is_empty());
    }
}
