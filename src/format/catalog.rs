// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Catalog artifacts: books.idx, pages.idx, chapters.idx and titles.bin.
//!
//! These are plain header-plus-array files. Writers stream the arrays with
//! final counts known up front; readers validate the declared count against
//! the real file size before allocating anything.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::headers::{
    BookIndexEntry, BooksIndexHeader, ChapterIndexEntry, ChaptersIndexHeader, PageIndexEntry,
    PagesIndexHeader, TitleEntry, TitlesFileHeader,
};
use crate::error::{Error, Result};

fn check_body_size(
    file_len: u64,
    header_size: usize,
    count: u64,
    entry_size: usize,
    file_kind: &str,
) -> Result<()> {
    let body = count
        .checked_mul(entry_size as u64)
        .and_then(|b| b.checked_add(header_size as u64))
        .ok_or_else(|| Error::format(format!("{file_kind}: entry count overflows")))?;
    if file_len < body {
        return Err(Error::format(format!(
            "{file_kind}: header declares {count} entries but file has {file_len} bytes"
        )));
    }
    Ok(())
}

// ============================================================================
// PAGES
// ============================================================================

pub fn write_pages_index(path: &Path, entries: &[PageIndexEntry]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    PagesIndexHeader {
        page_count: entries.len() as u32,
    }
    .write(&mut w)?;
    for entry in entries {
        entry.write_to(&mut w)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_pages_index(path: &Path) -> Result<Vec<PageIndexEntry>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);
    let header = PagesIndexHeader::read(&mut r)?;
    check_body_size(
        file_len,
        PagesIndexHeader::SIZE,
        u64::from(header.page_count),
        PageIndexEntry::SIZE,
        "pages.idx",
    )?;
    let mut entries = Vec::with_capacity(header.page_count as usize);
    for _ in 0..header.page_count {
        entries.push(PageIndexEntry::read_from(&mut r)?);
    }
    Ok(entries)
}

// ============================================================================
// BOOKS
// ============================================================================

pub fn write_books_index(path: &Path, entries: &[BookIndexEntry]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    BooksIndexHeader {
        book_count: entries.len() as u32,
    }
    .write(&mut w)?;
    for entry in entries {
        entry.write_to(&mut w)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_books_index(path: &Path) -> Result<Vec<BookIndexEntry>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);
    let header = BooksIndexHeader::read(&mut r)?;
    check_body_size(
        file_len,
        BooksIndexHeader::SIZE,
        u64::from(header.book_count),
        BookIndexEntry::SIZE,
        "books.idx",
    )?;
    let mut entries = Vec::with_capacity(header.book_count as usize);
    for _ in 0..header.book_count {
        entries.push(BookIndexEntry::read_from(&mut r)?);
    }
    Ok(entries)
}

// ============================================================================
// CHAPTERS
// ============================================================================

pub fn write_chapters_index(path: &Path, entries: &[ChapterIndexEntry]) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    ChaptersIndexHeader {
        chapter_count: entries.len() as u32,
    }
    .write(&mut w)?;
    for entry in entries {
        entry.write_to(&mut w)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_chapters_index(path: &Path) -> Result<Vec<ChapterIndexEntry>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut r = BufReader::new(file);
    let header = ChaptersIndexHeader::read(&mut r)?;
    check_body_size(
        file_len,
        ChaptersIndexHeader::SIZE,
        u64::from(header.chapter_count),
        ChapterIndexEntry::SIZE,
        "chapters.idx",
    )?;
    let mut entries = Vec::with_capacity(header.chapter_count as usize);
    for _ in 0..header.chapter_count {
        entries.push(ChapterIndexEntry::read_from(&mut r)?);
    }
    Ok(entries)
}

// ============================================================================
// TITLES
// ============================================================================

/// One title string with its flags word.
#[derive(Debug, Clone)]
pub struct TitleRecord {
    pub text: String,
    pub flags: u32,
}

/// Write titles.bin: header, entry array, then the concatenated strings.
pub fn write_titles_file(path: &Path, titles: &[TitleRecord]) -> Result<()> {
    let strings_offset =
        TitlesFileHeader::SIZE as u64 + (titles.len() * TitleEntry::SIZE) as u64;
    let mut w = BufWriter::new(File::create(path)?);
    TitlesFileHeader {
        title_count: titles.len() as u32,
        strings_offset,
    }
    .write(&mut w)?;

    let mut offset = 0u64;
    for title in titles {
        TitleEntry {
            offset,
            length: title.text.len() as u32,
            flags: title.flags,
        }
        .write_to(&mut w)?;
        offset += title.text.len() as u64;
    }
    for title in titles {
        w.write_all(title.text.as_bytes())?;
    }
    w.flush()?;
    Ok(())
}

/// Loaded titles.bin, materialized for ordinal lookup.
#[derive(Debug)]
pub struct TitleStore {
    titles: Vec<TitleRecord>,
}

impl TitleStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let header = TitlesFileHeader::read(&mut file)?;
        check_body_size(
            file_len,
            TitlesFileHeader::SIZE,
            u64::from(header.title_count),
            TitleEntry::SIZE,
            "titles.bin",
        )?;
        if header.strings_offset > file_len {
            return Err(Error::format(format!(
                "titles.bin strings_offset {} beyond file end {}",
                header.strings_offset, file_len
            )));
        }

        let mut entries = Vec::with_capacity(header.title_count as usize);
        let mut reader = BufReader::new(&mut file);
        for _ in 0..header.title_count {
            entries.push(TitleEntry::read_from(&mut reader)?);
        }
        drop(reader);

        file.seek(SeekFrom::Start(header.strings_offset))?;
        let mut strings = Vec::new();
        file.read_to_end(&mut strings)?;

        let mut titles = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let start = entry.offset as usize;
            let end = start + entry.length as usize;
            let bytes = strings.get(start..end).ok_or_else(|| {
                Error::format(format!(
                    "titles.bin entry {i} spans {start}..{end} beyond string pool of {} bytes",
                    strings.len()
                ))
            })?;
            let text = std::str::from_utf8(bytes)
                .map_err(|e| Error::format(format!("titles.bin entry {i} is not UTF-8: {e}")))?
                .to_string();
            titles.push(TitleRecord {
                text,
                flags: entry.flags,
            });
        }
        Ok(Self { titles })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn get(&self, title_index: u32) -> Option<&TitleRecord> {
        self.titles.get(title_index as usize)
    }
}
