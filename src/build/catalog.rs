// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Stage 1: export source databases into the text store and catalog indexes.
//!
//! A [`CatalogBuilder`] is threaded through the whole export: it owns the
//! text store writer and accumulates pages, chapters, books and titles as
//! fields. Page rows are grouped by page number and newline-joined; chapter
//! rows carry only a starting page number, so chapters get their page ranges
//! assigned afterwards by walking the page-number intervals between
//! consecutive chapter starts.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use super::source::{self, BookFile};
use crate::error::Result;
use crate::format::catalog::{
    write_books_index, write_chapters_index, write_pages_index, write_titles_file, TitleRecord,
};
use crate::format::headers::{BookIndexEntry, ChapterIndexEntry, PageIndexEntry};
use crate::format::textstore::{PageLocation, TextStoreWriter, DEFAULT_BLOCK_SIZE};

/// Output locations for the five stage-1 artifacts.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub books_bin: PathBuf,
    pub pages_idx: PathBuf,
    pub books_idx: PathBuf,
    pub chapters_idx: PathBuf,
    pub titles_bin: PathBuf,
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self::in_dir(Path::new("."))
    }
}

impl CatalogPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            books_bin: dir.join("books.bin"),
            pages_idx: dir.join("pages.idx"),
            books_idx: dir.join("books.idx"),
            chapters_idx: dir.join("chapters.idx"),
            titles_bin: dir.join("titles.bin"),
        }
    }
}

/// What stage 1 produced, for logging and the build manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogSummary {
    pub book_count: u64,
    pub chapter_count: u64,
    pub page_count: u64,
    pub title_count: u64,
    pub block_count: u64,
}

#[derive(Debug)]
struct PageTmp {
    book_id: u32,
    page_number: u32,
    chapter_id: u32,
    location: PageLocation,
    length: u32,
}

#[derive(Debug)]
struct ChapterTmp {
    chapter_id: u32,
    book_id: u32,
    chapter_number: u32,
    title_index: u32,
    first_page_id: u32,
    page_count: u32,
    start_page_number: u32,
}

#[derive(Debug)]
struct BookTmp {
    book_id: u32,
    first_page_id: u32,
    page_count: u32,
    first_chapter_id: u32,
    chapter_count: u32,
    text_start_offset: u64,
    text_end_offset: u64,
    title_index: u32,
}

/// Builder context for the whole export. Everything that the original
/// accumulated process-wide lives here as fields.
pub struct CatalogBuilder {
    text: TextStoreWriter,
    pages: Vec<PageTmp>,
    chapters: Vec<ChapterTmp>,
    books: Vec<BookTmp>,
    titles: Vec<TitleRecord>,
}

impl CatalogBuilder {
    pub fn new(books_bin: &Path, block_size: u32) -> Result<Self> {
        Ok(Self {
            text: TextStoreWriter::create(books_bin, block_size)?,
            pages: Vec::new(),
            chapters: Vec::new(),
            books: Vec::new(),
            titles: Vec::new(),
        })
    }

    /// Export one book: chapter headings first, then the page text.
    pub fn add_book(&mut self, book_id: u32, conn: &Connection) -> Result<()> {
        let first_chapter_id = self.chapters.len() as u32;
        for (i, row) in source::load_titles(conn)?.into_iter().enumerate() {
            let title_index = self.titles.len() as u32;
            self.titles.push(TitleRecord {
                text: row.title,
                flags: 0,
            });
            self.chapters.push(ChapterTmp {
                chapter_id: first_chapter_id + i as u32,
                book_id,
                chapter_number: i as u32 + 1,
                title_index,
                first_page_id: 0,
                page_count: 0,
                start_page_number: row.start_page_number,
            });
        }
        let chapter_count = self.chapters.len() as u32 - first_chapter_id;

        let first_page_id = self.pages.len() as u32;
        let mut current: Option<(u32, String)> = None;
        {
            let pages = &mut self.pages;
            let text = &mut self.text;
            source::for_each_text_row(conn, |page_number, row_text| {
                match &mut current {
                    Some((page, buf)) if *page == page_number => {
                        buf.push_str(row_text);
                        buf.push('\n');
                    }
                    _ => {
                        if let Some((page, buf)) = current.take() {
                            push_page(text, pages, book_id, page, &buf)?;
                        }
                        let mut buf = String::with_capacity(row_text.len() + 1);
                        buf.push_str(row_text);
                        buf.push('\n');
                        current = Some((page_number, buf));
                    }
                }
                Ok(())
            })?;
            if let Some((page, buf)) = current.take() {
                push_page(text, pages, book_id, page, &buf)?;
            }
        }
        let page_count = self.pages.len() as u32 - first_page_id;

        let (text_start_offset, text_end_offset) = if page_count > 0 {
            let first = &self.pages[first_page_id as usize];
            let last = &self.pages[(first_page_id + page_count - 1) as usize];
            (
                first.location.text_offset,
                last.location.text_offset + u64::from(last.length),
            )
        } else {
            (0, 0)
        };

        self.books.push(BookTmp {
            book_id,
            first_page_id,
            page_count,
            first_chapter_id,
            chapter_count,
            text_start_offset,
            text_end_offset,
            title_index: 0,
        });
        Ok(())
    }

    /// Give every chapter its page range: a chapter spans the pages whose
    /// page number lies in `[start, next_start)` where `next_start` is the
    /// first later chapter with a greater starting page number.
    fn assign_chapters(&mut self) {
        for book in &self.books {
            if book.chapter_count == 0 || book.page_count == 0 {
                continue;
            }
            let c_first = book.first_chapter_id as usize;
            let c_last = c_first + book.chapter_count as usize;
            let p_first = book.first_page_id as usize;
            let p_last = p_first + book.page_count as usize;

            for ci in c_first..c_last {
                let start = self.chapters[ci].start_page_number;
                let next_start = self.chapters[ci + 1..c_last]
                    .iter()
                    .find(|c| c.start_page_number > start)
                    .map_or(u32::MAX, |c| c.start_page_number);

                let chapter_id = self.chapters[ci].chapter_id;
                let mut first_page_id = None;
                let mut page_count = 0u32;
                for pi in p_first..p_last {
                    let page = &mut self.pages[pi];
                    if page.page_number < start {
                        continue;
                    }
                    if page.page_number >= next_start {
                        break;
                    }
                    if first_page_id.is_none() {
                        first_page_id = Some(pi as u32);
                    }
                    page.chapter_id = chapter_id;
                    page_count += 1;
                }
                let chapter = &mut self.chapters[ci];
                match first_page_id {
                    Some(first) => {
                        chapter.first_page_id = first;
                        chapter.page_count = page_count;
                    }
                    None => {
                        chapter.first_page_id = 0;
                        chapter.page_count = 0;
                    }
                }
            }
        }
    }

    /// Finalize the text store and write the four catalog indexes.
    pub fn finish(mut self, paths: &CatalogPaths) -> Result<CatalogSummary> {
        self.assign_chapters();
        let (header, _blocks) = self.text.finish()?;

        let page_entries: Vec<PageIndexEntry> = self
            .pages
            .iter()
            .enumerate()
            .map(|(page_id, page)| PageIndexEntry {
                page_id: page_id as u32,
                book_id: page.book_id,
                chapter_id: page.chapter_id,
                page_number: page.page_number,
                block_id: page.location.block_id,
                offset_in_block: page.location.offset_in_block,
                length: page.length,
            })
            .collect();
        write_pages_index(&paths.pages_idx, &page_entries)?;

        let book_entries: Vec<BookIndexEntry> = self
            .books
            .iter()
            .map(|book| BookIndexEntry {
                book_id: book.book_id,
                first_chapter_id: book.first_chapter_id,
                chapter_count: book.chapter_count,
                first_page_id: book.first_page_id,
                page_count: book.page_count,
                title_index: book.title_index,
                text_start_offset: book.text_start_offset,
                text_end_offset: book.text_end_offset,
            })
            .collect();
        write_books_index(&paths.books_idx, &book_entries)?;

        let chapter_entries: Vec<ChapterIndexEntry> = self
            .chapters
            .iter()
            .map(|chapter| ChapterIndexEntry {
                chapter_id: chapter.chapter_id,
                book_id: chapter.book_id,
                chapter_number: chapter.chapter_number,
                first_page_id: chapter.first_page_id,
                page_count: chapter.page_count,
                title_index: chapter.title_index,
            })
            .collect();
        write_chapters_index(&paths.chapters_idx, &chapter_entries)?;

        write_titles_file(&paths.titles_bin, &self.titles)?;

        Ok(CatalogSummary {
            book_count: self.books.len() as u64,
            chapter_count: self.chapters.len() as u64,
            page_count: self.pages.len() as u64,
            title_count: self.titles.len() as u64,
            block_count: header.block_count,
        })
    }
}

fn push_page(
    text: &mut TextStoreWriter,
    pages: &mut Vec<PageTmp>,
    book_id: u32,
    page_number: u32,
    buf: &str,
) -> Result<()> {
    let location = text.append_page(buf.as_bytes())?;
    pages.push(PageTmp {
        book_id,
        page_number,
        chapter_id: 0,
        location,
        length: buf.len() as u32,
    });
    Ok(())
}

/// Stage-1 entry point: export every `NNN.sqlite` under `books_dir`.
///
/// Books whose database cannot be opened are skipped with a warning, like
/// any other unreadable source row.
pub fn run_build_from_sqlite(books_dir: &Path, paths: &CatalogPaths) -> Result<CatalogSummary> {
    let files = source::scan_books_dir(books_dir)?;
    info!(books = files.len(), dir = %books_dir.display(), "exporting source databases");

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.cyan} books [{bar:40.cyan/dim}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut builder = CatalogBuilder::new(&paths.books_bin, DEFAULT_BLOCK_SIZE)?;
    for BookFile { path, book_id } in &files {
        progress.set_message(format!("book {book_id}"));
        match source::open_book(path) {
            Ok(conn) => builder.add_book(*book_id, &conn)?,
            Err(e) => {
                warn!(book_id = *book_id, "skipping unreadable source database: {e}");
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let summary = builder.finish(paths)?;
    info!(
        books = summary.book_count,
        chapters = summary.chapter_count,
        pages = summary.page_count,
        blocks = summary.block_count,
        "catalog written"
    );
    Ok(summary)
}
