// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! The source-database boundary.
//!
//! Books arrive as one SQLite file per book, named `NNN.sqlite` where the
//! numeric stem is the book id. Inside, the `title` table carries chapter
//! headings (`tit`) keyed by the page number they start on (`id`), and the
//! `book` table carries the page text (`nass`) in page order. Everything the
//! core consumes from a source database flows through this module; the rest
//! of the crate never sees SQL.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::warn;

use crate::error::{Error, Result};

/// A discovered source database and the book id from its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFile {
    pub path: PathBuf,
    pub book_id: u32,
}

/// One chapter heading row: the title text and the page number the chapter
/// starts on.
#[derive(Debug, Clone)]
pub struct TitleRow {
    pub title: String,
    pub start_page_number: u32,
}

/// Find all `NNN.sqlite` files under `dir`, sorted by book id.
pub fn scan_books_dir(dir: &Path) -> Result<Vec<BookFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open books directory {}: {e}", dir.display()),
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(book_id) = numeric_sqlite_stem(name) else {
            continue;
        };
        files.push(BookFile {
            path: entry.path(),
            book_id,
        });
    }
    files.sort_by_key(|f| f.book_id);
    Ok(files)
}

/// `"042.sqlite"` -> `Some(42)`; anything else -> `None`.
fn numeric_sqlite_stem(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(".sqlite")?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Open a source database read-only.
pub fn open_book(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    Ok(conn)
}

/// Load the chapter heading rows for a book. A missing `title` table is an
/// empty chapter list, not an error; source databases vary.
pub fn load_titles(conn: &Connection) -> Result<Vec<TitleRow>> {
    let mut stmt = match conn.prepare("SELECT tit, lvl, sub, id FROM title ORDER BY id") {
        Ok(stmt) => stmt,
        Err(e) => {
            warn!("no usable title table: {e}");
            return Ok(Vec::new());
        }
    };

    let rows = stmt.query_map([], |row| {
        let title: Option<String> = row.get(0)?;
        let start: i64 = row.get(3)?;
        Ok((title, start))
    })?;

    let mut titles = Vec::new();
    for row in rows {
        let (title, start) = row?;
        let Some(title) = title.filter(|t| !t.is_empty()) else {
            continue;
        };
        titles.push(TitleRow {
            title,
            start_page_number: u32::try_from(start).unwrap_or(0),
        });
    }
    Ok(titles)
}

/// Stream the text rows of a book in `(page, id)` order, invoking `emit`
/// with each row's page number and text. Rows with empty text are skipped.
pub fn for_each_text_row(
    conn: &Connection,
    mut emit: impl FnMut(u32, &str) -> Result<()>,
) -> Result<()> {
    let mut stmt = match conn.prepare("SELECT nass, id, page, part FROM book ORDER BY page, id") {
        Ok(stmt) => stmt,
        Err(e) => {
            warn!("no usable book table: {e}");
            return Ok(());
        }
    };

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let text: Option<String> = row.get(0)?;
        let page: i64 = row.get(2)?;
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            continue;
        };
        emit(u32::try_from(page).unwrap_or(0), &text)?;
    }
    Ok(())
}
