// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Stage 5: the word dictionary.
//!
//! A second linear scan over the same sorted occurrence stream, walked in
//! lock-step with the postings file: at every word boundary the current
//! byte cursor into postings.bin is the word's block (pointing at its
//! 4-byte length prefix), so the entry is `(word_hash, cursor, count)` and
//! the cursor advances by `4 + length`. The stream is in hash order, so the
//! dictionary comes out sorted without ever sorting.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::format::headers::{PostingsFileHeader, WordDictEntry, WordsIndexHeader};
use crate::occurrences::OccurrenceRecord;

/// Write one dictionary entry and advance the postings cursor over the
/// corresponding `{u32 length; payload}` block.
fn emit_entry(
    hash: u64,
    count: u64,
    writer: &mut BufWriter<File>,
    postings: &mut BufReader<File>,
    cursor: &mut u64,
) -> Result<()> {
    WordDictEntry {
        word_hash: hash,
        postings_offset: *cursor,
        postings_count: count,
    }
    .write_to(writer)?;

    let mut len_buf = [0u8; 4];
    postings.read_exact(&mut len_buf).map_err(|e| {
        Error::format(format!(
            "postings.bin ends before the dictionary does (word {hash:#018x}): {e}"
        ))
    })?;
    let block_len = u32::from_le_bytes(len_buf);
    postings.seek_relative(i64::from(block_len))?;
    *cursor += 4 + u64::from(block_len);
    Ok(())
}

/// Stage-5 entry point. Returns the dictionary entry count.
pub fn run_build_words_index(
    occ_path: &Path,
    postings_path: &Path,
    out_path: &Path,
) -> Result<u64> {
    let mut postings_file = File::open(postings_path)?;
    let postings_header = PostingsFileHeader::read(&mut postings_file)?;
    let mut postings = BufReader::new(postings_file);
    postings.seek(SeekFrom::Start(postings_header.blocks_data_offset))?;
    let mut postings_cursor = postings_header.blocks_data_offset;

    let mut occurrences = BufReader::new(File::open(occ_path)?);

    let out_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(out_path)?;
    let mut writer = BufWriter::new(out_file);
    WordsIndexHeader { entry_count: 0 }.write(&mut writer)?;

    let mut entry_count = 0u64;
    let mut current: Option<(u64, u64)> = None; // (word_hash, postings_count)

    while let Some(record) = OccurrenceRecord::read_from(&mut occurrences)? {
        match &mut current {
            Some((hash, count)) if *hash == record.word_hash => *count += 1,
            Some((hash, count)) => {
                if record.word_hash < *hash {
                    return Err(Error::format(
                        "occurrence stream is not sorted; run sort_occurrences first",
                    ));
                }
                emit_entry(*hash, *count, &mut writer, &mut postings, &mut postings_cursor)?;
                entry_count += 1;
                current = Some((record.word_hash, 1));
            }
            None => current = Some((record.word_hash, 1)),
        }
    }
    if let Some((hash, count)) = current {
        emit_entry(hash, count, &mut writer, &mut postings, &mut postings_cursor)?;
        entry_count += 1;
    }

    writer.flush()?;
    let mut out_file = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    out_file.seek(SeekFrom::Start(0))?;
    WordsIndexHeader { entry_count }.write(&mut out_file)?;
    out_file.flush()?;

    info!(entries = entry_count, "word dictionary written");
    Ok(entry_count)
}
