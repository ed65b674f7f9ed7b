// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Stage 4: fold the sorted occurrence stream into postings blocks.
//!
//! One linear scan with constant-size state. A word's block is buffered in
//! memory with its `doc_count` and per-document `term_freq` slots written as
//! zeros and back-patched once known; when the word hash changes the block
//! is finalized, optionally compressed, and appended as `{u32 length;
//! payload}`. The header goes out zeroed first and is rewritten at the end
//! with the final totals — the header size is fixed, so the rewrite lands
//! exactly on the original bytes.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::format::headers::{PostingsFileHeader, POSTINGS_FLAG_COMPRESSED};
use crate::occurrences::OccurrenceRecord;
use crate::postings::frame;

/// What stage 4 produced.
#[derive(Debug, Clone, Copy)]
pub struct PostingsSummary {
    pub total_postings: u64,
    pub word_count: u64,
    pub compressed: bool,
}

/// Incremental plain-block builder for one word.
#[derive(Debug)]
struct BlockBuilder {
    buf: Vec<u8>,
    doc_count: u32,
    term_freq: u32,
    term_freq_offset: usize,
    last_page_id: u32,
    last_position: u32,
    have_doc: bool,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            buf: vec![0u8; 4], // doc_count slot, patched in finish()
            doc_count: 0,
            term_freq: 0,
            term_freq_offset: 0,
            last_page_id: 0,
            last_position: 0,
            have_doc: false,
        }
    }

    fn patch_u32(&mut self, offset: usize, value: u32) {
        self.buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn add(&mut self, page_id: u32, position: u32) {
        if !self.have_doc || page_id != self.last_page_id {
            if self.have_doc {
                let offset = self.term_freq_offset;
                let term_freq = self.term_freq;
                self.patch_u32(offset, term_freq);
            }
            let doc_delta = page_id.wrapping_sub(self.last_page_id);
            self.buf.extend_from_slice(&doc_delta.to_le_bytes());
            self.term_freq_offset = self.buf.len();
            self.buf.extend_from_slice(&0u32.to_le_bytes());
            self.doc_count += 1;
            self.term_freq = 0;
            self.last_position = 0;
            self.last_page_id = page_id;
            self.have_doc = true;
        }
        let position_delta = position.wrapping_sub(self.last_position);
        self.buf.extend_from_slice(&position_delta.to_le_bytes());
        self.last_position = position;
        self.term_freq += 1;
    }

    fn finish(mut self) -> Vec<u8> {
        if self.have_doc {
            let offset = self.term_freq_offset;
            let term_freq = self.term_freq;
            self.patch_u32(offset, term_freq);
        }
        let doc_count = self.doc_count;
        self.patch_u32(0, doc_count);
        self.buf
    }
}

fn store_block<W: Write>(writer: &mut W, plain: &[u8]) -> Result<()> {
    let payload = if frame::frames_enabled() {
        frame::compress(plain)?
    } else {
        plain.to_vec()
    };
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(&payload)?;
    Ok(())
}

/// Stage-4 entry point.
pub fn run_build_postings(occ_path: &Path, out_path: &Path) -> Result<PostingsSummary> {
    let mut occurrences = BufReader::new(File::open(occ_path)?);

    let mut out_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(out_path)?;
    let zero_header = PostingsFileHeader {
        flags: 0,
        total_postings: 0,
        block_count: 0,
        block_index_offset: 0,
        blocks_data_offset: PostingsFileHeader::SIZE as u64,
    };
    zero_header.write(&mut out_file)?;
    let mut writer = BufWriter::new(out_file);

    let mut total_postings = 0u64;
    let mut word_count = 0u64;
    let mut current: Option<(u64, BlockBuilder)> = None;
    let mut prev: Option<OccurrenceRecord> = None;

    while let Some(record) = OccurrenceRecord::read_from(&mut occurrences)? {
        if let Some(prev) = prev {
            if record < prev {
                return Err(Error::format(
                    "occurrence stream is not sorted; run sort_occurrences first",
                ));
            }
        }
        prev = Some(record);

        match &mut current {
            Some((hash, builder)) if *hash == record.word_hash => {
                builder.add(record.page_id, record.position);
            }
            _ => {
                if let Some((_, builder)) = current.take() {
                    store_block(&mut writer, &builder.finish())?;
                    word_count += 1;
                }
                let mut builder = BlockBuilder::new();
                builder.add(record.page_id, record.position);
                current = Some((record.word_hash, builder));
            }
        }
        total_postings += 1;
    }
    if let Some((_, builder)) = current.take() {
        store_block(&mut writer, &builder.finish())?;
        word_count += 1;
    }

    writer.flush()?;
    let mut out_file = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    out_file.seek(SeekFrom::Start(0))?;
    let header = PostingsFileHeader {
        flags: if frame::frames_enabled() {
            POSTINGS_FLAG_COMPRESSED
        } else {
            0
        },
        total_postings,
        block_count: 0,
        block_index_offset: 0,
        blocks_data_offset: PostingsFileHeader::SIZE as u64,
    };
    header.write(&mut out_file)?;
    out_file.flush()?;

    info!(
        words = word_count,
        postings = total_postings,
        compressed = frame::frames_enabled(),
        "postings written"
    );
    Ok(PostingsSummary {
        total_postings,
        word_count,
        compressed: frame::frames_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::codec::PostingsList;

    #[test]
    fn block_builder_emits_gap_encoding() {
        let mut builder = BlockBuilder::new();
        // word appears on page 3 at positions 1 and 3, and on page 10 at 5
        builder.add(3, 1);
        builder.add(3, 3);
        builder.add(10, 5);
        let block = builder.finish();

        let words: Vec<u32> = block
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(words, vec![2, 3, 2, 1, 2, 7, 1, 5]);

        let list = PostingsList::parse(&block).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().positions, &[1, 3]);
        assert_eq!(list.get(1).unwrap().page_id, 10);
    }

    #[test]
    fn unsorted_stream_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let occ = dir.path().join("occ.tmp");
        let out = dir.path().join("postings.bin");

        let records = [
            OccurrenceRecord {
                word_hash: 5,
                page_id: 0,
                position: 0,
            },
            OccurrenceRecord {
                word_hash: 3,
                page_id: 0,
                position: 0,
            },
        ];
        let mut buf = Vec::new();
        for r in &records {
            r.write_to(&mut buf).unwrap();
        }
        std::fs::write(&occ, &buf).unwrap();

        let err = run_build_postings(&occ, &out).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn empty_stream_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let occ = dir.path().join("occ.tmp");
        let out = dir.path().join("postings.bin");
        std::fs::write(&occ, b"").unwrap();

        let summary = run_build_postings(&occ, &out).unwrap();
        assert_eq!(summary.total_postings, 0);
        assert_eq!(summary.word_count, 0);
        assert_eq!(
            std::fs::metadata(&out).unwrap().len(),
            PostingsFileHeader::SIZE as u64
        );

        let mut file = File::open(&out).unwrap();
        let header = PostingsFileHeader::read(&mut file).unwrap();
        assert_eq!(header.total_postings, 0);
    }
}
