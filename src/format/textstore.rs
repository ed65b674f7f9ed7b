// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! The books.bin block store.
//!
//! Page text is packed into fixed-capacity blocks written end-to-end after
//! the header, with the block index appended at the end and the header
//! rewritten once the final offsets are known. A page never straddles two
//! blocks: the writer flushes early instead, so every locator satisfies
//! `offset_in_block + length <= block.uncompressed_size` and a page resolves
//! with a single seek-and-read. Pages larger than the block capacity are a
//! build error.
//!
//! Version 1 stores blocks uncompressed; the `compressed_*` entry fields
//! mirror the uncompressed values and readers already resolve through them,
//! so a compressed version 2 only has to change the writer.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use super::headers::{BlockIndexEntry, BooksFileHeader, PageIndexEntry};
use crate::error::{Error, Result};

/// Default block capacity: 64 KiB.
pub const DEFAULT_BLOCK_SIZE: u32 = 1 << 16;

/// Where a page landed inside the store.
#[derive(Debug, Clone, Copy)]
pub struct PageLocation {
    /// Global offset into the uncompressed text stream.
    pub text_offset: u64,
    pub block_id: u32,
    pub offset_in_block: u32,
}

/// Streaming writer for books.bin.
pub struct TextStoreWriter {
    file: File,
    block_size: u32,
    block_buf: Vec<u8>,
    blocks: Vec<BlockIndexEntry>,
    uncompressed_offset: u64,
    block_uncompressed_start: u64,
    next_file_offset: u64,
}

impl TextStoreWriter {
    /// Create the store, writing a zeroed header that `finish` rewrites.
    pub fn create(path: &Path, block_size: u32) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::Usage("block size must be non-zero".into()));
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let header = BooksFileHeader {
            compression: 0,
            block_size,
            block_count: 0,
            index_offset: 0,
        };
        header.write(&mut file)?;
        Ok(Self {
            file,
            block_size,
            block_buf: Vec::with_capacity(block_size as usize),
            blocks: Vec::new(),
            uncompressed_offset: 0,
            block_uncompressed_start: 0,
            next_file_offset: BooksFileHeader::SIZE as u64,
        })
    }

    /// Current global text offset (the offset the next page will get).
    pub fn text_offset(&self) -> u64 {
        self.uncompressed_offset
    }

    /// Append one page's text, keeping it inside a single block.
    pub fn append_page(&mut self, data: &[u8]) -> Result<PageLocation> {
        if data.len() > self.block_size as usize {
            return Err(Error::CapacityExceeded(format!(
                "page of {} bytes exceeds block size {}",
                data.len(),
                self.block_size
            )));
        }
        if !self.block_buf.is_empty() && self.block_buf.len() + data.len() > self.block_size as usize
        {
            self.flush_block()?;
        }
        if self.block_buf.is_empty() {
            self.block_uncompressed_start = self.uncompressed_offset;
        }

        let location = PageLocation {
            text_offset: self.uncompressed_offset,
            block_id: self.blocks.len() as u32,
            offset_in_block: self.block_buf.len() as u32,
        };
        self.block_buf.extend_from_slice(data);
        self.uncompressed_offset += data.len() as u64;
        if self.block_buf.len() == self.block_size as usize {
            self.flush_block()?;
        }
        Ok(location)
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.block_buf.is_empty() {
            return Ok(());
        }
        self.file.seek(SeekFrom::Start(self.next_file_offset))?;
        self.file.write_all(&self.block_buf)?;
        self.blocks.push(BlockIndexEntry {
            uncompressed_offset: self.block_uncompressed_start,
            uncompressed_size: self.block_buf.len() as u32,
            compressed_offset: self.next_file_offset,
            compressed_size: self.block_buf.len() as u32,
        });
        self.next_file_offset += self.block_buf.len() as u64;
        self.block_buf.clear();
        Ok(())
    }

    /// Flush the tail block, append the block index and rewrite the header.
    pub fn finish(mut self) -> Result<(BooksFileHeader, Vec<BlockIndexEntry>)> {
        self.flush_block()?;
        let index_offset = self.next_file_offset;

        self.file.seek(SeekFrom::Start(index_offset))?;
        let mut writer = BufWriter::new(&mut self.file);
        for block in &self.blocks {
            block.write_to(&mut writer)?;
        }
        writer.flush()?;
        drop(writer);

        let header = BooksFileHeader {
            compression: 0,
            block_size: self.block_size,
            block_count: self.blocks.len() as u64,
            index_offset,
        };
        self.file.seek(SeekFrom::Start(0))?;
        header.write(&mut self.file)?;
        self.file.flush()?;
        debug!(
            blocks = self.blocks.len(),
            text_bytes = self.uncompressed_offset,
            "text store finalized"
        );
        Ok((header, self.blocks))
    }
}

/// Read-only view of books.bin: header plus the loaded block index.
pub struct TextStore {
    file: File,
    header: BooksFileHeader,
    blocks: Vec<BlockIndexEntry>,
}

impl TextStore {
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let header = BooksFileHeader::read(&mut file)?;
        let file_len = file.metadata()?.len();

        if header.block_count == 0 {
            return Err(Error::format("books.bin has zero blocks"));
        }
        let index_bytes = header
            .block_count
            .checked_mul(BlockIndexEntry::SIZE as u64)
            .ok_or_else(|| Error::format("books.bin block count overflows"))?;
        if header.index_offset < BooksFileHeader::SIZE as u64
            || header.index_offset.checked_add(index_bytes).is_none()
            || header.index_offset + index_bytes > file_len
        {
            return Err(Error::format(format!(
                "books.bin block index out of range (offset {}, {} blocks, file {} bytes)",
                header.index_offset, header.block_count, file_len
            )));
        }

        file.seek(SeekFrom::Start(header.index_offset))?;
        let mut reader = BufReader::new(&mut file);
        let mut blocks = Vec::with_capacity(header.block_count as usize);
        for _ in 0..header.block_count {
            blocks.push(BlockIndexEntry::read_from(&mut reader)?);
        }
        drop(reader);

        Ok(Self {
            file,
            header,
            blocks,
        })
    }

    pub fn header(&self) -> &BooksFileHeader {
        &self.header
    }

    pub fn blocks(&self) -> &[BlockIndexEntry] {
        &self.blocks
    }

    /// Load one page's text bytes via its locator.
    pub fn read_page(&mut self, entry: &PageIndexEntry) -> Result<Vec<u8>> {
        if entry.length == 0 {
            return Ok(Vec::new());
        }
        let block = self
            .blocks
            .get(entry.block_id as usize)
            .ok_or_else(|| {
                Error::format(format!(
                    "page {} block_id {} out of range ({} blocks)",
                    entry.page_id,
                    entry.block_id,
                    self.blocks.len()
                ))
            })?;
        let end = u64::from(entry.offset_in_block) + u64::from(entry.length);
        if end > u64::from(block.uncompressed_size) {
            return Err(Error::format(format!(
                "page {} locator {}..{} exceeds block {} size {}",
                entry.page_id, entry.offset_in_block, end, entry.block_id, block.uncompressed_size
            )));
        }

        let file_offset = block.compressed_offset + u64::from(entry.offset_in_block);
        self.file.seek(SeekFrom::Start(file_offset))?;
        let mut buf = vec![0u8; entry.length as usize];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}
