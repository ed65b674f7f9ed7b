// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Stage 2: emit `(word_hash, page_id, position)` triples for every page.
//!
//! The page range is split evenly across OS threads; each worker opens its
//! own read handle into books.bin, tokenizes its pages, and appends records
//! to the shared output file. Two locks, held briefly and never across
//! multi-record I/O: one around each single-record write, one around each
//! probe of the vocabulary table.
//!
//! The vocabulary table exists purely to catch hash collisions while the
//! words are still in memory. Identity is hash-only on disk, so a collision
//! silently merges two words — the probe table turns that into a hard build
//! failure instead. Each primary hash remembers a secondary digest (same
//! function, different seed); a primary match with a secondary mismatch is
//! a collision and aborts the build.
//!
//! The raw occurrence file has no ordering guarantee; stage 3 imposes it.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::format::catalog::read_pages_index;
use crate::format::headers::{BlockIndexEntry, PageIndexEntry};
use crate::format::textstore::TextStore;
use crate::hash::{hash_word, COLLISION_PROBE_SEED, PRIMARY_SEED};
use crate::occurrences::OccurrenceRecord;
use crate::tokenize::normalize_and_tokenize;

/// Environment override for the worker count (positive integer, capped).
pub const THREADS_ENV_VAR: &str = "JH_OCC_THREADS";

/// Hard cap on workers regardless of CPU count or override.
pub const MAX_THREADS: usize = 32;

/// Vocabulary probe table slots (power of two).
const VOCAB_TABLE_SLOTS: usize = 1 << 20;

// ============================================================================
// COLLISION PROBE TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct VocabSlot {
    hash1: u64,
    hash2: u64,
    used: bool,
}

/// Open-addressing table keyed by primary hash, storing a secondary digest
/// per entry. Power-of-two sized; linear probing; "full" is fatal.
#[derive(Debug)]
pub struct VocabTable {
    slots: Vec<VocabSlot>,
}

impl VocabTable {
    /// `slot_count` must be a power of two.
    pub fn new(slot_count: usize) -> Self {
        debug_assert!(slot_count.is_power_of_two());
        Self {
            slots: vec![VocabSlot::default(); slot_count],
        }
    }

    /// Record one word, or fail on a collision or a full table.
    pub fn probe(&mut self, hash1: u64, hash2: u64) -> Result<()> {
        let mask = self.slots.len() - 1;
        let mut idx = (hash1 as usize) & mask;
        let mut probed = 0;
        loop {
            let slot = &mut self.slots[idx];
            if !slot.used {
                *slot = VocabSlot {
                    hash1,
                    hash2,
                    used: true,
                };
                return Ok(());
            }
            if slot.hash1 == hash1 {
                if slot.hash2 == hash2 {
                    return Ok(());
                }
                return Err(Error::HashCollision { hash: hash1 });
            }
            idx = (idx + 1) & mask;
            probed += 1;
            if probed >= self.slots.len() {
                return Err(Error::CapacityExceeded(
                    "vocabulary probe table full".into(),
                ));
            }
        }
    }
}

// ============================================================================
// THREAD POLICY
// ============================================================================

/// Worker count: `min(page_count, min(32, online CPUs))`, overridable by
/// `JH_OCC_THREADS`. An unparsable override falls back to auto-detection.
/// Zero pages yields zero threads; callers treat that as fatal.
pub fn detect_thread_count(page_count: u32) -> usize {
    if page_count == 0 {
        return 0;
    }
    if let Ok(value) = std::env::var(THREADS_ENV_VAR) {
        if let Ok(n) = value.trim().parse::<u64>() {
            if n > 0 {
                return n.min(u64::from(page_count)).min(MAX_THREADS as u64) as usize;
            }
        }
    }
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    cpus.min(MAX_THREADS).min(page_count as usize).max(1)
}

// ============================================================================
// STAGE ENTRY POINT
// ============================================================================

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn read_page_bytes(
    file: &mut File,
    blocks: &[BlockIndexEntry],
    entry: &PageIndexEntry,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let block = blocks.get(entry.block_id as usize).ok_or_else(|| {
        Error::format(format!(
            "page {} block_id {} out of range ({} blocks)",
            entry.page_id,
            entry.block_id,
            blocks.len()
        ))
    })?;
    let end = u64::from(entry.offset_in_block) + u64::from(entry.length);
    if end > u64::from(block.uncompressed_size) {
        return Err(Error::format(format!(
            "page {} locator exceeds block {} size",
            entry.page_id, entry.block_id
        )));
    }
    file.seek(SeekFrom::Start(
        block.compressed_offset + u64::from(entry.offset_in_block),
    ))?;
    buf.resize(entry.length as usize, 0);
    file.read_exact(buf)?;
    Ok(())
}

fn occurrence_worker(
    books_path: &Path,
    blocks: &[BlockIndexEntry],
    pages: &[PageIndexEntry],
    out: &Mutex<BufWriter<File>>,
    vocab: &Mutex<VocabTable>,
) -> Result<u64> {
    let mut books = File::open(books_path)?;
    let mut page_buf = Vec::new();
    let mut workspace = Vec::new();
    let mut emitted = 0u64;

    for entry in pages {
        if entry.length == 0 {
            continue;
        }
        read_page_bytes(&mut books, blocks, entry, &mut page_buf)?;
        workspace.resize(page_buf.len(), 0);
        let tokens = normalize_and_tokenize(&page_buf, &mut workspace)?;

        for token in &tokens {
            let bytes = token.text.as_bytes();
            let hash1 = hash_word(bytes, PRIMARY_SEED);
            let hash2 = hash_word(bytes, COLLISION_PROBE_SEED);
            lock_ignoring_poison(vocab).probe(hash1, hash2)?;

            let record = OccurrenceRecord {
                word_hash: hash1,
                page_id: entry.page_id,
                position: token.position,
            };
            record.write_to(&mut *lock_ignoring_poison(out))?;
            emitted += 1;
        }
    }
    Ok(emitted)
}

/// Stage-2 entry point. Returns the number of records emitted.
pub fn run_build_occurrences(
    books_path: &Path,
    pages_idx_path: &Path,
    out_path: &Path,
) -> Result<u64> {
    let store = TextStore::open(books_path)?;
    let pages = read_pages_index(pages_idx_path)?;
    if pages.is_empty() {
        return Err(Error::format("pages.idx has zero pages, nothing to index"));
    }

    let thread_count = detect_thread_count(pages.len() as u32);
    info!(
        pages = pages.len(),
        threads = thread_count,
        "emitting occurrences"
    );

    let out = Mutex::new(BufWriter::new(File::create(out_path)?));
    let vocab = Mutex::new(VocabTable::new(VOCAB_TABLE_SLOTS));
    let blocks = store.blocks();

    let mut total = 0u64;
    std::thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::with_capacity(thread_count);
        for ti in 0..thread_count {
            let start = pages.len() * ti / thread_count;
            let end = pages.len() * (ti + 1) / thread_count;
            let chunk = &pages[start..end];
            let out = &out;
            let vocab = &vocab;
            handles.push(
                scope.spawn(move || occurrence_worker(books_path, blocks, chunk, out, vocab)),
            );
        }
        for handle in handles {
            total += handle
                .join()
                .map_err(|_| Error::format("occurrence worker panicked"))??;
        }
        Ok(())
    })?;

    let writer = match out.into_inner() {
        Ok(writer) => writer,
        Err(poisoned) => poisoned.into_inner(),
    };
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?
        .flush()?;

    debug!(records = total, "occurrence stream written");
    Ok(total)
}
