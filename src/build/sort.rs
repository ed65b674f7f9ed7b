// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Stage 3: external merge-sort of the occurrence stream.
//!
//! Memory is bounded to one in-core run: read up to 64 MiB of records, sort,
//! write a numbered run file; repeat until the input is exhausted; then
//! k-way merge all runs through a min-heap into the output. The comparator
//! is exactly the `(word_hash, page_id, position)` triple order — identical
//! triples may occur and are all preserved, no stability promised.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::occurrences::OccurrenceRecord;

/// In-core run budget in bytes.
const SORT_BUFFER_BYTES: usize = 64 * 1024 * 1024;

struct RunFile {
    reader: BufReader<File>,
    path: PathBuf,
}

/// Removes run files on drop so failures don't leave temp litter behind.
struct RunSet {
    runs: Vec<RunFile>,
}

impl Drop for RunSet {
    fn drop(&mut self) {
        for run in &self.runs {
            let _ = std::fs::remove_file(&run.path);
        }
    }
}

fn run_path(out_path: &Path, index: usize) -> PathBuf {
    let dir = out_path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("occ_run_{index:06}.tmp"))
}

fn write_run(records: &[OccurrenceRecord], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        record.write_to(&mut writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Stage-3 entry point. Returns the number of records written.
pub fn run_sort_occurrences(in_path: &Path, out_path: &Path) -> Result<u64> {
    let record_budget = (SORT_BUFFER_BYTES / OccurrenceRecord::SIZE).max(1);
    let mut input = BufReader::new(File::open(in_path)?);

    // Phase 1: sorted runs.
    let mut run_set = RunSet { runs: Vec::new() };
    let mut buffer: Vec<OccurrenceRecord> = Vec::with_capacity(record_budget.min(1 << 20));
    loop {
        buffer.clear();
        while buffer.len() < record_budget {
            match OccurrenceRecord::read_from(&mut input)? {
                Some(record) => buffer.push(record),
                None => break,
            }
        }
        if buffer.is_empty() {
            break;
        }
        buffer.sort_unstable();

        let path = run_path(out_path, run_set.runs.len());
        write_run(&buffer, &path)?;
        let reader = BufReader::new(File::open(&path)?);
        run_set.runs.push(RunFile { reader, path });

        if buffer.len() < record_budget {
            break;
        }
    }
    debug!(runs = run_set.runs.len(), "sorted runs written");

    // Phase 2: k-way min-merge.
    let mut output = BufWriter::new(File::create(out_path)?);
    let mut heap: BinaryHeap<Reverse<(OccurrenceRecord, usize)>> = BinaryHeap::new();
    for (i, run) in run_set.runs.iter_mut().enumerate() {
        if let Some(record) = OccurrenceRecord::read_from(&mut run.reader)? {
            heap.push(Reverse((record, i)));
        }
    }

    let mut written = 0u64;
    while let Some(Reverse((record, run_index))) = heap.pop() {
        record.write_to(&mut output)?;
        written += 1;
        if let Some(next) = OccurrenceRecord::read_from(&mut run_set.runs[run_index].reader)? {
            heap.push(Reverse((next, run_index)));
        }
    }
    output.flush()?;
    drop(run_set);

    info!(records = written, "occurrence stream sorted");
    Ok(written)
}

/// Diagnostic: check that an occurrence file is in triple order.
pub fn verify_sorted(path: &Path) -> Result<bool> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut prev: Option<OccurrenceRecord> = None;
    while let Some(record) = OccurrenceRecord::read_from(&mut reader)? {
        if let Some(prev) = prev {
            if record < prev {
                return Ok(false);
            }
        }
        prev = Some(record);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_records(path: &Path, records: &[OccurrenceRecord]) {
        let mut writer = BufWriter::new(File::create(path).unwrap());
        for record in records {
            record.write_to(&mut writer).unwrap();
        }
        writer.flush().unwrap();
    }

    fn read_all(path: &Path) -> Vec<OccurrenceRecord> {
        let mut reader = BufReader::new(File::open(path).unwrap());
        let mut out = Vec::new();
        while let Some(record) = OccurrenceRecord::read_from(&mut reader).unwrap() {
            out.push(record);
        }
        out
    }

    #[test]
    fn sorts_into_triple_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("occurrences.tmp");
        let output = dir.path().join("occurrences.sorted.tmp");

        let mut records = Vec::new();
        for i in 0..1000u32 {
            records.push(OccurrenceRecord {
                word_hash: u64::from(i % 7) * 0x1234_5678,
                page_id: (1000 - i) % 13,
                position: i % 5,
            });
        }
        write_records(&input, &records);

        let written = run_sort_occurrences(&input, &output).unwrap();
        assert_eq!(written, 1000);
        assert!(verify_sorted(&output).unwrap());

        let sorted = read_all(&output);
        assert_eq!(sorted.len(), records.len());
        let mut expected = records.clone();
        expected.sort_unstable();
        assert_eq!(sorted, expected);

        // run files are gone
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("occ_run_"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn duplicate_triples_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tmp");
        let output = dir.path().join("out.tmp");

        let record = OccurrenceRecord {
            word_hash: 9,
            page_id: 1,
            position: 2,
        };
        write_records(&input, &[record, record, record]);
        assert_eq!(run_sort_occurrences(&input, &output).unwrap(), 3);
        assert_eq!(read_all(&output), vec![record, record, record]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.tmp");
        let output = dir.path().join("out.tmp");
        std::fs::write(&input, b"").unwrap();
        assert_eq!(run_sort_occurrences(&input, &output).unwrap(), 0);
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 0);
    }
}
