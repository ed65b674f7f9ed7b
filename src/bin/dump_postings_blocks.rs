// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Inspect postings.bin: header fields plus a table of every length-framed
//! block with stored and plain sizes.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use jamharah::error::Result;
use jamharah::format::headers::PostingsFileHeader;
use jamharah::format::FORMAT_VERSION;
use jamharah::postings::frame;

#[derive(Parser)]
#[command(name = "dump_postings_blocks", about = "Dump postings.bin block layout")]
struct Args {
    #[arg(default_value = "postings.bin")]
    postings_bin: PathBuf,
}

fn run(args: &Args) -> Result<()> {
    let mut file = File::open(&args.postings_bin)?;
    let header = PostingsFileHeader::read(&mut file)?;
    let file_size = file.metadata()?.len();

    println!("postings file: {}", args.postings_bin.display());
    println!(
        "version: {FORMAT_VERSION} flags: {} total_postings: {}",
        header.flags, header.total_postings
    );
    println!(
        "blocks_data_offset: {} file_size: {file_size}",
        header.blocks_data_offset
    );
    if header.is_compressed() {
        println!("compression: frame (flag bit 0 set)");
    } else {
        println!("compression: none (flag bit 0 clear)");
    }

    println!("index  offset  stored_bytes  plain_bytes  ratio");
    let mut offset = header.blocks_data_offset;
    let mut block_index = 0u64;
    let mut total_stored = 0u64;
    let mut total_plain = 0u64;

    file.seek(SeekFrom::Start(offset))?;
    while offset + 4 <= file_size {
        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf)?;
        let stored = u64::from(u32::from_le_bytes(len_buf));
        if offset + 4 + stored > file_size {
            break;
        }

        let plain = if header.is_compressed() {
            let mut payload = vec![0u8; stored as usize];
            file.read_exact(&mut payload)?;
            frame::decompress(&payload)?.len() as u64
        } else {
            file.seek(SeekFrom::Current(stored as i64))?;
            stored
        };

        let ratio = if plain > 0 {
            stored as f64 / plain as f64
        } else {
            1.0
        };
        println!("{block_index:6}  {offset:10}  {stored:12}  {plain:11}  {ratio:.4}");

        total_stored += stored;
        total_plain += plain;
        offset += 4 + stored;
        block_index += 1;
    }

    println!("total stored bytes: {total_stored}");
    if total_plain > 0 {
        println!("total plain bytes: {total_plain}");
        println!(
            "overall ratio: {:.4}",
            total_stored as f64 / total_plain as f64
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    jamharah::init_cli_logging();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[dump_postings_blocks] {e}");
            ExitCode::FAILURE
        }
    }
}
