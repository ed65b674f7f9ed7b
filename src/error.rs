// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Crate-wide error type.
//!
//! Build tools abort on the first fatal error: no partial artifact is ever
//! considered valid. Query tools are softer; a dictionary miss or an empty
//! postings block is "no results", not an error, and never surfaces here.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Underlying file I/O failed (open, read, write, seek) or hit EOF
    /// where more bytes were required.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// On-disk data is not what the format promises: bad magic, unsupported
    /// version, counts that point outside the file, malformed UTF-8,
    /// truncated block payloads.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A caller-provided buffer or a fixed-size table ran out of room.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Two distinct tokenized byte sequences share a primary hash. Identity
    /// is hash-only, so this is unrecoverable; the build must abort.
    #[error("hash collision detected on word hash {hash:#018x}")]
    HashCollision { hash: u64 },

    /// A required entity is absent (fatal only on the build side).
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading a source database failed.
    #[error("source database: {0}")]
    Source(#[from] rusqlite::Error),

    /// Command-line misuse, e.g. an odd number of category paths.
    #[error("usage: {0}")]
    Usage(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidFormat`] with a formatted message.
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::InvalidFormat(msg.into())
    }
}
