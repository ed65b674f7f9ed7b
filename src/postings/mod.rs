// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Positional postings: codec and cursor algebra.
//!
//! One word's postings are a self-describing stream of little-endian `u32`s:
//!
//! ```text
//! doc_count
//! repeated doc_count times:
//!     doc_delta       ; first doc: delta from 0, i.e. the page_id itself
//!     term_freq
//!     position_delta × term_freq
//! ```
//!
//! Page ids and positions are reconstructed by running sums, so every stored
//! gap is positive and both sequences decode strictly increasing. A block
//! may additionally be stored as a single compression frame; the postings
//! file header says which, and by the time anything in this module sees the
//! bytes they are always the plain encoding above.
//!
//! Two consumers, two shapes: [`PostingsList`] materializes a block into an
//! owned entry array plus one positions arena (query-side ranking wants
//! random access), while [`PostingsCursor`] streams postings one at a time
//! into a caller-provided buffer and never allocates (the cursor algebra
//! wants lock-step merges over lists that may be huge).

pub mod algebra;
pub mod codec;
pub mod frame;

pub use algebra::{
    adjacent_count, AndCursor, DocCursor, DocPosting, DocStream, OrCursor, PhraseAndCursor,
};
pub use codec::{encode_block, CursorPosting, ListPosting, Posting, PostingsCursor, PostingsList};
