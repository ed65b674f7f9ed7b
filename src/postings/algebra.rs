// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Cursor algebra: AND, OR and phrase-AND as lock-step zipper merges.
//!
//! Every operator holds at most the current posting of each input and always
//! advances the side whose page id is smallest (ties advance both). Because
//! the output shape is again `(page_id, term_freq)`, operators compose into
//! trees: an AND can feed an OR can feed an AND. Document-level outputs
//! carry no positions — callers that need positions re-open materialized
//! lists instead.

use std::cmp::Ordering;

use super::codec::PostingsCursor;
use crate::error::Result;

/// A document-level posting as produced by the algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocPosting {
    pub page_id: u32,
    pub term_freq: u32,
}

/// Anything that yields `(page_id, term_freq)` pairs in increasing page
/// order. Implemented by the base cursor adapter and by every operator, so
/// the algebra closes over itself.
pub trait DocStream {
    fn next_doc(&mut self) -> Result<Option<DocPosting>>;
}

/// Adapts a [`PostingsCursor`] into a [`DocStream`], decoding positions into
/// a caller-provided buffer and discarding them.
#[derive(Debug)]
pub struct DocCursor<'a, 'buf> {
    cursor: PostingsCursor<'a>,
    pos_buf: &'buf mut [u32],
}

impl<'a, 'buf> DocCursor<'a, 'buf> {
    pub fn new(cursor: PostingsCursor<'a>, pos_buf: &'buf mut [u32]) -> Self {
        Self { cursor, pos_buf }
    }
}

impl DocStream for DocCursor<'_, '_> {
    fn next_doc(&mut self) -> Result<Option<DocPosting>> {
        Ok(self.cursor.next(self.pos_buf)?.map(|p| DocPosting {
            page_id: p.page_id,
            term_freq: p.term_freq,
        }))
    }
}

// ============================================================================
// AND
// ============================================================================

/// Intersection: emits pages present in both inputs with summed term_freq.
#[derive(Debug)]
pub struct AndCursor<A, B> {
    a: A,
    b: B,
    cur_a: Option<DocPosting>,
    cur_b: Option<DocPosting>,
    primed: bool,
}

impl<A: DocStream, B: DocStream> AndCursor<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a,
            b,
            cur_a: None,
            cur_b: None,
            primed: false,
        }
    }

    fn prime(&mut self) -> Result<()> {
        if !self.primed {
            self.cur_a = self.a.next_doc()?;
            self.cur_b = self.b.next_doc()?;
            self.primed = true;
        }
        Ok(())
    }
}

impl<A: DocStream, B: DocStream> DocStream for AndCursor<A, B> {
    fn next_doc(&mut self) -> Result<Option<DocPosting>> {
        self.prime()?;
        while let (Some(a), Some(b)) = (self.cur_a, self.cur_b) {
            match a.page_id.cmp(&b.page_id) {
                Ordering::Equal => {
                    let out = DocPosting {
                        page_id: a.page_id,
                        term_freq: a.term_freq.saturating_add(b.term_freq),
                    };
                    self.cur_a = self.a.next_doc()?;
                    self.cur_b = self.b.next_doc()?;
                    return Ok(Some(out));
                }
                Ordering::Less => self.cur_a = self.a.next_doc()?,
                Ordering::Greater => self.cur_b = self.b.next_doc()?,
            }
        }
        Ok(None)
    }
}

// ============================================================================
// OR
// ============================================================================

/// Union: emits every page from either input, merging term_freq on ties.
#[derive(Debug)]
pub struct OrCursor<A, B> {
    a: A,
    b: B,
    cur_a: Option<DocPosting>,
    cur_b: Option<DocPosting>,
    primed: bool,
}

impl<A: DocStream, B: DocStream> OrCursor<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a,
            b,
            cur_a: None,
            cur_b: None,
            primed: false,
        }
    }

    fn prime(&mut self) -> Result<()> {
        if !self.primed {
            self.cur_a = self.a.next_doc()?;
            self.cur_b = self.b.next_doc()?;
            self.primed = true;
        }
        Ok(())
    }
}

impl<A: DocStream, B: DocStream> DocStream for OrCursor<A, B> {
    fn next_doc(&mut self) -> Result<Option<DocPosting>> {
        self.prime()?;
        match (self.cur_a, self.cur_b) {
            (Some(a), None) => {
                self.cur_a = self.a.next_doc()?;
                Ok(Some(a))
            }
            (None, Some(b)) => {
                self.cur_b = self.b.next_doc()?;
                Ok(Some(b))
            }
            (Some(a), Some(b)) => match a.page_id.cmp(&b.page_id) {
                Ordering::Equal => {
                    let out = DocPosting {
                        page_id: a.page_id,
                        term_freq: a.term_freq.saturating_add(b.term_freq),
                    };
                    self.cur_a = self.a.next_doc()?;
                    self.cur_b = self.b.next_doc()?;
                    Ok(Some(out))
                }
                Ordering::Less => {
                    self.cur_a = self.a.next_doc()?;
                    Ok(Some(a))
                }
                Ordering::Greater => {
                    self.cur_b = self.b.next_doc()?;
                    Ok(Some(b))
                }
            },
            (None, None) => Ok(None),
        }
    }
}

// ============================================================================
// PHRASE-AND (two terms, offset 1)
// ============================================================================

/// Count alignments where a position in `a` is immediately followed by a
/// position in `b` (`pa + 1 == pb`). Both slices are sorted; one zipper pass.
pub fn adjacent_count(a: &[u32], b: &[u32]) -> u32 {
    let mut i = 0;
    let mut j = 0;
    let mut count = 0;
    while i < a.len() && j < b.len() {
        let want = a[i].wrapping_add(1);
        match want.cmp(&b[j]) {
            Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    count
}

/// Adjacency phrase merge over two streaming cursors: emits `(page_id,
/// alignment_count)` for pages where the second term directly follows the
/// first at least once. Needs positions, so it works on raw cursors with
/// caller-provided buffers rather than on [`DocStream`] inputs.
#[derive(Debug)]
pub struct PhraseAndCursor<'a, 'buf> {
    a: PostingsCursor<'a>,
    b: PostingsCursor<'a>,
    buf_a: &'buf mut [u32],
    buf_b: &'buf mut [u32],
    cur_a: Option<DocPosting>,
    cur_b: Option<DocPosting>,
    primed: bool,
}

impl<'a, 'buf> PhraseAndCursor<'a, 'buf> {
    pub fn new(
        a: PostingsCursor<'a>,
        b: PostingsCursor<'a>,
        buf_a: &'buf mut [u32],
        buf_b: &'buf mut [u32],
    ) -> Self {
        Self {
            a,
            b,
            buf_a,
            buf_b,
            cur_a: None,
            cur_b: None,
            primed: false,
        }
    }

    fn advance_a(&mut self) -> Result<()> {
        self.cur_a = self.a.next(self.buf_a)?.map(|p| DocPosting {
            page_id: p.page_id,
            term_freq: p.term_freq,
        });
        Ok(())
    }

    fn advance_b(&mut self) -> Result<()> {
        self.cur_b = self.b.next(self.buf_b)?.map(|p| DocPosting {
            page_id: p.page_id,
            term_freq: p.term_freq,
        });
        Ok(())
    }
}

impl DocStream for PhraseAndCursor<'_, '_> {
    fn next_doc(&mut self) -> Result<Option<DocPosting>> {
        if !self.primed {
            self.advance_a()?;
            self.advance_b()?;
            self.primed = true;
        }
        while let (Some(a), Some(b)) = (self.cur_a, self.cur_b) {
            match a.page_id.cmp(&b.page_id) {
                Ordering::Equal => {
                    let count = adjacent_count(
                        &self.buf_a[..a.term_freq as usize],
                        &self.buf_b[..b.term_freq as usize],
                    );
                    self.advance_a()?;
                    self.advance_b()?;
                    if count > 0 {
                        return Ok(Some(DocPosting {
                            page_id: a.page_id,
                            term_freq: count,
                        }));
                    }
                }
                Ordering::Less => self.advance_a()?,
                Ordering::Greater => self.advance_b()?,
            }
        }
        Ok(None)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::codec::{encode_block, Posting};

    fn block(postings: &[(u32, &[u32])]) -> Vec<u8> {
        let postings: Vec<Posting> = postings
            .iter()
            .map(|(page_id, positions)| Posting {
                page_id: *page_id,
                positions: positions.to_vec(),
            })
            .collect();
        let mut buf = Vec::new();
        encode_block(&postings, &mut buf);
        buf
    }

    fn drain(mut stream: impl DocStream) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        while let Some(p) = stream.next_doc().unwrap() {
            out.push((p.page_id, p.term_freq));
        }
        out
    }

    #[test]
    fn and_emits_only_shared_pages() {
        let a = block(&[(3, &[2]), (20, &[5])]);
        let b = block(&[(3, &[3]), (30, &[6])]);
        let mut buf_a = [0u32; 8];
        let mut buf_b = [0u32; 8];
        let and = AndCursor::new(
            DocCursor::new(PostingsCursor::new(&a).unwrap(), &mut buf_a),
            DocCursor::new(PostingsCursor::new(&b).unwrap(), &mut buf_b),
        );
        assert_eq!(drain(and), vec![(3, 2)]);
    }

    #[test]
    fn or_merges_both_sides() {
        let a = block(&[(3, &[2]), (20, &[5])]);
        let b = block(&[(3, &[3]), (30, &[6])]);
        let mut buf_a = [0u32; 8];
        let mut buf_b = [0u32; 8];
        let or = OrCursor::new(
            DocCursor::new(PostingsCursor::new(&a).unwrap(), &mut buf_a),
            DocCursor::new(PostingsCursor::new(&b).unwrap(), &mut buf_b),
        );
        assert_eq!(drain(or), vec![(3, 2), (20, 1), (30, 1)]);
    }

    #[test]
    fn phrase_matches_adjacent_positions() {
        let a = block(&[(3, &[2]), (20, &[5])]);
        let b = block(&[(3, &[3]), (30, &[6])]);
        let mut buf_a = [0u32; 8];
        let mut buf_b = [0u32; 8];
        let phrase = PhraseAndCursor::new(
            PostingsCursor::new(&a).unwrap(),
            PostingsCursor::new(&b).unwrap(),
            &mut buf_a,
            &mut buf_b,
        );
        // position 2 in A is followed by position 3 in B
        assert_eq!(drain(phrase), vec![(3, 1)]);
    }

    #[test]
    fn phrase_skips_cooccurring_but_nonadjacent_pages() {
        let a = block(&[(5, &[10, 40])]);
        let b = block(&[(5, &[20, 50])]);
        let mut buf_a = [0u32; 8];
        let mut buf_b = [0u32; 8];
        let phrase = PhraseAndCursor::new(
            PostingsCursor::new(&a).unwrap(),
            PostingsCursor::new(&b).unwrap(),
            &mut buf_a,
            &mut buf_b,
        );
        assert!(drain(phrase).is_empty());
    }

    #[test]
    fn adjacent_count_counts_each_alignment_once() {
        assert_eq!(adjacent_count(&[1, 2, 3], &[2, 3, 4]), 3);
        assert_eq!(adjacent_count(&[0, 10], &[1, 12]), 1);
        assert_eq!(adjacent_count(&[], &[1]), 0);
        assert_eq!(adjacent_count(&[7], &[]), 0);
    }

    #[test]
    fn operators_compose() {
        // (A AND B) OR C
        let a = block(&[(1, &[0]), (4, &[0]), (9, &[0])]);
        let b = block(&[(4, &[1]), (9, &[1])]);
        let c = block(&[(2, &[0]), (9, &[2])]);
        let mut buf_a = [0u32; 4];
        let mut buf_b = [0u32; 4];
        let mut buf_c = [0u32; 4];
        let and = AndCursor::new(
            DocCursor::new(PostingsCursor::new(&a).unwrap(), &mut buf_a),
            DocCursor::new(PostingsCursor::new(&b).unwrap(), &mut buf_b),
        );
        let or = OrCursor::new(
            and,
            DocCursor::new(PostingsCursor::new(&c).unwrap(), &mut buf_c),
        );
        assert_eq!(drain(or), vec![(2, 1), (4, 2), (9, 3)]);
    }
}
