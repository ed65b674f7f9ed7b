// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! N-term phrase matching.
//!
//! The two-term streaming phrase-AND lives in the cursor algebra; queries
//! with two or more terms use this materialized variant instead, which
//! generalizes to any length. All term lists load into memory; candidate
//! documents come from the smallest list; each other list is binary-searched
//! for the candidate page and then for the aligned position. A page matches
//! if some position `p` of the first term has `p + k` present for every
//! k-th term — the first witness suffices, the number of alignments is not
//! counted here.

use std::path::PathBuf;

use super::SearchIndex;
use crate::error::Result;
use crate::postings::codec::PostingsList;

/// Pages (ascending) on which the terms appear as a contiguous phrase.
///
/// Any unresolved or empty term makes the phrase unmatchable and yields an
/// empty set.
pub fn phrase_match_pages(index: &mut SearchIndex, hashes: &[u64]) -> Result<Vec<u32>> {
    if hashes.len() < 2 {
        return Ok(Vec::new());
    }

    let mut lists: Vec<PostingsList> = Vec::with_capacity(hashes.len());
    for &hash in hashes {
        match index.load_term(hash)? {
            Some(list) => lists.push(list),
            None => return Ok(Vec::new()),
        }
    }

    let smallest = lists
        .iter()
        .enumerate()
        .min_by_key(|(_, list)| list.len())
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut pages = Vec::new();
    let mut indices = vec![0usize; lists.len()];

    'candidates: for candidate in lists[smallest].iter() {
        let page_id = candidate.page_id;
        for (k, list) in lists.iter().enumerate() {
            match list.find(page_id) {
                Some(index) => indices[k] = index,
                None => continue 'candidates,
            }
        }

        let Some(first) = lists[0].get(indices[0]) else {
            continue;
        };
        'anchors: for &p in first.positions {
            for (k, list) in lists.iter().enumerate().skip(1) {
                let Some(posting) = list.get(indices[k]) else {
                    continue 'candidates;
                };
                let Some(wanted) = p.checked_add(k as u32) else {
                    continue 'anchors;
                };
                if posting.positions.binary_search(&wanted).is_err() {
                    continue 'anchors;
                }
            }
            pages.push(page_id);
            continue 'candidates;
        }
    }

    Ok(pages)
}

/// Phrase-search each `(words.idx, postings.bin)` pair and emit
/// `(category_index, page_id)` tuples in category order.
pub fn phrase_search_categories(
    pairs: &[(PathBuf, PathBuf)],
    hashes: &[u64],
) -> Result<Vec<(u32, u32)>> {
    let mut out = Vec::new();
    for (category, (words_path, postings_path)) in pairs.iter().enumerate() {
        let mut index = SearchIndex::open(words_path, postings_path)?;
        for page_id in phrase_match_pages(&mut index, hashes)? {
            out.push((category as u32, page_id));
        }
    }
    Ok(out)
}
