// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Scoring.
//!
//! For each candidate page the score is
//!
//! ```text
//! score = Σ term_freq  +  2 · Σ 1/(1 + min_gap)  +  5.0 · [phrase match]
//! ```
//!
//! where the proximity sum runs over adjacent query-term pairs and
//! `min_gap` is the smallest absolute position difference between the two
//! terms on that page. Pages score only if positive, ordered by score
//! descending then page id ascending. No corpus-wide IDF — term rarity is
//! deliberately not modeled at this layer.

use crate::postings::codec::PostingsList;

/// Weight of the proximity component.
pub const PROXIMITY_WEIGHT: f64 = 2.0;

/// Flat bonus for pages in the phrase-match set.
pub const PHRASE_BONUS: f64 = 5.0;

/// One scored result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedHit {
    pub page_id: u32,
    pub score: f64,
}

/// Smallest absolute gap between any position in `a` and any in `b`,
/// computed by a linear zipper over the two sorted arrays.
pub fn min_gap(a: &[u32], b: &[u32]) -> Option<u64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let mut i = 0;
    let mut j = 0;
    let mut best = u64::MAX;
    while i < a.len() && j < b.len() {
        let va = i64::from(a[i]);
        let vb = i64::from(b[j]);
        best = best.min((va - vb).unsigned_abs());
        if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    Some(best)
}

/// Score the candidate pages of the given term lists.
///
/// `lists` holds one slot per query term, in query order; `None` means the
/// term resolved to nothing. Candidates are the union of page ids across
/// lists; with `require_all_terms` only pages carrying every term survive
/// (an unresolved term then empties the result). `phrase_pages` must be
/// sorted ascending.
pub fn rank_results(
    lists: &[Option<PostingsList>],
    require_all_terms: bool,
    phrase_pages: &[u32],
) -> Vec<RankedHit> {
    let mut candidates: Vec<u32> = lists
        .iter()
        .flatten()
        .flat_map(|list| list.iter().map(|p| p.page_id))
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    let mut hits = Vec::new();
    let mut indices: Vec<Option<usize>> = Vec::with_capacity(lists.len());

    'candidates: for &page_id in &candidates {
        indices.clear();
        let mut freq_score = 0u64;
        for list in lists {
            let index = list.as_ref().and_then(|l| l.find(page_id));
            if require_all_terms && index.is_none() {
                continue 'candidates;
            }
            if let (Some(list), Some(index)) = (list.as_ref(), index) {
                if let Some(posting) = list.get(index) {
                    freq_score += u64::from(posting.term_freq);
                }
            }
            indices.push(index);
        }

        let mut prox_score = 0.0f64;
        for pair in 0..lists.len().saturating_sub(1) {
            let (Some(left), Some(right)) = (&lists[pair], &lists[pair + 1]) else {
                continue;
            };
            let (Some(li), Some(ri)) = (indices[pair], indices[pair + 1]) else {
                continue;
            };
            if let (Some(lp), Some(rp)) = (left.get(li), right.get(ri)) {
                if let Some(gap) = min_gap(lp.positions, rp.positions) {
                    prox_score += 1.0 / (1.0 + gap as f64);
                }
            }
        }

        let phrase_bonus = if phrase_pages.binary_search(&page_id).is_ok() {
            PHRASE_BONUS
        } else {
            0.0
        };

        let score = freq_score as f64 + PROXIMITY_WEIGHT * prox_score + phrase_bonus;
        if score > 0.0 {
            hits.push(RankedHit { page_id, score });
        }
    }

    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.page_id.cmp(&b.page_id))
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::codec::{encode_block, Posting};

    fn list(postings: &[(u32, &[u32])]) -> Option<PostingsList> {
        let postings: Vec<Posting> = postings
            .iter()
            .map(|(page_id, positions)| Posting {
                page_id: *page_id,
                positions: positions.to_vec(),
            })
            .collect();
        let mut buf = Vec::new();
        encode_block(&postings, &mut buf);
        Some(PostingsList::parse(&buf).unwrap())
    }

    #[test]
    fn score_combines_freq_proximity_and_phrase() {
        // term A twice at 4,6; term B once at 5; nearest gap 1; phrase hit
        let lists = vec![list(&[(7, &[4, 6])]), list(&[(7, &[5])])];
        let hits = rank_results(&lists, true, &[7]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].page_id, 7);
        // 1·(2+1) + 2·(1/(1+1)) + 5 = 9
        assert!((hits[0].score - 9.0).abs() < 1e-9);
    }

    #[test]
    fn require_all_terms_restricts_to_intersection() {
        let lists = vec![list(&[(1, &[0]), (2, &[0])]), list(&[(2, &[1]), (3, &[1])])];
        let and_hits = rank_results(&lists, true, &[]);
        assert_eq!(and_hits.len(), 1);
        assert_eq!(and_hits[0].page_id, 2);

        let or_hits = rank_results(&lists, false, &[]);
        let pages: Vec<u32> = or_hits.iter().map(|h| h.page_id).collect();
        assert_eq!(pages.len(), 3);
        assert!(pages.contains(&1) && pages.contains(&2) && pages.contains(&3));
    }

    #[test]
    fn unresolved_term_empties_and_mode() {
        let lists = vec![list(&[(1, &[0])]), None];
        assert!(rank_results(&lists, true, &[]).is_empty());
        let or_hits = rank_results(&lists, false, &[]);
        assert_eq!(or_hits.len(), 1);
    }

    #[test]
    fn ordering_is_score_desc_then_page_asc() {
        // pages 5 and 9 tie on score; 1 outranks both on frequency
        let lists = vec![list(&[(1, &[0, 1, 2]), (5, &[0]), (9, &[4])])];
        let hits = rank_results(&lists, true, &[]);
        let pages: Vec<u32> = hits.iter().map(|h| h.page_id).collect();
        assert_eq!(pages, vec![1, 5, 9]);
        assert!(hits[0].score > hits[1].score);
        assert_eq!(hits[1].score, hits[2].score);
    }

    #[test]
    fn min_gap_zipper() {
        assert_eq!(min_gap(&[4, 6], &[5]), Some(1));
        assert_eq!(min_gap(&[10], &[10]), Some(0));
        assert_eq!(min_gap(&[1, 2, 3], &[100]), Some(97));
        assert_eq!(min_gap(&[], &[1]), None);
    }
}
