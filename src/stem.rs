// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Light Arabic stemming.
//!
//! Strips at most one common prefix (definite article, conjunctions,
//! prepositions and their fusions) and at most one common suffix (pronoun
//! and plural endings) from a token, never shrinking the stem below four
//! bytes. This is deliberately conservative; aggressive stemming conflates
//! too many classical roots.
//!
//! Not wired into the v1 build or query paths. Exposed so experiments can
//! stem token streams before hashing.

use crate::tokenize::Token;

/// Prefixes checked longest-first; only the first match is stripped.
const PREFIXES: &[&str] = &[
    "وال", "فال", "بال", "كال", "لل", "ال", "و", "ف", "ب", "ك", "ل", "س",
];

/// Suffixes checked longest-first; only the first match is stripped.
const SUFFIXES: &[&str] = &[
    "هما", "كما", "كم", "هم", "هن", "كن", "ها", "نا", "ات", "ون", "ين", "ان", "ة", "ه", "ي",
];

/// Minimum stem size in bytes; shorter words are left untouched.
const MIN_STEM_BYTES: usize = 4;

/// Strip one prefix and one suffix from `word`, returning a narrowed slice.
pub fn light_stem(word: &str) -> &str {
    if word.len() <= MIN_STEM_BYTES {
        return word;
    }

    let mut stem = word;
    for prefix in PREFIXES {
        if stem.len() >= prefix.len() + MIN_STEM_BYTES
            && stem.as_bytes().starts_with(prefix.as_bytes())
        {
            stem = &stem[prefix.len()..];
            break;
        }
    }
    for suffix in SUFFIXES {
        if stem.len() >= suffix.len() + MIN_STEM_BYTES
            && stem.as_bytes().ends_with(suffix.as_bytes())
        {
            stem = &stem[..stem.len() - suffix.len()];
            break;
        }
    }
    stem
}

/// Stem a token slice in place, narrowing each token's text borrow.
pub fn light_stem_tokens(tokens: &mut [Token<'_>]) {
    for token in tokens {
        token.text = light_stem(token.text);
    }
}
