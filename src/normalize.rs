// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Arabic text normalization.
//!
//! Classical Arabic text is written with optional diacritics (tashkīl) and
//! several orthographic variants of the same base letter. Queries rarely
//! carry diacritics and writers are inconsistent about alef hamzas, so the
//! index would fall apart without a canonical form. The rules are small and
//! fixed:
//!
//! - combining diacritics U+064B..=U+065F and U+06D6..=U+06ED are dropped
//! - alef variants (madda U+0622, hamza above U+0623, hamza below U+0625,
//!   wasla U+0671) collapse to bare alef U+0627
//! - alef maksura U+0649 collapses to yeh U+064A
//! - teh marbuta U+0629 collapses to heh U+0647
//! - everything else passes through unchanged
//!
//! Normalization never grows the byte length, so a workspace as large as the
//! input always suffices. The function is idempotent.

use crate::error::{Error, Result};

/// Returns true for the Arabic combining diacritic ranges that are dropped.
pub fn is_arabic_diacritic(cp: char) -> bool {
    matches!(cp, '\u{064B}'..='\u{065F}' | '\u{06D6}'..='\u{06ED}')
}

/// Normalize a single code point. `None` means the code point is dropped.
pub fn normalize_char(cp: char) -> Option<char> {
    if is_arabic_diacritic(cp) {
        return None;
    }
    Some(match cp {
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' => '\u{0627}',
        '\u{0649}' => '\u{064A}',
        '\u{0629}' => '\u{0647}',
        other => other,
    })
}

/// Normalize UTF-8 `input` into the caller-provided `workspace`.
///
/// Returns the number of bytes written. Malformed UTF-8 is
/// [`Error::InvalidFormat`]; a workspace smaller than the normalized form is
/// [`Error::CapacityExceeded`].
pub fn normalize_arabic(input: &[u8], workspace: &mut [u8]) -> Result<usize> {
    let text = std::str::from_utf8(input)
        .map_err(|e| Error::format(format!("malformed UTF-8 in input: {e}")))?;

    let mut out_len = 0;
    for cp in text.chars() {
        let Some(mapped) = normalize_char(cp) else {
            continue;
        };
        let width = mapped.len_utf8();
        if out_len + width > workspace.len() {
            return Err(Error::CapacityExceeded(format!(
                "normalize workspace too small ({} bytes)",
                workspace.len()
            )));
        }
        mapped.encode_utf8(&mut workspace[out_len..out_len + width]);
        out_len += width;
    }
    Ok(out_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize_to_string(input: &str) -> String {
        let mut ws = vec![0u8; input.len()];
        let n = normalize_arabic(input.as_bytes(), &mut ws).unwrap();
        String::from_utf8(ws[..n].to_vec()).unwrap()
    }

    #[test]
    fn alef_forms_collapse() {
        // madda, hamza above, hamza below, bare alef, maksura, teh marbuta,
        // fatha -> four alefs, yeh, heh, fatha dropped
        let input = "\u{0622}\u{0623}\u{0625}\u{0627}\u{0649}\u{0629}\u{064E}";
        let expected = "\u{0627}\u{0627}\u{0627}\u{0627}\u{064A}\u{0647}";
        assert_eq!(normalize_to_string(input), expected);
    }

    #[test]
    fn diacritics_are_dropped() {
        let input = "مُحَمَّد";
        assert_eq!(normalize_to_string(input), "محمد");
    }

    #[test]
    fn non_arabic_passes_through() {
        assert_eq!(normalize_to_string("abc 123"), "abc 123");
    }

    #[test]
    fn idempotent() {
        let inputs = ["آحمد يس", "القَوْلُ", "abc", "ﻻ"];
        for input in inputs {
            let once = normalize_to_string(input);
            let twice = normalize_to_string(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn output_never_longer_than_input() {
        let input = "وَالشَّمْسِ وَضُحَاهَا";
        let out = normalize_to_string(input);
        assert!(out.len() <= input.len());
    }

    #[test]
    fn malformed_utf8_rejected() {
        let mut ws = [0u8; 16];
        let err = normalize_arabic(&[0xd8, 0x41], &mut ws).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn small_workspace_rejected() {
        let mut ws = [0u8; 2];
        let err = normalize_arabic("كتاب".as_bytes(), &mut ws).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded(_)));
    }
}
