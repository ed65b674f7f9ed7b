// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Tokenization of normalized Arabic text.
//!
//! Tokens are maximal runs of non-delimiter bytes. The delimiter set is the
//! ASCII control/whitespace range plus common punctuation; Arabic letters are
//! never delimiters, so multi-byte sequences pass through untouched.
//!
//! The fused [`normalize_and_tokenize`] path is what both the occurrence
//! builder and the query engine use: it decodes, normalizes and writes each
//! code point exactly once into a caller-provided workspace, opening and
//! closing tokens as delimiter code points go by. Token slices borrow the
//! workspace, so they stay valid for as long as the caller keeps it around.
//! Positions are dense token ordinals starting at 0.

use crate::error::{Error, Result};
use crate::normalize::normalize_char;

/// One token: a borrowed slice of normalized text plus its ordinal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub position: u32,
}

/// Returns true if `byte` separates tokens.
pub fn is_delimiter(byte: u8) -> bool {
    if byte <= 0x20 {
        return true;
    }
    matches!(
        byte,
        b',' | b'.'
            | b';'
            | b':'
            | b'!'
            | b'?'
            | b'"'
            | b'\''
            | b'('
            | b')'
            | b'['
            | b']'
            | b'{'
            | b'}'
            | b'-'
            | b'_'
            | b'/'
            | b'\\'
            | b'+'
            | b'='
            | b'*'
            | b'&'
            | b'%'
            | b'$'
            | b'#'
            | b'@'
            | b'<'
            | b'>'
    )
}

/// Tokenize already-normalized text in place, borrowing from `text`.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut position: u32 = 0;

    while i < bytes.len() {
        while i < bytes.len() && is_delimiter(bytes[i]) {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start = i;
        while i < bytes.len() && !is_delimiter(bytes[i]) {
            i += 1;
        }
        // Delimiters are all ASCII, so start..i falls on char boundaries.
        tokens.push(Token {
            text: &text[start..i],
            position,
        });
        position += 1;
    }
    tokens
}

/// Normalize and tokenize `input` in one pass.
///
/// Normalized bytes are written into `workspace`; the returned tokens borrow
/// it. Errors: [`Error::InvalidFormat`] on malformed UTF-8,
/// [`Error::CapacityExceeded`] when the workspace is too small (a workspace
/// of `input.len()` bytes always suffices).
pub fn normalize_and_tokenize<'ws>(
    input: &[u8],
    workspace: &'ws mut [u8],
) -> Result<Vec<Token<'ws>>> {
    let text = std::str::from_utf8(input)
        .map_err(|e| Error::format(format!("malformed UTF-8 in input: {e}")))?;

    // (start, end, position) byte spans into the workspace. Token slices are
    // materialized only after the write loop releases the mutable borrow.
    let mut spans: Vec<(usize, usize, u32)> = Vec::new();
    let mut out_len = 0usize;
    let mut position: u32 = 0;
    let mut token_start: Option<usize> = None;

    for cp in text.chars() {
        let Some(mapped) = normalize_char(cp) else {
            continue;
        };
        if mapped.is_ascii() && is_delimiter(mapped as u8) {
            if let Some(start) = token_start.take() {
                spans.push((start, out_len, position));
                position = position.checked_add(1).ok_or_else(|| {
                    Error::CapacityExceeded("token positions exceed u32 range".into())
                })?;
            }
            continue;
        }
        if token_start.is_none() {
            token_start = Some(out_len);
        }
        let width = mapped.len_utf8();
        if out_len + width > workspace.len() {
            return Err(Error::CapacityExceeded(format!(
                "tokenize workspace too small ({} bytes)",
                workspace.len()
            )));
        }
        mapped.encode_utf8(&mut workspace[out_len..out_len + width]);
        out_len += width;
    }
    if let Some(start) = token_start {
        spans.push((start, out_len, position));
    }

    let written: &'ws [u8] = workspace;
    spans
        .into_iter()
        .map(|(start, end, position)| {
            let text = std::str::from_utf8(&written[start..end])
                .map_err(|e| Error::format(format!("workspace produced invalid UTF-8: {e}")))?;
            Ok(Token { text, position })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_dense_ordinals() {
        let input = "آحمد يس";
        let mut ws = vec![0u8; input.len()];
        let tokens = normalize_and_tokenize(input.as_bytes(), &mut ws).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, 1);
        // alef-with-madda normalizes to bare alef
        assert_eq!(tokens[0].text, "احمد");
        assert_eq!(tokens[1].text, "يس");
    }

    #[test]
    fn tokens_contain_no_delimiters() {
        let input = "one, two.three (four) [خمسة]";
        let mut ws = vec![0u8; input.len()];
        let tokens = normalize_and_tokenize(input.as_bytes(), &mut ws).unwrap();
        let words: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(words, ["one", "two", "three", "four", "خمسة"]);
        for token in &tokens {
            assert!(token.text.bytes().all(|b| !is_delimiter(b)));
        }
    }

    #[test]
    fn empty_and_all_delimiter_inputs_yield_nothing() {
        let mut ws = [0u8; 8];
        assert!(normalize_and_tokenize(b"", &mut ws).unwrap().is_empty());
        assert!(normalize_and_tokenize(b" .,;! ", &mut ws).unwrap().is_empty());
    }

    #[test]
    fn diacritics_do_not_split_tokens() {
        // fatha inside the word is dropped, not treated as a boundary
        let input = "كَتَبَ";
        let mut ws = vec![0u8; input.len()];
        let tokens = normalize_and_tokenize(input.as_bytes(), &mut ws).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "كتب");
    }

    #[test]
    fn raw_tokenize_matches_fused_on_normalized_input() {
        let input = "احمد يس three";
        let mut ws = vec![0u8; input.len()];
        let fused = normalize_and_tokenize(input.as_bytes(), &mut ws).unwrap();
        let raw = tokenize(input);
        assert_eq!(fused.len(), raw.len());
        for (a, b) in fused.iter().zip(raw.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.position, b.position);
        }
    }
}
