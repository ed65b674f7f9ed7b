// Copyright 2025-present the Jamharah authors
// SPDX-License-Identifier: Apache-2.0

//! Occurrence triples: the build-time currency between pipeline stages.
//!
//! Stage 2 emits one 16-byte record per token occurrence; stage 3 sorts the
//! stream; stages 4 and 5 consume it linearly. The derived `Ord` is the
//! canonical `(word_hash, page_id, position)` order the whole pipeline
//! relies on — field order in the struct is load-bearing.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// One token occurrence: which word, on which page, at which token ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OccurrenceRecord {
    pub word_hash: u64,
    pub page_id: u32,
    pub position: u32,
}

impl OccurrenceRecord {
    /// On-disk size: u64 + u32 + u32, packed little-endian.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.word_hash.to_le_bytes())?;
        w.write_all(&self.page_id.to_le_bytes())?;
        w.write_all(&self.position.to_le_bytes())?;
        Ok(())
    }

    /// Read the next record, or `None` on a clean end of stream. A partial
    /// record is a format error, not EOF.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Option<Self>> {
        let mut buf = [0u8; Self::SIZE];
        let mut filled = 0;
        while filled < buf.len() {
            let n = r.read(&mut buf[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(Error::format("truncated occurrence record"));
            }
            filled += n;
        }
        Ok(Some(Self {
            word_hash: u64::from_le_bytes([
                buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
            ]),
            page_id: u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            position: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let records = [
            OccurrenceRecord {
                word_hash: 0xdead_beef_cafe_f00d,
                page_id: 42,
                position: 7,
            },
            OccurrenceRecord {
                word_hash: u64::MAX,
                page_id: u32::MAX,
                position: 0,
            },
        ];
        let mut buf = Vec::new();
        for rec in &records {
            rec.write_to(&mut buf).unwrap();
        }
        assert_eq!(buf.len(), records.len() * OccurrenceRecord::SIZE);

        let mut cursor = &buf[..];
        for rec in &records {
            assert_eq!(OccurrenceRecord::read_from(&mut cursor).unwrap(), Some(*rec));
        }
        assert_eq!(OccurrenceRecord::read_from(&mut cursor).unwrap(), None);
    }

    #[test]
    fn truncated_record_is_an_error() {
        let rec = OccurrenceRecord {
            word_hash: 1,
            page_id: 2,
            position: 3,
        };
        let mut buf = Vec::new();
        rec.write_to(&mut buf).unwrap();
        buf.truncate(OccurrenceRecord::SIZE - 1);
        let mut cursor = &buf[..];
        assert!(OccurrenceRecord::read_from(&mut cursor).is_err());
    }

    #[test]
    fn ordering_is_hash_then_page_then_position() {
        let a = OccurrenceRecord {
            word_hash: 1,
            page_id: 9,
            position: 9,
        };
        let b = OccurrenceRecord {
            word_hash: 2,
            page_id: 0,
            position: 0,
        };
        let c = OccurrenceRecord {
            word_hash: 2,
            page_id: 0,
            position: 1,
        };
        assert!(a < b);
        assert!(b < c);
    }
}
