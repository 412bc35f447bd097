//! UTF-8 transcoding for string payloads.
//!
//! Strings on the wire are raw UTF-8 with no validation promised by the
//! writer. The permissive decoder classifies each lead byte by its high
//! bits and trusts the continuation bytes that follow:
//!
//! | Lead byte   | Sequence | Payload bits                      |
//! |-------------|----------|-----------------------------------|
//! | `< 0xC0`    | 1 byte   | the byte itself                   |
//! | `0xC0-0xDF` | 2 bytes  | `a & 0x1F`, `b & 0x3F`            |
//! | `0xE0-0xEF` | 3 bytes  | `a & 0x0F`, then 6 bits each      |
//! | `0xF0-0xFF` | 4 bytes  | `a & 0x07`, then 6 bits each      |
//!
//! Stray continuation bytes (`0x80-0xBF`) in lead position therefore
//! decode to themselves, and overlong forms are accepted.

use flatread_wire::FlatError;

/// The Unicode replacement character as a code point.
pub const REPLACEMENT: u32 = 0xFFFD;

/// Iterator over the code points of a UTF-8 byte span.
///
/// A sequence cut short by the end of the span yields [`REPLACEMENT`] and
/// ends iteration.
#[derive(Clone, Debug)]
pub struct CodePoints<'a> {
    bytes: &'a [u8],
    pos: usize,
}

/// Decode `bytes` one code point at a time.
#[must_use]
pub fn decode_code_points(bytes: &[u8]) -> CodePoints<'_> {
    CodePoints { bytes, pos: 0 }
}

fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0xBF => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xFF => 4,
    }
}

impl Iterator for CodePoints<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let lead = *self.bytes.get(self.pos)?;
        let width = sequence_len(lead);
        let Some(seq) = self.bytes.get(self.pos..self.pos + width) else {
            self.pos = self.bytes.len();
            return Some(REPLACEMENT);
        };
        self.pos += width;

        let a = u32::from(lead);
        let tail = |i: usize| u32::from(seq[i] & 0x3F);
        let code_point = match width {
            1 => a,
            2 => ((a & 0x1F) << 6) | tail(1),
            3 => ((a & 0x0F) << 12) | (tail(1) << 6) | tail(2),
            _ => ((a & 0x07) << 18) | (tail(1) << 12) | (tail(2) << 6) | tail(3),
        };
        Some(code_point)
    }
}

/// Decode to UTF-16 code units, emitting a surrogate pair for every code
/// point at or above U+10000.
///
/// Code points beyond U+10FFFF cannot be paired and become U+FFFD.
#[must_use]
pub fn decode_utf16(bytes: &[u8]) -> Vec<u16> {
    let mut units = Vec::with_capacity(bytes.len());
    for code_point in decode_code_points(bytes) {
        match u16::try_from(code_point) {
            Ok(unit) => units.push(unit),
            Err(_) if code_point <= 0x10_FFFF => {
                let v = code_point - 0x1_0000;
                // Both halves fit in 10 bits after the subtraction.
                units.push(0xD800 | (v >> 10) as u16);
                units.push(0xDC00 | (v & 0x3FF) as u16);
            }
            Err(_) => units.push(REPLACEMENT as u16),
        }
    }
    units
}

/// Permissive decode into a `String`.
///
/// Well-formed input takes the standard library fast path and yields the
/// same text the byte-wise decoder would. Anything else goes through
/// [`decode_code_points`]; code points a `char` cannot represent (lone
/// surrogates, values past U+10FFFF) become U+FFFD.
#[must_use]
pub fn decode_lossy(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_owned();
    }
    decode_code_points(bytes)
        .map(|cp| char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Strict decode: the bytes must be valid UTF-8.
///
/// `offset` is the absolute position of the string data and is reported in
/// the error together with the index of the first bad byte.
///
/// # Errors
///
/// Returns [`FlatError::InvalidUtf8`] on malformed input.
pub fn decode_strict(bytes: &[u8], offset: usize) -> Result<String, FlatError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| FlatError::InvalidUtf8 {
            offset: offset + e.valid_up_to(),
        })
}
