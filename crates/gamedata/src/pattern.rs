//! Escaped-hex byte patterns
//!
//! Signatures and patches are written as runs of `\xHH` tokens, for example
//! `\x48\x89\x5C\x24\x2A`. Byte [`WILDCARD`] (`0x2A`, `*`) matches any byte
//! when the pattern is used for scanning; `\x??` is accepted as another
//! spelling of it.

use std::fmt;

use memchr::{memchr_iter, memmem};

use crate::error::{Error, Result};

/// Byte value that matches any byte during a scan
pub const WILDCARD: u8 = 0x2A;

/// Width of a single `\xHH` token
const TOKEN_LEN: usize = 4;

/// A decoded byte pattern.
///
/// Holds the decoded bytes followed by one trailing zero byte, the layout the
/// engine's scanner has always been handed. The terminator is kept for
/// callers that pass the buffer on as a C string; scanning only ever looks
/// at [`BytePattern::as_bytes`] together with an explicit wildcard value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytePattern {
    bytes: Vec<u8>,
}

impl BytePattern {
    /// Decoded bytes, without the trailing terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - 1]
    }

    /// Decoded bytes including the trailing zero terminator
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of decoded bytes (excluding the terminator)
    pub fn len(&self) -> usize {
        self.bytes.len() - 1
    }

    /// Always false: a pattern decodes to at least one byte
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of wildcard bytes in the pattern
    pub fn wildcard_count(&self) -> usize {
        self.as_bytes().iter().filter(|&&b| b == WILDCARD).count()
    }

    /// Space separated hex bytes, every byte shown literally.
    ///
    /// Use this for patch bytes; [`Display`](fmt::Display) renders wildcards
    /// as `??` and is meant for scan patterns.
    pub fn to_hex(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for BytePattern {
    /// Space separated hex bytes with wildcards shown as `??`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if *b == WILDCARD {
                f.write_str("??")?;
            } else {
                write!(f, "{:02X}", b)?;
            }
        }
        Ok(())
    }
}

/// Decode an escaped-hex pattern into at most `max_bytes` bytes.
///
/// `raw` must consist only of `\xHH` tokens (`\x??` for the wildcard). Fails
/// with [`Error::MalformedPattern`] on empty input, a length that is not a
/// multiple of four, more than `max_bytes` tokens, or a token that is not a
/// backslash, `x` and exactly two hex digits.
pub fn decode_pattern(raw: &str, max_bytes: usize) -> Result<BytePattern> {
    if raw.is_empty() {
        return Err(Error::MalformedPattern("pattern is empty".to_string()));
    }
    if raw.len() % TOKEN_LEN != 0 {
        return Err(Error::MalformedPattern(format!(
            "length {} is not a multiple of {}",
            raw.len(),
            TOKEN_LEN
        )));
    }

    let count = raw.len() / TOKEN_LEN;
    if count > max_bytes {
        return Err(Error::MalformedPattern(format!(
            "{} bytes exceeds capacity of {}",
            count, max_bytes
        )));
    }

    let mut bytes = Vec::with_capacity(count + 1);
    for (i, token) in raw.as_bytes().chunks_exact(TOKEN_LEN).enumerate() {
        let byte = decode_token(token).ok_or_else(|| {
            Error::MalformedPattern(format!(
                "failed to parse token '{}' at position {}",
                String::from_utf8_lossy(token),
                i * TOKEN_LEN
            ))
        })?;
        bytes.push(byte);
    }
    bytes.push(0);

    Ok(BytePattern { bytes })
}

/// Decode an escaped-hex pattern sized by its own length
pub fn hex_to_bytes(raw: &str) -> Result<BytePattern> {
    decode_pattern(raw, raw.len() / TOKEN_LEN)
}

fn decode_token(token: &[u8]) -> Option<u8> {
    match token {
        [b'\\', b'x', b'?', b'?'] => Some(WILDCARD),
        [b'\\', b'x', hi, lo] => Some((hex_digit(*hi)? << 4) | hex_digit(*lo)?),
        _ => None,
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

/// Offset of the first occurrence of `pattern` in `haystack`.
///
/// Bytes equal to `wildcard` in the pattern match anything. Matches are
/// reported in ascending order, so the result is the lowest matching offset.
pub fn find_pattern(haystack: &[u8], pattern: &[u8], wildcard: u8) -> Option<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return None;
    }

    let Some(anchor) = pattern.iter().position(|&b| b != wildcard) else {
        // all wildcards
        return Some(0);
    };

    if !pattern.contains(&wildcard) {
        return memmem::find(haystack, pattern);
    }

    let last_start = haystack.len() - pattern.len();
    // hits are relative to `anchor`, so each one is already a window start
    for start in memchr_iter(pattern[anchor], &haystack[anchor..]) {
        if start > last_start {
            break;
        }
        let window = &haystack[start..start + pattern.len()];
        if window
            .iter()
            .zip(pattern)
            .all(|(&actual, &expected)| expected == wildcard || actual == expected)
        {
            return Some(start);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pattern_appends_terminator() {
        let pattern = decode_pattern(r"\x48\x89\x5C\x24", 16).unwrap();
        assert_eq!(pattern.as_bytes(), &[0x48, 0x89, 0x5C, 0x24]);
        assert_eq!(pattern.as_bytes_with_nul(), &[0x48, 0x89, 0x5C, 0x24, 0x00]);
        assert_eq!(pattern.len(), 4);
        assert!(!pattern.is_empty());
    }

    #[test]
    fn test_decode_pattern_matches_independent_parse() {
        let values: Vec<u8> = (0..=255u8).step_by(7).collect();
        let raw: String = values.iter().map(|b| format!("\\x{:02x}", b)).collect();
        let pattern = hex_to_bytes(&raw).unwrap();
        assert_eq!(pattern.as_bytes(), values.as_slice());
        assert_eq!(*pattern.as_bytes_with_nul().last().unwrap(), 0);
    }

    #[test]
    fn test_decode_pattern_wildcards() {
        let pattern = hex_to_bytes(r"\x48\x??\x2A\x01").unwrap();
        assert_eq!(pattern.as_bytes(), &[0x48, WILDCARD, WILDCARD, 0x01]);
        assert_eq!(pattern.wildcard_count(), 2);
        assert_eq!(pattern.to_string(), "48 ?? ?? 01");
    }

    #[test]
    fn test_decode_pattern_rejects_bad_input() {
        assert!(matches!(
            decode_pattern("", 8),
            Err(Error::MalformedPattern(_))
        ));
        // not a multiple of four
        assert!(decode_pattern(r"\x48\x8", 8).is_err());
        // non-hex digit
        assert!(decode_pattern(r"\x48\xG1", 8).is_err());
        // single wildcard half
        assert!(decode_pattern(r"\x4?", 8).is_err());
        // wrong prefix
        assert!(decode_pattern("0x48", 8).is_err());
        assert!(decode_pattern("48 89 ", 8).is_err());
        // capacity exceeded
        assert!(decode_pattern(r"\x48\x89\x01", 2).is_err());
        assert!(decode_pattern(r"\x48\x89", 2).is_ok());
        // zero capacity
        assert!(decode_pattern(r"\x48", 0).is_err());
    }

    #[test]
    fn test_to_hex_shows_wildcard_byte_literally() {
        let pattern = hex_to_bytes(r"\x2A\x90\x??").unwrap();
        assert_eq!(pattern.to_hex(), "2A 90 2A");
        assert_eq!(pattern.to_string(), "?? 90 ??");
    }

    #[test]
    fn test_find_pattern_exact() {
        let haystack = [0x00, 0x48, 0x89, 0x01, 0x48, 0x89, 0x01];
        assert_eq!(find_pattern(&haystack, &[0x48, 0x89, 0x01], WILDCARD), Some(1));
        assert_eq!(find_pattern(&haystack, &[0x48, 0x90], WILDCARD), None);
    }

    #[test]
    fn test_find_pattern_wildcard_returns_lowest() {
        let mut haystack = vec![0u8; 64];
        haystack[16..20].copy_from_slice(&[0x48, 0x89, 0xFF, 0x01]);
        haystack[40..44].copy_from_slice(&[0x48, 0x89, 0x00, 0x01]);
        let pattern = [0x48, 0x89, WILDCARD, 0x01];
        assert_eq!(find_pattern(&haystack, &pattern, WILDCARD), Some(16));
    }

    #[test]
    fn test_find_pattern_leading_wildcard() {
        let haystack = [0x48, 0x10, 0x20, 0x10, 0x30];
        assert_eq!(find_pattern(&haystack, &[WILDCARD, 0x10, 0x30], WILDCARD), Some(2));
        // anchor found but window would run past the end
        assert_eq!(find_pattern(&haystack, &[WILDCARD, 0x30, WILDCARD], WILDCARD), None);
    }

    #[test]
    fn test_find_pattern_edges() {
        assert_eq!(find_pattern(&[1, 2], &[], WILDCARD), None);
        assert_eq!(find_pattern(&[1], &[1, 2], WILDCARD), None);
        assert_eq!(find_pattern(&[1, 2], &[WILDCARD, WILDCARD], WILDCARD), Some(0));
    }
}
