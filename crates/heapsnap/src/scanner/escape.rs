//! Text Escaper - bounded JSON string encoding of raw character buffers
//!
//! Text in a heap can be anything: binary blobs, control characters, lone
//! surrogates. The escaper turns at most [`MAX_TEXT_CHARS`] characters of it
//! into a quoted JSON string literal using only printable ASCII.
//!
//! ```text
//! 0x20..=0x7e except \ / "   copied as is
//! \  /  "                    backslash prefixed
//! anything else, narrow      \u00XX
//! anything else, wide        \uXXXX
//! ```
//!
//! The encoded form is built in a growable buffer and checked against a byte
//! limit before it is handed back, so an oversized encoding fails as a whole
//! instead of overrunning or producing a torn string.

use crate::config::DEFAULT_ENCODE_LIMIT;
use crate::error::{Result, ScanError};
use crate::object::Text;

/// Most source characters encoded from one buffer; the rest is dropped
pub const MAX_TEXT_CHARS: usize = 100;

/// Longest escape sequence produced for one source character
const MAX_ESCAPE_WIDTH: usize = 6;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Escapes text buffers under a fixed byte bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEscaper {
    limit: usize,
}

impl Default for TextEscaper {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODE_LIMIT)
    }
}

impl TextEscaper {
    /// Escaper whose output, quotes included, never exceeds `limit` bytes
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }

    #[inline]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Escape `text` into a quoted literal
    ///
    /// `declared_len` caps how much of the buffer is considered; `None` means
    /// up to the first NUL byte for narrow text and the whole buffer for wide
    /// text. At most [`MAX_TEXT_CHARS`] characters are encoded either way.
    ///
    /// # Example
    ///
    /// ```rust
    /// use heapsnap::{Text, TextEscaper};
    ///
    /// let escaper = TextEscaper::default();
    /// let out = escaper.escape(Text::Narrow(b"a \\str/with\"ctl\x01"), None).unwrap();
    /// assert_eq!(out, r#""a \\str\/with\"ctl\u0001""#);
    /// ```
    pub fn escape(&self, text: Text<'_>, declared_len: Option<usize>) -> Result<String> {
        let mut out = Vec::with_capacity(self.limit.min(2 + MAX_TEXT_CHARS * MAX_ESCAPE_WIDTH));
        self.escape_into(&mut out, text, declared_len)?;
        // Every byte pushed is printable ASCII.
        Ok(out.into_iter().map(char::from).collect())
    }

    /// Escape a type name or other Rust string as narrow text
    pub fn escape_str(&self, s: &str) -> Result<String> {
        self.escape(Text::Narrow(s.as_bytes()), Some(s.len()))
    }

    /// Append the quoted literal for `text` to `out`
    ///
    /// On error `out` is left exactly as it was.
    pub fn escape_into(
        &self,
        out: &mut Vec<u8>,
        text: Text<'_>,
        declared_len: Option<usize>,
    ) -> Result<()> {
        let start = out.len();
        out.push(b'"');
        match text {
            Text::Narrow(bytes) => {
                let len = declared_len
                    .unwrap_or_else(|| bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len()));
                let len = len.min(bytes.len()).min(MAX_TEXT_CHARS);
                for &b in &bytes[..len] {
                    push_unit(out, u16::from(b));
                }
            },
            Text::Wide(units) => {
                let len = declared_len.unwrap_or(units.len());
                let len = len.min(units.len()).min(MAX_TEXT_CHARS);
                for &u in &units[..len] {
                    push_unit(out, u);
                }
            },
        }
        out.push(b'"');

        let needed = out.len() - start;
        if needed > self.limit {
            out.truncate(start);
            return Err(ScanError::EncodeOverflow {
                needed,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

#[inline]
fn push_unit(out: &mut Vec<u8>, unit: u16) {
    match unit {
        0x5c | 0x2f | 0x22 => {
            out.push(b'\\');
            out.push(unit as u8);
        },
        0x20..=0x7e => out.push(unit as u8),
        _ => {
            out.extend_from_slice(b"\\u");
            for shift in [12u16, 8, 4, 0] {
                out.push(HEX[usize::from((unit >> shift) & 0xf)]);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn narrow(bytes: &[u8]) -> String {
        TextEscaper::default()
            .escape(Text::Narrow(bytes), Some(bytes.len()))
            .unwrap()
    }

    fn wide(units: &[u16]) -> String {
        TextEscaper::default()
            .escape(Text::Wide(units), None)
            .unwrap()
    }

    /// Undo the escaping, for printable input only
    fn unescape(quoted: &str) -> String {
        let inner = &quoted[1..quoted.len() - 1];
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                out.push(chars.next().unwrap());
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(narrow(b""), r#""""#);
        assert_eq!(wide(&[]), r#""""#);
    }

    #[test]
    fn test_simple_strings() {
        assert_eq!(narrow(b"foo"), r#""foo""#);
        assert_eq!(narrow(b"aoeu aoeu"), r#""aoeu aoeu""#);
    }

    #[test]
    fn test_simple_escapes() {
        assert_eq!(narrow(br#"\x/y""#), r#""\\x\/y\"""#);
        let units: Vec<u16> = r#"\x/y""#.encode_utf16().collect();
        assert_eq!(wide(&units), r#""\\x\/y\"""#);
    }

    #[test]
    fn test_control_escapes() {
        assert_eq!(narrow(b"\x00\x01\x02\x1f"), r#""\u0000\u0001\u0002\u001f""#);
        assert_eq!(narrow(b"\x7f\xff"), r#""\u007f\u00ff""#);
    }

    #[test]
    fn test_wide_escapes() {
        assert_eq!(wide(&[0x12, 0xb5, 0x2030, 0x1f]), r#""\u0012\u00b5\u2030\u001f""#);
        assert_eq!(wide(&[0xd800]), r#""\ud800""#);
    }

    #[test]
    fn test_declared_len_none_stops_at_nul() {
        let escaper = TextEscaper::default();
        assert_eq!(
            escaper.escape(Text::Narrow(b"type\0junk"), None).unwrap(),
            r#""type""#
        );
        // An explicit length keeps embedded NULs.
        assert_eq!(
            escaper.escape(Text::Narrow(b"a\0b"), Some(3)).unwrap(),
            r#""a\u0000b""#
        );
    }

    #[test]
    fn test_declared_len_never_reads_past_buffer() {
        let escaper = TextEscaper::default();
        assert_eq!(escaper.escape(Text::Narrow(b"ab"), Some(50)).unwrap(), r#""ab""#);
        assert_eq!(escaper.escape(Text::Narrow(b"abcd"), Some(2)).unwrap(), r#""ab""#);
    }

    #[test]
    fn test_truncates_to_100_chars() {
        let long = "abcd".repeat(2500);
        let out = narrow(long.as_bytes());
        assert_eq!(out.len(), 102);
        assert_eq!(&out[1..101], &long[..100]);

        let units = vec![0x2030u16; 10_000];
        let out = wide(&units);
        assert_eq!(out.len(), 2 + 100 * 6);
    }

    #[test]
    fn test_overflow_aborts_without_partial_output() {
        let escaper = TextEscaper::new(8);
        let mut out = b"prefix".to_vec();
        let err = escaper
            .escape_into(&mut out, Text::Narrow(b"\x01\x02"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::EncodeOverflow {
                needed: 14,
                limit: 8
            }
        ));
        assert_eq!(out, b"prefix");
    }

    #[test]
    fn test_fits_exactly_at_limit() {
        let escaper = TextEscaper::new(5);
        assert_eq!(escaper.escape_str("abc").unwrap(), r#""abc""#);
        assert!(escaper.escape_str("abcd").is_err());
    }

    #[quickcheck]
    fn prop_output_is_quoted_and_bounded(bytes: Vec<u8>) -> bool {
        let out = narrow(&bytes);
        out.len() >= 2
            && out.starts_with('"')
            && out.ends_with('"')
            && out.len() <= 2 + MAX_TEXT_CHARS * MAX_ESCAPE_WIDTH
            && out.bytes().all(|b| (0x20..=0x7e).contains(&b))
    }

    #[quickcheck]
    fn prop_printable_round_trips(input: String) -> bool {
        let printable: String = input.chars().filter(|c| (' '..='~').contains(c)).collect();
        let expected: String = printable.chars().take(MAX_TEXT_CHARS).collect();
        unescape(&narrow(printable.as_bytes())) == expected
    }

    #[quickcheck]
    fn prop_wide_bounded(units: Vec<u16>) -> bool {
        let out = wide(&units);
        out.len() <= 2 + MAX_TEXT_CHARS * MAX_ESCAPE_WIDTH
    }
}
