//! UTF-8 decoding and encoding for substitution units.
//!
//! The decoder never fails: every ill-formed byte becomes U+FFFD and the
//! cursor moves forward by exactly one byte, so a single stray byte can never
//! swallow the well-formed text that follows it.

/// Substituted for every ill-formed byte.
pub const REPLACEMENT: char = '\u{FFFD}';

/// One decoded position of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub ch: char,
    /// Byte offset of the sequence in the input.
    pub offset: usize,
    /// Number of input bytes consumed (1 for malformed bytes).
    pub len: usize,
    pub malformed: bool,
}

/// Iterator over the codepoints of a byte string.
#[derive(Debug, Clone)]
pub struct Utf8Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Utf8Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }
}

impl Iterator for Utf8Decoder<'_> {
    type Item = Decoded;

    fn next(&mut self) -> Option<Decoded> {
        let offset = self.pos;
        let first = *self.bytes.get(offset)?;

        let decoded = match decode_at(&self.bytes[offset..], first) {
            Some((ch, len)) => Decoded {
                ch,
                offset,
                len,
                malformed: false,
            },
            None => Decoded {
                ch: REPLACEMENT,
                offset,
                len: 1,
                malformed: true,
            },
        };
        self.pos += decoded.len;
        Some(decoded)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.bytes.len() - self.pos;
        ((rest + 3) / 4, Some(rest))
    }
}

/// Width of a UTF-8 sequence from its lead byte, 0 if it cannot start one.
#[inline]
fn sequence_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Decode one well-formed sequence at the start of `bytes` (Unicode Table 3-7).
fn decode_at(bytes: &[u8], first: u8) -> Option<(char, usize)> {
    let width = sequence_width(first);
    if width == 0 || bytes.len() < width {
        return None;
    }
    if width == 1 {
        return Some((first as char, 1));
    }

    // The second byte range depends on the lead byte; it rules out overlong
    // forms, surrogates and values past U+10FFFF.
    let second = bytes[1];
    let second_ok = match first {
        0xE0 => (0xA0..=0xBF).contains(&second),
        0xED => (0x80..=0x9F).contains(&second),
        0xF0 => (0x90..=0xBF).contains(&second),
        0xF4 => (0x80..=0x8F).contains(&second),
        _ => is_continuation(second),
    };
    if !second_ok || !bytes[2..width].iter().all(|&b| is_continuation(b)) {
        return None;
    }

    let mut code = u32::from(first) & (0x7F >> width);
    for &b in &bytes[1..width] {
        code = (code << 6) | u32::from(b & 0x3F);
    }
    char::from_u32(code).map(|ch| (ch, width))
}

#[inline]
fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Decode a byte string into codepoints.
pub fn decode(bytes: &[u8]) -> Vec<char> {
    Utf8Decoder::new(bytes).map(|d| d.ch).collect()
}

/// Decode a byte string into a `String`, one U+FFFD per ill-formed byte.
///
/// Unlike `String::from_utf8_lossy`, a truncated multi-byte sequence yields
/// one replacement character per byte rather than one per maximal subpart.
pub fn decode_lossy(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    let mut out = String::with_capacity(bytes.len() + 8);
    out.extend(Utf8Decoder::new(bytes).map(|d| d.ch));
    out
}

/// Encode codepoints as UTF-8.
pub fn encode(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Encode a single codepoint; `None` for surrogates and values past U+10FFFF.
pub fn codepoint_to_utf8(cp: u32) -> Option<String> {
    char::from_u32(cp).map(String::from)
}

/// Whether a substitution unit is trusted ASCII (first byte below 0x80).
#[inline]
pub fn is_ascii_unit(unit: &str) -> bool {
    unit.as_bytes().first().map_or(false, |&b| b < 0x80)
}

/// Error from [`parse_hex_sequence`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    #[error("empty codepoint sequence")]
    Empty,
    #[error("'{0}' is not a hexadecimal codepoint")]
    InvalidHex(String),
    #[error("U+{0:04X} is not a Unicode scalar value")]
    NotScalar(u32),
}

/// Parse whitespace-separated hex codepoints (`"0041 030A"`) into a string.
pub fn parse_hex_sequence(field: &str) -> Result<String, HexError> {
    let mut out = String::new();
    for token in field.split_whitespace() {
        let cp = u32::from_str_radix(token, 16).map_err(|_| HexError::InvalidHex(token.to_string()))?;
        let ch = char::from_u32(cp).ok_or(HexError::NotScalar(cp))?;
        out.push(ch);
    }
    if out.is_empty() {
        return Err(HexError::Empty);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_codepoints() {
        assert_eq!(codepoint_to_utf8(0x48).as_deref(), Some("H"));
        assert_eq!(codepoint_to_utf8(0xE9).as_deref(), Some("\u{E9}"));
        assert_eq!(codepoint_to_utf8(0x4E2D).unwrap().as_bytes(), b"\xE4\xB8\xAD");
        assert_eq!(
            codepoint_to_utf8(0x1F600).unwrap().as_bytes(),
            b"\xF0\x9F\x98\x80"
        );
    }

    #[test]
    fn test_encode_rejects_surrogate_and_out_of_range() {
        assert_eq!(codepoint_to_utf8(0xD800), None);
        assert_eq!(codepoint_to_utf8(0x110000), None);
    }

    #[test]
    fn test_decode_valid() {
        assert_eq!(decode("p\u{430}p".as_bytes()), vec!['p', '\u{430}', 'p']);
        assert_eq!(decode(b""), Vec::<char>::new());
    }

    #[test]
    fn test_malformed_advances_one_byte() {
        // Lone continuation byte, then a truncated 3-byte sequence.
        let bytes = b"a\x80b\xE4\xB8";
        let decoded: Vec<Decoded> = Utf8Decoder::new(bytes).collect();
        let chars: Vec<char> = decoded.iter().map(|d| d.ch).collect();
        assert_eq!(chars, vec!['a', REPLACEMENT, 'b', REPLACEMENT, REPLACEMENT]);
        assert!(decoded.iter().filter(|d| d.malformed).all(|d| d.len == 1));
        assert_eq!(decoded[3].offset, 3);
        assert_eq!(decoded[4].offset, 4);
    }

    #[test]
    fn test_overlong_and_surrogate_rejected() {
        // Overlong '/' and an encoded surrogate U+D800.
        assert_eq!(decode(b"\xC0\xAF"), vec![REPLACEMENT, REPLACEMENT]);
        assert_eq!(
            decode(b"\xED\xA0\x80"),
            vec![REPLACEMENT, REPLACEMENT, REPLACEMENT]
        );
    }

    #[test]
    fn test_decode_lossy_recovers_following_text() {
        assert_eq!(decode_lossy(b"\xF0\x9F\x98x"), "\u{FFFD}\u{FFFD}\u{FFFD}x");
        assert_eq!(decode_lossy("caf\u{E9}".as_bytes()), "caf\u{E9}");
    }

    #[test]
    fn test_parse_hex_sequence() {
        assert_eq!(parse_hex_sequence("0430").unwrap(), "\u{430}");
        assert_eq!(parse_hex_sequence(" 0028 0031 0029 ").unwrap(), "(1)");
        assert_eq!(parse_hex_sequence("   "), Err(HexError::Empty));
        assert_eq!(
            parse_hex_sequence("00ZZ"),
            Err(HexError::InvalidHex("00ZZ".to_string()))
        );
        assert_eq!(parse_hex_sequence("DFFF"), Err(HexError::NotScalar(0xDFFF)));
    }

    #[test]
    fn test_is_ascii_unit() {
        assert!(is_ascii_unit("a"));
        assert!(is_ascii_unit("(1)"));
        assert!(!is_ascii_unit("\u{430}"));
        assert!(!is_ascii_unit(""));
    }
}
