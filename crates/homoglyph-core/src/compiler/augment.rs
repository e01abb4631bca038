//! Pairs the compiler adds on top of the raw data: case variants, accent
//! folds onto ASCII letters, and the emoji collapse.

use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;

use unicode_normalization::char::decompose_canonical;
use unicode_properties::UnicodeEmoji;

/// U+FE0F VARIATION SELECTOR-16, requests emoji presentation.
pub const EMOJI_VARIATION_SELECTOR: char = '\u{FE0F}';

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let ch = chars.next()?;
    match chars.next() {
        Some(_) => None,
        None => Some(ch),
    }
}

/// The opposite-case form of `ch` when it is a single different codepoint.
///
/// Uppercase and titlecase letters map to lowercase, lowercase to uppercase.
pub fn case_variant(ch: char) -> Option<char> {
    single(ch.to_lowercase())
        .filter(|&c| c != ch)
        .or_else(|| single(ch.to_uppercase()).filter(|&c| c != ch))
}

/// `(variant, original)` for every single-codepoint endpoint of `pairs`.
///
/// Endpoints are visited in pair order and each is considered once.
pub fn case_pairs(pairs: &[(String, String)]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (a, b) in pairs {
        for unit in [a, b] {
            let Some(ch) = single(unit.chars()) else {
                continue;
            };
            if !seen.insert(ch) {
                continue;
            }
            if let Some(variant) = case_variant(ch) {
                out.push((variant.to_string(), unit.clone()));
            }
        }
    }
    out
}

/// `(codepoint, letter)` for every codepoint in `window` whose canonical
/// decomposition starts with an ASCII letter.
pub fn accent_pairs(window: RangeInclusive<u32>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for cp in window {
        let Some(ch) = char::from_u32(cp) else {
            continue;
        };
        if ch.is_ascii() {
            continue;
        }
        let mut first = None;
        decompose_canonical(ch, |d| {
            first.get_or_insert(d);
        });
        if let Some(letter) = first.filter(char::is_ascii_alphabetic) {
            out.push((ch.to_string(), letter.to_string()));
        }
    }
    out
}

/// Every unit the emoji collapse applies to, in codepoint order: each
/// non-ASCII `Emoji=Yes` codepoint outside `allowlist`, then the same
/// codepoint followed by VS16.
pub fn emoji_units(allowlist: &BTreeSet<char>) -> Vec<String> {
    let mut out = Vec::new();
    for cp in 0x80..=0x10FFFF_u32 {
        let Some(ch) = char::from_u32(cp) else {
            continue;
        };
        if allowlist.contains(&ch) || !ch.is_emoji_char() {
            continue;
        }
        out.push(ch.to_string());
        out.push(format!("{ch}{EMOJI_VARIATION_SELECTOR}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_variant() {
        assert_eq!(case_variant('\u{430}'), Some('\u{410}'));
        assert_eq!(case_variant('\u{410}'), Some('\u{430}'));
        assert_eq!(case_variant('\u{1C5}'), Some('\u{1C6}'));
        assert_eq!(case_variant('1'), None);
        // U+0130 lowercases to two codepoints and has no uppercase change.
        assert_eq!(case_variant('\u{130}'), None);
    }

    #[test]
    fn test_case_pairs_visit_each_endpoint_once() {
        let pairs = vec![
            ("\u{3BF}".to_string(), "o".to_string()),
            ("o".to_string(), "\u{3BF}".to_string()),
            ("\u{2474}".to_string(), "(1)".to_string()),
        ];
        assert_eq!(
            case_pairs(&pairs),
            vec![
                ("\u{39F}".to_string(), "\u{3BF}".to_string()),
                ("O".to_string(), "o".to_string()),
            ]
        );
    }

    #[test]
    fn test_accent_pairs() {
        let pairs = accent_pairs(0xC0..=0x24FF);
        assert!(pairs.contains(&("\u{E9}".to_string(), "e".to_string())));
        assert!(pairs.contains(&("\u{C5}".to_string(), "A".to_string())));
        // Decomposes to a long s, which is not an ASCII letter.
        assert!(!pairs.iter().any(|(src, _)| src == "\u{1E9B}"));
        // Kelvin sign has a singleton canonical decomposition to K.
        assert!(pairs.contains(&("\u{212A}".to_string(), "K".to_string())));
        // Compatibility-only decompositions are not folded.
        assert!(!pairs.iter().any(|(src, _)| src == "\u{FB01}"));
    }

    #[test]
    fn test_accent_window_is_respected() {
        assert!(accent_pairs(0x00..=0x7F).is_empty());
        assert_eq!(
            accent_pairs(0xE9..=0xE9),
            vec![("\u{E9}".to_string(), "e".to_string())]
        );
    }

    #[test]
    fn test_emoji_units() {
        let allowlist: BTreeSet<char> = ['\u{A9}', '\u{AE}', '\u{2122}'].into_iter().collect();
        let units = emoji_units(&allowlist);
        assert!(units.contains(&"\u{1F600}".to_string()));
        assert!(units.contains(&"\u{1F600}\u{FE0F}".to_string()));
        assert!(!units.contains(&"\u{A9}".to_string()));
        assert!(!units.contains(&"\u{2122}".to_string()));
        assert!(!units.iter().any(|u| u.starts_with('#') || u.starts_with('0')));
    }
}
