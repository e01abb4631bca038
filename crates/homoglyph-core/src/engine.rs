//! Runtime detector and normalizer.
//!
//! The engine borrows a [`ConfusableTable`] and holds no other state, so it
//! is `Copy` and can be shared freely between threads. At each position it
//! probes every key width the table holds, longest first, so a sequence key
//! such as an emoji plus U+FE0F wins over its leading codepoint.

use std::collections::BTreeSet;

use crate::codec;
use crate::table::{self, ConfusableTable};

/// One step of a scan: a codepoint passed through, or a matched confusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'s, 't> {
    Clean(char),
    Confusable {
        /// The confusable exactly as it appears in the input.
        source: &'s str,
        canonical: &'t str,
        /// Byte offset of `source` in the scanned text.
        offset: usize,
    },
}

impl Segment<'_, '_> {
    pub fn is_confusable(&self) -> bool {
        matches!(self, Segment::Confusable { .. })
    }
}

/// Iterator returned by [`ConfusableEngine::scan`].
#[derive(Debug, Clone)]
pub struct Scan<'s, 't> {
    table: &'t ConfusableTable,
    text: &'s str,
    pos: usize,
}

impl<'s, 't> Iterator for Scan<'s, 't> {
    type Item = Segment<'s, 't>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.pos;
        let rest = &self.text[offset..];
        let ch = rest.chars().next()?;

        // Longest key first, down to two codepoints.
        for width in (2..=self.table.max_key_width()).rev() {
            let Some(end) = prefix_len(rest, width) else {
                continue;
            };
            let unit = &rest[..end];
            if let Some(canonical) = self.table.lookup(unit) {
                self.pos += end;
                return Some(Segment::Confusable {
                    source: unit,
                    canonical,
                    offset,
                });
            }
        }

        let unit = &rest[..ch.len_utf8()];
        self.pos += unit.len();
        Some(match self.table.lookup(unit) {
            Some(canonical) => Segment::Confusable {
                source: unit,
                canonical,
                offset,
            },
            None => Segment::Clean(ch),
        })
    }
}

/// Byte length of the first `width` codepoints of `s`, if it has that many.
fn prefix_len(s: &str, width: usize) -> Option<usize> {
    s.char_indices()
        .nth(width - 1)
        .map(|(i, ch)| i + ch.len_utf8())
}

/// Confusable detector/normalizer over a borrowed table.
#[derive(Debug, Clone, Copy)]
pub struct ConfusableEngine<'t> {
    table: &'t ConfusableTable,
}

impl<'t> ConfusableEngine<'t> {
    pub fn new(table: &'t ConfusableTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'t ConfusableTable {
        self.table
    }

    /// Walk `text`, yielding each codepoint or matched confusable in order.
    pub fn scan<'s>(&self, text: &'s str) -> Scan<'s, 't> {
        Scan {
            table: self.table,
            text,
            pos: 0,
        }
    }

    /// Distinct confusable substrings of `text`. Empty means clean.
    pub fn detect(&self, text: &str) -> BTreeSet<String> {
        self.scan(text)
            .filter_map(|seg| match seg {
                Segment::Confusable { source, .. } => Some(source.to_string()),
                Segment::Clean(_) => None,
            })
            .collect()
    }

    /// Replace every confusable in `text` with its canonical form.
    pub fn normalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for seg in self.scan(text) {
            match seg {
                Segment::Clean(ch) => out.push(ch),
                Segment::Confusable { canonical, .. } => out.push_str(canonical),
            }
        }
        out
    }

    /// Stops at the first hit.
    pub fn is_confusable(&self, text: &str) -> bool {
        self.scan(text).any(|seg| seg.is_confusable())
    }

    /// Whether `a` and `b` normalize to the same string.
    pub fn are_confusable(&self, a: &str, b: &str) -> bool {
        a == b || self.normalize(a) == self.normalize(b)
    }

    /// [`detect`](Self::detect) over unvalidated bytes; malformed sequences
    /// become U+FFFD first.
    pub fn detect_bytes(&self, bytes: &[u8]) -> BTreeSet<String> {
        self.detect(&codec::decode_lossy(bytes))
    }

    pub fn normalize_bytes(&self, bytes: &[u8]) -> String {
        self.normalize(&codec::decode_lossy(bytes))
    }
}

impl ConfusableEngine<'static> {
    /// Engine over the process-wide table.
    pub fn global() -> Self {
        Self::new(table::global())
    }
}

impl Default for ConfusableEngine<'static> {
    fn default() -> Self {
        Self::global()
    }
}

/// [`ConfusableEngine::detect`] against the process-wide table.
pub fn detect(text: &str) -> BTreeSet<String> {
    ConfusableEngine::global().detect(text)
}

/// [`ConfusableEngine::normalize`] against the process-wide table.
pub fn normalize(text: &str) -> String {
    ConfusableEngine::global().normalize(text)
}

pub fn is_confusable(text: &str) -> bool {
    ConfusableEngine::global().is_confusable(text)
}

pub fn are_confusable(a: &str, b: &str) -> bool {
    ConfusableEngine::global().are_confusable(a, b)
}
