//! Offline compiler from raw confusable data to a canonical lookup table.
//!
//! This module is also compiled into `build.rs` to produce the embedded
//! table, so it may only depend on `crate::codec` and on crates listed under
//! `[build-dependencies]`.

pub mod augment;
pub mod raw;
pub mod union_find;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::codec::is_ascii_unit;

pub use raw::RawMappingEntry;
use union_find::EquivalenceClasses;

/// Default emoji placeholder, U+1F642 SLIGHTLY SMILING FACE.
pub const DEFAULT_EMOJI_PLACEHOLDER: &str = "\u{1F642}";

/// Symbols upstream data flags as emoji that must keep their own identity.
pub const DEFAULT_EMOJI_ALLOWLIST: [char; 3] = ['\u{A9}', '\u{AE}', '\u{2122}'];

/// Codepoints checked for accented forms of ASCII letters.
pub const DEFAULT_ACCENT_SCAN: RangeInclusive<u32> = 0x00C0..=0x24FF;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Knobs for the augmentation stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Representative every emoji collapses onto.
    pub emoji_placeholder: String,
    /// Emoji-property codepoints exempt from the collapse and never keys.
    pub emoji_allowlist: BTreeSet<char>,
    pub accent_scan: RangeInclusive<u32>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            emoji_placeholder: DEFAULT_EMOJI_PLACEHOLDER.to_string(),
            emoji_allowlist: DEFAULT_EMOJI_ALLOWLIST.into_iter().collect(),
            accent_scan: DEFAULT_ACCENT_SCAN,
        }
    }
}

/// Counters describing one compiler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub raw_entries: usize,
    pub pairs: usize,
    /// Natural-language pairs dropped because they touch an emoji unit.
    pub emoji_overrides: usize,
    pub refused_unions: usize,
    pub units: usize,
    pub classes: usize,
}

/// Output of the compiler: the two derived maps, ordered for stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledTable {
    pub confusable_to_canonical: BTreeMap<String, String>,
    pub canonical_to_confusables: BTreeMap<String, BTreeSet<String>>,
    pub stats: CompileStats,
}

impl CompiledTable {
    pub fn len(&self) -> usize {
        self.confusable_to_canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confusable_to_canonical.is_empty()
    }
}

/// Build the table from parsed raw entries.
pub fn compile(entries: &[RawMappingEntry], options: &CompileOptions) -> CompiledTable {
    let mut stats = CompileStats {
        raw_entries: entries.len(),
        ..CompileStats::default()
    };

    let emoji = augment::emoji_units(&options.emoji_allowlist);
    let collapsed: HashSet<&str> = emoji
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(options.emoji_placeholder.as_str()))
        .collect();

    // Natural-language evidence, in union order: raw, reverse, accent, case.
    let mut natural: Vec<(String, String)> = Vec::with_capacity(entries.len() * 2);
    natural.extend(entries.iter().map(|e| (e.source.clone(), e.target.clone())));
    natural.extend(entries.iter().map(|e| (e.target.clone(), e.source.clone())));
    natural.extend(augment::accent_pairs(options.accent_scan.clone()));
    let case = augment::case_pairs(&natural);
    natural.extend(case);

    let before = natural.len();
    natural.retain(|(a, b)| !collapsed.contains(a.as_str()) && !collapsed.contains(b.as_str()));
    stats.emoji_overrides = before - natural.len();

    let mut classes = EquivalenceClasses::new();
    classes.pin(&options.emoji_placeholder);
    for (a, b) in &natural {
        classes.union(a, b);
    }
    for unit in &emoji {
        classes.union(unit, &options.emoji_placeholder);
    }
    stats.pairs = natural.len() + emoji.len();
    stats.refused_unions = classes.refused();
    stats.units = classes.len();

    let mut table = CompiledTable::default();
    for class in classes.classes() {
        // A non-ASCII representative is kept and maps to itself.
        let retained: BTreeSet<String> = class
            .members
            .into_iter()
            .filter(|m| !is_ascii_unit(m))
            .filter(|m| !is_allowlisted(m, &options.emoji_allowlist))
            .collect();
        if retained.is_empty() {
            continue;
        }
        for member in &retained {
            table
                .confusable_to_canonical
                .insert(member.clone(), class.representative.clone());
        }
        table
            .canonical_to_confusables
            .insert(class.representative, retained);
    }
    stats.classes = table.canonical_to_confusables.len();
    table.stats = stats;

    tracing::info!(
        raw_entries = stats.raw_entries,
        pairs = stats.pairs,
        units = stats.units,
        classes = stats.classes,
        entries = table.len(),
        refused = stats.refused_unions,
        "compiled confusable table"
    );
    table
}

fn is_allowlisted(unit: &str, allowlist: &BTreeSet<char>) -> bool {
    let mut chars = unit.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => allowlist.contains(&ch),
        _ => false,
    }
}

/// Compile raw data held in memory.
pub fn compile_str(text: &str, options: &CompileOptions) -> CompiledTable {
    compile(&raw::parse_str(text), options)
}

/// Compile a raw data file.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<CompiledTable, CompileError> {
    let entries = raw::read_file(path)?;
    tracing::debug!(path = %path.display(), entries = entries.len(), "read raw mapping data");
    Ok(compile(&entries, options))
}

/// Write compiler output to `path`.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<(), CompileError> {
    std::fs::write(path, contents).map_err(|source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    })
}
