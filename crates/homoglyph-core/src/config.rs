use etcetera::BaseStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::codec::{self, HexError};
use crate::compiler::{
    CompileOptions, DEFAULT_ACCENT_SCAN, DEFAULT_EMOJI_ALLOWLIST, DEFAULT_EMOJI_PLACEHOLDER,
};

/// Environment variable naming a compiler config file.
pub const CONFIG_ENV: &str = "HOMOGLYPH_CONFIG";

/// Try both `.yaml` and `.yml` extensions in a directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    let yaml = dir.join("compiler.yaml");
    if yaml.exists() {
        return Some(yaml);
    }
    let yml = dir.join("compiler.yml");
    if yml.exists() {
        return Some(yml);
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("emoji_placeholder must not be empty")]
    EmptyPlaceholder,
    #[error("invalid emoji_allowlist entry '{entry}': {source}")]
    Allowlist {
        entry: String,
        #[source]
        source: HexError,
    },
    #[error("emoji_allowlist entry '{0}' is not a single codepoint")]
    AllowlistNotSingle(String),
    #[error("invalid accent_scan bound '{bound}': {source}")]
    AccentBound {
        bound: String,
        #[source]
        source: HexError,
    },
}

/// Table compiler configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Path this config was loaded from.
    #[serde(skip)]
    pub path: Option<PathBuf>,

    /// Canonical form every emoji collapses onto.
    pub emoji_placeholder: String,

    /// Hex codepoints exempt from the emoji collapse.
    pub emoji_allowlist: Vec<String>,

    /// Window scanned for accented forms of ASCII letters.
    pub accent_scan: AccentScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentScan {
    pub start: String,
    pub end: String,
}

impl Default for AccentScan {
    fn default() -> Self {
        Self {
            start: format!("{:04X}", DEFAULT_ACCENT_SCAN.start()),
            end: format!("{:04X}", DEFAULT_ACCENT_SCAN.end()),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            path: None,
            emoji_placeholder: DEFAULT_EMOJI_PLACEHOLDER.to_string(),
            emoji_allowlist: DEFAULT_EMOJI_ALLOWLIST
                .iter()
                .map(|&ch| format!("{:04X}", ch as u32))
                .collect(),
            accent_scan: AccentScan::default(),
        }
    }
}

impl CompilerConfig {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load a config the user asked for by name. Any failure is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Discover and load a config without failing: a file found implicitly
    /// that cannot be read or parsed is reported and defaults are used.
    pub fn discover(cwd: Option<&Path>) -> Self {
        match discover_config_path(cwd) {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "using compiler config");
                config
            }
            Err(e) => {
                tracing::warn!("{e}; using default compiler settings");
                Self::default()
            }
        }
    }

    /// Validate and convert into compiler options.
    pub fn to_options(&self) -> Result<CompileOptions, ConfigError> {
        if self.emoji_placeholder.is_empty() {
            return Err(ConfigError::EmptyPlaceholder);
        }

        let mut emoji_allowlist = BTreeSet::new();
        for entry in &self.emoji_allowlist {
            let unit = codec::parse_hex_sequence(entry).map_err(|source| ConfigError::Allowlist {
                entry: entry.clone(),
                source,
            })?;
            let mut chars = unit.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => {
                    emoji_allowlist.insert(ch);
                }
                _ => return Err(ConfigError::AllowlistNotSingle(entry.clone())),
            }
        }

        Ok(CompileOptions {
            emoji_placeholder: self.emoji_placeholder.clone(),
            emoji_allowlist,
            accent_scan: self.accent_scan.to_range()?,
        })
    }
}

impl AccentScan {
    pub fn to_range(&self) -> Result<RangeInclusive<u32>, ConfigError> {
        Ok(parse_bound(&self.start)?..=parse_bound(&self.end)?)
    }
}

fn parse_bound(bound: &str) -> Result<u32, ConfigError> {
    let trimmed = bound.trim();
    let hex = trimmed
        .strip_prefix("U+")
        .or_else(|| trimmed.strip_prefix("u+"))
        .unwrap_or(trimmed);
    if hex.is_empty() {
        return Err(ConfigError::AccentBound {
            bound: bound.to_string(),
            source: HexError::Empty,
        });
    }
    u32::from_str_radix(hex, 16).map_err(|_| ConfigError::AccentBound {
        bound: bound.to_string(),
        source: HexError::InvalidHex(hex.to_string()),
    })
}

/// Locate a compiler config: `$HOMOGLYPH_CONFIG`, then `.homoglyph/` walking
/// up from `cwd` to the repository root, then the user config directory.
pub fn discover_config_path(cwd: Option<&Path>) -> Option<PathBuf> {
    let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    discover_from(from_env, cwd).or_else(user_config_path)
}

fn discover_from(from_env: Option<PathBuf>, cwd: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }

    let start = cwd
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;

    let mut current = start.as_path();
    loop {
        if let Some(candidate) = find_config_in_dir(&current.join(".homoglyph")) {
            return Some(candidate);
        }

        // Check for .git boundary (directory or file for worktrees)
        if current.join(".git").exists() {
            return None;
        }

        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }

    None
}

/// Get user-level compiler config path.
fn user_config_path() -> Option<PathBuf> {
    let base = etcetera::choose_base_strategy().ok()?;
    find_config_in_dir(&base.config_dir().join("homoglyph"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_compiler() {
        let options = CompilerConfig::default().to_options().unwrap();
        assert_eq!(options, CompileOptions::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CompilerConfig::from_yaml("emoji_allowlist: [\"2122\"]\n").unwrap();
        let options = config.to_options().unwrap();
        assert_eq!(
            options.emoji_allowlist,
            ['\u{2122}'].into_iter().collect::<BTreeSet<char>>()
        );
        assert_eq!(options.emoji_placeholder, DEFAULT_EMOJI_PLACEHOLDER);
        assert_eq!(options.accent_scan, DEFAULT_ACCENT_SCAN);
    }

    #[test]
    fn test_accent_scan_bounds() {
        let config = CompilerConfig::from_yaml(
            "emoji_placeholder: \"*\"\naccent_scan: { start: \"U+00C0\", end: \"017F\" }\n",
        )
        .unwrap();
        let options = config.to_options().unwrap();
        assert_eq!(options.accent_scan, 0xC0..=0x17F);
        assert_eq!(options.emoji_placeholder, "*");
    }

    #[test]
    fn test_invalid_values() {
        let bad_hex = CompilerConfig::from_yaml("emoji_allowlist: [\"zz\"]\n").unwrap();
        assert!(matches!(bad_hex.to_options(), Err(ConfigError::Allowlist { .. })));

        let pair = CompilerConfig::from_yaml("emoji_allowlist: [\"0041 0042\"]\n").unwrap();
        assert!(matches!(pair.to_options(), Err(ConfigError::AllowlistNotSingle(_))));

        let empty = CompilerConfig::from_yaml("emoji_placeholder: \"\"\n").unwrap();
        assert!(matches!(empty.to_options(), Err(ConfigError::EmptyPlaceholder)));

        let bound = CompilerConfig::from_yaml("accent_scan: { start: \"\", end: \"FF\" }\n").unwrap();
        assert!(matches!(bound.to_options(), Err(ConfigError::AccentBound { .. })));
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = CompilerConfig::load(Path::new("/no/such/compiler.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_discover_walks_up_to_git_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join(".homoglyph")).unwrap();
        std::fs::write(root.join(".homoglyph/compiler.yml"), "emoji_placeholder: \"?\"\n").unwrap();
        let nested = root.join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let found = discover_from(None, Some(&nested)).unwrap();
        assert_eq!(found, root.join(".homoglyph/compiler.yml"));
    }

    #[test]
    fn test_discover_stops_at_git_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path();
        std::fs::create_dir_all(outer.join(".homoglyph")).unwrap();
        std::fs::write(outer.join(".homoglyph/compiler.yaml"), "{}\n").unwrap();
        let repo = outer.join("repo");
        std::fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(discover_from(None, Some(&repo)), None);
    }

    #[test]
    fn test_env_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("custom.yaml");
        assert_eq!(
            discover_from(Some(explicit.clone()), Some(dir.path())),
            Some(explicit)
        );
    }

    #[test]
    fn test_unparseable_implicit_config_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compiler.yaml");
        std::fs::write(&path, "emoji_allowlist: {not: [a list\n").unwrap();
        assert_eq!(CompilerConfig::load_or_default(&path), CompilerConfig::default());
        assert!(matches!(
            CompilerConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
