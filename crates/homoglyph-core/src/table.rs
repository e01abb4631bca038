use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};

use crate::compiler::CompiledTable;

/// Tables generated by build.rs from `assets/data/confusables.txt`.
mod generated {
    include!(concat!(env!("OUT_DIR"), "/confusables_gen.rs"));
}

/// Version of the persisted JSON layout.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed table artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported table schema version {found} (expected {SCHEMA_VERSION})")]
    Schema { found: u32 },
    #[error("a confusable table is already active for this process")]
    AlreadyInstalled,
}

/// Immutable confusable lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusableTable {
    to_canonical: HashMap<String, String>,
    to_confusables: HashMap<String, BTreeSet<String>>,
    /// Longest key, in codepoints.
    max_key_width: usize,
}

impl ConfusableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(confusable, canonical)` pairs.
    ///
    /// Handy for small synthetic tables; the reverse map is derived.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (confusable, canonical) in pairs {
            let (confusable, canonical) = (confusable.into(), canonical.into());
            table
                .to_confusables
                .entry(canonical.clone())
                .or_default()
                .insert(confusable.clone());
            table.to_canonical.insert(confusable, canonical);
        }
        table.measure_keys()
    }

    pub fn from_compiled(compiled: CompiledTable) -> Self {
        Self {
            to_canonical: compiled.confusable_to_canonical.into_iter().collect(),
            to_confusables: compiled.canonical_to_confusables.into_iter().collect(),
            max_key_width: 0,
        }
        .measure_keys()
    }

    fn from_static(pairs: &[(&str, &str)], classes: &[(&str, &[&str])]) -> Self {
        let to_canonical = pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let to_confusables = classes
            .iter()
            .map(|&(canonical, members)| {
                (
                    canonical.to_string(),
                    members.iter().map(|m| m.to_string()).collect(),
                )
            })
            .collect();
        Self {
            to_canonical,
            to_confusables,
            max_key_width: 0,
        }
        .measure_keys()
    }

    fn measure_keys(mut self) -> Self {
        self.max_key_width = self
            .to_canonical
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0);
        self
    }

    /// Canonical form of a substitution unit, if it is a known confusable.
    #[inline]
    pub fn lookup(&self, unit: &str) -> Option<&str> {
        self.to_canonical.get(unit).map(String::as_str)
    }

    pub fn is_confusable(&self, unit: &str) -> bool {
        self.to_canonical.contains_key(unit)
    }

    /// Codepoint count of the longest confusable key; 0 for an empty table.
    pub fn max_key_width(&self) -> usize {
        self.max_key_width
    }

    /// Every confusable that normalizes to `canonical`.
    pub fn confusables_of(&self, canonical: &str) -> Option<&BTreeSet<String>> {
        self.to_confusables.get(canonical)
    }

    pub fn canonical_forms(&self) -> impl Iterator<Item = &str> {
        self.to_confusables.keys().map(String::as_str)
    }

    /// Number of confusable keys.
    pub fn len(&self) -> usize {
        self.to_canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_canonical.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.to_confusables.len()
    }

    pub fn to_artifact(&self) -> TableArtifact {
        TableArtifact {
            schema_version: SCHEMA_VERSION,
            unicode_version: unicode_version(),
            confusable_to_canonical: self
                .to_canonical
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            canonical_to_confusables: self
                .to_confusables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn from_artifact(artifact: TableArtifact) -> Result<Self, TableError> {
        if artifact.schema_version != SCHEMA_VERSION {
            return Err(TableError::Schema {
                found: artifact.schema_version,
            });
        }
        Ok(Self {
            to_canonical: artifact.confusable_to_canonical.into_iter().collect(),
            to_confusables: artifact.canonical_to_confusables.into_iter().collect(),
            max_key_width: 0,
        }
        .measure_keys())
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, TableError> {
        let artifact: TableArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact)
    }

    /// Load a JSON artifact written by [`ConfusableTable::save`].
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::debug!(path = %path.display(), entries = table.len(), "loaded confusable table");
        Ok(table)
    }

    pub fn write_json(&self, mut w: impl Write) -> Result<(), TableError> {
        self.to_artifact().write_json(&mut w)
    }

    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let mut buf = Vec::new();
        self.write_json(&mut buf)?;
        std::fs::write(path, buf).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Persisted form of a [`ConfusableTable`]. Maps are ordered, so equal tables
/// serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableArtifact {
    pub schema_version: u32,
    pub unicode_version: String,
    pub confusable_to_canonical: BTreeMap<String, String>,
    pub canonical_to_confusables: BTreeMap<String, BTreeSet<String>>,
}

impl TableArtifact {
    pub fn write_json(&self, mut w: impl Write) -> Result<(), TableError> {
        serde_json::to_writer_pretty(&mut w, self)?;
        w.write_all(b"\n").map_err(serde_json::Error::io)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, TableError> {
        let mut buf = Vec::new();
        self.write_json(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl From<&CompiledTable> for TableArtifact {
    fn from(compiled: &CompiledTable) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            unicode_version: unicode_version(),
            confusable_to_canonical: compiled.confusable_to_canonical.clone(),
            canonical_to_confusables: compiled.canonical_to_confusables.clone(),
        }
    }
}

/// Unicode version of the normalization and property data compiled in.
pub fn unicode_version() -> String {
    let (major, minor, patch) = unicode_normalization::UNICODE_VERSION;
    format!("{major}.{minor}.{patch}")
}

static BUILTIN: Lazy<ConfusableTable> = Lazy::new(|| {
    let table = ConfusableTable::from_static(
        generated::CONFUSABLE_TO_CANONICAL,
        generated::CANONICAL_TO_CONFUSABLES,
    );
    debug_assert_eq!(table.len(), generated::CONFUSABLE_COUNT);
    debug_assert_eq!(table.class_count(), generated::CLASS_COUNT);
    table
});

/// The table [`global`] resolves to, fixed on first use.
enum Active {
    Builtin,
    Installed(ConfusableTable),
}

static ACTIVE: OnceCell<Active> = OnceCell::new();

/// The table compiled into this library.
pub fn builtin() -> &'static ConfusableTable {
    &BUILTIN
}

/// Make `table` the process-wide table returned by [`global`].
///
/// Fails once any table is active, including the built-in one after a
/// first call to [`global`]. On failure nothing is kept.
pub fn install(table: ConfusableTable) -> Result<&'static ConfusableTable, TableError> {
    ACTIVE
        .set(Active::Installed(table))
        .map_err(|_| TableError::AlreadyInstalled)?;
    match ACTIVE.get() {
        Some(Active::Installed(installed)) => {
            tracing::debug!(entries = installed.len(), "installed confusable table");
            Ok(installed)
        }
        _ => Err(TableError::AlreadyInstalled),
    }
}

/// The process-wide table: the installed one, or the built-in table.
pub fn global() -> &'static ConfusableTable {
    match ACTIVE.get_or_init(|| Active::Builtin) {
        Active::Builtin => builtin(),
        Active::Installed(table) => table,
    }
}

/// Whether [`global`] resolves to a table passed to [`install`].
pub fn is_custom() -> bool {
    matches!(ACTIVE.get(), Some(Active::Installed(_)))
}
