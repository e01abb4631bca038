use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use homoglyph_core::engine::ConfusableEngine;
use homoglyph_core::unicode::{unicode_normalize, NormalizationForm};

#[derive(Debug, Deserialize)]
struct FixtureFile<T> {
    fixture: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ConfusableFixture {
    name: String,
    #[serde(default)]
    description: String,
    input: String,
    expected: String,
    detected: Vec<String>,
    #[serde(default)]
    raw_bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct UnicodeFixture {
    name: String,
    input: String,
    form: String,
    strip_invisible: bool,
    expected: String,
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
}

fn load_fixtures<T: serde::de::DeserializeOwned>(filename: &str) -> Vec<T> {
    let path = fixtures_dir().join(filename);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    let file: FixtureFile<T> = toml::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));
    file.fixture
}

fn run_confusable_fixture(engine: ConfusableEngine<'_>, fixture: &ConfusableFixture) {
    let (normalized, detected) = if fixture.raw_bytes.is_empty() {
        (
            engine.normalize(&fixture.input),
            engine.detect(&fixture.input),
        )
    } else {
        (
            engine.normalize_bytes(&fixture.raw_bytes),
            engine.detect_bytes(&fixture.raw_bytes),
        )
    };

    assert_eq!(
        normalized, fixture.expected,
        "Fixture '{}': normalize mismatch",
        fixture.name
    );

    let expected: BTreeSet<String> = fixture.detected.iter().cloned().collect();
    assert_eq!(
        detected, expected,
        "Fixture '{}': detect mismatch",
        fixture.name
    );

    // Normalized output is a fixed point.
    assert_eq!(
        engine.normalize(&normalized),
        normalized,
        "Fixture '{}': normalize is not idempotent",
        fixture.name
    );
    assert_eq!(
        engine.is_confusable(&fixture.input),
        fixture.raw_bytes.is_empty() && !expected.is_empty(),
        "Fixture '{}': is_confusable mismatch",
        fixture.name
    );
}

#[test]
fn test_confusable_fixtures() {
    let engine = ConfusableEngine::global();
    let fixtures: Vec<ConfusableFixture> = load_fixtures("confusables.toml");
    let count = fixtures.len();
    for fixture in &fixtures {
        run_confusable_fixture(engine, fixture);
    }
    eprintln!("Passed {count} confusable fixtures");
}

#[test]
fn test_unicode_fixtures() {
    let fixtures: Vec<UnicodeFixture> = load_fixtures("unicode.toml");
    let count = fixtures.len();
    for fixture in &fixtures {
        let form: NormalizationForm = fixture
            .form
            .parse()
            .unwrap_or_else(|e| panic!("Fixture '{}': {e}", fixture.name));
        assert_eq!(
            unicode_normalize(&fixture.input, form, fixture.strip_invisible),
            fixture.expected,
            "Fixture '{}'",
            fixture.name
        );
    }
    eprintln!("Passed {count} unicode fixtures");
}

#[test]
fn test_thirteen_o_lookalikes() {
    let lookalikes = [
        '\u{AB3D}', '\u{43E}', '\u{6BE}', '\u{3BF}', '\u{101D}', '\u{6C1}', '\u{3C3}', '\u{647}',
        '\u{FF4F}', '\u{E50}', '\u{ED0}', '\u{1D560}', '\u{1042C}',
    ];
    let engine = ConfusableEngine::global();
    for o in lookalikes {
        let input = format!("c3p{o} ");
        assert_eq!(engine.normalize(&input), "c3po ", "U+{:04X}", o as u32);
        assert_eq!(engine.detect(&input).len(), 1, "U+{:04X}", o as u32);
    }
}
