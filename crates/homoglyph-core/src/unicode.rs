//! Normalization adapter: the four Unicode normalization forms plus optional
//! removal of invisible format characters.
//!
//! The forms themselves come from a [`NormalizationBackend`]. A backend
//! failure is never surfaced to the caller; the input is returned unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

impl NormalizationForm {
    pub const ALL: [NormalizationForm; 4] = [
        NormalizationForm::Nfc,
        NormalizationForm::Nfd,
        NormalizationForm::Nfkc,
        NormalizationForm::Nfkd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NormalizationForm::Nfc => "nfc",
            NormalizationForm::Nfd => "nfd",
            NormalizationForm::Nfkc => "nfkc",
            NormalizationForm::Nfkd => "nfkd",
        }
    }
}

impl fmt::Display for NormalizationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid normalization form '{0}' (expected nfc, nfd, nfkc or nfkd)")]
pub struct ParseFormError(pub String);

impl FromStr for NormalizationForm {
    type Err = ParseFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|form| form.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFormError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{form} normalization failed: {reason}")]
pub struct BackendError {
    pub form: NormalizationForm,
    pub reason: String,
}

/// Source of the four normalization forms.
pub trait NormalizationBackend {
    fn normalize(&self, text: &str, form: NormalizationForm) -> Result<String, BackendError>;
}

/// Backend built on the `unicode-normalization` crate. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeNormalizationBackend;

impl NormalizationBackend for UnicodeNormalizationBackend {
    fn normalize(&self, text: &str, form: NormalizationForm) -> Result<String, BackendError> {
        Ok(match form {
            NormalizationForm::Nfc => text.nfc().collect(),
            NormalizationForm::Nfd => text.nfd().collect(),
            NormalizationForm::Nfkc => text.nfkc().collect(),
            NormalizationForm::Nfkd => text.nfkd().collect(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer<B = UnicodeNormalizationBackend> {
    backend: B,
}

impl<B: NormalizationBackend> Normalizer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Normalize `text` to `form`, then drop format characters when
    /// `strip_invisible` is set. On backend failure `text` comes back as is,
    /// unstripped.
    pub fn normalize(&self, text: &str, form: NormalizationForm, strip_invisible: bool) -> String {
        match self.backend.normalize(text, form) {
            Ok(out) if strip_invisible => self::strip_invisible(&out),
            Ok(out) => out,
            Err(e) => {
                tracing::warn!("{e}; passing input through unchanged");
                text.to_string()
            }
        }
    }
}

/// Normalize with the default backend.
pub fn unicode_normalize(text: &str, form: NormalizationForm, strip_invisible: bool) -> String {
    Normalizer::<UnicodeNormalizationBackend>::default().normalize(text, form, strip_invisible)
}

/// General category Cf: joiners, bidi controls, soft hyphen, BOM and friends.
pub fn is_invisible(ch: char) -> bool {
    ch.general_category() == GeneralCategory::Format
}

pub fn strip_invisible(text: &str) -> String {
    text.chars().filter(|&ch| !is_invisible(ch)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    impl NormalizationBackend for FailingBackend {
        fn normalize(&self, _text: &str, form: NormalizationForm) -> Result<String, BackendError> {
            Err(BackendError {
                form,
                reason: "unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_nfd_decomposes() {
        assert_eq!(
            unicode_normalize("caf\u{E9}", NormalizationForm::Nfd, false),
            "cafe\u{301}"
        );
        assert_eq!(
            unicode_normalize("cafe\u{301}", NormalizationForm::Nfc, false),
            "caf\u{E9}"
        );
    }

    #[test]
    fn test_compatibility_forms() {
        assert_eq!(unicode_normalize("\u{FB01}", NormalizationForm::Nfd, false), "\u{FB01}");
        assert_eq!(unicode_normalize("\u{FB01}", NormalizationForm::Nfkd, false), "fi");
        assert_eq!(unicode_normalize("\u{FB01}le", NormalizationForm::Nfkc, false), "file");
    }

    #[test]
    fn test_strip_invisible() {
        let text = "a\u{200D}b\u{200C}c";
        assert_eq!(unicode_normalize(text, NormalizationForm::Nfd, true), "abc");
        assert_eq!(unicode_normalize(text, NormalizationForm::Nfd, false), text);
        assert_eq!(strip_invisible("\u{FEFF}x\u{AD}y\u{202E}"), "xy");
        assert!(!is_invisible(' '));
    }

    #[test]
    fn test_backend_failure_passes_input_through() {
        let normalizer = Normalizer::new(FailingBackend);
        let text = "caf\u{E9}\u{200D}";
        assert_eq!(normalizer.normalize(text, NormalizationForm::Nfd, false), text);
        // Stripping only follows a successful normalization.
        assert_eq!(normalizer.normalize(text, NormalizationForm::Nfkc, true), text);
    }

    #[test]
    fn test_parse_form() {
        assert_eq!("NFKD".parse::<NormalizationForm>(), Ok(NormalizationForm::Nfkd));
        assert_eq!("nfc".parse::<NormalizationForm>(), Ok(NormalizationForm::Nfc));
        assert!("nfx".parse::<NormalizationForm>().is_err());
        assert_eq!(NormalizationForm::Nfkc.to_string(), "nfkc");
    }
}
