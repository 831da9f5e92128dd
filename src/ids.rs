//! Job identifiers and supported locales.
//!
//! Both types end up inside filesystem paths, so they are validated on
//! construction: a [`JobId`] parsed from caller input can never contain a
//! path separator, and a [`Locale`] is one of the fixed supported codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// IdError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("invalid job id: {0:?}")]
    InvalidJobId(String),

    #[error("unsupported locale: {0:?} (supported: es, en, pt, it, fr)")]
    UnsupportedLocale(String),
}

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// Opaque job identifier, the namespace for every artifact of a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    const MAX_LEN: usize = 64;

    /// A fresh random id (UUID v4, 32 lowercase hex characters).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for JobId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = !s.is_empty()
            && s.len() <= Self::MAX_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(IdError::InvalidJobId(s.to_string()))
        }
    }
}

impl TryFrom<String> for JobId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// Target language for translation and speech synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    En,
    Pt,
    It,
    Fr,
}

impl Locale {
    pub const ALL: [Locale; 5] = [Locale::Es, Locale::En, Locale::Pt, Locale::It, Locale::Fr];

    /// ISO-639-1 code, used in artifact file names and API calls.
    pub fn code(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
            Locale::Pt => "pt",
            Locale::It => "it",
            Locale::Fr => "fr",
        }
    }

    /// English language name, used in LLM prompts.
    pub fn english_name(self) -> &'static str {
        match self {
            Locale::Es => "Spanish",
            Locale::En => "English",
            Locale::Pt => "Portuguese",
            Locale::It => "Italian",
            Locale::Fr => "French",
        }
    }

    /// Matches a language code as reported by an ASR backend (`"es"`,
    /// `"es-AR"`, `"Spanish"` …).  Returns `None` for anything unsupported.
    pub fn from_language_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if let Ok(locale) = tag.parse() {
            return Some(locale);
        }
        Self::ALL
            .into_iter()
            .find(|l| l.english_name().eq_ignore_ascii_case(tag))
    }
}

impl FromStr for Locale {
    type Err = IdError;

    /// Accepts bare codes and region-qualified tags (`"pt-BR"`, `"fr_FR"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s.split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            "pt" => Ok(Locale::Pt),
            "it" => Ok(Locale::It),
            "fr" => Ok(Locale::Fr),
            _ => Err(IdError::UnsupportedLocale(s.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_valid() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert_eq!(a.as_str().parse::<JobId>().unwrap(), a);
    }

    #[test]
    fn job_id_rejects_path_characters() {
        for bad in ["", "../etc", "a/b", "a b", "x\\y", "."] {
            assert!(bad.parse::<JobId>().is_err(), "{bad:?} should be rejected");
        }
        assert!("J1".parse::<JobId>().is_ok());
        assert!("job_01-a".parse::<JobId>().is_ok());
    }

    #[test]
    fn job_id_serde_validates() {
        let ok: JobId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(ok.as_str(), "abc123");
        assert!(serde_json::from_str::<JobId>("\"../x\"").is_err());
    }

    #[test]
    fn locale_parses_region_tags() {
        assert_eq!("pt-BR".parse::<Locale>().unwrap(), Locale::Pt);
        assert_eq!("FR".parse::<Locale>().unwrap(), Locale::Fr);
        assert_eq!("es_AR".parse::<Locale>().unwrap(), Locale::Es);
        assert!(matches!(
            "de".parse::<Locale>(),
            Err(IdError::UnsupportedLocale(_))
        ));
    }

    #[test]
    fn locale_from_language_name() {
        assert_eq!(Locale::from_language_tag("italian"), Some(Locale::It));
        assert_eq!(Locale::from_language_tag("en"), Some(Locale::En));
        assert_eq!(Locale::from_language_tag("german"), None);
    }

    #[test]
    fn locale_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Locale::It).unwrap(), "\"it\"");
        assert_eq!(Locale::Es.to_string(), "es");
    }
}
