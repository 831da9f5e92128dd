//! Transcript types.
//!
//! [`Transcript`] is what every [`Transcriber`](super::Transcriber) returns
//! and what the Transcription stage stores as `transcript.json`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// A single time-aligned text chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds from the start of the audio.
    pub start: f64,
    /// End time in seconds from the start of the audio.
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Timestamped segments plus the spoken language, if known.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcript {
    /// Language code reported by the backend (`"es"`), or the caller's hint.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Build a transcript, trimming segment text and dropping empty segments.
    pub fn new(language: Option<String>, segments: impl IntoIterator<Item = Segment>) -> Self {
        let segments = segments
            .into_iter()
            .filter_map(|mut s| {
                let trimmed = s.text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if trimmed.len() != s.text.len() {
                    s.text = trimmed.to_string();
                }
                Some(s)
            })
            .collect();
        let language = language
            .map(|l| l.trim().to_ascii_lowercase())
            .filter(|l| !l.is_empty());
        Self { language, segments }
    }

    /// All segment texts joined by single spaces.
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End time of the last segment, in seconds.
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(|s| s.end).fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_and_drops_empty_segments() {
        let t = Transcript::new(
            Some(" ES ".into()),
            vec![
                Segment::new(0.0, 1.5, "  Hola a todos. "),
                Segment::new(1.5, 2.0, "   "),
                Segment::new(2.0, 3.25, "Bienvenidos."),
            ],
        );
        assert_eq!(t.language.as_deref(), Some("es"));
        assert_eq!(t.segments.len(), 2);
        assert_eq!(t.segments[0].text, "Hola a todos.");
        assert_eq!(t.full_text(), "Hola a todos. Bienvenidos.");
        assert_eq!(t.duration(), 3.25);
    }

    #[test]
    fn empty_language_becomes_none() {
        let t = Transcript::new(Some(String::new()), Vec::new());
        assert_eq!(t.language, None);
        assert!(t.is_empty());
        assert_eq!(t.full_text(), "");
    }

    #[test]
    fn json_shape() {
        let t = Transcript::new(Some("en".into()), vec![Segment::new(0.0, 1.0, "Hi")]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["language"], "en");
        assert_eq!(json["segments"][0]["text"], "Hi");
        assert_eq!(json["segments"][0]["end"], 1.0);
    }
}
