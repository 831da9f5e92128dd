//! Offline word-frequency summarizer.
//!
//! Sentences are scored by the summed corpus frequency of their words (stop
//! words and words of two letters or fewer ignored); the best `max_sentences`
//! are kept in their original order.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::stt::Transcript;

use super::{SummaryError, Summarizer};

/// Returned for a transcript without any text.
pub const NO_SUMMARY: &str = "No se pudo generar un resumen.";

const STOP_WORDS: &str = "\
    de la que el en y a los las un una para con por del se al lo es \
    como más muy ya no sí o pero también si esto esta este estos estas \
    fue fueron son ser sobre entre hasta donde cuando porque";

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\p{L}+").expect("static regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.split_whitespace().collect())
}

#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    max_sentences: usize,
}

impl ExtractiveSummarizer {
    pub fn new(max_sentences: usize) -> Self {
        Self {
            max_sentences: max_sentences.max(1),
        }
    }

    /// Summarize plain text.
    pub fn summarize_text(&self, text: &str) -> String {
        let text = whitespace_re().replace_all(text, " ");
        let text = text.trim();
        if text.is_empty() {
            return NO_SUMMARY.to_string();
        }

        let sentences = split_sentences(text);
        if sentences.len() <= self.max_sentences {
            return text.to_string();
        }

        let lowered = text.to_lowercase();
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for word in word_re().find_iter(&lowered).map(|m| m.as_str()) {
            if word.chars().count() > 2 && !stop_words().contains(word) {
                *freq.entry(word).or_default() += 1;
            }
        }

        let mut scored: Vec<(usize, usize)> = sentences
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let lowered = s.to_lowercase();
                let score = word_re()
                    .find_iter(&lowered)
                    .map(|m| freq.get(m.as_str()).copied().unwrap_or(0))
                    .sum();
                (i, score)
            })
            .collect();

        // Stable sort: ties keep the earlier sentence.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        let mut keep: Vec<usize> = scored
            .into_iter()
            .take(self.max_sentences)
            .map(|(i, _)| i)
            .collect();
        keep.sort_unstable();

        keep.into_iter()
            .map(|i| sentences[i])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, transcript: &Transcript) -> Result<String, SummaryError> {
        Ok(self.summarize_text(&transcript.full_text()))
    }
}

/// Split after `.`, `!` or `?` followed by whitespace.  `text` must already
/// have its whitespace collapsed to single spaces.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut after_terminator = false;
    for (i, c) in text.char_indices() {
        if c == ' ' && after_terminator {
            sentences.push(&text[start..i]);
            start = i + 1;
        }
        after_terminator = matches!(c, '.' | '!' | '?');
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_terminators() {
        assert_eq!(
            split_sentences("Hola. ¿Qué tal? Bien! fin"),
            vec!["Hola.", "¿Qué tal?", "Bien!", "fin"]
        );
        assert_eq!(split_sentences("3.5 millones"), vec!["3.5 millones"]);
    }

    #[test]
    fn empty_text_gets_fixed_message() {
        let s = ExtractiveSummarizer::new(4);
        assert_eq!(s.summarize_text("  \n\t "), NO_SUMMARY);
    }

    #[test]
    fn short_text_is_returned_whole_with_collapsed_whitespace() {
        let s = ExtractiveSummarizer::new(4);
        assert_eq!(
            s.summarize_text("Uno.\n\nDos.   Tres."),
            "Uno. Dos. Tres."
        );
    }

    #[test]
    fn keeps_highest_scoring_sentences_in_order() {
        let s = ExtractiveSummarizer::new(2);
        let text = "El volcán entró en erupción. \
                    Hoy llovió un poco. \
                    La erupción del volcán obligó a evacuar. \
                    Mañana habrá sol.";
        assert_eq!(
            s.summarize_text(text),
            "El volcán entró en erupción. La erupción del volcán obligó a evacuar."
        );
    }

    #[test]
    fn stop_words_and_short_words_do_not_score() {
        let s = ExtractiveSummarizer::new(1);
        // "para" and "de" repeat but are stop words; "sol" is the only scoring word.
        let text = "Para de para de para. Sol y sol.";
        assert_eq!(s.summarize_text(text), "Sol y sol.");
    }

    #[tokio::test]
    async fn summarizes_transcript_text() {
        use crate::stt::Segment;
        let t = Transcript::new(
            Some("es".into()),
            vec![Segment::new(0.0, 1.0, "Hola."), Segment::new(1.0, 2.0, "Adiós.")],
        );
        let out = ExtractiveSummarizer::new(4).summarize(&t).await.unwrap();
        assert_eq!(out, "Hola. Adiós.");
    }
}
