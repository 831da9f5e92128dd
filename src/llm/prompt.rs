//! Prompt builder for translation and summarization.
//!
//! [`PromptBuilder`] produces `(system_msg, user_msg)` pairs for any
//! OpenAI-compatible `/v1/chat/completions` endpoint:
//! * **Translate** — one text into a target locale.
//! * **Translate lines** — a numbered batch, answered line by line, so
//!   subtitle timings can be kept.
//! * **Summarize** — a short summary of a transcript.

use crate::ids::Locale;

// ---------------------------------------------------------------------------
// System instructions
// ---------------------------------------------------------------------------

const TRANSLATE_INSTRUCTION: &str = "\
You are a professional translator.
Task: Translate the user's text into {target}.

Rules:
1. Preserve the meaning, tone and register of the original.
2. Keep names, numbers, URLs and technical terms exactly as written.
3. Reply with ONLY the translation — no notes, no quotes, no explanation.";

const TRANSLATE_LINES_INSTRUCTION: &str = "\
You are a professional subtitle translator.
Task: Translate every numbered line into {target}.

Rules:
1. Answer with exactly one line per input line, in the same order.
2. Start each line with its number followed by a colon, as in the input.
3. Never merge, split, skip or reorder lines.
4. Keep names, numbers and technical terms exactly as written.
5. Reply with ONLY the numbered translations.";

const SUMMARIZE_INSTRUCTION: &str = "\
You summarize video transcripts.
Task: Write a summary of the transcript in at most {max} sentences.

Rules:
1. Write the summary in {language}.
2. Cover the main points only; no introductions such as \"This video\".
3. Reply with ONLY the summary text.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Prompt for translating `text` into `target`.  `source` names the
    /// spoken language when it is known.
    pub fn translate(&self, text: &str, target: Locale, source: Option<&str>) -> (String, String) {
        let system = TRANSLATE_INSTRUCTION.replace("{target}", target.english_name());
        let user = match source {
            Some(src) => format!("Source language: {src}\n\n{text}"),
            None => text.to_string(),
        };
        (system, user)
    }

    /// Prompt for translating `lines` as a numbered batch (1-based).
    ///
    /// The source language goes into the system prompt so the user message
    /// holds nothing but numbered lines.
    pub fn translate_lines(
        &self,
        lines: &[String],
        target: Locale,
        source: Option<&str>,
    ) -> (String, String) {
        let mut system = TRANSLATE_LINES_INSTRUCTION.replace("{target}", target.english_name());
        if let Some(src) = source {
            system.push_str(&format!("\nThe lines are in {src}."));
        }
        let user = lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}: {}", i + 1, line.replace('\n', " ")))
            .collect::<Vec<_>>()
            .join("\n");
        (system, user)
    }

    /// Prompt for summarizing `transcript`.  Without a `language` the
    /// summary is written in the transcript's own language.
    pub fn summarize(
        &self,
        transcript: &str,
        language: Option<&str>,
        max_sentences: usize,
    ) -> (String, String) {
        let language = match language.and_then(Locale::from_language_tag) {
            Some(l) => l.english_name().to_string(),
            None => "the same language as the transcript".to_string(),
        };
        let system = SUMMARIZE_INSTRUCTION
            .replace("{max}", &max_sentences.to_string())
            .replace("{language}", &language);
        (system, format!("Transcript:\n{transcript}"))
    }
}

/// Parse a numbered reply produced for [`PromptBuilder::translate_lines`].
///
/// Returns `None` unless every number `1..=expected` appears exactly once.
pub fn parse_numbered_lines(reply: &str, expected: usize) -> Option<Vec<String>> {
    let mut out: Vec<Option<String>> = vec![None; expected];
    for line in reply.lines() {
        let line = line.trim();
        let Some((num, text)) = line.split_once(|c| c == ':' || c == '.' || c == ')') else {
            continue;
        };
        let Ok(n) = num.trim().parse::<usize>() else {
            continue;
        };
        if n == 0 || n > expected || out[n - 1].is_some() {
            return None;
        }
        out[n - 1] = Some(text.trim().to_string());
    }
    out.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_prompt_names_target_language() {
        let (system, user) = PromptBuilder::new().translate("Hola", Locale::It, Some("es"));
        assert!(system.contains("Italian"));
        assert!(!system.contains("{target}"));
        assert!(user.ends_with("Hola"));
        assert!(user.contains("es"));
    }

    #[test]
    fn translate_lines_numbers_from_one() {
        let lines = vec!["Hola".to_string(), "¿Qué\ntal?".to_string()];
        let (system, user) = PromptBuilder::new().translate_lines(&lines, Locale::Fr, None);
        assert!(system.contains("French"));
        assert!(!system.contains("The lines are in"));
        assert_eq!(user, "1: Hola\n2: ¿Qué tal?");
    }

    #[test]
    fn translate_lines_names_source_language() {
        let lines = vec!["Hola".to_string()];
        let (system, user) =
            PromptBuilder::new().translate_lines(&lines, Locale::En, Some("es"));
        assert!(system.ends_with("The lines are in es."));
        assert_eq!(user, "1: Hola");
    }

    #[test]
    fn summarize_prompt() {
        let (system, user) = PromptBuilder::new().summarize("texto", Some("es"), 4);
        assert!(system.contains("at most 4 sentences"));
        assert!(system.contains("Spanish"));
        assert!(user.contains("texto"));

        let (system, _) = PromptBuilder::new().summarize("text", None, 3);
        assert!(system.contains("same language"));
    }

    #[test]
    fn parse_numbered_lines_accepts_common_separators() {
        let reply = "1: Bonjour\n2. Ça va ?\n\n3) Au revoir";
        assert_eq!(
            parse_numbered_lines(reply, 3).unwrap(),
            vec!["Bonjour", "Ça va ?", "Au revoir"]
        );
    }

    #[test]
    fn parse_numbered_lines_rejects_missing_or_duplicate() {
        assert!(parse_numbered_lines("1: a\n3: c", 3).is_none());
        assert!(parse_numbered_lines("1: a\n1: b", 2).is_none());
        assert!(parse_numbered_lines("1: a\n2: b\n3: c", 2).is_none());
    }

    #[test]
    fn parse_numbered_lines_ignores_chatter() {
        let reply = "Here you go:\n1: uno\n2: dos";
        assert_eq!(parse_numbered_lines(reply, 2).unwrap(), vec!["uno", "dos"]);
    }
}
