//! Primary/secondary synthesizer chain.
//!
//! [`FallbackSynthesizer`] tries the primary engine first; on any error it
//! logs a warning and hands the same request to the secondary.  The error
//! of the secondary is what the caller sees when both fail.

use std::path::Path;

use async_trait::async_trait;

use crate::ids::Locale;

use super::{SpeechSynthesizer, TtsError};

// ---------------------------------------------------------------------------
// FallbackSynthesizer
// ---------------------------------------------------------------------------

/// # Example
/// ```rust
/// use std::path::Path;
/// use videoconv::config::TtsConfig;
/// use videoconv::tts::{EspeakSynthesizer, FallbackSynthesizer, GttsSynthesizer};
///
/// let config = TtsConfig::default();
/// let tts = FallbackSynthesizer::new(
///     GttsSynthesizer::from_config(&config),
///     EspeakSynthesizer::new(&config, Path::new("ffmpeg")),
/// );
/// ```
pub struct FallbackSynthesizer<P, S> {
    primary: P,
    secondary: S,
}

impl<P: SpeechSynthesizer, S: SpeechSynthesizer> FallbackSynthesizer<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }
}

#[async_trait]
impl<P: SpeechSynthesizer, S: SpeechSynthesizer> SpeechSynthesizer for FallbackSynthesizer<P, S> {
    async fn synthesize(&self, text: &str, locale: Locale, output: &Path) -> Result<(), TtsError> {
        match self.primary.synthesize(text, locale, output).await {
            Ok(()) => Ok(()),
            // Nothing the secondary could do better.
            Err(TtsError::EmptyText) => Err(TtsError::EmptyText),
            Err(err) => {
                log::warn!("tts: primary engine failed for {locale} ({err}), using fallback");
                self.secondary.synthesize(text, locale, output).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Writes a fixed payload.
    struct Writes(&'static str, AtomicUsize);

    impl Writes {
        fn new(payload: &'static str) -> Self {
            Self(payload, AtomicUsize::new(0))
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for Writes {
        async fn synthesize(&self, _: &str, _: Locale, output: &Path) -> Result<(), TtsError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            std::fs::write(output, self.0).map_err(|e| TtsError::io(output, e))
        }
    }

    struct Fails(AtomicUsize);

    #[async_trait]
    impl SpeechSynthesizer for Fails {
        async fn synthesize(&self, _: &str, _: Locale, _: &Path) -> Result<(), TtsError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(TtsError::Request("HTTP 503 Service Unavailable".into()))
        }
    }

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.mp3");
        let tts = FallbackSynthesizer::new(Writes::new("primary"), Writes::new("secondary"));
        tts.synthesize("hola", Locale::Es, &out).await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "primary");
        assert_eq!(tts.secondary.1.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_failure_uses_secondary() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a.mp3");
        let tts = FallbackSynthesizer::new(Fails(AtomicUsize::new(0)), Writes::new("secondary"));
        tts.synthesize("hello", Locale::En, &out).await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "secondary");
        assert_eq!(tts.primary().0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_failing_returns_secondary_error() {
        let dir = tempfile::tempdir().unwrap();
        let tts = FallbackSynthesizer::new(Fails(AtomicUsize::new(0)), Fails(AtomicUsize::new(0)));
        let err = tts
            .synthesize("ciao", Locale::It, &dir.path().join("a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Request(_)));
        assert_eq!(tts.secondary.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chain_is_object_safe() {
        let _: Box<dyn SpeechSynthesizer> = Box::new(FallbackSynthesizer::new(
            Writes::new("a"),
            Fails(AtomicUsize::new(0)),
        ));
    }
}
