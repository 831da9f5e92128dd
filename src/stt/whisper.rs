//! In-process transcription with whisper.cpp via `whisper-rs`.
//!
//! Only compiled with the `whisper` cargo feature.  Inference is blocking and
//! runs on `tokio::task::spawn_blocking`; a new `WhisperState` is created for
//! every call so one loaded model can be shared across jobs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::engine::{SttError, Transcriber};
use super::transcribe::{Segment, Transcript};

/// Resolve `ggml-<model>.bin` under `models_dir`.  A model value that is
/// already a path to an existing file is used as-is.
pub fn model_path(models_dir: &Path, model: &str) -> PathBuf {
    let direct = PathBuf::from(model);
    if direct.is_file() {
        return direct;
    }
    models_dir.join(format!("ggml-{model}.bin"))
}

struct Model {
    ctx: WhisperContext,
    language: String,
    n_threads: i32,
}

/// Whisper-backed [`Transcriber`].
pub struct WhisperTranscriber {
    model: Arc<Model>,
}

impl WhisperTranscriber {
    /// Load a GGML model.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`] — `model_path` does not exist.
    /// - [`SttError::ContextInit`]  — whisper-rs failed to load the file.
    pub fn load(model_path: &Path, language: &str) -> Result<Self, SttError> {
        if !model_path.exists() {
            return Err(SttError::ModelNotFound(model_path.display().to_string()));
        }
        let path_str = model_path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                model_path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| SttError::ContextInit(e.to_string()))?;
        log::info!("stt: whisper model loaded from {}", model_path.display());

        let n_threads = std::thread::available_parallelism()
            .map(|n| n.get().min(8) as i32)
            .unwrap_or(4);

        Ok(Self {
            model: Arc::new(Model {
                ctx,
                language: language.to_string(),
                n_threads,
            }),
        })
    }
}

impl Model {
    fn run(&self, audio: &[f32], hint: Option<&str>) -> Result<Transcript, SttError> {
        let mut fp = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: 5,
            patience: -1.0,
        });

        let lang = hint
            .unwrap_or(self.language.as_str())
            .trim()
            .to_ascii_lowercase();
        let lang = (!lang.is_empty() && lang != "auto").then_some(lang);
        fp.set_language(lang.as_deref());
        fp.set_n_threads(self.n_threads);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;
        state
            .full(fp, audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut segments = Vec::with_capacity(n_segments.max(0) as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;
            // Timestamps are in centiseconds.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as f64 / 100.0;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as f64 / 100.0;
            segments.push(Segment::new(t0, t1, text));
        }

        let detected = lang.or_else(|| {
            state
                .full_lang_id_from_state()
                .ok()
                .and_then(whisper_rs::get_lang_str)
                .map(str::to_string)
        });
        Ok(Transcript::new(detected, segments))
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        audio: &Path,
        language: Option<&str>,
    ) -> Result<Transcript, SttError> {
        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| SttError::audio(audio, e))?;
        let samples = decode_wav(&bytes)?;

        let model = Arc::clone(&self.model);
        let hint = language.map(str::to_string);
        tokio::task::spawn_blocking(move || model.run(&samples, hint.as_deref()))
            .await
            .map_err(|e| SttError::Transcription(e.to_string()))?
    }
}

/// Decode a 16-bit PCM WAV file into mono f32 samples in `[-1, 1]`.
/// Multi-channel input is down-mixed by averaging.
pub(crate) fn decode_wav(bytes: &[u8]) -> Result<Vec<f32>, SttError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(SttError::Format("not a RIFF/WAVE file".into()));
    }

    let mut channels = 0u16;
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]])
            as usize;
        let body_start = pos + 8;
        let body_end = body_start.saturating_add(size).min(bytes.len());
        let body = &bytes[body_start..body_end];

        match id {
            b"fmt " => {
                if body.len() < 16 {
                    return Err(SttError::Format("truncated fmt chunk".into()));
                }
                let format = u16::from_le_bytes([body[0], body[1]]);
                channels = u16::from_le_bytes([body[2], body[3]]);
                let bits = u16::from_le_bytes([body[14], body[15]]);
                if format != 1 || bits != 16 || channels == 0 {
                    return Err(SttError::Format(format!(
                        "expected 16-bit PCM, got format {format} with {bits} bits"
                    )));
                }
            }
            b"data" => {
                if channels == 0 {
                    return Err(SttError::Format("data chunk before fmt chunk".into()));
                }
                let frame = channels as usize;
                let samples: Vec<f32> = body
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32_768.0)
                    .collect();
                return Ok(samples
                    .chunks(frame)
                    .map(|f| f.iter().sum::<f32>() / f.len() as f32)
                    .collect());
            }
            _ => {}
        }
        // Chunks are padded to an even size.
        pos = body_start.saturating_add(size + (size & 1));
    }
    Err(SttError::Format("no data chunk".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav(channels: u16, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&16_000u32.to_le_bytes());
        out.extend_from_slice(&(16_000u32 * 2 * channels as u32).to_le_bytes());
        out.extend_from_slice(&(2 * channels).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn decodes_mono() {
        let samples = decode_wav(&wav(1, &[0, 16_384, -32_768])).unwrap();
        assert_eq!(samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn downmixes_stereo() {
        let samples = decode_wav(&wav(2, &[16_384, 0, -16_384, -16_384])).unwrap();
        assert_eq!(samples, vec![0.25, -0.5]);
    }

    #[test]
    fn rejects_non_wav() {
        assert!(matches!(decode_wav(b"ID3\x04junk"), Err(SttError::Format(_))));
    }

    #[test]
    fn model_path_resolution() {
        let p = model_path(Path::new("/models"), "small");
        assert_eq!(p, PathBuf::from("/models/ggml-small.bin"));
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = WhisperTranscriber::load(Path::new("/nonexistent/model.bin"), "auto");
        assert!(matches!(result, Err(SttError::ModelNotFound(_))));
    }
}
