//! SRT and WebVTT writers for transcript segments.

use std::fmt::Write as _;

use crate::stt::Segment;

/// Split seconds into `(h, m, s, ms)`, rounding to the millisecond.
/// Negative and non-finite values clamp to zero.
fn split_time(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    (h, m, s, ms)
}

/// `HH:MM:SS,mmm`
pub fn format_srt_time(seconds: f64) -> String {
    let (h, m, s, ms) = split_time(seconds);
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// `HH:MM:SS.mmm`
pub fn format_vtt_time(seconds: f64) -> String {
    let (h, m, s, ms) = split_time(seconds);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Numbered SRT cues, one per segment, separated by blank lines.
pub fn to_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_time(seg.start),
            format_srt_time(seg.end),
            seg.text.trim()
        );
    }
    out
}

/// A `WEBVTT` document with one cue per segment.
pub fn to_vtt(segments: &[Segment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for seg in segments {
        let _ = write!(
            out,
            "{} --> {}\n{}\n\n",
            format_vtt_time(seg.start),
            format_vtt_time(seg.end),
            seg.text.trim()
        );
    }
    out
}
