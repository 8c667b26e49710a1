use crate::shared::dsp::mask_runs;

use super::voice_activity::{frame_features, FrameClassifier};

pub const DEFAULT_AGGRESSIVENESS: u8 = 2;
pub const DEFAULT_MIN_SILENCE_MS: u64 = 1000;
pub const DEFAULT_MIN_GAP_MS: u64 = 400;

/// Analysis frame length. 20 ms is long enough for stable features and
/// short enough to resolve word boundaries.
const FRAME_MS: u64 = 20;

/// Voice-activity silence detector.
///
/// Classifies fixed-size frames of the conditioned mono signal as speech
/// or non-speech, expands the result to per-sample resolution, then
/// run-length filters: speech bursts shorter than `min_gap_ms` between
/// silence regions are absorbed, and silence runs shorter than
/// `min_silence_ms` are discarded.
pub struct SilenceDetector {
    aggressiveness: u8,
    min_silence_ms: u64,
    min_gap_ms: u64,
}

impl SilenceDetector {
    pub fn new(aggressiveness: u8, min_silence_ms: u64, min_gap_ms: u64) -> Self {
        Self {
            aggressiveness,
            min_silence_ms,
            min_gap_ms,
        }
    }

    /// Per-sample silence mask over `samples` (mono). True marks silence
    /// that qualifies for excision.
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> Vec<bool> {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let frame_len = ((sample_rate as u64 * FRAME_MS / 1000) as usize).max(1);
        let n_frames = n / frame_len;
        let classifier = FrameClassifier::new(self.aggressiveness);

        // Everything starts as silence; speech frames carve their span out.
        let mut silence = vec![true; n];
        if n_frames > 0 {
            let per_frame = n as f64 / n_frames as f64;
            for i in 0..n_frames {
                let frame = &samples[i * frame_len..(i + 1) * frame_len];
                if !classifier.is_speech(&frame_features(frame, sample_rate)) {
                    continue;
                }
                let start = (i as f64 * per_frame).round() as usize;
                let end = (((i + 1) as f64 * per_frame).round() as usize).min(n);
                for flag in &mut silence[start..end] {
                    *flag = false;
                }
            }
        }

        let merged = self.merge_short_gaps(&mut silence, sample_rate);

        let min_silence = ms_to_samples(self.min_silence_ms, sample_rate);
        let mut filtered = vec![false; n];
        let mut kept = 0usize;
        let mut silence_samples = 0usize;
        for (start, end) in mask_runs(&silence) {
            if end - start >= min_silence {
                for flag in &mut filtered[start..end] {
                    *flag = true;
                }
                kept += 1;
                silence_samples += end - start;
            }
        }

        log::info!(
            "Silence detection: {} region(s), {:.0}ms total, {} gap(s) merged",
            kept,
            silence_samples as f64 * 1000.0 / sample_rate as f64,
            merged,
        );
        filtered
    }

    /// Reclassify speech bursts shorter than `min_gap_ms` as silence,
    /// bridging the surrounding regions. Array edges count as silence, so
    /// an isolated blip at either end is absorbed too.
    fn merge_short_gaps(&self, silence: &mut [bool], sample_rate: u32) -> usize {
        let min_gap = ms_to_samples(self.min_gap_ms, sample_rate);
        let speech: Vec<bool> = silence.iter().map(|&s| !s).collect();
        let mut merged = 0usize;
        for (start, end) in mask_runs(&speech) {
            if end - start < min_gap {
                for flag in &mut silence[start..end] {
                    *flag = true;
                }
                merged += 1;
            }
        }
        merged
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_AGGRESSIVENESS,
            DEFAULT_MIN_SILENCE_MS,
            DEFAULT_MIN_GAP_MS,
        )
    }
}

fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    ((ms * sample_rate as u64 / 1000) as usize).max(1)
}
