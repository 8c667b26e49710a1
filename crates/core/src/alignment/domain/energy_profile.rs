//! dBFS energy envelope and pause detection for word-boundary placement.

use crate::shared::dsp::{amplitude_to_dbfs, mask_runs, percentile, windowed_rms};

pub const DEFAULT_ENVELOPE_WINDOW_MS: u64 = 25;
pub const DEFAULT_PAUSE_GAP_DB: f64 = 8.0;
pub const DEFAULT_MIN_PAUSE_MS: u64 = 120;

/// Minimum p10-p90 spread before energy-based decisions are trusted.
pub const MIN_DYNAMIC_RANGE_DB: f64 = 6.0;

/// Per-sample dBFS envelope over a short RMS window, same length as the
/// input. 25 ms resolves word boundaries without dropping out between
/// voice pulses.
pub fn energy_envelope_dbfs(samples: &[f32], sample_rate: u32, window_ms: u64) -> Vec<f64> {
    let window = ((window_ms * sample_rate as u64 / 1000) as usize).max(1);
    windowed_rms(samples, window)
        .into_iter()
        .map(amplitude_to_dbfs)
        .collect()
}

/// Noise floor and speech level of an envelope, estimated by percentile so
/// outliers on either end do not skew them.
#[derive(Debug, Clone, Copy)]
pub struct EnergyProfile {
    pub floor_db: f64,
    pub speech_db: f64,
}

impl EnergyProfile {
    pub fn from_envelope(dbfs: &[f64]) -> Self {
        Self {
            floor_db: percentile(dbfs, 10.0),
            speech_db: percentile(dbfs, 90.0),
        }
    }

    pub fn dynamic_range_db(&self) -> f64 {
        self.speech_db - self.floor_db
    }

    /// Whether the envelope separates speech from background well enough
    /// for threshold-based decisions.
    pub fn has_contrast(&self) -> bool {
        self.dynamic_range_db() >= MIN_DYNAMIC_RANGE_DB
    }
}

/// Mark samples inside likely pauses: envelope below `floor + pause_gap_db`,
/// in contiguous runs of at least `min_pause_ms`. All false when the
/// profile lacks contrast.
pub fn pause_mask(
    dbfs: &[f64],
    profile: &EnergyProfile,
    sample_rate: u32,
    pause_gap_db: f64,
    min_pause_ms: u64,
) -> Vec<bool> {
    let n = dbfs.len();
    if n == 0 {
        return Vec::new();
    }
    if !profile.has_contrast() {
        return vec![false; n];
    }

    let threshold = profile.floor_db + pause_gap_db;
    let raw: Vec<bool> = dbfs.iter().map(|&d| d < threshold).collect();

    let min_run = ((min_pause_ms * sample_rate as u64 / 1000) as usize).max(1);
    let mut filtered = vec![false; n];
    for (start, end) in mask_runs(&raw) {
        if end - start >= min_run {
            for flag in &mut filtered[start..end] {
                *flag = true;
            }
        }
    }
    filtered
}
