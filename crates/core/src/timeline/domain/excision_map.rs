use serde::{Deserialize, Serialize};

use crate::shared::transcript::{Segment, WordToken};

/// Translates timestamps from the excised (shortened) timeline back to
/// original-recording coordinates.
///
/// After silence excision the processed audio is shorter than the source.
/// Downstream timings (diarization, segment boundaries) are produced
/// against the excised audio and must be mapped back before they are shown
/// to anyone. Regions are original-time spans of the kept audio, in the
/// order they appear in the excised output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcisionMap {
    pub keep_regions_ms: Vec<(f64, f64)>,
    pub original_duration_ms: f64,
    pub excised_duration_ms: f64,
}

impl ExcisionMap {
    /// Map for the no-excision case: one region spanning the whole
    /// recording.
    pub fn identity(duration_ms: f64) -> Self {
        Self {
            keep_regions_ms: vec![(0.0, duration_ms)],
            original_duration_ms: duration_ms,
            excised_duration_ms: duration_ms,
        }
    }

    /// Build a map from sample-index keep runs.
    ///
    /// Panics if the runs are not ascending and non-overlapping; such a
    /// list cannot come out of mask extraction and indicates a caller bug.
    pub fn from_keep_runs(
        keep_runs: &[(usize, usize)],
        sample_rate: u32,
        original_num_frames: usize,
    ) -> Self {
        for &(start, end) in keep_runs {
            assert!(start <= end, "keep run ({start}, {end}) is inverted");
        }
        for pair in keep_runs.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "keep runs {:?} and {:?} overlap or are out of order",
                pair[0],
                pair[1],
            );
        }

        let ms = 1000.0 / sample_rate as f64;
        let keep_regions_ms = keep_runs
            .iter()
            .map(|&(s, e)| (s as f64 * ms, e as f64 * ms))
            .collect();
        let kept: usize = keep_runs.iter().map(|&(s, e)| e - s).sum();
        Self {
            keep_regions_ms,
            original_duration_ms: original_num_frames as f64 * ms,
            excised_duration_ms: kept as f64 * ms,
        }
    }

    /// Translate a timestamp in excised-audio milliseconds to original-audio
    /// milliseconds.
    ///
    /// Walks the regions accumulating their excised-domain lengths. A
    /// timestamp exactly on a region boundary resolves into the earlier
    /// region, so it lands on that region's end. Timestamps past the last
    /// region clamp to the original duration.
    pub fn to_original_time_ms(&self, excised_time_ms: f64) -> f64 {
        if self.keep_regions_ms.is_empty() {
            return excised_time_ms;
        }

        let mut offset = 0.0;
        for &(start, end) in &self.keep_regions_ms {
            let len = end - start;
            if excised_time_ms <= offset + len {
                return start + (excised_time_ms - offset);
            }
            offset += len;
        }
        self.original_duration_ms
    }

    pub fn to_original_time_sec(&self, excised_time_sec: f64) -> f64 {
        self.to_original_time_ms(excised_time_sec * 1000.0) / 1000.0
    }

    /// True when no timestamp would change on remapping.
    pub fn is_identity(&self) -> bool {
        self.keep_regions_ms.len() == 1
            && self.keep_regions_ms[0].0.abs() < 0.01
            && (self.keep_regions_ms[0].1 - self.original_duration_ms).abs() < 0.01
    }

    /// Rewrite word timings in place from excised to original coordinates.
    pub fn remap_words(&self, words: &mut [WordToken]) {
        for word in words {
            word.start_sec = self.to_original_time_sec(word.start_sec);
            word.end_sec = self.to_original_time_sec(word.end_sec);
        }
    }

    /// Rewrite segment timings in place from excised to original
    /// coordinates.
    pub fn remap_segments(&self, segments: &mut [Segment]) {
        for segment in segments {
            segment.start_sec = self.to_original_time_sec(segment.start_sec);
            segment.end_sec = self.to_original_time_sec(segment.end_sec);
        }
    }
}
