use crate::shared::audio_buffer::AudioBuffer;
use crate::shared::dsp::mask_runs;
use crate::shared::transcript::WordToken;

use super::energy_profile::{
    energy_envelope_dbfs, pause_mask, EnergyProfile, DEFAULT_ENVELOPE_WINDOW_MS,
    DEFAULT_MIN_PAUSE_MS, DEFAULT_PAUSE_GAP_DB,
};

pub const DEFAULT_MIN_WORD_MS: i64 = 60;
pub const DEFAULT_MAX_WORD_MS: i64 = 1200;

/// Coarse resolution for boundary placement. Keeps the cumulative-weight
/// arrays small regardless of segment length.
const FRAME_MS: i64 = 10;

/// Baseline weight so silent frames still accrue some time instead of
/// collapsing whole words onto a single frame.
const WEIGHT_BASELINE: f64 = 0.02;

/// Distributes per-word timestamps inside a transcription segment.
///
/// Rather than splitting the span evenly, time is allocated proportionally
/// to cumulative energy activity: voiced spans receive more duration and
/// pauses compress into inter-word gaps. When the envelope has too little
/// contrast to be trusted the aligner degrades to a deterministic
/// character-proportional split.
pub struct WordAligner {
    window_ms: u64,
    min_word_ms: i64,
    max_word_ms: i64,
    min_pause_ms: u64,
    pause_gap_db: f64,
    prefer_pause_gaps: bool,
}

impl WordAligner {
    pub fn new(
        window_ms: u64,
        min_word_ms: i64,
        max_word_ms: i64,
        min_pause_ms: u64,
        pause_gap_db: f64,
        prefer_pause_gaps: bool,
    ) -> Self {
        Self {
            window_ms,
            min_word_ms,
            max_word_ms,
            min_pause_ms,
            pause_gap_db,
            prefer_pause_gaps,
        }
    }

    /// Align `words` within `[segment_start_ms, segment_end_ms)` of the
    /// pre-excision audio. Output timestamps are absolute seconds; the
    /// speaker label is carried onto every token.
    ///
    /// Returned words always tile the segment: the first starts at the
    /// segment start, the last ends at the segment end, and consecutive
    /// words share a boundary.
    pub fn align(
        &self,
        buffer: &AudioBuffer,
        segment_start_ms: i64,
        segment_end_ms: i64,
        words: &[String],
        speaker: Option<&str>,
    ) -> Vec<WordToken> {
        let n_words = words.len();
        if n_words == 0 {
            return Vec::new();
        }

        let seg_dur_ms = segment_end_ms - segment_start_ms;
        if seg_dur_ms <= 0 {
            return uniform_fallback(words, segment_start_ms, segment_end_ms, speaker);
        }

        let mono =
            buffer.mono_in_range_ms(segment_start_ms.max(0) as f64, segment_end_ms as f64);
        if mono.is_empty() {
            return uniform_fallback(words, segment_start_ms, segment_end_ms, speaker);
        }
        let sample_rate = buffer.sample_rate();

        let dbfs = energy_envelope_dbfs(&mono, sample_rate, self.window_ms);
        let profile = EnergyProfile::from_envelope(&dbfs);
        if !profile.has_contrast() {
            log::info!(
                "Word alignment fallback: dynamic range {:.1}dB too low for segment {}-{}ms ({} words)",
                profile.dynamic_range_db(),
                segment_start_ms,
                segment_end_ms,
                n_words,
            );
            return uniform_fallback(words, segment_start_ms, segment_end_ms, speaker);
        }
        let pauses = pause_mask(
            &dbfs,
            &profile,
            sample_rate,
            self.pause_gap_db,
            self.min_pause_ms,
        );

        let (frame_dbfs, frame_pause) = downsample_to_frames(&dbfs, &pauses, sample_rate);
        let n_frames = frame_dbfs.len();

        // Cumulative activity curve over coarse frames.
        let range = profile.dynamic_range_db();
        let mut cum = Vec::with_capacity(n_frames + 1);
        cum.push(0.0f64);
        let mut acc = 0.0f64;
        for &db in &frame_dbfs {
            let weight = ((db - profile.floor_db) / (range + 1e-9)).clamp(0.0, 1.0);
            acc += weight + WEIGHT_BASELINE;
            cum.push(acc);
        }
        let c_total = acc;
        if c_total <= 0.0 {
            return uniform_fallback(words, segment_start_ms, segment_end_ms, speaker);
        }

        // N-1 interior boundaries at even steps along the activity curve.
        let mut boundaries: Vec<usize> = (1..n_words)
            .map(|k| {
                let target = k as f64 * c_total / n_words as f64;
                let frame = cum[1..].partition_point(|&c| c < target);
                frame.min(n_frames - 1)
            })
            .collect();

        let mut snapped = 0usize;
        if self.prefer_pause_gaps && frame_pause.iter().any(|&p| p) {
            snapped = snap_to_pause_edges(&mut boundaries, &frame_pause);
        }

        let mut starts = vec![0i64; n_words];
        let mut ends = vec![0i64; n_words];
        for i in 0..n_words - 1 {
            let boundary_ms = boundaries[i] as i64 * FRAME_MS;
            ends[i] = boundary_ms;
            starts[i + 1] = boundary_ms;
        }
        ends[n_words - 1] = seg_dur_ms;

        enforce_constraints(
            &mut starts,
            &mut ends,
            seg_dur_ms,
            self.min_word_ms,
            self.max_word_ms,
        );

        log::info!(
            "Word alignment: segment {}-{}ms, {} words, range {:.1}dB, {} boundaries snapped",
            segment_start_ms,
            segment_end_ms,
            n_words,
            range,
            snapped,
        );

        words
            .iter()
            .enumerate()
            .map(|(i, w)| WordToken {
                text: w.clone(),
                start_sec: (starts[i] + segment_start_ms) as f64 / 1000.0,
                end_sec: (ends[i] + segment_start_ms) as f64 / 1000.0,
                speaker: speaker.map(str::to_string),
            })
            .collect()
    }
}

impl Default for WordAligner {
    fn default() -> Self {
        Self::new(
            DEFAULT_ENVELOPE_WINDOW_MS,
            DEFAULT_MIN_WORD_MS,
            DEFAULT_MAX_WORD_MS,
            DEFAULT_MIN_PAUSE_MS,
            DEFAULT_PAUSE_GAP_DB,
            true,
        )
    }
}

/// Character-proportional split used whenever the envelope cannot be
/// trusted. A zero or negative segment span yields zero-length words at
/// the segment start.
fn uniform_fallback(
    words: &[String],
    segment_start_ms: i64,
    segment_end_ms: i64,
    speaker: Option<&str>,
) -> Vec<WordToken> {
    let n = words.len();
    if n == 0 {
        return Vec::new();
    }

    let seg_dur = (segment_end_ms - segment_start_ms).max(0);
    let end_cap = segment_start_ms + seg_dur;
    let lengths: Vec<usize> = words.iter().map(|w| w.chars().count().max(1)).collect();
    let total: usize = lengths.iter().sum();

    let mut result = Vec::with_capacity(n);
    let mut cursor = segment_start_ms;
    for (i, word) in words.iter().enumerate() {
        let end = if i == n - 1 {
            end_cap
        } else {
            let duration = seg_dur as f64 * lengths[i] as f64 / total as f64;
            ((cursor as f64 + duration) as i64).min(end_cap)
        };
        result.push(WordToken {
            text: word.clone(),
            start_sec: cursor as f64 / 1000.0,
            end_sec: end as f64 / 1000.0,
            speaker: speaker.map(str::to_string),
        });
        cursor = end;
    }
    result
}

/// Mean dBFS and majority pause flag per 10 ms frame. The tail frame is
/// padded with the final envelope value (and non-pause).
fn downsample_to_frames(
    dbfs: &[f64],
    pauses: &[bool],
    sample_rate: u32,
) -> (Vec<f64>, Vec<bool>) {
    let frame_samples = ((FRAME_MS as u64 * sample_rate as u64 / 1000) as usize).max(1);
    let n = dbfs.len();
    let n_frames = n.div_ceil(frame_samples).max(1);
    let last = dbfs[n - 1];

    let mut frame_dbfs = Vec::with_capacity(n_frames);
    let mut frame_pause = Vec::with_capacity(n_frames);
    for f in 0..n_frames {
        let lo = f * frame_samples;
        let hi = ((f + 1) * frame_samples).min(n);
        let mut sum = 0.0f64;
        let mut pause_count = 0usize;
        for i in lo..hi {
            sum += dbfs[i];
            if pauses[i] {
                pause_count += 1;
            }
        }
        sum += ((f + 1) * frame_samples - hi) as f64 * last;
        frame_dbfs.push(sum / frame_samples as f64);
        frame_pause.push(pause_count as f64 / frame_samples as f64 > 0.5);
    }
    (frame_dbfs, frame_pause)
}

/// Snap boundaries landing inside a pause run to the nearer run edge, so
/// the pause falls between words instead of inside one. Ties go to the run
/// start. Afterwards boundaries are forced back into ascending order.
fn snap_to_pause_edges(boundaries: &mut [usize], frame_pause: &[bool]) -> usize {
    let runs = mask_runs(frame_pause);
    if runs.is_empty() {
        return 0;
    }

    let mut snapped = 0usize;
    for boundary in boundaries.iter_mut() {
        if !frame_pause[*boundary] {
            continue;
        }
        let k = runs.partition_point(|&(start, _)| start <= *boundary) - 1;
        let (run_start, run_end) = runs[k];
        *boundary = if *boundary - run_start <= run_end - *boundary {
            run_start
        } else {
            run_end
        };
        snapped += 1;
    }

    for i in 1..boundaries.len() {
        if boundaries[i] < boundaries[i - 1] {
            boundaries[i] = boundaries[i - 1];
        }
    }
    snapped
}

/// Min/max duration, monotonicity, and full segment coverage, in place.
/// Forward pass raises short words, backward pass caps long ones, then a
/// final fixup clamps to bounds and pins the outer edges.
fn enforce_constraints(
    starts: &mut [i64],
    ends: &mut [i64],
    seg_dur_ms: i64,
    min_word_ms: i64,
    max_word_ms: i64,
) {
    let n = starts.len();

    for i in 0..n {
        if ends[i] - starts[i] < min_word_ms {
            ends[i] = starts[i] + min_word_ms;
        }
        if i + 1 < n && starts[i + 1] < ends[i] {
            starts[i + 1] = ends[i];
        }
    }

    for i in (0..n).rev() {
        let dur = ends[i] - starts[i];
        if dur > max_word_ms {
            ends[i] -= dur - max_word_ms;
            if i + 1 < n {
                starts[i + 1] = ends[i];
            }
        }
    }

    for i in 0..n {
        starts[i] = starts[i].clamp(0, seg_dur_ms);
        ends[i] = ends[i].clamp(starts[i], seg_dur_ms);
    }

    for i in 1..n {
        if starts[i] < ends[i - 1] {
            starts[i] = ends[i - 1];
        }
        if ends[i] < starts[i] {
            ends[i] = starts[i];
        }
    }

    ends[n - 1] = seg_dur_ms;
    starts[0] = 0;
}
