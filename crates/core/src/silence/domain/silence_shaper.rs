use crate::shared::dsp::mask_runs;

pub const DEFAULT_GRACE_MS: u64 = 150;
pub const DEFAULT_TAIL_MS: u64 = 150;

/// Carves excision zones out of detected silence runs, leaving natural
/// context on both sides of every cut.
///
/// Each run keeps `grace_ms` at its start (sentence-ending pauses stay
/// audible) and `tail_ms` at its end (clean ramp back into speech). Runs
/// not longer than grace + tail are dropped entirely; a pause that short
/// is harmless and cutting into it would sound abrupt.
pub struct SilenceShaper {
    grace_ms: u64,
    tail_ms: u64,
}

impl SilenceShaper {
    pub fn new(grace_ms: u64, tail_ms: u64) -> Self {
        Self { grace_ms, tail_ms }
    }

    /// Spans of samples to keep after carving, half-open and ascending.
    /// When nothing qualifies for excision this is one span covering the
    /// whole buffer.
    pub fn keep_runs(&self, silence_mask: &[bool], sample_rate: u32) -> Vec<(usize, usize)> {
        let n = silence_mask.len();
        if n == 0 {
            return Vec::new();
        }

        let grace = ms_to_samples(self.grace_ms, sample_rate);
        let tail = ms_to_samples(self.tail_ms, sample_rate);
        let min_carvable = grace + tail;

        let mut excise = vec![false; n];
        let mut carved = 0usize;
        let mut skipped = 0usize;
        for (start, end) in mask_runs(silence_mask) {
            if end - start <= min_carvable {
                skipped += 1;
                continue;
            }
            for flag in &mut excise[start + grace..end - tail] {
                *flag = true;
            }
            carved += 1;
        }
        log::info!(
            "Silence shaping: {} run(s) carved, {} too short (grace={}ms, tail={}ms)",
            carved,
            skipped,
            self.grace_ms,
            self.tail_ms,
        );

        let keep: Vec<bool> = excise.iter().map(|&x| !x).collect();
        mask_runs(&keep)
    }
}

impl Default for SilenceShaper {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_MS, DEFAULT_TAIL_MS)
    }
}

fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    ((ms * sample_rate as u64 / 1000) as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 16000;

    fn mask_with_silence(total: usize, spans: &[(usize, usize)]) -> Vec<bool> {
        let mut mask = vec![false; total];
        for &(s, e) in spans {
            for flag in &mut mask[s..e] {
                *flag = true;
            }
        }
        mask
    }

    #[test]
    fn test_long_run_carved_with_context() {
        // 1 s of silence inside 3 s of audio. Grace and tail are 2400
        // samples each at 16 kHz.
        let mask = mask_with_silence(48000, &[(16000, 32000)]);
        let runs = SilenceShaper::default().keep_runs(&mask, SR);
        assert_eq!(runs, vec![(0, 18400), (29600, 48000)]);
    }

    #[test]
    fn test_short_run_untouched() {
        // 300 ms of silence is exactly grace + tail, so nothing is carved.
        let mask = mask_with_silence(48000, &[(16000, 20800)]);
        let runs = SilenceShaper::default().keep_runs(&mask, SR);
        assert_eq!(runs, vec![(0, 48000)]);
    }

    #[test]
    fn test_run_touching_buffer_end_keeps_tail() {
        let mask = mask_with_silence(48000, &[(32000, 48000)]);
        let runs = SilenceShaper::default().keep_runs(&mask, SR);
        assert_eq!(runs, vec![(0, 34400), (45600, 48000)]);
    }

    #[test]
    fn test_all_silence() {
        let mask = mask_with_silence(48000, &[(0, 48000)]);
        let runs = SilenceShaper::default().keep_runs(&mask, SR);
        assert_eq!(runs, vec![(0, 2400), (45600, 48000)]);
    }

    #[test]
    fn test_no_silence() {
        let mask = vec![false; 1000];
        let runs = SilenceShaper::default().keep_runs(&mask, SR);
        assert_eq!(runs, vec![(0, 1000)]);
    }

    #[test]
    fn test_empty_mask() {
        assert!(SilenceShaper::default().keep_runs(&[], SR).is_empty());
    }
}
