use crate::shared::dsp::{db_to_linear, windowed_rms};

pub const DEFAULT_RATIO: f64 = 3.0;
pub const DEFAULT_THRESHOLD_DB: f64 = -30.0;
pub const DEFAULT_ATTACK_MS: f64 = 10.0;
pub const DEFAULT_RELEASE_MS: f64 = 100.0;
pub const DEFAULT_MAKEUP_TARGET_DB: f64 = -16.0;

/// Envelope follower window. 5 ms tracks syllable-level level changes
/// without pumping on individual cycles.
const RMS_WINDOW_SEC: f64 = 0.005;

/// Post-compression amplitude below which a sample is treated as
/// background rather than speech when measuring makeup loudness.
const SPEECH_FLOOR: f32 = 0.01;

/// Result of the compressor stage: processed samples plus the per-sample
/// linear gain envelope, makeup included. The envelope is not clamped;
/// the samples are.
pub struct CompressorOutput {
    pub samples: Vec<f32>,
    pub gain: Vec<f32>,
}

/// Downward RMS compressor with makeup gain toward a target speech level.
///
/// Level detection is a short centered RMS window, so gain reacts to local
/// loudness rather than instantaneous amplitude. Makeup is computed from
/// the loudness of speech-level samples only; long silences do not drag
/// the whole recording upward.
pub struct DynamicsCompressor {
    ratio: f64,
    threshold_db: f64,
    attack_ms: f64,
    release_ms: f64,
    makeup_target_db: f64,
}

impl DynamicsCompressor {
    pub fn new(
        ratio: f64,
        threshold_db: f64,
        attack_ms: f64,
        release_ms: f64,
        makeup_target_db: f64,
    ) -> Self {
        Self {
            ratio,
            threshold_db,
            attack_ms,
            release_ms,
            makeup_target_db,
        }
    }

    /// Compress `samples` (mono, [-1, 1]) and return the output with its
    /// gain envelope.
    pub fn apply(&self, samples: &[f32], sample_rate: u32) -> CompressorOutput {
        let n = samples.len();
        if n == 0 {
            return CompressorOutput {
                samples: Vec::new(),
                gain: Vec::new(),
            };
        }

        let window = ((sample_rate as f64 * RMS_WINDOW_SEC) as usize).max(1);
        let envelope = windowed_rms(samples, window);

        let threshold = db_to_linear(self.threshold_db);
        let exponent = 1.0 - 1.0 / self.ratio;
        let mut gain: Vec<f64> = envelope
            .iter()
            .map(|&rms| {
                if rms > threshold {
                    (threshold / (rms + 1e-10)).powf(exponent)
                } else {
                    1.0
                }
            })
            .collect();

        let a_att = smoothing_coefficient(self.attack_ms, sample_rate);
        let a_rel = smoothing_coefficient(self.release_ms, sample_rate);
        smooth_gain_in_place(&mut gain, a_att, a_rel);

        let makeup = self.makeup_gain(samples, &gain);
        let gain: Vec<f32> = gain.iter().map(|&g| (g * makeup) as f32).collect();

        let compressed = samples
            .iter()
            .zip(&gain)
            .map(|(s, g)| (s * g).clamp(-1.0, 1.0))
            .collect();
        CompressorOutput {
            samples: compressed,
            gain,
        }
    }

    /// Linear gain that brings the speech portion of the compressed signal
    /// to the makeup target. Falls back to whole-signal loudness when
    /// nothing clears the speech floor, and to unity on silence.
    fn makeup_gain(&self, samples: &[f32], gain: &[f64]) -> f64 {
        let mut speech_sum = 0.0f64;
        let mut speech_count = 0usize;
        let mut total_sum = 0.0f64;
        for (&s, &g) in samples.iter().zip(gain) {
            let out = s as f64 * g;
            total_sum += out * out;
            if out.abs() > SPEECH_FLOOR as f64 {
                speech_sum += out * out;
                speech_count += 1;
            }
        }

        let rms_out = if speech_count > 0 {
            (speech_sum / speech_count as f64).sqrt()
        } else {
            (total_sum / samples.len() as f64).sqrt()
        };
        if rms_out > 1e-10 {
            db_to_linear(self.makeup_target_db) / rms_out
        } else {
            1.0
        }
    }
}

impl Default for DynamicsCompressor {
    fn default() -> Self {
        Self::new(
            DEFAULT_RATIO,
            DEFAULT_THRESHOLD_DB,
            DEFAULT_ATTACK_MS,
            DEFAULT_RELEASE_MS,
            DEFAULT_MAKEUP_TARGET_DB,
        )
    }
}

fn smoothing_coefficient(time_ms: f64, sample_rate: u32) -> f64 {
    1.0 - (-1.0 / (time_ms * sample_rate as f64 / 1000.0)).exp()
}

/// One-pole smoothing with separate coefficients for falling gain (attack)
/// and rising gain (release). The first element is left as-is.
fn smooth_gain_in_place(gain: &mut [f64], a_att: f64, a_rel: f64) {
    let mut prev = match gain.first() {
        Some(&g) => g,
        None => return,
    };
    for g in gain.iter_mut().skip(1) {
        let a = if *g < prev { a_att } else { a_rel };
        prev = (1.0 - a) * prev + a * *g;
        *g = prev;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quiet_signal_boosted_to_target() {
        // Constant 0.02 sits below the -30 dB threshold, so the only gain
        // applied is makeup toward -16 dBFS.
        let samples = vec![0.02f32; 16000];
        let out = DynamicsCompressor::default().apply(&samples, 16000);

        let target = db_to_linear(DEFAULT_MAKEUP_TARGET_DB) as f32;
        for &s in &out.samples {
            assert_relative_eq!(s, target, epsilon = 1e-4);
        }
        let expected_gain = target / 0.02;
        for &g in &out.gain {
            assert_relative_eq!(g, expected_gain, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_loud_signal_levelled_to_target() {
        let samples = vec![0.5f32; 16000];
        let out = DynamicsCompressor::default().apply(&samples, 16000);

        let target = db_to_linear(DEFAULT_MAKEUP_TARGET_DB) as f32;
        for &s in &out.samples {
            assert_relative_eq!(s, target, epsilon = 1e-3);
        }
        // Gain reduction happened before makeup restored the level.
        assert!(out.gain[0] < 1.0);
    }

    #[test]
    fn test_gain_recovers_slowly_after_burst() {
        let sample_rate = 16000u32;
        let mut samples = vec![0.02f32; 32000];
        for s in &mut samples[8000..16000] {
            *s = 0.5;
        }
        let out = DynamicsCompressor::default().apply(&samples, sample_rate);

        // 10 ms past burst end the release (100 ms) has barely moved the
        // envelope, while 10 ms past burst onset the attack has.
        let burst_gain = out.gain[15000];
        let after = out.gain[16000 + 160];
        let during = out.gain[8000 + 160];
        assert!((after - burst_gain).abs() < (out.gain[7000] - burst_gain).abs() * 0.2);
        assert!(during < out.gain[7000] * 0.7);
    }

    #[test]
    fn test_silence_passes_through() {
        let samples = vec![0.0f32; 4000];
        let out = DynamicsCompressor::default().apply(&samples, 16000);
        assert!(out.samples.iter().all(|&s| s == 0.0));
        assert!(out.gain.iter().all(|&g| (g - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_output_clamped_even_when_envelope_exceeds_unity() {
        let samples = vec![0.02f32; 8000];
        let hot = DynamicsCompressor::new(
            DEFAULT_RATIO,
            DEFAULT_THRESHOLD_DB,
            DEFAULT_ATTACK_MS,
            DEFAULT_RELEASE_MS,
            6.0,
        );
        let out = hot.apply(&samples, 16000);
        assert!(out.gain.iter().all(|&g| g * 0.02 > 1.0));
        assert!(out.samples.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_empty_input() {
        let out = DynamicsCompressor::default().apply(&[], 16000);
        assert!(out.samples.is_empty());
        assert!(out.gain.is_empty());
    }

    #[test]
    fn test_smoothing_uses_attack_when_falling() {
        let mut gain = vec![1.0, 0.0, 0.0, 0.0];
        smooth_gain_in_place(&mut gain, 0.5, 0.1);
        assert_relative_eq!(gain[1], 0.5);
        assert_relative_eq!(gain[2], 0.25);
        assert_relative_eq!(gain[3], 0.125);
    }

    #[test]
    fn test_smoothing_uses_release_when_rising() {
        let mut gain = vec![0.0, 1.0, 1.0, 1.0];
        smooth_gain_in_place(&mut gain, 0.5, 0.1);
        assert_relative_eq!(gain[1], 0.1, epsilon = 1e-12);
        assert_relative_eq!(gain[2], 0.19, epsilon = 1e-12);
        assert_relative_eq!(gain[3], 0.271, epsilon = 1e-12);
    }
}
