//! Frame-level speech classification from cheap time-domain features.
//!
//! Each analysis frame is reduced to energy, zero-crossing rate, and a
//! first-difference brightness estimate, then matched against voiced and
//! whispered speech profiles. Spectral shape is part of the decision so a
//! mic bump or desk tap does not read as speech the way a pure energy
//! gate would.

use crate::shared::dsp::amplitude_to_dbfs;

/// High zero-crossing rate combined with high brightness marks a broadband
/// transient (click, tap) rather than any kind of speech.
const TRANSIENT_ZCR: f64 = 0.45;
const TRANSIENT_BRIGHTNESS_HZ: f64 = 6500.0;

/// Frames below this level carry too little signal for the brightness
/// estimate to mean anything.
const BRIGHTNESS_FLOOR_DB: f64 = -55.0;

/// Energy threshold shift per aggressiveness step away from the baseline
/// setting of 2.
const DB_PER_STEP: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct FrameFeatures {
    pub energy_db: f64,
    pub zero_crossing_rate: f64,
    pub brightness_hz: f64,
}

/// Acceptance window for one mode of speech production.
#[derive(Debug, Clone, Copy)]
pub struct SpeechProfile {
    pub min_energy_db: f64,
    pub zcr_min: f64,
    pub zcr_max: f64,
    pub brightness_min_hz: f64,
    pub brightness_max_hz: f64,
}

impl SpeechProfile {
    /// Voiced speech: strong energy, low crossing rate from the fundamental,
    /// mid-band brightness.
    fn voiced() -> Self {
        Self {
            min_energy_db: -42.0,
            zcr_min: 0.01,
            zcr_max: 0.30,
            brightness_min_hz: 200.0,
            brightness_max_hz: 5500.0,
        }
    }

    /// Whispered or breathy speech: much quieter and noisier than voiced,
    /// but still band-limited unlike a transient.
    fn whispered() -> Self {
        Self {
            min_energy_db: -52.0,
            zcr_min: 0.08,
            zcr_max: 0.45,
            brightness_min_hz: 300.0,
            brightness_max_hz: 7000.0,
        }
    }

    fn shifted(mut self, offset_db: f64) -> Self {
        self.min_energy_db += offset_db;
        self
    }

    fn matches(&self, f: &FrameFeatures) -> bool {
        f.energy_db >= self.min_energy_db
            && f.zero_crossing_rate >= self.zcr_min
            && f.zero_crossing_rate <= self.zcr_max
            && f.brightness_hz >= self.brightness_min_hz
            && f.brightness_hz <= self.brightness_max_hz
    }
}

/// Speech/non-speech decision for individual frames.
///
/// Aggressiveness runs 0..=3 like the usual VAD convention: higher values
/// raise the energy thresholds, classifying more of the signal as silence.
pub struct FrameClassifier {
    voiced: SpeechProfile,
    whispered: SpeechProfile,
}

impl FrameClassifier {
    pub fn new(aggressiveness: u8) -> Self {
        let offset_db = (aggressiveness.min(3) as f64 - 2.0) * DB_PER_STEP;
        Self {
            voiced: SpeechProfile::voiced().shifted(offset_db),
            whispered: SpeechProfile::whispered().shifted(offset_db),
        }
    }

    pub fn is_speech(&self, f: &FrameFeatures) -> bool {
        if f.zero_crossing_rate > TRANSIENT_ZCR && f.brightness_hz > TRANSIENT_BRIGHTNESS_HZ {
            return false;
        }
        self.voiced.matches(f) || self.whispered.matches(f)
    }
}

/// Extract classification features from one frame of mono samples.
///
/// Brightness is estimated from the mean absolute first difference relative
/// to the mean absolute amplitude, which tracks the dominant frequency
/// without an FFT. Frames too short or too quiet report zero brightness.
pub fn frame_features(frame: &[f32], sample_rate: u32) -> FrameFeatures {
    let n = frame.len();
    if n < 2 {
        let amp = frame.first().map_or(0.0, |s| s.abs() as f64);
        return FrameFeatures {
            energy_db: amplitude_to_dbfs(amp),
            zero_crossing_rate: 0.0,
            brightness_hz: 0.0,
        };
    }

    let mut sum_sq = 0.0f64;
    let mut sum_abs = 0.0f64;
    let mut sum_abs_diff = 0.0f64;
    let mut crossings = 0usize;
    for i in 0..n {
        let s = frame[i] as f64;
        sum_sq += s * s;
        sum_abs += s.abs();
        if i > 0 {
            sum_abs_diff += (s - frame[i - 1] as f64).abs();
            if (frame[i] >= 0.0) != (frame[i - 1] >= 0.0) {
                crossings += 1;
            }
        }
    }

    let rms = (sum_sq / n as f64).sqrt();
    let energy_db = amplitude_to_dbfs(rms);
    let mean_abs = sum_abs / n as f64;
    let mean_abs_diff = sum_abs_diff / (n - 1) as f64;
    let brightness_hz = if energy_db < BRIGHTNESS_FLOOR_DB || mean_abs < 1e-10 {
        0.0
    } else {
        sample_rate as f64 * mean_abs_diff / (2.0 * mean_abs)
    };

    FrameFeatures {
        energy_db,
        zero_crossing_rate: crossings as f64 / (n - 1) as f64,
        brightness_hz,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sine_frame(freq: f64, amplitude: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * std::f64::consts::PI * freq * t).sin() as f32 * amplitude
            })
            .collect()
    }

    #[test]
    fn test_sine_features() {
        let frame = sine_frame(220.0, 0.3, 16000, 320);
        let f = frame_features(&frame, 16000);

        assert_relative_eq!(f.energy_db, -13.5, epsilon = 0.5);
        assert_relative_eq!(f.zero_crossing_rate, 0.0275, epsilon = 0.01);
        // First-difference estimate lands near pi * f for a low sine.
        assert_relative_eq!(f.brightness_hz, 691.0, epsilon = 30.0);
    }

    #[test]
    fn test_voiced_frame_is_speech() {
        let frame = sine_frame(220.0, 0.3, 16000, 320);
        let classifier = FrameClassifier::new(2);
        assert!(classifier.is_speech(&frame_features(&frame, 16000)));
    }

    #[test]
    fn test_silence_is_not_speech() {
        let frame = vec![0.0f32; 320];
        let classifier = FrameClassifier::new(2);
        let f = frame_features(&frame, 16000);
        assert_relative_eq!(f.energy_db, -200.0);
        assert!(!classifier.is_speech(&f));
    }

    #[test]
    fn test_broadband_transient_rejected() {
        // Alternating full-band buzz: loud, but too bright and too busy to
        // be speech.
        let frame: Vec<f32> = (0..320).map(|i| if i % 2 == 0 { 0.3 } else { -0.3 }).collect();
        let classifier = FrameClassifier::new(2);
        let f = frame_features(&frame, 16000);
        assert!(f.zero_crossing_rate > TRANSIENT_ZCR);
        assert!(f.brightness_hz > TRANSIENT_BRIGHTNESS_HZ);
        assert!(!classifier.is_speech(&f));
    }

    #[test]
    fn test_whispered_frame_is_speech() {
        // Around -51 dB with a busy but band-limited waveform: fails the
        // voiced profile on energy, passes the whispered one.
        let frame = sine_frame(1600.0, 0.004, 16000, 320);
        let classifier = FrameClassifier::new(2);
        let f = frame_features(&frame, 16000);
        assert!(f.energy_db < -42.0);
        assert!(classifier.is_speech(&f));
    }

    #[test]
    fn test_aggressiveness_raises_thresholds() {
        let frame = sine_frame(1600.0, 0.004, 16000, 320);
        let f = frame_features(&frame, 16000);
        assert!(FrameClassifier::new(2).is_speech(&f));
        assert!(!FrameClassifier::new(3).is_speech(&f));
    }

    #[test]
    fn test_aggressiveness_zero_admits_quiet_voiced() {
        // -45 dB voiced tone: outside the baseline voiced profile, inside
        // the relaxed one.
        let frame = sine_frame(220.0, 0.00795, 16000, 320);
        let f = frame_features(&frame, 16000);
        assert!(!FrameClassifier::new(2).is_speech(&f));
        assert!(FrameClassifier::new(0).is_speech(&f));
    }
}
