use rand::Rng;

use crate::shared::audio_buffer::AudioBuffer;
use crate::shared::dsp::db_to_linear;

pub const DEFAULT_NOISE_LEVEL_DB: f64 = -58.0;

/// Removes carved silence spans from a buffer and overlays a flat noise
/// floor on what remains.
///
/// The composed conditioner gain is applied to every channel here, once,
/// so multichannel input stays phase-consistent. The noise floor keeps the
/// output free of true digital silence, which downstream codecs and
/// end-of-stream heuristics handle badly.
pub struct Excisor {
    noise_level_db: f64,
}

impl Excisor {
    pub fn new(noise_level_db: f64) -> Self {
        Self { noise_level_db }
    }

    /// Build the excised buffer: apply `gain` (one value per frame) to all
    /// channels and keep only the frames inside `keep_runs`. An empty run
    /// list yields an empty buffer.
    pub fn excise(
        buffer: &AudioBuffer,
        gain: &[f32],
        keep_runs: &[(usize, usize)],
    ) -> AudioBuffer {
        debug_assert_eq!(gain.len(), buffer.num_frames());
        let channels = buffer.channels() as usize;
        let samples = buffer.samples();

        let kept_frames: usize = keep_runs.iter().map(|&(s, e)| e - s).sum();
        let mut out = Vec::with_capacity(kept_frames * channels);
        for &(start, end) in keep_runs {
            for frame in start..end {
                let g = gain[frame];
                let base = frame * channels;
                for ch in 0..channels {
                    out.push((samples[base + ch] * g).clamp(-1.0, 1.0));
                }
            }
        }

        let removed = buffer.num_frames() - kept_frames.min(buffer.num_frames());
        if removed > 0 {
            log::info!(
                "Excised {:.0}ms: duration {:.0}ms -> {:.0}ms",
                removed as f64 * 1000.0 / buffer.sample_rate() as f64,
                buffer.duration_ms(),
                kept_frames as f64 * 1000.0 / buffer.sample_rate() as f64,
            );
        }

        AudioBuffer::new(out, buffer.sample_rate(), buffer.channels())
    }

    /// Overlay the noise floor in place. The same noise value goes to all
    /// channels of a frame; the sum is clamped back to [-1, 1].
    pub fn apply_noise_floor(&self, buffer: &mut AudioBuffer) {
        let channels = buffer.channels() as usize;
        if channels == 0 {
            return;
        }

        // Uniform noise scaled so its RMS sits at the configured level.
        let noise_amp = (db_to_linear(self.noise_level_db) * 3f64.sqrt()) as f32;
        let mut rng = rand::rng();
        for frame in buffer.samples_mut().chunks_exact_mut(channels) {
            let noise = (rng.random::<f32>() * 2.0 - 1.0) * noise_amp;
            for sample in frame {
                *sample = (*sample + noise).clamp(-1.0, 1.0);
            }
        }
    }
}

impl Default for Excisor {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_LEVEL_DB)
    }
}
