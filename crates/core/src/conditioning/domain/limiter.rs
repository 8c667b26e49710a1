use crate::shared::dsp::db_to_linear;

pub const DEFAULT_CEILING_DB: f64 = -6.0;
pub const DEFAULT_LOOKAHEAD_MS: f64 = 2.0;

/// Result of the limiter stage: gain-reduced samples plus the per-sample
/// linear gain envelope that produced them (1.0 where unmodified).
pub struct LimiterOutput {
    pub samples: Vec<f32>,
    pub gain: Vec<f32>,
}

/// Brick-wall limiter with lookahead to catch sub-ms transient spikes.
///
/// Clipping artifacts confuse ASR encoders, so gain is reduced on any sample
/// exceeding the ceiling. A forward-looking minimum filter over the gain
/// envelope makes the reduction begin before the transient arrives.
pub struct TransientLimiter {
    ceiling_db: f64,
    lookahead_ms: f64,
}

impl TransientLimiter {
    pub fn new(ceiling_db: f64, lookahead_ms: f64) -> Self {
        Self {
            ceiling_db,
            lookahead_ms,
        }
    }

    /// Limit `samples` (mono, [-1, 1]) and return the output with its gain
    /// envelope. The envelope is <= 1.0 everywhere.
    pub fn apply(&self, samples: &[f32], sample_rate: u32) -> LimiterOutput {
        let n = samples.len();
        if n == 0 {
            return LimiterOutput {
                samples: Vec::new(),
                gain: Vec::new(),
            };
        }

        let ceiling = db_to_linear(self.ceiling_db) as f32;
        let mut gain = vec![1.0f32; n];
        for (g, &s) in gain.iter_mut().zip(samples) {
            let amp = s.abs();
            if amp > ceiling {
                *g = ceiling / (amp + 1e-10);
            }
        }

        let lookahead = ((self.lookahead_ms * sample_rate as f64 / 1000.0) as usize).max(1);
        let gain = forward_window_min(&gain, lookahead * 2);

        let limited = samples.iter().zip(&gain).map(|(s, g)| s * g).collect();
        LimiterOutput {
            samples: limited,
            gain,
        }
    }
}

impl Default for TransientLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING_DB, DEFAULT_LOOKAHEAD_MS)
    }
}

/// Sliding minimum over the forward window `[i, i + window)`, truncated at
/// the end of the buffer.
///
/// O(N) via block decomposition: per-block prefix/suffix minima cover any
/// window spanning two adjacent blocks; a window inside a single block
/// (block-aligned or truncated at the buffer end) is its suffix minimum
/// alone.
fn forward_window_min(values: &[f32], window: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 || window <= 1 {
        return values.to_vec();
    }

    let mut prefix = vec![0.0f32; n];
    let mut suffix = vec![0.0f32; n];
    for block_start in (0..n).step_by(window) {
        let block_end = (block_start + window).min(n);
        let mut acc = f32::INFINITY;
        for j in block_start..block_end {
            acc = acc.min(values[j]);
            prefix[j] = acc;
        }
        acc = f32::INFINITY;
        for j in (block_start..block_end).rev() {
            acc = acc.min(values[j]);
            suffix[j] = acc;
        }
    }

    (0..n)
        .map(|i| {
            let last = (i + window).min(n) - 1;
            if i / window == last / window {
                // suffix[i] covers [i, last] exactly; prefix[last] can
                // reach back before i.
                suffix[i]
            } else {
                suffix[i].min(prefix[last])
            }
        })
        .collect()
}
