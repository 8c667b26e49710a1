//! Shared DSP primitives used across the preprocessing contexts.
//!
//! Provides windowed RMS via prefix sums, dB conversions, percentile
//! estimation, and boolean mask run extraction.

/// Convert a dBFS value to linear amplitude.
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to dBFS.
///
/// A small epsilon keeps the result finite for silent input (0.0 maps to
/// -200 dBFS) so downstream percentile math never sees infinities.
pub fn amplitude_to_dbfs(amplitude: f64) -> f64 {
    20.0 * (amplitude + 1e-10).log10()
}

/// Centered windowed RMS envelope, one value per input sample.
///
/// The window for sample `i` spans `[i - w/2, i + w/2]`, truncated at the
/// buffer edges and normalized by the actual sample count. Runs in O(N)
/// via a prefix sum of squares.
pub fn windowed_rms(samples: &[f32], window_len: usize) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let half = window_len.max(1) / 2;

    let mut prefix = vec![0.0f64; n + 1];
    for (i, &s) in samples.iter().enumerate() {
        let s = s as f64;
        prefix[i + 1] = prefix[i] + s * s;
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            let count = (hi - lo) as f64;
            ((prefix[hi] - prefix[lo]) / count).sqrt()
        })
        .collect()
}

/// Contiguous `true` runs of a boolean mask as half-open `(start, end)` pairs.
pub fn mask_runs(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &flag) in mask.iter().enumerate() {
        match (flag, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, mask.len()));
    }
    runs
}

/// Percentile with linear interpolation between order statistics.
///
/// `pct` is in [0, 100]. Returns 0.0 for empty input (callers guard empty
/// buffers before estimating levels).
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = pct.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_round_trip() {
        assert_relative_eq!(db_to_linear(0.0), 1.0);
        assert_relative_eq!(db_to_linear(-6.0), 0.501187, epsilon = 1e-5);
        assert_relative_eq!(amplitude_to_dbfs(1.0), 0.0, epsilon = 1e-8);
        assert_relative_eq!(amplitude_to_dbfs(0.5), -6.0206, epsilon = 1e-3);
    }

    #[test]
    fn test_dbfs_of_silence_is_finite() {
        let db = amplitude_to_dbfs(0.0);
        assert!(db.is_finite());
        assert_relative_eq!(db, -200.0, epsilon = 1e-6);
    }

    #[test]
    fn test_windowed_rms_constant_signal() {
        let rms = windowed_rms(&[0.5f32; 1000], 80);
        assert_eq!(rms.len(), 1000);
        for v in rms {
            assert_relative_eq!(v, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_windowed_rms_sine_interior() {
        let sr = 16000.0;
        let samples: Vec<f32> = (0..16000)
            .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / sr).sin() as f32)
            .collect();
        let rms = windowed_rms(&samples, 400);
        // Interior values approach 1/sqrt(2) for a unit sine.
        assert_relative_eq!(rms[8000], std::f64::consts::FRAC_1_SQRT_2, epsilon = 0.01);
    }

    #[test]
    fn test_windowed_rms_empty() {
        assert!(windowed_rms(&[], 10).is_empty());
    }

    #[test]
    fn test_mask_runs_basic() {
        let mask = [false, true, true, false, true, false];
        assert_eq!(mask_runs(&mask), vec![(1, 3), (4, 5)]);
    }

    #[test]
    fn test_mask_runs_touching_ends() {
        let mask = [true, true, false, true];
        assert_eq!(mask_runs(&mask), vec![(0, 2), (3, 4)]);
    }

    #[test]
    fn test_mask_runs_all_false() {
        assert!(mask_runs(&[false; 8]).is_empty());
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&values, 0.0), 1.0);
        assert_relative_eq!(percentile(&values, 100.0), 4.0);
        assert_relative_eq!(percentile(&values, 50.0), 2.5);
        assert_relative_eq!(percentile(&values, 25.0), 1.75);
    }

    #[test]
    fn test_percentile_unsorted_input() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(percentile(&values, 50.0), 2.5);
    }
}
