/// A decoded audio buffer: interleaved PCM samples normalized to [-1.0, 1.0].
///
/// Interchange bit depth is 16-bit signed; all intermediate math runs on the
/// normalized f32 samples held here. Invariant: `samples.len()` is a multiple
/// of `channels`.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        debug_assert!(channels > 0);
        debug_assert_eq!(samples.len() % channels.max(1) as usize, 0);
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one frame = one sample per channel).
    pub fn num_frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    pub fn duration_ms(&self) -> f64 {
        self.num_frames() as f64 * 1000.0 / self.sample_rate as f64
    }

    pub fn frame_index_at_ms(&self, ms: f64) -> usize {
        ((ms * self.sample_rate as f64 / 1000.0) as usize).min(self.num_frames())
    }

    /// Channel-averaged mono rendition of the whole buffer.
    pub fn to_mono(&self) -> Vec<f32> {
        self.mono_in_frames(0, self.num_frames())
    }

    /// Channel-averaged mono samples for the frame range `[start, end)`.
    pub fn mono_in_frames(&self, start: usize, end: usize) -> Vec<f32> {
        let ch = self.channels as usize;
        let end = end.min(self.num_frames());
        let start = start.min(end);
        if ch == 1 {
            return self.samples[start..end].to_vec();
        }
        self.samples[start * ch..end * ch]
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect()
    }

    /// Channel-averaged mono samples for the time range `[start_ms, end_ms)`.
    pub fn mono_in_range_ms(&self, start_ms: f64, end_ms: f64) -> Vec<f32> {
        self.mono_in_frames(self.frame_index_at_ms(start_ms), self.frame_index_at_ms(end_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_creates_buffer_with_correct_fields() {
        let samples = vec![0.0f32; 16000];
        let buf = AudioBuffer::new(samples.clone(), 16000, 1);
        assert_eq!(buf.samples(), &samples[..]);
        assert_eq!(buf.sample_rate(), 16000);
        assert_eq!(buf.channels(), 1);
    }

    #[test]
    fn test_duration_mono() {
        let buf = AudioBuffer::new(vec![0.0; 48000], 16000, 1);
        assert_eq!(buf.duration(), 3.0);
        assert_eq!(buf.duration_ms(), 3000.0);
    }

    #[test]
    fn test_duration_stereo() {
        let buf = AudioBuffer::new(vec![0.0; 96000], 48000, 2);
        assert_eq!(buf.duration(), 1.0);
        assert_eq!(buf.num_frames(), 48000);
    }

    #[test]
    fn test_frame_index_at_ms_clamps_to_end() {
        let buf = AudioBuffer::new(vec![0.0; 16000], 16000, 1);
        assert_eq!(buf.frame_index_at_ms(500.0), 8000);
        assert_eq!(buf.frame_index_at_ms(5000.0), 16000);
    }

    #[test]
    fn test_to_mono_averages_channels() {
        // Two frames of stereo: (0.5, -0.5), (1.0, 0.0)
        let buf = AudioBuffer::new(vec![0.5, -0.5, 1.0, 0.0], 16000, 2);
        let mono = buf.to_mono();
        assert_eq!(mono.len(), 2);
        assert_relative_eq!(mono[0], 0.0);
        assert_relative_eq!(mono[1], 0.5);
    }

    #[test]
    fn test_mono_in_range_ms_slices_frames() {
        let mut samples = vec![0.0f32; 16000];
        samples[8000] = 0.7;
        let buf = AudioBuffer::new(samples, 16000, 1);
        let slice = buf.mono_in_range_ms(500.0, 600.0);
        assert_eq!(slice.len(), 1600);
        assert_relative_eq!(slice[0], 0.7);
    }

    #[test]
    fn test_samples_mut() {
        let mut buf = AudioBuffer::new(vec![0.0; 100], 16000, 1);
        buf.samples_mut()[50] = 1.0;
        assert_eq!(buf.samples()[50], 1.0);
    }
}
