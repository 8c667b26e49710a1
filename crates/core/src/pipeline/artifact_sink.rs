/// Receiver for intermediate pipeline artifacts.
///
/// The preprocessing stages hand analysis audio and rendered overlays to
/// the sink; what happens to them (written to a debug directory, dropped)
/// is the implementation's business. With the null sink the pipeline
/// performs no I/O at all.
pub trait ArtifactSink: Send {
    /// Called once per stage with the stage's mono analysis signal.
    fn stage_audio(
        &self,
        stage: &str,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Called with the rendered waveform overlay PNG, when one is produced.
    fn waveform_overlay(&self, png: &[u8]) -> Result<(), Box<dyn std::error::Error>>;
}

/// Discards everything. The default sink for production use.
pub struct NullArtifactSink;

impl ArtifactSink for NullArtifactSink {
    fn stage_audio(
        &self,
        _: &str,
        _: &[f32],
        _: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn waveform_overlay(&self, _: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
