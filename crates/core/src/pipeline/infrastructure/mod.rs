pub mod dir_artifact_sink;
pub mod waveform_overlay;
