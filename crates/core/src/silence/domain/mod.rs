pub mod excisor;
pub mod silence_detector;
pub mod silence_shaper;
pub mod voice_activity;
