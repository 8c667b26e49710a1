pub mod artifact_sink;
pub mod export_planner;
pub mod infrastructure;
pub mod preprocess_audio_use_case;
