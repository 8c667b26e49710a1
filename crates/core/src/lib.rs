//! Audio preprocessing and timestamp remapping for speech transcription.
//!
//! Conditions raw recordings (transient limiting, compression, silence
//! excision with exact timestamp bookkeeping) before they go to a
//! transcription model, then turns the model's segment-level output into
//! per-word timestamps on the original recording's timeline.

pub mod alignment;
pub mod conditioning;
pub mod pipeline;
pub mod segmentation;
pub mod shared;
pub mod silence;
pub mod timeline;
