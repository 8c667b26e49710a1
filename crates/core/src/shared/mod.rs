pub mod audio_buffer;
pub mod dsp;
pub mod transcript;
