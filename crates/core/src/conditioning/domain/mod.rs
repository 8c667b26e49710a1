pub mod compressor;
pub mod limiter;
