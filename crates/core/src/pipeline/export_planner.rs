//! Export format selection and size estimation for downstream transcription
//! uploads. Estimation only; no encoding happens here.

pub const DEFAULT_MAX_SINGLE_SHOT_MB: f64 = 22.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Wav,
    Flac,
    Mp3,
}

impl ExportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Flac => "flac",
            ExportFormat::Mp3 => "mp3",
        }
    }
}

/// MIME type for an audio filename by extension. Unrecognized extensions
/// fall back to `audio/mpeg`, the safest default for transcription APIs.
pub fn mime_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" | "mpeg" | "mpga" => "audio/mpeg",
        "mp4" | "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        _ => "audio/mpeg",
    }
}

/// Estimated encoded size in MB, without performing a real export.
/// FLAC assumes a conservative 55% of uncompressed for speech; MP3 assumes
/// 128 kbit/s.
pub fn estimate_encoded_size_mb(
    duration_sec: f64,
    sample_rate: u32,
    channels: u16,
    format: ExportFormat,
) -> f64 {
    const MIB: f64 = 1024.0 * 1024.0;
    let uncompressed_mb = sample_rate as f64 * channels as f64 * 2.0 * duration_sec / MIB;
    match format {
        ExportFormat::Wav => uncompressed_mb,
        ExportFormat::Flac => uncompressed_mb * 0.55,
        ExportFormat::Mp3 => 128.0 * 1024.0 * duration_sec / (8.0 * MIB),
    }
}

/// Decide whether audio of this size can go to the transcription API in one
/// request, and with which lossless export format.
///
/// A `webm` source hint selects WAV export (FLAC re-encoding of Opus input
/// is unreliable); everything else uses FLAC for size. The ceiling should
/// leave headroom below the API's hard limit.
pub fn plan_single_shot(
    duration_sec: f64,
    sample_rate: u32,
    channels: u16,
    source_format_hint: &str,
    max_size_mb: f64,
) -> (bool, ExportFormat) {
    let format = if source_format_hint.eq_ignore_ascii_case("webm") {
        ExportFormat::Wav
    } else {
        ExportFormat::Flac
    };
    let estimated_mb = estimate_encoded_size_mb(duration_sec, sample_rate, channels, format);
    let safe = estimated_mb < max_size_mb;

    log::info!(
        "Size gate: estimated {} size {:.1}MB (limit {:.1}MB), {}",
        format.name(),
        estimated_mb,
        max_size_mb,
        if safe { "single-shot" } else { "chunking" },
    );
    (safe, format)
}
