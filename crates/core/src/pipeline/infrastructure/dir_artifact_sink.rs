use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::pipeline::artifact_sink::ArtifactSink;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to create artifact directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {name}: {source}")]
    WavWrite {
        name: String,
        #[source]
        source: hound::Error,
    },
    #[error("failed to write {name}: {source}")]
    FileWrite {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("waveform overlay encoding failed: {0}")]
    PngEncode(#[source] image::ImageError),
}

/// Writes every stage's analysis audio as a 16-bit mono WAV, plus the
/// waveform overlay PNG, into a per-run directory for offline inspection.
pub struct DirArtifactSink {
    dir: PathBuf,
}

impl DirArtifactSink {
    /// Create the per-run directory under `base_dir`, named by creation
    /// time (unix seconds) plus the sanitized tag.
    pub fn new(base_dir: &Path, tag: &str) -> Result<Self, ArtifactError> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let clean = sanitize_tag(tag);
        let name = if clean.is_empty() {
            stamp.to_string()
        } else {
            format!("{stamp}_{clean}")
        };

        let dir = base_dir.join(name);
        std::fs::create_dir_all(&dir).map_err(|source| ArtifactError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        log::info!("Debug artifacts to {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_wav(
        &self,
        name: &str,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<(), ArtifactError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let wav_err = |source| ArtifactError::WavWrite {
            name: name.to_string(),
            source,
        };

        let mut writer = hound::WavWriter::create(self.dir.join(name), spec).map_err(wav_err)?;
        for &sample in samples {
            writer
                .write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)
                .map_err(wav_err)?;
        }
        writer.finalize().map_err(wav_err)?;

        log::info!(
            "Dumped {} ({}ms at {}Hz)",
            name,
            samples.len() as u64 * 1000 / sample_rate.max(1) as u64,
            sample_rate,
        );
        Ok(())
    }
}

impl ArtifactSink for DirArtifactSink {
    fn stage_audio(
        &self,
        stage: &str,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.write_wav(&format!("{stage}.wav"), samples, sample_rate)?;
        Ok(())
    }

    fn waveform_overlay(&self, png: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let name = "waveform_overlay.png";
        std::fs::write(self.dir.join(name), png).map_err(|source| ArtifactError::FileWrite {
            name: name.to_string(),
            source,
        })?;
        log::info!("Dumped {} ({} bytes)", name, png.len());
        Ok(())
    }
}

/// Directory-name-safe rendition of a tag: extension stripped, runs of
/// non-alphanumeric characters collapsed to single underscores.
fn sanitize_tag(tag: &str) -> String {
    let stem = Path::new(tag)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(tag);

    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
