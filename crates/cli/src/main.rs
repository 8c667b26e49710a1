use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use speechprep_core::pipeline::artifact_sink::{ArtifactSink, NullArtifactSink};
use speechprep_core::pipeline::infrastructure::dir_artifact_sink::DirArtifactSink;
use speechprep_core::pipeline::preprocess_audio_use_case::{
    PreprocessAudioUseCase, PreprocessOptions,
};
use speechprep_core::shared::audio_buffer::AudioBuffer;
use speechprep_core::silence::domain::silence_detector::{
    DEFAULT_AGGRESSIVENESS, DEFAULT_MIN_SILENCE_MS,
};

/// Audio preprocessing for speech transcription: conditioning, silence
/// excision, and the timestamp map back to the original recording.
#[derive(Parser)]
#[command(name = "speechprep")]
struct Cli {
    /// Input WAV file.
    input: PathBuf,

    /// Output WAV file (excised audio).
    #[arg(short, long)]
    output: PathBuf,

    /// Write the excision map as JSON to this path.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Minimum silence duration to excise, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_MIN_SILENCE_MS)]
    min_silence: u64,

    /// Voice activity aggressiveness (0-3, higher excises more).
    #[arg(long, default_value_t = DEFAULT_AGGRESSIVENESS)]
    aggressiveness: u8,

    /// Write the waveform overlay PNG to this path.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write per-stage debug WAVs into a run directory under this path.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Tag for the debug run directory (defaults to the input file name).
    #[arg(long)]
    tag: Option<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let buffer = read_wav(&cli.input)?;

    let tag = cli.tag.clone().unwrap_or_else(|| {
        cli.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "run".to_string())
    });
    let sink: Box<dyn ArtifactSink> = match &cli.debug_dir {
        Some(dir) => Box::new(DirArtifactSink::new(dir, &tag)?),
        None => Box::new(NullArtifactSink),
    };

    let options = PreprocessOptions {
        min_silence_ms: cli.min_silence,
        vad_aggressiveness: cli.aggressiveness,
        render_overlay: cli.overlay.is_some() || cli.debug_dir.is_some(),
        debug_tag: cli.tag.clone(),
    };

    let use_case = PreprocessAudioUseCase::new(sink);
    let result = use_case.run(&buffer, &options)?;

    write_wav(&cli.output, &result.audio)?;
    log::info!("Output written to {}", cli.output.display());

    if let Some(map_path) = &cli.map {
        let json = serde_json::to_string_pretty(&result.excision_map)?;
        std::fs::write(map_path, json)?;
        log::info!("Excision map written to {}", map_path.display());
    }

    if let Some(overlay_path) = &cli.overlay {
        if let Some(png) = &result.waveform_overlay {
            std::fs::write(overlay_path, png)?;
            log::info!("Waveform overlay written to {}", overlay_path.display());
        }
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.aggressiveness > 3 {
        return Err(format!(
            "Aggressiveness must be between 0 and 3, got {}",
            cli.aggressiveness
        )
        .into());
    }
    if cli.min_silence == 0 {
        return Err("Minimum silence duration must be at least 1 ms".into());
    }
    Ok(())
}

fn read_wav(path: &Path) -> Result<AudioBuffer, Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    log::info!(
        "Read {}: {} Hz, {} ch, {} bit",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
    );
    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
}

fn write_wav(path: &Path, audio: &AudioBuffer) -> Result<(), Box<dyn std::error::Error>> {
    let spec = hound::WavSpec {
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in audio.samples() {
        writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
