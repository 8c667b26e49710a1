use std::time::Instant;

use crate::conditioning::domain::compressor::DynamicsCompressor;
use crate::conditioning::domain::limiter::{TransientLimiter, DEFAULT_CEILING_DB};
use crate::pipeline::artifact_sink::ArtifactSink;
use crate::pipeline::infrastructure::waveform_overlay::render_waveform_overlay;
use crate::shared::audio_buffer::AudioBuffer;
use crate::shared::dsp::db_to_linear;
use crate::silence::domain::excisor::Excisor;
use crate::silence::domain::silence_detector::{
    SilenceDetector, DEFAULT_AGGRESSIVENESS, DEFAULT_MIN_GAP_MS, DEFAULT_MIN_SILENCE_MS,
};
use crate::silence::domain::silence_shaper::SilenceShaper;
use crate::timeline::domain::excision_map::ExcisionMap;

/// Tunables for one preprocessing run.
#[derive(Clone, Debug)]
pub struct PreprocessOptions {
    pub min_silence_ms: u64,
    pub vad_aggressiveness: u8,
    pub render_overlay: bool,
    pub debug_tag: Option<String>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            min_silence_ms: DEFAULT_MIN_SILENCE_MS,
            vad_aggressiveness: DEFAULT_AGGRESSIVENESS,
            render_overlay: false,
            debug_tag: None,
        }
    }
}

/// Preprocessed audio together with the map back to source time.
pub struct PreprocessResult {
    pub audio: AudioBuffer,
    pub excision_map: ExcisionMap,
    pub waveform_overlay: Option<Vec<u8>>,
}

/// Conditions a recording for transcription: limits transients, compresses
/// toward a stable speech level, excises long silences, and fills the
/// result with a low noise floor. Analysis runs on a mono downmix; the
/// combined gain is applied to every channel of the source, so the output
/// keeps the input's channel layout.
pub struct PreprocessAudioUseCase {
    sink: Box<dyn ArtifactSink>,
}

impl PreprocessAudioUseCase {
    pub fn new(sink: Box<dyn ArtifactSink>) -> Self {
        Self { sink }
    }

    pub fn run(
        &self,
        buffer: &AudioBuffer,
        options: &PreprocessOptions,
    ) -> Result<PreprocessResult, Box<dyn std::error::Error>> {
        let started = Instant::now();
        log::info!(
            "Preprocessing {:.1}s of audio ({} Hz, {} ch), min silence {}ms",
            buffer.duration(),
            buffer.sample_rate(),
            buffer.channels(),
            options.min_silence_ms,
        );
        if let Some(ref tag) = options.debug_tag {
            log::debug!("Run tag: {tag}");
        }

        if buffer.num_frames() == 0 {
            log::warn!("Input audio is empty, nothing to preprocess");
            let waveform_overlay = if options.render_overlay {
                let bytes = render_waveform_overlay(&[], &[], &[], &[])?;
                self.sink.waveform_overlay(&bytes)?;
                Some(bytes)
            } else {
                None
            };
            return Ok(PreprocessResult {
                audio: AudioBuffer::new(Vec::new(), buffer.sample_rate(), buffer.channels()),
                excision_map: ExcisionMap::identity(0.0),
                waveform_overlay,
            });
        }

        let sample_rate = buffer.sample_rate();
        let num_frames = buffer.num_frames();

        // 1. Downmix for analysis; gains computed here apply to every channel
        let mono = buffer.to_mono();
        self.sink.stage_audio("01_raw", &mono, sample_rate)?;

        // 2. Tame transients so the compressor sees a stable peak level
        let ceiling = db_to_linear(DEFAULT_CEILING_DB) as f32;
        let over_ceiling = mono.iter().filter(|s| s.abs() > ceiling).count();
        let original_peak = peak(&mono);
        let limited = TransientLimiter::default().apply(&mono, sample_rate);
        log::info!(
            "Limiter: {} samples over ceiling ({:.1}%), peak {:.3} -> {:.3}",
            over_ceiling,
            over_ceiling as f64 * 100.0 / num_frames as f64,
            original_peak,
            peak(&limited.samples),
        );

        // 3. Even out levels before voice activity detection
        let compressed = DynamicsCompressor::default().apply(&limited.samples, sample_rate);
        self.sink
            .stage_audio("02_conditioned", &compressed.samples, sample_rate)?;

        // 4. Voice activity on the conditioned signal
        let detector = SilenceDetector::new(
            options.vad_aggressiveness,
            options.min_silence_ms,
            DEFAULT_MIN_GAP_MS,
        );
        let silence_mask = detector.detect(&compressed.samples, sample_rate);

        // 5. Excise silence from the source, carrying the conditioning gain
        let keep_runs = if silence_mask.iter().any(|&s| s) {
            SilenceShaper::default().keep_runs(&silence_mask, sample_rate)
        } else {
            log::info!("No silence to excise");
            vec![(0, num_frames)]
        };
        let total_gain: Vec<f32> = limited
            .gain
            .iter()
            .zip(&compressed.gain)
            .map(|(l, c)| l * c)
            .collect();
        let mut audio = Excisor::excise(buffer, &total_gain, &keep_runs);
        if audio.num_frames() < num_frames {
            self.sink
                .stage_audio("03_excised", &audio.to_mono(), sample_rate)?;
        }

        // 6. Noise floor keeps downstream voice detection from tripping on
        //    digitally perfect silence
        Excisor::default().apply_noise_floor(&mut audio);
        self.sink
            .stage_audio("04_final", &audio.to_mono(), sample_rate)?;

        // 7. Map from excised time back to the source timeline
        let excision_map = ExcisionMap::from_keep_runs(&keep_runs, sample_rate, num_frames);
        log::info!(
            "Excision map: {} region(s), {:.0}ms of {:.0}ms kept",
            excision_map.keep_regions_ms.len(),
            excision_map.excised_duration_ms,
            excision_map.original_duration_ms,
        );

        // 8. Overlay for inspection
        let waveform_overlay = if options.render_overlay {
            let excised_mask = excised_mask_from_keep_runs(&keep_runs, num_frames);
            let bytes =
                render_waveform_overlay(&mono, &audio.to_mono(), &silence_mask, &excised_mask)?;
            self.sink.waveform_overlay(&bytes)?;
            Some(bytes)
        } else {
            None
        };

        log::info!(
            "Preprocessing finished in {:.2}s: {:.1}s -> {:.1}s",
            started.elapsed().as_secs_f64(),
            buffer.duration(),
            audio.duration(),
        );
        Ok(PreprocessResult {
            audio,
            excision_map,
            waveform_overlay,
        })
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

/// Per-frame mask of the source timeline marking frames that were cut.
fn excised_mask_from_keep_runs(keep_runs: &[(usize, usize)], num_frames: usize) -> Vec<bool> {
    let mut mask = vec![true; num_frames];
    for &(start, end) in keep_runs {
        for flag in &mut mask[start.min(num_frames)..end.min(num_frames)] {
            *flag = false;
        }
    }
    mask
}
