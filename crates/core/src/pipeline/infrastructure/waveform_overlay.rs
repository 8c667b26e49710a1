use std::io::Cursor;

use super::dir_artifact_sink::ArtifactError;

pub const OVERLAY_WIDTH: u32 = 1600;
pub const OVERLAY_HEIGHT: u32 = 600;

const PANEL_HEIGHT: u32 = OVERLAY_HEIGHT / 2;
// Waveform rows stay inside the panel with a small margin.
const WAVE_HALF: f32 = (PANEL_HEIGHT / 2 - 5) as f32;

const BACKGROUND: image::Rgb<u8> = image::Rgb([255, 255, 255]);
const DIVIDER: image::Rgb<u8> = image::Rgb([200, 200, 200]);
const RAW_COLOR: image::Rgb<u8> = image::Rgb([90, 90, 90]);
const FINAL_COLOR: image::Rgb<u8> = image::Rgb([31, 119, 180]);
const SILENCE_TINT: image::Rgb<u8> = image::Rgb([250, 220, 220]);
const EXCISED_TINT: image::Rgb<u8> = image::Rgb([215, 225, 250]);

/// Render the two-panel excision overlay as PNG bytes.
///
/// Top panel: the original mono signal with detected silence tinted red
/// and actually excised spans tinted blue. Bottom panel: the excised
/// output. Both panels share one vertical scale so level changes stay
/// visible. `silence_mask` and `excised_mask` must be `raw`'s length.
pub fn render_waveform_overlay(
    raw: &[f32],
    excised: &[f32],
    silence_mask: &[bool],
    excised_mask: &[bool],
) -> Result<Vec<u8>, ArtifactError> {
    debug_assert_eq!(raw.len(), silence_mask.len());
    debug_assert_eq!(raw.len(), excised_mask.len());

    let mut img = image::RgbImage::from_pixel(OVERLAY_WIDTH, OVERLAY_HEIGHT, BACKGROUND);
    for x in 0..OVERLAY_WIDTH {
        img.put_pixel(x, PANEL_HEIGHT, DIVIDER);
    }

    let y_max = peak(raw).max(peak(excised)).max(1e-6) * 1.05;

    for x in 0..OVERLAY_WIDTH {
        let Some((lo, hi)) = column_range(x, raw.len()) else {
            continue;
        };
        let tint = if excised_mask[lo..hi].iter().any(|&m| m) {
            Some(EXCISED_TINT)
        } else if silence_mask[lo..hi].iter().any(|&m| m) {
            Some(SILENCE_TINT)
        } else {
            None
        };
        if let Some(tint) = tint {
            for y in 0..PANEL_HEIGHT {
                img.put_pixel(x, y, tint);
            }
        }
        draw_column(&mut img, x, 0, &raw[lo..hi], y_max, RAW_COLOR);
    }

    for x in 0..OVERLAY_WIDTH {
        let Some((lo, hi)) = column_range(x, excised.len()) else {
            continue;
        };
        draw_column(&mut img, x, PANEL_HEIGHT, &excised[lo..hi], y_max, FINAL_COLOR);
    }

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(ArtifactError::PngEncode)?;
    Ok(bytes)
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Sample span rendered into column `x`, at least one sample wide.
fn column_range(x: u32, n: usize) -> Option<(usize, usize)> {
    if n == 0 {
        return None;
    }
    let w = OVERLAY_WIDTH as usize;
    let lo = x as usize * n / w;
    let hi = ((x as usize + 1) * n / w).clamp(lo + 1, n);
    Some((lo, hi))
}

fn draw_column(
    img: &mut image::RgbImage,
    x: u32,
    panel_top: u32,
    samples: &[f32],
    y_max: f32,
    color: image::Rgb<u8>,
) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &s in samples {
        min = min.min(s);
        max = max.max(s);
    }
    if !min.is_finite() || !max.is_finite() {
        return;
    }

    let center = panel_top as f32 + PANEL_HEIGHT as f32 / 2.0;
    let y_top = (center - max / y_max * WAVE_HALF).round() as u32;
    let y_bot = (center - min / y_max * WAVE_HALF).round() as u32;
    for y in y_top..=y_bot {
        img.put_pixel(x, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: usize = 16000;

    // 1s of tone, silent in the second half, excised in [10000, 14000).
    fn overlay_fixture() -> (Vec<f32>, Vec<f32>, Vec<bool>, Vec<bool>) {
        let raw: Vec<f32> = (0..SR)
            .map(|i| {
                if i < SR / 2 {
                    let t = i as f64 / SR as f64;
                    (2.0 * std::f64::consts::PI * 220.0 * t).sin() as f32 * 0.2
                } else {
                    0.0
                }
            })
            .collect();
        let excised: Vec<f32> = raw[..10000].iter().chain(&raw[14000..]).copied().collect();
        let mut silence = vec![false; SR];
        silence[8000..].fill(true);
        let mut excised_mask = vec![false; SR];
        excised_mask[10000..14000].fill(true);
        (raw, excised, silence, excised_mask)
    }

    #[test]
    fn test_output_is_decodable_png_with_fixed_size() {
        let (raw, excised, silence, excised_mask) = overlay_fixture();
        let bytes = render_waveform_overlay(&raw, &excised, &silence, &excised_mask).unwrap();

        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), OVERLAY_WIDTH);
        assert_eq!(img.height(), OVERLAY_HEIGHT);
    }

    #[test]
    fn test_region_tints_rendered() {
        let (raw, excised, silence, excised_mask) = overlay_fixture();
        let bytes = render_waveform_overlay(&raw, &excised, &silence, &excised_mask).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();

        // Top margin rows are background in speech, tint in masked spans.
        assert_eq!(img.get_pixel(100, 5).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(900, 5).0, [250, 220, 220]);
        assert_eq!(img.get_pixel(1100, 5).0, [215, 225, 250]);
    }

    #[test]
    fn test_both_panels_draw_their_waveforms() {
        let (raw, excised, silence, excised_mask) = overlay_fixture();
        let bytes = render_waveform_overlay(&raw, &excised, &silence, &excised_mask).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();

        let has_color = |color: [u8; 3], rows: std::ops::Range<u32>| {
            rows.into_iter()
                .any(|y| (0..OVERLAY_WIDTH).any(|x| img.get_pixel(x, y).0 == color))
        };
        assert!(has_color([90, 90, 90], 0..PANEL_HEIGHT));
        assert!(has_color([31, 119, 180], PANEL_HEIGHT + 1..OVERLAY_HEIGHT));
    }

    #[test]
    fn test_empty_input_renders_blank_panels() {
        let bytes = render_waveform_overlay(&[], &[], &[], &[]).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgb8();

        assert_eq!(img.width(), OVERLAY_WIDTH);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    }
}
