//! Admin-side template generation pipeline.
//!
//! Validates the upload request, smooths and quantizes the image, traces
//! colorable regions, and assembles the palette and template data. Trace
//! failures degrade gracefully: the response still carries the color
//! analysis and a raster preview, just no template geometry — the operator
//! retries with different parameters.

use crate::color_quantizer::{ExtractedPalette, extract_colors, perceptual_dist_sq};
use crate::error::{PaintError, Result};
use crate::image_processor::{ImageData, downsample, load_image_from_bytes};
use crate::preprocessor::smooth_image;
use crate::region_tracer::{TraceOptions, trace_regions};
use crate::template::{Difficulty, PaletteColor, Template, TemplateData};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rgb::RGBA8;

/// Size cap for generation uploads.
pub const MAX_GENERATION_BYTES: usize = 10 * 1024 * 1024;

/// Working resolution for tracing. The template viewBox lives at this
/// scale.
const TRACE_WORKING_DIM: u32 = 400;

#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub image_bytes: &'a [u8],
    /// Requested palette size; must sit inside the difficulty's range.
    pub color_count: usize,
    pub difficulty: Difficulty,
    /// Pre-quantization smoothing strength in `[0, 1]`.
    pub smoothing: f32,
}

#[derive(Debug, Clone)]
pub struct ColorSummary {
    pub index: usize,
    pub hex: String,
    pub percentage: f32,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub width: u32,
    pub height: u32,
    pub color_count: usize,
    pub colors: Vec<ColorSummary>,
    pub region_count: usize,
    /// PNG data URL of the quantized raster.
    pub preview_image: String,
    /// Absent when tracing failed or produced nothing.
    pub template_data: Option<TemplateData>,
    pub color_palette: Option<Vec<PaletteColor>>,
}

impl GenerationOutcome {
    /// Assemble a full playable template. `None` when generation degraded
    /// to color analysis only.
    pub fn to_template(
        &self,
        id: impl Into<String>,
        title: impl Into<String>,
        category_id: impl Into<String>,
        difficulty: Difficulty,
    ) -> Option<Template> {
        let template_data = self.template_data.clone()?;
        let color_palette = self.color_palette.clone()?;

        let template = Template {
            id: id.into(),
            title: title.into(),
            category_id: category_id.into(),
            difficulty,
            color_count: color_palette.len() as u32,
            region_count: template_data.regions.len() as u32,
            estimated_time: estimated_time_minutes(template_data.regions.len()),
            color_palette,
            template_data,
        };
        if let Err(e) = template.validate() {
            log::warn!("assembled template failed validation: {}", e);
        }
        Some(template)
    }
}

pub fn generate_template(request: &GenerationRequest) -> Result<GenerationOutcome> {
    validate_request(request)?;

    let image = load_image_from_bytes(request.image_bytes)?;
    let working = downsample(&image, TRACE_WORKING_DIM);
    let smoothed = smooth_image(&working, request.smoothing);

    // Color extraction failure aborts: nothing downstream can run
    let extracted = extract_colors(&smoothed, request.color_count)?;
    let palette_rgba = extracted.as_rgba();

    let colors: Vec<ColorSummary> = extracted
        .colors
        .iter()
        .enumerate()
        .map(|(index, c)| ColorSummary {
            index,
            hex: c.hex.clone(),
            percentage: c.percentage,
        })
        .collect();

    let preview_image = quantized_preview(&smoothed, &palette_rgba)?;

    let trace_options = TraceOptions {
        turd_size: request.difficulty.turd_size(),
        ..Default::default()
    };

    // Trace failure degrades to a colors-only response
    let traced = match trace_regions(&smoothed, &palette_rgba, &trace_options) {
        Ok(traced) if !traced.regions.is_empty() => Some(traced),
        Ok(_) => {
            log::warn!("tracing retained no regions; returning color analysis only");
            None
        }
        Err(e) => {
            log::warn!("tracing failed: {}; returning color analysis only", e);
            None
        }
    };

    let (region_count, template_data, color_palette) = match traced {
        Some(traced) => {
            let palette = build_palette(&extracted, &traced.regions);
            (
                traced.regions.len(),
                Some(TemplateData {
                    view_box: traced.view_box,
                    regions: traced.regions,
                }),
                Some(palette),
            )
        }
        None => (0, None, None),
    };

    Ok(GenerationOutcome {
        width: smoothed.width,
        height: smoothed.height,
        color_count: extracted.colors.len(),
        colors,
        region_count,
        preview_image,
        template_data,
        color_palette,
    })
}

fn validate_request(request: &GenerationRequest) -> Result<()> {
    if request.image_bytes.is_empty() {
        return Err(PaintError::validation("file", "missing"));
    }
    if request.image_bytes.len() > MAX_GENERATION_BYTES {
        return Err(PaintError::validation(
            "file",
            format!(
                "{} bytes exceeds {}",
                request.image_bytes.len(),
                MAX_GENERATION_BYTES
            ),
        ));
    }

    let (min_colors, max_colors) = request.difficulty.color_range();
    if request.color_count < min_colors || request.color_count > max_colors {
        return Err(PaintError::validation(
            "colorCount",
            format!(
                "{} outside [{}, {}] for {}",
                request.color_count, min_colors, max_colors, request.difficulty
            ),
        ));
    }

    if !(0.0..=1.0).contains(&request.smoothing) {
        return Err(PaintError::validation("smoothing", request.smoothing));
    }

    Ok(())
}

fn build_palette(
    extracted: &ExtractedPalette,
    regions: &[crate::template::Region],
) -> Vec<PaletteColor> {
    extracted
        .colors
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let number = (i + 1) as u32;
            PaletteColor {
                number,
                hex: color.hex.clone(),
                name: color_name(color.r, color.g, color.b),
                total_regions: regions.iter().filter(|r| r.color_number == number).count() as u32,
            }
        })
        .collect()
}

/// PNG data URL of the image with every pixel snapped to its palette
/// color. Works on both the full and the degraded path.
fn quantized_preview(image: &ImageData, palette: &[RGBA8]) -> Result<String> {
    use crate::color_quantizer::nearest_palette_index;

    let raw: Vec<u8> = image
        .pixels
        .iter()
        .flat_map(|p| {
            let c = palette[nearest_palette_index(p, palette)];
            [c.r, c.g, c.b, p.a]
        })
        .collect();

    let buffer: image::RgbaImage = image::ImageBuffer::from_raw(image.width, image.height, raw)
        .ok_or_else(|| PaintError::trace("preview buffer size mismatch"))?;

    let mut png = Vec::new();
    buffer.write_to(
        &mut std::io::Cursor::new(&mut png),
        image::ImageOutputFormat::Png,
    )?;

    Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}

fn estimated_time_minutes(region_count: usize) -> u32 {
    ((region_count as u32).div_ceil(4)).clamp(5, 120)
}

const NAMED_COLORS: &[(&str, u8, u8, u8)] = &[
    ("Black", 10, 10, 10),
    ("White", 250, 250, 250),
    ("Gray", 128, 128, 128),
    ("Red", 220, 40, 40),
    ("Orange", 240, 140, 40),
    ("Yellow", 240, 220, 60),
    ("Green", 60, 160, 60),
    ("Teal", 60, 160, 160),
    ("Sky", 120, 190, 240),
    ("Blue", 50, 80, 200),
    ("Purple", 140, 60, 180),
    ("Pink", 240, 140, 180),
    ("Brown", 140, 90, 50),
    ("Beige", 220, 200, 170),
    ("Navy", 30, 40, 90),
    ("Olive", 120, 120, 40),
];

/// Human-facing palette entry name: nearest of a small named table.
fn color_name(r: u8, g: u8, b: u8) -> String {
    let target = RGBA8::new(r, g, b, 255);
    NAMED_COLORS
        .iter()
        .min_by_key(|(_, nr, ng, nb)| {
            perceptual_dist_sq(&target, &RGBA8::new(*nr, *ng, *nb, 255))
        })
        .map(|(name, _, _, _)| name.to_string())
        .unwrap_or_else(|| "Color".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Eight equal, well-separated grayscale stripes, PNG-encoded.
    fn striped_png(width: u32, height: u32) -> Vec<u8> {
        let mut raw = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let stripe = (y as usize * 8 / height as usize).min(7);
            let v = (stripe * 36) as u8;
            for _x in 0..width {
                raw.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let img: image::RgbaImage = image::ImageBuffer::from_raw(width, height, raw).unwrap();
        let mut png = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
        png
    }

    fn request(bytes: &[u8]) -> GenerationRequest<'_> {
        GenerationRequest {
            image_bytes: bytes,
            color_count: 8,
            difficulty: Difficulty::Easy,
            smoothing: 0.0,
        }
    }

    #[test]
    fn test_generation_full_pipeline() {
        let png = striped_png(64, 64);
        let outcome = generate_template(&request(&png)).unwrap();

        assert_eq!(outcome.width, 64);
        assert_eq!(outcome.height, 64);
        assert_eq!(outcome.color_count, 8);
        assert_eq!(outcome.colors.len(), 8);
        assert!(outcome.region_count >= 8, "regions: {}", outcome.region_count);
        assert!(outcome.preview_image.starts_with("data:image/png;base64,"));

        let sum: f32 = outcome.colors.iter().map(|c| c.percentage).sum();
        assert!((sum - 100.0).abs() < 0.5);

        let data = outcome.template_data.as_ref().unwrap();
        assert_eq!(data.regions.len(), outcome.region_count);
        let palette = outcome.color_palette.as_ref().unwrap();
        assert_eq!(palette.len(), 8);
        let declared: u32 = palette.iter().map(|c| c.total_regions).sum();
        assert_eq!(declared as usize, outcome.region_count);
    }

    #[test]
    fn test_generated_template_validates() {
        let png = striped_png(64, 64);
        let outcome = generate_template(&request(&png)).unwrap();
        let template = outcome
            .to_template("stripes", "Stripes", "test", Difficulty::Easy)
            .unwrap();
        assert!(template.validate().is_ok());
        assert_eq!(template.region_count as usize, outcome.region_count);
        assert!(template.estimated_time >= 5);
    }

    #[test]
    fn test_missing_file_rejected() {
        assert!(matches!(
            generate_template(&request(&[])),
            Err(PaintError::Validation { .. })
        ));
    }

    #[test]
    fn test_non_image_bytes_rejected() {
        let bytes = b"definitely not a png".to_vec();
        assert!(matches!(
            generate_template(&request(&bytes)),
            Err(PaintError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_color_count_bound_by_difficulty() {
        let png = striped_png(32, 32);
        for (difficulty, bad_count) in [
            (Difficulty::Easy, 12),
            (Difficulty::Medium, 5),
            (Difficulty::Hard, 35),
        ] {
            let request = GenerationRequest {
                image_bytes: &png,
                color_count: bad_count,
                difficulty,
                smoothing: 0.0,
            };
            assert!(
                matches!(
                    generate_template(&request),
                    Err(PaintError::Validation { .. })
                ),
                "{} colors at {}",
                bad_count,
                difficulty
            );
        }
    }

    #[test]
    fn test_smoothing_out_of_range_rejected() {
        let png = striped_png(32, 32);
        let request = GenerationRequest {
            image_bytes: &png,
            color_count: 6,
            difficulty: Difficulty::Easy,
            smoothing: 1.5,
        };
        assert!(matches!(
            generate_template(&request),
            Err(PaintError::Validation { .. })
        ));
    }

    #[test]
    fn test_smoothing_still_generates() {
        let png = striped_png(64, 64);
        let request = GenerationRequest {
            image_bytes: &png,
            color_count: 6,
            difficulty: Difficulty::Easy,
            smoothing: 0.8,
        };
        let outcome = generate_template(&request).unwrap();
        assert!(outcome.color_count >= 2);
    }

    #[test]
    fn test_difficulty_changes_region_granularity() {
        // Hard keeps small contours that easy's noise floor discards, so
        // hard can only have at least as many regions.
        let png = striped_png(64, 64);
        let easy = generate_template(&GenerationRequest {
            image_bytes: &png,
            color_count: 6,
            difficulty: Difficulty::Easy,
            smoothing: 0.0,
        })
        .unwrap();
        let hard = generate_template(&GenerationRequest {
            image_bytes: &png,
            color_count: 20,
            difficulty: Difficulty::Hard,
            smoothing: 0.0,
        })
        .unwrap();
        assert!(hard.region_count >= easy.region_count);
    }

    #[test]
    fn test_estimated_time_bounds() {
        assert_eq!(estimated_time_minutes(0), 5);
        assert_eq!(estimated_time_minutes(40), 10);
        assert_eq!(estimated_time_minutes(10_000), 120);
    }

    #[test]
    fn test_color_names_are_recognizable() {
        assert_eq!(color_name(230, 30, 30), "Red");
        assert_eq!(color_name(5, 5, 5), "Black");
        assert_eq!(color_name(255, 255, 255), "White");
    }
}
