//! Pre-quantization smoothing.
//!
//! The generation request carries a `smoothing` knob in `[0, 1]` that merges
//! noisy micro-regions before the palette is extracted. It maps onto an
//! edge-preserving bilateral filter so that real outlines survive while
//! near-uniform areas flatten out.

use crate::image_processor::ImageData;
use rgb::RGBA8;

/// Apply the request's `smoothing` strength to the image.
/// `0.0` is a no-op; `1.0` runs three filter passes with a wide color sigma.
pub fn smooth_image(image_data: &ImageData, smoothing: f32) -> ImageData {
    if smoothing <= 0.0 || image_data.pixels.is_empty() {
        return image_data.clone();
    }

    let smoothing = smoothing.min(1.0);
    let iterations = 1 + (smoothing * 2.0).round() as u32;
    let color_sigma = 20.0 + smoothing * 40.0;

    let mut pixels = image_data.pixels.clone();
    for _ in 0..iterations {
        pixels = bilateral_filter(&pixels, image_data.width, image_data.height, color_sigma);
    }

    ImageData {
        width: image_data.width,
        height: image_data.height,
        pixels,
    }
}

/// Fast LUT-based bilateral filter — edge-preserving smoothing.
/// Uses a precomputed range weight lookup table with fixed-point arithmetic.
fn bilateral_filter(pixels: &[RGBA8], width: u32, height: u32, color_sigma: f32) -> Vec<RGBA8> {
    let w = width as usize;
    let h = height as usize;

    // Radius 2 is enough to merge speckle at the working resolution
    let r: i32 = 2;

    // Range weight LUT: squared RGB distance 0..=195075 binned to 256 entries
    // (195075 = 255^2 * 3)
    let range_denom = 2.0 * (color_sigma as f64) * (color_sigma as f64);
    let lut_size: usize = 256;
    let bin_scale = 195075.0 / lut_size as f64;
    let mut range_lut = vec![0u32; lut_size];
    for (i, slot) in range_lut.iter_mut().enumerate() {
        let dist = i as f64 * bin_scale;
        let weight = (-dist / range_denom).exp();
        *slot = (weight * 1024.0) as u32; // fixed-point 10-bit
    }

    let mut output = vec![RGBA8::new(0, 0, 0, 255); pixels.len()];

    for y in 0..h {
        for x in 0..w {
            let ci = y * w + x;
            let cr = pixels[ci].r as i32;
            let cg = pixels[ci].g as i32;
            let cb = pixels[ci].b as i32;

            let mut sum_r: u64 = 0;
            let mut sum_g: u64 = 0;
            let mut sum_b: u64 = 0;
            let mut sum_w: u64 = 0;

            let y_start = if (y as i32) < r { 0 } else { y - r as usize };
            let y_end = (y + r as usize + 1).min(h);
            let x_start = if (x as i32) < r { 0 } else { x - r as usize };
            let x_end = (x + r as usize + 1).min(w);

            for ny in y_start..y_end {
                let row = ny * w;
                for nx in x_start..x_end {
                    let ni = row + nx;
                    let dr = pixels[ni].r as i32 - cr;
                    let dg = pixels[ni].g as i32 - cg;
                    let db = pixels[ni].b as i32 - cb;
                    let dist_sq = (dr * dr + dg * dg + db * db) as usize;

                    let bin = (dist_sq * lut_size) / 195076;
                    let weight = range_lut[bin.min(lut_size - 1)] as u64;

                    sum_r += pixels[ni].r as u64 * weight;
                    sum_g += pixels[ni].g as u64 * weight;
                    sum_b += pixels[ni].b as u64 * weight;
                    sum_w += weight;
                }
            }

            if sum_w > 0 {
                output[ci] = RGBA8::new(
                    (sum_r / sum_w) as u8,
                    (sum_g / sum_w) as u8,
                    (sum_b / sum_w) as u8,
                    pixels[ci].a,
                );
            } else {
                output[ci] = pixels[ci];
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothing_zero_is_noop() {
        let mut pixels = Vec::new();
        for i in 0..64u32 {
            pixels.push(RGBA8::new((i * 4) as u8, 0, 0, 255));
        }
        let img = ImageData::new(8, 8, pixels);
        let out = smooth_image(&img, 0.0);
        assert_eq!(out.pixels, img.pixels);
    }

    #[test]
    fn test_smoothing_uniform_image_unchanged() {
        let img = ImageData::filled(8, 8, RGBA8::new(128, 128, 128, 255));
        let out = smooth_image(&img, 1.0);
        for p in &out.pixels {
            assert_eq!(p.r, 128);
            assert_eq!(p.g, 128);
            assert_eq!(p.b, 128);
        }
    }

    #[test]
    fn test_smoothing_preserves_alpha() {
        let mut img = ImageData::filled(4, 4, RGBA8::new(100, 100, 100, 255));
        img.pixels[5].a = 32;
        let out = smooth_image(&img, 0.5);
        assert_eq!(out.pixels[5].a, 32);
    }

    #[test]
    fn test_smoothing_flattens_speckle() {
        // A lone bright pixel in a dark field should move toward the field.
        let mut img = ImageData::filled(9, 9, RGBA8::new(20, 20, 20, 255));
        img.set(4, 4, RGBA8::new(60, 60, 60, 255));
        let out = smooth_image(&img, 1.0);
        let center = out.get(4, 4).unwrap();
        assert!(center.r < 60);
    }
}
