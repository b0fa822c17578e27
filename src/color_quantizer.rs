//! Palette extraction for template generation.
//!
//! Median-cut seeding over 3D RGB followed by k-means refinement with a
//! perceptual distance metric. Frequencies are derived by mapping every
//! working pixel to its nearest representative, so the reported percentages
//! always sum to ~100 regardless of what the clustering saw internally.

use crate::error::{PaintError, Result};
use crate::image_processor::{ImageData, downsample};
use rgb::RGBA8;

/// Working resolution cap for quantization. Output colors stay full 8-bit
/// RGB; only the pixel population is bounded.
pub const QUANTIZE_WORKING_DIM: u32 = 200;

const KMEANS_ITERATIONS: usize = 8;

/// One representative color with its observed frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub hex: String,
    pub count: usize,
    pub percentage: f32,
}

/// Quantization result, sorted descending by frequency.
#[derive(Debug, Clone)]
pub struct ExtractedPalette {
    pub colors: Vec<ExtractedColor>,
    pub dominant_color: ExtractedColor,
    pub total_pixels: usize,
}

impl ExtractedPalette {
    /// Palette as raw RGBA, in frequency order (the tracer's input).
    pub fn as_rgba(&self) -> Vec<RGBA8> {
        self.colors
            .iter()
            .map(|c| RGBA8::new(c.r, c.g, c.b, 255))
            .collect()
    }
}

/// Perceptual color distance squared (weighted RGB, approximates human
/// vision). Weights: R=2, G=4, B=3 (green most sensitive).
#[inline]
pub fn perceptual_dist_sq(a: &RGBA8, b: &RGBA8) -> i32 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    2 * dr * dr + 4 * dg * dg + 3 * db * db
}

/// Find the nearest palette color index using perceptual distance.
#[inline]
pub fn nearest_palette_index(pixel: &RGBA8, palette: &[RGBA8]) -> usize {
    let mut best_idx = 0usize;
    let mut best_dist = i32::MAX;
    for (idx, c) in palette.iter().enumerate() {
        let d = perceptual_dist_sq(pixel, c);
        if d < best_dist {
            best_dist = d;
            best_idx = idx;
        }
    }
    best_idx
}

pub fn hex_string(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Extract up to `color_count` representative colors from the image.
///
/// Returns fewer colors than requested when the image itself has fewer
/// distinct colors after downsampling — representatives are never invented.
pub fn extract_colors(image_data: &ImageData, color_count: usize) -> Result<ExtractedPalette> {
    if color_count == 0 {
        return Err(PaintError::validation("colorCount", color_count));
    }
    if image_data.pixels.is_empty() {
        return Err(PaintError::color_extraction("image has no pixels"));
    }

    let working = downsample(image_data, QUANTIZE_WORKING_DIM);

    let seeds = median_cut(&working.pixels, color_count);
    if seeds.is_empty() {
        return Err(PaintError::color_extraction(
            "quantization produced no representatives",
        ));
    }
    let palette = dedup_palette(kmeans_refine(seeds, &working.pixels, KMEANS_ITERATIONS));

    // Frequency accounting comes from the final nearest-color mapping, not
    // from the clustering, so that percentages sum to ~100.
    let mut counts = vec![0usize; palette.len()];
    for p in &working.pixels {
        counts[nearest_palette_index(p, &palette)] += 1;
    }

    let total_pixels = working.pixels.len();
    let mut colors: Vec<ExtractedColor> = palette
        .iter()
        .zip(counts.iter())
        .filter(|&(_, &count)| count > 0)
        .map(|(c, &count)| ExtractedColor {
            r: c.r,
            g: c.g,
            b: c.b,
            hex: hex_string(c.r, c.g, c.b),
            count,
            percentage: count as f32 * 100.0 / total_pixels as f32,
        })
        .collect();

    if colors.is_empty() {
        return Err(PaintError::color_extraction("no color received any pixels"));
    }

    colors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.hex.cmp(&b.hex)));
    let dominant_color = colors[0].clone();

    Ok(ExtractedPalette {
        colors,
        dominant_color,
        total_pixels,
    })
}

/// Median-cut: recursively split the color box along its widest channel.
fn median_cut(pixels: &[RGBA8], num_colors: usize) -> Vec<RGBA8> {
    let colors: Vec<(u8, u8, u8)> = pixels.iter().map(|p| (p.r, p.g, p.b)).collect();
    if colors.is_empty() {
        return Vec::new();
    }

    let mut boxes: Vec<Vec<(u8, u8, u8)>> = vec![colors];
    while boxes.len() < num_colors {
        let mut best_idx = 0;
        let mut best_range = 0u16;
        for (i, b) in boxes.iter().enumerate() {
            let range = box_max_range(b);
            if range > best_range || (range == best_range && b.len() > boxes[best_idx].len()) {
                best_range = range;
                best_idx = i;
            }
        }
        // All boxes uniform: the image has fewer distinct colors than asked
        if best_range == 0 || boxes[best_idx].len() < 2 {
            break;
        }
        let to_split = boxes.remove(best_idx);
        let (a, b) = split_box(to_split);
        if !a.is_empty() {
            boxes.push(a);
        }
        if !b.is_empty() {
            boxes.push(b);
        }
    }

    boxes.iter().map(|b| box_average(b)).collect()
}

fn box_max_range(colors: &[(u8, u8, u8)]) -> u16 {
    let (mut rmin, mut rmax) = (255u8, 0u8);
    let (mut gmin, mut gmax) = (255u8, 0u8);
    let (mut bmin, mut bmax) = (255u8, 0u8);
    for &(r, g, b) in colors {
        rmin = rmin.min(r);
        rmax = rmax.max(r);
        gmin = gmin.min(g);
        gmax = gmax.max(g);
        bmin = bmin.min(b);
        bmax = bmax.max(b);
    }
    let rr = rmax.saturating_sub(rmin) as u16;
    let gr = gmax.saturating_sub(gmin) as u16;
    let br = bmax.saturating_sub(bmin) as u16;
    rr.max(gr).max(br)
}

fn split_box(mut colors: Vec<(u8, u8, u8)>) -> (Vec<(u8, u8, u8)>, Vec<(u8, u8, u8)>) {
    let (mut rmin, mut rmax) = (255u8, 0u8);
    let (mut gmin, mut gmax) = (255u8, 0u8);
    let (mut bmin, mut bmax) = (255u8, 0u8);
    for &(r, g, b) in &colors {
        rmin = rmin.min(r);
        rmax = rmax.max(r);
        gmin = gmin.min(g);
        gmax = gmax.max(g);
        bmin = bmin.min(b);
        bmax = bmax.max(b);
    }
    let rr = rmax.saturating_sub(rmin);
    let gr = gmax.saturating_sub(gmin);
    let br = bmax.saturating_sub(bmin);

    if rr >= gr && rr >= br {
        colors.sort_by_key(|c| c.0);
    } else if gr >= br {
        colors.sort_by_key(|c| c.1);
    } else {
        colors.sort_by_key(|c| c.2);
    }

    let mid = colors.len() / 2;
    let right = colors.split_off(mid);
    (colors, right)
}

fn box_average(colors: &[(u8, u8, u8)]) -> RGBA8 {
    if colors.is_empty() {
        return RGBA8::new(0, 0, 0, 255);
    }
    let (mut sr, mut sg, mut sb) = (0u64, 0u64, 0u64);
    for &(r, g, b) in colors {
        sr += r as u64;
        sg += g as u64;
        sb += b as u64;
    }
    let n = colors.len() as u64;
    RGBA8::new((sr / n) as u8, (sg / n) as u8, (sb / n) as u8, 255)
}

/// Refine palette using k-means iterations with perceptual distance.
fn kmeans_refine(mut palette: Vec<RGBA8>, samples: &[RGBA8], iterations: usize) -> Vec<RGBA8> {
    if palette.is_empty() || samples.is_empty() {
        return palette;
    }

    for _ in 0..iterations {
        let k = palette.len();
        let mut sums = vec![[0u64; 3]; k];
        let mut counts = vec![0u64; k];

        for s in samples {
            let best_idx = nearest_palette_index(s, &palette);
            sums[best_idx][0] += s.r as u64;
            sums[best_idx][1] += s.g as u64;
            sums[best_idx][2] += s.b as u64;
            counts[best_idx] += 1;
        }

        let mut changed = false;
        for (j, c) in palette.iter_mut().enumerate() {
            if counts[j] == 0 {
                continue;
            }
            let n = counts[j];
            let new_c = RGBA8::new(
                (sums[j][0] / n) as u8,
                (sums[j][1] / n) as u8,
                (sums[j][2] / n) as u8,
                255,
            );
            if c.r != new_c.r || c.g != new_c.g || c.b != new_c.b {
                changed = true;
                *c = new_c;
            }
        }

        if !changed {
            break;
        }
    }

    palette
}

/// Drop representatives that collapsed onto the same RGB during refinement.
fn dedup_palette(palette: Vec<RGBA8>) -> Vec<RGBA8> {
    let mut seen = std::collections::HashSet::new();
    palette
        .into_iter()
        .filter(|c| seen.insert((c.r, c.g, c.b)))
        .collect()
}
