//! Scanline flood fill for the freehand coloring canvas.
//!
//! Explicit-stack, 4-connected scanline fill with per-channel color
//! tolerance. Dark, opaque pixels are treated as outline and are never
//! overwritten or used as seeds, which keeps hand-drawn borders crisp
//! after many fills. Runs on discrete taps, so the full-size visited
//! bitmap per call is acceptable.

use crate::image_processor::ImageData;
use rgb::RGBA8;

/// Opacity floor for outline classification: translucent dark pixels are
/// anti-aliasing fringe, not border ink.
const OUTLINE_ALPHA_MIN: u8 = 200;

#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Maximum per-channel difference from the seed color (R, G, B and A
    /// independently — not Euclidean distance).
    pub tolerance: u8,
    pub preserve_outline: bool,
    /// Luminance below this marks a pixel as outline.
    pub outline_threshold: u8,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            tolerance: 32,
            preserve_outline: true,
            outline_threshold: 64,
        }
    }
}

/// Perceptually weighted luminance.
#[inline]
pub fn luminance(p: &RGBA8) -> f64 {
    0.299 * p.r as f64 + 0.587 * p.g as f64 + 0.114 * p.b as f64
}

#[inline]
fn is_outline(p: &RGBA8, threshold: u8) -> bool {
    luminance(p) < threshold as f64 && p.a > OUTLINE_ALPHA_MIN
}

#[inline]
fn channels_match(p: &RGBA8, seed: &RGBA8, tolerance: u8) -> bool {
    let tol = tolerance as i32;
    (p.r as i32 - seed.r as i32).abs() <= tol
        && (p.g as i32 - seed.g as i32).abs() <= tol
        && (p.b as i32 - seed.b as i32).abs() <= tol
        && (p.a as i32 - seed.a as i32).abs() <= tol
}

#[inline]
fn fillable(p: &RGBA8, seed: &RGBA8, options: &FillOptions) -> bool {
    if options.preserve_outline && is_outline(p, options.outline_threshold) {
        return false;
    }
    channels_match(p, seed, options.tolerance)
}

/// Fill the connected area around `(start_x, start_y)` in place.
///
/// No-ops: seed out of bounds, seed on an outline pixel (when preserving),
/// or seed color already exactly the fill color — which also makes a
/// repeated fill at the same point idempotent.
pub fn flood_fill(
    image: &mut ImageData,
    start_x: u32,
    start_y: u32,
    fill_color: RGBA8,
    options: &FillOptions,
) {
    let w = image.width as usize;
    let h = image.height as usize;
    if w == 0 || h == 0 {
        return;
    }
    let sx = start_x as usize;
    let sy = start_y as usize;
    if sx >= w || sy >= h {
        return;
    }

    let seed = image.pixels[sy * w + sx];
    if options.preserve_outline && is_outline(&seed, options.outline_threshold) {
        return;
    }
    if seed == fill_color {
        return;
    }

    let mut visited = vec![false; w * h];
    let mut stack: Vec<(usize, usize)> = vec![(sx, sy)];

    while let Some((x, y)) = stack.pop() {
        let idx = y * w + x;
        if visited[idx] || !fillable(&image.pixels[idx], &seed, options) {
            continue;
        }

        // Grow the span along this scanline
        let row = y * w;
        let mut x0 = x;
        while x0 > 0 && !visited[row + x0 - 1] && fillable(&image.pixels[row + x0 - 1], &seed, options)
        {
            x0 -= 1;
        }
        let mut x1 = x;
        while x1 + 1 < w
            && !visited[row + x1 + 1]
            && fillable(&image.pixels[row + x1 + 1], &seed, options)
        {
            x1 += 1;
        }

        // Fill it, seeding the rows above and below once per contiguous run
        let mut above_run = false;
        let mut below_run = false;
        for cx in x0..=x1 {
            let ci = row + cx;
            visited[ci] = true;
            image.pixels[ci] = fill_color;

            if y > 0 {
                let ai = ci - w;
                if !visited[ai] && fillable(&image.pixels[ai], &seed, options) {
                    if !above_run {
                        stack.push((cx, y - 1));
                        above_run = true;
                    }
                } else {
                    above_run = false;
                }
            }
            if y + 1 < h {
                let bi = ci + w;
                if !visited[bi] && fillable(&image.pixels[bi], &seed, options) {
                    if !below_run {
                        stack.push((cx, y + 1));
                        below_run = true;
                    }
                } else {
                    below_run = false;
                }
            }
        }
    }
}
