//! Colorable-region tracing for template generation.
//!
//! For each palette color (in palette order, establishing
//! `color_number = index + 1`) a binary mask is built where a pixel is on
//! iff its nearest palette color is that color. Marching squares traces the
//! mask into closed contours; each contour that survives the noise filter
//! becomes one fillable `Region` with a label anchored at the center of its
//! bounding box.

use crate::color_quantizer::nearest_palette_index;
use crate::error::{PaintError, Result};
use crate::image_processor::ImageData;
use crate::svg_generator::create_subpath_string;
use crate::template::{Region, ViewBox};
use rayon::prelude::*;
use rgb::RGBA8;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Minimum contour area in pixels — smaller contours are discarded as
    /// noise.
    pub turd_size: f64,
    /// Curve simplification aggressiveness, 0 = exact, 1 = very simplified.
    pub opt_tolerance: f64,
    /// Binarization cutoff on normalized alpha. The color mask is already
    /// binary, so this only drops translucent pixels.
    pub threshold: f64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            turd_size: 100.0,
            opt_tolerance: 0.4,
            threshold: 0.5,
        }
    }
}

/// Traced template geometry: the viewBox and one region per retained
/// contour. `regions.len()` equals the total number of retained contours
/// across all colors, and every `color_number` is in
/// `[1, palette.len()]`.
#[derive(Debug, Clone)]
pub struct SvgTemplate {
    pub view_box: ViewBox,
    pub width: u32,
    pub height: u32,
    pub regions: Vec<Region>,
}

pub fn trace_regions(
    image: &ImageData,
    palette: &[RGBA8],
    options: &TraceOptions,
) -> Result<SvgTemplate> {
    if palette.is_empty() {
        return Err(PaintError::trace("empty palette"));
    }
    let width = image.width as usize;
    let height = image.height as usize;
    if width == 0 || height == 0 {
        return Err(PaintError::trace("empty image"));
    }

    let alpha_cutoff = (options.threshold.clamp(0.0, 1.0) * 255.0) as u8;

    // Assign every pixel its nearest palette index once; translucent pixels
    // belong to no color.
    let indices: Vec<Option<usize>> = image
        .pixels
        .iter()
        .map(|p| {
            if p.a >= alpha_cutoff {
                Some(nearest_palette_index(p, palette))
            } else {
                None
            }
        })
        .collect();

    // Per-color tracing is independent, fan out across colors.
    let per_color: Vec<Vec<Region>> = (0..palette.len())
        .into_par_iter()
        .map(|color_idx| trace_color(color_idx, &indices, width, height, options))
        .collect();

    let regions: Vec<Region> = per_color.into_iter().flatten().collect();

    Ok(SvgTemplate {
        view_box: ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: width as f64,
            height: height as f64,
        },
        width: image.width,
        height: image.height,
        regions,
    })
}

fn trace_color(
    color_idx: usize,
    indices: &[Option<usize>],
    width: usize,
    height: usize,
    options: &TraceOptions,
) -> Vec<Region> {
    let mut mask = vec![false; width * height];
    let mut any = false;
    for (m, idx) in mask.iter_mut().zip(indices.iter()) {
        if *idx == Some(color_idx) {
            *m = true;
            any = true;
        }
    }
    if !any {
        return Vec::new();
    }

    let color_number = (color_idx + 1) as u32;
    let epsilon = 0.5 + options.opt_tolerance.clamp(0.0, 1.0) * 3.5;
    let w = width as f64;
    let h = height as f64;

    let contours = marching_squares_contours(&mask, width, height);
    let mut regions = Vec::new();

    for contour in contours {
        if contour.len() < 4 {
            continue;
        }
        if polygon_area(&contour) < options.turd_size {
            continue;
        }

        let smoothed = smooth_boundary(&contour);
        let simplified = rdp_simplify(&smoothed, epsilon);

        // Snap points near image edges back onto the boundary after
        // smoothing/simplification, so smoothing can't pull edge contours
        // away from the frame.
        let snap = 2.0;
        let mut snapped: Vec<Point> = simplified
            .into_iter()
            .map(|p| Point {
                x: if p.x < snap {
                    0.0
                } else if p.x > w - snap {
                    w
                } else {
                    p.x
                },
                y: if p.y < snap {
                    0.0
                } else if p.y > h - snap {
                    h
                } else {
                    p.y
                },
            })
            .collect();
        snapped.dedup_by(|a, b| (a.x - b.x).abs() < 0.1 && (a.y - b.y).abs() < 0.1);

        // Snapping can collapse thin slivers to nothing, re-check
        if snapped.len() < 3 || polygon_area(&snapped) < options.turd_size {
            continue;
        }

        let (label_x, label_y) = label_anchor(&snapped, w, h);
        let contour_index = regions.len();
        regions.push(Region {
            id: format!("region-{}-{}", color_number, contour_index),
            color_number,
            path: create_subpath_string(&snapped, true),
            label_x,
            label_y,
        });
    }

    regions
}

/// Label anchor is the center of the contour's bounding box — simpler than
/// a geometric centroid and close enough for label placement even on
/// concave shapes. Degenerate contours anchor at the image center.
fn label_anchor(points: &[Point], width: f64, height: f64) -> (f64, f64) {
    if points.len() < 2 {
        return (width / 2.0, height / 2.0);
    }
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}

/// Marching squares contour tracing on a binary mask.
///
/// The mask is padded with one cell of "outside" on every side so contours
/// touching the image edge still close. Corner (gx, gy) of the sample grid
/// is inside iff pixel (gx-1, gy-1) exists and is set; emitted points are
/// edge midpoints converted back to pixel coordinates and clamped to the
/// image bounds.
pub(crate) fn marching_squares_contours(
    mask: &[bool],
    width: usize,
    height: usize,
) -> Vec<Vec<Point>> {
    let grid_w = width + 2;
    let grid_h = height + 2;

    let corner_inside = |gx: usize, gy: usize| -> bool {
        if gx == 0 || gy == 0 || gx > width || gy > height {
            return false;
        }
        mask[(gy - 1) * width + (gx - 1)]
    };

    let cell_case = |cx: usize, cy: usize| -> u8 {
        let tl = corner_inside(cx, cy) as u8;
        let tr = corner_inside(cx + 1, cy) as u8;
        let br = corner_inside(cx + 1, cy + 1) as u8;
        let bl = corner_inside(cx, cy + 1) as u8;
        (tl << 3) | (tr << 2) | (br << 1) | bl
    };

    let w = width as f64;
    let h = height as f64;
    // Sides: 0=top, 1=right, 2=bottom, 3=left. Grid coords carry a +1
    // padding offset and the midpoint adds 0.5, so pixel space is the raw
    // grid midpoint minus 0.5.
    let edge_point = move |cx: usize, cy: usize, side: u8| -> Point {
        let (x, y) = match side {
            0 => (cx as f64 + 0.5, cy as f64),
            1 => ((cx + 1) as f64, cy as f64 + 0.5),
            2 => (cx as f64 + 0.5, (cy + 1) as f64),
            3 => (cx as f64, cy as f64 + 0.5),
            _ => unreachable!(),
        };
        Point {
            x: (x - 0.5).clamp(0.0, w),
            y: (y - 0.5).clamp(0.0, h),
        }
    };

    // Segment table: (entry_side, exit_side) pairs per cell case.
    let case_edges = |case: u8| -> Vec<(u8, u8)> {
        match case {
            0 | 15 => vec![],
            1 => vec![(2, 3)],
            2 => vec![(1, 2)],
            3 => vec![(1, 3)],
            4 => vec![(0, 1)],
            5 => vec![(0, 1), (2, 3)], // saddle
            6 => vec![(0, 2)],
            7 => vec![(0, 3)],
            8 => vec![(3, 0)],
            9 => vec![(2, 0)],
            10 => vec![(3, 0), (1, 2)], // saddle
            11 => vec![(1, 0)],
            12 => vec![(3, 1)],
            13 => vec![(2, 1)],
            14 => vec![(3, 2)],
            _ => vec![],
        }
    };

    let opposite_side = |side: u8| -> u8 {
        match side {
            0 => 2,
            1 => 3,
            2 => 0,
            3 => 1,
            _ => unreachable!(),
        }
    };

    let neighbor_cell = move |cx: usize, cy: usize, side: u8| -> Option<(usize, usize)> {
        match side {
            0 if cy > 0 => Some((cx, cy - 1)),
            1 if cx + 1 < grid_w => Some((cx + 1, cy)),
            2 if cy + 1 < grid_h => Some((cx, cy + 1)),
            3 if cx > 0 => Some((cx - 1, cy)),
            _ => None,
        }
    };

    let mut edge_visited: HashMap<(usize, usize, u8), bool> = HashMap::new();
    let mut contours = Vec::new();

    for cy in 0..grid_h {
        for cx in 0..grid_w {
            let edges = case_edges(cell_case(cx, cy));

            for &(entry, exit) in &edges {
                if edge_visited.contains_key(&(cx, cy, entry)) {
                    continue;
                }

                // Chain cell to cell through shared edges until the loop
                // closes or the walk dead-ends.
                let mut contour = Vec::new();
                let mut cur_cx = cx;
                let mut cur_cy = cy;
                let mut cur_entry = entry;
                let mut cur_exit = exit;
                let start_key = (cx, cy, entry);

                loop {
                    edge_visited.insert((cur_cx, cur_cy, cur_entry), true);
                    edge_visited.insert((cur_cx, cur_cy, cur_exit), true);
                    contour.push(edge_point(cur_cx, cur_cy, cur_exit));

                    let next_entry_side = opposite_side(cur_exit);
                    let next_cell = neighbor_cell(cur_cx, cur_cy, cur_exit);

                    if let Some((ncx, ncy)) = next_cell {
                        let nedges = case_edges(cell_case(ncx, ncy));
                        if let Some(&(ne, nx)) =
                            nedges.iter().find(|&&(e, _)| e == next_entry_side)
                        {
                            if (ncx, ncy, ne) == start_key {
                                break; // closed
                            }
                            cur_cx = ncx;
                            cur_cy = ncy;
                            cur_entry = ne;
                            cur_exit = nx;
                        } else {
                            break; // dead end
                        }
                    } else {
                        break; // left the padded grid
                    }
                }

                if contour.len() >= 3 {
                    contours.push(contour);
                }
            }
        }
    }

    contours
}

/// Unsigned polygon area (shoelace formula).
pub(crate) fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area.abs() / 2.0
}

/// One pass of neighbor-weighted smoothing over a closed boundary.
/// Point count is preserved; marching-squares staircase artifacts relax
/// into the curve the region actually follows.
fn smooth_boundary(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut smoothed = Vec::with_capacity(n);
    for i in 0..n {
        let prev = &points[(i + n - 1) % n];
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        smoothed.push(Point {
            x: 0.25 * prev.x + 0.5 * curr.x + 0.25 * next.x,
            y: 0.25 * prev.y + 0.5 * curr.y + 0.25 * next.y,
        });
    }
    smoothed
}

/// Ramer-Douglas-Peucker path simplification.
fn rdp_simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut max_dist = 0.0;
    let mut max_idx = 0;
    let first = &points[0];
    let last = &points[points.len() - 1];

    for (i, p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = point_to_line_distance(p, first, last);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        let mut left = rdp_simplify(&points[..=max_idx], epsilon);
        let right = rdp_simplify(&points[max_idx..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![*first, *last]
    }
}

fn point_to_line_distance(point: &Point, line_start: &Point, line_end: &Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-10 {
        return ((point.x - line_start.x).powi(2) + (point.y - line_start.y).powi(2)).sqrt();
    }

    let t = (((point.x - line_start.x) * dx + (point.y - line_start.y) * dy) / len_sq)
        .clamp(0.0, 1.0);

    let proj_x = line_start.x + t * dx;
    let proj_y = line_start.y + t * dy;

    ((point.x - proj_x).powi(2) + (point.y - proj_y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    include!("region_tracer_tests.rs");
}
