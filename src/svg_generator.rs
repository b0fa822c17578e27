//! Hand-written SVG output.
//!
//! Renders a template as a printable coloring sheet (white regions, outline
//! strokes, centered number labels) and renders in-progress artwork for
//! thumbnails. Also holds the compact path-string helpers used by the
//! tracer.

use crate::game::FilledRegion;
use crate::geometry::calculate_font_size;
use crate::region_tracer::Point;
use crate::template::Template;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;

/// Format a coordinate compactly: snap to a 0.5 grid, integer when whole.
pub fn fmt_coord(v: f64) -> String {
    let rounded = (v * 2.0).round() / 2.0;
    if (rounded - rounded.round()).abs() < 0.01 {
        format!("{}", rounded.round() as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

/// Convert a point list into an SVG subpath of line segments. Contour
/// tracing plus simplification already yields accurate outlines; line
/// segments keep the path data small and browsers anti-alias them smoothly.
pub fn create_subpath_string(pts: &[Point], closed: bool) -> String {
    let n = pts.len();
    if n == 0 {
        return String::new();
    }

    let mut path = format!("M{} {}", fmt_coord(pts[0].x), fmt_coord(pts[0].y));
    for p in pts.iter().skip(1) {
        path.push_str(&format!("L{} {}", fmt_coord(p.x), fmt_coord(p.y)));
    }
    if closed {
        path.push('Z');
    }

    path
}

/// Render the printable sheet: every region white with an outline stroke
/// and its color number centered at the label anchor.
pub fn render_template_svg(template: &Template) -> String {
    let vb = &template.template_data.view_box;
    let mut svg = String::with_capacity(256 + template.template_data.regions.len() * 160);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{}\">\n",
        vb
    ));
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#ffffff\"/>\n",
        vb.min_x, vb.min_y, vb.width, vb.height
    ));

    for region in &template.template_data.regions {
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"#ffffff\" stroke=\"#333333\" stroke-width=\"1\"/>\n",
            region.path
        ));
    }

    // Labels go on top so thin neighbors can't cover them
    for region in &template.template_data.regions {
        let font_size = calculate_font_size(&region.path, vb);
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"#666666\">{}</text>\n",
            fmt_coord(region.label_x),
            fmt_coord(region.label_y),
            font_size,
            region.color_number
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Render in-progress artwork: correctly filled regions take their palette
/// color, everything else stays a numbered outline. Used for save-time
/// thumbnails.
pub fn render_progress_svg(template: &Template, filled: &HashMap<String, FilledRegion>) -> String {
    let vb = &template.template_data.view_box;
    let mut svg = String::with_capacity(256 + template.template_data.regions.len() * 160);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{}\">\n",
        vb
    ));
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#ffffff\"/>\n",
        vb.min_x, vb.min_y, vb.width, vb.height
    ));

    for region in &template.template_data.regions {
        let correct_fill = filled
            .get(&region.id)
            .filter(|f| f.is_correct)
            .and_then(|_| template.palette_color(region.color_number));

        match correct_fill {
            Some(palette) => {
                svg.push_str(&format!(
                    "  <path d=\"{}\" fill=\"{}\" stroke=\"#333333\" stroke-width=\"0.5\"/>\n",
                    region.path, palette.hex
                ));
            }
            None => {
                let font_size = calculate_font_size(&region.path, vb);
                svg.push_str(&format!(
                    "  <path d=\"{}\" fill=\"#ffffff\" stroke=\"#333333\" stroke-width=\"1\"/>\n",
                    region.path
                ));
                svg.push_str(&format!(
                    "  <text x=\"{}\" y=\"{}\" font-size=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"#666666\">{}</text>\n",
                    fmt_coord(region.label_x),
                    fmt_coord(region.label_y),
                    font_size,
                    region.color_number
                ));
            }
        }
    }

    svg.push_str("</svg>");
    svg
}

/// Wrap an SVG document in a base64 data URL.
pub fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", BASE64.encode(svg.as_bytes()))
}

#[cfg(test)]
mod tests {
    include!("svg_generator_tests.rs");
}
