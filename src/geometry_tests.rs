#[cfg(test)]
mod tests {
    use super::super::*;

    fn vb(width: f64, height: f64) -> ViewBox {
        ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width,
            height,
        }
    }

    fn circle_path(cx: f64, cy: f64, r: f64, segments: usize) -> String {
        let mut path = String::from("M");
        for i in 0..segments {
            let theta = i as f64 * std::f64::consts::TAU / segments as f64;
            let x = cx + r * theta.cos();
            let y = cy + r * theta.sin();
            if i == 0 {
                path.push_str(&format!("{:.2} {:.2}", x, y));
            } else {
                path.push_str(&format!("L{:.2} {:.2}", x, y));
            }
        }
        path.push('Z');
        path
    }

    #[test]
    fn test_bounding_box_and_complexity() {
        let m = analyze_path_data("M10 20L30 40L30 20Z").unwrap();
        assert_eq!(m.path_complexity, 3);
        assert_eq!(m.bounding_box.min_x, 10.0);
        assert_eq!(m.bounding_box.max_x, 30.0);
        assert_eq!(m.bounding_box.min_y, 20.0);
        assert_eq!(m.bounding_box.max_y, 40.0);
        assert_eq!(m.bounding_box.center(), (20.0, 30.0));
    }

    #[test]
    fn test_negative_and_packed_coordinates() {
        // "-10-20" must scan as two numbers
        let m = analyze_path_data("M-10-20L10 20").unwrap();
        assert_eq!(m.path_complexity, 2);
        assert_eq!(m.bounding_box.min_x, -10.0);
        assert_eq!(m.bounding_box.min_y, -20.0);
    }

    #[test]
    fn test_degenerate_paths_yield_none() {
        assert!(analyze_path_data("").is_none());
        assert!(analyze_path_data("M5 5").is_none());
        assert!(analyze_path_data("MZ").is_none());
    }

    #[test]
    fn test_circle_is_not_a_ring() {
        let path = circle_path(60.0, 60.0, 50.0, 36);
        let m = analyze_path_data(&path).unwrap();
        assert!(!m.is_ring_shape);
    }

    #[test]
    fn test_thin_band_is_a_ring() {
        // 200x4 band: perimeter²/area far above the circle baseline
        let m = analyze_path_data("M0 0L200 0L200 4L0 4Z").unwrap();
        assert!(m.is_ring_shape);
        assert!(m.estimated_thickness < 4.1, "thickness {}", m.estimated_thickness);
    }

    #[test]
    fn test_dense_small_contour_is_a_ring() {
        // Many points crowded into a small box trip the density signal
        let path = circle_path(10.0, 10.0, 8.0, 64);
        let m = analyze_path_data(&path).unwrap();
        assert!(m.is_ring_shape);
    }

    #[test]
    fn test_font_size_thin_band_minimal() {
        let size = calculate_font_size("M0 0L200 0L200 4L0 4Z", &vb(300.0, 300.0));
        assert_eq!(size, MIN_FONT_SIZE);
    }

    #[test]
    fn test_font_size_steps_with_relative_size() {
        let small = calculate_font_size("M0 0L30 0L30 30L0 30Z", &vb(300.0, 300.0));
        let large = calculate_font_size("M0 0L150 0L150 150L0 150Z", &vb(300.0, 300.0));
        assert!(small < large);
        assert_eq!(large, MAX_FONT_SIZE);
    }

    #[test]
    fn test_font_size_resolution_independent() {
        // Same region/viewBox proportion at two canvas scales
        let at_300 = calculate_font_size("M0 0L30 0L30 30L0 30Z", &vb(300.0, 300.0));
        let at_600 = calculate_font_size("M0 0L60 0L60 60L0 60Z", &vb(600.0, 600.0));
        assert_eq!(at_300, at_600);
    }

    #[test]
    fn test_font_size_always_in_bounds() {
        let paths = [
            "M0 0L1 0L1 1L0 1Z",
            "M0 0L300 0L300 300L0 300Z",
            "M0 0L200 0L200 4L0 4Z",
            "garbage",
        ];
        for p in &paths {
            let size = calculate_font_size(p, &vb(300.0, 300.0));
            assert!((MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size));
        }
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let path = circle_path(50.0, 50.0, 40.0, 24);
        assert_eq!(analyze_path_data(&path), analyze_path_data(&path));
    }
}
