#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::template::{Difficulty, PaletteColor, Region, Template, TemplateData, ViewBox};

    fn sample_template() -> Template {
        Template {
            id: "sample".into(),
            title: "Sample".into(),
            category_id: "test".into(),
            difficulty: Difficulty::Easy,
            color_count: 2,
            region_count: 2,
            estimated_time: 5,
            color_palette: vec![
                PaletteColor {
                    number: 1,
                    hex: "#cc2222".into(),
                    name: "Red".into(),
                    total_regions: 1,
                },
                PaletteColor {
                    number: 2,
                    hex: "#2222cc".into(),
                    name: "Blue".into(),
                    total_regions: 1,
                },
            ],
            template_data: TemplateData {
                view_box: ViewBox {
                    min_x: 0.0,
                    min_y: 0.0,
                    width: 100.0,
                    height: 100.0,
                },
                regions: vec![
                    Region {
                        id: "region-1-0".into(),
                        color_number: 1,
                        path: "M0 0L50 0L50 100L0 100Z".into(),
                        label_x: 25.0,
                        label_y: 50.0,
                    },
                    Region {
                        id: "region-2-0".into(),
                        color_number: 2,
                        path: "M50 0L100 0L100 100L50 100Z".into(),
                        label_x: 75.0,
                        label_y: 50.0,
                    },
                ],
            },
        }
    }

    #[test]
    fn test_fmt_coord_snaps_to_half_grid() {
        assert_eq!(fmt_coord(3.0), "3");
        assert_eq!(fmt_coord(3.5), "3.5");
        assert_eq!(fmt_coord(3.1), "3");
        assert_eq!(fmt_coord(3.26), "3.5");
        assert_eq!(fmt_coord(-2.0), "-2");
    }

    #[test]
    fn test_create_subpath_string() {
        let pts = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 10.0, y: 0.0 },
            Point { x: 10.0, y: 10.0 },
        ];
        assert_eq!(create_subpath_string(&pts, true), "M0 0L10 0L10 10Z");
        assert_eq!(create_subpath_string(&pts, false), "M0 0L10 0L10 10");
        assert_eq!(create_subpath_string(&[], true), "");
    }

    #[test]
    fn test_render_template_svg_structure() {
        let svg = render_template_svg(&sample_template());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("viewBox=\"0 0 100 100\""));
        assert!(svg.contains("<rect"));
        // Both regions drawn as white outlines with their numbers
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(svg.matches("<text").count(), 2);
        assert!(svg.contains(">1</text>"));
        assert!(svg.contains(">2</text>"));
    }

    #[test]
    fn test_render_progress_svg_fills_correct_regions() {
        let template = sample_template();
        let mut filled = HashMap::new();
        filled.insert(
            "region-1-0".to_string(),
            FilledRegion {
                region_id: "region-1-0".into(),
                color_number: 1,
                is_correct: true,
                filled_at: 1,
            },
        );

        let svg = render_progress_svg(&template, &filled);
        // Filled region painted with its palette color, no label
        assert!(svg.contains("fill=\"#cc2222\""));
        // Unfilled region keeps its number
        assert_eq!(svg.matches("<text").count(), 1);
        assert!(svg.contains(">2</text>"));
    }

    #[test]
    fn test_render_progress_svg_ignores_incorrect_fills() {
        let template = sample_template();
        let mut filled = HashMap::new();
        filled.insert(
            "region-1-0".to_string(),
            FilledRegion {
                region_id: "region-1-0".into(),
                color_number: 2,
                is_correct: false,
                filled_at: 1,
            },
        );

        let svg = render_progress_svg(&template, &filled);
        assert!(!svg.contains("fill=\"#cc2222\""));
        assert_eq!(svg.matches("<text").count(), 2);
    }

    #[test]
    fn test_svg_data_url_prefix() {
        let url = svg_data_url("<svg></svg>");
        assert!(url.starts_with("data:image/svg+xml;base64,"));
        assert!(url.len() > "data:image/svg+xml;base64,".len());
    }
}
