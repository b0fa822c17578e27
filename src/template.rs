//! Template content model.
//!
//! A template is the immutable definition of one puzzle: the palette of
//! numbered colors and the set of fillable regions in viewBox coordinates.
//! Templates are produced by the generation pipeline (or authored by hand),
//! serialized as JSON, and read-only at game time.

use crate::error::{PaintError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Allowed palette sizes for a generation request at this difficulty.
    pub fn color_range(self) -> (usize, usize) {
        match self {
            Difficulty::Easy => (5, 10),
            Difficulty::Medium => (10, 20),
            Difficulty::Hard => (20, 30),
        }
    }

    /// Minimum traced contour area in pixels (noise suppression). Easier
    /// puzzles get bigger, fewer regions.
    pub fn turd_size(self) -> f64 {
        match self {
            Difficulty::Easy => 200.0,
            Difficulty::Medium => 100.0,
            Difficulty::Hard => 50.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = PaintError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(PaintError::validation("difficulty", other)),
        }
    }
}

/// One palette entry: the number printed in regions, the color it stands
/// for, and how many regions carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteColor {
    pub number: u32,
    pub hex: String,
    pub name: String,
    pub total_regions: u32,
}

/// One fillable shape. Never mutated after template creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    /// The correct answer for this region.
    pub color_number: u32,
    /// Vector path data in the template's coordinate space.
    pub path: String,
    pub label_x: f64,
    pub label_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for ViewBox {
    /// SVG `viewBox` attribute form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
    pub view_box: ViewBox,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub title: String,
    pub category_id: String,
    pub difficulty: Difficulty,
    pub color_count: u32,
    pub region_count: u32,
    /// Rough play time in minutes, derived from region count.
    pub estimated_time: u32,
    pub color_palette: Vec<PaletteColor>,
    pub template_data: TemplateData,
}

impl Template {
    /// Check the structural invariants: region count, palette number
    /// uniqueness, region→palette references, and per-color totals.
    pub fn validate(&self) -> Result<()> {
        if self.region_count as usize != self.template_data.regions.len() {
            return Err(PaintError::validation(
                "regionCount",
                format!(
                    "{} (template has {} regions)",
                    self.region_count,
                    self.template_data.regions.len()
                ),
            ));
        }

        let mut numbers = HashSet::new();
        for entry in &self.color_palette {
            if entry.number == 0 || !numbers.insert(entry.number) {
                return Err(PaintError::validation("colorPalette.number", entry.number));
            }
        }

        let mut per_color: HashMap<u32, u32> = HashMap::new();
        for region in &self.template_data.regions {
            if !numbers.contains(&region.color_number) {
                return Err(PaintError::validation(
                    "region.colorNumber",
                    format!("{} ({})", region.color_number, region.id),
                ));
            }
            *per_color.entry(region.color_number).or_insert(0) += 1;
        }

        for entry in &self.color_palette {
            let actual = per_color.get(&entry.number).copied().unwrap_or(0);
            if actual != entry.total_regions {
                return Err(PaintError::validation(
                    "colorPalette.totalRegions",
                    format!(
                        "color {} declares {} regions, template has {}",
                        entry.number, entry.total_regions, actual
                    ),
                ));
            }
        }

        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.template_data.regions.iter().find(|r| r.id == id)
    }

    /// The template's true answer for a region.
    pub fn correct_color(&self, region_id: &str) -> Option<u32> {
        self.region(region_id).map(|r| r.color_number)
    }

    pub fn palette_color(&self, number: u32) -> Option<&PaletteColor> {
        self.color_palette.iter().find(|c| c.number == number)
    }
}
