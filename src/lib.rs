//! paintnum - a paint-by-numbers template generator and coloring engine
//!
//! This library covers both halves of a digital paint-by-numbers app:
//!
//! - **Template generation** (admin-side): reduce a raster image to a
//!   numbered color palette, trace each color into closed vector regions,
//!   and assemble a playable [`template::Template`].
//! - **Play session** (runtime): the [`game::GameEngine`] region-fill
//!   state machine with progress, hints, completion detection and
//!   persistence, plus a tolerance-based [`flood_fill`] backend for the
//!   freehand canvas variant and a bounded [`history::HistoryManager`]
//!   for its undo/redo.
//!
//! ## Generating a template
//!
//! ```rust,no_run
//! use paintnum::{generate_template_from_path, Difficulty};
//! use std::path::Path;
//!
//! let outcome = generate_template_from_path(
//!     Path::new("apple.png"),
//!     8,
//!     Difficulty::Easy,
//!     0.2,
//! )?;
//! let template = outcome
//!     .to_template("apple", "Apple", "fruit", Difficulty::Easy)
//!     .expect("tracing produced regions");
//! # Ok::<(), paintnum::PaintError>(())
//! ```
//!
//! ## Playing
//!
//! ```rust,ignore
//! let mut engine = GameEngine::with_system_clock();
//! engine.start_game(template);
//! engine.fill_region("region-1-0", 1);
//! engine.save_progress(&mut gateway)?;
//! ```

pub mod color_quantizer;
pub mod error;
pub mod flood_fill;
pub mod game;
pub mod geometry;
pub mod history;
pub mod image_processor;
pub mod persistence;
pub mod preprocessor;
pub mod region_tracer;
pub mod svg_generator;
pub mod template;
pub mod template_builder;

pub use error::{PaintError, Result};
pub use game::{FillOutcome, GameEngine};
pub use template::{Difficulty, Template};
pub use template_builder::{GenerationOutcome, GenerationRequest, generate_template};

/// Generate a template directly from an image file on disk.
pub fn generate_template_from_path(
    input: &std::path::Path,
    color_count: usize,
    difficulty: Difficulty,
    smoothing: f32,
) -> Result<GenerationOutcome> {
    let bytes =
        std::fs::read(input).map_err(|e| PaintError::validation("input", e.to_string()))?;
    generate_template(&GenerationRequest {
        image_bytes: &bytes,
        color_count,
        difficulty,
        smoothing,
    })
}
