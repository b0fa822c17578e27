//! Error types for the paintnum library

use thiserror::Error;

/// Result type alias for paintnum operations
pub type Result<T> = std::result::Result<T, PaintError>;

/// Error taxonomy for template generation and game persistence.
///
/// Engine-internal consistency violations (a filled region referencing an
/// unknown id, a remaining count that would underflow) are deliberately not
/// represented here: they are clamped and logged so that saved progress
/// never becomes unloadable.
#[derive(Error, Debug)]
pub enum PaintError {
    /// Malformed input to a public operation; surfaced immediately,
    /// never retried.
    #[error("Invalid parameter: {parameter} = {value}")]
    Validation { parameter: String, value: String },

    /// Quantization could not produce any palette (degenerate image).
    #[error("Color extraction failed: {reason}")]
    ColorExtraction { reason: String },

    /// Contour tracing failed (corrupt mask, unusable traced output).
    #[error("Region tracing failed: {reason}")]
    Trace { reason: String },

    /// Storage unavailable, quota exceeded, or a write conflict.
    /// Never corrupts in-memory state; callers may retry.
    #[error("Persistence error: {reason}")]
    Persistence { reason: String },

    /// Input bytes could not be decoded as an image.
    #[error("Failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

impl PaintError {
    pub fn validation(parameter: impl Into<String>, value: impl ToString) -> Self {
        PaintError::Validation {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    pub fn color_extraction(reason: impl Into<String>) -> Self {
        PaintError::ColorExtraction {
            reason: reason.into(),
        }
    }

    pub fn trace(reason: impl Into<String>) -> Self {
        PaintError::Trace {
            reason: reason.into(),
        }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        PaintError::Persistence {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = PaintError::validation("colorCount", 42);
        assert_eq!(err.to_string(), "Invalid parameter: colorCount = 42");
    }

    #[test]
    fn test_persistence_message() {
        let err = PaintError::persistence("store offline");
        assert!(err.to_string().contains("store offline"));
    }
}
