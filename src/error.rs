//! Crate error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisionError {
    /// Non-finite geometry reached the caster; the source is skipped this frame
    #[error("invalid geometry: {what} is not finite ({value})")]
    InvalidGeometry { what: &'static str, value: f64 },

    #[error("failed to parse settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VisionError>;

/// Reject non-finite numbers with an `InvalidGeometry` error
pub(crate) fn ensure_finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VisionError::InvalidGeometry { what, value })
    }
}
