//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapcraftTypesError {
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
    /// Projection cannot be constructed with the given parameters.
    #[error("invalid projection parameters: {0}")]
    Projection(String),
}
