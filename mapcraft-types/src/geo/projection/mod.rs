//! Implementations for the projections supported by mapcraft.

mod affine;
mod equirectangular;
mod web_mercator;

pub use affine::AffineProjection;
pub use equirectangular::Equirectangular;
pub use web_mercator::{WebMercator, MAX_MERCATOR_LAT};

/// Projection converts points from one coordinate system into another.
pub trait Projection {
    /// Type of the input point.
    type InPoint;
    /// Type of the output point.
    type OutPoint;

    /// Projects the point. Returns `None` if the point cannot be represented in the output
    /// coordinate system.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;
    /// Inverse of [`Projection::project`].
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}
