use mapcraft_types::cartesian::Size;
use mapcraft_types::geo::GeoRect;

use crate::projector::ProjectionKind;

/// Visible area of a map: geographic bounding box, output size in pixels and the projection used
/// to place the box onto the image.
///
/// The bounding box is stretched to fill the whole output image.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    bbox: GeoRect,
    size: Size<u32>,
    projection: ProjectionKind,
}

impl Viewport {
    /// Creates a new viewport.
    pub fn new(bbox: GeoRect, size: Size<u32>, projection: ProjectionKind) -> Self {
        Self {
            bbox,
            size,
            projection,
        }
    }

    /// Geographic bounding box.
    pub fn bbox(&self) -> GeoRect {
        self.bbox
    }

    /// Output size in pixels.
    pub fn size(&self) -> Size<u32> {
        self.size
    }

    /// Projection of the viewport.
    pub fn projection(&self) -> &ProjectionKind {
        &self.projection
    }
}
