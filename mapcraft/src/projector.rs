//! Conversion of geographic coordinates into pixel coordinates of the output image.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mapcraft_types::cartesian::{Point2d, Rect};
use mapcraft_types::geo::projection::{AffineProjection, Equirectangular, WebMercator};
use mapcraft_types::geo::{GeoPoint2d, Projection};
use serde::{Deserialize, Serialize};

use crate::error::MapcraftError;
use crate::viewport::Viewport;

/// Position on the output image, in pixels from the top-left corner. Can be outside of the image.
pub type PixelCoordinate = Point2d;

/// Supported projections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionKind {
    /// Spherical (Web) Mercator. Latitudes are clamped to ±85.0511°.
    Mercator,
    /// Plate carrée: longitude and latitude are mapped linearly.
    Equirectangular,
    /// User-defined affine transform of longitude and latitude, see
    /// [`AffineProjection`](mapcraft_types::geo::projection::AffineProjection).
    Affine([f64; 6]),
}

impl FromStr for ProjectionKind {
    type Err = MapcraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mercator" | "web_mercator" | "webmercator" | "epsg:3857" => Ok(Self::Mercator),
            "equirectangular" | "plate_carree" | "epsg:4326" => Ok(Self::Equirectangular),
            _ => Err(MapcraftError::UnsupportedProjection(s.to_string())),
        }
    }
}

impl Display for ProjectionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionKind::Mercator => f.write_str("mercator"),
            ProjectionKind::Equirectangular => f.write_str("equirectangular"),
            ProjectionKind::Affine(c) => write!(f, "affine{c:?}"),
        }
    }
}

#[derive(Debug, Clone)]
enum WorldProjection {
    Mercator(WebMercator<GeoPoint2d, Point2d>),
    Equirectangular(Equirectangular<GeoPoint2d, Point2d>),
    Affine(AffineProjection<GeoPoint2d, Point2d>),
}

impl WorldProjection {
    fn new(kind: &ProjectionKind) -> Result<Self, MapcraftError> {
        Ok(match kind {
            ProjectionKind::Mercator => Self::Mercator(WebMercator::default()),
            ProjectionKind::Equirectangular => Self::Equirectangular(Equirectangular::default()),
            ProjectionKind::Affine(coefficients) => {
                Self::Affine(AffineProjection::from_coefficients(*coefficients)?)
            }
        })
    }

    fn inner(&self) -> &dyn Projection<InPoint = GeoPoint2d, OutPoint = Point2d> {
        match self {
            WorldProjection::Mercator(p) => p,
            WorldProjection::Equirectangular(p) => p,
            WorldProjection::Affine(p) => p,
        }
    }
}

/// Projects geographic points onto the pixel grid of a [`Viewport`].
///
/// The projector is created once per viewport and is immutable afterwards, so it can be shared
/// between threads. Projection is pure: the same input always gives the same output.
#[derive(Debug, Clone)]
pub struct Projector {
    projection: WorldProjection,
    viewport: Viewport,
    world_bounds: Rect,
    scale_x: f64,
    scale_y: f64,
}

impl Projector {
    /// Creates a projector for the viewport, using the viewport's projection.
    ///
    /// Fails with [`MapcraftError::UnsupportedProjection`] if the projection definition is invalid,
    /// and with [`MapcraftError::Configuration`] if the viewport's bounding box cannot be projected
    /// into a non-empty area.
    pub fn new(viewport: &Viewport) -> Result<Self, MapcraftError> {
        let kind = viewport.projection();
        let projection = WorldProjection::new(kind)?;

        let bbox = viewport.bbox();
        let corners = [
            bbox.south_west(),
            bbox.north_east(),
            mapcraft_types::latlon!(bbox.min_lat(), bbox.max_lon()),
            mapcraft_types::latlon!(bbox.max_lat(), bbox.min_lon()),
        ];
        let projected = corners
            .iter()
            .map(|p| projection.inner().project(p))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                MapcraftError::Configuration("viewport bounding box cannot be projected".into())
            })?;

        let world_bounds = Rect::from_points(projected.iter()).ok_or_else(|| {
            MapcraftError::Configuration("viewport bounding box cannot be projected".into())
        })?;

        if !(world_bounds.width() > 0.0 && world_bounds.height() > 0.0)
            || !world_bounds.width().is_finite()
            || !world_bounds.height().is_finite()
        {
            return Err(MapcraftError::Configuration(format!(
                "viewport bounding box is empty in {kind} projection"
            )));
        }

        let viewport = viewport.clone();
        let size = viewport.size();
        Ok(Self {
            projection,
            scale_x: size.width() as f64 / world_bounds.width(),
            scale_y: size.height() as f64 / world_bounds.height(),
            world_bounds,
            viewport,
        })
    }

    /// Viewport the projector was created for.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Projects a point onto the output image. Points outside of the viewport get coordinates
    /// outside of the image.
    ///
    /// Returns `None` only if the point has non-finite coordinates.
    pub fn project(&self, point: &GeoPoint2d) -> Option<PixelCoordinate> {
        let world = self.projection.inner().project(point)?;
        let x = (world.x - self.world_bounds.x_min()) * self.scale_x;
        let y = (self.world_bounds.y_max() - world.y) * self.scale_y;

        if x.is_finite() && y.is_finite() {
            Some(PixelCoordinate::new(x, y))
        } else {
            None
        }
    }

    /// Converts a pixel position back into geographic coordinates.
    ///
    /// Returns `None` if the viewport has zero size or the position has no geographic
    /// counterpart.
    pub fn unproject(&self, pixel: &PixelCoordinate) -> Option<GeoPoint2d> {
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return None;
        }

        let world = Point2d::new(
            self.world_bounds.x_min() + pixel.x / self.scale_x,
            self.world_bounds.y_max() - pixel.y / self.scale_y,
        );
        self.projection.inner().unproject(&world)
    }
}

impl Projection for Projector {
    type InPoint = GeoPoint2d;
    type OutPoint = PixelCoordinate;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        Projector::project(self, input)
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        Projector::unproject(self, input)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use mapcraft_types::cartesian::Size;
    use mapcraft_types::geo::{GeoPoint, GeoRect};
    use mapcraft_types::latlon;

    use super::*;

    fn viewport(kind: ProjectionKind) -> Viewport {
        Viewport::new(
            GeoRect::new(-10.0, -20.0, 10.0, 20.0).unwrap(),
            Size::new(400, 200),
            kind,
        )
    }

    #[test]
    fn parses_projection_names() {
        assert_eq!(
            "Mercator".parse::<ProjectionKind>().unwrap(),
            ProjectionKind::Mercator
        );
        assert_eq!(
            "equirectangular".parse::<ProjectionKind>().unwrap(),
            ProjectionKind::Equirectangular
        );
        assert_matches!(
            "robinson".parse::<ProjectionKind>(),
            Err(MapcraftError::UnsupportedProjection(name)) if name == "robinson"
        );
    }

    #[test]
    fn equirectangular_maps_corners() {
        let projector = Projector::new(&viewport(ProjectionKind::Equirectangular)).unwrap();

        let top_left = projector.project(&latlon!(10.0, -20.0)).unwrap();
        assert_abs_diff_eq!(top_left.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(top_left.y, 0.0, epsilon = 1e-9);

        let bottom_right = projector.project(&latlon!(-10.0, 20.0)).unwrap();
        assert_abs_diff_eq!(bottom_right.x, 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bottom_right.y, 200.0, epsilon = 1e-9);

        let center = projector.project(&latlon!(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(center.x, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(center.y, 100.0, epsilon = 1e-9);

        let outside = projector.project(&latlon!(0.0, 40.0)).unwrap();
        assert!(outside.x > 400.0);
    }

    #[test]
    fn mercator_is_deterministic_and_invertible() {
        let projector = Projector::new(&viewport(ProjectionKind::Mercator)).unwrap();
        let point = latlon!(5.5, 12.25);

        let first = projector.project(&point).unwrap();
        let second = projector.project(&point).unwrap();
        assert_eq!(first, second);

        let back = projector.unproject(&first).unwrap();
        assert_abs_diff_eq!(back.lat(), 5.5, epsilon = 1e-9);
        assert_abs_diff_eq!(back.lon(), 12.25, epsilon = 1e-9);
    }

    #[test]
    fn projection_follows_viewport() {
        let mercator = Projector::new(&viewport(ProjectionKind::Mercator)).unwrap();
        let plate = Projector::new(&viewport(ProjectionKind::Equirectangular)).unwrap();
        assert_eq!(mercator.viewport().projection(), &ProjectionKind::Mercator);
        assert_eq!(plate.viewport().projection(), &ProjectionKind::Equirectangular);

        let point = latlon!(5.0, 0.0);
        let y_mercator = mercator.project(&point).unwrap().y;
        let y_plate = plate.project(&point).unwrap().y;
        assert_abs_diff_eq!(y_plate, 50.0, epsilon = 1e-9);
        assert!((y_mercator - y_plate).abs() > 1e-3);
    }

    #[test]
    fn mercator_clamps_poles() {
        let world = Viewport::new(GeoRect::WORLD, Size::new(100, 100), ProjectionKind::Mercator);
        let projector = Projector::new(&world).unwrap();
        let pole = projector.project(&latlon!(90.0, 0.0)).unwrap();
        assert!(pole.y.is_finite());
        assert!(pole.y < 0.0);
    }

    #[test]
    fn affine_projection() {
        let kind = ProjectionKind::Affine([2.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let projector = Projector::new(&viewport(kind)).unwrap();
        let center = projector.project(&latlon!(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(center.x, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(center.y, 100.0, epsilon = 1e-9);

        let singular = ProjectionKind::Affine([1.0, 2.0, 0.0, 2.0, 4.0, 0.0]);
        assert_matches!(
            Projector::new(&viewport(singular)),
            Err(MapcraftError::UnsupportedProjection(_))
        );

        let infinite = ProjectionKind::Affine([f64::INFINITY, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_matches!(
            Projector::new(&viewport(infinite)),
            Err(MapcraftError::UnsupportedProjection(_))
        );
    }

    #[test]
    fn projection_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ProjectionKind::Mercator).unwrap(),
            "\"mercator\""
        );
        let affine: ProjectionKind =
            serde_json::from_str(r#"{"affine": [1, 0, 0, 0, 1, 0]}"#).unwrap();
        assert_eq!(affine, ProjectionKind::Affine([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]));
    }
}
