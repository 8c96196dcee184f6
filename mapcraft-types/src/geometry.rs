//! Geometry containers generic over the point type.

use serde::{Deserialize, Serialize};

use crate::geo::Projection;

/// Sequence of points, either open (a line) or closed (a ring).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour<P> {
    points: Vec<P>,
    is_closed: bool,
}

impl<P> Contour<P> {
    /// Creates a new contour.
    pub fn new(points: Vec<P>, is_closed: bool) -> Self {
        Self { points, is_closed }
    }

    /// Creates an open contour (a line).
    pub fn open(points: Vec<P>) -> Self {
        Self::new(points, false)
    }

    /// Creates a closed contour (a ring).
    pub fn closed(points: Vec<P>) -> Self {
        Self::new(points, true)
    }

    /// Points of the contour. For closed contours the first point is not repeated at the end.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Whether the last point connects back to the first one.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Iterates over the points of the contour.
    pub fn iter_points(&self) -> impl Iterator<Item = &P> + '_ {
        self.points.iter()
    }

    /// Projects every point of the contour. Returns `None` if any of the points cannot be
    /// projected.
    pub fn project<Proj>(&self, projection: &Proj) -> Option<Contour<Proj::OutPoint>>
    where
        Proj: Projection<InPoint = P> + ?Sized,
    {
        Some(Contour {
            points: self
                .points
                .iter()
                .map(|p| projection.project(p))
                .collect::<Option<Vec<_>>>()?,
            is_closed: self.is_closed,
        })
    }
}

/// Polygon with an outer ring and optional holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon<P> {
    outer_contour: Contour<P>,
    inner_contours: Vec<Contour<P>>,
}

impl<P> Polygon<P> {
    /// Creates a new polygon. All rings are treated as closed.
    pub fn new(outer: Vec<P>, inner: Vec<Vec<P>>) -> Self {
        Self {
            outer_contour: Contour::closed(outer),
            inner_contours: inner.into_iter().map(Contour::closed).collect(),
        }
    }

    /// Outer ring.
    pub fn outer_contour(&self) -> &Contour<P> {
        &self.outer_contour
    }

    /// Holes of the polygon.
    pub fn inner_contours(&self) -> &[Contour<P>] {
        &self.inner_contours
    }

    /// Iterates over the outer ring followed by the holes.
    pub fn iter_contours(&self) -> impl Iterator<Item = &Contour<P>> + '_ {
        std::iter::once(&self.outer_contour).chain(self.inner_contours.iter())
    }

    /// Projects every ring of the polygon.
    pub fn project<Proj>(&self, projection: &Proj) -> Option<Polygon<Proj::OutPoint>>
    where
        Proj: Projection<InPoint = P> + ?Sized,
    {
        Some(Polygon {
            outer_contour: self.outer_contour.project(projection)?,
            inner_contours: self
                .inner_contours
                .iter()
                .map(|c| c.project(projection))
                .collect::<Option<Vec<_>>>()?,
        })
    }
}

/// Any of the supported geometries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geom<P> {
    /// Single point.
    Point(P),
    /// Line or ring.
    Contour(Contour<P>),
    /// Polygon.
    Polygon(Polygon<P>),
}

impl<P> Geom<P> {
    /// Projects the geometry. Returns `None` if any of its points cannot be projected.
    pub fn project<Proj>(&self, projection: &Proj) -> Option<Geom<Proj::OutPoint>>
    where
        Proj: Projection<InPoint = P> + ?Sized,
    {
        Some(match self {
            Geom::Point(p) => Geom::Point(projection.project(p)?),
            Geom::Contour(c) => Geom::Contour(c.project(projection)?),
            Geom::Polygon(p) => Geom::Polygon(p.project(projection)?),
        })
    }

    /// Iterates over all points of the geometry.
    pub fn iter_points(&self) -> Box<dyn Iterator<Item = &P> + '_> {
        match self {
            Geom::Point(p) => Box::new(std::iter::once(p)),
            Geom::Contour(c) => Box::new(c.iter_points()),
            Geom::Polygon(p) => Box::new(p.iter_contours().flat_map(|c| c.iter_points())),
        }
    }
}

impl<P> From<Contour<P>> for Geom<P> {
    fn from(value: Contour<P>) -> Self {
        Self::Contour(value)
    }
}

impl<P> From<Polygon<P>> for Geom<P> {
    fn from(value: Polygon<P>) -> Self {
        Self::Polygon(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartesian::Point2d;
    use crate::geo::projection::Equirectangular;
    use crate::geo::GeoPoint2d;
    use crate::latlon;

    #[test]
    fn polygon_iterates_all_rings() {
        let polygon = Polygon::new(
            vec![latlon!(0.0, 0.0), latlon!(0.0, 10.0), latlon!(10.0, 10.0)],
            vec![vec![latlon!(1.0, 1.0), latlon!(1.0, 2.0), latlon!(2.0, 2.0)]],
        );
        let geom = Geom::from(polygon);
        assert_eq!(geom.iter_points().count(), 6);
    }

    #[test]
    fn projection_keeps_structure() {
        let line = Geom::Contour(Contour::open(vec![latlon!(0.0, 0.0), latlon!(1.0, 1.0)]));
        let projection = Equirectangular::<GeoPoint2d, Point2d>::default();
        let projected = line.project(&projection).expect("finite");
        match projected {
            Geom::Contour(c) => {
                assert_eq!(c.points().len(), 2);
                assert!(!c.is_closed());
            }
            _ => panic!("geometry kind changed"),
        }
    }
}
