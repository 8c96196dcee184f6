use std::marker::PhantomData;

use nalgebra::{Matrix3, Point2};

use crate::cartesian::NewCartesianPoint2d;
use crate::error::MapcraftTypesError;
use crate::geo::point::NewGeoPoint;
use crate::geo::projection::Projection;

/// User-defined affine mapping of `(lon, lat)` in degrees onto the plane:
///
/// ```text
/// x = a * lon + b * lat + c
/// y = d * lon + e * lat + f
/// ```
///
/// The transform must be invertible, so the projection can be used in both directions.
#[derive(Debug, Copy, Clone)]
pub struct AffineProjection<In, Out> {
    forward: Matrix3<f64>,
    inverse: Matrix3<f64>,
    phantom_in: PhantomData<In>,
    phantom_out: PhantomData<Out>,
}

impl<In, Out> AffineProjection<In, Out> {
    /// Creates the projection from the six coefficients `[a, b, c, d, e, f]`.
    pub fn from_coefficients(coefficients: [f64; 6]) -> Result<Self, MapcraftTypesError> {
        if coefficients.iter().any(|v| !v.is_finite()) {
            return Err(MapcraftTypesError::Projection(
                "affine coefficients must be finite".into(),
            ));
        }

        let [a, b, c, d, e, f] = coefficients;
        let forward = Matrix3::new(a, b, c, d, e, f, 0.0, 0.0, 1.0);

        let determinant = a * e - b * d;
        if determinant.abs() < f64::EPSILON {
            return Err(MapcraftTypesError::Projection(
                "affine transform is not invertible".into(),
            ));
        }

        let inverse = forward.try_inverse().ok_or_else(|| {
            MapcraftTypesError::Projection("affine transform is not invertible".into())
        })?;

        Ok(Self {
            forward,
            inverse,
            phantom_in: Default::default(),
            phantom_out: Default::default(),
        })
    }

    /// Coefficients `[a, b, c, d, e, f]` of the forward transform.
    pub fn coefficients(&self) -> [f64; 6] {
        let m = &self.forward;
        [m[(0, 0)], m[(0, 1)], m[(0, 2)], m[(1, 0)], m[(1, 1)], m[(1, 2)]]
    }
}

impl<In: NewGeoPoint<f64>, Out: NewCartesianPoint2d<f64>> Projection
    for AffineProjection<In, Out>
{
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        let projected = self
            .forward
            .transform_point(&Point2::new(input.lon(), input.lat()));

        if projected.x.is_finite() && projected.y.is_finite() {
            Some(Self::OutPoint::new(projected.x, projected.y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        let geo = self
            .inverse
            .transform_point(&Point2::new(input.x(), input.y()));

        if geo.x.is_finite() && geo.y.is_finite() {
            Some(Self::InPoint::latlon(geo.y, geo.x))
        } else {
            None
        }
    }
}
