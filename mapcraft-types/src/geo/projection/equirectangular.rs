use std::marker::PhantomData;

use crate::cartesian::NewCartesianPoint2d;
use crate::geo::datum::Datum;
use crate::geo::point::NewGeoPoint;
use crate::geo::projection::Projection;

/// Equirectangular (plate carrée) projection: longitude and latitude are mapped linearly to
/// `x` and `y`, scaled by the datum semimajor axis.
#[derive(Debug, Copy, Clone)]
pub struct Equirectangular<In, Out> {
    datum: Datum,
    phantom_in: PhantomData<In>,
    phantom_out: PhantomData<Out>,
}

impl<In, Out> Equirectangular<In, Out> {
    /// Creates a new projection with the given datum.
    pub fn new(datum: Datum) -> Self {
        Self {
            datum,
            phantom_in: Default::default(),
            phantom_out: Default::default(),
        }
    }
}

impl<In, Out> Default for Equirectangular<In, Out> {
    fn default() -> Self {
        Self::new(Datum::WGS84)
    }
}

impl<In: NewGeoPoint<f64>, Out: NewCartesianPoint2d<f64>> Projection
    for Equirectangular<In, Out>
{
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        let x = self.datum.semimajor() * input.lon_rad();
        let y = self.datum.semimajor() * input.lat_rad();

        if x.is_finite() && y.is_finite() {
            Some(Self::OutPoint::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        let lat = (input.y() / self.datum.semimajor()).to_degrees();
        let lon = (input.x() / self.datum.semimajor()).to_degrees();

        if lat.is_finite() && lon.is_finite() {
            Some(Self::InPoint::latlon(lat, lon))
        } else {
            None
        }
    }
}
