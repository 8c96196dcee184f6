use std::marker::PhantomData;

use crate::cartesian::NewCartesianPoint2d;
use crate::geo::datum::Datum;
use crate::geo::point::NewGeoPoint;
use crate::geo::projection::Projection;

/// Latitude limit of the Web Mercator projection, in degrees. Points closer to the poles are
/// clamped to this value.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Spherical (Web) Mercator projection, EPSG:3857.
#[derive(Debug, Copy, Clone)]
pub struct WebMercator<In, Out> {
    datum: Datum,
    phantom_in: PhantomData<In>,
    phantom_out: PhantomData<Out>,
}

impl<In, Out> WebMercator<In, Out> {
    /// Creates a new projection with the given datum.
    pub fn new(datum: Datum) -> Self {
        Self {
            datum,
            phantom_in: Default::default(),
            phantom_out: Default::default(),
        }
    }
}

impl<In, Out> Default for WebMercator<In, Out> {
    fn default() -> Self {
        Self::new(Datum::WGS84)
    }
}

impl<In: NewGeoPoint<f64>, Out: NewCartesianPoint2d<f64>> Projection for WebMercator<In, Out> {
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint> {
        let lat = input.lat().clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let x = self.datum.semimajor() * input.lon_rad();
        let y = self.datum.semimajor()
            * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
                .tan()
                .ln();

        if x.is_finite() && y.is_finite() {
            Some(Self::OutPoint::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint> {
        let lat = 2.0 * (input.y() / self.datum.semimajor()).exp().atan()
            - std::f64::consts::FRAC_PI_2;
        let lon = input.x() / self.datum.semimajor();

        if lat.is_finite() && lon.is_finite() {
            Some(Self::InPoint::latlon(lat.to_degrees(), lon.to_degrees()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::cartesian::Point2d;
    use crate::geo::{GeoPoint, GeoPoint2d};
    use crate::latlon;

    #[test]
    fn projects_known_points() {
        let projection = WebMercator::<GeoPoint2d, Point2d>::default();

        let origin = projection.project(&latlon!(0.0, 0.0)).expect("finite");
        assert_abs_diff_eq!(origin.x, 0.0);
        assert_abs_diff_eq!(origin.y, 0.0, epsilon = 1e-9);

        let corner = projection
            .project(&latlon!(MAX_MERCATOR_LAT, 180.0))
            .expect("finite");
        assert_abs_diff_eq!(corner.x, 20_037_508.342789244, epsilon = 1e-6);
        assert_abs_diff_eq!(corner.y, 20_037_508.342789244, epsilon = 1e-3);
    }

    #[test]
    fn poles_are_clamped() {
        let projection = WebMercator::<GeoPoint2d, Point2d>::default();
        let pole = projection.project(&latlon!(90.0, 0.0)).expect("clamped");
        let limit = projection
            .project(&latlon!(MAX_MERCATOR_LAT, 0.0))
            .expect("finite");
        assert_eq!(pole, limit);
    }

    #[test]
    fn unproject_inverts_project() {
        let projection = WebMercator::<GeoPoint2d, Point2d>::default();
        let point = latlon!(55.75, 37.62);
        let projected = projection.project(&point).expect("finite");
        let back = projection.unproject(&projected).expect("finite");
        assert_abs_diff_eq!(back.lat(), point.lat(), epsilon = 1e-9);
        assert_abs_diff_eq!(back.lon(), point.lon(), epsilon = 1e-9);
    }
}
