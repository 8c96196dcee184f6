use serde::{Deserialize, Serialize};

use super::point::{MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use super::{GeoPoint, GeoPoint2d, NewGeoPoint};
use crate::error::MapcraftTypesError;

/// Geographic bounding box, given in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRect {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

impl GeoRect {
    /// The whole world in the ranges valid for a Web Mercator map.
    pub const WORLD: GeoRect = GeoRect {
        min_lat: -85.0,
        min_lon: -180.0,
        max_lat: 85.0,
        max_lon: 180.0,
    };

    /// Creates a new bounding box.
    ///
    /// Fails if any of the values is not finite, is outside of the valid range, or if the box is
    /// empty (`min >= max` along any axis).
    pub fn new(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Self, MapcraftTypesError> {
        let all_finite = [min_lat, min_lon, max_lat, max_lon]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(MapcraftTypesError::Conversion(
                "bounding box values must be finite".into(),
            ));
        }

        if min_lat < MIN_LAT || max_lat > MAX_LAT || min_lon < MIN_LON || max_lon > MAX_LON {
            return Err(MapcraftTypesError::Conversion(format!(
                "bounding box [{min_lat}, {min_lon}, {max_lat}, {max_lon}] is out of range"
            )));
        }

        if min_lat >= max_lat || min_lon >= max_lon {
            return Err(MapcraftTypesError::Conversion(format!(
                "bounding box [{min_lat}, {min_lon}, {max_lat}, {max_lon}] is empty"
            )));
        }

        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Smallest box containing all the points. Returns `None` for an empty iterator.
    ///
    /// The result may be degenerate (zero width or height) when all points share a coordinate,
    /// use [`GeoRect::padded`] to get a usable viewport from it.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint2d>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Self {
            min_lat: first.lat(),
            min_lon: first.lon(),
            max_lat: first.lat(),
            max_lon: first.lon(),
        };
        for p in iter {
            rect.min_lat = rect.min_lat.min(p.lat());
            rect.min_lon = rect.min_lon.min(p.lon());
            rect.max_lat = rect.max_lat.max(p.lat());
            rect.max_lon = rect.max_lon.max(p.lon());
        }

        Some(rect)
    }

    /// Smallest box containing both boxes.
    pub fn merge(&self, other: &GeoRect) -> GeoRect {
        Self {
            min_lat: self.min_lat.min(other.min_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lat: self.max_lat.max(other.max_lat),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// Grows the box by the given share of its size to every side (at least by `min_degrees`),
    /// clamped to the valid coordinate ranges.
    pub fn padded(&self, share: f64, min_degrees: f64) -> GeoRect {
        let pad_lat = ((self.max_lat - self.min_lat) * share).max(min_degrees);
        let pad_lon = ((self.max_lon - self.min_lon) * share).max(min_degrees);
        Self {
            min_lat: (self.min_lat - pad_lat).max(MIN_LAT),
            min_lon: (self.min_lon - pad_lon).max(MIN_LON),
            max_lat: (self.max_lat + pad_lat).min(MAX_LAT),
            max_lon: (self.max_lon + pad_lon).min(MAX_LON),
        }
    }

    /// Limits the latitudes of the box to `[-max_lat, max_lat]`.
    ///
    /// If the clamped box is lower than `min_height` degrees, it is extended away from the limit
    /// it touches, so the result is never empty.
    pub fn clamp_lat(&self, max_lat: f64, min_height: f64) -> GeoRect {
        let min_height = min_height.min(max_lat);
        let mut min = self.min_lat.clamp(-max_lat, max_lat);
        let mut max = self.max_lat.clamp(-max_lat, max_lat);
        if max - min < min_height {
            let center = ((min + max) / 2.0).clamp(
                -max_lat + min_height / 2.0,
                max_lat - min_height / 2.0,
            );
            min = center - min_height / 2.0;
            max = center + min_height / 2.0;
        }

        Self {
            min_lat: min,
            max_lat: max,
            ..*self
        }
    }

    /// Minimum latitude.
    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Minimum longitude.
    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Maximum latitude.
    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Maximum longitude.
    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// South-west corner.
    pub fn south_west(&self) -> GeoPoint2d {
        GeoPoint2d::latlon(self.min_lat, self.min_lon)
    }

    /// North-east corner.
    pub fn north_east(&self) -> GeoPoint2d {
        GeoPoint2d::latlon(self.max_lat, self.max_lon)
    }

    /// Returns true if the point is inside the box or on its border.
    pub fn contains(&self, point: &impl GeoPoint<Num = f64>) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat())
            && (self.min_lon..=self.max_lon).contains(&point.lon())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latlon;

    #[test]
    fn invalid_boxes_are_rejected() {
        assert!(GeoRect::new(-10.0, -10.0, 10.0, 10.0).is_ok());
        assert!(GeoRect::new(10.0, -10.0, -10.0, 10.0).is_err());
        assert!(GeoRect::new(0.0, 0.0, 0.0, 10.0).is_err());
        assert!(GeoRect::new(-95.0, 0.0, 10.0, 10.0).is_err());
        assert!(GeoRect::new(0.0, 0.0, f64::NAN, 10.0).is_err());
    }

    #[test]
    fn from_points_and_padding() {
        let points = [latlon!(10.0, 20.0), latlon!(-5.0, 30.0), latlon!(0.0, 25.0)];
        let rect = GeoRect::from_points(points.iter()).expect("not empty");
        assert_eq!(rect.min_lat(), -5.0);
        assert_eq!(rect.max_lon(), 30.0);
        assert!(rect.contains(&latlon!(0.0, 25.0)));

        let padded = rect.padded(0.1, 0.0);
        assert_eq!(padded.min_lat(), -6.5);
        assert_eq!(padded.max_lat(), 11.5);

        let single = GeoRect::from_points([latlon!(89.9, 179.9)].iter()).expect("not empty");
        let padded = single.padded(0.1, 1.0);
        assert_eq!(padded.max_lat(), 90.0);
        assert_eq!(padded.max_lon(), 180.0);
    }

    #[test]
    fn latitude_clamping() {
        let rect = GeoRect::new(-10.0, 0.0, 10.0, 10.0).expect("valid box");
        assert_eq!(rect.clamp_lat(85.0, 0.02), rect);

        let tall = GeoRect::new(-89.0, 0.0, 89.0, 10.0).expect("valid box");
        let clamped = tall.clamp_lat(85.0, 0.02);
        assert_eq!(clamped.min_lat(), -85.0);
        assert_eq!(clamped.max_lat(), 85.0);
        assert_eq!(clamped.max_lon(), 10.0);

        let polar = GeoRect::new(86.9, 0.0, 89.1, 10.0).expect("valid box");
        let clamped = polar.clamp_lat(85.0, 0.02);
        assert!((clamped.max_lat() - 85.0).abs() < 1e-9);
        assert!((clamped.min_lat() - 84.98).abs() < 1e-9);

        let south = GeoRect::new(-89.1, 0.0, -86.9, 10.0).expect("valid box");
        let clamped = south.clamp_lat(85.0, 0.02);
        assert!((clamped.min_lat() + 85.0).abs() < 1e-9);
        assert!(clamped.max_lat() > clamped.min_lat());
    }
}
