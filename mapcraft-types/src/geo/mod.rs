//! Types for points and areas on the surface of the Earth.

mod datum;
mod point;
pub mod projection;
mod rect;

pub use datum::Datum;
pub use point::{GeoPoint, GeoPoint2d, NewGeoPoint};
pub use projection::Projection;
pub use rect::GeoRect;
