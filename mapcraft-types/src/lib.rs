//! Geometric primitives shared by the `mapcraft` rendering pipeline.
//!
//! The crate distinguishes two coordinate spaces:
//!
//! * [`geo`] - points on the surface of the Earth, given as latitude and longitude in degrees;
//! * [`cartesian`] - points on a flat plane, used both for projected (world) coordinates and
//!   for pixel coordinates of an output canvas.
//!
//! [`Projection`](geo::Projection) implementations convert between the two. Geometries of any
//! kind are represented by the [`Geom`] enum, which can be projected as a whole.

pub mod cartesian;
pub mod error;
pub mod geo;
pub mod geometry;

pub use geometry::{Contour, Geom, Polygon};
