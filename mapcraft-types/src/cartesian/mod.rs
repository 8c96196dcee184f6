//! Types for points and shapes on a flat plane.

mod point;
mod rect;
mod size;

pub use point::{CartesianPoint2d, NewCartesianPoint2d, Point2d};
pub use rect::Rect;
pub use size::Size;
