//! Mapcraft turns tabular data into map images. It takes rows with coordinates and attributes,
//! places them on a map with a chosen projection, styles them by their attributes and renders
//! the result into a PNG or JPEG file.
//!
//! # Quick start
//!
//! ```no_run
//! use mapcraft::{Dataset, LoadOptions, Map, Renderer, Row, Viewport};
//! use mapcraft::layer::{BuildOptions, Layer};
//! use mapcraft::projector::{ProjectionKind, Projector};
//! use mapcraft::style::{StyleConfig, StyleResolver};
//! use mapcraft::mapcraft_types::cartesian::Size;
//! use mapcraft::mapcraft_types::geo::GeoRect;
//!
//! # fn main() -> Result<(), mapcraft::error::MapcraftError> {
//! let rows = vec![Row::new().with("lat", 52.5).with("lon", 13.4).with("value", 7.0)];
//! let dataset = Dataset::load(rows, LoadOptions::default())?.seal();
//!
//! let viewport = Viewport::new(GeoRect::new(40.0, 0.0, 60.0, 30.0)?, Size::new(800, 600), ProjectionKind::Mercator);
//! let projector = Projector::new(&viewport)?;
//! let resolver = StyleResolver::new(&StyleConfig::default(), &dataset)?;
//! let layer = Layer::build("points", &dataset, &projector, &resolver, &BuildOptions::default())?;
//!
//! let mut map = Map::new(projector.viewport().clone());
//! map.add_layer(layer, None)?;
//!
//! let image = Renderer::default().render(&map)?;
//! mapcraft::export::export(&image, "map.png", None)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Main components
//!
//! * [`Dataset`] validates input [`Row`]s and, once [sealed](Dataset::seal), becomes an immutable
//!   [`SealedDataset`] that can be shared between layers.
//! * [`Projector`](projector::Projector) converts geographic coordinates into pixels of the output
//!   for a given [`Viewport`].
//! * [`StyleResolver`](style::StyleResolver) computes colors, sizes and labels of records from a
//!   [`StyleConfig`](style::StyleConfig).
//! * [`Layer`](layer::Layer) holds the drawable primitives built from a dataset.
//! * [`Map`] is an ordered set of layers with a viewport and an optional basemap.
//! * [`Renderer`] rasterizes a map into a [`PixelBuffer`], and [`export`](export::export) saves
//!   it to a file.
//!
//! [`Pipeline`](pipeline::Pipeline) wires all of the above together from a JSON
//! [`MapConfig`](config::MapConfig).

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod cancel;
mod color;
pub mod config;
pub mod dataset;
pub mod decoded_image;
pub mod error;
pub mod export;
pub mod layer;
pub mod map;
pub mod pipeline;
pub mod projector;
pub mod render;
pub mod style;
mod viewport;

pub use cancel::CancellationToken;
pub use color::Color;
pub use dataset::{Dataset, LoadOptions, Row, SealedDataset};
pub use map::{Basemap, LayerCollection, Map};
pub use render::{PixelBuffer, RenderOptions, Renderer};
pub use viewport::Viewport;

// Reexport mapcraft_types
pub use mapcraft_types;
