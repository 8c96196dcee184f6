use std::sync::Arc;

use crate::color::Color;
use crate::decoded_image::DecodedImage;
use crate::error::MapcraftError;
use crate::layer::Layer;
use crate::viewport::Viewport;

mod layer_collection;

pub use layer_collection::LayerCollection;

/// Background drawn before any layer.
#[derive(Debug, Clone)]
pub enum Basemap {
    /// Solid fill.
    Solid(Color),
    /// Solid fill with meridians and parallels every `spacing_deg` degrees.
    Graticule {
        /// Fill color.
        background: Color,
        /// Color of the grid lines.
        line: Color,
        /// Distance between grid lines in degrees.
        spacing_deg: f64,
    },
    /// Image stretched over the whole output.
    Image(DecodedImage),
}

/// Map specifies a set of layers, the viewport that should be rendered and the background.
#[derive(Debug, Clone)]
pub struct Map {
    viewport: Viewport,
    layers: LayerCollection,
    basemap: Option<Basemap>,
}

impl Map {
    /// Creates a new map without layers and basemap.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            layers: LayerCollection::default(),
            basemap: None,
        }
    }

    /// Sets the basemap.
    pub fn with_basemap(mut self, basemap: Basemap) -> Self {
        self.basemap = Some(basemap);
        self
    }

    /// Viewport of the map.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Changes the viewport. All layers must be rebuilt for the new viewport before the next
    /// render.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Returns the list of map's layers.
    pub fn layers(&self) -> &LayerCollection {
        &self.layers
    }

    /// Returns a mutable reference to the list of map's layers.
    pub fn layers_mut(&mut self) -> &mut LayerCollection {
        &mut self.layers
    }

    /// Background of the map.
    pub fn basemap(&self) -> Option<&Basemap> {
        self.basemap.as_ref()
    }

    /// Sets or removes the background of the map.
    pub fn set_basemap(&mut self, basemap: Option<Basemap>) {
        self.basemap = basemap;
    }

    /// Adds a layer at the given position of the drawing order, or on top of all the others if
    /// `at` is `None`.
    ///
    /// Fails with [`MapcraftError::Configuration`] if `at` is greater than the number of layers.
    pub fn add_layer(
        &mut self,
        layer: impl Into<Arc<Layer>>,
        at: Option<usize>,
    ) -> Result<(), MapcraftError> {
        match at {
            None => self.layers.push(layer),
            Some(index) if index <= self.layers.len() => self.layers.insert(index, layer),
            Some(index) => {
                return Err(MapcraftError::Configuration(format!(
                    "cannot insert layer at position {index}, the map has {} layers",
                    self.layers.len()
                )))
            }
        }

        Ok(())
    }
}
