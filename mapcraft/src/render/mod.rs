//! CPU renderer that turns a [`Map`] into a [`PixelBuffer`].

use std::sync::Arc;

use log::{debug, info};
use mapcraft_types::cartesian::Size;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::MapcraftError;
use crate::layer::Layer;
use crate::map::Map;

mod basemap;
mod canvas;
mod font;
mod labels;
mod legend;
mod pixel_buffer;
mod tessellation;

use canvas::Canvas;
use labels::{place_labels, LabelIndex};
use tessellation::tessellate_primitive;

pub use pixel_buffer::PixelBuffer;

/// Number of primitives tessellated at once. Meshes of a chunk are drawn before the next chunk
/// is tessellated.
const PRIMITIVE_CHUNK: usize = 4096;

/// Parameters of rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Supersampling factor per axis, `1..=4`. `1` disables anti-aliasing. The factor is lowered
    /// for outputs whose supersampled canvas would exceed the size limits.
    pub antialiasing: u32,
    /// Draw legends of data-driven color rules.
    pub legend: bool,
    /// Draw text labels.
    pub labels: bool,
    /// Maximum width or height in pixels, of both the output and the supersampled canvas.
    pub max_dimension: u32,
    /// Maximum number of pixels, of both the output and the supersampled canvas.
    pub max_pixels: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            antialiasing: 2,
            legend: true,
            labels: true,
            max_dimension: 16_384,
            max_pixels: 16_777_216,
        }
    }
}

impl RenderOptions {
    /// Checks that the options are consistent.
    pub fn validate(&self) -> Result<(), MapcraftError> {
        if !(1..=4).contains(&self.antialiasing) {
            return Err(MapcraftError::Configuration(format!(
                "antialiasing factor must be in range 1..=4, got {}",
                self.antialiasing
            )));
        }

        if self.max_dimension == 0 || self.max_pixels == 0 {
            return Err(MapcraftError::Configuration(
                "output size limits must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Checks that an image of the given size can be rendered with these options.
    pub fn check_output_size(&self, size: Size<u32>) -> Result<(), MapcraftError> {
        let (width, height) = (size.width(), size.height());
        if size.is_zero() {
            return Err(MapcraftError::Render(format!(
                "cannot render an image of size {width}x{height}"
            )));
        }

        let max_dimension = self.max_dimension;
        if width > max_dimension || height > max_dimension {
            return Err(MapcraftError::Render(format!(
                "image size {width}x{height} exceeds the maximum dimension of {max_dimension} pixels"
            )));
        }

        let pixels = size.area();
        if pixels > self.max_pixels {
            return Err(MapcraftError::Render(format!(
                "image of {pixels} pixels exceeds the limit of {} pixels",
                self.max_pixels
            )));
        }

        Ok(())
    }

    /// Largest supersampling factor up to `antialiasing` for which the enlarged canvas stays
    /// within the size limits. Never less than `1`.
    pub fn supersampling(&self, size: Size<u32>) -> u32 {
        (2..=self.antialiasing)
            .rev()
            .find(|&factor| self.canvas_fits(size, factor))
            .unwrap_or(1)
    }

    fn canvas_fits(&self, size: Size<u32>, factor: u32) -> bool {
        let (Some(width), Some(height)) = (
            size.width().checked_mul(factor),
            size.height().checked_mul(factor),
        ) else {
            return false;
        };

        width <= self.max_dimension
            && height <= self.max_dimension
            && Size::new(width, height).area() <= self.max_pixels
    }
}

/// Renders maps into pixel buffers.
///
/// Rendering is pure with respect to the map: rendering the same map twice gives byte-identical
/// buffers.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    /// Creates a new renderer.
    pub fn new(options: RenderOptions) -> Result<Self, MapcraftError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Options of the renderer.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Renders the map.
    ///
    /// The basemap is drawn first, then visible layers in their order, then labels and legends
    /// on top of the anti-aliased image.
    pub fn render(&self, map: &Map) -> Result<PixelBuffer, MapcraftError> {
        let size = map.viewport().size();
        let (width, height) = (size.width(), size.height());
        self.options.check_output_size(size)?;

        let layers: Vec<&Arc<Layer>> = map.layers().iter_visible().collect();
        for layer in &layers {
            if layer.viewport() != map.viewport() {
                return Err(MapcraftError::Render(format!(
                    "layer '{}' was built for a different viewport",
                    layer.name()
                )));
            }
        }

        let scale = self.options.supersampling(size);
        if scale < self.options.antialiasing {
            debug!(
                "Supersampling lowered from {}x to {scale}x for a {width}x{height} image",
                self.options.antialiasing
            );
        }

        let mut canvas = Canvas::new(width * scale, height * scale);
        if let Some(basemap) = map.basemap() {
            basemap::draw_basemap(&mut canvas, basemap, map.viewport(), scale)?;
            debug!("Basemap drawn");
        }

        let canvas_size = [canvas.width() as f32, canvas.height() as f32];
        for layer in &layers {
            let mut meshes_count = 0;
            for chunk in layer.primitives().chunks(PRIMITIVE_CHUNK) {
                let meshes: Vec<_> = chunk
                    .par_iter()
                    .map(|primitive| tessellate_primitive(primitive, scale as f32, canvas_size))
                    .collect::<Vec<_>>()
                    .into_iter()
                    .flatten()
                    .collect();

                meshes_count += meshes.len();
                canvas.draw_meshes(&meshes);
            }

            debug!("Layer '{}' drawn with {meshes_count} meshes", layer.name());
        }

        let mut canvas = canvas.downsample(scale);

        if self.options.labels {
            let mut index = LabelIndex::default();
            for layer in &layers {
                place_labels(&mut canvas, layer.primitives(), &mut index);
            }
            debug!("{} labels placed", index.len());
        }

        if self.options.legend {
            legend::draw_legends(&mut canvas, layers.iter().filter_map(|layer| layer.legend()));
        }

        info!(
            "Rendered {width}x{height} image with {} layers",
            layers.len()
        );

        Ok(canvas.into_pixel_buffer())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mapcraft_types::geo::GeoRect;

    use super::*;
    use crate::color::Color;
    use crate::dataset::{Dataset, LoadOptions, Row};
    use crate::layer::BuildOptions;
    use crate::map::Basemap;
    use crate::projector::{ProjectionKind, Projector};
    use crate::style::{StyleConfig, StyleResolver};
    use crate::viewport::Viewport;

    fn viewport(width: u32, height: u32) -> Viewport {
        Viewport::new(
            GeoRect::new(-10.0, -10.0, 10.0, 10.0).unwrap(),
            Size::new(width, height),
            ProjectionKind::Equirectangular,
        )
    }

    fn point_layer(viewport: &Viewport, style: StyleConfig) -> Layer {
        let rows = vec![Row::new()
            .with("lat", 0.0)
            .with("lon", 0.0)
            .with("name", "center")];
        let dataset = Dataset::load(rows, LoadOptions::default()).unwrap().seal();
        let projector = Projector::new(viewport).unwrap();
        let resolver = StyleResolver::new(&style, &dataset).unwrap();
        Layer::build("points", &dataset, &projector, &resolver, &BuildOptions::default()).unwrap()
    }

    #[test]
    fn empty_map_without_basemap_is_transparent() {
        let map = Map::new(viewport(20, 10));
        let buffer = Renderer::default().render(&map).unwrap();

        assert_eq!(buffer.width(), 20);
        assert_eq!(buffer.height(), 10);
        assert!(buffer.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn solid_basemap() {
        let map = Map::new(viewport(4, 4)).with_basemap(Basemap::Solid(Color::BLUE));
        let buffer = Renderer::default().render(&map).unwrap();

        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(buffer.pixel(x, y), Some(Color::BLUE));
            }
        }
    }

    #[test]
    fn marker_is_drawn_in_the_center() {
        let viewport = viewport(40, 40);
        let style = StyleConfig {
            color: crate::style::ColorRule::Constant { color: Color::RED },
            ..Default::default()
        };
        let mut map = Map::new(viewport.clone()).with_basemap(Basemap::Solid(Color::WHITE));
        map.add_layer(point_layer(&viewport, style), None).unwrap();

        let buffer = Renderer::default().render(&map).unwrap();
        assert_eq!(buffer.pixel(20, 20), Some(Color::RED));
        assert_eq!(buffer.pixel(2, 2), Some(Color::WHITE));
    }

    #[test]
    fn rendering_is_deterministic() {
        let viewport = viewport(64, 64);
        let style = StyleConfig {
            label: Some("name".into()),
            ..Default::default()
        };
        let mut map = Map::new(viewport.clone()).with_basemap(Basemap::Graticule {
            background: Color::WHITE,
            line: Color::GRAY,
            spacing_deg: 2.5,
        });
        map.add_layer(point_layer(&viewport, style), None).unwrap();

        let renderer = Renderer::default();
        assert_eq!(renderer.render(&map).unwrap(), renderer.render(&map).unwrap());
    }

    #[test]
    fn layer_with_stale_viewport_is_rejected() {
        let old = viewport(10, 10);
        let mut map = Map::new(old.clone());
        map.add_layer(point_layer(&old, StyleConfig::default()), None)
            .unwrap();
        map.set_viewport(viewport(20, 20));

        assert_matches!(
            Renderer::default().render(&map),
            Err(MapcraftError::Render(_))
        );

        map.layers_mut().hide(0);
        assert!(Renderer::default().render(&map).is_ok());
    }

    #[test]
    fn size_limits() {
        let renderer = Renderer::new(RenderOptions {
            max_dimension: 100,
            max_pixels: 5_000,
            ..Default::default()
        })
        .unwrap();

        assert_matches!(
            renderer.render(&Map::new(viewport(0, 10))),
            Err(MapcraftError::Render(_))
        );
        assert_matches!(
            renderer.render(&Map::new(viewport(101, 10))),
            Err(MapcraftError::Render(_))
        );
        assert_matches!(
            renderer.render(&Map::new(viewport(100, 100))),
            Err(MapcraftError::Render(_))
        );
        assert!(renderer.render(&Map::new(viewport(50, 100))).is_ok());
    }

    #[test]
    fn supersampling_stays_within_limits() {
        let options = RenderOptions {
            antialiasing: 4,
            max_dimension: 100,
            max_pixels: 5_000,
            ..Default::default()
        };
        assert_eq!(options.supersampling(Size::new(10, 10)), 4);
        assert_eq!(options.supersampling(Size::new(20, 20)), 3);
        assert_eq!(options.supersampling(Size::new(50, 100)), 1);

        let unbounded = RenderOptions {
            antialiasing: 4,
            max_dimension: u32::MAX,
            max_pixels: u64::MAX,
            ..Default::default()
        };
        assert_eq!(unbounded.supersampling(Size::new(u32::MAX, 1)), 1);
        assert_eq!(unbounded.supersampling(Size::new(u32::MAX / 2, 1)), 2);

        let renderer = Renderer::new(options).unwrap();
        let map = Map::new(viewport(50, 100)).with_basemap(Basemap::Solid(Color::BLUE));
        let buffer = renderer.render(&map).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (50, 100));
        assert_eq!(buffer.pixel(49, 99), Some(Color::BLUE));
    }

    #[test]
    fn invalid_options() {
        let options = RenderOptions {
            antialiasing: 5,
            ..Default::default()
        };
        assert_matches!(
            Renderer::new(options),
            Err(MapcraftError::Configuration(_))
        );
    }

    #[test]
    fn options_deserialization() {
        let options: RenderOptions = serde_json::from_str(r#"{"antialiasing": 1}"#).unwrap();
        assert_eq!(options.antialiasing, 1);
        assert!(options.labels);
    }
}
