//! Customization file describing how a map is built and rendered.
//!
//! The file is a JSON document:
//!
//! ```json
//! {
//!   "projection": "mercator",
//!   "viewport": { "bbox": "fit", "width": 800, "height": 600 },
//!   "basemap": { "type": "graticule", "background": "#FFFFFFFF", "line": "#C0C0C0FF", "spacing_deg": 10 },
//!   "layers": [
//!     { "name": "stations", "style": { "color": { "type": "ramp", "attribute": "value" } } }
//!   ],
//!   "render": { "antialiasing": 2 },
//!   "output": { "path": "map.png" }
//! }
//! ```

use std::path::{Path, PathBuf};

use mapcraft_types::cartesian::Size;
use mapcraft_types::geo::projection::MAX_MERCATOR_LAT;
use mapcraft_types::geo::GeoRect;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::decoded_image::DecodedImage;
use crate::error::MapcraftError;
use crate::export::ImageFormat;
use crate::map::Basemap;
use crate::projector::ProjectionKind;
use crate::render::RenderOptions;
use crate::style::StyleConfig;

/// Share of the data extent added to every side of a fitted bounding box.
const FIT_PADDING: f64 = 0.05;
/// Minimum padding of a fitted bounding box in degrees, so that a single point gets a non-empty
/// box.
const FIT_MIN_PADDING_DEG: f64 = 0.01;

/// Projection given either by name or as an affine transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectionConfig {
    /// Name of a projection, e.g. `"mercator"` or `"equirectangular"`.
    Named(String),
    /// Affine transform of longitude and latitude.
    Affine {
        /// Coefficients `[a, b, c, d, e, f]`, see
        /// [`AffineProjection`](mapcraft_types::geo::projection::AffineProjection).
        affine: [f64; 6],
    },
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::Named("mercator".into())
    }
}

impl ProjectionConfig {
    /// Parses the projection kind.
    pub fn kind(&self) -> Result<ProjectionKind, MapcraftError> {
        match self {
            ProjectionConfig::Named(name) => name.parse(),
            ProjectionConfig::Affine { affine } => Ok(ProjectionKind::Affine(*affine)),
        }
    }
}

/// Geographic area of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BboxConfig {
    /// `[min_lat, min_lon, max_lat, max_lon]`.
    Bounds([f64; 4]),
    /// The keyword `"fit"`: the box is computed from the data of all layers.
    Keyword(String),
}

impl BboxConfig {
    const FIT: &'static str = "fit";

    /// Returns the explicit bounding box, or `None` if it should be fitted to the data.
    pub fn bounds(&self) -> Result<Option<GeoRect>, MapcraftError> {
        match self {
            BboxConfig::Bounds([min_lat, min_lon, max_lat, max_lon]) => Ok(Some(GeoRect::new(
                *min_lat, *min_lon, *max_lat, *max_lon,
            )?)),
            BboxConfig::Keyword(keyword) if keyword.eq_ignore_ascii_case(Self::FIT) => Ok(None),
            BboxConfig::Keyword(keyword) => Err(MapcraftError::Configuration(format!(
                "unknown bounding box keyword '{keyword}', expected '{}' or [min_lat, min_lon, max_lat, max_lon]",
                Self::FIT
            ))),
        }
    }
}

/// Area and size of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewportConfig {
    /// Geographic area.
    pub bbox: BboxConfig,
    /// Width of the output in pixels.
    pub width: u32,
    /// Height of the output in pixels.
    pub height: u32,
}

impl ViewportConfig {
    /// Output size.
    pub fn size(&self) -> Size<u32> {
        Size::new(self.width, self.height)
    }
}

/// Bounding box that contains all the data with some padding.
///
/// For Mercator the latitudes are limited to the range the projection can show, and data near a
/// pole gets a thin box at the edge of that range.
pub(crate) fn fit_bbox(extent: Option<GeoRect>, kind: &ProjectionKind) -> GeoRect {
    let Some(extent) = extent else {
        return GeoRect::WORLD;
    };

    let padded = extent.padded(FIT_PADDING, FIT_MIN_PADDING_DEG);
    match kind {
        ProjectionKind::Mercator => padded.clamp_lat(MAX_MERCATOR_LAT, 2.0 * FIT_MIN_PADDING_DEG),
        _ => padded,
    }
}

/// Background of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum BasemapConfig {
    /// Solid fill.
    Solid {
        /// Fill color.
        color: Color,
    },
    /// Fill with meridians and parallels.
    Graticule {
        /// Fill color.
        background: Color,
        /// Color of the grid.
        line: Color,
        /// Grid step in degrees.
        spacing_deg: f64,
    },
    /// Image file stretched over the output.
    Image {
        /// Path to a PNG or JPEG file.
        path: PathBuf,
    },
}

impl BasemapConfig {
    const MAX_GRID_LINES: f64 = 10_000.0;

    fn validate(&self) -> Result<(), MapcraftError> {
        match self {
            BasemapConfig::Graticule { spacing_deg, .. } => {
                if !(spacing_deg.is_finite() && *spacing_deg > 0.0) {
                    return Err(MapcraftError::Configuration(format!(
                        "graticule spacing must be a positive number, got {spacing_deg}"
                    )));
                }
                if 360.0 / spacing_deg > Self::MAX_GRID_LINES {
                    return Err(MapcraftError::Configuration(format!(
                        "graticule spacing of {spacing_deg} degrees is too small"
                    )));
                }
                Ok(())
            }
            BasemapConfig::Image { path } if path.as_os_str().is_empty() => Err(
                MapcraftError::Configuration("basemap image path is empty".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Creates the basemap, reading the image file if needed.
    pub fn to_basemap(&self) -> Result<Basemap, MapcraftError> {
        Ok(match self {
            BasemapConfig::Solid { color } => Basemap::Solid(*color),
            BasemapConfig::Graticule {
                background,
                line,
                spacing_deg,
            } => Basemap::Graticule {
                background: *background,
                line: *line,
                spacing_deg: *spacing_deg,
            },
            BasemapConfig::Image { path } => Basemap::Image(DecodedImage::from_path(path)?),
        })
    }
}

fn default_true() -> bool {
    true
}

/// One layer of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    /// Name of the layer, used as the legend title.
    pub name: String,
    /// Name of the input dataset. Defaults to the layer name.
    #[serde(default)]
    pub dataset: Option<String>,
    /// Style of the layer.
    #[serde(default)]
    pub style: StyleConfig,
    /// Whether the layer gets a legend.
    #[serde(default = "default_true")]
    pub legend: bool,
}

impl LayerConfig {
    /// Name of the input dataset the layer is built from.
    pub fn dataset_name(&self) -> &str {
        self.dataset.as_deref().unwrap_or(&self.name)
    }
}

/// Where the image is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Output file.
    pub path: PathBuf,
    /// Output format. Determined from the path extension if not set.
    #[serde(default)]
    pub format: Option<String>,
}

impl OutputConfig {
    /// Resolves the output format.
    pub fn format(&self) -> Result<ImageFormat, MapcraftError> {
        match &self.format {
            Some(name) => name.parse(),
            None => ImageFormat::from_path(&self.path),
        }
    }
}

/// Complete customization of a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// Projection of the map. Mercator by default.
    #[serde(default)]
    pub projection: ProjectionConfig,
    /// Area and size of the output.
    pub viewport: ViewportConfig,
    /// Background.
    #[serde(default)]
    pub basemap: Option<BasemapConfig>,
    /// Layers, from bottom to top.
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
    /// Rendering parameters.
    #[serde(default)]
    pub render: RenderOptions,
    /// Output file.
    #[serde(default)]
    pub output: Option<OutputConfig>,
}

impl MapConfig {
    /// Parses a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, MapcraftError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, MapcraftError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the whole configuration. Does not read any data.
    pub fn validate(&self) -> Result<(), MapcraftError> {
        self.projection.kind()?;
        self.viewport.bbox.bounds()?;

        if let Some(basemap) = &self.basemap {
            basemap.validate()?;
        }

        let mut names = ahash::AHashSet::new();
        for layer in &self.layers {
            if !names.insert(layer.name.as_str()) {
                return Err(MapcraftError::Configuration(format!(
                    "duplicate layer name '{}'",
                    layer.name
                )));
            }
            layer.style.validate().map_err(|err| MapcraftError::LayerBuild {
                layer: layer.name.clone(),
                reason: err.to_string(),
            })?;
        }

        self.render.validate()?;

        if let Some(output) = &self.output {
            output.format()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::style::ColorRule;

    const CONFIG: &str = r##"{
        "projection": "equirectangular",
        "viewport": { "bbox": [-10, -20, 10, 20], "width": 400, "height": 200 },
        "basemap": { "type": "solid", "color": "#FFFFFFFF" },
        "layers": [
            {
                "name": "stations",
                "style": {
                    "color": { "type": "ramp", "attribute": "value", "colors": "viridis" },
                    "label": "name"
                }
            },
            { "name": "roads", "dataset": "lines", "legend": false }
        ],
        "render": { "antialiasing": 1 },
        "output": { "path": "out/map.png" }
    }"##;

    #[test]
    fn parses_full_config() {
        let config = MapConfig::from_json_str(CONFIG).unwrap();
        config.validate().unwrap();

        assert_eq!(config.projection.kind().unwrap(), ProjectionKind::Equirectangular);
        assert_eq!(config.viewport.size(), Size::new(400, 200));
        assert_eq!(
            config.basemap,
            Some(BasemapConfig::Solid {
                color: Color::WHITE
            })
        );
        assert_eq!(config.layers[0].dataset_name(), "stations");
        assert_eq!(config.layers[1].dataset_name(), "lines");
        assert!(config.layers[0].legend);
        assert!(!config.layers[1].legend);
        assert_matches!(config.layers[0].style.color, ColorRule::Ramp { .. });
        assert_eq!(config.render.antialiasing, 1);
        assert_eq!(config.output.unwrap().format().unwrap(), ImageFormat::Png);
    }

    #[test]
    fn minimal_config() {
        let config = MapConfig::from_json_str(
            r#"{"viewport": {"bbox": "fit", "width": 10, "height": 10}}"#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.projection.kind().unwrap(), ProjectionKind::Mercator);
        assert_eq!(config.viewport.bbox.bounds().unwrap(), None);
        assert_eq!(config.render, RenderOptions::default());
    }

    #[test]
    fn affine_projection() {
        let config = MapConfig::from_json_str(
            r#"{
                "projection": {"affine": [1, 0, 0, 0, 1, 0]},
                "viewport": {"bbox": "fit", "width": 10, "height": 10}
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.projection.kind().unwrap(),
            ProjectionKind::Affine([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
        );
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let validate = |json: &str| MapConfig::from_json_str(json).and_then(|c| c.validate());

        assert_matches!(
            validate(r#"{"projection": "lambert", "viewport": {"bbox": "fit", "width": 1, "height": 1}}"#),
            Err(MapcraftError::UnsupportedProjection(_))
        );
        assert_matches!(
            validate(r#"{"viewport": {"bbox": "all", "width": 1, "height": 1}}"#),
            Err(MapcraftError::Configuration(_))
        );
        assert_matches!(
            validate(r#"{"viewport": {"bbox": "fit", "width": 1, "height": 1}, "output": {"path": "map.tiff"}}"#),
            Err(MapcraftError::UnsupportedFormat(_))
        );
        assert_matches!(
            validate(r#"{"viewport": {"bbox": "fit", "width": 1, "height": 1}, "layers": [{"name": "a"}, {"name": "a"}]}"#),
            Err(MapcraftError::Configuration(_))
        );
        assert_matches!(
            validate(r#"{"viewport": {"bbox": "fit", "width": 1, "height": 1}, "layers": [{"name": "a", "style": {"opacity": 2}}]}"#),
            Err(MapcraftError::LayerBuild { .. })
        );
        assert_matches!(
            validate(r##"{"viewport": {"bbox": "fit", "width": 1, "height": 1}, "basemap": {"type": "graticule", "background": "#FFFFFFFF", "line": "#000000FF", "spacing_deg": 0}}"##),
            Err(MapcraftError::Configuration(_))
        );
        assert_matches!(
            validate(r#"{"viewport": {"bbox": "fit", "width": 1, "height": 1}, "unknown": 1}"#),
            Err(MapcraftError::ConfigParse(_))
        );
    }

    #[test]
    fn fitted_bbox_is_padded() {
        let extent = GeoRect::new(0.0, 0.0, 10.0, 20.0).unwrap();
        let bbox = fit_bbox(Some(extent), &ProjectionKind::Mercator);
        assert!(bbox.min_lat() < 0.0 && bbox.max_lon() > 20.0);
        assert_eq!(fit_bbox(None, &ProjectionKind::Mercator), GeoRect::WORLD);
    }

    #[test]
    fn fitted_polar_bbox_stays_in_mercator_range() {
        let extent = GeoRect::new(87.0, 10.0, 89.0, 20.0).unwrap();

        let mercator = fit_bbox(Some(extent), &ProjectionKind::Mercator);
        assert!(mercator.max_lat() <= MAX_MERCATOR_LAT);
        assert!(mercator.min_lat() < mercator.max_lat());
        assert!(mercator.max_lon() > 20.0);

        let plate = fit_bbox(Some(extent), &ProjectionKind::Equirectangular);
        assert!(plate.max_lat() > 89.0);
    }
}
