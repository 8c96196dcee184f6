//! Visual styling of records.
//!
//! [`StyleConfig`] is the user-facing description of how records of a layer should look. It is
//! turned into a [`StyleResolver`] for a specific dataset, which computes the
//! [`VisualAttributes`] of every record.

mod ramp;
mod resolver;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use ramp::{ColorRamp, ColorScheme, ColorStop, RampColors};
pub use resolver::{Legend, LegendEntries, Resolved, StyleResolver, VisualAttributes};

use crate::color::Color;
use crate::error::MapcraftError;

/// Marker drawn for point records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    /// Filled circle.
    #[default]
    Circle,
    /// Axis-aligned square.
    Square,
    /// Triangle pointing up.
    Triangle,
    /// Square rotated by 45 degrees.
    Diamond,
    /// Plus sign.
    Cross,
}

/// Range of values mapped onto a ramp.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRange {
    /// Minimum and maximum of the attribute in the dataset.
    #[default]
    FromData,
    /// Fixed range.
    Explicit {
        /// Value mapped to the start of the ramp.
        min: f64,
        /// Value mapped to the end of the ramp.
        max: f64,
    },
}

/// Rule for the color of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColorRule {
    /// Same color for every record.
    Constant {
        /// The color.
        color: Color,
    },
    /// Color taken from a ramp by the value of a numeric attribute.
    Ramp {
        /// Numeric attribute.
        attribute: String,
        /// Range of values covered by the ramp. Values outside are clamped.
        #[serde(default)]
        range: ValueRange,
        /// Ramp colors.
        #[serde(default)]
        colors: RampColors,
        /// Color of records without a usable value.
        #[serde(default = "fallback_color")]
        default: Color,
    },
    /// Color selected by the value of an attribute.
    Categories {
        /// Attribute of any type. Numbers match keys with the same numeric value (`1.0` matches
        /// `"1"` and `"1.0"`), other values are compared by their text form.
        attribute: String,
        /// Colors of the known values.
        categories: BTreeMap<String, Color>,
        /// Color of records with a missing or unknown value.
        #[serde(default = "fallback_color")]
        default: Color,
    },
}

fn fallback_color() -> Color {
    Color::GRAY
}

impl Default for ColorRule {
    fn default() -> Self {
        Self::Constant {
            color: Color::from_hex("#1F77B4"),
        }
    }
}

/// Rule for the size of markers, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizeRule {
    /// Same size for every record.
    Constant {
        /// Size in pixels.
        size: f32,
    },
    /// Size interpolated linearly by the value of a numeric attribute.
    Scaled {
        /// Numeric attribute.
        attribute: String,
        /// Range of values mapped onto the size range.
        #[serde(default)]
        domain: ValueRange,
        /// Sizes for the start and end of the domain.
        range_px: [f32; 2],
        /// Size of records without a usable value.
        default: f32,
    },
}

impl Default for SizeRule {
    fn default() -> Self {
        Self::Constant { size: 6.0 }
    }
}

/// Outline around markers and polygons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Color of the outline.
    pub color: Color,
    /// Width in pixels.
    pub width: f32,
}

/// Customization of the look of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Color rule.
    pub color: ColorRule,
    /// Marker size rule.
    pub size: SizeRule,
    /// Marker shape of point records.
    pub marker: MarkerShape,
    /// Opacity of everything drawn for the layer, `0..=1`.
    pub opacity: f32,
    /// Width of lines in pixels.
    pub stroke_width: f32,
    /// Optional outline of markers and polygons.
    pub outline: Option<Outline>,
    /// Attribute used as a text label of records.
    pub label: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            color: ColorRule::default(),
            size: SizeRule::default(),
            marker: MarkerShape::default(),
            opacity: 1.0,
            stroke_width: 1.5,
            outline: None,
            label: None,
        }
    }
}

impl StyleConfig {
    /// Checks that all the numeric parameters are in their valid ranges.
    pub fn validate(&self) -> Result<(), MapcraftError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(invalid(format!(
                "opacity must be in [0, 1], got {}",
                self.opacity
            )));
        }

        check_size("stroke width", self.stroke_width)?;

        if let Some(outline) = &self.outline {
            check_size("outline width", outline.width)?;
        }

        match &self.color {
            ColorRule::Constant { .. } => {}
            ColorRule::Ramp {
                range, colors, ..
            } => {
                check_range(range)?;
                ColorRamp::from_colors(colors)?;
            }
            ColorRule::Categories { .. } => {}
        }

        match &self.size {
            SizeRule::Constant { size } => check_size("marker size", *size)?,
            SizeRule::Scaled {
                domain,
                range_px,
                default,
                ..
            } => {
                check_range(domain)?;
                check_size("marker size", range_px[0])?;
                check_size("marker size", range_px[1])?;
                check_size("marker size", *default)?;
            }
        }

        Ok(())
    }
}

fn invalid(reason: String) -> MapcraftError {
    MapcraftError::Configuration(reason)
}

fn check_size(name: &str, value: f32) -> Result<(), MapcraftError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}

fn check_range(range: &ValueRange) -> Result<(), MapcraftError> {
    match range {
        ValueRange::FromData => Ok(()),
        ValueRange::Explicit { min, max } => {
            if min.is_finite() && max.is_finite() && min <= max {
                Ok(())
            } else {
                Err(invalid(format!("invalid value range [{min}, {max}]")))
            }
        }
    }
}
