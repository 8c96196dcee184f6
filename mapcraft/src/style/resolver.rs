use log::warn;

use crate::color::Color;
use crate::dataset::{AttributeType, Record, SealedDataset, Value};
use crate::error::MapcraftError;
use crate::style::ramp::ColorRamp;
use crate::style::{ColorRule, ColorStop, MarkerShape, Outline, SizeRule, StyleConfig, ValueRange};

/// Visual parameters of a single record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualAttributes {
    /// Fill color (line color for lines), before opacity is applied.
    pub color: Color,
    /// Marker size in pixels.
    pub size_px: f32,
    /// Marker shape.
    pub marker: MarkerShape,
    /// Opacity, `0..=1`.
    pub opacity: f32,
    /// Line width in pixels.
    pub stroke_width: f32,
    /// Outline of markers and polygons.
    pub outline: Option<Outline>,
}

/// Result of resolving the style of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Visual parameters.
    pub attributes: VisualAttributes,
    /// Text label, if the style has a label rule and the record has the attribute.
    pub label: Option<String>,
    /// Number of rules that used their default value.
    pub fallbacks: usize,
}

/// Entries of a legend.
#[derive(Debug, Clone, PartialEq)]
pub enum LegendEntries {
    /// Continuous ramp between two values.
    Ramp {
        /// Value at the start of the ramp.
        min: f64,
        /// Value at the end of the ramp.
        max: f64,
        /// Ramp stops.
        stops: Vec<ColorStop>,
    },
    /// Discrete categories.
    Categories(Vec<(String, Color)>),
}

/// Description of a data-driven color rule, drawn as a legend over the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    /// Title of the legend.
    pub title: String,
    /// Entries.
    pub entries: LegendEntries,
}

#[derive(Debug, Clone)]
enum ColorResolver {
    Constant(Color),
    Ramp {
        attribute: String,
        range: Option<(f64, f64)>,
        ramp: ColorRamp,
        default: Color,
    },
    Categories {
        attribute: String,
        categories: Vec<(String, Color)>,
        numeric: Vec<(f64, Color)>,
        default: Color,
    },
}

#[derive(Debug, Clone)]
enum SizeResolver {
    Constant(f32),
    Scaled {
        attribute: String,
        domain: Option<(f64, f64)>,
        range_px: [f32; 2],
        default: f32,
    },
}

/// Computes visual attributes of records from a [`StyleConfig`].
///
/// All dataset-wide values (like attribute ranges for ramps) are computed once on creation, after
/// which resolving is a pure function of the record and can be done from many threads at once.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    color: ColorResolver,
    size: SizeResolver,
    marker: MarkerShape,
    opacity: f32,
    stroke_width: f32,
    outline: Option<Outline>,
    label: Option<String>,
}

impl StyleResolver {
    /// Validates the config and prepares it for the dataset.
    pub fn new(config: &StyleConfig, dataset: &SealedDataset) -> Result<Self, MapcraftError> {
        config.validate()?;

        let color = match &config.color {
            ColorRule::Constant { color } => ColorResolver::Constant(*color),
            ColorRule::Ramp {
                attribute,
                range,
                colors,
                default,
            } => {
                check_numeric(dataset, attribute);
                ColorResolver::Ramp {
                    attribute: attribute.clone(),
                    range: resolve_range(dataset, attribute, range),
                    ramp: ColorRamp::from_colors(colors)?,
                    default: *default,
                }
            }
            ColorRule::Categories {
                attribute,
                categories,
                default,
            } => ColorResolver::Categories {
                attribute: attribute.clone(),
                categories: categories
                    .iter()
                    .map(|(value, color)| (value.clone(), *color))
                    .collect(),
                numeric: categories
                    .iter()
                    .filter_map(|(value, color)| {
                        let value = value.trim().parse::<f64>().ok()?;
                        value.is_finite().then_some((value, *color))
                    })
                    .collect(),
                default: *default,
            },
        };

        let size = match &config.size {
            SizeRule::Constant { size } => SizeResolver::Constant(*size),
            SizeRule::Scaled {
                attribute,
                domain,
                range_px,
                default,
            } => {
                check_numeric(dataset, attribute);
                SizeResolver::Scaled {
                    attribute: attribute.clone(),
                    domain: resolve_range(dataset, attribute, domain),
                    range_px: *range_px,
                    default: *default,
                }
            }
        };

        Ok(Self {
            color,
            size,
            marker: config.marker,
            opacity: config.opacity,
            stroke_width: config.stroke_width,
            outline: config.outline,
            label: config.label.clone(),
        })
    }

    /// Resolves the style of the record.
    ///
    /// Every rule that cannot use the record's attribute (missing, of a wrong type or not finite)
    /// uses its default value and increments [`Resolved::fallbacks`].
    pub fn resolve(&self, record: &Record) -> Resolved {
        let mut fallbacks = 0;

        let color = match &self.color {
            ColorResolver::Constant(color) => *color,
            ColorResolver::Ramp {
                attribute,
                range,
                ramp,
                default,
            } => or_default(
                number(record, attribute)
                    .zip(*range)
                    .map(|(v, range)| ramp.evaluate(normalize(v, range))),
                *default,
                &mut fallbacks,
            ),
            ColorResolver::Categories {
                attribute,
                categories,
                numeric,
                default,
            } => or_default(
                record
                    .attribute(attribute)
                    .and_then(|value| category_color(value, categories, numeric)),
                *default,
                &mut fallbacks,
            ),
        };

        let size_px = match &self.size {
            SizeResolver::Constant(size) => *size,
            SizeResolver::Scaled {
                attribute,
                domain,
                range_px,
                default,
            } => or_default(
                number(record, attribute).zip(*domain).map(|(v, domain)| {
                    let t = normalize(v, domain) as f32;
                    range_px[0] + (range_px[1] - range_px[0]) * t
                }),
                *default,
                &mut fallbacks,
            ),
        };

        let label = match &self.label {
            Some(attribute) => or_default(
                record.attribute(attribute).map(|v| Some(v.to_string())),
                None,
                &mut fallbacks,
            ),
            None => None,
        };

        Resolved {
            attributes: VisualAttributes {
                color,
                size_px,
                marker: self.marker,
                opacity: self.opacity,
                stroke_width: self.stroke_width,
                outline: self.outline,
            },
            label,
            fallbacks,
        }
    }

    /// Describes the color rule for a legend. Returns `None` for constant colors and for ramps
    /// without a known value range.
    pub fn legend(&self, title: &str) -> Option<Legend> {
        let entries = match &self.color {
            ColorResolver::Constant(_) => return None,
            ColorResolver::Ramp { range, ramp, .. } => {
                let (min, max) = (*range)?;
                LegendEntries::Ramp {
                    min,
                    max,
                    stops: ramp.stops().to_vec(),
                }
            }
            ColorResolver::Categories { categories, .. } => {
                if categories.is_empty() {
                    return None;
                }
                LegendEntries::Categories(categories.clone())
            }
        };

        Some(Legend {
            title: title.to_string(),
            entries,
        })
    }
}

fn or_default<T>(value: Option<T>, default: T, fallbacks: &mut usize) -> T {
    match value {
        Some(value) => value,
        None => {
            *fallbacks += 1;
            default
        }
    }
}

/// Numbers match keys with the same numeric value, so `1.0` matches both `"1"` and `"1.0"`.
/// Other values match keys equal to their text form.
fn category_color(
    value: &Value,
    categories: &[(String, Color)],
    numeric: &[(f64, Color)],
) -> Option<Color> {
    match value {
        Value::Number(n) => numeric
            .iter()
            .find(|(key, _)| key == n)
            .map(|(_, color)| *color),
        other => {
            let key = other.to_string();
            categories
                .iter()
                .find(|(value, _)| *value == key)
                .map(|(_, color)| *color)
        }
    }
}

fn number(record: &Record, attribute: &str) -> Option<f64> {
    record
        .attribute(attribute)?
        .as_number()
        .filter(|v| v.is_finite())
}

fn normalize(value: f64, (min, max): (f64, f64)) -> f64 {
    if max > min {
        ((value - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

fn resolve_range(
    dataset: &SealedDataset,
    attribute: &str,
    range: &ValueRange,
) -> Option<(f64, f64)> {
    match range {
        ValueRange::Explicit { min, max } => Some((*min, *max)),
        ValueRange::FromData => {
            let range = dataset.numeric_range(attribute);
            if range.is_none() {
                warn!("Attribute '{attribute}' has no numeric values, every record will use the default style");
            }
            range
        }
    }
}

fn check_numeric(dataset: &SealedDataset, attribute: &str) {
    match dataset.schema().get(attribute) {
        Some(AttributeType::Number) => {}
        Some(other) => {
            warn!("Attribute '{attribute}' is of type {other}, numeric style rules will use defaults")
        }
        None => warn!("Attribute '{attribute}' is not present in the dataset"),
    }
}
