use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::MapcraftError;

/// Named color schemes for ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Dark purple -> Teal -> Yellow (perceptually uniform).
    Viridis,
    /// Green -> Yellow -> Brown -> White (elevation).
    Terrain,
    /// Light yellow -> Orange -> Dark red.
    Heat,
    /// White -> Dark blue.
    Blues,
    /// Black -> White.
    Grayscale,
}

impl ColorScheme {
    /// All available schemes.
    pub const ALL: &'static [ColorScheme] = &[
        Self::Viridis,
        Self::Terrain,
        Self::Heat,
        Self::Blues,
        Self::Grayscale,
    ];

    fn stops(&self) -> Vec<ColorStop> {
        let stops: &[(f64, &'static str)] = match self {
            ColorScheme::Viridis => &[
                (0.00, "#440154"),
                (0.25, "#3B528B"),
                (0.50, "#21918C"),
                (0.75, "#5EC962"),
                (1.00, "#FDE725"),
            ],
            ColorScheme::Terrain => &[
                (0.00, "#228B22"),
                (0.25, "#90BE3C"),
                (0.50, "#DCC850"),
                (0.75, "#B4783C"),
                (1.00, "#FFFFFF"),
            ],
            ColorScheme::Heat => &[
                (0.00, "#FFFFB2"),
                (0.25, "#FECC5C"),
                (0.50, "#FD8D3C"),
                (0.75, "#F03B20"),
                (1.00, "#BD0026"),
            ],
            ColorScheme::Blues => &[
                (0.00, "#F7FBFF"),
                (0.50, "#6BAED6"),
                (1.00, "#08306B"),
            ],
            ColorScheme::Grayscale => &[(0.00, "#000000"), (1.00, "#FFFFFF")],
        };

        stops
            .iter()
            .map(|(t, hex)| ColorStop::new(*t, Color::from_hex(*hex)))
            .collect()
    }
}

/// Color at a normalized position of a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position in `[0, 1]`.
    pub t: f64,
    /// Color at the position.
    pub color: Color,
}

impl ColorStop {
    /// Creates a new stop.
    pub const fn new(t: f64, color: Color) -> Self {
        Self { t, color }
    }
}

/// Colors of a ramp: either a named scheme or explicit stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RampColors {
    /// Named scheme.
    Scheme(ColorScheme),
    /// Explicit stops, sorted by position.
    Stops(Vec<ColorStop>),
}

impl Default for RampColors {
    fn default() -> Self {
        Self::Scheme(ColorScheme::Viridis)
    }
}

/// Multi-stop linear color interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<ColorStop>,
}

impl ColorRamp {
    /// Creates a ramp from the stops.
    ///
    /// Stops must be non-empty, lie in `[0, 1]` and be sorted by position.
    pub fn new(stops: Vec<ColorStop>) -> Result<Self, MapcraftError> {
        if stops.is_empty() {
            return Err(MapcraftError::Configuration(
                "color ramp must have at least one stop".into(),
            ));
        }

        if stops.iter().any(|s| !(0.0..=1.0).contains(&s.t)) {
            return Err(MapcraftError::Configuration(
                "color ramp stops must be in [0, 1]".into(),
            ));
        }

        if stops.windows(2).any(|w| w[0].t > w[1].t) {
            return Err(MapcraftError::Configuration(
                "color ramp stops must be sorted".into(),
            ));
        }

        Ok(Self { stops })
    }

    /// Creates a ramp of a named scheme.
    pub fn from_scheme(scheme: ColorScheme) -> Self {
        Self {
            stops: scheme.stops(),
        }
    }

    pub(crate) fn from_colors(colors: &RampColors) -> Result<Self, MapcraftError> {
        match colors {
            RampColors::Scheme(scheme) => Ok(Self::from_scheme(*scheme)),
            RampColors::Stops(stops) => Self::new(stops.clone()),
        }
    }

    /// Stops of the ramp.
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color at position `t`. Values outside of `[0, 1]` are clamped.
    pub fn evaluate(&self, t: f64) -> Color {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];

        if t.is_nan() || t <= first.t {
            return first.color;
        }
        if t >= last.t {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if t <= to.t {
                let span = to.t - from.t;
                if span <= 0.0 {
                    return to.color;
                }
                return from.color.lerp(to.color, (t - from.t) / span);
            }
        }

        last.color
    }
}
