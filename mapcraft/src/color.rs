use serde::{Deserialize, Serialize};

/// Color representation.
///
/// Serialized as a hex string (`#RRGGBBAA`). When deserializing, both `#RRGGBB` and `#RRGGBBAA`
/// forms are accepted.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_hex(&value).ok_or_else(|| format!("invalid color string: {value}"))
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// Transparent color: `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Red color: `#FF0000FF`
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    /// Green color: `#00FF00FF`
    pub const GREEN: Color = Color::rgba(0, 255, 0, 255);
    /// Blue color: `#0000FFFF`
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// Gray color: `#AAAAAAFF`
    pub const GRAY: Color = Color::rgba(170, 170, 170, 255);
    /// Purple color: `#800080FF`
    pub const PURPLE: Color = Color::rgba(128, 0, 128, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs an opaque color from its RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Converts the color into u8 array (RGBA).
    pub fn to_u8_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Converts the color into u8 array with color channels multiplied by alpha.
    pub fn to_premultiplied(&self) -> [u8; 4] {
        let a = self.a as u32;
        [
            mul_div_255(self.r as u32, a),
            mul_div_255(self.g as u32, a),
            mul_div_255(self.b as u32, a),
            self.a,
        ]
    }

    /// Restores the color from a premultiplied RGBA array.
    pub fn from_premultiplied(value: [u8; 4]) -> Self {
        let a = value[3] as u32;
        if a == 0 {
            return Self::TRANSPARENT;
        }

        let unmul = |c: u8| ((c as u32 * 255 + a / 2) / a).min(255) as u8;
        Self {
            r: unmul(value[0]),
            g: unmul(value[1]),
            b: unmul(value[2]),
            a: value[3],
        }
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`).
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        if hex_string.len() != 7 && hex_string.len() != 9 || !hex_string.starts_with('#') {
            return None;
        }

        let r = u8::from_str_radix(hex_string.get(1..3)?, 16).ok()?;
        let g = u8::from_str_radix(hex_string.get(3..5)?, 16).ok()?;
        let b = u8::from_str_radix(hex_string.get(5..7)?, 16).ok()?;
        let a = if hex_string.len() == 9 {
            u8::from_str_radix(hex_string.get(7..9)?, 16).ok()?
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`).
    ///
    /// # Panics
    ///
    /// Panics if the parsing fails.
    pub const fn from_hex(hex_string: &'static str) -> Self {
        let bytes = hex_string.as_bytes();
        if bytes.len() != 7 && bytes.len() != 9 || bytes[0] != b'#' {
            panic!("Invalid color hex string");
        }

        let r = decode_byte(&[bytes[1], bytes[2]]);
        let g = decode_byte(&[bytes[3], bytes[4]]);
        let b = decode_byte(&[bytes[5], bytes[6]]);
        let a = if hex_string.len() == 9 {
            decode_byte(&[bytes[7], bytes[8]])
        } else {
            255
        };

        Self { r, g, b, a }
    }

    /// Returns a new color instance, copied from the base one but with the given alpha channel.
    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }

    /// Returns a new color with alpha multiplied by `opacity` (clamped to `0..=1`).
    pub fn with_opacity(&self, opacity: f32) -> Self {
        let opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        Self {
            a: (self.a as f32 * opacity).round() as u8,
            ..*self
        }
    }

    /// Returns true if the color is fully transparent (`a == 0`).
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Red component of the color in RGBA space.
    pub fn r(&self) -> u8 {
        self.r
    }

    /// Green component of the color in RGBA space.
    pub fn g(&self) -> u8 {
        self.g
    }

    /// Blue component of the color in RGBA space.
    pub fn b(&self) -> u8 {
        self.b
    }

    /// Opacity component of the color.
    pub fn a(&self) -> u8 {
        self.a
    }

    /// Linear interpolation between two colors, `t` is clamped to `0..=1`.
    pub fn lerp(&self, other: Color, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Alpha blends `self` color with the given foreground one using foreground color alpha.
    pub fn blend(&self, fore: Color) -> Color {
        Color::from_premultiplied(blend_premultiplied(
            self.to_premultiplied(),
            fore.to_premultiplied(),
        ))
    }
}

/// Source-over compositing of premultiplied colors.
pub(crate) fn blend_premultiplied(back: [u8; 4], fore: [u8; 4]) -> [u8; 4] {
    let inv = 255 - fore[3] as u32;
    [
        (fore[0] as u32 + mul_div_255(back[0] as u32, inv) as u32).min(255) as u8,
        (fore[1] as u32 + mul_div_255(back[1] as u32, inv) as u32).min(255) as u8,
        (fore[2] as u32 + mul_div_255(back[2] as u32, inv) as u32).min(255) as u8,
        (fore[3] as u32 + mul_div_255(back[3] as u32, inv) as u32).min(255) as u8,
    ]
}

fn mul_div_255(value: u32, factor: u32) -> u8 {
    ((value * factor + 127) / 255) as u8
}

const fn decode_byte(chars: &[u8]) -> u8 {
    debug_assert!(chars.len() == 2);
    let first = decode_char(chars[0]);
    let second = decode_char(chars[1]);

    first * 16 + second
}

const fn decode_char(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        b'A'..=b'F' => byte - b'A' + 10,
        _ => panic!("Invalid hex character"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_serialization() {
        let hex = "#FF1000AA";
        let color = Color::try_from_hex(hex).unwrap();
        assert_eq!(&color.to_hex(), hex);

        assert_eq!(Color::from_hex(hex), color);

        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#FF1000AA\"");
        let parsed: Color = serde_json::from_str("\"#FF1000\"").unwrap();
        assert_eq!(parsed, Color::rgba(255, 16, 0, 255));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }

    #[test]
    fn premultiplied_roundtrip() {
        assert_eq!(Color::from_premultiplied(Color::RED.to_premultiplied()), Color::RED);
        assert_eq!(
            Color::from_premultiplied(Color::TRANSPARENT.to_premultiplied()),
            Color::TRANSPARENT
        );
        assert_eq!(Color::rgba(200, 100, 50, 128).to_premultiplied(), [100, 50, 25, 128]);
    }

    #[test]
    fn blending() {
        assert_eq!(Color::WHITE.blend(Color::BLACK), Color::BLACK);
        assert_eq!(Color::WHITE.blend(Color::TRANSPARENT), Color::WHITE);
        assert_eq!(Color::TRANSPARENT.blend(Color::RED), Color::RED);

        let half = Color::WHITE.blend(Color::BLACK.with_alpha(128));
        assert_eq!(half.a(), 255);
        assert_eq!(half.r(), 127);
    }

    #[test]
    fn interpolation() {
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.5), Color::rgb(128, 128, 128));
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 2.0), Color::WHITE);
        assert_eq!(Color::RED.with_opacity(0.5).a(), 128);
    }
}
