//! This module contains utilities for loading images used as map backgrounds.

use std::path::Path;

use crate::color::Color;
use crate::error::MapcraftError;

/// An image that has been loaded into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Raw bytes of the image, in RGBA order.
    bytes: Vec<u8>,
    /// Width and height of the image.
    dimensions: (u32, u32),
}

impl DecodedImage {
    /// Decode an image from a byte slice.
    ///
    /// Attempts to guess the format of the image from the data. Non-RGBA images
    /// will be converted to RGBA.
    pub fn new(bytes: &[u8]) -> Result<Self, MapcraftError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    /// Reads and decodes an image file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MapcraftError> {
        let bytes = std::fs::read(path)?;
        Self::new(&bytes)
    }

    /// Creates an image from raw RGBA bytes.
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, MapcraftError> {
        if bytes.len() as u64 != width as u64 * height as u64 * 4 {
            return Err(MapcraftError::Configuration(format!(
                "expected {width}x{height} RGBA image, got {} bytes",
                bytes.len()
            )));
        }

        Ok(Self {
            bytes,
            dimensions: (width, height),
        })
    }

    fn from_rgba(image: image::RgbaImage) -> Self {
        let dimensions = image.dimensions();
        Self {
            bytes: image.into_raw(),
            dimensions,
        }
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// Color of the pixel. Coordinates outside of the image are clamped to its border.
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width().saturating_sub(1)) as usize;
        let y = y.min(self.height().saturating_sub(1)) as usize;
        let offset = (y * self.width() as usize + x) * 4;
        match self.bytes.get(offset..offset + 4) {
            Some(p) => Color::rgba(p[0], p[1], p[2], p[3]),
            None => Color::TRANSPARENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn decodes_png() {
        let mut image = image::RgbaImage::new(2, 1);
        image.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();

        let decoded = DecodedImage::new(bytes.get_ref()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 1));
        assert_eq!(decoded.pixel(1, 0), Color::rgb(10, 20, 30));
        assert_eq!(decoded.pixel(5, 5), Color::rgb(10, 20, 30));
        assert_eq!(decoded.pixel(0, 0), Color::TRANSPARENT);
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(
            DecodedImage::new(b"not an image"),
            Err(MapcraftError::ImageDecode(_))
        );
        assert_matches!(
            DecodedImage::from_raw(2, 2, vec![0; 3]),
            Err(MapcraftError::Configuration(_))
        );
    }
}
