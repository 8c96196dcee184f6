use mapcraft_types::cartesian::Size;

use crate::color::Color;

/// Rendered image: RGBA pixels with straight (not premultiplied) alpha, row by row from the
/// top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    pub(crate) fn new(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        debug_assert_eq!(bytes.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            bytes,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the image.
    pub fn size(&self) -> Size<u32> {
        Size::new(self.width, self.height)
    }

    /// Color of the pixel, or `None` if the coordinates are outside of the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.bytes[offset..offset + 4];
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Raw RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the buffer returning raw RGBA bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
