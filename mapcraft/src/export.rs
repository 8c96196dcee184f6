//! Encoding of rendered images and writing them to files.

use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::MapcraftError;
use crate::render::PixelBuffer;

const JPEG_QUALITY: u8 = 90;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless PNG with alpha channel.
    Png,
    /// JPEG. Transparent pixels are composed over white.
    Jpeg,
}

impl ImageFormat {
    /// Guesses the format from the extension of the path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MapcraftError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                MapcraftError::UnsupportedFormat(format!(
                    "cannot determine format of '{}'",
                    path.display()
                ))
            })?;

        extension.parse()
    }

    /// Usual file extension of the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = MapcraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(MapcraftError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// Encodes the buffer into the given format.
pub fn encode(buffer: &PixelBuffer, format: ImageFormat) -> Result<Vec<u8>, MapcraftError> {
    let mut bytes = vec![];
    let (width, height) = (buffer.width(), buffer.height());

    let result = match format {
        ImageFormat::Png => PngEncoder::new(&mut bytes).write_image(
            buffer.as_bytes(),
            width,
            height,
            ColorType::Rgba8,
        ),
        ImageFormat::Jpeg => {
            let rgb = flatten_over_white(buffer.as_bytes());
            JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).write_image(
                &rgb,
                width,
                height,
                ColorType::Rgb8,
            )
        }
    };

    result.map_err(|err| MapcraftError::Encoding(err.to_string()))?;
    Ok(bytes)
}

/// Writes the buffer to a file.
///
/// If `format` is not given, it is determined by the path extension. Filesystem errors are
/// returned as [`MapcraftError::IoWrite`] without retrying.
pub fn export(
    buffer: &PixelBuffer,
    path: impl AsRef<Path>,
    format: Option<ImageFormat>,
) -> Result<(), MapcraftError> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => ImageFormat::from_path(path)?,
    };

    let bytes = encode(buffer, format)?;
    std::fs::write(path, &bytes).map_err(|source| MapcraftError::IoWrite {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Saved {}x{} {format} image to '{}' ({} bytes)",
        buffer.width(),
        buffer.height(),
        path.display(),
        bytes.len()
    );

    Ok(())
}

fn flatten_over_white(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|p| {
            let a = p[3] as u32;
            let over = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
            [over(p[0]), over(p[1]), over(p[2])]
        })
        .collect()
}
