//! Drawing of map backgrounds.

use mapcraft_types::latlon;

use crate::color::Color;
use crate::decoded_image::DecodedImage;
use crate::error::MapcraftError;
use crate::map::Basemap;
use crate::projector::Projector;
use crate::render::canvas::Canvas;
use crate::render::tessellation::{build_path, stroke_path, Mesh};
use crate::viewport::Viewport;

/// Upper limit of the number of graticule lines in one direction.
const MAX_GRID_LINES: f64 = 10_000.0;
/// Number of segments every graticule line is split into, so that curved lines stay smooth.
const LINE_SEGMENTS: usize = 64;
const LINE_WIDTH: f32 = 1.0;

/// Draws the basemap on a canvas that is `scale` times larger than the viewport.
pub(crate) fn draw_basemap(
    canvas: &mut Canvas,
    basemap: &Basemap,
    viewport: &Viewport,
    scale: u32,
) -> Result<(), MapcraftError> {
    match basemap {
        Basemap::Solid(color) => canvas.fill(*color),
        Basemap::Graticule {
            background,
            line,
            spacing_deg,
        } => {
            canvas.fill(*background);
            let meshes = graticule_meshes(viewport, *spacing_deg, *line, scale as f32)?;
            canvas.draw_meshes(&meshes);
        }
        Basemap::Image(image) => draw_image(canvas, image),
    }

    Ok(())
}

fn draw_image(canvas: &mut Canvas, image: &DecodedImage) {
    let (width, height) = (canvas.width() as u64, canvas.height() as u64);
    let (image_width, image_height) = (image.width() as u64, image.height() as u64);
    if width == 0 || height == 0 || image_width == 0 || image_height == 0 {
        return;
    }

    canvas.fill_with(|x, y| {
        let sx = (x as u64 * image_width / width) as u32;
        let sy = (y as u64 * image_height / height) as u32;
        image.pixel(sx, sy)
    });
}

fn grid_values(from: f64, to: f64, spacing: f64) -> Vec<f64> {
    let first = (from / spacing).ceil() as i64;
    let last = (to / spacing).floor() as i64;
    (first..=last).map(|i| i as f64 * spacing).collect()
}

fn graticule_meshes(
    viewport: &Viewport,
    spacing: f64,
    color: Color,
    scale: f32,
) -> Result<Vec<Mesh>, MapcraftError> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(MapcraftError::Configuration(format!(
            "graticule spacing must be a positive number, got {spacing}"
        )));
    }

    let bbox = viewport.bbox();
    if (bbox.max_lat() - bbox.min_lat()).max(bbox.max_lon() - bbox.min_lon()) / spacing
        > MAX_GRID_LINES
    {
        return Err(MapcraftError::Configuration(format!(
            "graticule spacing of {spacing} degrees produces too many lines"
        )));
    }

    let projector = Projector::new(viewport)?;
    let mut lines = vec![];
    for lon in grid_values(bbox.min_lon(), bbox.max_lon(), spacing) {
        lines.push(sample_line(|t| {
            latlon!(bbox.min_lat() + (bbox.max_lat() - bbox.min_lat()) * t, lon)
        }));
    }
    for lat in grid_values(bbox.min_lat(), bbox.max_lat(), spacing) {
        lines.push(sample_line(|t| {
            latlon!(lat, bbox.min_lon() + (bbox.max_lon() - bbox.min_lon()) * t)
        }));
    }

    let meshes = lines
        .into_iter()
        .filter_map(|line| {
            let points = line
                .iter()
                .filter_map(|p| projector.project(p))
                .map(|p| [p.x as f32 * scale, p.y as f32 * scale])
                .collect::<Vec<_>>();
            let path = build_path([points.as_slice()], false)?;
            stroke_path(&path, LINE_WIDTH * scale, color)
        })
        .collect();

    Ok(meshes)
}

fn sample_line<P>(point_at: impl Fn(f64) -> P) -> Vec<P> {
    (0..=LINE_SEGMENTS)
        .map(|i| point_at(i as f64 / LINE_SEGMENTS as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mapcraft_types::cartesian::Size;

    use mapcraft_types::geo::GeoRect;

    use super::*;
    use crate::projector::ProjectionKind;

    fn viewport() -> Viewport {
        Viewport::new(
            GeoRect::new(-10.0, -10.0, 10.0, 10.0).unwrap(),
            Size::new(100, 100),
            ProjectionKind::Equirectangular,
        )
    }

    #[test]
    fn grid_values_are_aligned_to_spacing() {
        assert_eq!(grid_values(-10.0, 10.0, 5.0), vec![-10.0, -5.0, 0.0, 5.0, 10.0]);
        assert_eq!(grid_values(1.0, 4.0, 5.0), Vec::<f64>::new());
    }

    #[test]
    fn graticule_lines_are_drawn() {
        let mut canvas = Canvas::new(100, 100);
        let basemap = Basemap::Graticule {
            background: Color::WHITE,
            line: Color::BLACK,
            spacing_deg: 5.0,
        };
        draw_basemap(&mut canvas, &basemap, &viewport(), 1).unwrap();
        let buffer = canvas.into_pixel_buffer();

        // Meridian at 0 degrees is in the middle of the image.
        assert!([49, 50]
            .into_iter()
            .any(|x| buffer.pixel(x, 10) == Some(Color::BLACK)));
        assert_eq!(buffer.pixel(40, 10), Some(Color::WHITE));
        assert_eq!(buffer.pixel(37, 37), Some(Color::WHITE));
    }

    #[test]
    fn invalid_spacing_is_rejected() {
        for spacing_deg in [0.0, -1.0, f64::NAN, 1e-6] {
            let basemap = Basemap::Graticule {
                background: Color::WHITE,
                line: Color::BLACK,
                spacing_deg,
            };
            let result = draw_basemap(&mut Canvas::new(10, 10), &basemap, &viewport(), 1);
            assert_matches!(result, Err(MapcraftError::Configuration(_)));
        }
    }

    #[test]
    fn image_is_stretched() {
        let image =
            DecodedImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
        let mut canvas = Canvas::new(4, 2);
        draw_basemap(&mut canvas, &Basemap::Image(image), &viewport(), 1).unwrap();
        let buffer = canvas.into_pixel_buffer();

        assert_eq!(buffer.pixel(1, 1), Some(Color::RED));
        assert_eq!(buffer.pixel(2, 0), Some(Color::BLUE));
    }
}
