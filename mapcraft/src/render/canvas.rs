use rayon::prelude::*;

use crate::color::{blend_premultiplied, Color};
use crate::render::pixel_buffer::PixelBuffer;
use crate::render::tessellation::Mesh;

/// Rows per band for parallel rasterization.
const BAND_HEIGHT: usize = 32;

/// CPU drawing surface. Pixels are stored with premultiplied alpha.
#[derive(Debug, Clone)]
pub(crate) struct Canvas {
    width: u32,
    height: u32,
    data: Vec<[u8; 4]>,
}

impl Canvas {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![[0; 4]; width as usize * height as usize],
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn fill(&mut self, color: Color) {
        self.data.fill(color.to_premultiplied());
    }

    /// Sets every pixel to the color returned by `f(x, y)`.
    pub(crate) fn fill_with(&mut self, f: impl Fn(u32, u32) -> Color + Sync) {
        let width = self.width as usize;
        if width == 0 {
            return;
        }

        self.data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = f(x as u32, y as u32).to_premultiplied();
                }
            });
    }

    /// Returns true if the pixel exists and is not fully transparent.
    pub(crate) fn is_set(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }

        self.data[y as usize * self.width as usize + x as usize][3] > 0
    }

    /// Blends the color over the pixel. Coordinates outside of the canvas are ignored.
    pub(crate) fn blend(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }

        let index = y as usize * self.width as usize + x as usize;
        self.data[index] = blend_premultiplied(self.data[index], color.to_premultiplied());
    }

    /// Blends the color over the rectangle `[x0, x1) x [y0, y1)`, clipped to the canvas.
    pub(crate) fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        let fore = color.to_premultiplied();
        let x0 = x0.clamp(0, self.width as i64) as usize;
        let x1 = x1.clamp(0, self.width as i64) as usize;
        let y0 = y0.clamp(0, self.height as i64) as usize;
        let y1 = y1.clamp(0, self.height as i64) as usize;

        for y in y0..y1 {
            let row = y * self.width as usize;
            for pixel in &mut self.data[row + x0..row + x1] {
                *pixel = blend_premultiplied(*pixel, fore);
            }
        }
    }

    /// Draws meshes in the given order.
    ///
    /// The canvas is split into horizontal bands that are rasterized in parallel. Inside a band
    /// meshes are drawn sequentially, and every pixel covered by a mesh is blended exactly once
    /// even if several triangles of the mesh touch it.
    pub(crate) fn draw_meshes(&mut self, meshes: &[Mesh]) {
        let width = self.width as usize;
        if width == 0 || meshes.is_empty() {
            return;
        }

        self.data
            .par_chunks_mut(width * BAND_HEIGHT)
            .enumerate()
            .for_each(|(band, pixels)| {
                let mut band = Band {
                    pixels,
                    width,
                    y_start: band * BAND_HEIGHT,
                };
                let mut mask = vec![];
                for mesh in meshes {
                    band.draw_mesh(mesh, &mut mask);
                }
            });
    }

    /// Averages every `factor x factor` block of pixels into one.
    pub(crate) fn downsample(&self, factor: u32) -> Canvas {
        if factor <= 1 {
            return self.clone();
        }

        let width = self.width / factor;
        let height = self.height / factor;
        let mut result = Canvas::new(width, height);
        if width == 0 {
            return result;
        }

        let factor = factor as usize;
        let samples = (factor * factor) as u32;
        let source_width = self.width as usize;

        result
            .data
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let mut sum = [0u32; 4];
                    for sy in y * factor..(y + 1) * factor {
                        let line = &self.data[sy * source_width..(sy + 1) * source_width];
                        for sample in &line[x * factor..(x + 1) * factor] {
                            for c in 0..4 {
                                sum[c] += sample[c] as u32;
                            }
                        }
                    }

                    *pixel = sum.map(|s| ((s + samples / 2) / samples) as u8);
                }
            });

        result
    }

    pub(crate) fn into_pixel_buffer(self) -> PixelBuffer {
        let bytes = self
            .data
            .into_iter()
            .flat_map(|p| Color::from_premultiplied(p).to_u8_array())
            .collect();
        PixelBuffer::new(self.width, self.height, bytes)
    }
}

struct Band<'a> {
    pixels: &'a mut [[u8; 4]],
    width: usize,
    y_start: usize,
}

impl Band<'_> {
    fn height(&self) -> usize {
        self.pixels.len() / self.width
    }

    fn draw_mesh(&mut self, mesh: &Mesh, mask: &mut Vec<bool>) {
        let [bx0, by0, bx1, by1] = mesh.bounds();
        let Some((x0, x1)) = pixel_span(bx0, bx1, 0, self.width) else {
            return;
        };
        let Some((y0, y1)) = pixel_span(by0, by1, self.y_start, self.y_start + self.height())
        else {
            return;
        };

        let mask_width = x1 - x0;
        mask.clear();
        mask.resize(mask_width * (y1 - y0), false);

        for [a, b, c] in mesh.triangles() {
            let area = edge(a, b, c);
            if area == 0.0 || !area.is_finite() {
                continue;
            }

            let tx0 = a[0].min(b[0]).min(c[0]);
            let tx1 = a[0].max(b[0]).max(c[0]);
            let ty0 = a[1].min(b[1]).min(c[1]);
            let ty1 = a[1].max(b[1]).max(c[1]);
            let Some((sx0, sx1)) = pixel_span(tx0, tx1, x0, x1) else {
                continue;
            };
            let Some((sy0, sy1)) = pixel_span(ty0, ty1, y0, y1) else {
                continue;
            };

            for y in sy0..sy1 {
                let py = y as f32 + 0.5;
                let row = (y - y0) * mask_width;
                for x in sx0..sx1 {
                    let p = [x as f32 + 0.5, py];
                    let w0 = edge(a, b, p);
                    let w1 = edge(b, c, p);
                    let w2 = edge(c, a, p);
                    let inside = if area > 0.0 {
                        w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                    } else {
                        w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                    };
                    if inside {
                        mask[row + x - x0] = true;
                    }
                }
            }
        }

        let color = mesh.color();
        for y in y0..y1 {
            let mask_row = &mask[(y - y0) * mask_width..(y - y0 + 1) * mask_width];
            let row = (y - self.y_start) * self.width;
            for (i, covered) in mask_row.iter().enumerate() {
                if *covered {
                    let pixel = &mut self.pixels[row + x0 + i];
                    *pixel = blend_premultiplied(*pixel, color);
                }
            }
        }
    }
}

/// Range of pixel indices within `[min_index, max_index)` whose centers can fall into
/// `[from, to]`.
fn pixel_span(from: f32, to: f32, min_index: usize, max_index: usize) -> Option<(usize, usize)> {
    if !(from.is_finite() && to.is_finite()) {
        return None;
    }

    let start = (from - 0.5).ceil().max(min_index as f32);
    let end = ((to - 0.5).floor() + 1.0).min(max_index as f32);
    if start >= end {
        return None;
    }

    Some((start as usize, end as usize))
}

fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

#[cfg(test)]
mod tests {
    use mapcraft_types::cartesian::Point2d;
    use mapcraft_types::Geom;

    use super::*;
    use crate::layer::Primitive;
    use crate::render::tessellation::tessellate_primitive;
    use crate::style::{MarkerShape, VisualAttributes};

    fn square(x: f64, y: f64, size: f32, color: Color) -> Vec<Mesh> {
        let primitive = Primitive {
            geometry: Geom::Point(Point2d::new(x, y)),
            attributes: VisualAttributes {
                color,
                size_px: size,
                marker: MarkerShape::Square,
                opacity: 1.0,
                stroke_width: 1.0,
                outline: None,
            },
            label: None,
        };
        tessellate_primitive(&primitive, 1.0, [100.0, 100.0])
    }

    fn covered(canvas: &Canvas) -> usize {
        canvas.data.iter().filter(|p| p[3] > 0).count()
    }

    #[test]
    fn square_covers_exact_pixels() {
        let mut canvas = Canvas::new(20, 20);
        canvas.draw_meshes(&square(10.0, 10.0, 4.0, Color::RED));
        assert_eq!(covered(&canvas), 16);

        let buffer = canvas.into_pixel_buffer();
        assert_eq!(buffer.pixel(8, 8), Some(Color::RED));
        assert_eq!(buffer.pixel(11, 11), Some(Color::RED));
        assert_eq!(buffer.pixel(12, 12), Some(Color::TRANSPARENT));
    }

    #[test]
    fn shared_edges_are_blended_once() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(Color::WHITE);
        canvas.draw_meshes(&square(10.0, 10.0, 8.0, Color::BLACK.with_alpha(128)));

        let buffer = canvas.into_pixel_buffer();
        let reference = buffer.pixel(7, 7);
        for y in 6..14 {
            for x in 6..14 {
                assert_eq!(buffer.pixel(x, y), reference, "pixel {x}, {y}");
            }
        }
    }

    #[test]
    fn bands_do_not_change_result() {
        let mut meshes = vec![];
        for i in 0..20 {
            meshes.extend(square(
                5.0 + i as f64 * 4.5,
                3.0 + i as f64 * 4.7,
                9.0,
                Color::rgba((i * 12) as u8, 100, 200, 180),
            ));
        }

        let mut first = Canvas::new(100, 100);
        first.draw_meshes(&meshes);
        let mut second = Canvas::new(100, 100);
        second.draw_meshes(&meshes);
        assert_eq!(first.data, second.data);

        let pixel = first.data[32 * 100 + 33];
        assert!(pixel[3] > 0);
    }

    #[test]
    fn downsampling_averages_blocks() {
        let mut canvas = Canvas::new(4, 2);
        canvas.fill_rect(0, 0, 1, 2, Color::WHITE);
        canvas.fill_rect(2, 0, 4, 2, Color::RED);

        let small = canvas.downsample(2);
        assert_eq!((small.width(), small.height()), (2, 1));
        let buffer = small.into_pixel_buffer();
        assert_eq!(buffer.pixel(0, 0), Some(Color::rgba(255, 255, 255, 128)));
        assert_eq!(buffer.pixel(1, 0), Some(Color::RED));
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_rect(-10, -10, 2, 2, Color::BLUE);
        canvas.blend(10, 10, Color::BLUE);
        assert_eq!(covered(&canvas), 4);
    }
}
