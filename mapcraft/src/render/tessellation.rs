//! Conversion of primitives into triangle meshes with `lyon`.

use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, LineCap, LineJoin,
    StrokeOptions, StrokeTessellator, StrokeVertex, VertexBuffers,
};
use lyon::math::point;
use lyon::path::Path;
use mapcraft_types::cartesian::Point2d;
use mapcraft_types::{Contour, Geom, Polygon};

use crate::color::Color;
use crate::layer::Primitive;
use crate::style::{MarkerShape, VisualAttributes};

const TOLERANCE: f32 = 0.05;

/// Triangles of a single color, in canvas sample coordinates.
#[derive(Debug, Clone)]
pub(crate) struct Mesh {
    buffers: VertexBuffers<[f32; 2], u32>,
    color: [u8; 4],
    bounds: [f32; 4],
}

impl Mesh {
    fn new(buffers: VertexBuffers<[f32; 2], u32>, color: Color) -> Option<Self> {
        if buffers.indices.is_empty() {
            return None;
        }

        let mut bounds = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
        for [x, y] in &buffers.vertices {
            bounds[0] = bounds[0].min(*x);
            bounds[1] = bounds[1].min(*y);
            bounds[2] = bounds[2].max(*x);
            bounds[3] = bounds[3].max(*y);
        }

        Some(Self {
            buffers,
            color: color.to_premultiplied(),
            bounds,
        })
    }

    /// Premultiplied color.
    pub(crate) fn color(&self) -> [u8; 4] {
        self.color
    }

    /// `[x_min, y_min, x_max, y_max]` of the vertices.
    pub(crate) fn bounds(&self) -> [f32; 4] {
        self.bounds
    }

    pub(crate) fn triangles(&self) -> impl Iterator<Item = [[f32; 2]; 3]> + '_ {
        self.buffers.indices.chunks_exact(3).map(|t| {
            [
                self.buffers.vertices[t[0] as usize],
                self.buffers.vertices[t[1] as usize],
                self.buffers.vertices[t[2] as usize],
            ]
        })
    }
}

/// Builds a path from one or more rings of points.
pub(crate) fn build_path<'a>(
    rings: impl IntoIterator<Item = &'a [[f32; 2]]>,
    closed: bool,
) -> Option<Path> {
    let mut builder = Path::builder();
    let mut is_empty = true;

    for ring in rings {
        let mut iterator = ring.iter();
        let Some(first) = iterator.next() else {
            continue;
        };

        let _ = builder.begin(point(first[0], first[1]));
        for p in iterator {
            let _ = builder.line_to(point(p[0], p[1]));
        }
        builder.end(closed);
        is_empty = false;
    }

    if is_empty {
        None
    } else {
        Some(builder.build())
    }
}

/// Fills the path using even-odd rule.
pub(crate) fn fill_path(path: &Path, color: Color) -> Option<Mesh> {
    if color.is_transparent() {
        return None;
    }

    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();
    let result = tessellator.tessellate_path(
        path,
        &FillOptions::DEFAULT
            .with_fill_rule(FillRule::EvenOdd)
            .with_tolerance(TOLERANCE),
        &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
            [vertex.position().x, vertex.position().y]
        }),
    );

    if let Err(err) = result {
        log::warn!("Failed to tessellate a shape: {err:?}");
        return None;
    }

    Mesh::new(buffers, color)
}

/// Strokes the path with the given width.
pub(crate) fn stroke_path(path: &Path, width: f32, color: Color) -> Option<Mesh> {
    if color.is_transparent() || width <= 0.0 {
        return None;
    }

    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    let mut tessellator = StrokeTessellator::new();
    let result = tessellator.tessellate_path(
        path,
        &StrokeOptions::DEFAULT
            .with_line_width(width)
            .with_line_cap(LineCap::Butt)
            .with_line_join(LineJoin::MiterClip)
            .with_miter_limit(2.0)
            .with_tolerance(TOLERANCE),
        &mut BuffersBuilder::new(&mut buffers, |vertex: StrokeVertex| {
            [vertex.position().x, vertex.position().y]
        }),
    );

    if let Err(err) = result {
        log::warn!("Failed to tessellate a line: {err:?}");
        return None;
    }

    Mesh::new(buffers, color)
}

/// Outline of a marker of diameter `2 * radius` centered at `(cx, cy)`.
pub(crate) fn marker_ring(shape: MarkerShape, cx: f32, cy: f32, radius: f32) -> Vec<[f32; 2]> {
    let r = radius;
    match shape {
        MarkerShape::Circle => {
            let segments = (std::f32::consts::TAU * r).ceil().clamp(12.0, 96.0) as usize;
            (0..segments)
                .map(|i| {
                    let angle = std::f32::consts::TAU * i as f32 / segments as f32;
                    [cx + r * angle.cos(), cy + r * angle.sin()]
                })
                .collect()
        }
        MarkerShape::Square => vec![
            [cx - r, cy - r],
            [cx + r, cy - r],
            [cx + r, cy + r],
            [cx - r, cy + r],
        ],
        MarkerShape::Triangle => {
            let half_base = r * 0.866_025_4;
            vec![
                [cx, cy - r],
                [cx + half_base, cy + r * 0.5],
                [cx - half_base, cy + r * 0.5],
            ]
        }
        MarkerShape::Diamond => vec![
            [cx, cy - r],
            [cx + r, cy],
            [cx, cy + r],
            [cx - r, cy],
        ],
        MarkerShape::Cross => {
            let t = r / 3.0;
            vec![
                [cx - t, cy - r],
                [cx + t, cy - r],
                [cx + t, cy - t],
                [cx + r, cy - t],
                [cx + r, cy + t],
                [cx + t, cy + t],
                [cx + t, cy + r],
                [cx - t, cy + r],
                [cx - t, cy + t],
                [cx - r, cy + t],
                [cx - r, cy - t],
                [cx - t, cy - t],
            ]
        }
    }
}

/// Converts a primitive into meshes in drawing order (fill first, outline second).
///
/// `scale` converts output pixels into canvas samples. Primitives that are completely outside of
/// `canvas_size` are skipped.
pub(crate) fn tessellate_primitive(
    primitive: &Primitive,
    scale: f32,
    canvas_size: [f32; 2],
) -> Vec<Mesh> {
    let attributes = &primitive.attributes;
    let margin = margin(attributes) * scale + 1.0;
    if !intersects_canvas(&primitive.geometry, scale, margin, canvas_size) {
        return vec![];
    }

    let color = attributes.color.with_opacity(attributes.opacity);
    let outline = attributes
        .outline
        .map(|o| (o.width * scale, o.color.with_opacity(attributes.opacity)));

    let mut meshes = vec![];
    match &primitive.geometry {
        Geom::Point(p) => {
            let radius = attributes.size_px * scale / 2.0;
            if radius <= 0.0 {
                return meshes;
            }

            let ring = marker_ring(
                attributes.marker,
                p.x as f32 * scale,
                p.y as f32 * scale,
                radius,
            );
            if let Some(path) = build_path([ring.as_slice()], true) {
                meshes.extend(fill_path(&path, color));
                if let Some((width, color)) = outline {
                    meshes.extend(stroke_path(&path, width, color));
                }
            }
        }
        Geom::Contour(contour) => {
            let points = scaled(contour, scale);
            if let Some(path) = build_path([points.as_slice()], contour.is_closed()) {
                meshes.extend(stroke_path(
                    &path,
                    attributes.stroke_width * scale,
                    color,
                ));
            }
        }
        Geom::Polygon(polygon) => {
            let rings = polygon_rings(polygon, scale);
            if let Some(path) = build_path(rings.iter().map(Vec::as_slice), true) {
                meshes.extend(fill_path(&path, color));
                if let Some((width, color)) = outline {
                    meshes.extend(stroke_path(&path, width, color));
                }
            }
        }
    }

    meshes
}

fn scaled(contour: &Contour<Point2d>, scale: f32) -> Vec<[f32; 2]> {
    contour
        .iter_points()
        .map(|p| [p.x as f32 * scale, p.y as f32 * scale])
        .collect()
}

fn polygon_rings(polygon: &Polygon<Point2d>, scale: f32) -> Vec<Vec<[f32; 2]>> {
    polygon
        .iter_contours()
        .map(|contour| scaled(contour, scale))
        .collect()
}

fn margin(attributes: &VisualAttributes) -> f32 {
    let outline = attributes.outline.map(|o| o.width).unwrap_or(0.0);
    (attributes.size_px / 2.0)
        .max(attributes.stroke_width / 2.0)
        .max(0.0)
        + outline
}

fn intersects_canvas(
    geometry: &Geom<Point2d>,
    scale: f32,
    margin: f32,
    canvas_size: [f32; 2],
) -> bool {
    let mut bounds = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
    for p in geometry.iter_points() {
        bounds[0] = bounds[0].min(p.x);
        bounds[1] = bounds[1].min(p.y);
        bounds[2] = bounds[2].max(p.x);
        bounds[3] = bounds[3].max(p.y);
    }

    let scale = scale as f64;
    let margin = margin as f64;
    bounds[0] * scale - margin < canvas_size[0] as f64
        && bounds[1] * scale - margin < canvas_size[1] as f64
        && bounds[2] * scale + margin > 0.0
        && bounds[3] * scale + margin > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Outline;

    fn primitive(geometry: Geom<Point2d>) -> Primitive {
        Primitive {
            geometry,
            attributes: VisualAttributes {
                color: Color::RED,
                size_px: 10.0,
                marker: MarkerShape::Circle,
                opacity: 1.0,
                stroke_width: 2.0,
                outline: Some(Outline {
                    color: Color::BLACK,
                    width: 1.0,
                }),
            },
            label: None,
        }
    }

    fn triangles_area(mesh: &Mesh) -> f32 {
        mesh.triangles()
            .map(|[a, b, c]| {
                ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])).abs() / 2.0
            })
            .sum()
    }

    #[test]
    fn marker_has_fill_and_outline() {
        let meshes = tessellate_primitive(
            &primitive(Geom::Point(Point2d::new(50.0, 50.0))),
            1.0,
            [100.0, 100.0],
        );
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].color(), Color::RED.to_premultiplied());
        assert_eq!(meshes[1].color(), Color::BLACK.to_premultiplied());

        let area = triangles_area(&meshes[0]);
        assert!((area - std::f32::consts::PI * 25.0).abs() < 2.0, "{area}");

        let bounds = meshes[0].bounds();
        assert!((bounds[0] - 45.0).abs() < 0.01);
        assert!((bounds[3] - 55.0).abs() < 0.01);
    }

    #[test]
    fn square_marker_area_scales() {
        let mut primitive = primitive(Geom::Point(Point2d::new(10.0, 10.0)));
        primitive.attributes.marker = MarkerShape::Square;
        primitive.attributes.outline = None;

        let meshes = tessellate_primitive(&primitive, 2.0, [100.0, 100.0]);
        assert_eq!(meshes.len(), 1);
        assert!((triangles_area(&meshes[0]) - 400.0).abs() < 0.01);
    }

    #[test]
    fn off_canvas_primitives_are_skipped() {
        let meshes = tessellate_primitive(
            &primitive(Geom::Point(Point2d::new(-50.0, 50.0))),
            1.0,
            [100.0, 100.0],
        );
        assert!(meshes.is_empty());

        let meshes = tessellate_primitive(
            &primitive(Geom::Point(Point2d::new(-4.0, 50.0))),
            1.0,
            [100.0, 100.0],
        );
        assert_eq!(meshes.len(), 2);
    }

    #[test]
    fn lines_and_polygons() {
        let line = Contour::open(vec![Point2d::new(0.0, 10.0), Point2d::new(20.0, 10.0)]);
        let meshes = tessellate_primitive(&primitive(line.into()), 1.0, [100.0, 100.0]);
        assert_eq!(meshes.len(), 1);
        assert!((triangles_area(&meshes[0]) - 40.0).abs() < 0.01);

        let polygon = Polygon::new(
            vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(10.0, 0.0),
                Point2d::new(10.0, 10.0),
                Point2d::new(0.0, 10.0),
            ],
            vec![vec![
                Point2d::new(2.0, 2.0),
                Point2d::new(4.0, 2.0),
                Point2d::new(4.0, 4.0),
                Point2d::new(2.0, 4.0),
            ]],
        );
        let meshes = tessellate_primitive(&primitive(polygon.into()), 1.0, [100.0, 100.0]);
        assert_eq!(meshes.len(), 2);
        assert!((triangles_area(&meshes[0]) - 96.0).abs() < 0.01);
    }

    #[test]
    fn invisible_primitives_produce_nothing() {
        let mut primitive = primitive(Geom::Point(Point2d::new(10.0, 10.0)));
        primitive.attributes.size_px = 0.0;
        assert!(tessellate_primitive(&primitive, 1.0, [100.0, 100.0]).is_empty());

        primitive.attributes.size_px = 5.0;
        primitive.attributes.opacity = 0.0;
        assert!(tessellate_primitive(&primitive, 1.0, [100.0, 100.0]).is_empty());
    }
}
