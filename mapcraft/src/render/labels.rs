//! Greedy placement of text labels.

use ahash::AHashMap;
use mapcraft_types::geometry::Geom;

use crate::color::Color;
use crate::layer::Primitive;
use crate::projector::PixelCoordinate;
use crate::render::canvas::Canvas;
use crate::render::font::{draw_text_with_halo, text_size};

/// Scale of the built-in font used for labels.
pub(crate) const LABEL_FONT_SCALE: u32 = 2;

const CELL_SIZE: i64 = 64;
const LABEL_GAP: i64 = 3;

/// Screen rectangle `[x0, y0, x1, y1)` in pixels.
type Area = [i64; 4];

/// Keeps track of the screen areas taken by placed labels.
#[derive(Debug, Default)]
pub(crate) struct LabelIndex {
    placed: Vec<Area>,
    cells: AHashMap<(i64, i64), Vec<usize>>,
}

impl LabelIndex {
    fn cells(area: &Area) -> impl Iterator<Item = (i64, i64)> {
        let [x0, y0, x1, y1] = *area;
        let (cx0, cx1) = (x0.div_euclid(CELL_SIZE), (x1 - 1).div_euclid(CELL_SIZE));
        let (cy0, cy1) = (y0.div_euclid(CELL_SIZE), (y1 - 1).div_euclid(CELL_SIZE));
        (cy0..=cy1).flat_map(move |cy| (cx0..=cx1).map(move |cx| (cx, cy)))
    }

    fn is_free(&self, area: &Area) -> bool {
        Self::cells(area).all(|cell| {
            self.cells.get(&cell).map_or(true, |indices| {
                indices
                    .iter()
                    .all(|&index| !overlaps(&self.placed[index], area))
            })
        })
    }

    fn insert(&mut self, area: Area) {
        let index = self.placed.len();
        for cell in Self::cells(&area) {
            self.cells.entry(cell).or_default().push(index);
        }
        self.placed.push(area);
    }

    pub(crate) fn len(&self) -> usize {
        self.placed.len()
    }
}

fn overlaps(a: &Area, b: &Area) -> bool {
    a[0] < b[2] && b[0] < a[2] && a[1] < b[3] && b[1] < a[3]
}

/// Point the label is attached to and the distance to keep from it.
fn anchor(primitive: &Primitive) -> Option<(PixelCoordinate, f64)> {
    match &primitive.geometry {
        Geom::Point(p) => Some((*p, primitive.attributes.size_px as f64 / 2.0)),
        Geom::Contour(contour) => {
            let points = contour.points();
            points
                .get(points.len() / 2)
                .map(|p| (*p, primitive.attributes.stroke_width as f64 / 2.0))
        }
        Geom::Polygon(polygon) => {
            let (mut min, mut max) = ([f64::MAX; 2], [f64::MIN; 2]);
            for p in polygon.outer_contour().iter_points() {
                min = [min[0].min(p.x), min[1].min(p.y)];
                max = [max[0].max(p.x), max[1].max(p.y)];
            }

            (min[0] <= max[0]).then(|| {
                (
                    PixelCoordinate::new((min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0),
                    0.0,
                )
            })
        }
    }
}

/// Candidate areas of a label of the given size: right, left, above and below the anchor.
fn candidates(anchor: PixelCoordinate, offset: f64, width: i64, height: i64) -> [Area; 4] {
    let x = anchor.x.round() as i64;
    let y = anchor.y.round() as i64;
    let offset = offset.ceil() as i64 + LABEL_GAP;

    let right = x + offset;
    let left = x - offset - width;
    let top = y - height / 2;
    let above = y - offset - height;
    let below = y + offset;
    let center = x - width / 2;

    [
        [right, top, right + width, top + height],
        [left, top, left + width, top + height],
        [center, above, center + width, above + height],
        [center, below, center + width, below + height],
    ]
}

/// Draws labels of the primitives that fit without overlapping labels placed before them.
///
/// Labels that do not fit completely inside the canvas are dropped.
pub(crate) fn place_labels<'a>(
    canvas: &mut Canvas,
    primitives: impl IntoIterator<Item = &'a Primitive>,
    index: &mut LabelIndex,
) {
    let canvas_area = [0, 0, canvas.width() as i64, canvas.height() as i64];

    for primitive in primitives {
        let Some(text) = primitive.label.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        let Some((anchor, offset)) = anchor(primitive) else {
            continue;
        };
        if !anchor.x.is_finite() || !anchor.y.is_finite() {
            continue;
        }

        let (width, height) = text_size(text, LABEL_FONT_SCALE);
        // One pixel of halo on every side.
        let (width, height) = (width as i64 + 2, height as i64 + 2);

        let free = candidates(anchor, offset, width, height)
            .into_iter()
            .find(|area| contains(&canvas_area, area) && index.is_free(area));

        if let Some(area) = free {
            draw_text_with_halo(
                canvas,
                text,
                area[0] + 1,
                area[1] + 1,
                LABEL_FONT_SCALE,
                Color::BLACK,
                Color::WHITE,
            );
            index.insert(area);
        }
    }
}

fn contains(outer: &Area, inner: &Area) -> bool {
    inner[0] >= outer[0] && inner[1] >= outer[1] && inner[2] <= outer[2] && inner[3] <= outer[3]
}

#[cfg(test)]
mod tests {
    use mapcraft_types::cartesian::Point2d;

    use super::*;
    use crate::style::{MarkerShape, VisualAttributes};

    fn labeled(x: f64, y: f64, label: &str) -> Primitive {
        Primitive {
            geometry: Geom::Point(Point2d::new(x, y)),
            attributes: VisualAttributes {
                color: Color::RED,
                size_px: 6.0,
                marker: MarkerShape::Circle,
                opacity: 1.0,
                stroke_width: 1.0,
                outline: None,
            },
            label: Some(label.into()),
        }
    }

    #[test]
    fn overlapping_labels_are_moved_or_dropped() {
        let mut canvas = Canvas::new(200, 100);
        let mut index = LabelIndex::default();
        let primitives = [
            labeled(100.0, 50.0, "AAA"),
            labeled(100.0, 50.0, "BBB"),
            labeled(100.0, 50.0, "CCC"),
            labeled(100.0, 50.0, "DDD"),
            labeled(100.0, 50.0, "EEE"),
        ];

        place_labels(&mut canvas, &primitives, &mut index);

        assert_eq!(index.len(), 4);
        for (i, a) in index.placed.iter().enumerate() {
            for b in &index.placed[i + 1..] {
                assert!(!overlaps(a, b));
            }
        }
    }

    #[test]
    fn labels_outside_canvas_are_dropped() {
        let mut canvas = Canvas::new(50, 50);
        let mut index = LabelIndex::default();
        place_labels(&mut canvas, &[labeled(-100.0, 25.0, "X")], &mut index);

        assert_eq!(index.len(), 0);
    }

    #[test]
    fn first_candidate_is_right_of_marker() {
        let mut canvas = Canvas::new(100, 100);
        let mut index = LabelIndex::default();
        place_labels(&mut canvas, &[labeled(10.0, 50.0, "A")], &mut index);

        let area = index.placed[0];
        assert!(area[0] > 10);
        assert!(area[1] < 50 && area[3] > 50);
    }
}
