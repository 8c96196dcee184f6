//! Legend boxes drawn in the bottom-right corner of the output.

use log::debug;

use crate::color::Color;
use crate::render::canvas::Canvas;
use crate::render::font::{draw_text, text_size};
use crate::style::{ColorRamp, Legend, LegendEntries};

const FONT_SCALE: u32 = 1;
const PADDING: i64 = 6;
const MARGIN: i64 = 8;
const SPACING: i64 = 6;
const LINE_GAP: i64 = 4;
const BAR_WIDTH: i64 = 120;
const BAR_HEIGHT: i64 = 10;
const SWATCH: i64 = 9;
const MAX_LABEL_CHARS: usize = 24;

const BACKGROUND: Color = Color::rgba(255, 255, 255, 220);
const BORDER: Color = Color::GRAY;
const TEXT: Color = Color::BLACK;

/// Draws legends stacked upwards from the bottom-right corner. Legends that do not fit are
/// skipped.
pub(crate) fn draw_legends<'a>(canvas: &mut Canvas, legends: impl IntoIterator<Item = &'a Legend>) {
    let mut bottom = canvas.height() as i64 - MARGIN;
    let right = canvas.width() as i64 - MARGIN;

    for legend in legends {
        let (width, height) = legend_size(legend);
        let left = right - width;
        let top = bottom - height;
        if left < 0 || top < 0 {
            debug!("Legend '{}' does not fit into the output, skipped", legend.title);
            continue;
        }

        draw_legend(canvas, legend, left, top, width, height);
        bottom = top - SPACING;
    }
}

fn line_height() -> i64 {
    text_size("A", FONT_SCALE).1 as i64
}

fn text_width(text: &str) -> i64 {
    text_size(text, FONT_SCALE).0 as i64
}

fn truncated(text: &str) -> String {
    if text.chars().count() <= MAX_LABEL_CHARS {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(MAX_LABEL_CHARS - 2).collect();
        short.push_str("..");
        short
    }
}

fn legend_size(legend: &Legend) -> (i64, i64) {
    let title = text_width(&truncated(&legend.title));
    let line = line_height();

    let (content_width, content_height) = match &legend.entries {
        LegendEntries::Ramp { min, max, .. } => {
            let labels = text_width(&format_value(*min)) + text_width(&format_value(*max)) + 8;
            (BAR_WIDTH.max(labels), BAR_HEIGHT + LINE_GAP + line)
        }
        LegendEntries::Categories(categories) => {
            let widest = categories
                .iter()
                .map(|(name, _)| text_width(&truncated(name)))
                .max()
                .unwrap_or(0);
            let rows = categories.len() as i64;
            (
                SWATCH + LINE_GAP + widest,
                rows * SWATCH.max(line) + (rows - 1).max(0) * LINE_GAP,
            )
        }
    };

    (
        title.max(content_width) + 2 * PADDING,
        line + LINE_GAP + content_height + 2 * PADDING,
    )
}

fn draw_legend(canvas: &mut Canvas, legend: &Legend, left: i64, top: i64, width: i64, height: i64) {
    let (right, bottom) = (left + width, top + height);
    canvas.fill_rect(left, top, right, bottom, BACKGROUND);
    canvas.fill_rect(left, top, right, top + 1, BORDER);
    canvas.fill_rect(left, bottom - 1, right, bottom, BORDER);
    canvas.fill_rect(left, top + 1, left + 1, bottom - 1, BORDER);
    canvas.fill_rect(right - 1, top + 1, right, bottom - 1, BORDER);

    let x = left + PADDING;
    let mut y = top + PADDING;
    draw_text(canvas, &truncated(&legend.title), x, y, FONT_SCALE, TEXT);
    y += line_height() + LINE_GAP;

    match &legend.entries {
        LegendEntries::Ramp { min, max, stops } => {
            let bar_width = width - 2 * PADDING;
            if let Ok(ramp) = ColorRamp::new(stops.clone()) {
                for column in 0..bar_width {
                    let t = column as f64 / (bar_width - 1).max(1) as f64;
                    canvas.fill_rect(x + column, y, x + column + 1, y + BAR_HEIGHT, ramp.evaluate(t));
                }
            }
            y += BAR_HEIGHT + LINE_GAP;

            let max_label = format_value(*max);
            draw_text(canvas, &format_value(*min), x, y, FONT_SCALE, TEXT);
            draw_text(
                canvas,
                &max_label,
                x + bar_width - text_width(&max_label),
                y,
                FONT_SCALE,
                TEXT,
            );
        }
        LegendEntries::Categories(categories) => {
            let row_height = SWATCH.max(line_height());
            for (name, color) in categories {
                canvas.fill_rect(x, y, x + SWATCH, y + SWATCH, *color);
                draw_text(
                    canvas,
                    &truncated(name),
                    x + SWATCH + LINE_GAP,
                    y + (row_height - line_height()) / 2,
                    FONT_SCALE,
                    TEXT,
                );
                y += row_height + LINE_GAP;
            }
        }
    }
}

/// Formats a legend value with at most two decimals, using exponent notation for very large and
/// very small values.
pub(crate) fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let abs = value.abs();
    if abs >= 1e6 || (abs > 0.0 && abs < 1e-2) {
        return format!("{value:.2e}");
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorScheme, ColorStop};

    fn ramp_legend() -> Legend {
        Legend {
            title: "value".into(),
            entries: LegendEntries::Ramp {
                min: 0.0,
                max: 100.0,
                stops: vec![
                    ColorStop::new(0.0, Color::BLUE),
                    ColorStop::new(1.0, Color::RED),
                ],
            },
        }
    }

    #[test]
    fn formats_values() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(100.0), "100");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(-1.257), "-1.26");
        assert_eq!(format_value(1234567.0), "1.23e6");
        assert_eq!(format_value(0.001), "1.00e-3");
    }

    #[test]
    fn ramp_legend_is_drawn_in_bottom_right_corner() {
        let mut canvas = Canvas::new(300, 200);
        draw_legends(&mut canvas, [&ramp_legend()]);
        let buffer = canvas.into_pixel_buffer();

        let (width, height) = legend_size(&ramp_legend());
        let left = (300 - MARGIN - width) as u32;
        let top = (200 - MARGIN - height) as u32;

        assert_eq!(buffer.pixel(left, top), Some(BORDER));
        assert_eq!(buffer.pixel(left - 1, top), Some(Color::TRANSPARENT));
        assert_eq!(buffer.pixel(10, 10), Some(Color::TRANSPARENT));

        let bar_y = top + (PADDING + line_height() + LINE_GAP) as u32 + 1;
        let bar_start = buffer.pixel(left + PADDING as u32, bar_y);
        assert_eq!(bar_start, Some(Color::BLUE));
    }

    #[test]
    fn legends_are_stacked() {
        let categories = Legend {
            title: "kind".into(),
            entries: LegendEntries::Categories(vec![
                ("a".into(), Color::RED),
                ("b".into(), Color::GREEN),
            ]),
        };
        let ramp = Legend {
            title: "scheme".into(),
            entries: LegendEntries::Ramp {
                min: 1.0,
                max: 2.0,
                stops: ColorRamp::from_scheme(ColorScheme::Heat).stops().to_vec(),
            },
        };

        let mut canvas = Canvas::new(300, 300);
        draw_legends(&mut canvas, [&categories, &ramp]);
        let buffer = canvas.into_pixel_buffer();

        let first_top = 300 - MARGIN - legend_size(&categories).1;
        let second_bottom = first_top - SPACING;
        let sample_x = (300 - MARGIN - 2) as u32;
        assert_eq!(buffer.pixel(sample_x, (second_bottom - 1) as u32), Some(BORDER));
        assert_eq!(buffer.pixel(sample_x, (second_bottom + 1) as u32), Some(Color::TRANSPARENT));
    }

    #[test]
    fn legend_larger_than_output_is_skipped() {
        let mut canvas = Canvas::new(20, 20);
        draw_legends(&mut canvas, [&ramp_legend()]);
        let buffer = canvas.into_pixel_buffer();

        assert!(buffer.as_bytes().iter().all(|b| *b == 0));
    }
}
