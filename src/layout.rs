use crate::color::Rgb;
use crate::page::Line;

/// Output slide size in EMU (914400 per inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: i64,
    pub height: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    /// Text box height relative to the cover patch, leaving room for
    /// ascenders and descenders of the replacement font.
    pub height_inflation: f32,
    pub min_font_size: u32,
    pub max_font_size: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            height_inflation: 1.3,
            min_font_size: 8,
            max_font_size: 48,
        }
    }
}

/// A line mapped into canvas units, ready to become a cover patch plus
/// an editable text box.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PlacedElement {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
    pub text_height: i64,
    pub bg_color: Rgb,
    pub text: String,
    pub text_color: Rgb,
    /// Points.
    pub font_size: u32,
}

/// Linear pixel-to-canvas mapping along one axis.
///
/// Kept as the exact ratio `canvas / image` so full-extent coordinates land
/// on the canvas edge without float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisScale {
    canvas: i64,
    image: u32,
}

impl AxisScale {
    pub fn new(canvas: i64, image: u32) -> Self {
        Self {
            canvas,
            image: image.max(1),
        }
    }

    pub fn factor(&self) -> f64 {
        self.canvas as f64 / f64::from(self.image)
    }

    pub fn apply(&self, px: u32) -> i64 {
        let numerator = i128::from(px) * i128::from(self.canvas);
        let denominator = i128::from(self.image);
        ((numerator * 2 + denominator) / (denominator * 2)) as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageScale {
    pub x: AxisScale,
    pub y: AxisScale,
}

impl PageScale {
    pub fn new(image_width: u32, image_height: u32, canvas: Canvas) -> Self {
        Self {
            x: AxisScale::new(canvas.width, image_width),
            y: AxisScale::new(canvas.height, image_height),
        }
    }
}

pub fn clamp_font_size(estimate: u32, options: &LayoutOptions) -> u32 {
    estimate.clamp(options.min_font_size, options.max_font_size)
}

pub fn place_line(line: &Line, scale: &PageScale, options: &LayoutOptions) -> PlacedElement {
    let left = scale.x.apply(line.bbox.x);
    let top = scale.y.apply(line.bbox.y);
    let width = scale.x.apply(line.bbox.right()) - left;
    let height = scale.y.apply(line.bbox.bottom()) - top;
    let text_height = (height as f64 * f64::from(options.height_inflation)).round() as i64;

    PlacedElement {
        left,
        top,
        width,
        height,
        text_height,
        bg_color: line.bg_color,
        text: line.text.clone(),
        text_color: line.text_color,
        font_size: clamp_font_size(line.font_size, options),
    }
}

pub fn place_lines(
    lines: &[Line],
    image_width: u32,
    image_height: u32,
    canvas: Canvas,
    options: &LayoutOptions,
) -> Vec<PlacedElement> {
    let scale = PageScale::new(image_width, image_height, canvas);
    lines
        .iter()
        .map(|line| place_line(line, &scale, options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::BBoxPx;

    const CANVAS: Canvas = Canvas {
        width: 12_191_695,
        height: 6_858_000,
    };

    fn line(bbox: BBoxPx, font_size: u32) -> Line {
        Line {
            text: "text".to_string(),
            bbox,
            font_size,
            bg_color: Rgb::new(1, 2, 3),
            text_color: Rgb::new(4, 5, 6),
        }
    }

    #[test]
    fn full_page_maps_to_full_canvas() {
        let scale = PageScale::new(1653, 2339, CANVAS);
        let full = line(
            BBoxPx {
                x: 0,
                y: 0,
                w: 1653,
                h: 2339,
            },
            12,
        );
        let placed = place_line(&full, &scale, &LayoutOptions::default());
        assert_eq!(
            (placed.left, placed.top, placed.width, placed.height),
            (0, 0, CANVAS.width, CANVAS.height)
        );
    }

    #[test]
    fn axes_scale_independently() {
        let canvas = Canvas {
            width: 1000,
            height: 1000,
        };
        let scale = PageScale::new(100, 50, canvas);
        assert_eq!(scale.x.factor(), 10.0);
        assert_eq!(scale.y.factor(), 20.0);

        let placed = place_line(
            &line(
                BBoxPx {
                    x: 10,
                    y: 10,
                    w: 50,
                    h: 20,
                },
                14,
            ),
            &scale,
            &LayoutOptions::default(),
        );
        assert_eq!((placed.left, placed.top), (100, 200));
        assert_eq!((placed.width, placed.height), (500, 400));
        assert_eq!(placed.text_height, 520);
        assert_eq!(placed.font_size, 14);
        assert_eq!(placed.bg_color, Rgb::new(1, 2, 3));
        assert_eq!(placed.text_color, Rgb::new(4, 5, 6));
    }

    #[test]
    fn font_size_is_clamped() {
        let options = LayoutOptions::default();
        for estimate in [0, 3, 8, 20, 48, 49, 500] {
            let size = clamp_font_size(estimate, &options);
            assert!((8..=48).contains(&size), "{estimate} -> {size}");
        }
        assert_eq!(clamp_font_size(2, &options), 8);
        assert_eq!(clamp_font_size(90, &options), 48);
    }

    #[test]
    fn mapping_rounds_to_nearest_emu() {
        let scale = AxisScale::new(10, 3);
        assert_eq!(scale.apply(0), 0);
        assert_eq!(scale.apply(1), 3);
        assert_eq!(scale.apply(2), 7);
        assert_eq!(scale.apply(3), 10);
    }

    #[test]
    fn place_lines_keeps_order() {
        let lines = [
            line(
                BBoxPx {
                    x: 0,
                    y: 0,
                    w: 1,
                    h: 1,
                },
                10,
            ),
            line(
                BBoxPx {
                    x: 5,
                    y: 5,
                    w: 1,
                    h: 1,
                },
                10,
            ),
        ];
        let placed = place_lines(&lines, 10, 10, CANVAS, &LayoutOptions::default());
        assert_eq!(placed.len(), 2);
        assert!(placed[0].left < placed[1].left);
    }
}
