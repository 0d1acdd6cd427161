use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::page::Page;

/// `deck.pptx` -> `deck.preview.png`.
pub fn preview_path(output: &Path) -> PathBuf {
    output.with_extension("preview.png")
}

/// The page with every cover patch painted in, as the slide shows it before
/// the text boxes are drawn.
pub fn render_preview(page: &Page) -> RgbImage {
    let mut canvas = page.image.clone();
    let (width, height) = canvas.dimensions();
    for line in &page.lines {
        let pixel: image::Rgb<u8> = line.bg_color.into();
        let x_end = line.bbox.right().min(width);
        let y_end = line.bbox.bottom().min(height);
        for y in line.bbox.y..y_end {
            for x in line.bbox.x..x_end {
                canvas.put_pixel(x, y, pixel);
            }
        }
    }
    canvas
}

pub fn write_preview(page: &Page, path: &Path) -> Result<()> {
    render_preview(page)
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write preview: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::ocr::BBoxPx;
    use crate::page::Line;
    use crate::test_util::{fill_rect, solid_image};

    #[test]
    fn preview_sits_next_to_output() {
        assert_eq!(
            preview_path(Path::new("out/deck.pptx")),
            PathBuf::from("out/deck.preview.png")
        );
    }

    #[test]
    fn cover_patches_hide_text() {
        let mut image = solid_image(40, 20, [250, 250, 250]);
        fill_rect(&mut image, 5, 5, 10, 5, [0, 0, 0]);
        let page = Page {
            image,
            lines: vec![Line {
                text: "ink".to_string(),
                bbox: BBoxPx {
                    x: 5,
                    y: 5,
                    w: 10,
                    h: 5,
                },
                font_size: 8,
                bg_color: Rgb::new(250, 250, 250),
                text_color: Rgb::new(0, 0, 0),
            }],
        };
        let preview = render_preview(&page);
        assert!(preview.pixels().all(|pixel| pixel.0 == [250, 250, 250]));
    }
}
