use anyhow::Result;
use image::RgbImage;
use tracing::info;

use crate::color::{self, Rgb};
use crate::ocr::{self, BBoxPx, TextDetector, Word};

/// A merged text line with the colors sampled from the page.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Line {
    pub text: String,
    pub bbox: BBoxPx,
    pub font_size: u32,
    pub bg_color: Rgb,
    pub text_color: Rgb,
}

/// One source raster and the lines found on it.
#[derive(Debug, Clone)]
pub struct Page {
    pub image: RgbImage,
    pub lines: Vec<Line>,
}

impl Page {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[derive(Debug, Clone)]
pub struct PageOptions {
    pub languages: String,
    /// Words must score strictly above this to be kept.
    pub confidence: f32,
    pub font_ratio: f32,
    pub color_margin: u32,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            languages: "chi_tra+eng".to_string(),
            confidence: 25.0,
            font_ratio: 0.72,
            color_margin: color::DEFAULT_MARGIN,
        }
    }
}

/// Detects, filters, groups and colors the text of the `index`-th page.
pub fn process_page<D: TextDetector + ?Sized>(
    index: usize,
    image: RgbImage,
    detector: &D,
    options: &PageOptions,
) -> Result<Page> {
    let words = detector.detect_page(index, &image, &options.languages)?;
    let detected = words.len();
    let words = retain_confident(words, options.confidence);
    info!(detected, kept = words.len(), "ocr words");

    let lines: Vec<Line> = ocr::group_words(&words, options.font_ratio)
        .into_iter()
        .map(|grouped| Line {
            bg_color: color::background_color(&image, &grouped.bbox, options.color_margin),
            text_color: color::text_color(&image, &grouped.bbox),
            text: grouped.text,
            bbox: grouped.bbox,
            font_size: grouped.font_size,
        })
        .collect();
    info!(lines = lines.len(), "merged lines");

    Ok(Page { image, lines })
}

fn retain_confident(words: Vec<Word>, threshold: f32) -> Vec<Word> {
    words
        .into_iter()
        .filter(|word| word.confidence > threshold)
        .filter_map(|word| {
            let text = word.text.trim();
            if text.is_empty() {
                return None;
            }
            let text = text.to_string();
            Some(Word { text, ..word })
        })
        .collect()
}
