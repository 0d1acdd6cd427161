mod engine;
pub(crate) mod geom;
mod group;
mod text_layer;

use anyhow::Result;
use image::RgbImage;

pub use engine::{TesseractDetector, list_tesseract_languages, resolve_ocr_languages};
pub use group::{GroupedLine, group_words};
pub use text_layer::{TextLayerDetector, TextLayerPage, TextLayerWord, extract_text_layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BBoxPx {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BBoxPx {
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn contains(&self, other: &BBoxPx) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }
}

/// One token reported by a text detector.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Word {
    pub text: String,
    pub bbox: BBoxPx,
    pub confidence: f32,
    pub line_id: u32,
    pub block_id: u32,
}

/// Anything that turns a raster into positioned words.
///
/// `block_id` and `line_id` must identify one visual line: words sharing both
/// are merged into a single [`GroupedLine`].
pub trait TextDetector {
    fn detect(&self, image: &RgbImage, languages: &str) -> Result<Vec<Word>>;

    /// Detection for the `index`-th page of a document. Detectors that carry
    /// per-page data override this; the rest only look at the raster.
    fn detect_page(&self, index: usize, image: &RgbImage, languages: &str) -> Result<Vec<Word>> {
        let _ = index;
        self.detect(image, languages)
    }
}

impl<T: TextDetector + ?Sized> TextDetector for &T {
    fn detect(&self, image: &RgbImage, languages: &str) -> Result<Vec<Word>> {
        (**self).detect(image, languages)
    }

    fn detect_page(&self, index: usize, image: &RgbImage, languages: &str) -> Result<Vec<Word>> {
        (**self).detect_page(index, image, languages)
    }
}
