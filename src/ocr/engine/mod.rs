mod parse;
mod tesseract;

use anyhow::{Context, Result};
use image::RgbImage;
use std::io::Write;
use tracing::debug;

use crate::ocr::{TextDetector, Word};

pub use tesseract::{list_tesseract_languages, resolve_ocr_languages};

/// Runs the `tesseract` CLI over a page and reads its word-level TSV output.
///
/// `languages` is handed to tesseract as is; resolve it once with
/// [`resolve_ocr_languages`] before converting a document.
#[derive(Debug, Clone)]
pub struct TesseractDetector {
    psm: u32,
    dpi: u32,
}

impl TesseractDetector {
    pub fn new(dpi: u32) -> Self {
        Self { psm: 3, dpi }
    }
}

impl Default for TesseractDetector {
    fn default() -> Self {
        Self::new(200)
    }
}

impl TextDetector for TesseractDetector {
    fn detect(&self, image: &RgbImage, languages: &str) -> Result<Vec<Word>> {
        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for OCR")?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .with_context(|| "failed to write temp image for OCR")?;
        tmp.flush().ok();

        let tsv = tesseract::run_tesseract_tsv(tmp.path(), languages, self.psm, self.dpi)?;
        let words = parse::parse_tsv_words(&tsv);
        debug!(languages = %languages, words = words.len(), "tesseract finished");
        Ok(words)
    }
}
