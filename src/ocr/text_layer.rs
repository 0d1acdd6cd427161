//! Positioned text read from a PDF's own text layer with
//! `pdftotext -bbox-layout`, for documents that already carry real text.

use anyhow::{Context, Result, anyhow};
use image::RgbImage;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::input::command_exists;
use crate::ocr::{BBoxPx, TextDetector, Word};

/// Text layer words are exact, so they always clear the OCR threshold.
const TEXT_LAYER_CONFIDENCE: f32 = 100.0;

/// One word in PDF points, origin at the top-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayerWord {
    pub text: String,
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub block_id: u32,
    pub line_id: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayerPage {
    pub width: f64,
    pub height: f64,
    pub words: Vec<TextLayerWord>,
}

impl TextLayerPage {
    pub fn has_text(&self) -> bool {
        self.words.iter().any(|word| !word.text.trim().is_empty())
    }

    /// The words in pixels of an `image_width` x `image_height` raster of
    /// this page.
    pub fn words_for_raster(&self, image_width: u32, image_height: u32) -> Vec<Word> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Vec::new();
        }
        let sx = f64::from(image_width) / self.width;
        let sy = f64::from(image_height) / self.height;
        let to_px = |value: f64, scale: f64| (value * scale).round().max(0.0) as u32;

        self.words
            .iter()
            .map(|word| {
                let x = to_px(word.x_min, sx);
                let y = to_px(word.y_min, sy);
                Word {
                    text: word.text.clone(),
                    bbox: BBoxPx {
                        x,
                        y,
                        w: to_px(word.x_max, sx).saturating_sub(x),
                        h: to_px(word.y_max, sy).saturating_sub(y),
                    },
                    confidence: TEXT_LAYER_CONFIDENCE,
                    line_id: word.line_id,
                    block_id: word.block_id,
                }
            })
            .collect()
    }
}

/// Reads the text layer of every page of the PDF at `path`.
pub fn extract_text_layer(path: &Path) -> Result<Vec<TextLayerPage>> {
    if !command_exists("pdftotext") {
        return Err(anyhow!(
            "pdf text layer requires pdftotext (install poppler: \
             `brew install poppler` on macOS, `sudo apt install poppler-utils` on Linux)"
        ));
    }
    let output = Command::new("pdftotext")
        .arg("-bbox-layout")
        .arg(path)
        .arg("-")
        .output()
        .with_context(|| "failed to run pdftotext")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("pdftotext failed: {}", stderr.trim()));
    }
    parse_bbox_layout(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the XHTML written by `pdftotext -bbox-layout`.
///
/// Blocks are numbered per page and lines per block, both from 1, so the
/// ids group words the same way tesseract's do.
pub(crate) fn parse_bbox_layout(xml: &str) -> Result<Vec<TextLayerPage>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut pages: Vec<TextLayerPage> = Vec::new();
    let mut block_id = 0u32;
    let mut line_id = 0u32;
    let mut current: Option<TextLayerWord> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => {
                    pages.push(TextLayerPage {
                        width: attr_f64(&e, b"width")?,
                        height: attr_f64(&e, b"height")?,
                        words: Vec::new(),
                    });
                    block_id = 0;
                }
                b"block" => {
                    block_id += 1;
                    line_id = 0;
                }
                b"line" => line_id += 1,
                b"word" => {
                    current = Some(TextLayerWord {
                        text: String::new(),
                        x_min: attr_f64(&e, b"xMin")?,
                        y_min: attr_f64(&e, b"yMin")?,
                        x_max: attr_f64(&e, b"xMax")?,
                        y_max: attr_f64(&e, b"yMax")?,
                        block_id,
                        line_id,
                    });
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(word) = current.as_mut() {
                    word.text.push_str(&e.unescape()?);
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"word" {
                    if let (Some(word), Some(page)) = (current.take(), pages.last_mut()) {
                        page.words.push(word);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(anyhow!("failed to parse pdftotext output: {}", err));
            }
        }
    }
    Ok(pages)
}

fn attr_f64(tag: &BytesStart, name: &[u8]) -> Result<f64> {
    for attr in tag.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value()?;
            return value.trim().parse::<f64>().with_context(|| {
                format!(
                    "invalid {} on <{}>: {}",
                    String::from_utf8_lossy(name),
                    String::from_utf8_lossy(tag.name().as_ref()),
                    value
                )
            });
        }
    }
    Err(anyhow!(
        "missing {} on <{}>",
        String::from_utf8_lossy(name),
        String::from_utf8_lossy(tag.name().as_ref())
    ))
}

/// Takes words from the PDF text layer, running `fallback` on pages that have
/// none (scanned pages inside an otherwise digital document).
pub struct TextLayerDetector<F> {
    pages: Vec<TextLayerPage>,
    fallback: F,
}

impl<F: TextDetector> TextLayerDetector<F> {
    pub fn new(pages: Vec<TextLayerPage>, fallback: F) -> Self {
        Self { pages, fallback }
    }
}

impl<F: TextDetector> TextDetector for TextLayerDetector<F> {
    fn detect(&self, image: &RgbImage, languages: &str) -> Result<Vec<Word>> {
        self.fallback.detect(image, languages)
    }

    fn detect_page(&self, index: usize, image: &RgbImage, languages: &str) -> Result<Vec<Word>> {
        match self.pages.get(index) {
            Some(page) if page.has_text() => {
                let words = page.words_for_raster(image.width(), image.height());
                debug!(page = index + 1, words = words.len(), "text layer words");
                Ok(words)
            }
            _ => {
                info!(page = index + 1, "no text layer, running ocr");
                self.fallback.detect_page(index, image, languages)
            }
        }
    }
}
