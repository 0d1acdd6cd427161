use anyhow::{Context, Result, anyhow};
use image::RgbImage;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod color;
mod debug;
pub mod input;
pub mod layout;
pub mod logging;
pub mod ocr;
pub mod page;
pub mod pptx;
pub mod preview;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use color::Rgb;
pub use layout::{Canvas, LayoutOptions, PlacedElement};
pub use ocr::{BBoxPx, TesseractDetector, TextDetector, TextLayerDetector, Word};
pub use page::{Line, Page, PageOptions};
pub use pptx::{DeckBuilder, DeckProperties};
pub use settings::Settings;

/// Where the text of each page comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSource {
    /// Run OCR over every page raster.
    #[default]
    Ocr,
    /// Use the PDF text layer where a page has one, OCR elsewhere.
    Native,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub lang: Option<String>,
    pub dpi: Option<u32>,
    pub conf: Option<f32>,
    pub text_source: TextSource,
    pub preview: bool,
    pub debug_ocr: bool,
    pub settings_path: Option<String>,
}

/// Everything the conversion needs besides the pages themselves.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub page: PageOptions,
    pub layout: LayoutOptions,
    pub canvas: Canvas,
    pub properties: DeckProperties,
}

impl ConvertOptions {
    pub fn from_settings(settings: &Settings, title: &str) -> Self {
        let (width, height) = settings.slide_size_emu();
        Self {
            page: PageOptions {
                languages: settings.ocr_languages.clone(),
                confidence: settings.confidence,
                font_ratio: settings.font_ratio,
                color_margin: settings.color_margin,
            },
            layout: LayoutOptions {
                height_inflation: settings.height_inflation,
                min_font_size: settings.min_font_size,
                max_font_size: settings.max_font_size,
            },
            canvas: Canvas { width, height },
            properties: DeckProperties {
                title: title.to_string(),
                font_family: settings.font_family.clone(),
                ..DeckProperties::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub pages: usize,
    pub lines: usize,
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} ({} slides, {} text lines)",
            self.output.display(),
            self.pages,
            self.lines
        )
    }
}

pub fn run(config: Config) -> Result<ConversionSummary> {
    if !config.input.exists() {
        return Err(anyhow!("input file not found: {}", config.input.display()));
    }
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(lang) = config.lang.filter(|value| !value.trim().is_empty()) {
        settings.ocr_languages = lang;
    }
    if let Some(dpi) = config.dpi.filter(|value| *value > 0) {
        settings.dpi = dpi;
    }
    if let Some(conf) = config.conf {
        settings.confidence = conf;
    }
    settings.ocr_languages = ocr::resolve_ocr_languages(&settings.ocr_languages)?;

    let pages = input::load_pages(&config.input, settings.dpi)?;
    info!(pages = pages.len(), input = %config.input.display(), "loaded input");

    let title = config
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Converted Presentation");
    let options = ConvertOptions::from_settings(&settings, title);
    let detector = build_detector(&config.input, config.text_source, settings.dpi)?;
    let hooks = PageHooks {
        debug: if config.debug_ocr {
            Some(debug::OcrDebugConfig::for_output(&config.output)?)
        } else {
            None
        },
        preview: config
            .preview
            .then(|| preview::preview_path(&config.output)),
    };

    let file = File::create(&config.output)
        .with_context(|| format!("failed to create output: {}", config.output.display()))?;
    let (writer, lines) = convert(
        pages,
        &*detector,
        &options,
        BufWriter::new(file),
        |index, page| hooks.on_page(index, page),
    )?;
    writer
        .into_inner()
        .map_err(|err| anyhow!("failed to flush output: {}", err.error()))?;

    Ok(ConversionSummary {
        output: config.output,
        pages: lines.len(),
        lines: lines.iter().sum(),
    })
}

fn build_detector(path: &Path, source: TextSource, dpi: u32) -> Result<Box<dyn TextDetector>> {
    let tesseract = TesseractDetector::new(dpi);
    if source == TextSource::Ocr {
        return Ok(Box::new(tesseract));
    }
    if input::input_kind(path)? != input::InputKind::Pdf {
        warn!("input has no pdf text layer, using ocr");
        return Ok(Box::new(tesseract));
    }
    match ocr::extract_text_layer(path) {
        Ok(pages) => {
            info!(
                pages = pages.len(),
                with_text = pages.iter().filter(|page| page.has_text()).count(),
                "read pdf text layer"
            );
            Ok(Box::new(TextLayerDetector::new(pages, tesseract)))
        }
        Err(err) => {
            warn!("failed to read pdf text layer, using ocr: {:#}", err);
            Ok(Box::new(tesseract))
        }
    }
}

/// Side outputs written while pages stream through [`convert`].
#[derive(Debug, Default)]
struct PageHooks {
    debug: Option<debug::OcrDebugConfig>,
    preview: Option<PathBuf>,
}

impl PageHooks {
    /// Debug dumps must succeed; a failed preview of the first page only
    /// warns.
    fn on_page(&self, index: usize, page: &Page) -> Result<()> {
        if let Some(debug) = self.debug.as_ref() {
            let path = debug.write_lines(index, &page.lines)?;
            info!(path = %path.display(), "wrote ocr debug json");
        }
        if index == 0 {
            if let Some(path) = self.preview.as_ref() {
                match preview::write_preview(page, path) {
                    Ok(()) => info!(path = %path.display(), "wrote preview"),
                    Err(err) => warn!("failed to write preview: {:#}", err),
                }
            }
        }
        Ok(())
    }
}

/// Runs every page through OCR, grouping and color sampling, and writes one
/// slide per page in input order.
///
/// `on_page` sees each annotated page before it is dropped. Returns the
/// finished writer and the line count of every slide.
pub fn convert<D, W, F>(
    pages: Vec<RgbImage>,
    detector: &D,
    options: &ConvertOptions,
    writer: W,
    mut on_page: F,
) -> Result<(W, Vec<usize>)>
where
    D: TextDetector + ?Sized,
    W: Write + Seek,
    F: FnMut(usize, &Page) -> Result<()>,
{
    let total = pages.len();
    let mut deck = DeckBuilder::new(writer, options.canvas, options.properties.clone());
    let mut line_counts = Vec::with_capacity(total);

    for (index, image) in pages.into_iter().enumerate() {
        info!("processing page {}/{}", index + 1, total);
        let page = page::process_page(index, image, detector, &options.page)
            .with_context(|| format!("page {} failed", index + 1))?;
        on_page(index, &page)?;

        let elements = layout::place_lines(
            &page.lines,
            page.width(),
            page.height(),
            options.canvas,
            &options.layout,
        );
        let backdrop = pptx::encode_png(&page.image)?;
        deck.add_slide(&backdrop, &elements)?;
        line_counts.push(elements.len());
    }

    Ok((deck.finish()?, line_counts))
}
