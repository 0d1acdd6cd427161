use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use scan_to_pptx::TextSource;

#[derive(Parser, Debug)]
#[command(
    name = "scan-to-pptx",
    version,
    about = "Convert scanned PDFs or images into editable PPTX slides",
    after_help = "Examples:\n  scan-to-pptx input.pdf output.pptx\n  scan-to-pptx image.png output.pptx --lang eng\n  scan-to-pptx input.pdf output.pptx --lang chi_tra+eng --dpi 300\n  scan-to-pptx digital.pdf output.pptx --mode native\n\nLanguage codes: chi_tra, chi_sim, eng, jpn, kor (combine with '+')"
)]
struct Cli {
    /// Input file (PDF or image)
    #[arg(required_unless_present = "show_ocr_languages")]
    input: Option<PathBuf>,

    /// Output PPTX file
    #[arg(required_unless_present = "show_ocr_languages")]
    output: Option<PathBuf>,

    /// OCR languages (default: chi_tra+eng)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// PDF rasterization resolution (default: 200)
    #[arg(long = "dpi")]
    dpi: Option<u32>,

    /// OCR confidence threshold; words must score above it (default: 25)
    #[arg(long = "conf")]
    conf: Option<f32>,

    /// Text source: OCR every page, or use the PDF text layer where present
    #[arg(long = "mode", value_enum, default_value_t = Mode::Ocr)]
    mode: Mode,

    /// Write <output>.preview.png showing the first page with text covered
    #[arg(long = "preview")]
    preview: bool,

    /// Write per-page OCR line dumps as JSON next to the output
    #[arg(long = "debug-ocr")]
    debug_ocr: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Show OCR languages installed for tesseract and exit
    #[arg(long = "show-ocr-languages")]
    show_ocr_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Ocr,
    Native,
}

impl From<Mode> for TextSource {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Ocr => TextSource::Ocr,
            Mode::Native => TextSource::Native,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    scan_to_pptx::logging::init(cli.verbose)?;

    if cli.show_ocr_languages {
        for lang in scan_to_pptx::ocr::list_tesseract_languages()? {
            println!("{}", lang);
        }
        return Ok(());
    }

    let input = cli.input.ok_or_else(|| anyhow!("input file is required"))?;
    let output = cli.output.ok_or_else(|| anyhow!("output file is required"))?;
    let summary = scan_to_pptx::run(scan_to_pptx::Config {
        input,
        output,
        lang: cli.lang,
        dpi: cli.dpi,
        conf: cli.conf,
        text_source: cli.mode.into(),
        preview: cli.preview,
        debug_ocr: cli.debug_ocr,
        settings_path: cli.read_settings,
    })?;

    println!("{}", summary);
    Ok(())
}
