use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

pub const EMU_PER_INCH: f64 = 914_400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ocr_languages: String,
    pub confidence: f32,
    pub dpi: u32,
    pub color_margin: u32,
    pub font_ratio: f32,
    pub height_inflation: f32,
    pub min_font_size: u32,
    pub max_font_size: u32,
    pub slide_width_in: f64,
    pub slide_height_in: f64,
    pub font_family: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr_languages: "chi_tra+eng".to_string(),
            confidence: 25.0,
            dpi: 200,
            color_margin: 5,
            font_ratio: 0.72,
            height_inflation: 1.3,
            min_font_size: 8,
            max_font_size: 48,
            slide_width_in: 13.333,
            slide_height_in: 7.5,
            font_family: "Microsoft JhengHei".to_string(),
        }
    }
}

impl Settings {
    /// Slide size in EMU, truncated the way presentation tools round inches.
    pub fn slide_size_emu(&self) -> (i64, i64) {
        (
            (self.slide_width_in * EMU_PER_INCH) as i64,
            (self.slide_height_in * EMU_PER_INCH) as i64,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    ocr: Option<OcrSettings>,
    color: Option<ColorSettings>,
    layout: Option<LayoutSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    languages: Option<String>,
    confidence: Option<f32>,
    dpi: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ColorSettings {
    margin: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LayoutSettings {
    font_ratio: Option<f32>,
    height_inflation: Option<f32>,
    min_font_size: Option<u32>,
    max_font_size: Option<u32>,
    slide_width_in: Option<f64>,
    slide_height_in: Option<f64>,
    font_family: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    if settings.min_font_size > settings.max_font_size {
        return Err(anyhow!(
            "layout.min_font_size ({}) is larger than layout.max_font_size ({})",
            settings.min_font_size,
            settings.max_font_size
        ));
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr_languages = languages;
                }
            }
            if let Some(confidence) = ocr.confidence {
                self.confidence = confidence;
            }
            if let Some(dpi) = ocr.dpi {
                if dpi > 0 {
                    self.dpi = dpi;
                }
            }
        }
        if let Some(color) = incoming.color {
            if let Some(margin) = color.margin {
                if margin > 0 {
                    self.color_margin = margin;
                }
            }
        }
        if let Some(layout) = incoming.layout {
            if let Some(ratio) = layout.font_ratio {
                if ratio > 0.0 {
                    self.font_ratio = ratio;
                }
            }
            if let Some(factor) = layout.height_inflation {
                if factor > 0.0 {
                    self.height_inflation = factor;
                }
            }
            if let Some(size) = layout.min_font_size {
                self.min_font_size = size;
            }
            if let Some(size) = layout.max_font_size {
                self.max_font_size = size;
            }
            if let Some(width) = layout.slide_width_in {
                if width > 0.0 {
                    self.slide_width_in = width;
                }
            }
            if let Some(height) = layout.slide_height_in {
                if height > 0.0 {
                    self.slide_height_in = height;
                }
            }
            if let Some(family) = layout.font_family {
                if !family.trim().is_empty() {
                    self.font_family = family;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".scan-to-pptx"))
        }
    })
}
