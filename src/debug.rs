use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::page::Line;

/// Where per-page OCR dumps go when `--debug-ocr` is set.
#[derive(Debug, Clone)]
pub(crate) struct OcrDebugConfig {
    output_dir: PathBuf,
    base_name: String,
}

impl OcrDebugConfig {
    pub(crate) fn for_output(output: &Path) -> Result<Self> {
        let dir = output
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let base = output
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("deck");

        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create debug dir: {}", dir.display()))?;
        Ok(Self {
            output_dir: dir.to_path_buf(),
            base_name: sanitize_filename_component(base),
        })
    }

    pub(crate) fn page_label(&self, index: usize) -> String {
        format!("{}_page{:02}", self.base_name, index + 1)
    }

    pub(crate) fn json_path(&self, index: usize) -> PathBuf {
        self.output_dir
            .join(format!("{}_ocr.json", self.page_label(index)))
    }

    pub(crate) fn write_lines(&self, index: usize, lines: &[Line]) -> Result<PathBuf> {
        let path = self.json_path(index);
        let json = serde_json::to_vec_pretty(lines)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write ocr debug json: {}", path.display()))?;
        Ok(path)
    }
}

fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }
    if out.is_empty() {
        "deck".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::ocr::BBoxPx;
    use tempfile::tempdir;

    #[test]
    fn page_dumps_are_named_after_output() {
        let dir = tempdir().expect("tempdir");
        let config = OcrDebugConfig::for_output(&dir.path().join("my deck!.pptx")).unwrap();
        assert_eq!(config.page_label(0), "my_deck_page01");

        let line = Line {
            text: "Hello".to_string(),
            bbox: BBoxPx {
                x: 1,
                y: 2,
                w: 3,
                h: 4,
            },
            font_size: 8,
            bg_color: Rgb::new(245, 240, 230),
            text_color: Rgb::new(50, 50, 50),
        };
        let path = config.write_lines(1, &[line]).unwrap();
        assert_eq!(path, dir.path().join("my_deck_page02_ocr.json"));

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written[0]["text"], "Hello");
        assert_eq!(written[0]["bg_color"]["r"], 245);
    }
}
