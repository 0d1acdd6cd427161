use anyhow::{Context, Result, anyhow};
use image::RgbImage;
use std::env;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;
use tracing::info;

const PDF_MIME: &str = "application/pdf";
const SNIFF_LEN: u64 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
}

/// Decides between PDF and raster input by extension, then by content.
pub fn detect_input_kind(path: &Path, head: &[u8]) -> InputKind {
    let by_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"));
    match by_ext {
        Some(true) => InputKind::Pdf,
        _ => match infer::get(head) {
            Some(kind) if kind.mime_type() == PDF_MIME => InputKind::Pdf,
            _ => InputKind::Image,
        },
    }
}

/// Kind of the file at `path`, reading only as much as sniffing needs.
pub fn input_kind(path: &Path) -> Result<InputKind> {
    let file =
        File::open(path).with_context(|| format!("failed to open input: {}", path.display()))?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN)
        .read_to_end(&mut head)
        .with_context(|| format!("failed to read input: {}", path.display()))?;
    Ok(detect_input_kind(path, &head))
}

/// Loads every page of `path` as an RGB raster, in document order.
pub fn load_pages(path: &Path, dpi: u32) -> Result<Vec<RgbImage>> {
    if !path.exists() {
        return Err(anyhow!("input file not found: {}", path.display()));
    }
    let bytes =
        fs::read(path).with_context(|| format!("failed to read input: {}", path.display()))?;

    match detect_input_kind(path, &bytes) {
        InputKind::Pdf => {
            info!(dpi, "rasterizing pdf");
            let pages = rasterize_pdf(&bytes, dpi)?;
            if pages.is_empty() {
                return Err(anyhow!("no pages found in pdf: {}", path.display()));
            }
            Ok(pages)
        }
        InputKind::Image => {
            let image = image::load_from_memory(&bytes)
                .with_context(|| format!("failed to decode image: {}", path.display()))?;
            Ok(vec![image.to_rgb8()])
        }
    }
}

/// Renders PDF pages with `mutool` or `pdftoppm`, whichever is installed.
pub fn rasterize_pdf(pdf_bytes: &[u8], dpi: u32) -> Result<Vec<RgbImage>> {
    let dir = tempdir().with_context(|| "failed to create temp dir for pdf")?;
    let input_path = dir.path().join("input.pdf");
    fs::write(&input_path, pdf_bytes).with_context(|| "failed to write temp pdf")?;
    let resolution = dpi.to_string();

    let output = if command_exists("mutool") {
        Command::new("mutool")
            .arg("draw")
            .arg("-r")
            .arg(&resolution)
            .arg("-o")
            .arg(dir.path().join("page-%04d.png"))
            .arg(&input_path)
            .output()
            .with_context(|| "failed to run mutool")?
    } else if command_exists("pdftoppm") {
        Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(&resolution)
            .arg(&input_path)
            .arg(dir.path().join("page"))
            .output()
            .with_context(|| "failed to run pdftoppm")?
    } else {
        return Err(anyhow!(
            "pdf rendering requires mutool or pdftoppm (install mupdf, or poppler: \
             `brew install poppler` on macOS, `sudo apt install poppler-utils` on Linux, \
             poppler-windows releases on Windows)"
        ));
    };
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("pdf rasterizer failed: {}", stderr.trim()));
    }

    let mut entries: Vec<_> = fs::read_dir(dir.path())
        .with_context(|| "failed to read temp pdf directory")?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_rendered_page(path))
        .collect();
    entries.sort_by_key(|path| page_number(path));

    let mut pages = Vec::with_capacity(entries.len());
    for path in entries {
        let page = image::open(&path)
            .with_context(|| format!("failed to decode rendered page: {}", path.display()))?;
        pages.push(page.to_rgb8());
    }
    Ok(pages)
}

fn is_rendered_page(path: &Path) -> bool {
    let named_page = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with("page"))
        .unwrap_or(false);
    let png = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false);
    named_page && png
}

/// Trailing page number of `page-0007.png` / `page-7.png`; pdftoppm pads
/// inconsistently across versions, so ordering by name alone is not enough.
fn page_number(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('-').next())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(u32::MAX)
}

pub(crate) fn command_exists(cmd: &str) -> bool {
    let path = Path::new(cmd);
    if path.components().count() > 1 {
        return is_executable(path);
    }

    let path_var = match env::var_os("PATH") {
        Some(value) => value,
        None => return false,
    };

    #[cfg(windows)]
    let candidates = windows_command_candidates(cmd);
    #[cfg(not(windows))]
    let candidates = vec![cmd.to_string()];

    for dir in env::split_paths(&path_var) {
        for candidate in &candidates {
            if is_executable(&dir.join(candidate)) {
                return true;
            }
        }
    }
    false
}

fn is_executable(path: &Path) -> bool {
    let metadata = match fs::metadata(path) {
        Ok(value) => value,
        Err(_) => return false,
    };
    if !metadata.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(windows)]
fn windows_command_candidates(cmd: &str) -> Vec<String> {
    let pathext = env::var_os("PATHEXT").unwrap_or_else(|| ".EXE;.CMD;.BAT;.COM".into());
    let mut candidates = vec![cmd.to_string()];
    for ext in pathext.to_string_lossy().split(';') {
        if !ext.is_empty() {
            candidates.push(format!("{}{}", cmd, ext.to_ascii_lowercase()));
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::solid_image;
    use std::path::PathBuf;

    #[test]
    fn pdf_detected_by_extension_or_magic() {
        assert_eq!(
            detect_input_kind(Path::new("scan.PDF"), b""),
            InputKind::Pdf
        );
        assert_eq!(
            detect_input_kind(Path::new("scan.bin"), b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n"),
            InputKind::Pdf
        );
        assert_eq!(
            detect_input_kind(Path::new("scan.png"), b"\x89PNG\r\n\x1a\n"),
            InputKind::Image
        );
    }

    #[test]
    fn kind_of_file_on_disk_is_sniffed() {
        let dir = tempdir().expect("tempdir");
        let pdf = dir.path().join("scan.bin");
        fs::write(&pdf, b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").expect("write pdf");
        assert_eq!(input_kind(&pdf).unwrap(), InputKind::Pdf);

        let png = dir.path().join("page.png");
        solid_image(4, 4, [0, 0, 0]).save(&png).expect("save png");
        assert_eq!(input_kind(&png).unwrap(), InputKind::Image);
        assert!(input_kind(&dir.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn missing_input_is_reported() {
        let err = load_pages(Path::new("/definitely/not/here.png"), 200).unwrap_err();
        assert!(err.to_string().contains("input file not found"));
    }

    #[test]
    fn single_image_is_one_page() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("page.png");
        solid_image(30, 20, [1, 2, 3]).save(&path).expect("save png");

        let pages = load_pages(&path, 200).expect("load pages");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].dimensions(), (30, 20));
        assert_eq!(pages[0].get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn rendered_pages_sort_numerically() {
        let mut paths: Vec<PathBuf> = ["page-10.png", "page-2.png", "page-1.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        paths.sort_by_key(|path| page_number(path));
        let names: Vec<_> = paths
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["page-1.png", "page-2.png", "page-10.png"]);
        assert!(!is_rendered_page(Path::new("input.pdf")));
    }

    #[test]
    fn shell_is_found_on_path() {
        #[cfg(unix)]
        assert!(command_exists("sh"));
        assert!(!command_exists("no-such-rasterizer-binary"));
    }
}
