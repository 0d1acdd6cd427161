//! Photometric estimates around and inside a text region.
//!
//! Both estimates use per-channel medians over a pixel pool, so stray pixels
//! from neighbouring glyphs or compression noise do not shift the result.

use image::RgbImage;

use crate::ocr::BBoxPx;
use crate::ocr::geom::clamp_bbox;

pub const DEFAULT_MARGIN: u32 = 5;
pub const FALLBACK_BACKGROUND: Rgb = Rgb::new(245, 240, 230);
pub const FALLBACK_TEXT: Rgb = Rgb::new(50, 50, 50);

/// Share of the darkest pixels treated as ink.
const INK_PERCENTILE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Upper-case `RRGGBB`, the form OOXML `srgbClr` expects.
    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(color: Rgb) -> Self {
        image::Rgb([color.r, color.g, color.b])
    }
}

/// Median color of the `margin`-thick strips bordering `bbox`.
///
/// A side contributes only when its whole strip lies inside the image; a
/// region hugging every edge falls back to [`FALLBACK_BACKGROUND`].
pub fn background_color(image: &RgbImage, bbox: &BBoxPx, margin: u32) -> Rgb {
    let (width, height) = image.dimensions();
    let x_end = bbox.x.saturating_add(bbox.w).min(width);
    let y_end = bbox.y.saturating_add(bbox.h).min(height);
    let below = bbox.y.saturating_add(bbox.h);
    let beside = bbox.x.saturating_add(bbox.w);

    let mut strips: Vec<Strip> = Vec::with_capacity(4);
    if bbox.y >= margin && bbox.y <= height {
        strips.push(Strip::new(bbox.x..x_end, bbox.y - margin..bbox.y));
    }
    if below.saturating_add(margin) <= height {
        strips.push(Strip::new(bbox.x..x_end, below..below + margin));
    }
    if bbox.x >= margin && bbox.x <= width {
        strips.push(Strip::new(bbox.x - margin..bbox.x, bbox.y..y_end));
    }
    if beside.saturating_add(margin) <= width {
        strips.push(Strip::new(beside..beside + margin, bbox.y..y_end));
    }

    let mut pool = ChannelHistogram::default();
    for strip in &strips {
        for y in strip.rows.clone() {
            for x in strip.cols.clone() {
                pool.add(*image.get_pixel(x, y));
            }
        }
    }
    pool.median().unwrap_or(FALLBACK_BACKGROUND)
}

/// Median color of the darkest fifth of the pixels inside `bbox`.
///
/// Brightness is the channel sum; every pixel at or below its 20th
/// percentile counts as ink.
pub fn text_color(image: &RgbImage, bbox: &BBoxPx) -> Rgb {
    let Some(region) = clamp_bbox(bbox, image.width(), image.height()) else {
        return FALLBACK_TEXT;
    };

    let mut brightness = BrightnessHistogram::default();
    for pixel in region_pixels(image, region) {
        brightness.add(pixel);
    }
    let Some(threshold) = brightness.percentile(INK_PERCENTILE) else {
        return FALLBACK_TEXT;
    };

    let mut ink = ChannelHistogram::default();
    for pixel in region_pixels(image, region) {
        if f64::from(luma_sum(pixel)) <= threshold {
            ink.add(pixel);
        }
    }
    ink.median().unwrap_or(FALLBACK_TEXT)
}

fn region_pixels(
    image: &RgbImage,
    region: BBoxPx,
) -> impl Iterator<Item = image::Rgb<u8>> + '_ {
    (region.y..region.bottom())
        .flat_map(move |y| (region.x..region.right()).map(move |x| *image.get_pixel(x, y)))
}

struct Strip {
    cols: std::ops::Range<u32>,
    rows: std::ops::Range<u32>,
}

impl Strip {
    fn new(cols: std::ops::Range<u32>, rows: std::ops::Range<u32>) -> Self {
        Self { cols, rows }
    }
}

fn luma_sum(pixel: image::Rgb<u8>) -> u16 {
    pixel.0.iter().map(|channel| u16::from(*channel)).sum()
}

/// Per-channel value counts, enough to take exact medians without sorting.
struct ChannelHistogram {
    counts: [[u32; 256]; 3],
    total: u64,
}

impl Default for ChannelHistogram {
    fn default() -> Self {
        Self {
            counts: [[0; 256]; 3],
            total: 0,
        }
    }
}

impl ChannelHistogram {
    fn add(&mut self, pixel: image::Rgb<u8>) {
        for (channel, value) in pixel.0.iter().enumerate() {
            self.counts[channel][*value as usize] += 1;
        }
        self.total += 1;
    }

    fn median(&self) -> Option<Rgb> {
        if self.total == 0 {
            return None;
        }
        let [r, g, b] = [0, 1, 2].map(|channel| self.channel_median(channel));
        Some(Rgb::new(r, g, b))
    }

    /// Even-sized pools average the two middle values, truncating the half.
    fn channel_median(&self, channel: usize) -> u8 {
        let counts = &self.counts[channel];
        let upper = kth(counts, self.total / 2);
        if self.total % 2 == 1 {
            return upper as u8;
        }
        let lower = kth(counts, self.total / 2 - 1);
        ((lower + upper) / 2) as u8
    }
}

#[derive(Default)]
struct BrightnessHistogram {
    counts: Vec<u32>,
    total: u64,
}

impl BrightnessHistogram {
    fn add(&mut self, pixel: image::Rgb<u8>) {
        if self.counts.is_empty() {
            self.counts = vec![0; 3 * 255 + 1];
        }
        self.counts[luma_sum(pixel) as usize] += 1;
        self.total += 1;
    }

    /// Percentile with linear interpolation between the closest ranks.
    fn percentile(&self, fraction: f64) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let rank = fraction * (self.total - 1) as f64;
        let lo = rank.floor() as u64;
        let hi = rank.ceil() as u64;
        let lo_value = kth(&self.counts, lo) as f64;
        let hi_value = kth(&self.counts, hi) as f64;
        Some(lo_value + (hi_value - lo_value) * (rank - lo as f64))
    }
}

/// Value of the `k`-th smallest sample (0-based) described by `counts`.
fn kth(counts: &[u32], k: u64) -> usize {
    let mut seen = 0u64;
    for (value, count) in counts.iter().enumerate() {
        seen += u64::from(*count);
        if seen > k {
            return value;
        }
    }
    counts.len().saturating_sub(1)
}
