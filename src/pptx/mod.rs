//! Minimal PresentationML writer: one blank layout, a full-bleed backdrop
//! picture per slide, and cover/text shape pairs on top.

mod parts;
mod slide;

use anyhow::{Context, Result};
use image::RgbImage;
use std::io::{Cursor, Seek, Write};
use time::OffsetDateTime;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::layout::{Canvas, PlacedElement};

#[derive(Debug, Clone)]
pub struct DeckProperties {
    pub title: String,
    pub creator: String,
    pub font_family: String,
    pub created: OffsetDateTime,
}

impl Default for DeckProperties {
    fn default() -> Self {
        Self {
            title: "Converted Presentation".to_string(),
            creator: "scan-to-pptx".to_string(),
            font_family: "Microsoft JhengHei".to_string(),
            created: OffsetDateTime::now_utc(),
        }
    }
}

/// Streams slides into a `.pptx` archive; package-level parts are written by
/// [`DeckBuilder::finish`] once the slide count is known.
pub struct DeckBuilder<W: Write + Seek> {
    zip: ZipWriter<W>,
    canvas: Canvas,
    properties: DeckProperties,
    slides: usize,
}

impl<W: Write + Seek> DeckBuilder<W> {
    pub fn new(writer: W, canvas: Canvas, properties: DeckProperties) -> Self {
        Self {
            zip: ZipWriter::new(writer),
            canvas,
            properties,
            slides: 0,
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slides
    }

    /// Appends a slide whose backdrop is `backdrop_png`, stretched to the
    /// canvas, with `elements` painted over it in order.
    pub fn add_slide(&mut self, backdrop_png: &[u8], elements: &[PlacedElement]) -> Result<()> {
        let index = self.slides + 1;
        let image_name = format!("image{index}.png");

        let xml = slide::slide_xml(self.canvas, elements, &self.properties.font_family)
            .with_context(|| format!("failed to render slide {index}"))?;
        self.write_part(&format!("ppt/slides/slide{index}.xml"), &xml)?;
        self.write_part(
            &format!("ppt/slides/_rels/slide{index}.xml.rels"),
            parts::slide_rels(&image_name).as_bytes(),
        )?;
        self.write_stored(&format!("ppt/media/{image_name}"), backdrop_png)?;

        self.slides = index;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        let (cx, cy) = (self.canvas.width, self.canvas.height);
        let count = self.slides;
        let props = &self.properties;
        let core = parts::core_properties(&props.title, &props.creator, props.created);

        let package = [
            ("[Content_Types].xml", parts::content_types(count)),
            ("_rels/.rels", parts::root_rels()),
            ("docProps/core.xml", core),
            ("docProps/app.xml", parts::app_properties(count)),
            ("ppt/presentation.xml", parts::presentation(count, cx, cy)),
            ("ppt/_rels/presentation.xml.rels", parts::presentation_rels(count)),
            ("ppt/presProps.xml", parts::pres_props()),
            ("ppt/slideMasters/slideMaster1.xml", parts::slide_master()),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels",
                parts::slide_master_rels(),
            ),
            ("ppt/slideLayouts/slideLayout1.xml", parts::blank_layout()),
            (
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
                parts::blank_layout_rels(),
            ),
            ("ppt/theme/theme1.xml", parts::theme()),
        ];
        for (name, content) in package {
            self.write_part(name, content.as_bytes())?;
        }

        self.zip
            .finish()
            .with_context(|| "failed to finalize pptx archive")
    }

    fn write_part(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.write_entry(name, content, options)
    }

    fn write_stored(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        self.write_entry(name, content, options)
    }

    fn write_entry(&mut self, name: &str, content: &[u8], options: FileOptions) -> Result<()> {
        self.zip
            .start_file(name, options)
            .with_context(|| format!("failed to write pptx entry: {name}"))?;
        self.zip
            .write_all(content)
            .with_context(|| format!("failed to write pptx content: {name}"))?;
        Ok(())
    }
}

/// Encodes a page raster as PNG in memory for use as a slide backdrop.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .with_context(|| "failed to encode backdrop image")?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::test_util::solid_image;
    use std::io::Read;
    use zip::ZipArchive;

    fn canvas() -> Canvas {
        Canvas {
            width: 12_191_695,
            height: 6_858_000,
        }
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut file = archive.by_name(name).expect("entry");
        let mut content = String::new();
        file.read_to_string(&mut content).expect("read entry");
        content
    }

    #[test]
    fn deck_contains_every_package_part() {
        let png = encode_png(&solid_image(8, 4, [255, 255, 255])).unwrap();
        let element = PlacedElement {
            left: 0,
            top: 0,
            width: 10,
            height: 10,
            text_height: 13,
            bg_color: Rgb::new(1, 2, 3),
            text: "Hello".to_string(),
            text_color: Rgb::new(4, 5, 6),
            font_size: 14,
        };

        let mut deck = DeckBuilder::new(
            Cursor::new(Vec::new()),
            canvas(),
            DeckProperties::default(),
        );
        deck.add_slide(&png, &[element]).unwrap();
        deck.add_slide(&png, &[]).unwrap();
        assert_eq!(deck.slide_count(), 2);
        let bytes = deck.finish().unwrap().into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/presProps.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/_rels/slide1.xml.rels",
            "ppt/slides/slide2.xml",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }

        let first = read_entry(&mut archive, "ppt/slides/slide1.xml");
        assert!(first.contains("<a:t>Hello</a:t>"));
        let second = read_entry(&mut archive, "ppt/slides/slide2.xml");
        assert!(!second.contains("<p:sp>"));
        let rels = read_entry(&mut archive, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains("../media/image2.png"));
        let app = read_entry(&mut archive, "docProps/app.xml");
        assert!(app.contains("<Slides>2</Slides>"));

        let mut media = Vec::new();
        archive
            .by_name("ppt/media/image1.png")
            .unwrap()
            .read_to_end(&mut media)
            .unwrap();
        assert_eq!(media, png);
    }
}
