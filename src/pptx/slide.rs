use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::parts::{NS_A, NS_P, NS_R};
use crate::color::Rgb;
use crate::layout::{Canvas, PlacedElement};

/// Shape ids 1 and 2 are the group root and the backdrop picture.
const FIRST_ELEMENT_ID: usize = 3;

/// Slide XML: backdrop picture, then a cover rectangle and a text box per
/// element, painted in that order.
pub(super) fn slide_xml(
    canvas: Canvas,
    elements: &[PlacedElement],
    font_family: &str,
) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    start(
        &mut writer,
        "p:sld",
        &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
    )?;
    start(&mut writer, "p:cSld", &[])?;
    start(&mut writer, "p:spTree", &[])?;
    write_group_root(&mut writer)?;
    write_backdrop(&mut writer, canvas)?;

    for (index, element) in elements.iter().enumerate() {
        let id = FIRST_ELEMENT_ID + index * 2;
        write_cover(&mut writer, id, index + 1, element)?;
        write_text_box(&mut writer, id + 1, index + 1, element, font_family)?;
    }

    end(&mut writer, "p:spTree")?;
    end(&mut writer, "p:cSld")?;
    start(&mut writer, "p:clrMapOvr", &[])?;
    empty(&mut writer, "a:masterClrMapping", &[])?;
    end(&mut writer, "p:clrMapOvr")?;
    end(&mut writer, "p:sld")?;
    Ok(writer.into_inner())
}

fn write_group_root(writer: &mut Writer<Vec<u8>>) -> Result<()> {
    start(writer, "p:nvGrpSpPr", &[])?;
    empty(writer, "p:cNvPr", &[("id", "1"), ("name", "")])?;
    empty(writer, "p:cNvGrpSpPr", &[])?;
    empty(writer, "p:nvPr", &[])?;
    end(writer, "p:nvGrpSpPr")?;
    start(writer, "p:grpSpPr", &[])?;
    start(writer, "a:xfrm", &[])?;
    empty(writer, "a:off", &[("x", "0"), ("y", "0")])?;
    empty(writer, "a:ext", &[("cx", "0"), ("cy", "0")])?;
    empty(writer, "a:chOff", &[("x", "0"), ("y", "0")])?;
    empty(writer, "a:chExt", &[("cx", "0"), ("cy", "0")])?;
    end(writer, "a:xfrm")?;
    end(writer, "p:grpSpPr")?;
    Ok(())
}

fn write_backdrop(writer: &mut Writer<Vec<u8>>, canvas: Canvas) -> Result<()> {
    start(writer, "p:pic", &[])?;
    start(writer, "p:nvPicPr", &[])?;
    empty(writer, "p:cNvPr", &[("id", "2"), ("name", "Backdrop")])?;
    start(writer, "p:cNvPicPr", &[])?;
    empty(writer, "a:picLocks", &[("noChangeAspect", "1")])?;
    end(writer, "p:cNvPicPr")?;
    empty(writer, "p:nvPr", &[])?;
    end(writer, "p:nvPicPr")?;

    start(writer, "p:blipFill", &[])?;
    empty(writer, "a:blip", &[("r:embed", "rId2")])?;
    start(writer, "a:stretch", &[])?;
    empty(writer, "a:fillRect", &[])?;
    end(writer, "a:stretch")?;
    end(writer, "p:blipFill")?;

    start(writer, "p:spPr", &[])?;
    write_xfrm(writer, 0, 0, canvas.width, canvas.height)?;
    write_rect_geometry(writer)?;
    end(writer, "p:spPr")?;
    end(writer, "p:pic")?;
    Ok(())
}

fn write_cover(
    writer: &mut Writer<Vec<u8>>,
    id: usize,
    ordinal: usize,
    element: &PlacedElement,
) -> Result<()> {
    let id = id.to_string();
    let name = format!("Cover {ordinal}");
    start(writer, "p:sp", &[])?;
    start(writer, "p:nvSpPr", &[])?;
    empty(writer, "p:cNvPr", &[("id", &id), ("name", &name)])?;
    empty(writer, "p:cNvSpPr", &[])?;
    empty(writer, "p:nvPr", &[])?;
    end(writer, "p:nvSpPr")?;

    start(writer, "p:spPr", &[])?;
    write_xfrm(
        writer,
        element.left,
        element.top,
        element.width,
        element.height,
    )?;
    write_rect_geometry(writer)?;
    write_solid_fill(writer, element.bg_color)?;
    start(writer, "a:ln", &[])?;
    empty(writer, "a:noFill", &[])?;
    end(writer, "a:ln")?;
    end(writer, "p:spPr")?;
    end(writer, "p:sp")?;
    Ok(())
}

fn write_text_box(
    writer: &mut Writer<Vec<u8>>,
    id: usize,
    ordinal: usize,
    element: &PlacedElement,
    font_family: &str,
) -> Result<()> {
    let id = id.to_string();
    let name = format!("TextBox {ordinal}");
    let size = (element.font_size * 100).to_string();
    start(writer, "p:sp", &[])?;
    start(writer, "p:nvSpPr", &[])?;
    empty(writer, "p:cNvPr", &[("id", &id), ("name", &name)])?;
    empty(writer, "p:cNvSpPr", &[("txBox", "1")])?;
    empty(writer, "p:nvPr", &[])?;
    end(writer, "p:nvSpPr")?;

    start(writer, "p:spPr", &[])?;
    write_xfrm(
        writer,
        element.left,
        element.top,
        element.width,
        element.text_height,
    )?;
    write_rect_geometry(writer)?;
    empty(writer, "a:noFill", &[])?;
    end(writer, "p:spPr")?;

    start(writer, "p:txBody", &[])?;
    empty(writer, "a:bodyPr", &[("wrap", "none"), ("rtlCol", "0")])?;
    empty(writer, "a:lstStyle", &[])?;
    start(writer, "a:p", &[])?;
    start(writer, "a:r", &[])?;
    start(writer, "a:rPr", &[("sz", &size), ("dirty", "0")])?;
    write_solid_fill(writer, element.text_color)?;
    empty(writer, "a:latin", &[("typeface", font_family)])?;
    empty(writer, "a:ea", &[("typeface", font_family)])?;
    end(writer, "a:rPr")?;
    start(writer, "a:t", &[])?;
    writer.write_event(Event::Text(BytesText::new(&element.text)))?;
    end(writer, "a:t")?;
    end(writer, "a:r")?;
    end(writer, "a:p")?;
    end(writer, "p:txBody")?;
    end(writer, "p:sp")?;
    Ok(())
}

fn write_xfrm(
    writer: &mut Writer<Vec<u8>>,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
) -> Result<()> {
    let (x, y) = (x.to_string(), y.to_string());
    let (cx, cy) = (cx.max(0).to_string(), cy.max(0).to_string());
    start(writer, "a:xfrm", &[])?;
    empty(writer, "a:off", &[("x", &x), ("y", &y)])?;
    empty(writer, "a:ext", &[("cx", &cx), ("cy", &cy)])?;
    end(writer, "a:xfrm")?;
    Ok(())
}

fn write_rect_geometry(writer: &mut Writer<Vec<u8>>) -> Result<()> {
    start(writer, "a:prstGeom", &[("prst", "rect")])?;
    empty(writer, "a:avLst", &[])?;
    end(writer, "a:prstGeom")?;
    Ok(())
}

fn write_solid_fill(writer: &mut Writer<Vec<u8>>, color: Rgb) -> Result<()> {
    let hex = color.hex();
    start(writer, "a:solidFill", &[])?;
    empty(writer, "a:srgbClr", &[("val", &hex)])?;
    end(writer, "a:solidFill")?;
    Ok(())
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut tag = BytesStart::new(name);
    for attr in attrs {
        tag.push_attribute(*attr);
    }
    writer.write_event(Event::Start(tag))?;
    Ok(())
}

fn empty(writer: &mut Writer<Vec<u8>>, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut tag = BytesStart::new(name);
    for attr in attrs {
        tag.push_attribute(*attr);
    }
    writer.write_event(Event::Empty(tag))?;
    Ok(())
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(text: &str) -> PlacedElement {
        PlacedElement {
            left: 100,
            top: 200,
            width: 500,
            height: 400,
            text_height: 520,
            bg_color: Rgb::new(245, 240, 230),
            text: text.to_string(),
            text_color: Rgb::new(50, 50, 50),
            font_size: 14,
        }
    }

    fn render(elements: &[PlacedElement]) -> String {
        let canvas = Canvas {
            width: 1000,
            height: 800,
        };
        String::from_utf8(slide_xml(canvas, elements, "Microsoft JhengHei").unwrap()).unwrap()
    }

    #[test]
    fn backdrop_only_slide_has_no_shapes() {
        let xml = render(&[]);
        assert!(xml.contains(r#"<a:blip r:embed="rId2"/>"#));
        assert!(xml.contains(r#"<a:ext cx="1000" cy="800"/>"#));
        assert!(!xml.contains("<p:sp>"));
    }

    #[test]
    fn element_becomes_cover_and_text_box() {
        let xml = render(&[element("Hello")]);
        assert_eq!(xml.matches("<p:sp>").count(), 2);
        assert!(xml.contains(r#"<p:cNvPr id="3" name="Cover 1"/>"#));
        assert!(xml.contains(r#"<p:cNvPr id="4" name="TextBox 1"/>"#));
        assert!(xml.contains(r#"<a:srgbClr val="F5F0E6"/></a:solidFill><a:ln><a:noFill/></a:ln>"#));
        assert!(xml.contains(r#"<a:ext cx="500" cy="400"/>"#));
        assert!(xml.contains(r#"<a:ext cx="500" cy="520"/>"#));
        assert!(xml.contains(r#"<a:bodyPr wrap="none" rtlCol="0"/>"#));
        assert!(xml.contains(r#"<a:rPr sz="1400" dirty="0"><a:solidFill><a:srgbClr val="323232"/>"#));
        assert!(xml.contains(r#"<a:latin typeface="Microsoft JhengHei"/>"#));
        assert!(xml.contains("<a:t>Hello</a:t>"));
    }

    #[test]
    fn text_is_escaped() {
        let xml = render(&[element("a < b & c")]);
        assert!(xml.contains("<a:t>a &lt; b &amp; c</a:t>"));
    }
}
