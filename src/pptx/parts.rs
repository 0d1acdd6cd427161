//! Fixed package parts of a presentation: one master, one blank layout, one
//! theme, plus the manifests that list the slides.

use quick_xml::escape::escape;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(super) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(super) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(super) const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(super) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship id of the first slide in `presentation.xml.rels`; master,
/// theme and presProps take rId1..rId3.
const FIRST_SLIDE_RID: usize = 4;

const EMPTY_GROUP: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

pub(super) fn content_types(slide_count: usize) -> String {
    let mut overrides = String::new();
    for index in 1..=slide_count {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{index}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="png" ContentType="image/png"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            r#"<Override PartName="/ppt/presProps.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"/>"#,
            r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
            r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
            "{overrides}",
            "</Types>"
        ),
        decl = XML_DECL,
        overrides = overrides
    )
}

pub(super) fn root_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{base}/officeDocument" Target="ppt/presentation.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
            r#"<Relationship Id="rId3" Type="{base}/extended-properties" Target="docProps/app.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
        base = REL_BASE
    )
}

pub(super) fn presentation(slide_count: usize, cx: i64, cy: i64) -> String {
    let mut slide_ids = String::new();
    for index in 0..slide_count {
        slide_ids.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            256 + index,
            FIRST_SLIDE_RID + index
        ));
    }
    format!(
        concat!(
            "{decl}",
            r#"<p:presentation xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" saveSubsetFonts="1">"#,
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            "<p:sldIdLst>{slide_ids}</p:sldIdLst>",
            r#"<p:sldSz cx="{cx}" cy="{cy}"/>"#,
            r#"<p:notesSz cx="6858000" cy="9144000"/>"#,
            "</p:presentation>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        slide_ids = slide_ids,
        cx = cx,
        cy = cy
    )
}

pub(super) fn presentation_rels(slide_count: usize) -> String {
    let mut rels = String::new();
    for index in 0..slide_count {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/slide" Target="slides/slide{}.xml"/>"#,
            FIRST_SLIDE_RID + index,
            REL_BASE,
            index + 1
        ));
    }
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{base}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{base}/theme" Target="theme/theme1.xml"/>"#,
            r#"<Relationship Id="rId3" Type="{base}/presProps" Target="presProps.xml"/>"#,
            "{rels}",
            "</Relationships>"
        ),
        decl = XML_DECL,
        base = REL_BASE,
        rels = rels
    )
}

pub(super) fn slide_rels(image_name: &str) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{base}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{base}/image" Target="../media/{image}"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
        base = REL_BASE,
        image = image_name
    )
}

pub(super) fn pres_props() -> String {
    format!(
        r#"{}<p:presentationPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"/>"#,
        XML_DECL, NS_A, NS_R, NS_P
    )
}

pub(super) fn slide_master() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            "<p:spTree>{group}</p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "<p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles>",
            "</p:sldMaster>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = EMPTY_GROUP
    )
}

pub(super) fn slide_master_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{base}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="{base}/theme" Target="../theme/theme1.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
        base = REL_BASE
    )
}

pub(super) fn blank_layout() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{group}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>"
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = EMPTY_GROUP
    )
}

pub(super) fn blank_layout_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="{base}/slideMaster" Target="../slideMasters/slideMaster1.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
        base = REL_BASE
    )
}

pub(super) fn theme() -> String {
    let fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    let fills = fill.repeat(3);
    format!(
        concat!(
            "{decl}",
            r#"<a:theme xmlns:a="{a}" name="Office Theme"><a:themeElements>"#,
            r#"<a:clrScheme name="Office">"#,
            r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
            r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
            r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
            r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
            r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
            r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
            "</a:clrScheme>",
            r#"<a:fontScheme name="Office">"#,
            r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
            "</a:fontScheme>",
            r#"<a:fmtScheme name="Office">"#,
            "<a:fillStyleLst>{fills}</a:fillStyleLst>",
            "<a:lnStyleLst>{lines}</a:lnStyleLst>",
            "<a:effectStyleLst>{effects}</a:effectStyleLst>",
            "<a:bgFillStyleLst>{fills}</a:bgFillStyleLst>",
            "</a:fmtScheme>",
            "</a:themeElements></a:theme>"
        ),
        decl = XML_DECL,
        a = NS_A,
        fills = fills,
        lines = line.repeat(3),
        effects = effect.repeat(3)
    )
}

pub(super) fn core_properties(title: &str, creator: &str, created: OffsetDateTime) -> String {
    let stamp = created
        .replace_nanosecond(0)
        .unwrap_or(created)
        .format(&Rfc3339)
        .unwrap_or_default();
    format!(
        concat!(
            "{decl}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title>",
            "<dc:subject>Converted from scanned pages</dc:subject>",
            "<dc:creator>{creator}</dc:creator>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>"#,
            "</cp:coreProperties>"
        ),
        decl = XML_DECL,
        title = escape(title),
        creator = escape(creator),
        stamp = stamp
    )
}

pub(super) fn app_properties(slide_count: usize) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
            r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>scan-to-pptx</Application>",
            "<Slides>{slides}</Slides>",
            "<PresentationFormat>Custom</PresentationFormat>",
            "</Properties>"
        ),
        decl = XML_DECL,
        slides = slide_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_lists_slides_in_order() {
        let xml = presentation(2, 12_191_695, 6_858_000);
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId4"/><p:sldId id="257" r:id="rId5"/>"#));
        assert!(xml.contains(r#"<p:sldSz cx="12191695" cy="6858000"/>"#));

        let rels = presentation_rels(2);
        assert!(rels.contains(r#"Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml""#));
    }

    #[test]
    fn content_types_cover_every_slide() {
        let xml = content_types(3);
        for index in 1..=3 {
            assert!(xml.contains(&format!("/ppt/slides/slide{index}.xml")));
        }
        assert!(!xml.contains("/ppt/slides/slide4.xml"));
    }

    #[test]
    fn core_properties_escape_title() {
        let created = OffsetDateTime::UNIX_EPOCH;
        let xml = core_properties("R&D <draft>", "scan-to-pptx", created);
        assert!(xml.contains("<dc:title>R&amp;D &lt;draft&gt;</dc:title>"));
        assert!(xml.contains("1970-01-01T00:00:00Z"));
    }
}
