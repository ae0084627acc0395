//! PPTX renderer — writes an assembled [`Deck`] to disk.
//!
//! A .pptx file is an OPC zip: `[Content_Types].xml`, relationship parts,
//! `ppt/presentation.xml`, one slide part per physical slide, plus a minimal
//! master/layout/theme triple that PowerPoint requires even when unused.
//! This writer emits exactly that and nothing more. Layout knowledge stays
//! in the layout engine; the renderer only maps levels to the configured
//! font sizes and escapes text into DrawingML.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::layout::LayoutConfig;
use crate::models::deck::{Deck, ImageStatus, PhysicalSlide};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

// Slide geometry in EMU, 16:9.
const SLIDE_CX: u64 = 12_192_000;
const SLIDE_CY: u64 = 6_858_000;
const MARGIN_X: u64 = 838_200;
const TITLE_Y: u64 = 365_125;
const TITLE_CY: u64 = 1_325_563;
const BODY_Y: u64 = 1_825_625;
const BODY_CY: u64 = 4_351_338;
const BODY_CX_FULL: u64 = 10_515_600;
const BODY_CX_WITH_IMAGE: u64 = 6_400_800;
const IMAGE_X: u64 = 7_543_800;
const IMAGE_CX: u64 = 3_810_000;
const IMAGE_CY: u64 = 3_810_000;

const TITLE_SLIDE_FONT_SZ: u32 = 4400;
const HEADING_FONT_SZ: u32 = 3600;

/// Writes `deck` as a PPTX package at `path`. Slide 1 is the deck title;
/// each physical slide follows in order.
pub fn write_pptx(deck: &Deck, layout: &LayoutConfig, path: &Path) -> Result<(), RenderError> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let opts: FileOptions = FileOptions::default().compression_method(CompressionMethod::Deflated);

    // Slide numbering: 1 = title slide, 2.. = physical slides.
    let slide_count = deck.slides.len() + 1;

    zip.start_file("[Content_Types].xml", opts)?;
    zip.write_all(content_types_xml(slide_count).as_bytes())?;

    zip.start_file("_rels/.rels", opts)?;
    zip.write_all(ROOT_RELS.as_bytes())?;

    zip.start_file("ppt/presentation.xml", opts)?;
    zip.write_all(presentation_xml(slide_count).as_bytes())?;

    zip.start_file("ppt/_rels/presentation.xml.rels", opts)?;
    zip.write_all(presentation_rels_xml(slide_count).as_bytes())?;

    zip.start_file("ppt/slideMasters/slideMaster1.xml", opts)?;
    zip.write_all(SLIDE_MASTER.as_bytes())?;
    zip.start_file("ppt/slideMasters/_rels/slideMaster1.xml.rels", opts)?;
    zip.write_all(SLIDE_MASTER_RELS.as_bytes())?;

    zip.start_file("ppt/slideLayouts/slideLayout1.xml", opts)?;
    zip.write_all(SLIDE_LAYOUT.as_bytes())?;
    zip.start_file("ppt/slideLayouts/_rels/slideLayout1.xml.rels", opts)?;
    zip.write_all(SLIDE_LAYOUT_RELS.as_bytes())?;

    zip.start_file("ppt/theme/theme1.xml", opts)?;
    zip.write_all(THEME.as_bytes())?;

    // Title slide.
    zip.start_file("ppt/slides/slide1.xml", opts)?;
    zip.write_all(title_slide_xml(&deck.title).as_bytes())?;
    zip.start_file("ppt/slides/_rels/slide1.xml.rels", opts)?;
    zip.write_all(slide_rels_xml(None).as_bytes())?;

    for (i, slide) in deck.slides.iter().enumerate() {
        let slide_no = i + 2;
        let image = slide
            .image
            .as_ref()
            .filter(|img| img.status == ImageStatus::Resolved)
            .and_then(|img| img.data.as_ref());

        let media = image.map(|data| (format!("image{slide_no}.{}", image_ext(data)), data));

        zip.start_file(format!("ppt/slides/slide{slide_no}.xml"), opts)?;
        zip.write_all(slide_xml(slide, layout, media.is_some()).as_bytes())?;

        zip.start_file(format!("ppt/slides/_rels/slide{slide_no}.xml.rels"), opts)?;
        zip.write_all(slide_rels_xml(media.as_ref().map(|(name, _)| name.as_str())).as_bytes())?;

        if let Some((name, data)) = media {
            zip.start_file(format!("ppt/media/{name}"), opts)?;
            zip.write_all(data)?;
        }
    }

    zip.finish()?;
    Ok(())
}

fn image_ext(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG") {
        "png"
    } else {
        "jpeg"
    }
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Package-level parts
// ────────────────────────────────────────────────────────────────────────────

fn content_types_xml(slide_count: usize) -> String {
    let mut overrides = String::new();
    for n in 1..=slide_count {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>{overrides}</Types>"#
    )
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#;

fn presentation_xml(slide_count: usize) -> String {
    let mut slide_ids = String::new();
    for n in 1..=slide_count {
        // rId1 is the master; slides start at rId2.
        slide_ids.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            255 + n,
            n + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{SLIDE_CX}" cy="{SLIDE_CY}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
    );
    for n in 1..=slide_count {
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{n}.xml"/>"#,
            n + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    )
}

fn slide_rels_xml(media: Option<&str>) -> String {
    let mut rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
    );
    if let Some(name) = media {
        rels.push_str(&format!(
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{name}"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Slide parts
// ────────────────────────────────────────────────────────────────────────────

const SLD_NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

fn text_shape(id: u32, name: &str, x: u64, y: u64, cx: u64, cy: u64, body: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{body}</p:txBody></p:sp>"#
    )
}

fn paragraph(text: &str, level: u8, size_centipoints: u32, bold: bool) -> String {
    let bold_attr = if bold { r#" b="1""# } else { "" };
    format!(
        r#"<a:p><a:pPr lvl="{level}"/><a:r><a:rPr lang="en-US" sz="{size_centipoints}"{bold_attr} dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
        xml_escape(text)
    )
}

fn picture(slide_no_name: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="4" name="{slide_no_name}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{IMAGE_X}" y="{BODY_Y}"/><a:ext cx="{IMAGE_CX}" cy="{IMAGE_CY}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
    )
}

fn slide_shell(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {SLD_NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

fn title_slide_xml(title: &str) -> String {
    let body = paragraph(title, 0, TITLE_SLIDE_FONT_SZ, true);
    let shape = text_shape(
        2,
        "Title",
        MARGIN_X,
        SLIDE_CY / 3,
        BODY_CX_FULL,
        TITLE_CY,
        &body,
    );
    slide_shell(&shape)
}

fn slide_xml(slide: &PhysicalSlide, layout: &LayoutConfig, has_image: bool) -> String {
    let heading = if slide.continuation {
        format!("{} (cont.)", slide.heading)
    } else {
        slide.heading.clone()
    };

    let mut shapes = text_shape(
        2,
        "Heading",
        MARGIN_X,
        TITLE_Y,
        BODY_CX_FULL,
        TITLE_CY,
        &paragraph(&heading, 0, HEADING_FONT_SZ, true),
    );

    if !slide.items.is_empty() {
        let body: String = slide
            .items
            .iter()
            .map(|item| {
                let size = u32::from(layout.font_size_for(item.level)) * 100;
                paragraph(&item.text, item.level, size, false)
            })
            .collect();
        let body_cx = if has_image {
            BODY_CX_WITH_IMAGE
        } else {
            BODY_CX_FULL
        };
        shapes.push_str(&text_shape(3, "Body", MARGIN_X, BODY_Y, body_cx, BODY_CY, &body));
    }

    if has_image {
        shapes.push_str(&picture("Illustration"));
    }

    slide_shell(&shapes)
}

// ────────────────────────────────────────────────────────────────────────────
// Master / layout / theme boilerplate (minimal valid parts)
// ────────────────────────────────────────────────────────────────────────────

const SLIDE_MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

const SLIDE_MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/></Relationships>"#;

const SLIDE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#;

const SLIDE_LAYOUT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#;

const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Slidesmith"><a:themeElements><a:clrScheme name="Slidesmith"><a:dk1><a:srgbClr val="1A1A1A"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Slidesmith"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Slidesmith"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deck::{ContentItem, ImageRef};
    use bytes::Bytes;
    use std::io::Read;

    fn physical(heading: &str, items: &[(&str, u8)], continuation: bool) -> PhysicalSlide {
        PhysicalSlide {
            heading: heading.to_string(),
            items: items
                .iter()
                .map(|(text, level)| ContentItem {
                    text: text.to_string(),
                    level: *level,
                })
                .collect(),
            continuation,
            image: None,
        }
    }

    #[test]
    fn test_xml_escape_covers_markup_chars() {
        assert_eq!(
            xml_escape(r#"<a & "b"> 'c'"#),
            "&lt;a &amp; &quot;b&quot;&gt; &apos;c&apos;"
        );
    }

    #[test]
    fn test_image_ext_detects_png() {
        assert_eq!(image_ext(b"\x89PNG\r\n"), "png");
        assert_eq!(image_ext(b"\xff\xd8\xff"), "jpeg");
    }

    #[test]
    fn test_slide_xml_uses_configured_font_sizes() {
        let layout = LayoutConfig::default();
        let xml = slide_xml(
            &physical(
                "Introduction",
                &[("Main", 0), ("Sub", 1), ("Detail", 2)],
                false,
            ),
            &layout,
            false,
        );
        assert!(xml.contains(r#"sz="3200""#));
        assert!(xml.contains(r#"sz="2800""#));
        assert!(xml.contains(r#"sz="2400""#));
        assert!(xml.contains(r#"lvl="2""#));
    }

    #[test]
    fn test_continuation_heading_is_marked() {
        let layout = LayoutConfig::default();
        let xml = slide_xml(&physical("Topic", &[("x", 0)], true), &layout, false);
        assert!(xml.contains("Topic (cont.)"));
    }

    #[test]
    fn test_heading_only_slide_has_no_body_shape() {
        let layout = LayoutConfig::default();
        let xml = slide_xml(&physical("Lonely", &[], false), &layout, false);
        assert!(!xml.contains(r#"name="Body""#));
        assert!(xml.contains("Lonely"));
    }

    #[test]
    fn test_write_pptx_emits_expected_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");

        let mut with_image = physical("Illustrated", &[("point", 0)], false);
        with_image.image = Some(ImageRef::resolved(
            "cat".to_string(),
            Bytes::from_static(b"\x89PNG fake"),
        ));

        let deck = Deck {
            title: "Test Deck".to_string(),
            slides: vec![with_image, physical("Plain", &[("a", 0), ("b", 1)], false)],
        };

        write_pptx(&deck, &LayoutConfig::default(), &path).unwrap();

        let file = File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "ppt/presentation.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/slide3.xml",
            "ppt/media/image2.png",
        ] {
            assert!(archive.by_name(part).is_ok(), "missing part {part}");
        }

        let mut presentation = String::new();
        archive
            .by_name("ppt/presentation.xml")
            .unwrap()
            .read_to_string(&mut presentation)
            .unwrap();
        // Title slide + 2 physical slides.
        assert_eq!(presentation.matches("<p:sldId ").count(), 3);
    }

    #[test]
    fn test_failed_image_is_not_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");

        let mut slide = physical("NoImage", &[("point", 0)], false);
        slide.image = Some(ImageRef::failed("cat".to_string()));

        let deck = Deck {
            title: "T".to_string(),
            slides: vec![slide],
        };
        write_pptx(&deck, &LayoutConfig::default(), &path).unwrap();

        let file = File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert!(archive.by_name("ppt/media/image2.jpeg").is_err());
        assert!(archive.by_name("ppt/media/image2.png").is_err());
    }
}
