//! Presentation package writer
//!
//! Serializes a `Presentation` as an Office Open XML package. Entries are
//! written in a fixed order with fixed timestamps, so identical decks
//! produce identical bytes.

use std::io::{Cursor, Write};
use std::path::Path;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::model::{Presentation, Slide, TextFrame};
use super::parts::*;
use crate::document::{ConvertError, Result};

/// Notes page size (portrait letter) required by the presentation part
const NOTES_WIDTH: i64 = 6_858_000;
const NOTES_HEIGHT: i64 = 9_144_000;

const FIRST_SLIDE_ID: usize = 256;
const SLIDE_MASTER_ID: &str = "2147483648";

/// Write the package to `path`
pub fn write_presentation<P: AsRef<Path>>(presentation: &Presentation, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(presentation)?;
    std::fs::write(path, bytes).map_err(|e| {
        ConvertError::Assemble(format!("Failed to write {}: {}", path.display(), e))
    })?;
    tracing::debug!(
        "Wrote {} slides to {}",
        presentation.slides.len(),
        path.display()
    );
    Ok(())
}

/// Serialize the package into memory
pub fn to_bytes(presentation: &Presentation) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let xml_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let media_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());

    add(&mut zip, "[Content_Types].xml", &content_types_xml(presentation)?, xml_options)?;
    add(&mut zip, "_rels/.rels", &root_rels_xml()?, xml_options)?;
    add(&mut zip, "docProps/app.xml", APP_XML.as_bytes(), xml_options)?;
    add(&mut zip, "ppt/presentation.xml", &presentation_xml(presentation)?, xml_options)?;
    add(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels_xml(presentation)?,
        xml_options,
    )?;
    add(
        &mut zip,
        "ppt/slideMasters/slideMaster1.xml",
        SLIDE_MASTER_XML.as_bytes(),
        xml_options,
    )?;
    add(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS_XML.as_bytes(),
        xml_options,
    )?;
    add(
        &mut zip,
        "ppt/slideLayouts/slideLayout1.xml",
        SLIDE_LAYOUT_XML.as_bytes(),
        xml_options,
    )?;
    add(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SLIDE_LAYOUT_RELS_XML.as_bytes(),
        xml_options,
    )?;
    add(&mut zip, "ppt/theme/theme1.xml", THEME_XML.as_bytes(), xml_options)?;

    for (i, slide) in presentation.slides.iter().enumerate() {
        let n = i + 1;
        add(
            &mut zip,
            &format!("ppt/slides/slide{}.xml", n),
            &slide_xml(presentation, slide)?,
            xml_options,
        )?;
        add(
            &mut zip,
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            &slide_rels_xml(slide, n)?,
            xml_options,
        )?;
        if let Some(picture) = &slide.background {
            add(
                &mut zip,
                &format!("ppt/media/image{}.png", n),
                &picture.png,
                media_options,
            )?;
        }
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn add(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options)?;
    zip.write_all(data)
        .map_err(|e| ConvertError::Assemble(format!("Failed to write {}: {}", name, e)))
}

// ---------------------------------------------------------------------------
// XML helpers
// ---------------------------------------------------------------------------

struct XmlOut {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlOut {
    fn new() -> Result<Self> {
        let mut out = Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        };
        out.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(out)
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| ConvertError::Assemble(format!("XML write failed: {}", e)))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.emit(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.emit(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, value: &str) -> Result<()> {
        self.start(name, &[])?;
        self.emit(Event::Text(BytesText::new(value)))?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

fn relationship(out: &mut XmlOut, id: &str, kind: &str, target: &str) -> Result<()> {
    out.empty(
        "Relationship",
        &[("Id", id), ("Type", kind), ("Target", target)],
    )
}

/// Drop characters XML 1.0 cannot carry
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

fn content_types_xml(presentation: &Presentation) -> Result<Vec<u8>> {
    let mut out = XmlOut::new()?;
    out.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    out.empty(
        "Default",
        &[("Extension", "rels"), ("ContentType", CT_RELATIONSHIPS)],
    )?;
    out.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    out.empty("Default", &[("Extension", "png"), ("ContentType", "image/png")])?;

    let overrides = [
        ("/ppt/presentation.xml", CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml", CT_THEME),
        ("/docProps/app.xml", CT_EXTENDED_PROPERTIES),
    ];
    for (part, content_type) in overrides {
        out.empty(
            "Override",
            &[("PartName", part), ("ContentType", content_type)],
        )?;
    }
    for n in 1..=presentation.slides.len() {
        let part = format!("/ppt/slides/slide{}.xml", n);
        out.empty("Override", &[("PartName", part.as_str()), ("ContentType", CT_SLIDE)])?;
    }

    out.end("Types")?;
    Ok(out.finish())
}

fn root_rels_xml() -> Result<Vec<u8>> {
    let mut out = XmlOut::new()?;
    out.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    relationship(&mut out, "rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml")?;
    relationship(&mut out, "rId2", REL_EXTENDED_PROPERTIES, "docProps/app.xml")?;
    out.end("Relationships")?;
    Ok(out.finish())
}

/// rId of slide `n` (1-based) in the presentation relationships
fn slide_rel_id(n: usize) -> String {
    format!("rId{}", n + 2)
}

fn presentation_xml(presentation: &Presentation) -> Result<Vec<u8>> {
    let geometry = presentation.geometry;
    let mut out = XmlOut::new()?;
    out.start(
        "p:presentation",
        &[
            ("xmlns:a", NS_A),
            ("xmlns:r", NS_R),
            ("xmlns:p", NS_P),
            ("saveSubsetFonts", "1"),
        ],
    )?;

    out.start("p:sldMasterIdLst", &[])?;
    out.empty("p:sldMasterId", &[("id", SLIDE_MASTER_ID), ("r:id", "rId1")])?;
    out.end("p:sldMasterIdLst")?;

    // An empty sldIdLst is invalid, so it is omitted for zero slides
    if !presentation.is_empty() {
        out.start("p:sldIdLst", &[])?;
        for n in 1..=presentation.slides.len() {
            let id = (FIRST_SLIDE_ID + n - 1).to_string();
            let rel = slide_rel_id(n);
            out.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel.as_str())])?;
        }
        out.end("p:sldIdLst")?;
    }

    let cx = geometry.slide_width.to_string();
    let cy = geometry.slide_height.to_string();
    out.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    let notes_cx = NOTES_WIDTH.to_string();
    let notes_cy = NOTES_HEIGHT.to_string();
    out.empty("p:notesSz", &[("cx", notes_cx.as_str()), ("cy", notes_cy.as_str())])?;

    out.end("p:presentation")?;
    Ok(out.finish())
}

fn presentation_rels_xml(presentation: &Presentation) -> Result<Vec<u8>> {
    let mut out = XmlOut::new()?;
    out.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    relationship(
        &mut out,
        "rId1",
        REL_SLIDE_MASTER,
        "slideMasters/slideMaster1.xml",
    )?;
    relationship(&mut out, "rId2", REL_THEME, "theme/theme1.xml")?;
    for n in 1..=presentation.slides.len() {
        let target = format!("slides/slide{}.xml", n);
        relationship(&mut out, &slide_rel_id(n), REL_SLIDE, &target)?;
    }
    out.end("Relationships")?;
    Ok(out.finish())
}

fn slide_rels_xml(slide: &Slide, n: usize) -> Result<Vec<u8>> {
    let mut out = XmlOut::new()?;
    out.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    relationship(
        &mut out,
        "rId1",
        REL_SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml",
    )?;
    if slide.background.is_some() {
        let target = format!("../media/image{}.png", n);
        relationship(&mut out, "rId2", REL_IMAGE, &target)?;
    }
    out.end("Relationships")?;
    Ok(out.finish())
}

fn write_xfrm(out: &mut XmlOut, x: i64, y: i64, cx: i64, cy: i64) -> Result<()> {
    let (x, y, cx, cy) = (x.to_string(), y.to_string(), cx.to_string(), cy.to_string());
    out.start("a:xfrm", &[])?;
    out.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    out.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    out.end("a:xfrm")
}

fn write_rect_geometry(out: &mut XmlOut) -> Result<()> {
    out.start("a:prstGeom", &[("prst", "rect")])?;
    out.empty("a:avLst", &[])?;
    out.end("a:prstGeom")
}

fn slide_xml(presentation: &Presentation, slide: &Slide) -> Result<Vec<u8>> {
    let mut out = XmlOut::new()?;
    out.start(
        "p:sld",
        &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
    )?;
    out.start("p:cSld", &[])?;
    out.start("p:spTree", &[])?;

    out.start("p:nvGrpSpPr", &[])?;
    out.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    out.empty("p:cNvGrpSpPr", &[])?;
    out.empty("p:nvPr", &[])?;
    out.end("p:nvGrpSpPr")?;
    out.start("p:grpSpPr", &[])?;
    out.start("a:xfrm", &[])?;
    out.empty("a:off", &[("x", "0"), ("y", "0")])?;
    out.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    out.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
    out.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
    out.end("a:xfrm")?;
    out.end("p:grpSpPr")?;

    let mut shape_id = 2;

    // Background first so every frame sits above it
    if slide.background.is_some() {
        let id = shape_id.to_string();
        shape_id += 1;
        out.start("p:pic", &[])?;
        out.start("p:nvPicPr", &[])?;
        out.empty("p:cNvPr", &[("id", id.as_str()), ("name", "Background")])?;
        out.start("p:cNvPicPr", &[])?;
        out.empty("a:picLocks", &[("noChangeAspect", "1")])?;
        out.end("p:cNvPicPr")?;
        out.empty("p:nvPr", &[])?;
        out.end("p:nvPicPr")?;
        out.start("p:blipFill", &[])?;
        out.empty("a:blip", &[("r:embed", "rId2")])?;
        out.start("a:stretch", &[])?;
        out.empty("a:fillRect", &[])?;
        out.end("a:stretch")?;
        out.end("p:blipFill")?;
        out.start("p:spPr", &[])?;
        write_xfrm(
            &mut out,
            0,
            0,
            presentation.geometry.slide_width,
            presentation.geometry.slide_height,
        )?;
        write_rect_geometry(&mut out)?;
        out.end("p:spPr")?;
        out.end("p:pic")?;
    }

    for (i, frame) in slide.text_frames.iter().enumerate() {
        write_text_frame(&mut out, frame, shape_id, i + 1)?;
        shape_id += 1;
    }

    out.end("p:spTree")?;
    out.end("p:cSld")?;
    out.start("p:clrMapOvr", &[])?;
    out.empty("a:masterClrMapping", &[])?;
    out.end("p:clrMapOvr")?;
    out.end("p:sld")?;
    Ok(out.finish())
}

fn write_text_frame(out: &mut XmlOut, frame: &TextFrame, shape_id: usize, ordinal: usize) -> Result<()> {
    let id = shape_id.to_string();
    let name = format!("TextBox {}", ordinal);

    out.start("p:sp", &[])?;
    out.start("p:nvSpPr", &[])?;
    out.empty("p:cNvPr", &[("id", id.as_str()), ("name", name.as_str())])?;
    out.empty("p:cNvSpPr", &[("txBox", "1")])?;
    out.empty("p:nvPr", &[])?;
    out.end("p:nvSpPr")?;

    out.start("p:spPr", &[])?;
    write_xfrm(out, frame.x, frame.y, frame.cx, frame.cy)?;
    write_rect_geometry(out)?;
    out.empty("a:noFill", &[])?;
    out.end("p:spPr")?;

    out.start("p:txBody", &[])?;
    out.start("a:bodyPr", &[("wrap", "square"), ("rtlCol", "0")])?;
    out.empty("a:noAutofit", &[])?;
    out.end("a:bodyPr")?;
    out.empty("a:lstStyle", &[])?;

    out.start("a:p", &[])?;
    let text = sanitize(&frame.text.replace("\r\n", "\n").replace('\r', "\n"));
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.start("a:br", &[])?;
            write_run_properties(out, frame)?;
            out.end("a:br")?;
        }
        if line.is_empty() {
            continue;
        }
        out.start("a:r", &[])?;
        write_run_properties(out, frame)?;
        out.text_element("a:t", line)?;
        out.end("a:r")?;
    }
    out.end("a:p")?;

    out.end("p:txBody")?;
    out.end("p:sp")
}

fn write_run_properties(out: &mut XmlOut, frame: &TextFrame) -> Result<()> {
    let style = &frame.style;
    let size = style.size.to_string();
    let bold = if style.bold { "1" } else { "0" };
    let italic = if style.italic { "1" } else { "0" };

    out.start(
        "a:rPr",
        &[
            ("lang", "en-US"),
            ("sz", size.as_str()),
            ("b", bold),
            ("i", italic),
            ("dirty", "0"),
        ],
    )?;
    out.start("a:solidFill", &[])?;
    let color = style.color.to_hex();
    out.empty("a:srgbClr", &[("val", color.as_str())])?;
    out.end("a:solidFill")?;
    if let Some(typeface) = &style.font_name {
        let typeface = sanitize(typeface);
        out.empty("a:latin", &[("typeface", typeface.as_str())])?;
    }
    out.end("a:rPr")
}
