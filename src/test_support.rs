//! Test fixtures
//!
//! Small PDF writer for pipeline scenarios and a reader that summarizes a
//! written presentation package.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

/// One page of a generated PDF (points, origin top-left for callers)
pub struct PdfPage {
    width: f32,
    height: f32,
    content: String,
}

impl PdfPage {
    pub fn blank(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            content: String::new(),
        }
    }

    /// Helvetica text whose glyph box starts roughly at `top`
    pub fn text(mut self, x: f32, top: f32, size: f32, text: &str) -> Self {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let baseline = self.height - top - size * 0.8;
        self.content.push_str(&format!(
            "BT /F1 {size} Tf {x} {baseline} Td ({escaped}) Tj ET\n"
        ));
        self
    }

    /// Filled rectangle in RGB (0-1 components)
    pub fn rect(mut self, x: f32, top: f32, width: f32, height: f32, rgb: (f32, f32, f32)) -> Self {
        let y = self.height - top - height;
        self.content.push_str(&format!(
            "{} {} {} rg {x} {y} {width} {height} re f\n",
            rgb.0, rgb.1, rgb.2
        ));
        self
    }
}

#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<PdfPage>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: PdfPage) -> Self {
        self.pages.push(page);
        self
    }

    /// Serialize with a correct cross-reference table
    pub fn build(self) -> Vec<u8> {
        let mut objects: Vec<String> = Vec::new();

        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", 4 + 2 * i))
            .collect();

        objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
        objects.push(format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            self.pages.len()
        ));
        objects.push(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        );

        for (i, page) in self.pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents {} 0 R \
                 /Resources << /Font << /F1 3 0 R >> >> >>",
                page.width,
                page.height,
                5 + 2 * i
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                page.content.len(),
                page.content
            ));
        }

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_offset = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref_offset
            )
            .as_bytes(),
        );
        out
    }
}

/// Text frame as read back from a slide part
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// Font size in hundredths of a point (first run)
    pub size: Option<u32>,
    /// Text with `<a:br/>` restored as `\n`
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct SlideSummary {
    pub pictures: usize,
    pub frames: Vec<FrameSummary>,
}

/// Summarize every slide of a `.pptx` package, in presentation order
pub fn read_deck(bytes: &[u8]) -> Vec<SlideSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut slides = Vec::new();
    let mut n = 1;
    loop {
        let name = format!("ppt/slides/slide{}.xml", n);
        let mut xml = String::new();
        match archive.by_name(&name) {
            Ok(mut file) => {
                file.read_to_string(&mut xml).unwrap();
            }
            Err(_) => break,
        }
        slides.push(summarize_slide(&xml));
        n += 1;
    }
    slides
}

fn attr(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn summarize_slide(xml: &str) -> SlideSummary {
    let mut reader = Reader::from_str(xml);
    let mut summary = SlideSummary::default();
    let mut current: Option<FrameSummary> = None;
    let mut in_text = false;

    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"p:pic" => summary.pictures += 1,
                b"p:sp" => {
                    current = Some(FrameSummary {
                        x: 0,
                        y: 0,
                        cx: 0,
                        cy: 0,
                        size: None,
                        text: String::new(),
                    })
                }
                b"a:off" => {
                    if let Some(frame) = current.as_mut() {
                        frame.x = attr(&e, b"x").unwrap().parse().unwrap();
                        frame.y = attr(&e, b"y").unwrap().parse().unwrap();
                    }
                }
                b"a:ext" => {
                    if let Some(frame) = current.as_mut() {
                        frame.cx = attr(&e, b"cx").unwrap().parse().unwrap();
                        frame.cy = attr(&e, b"cy").unwrap().parse().unwrap();
                    }
                }
                b"a:rPr" => {
                    if let Some(frame) = current.as_mut() {
                        if frame.size.is_none() {
                            frame.size = attr(&e, b"sz").map(|s| s.parse().unwrap());
                        }
                    }
                }
                b"a:br" => {
                    if let Some(frame) = current.as_mut() {
                        frame.text.push('\n');
                    }
                }
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(frame) = current.as_mut() {
                        frame.text.push_str(&t.unescape().unwrap());
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"p:sp" => {
                    if let Some(frame) = current.take() {
                        summary.frames.push(frame);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    summary
}
