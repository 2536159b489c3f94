//! OCR Types
//!
//! Error taxonomy plus the request/response shapes of the
//! `images:annotate` document-text wire format.

use serde::{Deserialize, Serialize};

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// Credential rejected by the service
    #[error("OCR authentication failed: {0}")]
    Auth(String),

    /// Network failure, timeout, 5xx or 429
    #[error("OCR transport failed: {0}")]
    Transport(String),

    /// Response missing required fields or undecodable
    #[error("OCR response malformed: {0}")]
    Format(String),
}

impl OcrError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct AnnotateRequest {
    pub requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImageContent {
    /// Base64-encoded PNG
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl AnnotateRequest {
    pub fn document_text(content: String) -> Self {
        Self {
            requests: vec![ImageRequest {
                image: ImageContent { content },
                features: vec![Feature {
                    kind: "DOCUMENT_TEXT_DETECTION",
                }],
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotateResponse {
    pub responses: Option<Vec<ImageResponse>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageResponse {
    #[serde(default)]
    pub full_text_annotation: Option<FullTextAnnotation>,
    /// Per-image error (google.rpc.Status)
    #[serde(default)]
    pub error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FullTextAnnotation {
    #[serde(default)]
    pub pages: Vec<AnnotatedPage>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnnotatedPage {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Block {
    #[serde(default)]
    pub bounding_box: Option<BoundingPoly>,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<WireVertex>,
}

/// Vertex as sent on the wire; absent coordinates mean 0
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WireVertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Paragraph {
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Word {
    #[serde(default)]
    pub symbols: Vec<Symbol>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Symbol {
    #[serde(default)]
    pub text: String,
}

impl Block {
    /// Words are joined symbols; paragraphs are space-joined words
    pub fn text(&self) -> String {
        let paragraphs: Vec<String> = self
            .paragraphs
            .iter()
            .map(|p| {
                p.words
                    .iter()
                    .map(|w| w.symbols.iter().map(|s| s.text.as_str()).collect::<String>())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string()
            })
            .collect();
        paragraphs.join("\n").trim().to_string()
    }
}
