//! OCR Providers
//!
//! Defines the detector trait and the HTTP document-OCR backend.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use image::RgbImage;
use reqwest::StatusCode;
use tracing::warn;

use super::types::{AnnotateRequest, AnnotateResponse, Block, OcrError};
use crate::document::{PixelRect, TextRegion, Vertex};

/// Text detection capability
///
/// Returns block-level regions in engine order. An image with no text
/// yields an empty list, not an error.
#[async_trait]
pub trait TextDetector: Send + Sync {
    async fn detect_text_blocks(&self, image: &RgbImage) -> Result<Vec<TextRegion>, OcrError>;
}

/// Google Cloud Vision compatible `images:annotate` provider
pub struct VisionProvider {
    client: reqwest::Client,
    endpoint: String,
    credential: String,
}

impl VisionProvider {
    pub fn new(endpoint: &str, credential: &str, timeout: Duration) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            credential: credential.to_string(),
        })
    }

    fn encode_png(image: &RgbImage) -> Result<String, OcrError> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .map_err(|e| OcrError::Format(format!("Failed to encode page image: {}", e)))?;
        Ok(base64::engine::general_purpose::STANDARD.encode(buffer))
    }
}

#[async_trait]
impl TextDetector for VisionProvider {
    async fn detect_text_blocks(&self, image: &RgbImage) -> Result<Vec<TextRegion>, OcrError> {
        let request = AnnotateRequest::document_text(Self::encode_png(image)?);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.credential.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OcrError::Transport(format!("OCR request timed out: {}", e))
                } else {
                    OcrError::Transport(format!("Failed to call OCR service: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::Transport(format!("Failed to read OCR response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        parse_response(&body, image.width(), image.height())
    }
}

/// Map a non-success HTTP status to the error taxonomy
fn classify_status(status: StatusCode, body: &str) -> OcrError {
    let detail = format!("OCR service returned {}: {}", status, body.trim());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return OcrError::Auth(detail);
    }
    if body.contains("UNAUTHENTICATED") || body.contains("PERMISSION_DENIED") {
        return OcrError::Auth(detail);
    }
    if status == StatusCode::BAD_REQUEST && body.contains("API key") {
        return OcrError::Auth(detail);
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return OcrError::Transport(detail);
    }
    OcrError::Format(detail)
}

/// Decode an annotate response into block regions
pub(crate) fn parse_response(
    body: &str,
    image_width: u32,
    image_height: u32,
) -> Result<Vec<TextRegion>, OcrError> {
    let parsed: AnnotateResponse = serde_json::from_str(body)
        .map_err(|e| OcrError::Format(format!("Undecodable OCR response: {}", e)))?;

    let responses = parsed
        .responses
        .ok_or_else(|| OcrError::Format("OCR response has no `responses` field".to_string()))?;

    let Some(first) = responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(status) = first.error {
        // google.rpc.Code: 7 PERMISSION_DENIED, 16 UNAUTHENTICATED, 14 UNAVAILABLE
        return Err(match status.code {
            7 | 16 => OcrError::Auth(status.message),
            4 | 8 | 13 | 14 => OcrError::Transport(status.message),
            _ => OcrError::Format(status.message),
        });
    }

    let Some(annotation) = first.full_text_annotation else {
        return Ok(Vec::new());
    };

    let mut regions = Vec::new();
    for page in &annotation.pages {
        for block in &page.blocks {
            if let Some(region) = block_to_region(block, image_width, image_height) {
                regions.push(region);
            }
        }
    }
    Ok(regions)
}

/// A block without a usable bounding box is skipped, not fatal to the page
fn block_to_region(block: &Block, image_width: u32, image_height: u32) -> Option<TextRegion> {
    let text = block.text();
    if text.is_empty() {
        return None;
    }

    let vertices: Vec<Vertex> = block
        .bounding_box
        .as_ref()
        .map(|poly| {
            poly.vertices
                .iter()
                .map(|v| {
                    Vertex::new(
                        v.x.clamp(0, image_width as i32),
                        v.y.clamp(0, image_height as i32),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    if vertices.len() < 4 {
        warn!(
            "Skipping OCR block \"{}\": {} bounding vertices, expected 4",
            text,
            vertices.len()
        );
        return None;
    }

    let bounds = PixelRect::enclosing(&vertices, image_width, image_height)?;

    Some(
        TextRegion::new(text, bounds)
            .with_polygon(vertices)
            .with_confidence(block.confidence.unwrap_or(1.0)),
    )
}

/// Detector that replays scripted results, one per call
#[cfg(test)]
pub struct ScriptedDetector {
    script: parking_lot::Mutex<std::collections::VecDeque<Result<Vec<TextRegion>, OcrError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedDetector {
    pub fn new(script: Vec<Result<Vec<TextRegion>, OcrError>>) -> Self {
        Self {
            script: parking_lot::Mutex::new(script.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Detector that never finds text
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl TextDetector for ScriptedDetector {
    async fn detect_text_blocks(&self, _image: &RgbImage) -> Result<Vec<TextRegion>, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.script.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hello_response() -> serde_json::Value {
        serde_json::json!({
            "responses": [{
                "fullTextAnnotation": {
                    "pages": [{
                        "blocks": [{
                            "boundingBox": {"vertices": [
                                {"x": 50, "y": 50}, {"x": 170, "y": 48},
                                {"x": 172, "y": 90}, {"x": 48, "y": 92}
                            ]},
                            "confidence": 0.97,
                            "paragraphs": [{"words": [{"symbols": [
                                {"text": "H"}, {"text": "e"}, {"text": "l"},
                                {"text": "l"}, {"text": "o"}
                            ]}]}]
                        }]
                    }]
                }
            }]
        })
    }

    async fn provider_for(server: &MockServer) -> VisionProvider {
        VisionProvider::new(
            &format!("{}/v1/images:annotate", server.uri()),
            "test-key",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_detects_hello_block() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images:annotate"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hello_response()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let image = RgbImage::from_pixel(800, 600, image::Rgb([255, 255, 255]));
        let regions = provider.detect_text_blocks(&image).await.unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text, "Hello");
        assert_eq!(regions[0].bounds, PixelRect::new(48, 48, 124, 44));
        assert_eq!(regions[0].polygon.as_ref().unwrap().len(), 4);
        assert!((regions[0].confidence - 0.97).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let image = RgbImage::new(10, 10);
        let result = provider.detect_text_blocks(&image).await;
        assert!(matches!(result, Err(OcrError::Auth(_))));
    }

    #[tokio::test]
    async fn test_service_unavailable_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let result = provider.detect_text_blocks(&RgbImage::new(10, 10)).await;
        assert!(matches!(result, Err(OcrError::Transport(_))));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"error":{"message":"API key not valid."}}"#),
            OcrError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"error":{"status":"UNAUTHENTICATED"}}"#),
            OcrError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            OcrError::Transport(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "bad image"),
            OcrError::Format(_)
        ));
    }

    #[test]
    fn test_parse_missing_responses_is_format_error() {
        assert!(matches!(
            parse_response("{}", 100, 100),
            Err(OcrError::Format(_))
        ));
        assert!(matches!(
            parse_response("not json", 100, 100),
            Err(OcrError::Format(_))
        ));
    }

    #[test]
    fn test_parse_no_annotation_is_empty() {
        let regions = parse_response(r#"{"responses":[{}]}"#, 100, 100).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_parse_skips_block_without_vertices() {
        let body = serde_json::json!({
            "responses": [{"fullTextAnnotation": {"pages": [{"blocks": [
                {
                    "boundingBox": {"vertices": [{"x": 1, "y": 1}, {"x": 5, "y": 1}]},
                    "paragraphs": [{"words": [{"symbols": [{"text": "x"}]}]}]
                },
                {
                    "boundingBox": {"vertices": [
                        {"x": 10, "y": 10}, {"x": 60, "y": 10}, {"x": 60, "y": 30}, {"x": 10, "y": 30}
                    ]},
                    "paragraphs": [{"words": [{"symbols": [{"text": "O"}, {"text": "k"}]}]}]
                }
            ]}]}}]
        });
        let regions = parse_response(&body.to_string(), 100, 100).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text, "Ok");
        assert_eq!(regions[0].bounds, PixelRect::new(10, 10, 50, 20));
    }

    #[test]
    fn test_parse_skips_empty_blocks_and_clamps() {
        let body = serde_json::json!({
            "responses": [{"fullTextAnnotation": {"pages": [{"blocks": [
                {"paragraphs": [{"words": [{"symbols": [{"text": " "}]}]}]},
                {
                    "boundingBox": {"vertices": [
                        {"x": -4}, {"x": 120, "y": 0}, {"x": 120, "y": 30}, {"y": 30}
                    ]},
                    "paragraphs": [{"words": [{"symbols": [{"text": "Edge"}]}]}]
                }
            ]}]}}]
        });
        let regions = parse_response(&body.to_string(), 100, 100).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bounds, PixelRect::new(0, 0, 100, 30));
        assert_eq!(regions[0].confidence, 1.0);
    }

    #[test]
    fn test_parse_per_image_auth_error() {
        let body = r#"{"responses":[{"error":{"code":16,"message":"bad credential"}}]}"#;
        assert!(matches!(
            parse_response(body, 100, 100),
            Err(OcrError::Auth(_))
        ));
    }
}
