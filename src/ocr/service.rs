//! OCR Service
//!
//! Wraps a detector with retry on transient failures and confidence
//! filtering.

use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;

use super::provider::TextDetector;
use super::types::OcrError;
use crate::document::TextRegion;

/// Exponential backoff schedule for transport failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let multiplier = self.factor.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(multiplier)
    }
}

/// OCR service used by the pipeline
pub struct OcrService {
    detector: Arc<dyn TextDetector>,
    retry: RetryPolicy,
    min_confidence: f32,
}

impl OcrService {
    pub fn new(detector: Arc<dyn TextDetector>, retry: RetryPolicy, min_confidence: f32) -> Self {
        Self {
            detector,
            retry,
            min_confidence,
        }
    }

    /// Detect text blocks, retrying transport failures
    ///
    /// Auth and format errors are returned immediately.
    pub async fn recognize(&self, image: &RgbImage) -> Result<Vec<TextRegion>, OcrError> {
        let mut attempt = 0;
        loop {
            match self.detector.detect_text_blocks(image).await {
                Ok(regions) => return Ok(self.filter(regions)),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        "OCR attempt {} failed: {}, retrying in {:?}",
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn filter(&self, regions: Vec<TextRegion>) -> Vec<TextRegion> {
        if self.min_confidence <= 0.0 {
            return regions;
        }
        let before = regions.len();
        let kept: Vec<TextRegion> = regions
            .into_iter()
            .filter(|r| r.confidence >= self.min_confidence)
            .collect();
        if kept.len() < before {
            tracing::debug!(
                "Dropped {} OCR blocks below confidence {}",
                before - kept.len(),
                self.min_confidence
            );
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PixelRect;
    use crate::ocr::provider::{ScriptedDetector, VisionProvider};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn instant_retry() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn region(text: &str, confidence: f32) -> TextRegion {
        TextRegion::new(text, PixelRect::new(0, 0, 10, 10)).with_confidence(confidence)
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(2));
        assert_eq!(policy.delay(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_retries_transport_then_succeeds() {
        let detector = Arc::new(ScriptedDetector::new(vec![
            Err(OcrError::Transport("503".into())),
            Err(OcrError::Transport("503".into())),
            Ok(vec![region("Hello", 0.9)]),
        ]));
        let service = OcrService::new(detector.clone(), instant_retry(), 0.0);

        let regions = service.recognize(&RgbImage::new(4, 4)).await.unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(detector.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let detector = Arc::new(ScriptedDetector::new(
            (0..5).map(|_| Err(OcrError::Transport("down".into()))).collect(),
        ));
        let service = OcrService::new(detector.clone(), instant_retry(), 0.0);

        let result = service.recognize(&RgbImage::new(4, 4)).await;
        assert!(matches!(result, Err(OcrError::Transport(_))));
        assert_eq!(detector.calls(), 4);
    }

    #[tokio::test]
    async fn test_auth_is_not_retried() {
        let detector = Arc::new(ScriptedDetector::new(vec![
            Err(OcrError::Auth("401".into())),
            Ok(vec![region("never", 1.0)]),
        ]));
        let service = OcrService::new(detector.clone(), instant_retry(), 0.0);

        let result = service.recognize(&RgbImage::new(4, 4)).await;
        assert!(matches!(result, Err(OcrError::Auth(_))));
        assert_eq!(detector.calls(), 1);
    }

    #[tokio::test]
    async fn test_min_confidence_filter() {
        let detector = Arc::new(ScriptedDetector::new(vec![Ok(vec![
            region("keep", 0.9),
            region("drop", 0.2),
        ])]));
        let service = OcrService::new(detector, instant_retry(), 0.5);

        let regions = service.recognize(&RgbImage::new(4, 4)).await.unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text, "keep");
    }

    #[tokio::test]
    async fn test_http_two_unavailable_then_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{"fullTextAnnotation": {"pages": [{"blocks": [{
                    "boundingBox": {"vertices": [
                        {"x": 10, "y": 10}, {"x": 60, "y": 10},
                        {"x": 60, "y": 30}, {"x": 10, "y": 30}
                    ]},
                    "paragraphs": [{"words": [{"symbols": [{"text": "Ok"}]}]}]
                }]}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = VisionProvider::new(&server.uri(), "key", Duration::from_secs(5)).unwrap();
        let service = OcrService::new(Arc::new(provider), instant_retry(), 0.0);

        let regions = service.recognize(&RgbImage::new(100, 50)).await.unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].text, "Ok");
    }
}
