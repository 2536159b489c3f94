//! Configuration management for pdf2deck

use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::document::ConvertError;

/// Default Vision-compatible annotate endpoint
pub const DEFAULT_OCR_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Inpainting algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InpaintMethod {
    /// Fast marching method
    #[default]
    Telea,
    /// Diffusion along the mask (Navier-Stokes style)
    Ns,
}

impl FromStr for InpaintMethod {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "telea" => Ok(Self::Telea),
            "ns" => Ok(Self::Ns),
            other => Err(ConvertError::Config(format!(
                "inpaint_method must be \"telea\" or \"ns\", got \"{}\"",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Rasterization scale factor (pixels per point)
    pub zoom: f32,
    /// Pixel padding added to OCR bounds before masking
    pub ocr_padding_px: u32,
    /// Fractional outward expansion for polygonal masks
    pub polygon_padding_ratio: f32,
    /// 3×3 dilation passes applied to the mask
    pub dilation_iterations: u32,
    /// Pixel radius for inpainting
    pub inpaint_radius: u32,
    pub inpaint_method: InpaintMethod,
    /// Non-whitespace embedded glyphs needed to skip OCR
    pub fallback_min_glyphs: usize,
    /// Fraction of page area the embedded runs must cover
    pub fallback_min_area_ratio: f32,
    /// Embed the cleaned page image behind the text frames
    pub use_background: bool,
    /// Background opacity over white, 0-100
    pub background_opacity: u8,
    /// Typeface for frames whose source font is unknown
    pub font_name: Option<String>,
    /// OCR blocks under this confidence are dropped
    pub min_confidence: f32,
    /// API key for the OCR service
    pub credential: Option<String>,
    pub ocr_endpoint: String,
    pub ocr_timeout_secs: u64,
    pub ocr_max_retries: u32,
    pub ocr_backoff_base_ms: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            zoom: 2.0,
            ocr_padding_px: 5,
            polygon_padding_ratio: 0.10,
            dilation_iterations: 2,
            inpaint_radius: 5,
            inpaint_method: InpaintMethod::Telea,
            fallback_min_glyphs: 100,
            fallback_min_area_ratio: 0.05,
            use_background: true,
            background_opacity: 100,
            font_name: None,
            min_confidence: 0.0,
            credential: None,
            ocr_endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            ocr_timeout_secs: 60,
            ocr_max_retries: 3,
            ocr_backoff_base_ms: 1000,
        }
    }
}

impl ConvertConfig {
    /// Load from `PDF2DECK_*` variables, falling back to defaults
    ///
    /// The credential comes from `GOOGLE_VISION_API_KEY`. Malformed numbers
    /// are reported instead of silently replaced.
    pub fn from_env() -> Result<Self, ConvertError> {
        let defaults = ConvertConfig::default();

        let config = ConvertConfig {
            zoom: env_parse("PDF2DECK_ZOOM", defaults.zoom)?,
            ocr_padding_px: env_parse("PDF2DECK_OCR_PADDING_PX", defaults.ocr_padding_px)?,
            polygon_padding_ratio: env_parse(
                "PDF2DECK_POLYGON_PADDING_RATIO",
                defaults.polygon_padding_ratio,
            )?,
            dilation_iterations: env_parse(
                "PDF2DECK_DILATION_ITERATIONS",
                defaults.dilation_iterations,
            )?,
            inpaint_radius: env_parse("PDF2DECK_INPAINT_RADIUS", defaults.inpaint_radius)?,
            inpaint_method: match env::var("PDF2DECK_INPAINT_METHOD") {
                Ok(value) => value.parse()?,
                Err(_) => defaults.inpaint_method,
            },
            fallback_min_glyphs: env_parse(
                "PDF2DECK_FALLBACK_MIN_GLYPHS",
                defaults.fallback_min_glyphs,
            )?,
            fallback_min_area_ratio: env_parse(
                "PDF2DECK_FALLBACK_MIN_AREA_RATIO",
                defaults.fallback_min_area_ratio,
            )?,
            use_background: env_parse("PDF2DECK_USE_BACKGROUND", defaults.use_background)?,
            background_opacity: env_parse(
                "PDF2DECK_BACKGROUND_OPACITY",
                defaults.background_opacity,
            )?,
            font_name: env::var("PDF2DECK_FONT_NAME").ok().filter(|s| !s.is_empty()),
            min_confidence: env_parse("PDF2DECK_MIN_CONFIDENCE", defaults.min_confidence)?,
            credential: env::var("GOOGLE_VISION_API_KEY").ok().filter(|s| !s.is_empty()),
            ocr_endpoint: env::var("PDF2DECK_OCR_ENDPOINT").unwrap_or(defaults.ocr_endpoint),
            ocr_timeout_secs: env_parse("PDF2DECK_OCR_TIMEOUT_SECS", defaults.ocr_timeout_secs)?,
            ocr_max_retries: env_parse("PDF2DECK_OCR_MAX_RETRIES", defaults.ocr_max_retries)?,
            ocr_backoff_base_ms: env_parse(
                "PDF2DECK_OCR_BACKOFF_BASE_MS",
                defaults.ocr_backoff_base_ms,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range options
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.zoom.is_finite() || self.zoom <= 0.0 || self.zoom > 16.0 {
            return Err(ConvertError::Config(format!(
                "zoom must be in (0, 16], got {}",
                self.zoom
            )));
        }
        if !self.polygon_padding_ratio.is_finite() || self.polygon_padding_ratio < 0.0 {
            return Err(ConvertError::Config(format!(
                "polygon_padding_ratio must be >= 0, got {}",
                self.polygon_padding_ratio
            )));
        }
        if self.inpaint_radius == 0 {
            return Err(ConvertError::Config(
                "inpaint_radius must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fallback_min_area_ratio) {
            return Err(ConvertError::Config(format!(
                "fallback_min_area_ratio must be in [0, 1], got {}",
                self.fallback_min_area_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConvertError::Config(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.background_opacity > 100 {
            return Err(ConvertError::Config(format!(
                "background_opacity must be in [0, 100], got {}",
                self.background_opacity
            )));
        }
        if self.ocr_timeout_secs == 0 {
            return Err(ConvertError::Config(
                "ocr_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The OCR credential, or a configuration error when absent
    pub fn require_credential(&self) -> Result<&str, ConvertError> {
        self.credential
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ConvertError::Config("missing OCR credential (GOOGLE_VISION_API_KEY)".to_string())
            })
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ConvertError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConvertError::Config(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConvertConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.zoom, 2.0);
        assert_eq!(config.ocr_padding_px, 5);
        assert_eq!(config.inpaint_radius, 5);
        assert_eq!(config.inpaint_method, InpaintMethod::Telea);
        assert_eq!(config.fallback_min_glyphs, 100);
        assert!(config.use_background);
    }

    #[test]
    fn test_validate_rejects_bad_zoom() {
        let config = ConvertConfig {
            zoom: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConvertError::Config(_))));

        let config = ConvertConfig {
            zoom: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_radius() {
        let config = ConvertConfig {
            inpaint_radius: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inpaint_method_parse() {
        assert_eq!("telea".parse::<InpaintMethod>().unwrap(), InpaintMethod::Telea);
        assert_eq!("NS".parse::<InpaintMethod>().unwrap(), InpaintMethod::Ns);
        assert!("poisson".parse::<InpaintMethod>().is_err());
    }

    #[test]
    fn test_missing_credential() {
        let config = ConvertConfig::default();
        assert!(matches!(
            config.require_credential(),
            Err(ConvertError::Config(_))
        ));

        let config = ConvertConfig {
            credential: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(config.require_credential().is_err());

        let config = ConvertConfig {
            credential: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(config.require_credential().unwrap(), "abc");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ConvertConfig =
            serde_json::from_str(r#"{"zoom": 1.5, "inpaint_method": "ns"}"#).unwrap();
        assert_eq!(config.zoom, 1.5);
        assert_eq!(config.inpaint_method, InpaintMethod::Ns);
        assert_eq!(config.ocr_padding_px, 5);
    }
}
