//! Conversion pipeline
//!
//! Drives each page through rasterize → OCR (unless embedded text is
//! accepted) → mask → inpaint → assemble, in page order on a single task.
//! MuPDF rendering and inpainting run on the blocking pool.
//!
//! Page-level failures never abort the run: the page keeps its slot as a
//! placeholder slide and is listed in the report. Configuration, input,
//! OCR authentication and output errors are returned as `Err`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdf2deck::{config::ConvertConfig, ocr::VisionProvider, pipeline::Converter};
//!
//! let config = ConvertConfig::from_env()?;
//! let provider = VisionProvider::new(&config.ocr_endpoint, config.require_credential()?, timeout)?;
//! let converter = Converter::new(config, Arc::new(provider))?;
//! let report = converter.convert("deck.pdf", "deck_editable.pptx").await?;
//! ```

mod progress;
mod report;

pub use progress::{PipelineEvent, ProgressCallback};
pub use report::{ConversionReport, Outcome, PageFailure, Phase};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConvertConfig;
use crate::document::{CleanedPage, ConvertError, Page, Result, TextRegion};
use crate::fallback::FallbackExtractor;
use crate::inpaint::{Inpaint, MaskInpainter};
use crate::layout::LayoutMapper;
use crate::mask::{build_mask, MaskOptions};
use crate::mupdf::SafeDocument;
use crate::ocr::{OcrService, RetryPolicy, TextDetector};
use crate::pptx::{PresentationAssembler, SlideGeometry};
use crate::raster::{Rasterizer, Render};

enum PageOutcome {
    Completed { text_frames: usize },
    Failed(PageFailure),
    Cancelled,
}

/// PDF → editable presentation converter
pub struct Converter {
    config: ConvertConfig,
    ocr: OcrService,
    renderer: Arc<dyn Render>,
    inpainter: Arc<dyn Inpaint>,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Converter {
    /// Validate `config` and wire the default inpainter
    ///
    /// The detector is used as given; the converter never reads credentials
    /// from the environment.
    pub fn new(config: ConvertConfig, detector: Arc<dyn TextDetector>) -> Result<Self> {
        config.validate()?;

        let retry = RetryPolicy {
            max_retries: config.ocr_max_retries,
            base_delay: Duration::from_millis(config.ocr_backoff_base_ms),
            ..Default::default()
        };
        let ocr = OcrService::new(detector, retry, config.min_confidence);
        let renderer = Arc::new(Rasterizer::new(config.zoom));
        let inpainter = Arc::new(MaskInpainter::new(config.inpaint_method, config.inpaint_radius));

        Ok(Self {
            config,
            ocr,
            renderer,
            inpainter,
            progress: None,
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_inpainter(mut self, inpainter: Arc<dyn Inpaint>) -> Self {
        self.inpainter = inpainter;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PipelineEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Token that stops the conversion between page phases
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Convert `input` and write the presentation to `output`
    pub async fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConversionReport> {
        let input = input.as_ref().to_path_buf();
        let output = output.as_ref().to_path_buf();

        let document = open_document(input.clone()).await?;
        let page_count = document.page_count();
        if page_count == 0 {
            return Err(ConvertError::Input(format!(
                "{} has no pages",
                input.display()
            )));
        }

        info!("Converting {} ({} pages)", document.id(), page_count);
        self.emit(PipelineEvent::Started { pages: page_count });

        let layout = LayoutMapper::new(SlideGeometry::WIDESCREEN, self.config.font_name.clone());
        let mut assembler = PresentationAssembler::new(
            layout,
            self.config.use_background,
            self.config.background_opacity,
        );
        let mut failures = Vec::new();
        let mut cancelled = false;
        let mut document = Some(Arc::new(document));

        for page_index in 0..page_count {
            let index = page_index + 1;
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            // The last page takes the final handle so the document closes once it is rendered
            let doc = if index == page_count {
                document.take()
            } else {
                document.clone()
            };
            let Some(doc) = doc else {
                break;
            };

            match self.process_page(doc, page_index, &mut assembler).await? {
                PageOutcome::Completed { text_frames } => {
                    info!("Page {}/{}: {} text frames", index, page_count, text_frames);
                    self.emit(PipelineEvent::PageCompleted { index, text_frames });
                }
                PageOutcome::Failed(failure) => {
                    warn!(
                        "Page {}/{} failed during {}: {}",
                        index, page_count, failure.phase, failure.error
                    );
                    self.emit(PipelineEvent::PageFailed {
                        index,
                        phase: failure.phase,
                        error: failure.error.clone(),
                    });
                    failures.push(failure);
                }
                PageOutcome::Cancelled => {
                    cancelled = true;
                    break;
                }
            }
        }
        drop(document);

        if cancelled {
            info!(
                "Conversion cancelled after {} of {} pages",
                assembler.slide_count(),
                page_count
            );
        }

        assembler.write(&output)?;

        let report = ConversionReport {
            presentation_path: output,
            page_count: assembler.slide_count(),
            failures,
            cancelled,
        };
        self.emit(PipelineEvent::Finished {
            slides: report.page_count,
            cancelled,
        });
        info!(
            "Wrote {} slides to {} ({:?})",
            report.page_count,
            report.presentation_path.display(),
            report.outcome()
        );
        Ok(report)
    }

    async fn process_page(
        &self,
        doc: Arc<SafeDocument>,
        page_index: usize,
        assembler: &mut PresentationAssembler,
    ) -> Result<PageOutcome> {
        let index = page_index + 1;

        self.phase(index, Phase::Rasterize);
        let (page, embedded) = match self.rasterize(doc, page_index).await {
            Ok(rendered) => rendered,
            Err(e) => {
                assembler.add_blank();
                return Ok(PageOutcome::Failed(PageFailure::new(
                    index,
                    Phase::Rasterize,
                    &e,
                )));
            }
        };

        let mut regions = match embedded {
            Some(regions) => {
                debug!("Page {}: using {} embedded text runs", index, regions.len());
                regions
            }
            None => {
                if self.cancel.is_cancelled() {
                    return Ok(PageOutcome::Cancelled);
                }
                self.phase(index, Phase::Ocr);
                match self.ocr.recognize(&page.pixels).await {
                    Ok(regions) => regions,
                    Err(e) => {
                        let err = ConvertError::from(e);
                        if err.is_fatal() {
                            return Err(err);
                        }
                        assembler.add_raw(page)?;
                        return Ok(PageOutcome::Failed(PageFailure::new(index, Phase::Ocr, &err)));
                    }
                }
            }
        };
        regions.retain(TextRegion::has_text);

        if regions.is_empty() {
            debug!("Page {}: no text, keeping the original background", index);
            assembler.add_raw(page)?;
            return Ok(PageOutcome::Completed { text_frames: 0 });
        }

        let (pixel_width, pixel_height) = (page.pixel_width, page.pixel_height);

        let clean_pixels = if self.config.use_background {
            if self.cancel.is_cancelled() {
                return Ok(PageOutcome::Cancelled);
            }

            self.phase(index, Phase::Mask);
            let mask = build_mask(
                pixel_width,
                pixel_height,
                &regions,
                &MaskOptions::from(&self.config),
            );

            self.phase(index, Phase::Inpaint);
            let inpainter = self.inpainter.clone();
            let joined = tokio::task::spawn_blocking(move || {
                let result = inpainter.inpaint(&page.pixels, &mask);
                (page, result)
            })
            .await;

            match joined {
                Ok((_, Ok(clean))) => clean,
                Ok((page, Err(e))) => {
                    let err = ConvertError::from(e);
                    assembler.add_raw(page)?;
                    return Ok(PageOutcome::Failed(PageFailure::new(
                        index,
                        Phase::Inpaint,
                        &err,
                    )));
                }
                Err(e) => {
                    let err = ConvertError::Inpaint(format!("Inpaint task failed: {}", e));
                    assembler.add_blank();
                    return Ok(PageOutcome::Failed(PageFailure::new(
                        index,
                        Phase::Inpaint,
                        &err,
                    )));
                }
            }
        } else {
            // Frames go on a plain slide, the pixels are never embedded
            page.pixels
        };

        self.phase(index, Phase::Assemble);
        let text_frames = regions.len();
        assembler.add_cleaned(CleanedPage {
            index,
            pixel_width,
            pixel_height,
            clean_pixels,
            regions,
        })?;

        Ok(PageOutcome::Completed { text_frames })
    }

    /// Render a page and try its embedded text layer in one blocking step
    async fn rasterize(
        &self,
        doc: Arc<SafeDocument>,
        page_index: usize,
    ) -> Result<(Page, Option<Vec<TextRegion>>)> {
        let renderer = self.renderer.clone();
        let extractor = FallbackExtractor::new(
            self.config.zoom,
            self.config.fallback_min_glyphs,
            self.config.fallback_min_area_ratio,
        );

        tokio::task::spawn_blocking(move || {
            doc.with_page(page_index, |mupdf_page| {
                let page = renderer.render(mupdf_page, page_index + 1)?;
                let embedded =
                    match extractor.extract(mupdf_page, page.pixel_width, page.pixel_height) {
                        Ok(regions) => regions,
                        Err(e) => {
                            debug!("Page {}: embedded text unavailable: {}", page_index + 1, e);
                            None
                        }
                    };
                Ok((page, embedded))
            })
        })
        .await
        .map_err(|e| ConvertError::Rasterize(format!("Rasterize task failed: {}", e)))?
    }

    fn phase(&self, index: usize, phase: Phase) {
        debug!("Page {}: {}", index, phase);
        self.emit(PipelineEvent::PagePhase { index, phase });
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(callback) = &self.progress {
            callback(&event);
        }
    }
}

async fn open_document(path: PathBuf) -> Result<SafeDocument> {
    tokio::task::spawn_blocking(move || SafeDocument::from_path(path))
        .await
        .map_err(|e| ConvertError::Input(format!("Failed to open document: {}", e)))?
}
