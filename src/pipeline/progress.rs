//! Progress events

use std::sync::Arc;

use super::report::Phase;

/// Emitted by the converter as pages move through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started { pages: usize },
    PagePhase { index: usize, phase: Phase },
    PageCompleted { index: usize, text_frames: usize },
    PageFailed { index: usize, phase: Phase, error: String },
    Finished { slides: usize, cancelled: bool },
}

/// Observer invoked synchronously on the converting task
pub type ProgressCallback = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;
