//! pdf2deck
//!
//! Converts a PDF slide deck into an editable presentation.
//!
//! ```text
//! pdf2deck <input.pdf> [output.pptx]
//! ```
//!
//! The output defaults to `<input stem>_editable.pptx` next to the input.
//! A JSON report is printed on stdout. Exit status is 0 on success, 2 when
//! some pages fell back to placeholders or the run was interrupted, and 1
//! when nothing could be converted.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf2deck::config::ConvertConfig;
use pdf2deck::ocr::VisionProvider;
use pdf2deck::pipeline::{Converter, Outcome, PipelineEvent};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf2deck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Partial) => ExitCode::from(2),
        Ok(Outcome::Failed) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run() -> anyhow::Result<Outcome> {
    let mut args = std::env::args_os().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!("usage: pdf2deck <input.pdf> [output.pptx]");
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output(&input));

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ConvertConfig::from_env().context("Invalid configuration")?;

    let credential = config.require_credential()?.to_string();
    let provider = VisionProvider::new(
        &config.ocr_endpoint,
        &credential,
        Duration::from_secs(config.ocr_timeout_secs),
    )?;

    tracing::info!("Starting pdf2deck v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("OCR endpoint: {}", config.ocr_endpoint);

    let converter = Converter::new(config, Arc::new(provider))?.with_progress(|event| {
        if let PipelineEvent::PagePhase { index, phase } = event {
            tracing::debug!("page {} → {}", index, phase);
        }
    });

    // Ctrl+C stops after the current page phase and still writes the deck
    let token = converter.cancellation_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, finishing current page...");
            token.cancel();
        }
    });

    let report = converter
        .convert(&input, &output)
        .await
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.outcome())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "presentation".to_string());
    input.with_file_name(format!("{}_editable.pptx", stem))
}
