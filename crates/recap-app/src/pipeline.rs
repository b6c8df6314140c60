use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use recap_core::{ReadableReportWriter, ReportStore, StoreError};
use recap_ocr::{CaptureError, ExtractError, ImagePreprocessor, ImageSource, TextExtractor};
use recap_types::AnalysisRecord;
use tokio::time::timeout;

/// Source of capture timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Appended { date: NaiveDate, records: usize },
    /// OCR found no text and empty captures are not recorded
    EmptySkipped,
    /// Another run was still in flight
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("capture timed out after {0:?}")]
    CaptureTimeout(Duration),

    #[error("text extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("text extraction timed out after {0:?}")]
    ExtractTimeout(Duration),

    #[error("report store rejected the record: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub capture_timeout: Duration,
    pub extract_timeout: Duration,
    pub record_empty_captures: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            capture_timeout: Duration::from_secs(60),
            extract_timeout: Duration::from_secs(120),
            record_empty_captures: true,
        }
    }
}

/// Clears the in-flight flag however the run ends
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Capture → OCR → store cycle with at most one run in flight
pub struct PipelineOrchestrator {
    source: Arc<dyn ImageSource>,
    extractor: Arc<dyn TextExtractor>,
    preprocessor: Option<ImagePreprocessor>,
    store: Arc<ReportStore>,
    readable: Arc<ReadableReportWriter>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
    running: AtomicBool,
}

impl PipelineOrchestrator {
    pub fn new(
        source: Arc<dyn ImageSource>,
        extractor: Arc<dyn TextExtractor>,
        preprocessor: Option<ImagePreprocessor>,
        store: Arc<ReportStore>,
        readable: Arc<ReadableReportWriter>,
        clock: Arc<dyn Clock>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            extractor,
            preprocessor,
            store,
            readable,
            clock,
            settings,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one cycle unless one is already in flight, in which case nothing happens
    pub async fn run_cycle(&self) -> Result<RunOutcome, CycleError> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::info!("Previous pipeline run still in progress, skipping this trigger");
            return Ok(RunOutcome::Skipped);
        }
        let _guard = RunGuard(&self.running);

        self.execute().await
    }

    /// Scheduler entry point; logs the outcome instead of returning it
    pub async fn trigger(self: Arc<Self>) {
        match self.run_cycle().await {
            Ok(RunOutcome::Appended { date, records }) => {
                tracing::info!(%date, records, "Pipeline cycle complete");
            }
            Ok(RunOutcome::EmptySkipped) => {
                tracing::info!("No text recognized, nothing recorded");
            }
            Ok(RunOutcome::Skipped) => {}
            Err(e) => tracing::error!("Pipeline cycle failed: {}", e),
        }
    }

    async fn execute(&self) -> Result<RunOutcome, CycleError> {
        let captured_at = self.clock.now();

        let capture = timeout(self.settings.capture_timeout, self.source.capture())
            .await
            .map_err(|_| CycleError::CaptureTimeout(self.settings.capture_timeout))??;
        tracing::debug!(path = %capture.path().display(), "Screenshot saved");

        let preprocessed = match &self.preprocessor {
            Some(preprocessor) => match preprocessor.preprocess(&capture).await {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    tracing::warn!("Preprocessing failed, using raw capture: {}", e);
                    None
                }
            },
            None => None,
        };
        let ocr_input = preprocessed.as_ref().unwrap_or(&capture);

        let text = timeout(
            self.settings.extract_timeout,
            self.extractor.extract(ocr_input.path()),
        )
        .await
        .map_err(|_| CycleError::ExtractTimeout(self.settings.extract_timeout))??;

        drop(preprocessed);
        drop(capture);

        tracing::debug!(chars = text.len(), "Text extracted");

        if text.trim().is_empty() && !self.settings.record_empty_captures {
            return Ok(RunOutcome::EmptySkipped);
        }

        let report = self
            .store
            .append(AnalysisRecord::new(text, captured_at))
            .await?;

        if let Err(e) = self.readable.regenerate(report.date).await {
            tracing::error!(date = %report.date, "Failed to regenerate readable report: {}", e);
        }

        Ok(RunOutcome::Appended {
            date: report.date,
            records: report.len(),
        })
    }
}
