use std::sync::Arc;
use std::time::Duration;

use recap_config::Config;
use recap_core::{ReadableReportWriter, ReportStore, SummaryBounds};

use crate::context::PipelineContext;
use crate::pipeline::{LocalClock, PipelineOrchestrator, PipelineSettings};
use crate::server::ServerState;

pub struct AppState {
    pub config: Config,
    pub store: Arc<ReportStore>,
    pub orchestrator: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let context = PipelineContext::from_config(&config)?;
        Ok(Self::with_context(config, context))
    }

    pub fn with_context(config: Config, context: PipelineContext) -> Self {
        let store = Arc::new(ReportStore::new(config.report.dir.clone()));

        let readable = Arc::new(ReadableReportWriter::new(
            store.clone(),
            context.summarizer,
            context.corrector,
            context.identity,
            SummaryBounds {
                min_length: config.summarizer.min_length,
                max_length: config.summarizer.max_length,
            },
        ));

        let settings = PipelineSettings {
            capture_timeout: Duration::from_secs(config.capture.timeout_secs),
            extract_timeout: Duration::from_secs(config.ocr.timeout_secs),
            record_empty_captures: config.report.record_empty_captures,
        };

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            context.source,
            context.extractor,
            context.preprocessor,
            store.clone(),
            readable,
            Arc::new(LocalClock),
            settings,
        ));

        Self {
            config,
            store,
            orchestrator,
        }
    }

    pub fn server_state(&self) -> ServerState {
        ServerState {
            store: self.store.clone(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.config.capture.interval_secs)
    }
}
