//! Fakes shared by the app-level tests

mod scheduler_tests;
mod server_tests;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use recap_core::{IdentityResolver, ReadableReportWriter, ReportStore, SummaryBounds};
use recap_ocr::{CaptureArtifact, CaptureError, ExtractError, ImagePreprocessor, ImageSource, TextExtractor};
use recap_summarizer::ExtractiveSummarizer;
use tokio::sync::Notify;

use crate::pipeline::{Clock, PipelineOrchestrator, PipelineSettings};

/// Writes a placeholder file per capture and remembers where
pub(crate) struct FakeSource {
    dir: PathBuf,
    fail: bool,
    gate: Option<Arc<Notify>>,
    pub captured: Mutex<Vec<PathBuf>>,
}

impl FakeSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            fail: false,
            gate: None,
            captured: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(dir: &Path) -> Self {
        Self {
            fail: true,
            ..Self::new(dir)
        }
    }

    /// Captures block until `gate` is notified
    pub fn gated(dir: &Path, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(dir)
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSource for FakeSource {
    async fn capture(&self) -> Result<CaptureArtifact, CaptureError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(CaptureError::Native("no display".to_string()));
        }

        let artifact = CaptureArtifact::allocate(&self.dir);
        tokio::fs::write(artifact.path(), b"not really a png").await?;
        self.captured.lock().unwrap().push(artifact.path().to_path_buf());
        Ok(artifact)
    }
}

/// Returns queued texts in order, then empty strings
pub(crate) struct ScriptedExtractor {
    outputs: Mutex<VecDeque<Result<String, String>>>,
    pub calls: AtomicUsize,
    pub saw_file: Mutex<Vec<bool>>,
}

impl ScriptedExtractor {
    pub fn new(outputs: Vec<Result<&str, &str>>) -> Self {
        Self {
            outputs: Mutex::new(
                outputs
                    .into_iter()
                    .map(|o| o.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
            saw_file: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(*t)).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for ScriptedExtractor {
    async fn extract(&self, image: &Path) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.saw_file.lock().unwrap().push(image.exists());

        match self.outputs.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ExtractError::Engine(message)),
            None => Ok(String::new()),
        }
    }
}

/// Hands out the queued instants, repeating the last one
pub(crate) struct StepClock {
    times: Mutex<VecDeque<NaiveDateTime>>,
    last: Mutex<NaiveDateTime>,
}

impl StepClock {
    pub fn new(times: &[&str]) -> Self {
        let times: VecDeque<NaiveDateTime> = times.iter().map(|t| at(t)).collect();
        let first = *times.front().expect("at least one instant");
        Self {
            times: Mutex::new(times),
            last: Mutex::new(first),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> NaiveDateTime {
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.times.lock().unwrap().pop_front() {
            *last = next;
        }
        *last
    }
}

pub(crate) struct Named(pub &'static str);

impl IdentityResolver for Named {
    fn current_user(&self) -> String {
        self.0.to_string()
    }
}

pub(crate) fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub(crate) struct Fixture {
    pub store: Arc<ReportStore>,
    pub orchestrator: Arc<PipelineOrchestrator>,
}

pub(crate) fn fixture(
    report_dir: &Path,
    source: Arc<dyn ImageSource>,
    extractor: Arc<dyn TextExtractor>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
    preprocessor: Option<ImagePreprocessor>,
) -> Fixture {
    let store = Arc::new(ReportStore::new(report_dir));
    let readable = Arc::new(ReadableReportWriter::new(
        store.clone(),
        Arc::new(ExtractiveSummarizer::new()),
        None,
        Arc::new(Named("Ada")),
        SummaryBounds::default(),
    ));
    let orchestrator = Arc::new(PipelineOrchestrator::new(
        source,
        extractor,
        preprocessor,
        store.clone(),
        readable,
        clock,
        settings,
    ));
    Fixture {
        store,
        orchestrator,
    }
}
