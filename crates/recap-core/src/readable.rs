use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use recap_summarizer::{GrammarCorrector, Summarizer};
use recap_types::{AnalysisRecord, TIMESTAMP_FORMAT};

use crate::{IdentityResolver, ReportStore, StoreError, normalize_text};

const SUMMARY_UNAVAILABLE: &str = "Summary could not be generated";
const NO_TEXT: &str = "No readable text was captured";
const ELAPSED_UNAVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    pub min_length: u32,
    pub max_length: u32,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            min_length: 50,
            max_length: 150,
        }
    }
}

/// Memoized synopses for the date currently being rendered
#[derive(Default)]
struct SynopsisCache {
    date: Option<NaiveDate>,
    entries: HashMap<String, String>,
}

/// Rebuilds `readable_report_<date>.txt` from a day's records
///
/// The narrative is regenerated wholesale; records are never modified.
/// Summaries that succeeded are cached by cleaned text for the current date so a
/// rebuild only calls the summarizer for captures it has not seen yet.
pub struct ReadableReportWriter {
    store: Arc<ReportStore>,
    summarizer: Arc<dyn Summarizer>,
    corrector: Option<Arc<dyn GrammarCorrector>>,
    identity: Arc<dyn IdentityResolver>,
    bounds: SummaryBounds,
    cache: Mutex<SynopsisCache>,
}

impl ReadableReportWriter {
    pub fn new(
        store: Arc<ReportStore>,
        summarizer: Arc<dyn Summarizer>,
        corrector: Option<Arc<dyn GrammarCorrector>>,
        identity: Arc<dyn IdentityResolver>,
        bounds: SummaryBounds,
    ) -> Self {
        Self {
            store,
            summarizer,
            corrector,
            identity,
            bounds,
            cache: Mutex::new(SynopsisCache::default()),
        }
    }

    /// Render the date's records and overwrite its readable report
    pub async fn regenerate(&self, date: NaiveDate) -> Result<PathBuf, StoreError> {
        let report = self.store.load(date).await?;
        self.start_date(date);

        let user = self.identity.current_user();
        let mut paragraphs = Vec::with_capacity(report.len());
        for record in &report.records {
            let framed = self.frame(&record.text).await;
            paragraphs.push(render_paragraph(record, &user, &framed));
        }

        let mut body = paragraphs.join("\n\n");
        body.push('\n');

        let path = self.store.write_readable(date, &body).await?;
        tracing::info!(%date, paragraphs = report.len(), path = %path.display(), "readable report saved");
        Ok(path)
    }

    fn start_date(&self, date: NaiveDate) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if cache.date != Some(date) {
            cache.date = Some(date);
            cache.entries.clear();
        }
    }

    fn cached(&self, cleaned: &str) -> Option<String> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.entries.get(cleaned).cloned()
    }

    fn remember(&self, cleaned: String, framed: String) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.entries.insert(cleaned, framed);
    }

    /// Cleaned, summarized and optionally corrected text for one record
    async fn frame(&self, text: &str) -> String {
        let cleaned = normalize_text(text);
        if cleaned.is_empty() {
            return NO_TEXT.to_string();
        }

        if let Some(hit) = self.cached(&cleaned) {
            return hit;
        }

        let synopsis = match self
            .summarizer
            .summarize(&cleaned, self.bounds.min_length, self.bounds.max_length)
            .await
        {
            Ok(synopsis) => synopsis,
            Err(e) => {
                tracing::warn!("Summarization failed: {}", e);
                return SUMMARY_UNAVAILABLE.to_string();
            }
        };

        let framed = match &self.corrector {
            Some(corrector) => match corrector.correct(&synopsis).await {
                Ok(corrected) => corrected,
                Err(e) => {
                    // Uncorrected fallback is not cached so the next rebuild retries
                    tracing::warn!("Grammar correction failed: {}", e);
                    return synopsis;
                }
            },
            None => synopsis,
        };

        self.remember(cleaned, framed.clone());
        framed
    }
}

fn render_paragraph(record: &AnalysisRecord, user: &str, framed: &str) -> String {
    let framed = framed.trim();
    let framed = framed.strip_suffix('.').unwrap_or(framed);
    let elapsed = record
        .elapsed_since_first
        .map(|e| e.to_string())
        .unwrap_or_else(|| ELAPSED_UNAVAILABLE.to_string());

    format!(
        "On {},\n {} was reviewing information related to: {}.\nTotal time since the first report: {}.",
        record.captured_at.format(TIMESTAMP_FORMAT),
        user,
        framed,
        elapsed
    )
}
