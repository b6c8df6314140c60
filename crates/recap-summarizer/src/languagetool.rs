use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{CorrectError, GrammarCorrector};

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<CheckMatch>,
}

#[derive(Debug, Deserialize)]
struct CheckMatch {
    offset: usize,
    length: usize,
    #[serde(default)]
    replacements: Vec<Replacement>,
}

#[derive(Debug, Deserialize)]
struct Replacement {
    value: String,
}

/// Grammar and spelling correction through a LanguageTool server
#[derive(Clone)]
pub struct LanguageToolCorrector {
    client: reqwest::Client,
    api_url: String,
    language: String,
}

impl LanguageToolCorrector {
    pub fn new(api_url: String, language: String, timeout: Duration) -> Result<Self, CorrectError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            language,
        })
    }
}

/// Apply the first suggestion of every match
///
/// Offsets count UTF-16 code units. Overlapping matches after the first are ignored.
fn apply_replacements(text: &str, matches: &[CheckMatch]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();

    let mut edits: Vec<(usize, usize, &str)> = matches
        .iter()
        .filter_map(|m| {
            let replacement = m.replacements.first()?;
            let end = m.offset.checked_add(m.length)?;
            (end <= units.len()).then_some((m.offset, end, replacement.value.as_str()))
        })
        .collect();
    edits.sort_by_key(|&(start, _, _)| start);

    let mut out: Vec<u16> = Vec::with_capacity(units.len());
    let mut cursor = 0;
    for (start, end, value) in edits {
        if start < cursor {
            continue;
        }
        out.extend_from_slice(&units[cursor..start]);
        out.extend(value.encode_utf16());
        cursor = end;
    }
    out.extend_from_slice(&units[cursor..]);

    String::from_utf16_lossy(&out)
}

#[async_trait]
impl GrammarCorrector for LanguageToolCorrector {
    async fn correct(&self, text: &str) -> Result<String, CorrectError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let params = [("text", text), ("language", self.language.as_str())];

        let response = self.client.post(&self.api_url).form(&params).send().await?;

        if !response.status().is_success() {
            return Err(CorrectError::ApiError(format!("HTTP {}", response.status())));
        }

        let body: CheckResponse = response
            .json()
            .await
            .map_err(|e| CorrectError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(apply_replacements(text, &body.matches))
    }
}
