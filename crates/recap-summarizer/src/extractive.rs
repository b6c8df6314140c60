use async_trait::async_trait;

use crate::{ProviderMetadata, SummarizeError, Summarizer};

/// Offline summarizer that keeps the leading words of the text
///
/// Deterministic, so repeated rebuilds of a report produce identical output.
#[derive(Debug, Clone, Default)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self
    }

    fn excerpt(text: &str, max_length: u32) -> String {
        let max_words = max_length.max(1) as usize;
        let words: Vec<&str> = text.split_whitespace().collect();

        if words.len() <= max_words {
            return words.join(" ");
        }

        // Prefer ending on a sentence boundary when one falls in the back half
        let head = &words[..max_words];
        let cut = head
            .iter()
            .rposition(|w| w.ends_with(['.', '!', '?']))
            .filter(|&i| i + 1 >= max_words / 2)
            .map(|i| i + 1)
            .unwrap_or(max_words);

        head[..cut].join(" ")
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(
        &self,
        text: &str,
        _min_length: u32,
        max_length: u32,
    ) -> Result<String, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        Ok(Self::excerpt(text, max_length))
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "extractive".to_string(),
            requires_api_key: false,
            remote: false,
        }
    }
}
