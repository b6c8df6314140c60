use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::{ProviderMetadata, SummarizeError, Summarizer};

#[derive(Serialize)]
struct SummaryRequest<'a> {
    inputs: &'a str,
    parameters: SummaryParameters,
}

#[derive(Serialize)]
struct SummaryParameters {
    min_length: u32,
    max_length: u32,
    do_sample: bool,
}

/// Summarization through the Hugging Face inference API
#[derive(Clone)]
pub struct HuggingFaceSummarizer {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl HuggingFaceSummarizer {
    pub fn new(
        api_url: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/{}", api_url.trim_end_matches('/'), model),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(
        &self,
        text: &str,
        min_length: u32,
        max_length: u32,
    ) -> Result<String, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let body = SummaryRequest {
            inputs: text,
            parameters: SummaryParameters {
                min_length,
                max_length,
                do_sample: false,
            },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == 429 {
            return Err(SummarizeError::RateLimitExceeded);
        }

        if status == 401 || status == 403 {
            return Err(SummarizeError::AuthenticationError);
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            SummarizeError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        if status == 503 {
            let wait = json["estimated_time"].as_f64().unwrap_or(0.0);
            return Err(SummarizeError::ModelUnavailable(wait));
        }

        if !status.is_success() {
            let detail = json["error"].as_str().unwrap_or("no detail");
            return Err(SummarizeError::ApiError(format!("HTTP {}: {}", status, detail)));
        }

        let summary = json
            .get(0)
            .and_then(|s| s["summary_text"].as_str())
            .ok_or_else(|| SummarizeError::ApiError("No summary in response".to_string()))?;

        tracing::debug!(chars = summary.len(), "received summary");
        Ok(summary.trim().to_string())
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "huggingface".to_string(),
            requires_api_key: true,
            remote: true,
        }
    }
}
