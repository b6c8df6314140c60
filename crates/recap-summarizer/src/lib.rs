mod extractive;
mod huggingface;
mod languagetool;

pub use extractive::ExtractiveSummarizer;
pub use huggingface::HuggingFaceSummarizer;
pub use languagetool::LanguageToolCorrector;

/// Condenses a block of recognized text into a short synopsis
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text` to between `min_length` and `max_length` tokens
    async fn summarize(
        &self,
        text: &str,
        min_length: u32,
        max_length: u32,
    ) -> Result<String, SummarizeError>;

    /// Provider metadata
    fn metadata(&self) -> ProviderMetadata;
}

/// Rewrites a synopsis into grammatical prose
#[async_trait::async_trait]
pub trait GrammarCorrector: Send + Sync {
    async fn correct(&self, text: &str) -> Result<String, CorrectError>;
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub requires_api_key: bool,
    pub remote: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Nothing to summarize")]
    EmptyInput,

    #[error("Model is loading, retry in {0:.0}s")]
    ModelUnavailable(f64),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication error")]
    AuthenticationError,
}

#[derive(Debug, thiserror::Error)]
pub enum CorrectError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
