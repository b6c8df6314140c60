use serde::{Deserialize, Serialize};

fn default_api_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_model() -> String {
    "facebook/bart-large-cnn".to_string()
}

fn default_min_length() -> u32 {
    50
}

fn default_max_length() -> u32 {
    150
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_grammar_api_url() -> String {
    "https://api.languagetool.org/v2/check".to_string()
}

fn default_grammar_language() -> String {
    "en-US".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummarizerProvider {
    /// Hosted Hugging Face inference API
    HuggingFace,
    /// Local word-bounded excerpt, no network
    #[default]
    Extractive,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SummarizerConfig {
    pub provider: SummarizerProvider,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Lower bound on synopsis length, in tokens
    #[serde(default = "default_min_length")]
    pub min_length: u32,
    /// Upper bound on synopsis length, in tokens
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub grammar: GrammarConfig,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: SummarizerProvider::default(),
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
            min_length: default_min_length(),
            max_length: default_max_length(),
            timeout_secs: default_timeout_secs(),
            grammar: GrammarConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GrammarConfig {
    pub enabled: bool,
    #[serde(default = "default_grammar_api_url")]
    pub api_url: String,
    #[serde(default = "default_grammar_language")]
    pub language: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_grammar_api_url(),
            language: default_grammar_language(),
        }
    }
}
