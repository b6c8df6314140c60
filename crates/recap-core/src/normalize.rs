use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid URL pattern"));
static QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\?.*$").expect("valid query pattern"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid non-word pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// OCR text cleanup applied before summarization
pub fn normalize_text(text: &str) -> String {
    let text: String = text.nfkc().collect();

    let text = URL.replace_all(&text, " ");
    let text = QUERY.replace_all(&text, " ");
    let text = NON_WORD.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim().to_string()
}
