use std::path::Path;

use async_trait::async_trait;
use windows::{
    Globalization::Language,
    Graphics::Imaging::BitmapDecoder,
    Media::Ocr::OcrEngine as WinOcrEngine,
    Storage::Streams::{DataWriter, InMemoryRandomAccessStream},
    core::HSTRING,
};

use crate::com::ComGuard;
use crate::{ExtractError, TextExtractor};

/// OCR through `Windows.Media.Ocr`
pub struct WindowsOcrExtractor {
    language: String,
}

impl WindowsOcrExtractor {
    /// Fails early when no recognizer is installed for `language`
    pub fn new(language: impl Into<String>) -> Result<Self, ExtractError> {
        let language = language.into();
        let _com = ComGuard::initialize()?;
        create_engine(&language)?;
        Ok(Self { language })
    }
}

fn engine_error(context: &str) -> impl FnOnce(windows::core::Error) -> ExtractError + '_ {
    move |e| ExtractError::Engine(format!("{context}: {e}"))
}

fn create_engine(language_code: &str) -> Result<WinOcrEngine, ExtractError> {
    let language = Language::CreateLanguage(&HSTRING::from(language_code))
        .map_err(engine_error("Failed to create language"))?;

    WinOcrEngine::TryCreateFromLanguage(&language)
        .map_err(engine_error("Failed to create OCR engine for language"))
}

fn recognize_sync(language_code: &str, image_bytes: &[u8]) -> Result<String, ExtractError> {
    let _com = ComGuard::initialize()?;
    let engine = create_engine(language_code)?;

    let stream = InMemoryRandomAccessStream::new().map_err(engine_error("Failed to create stream"))?;
    let writer =
        DataWriter::CreateDataWriter(&stream).map_err(engine_error("Failed to create writer"))?;

    writer
        .WriteBytes(image_bytes)
        .map_err(engine_error("Failed to write image bytes"))?;
    writer
        .StoreAsync()
        .and_then(|op| op.get())
        .map_err(engine_error("Failed to store data"))?;
    writer
        .FlushAsync()
        .and_then(|op| op.get())
        .map_err(engine_error("Failed to flush"))?;

    stream.Seek(0).map_err(engine_error("Failed to seek"))?;

    let bitmap = BitmapDecoder::CreateAsync(&stream)
        .and_then(|op| op.get())
        .and_then(|decoder| decoder.GetSoftwareBitmapAsync())
        .and_then(|op| op.get())
        .map_err(engine_error("Failed to decode bitmap"))?;

    let result = engine
        .RecognizeAsync(&bitmap)
        .and_then(|op| op.get())
        .map_err(engine_error("Failed to get OCR result"))?;

    let lines = result.Lines().map_err(engine_error("Failed to get lines"))?;
    let mut fragments = Vec::new();
    for line in lines {
        let text = line.Text().map_err(engine_error("Failed to get line text"))?;
        let text = text.to_string();
        if !text.trim().is_empty() {
            fragments.push(text.trim().to_string());
        }
    }

    Ok(fragments.join(" "))
}

#[async_trait]
impl TextExtractor for WindowsOcrExtractor {
    async fn extract(&self, image: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(image).await?;
        let language = self.language.clone();

        tokio::task::spawn_blocking(move || recognize_sync(&language, &bytes))
            .await
            .map_err(|e| ExtractError::Join(e.to_string()))?
    }
}
