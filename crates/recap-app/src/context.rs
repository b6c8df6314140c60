use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use recap_config::Config;
use recap_config::capture::CaptureBackend;
use recap_config::ocr::OcrEngineKind;
use recap_config::summarizer::SummarizerProvider;
use recap_core::{EnvIdentity, IdentityResolver};
use recap_ocr::{CommandCapture, ImagePreprocessor, ImageSource, TesseractExtractor, TextExtractor};
use recap_summarizer::{
    ExtractiveSummarizer, GrammarCorrector, HuggingFaceSummarizer, LanguageToolCorrector,
    Summarizer,
};

/// Collaborators the pipeline is wired with, built once at startup
///
/// Model clients and OCR engines are constructed here and shared by `Arc`
/// for the life of the process instead of per cycle.
#[derive(Clone)]
pub struct PipelineContext {
    pub source: Arc<dyn ImageSource>,
    pub extractor: Arc<dyn TextExtractor>,
    pub preprocessor: Option<ImagePreprocessor>,
    pub summarizer: Arc<dyn Summarizer>,
    pub corrector: Option<Arc<dyn GrammarCorrector>>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl PipelineContext {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = build_source(config)?;
        let extractor = build_extractor(config)?;
        let summarizer = build_summarizer(config)?;

        let corrector: Option<Arc<dyn GrammarCorrector>> = if config.summarizer.grammar.enabled {
            let corrector = LanguageToolCorrector::new(
                config.summarizer.grammar.api_url.clone(),
                config.summarizer.grammar.language.clone(),
                Duration::from_secs(config.summarizer.timeout_secs),
            )
            .context("Failed to build grammar corrector")?;
            Some(Arc::new(corrector))
        } else {
            None
        };

        let preprocessor = config
            .capture
            .preprocess
            .then(ImagePreprocessor::default);

        tracing::info!(
            capture = ?config.capture.backend,
            ocr = ?config.ocr.engine,
            summarizer = %summarizer.metadata().name,
            grammar = corrector.is_some(),
            "Pipeline collaborators ready"
        );

        Ok(Self {
            source,
            extractor,
            preprocessor,
            summarizer,
            corrector,
            identity: Arc::new(EnvIdentity::new(config.report.user_name.clone())),
        })
    }
}

fn build_source(config: &Config) -> anyhow::Result<Arc<dyn ImageSource>> {
    match config.capture.backend {
        CaptureBackend::Command => {
            let capture = CommandCapture::new(
                config.capture.command.clone(),
                config.capture.temp_dir.clone(),
            )?;
            Ok(Arc::new(capture))
        }
        #[cfg(feature = "native-capture")]
        CaptureBackend::Native => Ok(Arc::new(recap_ocr::ScreenCapture::new(
            config.capture.temp_dir.clone(),
        ))),
        #[cfg(not(feature = "native-capture"))]
        CaptureBackend::Native => {
            anyhow::bail!("native capture requires building with the `native-capture` feature")
        }
    }
}

fn build_extractor(config: &Config) -> anyhow::Result<Arc<dyn TextExtractor>> {
    match config.ocr.engine {
        OcrEngineKind::Tesseract => Ok(Arc::new(TesseractExtractor::new(
            config.ocr.tesseract_path.clone(),
            config.ocr.tesseract_language.clone(),
        ))),
        #[cfg(windows)]
        OcrEngineKind::Windows => {
            let extractor = recap_ocr::WindowsOcrExtractor::new(config.ocr.language.clone())
                .context("Failed to initialize Windows OCR engine")?;
            Ok(Arc::new(extractor))
        }
        #[cfg(not(windows))]
        OcrEngineKind::Windows => anyhow::bail!("the Windows OCR engine is only available on Windows"),
    }
}

fn build_summarizer(config: &Config) -> anyhow::Result<Arc<dyn Summarizer>> {
    let cfg = &config.summarizer;
    match cfg.provider {
        SummarizerProvider::HuggingFace => {
            if cfg.api_key.is_empty() {
                tracing::warn!("No summarizer API key configured, requests may be rate limited");
            }
            let summarizer = HuggingFaceSummarizer::new(
                &cfg.api_url,
                &cfg.model,
                cfg.api_key.clone(),
                Duration::from_secs(cfg.timeout_secs),
            )
            .context("Failed to build summarizer client")?;
            Ok(Arc::new(summarizer))
        }
        SummarizerProvider::Extractive => Ok(Arc::new(ExtractiveSummarizer::new())),
    }
}
