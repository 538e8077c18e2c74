//! Extractor adapter: any supported upload into an [`ExtractedDocument`]
//!
//! Routing uses the declared mimetype first and the file extension second.
//! Images go through an [`OcrEngine`] and audio through a [`Transcriber`];
//! both are HTTP backends by default.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ExtractionConfig, RagConfig};
use crate::error::{Error, Result};
use crate::types::{AudioSegment, ExtractedDocument, SourceType};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const OCR_PROMPT: &str = "Extract all text visible in this image. \
Return only the text, preserving line breaks. If there is no text, return nothing.";

/// Output of an extractor
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: ExtractedDocument,
    pub source_type: SourceType,
}

/// Normalizes raw uploads
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, bytes: &[u8], mimetype: &str, filename: &str) -> Result<Extraction>;
}

/// Image to text
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String>;
    fn name(&self) -> &str;
}

/// Result of transcribing audio
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub text: String,
    pub segments: Vec<AudioSegment>,
    pub language: Option<String>,
}

/// Audio to time-coded text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcript>;
    fn name(&self) -> &str;
}

/// Supported upload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Image,
    Audio,
    PlainText,
}

impl FileKind {
    /// Route by mimetype, then by extension
    pub fn detect(mimetype: &str, filename: &str) -> Option<Self> {
        let mut mime = mimetype.trim().to_lowercase();
        if mime.is_empty() || mime == "application/octet-stream" {
            mime = mime_guess::from_path(filename)
                .first_raw()
                .unwrap_or_default()
                .to_string();
        }
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if mime.contains("application/pdf") || ext == "pdf" {
            Some(Self::Pdf)
        } else if mime.contains(DOCX_MIME) || ext == "docx" || ext == "doc" {
            Some(Self::Docx)
        } else if mime.starts_with("image") || matches!(ext.as_str(), "png" | "jpg" | "jpeg") {
            Some(Self::Image)
        } else if mime.starts_with("audio") || matches!(ext.as_str(), "wav" | "mp3" | "m4a") {
            Some(Self::Audio)
        } else if mime.starts_with("text/plain")
            || mime.starts_with("text/markdown")
            || matches!(ext.as_str(), "txt" | "md")
        {
            Some(Self::PlainText)
        } else {
            None
        }
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Image => SourceType::Image,
            Self::Audio => SourceType::Audio,
            Self::Pdf | Self::Docx | Self::PlainText => SourceType::Text,
        }
    }
}

/// Default extractor: local PDF/DOCX/text parsing plus OCR and ASR backends
pub struct DocumentExtractor {
    ocr: Option<Arc<dyn OcrEngine>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    /// Upper bound on local PDF/DOCX parsing
    parse_timeout: Duration,
}

impl DocumentExtractor {
    pub fn new(ocr: Option<Arc<dyn OcrEngine>>, transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self {
            ocr,
            transcriber,
            parse_timeout: Duration::from_secs(ExtractionConfig::default().timeout_secs),
        }
    }

    pub fn with_parse_timeout(mut self, timeout: Duration) -> Self {
        self.parse_timeout = timeout;
        self
    }

    /// Text formats only
    pub fn text_only() -> Self {
        Self::new(None, None)
    }

    /// Ollama vision OCR and Whisper transcription as configured
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let extraction = &config.extraction;

        let ocr = match &extraction.ocr_model {
            Some(model) => Some(Arc::new(OllamaVisionOcr::new(
                &config.llm.base_url,
                model,
                Duration::from_secs(extraction.timeout_secs),
            )?) as Arc<dyn OcrEngine>),
            None => None,
        };

        let transcriber = match &extraction.whisper_url {
            Some(_) => Some(Arc::new(WhisperClient::from_config(extraction)?) as Arc<dyn Transcriber>),
            None => None,
        };

        Ok(Self::new(ocr, transcriber).with_parse_timeout(Duration::from_secs(extraction.timeout_secs)))
    }

    async fn extract_image(&self, bytes: &[u8], filename: &str) -> Result<ExtractedDocument> {
        let ocr = self
            .ocr
            .as_ref()
            .ok_or_else(|| Error::model_unavailable("no OCR backend configured"))?;

        let text = ocr.recognize(bytes).await?;
        tracing::debug!(filename, engine = ocr.name(), chars = text.len(), "OCR finished");
        Ok(ExtractedDocument::from_page_texts([text]))
    }

    async fn extract_audio(&self, bytes: &[u8], filename: &str) -> Result<ExtractedDocument> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| Error::model_unavailable("no transcription backend configured"))?;

        let transcript = transcriber.transcribe(bytes, filename).await?;
        tracing::debug!(
            filename,
            segments = transcript.segments.len(),
            language = transcript.language.as_deref().unwrap_or("unknown"),
            "Transcription finished"
        );
        Ok(ExtractedDocument::from_transcript(&transcript.text, transcript.segments))
    }
}

#[async_trait]
impl Extractor for DocumentExtractor {
    async fn extract(&self, bytes: &[u8], mimetype: &str, filename: &str) -> Result<Extraction> {
        let kind = FileKind::detect(mimetype, filename).ok_or_else(|| {
            Error::UnsupportedFileType(format!("mimetype={}, filename={}", mimetype, filename))
        })?;

        tracing::debug!(filename, mimetype, ?kind, "Extracting");

        let document = match kind {
            FileKind::Pdf => {
                let data = bytes.to_vec();
                let name = filename.to_string();
                run_blocking(filename, self.parse_timeout, move || extract_pdf(&data, &name)).await?
            }
            FileKind::Docx => {
                let data = bytes.to_vec();
                let name = filename.to_string();
                run_blocking(filename, self.parse_timeout, move || extract_docx(&data, &name)).await?
            }
            FileKind::PlainText => extract_plain_text(bytes),
            FileKind::Image => self.extract_image(bytes, filename).await?,
            FileKind::Audio => self.extract_audio(bytes, filename).await?,
        };

        Ok(Extraction {
            document,
            source_type: kind.source_type(),
        })
    }
}

/// Run a CPU-bound parser off the runtime.
///
/// A panic inside the parser (pdf-extract panics on some fonts) or a parse
/// that outlives `timeout` becomes an extraction error for `filename`. A timed
/// out parser thread is left to finish on its own.
async fn run_blocking<T, F>(filename: &str, timeout: Duration, parse: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(parse)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(Error::extraction(filename, format!("parser crashed: {}", e))),
        Err(_) => Err(Error::extraction(
            filename,
            format!("parsing timed out after {}s", timeout.as_secs()),
        )),
    }
}

/// Per-page text via lopdf, falling back to pdf-extract as a single page
fn extract_pdf(bytes: &[u8], filename: &str) -> Result<ExtractedDocument> {
    match lopdf::Document::load_mem(bytes) {
        Ok(doc) => {
            let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
            let texts: Vec<String> = page_numbers
                .iter()
                .map(|&n| {
                    doc.extract_text(&[n]).unwrap_or_else(|e| {
                        tracing::debug!(filename, page = n, "No text on page: {}", e);
                        String::new()
                    })
                })
                .map(|t| t.replace('\0', ""))
                .collect();

            if texts.iter().any(|t| !t.trim().is_empty()) {
                return Ok(ExtractedDocument::from_page_texts(texts));
            }
            tracing::warn!(filename, pages = page_numbers.len(), "lopdf found no text, trying pdf-extract");
        }
        Err(e) => {
            tracing::warn!(filename, "lopdf could not load PDF ({}), trying pdf-extract", e);
        }
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::extraction(filename, e.to_string()))?;
    Ok(ExtractedDocument::from_page_texts([text.replace('\0', "")]))
}

/// Non-empty paragraphs as lines of a single page
fn extract_docx(bytes: &[u8], filename: &str) -> Result<ExtractedDocument> {
    let doc = docx_rs::read_docx(bytes).map_err(|e| Error::extraction(filename, e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            let mut text = String::new();
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            if !text.trim().is_empty() {
                paragraphs.push(text);
            }
        }
    }

    Ok(ExtractedDocument::from_page_texts([paragraphs.join("\n\n")]))
}

fn extract_plain_text(bytes: &[u8]) -> ExtractedDocument {
    ExtractedDocument::from_page_texts([String::from_utf8_lossy(bytes)])
}

/// OCR through an Ollama vision model (llava and similar)
pub struct OllamaVisionOcr {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct VisionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct VisionResponse {
    #[serde(default)]
    response: String,
}

impl OllamaVisionOcr {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::model_unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl OcrEngine for OllamaVisionOcr {
    async fn recognize(&self, image: &[u8]) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = VisionRequest {
            model: &self.model,
            prompt: OCR_PROMPT,
            images: vec![STANDARD.encode(image)],
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::model_unavailable(format!("OCR backend not reachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::model_unavailable(format!(
                "OCR failed: HTTP {} - {}",
                status, body
            )));
        }

        let parsed: VisionResponse = response
            .json()
            .await
            .map_err(|e| Error::model_unavailable(format!("Failed to parse OCR response: {}", e)))?;

        Ok(parsed.response.trim().to_string())
    }

    fn name(&self) -> &str {
        "ollama-vision"
    }
}

/// Whisper-compatible transcription server (`/v1/audio/*`, verbose_json)
pub struct WhisperClient {
    client: Client,
    base_url: String,
    model: String,
    translate: bool,
}

#[derive(Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    segments: Vec<AudioSegment>,
}

impl WhisperClient {
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let base_url = config
            .whisper_url
            .as_deref()
            .ok_or_else(|| Error::Config("extraction.whisper_url is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::model_unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.whisper_model.clone(),
            translate: config.whisper_task.eq_ignore_ascii_case("translate"),
        })
    }

    fn endpoint(&self) -> String {
        let route = if self.translate { "translations" } else { "transcriptions" };
        format!("{}/v1/audio/{}", self.base_url, route)
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<Transcript> {
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec()).file_name(filename.to_string()),
            )
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::model_unavailable(format!("Transcription backend not reachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // The server rejecting the file is a problem with the file
            return Err(if status.is_client_error() {
                Error::extraction(filename, format!("Transcription rejected: HTTP {} - {}", status, body))
            } else {
                Error::model_unavailable(format!("Transcription failed: HTTP {} - {}", status, body))
            });
        }

        let parsed: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| Error::model_unavailable(format!("Failed to parse transcription: {}", e)))?;

        Ok(Transcript {
            text: parsed.text,
            segments: parsed.segments,
            language: parsed.language,
        })
    }

    fn name(&self) -> &str {
        "whisper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOcr(&'static str);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, _image: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FixedTranscriber;

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _audio: &[u8], _filename: &str) -> Result<Transcript> {
            Ok(Transcript {
                text: " hello world. goodbye".to_string(),
                segments: vec![
                    AudioSegment {
                        start: 0.0,
                        end: 5.0,
                        text: " hello world.".to_string(),
                    },
                    AudioSegment {
                        start: 5.0,
                        end: 6.5,
                        text: " goodbye".to_string(),
                    },
                ],
                language: Some("en".to_string()),
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_detect_by_mimetype_then_extension() {
        assert_eq!(FileKind::detect("application/pdf", "x.bin"), Some(FileKind::Pdf));
        assert_eq!(FileKind::detect("", "Report.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::detect(DOCX_MIME, "x"), Some(FileKind::Docx));
        assert_eq!(FileKind::detect("", "old.doc"), Some(FileKind::Docx));
        assert_eq!(FileKind::detect("image/png", "scan"), Some(FileKind::Image));
        assert_eq!(FileKind::detect("application/octet-stream", "a.jpeg"), Some(FileKind::Image));
        assert_eq!(FileKind::detect("audio/x-wav", "a"), Some(FileKind::Audio));
        assert_eq!(FileKind::detect("", "talk.m4a"), Some(FileKind::Audio));
        assert_eq!(FileKind::detect("text/plain; charset=utf-8", "a"), Some(FileKind::PlainText));
        assert_eq!(FileKind::detect("", "notes.md"), Some(FileKind::PlainText));
        assert_eq!(FileKind::detect("application/zip", "a.zip"), None);
    }

    #[tokio::test]
    async fn test_plain_text_lines() {
        let extractor = DocumentExtractor::text_only();
        let out = extractor
            .extract(b"First line\n\nSecond line\n", "text/plain", "a.txt")
            .await
            .unwrap();

        assert_eq!(out.source_type, SourceType::Text);
        assert_eq!(out.document.pages.len(), 1);
        assert_eq!(out.document.line_count(), 2);
        assert_eq!(out.document.pages[0].lines[1].line_number, 2);
        assert_eq!(out.document.pages[0].lines[1].text, "Second line");
    }

    #[tokio::test]
    async fn test_unsupported_type() {
        let extractor = DocumentExtractor::text_only();
        let result = extractor.extract(b"PK", "application/zip", "a.zip").await;
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_error() {
        let extractor = DocumentExtractor::text_only();
        let result = extractor.extract(b"not a pdf", "application/pdf", "bad.pdf").await;
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[tokio::test]
    async fn test_parser_panic_is_extraction_error() {
        let result: Result<ExtractedDocument> =
            run_blocking("fonts.pdf", Duration::from_secs(5), || panic!("unknown glyph")).await;
        assert!(matches!(result, Err(Error::Extraction { .. })));
    }

    #[tokio::test]
    async fn test_slow_parser_times_out() {
        let result = run_blocking("huge.pdf", Duration::from_millis(50), || {
            std::thread::sleep(Duration::from_millis(500));
            Ok(ExtractedDocument::from_page_texts(["late"]))
        })
        .await;
        match result {
            Err(Error::Extraction { message, .. }) => assert!(message.contains("timed out")),
            other => panic!("expected extraction error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_docx_paragraphs_become_lines() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buf = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Alpha paragraph")))
            .add_paragraph(Paragraph::new())
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Beta paragraph")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let extractor = DocumentExtractor::text_only();
        let out = extractor
            .extract(buf.get_ref(), DOCX_MIME, "memo.docx")
            .await
            .unwrap();

        let lines: Vec<&str> = out.document.pages[0]
            .lines
            .iter()
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(lines, vec!["Alpha paragraph", "Beta paragraph"]);
        assert_eq!(out.document.full_text, "Alpha paragraph\n\nBeta paragraph");
    }

    #[tokio::test]
    async fn test_image_uses_ocr_engine() {
        let extractor = DocumentExtractor::new(Some(Arc::new(FixedOcr("STOP\nNo entry"))), None);
        let out = extractor.extract(b"\x89PNG", "image/png", "sign.png").await.unwrap();

        assert_eq!(out.source_type, SourceType::Image);
        assert_eq!(out.document.line_count(), 2);
        assert!(!out.document.has_segments());
    }

    #[tokio::test]
    async fn test_image_without_ocr_is_model_unavailable() {
        let extractor = DocumentExtractor::text_only();
        let result = extractor.extract(b"\x89PNG", "image/png", "sign.png").await;
        assert!(matches!(result, Err(Error::ModelUnavailable(_))));
    }

    #[tokio::test]
    async fn test_audio_keeps_segments() {
        let extractor = DocumentExtractor::new(None, Some(Arc::new(FixedTranscriber)));
        let out = extractor.extract(b"RIFF", "audio/wav", "talk.wav").await.unwrap();

        assert_eq!(out.source_type, SourceType::Audio);
        assert_eq!(out.document.full_text, "hello world. goodbye");
        assert_eq!(out.document.segments.as_ref().map(Vec::len), Some(2));
        assert_eq!(out.document.pages.len(), 1);
        assert_eq!(out.document.line_count(), 0);
    }

    #[test]
    fn test_verbose_json_parsing() {
        let parsed: VerboseTranscription = serde_json::from_str(
            r#"{
                "task": "translate",
                "language": "de",
                "text": " Hello.",
                "segments": [{"id": 0, "seek": 0, "start": 0.0, "end": 1.5, "text": " Hello.", "tokens": [1]}]
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.language.as_deref(), Some("de"));
        assert_eq!(parsed.segments[0].end, 1.5);
    }

    #[test]
    fn test_whisper_endpoint_follows_task() {
        let mut config = ExtractionConfig::default();
        assert!(WhisperClient::from_config(&config).unwrap().endpoint().ends_with("/v1/audio/translations"));

        config.whisper_task = "transcribe".to_string();
        assert!(WhisperClient::from_config(&config).unwrap().endpoint().ends_with("/v1/audio/transcriptions"));
    }
}
