//! Attachment processing pipeline: rasterize, OCR, classify, extract.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::classify::DocumentClassifier;
use crate::error::{DocsortError, ExtractionError};
use crate::extract::FieldDispatcher;
use crate::models::config::DocsortConfig;
use crate::models::document::DocumentRecord;
use crate::ocr::TextRecognizer;
use crate::pdf::{PageImageRasterizer, Rasterizer, PDF_MIME_TYPE};

/// Drives one attachment from raw bytes to a [`DocumentRecord`].
///
/// Collaborators are injected as trait objects. The pipeline keeps no
/// state between calls.
pub struct DocumentPipeline {
    rasterizer: Box<dyn Rasterizer + Send + Sync>,
    recognizer: Box<dyn TextRecognizer + Send + Sync>,
    classifier: DocumentClassifier,
    dispatcher: FieldDispatcher,
}

impl DocumentPipeline {
    pub fn new(
        rasterizer: Box<dyn Rasterizer + Send + Sync>,
        recognizer: Box<dyn TextRecognizer + Send + Sync>,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            classifier: DocumentClassifier::new(),
            dispatcher: FieldDispatcher::new(),
        }
    }

    /// Pipeline with the lopdf rasterizer and the configured taxonomy and NER.
    pub fn from_config(
        config: &DocsortConfig,
        recognizer: Box<dyn TextRecognizer + Send + Sync>,
    ) -> Self {
        let rasterizer = PageImageRasterizer::new().with_max_pages(config.pdf.max_pages);
        Self::new(Box::new(rasterizer), recognizer)
            .with_classifier(DocumentClassifier::with_taxonomy(config.classification.clone()))
            .with_dispatcher(FieldDispatcher::from_config(config))
    }

    pub fn with_classifier(mut self, classifier: DocumentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: FieldDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn classifier(&self) -> &DocumentClassifier {
        &self.classifier
    }

    pub fn dispatcher(&self) -> &FieldDispatcher {
        &self.dispatcher
    }

    /// Process one attachment.
    ///
    /// Returns `None` when no page yields text or processing fails; the
    /// failure is logged and never propagated.
    pub fn process(&self, data: &[u8], mime_type: &str) -> Option<DocumentRecord> {
        match self.try_process(data, mime_type) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Failed to process {} document: {}", mime_type, e);
                None
            }
        }
    }

    fn try_process(&self, data: &[u8], mime_type: &str) -> Result<DocumentRecord, DocsortError> {
        let text = self.recognize_text(data, mime_type);
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText.into());
        }

        let document_type = self.classifier.classify(&text);
        let fields = self.dispatcher.extract(&text, document_type);
        info!(
            "Processed {} document: {} chars of text, classified as {}",
            mime_type,
            text.len(),
            document_type
        );

        Ok(DocumentRecord::new(document_type, text, fields, Utc::now()))
    }

    /// OCR text of every page, joined with newlines. Failing pages are skipped.
    pub fn recognize_text(&self, data: &[u8], mime_type: &str) -> String {
        let pages = self.page_images(data, mime_type);

        let texts: Vec<String> = pages
            .iter()
            .enumerate()
            .filter_map(|(i, page)| match self.recognizer.recognize(page) {
                Ok(text) if !text.is_empty() => Some(text),
                Ok(_) => {
                    debug!("No text on page {}", i + 1);
                    None
                }
                Err(e) => {
                    warn!("OCR failed on page {}: {}", i + 1, e);
                    None
                }
            })
            .collect();

        texts.join("\n")
    }

    fn page_images(&self, data: &[u8], mime_type: &str) -> Vec<Vec<u8>> {
        if !mime_type.eq_ignore_ascii_case(PDF_MIME_TYPE) {
            return vec![data.to_vec()];
        }

        match self.rasterizer.rasterize(data) {
            Ok(pages) => {
                debug!("Rasterized PDF into {} page images", pages.len());
                pages
            }
            Err(e) => {
                warn!("PDF rasterization failed: {}", e);
                Vec::new()
            }
        }
    }
}
