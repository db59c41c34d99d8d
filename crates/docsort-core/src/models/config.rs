//! Configuration structures for the filing pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::classify::KeywordTaxonomy;

/// Main configuration for docsort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsortConfig {
    /// Document type keywords.
    pub classification: KeywordTaxonomy,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Named-entity recognition configuration.
    pub ner: NerConfig,

    /// Mailbox query configuration.
    pub mail: MailConfig,

    /// Storage layout configuration.
    pub storage: StorageConfig,

    /// Attachment acceptance rules.
    pub files: FileConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { max_pages: 0 }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` markers in recognized text.
    pub keep_unknown_glyphs: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "chinese_cht_rec.onnx".to_string(),
            dictionary: "chinese_cht_dict.txt".to_string(),
            keep_unknown_glyphs: false,
        }
    }
}

/// Named-entity recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Run the organization recognizer during extraction.
    pub enabled: bool,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Mailbox query configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Search query passed to the email source.
    pub query: String,

    /// How many days back to search.
    pub days_back: u32,

    /// Label applied to processed messages.
    pub processed_label: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            query: "has:attachment -label:processed".to_string(),
            days_back: 7,
            processed_label: "processed".to_string(),
        }
    }
}

/// Storage layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Name of the top-level folder all filed documents go under.
    pub root_folder: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_folder: "Gmail附件".to_string(),
        }
    }
}

/// Attachment acceptance rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Largest attachment processed, in bytes.
    pub max_file_size: usize,

    /// MIME types that are processed; others are skipped.
    pub supported_mime_types: Vec<String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            supported_mime_types: [
                "application/pdf",
                "image/jpeg",
                "image/png",
                "image/tiff",
                "image/bmp",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FileConfig {
    /// Whether an attachment of this type is processed.
    pub fn accepts(&self, mime_type: &str) -> bool {
        self.supported_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime_type))
    }
}

impl DocsortConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentType;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: DocsortConfig =
            serde_json::from_str(r#"{ "mail": { "days_back": 30 } }"#).unwrap();
        assert_eq!(config.mail.days_back, 30);
        assert_eq!(config.mail.processed_label, "processed");
        assert_eq!(config.storage.root_folder, "Gmail附件");
        assert!(!config.classification.invoice_keywords.is_empty());
    }

    #[test]
    fn test_custom_taxonomy_from_json() {
        let json = r#"{
            "classification": {
                "categories": [
                    { "document_type": "receipt", "keywords": ["bon"] }
                ]
            }
        }"#;
        let config: DocsortConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.classification.categories.len(), 1);
        assert_eq!(config.classification.categories[0].document_type, DocumentType::Receipt);
        assert!(config.classification.invoice_keywords.contains(&"發票".to_string()));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DocsortConfig::default();
        config.files.max_file_size = 1024;
        config.save(&path).unwrap();

        let loaded = DocsortConfig::from_file(&path).unwrap();
        assert_eq!(loaded.files.max_file_size, 1024);
        assert_eq!(loaded.classification, config.classification);
    }

    #[test]
    fn test_accepts_mime_type() {
        let files = FileConfig::default();
        assert!(files.accepts("application/pdf"));
        assert!(files.accepts("IMAGE/PNG"));
        assert!(!files.accepts("text/plain"));
    }
}
