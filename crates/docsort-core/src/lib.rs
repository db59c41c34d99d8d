//! Core library for classifying and filing mail attachments.
//!
//! This crate provides:
//! - Keyword-based document classification (invoice, quotation, contract, receipt, order)
//! - Taiwanese invoice field extraction (invoice number, Minguo and Western dates, amounts, tax ID, parties)
//! - PDF page rasterization and OCR collaborators
//! - A processing pipeline and an attachment filer over pluggable mail and storage services

pub mod classify;
pub mod error;
pub mod extract;
pub mod filing;
pub mod models;
pub mod ner;
pub mod ocr;
pub mod pdf;
pub mod pipeline;

pub use classify::{DocumentClassifier, KeywordCategory, KeywordTaxonomy};
pub use error::{DocsortError, Result};
pub use extract::{FieldDispatcher, InvoiceFieldExtractor};
pub use filing::{AttachmentFiler, EmailSource, FilingReport, StorageSink};
pub use models::config::DocsortConfig;
pub use models::document::{DocumentRecord, DocumentType, FieldSet, InvoiceFields};
pub use ner::{EntityRecognizer, LexicalOrganizationRecognizer, NamedEntity};
pub use ocr::TextRecognizer;
#[cfg(feature = "native")]
pub use ocr::OnnxTextRecognizer;
pub use pdf::{PageImageRasterizer, Rasterizer};
pub use pipeline::DocumentPipeline;
