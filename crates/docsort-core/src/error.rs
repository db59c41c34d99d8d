//! Error types for the docsort-core library.

use thiserror::Error;

/// Main error type for the docsort library.
#[derive(Error, Debug)]
pub enum DocsortError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Email source error.
    #[error("email source error: {0}")]
    Source(#[from] SourceError),

    /// Storage sink error.
    #[error("storage error: {0}")]
    Sink(#[from] SinkError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract page images from the PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to document field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A rule pattern failed to compile.
    #[error("invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No usable text was recognized in the document.
    #[error("no text recognized in document")]
    NoText,
}

/// Errors raised while normalizing a date string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    /// None of the known date layouts matched.
    #[error("no date pattern matched")]
    NoMatch,

    /// A layout matched but did not denote a real calendar day.
    #[error("not a calendar date: {0}")]
    InvalidDate(String),
}

/// Errors raised by an email source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Listing messages failed.
    #[error("failed to list messages: {0}")]
    List(String),

    /// The requested message does not exist.
    #[error("message not found: {0}")]
    MessageNotFound(String),

    /// Downloading an attachment failed.
    #[error("failed to download attachment {attachment_id} of {message_id}: {reason}")]
    Download {
        message_id: String,
        attachment_id: String,
        reason: String,
    },

    /// Labelling a message failed.
    #[error("failed to label message {message_id}: {reason}")]
    Label { message_id: String, reason: String },
}

/// Errors raised by a storage sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Creating or looking up a folder failed.
    #[error("folder operation failed for {name}: {reason}")]
    Folder { name: String, reason: String },

    /// Uploading a file failed.
    #[error("upload of {filename} failed: {reason}")]
    Upload { filename: String, reason: String },

    /// Writing metadata failed.
    #[error("metadata update for {file_id} failed: {reason}")]
    Metadata { file_id: String, reason: String },
}

/// Result type for the docsort library.
pub type Result<T> = std::result::Result<T, DocsortError>;
