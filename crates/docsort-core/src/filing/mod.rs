//! Filing of mail attachments into a storage folder hierarchy.
//!
//! The mailbox and the storage service are reached through [`EmailSource`]
//! and [`StorageSink`]; [`AttachmentFiler`] drives one batch over them.

mod filer;
pub mod naming;

pub use filer::{AttachmentFiler, FiledDocument, FilingReport};
pub use naming::{clean_folder_name, folder_path, generate_filename, parse_email_date, sender_name};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SinkError, SourceError};
use crate::models::document::{DocumentType, FieldSet};

/// An email with at least one attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailMessage {
    pub message_id: String,
    pub subject: String,
    /// Raw `From` header value.
    pub sender: String,
    /// Raw `Date` header value.
    pub date: String,
    pub attachments: Vec<AttachmentInfo>,
}

/// Attachment descriptor as listed by the email source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentInfo {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    /// Size in bytes, when the source reports it before download.
    pub size: Option<usize>,
}

/// Opaque folder handle issued by a storage sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(pub String);

impl FolderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file stored by a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_id: String,
    pub name: String,
    pub link: Option<String>,
}

/// Metadata attached to a filed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub document_type: DocumentType,
    pub processed_at: DateTime<Utc>,
    pub source_email: String,
    pub extracted_fields: FieldSet,
}

/// Mailbox that lists messages and serves attachment bytes.
pub trait EmailSource {
    /// Messages matching `query` received in the last `days_back` days.
    fn list_with_attachments(
        &self,
        query: &str,
        days_back: u32,
    ) -> Result<Vec<EmailMessage>, SourceError>;

    fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, SourceError>;

    /// Tag a fully filed message so later queries can exclude it.
    fn mark_processed(&self, _message_id: &str, _label: &str) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Storage service with folders, files and per-file metadata.
pub trait StorageSink {
    /// Folder `name` under `parent` (the storage root when `None`), created if missing.
    fn get_or_create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<FolderId, SinkError>;

    fn upload(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
        folder: &FolderId,
    ) -> Result<UploadedFile, SinkError>;

    /// Returns `false` when the sink accepted the call but stored nothing.
    fn set_metadata(&self, file_id: &str, metadata: &FileMetadata) -> Result<bool, SinkError>;
}
