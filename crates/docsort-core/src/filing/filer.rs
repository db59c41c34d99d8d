//! Batch loop: mailbox -> pipeline -> storage.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::naming::{folder_path, generate_filename, parse_email_date};
use super::{AttachmentInfo, EmailMessage, EmailSource, FileMetadata, FolderId, StorageSink};
use crate::error::{DocsortError, SinkError};
use crate::models::config::{DocsortConfig, FileConfig, MailConfig, StorageConfig};
use crate::models::document::DocumentType;
use crate::pipeline::DocumentPipeline;

/// One attachment that reached storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiledDocument {
    pub message_id: String,
    pub original_filename: String,
    pub filename: String,
    pub file_id: String,
    pub folder: String,
    pub document_type: DocumentType,
}

/// Outcome of one filing run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilingReport {
    /// Messages returned by the source.
    pub messages: usize,
    /// Attachments uploaded.
    pub processed: usize,
    /// Attachments left alone: unsupported, oversized, undownloadable or unreadable.
    pub skipped: usize,
    /// Attachments or messages that hit a storage error.
    pub failed: usize,
    pub filed: Vec<FiledDocument>,
}

enum Outcome {
    Filed(FiledDocument),
    Skipped,
}

/// Files every attachment of recent messages into the storage hierarchy.
pub struct AttachmentFiler<S, K> {
    source: S,
    sink: K,
    pipeline: DocumentPipeline,
    mail: MailConfig,
    storage: StorageConfig,
    files: FileConfig,
}

impl<S: EmailSource, K: StorageSink> AttachmentFiler<S, K> {
    pub fn new(source: S, sink: K, pipeline: DocumentPipeline) -> Self {
        Self {
            source,
            sink,
            pipeline,
            mail: MailConfig::default(),
            storage: StorageConfig::default(),
            files: FileConfig::default(),
        }
    }

    pub fn with_config(mut self, config: &DocsortConfig) -> Self {
        self.mail = config.mail.clone();
        self.storage = config.storage.clone();
        self.files = config.files.clone();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one batch.
    ///
    /// Only a failure to list messages aborts the run. Anything that goes
    /// wrong with one message or attachment is logged and counted.
    pub fn run(&self) -> Result<FilingReport, DocsortError> {
        let messages = self
            .source
            .list_with_attachments(&self.mail.query, self.mail.days_back)?;
        info!("Found {} messages with attachments", messages.len());

        let mut report = FilingReport {
            messages: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            self.file_message(message, &mut report);
        }

        info!(
            "Filing complete: {} processed, {} skipped, {} failed",
            report.processed, report.skipped, report.failed
        );
        Ok(report)
    }

    fn file_message(&self, message: &EmailMessage, report: &mut FilingReport) {
        let folder = match self.message_folder(message) {
            Ok(folder) => folder,
            Err(e) => {
                error!(
                    "Could not create folders for message '{}': {}",
                    message.subject, e
                );
                report.failed += 1;
                return;
            }
        };

        let mut clean = true;
        for attachment in &message.attachments {
            match self.file_attachment(message, attachment, &folder) {
                Ok(Outcome::Filed(doc)) => {
                    info!("Filed {} as {}", attachment.filename, doc.filename);
                    report.processed += 1;
                    report.filed.push(doc);
                }
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!("Failed to store {}: {}", attachment.filename, e);
                    report.failed += 1;
                    clean = false;
                }
            }
        }

        if clean {
            if let Err(e) = self
                .source
                .mark_processed(&message.message_id, &self.mail.processed_label)
            {
                warn!("{}", e);
            }
        }
    }

    fn message_folder(&self, message: &EmailMessage) -> Result<FolderId, SinkError> {
        let received = parse_email_date(&message.date).unwrap_or_else(|| {
            warn!("Unparseable date '{}', using current time", message.date);
            Local::now().fixed_offset()
        });

        let mut parent: Option<FolderId> = None;
        for name in folder_path(
            &self.storage.root_folder,
            &received,
            &message.sender,
            &message.subject,
        ) {
            parent = Some(self.sink.get_or_create_folder(&name, parent.as_ref())?);
        }

        parent.ok_or_else(|| SinkError::Folder {
            name: self.storage.root_folder.clone(),
            reason: "empty folder path".to_string(),
        })
    }

    fn file_attachment(
        &self,
        message: &EmailMessage,
        attachment: &AttachmentInfo,
        folder: &FolderId,
    ) -> Result<Outcome, SinkError> {
        if !self.files.accepts(&attachment.mime_type) {
            debug!(
                "Skipping {} with unsupported type {}",
                attachment.filename, attachment.mime_type
            );
            return Ok(Outcome::Skipped);
        }
        if attachment.size.is_some_and(|size| size > self.files.max_file_size) {
            warn!("Skipping oversized attachment {}", attachment.filename);
            return Ok(Outcome::Skipped);
        }

        let data = match self
            .source
            .download_attachment(&message.message_id, &attachment.id)
        {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not download {}: {}", attachment.filename, e);
                return Ok(Outcome::Skipped);
            }
        };
        if data.len() > self.files.max_file_size {
            warn!(
                "Skipping oversized attachment {} ({} bytes)",
                attachment.filename,
                data.len()
            );
            return Ok(Outcome::Skipped);
        }

        let Some(record) = self.pipeline.process(&data, &attachment.mime_type) else {
            warn!("Could not process {}", attachment.filename);
            return Ok(Outcome::Skipped);
        };

        let filename = generate_filename(&record, &attachment.filename, &message.sender, now());
        let uploaded = self
            .sink
            .upload(&data, &filename, &attachment.mime_type, folder)?;

        let metadata = FileMetadata {
            document_type: record.document_type,
            processed_at: record.processed_at,
            source_email: message.sender.clone(),
            extracted_fields: record.extracted_fields,
        };
        match self.sink.set_metadata(&uploaded.file_id, &metadata) {
            Ok(true) => {}
            Ok(false) => warn!("Metadata for {} was not stored", uploaded.name),
            Err(e) => warn!("{}", e),
        }

        Ok(Outcome::Filed(FiledDocument {
            message_id: message.message_id.clone(),
            original_filename: attachment.filename.clone(),
            filename: uploaded.name,
            file_id: uploaded.file_id,
            folder: folder.to_string(),
            document_type: record.document_type,
        }))
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError, SourceError};
    use crate::filing::UploadedFile;
    use crate::ocr::TextRecognizer;
    use crate::pdf::Rasterizer;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MemoryInbox {
        messages: Vec<EmailMessage>,
        blobs: HashMap<String, Vec<u8>>,
        marked: RefCell<Vec<(String, String)>>,
    }

    impl EmailSource for MemoryInbox {
        fn list_with_attachments(
            &self,
            _query: &str,
            _days_back: u32,
        ) -> Result<Vec<EmailMessage>, SourceError> {
            Ok(self.messages.clone())
        }

        fn download_attachment(
            &self,
            message_id: &str,
            attachment_id: &str,
        ) -> Result<Vec<u8>, SourceError> {
            self.blobs
                .get(attachment_id)
                .cloned()
                .ok_or_else(|| SourceError::Download {
                    message_id: message_id.to_string(),
                    attachment_id: attachment_id.to_string(),
                    reason: "gone".to_string(),
                })
        }

        fn mark_processed(&self, message_id: &str, label: &str) -> Result<(), SourceError> {
            self.marked
                .borrow_mut()
                .push((message_id.to_string(), label.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        folders: RefCell<Vec<String>>,
        files: RefCell<Vec<(String, String)>>,
        metadata: RefCell<Vec<(String, FileMetadata)>>,
        reject_uploads: bool,
    }

    impl StorageSink for MemoryStore {
        fn get_or_create_folder(
            &self,
            name: &str,
            parent: Option<&FolderId>,
        ) -> Result<FolderId, SinkError> {
            let path = match parent {
                Some(parent) => format!("{}/{}", parent, name),
                None => name.to_string(),
            };
            let mut folders = self.folders.borrow_mut();
            if !folders.contains(&path) {
                folders.push(path.clone());
            }
            Ok(FolderId(path))
        }

        fn upload(
            &self,
            _data: &[u8],
            filename: &str,
            _mime_type: &str,
            folder: &FolderId,
        ) -> Result<UploadedFile, SinkError> {
            if self.reject_uploads {
                return Err(SinkError::Upload {
                    filename: filename.to_string(),
                    reason: "quota exceeded".to_string(),
                });
            }
            let file_id = format!("{}/{}", folder, filename);
            self.files
                .borrow_mut()
                .push((folder.to_string(), filename.to_string()));
            Ok(UploadedFile {
                file_id,
                name: filename.to_string(),
                link: None,
            })
        }

        fn set_metadata(&self, file_id: &str, metadata: &FileMetadata) -> Result<bool, SinkError> {
            self.metadata
                .borrow_mut()
                .push((file_id.to_string(), metadata.clone()));
            Ok(true)
        }
    }

    /// Treats the image bytes as UTF-8 text.
    struct EchoOcr;

    impl TextRecognizer for EchoOcr {
        fn recognize(&self, image: &[u8]) -> crate::ocr::Result<String> {
            String::from_utf8(image.to_vec()).map_err(|e| OcrError::InvalidImage(e.to_string()))
        }
    }

    struct NoPdf;

    impl Rasterizer for NoPdf {
        fn rasterize(&self, _pdf: &[u8]) -> crate::pdf::Result<Vec<Vec<u8>>> {
            Err(PdfError::NoPages)
        }
    }

    fn attachment(id: &str, filename: &str, mime_type: &str) -> AttachmentInfo {
        AttachmentInfo {
            id: id.to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size: None,
        }
    }

    fn inbox(attachments: Vec<AttachmentInfo>, blobs: &[(&str, &str)]) -> MemoryInbox {
        MemoryInbox {
            messages: vec![EmailMessage {
                message_id: "m1".to_string(),
                subject: "Re: 三月發票".to_string(),
                sender: "\"Acme\" <billing@acme.com>".to_string(),
                date: "Fri, 15 Mar 2024 10:30:00 +0800".to_string(),
                attachments,
            }],
            blobs: blobs
                .iter()
                .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                .collect(),
            marked: RefCell::new(Vec::new()),
        }
    }

    fn filer<K: StorageSink>(source: MemoryInbox, sink: K) -> AttachmentFiler<MemoryInbox, K> {
        AttachmentFiler::new(
            source,
            sink,
            DocumentPipeline::new(Box::new(NoPdf), Box::new(EchoOcr)),
        )
    }

    #[test]
    fn test_files_invoice_into_hierarchy() {
        let source = inbox(
            vec![attachment("a1", "scan.png", "image/png")],
            &[("a1", "統一發票\n發票號碼：AB-12345678\n日期：2024年03月15日\n賣方：測試公司")],
        );
        let filer = filer(source, MemoryStore::default());

        let report = filer.run().unwrap();
        assert_eq!((report.messages, report.processed, report.skipped, report.failed), (1, 1, 0, 0));

        let doc = &report.filed[0];
        assert_eq!(doc.filename, "invoice_20240315_測試公司_AB12345678.png");
        assert_eq!(doc.folder, "Gmail附件/2024_03/billing/Re_ 三月發票");
        assert_eq!(doc.document_type, DocumentType::Invoice);

        let metadata = filer.sink().metadata.borrow();
        assert_eq!(metadata[0].1.source_email, "\"Acme\" <billing@acme.com>");
        assert_eq!(
            metadata[0].1.extracted_fields.as_invoice().unwrap().invoice_number,
            "AB12345678"
        );

        assert_eq!(
            *filer.source().marked.borrow(),
            vec![("m1".to_string(), "processed".to_string())]
        );
    }

    #[test]
    fn test_skips_unsupported_oversized_and_missing() {
        let mut big = attachment("a3", "big.png", "image/png");
        big.size = Some(20 * 1024 * 1024);

        let source = inbox(
            vec![
                attachment("a1", "notes.txt", "text/plain"),
                attachment("a2", "lost.pdf", "application/pdf"),
                big,
                attachment("a4", "blank.png", "image/png"),
                attachment("a5", "receipt.jpg", "image/jpeg"),
            ],
            &[("a3", "收據"), ("a4", ""), ("a5", "收據 total")],
        );
        let filer = filer(source, MemoryStore::default());

        let report = filer.run().unwrap();
        assert_eq!((report.processed, report.skipped, report.failed), (1, 4, 0));
        assert_eq!(report.filed[0].document_type, DocumentType::Receipt);
        assert!(report.filed[0].filename.starts_with("receipt_"));
        assert!(report.filed[0].filename.ends_with("_billing.jpg"));
    }

    #[test]
    fn test_upload_failure_counts_and_leaves_message_unmarked() {
        let source = inbox(
            vec![attachment("a1", "order.png", "image/png")],
            &[("a1", "訂單")],
        );
        let store = MemoryStore {
            reject_uploads: true,
            ..Default::default()
        };
        let filer = filer(source, store);

        let report = filer.run().unwrap();
        assert_eq!((report.processed, report.failed), (0, 1));
        assert!(filer.source().marked.borrow().is_empty());
    }

    #[test]
    fn test_configured_root_folder() {
        let source = inbox(vec![attachment("a1", "q.png", "image/png")], &[("a1", "報價單")]);
        let mut config = DocsortConfig::default();
        config.storage.root_folder = "Archive".to_string();
        let filer = filer(source, MemoryStore::default()).with_config(&config);

        filer.run().unwrap();
        let folders = filer.sink().folders.borrow();
        assert_eq!(folders[0], "Archive");
        assert_eq!(folders.len(), 4);
    }
}
