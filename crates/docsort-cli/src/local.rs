//! Filesystem-backed mailbox and archive.
//!
//! An inbox is a directory with one sub-directory per message. Each message
//! directory holds a `message.json` header file and the attachment files;
//! the directory name is the message id. The archive mirrors storage
//! folders as directories and stores metadata next to each file as
//! `<file>.metadata.json`.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use docsort_core::error::{SinkError, SourceError};
use docsort_core::filing::{
    parse_email_date, EmailMessage, EmailSource, FileMetadata, FolderId, StorageSink,
    UploadedFile,
};

use crate::commands::process::mime_type_for;

const MESSAGE_FILE: &str = "message.json";

pub struct LocalInbox {
    root: PathBuf,
    processed_label: String,
}

impl LocalInbox {
    pub fn new(root: impl Into<PathBuf>, processed_label: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            processed_label: processed_label.into(),
        }
    }

    fn marker(&self, message_dir: &Path) -> PathBuf {
        message_dir.join(format!(".{}", self.processed_label))
    }

    fn read_message(&self, dir: &Path) -> Option<EmailMessage> {
        let content = fs::read_to_string(dir.join(MESSAGE_FILE)).ok()?;
        let mut message: EmailMessage = match serde_json::from_str(&content) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring {}: {}", dir.display(), e);
                return None;
            }
        };

        message.message_id = dir.file_name()?.to_string_lossy().into_owned();
        for attachment in &mut message.attachments {
            if attachment.id.is_empty() {
                attachment.id = attachment.filename.clone();
            }
            if attachment.mime_type.is_empty() {
                attachment.mime_type = mime_type_for(Path::new(&attachment.filename))
                    .unwrap_or("application/octet-stream")
                    .to_string();
            }
            if attachment.size.is_none() {
                attachment.size = fs::metadata(dir.join(&attachment.id))
                    .ok()
                    .map(|m| m.len() as usize);
            }
        }
        Some(message)
    }
}

impl EmailSource for LocalInbox {
    fn list_with_attachments(
        &self,
        query: &str,
        days_back: u32,
    ) -> Result<Vec<EmailMessage>, SourceError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| SourceError::List(format!("{}: {}", self.root.display(), e)))?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.join(MESSAGE_FILE).is_file())
            .collect();
        dirs.sort();

        let skip_processed = query.contains(&format!("-label:{}", self.processed_label));
        let cutoff = Utc::now() - Duration::days(i64::from(days_back));

        let mut messages = Vec::new();
        for dir in dirs {
            if skip_processed && self.marker(&dir).exists() {
                debug!("Skipping processed message {}", dir.display());
                continue;
            }
            let Some(message) = self.read_message(&dir) else {
                continue;
            };
            if message.attachments.is_empty() {
                continue;
            }
            let too_old = parse_email_date(&message.date)
                .is_some_and(|date| days_back > 0 && date.with_timezone(&Utc) < cutoff);
            if too_old {
                debug!("Skipping message {} older than {} days", message.message_id, days_back);
                continue;
            }
            messages.push(message);
        }

        Ok(messages)
    }

    fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, SourceError> {
        let download_error = |reason: String| SourceError::Download {
            message_id: message_id.to_string(),
            attachment_id: attachment_id.to_string(),
            reason,
        };

        let unsafe_part = |part: &str| part.is_empty() || part == ".." || part.contains(['/', '\\']);
        if unsafe_part(message_id) || unsafe_part(attachment_id) {
            return Err(download_error("invalid id".to_string()));
        }

        let message_dir = self.root.join(message_id);
        if !message_dir.is_dir() {
            return Err(SourceError::MessageNotFound(message_id.to_string()));
        }

        fs::read(message_dir.join(attachment_id)).map_err(|e| download_error(e.to_string()))
    }

    fn mark_processed(&self, message_id: &str, _label: &str) -> Result<(), SourceError> {
        let marker = self.marker(&self.root.join(message_id));
        fs::write(&marker, b"").map_err(|e| SourceError::Label {
            message_id: message_id.to_string(),
            reason: e.to_string(),
        })
    }
}

pub struct LocalArchive {
    root: PathBuf,
    created: RefCell<Vec<PathBuf>>,
}

impl LocalArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created: RefCell::new(Vec::new()),
        }
    }

    /// Folders created during this run.
    pub fn created_folders(&self) -> Vec<PathBuf> {
        self.created.borrow().clone()
    }
}

/// First free path for `filename` in `dir`, adding `_1`, `_2`... before the extension.
fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(filename);
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| dir.join(format!("{}_{}{}", stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

impl StorageSink for LocalArchive {
    fn get_or_create_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> Result<FolderId, SinkError> {
        let base = parent.map(|p| PathBuf::from(p.as_str())).unwrap_or_else(|| self.root.clone());
        let path = base.join(name);

        if !path.is_dir() {
            fs::create_dir_all(&path).map_err(|e| SinkError::Folder {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            self.created.borrow_mut().push(path.clone());
        }

        Ok(FolderId(path.to_string_lossy().into_owned()))
    }

    fn upload(
        &self,
        data: &[u8],
        filename: &str,
        _mime_type: &str,
        folder: &FolderId,
    ) -> Result<UploadedFile, SinkError> {
        let path = unique_path(Path::new(folder.as_str()), filename);
        fs::write(&path, data).map_err(|e| SinkError::Upload {
            filename: filename.to_string(),
            reason: e.to_string(),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());

        Ok(UploadedFile {
            file_id: path.to_string_lossy().into_owned(),
            name,
            link: Some(format!("file://{}", path.display())),
        })
    }

    fn set_metadata(&self, file_id: &str, metadata: &FileMetadata) -> Result<bool, SinkError> {
        let metadata_error = |reason: String| SinkError::Metadata {
            file_id: file_id.to_string(),
            reason,
        };

        let json = serde_json::to_string_pretty(metadata).map_err(|e| metadata_error(e.to_string()))?;
        fs::write(format!("{}.metadata.json", file_id), json)
            .map_err(|e| metadata_error(e.to_string()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsort_core::{DocumentType, FieldSet};

    fn write_message(root: &Path, id: &str, json: &str, files: &[(&str, &str)]) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MESSAGE_FILE), json).unwrap();
        for (name, data) in files {
            fs::write(dir.join(name), data).unwrap();
        }
    }

    #[test]
    fn test_inbox_lists_and_downloads() {
        let tmp = tempfile::tempdir().unwrap();
        write_message(
            tmp.path(),
            "0001",
            r#"{"subject": "發票", "sender": "a@b.c", "date": "", "attachments": [{"filename": "scan.pdf"}]}"#,
            &[("scan.pdf", "%PDF-1.4")],
        );
        write_message(tmp.path(), "0002", r#"{"subject": "no files"}"#, &[]);
        fs::write(tmp.path().join("stray.txt"), "x").unwrap();

        let inbox = LocalInbox::new(tmp.path(), "processed");
        let messages = inbox.list_with_attachments("has:attachment", 7).unwrap();
        assert_eq!(messages.len(), 1);

        let message = &messages[0];
        assert_eq!(message.message_id, "0001");
        assert_eq!(message.attachments[0].id, "scan.pdf");
        assert_eq!(message.attachments[0].mime_type, "application/pdf");
        assert_eq!(message.attachments[0].size, Some(8));

        let data = inbox.download_attachment("0001", "scan.pdf").unwrap();
        assert_eq!(data, b"%PDF-1.4");
        assert!(inbox.download_attachment("0001", "../0002/message.json").is_err());
        assert!(inbox.download_attachment("9999", "scan.pdf").is_err());
    }

    #[test]
    fn test_inbox_skips_processed_and_old() {
        let tmp = tempfile::tempdir().unwrap();
        let json = r#"{"attachments": [{"filename": "a.png"}]}"#;
        write_message(tmp.path(), "new", json, &[("a.png", "png")]);
        write_message(
            tmp.path(),
            "old",
            r#"{"date": "Mon, 1 Jan 2001 00:00:00 +0000", "attachments": [{"filename": "a.png"}]}"#,
            &[("a.png", "png")],
        );

        let inbox = LocalInbox::new(tmp.path(), "processed");
        inbox.mark_processed("new", "processed").unwrap();

        let query = "has:attachment -label:processed";
        assert!(inbox.list_with_attachments(query, 7).unwrap().is_empty());

        let all = inbox.list_with_attachments("has:attachment", 0).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_archive_folders_files_and_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = LocalArchive::new(tmp.path());

        let root = archive.get_or_create_folder("Gmail附件", None).unwrap();
        let month = archive.get_or_create_folder("2024_03", Some(&root)).unwrap();
        assert!(tmp.path().join("Gmail附件/2024_03").is_dir());
        assert_eq!(archive.created_folders().len(), 2);

        let first = archive.upload(b"one", "r.png", "image/png", &month).unwrap();
        let second = archive.upload(b"two", "r.png", "image/png", &month).unwrap();
        assert_eq!(first.name, "r.png");
        assert_eq!(second.name, "r_1.png");

        let metadata = FileMetadata {
            document_type: DocumentType::Receipt,
            processed_at: Utc::now(),
            source_email: "a@b.c".to_string(),
            extracted_fields: FieldSet::empty(),
        };
        assert!(archive.set_metadata(&first.file_id, &metadata).unwrap());

        let sidecar = fs::read_to_string(format!("{}.metadata.json", first.file_id)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&sidecar).unwrap();
        assert_eq!(value["document_type"], "receipt");
        assert_eq!(value["extracted_fields"], serde_json::json!({}));
    }
}
