//! Folder and file naming for filed attachments.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use crate::models::document::{DocumentRecord, DocumentType, FieldSet};

/// Characters storage services reject in names.
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const MAX_NAME_CHARS: usize = 100;
const MAX_SELLER_CHARS: usize = 30;

lazy_static! {
    static ref HEADER_COMMENT: Regex = Regex::new(r"\([^)]*\)").unwrap();
}

/// Header date layouts tried after RFC 2822.
const DATE_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y/%m/%d %H:%M:%S %z",
];

/// Parse an email `Date` header.
///
/// Parenthesized comments such as `(CST)` are dropped first.
pub fn parse_email_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned = HEADER_COMMENT.replace_all(raw, "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Ok(date) = DateTime::parse_from_rfc2822(&cleaned) {
        return Some(date);
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&cleaned, format).ok())
}

/// Mailbox name of a `From` header: `"Jane" <jane.doe@example.com>` gives `jane.doe`.
pub fn sender_name(sender: &str) -> String {
    let local = sender.split('@').next().unwrap_or_default();
    let local = match local.rfind('<') {
        Some(pos) => &local[pos + 1..],
        None => local,
    };
    local
        .trim_matches(|c: char| c == '"' || c == '<' || c == '>' || c.is_whitespace())
        .to_string()
}

/// Make `name` safe to use as a folder or file name.
pub fn clean_folder_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if INVALID_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = trim_name(&cleaned);

    let cleaned = if cleaned.chars().count() > MAX_NAME_CHARS {
        let head: String = cleaned.chars().take(MAX_NAME_CHARS - 3).collect();
        format!("{}...", trim_name(&head))
    } else {
        cleaned.to_string()
    };

    if cleaned.is_empty() {
        "No_Name".to_string()
    } else {
        cleaned
    }
}

fn trim_name(name: &str) -> &str {
    name.trim_matches(|c| c == '.' || c == ' ')
}

/// Folder names from the storage root down to the message folder:
/// `<root>/<YYYY_MM>/<sender>/<subject>`.
pub fn folder_path(
    root: &str,
    received: &DateTime<FixedOffset>,
    sender: &str,
    subject: &str,
) -> Vec<String> {
    let subject_folder = if subject.trim().is_empty() {
        "No_Subject".to_string()
    } else {
        clean_folder_name(subject)
    };

    vec![
        root.to_string(),
        received.format("%Y_%m").to_string(),
        clean_folder_name(&sender_name(sender)),
        subject_folder,
    ]
}

/// Standard name for a filed attachment.
///
/// Invoices with a number or a seller are named after them; every other
/// document gets `<type>_<timestamp>_<sender>`.
pub fn generate_filename(
    record: &DocumentRecord,
    original_filename: &str,
    sender: &str,
    now: NaiveDateTime,
) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".unknown".to_string());

    if let (DocumentType::Invoice, FieldSet::Invoice(fields)) =
        (record.document_type, &record.extracted_fields)
    {
        let seller = if fields.seller.is_empty() {
            String::new()
        } else {
            clean_folder_name(&fields.seller)
                .chars()
                .take(MAX_SELLER_CHARS)
                .collect()
        };
        let date = if fields.invoice_date.is_empty() {
            now.format("%Y%m%d").to_string()
        } else {
            fields.invoice_date.replace('-', "")
        };

        match (fields.invoice_number.is_empty(), seller.is_empty()) {
            (false, false) => {
                return format!("invoice_{}_{}_{}{}", date, seller, fields.invoice_number, ext)
            }
            (false, true) => return format!("invoice_{}_{}{}", date, fields.invoice_number, ext),
            (true, false) => return format!("invoice_{}_{}{}", date, seller, ext),
            (true, true) => {}
        }
    }

    format!(
        "{}_{}_{}{}",
        record.document_type,
        now.format("%Y%m%d_%H%M%S"),
        clean_folder_name(&sender_name(sender)),
        ext
    )
}
