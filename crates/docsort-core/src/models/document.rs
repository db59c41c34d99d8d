//! Document records produced by the processing pipeline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::extract::rules::parse_amount;

/// Kind of business document recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Invoice (發票).
    Invoice,
    /// Price quotation (報價單).
    Quotation,
    /// Contract or agreement (合約).
    Contract,
    /// Receipt (收據).
    Receipt,
    /// Purchase order (訂單).
    Order,
    /// Nothing in the taxonomy matched.
    Unknown,
}

impl DocumentType {
    /// Every document type, in declaration order.
    pub const ALL: [DocumentType; 6] = [
        DocumentType::Invoice,
        DocumentType::Quotation,
        DocumentType::Contract,
        DocumentType::Receipt,
        DocumentType::Order,
        DocumentType::Unknown,
    ];

    /// Lowercase label, as used in filenames and metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Quotation => "quotation",
            DocumentType::Contract => "contract",
            DocumentType::Receipt => "receipt",
            DocumentType::Order => "order",
            DocumentType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "invoice" => Ok(Self::Invoice),
            "quotation" => Ok(Self::Quotation),
            "contract" => Ok(Self::Contract),
            "receipt" => Ok(Self::Receipt),
            "order" => Ok(Self::Order),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown document type: {}", other)),
        }
    }
}

/// Fields extracted from an invoice. Missing values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    /// Invoice number with hyphens removed (e.g. `AB12345678`).
    pub invoice_number: String,
    /// Issue date in ISO format (`YYYY-MM-DD`).
    pub invoice_date: String,
    pub buyer: String,
    pub seller: String,
    /// Total amount, digits only.
    pub amount: String,
    /// Eight-digit business tax ID (統一編號).
    pub tax_id: String,
}

impl InvoiceFields {
    /// The amount as a number, when one was extracted and fits a [`Decimal`].
    pub fn amount_value(&self) -> Option<Decimal> {
        parse_amount(&self.amount)
    }
}

/// Quotation schema. Extraction is not implemented, so fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationFields {
    pub quotation_number: String,
    pub quotation_date: String,
    pub company: String,
    pub total_amount: String,
}

/// Contract schema. Extraction is not implemented, so fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFields {
    pub contract_number: String,
    pub contract_date: String,
    pub parties: Vec<String>,
    pub contract_value: String,
}

/// Serializes as an empty JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoFields {}

/// Extracted fields, shaped by the document type.
///
/// Serialized as a flat mapping; the variant is implied by the record's
/// `document_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSet {
    Invoice(InvoiceFields),
    Quotation(QuotationFields),
    Contract(ContractFields),
    Empty(NoFields),
}

impl FieldSet {
    /// The empty mapping used for types without a schema.
    pub fn empty() -> Self {
        FieldSet::Empty(NoFields {})
    }

    /// Invoice fields, if this is an invoice field set.
    pub fn as_invoice(&self) -> Option<&InvoiceFields> {
        match self {
            FieldSet::Invoice(fields) => Some(fields),
            _ => None,
        }
    }

    /// True when no field carries a value.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldSet::Invoice(f) => {
                f.invoice_number.is_empty()
                    && f.invoice_date.is_empty()
                    && f.buyer.is_empty()
                    && f.seller.is_empty()
                    && f.amount.is_empty()
                    && f.tax_id.is_empty()
            }
            FieldSet::Quotation(f) => *f == QuotationFields::default(),
            FieldSet::Contract(f) => *f == ContractFields::default(),
            FieldSet::Empty(_) => true,
        }
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Result of processing one attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_type: DocumentType,
    /// OCR text of all pages, joined with newlines.
    pub extracted_text: String,
    pub extracted_fields: FieldSet,
    pub processed_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(
        document_type: DocumentType,
        extracted_text: String,
        extracted_fields: FieldSet,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            document_type,
            extracted_text,
            extracted_fields,
            processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_document_type_parsing() {
        assert_eq!(DocumentType::from_str("Invoice"), Ok(DocumentType::Invoice));
        assert_eq!(DocumentType::from_str(" order "), Ok(DocumentType::Order));
        assert!(DocumentType::from_str("memo").is_err());
        for doc_type in DocumentType::ALL {
            assert_eq!(DocumentType::from_str(doc_type.as_str()), Ok(doc_type));
        }
    }

    #[test]
    fn test_field_set_serializes_flat() {
        let fields = FieldSet::Invoice(InvoiceFields {
            invoice_number: "AB12345678".to_string(),
            ..Default::default()
        });
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["invoice_number"], "AB12345678");
        assert_eq!(json["buyer"], "");

        let empty = serde_json::to_string(&FieldSet::empty()).unwrap();
        assert_eq!(empty, "{}");

        let contract = serde_json::to_value(FieldSet::Contract(ContractFields::default())).unwrap();
        assert_eq!(contract["parties"], serde_json::json!([]));
    }

    #[test]
    fn test_field_set_blank() {
        assert!(FieldSet::empty().is_blank());
        assert!(FieldSet::Quotation(QuotationFields::default()).is_blank());
        let fields = FieldSet::Invoice(InvoiceFields {
            tax_id: "12345678".to_string(),
            ..Default::default()
        });
        assert!(!fields.is_blank());
    }

    #[test]
    fn test_record_serializes_type_lowercase() {
        let record = DocumentRecord::new(
            DocumentType::Quotation,
            "報價單".to_string(),
            FieldSet::Quotation(QuotationFields::default()),
            Utc::now(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["document_type"], "quotation");
        assert_eq!(json["extracted_fields"]["company"], "");
    }

    #[test]
    fn test_invoice_amount_value() {
        let mut fields = InvoiceFields::default();
        assert_eq!(fields.amount_value(), None);

        fields.amount = "0030".to_string();
        assert_eq!(fields.amount_value(), Some(Decimal::from(30)));
    }
}
