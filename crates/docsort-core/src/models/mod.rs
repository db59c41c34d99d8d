//! Data models and configuration.

pub mod config;
pub mod document;

pub use config::DocsortConfig;
pub use document::{
    ContractFields, DocumentRecord, DocumentType, FieldSet, InvoiceFields, NoFields,
    QuotationFields,
};
