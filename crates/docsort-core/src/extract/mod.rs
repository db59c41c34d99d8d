//! Field extraction: routes classified text to the per-type extractor.

pub mod entities;
mod invoice;
pub mod rules;

pub use entities::{Entity, EntityMerger, PositionalRoles, Role, RoleAssigner};
pub use invoice::InvoiceFieldExtractor;

use tracing::debug;

use crate::models::config::DocsortConfig;
use crate::models::document::{ContractFields, DocumentType, FieldSet, QuotationFields};
use crate::ner::{EntityRecognizer, LexicalOrganizationRecognizer, NoopRecognizer};

/// Routes text to the extractor for its document type.
///
/// NER runs once per document and its output is shared by whichever
/// extractor needs it.
pub struct FieldDispatcher {
    invoice: InvoiceFieldExtractor,
    recognizer: Box<dyn EntityRecognizer + Send + Sync>,
}

impl FieldDispatcher {
    /// Dispatcher with the default rules and no NER.
    pub fn new() -> Self {
        Self {
            invoice: InvoiceFieldExtractor::new(),
            recognizer: Box::new(NoopRecognizer),
        }
    }

    /// Dispatcher with the lexical organization recognizer when NER is enabled.
    pub fn from_config(config: &DocsortConfig) -> Self {
        if config.ner.enabled {
            Self::new().with_recognizer(Box::new(LexicalOrganizationRecognizer::new()))
        } else {
            Self::new()
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn EntityRecognizer + Send + Sync>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn with_invoice_extractor(mut self, invoice: InvoiceFieldExtractor) -> Self {
        self.invoice = invoice;
        self
    }

    /// Extract the field set for `doc_type`.
    pub fn extract(&self, text: &str, doc_type: DocumentType) -> FieldSet {
        let entities = self.recognizer.recognize(text);
        debug!("NER found {} entities", entities.len());

        match doc_type {
            DocumentType::Invoice => FieldSet::Invoice(self.invoice.extract(text, &entities)),
            DocumentType::Quotation => quotation_placeholder(),
            DocumentType::Contract => contract_placeholder(),
            DocumentType::Receipt | DocumentType::Order | DocumentType::Unknown => FieldSet::empty(),
        }
    }
}

impl Default for FieldDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Quotation schema with every field empty.
pub fn quotation_placeholder() -> FieldSet {
    FieldSet::Quotation(QuotationFields::default())
}

/// Contract schema with every field empty.
pub fn contract_placeholder() -> FieldSet {
    FieldSet::Contract(ContractFields::default())
}
