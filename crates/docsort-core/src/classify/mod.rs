//! Keyword-based document classification.

mod taxonomy;

pub use taxonomy::{KeywordCategory, KeywordTaxonomy};

use tracing::debug;

use crate::models::document::DocumentType;

/// Assigns a [`DocumentType`] by case-insensitive substring search.
///
/// Matching is plain containment with no word boundaries, so a short
/// keyword such as `order` also fires inside `border`.
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    taxonomy: KeywordTaxonomy,
    invoice: KeywordCategory,
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::with_taxonomy(KeywordTaxonomy::default())
    }
}

impl DocumentClassifier {
    /// Create a classifier with the built-in taxonomy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier with a custom taxonomy.
    pub fn with_taxonomy(taxonomy: KeywordTaxonomy) -> Self {
        let invoice = taxonomy.invoice_category();
        Self { taxonomy, invoice }
    }

    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }

    /// Classify text. Returns [`DocumentType::Unknown`] when nothing matches.
    pub fn classify(&self, text: &str) -> DocumentType {
        let text_lower = text.to_lowercase();

        if self.invoice.matches_lowercase(&text_lower) {
            debug!("Classified document as {}", DocumentType::Invoice);
            return DocumentType::Invoice;
        }

        for category in self.taxonomy.categories() {
            if category.matches_lowercase(&text_lower) {
                debug!("Classified document as {}", category.document_type);
                return category.document_type;
            }
        }

        debug!("No taxonomy keyword matched, document is unknown");
        DocumentType::Unknown
    }
}
