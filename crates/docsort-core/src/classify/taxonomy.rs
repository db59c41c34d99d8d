//! Keyword taxonomy used by the document classifier.

use serde::{Deserialize, Serialize};

use crate::models::document::DocumentType;

/// Keywords that identify one document category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub document_type: DocumentType,
    pub keywords: Vec<String>,
}

impl KeywordCategory {
    pub fn new<I, S>(document_type: DocumentType, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            document_type,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether any keyword occurs in already-lowercased text.
    pub(crate) fn matches_lowercase(&self, text_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| text_lower.contains(keyword.to_lowercase().as_str()))
    }
}

/// Ordered keyword taxonomy.
///
/// Any of `invoice_keywords` makes a document an invoice before `categories`
/// are looked at, so a document mentioning both an invoice keyword and, say,
/// an order keyword is always an invoice. Only the keywords are
/// configurable; the priority class is fixed to [`DocumentType::Invoice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTaxonomy {
    pub invoice_keywords: Vec<String>,
    pub categories: Vec<KeywordCategory>,
}

impl KeywordTaxonomy {
    pub fn new<I, S>(invoice_keywords: I, categories: Vec<KeywordCategory>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invoice_keywords: invoice_keywords.into_iter().map(Into::into).collect(),
            categories,
        }
    }

    /// The invoice priority check as a category.
    pub fn invoice_category(&self) -> KeywordCategory {
        KeywordCategory::new(DocumentType::Invoice, self.invoice_keywords.iter().cloned())
    }

    /// Categories in the order they are checked, after the invoice check.
    pub fn categories(&self) -> impl Iterator<Item = &KeywordCategory> {
        self.categories.iter()
    }
}

impl Default for KeywordTaxonomy {
    fn default() -> Self {
        Self {
            invoice_keywords: ["發票", "統一發票", "invoice", "電子發票"]
                .into_iter()
                .map(String::from)
                .collect(),
            categories: vec![
                KeywordCategory::new(DocumentType::Quotation, ["報價", "報價單", "quotation"]),
                KeywordCategory::new(
                    DocumentType::Contract,
                    ["合約", "契約", "contract", "agreement"],
                ),
                KeywordCategory::new(DocumentType::Receipt, ["收據", "收條", "receipt"]),
                KeywordCategory::new(
                    DocumentType::Order,
                    ["訂單", "訂購單", "order", "purchase order"],
                ),
            ],
        }
    }
}
