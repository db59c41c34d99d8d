//! Invoice number and tax ID extraction.

use super::cascade::{capture_value, Cascade};
use super::patterns::{INVOICE_NUMBER, TAX_ID};
use super::FieldExtractor;

/// Unified invoice number extractor (`AB-12345678` -> `AB12345678`).
#[derive(Debug, Clone)]
pub struct InvoiceNumberExtractor {
    cascade: Cascade,
}

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self::with_cascade(Cascade::new(vec![INVOICE_NUMBER.clone()]))
    }

    pub fn with_cascade(cascade: Cascade) -> Self {
        Self { cascade }
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.cascade.first_value(text).map(strip_hyphens)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.cascade
            .all_captures(text)
            .iter()
            .map(|caps| strip_hyphens(capture_value(caps)))
            .collect()
    }
}

fn strip_hyphens(s: &str) -> String {
    s.replace('-', "")
}

/// Labeled eight-digit tax ID extractor (統一編號 / Tax ID).
#[derive(Debug, Clone)]
pub struct TaxIdExtractor {
    cascade: Cascade,
}

impl TaxIdExtractor {
    pub fn new() -> Self {
        Self::with_cascade(Cascade::new(vec![TAX_ID.clone()]))
    }

    pub fn with_cascade(cascade: Cascade) -> Self {
        Self { cascade }
    }
}

impl Default for TaxIdExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for TaxIdExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.cascade.first_value(text).map(str::to_string)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.cascade
            .all_captures(text)
            .iter()
            .map(|caps| capture_value(caps).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_hyphen_stripped() {
        let extractor = InvoiceNumberExtractor::new();
        assert_eq!(extractor.extract("發票號碼：AB-12345678"), Some("AB12345678".to_string()));
        assert_eq!(extractor.extract("CD87654321"), Some("CD87654321".to_string()));
    }

    #[test]
    fn test_invoice_number_first_match() {
        let extractor = InvoiceNumberExtractor::new();
        assert_eq!(
            extractor.extract("XY-11111111 ZZ22222222"),
            Some("XY11111111".to_string())
        );
        assert_eq!(extractor.extract_all("XY-11111111 ZZ22222222").len(), 2);
    }

    #[test]
    fn test_invoice_number_requires_uppercase_letters() {
        let extractor = InvoiceNumberExtractor::new();
        assert_eq!(extractor.extract("ab-12345678"), None);
        assert_eq!(extractor.extract("AB-1234567"), None);
    }

    #[test]
    fn test_tax_id_labeled() {
        let extractor = TaxIdExtractor::new();
        assert_eq!(extractor.extract("統一編號：12345678"), Some("12345678".to_string()));
        assert_eq!(extractor.extract("統一編號 87654321"), Some("87654321".to_string()));
        assert_eq!(extractor.extract("Tax ID: 24681357"), Some("24681357".to_string()));
    }

    #[test]
    fn test_tax_id_requires_label() {
        let extractor = TaxIdExtractor::new();
        assert_eq!(extractor.extract("12345678"), None);
        assert_eq!(extractor.extract("統一編號：1234567"), None);
    }
}
