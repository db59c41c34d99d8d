//! Labeled total amount extraction.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::cascade::{capture_value, Cascade};
use super::patterns::{AMOUNT, TOTAL_AMOUNT, TOTAL_SUM};
use super::FieldExtractor;

/// Amount extractor over the `總計` -> `總額` -> `金額` label cascade.
#[derive(Debug, Clone)]
pub struct AmountExtractor {
    cascade: Cascade,
}

impl AmountExtractor {
    pub fn new() -> Self {
        Self::with_cascade(Cascade::new(vec![
            TOTAL_SUM.clone(),
            TOTAL_AMOUNT.clone(),
            AMOUNT.clone(),
        ]))
    }

    pub fn with_cascade(cascade: Cascade) -> Self {
        Self { cascade }
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.cascade.first_value(text).and_then(clean_amount)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.cascade
            .all_captures(text)
            .iter()
            .filter_map(|caps| clean_amount(capture_value(caps)))
            .collect()
    }
}

/// Strip `,` thousands separators, keeping the digits exactly as written.
pub fn clean_amount(s: &str) -> Option<String> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Numeric value of an amount such as `3,000` or `3000`.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    Decimal::from_str(&clean_amount(s)?).ok()
}
