//! Party name candidates from labeled lines.

use regex::Regex;

use super::cascade::capture_value;
use super::patterns::{BUYER, COMPANY_NAME, SELLER, STORE_NAME};
use super::FieldExtractor;

/// Collects party names after labels such as `公司名稱` or `賣方`.
///
/// Unlike the other fields this is a union, not a cascade: every match of
/// every label is returned, grouped by label in declaration order.
#[derive(Debug, Clone)]
pub struct PartyNameExtractor {
    labels: Vec<Regex>,
}

impl PartyNameExtractor {
    pub fn new() -> Self {
        Self::with_labels(vec![
            COMPANY_NAME.clone(),
            BUYER.clone(),
            SELLER.clone(),
            STORE_NAME.clone(),
        ])
    }

    pub fn with_labels(labels: Vec<Regex>) -> Self {
        Self { labels }
    }
}

impl Default for PartyNameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for PartyNameExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.labels
            .iter()
            .flat_map(|label| label.captures_iter(text))
            .map(|caps| clean_name(capture_value(&caps)))
            .filter(|name| !name.is_empty())
            .collect()
    }
}

fn clean_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '：' || c == ':')
        .to_string()
}
