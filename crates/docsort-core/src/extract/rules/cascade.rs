//! Ordered pattern cascades.

use regex::{Captures, Regex};

use crate::error::ExtractionError;

/// An ordered list of candidate patterns for one field.
///
/// The first pattern that matches anywhere in the text wins, and later
/// patterns are never consulted. Earlier entries should encode the more
/// specific layouts.
#[derive(Debug, Clone)]
pub struct Cascade {
    patterns: Vec<Regex>,
}

impl Cascade {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    /// Compile a cascade from pattern strings.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ExtractionError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| ExtractionError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// The first pattern with at least one match in `text`.
    pub fn winner(&self, text: &str) -> Option<&Regex> {
        self.patterns.iter().find(|p| p.is_match(text))
    }

    /// First match of the winning pattern.
    pub fn first_captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.winner(text).and_then(|p| p.captures(text))
    }

    /// Every match of the winning pattern, in text order.
    pub fn all_captures<'t>(&self, text: &'t str) -> Vec<Captures<'t>> {
        match self.winner(text) {
            Some(pattern) => pattern.captures_iter(text).collect(),
            None => Vec::new(),
        }
    }

    /// Value of the first match of the winning pattern.
    pub fn first_value<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.first_captures(text).map(|caps| capture_value(&caps))
    }
}

/// The first capture group if the pattern has one, else the whole match.
pub fn capture_value<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_pattern_wins() {
        let cascade = Cascade::from_patterns(&[r"A=(\d+)", r"B=(\d+)"]).unwrap();
        assert_eq!(cascade.first_value("B=2 A=1 A=3"), Some("1"));
        assert_eq!(cascade.first_value("B=2 B=4"), Some("2"));
        assert_eq!(cascade.first_value("C=5"), None);
    }

    #[test]
    fn test_all_captures_only_from_winner() {
        let cascade = Cascade::from_patterns(&[r"A=(\d+)", r"B=(\d+)"]).unwrap();
        let values: Vec<_> = cascade
            .all_captures("A=1 B=2 A=3")
            .iter()
            .map(capture_value)
            .collect();
        assert_eq!(values, vec!["1", "3"]);
    }

    #[test]
    fn test_whole_match_without_group() {
        let cascade = Cascade::from_patterns(&[r"[A-Z]{2}\d{2}"]).unwrap();
        assert_eq!(cascade.first_value("xx AB12 CD34"), Some("AB12"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Cascade::from_patterns(&["("]).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPattern { .. }));
    }
}
