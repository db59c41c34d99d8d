//! Date normalization for Western, Minguo and US-style dates.

use chrono::NaiveDate;
use regex::{Captures, Regex};

use super::FieldExtractor;
use super::patterns::{DATE_MINGUO, DATE_US, DATE_WESTERN};
use crate::error::DateParseError;

/// Offset between Minguo (Republic of China) years and Gregorian years.
pub const MINGUO_EPOCH_OFFSET: i32 = 1911;

/// Field order of a date pattern's three capture groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `YYYY年MM月DD日`, `YYYY-MM-DD`, `YYYY/MM/DD`.
    Western,
    /// Three-digit Minguo year, e.g. `113年03月15日`.
    Minguo,
    /// `MM/DD/YYYY`.
    MonthFirst,
}

impl DateLayout {
    fn to_date(self, caps: &Captures<'_>) -> Result<NaiveDate, DateParseError> {
        let source = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let invalid = || DateParseError::InvalidDate(source.to_string());
        let field = |i: usize| -> Result<u32, DateParseError> {
            caps[i].parse::<u32>().map_err(|_| invalid())
        };

        let (year, month, day) = match self {
            DateLayout::Western => (field(1)? as i32, field(2)?, field(3)?),
            DateLayout::Minguo => (field(1)? as i32 + MINGUO_EPOCH_OFFSET, field(2)?, field(3)?),
            DateLayout::MonthFirst => (field(3)? as i32, field(1)?, field(2)?),
        };

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
    }
}

/// One entry of the date cascade.
#[derive(Debug, Clone)]
pub struct DatePattern {
    pub layout: DateLayout,
    pub regex: Regex,
}

/// Date field extractor.
///
/// Patterns are tried in order; the first pattern that matches anywhere
/// decides the result from its first match. A winning match that is not a
/// real calendar day is an error; later patterns are not tried.
#[derive(Debug, Clone)]
pub struct DateExtractor {
    patterns: Vec<DatePattern>,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self {
            patterns: vec![
                DatePattern {
                    layout: DateLayout::Western,
                    regex: DATE_WESTERN.clone(),
                },
                DatePattern {
                    layout: DateLayout::Minguo,
                    regex: DATE_MINGUO.clone(),
                },
                DatePattern {
                    layout: DateLayout::MonthFirst,
                    regex: DATE_US.clone(),
                },
            ],
        }
    }

    /// Build an extractor from a custom cascade.
    pub fn with_patterns(patterns: Vec<DatePattern>) -> Self {
        Self { patterns }
    }

    fn winner(&self, text: &str) -> Option<&DatePattern> {
        self.patterns.iter().find(|p| p.regex.is_match(text))
    }

    /// Normalize the first date found in `raw`.
    pub fn normalize(&self, raw: &str) -> Result<NaiveDate, DateParseError> {
        let pattern = self.winner(raw).ok_or(DateParseError::NoMatch)?;
        let caps = pattern.regex.captures(raw).ok_or(DateParseError::NoMatch)?;
        pattern.layout.to_date(&caps)
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = NaiveDate;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.normalize(text).ok()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        match self.winner(text) {
            Some(pattern) => pattern
                .regex
                .captures_iter(text)
                .filter_map(|caps| pattern.layout.to_date(&caps).ok())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Normalize a date string with the default cascade.
pub fn normalize_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    DateExtractor::new().normalize(raw)
}

/// Format a date as `YYYY-MM-DD`.
pub fn to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(raw: &str) -> String {
        to_iso(normalize_date(raw).unwrap())
    }

    #[test]
    fn test_western_dates() {
        assert_eq!(iso("2024年03月15日"), "2024-03-15");
        assert_eq!(iso("2024-3-5"), "2024-03-05");
        assert_eq!(iso("日期：2024/12/01"), "2024-12-01");
    }

    #[test]
    fn test_minguo_dates() {
        assert_eq!(iso("113年03月15日"), "2024-03-15");
        assert_eq!(iso("民國112/1/9"), "2023-01-09");
    }

    #[test]
    fn test_us_dates() {
        assert_eq!(iso("03/15/2024"), "2024-03-15");
        assert_eq!(iso("due 7-4-2025"), "2025-07-04");
    }

    #[test]
    fn test_western_wins_over_later_patterns() {
        // The US date comes first in the text but the Western pattern is tried first.
        assert_eq!(iso("03/15/2023 then 2024年01月02日"), "2024-01-02");
    }

    #[test]
    fn test_first_match_of_winning_pattern() {
        assert_eq!(iso("2024-01-02 and 2025-06-07"), "2024-01-02");
    }

    #[test]
    fn test_no_match() {
        assert_eq!(normalize_date("no date here"), Err(DateParseError::NoMatch));
        assert_eq!(normalize_date(""), Err(DateParseError::NoMatch));
    }

    #[test]
    fn test_invalid_calendar_date_does_not_fall_through() {
        let err = normalize_date("2024-13-45 or 03/15/2024").unwrap_err();
        assert_eq!(err, DateParseError::InvalidDate("2024-13-45".to_string()));
    }

    #[test]
    fn test_extract_all_from_winner() {
        let extractor = DateExtractor::new();
        let dates = extractor.extract_all("113年1月2日, 113年2月3日, 03/04/2024");
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            ]
        );
    }
}
