//! Rule-based field extractors for Taiwanese invoices.

pub mod amounts;
pub mod cascade;
pub mod dates;
pub mod ids;
pub mod parties;
pub mod patterns;

pub use amounts::{clean_amount, parse_amount, AmountExtractor};
pub use cascade::{capture_value, Cascade};
pub use dates::{normalize_date, to_iso, DateExtractor, DateLayout, DatePattern};
pub use ids::{InvoiceNumberExtractor, TaxIdExtractor};
pub use parties::PartyNameExtractor;

use std::borrow::Cow;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Replace full-width digits (`０`-`９`), common in CJK OCR output, with ASCII.
pub fn fold_fullwidth_digits(text: &str) -> Cow<'_, str> {
    const FULLWIDTH: std::ops::RangeInclusive<char> = '０'..='９';

    if !text.chars().any(|c| FULLWIDTH.contains(&c)) {
        return Cow::Borrowed(text);
    }

    Cow::Owned(
        text.chars()
            .map(|c| {
                if FULLWIDTH.contains(&c) {
                    char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c)
                } else {
                    c
                }
            })
            .collect(),
    )
}

/// The full rule table used for invoice extraction.
///
/// Every field is data, so callers and tests can swap in their own cascades.
#[derive(Debug, Clone, Default)]
pub struct InvoiceRules {
    pub invoice_number: InvoiceNumberExtractor,
    pub date: DateExtractor,
    pub tax_id: TaxIdExtractor,
    pub amount: AmountExtractor,
    pub parties: PartyNameExtractor,
}

impl InvoiceRules {
    pub fn new() -> Self {
        Self::default()
    }
}
