//! Full invoice field extraction.

use tracing::debug;

use crate::models::document::InvoiceFields;
use crate::ner::NamedEntity;

use super::entities::{seller_and_buyer, EntityMerger, PositionalRoles, RoleAssigner};
use super::rules::{fold_fullwidth_digits, to_iso, FieldExtractor, InvoiceRules};

/// Extracts [`InvoiceFields`] from OCR text with the rule cascades.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFieldExtractor<R = PositionalRoles> {
    rules: InvoiceRules,
    merger: EntityMerger<R>,
}

impl InvoiceFieldExtractor<PositionalRoles> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: InvoiceRules) -> Self {
        Self {
            rules,
            merger: EntityMerger::new(),
        }
    }
}

impl<R: RoleAssigner> InvoiceFieldExtractor<R> {
    /// Replace the role heuristic.
    pub fn with_roles<R2: RoleAssigner>(self, roles: R2) -> InvoiceFieldExtractor<R2> {
        InvoiceFieldExtractor {
            rules: self.rules,
            merger: EntityMerger::with_roles(roles),
        }
    }

    pub fn rules(&self) -> &InvoiceRules {
        &self.rules
    }

    /// Extract invoice fields. Fields that no rule matches stay empty.
    pub fn extract(&self, text: &str, entities: &[NamedEntity]) -> InvoiceFields {
        let text = fold_fullwidth_digits(text);
        let text = text.as_ref();
        let mut fields = InvoiceFields::default();

        if let Some(number) = self.rules.invoice_number.extract(text) {
            fields.invoice_number = number;
        }

        match self.rules.date.normalize(text) {
            Ok(date) => fields.invoice_date = to_iso(date),
            Err(e) => debug!("Invoice date left empty: {}", e),
        }

        if let Some(tax_id) = self.rules.tax_id.extract(text) {
            fields.tax_id = tax_id;
        }

        let label_matches = self.rules.parties.extract_all(text);
        let parties = self.merger.merge(&label_matches, entities);
        let (seller, buyer) = seller_and_buyer(&parties);
        fields.seller = seller.unwrap_or_default().to_string();
        fields.buyer = buyer.unwrap_or_default().to_string();

        if let Some(amount) = self.rules.amount.extract(text) {
            fields.amount = amount;
        }

        debug!(
            "Extracted invoice fields: number={:?} date={:?} seller={:?} amount={:?}",
            fields.invoice_number, fields.invoice_date, fields.seller, fields.amount
        );

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::entities::{Entity, Role};
    use crate::extract::rules::{AmountExtractor, Cascade};
    use pretty_assertions::assert_eq;

    const SAMPLE_INVOICE: &str = r#"
    統一發票
    發票號碼：AB-12345678
    日期：2024年03月15日
    統一編號：12345678

    買受人：測試公司
    賣方：範例企業有限公司

    品項：
    1. 商品A $1,000
    2. 商品B $2,000

    總計：NT$3,000
    "#;

    #[test]
    fn test_extract_sample_invoice() {
        let fields = InvoiceFieldExtractor::new().extract(SAMPLE_INVOICE, &[]);

        assert_eq!(
            fields,
            InvoiceFields {
                invoice_number: "AB12345678".to_string(),
                invoice_date: "2024-03-15".to_string(),
                // Roles follow label order: 買受人 is checked before 賣方.
                seller: "測試公司".to_string(),
                buyer: "範例企業有限公司".to_string(),
                amount: "3000".to_string(),
                tax_id: "12345678".to_string(),
            }
        );
    }

    #[test]
    fn test_minguo_invoice_date() {
        let fields = InvoiceFieldExtractor::new().extract("電子發票 113年03月15日", &[]);
        assert_eq!(fields.invoice_date, "2024-03-15");
    }

    #[test]
    fn test_fullwidth_digits() {
        let text = "發票號碼：AB-１２３４５６７８\n日期：２０２４年３月１５日\n統一編號：８７６５４３２１\n總計：NT$３,０００";
        let fields = InvoiceFieldExtractor::new().extract(text, &[]);
        assert_eq!(fields.invoice_number, "AB12345678");
        assert_eq!(fields.invoice_date, "2024-03-15");
        assert_eq!(fields.tax_id, "87654321");
        assert_eq!(fields.amount, "3000");
    }

    #[test]
    fn test_ner_organizations_fill_missing_parties() {
        let entities = vec![
            NamedEntity::organization("甲公司"),
            NamedEntity::organization("乙商行"),
        ];
        let fields = InvoiceFieldExtractor::new().extract("發票", &entities);
        assert_eq!(fields.seller, "甲公司");
        assert_eq!(fields.buyer, "乙商行");
    }

    #[test]
    fn test_nothing_found_leaves_fields_empty() {
        let fields = InvoiceFieldExtractor::new().extract("invoice", &[]);
        assert_eq!(fields, InvoiceFields::default());
    }

    #[test]
    fn test_custom_rules() {
        let mut rules = InvoiceRules::new();
        rules.amount =
            AmountExtractor::with_cascade(Cascade::from_patterns(&[r"Total:\s*([0-9,]+)"]).unwrap());
        let fields = InvoiceFieldExtractor::with_rules(rules).extract("Total: 1,500", &[]);
        assert_eq!(fields.amount, "1500");
    }

    #[test]
    fn test_custom_roles() {
        struct AllBuyers;
        impl RoleAssigner for AllBuyers {
            fn assign(&self, names: Vec<String>) -> Vec<Entity> {
                names
                    .into_iter()
                    .map(|text| Entity { text, role: Role::Buyer })
                    .collect()
            }
        }

        let fields = InvoiceFieldExtractor::new()
            .with_roles(AllBuyers)
            .extract("賣方：甲公司", &[]);
        assert_eq!(fields.seller, "");
        assert_eq!(fields.buyer, "甲公司");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractor = InvoiceFieldExtractor::new();
        assert_eq!(
            extractor.extract(SAMPLE_INVOICE, &[]),
            extractor.extract(SAMPLE_INVOICE, &[])
        );
    }
}
