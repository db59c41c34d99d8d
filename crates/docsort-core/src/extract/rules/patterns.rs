//! Common regex patterns for Taiwanese invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Unified invoice number (統一發票號碼): two letters and eight digits
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"[A-Z]{2}-?[0-9]{8}"
    ).unwrap();

    // Business tax ID (統一編號)
    pub static ref TAX_ID: Regex = Regex::new(
        r"(?:統一編號|Tax ID)[：: \t]*([0-9]{8})"
    ).unwrap();

    // Dates, in cascade order
    pub static ref DATE_WESTERN: Regex = Regex::new(
        r"([0-9]{4})[年/\-]([0-9]{1,2})[月/\-]([0-9]{1,2})"
    ).unwrap();

    pub static ref DATE_MINGUO: Regex = Regex::new(
        r"([0-9]{3})[年/\-]([0-9]{1,2})[月/\-]([0-9]{1,2})"
    ).unwrap();

    pub static ref DATE_US: Regex = Regex::new(
        r"([0-9]{1,2})[/\-]([0-9]{1,2})[/\-]([0-9]{4})"
    ).unwrap();

    // Labeled totals, in cascade order
    pub static ref TOTAL_SUM: Regex = Regex::new(
        r"總計[：: \t]*(?:NT\$|NTD|\$|＄)?[ \t]*([0-9]+[,0-9]*)"
    ).unwrap();

    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"總額[：: \t]*(?:NT\$|NTD|\$|＄)?[ \t]*([0-9]+[,0-9]*)"
    ).unwrap();

    pub static ref AMOUNT: Regex = Regex::new(
        r"金額[：: \t]*(?:NT\$|NTD|\$|＄)?[ \t]*([0-9]+[,0-9]*)"
    ).unwrap();

    // Party name labels; each captures the rest of the line
    pub static ref COMPANY_NAME: Regex = Regex::new(
        r"公司名稱[：: \t]*([^\n]+)"
    ).unwrap();

    pub static ref BUYER: Regex = Regex::new(
        r"買受人[：: \t]*([^\n]+)"
    ).unwrap();

    pub static ref SELLER: Regex = Regex::new(
        r"賣方[：: \t]*([^\n]+)"
    ).unwrap();

    pub static ref STORE_NAME: Regex = Regex::new(
        r"商店名稱[：: \t]*([^\n]+)"
    ).unwrap();

    // Organization names recognized by suffix
    pub static ref ORGANIZATION_CJK: Regex = Regex::new(
        r"[\p{Han}A-Za-z0-9]{1,30}(?:股份有限公司|有限公司|公司|企業社|企業|商行|商店|工作室|事務所)"
    ).unwrap();

    // At least one capitalized word, then a whole legal-form suffix
    pub static ref ORGANIZATION_LATIN: Regex = Regex::new(
        r"\b(?:[A-Z][A-Za-z0-9&\-]*[ \t]+){1,4}(?:Co\.,?[ \t]*Ltd(?:\.|\b)|Corporation\b|(?:Inc|Ltd|Corp)(?:\.|\b)|LLC\b|GmbH\b)"
    ).unwrap();
}
