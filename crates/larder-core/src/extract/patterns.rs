//! Regex grammars for the vendor extractors.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Ben E. Keith strict item row: route code, quantity, 6-digit item
    // number, brand code, pack fraction, unit, description, two currency
    // amounts. Anchoring on this shape (rather than header text, which
    // varies by account) locates the start of the item-data section.
    pub static ref BEK_ITEM_ROW: Regex = Regex::new(
        r"^\s*(?P<route>\d{1,4})\s+(?P<qty>\d{1,4})\s+(?P<sku>\d{6})\s+(?P<brand>[A-Z][A-Z0-9]{1,5})\s+(?P<pack>\d+\s*/\s*\d+(?:\.\d+)?)\s+(?P<unit>[A-Z]{1,4})\s+(?P<desc>.+?)\s+(?P<case_price>\d{1,5}\.\d{2})\s+(?P<ext_price>\d{1,6}\.\d{2})\s*$"
    ).unwrap();

    // Looser fallback grammar: quantity, item number, free text, trailing
    // currency amount. Catches rows the strict shape misses (wrapped
    // descriptions, missing brand codes).
    pub static ref BEK_LOOSE_ROW: Regex = Regex::new(
        r"^\s*(?:\d{1,4}\s+)?(?P<qty>\d{1,4})\s+(?P<sku>\d{6})\s+(?P<desc>.+?)\s+(?P<case_price>\d{1,5}\.\d{2})(?:\s+\d{1,6}\.\d{2})?\s*$"
    ).unwrap();

    // Pack fraction embedded mid-description, recovered on fallback rows
    // that carry no dedicated pack column.
    pub static ref PACK_IN_TEXT: Regex =
        Regex::new(r"\b\d+\s*/\s*\d+(?:\.\d+)?\s*[A-Za-z#]+\b").unwrap();

    // Invoice number: 8 digits after an "Invoice No" style label.
    pub static ref INVOICE_NO_LABELED: Regex =
        Regex::new(r"(?i)invoice\s*(?:no|number|#)\.?\s*:?\s*(\d{8})").unwrap();

    // Bare 8-digit run, the fallback when no label is present.
    pub static ref INVOICE_NO_BARE: Regex = Regex::new(r"\b(\d{8})\b").unwrap();

    // Dates: M/D/YYYY, or ISO.
    pub static ref DATE_MDY: Regex =
        Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap();

    pub static ref DATE_ISO: Regex =
        Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
}

/// Trailer phrases that end the Ben E. Keith item-data section.
pub const BEK_TRAILERS: [&str; 3] = ["FUEL ADJUSTMENT", "TOTAL QTY", "ALL CLAIMS MUST BE MADE"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_row_shape() {
        let caps = BEK_ITEM_ROW
            .captures("  204  5  123456  FARML  2/5  LB  CHICKEN BREAST 6 OZ  45.20  226.00")
            .unwrap();
        assert_eq!(&caps["sku"], "123456");
        assert_eq!(&caps["pack"], "2/5");
        assert_eq!(&caps["desc"], "CHICKEN BREAST 6 OZ");
        assert_eq!(&caps["case_price"], "45.20");
    }

    #[test]
    fn test_strict_row_rejects_header_lines() {
        assert!(!BEK_ITEM_ROW.is_match("QTY  ITEM  BRAND  PACK  DESCRIPTION  PRICE"));
        assert!(!BEK_ITEM_ROW.is_match("BEN E. KEITH FOODS  INVOICE 20240815"));
    }

    #[test]
    fn test_loose_row_shape() {
        let caps = BEK_LOOSE_ROW
            .captures("  3  654321  PICKLE DILL SPEAR 24 CT  18.75")
            .unwrap();
        assert_eq!(&caps["qty"], "3");
        assert_eq!(&caps["sku"], "654321");
        assert_eq!(&caps["case_price"], "18.75");
    }

    #[test]
    fn test_labeled_invoice_number() {
        let caps = INVOICE_NO_LABELED.captures("Invoice No: 20240815").unwrap();
        assert_eq!(&caps[1], "20240815");
    }
}
