//! Ben E. Keith PDF invoice extractor.
//!
//! The invoice body is a fixed tabular layout, but header text varies by
//! account, so the item-data section is located by row shape rather than by
//! header labels. A strict primary grammar runs first; when it yields fewer
//! items than expected, a looser line-by-line fallback pass runs and newly
//! found SKUs are merged in. Each pass is total: it returns whatever rows it
//! recognized, and only the merged result can fail (on zero items).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, info};

use super::patterns::{
    BEK_ITEM_ROW, BEK_LOOSE_ROW, BEK_TRAILERS, DATE_ISO, DATE_MDY, INVOICE_NO_BARE,
    INVOICE_NO_LABELED, PACK_IN_TEXT,
};
use super::{finish, iso, today_iso, Extraction, Result, VendorExtractor};
use crate::detect::{InvoiceFile, Vendor};
use crate::models::item::ExtractedLineItem;
use crate::pdf::PdfTextExtractor;
use crate::units::{parse_pack_size, parse_portion_size};

/// Fewer primary-grammar hits than this triggers the fallback pass.
const MIN_EXPECTED_ITEMS: usize = 10;

#[derive(Debug, Default)]
pub struct BenEKeithExtractor {
    /// Override for the fallback trigger; `None` uses the default.
    pub min_expected_items: Option<usize>,
}

impl VendorExtractor for BenEKeithExtractor {
    fn vendor(&self) -> Vendor {
        Vendor::BenEKeith
    }

    fn extract(&self, file: &InvoiceFile, pdf: &dyn PdfTextExtractor) -> Result<Extraction> {
        let text = pdf.extract_text(&file.bytes)?;
        self.extract_from_text(&text)
    }
}

impl BenEKeithExtractor {
    /// Run the grammar chain over already-extracted invoice text.
    pub fn extract_from_text(&self, text: &str) -> Result<Extraction> {
        let invoice_number = extract_invoice_number(text);
        let invoice_date = extract_invoice_date(text);

        let lines: Vec<&str> = text.lines().collect();
        let region = isolate_item_region(&lines);

        let mut items = primary_pass(region);
        let threshold = self.min_expected_items.unwrap_or(MIN_EXPECTED_ITEMS);

        if items.len() < threshold {
            info!(
                "primary grammar yielded {} items (< {}), running fallback pass",
                items.len(),
                threshold
            );
            let seen: HashSet<String> = items.iter().map(|i| i.vendor_sku.clone()).collect();
            for item in fallback_pass(region) {
                if !seen.contains(&item.vendor_sku) {
                    items.push(item);
                }
            }
        }

        debug!("extracted {} items total", items.len());
        finish(
            items,
            invoice_number,
            invoice_date,
            "no item rows matched the Ben E. Keith grammar",
        )
    }
}

/// Isolate the item-data section: starts at the first line matching the
/// strict row shape, ends at the first known trailer phrase (or end of
/// document when none is found).
fn isolate_item_region<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let start = lines
        .iter()
        .position(|line| BEK_ITEM_ROW.is_match(line))
        .unwrap_or(0);

    let end = lines[start..]
        .iter()
        .position(|line| {
            let upper = line.to_uppercase();
            BEK_TRAILERS.iter().any(|t| upper.contains(t))
        })
        .map(|offset| start + offset)
        .unwrap_or(lines.len());

    &lines[start..end]
}

/// Primary grammar: the strict row shape, one item per matching line.
fn primary_pass(region: &[&str]) -> Vec<ExtractedLineItem> {
    region
        .iter()
        .filter_map(|line| BEK_ITEM_ROW.captures(line))
        .filter_map(|caps| {
            let pack_text = format!("{} {}", &caps["pack"], &caps["unit"]);
            build_item(
                &caps["desc"],
                &caps["sku"],
                Some(&caps["brand"]),
                &pack_text,
                &caps["qty"],
                &caps["case_price"],
            )
        })
        .collect()
}

/// Fallback grammar: looser line shape; pack size is recovered from the
/// description text when present.
fn fallback_pass(region: &[&str]) -> Vec<ExtractedLineItem> {
    region
        .iter()
        .filter_map(|line| BEK_LOOSE_ROW.captures(line))
        .filter_map(|caps| {
            let pack_text = PACK_IN_TEXT
                .find(&caps["desc"])
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            build_item(
                &caps["desc"],
                &caps["sku"],
                None,
                &pack_text,
                &caps["qty"],
                &caps["case_price"],
            )
        })
        .collect()
}

fn build_item(
    desc: &str,
    sku: &str,
    brand: Option<&str>,
    pack_text: &str,
    qty: &str,
    case_price: &str,
) -> Option<ExtractedLineItem> {
    let desc = desc.trim();
    if desc.is_empty() {
        return None;
    }

    let mut item = ExtractedLineItem::new(desc, sku, Vendor::BenEKeith);
    item.brand = brand.map(|b| b.to_string());

    let pack = parse_pack_size(pack_text);
    item.units_per_case = pack.units_per_case;
    item.size_per_unit = pack.size_per_unit;
    item.unit_type = pack.unit_type;

    item.case_cost = Decimal::from_str(case_price).unwrap_or(Decimal::ZERO);

    let qty = Decimal::from_str(qty).unwrap_or(Decimal::ZERO);
    item.set_quantities(qty, qty);

    let portion = parse_portion_size(desc);
    if portion.is_valid {
        item.portion_size = portion.portion_size;
        item.portion_unit = portion.portion_unit;
        item.portion_confidence = portion.confidence;
    }

    item.recompute_unit_cost();
    Some(item)
}

/// Invoice number: 8 digits after an "Invoice No" label, else the first bare
/// 8-digit run, else UNKNOWN. Never aborts extraction.
fn extract_invoice_number(text: &str) -> String {
    if let Some(caps) = INVOICE_NO_LABELED.captures(text) {
        return caps[1].to_string();
    }
    if let Some(caps) = INVOICE_NO_BARE.captures(text) {
        return caps[1].to_string();
    }
    "UNKNOWN".to_string()
}

/// Invoice date: M/D/YYYY, else ISO, else the current date. Never aborts
/// extraction.
fn extract_invoice_date(text: &str) -> String {
    if let Some(caps) = DATE_MDY.captures(text) {
        let month: u32 = caps[1].parse().unwrap_or(0);
        let day: u32 = caps[2].parse().unwrap_or(0);
        let year: i32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return iso(date);
        }
    }
    if let Some(caps) = DATE_ISO.captures(text) {
        let year: i32 = caps[1].parse().unwrap_or(0);
        let month: u32 = caps[2].parse().unwrap_or(0);
        let day: u32 = caps[3].parse().unwrap_or(0);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return iso(date);
        }
    }
    today_iso()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const SAMPLE: &str = "\
BEN E. KEITH FOODS
Invoice No: 20240815   Date: 8/15/2024
ROUTE  QTY  ITEM  BRAND  PACK  UNIT  DESCRIPTION  PRICE  AMOUNT
204  5  123456  FARML  2/5  LB  CHICKEN BREAST 6 OZ  45.20  226.00
204  2  234567  BEKB  4/1  GAL  OIL CANOLA CLEAR FRY  38.10  76.20
3  654321  PICKLE DILL SPEAR  18.75
FUEL ADJUSTMENT  4.50
TOTAL QTY  10";

    #[test]
    fn test_primary_rows_parsed() {
        let extraction = BenEKeithExtractor::default().extract_from_text(SAMPLE).unwrap();
        let first = &extraction.items[0];
        assert_eq!(first.vendor_sku, "123456");
        assert_eq!(first.name, "CHICKEN BREAST 6 OZ");
        assert_eq!(first.brand.as_deref(), Some("FARML"));
        assert_eq!(first.units_per_case, dec("2"));
        assert_eq!(first.size_per_unit, dec("5"));
        assert_eq!(first.case_cost, dec("45.20"));
        assert_eq!(first.quantity_shipped, dec("5"));
        assert_eq!(first.portion_size, Some(dec("6")));
    }

    #[test]
    fn test_fallback_merges_new_skus_without_duplicates() {
        // Three rows total, under the expected minimum of 10, so the
        // fallback pass runs. The loose grammar also matches the two strict
        // rows; dedup by SKU must keep them single.
        let extraction = BenEKeithExtractor::default().extract_from_text(SAMPLE).unwrap();
        let skus: Vec<&str> = extraction
            .items
            .iter()
            .map(|i| i.vendor_sku.as_str())
            .collect();
        assert_eq!(skus, vec!["123456", "234567", "654321"]);

        let unique: HashSet<&&str> = skus.iter().collect();
        assert_eq!(unique.len(), skus.len());
    }

    #[test]
    fn test_fallback_not_run_when_primary_sufficient() {
        let extraction = BenEKeithExtractor {
            min_expected_items: Some(2),
        }
        .extract_from_text(SAMPLE)
        .unwrap();
        // Only the two strict rows; the loose-only row is not merged.
        assert_eq!(extraction.items.len(), 2);
    }

    #[test]
    fn test_fallback_recovers_embedded_pack() {
        let text = "\
Invoice No: 20240815
204  5  123456  FARML  2/5  LB  CHICKEN BREAST  45.20  226.00
4  777888  SAUCE SOY 6/0.5 GAL  52.00";
        let extraction = BenEKeithExtractor::default().extract_from_text(text).unwrap();
        let sauce = extraction
            .items
            .iter()
            .find(|i| i.vendor_sku == "777888")
            .unwrap();
        assert_eq!(sauce.units_per_case, dec("6"));
        assert_eq!(sauce.size_per_unit, dec("0.5"));
        assert_eq!(sauce.unit_type, crate::models::item::UnitType::Gal);
    }

    #[test]
    fn test_invoice_metadata() {
        let extraction = BenEKeithExtractor::default().extract_from_text(SAMPLE).unwrap();
        assert_eq!(extraction.invoice_number, "20240815");
        assert_eq!(extraction.invoice_date, "2024-08-15");
    }

    #[test]
    fn test_metadata_defaults_never_abort() {
        let text = "\
204  5  123456  FARML  2/5  LB  CHICKEN BREAST  45.20  226.00";
        let extraction = BenEKeithExtractor::default().extract_from_text(text).unwrap();
        assert_eq!(extraction.invoice_number, "UNKNOWN");
        assert!(!extraction.invoice_date.is_empty());
    }

    #[test]
    fn test_zero_rows_is_error() {
        let err = BenEKeithExtractor::default()
            .extract_from_text("no items here\njust prose\n")
            .unwrap_err();
        assert!(matches!(err, crate::error::ExtractError::NoItems(_)));
    }

    #[test]
    fn test_region_ends_at_trailer() {
        // A shaped row after the trailer must not be picked up.
        let text = format!("{SAMPLE}\n204  9  999999  XBRAND  1/1 LB  CS  GHOST ROW  1.00  9.00");
        let extraction = BenEKeithExtractor::default().extract_from_text(&text).unwrap();
        assert!(extraction.items.iter().all(|i| i.vendor_sku != "999999"));
    }
}
