//! Sysco CSV invoice extractor.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, warn};

use super::{finish, today_iso, Extraction, Result, VendorExtractor};
use crate::detect::{InvoiceFile, Vendor};
use crate::models::item::ExtractedLineItem;
use crate::pdf::PdfTextExtractor;
use crate::units::{parse_pack_size, parse_portion_size};

/// Row-wise CSV extractor for the Sysco export dialect. Quoted fields
/// containing commas are handled by the reader, not by hand.
#[derive(Debug, Default)]
pub struct SyscoCsvExtractor;

/// Named columns of the Sysco dialect. Description and product number are
/// required (detection already checked them); the rest are optional.
struct Columns {
    description: usize,
    product_number: usize,
    pack_size: Option<usize>,
    case_price: Option<usize>,
    qty_ordered: Option<usize>,
    qty_shipped: Option<usize>,
    brand: Option<usize>,
    category: Option<usize>,
    invoice_number: Option<usize>,
    invoice_date: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Some(Self {
            description: find("Product Description")?,
            product_number: find("Product #")?,
            pack_size: find("Pack Size"),
            case_price: find("Case Price"),
            qty_ordered: find("Qty Ordered"),
            qty_shipped: find("Qty Shipped"),
            brand: find("Brand"),
            category: find("Category"),
            invoice_number: find("Invoice #"),
            invoice_date: find("Invoice Date"),
        })
    }
}

impl VendorExtractor for SyscoCsvExtractor {
    fn vendor(&self) -> Vendor {
        Vendor::Sysco
    }

    fn extract(&self, file: &InvoiceFile, _pdf: &dyn PdfTextExtractor) -> Result<Extraction> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(file.bytes.as_slice());

        let headers = reader.headers()?.clone();
        let columns = Columns::from_headers(&headers).ok_or_else(|| {
            crate::error::ExtractError::NoItems(
                "CSV is missing the Product Description / Product # columns".to_string(),
            )
        })?;
        let header_len = headers.len();

        let mut items = Vec::new();
        let mut invoice_number = String::new();
        let mut invoice_date = String::new();

        for record in reader.records() {
            let record = record?;

            // Rows with fewer populated columns than the header are partial
            // exports (subtotal lines, trailing blanks); skip them.
            if record.len() < header_len {
                warn!("skipping row with {} of {} columns", record.len(), header_len);
                continue;
            }

            let Some(item) = parse_row(&record, &columns) else {
                continue;
            };

            // Invoice metadata rides along on each row in this dialect;
            // first populated value wins.
            if invoice_number.is_empty() {
                if let Some(idx) = columns.invoice_number {
                    invoice_number = record.get(idx).unwrap_or_default().trim().to_string();
                }
            }
            if invoice_date.is_empty() {
                if let Some(idx) = columns.invoice_date {
                    invoice_date = record.get(idx).unwrap_or_default().trim().to_string();
                }
            }

            items.push(item);
        }

        debug!("parsed {} items from {}", items.len(), file.name);

        if invoice_number.is_empty() {
            invoice_number = "UNKNOWN".to_string();
        }
        if invoice_date.is_empty() {
            invoice_date = today_iso();
        }

        finish(
            items,
            invoice_number,
            invoice_date,
            "no parsable line items in the CSV",
        )
    }
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Option<ExtractedLineItem> {
    let get = |idx: usize| record.get(idx).unwrap_or_default().trim();
    let get_opt = |idx: Option<usize>| idx.map(get).filter(|s| !s.is_empty());

    let name = get(columns.description);
    let sku = get(columns.product_number);
    if name.is_empty() || sku.is_empty() {
        return None;
    }

    let mut item = ExtractedLineItem::new(name, sku, Vendor::Sysco);

    if let Some(pack_text) = get_opt(columns.pack_size) {
        let pack = parse_pack_size(pack_text);
        item.units_per_case = pack.units_per_case;
        item.size_per_unit = pack.size_per_unit;
        item.unit_type = pack.unit_type;
    }

    if let Some(brand) = get_opt(columns.brand) {
        item.brand = Some(brand.to_string());
    }
    if let Some(category) = get_opt(columns.category) {
        item.category = category.to_string();
    }

    item.case_cost = get_opt(columns.case_price)
        .and_then(parse_currency)
        .unwrap_or(Decimal::ZERO);

    let ordered = get_opt(columns.qty_ordered)
        .and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO);
    let shipped = get_opt(columns.qty_shipped)
        .and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO);
    item.set_quantities(ordered, shipped);

    let portion = parse_portion_size(name);
    if portion.is_valid {
        item.portion_size = portion.portion_size;
        item.portion_unit = portion.portion_unit;
        item.portion_confidence = portion.confidence;
    }

    item.recompute_unit_cost();
    Some(item)
}

/// Parse a currency cell, tolerating "$" and thousands separators.
fn parse_currency(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    Decimal::from_str(&cleaned).ok()
}
