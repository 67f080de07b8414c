//! End-to-end pipeline tests: uploaded bytes through detection, extraction,
//! matching, review, and apply.

use chrono::Utc;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::str::FromStr;

use larder_core::{
    apply_import, DraftSnapshot, DraftStore, ImportPipeline, ImportStage, InventoryItem,
    InventoryStore, InvoiceFile, JsonDraftStore, LarderConfig, MemoryStore, StaticTextExtractor,
    Vendor,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn catalog_item(id: &str, name: &str, sku: &str, on_hand: &str) -> InventoryItem {
    InventoryItem {
        id: id.to_string(),
        name: name.to_string(),
        vendor_sku: sku.to_string(),
        primary_vendor: "Sysco".to_string(),
        category: "Produce".to_string(),
        case_cost: Decimal::ZERO,
        unit_cost: Decimal::ZERO,
        on_hand: dec(on_hand),
        par: Decimal::ZERO,
        portion_size: None,
        portion_unit: None,
        location: None,
        updated_at: Utc::now(),
    }
}

const SYSCO_CSV: &str = "\
Product Description,Product #,Pack Size,Case Price,Qty Ordered,Qty Shipped
\"Lettuce\",P-100,\"2/5 LB\",10.00,5,5
\"Ghost Pepper Jam\",G-900,\"12 CT\",48.00,1,1
";

const BEK_TEXT: &str = "\
BEN E. KEITH FOODS
Invoice No: 20240815   Date: 8/15/2024
ROUTE  QTY  ITEM  BRAND  PACK  UNIT  DESCRIPTION  PRICE  AMOUNT
204  5  123456  FARML  2/5  LB  CHICKEN BREAST 6 OZ  45.20  226.00
204  2  234567  BEKB  4/1  GAL  OIL CANOLA CLEAR FRY  38.10  76.20
TOTAL QTY  7";

#[test]
fn test_csv_upload_through_apply() {
    let file = InvoiceFile::new("sysco_order.csv", SYSCO_CSV.as_bytes().to_vec());
    let pdf = StaticTextExtractor(String::new());
    let config = LarderConfig::default();
    let catalog = vec![catalog_item("i1", "Lettuce Iceberg", "P-100", "3")];

    let mut pipeline = ImportPipeline::new(&pdf, &config);
    let session = pipeline.run(&file, &catalog).unwrap();

    assert_eq!(*pipeline.stage(), ImportStage::Succeeded);
    assert_eq!(session.vendor, Vendor::Sysco);
    assert_eq!(session.summary.total_items, 2);
    // Exact SKU match at 0.98 clears the 0.95 review threshold.
    assert_eq!(session.summary.auto_matched, 1);
    assert_eq!(session.summary.new_items, 1);

    let mut store = MemoryStore::with_items(catalog);
    let batch = apply_import(&session, &mut store).unwrap();
    assert_eq!(batch.updated.len(), 1);
    assert_eq!(batch.created.len(), 1);

    let stored = store.load().unwrap();
    assert_eq!(stored.len(), 2);
    let lettuce = stored.iter().find(|i| i.id == "i1").unwrap();
    assert_eq!(lettuce.on_hand, dec("8"));
    assert_eq!(lettuce.case_cost, dec("10.00"));
    assert_eq!(lettuce.unit_cost, dec("1.00"));
}

#[test]
fn test_pdf_upload_creates_new_items() {
    let file = InvoiceFile::new("bek_invoice.pdf", vec![0]);
    let pdf = StaticTextExtractor(BEK_TEXT.to_string());
    let config = LarderConfig::default();

    let session = ImportPipeline::new(&pdf, &config).run(&file, &[]).unwrap();
    assert_eq!(session.vendor, Vendor::BenEKeith);
    assert_eq!(session.invoice_number, "20240815");
    assert_eq!(session.invoice_date, "2024-08-15");
    assert_eq!(session.summary.new_items, 2);
    assert_eq!(session.summary.portions_parsed, 1);

    let mut store = MemoryStore::default();
    let batch = apply_import(&session, &mut store).unwrap();
    assert_eq!(batch.created.len(), 2);
    assert!(batch.updated.is_empty());

    let chicken = batch
        .created
        .iter()
        .find(|i| i.vendor_sku == "123456")
        .unwrap();
    assert_eq!(chicken.on_hand, dec("5"));
    assert_eq!(chicken.portion_size, Some(dec("6")));
}

#[test]
fn test_failed_detection_sets_failed_stage() {
    let file = InvoiceFile::new("order.csv", b"Name,Price\nLettuce,1.00\n".to_vec());
    let pdf = StaticTextExtractor(String::new());
    let config = LarderConfig::default();

    let mut pipeline = ImportPipeline::new(&pdf, &config);
    assert_eq!(*pipeline.stage(), ImportStage::Idle);
    assert!(pipeline.run(&file, &[]).is_err());
    assert!(matches!(pipeline.stage(), ImportStage::Failed(_)));
}

#[test]
fn test_failed_extraction_sets_failed_stage() {
    // Detection passes (signature present) but no item row matches.
    let file = InvoiceFile::new("bek_invoice.pdf", vec![0]);
    let pdf = StaticTextExtractor("BEN E. KEITH FOODS\nno items\n".to_string());
    let config = LarderConfig::default();

    let mut pipeline = ImportPipeline::new(&pdf, &config);
    assert!(pipeline.run(&file, &[]).is_err());
    assert!(matches!(pipeline.stage(), ImportStage::Failed(_)));
}

#[test]
fn test_session_draft_roundtrip() {
    let file = InvoiceFile::new("bek_invoice.pdf", vec![0]);
    let pdf = StaticTextExtractor(BEK_TEXT.to_string());
    let config = LarderConfig::default();
    let session = ImportPipeline::new(&pdf, &config).run(&file, &[]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut drafts = JsonDraftStore::new(dir.path().join("drafts.json"), config.drafts.max_drafts);
    drafts.push(DraftSnapshot::from_session(&session)).unwrap();

    let listed = drafts.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].invoice_number, "20240815");
    assert_eq!(listed[0].results.len(), session.results.len());
    assert_eq!(listed[0].vendor, Vendor::BenEKeith);
}
