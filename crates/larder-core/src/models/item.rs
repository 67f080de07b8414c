//! Line item and catalog entry models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::detect::Vendor;

/// Measurement family a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    Weight,
    Volume,
    Count,
    /// Free-form vendor unit with no conversion factor.
    Unknown,
}

impl fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitFamily::Weight => write!(f, "weight"),
            UnitFamily::Volume => write!(f, "volume"),
            UnitFamily::Count => write!(f, "count"),
            UnitFamily::Unknown => write!(f, "unknown"),
        }
    }
}

/// Unit of measure as it appears on vendor invoices.
///
/// OZ is the weight ounce; fluid volume is covered by GAL/QT/PT/L/ML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitType {
    #[serde(rename = "OZ")]
    Oz,
    #[serde(rename = "LB")]
    Lb,
    #[serde(rename = "G")]
    Gram,
    #[serde(rename = "KG")]
    Kg,
    #[serde(rename = "GAL")]
    Gal,
    #[serde(rename = "QT")]
    Qt,
    #[serde(rename = "PT")]
    Pt,
    #[serde(rename = "L")]
    Liter,
    #[serde(rename = "ML")]
    Ml,
    #[serde(rename = "CT")]
    Ct,
    #[serde(rename = "EA")]
    Ea,
    #[serde(rename = "DZ")]
    Dz,
    #[serde(rename = "CS")]
    Cs,
    /// Anything the vendor printed that we don't recognize.
    #[serde(untagged)]
    Other(String),
}

impl UnitType {
    /// Parse a unit token loosely (case-insensitive, trimmed).
    pub fn from_str_loose(s: &str) -> UnitType {
        match s.trim().to_uppercase().as_str() {
            "OZ" | "OZS" => UnitType::Oz,
            "LB" | "LBS" | "#" => UnitType::Lb,
            "G" | "GR" => UnitType::Gram,
            "KG" => UnitType::Kg,
            "GAL" | "GL" => UnitType::Gal,
            "QT" => UnitType::Qt,
            "PT" => UnitType::Pt,
            "L" | "LT" | "LTR" => UnitType::Liter,
            "ML" => UnitType::Ml,
            "CT" | "CNT" => UnitType::Ct,
            "EA" | "EACH" => UnitType::Ea,
            "DZ" | "DOZ" => UnitType::Dz,
            "CS" | "CASE" => UnitType::Cs,
            other => UnitType::Other(other.to_string()),
        }
    }

    /// The measurement family this unit converts within.
    pub fn family(&self) -> UnitFamily {
        match self {
            UnitType::Oz | UnitType::Lb | UnitType::Gram | UnitType::Kg => UnitFamily::Weight,
            UnitType::Gal | UnitType::Qt | UnitType::Pt | UnitType::Liter | UnitType::Ml => {
                UnitFamily::Volume
            }
            UnitType::Ct | UnitType::Ea | UnitType::Dz | UnitType::Cs => UnitFamily::Count,
            UnitType::Other(_) => UnitFamily::Unknown,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitType::Oz => write!(f, "OZ"),
            UnitType::Lb => write!(f, "LB"),
            UnitType::Gram => write!(f, "G"),
            UnitType::Kg => write!(f, "KG"),
            UnitType::Gal => write!(f, "GAL"),
            UnitType::Qt => write!(f, "QT"),
            UnitType::Pt => write!(f, "PT"),
            UnitType::Liter => write!(f, "L"),
            UnitType::Ml => write!(f, "ML"),
            UnitType::Ct => write!(f, "CT"),
            UnitType::Ea => write!(f, "EA"),
            UnitType::Dz => write!(f, "DZ"),
            UnitType::Cs => write!(f, "CS"),
            UnitType::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One parsed invoice row, produced by a format extractor and edited during
/// review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedLineItem {
    /// Product description as printed on the invoice.
    pub name: String,

    /// Vendor's item number.
    pub vendor_sku: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Product category (default "Unknown").
    pub category: String,

    /// Units per case from the pack-size string.
    pub units_per_case: Decimal,

    /// Size of each unit from the pack-size string.
    pub size_per_unit: Decimal,

    /// Unit of measure for `size_per_unit`.
    pub unit_type: UnitType,

    /// Portion size embedded in the description, if one was recognized.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portion_size: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub portion_unit: Option<UnitType>,

    /// Confidence of the portion parse (0 when none found).
    pub portion_confidence: f32,

    /// Cost of one case.
    pub case_cost: Decimal,

    /// Derived: case_cost / (units_per_case * size_per_unit); 0 when any
    /// input is non-positive. Always recomputed, never set directly.
    pub unit_cost: Decimal,

    /// Quantity ordered, rounded to 2 decimal places.
    pub quantity_ordered: Decimal,

    /// Quantity shipped, rounded to 2 decimal places.
    pub quantity_shipped: Decimal,

    /// Target on-hand level for reorder signaling.
    pub par: Decimal,

    pub on_hand: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    /// Vendor this item is sourced from.
    pub primary_vendor: String,

    /// Which vendor format produced this row.
    pub import_source: Vendor,

    pub invoice_number: String,

    pub invoice_date: String,

    pub created_at: DateTime<Utc>,
}

impl ExtractedLineItem {
    /// Create an item with centralized defaults. All optional invoice data
    /// is default-filled here rather than at call sites.
    pub fn new(name: impl Into<String>, vendor_sku: impl Into<String>, vendor: Vendor) -> Self {
        Self {
            name: name.into(),
            vendor_sku: vendor_sku.into(),
            brand: None,
            category: "Unknown".to_string(),
            units_per_case: Decimal::ONE,
            size_per_unit: Decimal::ONE,
            unit_type: UnitType::Oz,
            portion_size: None,
            portion_unit: None,
            portion_confidence: 0.0,
            case_cost: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            quantity_ordered: Decimal::ZERO,
            quantity_shipped: Decimal::ZERO,
            par: Decimal::ZERO,
            on_hand: Decimal::ZERO,
            location: None,
            area: None,
            primary_vendor: vendor.to_string(),
            import_source: vendor,
            invoice_number: String::new(),
            invoice_date: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Recompute the derived unit cost from case cost and pack size.
    ///
    /// Invariant: unit_cost = case_cost / (units_per_case * size_per_unit)
    /// when all three are positive, otherwise 0.
    pub fn recompute_unit_cost(&mut self) {
        let divisor = self.units_per_case * self.size_per_unit;
        if self.case_cost > Decimal::ZERO
            && self.units_per_case > Decimal::ZERO
            && self.size_per_unit > Decimal::ZERO
        {
            self.unit_cost = (self.case_cost / divisor).round_dp(4);
        } else {
            self.unit_cost = Decimal::ZERO;
        }
    }

    /// Set quantities, normalizing negatives to zero and rounding to 2dp.
    pub fn set_quantities(&mut self, ordered: Decimal, shipped: Decimal) {
        self.quantity_ordered = ordered.max(Decimal::ZERO).round_dp(2);
        self.quantity_shipped = shipped.max(Decimal::ZERO).round_dp(2);
    }
}

/// A catalog entry owned by the storage collaborator.
///
/// The core reads these for matching and produces superseding versions at
/// apply time; it never mutates the store directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,

    pub name: String,

    pub vendor_sku: String,

    pub primary_vendor: String,

    pub category: String,

    pub case_cost: Decimal,

    pub unit_cost: Decimal,

    pub on_hand: Decimal,

    pub par: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub portion_size: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub portion_unit: Option<UnitType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Synthesize a new catalog entry from an extracted line item.
    ///
    /// Fresh identity; on-hand starts at the shipped quantity.
    pub fn from_extracted(item: &ExtractedLineItem) -> Self {
        Self {
            id: new_item_id(&item.vendor_sku),
            name: item.name.clone(),
            vendor_sku: item.vendor_sku.clone(),
            primary_vendor: item.primary_vendor.clone(),
            category: item.category.clone(),
            case_cost: item.case_cost,
            unit_cost: item.unit_cost,
            on_hand: item.quantity_shipped,
            par: item.par,
            portion_size: item.portion_size,
            portion_unit: item.portion_unit.clone(),
            location: item.location.clone(),
            updated_at: Utc::now(),
        }
    }
}

/// Generate a fresh catalog id from the vendor SKU and current time.
fn new_item_id(sku: &str) -> String {
    let slug: String = sku
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    format!("itm-{}-{}", slug, Utc::now().timestamp_millis())
}
