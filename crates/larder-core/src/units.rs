//! Pack-size and portion-size normalization, plus strict unit conversion.
//!
//! Pack-size parsing is total: vendors print pack sizes in half a dozen
//! shapes and absence of data is default-filled, never an error. Unit
//! conversion is the opposite: it feeds cost and waste calculations, so a
//! cross-family request fails loudly instead of coercing to zero.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::UnitError;
use crate::models::item::{UnitFamily, UnitType};

lazy_static! {
    // "2/5 LB": cases-of fraction with a trailing unit. Highest priority.
    static ref PACK_FRACTION: Regex =
        Regex::new(r"^(\d+)\s*/\s*(\d+(?:\.\d+)?)\s*([A-Za-z#]+)").unwrap();

    // "24 CT": integer count with a unit.
    static ref PACK_COUNT: Regex = Regex::new(r"^(\d+)\s*([A-Za-z#]+)\s*$").unwrap();

    // "5.5 LB": single decimal quantity with a unit.
    static ref PACK_SINGLE: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)\s*([A-Za-z#]+)").unwrap();

    // Portion expressions embedded in descriptions: "1/4 LB" or "6 OZ".
    static ref PORTION_FRACTION: Regex =
        Regex::new(r"(?i)\b(\d+)\s*/\s*(\d+)\s*(OZ|LB|G|KG|GAL|QT|PT|L|ML|CT|EA)\b").unwrap();

    static ref PORTION_SIMPLE: Regex =
        Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*(OZ|LB|G|KG|GAL|QT|PT|L|ML|CT|EA)\b").unwrap();
}

/// Structured pack size: `units_per_case` units of `size_per_unit` each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackSize {
    pub units_per_case: Decimal,
    pub size_per_unit: Decimal,
    pub unit_type: UnitType,
}

impl Default for PackSize {
    fn default() -> Self {
        Self {
            units_per_case: Decimal::ONE,
            size_per_unit: Decimal::ONE,
            unit_type: UnitType::Oz,
        }
    }
}

/// Best-effort portion parse from an item description.
#[derive(Debug, Clone, PartialEq)]
pub struct PortionParse {
    pub is_valid: bool,
    pub portion_size: Option<Decimal>,
    pub portion_unit: Option<UnitType>,
    pub confidence: f32,
    pub original_text: String,
}

impl PortionParse {
    fn none(text: &str) -> Self {
        Self {
            is_valid: false,
            portion_size: None,
            portion_unit: None,
            confidence: 0.0,
            original_text: text.to_string(),
        }
    }
}

/// Parse a vendor pack-size string into a structured quantity.
///
/// Patterns are tried in priority order:
/// 1. `"<int>/<decimal> <UNIT>"` — e.g. "2/5 LB" is 2 units of 5 lb each
/// 2. `"<int> <UNIT>"` — count only, size per unit 1
/// 3. `"<decimal> <UNIT>"` — a single unit
///
/// Total function: unrecognized input falls back to `{1, 1, OZ}`.
pub fn parse_pack_size(text: &str) -> PackSize {
    let text = text.trim();

    if let Some(caps) = PACK_FRACTION.captures(text) {
        let units = Decimal::from_str(&caps[1]).unwrap_or(Decimal::ONE);
        let size = Decimal::from_str(&caps[2]).unwrap_or(Decimal::ONE);
        if units > Decimal::ZERO && size > Decimal::ZERO {
            return PackSize {
                units_per_case: units,
                size_per_unit: size,
                unit_type: UnitType::from_str_loose(&caps[3]),
            };
        }
    }

    if let Some(caps) = PACK_COUNT.captures(text) {
        // Integer-only quantity: a count of units, each of size 1.
        if let Ok(units) = Decimal::from_str(&caps[1]) {
            if units > Decimal::ZERO {
                return PackSize {
                    units_per_case: units,
                    size_per_unit: Decimal::ONE,
                    unit_type: UnitType::from_str_loose(&caps[2]),
                };
            }
        }
    }

    if let Some(caps) = PACK_SINGLE.captures(text) {
        if let Ok(size) = Decimal::from_str(&caps[1]) {
            if size > Decimal::ZERO {
                return PackSize {
                    units_per_case: Decimal::ONE,
                    size_per_unit: size,
                    unit_type: UnitType::from_str_loose(&caps[2]),
                };
            }
        }
    }

    PackSize::default()
}

/// Scan a free-text item description for an embedded portion expression,
/// distinct from the pack size (e.g. "BEEF PATTY 1/4 LB").
///
/// Best-effort heuristic, not authoritative: returns `is_valid = false` with
/// confidence 0 when nothing recognizable is found.
pub fn parse_portion_size(description: &str) -> PortionParse {
    if let Some(caps) = PORTION_FRACTION.captures(description) {
        let num = Decimal::from_str(&caps[1]).unwrap_or(Decimal::ZERO);
        let den = Decimal::from_str(&caps[2]).unwrap_or(Decimal::ZERO);
        if num > Decimal::ZERO && den > Decimal::ZERO {
            return PortionParse {
                is_valid: true,
                portion_size: Some((num / den).round_dp(4)),
                portion_unit: Some(UnitType::from_str_loose(&caps[3])),
                // Fractions are almost always deliberate portion callouts.
                confidence: 0.9,
                original_text: caps[0].to_string(),
            };
        }
    }

    if let Some(caps) = PORTION_SIMPLE.captures(description) {
        if let Ok(size) = Decimal::from_str(&caps[1]) {
            if size > Decimal::ZERO {
                return PortionParse {
                    is_valid: true,
                    portion_size: Some(size),
                    portion_unit: Some(UnitType::from_str_loose(&caps[2])),
                    // A bare "<n> <unit>" may be pack data that leaked into
                    // the description, so score it lower.
                    confidence: 0.7,
                    original_text: caps[0].to_string(),
                };
            }
        }
    }

    PortionParse::none(description)
}

/// Convert a quantity between units of the same measurement family.
///
/// Errors on cross-family requests (e.g. LB to GAL) and on free-form units
/// with no conversion factor.
pub fn convert_units(from: &UnitType, to: &UnitType, quantity: Decimal) -> Result<Decimal, UnitError> {
    if from == to {
        return Ok(quantity);
    }

    let from_family = from.family();
    let to_family = to.family();

    if from_family == UnitFamily::Unknown {
        return Err(UnitError::UnknownUnit(from.to_string()));
    }
    if to_family == UnitFamily::Unknown {
        return Err(UnitError::UnknownUnit(to.to_string()));
    }
    if from_family != to_family {
        return Err(UnitError::IncompatibleFamilies {
            from: from.to_string(),
            from_family: from_family.to_string(),
            to: to.to_string(),
            to_family: to_family.to_string(),
        });
    }

    Ok((quantity * base_factor(from) / base_factor(to)).round_dp(6))
}

/// Factor to the family base unit (grams, milliliters, or eaches).
fn base_factor(unit: &UnitType) -> Decimal {
    match unit {
        // Weight, in grams
        UnitType::Oz => Decimal::new(28_349_523_125, 9),
        UnitType::Lb => Decimal::new(45_359_237, 5),
        UnitType::Kg => Decimal::new(1000, 0),
        UnitType::Gram => Decimal::ONE,
        // Volume, in milliliters (US liquid measures)
        UnitType::Gal => Decimal::new(3_785_411_784, 6),
        UnitType::Qt => Decimal::new(946_352_946, 6),
        UnitType::Pt => Decimal::new(473_176_473, 6),
        UnitType::Liter => Decimal::new(1000, 0),
        UnitType::Ml => Decimal::ONE,
        // Count, in eaches. A case counts as one orderable unit.
        UnitType::Dz => Decimal::new(12, 0),
        UnitType::Ct | UnitType::Ea | UnitType::Cs => Decimal::ONE,
        // Callers check the family first; this arm is unreachable.
        UnitType::Other(_) => Decimal::ONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_pack_fraction() {
        let pack = parse_pack_size("2/5 LB");
        assert_eq!(pack.units_per_case, dec("2"));
        assert_eq!(pack.size_per_unit, dec("5"));
        assert_eq!(pack.unit_type, UnitType::Lb);
    }

    #[test]
    fn test_pack_fraction_decimal_size() {
        let pack = parse_pack_size("6/26.5 OZ");
        assert_eq!(pack.units_per_case, dec("6"));
        assert_eq!(pack.size_per_unit, dec("26.5"));
        assert_eq!(pack.unit_type, UnitType::Oz);
    }

    #[test]
    fn test_pack_count_only() {
        let pack = parse_pack_size("24 CT");
        assert_eq!(pack.units_per_case, dec("24"));
        assert_eq!(pack.size_per_unit, Decimal::ONE);
        assert_eq!(pack.unit_type, UnitType::Ct);
    }

    #[test]
    fn test_pack_single_decimal() {
        let pack = parse_pack_size("5.5 LB");
        assert_eq!(pack.units_per_case, Decimal::ONE);
        assert_eq!(pack.size_per_unit, dec("5.5"));
        assert_eq!(pack.unit_type, UnitType::Lb);
    }

    #[test]
    fn test_pack_fallback_never_fails() {
        for junk in ["", "   ", "VARIES", "???"] {
            let pack = parse_pack_size(junk);
            assert_eq!(pack, PackSize::default(), "input: {junk:?}");
        }
    }

    #[test]
    fn test_portion_fraction() {
        let portion = parse_portion_size("BEEF PATTY 1/4 LB FRZN");
        assert!(portion.is_valid);
        assert_eq!(portion.portion_size, Some(dec("0.25")));
        assert_eq!(portion.portion_unit, Some(UnitType::Lb));
        assert_eq!(portion.confidence, 0.9);
        assert_eq!(portion.original_text, "1/4 LB");
    }

    #[test]
    fn test_portion_simple() {
        let portion = parse_portion_size("CHICKEN BREAST 6 OZ IQF");
        assert!(portion.is_valid);
        assert_eq!(portion.portion_size, Some(dec("6")));
        assert_eq!(portion.portion_unit, Some(UnitType::Oz));
        assert_eq!(portion.confidence, 0.7);
    }

    #[test]
    fn test_portion_absent() {
        let portion = parse_portion_size("MIXED GREENS SPRING");
        assert!(!portion.is_valid);
        assert_eq!(portion.confidence, 0.0);
        assert_eq!(portion.portion_size, None);
    }

    #[test]
    fn test_convert_within_weight() {
        assert_eq!(
            convert_units(&UnitType::Lb, &UnitType::Oz, dec("2")).unwrap(),
            dec("32")
        );
        assert_eq!(
            convert_units(&UnitType::Oz, &UnitType::Lb, dec("16")).unwrap(),
            dec("1")
        );
    }

    #[test]
    fn test_convert_within_volume() {
        assert_eq!(
            convert_units(&UnitType::Gal, &UnitType::Qt, dec("1")).unwrap(),
            dec("4")
        );
    }

    #[test]
    fn test_convert_within_count() {
        assert_eq!(
            convert_units(&UnitType::Dz, &UnitType::Ea, dec("3")).unwrap(),
            dec("36")
        );
    }

    #[test]
    fn test_convert_identity() {
        assert_eq!(
            convert_units(&UnitType::Lb, &UnitType::Lb, dec("7.5")).unwrap(),
            dec("7.5")
        );
    }

    #[test]
    fn test_convert_cross_family_fails_loudly() {
        let err = convert_units(&UnitType::Lb, &UnitType::Gal, dec("1")).unwrap_err();
        assert!(matches!(err, UnitError::IncompatibleFamilies { .. }));
    }

    #[test]
    fn test_convert_unknown_unit_fails() {
        let sleeve = UnitType::Other("SLEEVE".into());
        let err = convert_units(&sleeve, &UnitType::Ea, dec("1")).unwrap_err();
        assert!(matches!(err, UnitError::UnknownUnit(_)));
    }
}
