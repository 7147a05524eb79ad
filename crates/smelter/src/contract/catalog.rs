//! Field names and field groups of the product catalog layout.

use std::collections::BTreeSet;

/// Columns a catalog upload must carry.
pub const REQUIRED_COLUMNS: &[&str] = &["search_ref", "manufacturer_ref", "name", "brand"];

/// Recognized but optional columns.
pub const OPTIONAL_COLUMNS: &[&str] = &[
    "barcode",
    "ncm",
    "application",
    "net_weight",
    "gross_weight",
    "born_at",
    "deprecated_at",
    "catalog_id",
    "height",
    "width",
    "depth",
    "url_thumb",
    "notes",
    "file_high",
    "file_low",
    "file_medium",
    "file_water_mark",
    "position",
];

/// Text columns checked for casing and null-like values.
pub const STRING_CHECK_COLUMNS: &[&str] =
    &["search_ref", "application", "notes", "ncm", "name", "brand"];

/// Columns expected to hold numbers.
///
/// `ipi` is not part of the contract but is still checked when an upload
/// carries it.
pub const NUMERIC_CHECK_COLUMNS: &[&str] =
    &["gross_weight", "net_weight", "width", "depth", "height", "ipi"];

pub const BRAND: &str = "brand";
pub const BRAND_COLUMNS: &[&str] = &[BRAND];
pub const NCM_COLUMNS: &[&str] = &["ncm"];
pub const BARCODE_COLUMNS: &[&str] = &["barcode"];
pub const DIMENSION_COLUMNS: &[&str] = &["width", "height", "depth"];

pub const GROSS_WEIGHT: &str = "gross_weight";
pub const NET_WEIGHT: &str = "net_weight";
/// Checked together: gross against net.
pub const WEIGHT_COLUMNS: &[&str] = &[GROSS_WEIGHT, NET_WEIGHT];

pub const SEARCH_REF: &str = "search_ref";
pub const MANUFACTURER_REF: &str = "manufacturer_ref";
pub const CODE_REF_COLUMNS: &[&str] = &[SEARCH_REF, MANUFACTURER_REF];

/// Collect a static column list into an owned set.
pub fn column_set(columns: &[&str]) -> BTreeSet<String> {
    columns.iter().map(|c| c.to_string()).collect()
}
