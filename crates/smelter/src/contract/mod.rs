//! Column contract for catalog datasets.

mod catalog;
mod columns;

pub use catalog::{
    BARCODE_COLUMNS, BRAND, BRAND_COLUMNS, CODE_REF_COLUMNS, DIMENSION_COLUMNS, GROSS_WEIGHT,
    MANUFACTURER_REF, NCM_COLUMNS, NET_WEIGHT, NUMERIC_CHECK_COLUMNS, OPTIONAL_COLUMNS,
    REQUIRED_COLUMNS, SEARCH_REF, STRING_CHECK_COLUMNS, WEIGHT_COLUMNS, column_set,
};
pub use columns::{ColumnAnalysis, ColumnContract};
