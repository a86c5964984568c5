//! Record and Dataset types - schema-optional rows from the spreadsheet
//!
//! Columns are not fixed at compile time: the recognized set is a superset
//! and any row may be missing any column. Absence and empty string are the
//! same thing ("no value"), so the accessor below is the only way the rest
//! of the crate reads a field.

use std::collections::BTreeMap;

/// One source row: column name -> value. A missing key means "no value";
/// after normalization no stored value is blank.
pub type Record = BTreeMap<String, String>;

/// An ordered sequence of records, in source insertion order.
pub type Dataset = Vec<Record>;

/// Canonical column names. Upstream variants (accented, abbreviated) are
/// reconciled onto these by the normalizer via the config alias table.
pub mod columns {
    pub const PROCESS: &str = "Process";
    pub const DOCUMENT: &str = "Document";
    pub const DESCRIPTION: &str = "Description";
    pub const OBJECT: &str = "Object";
    pub const UNIT: &str = "Unit";
    pub const CODE: &str = "Code";
    pub const USER: &str = "User";
    pub const TAX_ID: &str = "TaxId";
    pub const EXECUTIVE_BRANCH: &str = "ExecutiveBranch";
    pub const BRANCHES: &str = "Branches";
    pub const TYPE: &str = "Type";
    pub const DATE: &str = "Date";
}

/// Non-missing value of a column, if any. Treats an empty stored string the
/// same as an absent key.
pub fn field<'a>(record: &'a Record, column: &str) -> Option<&'a str> {
    record
        .get(column)
        .map(|v| v.as_str())
        .filter(|v| !v.is_empty())
}

/// True if any row in the dataset carries this column at all (even blank).
/// Filters use this to tell "column unknown" apart from "value missing".
pub fn column_present(dataset: &[Record], column: &str) -> bool {
    dataset.iter().any(|row| row.contains_key(column))
}
