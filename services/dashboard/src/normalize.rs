//! Normalizer - raw spreadsheet rows into the canonical dataset
//!
//! Everything downstream (filters, aggregation) assumes it only ever sees
//! normalized records: canonical column names, trimmed values, no blank
//! strings, dates as YYYY-MM-DD. Normalization never drops a row and never
//! fails; a field that cannot be made sense of becomes missing.

use chrono::{Datelike, NaiveDate};

use crate::config::DashboardConfig;
use crate::record::{columns, Dataset, Record};

/// Day-before-month upstream formats, tried in order. `%y` comes before
/// `%Y` within a separator: `%y` takes exactly two digits, so four-digit
/// years fall through to `%Y`, while `%Y` would swallow a two-digit year
/// as year 24. The canonical form is last so normalization is idempotent.
const DATE_INPUT_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%Y-%m-%d"];

/// Normalize a raw record sequence into a Dataset. Idempotent.
pub fn normalize(raw: Vec<Record>, config: &DashboardConfig) -> Dataset {
    raw.into_iter()
        .map(|record| normalize_record(record, config))
        .collect()
}

fn normalize_record(record: Record, config: &DashboardConfig) -> Record {
    // Trim headers and values; blank values become missing
    let mut row: Record = record
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_string();
            let value = value.trim().to_string();
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key, value))
            }
        })
        .collect();

    // Alias reconciliation: move a known variant onto the canonical name,
    // never overwriting a canonical column that already has data
    for (canonical, variants) in &config.aliases {
        for variant in variants {
            if row.contains_key(canonical) {
                break;
            }
            if let Some(value) = row.remove(variant) {
                row.insert(canonical.clone(), value);
            }
        }
    }

    // Date: parse day-before-month, re-emit as YYYY-MM-DD; unparsable -> missing
    if let Some(raw_date) = row.remove(columns::DATE) {
        if let Some(date) = parse_date(&raw_date) {
            row.insert(columns::DATE.to_string(), date.format("%Y-%m-%d").to_string());
        }
    }

    row
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        // A literal first-century year is always upstream garbage; better
        // missing than a corrupted canonical date
        .filter(|date| date.year() >= 100)
}
