//! Filter engine - successive narrowing passes over a normalized dataset
//!
//! Pass order: quick search, categorical filters, exact date. Each pass
//! filters the output of the previous one; a row excluded earlier is never
//! re-examined. Row identity and order are preserved.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::config::DashboardConfig;
use crate::record::{column_present, columns, field, Dataset, Record};

/// Wire shape of a dashboard query, exactly as the HTTP layer posts it:
/// `{quickSearch?, selectedDateString?, <filterField>: [values...]}`.
/// Absent keys mean "no restriction on that axis".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    /// Case-insensitive substring matched against the searchable columns.
    pub quick_search: Option<String>,

    /// Exact normalized date, YYYY-MM-DD.
    pub selected_date_string: Option<String>,

    /// Multi-select categorical filters, keyed by filter field name.
    #[serde(flatten)]
    pub categorical: BTreeMap<String, Vec<String>>,
}

impl FilterSpec {
    fn quick_search_term(&self) -> Option<String> {
        self.quick_search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

/// Apply a filter spec to a dataset, producing the matching rows in their
/// original order. Deterministic: same inputs, byte-for-byte same output.
pub fn apply(dataset: &[Record], spec: &FilterSpec, config: &DashboardConfig) -> Dataset {
    let mut rows: Vec<&Record> = dataset.iter().collect();

    // Pass 1: quick search across the searchable column set
    if let Some(term) = spec.quick_search_term() {
        rows.retain(|row| {
            config.searchable_columns.iter().any(|column| {
                field(row, column)
                    .map(|value| value.to_lowercase().contains(&term))
                    .unwrap_or(false)
            })
        });
    }

    // Pass 2: categorical filters. A field whose target column is absent
    // from the dataset entirely is a no-op, never "exclude all". A row
    // missing the value cannot match any accepted value.
    for (fld, column) in &config.filter_fields {
        let accepted = match spec.categorical.get(fld) {
            Some(values) if !values.is_empty() => values,
            _ => continue,
        };
        if !column_present(dataset, column) {
            continue;
        }
        rows.retain(|row| {
            field(row, column)
                .map(|value| accepted.iter().any(|a| a == value))
                .unwrap_or(false)
        });
    }

    // Pass 3: exact date, string equality on the normalized form
    if let Some(date) = spec
        .selected_date_string
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        if column_present(dataset, columns::DATE) {
            rows.retain(|row| field(row, columns::DATE) == Some(date));
        }
    }

    rows.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample() -> Dataset {
        vec![
            row(&[
                (columns::PROCESS, "P1"),
                (columns::USER, "Alice"),
                (columns::CODE, "HR"),
                (columns::DATE, "2024-01-05"),
            ]),
            row(&[
                (columns::PROCESS, "P1"),
                (columns::USER, "Bob"),
                (columns::CODE, "HR"),
                (columns::DATE, "2024-01-06"),
            ]),
            row(&[
                (columns::PROCESS, "P2"),
                (columns::USER, "Alice"),
                (columns::CODE, "IT"),
            ]),
        ]
    }

    fn categorical(fld: &str, values: &[&str]) -> FilterSpec {
        let mut spec = FilterSpec::default();
        spec.categorical
            .insert(fld.to_string(), values.iter().map(|v| v.to_string()).collect());
        spec
    }

    // -------------------------------------------------------------------------
    // NO-OP AND MONOTONICITY
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_spec_is_identity() {
        let data = sample();
        let config = DashboardConfig::default();
        assert_eq!(apply(&data, &FilterSpec::default(), &config), data);
    }

    #[test]
    fn test_never_grows_the_dataset() {
        let data = sample();
        let config = DashboardConfig::default();
        let specs = vec![
            FilterSpec {
                quick_search: Some("alice".to_string()),
                ..Default::default()
            },
            categorical("code", &["HR"]),
            FilterSpec {
                selected_date_string: Some("2024-01-05".to_string()),
                ..Default::default()
            },
        ];
        for spec in specs {
            assert!(apply(&data, &spec, &config).len() <= data.len());
        }
    }

    // -------------------------------------------------------------------------
    // QUICK SEARCH
    // -------------------------------------------------------------------------

    #[test]
    fn test_quick_search_case_insensitive_any_column() {
        let data = sample();
        let config = DashboardConfig::default();
        let spec = FilterSpec {
            quick_search: Some("alice".to_string()),
            ..Default::default()
        };
        let out = apply(&data, &spec, &config);
        assert_eq!(out.len(), 2);
        assert_eq!(field(&out[0], columns::PROCESS), Some("P1"));
        assert_eq!(field(&out[1], columns::PROCESS), Some("P2"));
    }

    #[test]
    fn test_quick_search_matches_other_columns_too() {
        let data = sample();
        let config = DashboardConfig::default();
        let spec = FilterSpec {
            quick_search: Some("p2".to_string()),
            ..Default::default()
        };
        assert_eq!(apply(&data, &spec, &config).len(), 1);
    }

    #[test]
    fn test_quick_search_whitespace_only_is_no_op() {
        let data = sample();
        let config = DashboardConfig::default();
        let spec = FilterSpec {
            quick_search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(apply(&data, &spec, &config), data);
    }

    // -------------------------------------------------------------------------
    // CATEGORICAL FILTERS
    // -------------------------------------------------------------------------

    #[test]
    fn test_categorical_membership() {
        let data = sample();
        let config = DashboardConfig::default();
        let out = apply(&data, &categorical("code", &["IT"]), &config);
        assert_eq!(out.len(), 1);
        assert_eq!(field(&out[0], columns::USER), Some("Alice"));
    }

    #[test]
    fn test_categorical_multi_select() {
        let data = sample();
        let config = DashboardConfig::default();
        let out = apply(&data, &categorical("code", &["IT", "HR"]), &config);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_categorical_missing_value_excluded() {
        let mut data = sample();
        data.push(row(&[(columns::PROCESS, "P3")])); // no Code
        let config = DashboardConfig::default();
        let out = apply(&data, &categorical("code", &["HR", "IT"]), &config);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_categorical_absent_column_is_no_op() {
        let data = vec![row(&[(columns::PROCESS, "P1")])];
        let config = DashboardConfig::default();
        let out = apply(&data, &categorical("branch", &["North"]), &config);
        assert_eq!(out, data);
    }

    #[test]
    fn test_unknown_filter_field_ignored() {
        let data = sample();
        let config = DashboardConfig::default();
        let out = apply(&data, &categorical("nonexistent", &["x"]), &config);
        assert_eq!(out, data);
    }

    #[test]
    fn test_empty_accepted_set_is_no_op() {
        let data = sample();
        let config = DashboardConfig::default();
        let out = apply(&data, &categorical("code", &[]), &config);
        assert_eq!(out, data);
    }

    // -------------------------------------------------------------------------
    // EXACT DATE
    // -------------------------------------------------------------------------

    #[test]
    fn test_exact_date_string_equality() {
        let data = sample();
        let config = DashboardConfig::default();
        let spec = FilterSpec {
            selected_date_string: Some("2024-01-05".to_string()),
            ..Default::default()
        };
        let out = apply(&data, &spec, &config);
        assert_eq!(out.len(), 1);
        assert_eq!(field(&out[0], columns::USER), Some("Alice"));
    }

    #[test]
    fn test_exact_date_missing_date_never_matches() {
        let data = sample();
        let config = DashboardConfig::default();
        let spec = FilterSpec {
            selected_date_string: Some("2024-01-07".to_string()),
            ..Default::default()
        };
        // Row 3 has no Date and must not match either
        assert_eq!(apply(&data, &spec, &config).len(), 0);
    }

    // -------------------------------------------------------------------------
    // COMBINED PASSES AND DETERMINISM
    // -------------------------------------------------------------------------

    #[test]
    fn test_passes_narrow_successively() {
        let data = sample();
        let config = DashboardConfig::default();
        let mut spec = categorical("code", &["HR"]);
        spec.quick_search = Some("alice".to_string());
        let out = apply(&data, &spec, &config);
        assert_eq!(out.len(), 1);
        assert_eq!(field(&out[0], columns::USER), Some("Alice"));
        assert_eq!(field(&out[0], columns::CODE), Some("HR"));
    }

    #[test]
    fn test_apply_deterministic() {
        let data = sample();
        let config = DashboardConfig::default();
        let mut spec = categorical("user", &["Alice"]);
        spec.quick_search = Some("p".to_string());
        let first = apply(&data, &spec, &config);
        for _ in 0..10 {
            assert_eq!(apply(&data, &spec, &config), first);
        }
    }

    // -------------------------------------------------------------------------
    // WIRE FORMAT
    // -------------------------------------------------------------------------

    #[test]
    fn test_filter_spec_from_json() {
        let json = r#"{
            "quickSearch": "audit",
            "code": ["HR", "IT"],
            "selectedDateString": "2024-01-05"
        }"#;
        let spec: FilterSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.quick_search.as_deref(), Some("audit"));
        assert_eq!(spec.selected_date_string.as_deref(), Some("2024-01-05"));
        assert_eq!(
            spec.categorical.get("code"),
            Some(&vec!["HR".to_string(), "IT".to_string()])
        );
    }

    #[test]
    fn test_filter_spec_empty_body() {
        let spec: FilterSpec = serde_json::from_str("{}").unwrap();
        assert!(spec.quick_search.is_none());
        assert!(spec.selected_date_string.is_none());
        assert!(spec.categorical.is_empty());
    }
}
