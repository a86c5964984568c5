//! Aggregator - KPIs, chart distributions, and the table projection
//!
//! Everything here operates on the filtered dataset and constructs fresh
//! output; counts never depend on row order, only top-N tie-breaks do
//! (first-seen wins, stable sort).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::abbrev::derive_abbreviation;
use crate::config::DashboardConfig;
use crate::record::{column_present, columns, field, Record};

/// Scalar summary metrics. `document_count` is a row count; the others are
/// distinct non-missing value counts. An absent source column yields 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub process_count: usize,
    pub document_count: usize,
    pub unit_count: usize,
    pub user_count: usize,
}

/// One grouped-count entry of a chart dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    pub name: String,
    pub value: usize,
    /// Units: first-seen full unit name. ExecutiveBranch: full-name lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Users only: Code of the user's first-seen row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

impl DistributionEntry {
    fn plain(name: String, value: usize) -> Self {
        Self {
            name,
            value,
            full_name: None,
            sector: None,
        }
    }
}

/// The chart datasets, each sorted by value descending, ties first-seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Distributions {
    pub units: Vec<DistributionEntry>,
    pub branches: Vec<DistributionEntry>,
    pub executive_branches: Vec<DistributionEntry>,
    pub types: Vec<DistributionEntry>,
    pub users: Vec<DistributionEntry>,
}

/// Everything a dashboard query returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResult {
    pub kpis: Kpis,
    pub distributions: Distributions,
    /// Display columns actually present in the dataset, in display order.
    pub table_columns: Vec<String>,
    /// Filtered rows restricted to `table_columns`, order preserved.
    pub table_rows: Vec<Record>,
}

/// Compute the full dashboard payload from the filtered dataset.
pub fn aggregate(filtered: &[Record], config: &DashboardConfig) -> DashboardResult {
    DashboardResult {
        kpis: Kpis {
            process_count: distinct_count(filtered, columns::PROCESS),
            document_count: filtered.len(),
            unit_count: distinct_count(filtered, columns::UNIT),
            user_count: distinct_count(filtered, columns::USER),
        },
        distributions: Distributions {
            units: units_distribution(filtered, config),
            branches: count_by(filtered, columns::BRANCHES)
                .into_iter()
                .map(|(name, value)| DistributionEntry::plain(name, value))
                .collect(),
            executive_branches: executive_branch_distribution(filtered, config),
            types: count_by(filtered, columns::TYPE)
                .into_iter()
                .map(|(name, value)| DistributionEntry::plain(name, value))
                .collect(),
            users: users_distribution(filtered),
        },
        table_columns: table_columns(filtered, config),
        table_rows: table_rows(filtered, config),
    }
}

/// Sorted distinct non-missing values per configured filter field, computed
/// over the unfiltered dataset. Feeds the filter UI controls.
pub fn filter_options(
    dataset: &[Record],
    config: &DashboardConfig,
) -> BTreeMap<String, Vec<String>> {
    config
        .filter_fields
        .iter()
        .map(|(fld, column)| {
            let values: BTreeSet<String> = dataset
                .iter()
                .filter_map(|row| field(row, column))
                .map(str::to_string)
                .collect();
            (fld.clone(), values.into_iter().collect())
        })
        .collect()
}

fn distinct_count(rows: &[Record], column: &str) -> usize {
    rows.iter()
        .filter_map(|row| field(row, column))
        .collect::<HashSet<_>>()
        .len()
}

/// Group rows by a column's value and count them. Rows missing the value
/// are excluded from this distribution (not from the row count). Output is
/// sorted by count descending; the stable sort keeps first-seen order on
/// ties.
fn count_by(rows: &[Record], column: &str) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for row in rows {
        if let Some(value) = field(row, column) {
            let count = counts.entry(value).or_insert(0);
            if *count == 0 {
                order.push(value);
            }
            *count += 1;
        }
    }
    let mut entries: Vec<(String, usize)> = order
        .into_iter()
        .map(|value| (value.to_string(), counts[value]))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Unit chart: grouped by Code, falling back to an abbreviation derived
/// from the Unit name when the row has no Code. The first-seen full Unit
/// name rides along for tooltips.
fn units_distribution(rows: &[Record], config: &DashboardConfig) -> Vec<DistributionEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut full_names: HashMap<String, String> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for row in rows {
        let code = match field(row, columns::CODE) {
            Some(code) => code.to_string(),
            None => match field(row, columns::UNIT) {
                Some(unit) => derive_abbreviation(unit, config.abbreviation),
                None => continue,
            },
        };
        if code.is_empty() {
            continue;
        }
        let count = counts.entry(code.clone()).or_insert(0);
        if *count == 0 {
            order.push(code.clone());
        }
        *count += 1;
        if let Some(unit) = field(row, columns::UNIT) {
            full_names.entry(code).or_insert_with(|| unit.to_string());
        }
    }

    let mut entries: Vec<DistributionEntry> = order
        .into_iter()
        .map(|code| DistributionEntry {
            value: counts[&code],
            full_name: full_names.get(&code).cloned(),
            sector: None,
            name: code,
        })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries
}

/// ExecutiveBranch chart: grouped by code, with the configured full-name
/// lookup attached. Unknown codes pass through as their own full name.
fn executive_branch_distribution(
    rows: &[Record],
    config: &DashboardConfig,
) -> Vec<DistributionEntry> {
    count_by(rows, columns::EXECUTIVE_BRANCH)
        .into_iter()
        .map(|(code, value)| DistributionEntry {
            full_name: Some(config.executive_branch_full_name(&code).to_string()),
            sector: None,
            name: code,
            value,
        })
        .collect()
}

/// User chart: grouped by User, with the Code of each user's first-seen row
/// attached as the sector. First-seen wins; this is a tie-break, not an
/// aggregation. The sector is omitted when the Code column is absent.
fn users_distribution(rows: &[Record]) -> Vec<DistributionEntry> {
    let code_column_present = column_present(rows, columns::CODE);

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut sectors: HashMap<&str, Option<String>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for row in rows {
        if let Some(user) = field(row, columns::USER) {
            let count = counts.entry(user).or_insert(0);
            if *count == 0 {
                order.push(user);
                let sector = if code_column_present {
                    field(row, columns::CODE).map(str::to_string)
                } else {
                    None
                };
                sectors.insert(user, sector);
            }
            *count += 1;
        }
    }

    let mut entries: Vec<DistributionEntry> = order
        .into_iter()
        .map(|user| DistributionEntry {
            name: user.to_string(),
            value: counts[user],
            full_name: None,
            sector: sectors[user].clone(),
        })
        .collect();
    entries.sort_by(|a, b| b.value.cmp(&a.value));
    entries
}

fn table_columns(rows: &[Record], config: &DashboardConfig) -> Vec<String> {
    config
        .display_columns
        .iter()
        .filter(|column| column_present(rows, column))
        .cloned()
        .collect()
}

fn table_rows(rows: &[Record], config: &DashboardConfig) -> Vec<Record> {
    let columns = table_columns(rows, config);
    rows.iter()
        .map(|row| {
            columns
                .iter()
                .filter_map(|column| {
                    field(row, column).map(|value| (column.clone(), value.to_string()))
                })
                .collect()
        })
        .collect()
}
