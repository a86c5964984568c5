//! Dashboard query service - orchestrates normalize -> filter -> aggregate
//!
//! Both operations re-read the record source on every call: each query sees
//! a fully fresh snapshot and the core keeps no cache. A source failure is
//! absorbed into an empty dataset so the boundary layer always receives a
//! well-formed (if vacuous) response.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::{debug, warn};

use crate::aggregate::{aggregate, filter_options, DashboardResult};
use crate::config::DashboardConfig;
use crate::filter::{apply, FilterSpec};
use crate::normalize::normalize;
use crate::record::{Dataset, Record};

/// The raw record source, owned by the caller. The only I/O in a query
/// happens behind this trait.
pub trait RecordSource {
    fn fetch_all(&self) -> Result<Vec<Record>>;
}

/// Stateless per-query orchestration over an injected source and config.
pub struct DashboardService<S> {
    source: S,
    config: DashboardConfig,
}

impl<S: RecordSource> DashboardService<S> {
    pub fn new(source: S, config: DashboardConfig) -> Self {
        Self { source, config }
    }

    /// Distinct values per filterable column, over the unfiltered dataset.
    pub fn filter_options(&self) -> BTreeMap<String, Vec<String>> {
        let dataset = self.load();
        filter_options(&dataset, &self.config)
    }

    /// Run one dashboard query: fetch, normalize, filter, aggregate.
    pub fn dashboard(&self, spec: &FilterSpec) -> DashboardResult {
        let dataset = self.load();
        let filtered = apply(&dataset, spec, &self.config);
        debug!(
            rows = dataset.len(),
            matched = filtered.len(),
            "dashboard query"
        );
        aggregate(&filtered, &self.config)
    }

    fn load(&self) -> Dataset {
        match self.source.fetch_all() {
            Ok(raw) => normalize(raw, &self.config),
            Err(error) => {
                warn!(%error, "record source unavailable, serving empty dataset");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{columns, field};
    use anyhow::anyhow;

    struct VecSource(Vec<Record>);

    impl RecordSource for VecSource {
        fn fetch_all(&self) -> Result<Vec<Record>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn fetch_all(&self) -> Result<Vec<Record>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn row(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn raw_rows() -> Vec<Record> {
        // Raw upstream shape: aliased headers, stray whitespace, local dates
        vec![
            row(&[("Processo", "P1"), ("Usuário", " Alice "), ("Sigla", "HR"), ("Data", "05/01/2024")]),
            row(&[("Processo", "P1"), ("Usuário", "Bob"), ("Sigla", "HR"), ("Data", "06/01/2024")]),
            row(&[("Processo", "P2"), ("Usuário", "Alice"), ("Sigla", "IT")]),
        ]
    }

    fn service(rows: Vec<Record>) -> DashboardService<VecSource> {
        DashboardService::new(VecSource(rows), DashboardConfig::default())
    }

    #[test]
    fn test_dashboard_end_to_end() {
        let result = service(raw_rows()).dashboard(&FilterSpec::default());
        assert_eq!(result.kpis.process_count, 2);
        assert_eq!(result.kpis.document_count, 3);
        assert_eq!(result.kpis.user_count, 2);
        let users = &result.distributions.users;
        assert_eq!(users[0].name, "Alice");
        assert_eq!(users[0].value, 2);
        assert_eq!(users[0].sector.as_deref(), Some("HR"));
    }

    #[test]
    fn test_dashboard_categorical_scenario() {
        let mut spec = FilterSpec::default();
        spec.categorical
            .insert("code".to_string(), vec!["IT".to_string()]);
        let result = service(raw_rows()).dashboard(&spec);
        assert_eq!(result.kpis.document_count, 1);
        assert_eq!(result.table_rows.len(), 1);
        assert_eq!(field(&result.table_rows[0], columns::USER), Some("Alice"));
    }

    #[test]
    fn test_dashboard_exact_date_uses_normalized_form() {
        let mut spec = FilterSpec::default();
        spec.selected_date_string = Some("2024-01-05".to_string());
        let result = service(raw_rows()).dashboard(&spec);
        assert_eq!(result.kpis.document_count, 1);
    }

    #[test]
    fn test_source_failure_degrades_to_empty_result() {
        let svc = DashboardService::new(FailingSource, DashboardConfig::default());
        let result = svc.dashboard(&FilterSpec::default());
        assert_eq!(result.kpis.document_count, 0);
        assert_eq!(result.kpis.process_count, 0);
        assert!(result.table_rows.is_empty());
        assert!(result.distributions.users.is_empty());
    }

    #[test]
    fn test_source_failure_filter_options_empty_lists() {
        let svc = DashboardService::new(FailingSource, DashboardConfig::default());
        let options = svc.filter_options();
        assert!(options.values().all(|values| values.is_empty()));
    }

    #[test]
    fn test_filter_options_from_unfiltered_dataset() {
        let options = service(raw_rows()).filter_options();
        assert_eq!(
            options.get("code"),
            Some(&vec!["HR".to_string(), "IT".to_string()])
        );
        assert_eq!(
            options.get("user"),
            Some(&vec!["Alice".to_string(), "Bob".to_string()])
        );
    }
}
