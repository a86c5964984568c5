//! Dashboard core - Normalize/filter/aggregate pipeline for process records
//!
//! Responsibilities:
//! - Normalize raw spreadsheet rows (column aliases, blanks, dates)
//! - Derive unit abbreviations when no trustworthy code column exists
//! - Apply dashboard filters (quick search, categorical, exact date)
//! - Compute KPIs, chart distributions, and the table projection
//! - Orchestrate all of the above per query, re-reading the source each time
//!
//! CRITICAL: Every query is a pure function of the raw snapshot and the
//! filter spec. No caching, no shared mutable state, no I/O in this crate -
//! the record source is injected and owned by the caller.

pub mod abbrev;
pub mod aggregate;
pub mod config;
pub mod filter;
pub mod normalize;
pub mod record;
pub mod service;

pub use abbrev::{derive_abbreviation, AbbreviationStrategy};
pub use aggregate::{
    aggregate, filter_options, DashboardResult, DistributionEntry, Distributions, Kpis,
};
pub use config::DashboardConfig;
pub use filter::{apply, FilterSpec};
pub use normalize::normalize;
pub use record::{columns, field, Dataset, Record};
pub use service::{DashboardService, RecordSource};
