//! Dashboard configuration - the externally-supplied tables
//!
//! The upstream spreadsheet has drifted through several naming conventions
//! (accented vs. unaccented headers, abbreviations, Portuguese originals).
//! All of that drift lives here as data, not as conditionals: new variants
//! are a config change. The service takes one of these values at
//! construction time; there is no global state.

use serde::Deserialize;

use crate::abbrev::AbbreviationStrategy;
use crate::record::columns;

/// Configuration for the whole pipeline. Deserializable so deployments can
/// supply their own tables; `default()` matches the historical spreadsheet.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Canonical column -> historic header variants seen upstream.
    #[serde(default = "default_aliases")]
    pub aliases: Vec<(String, Vec<String>)>,

    /// Columns the quick search scans.
    #[serde(default = "default_searchable_columns")]
    pub searchable_columns: Vec<String>,

    /// Filter field name (wire name in FilterSpec) -> target column.
    #[serde(default = "default_filter_fields")]
    pub filter_fields: Vec<(String, String)>,

    /// Table projection columns, in display order.
    #[serde(default = "default_display_columns")]
    pub display_columns: Vec<String>,

    /// ExecutiveBranch code -> full display name. Codes not listed pass
    /// through as their own full name.
    #[serde(default = "default_branch_names")]
    pub executive_branch_names: Vec<(String, String)>,

    /// Policy used when a unit code must be derived from the unit name.
    #[serde(default)]
    pub abbreviation: AbbreviationStrategy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
            searchable_columns: default_searchable_columns(),
            filter_fields: default_filter_fields(),
            display_columns: default_display_columns(),
            executive_branch_names: default_branch_names(),
            abbreviation: AbbreviationStrategy::default(),
        }
    }
}

impl DashboardConfig {
    /// Full name for an ExecutiveBranch code; unknown codes pass through.
    pub fn executive_branch_full_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.executive_branch_names
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, name)| name.as_str())
            .unwrap_or(code)
    }
}

fn pairs(table: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    table
        .iter()
        .map(|(canonical, variants)| {
            (
                canonical.to_string(),
                variants.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

fn default_aliases() -> Vec<(String, Vec<String>)> {
    pairs(&[
        (columns::PROCESS, &["Processo", "Nº Processo"]),
        (columns::DOCUMENT, &["Documento", "Doc"]),
        (columns::DESCRIPTION, &["Descrição", "Descricao"]),
        (columns::OBJECT, &["Objeto"]),
        (columns::UNIT, &["Unidade", "Secretaria"]),
        (columns::CODE, &["Sigla", "Cod. Unidade"]),
        (columns::USER, &["Usuário", "Usuario"]),
        (columns::TAX_ID, &["CPF"]),
        (columns::EXECUTIVE_BRANCH, &["Poder", "Órgão", "Orgao"]),
        (columns::BRANCHES, &["Comarcas", "Filiais"]),
        (columns::TYPE, &["Tipo"]),
        (columns::DATE, &["Data", "Data Autuação", "Data Autuacao"]),
    ])
}

fn default_searchable_columns() -> Vec<String> {
    names(&[
        columns::PROCESS,
        columns::DOCUMENT,
        columns::DESCRIPTION,
        columns::OBJECT,
        columns::UNIT,
        columns::CODE,
        columns::USER,
        columns::TYPE,
    ])
}

fn default_filter_fields() -> Vec<(String, String)> {
    [
        ("unit", columns::UNIT),
        ("code", columns::CODE),
        ("user", columns::USER),
        ("branch", columns::BRANCHES),
        ("executiveBranch", columns::EXECUTIVE_BRANCH),
        ("type", columns::TYPE),
    ]
    .iter()
    .map(|(f, c)| (f.to_string(), c.to_string()))
    .collect()
}

fn default_display_columns() -> Vec<String> {
    names(&[
        columns::PROCESS,
        columns::DOCUMENT,
        columns::TYPE,
        columns::DATE,
        columns::UNIT,
        columns::CODE,
        columns::USER,
        columns::OBJECT,
        columns::DESCRIPTION,
    ])
}

fn default_branch_names() -> Vec<(String, String)> {
    [
        ("EXE", "Executive"),
        ("LEG", "Legislative"),
        ("JUD", "Judiciary"),
        ("MP", "Public Prosecution"),
        ("TCE", "Court of Accounts"),
    ]
    .iter()
    .map(|(c, n)| (c.to_string(), n.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_full_name_known() {
        let config = DashboardConfig::default();
        assert_eq!(config.executive_branch_full_name("JUD"), "Judiciary");
    }

    #[test]
    fn test_branch_full_name_unknown_passes_through() {
        let config = DashboardConfig::default();
        assert_eq!(config.executive_branch_full_name("XYZ"), "XYZ");
    }

    #[test]
    fn test_config_from_json_overrides_defaults() {
        let json = r#"{ "searchable_columns": ["Process"] }"#;
        let config: DashboardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.searchable_columns, vec!["Process".to_string()]);
        // Unspecified tables keep their defaults
        assert!(!config.aliases.is_empty());
        assert!(!config.filter_fields.is_empty());
    }
}
