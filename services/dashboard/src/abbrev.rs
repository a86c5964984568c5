//! Abbreviation deriver - short code from a full organizational-unit name
//!
//! Used only when the explicit code column is absent for a unit. The
//! spreadsheet's history contains two incompatible policies for names
//! without a hyphen, so both are kept as named strategies instead of being
//! merged; the hyphen-suffix rule is common to both.

use serde::Deserialize;

/// Policy for names without a hyphen. `Initials` fabricates an abbreviation
/// from word initials; `UppercaseCode` only accepts a name that already
/// looks like a short code (2-5 chars, entirely uppercase) and otherwise
/// yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbbreviationStrategy {
    #[default]
    Initials,
    UppercaseCode,
}

/// Derive a short code from a unit name. Pure; empty or all-whitespace
/// input yields empty under every strategy.
pub fn derive_abbreviation(unit_name: &str, strategy: AbbreviationStrategy) -> String {
    let name = unit_name.trim();
    if name.is_empty() {
        return String::new();
    }

    // "Municipal Secretariat - ASTEC" -> "ASTEC"
    if let Some((_, suffix)) = name.split_once('-') {
        return suffix.trim().to_string();
    }

    match strategy {
        AbbreviationStrategy::Initials => {
            let initials: String = name
                .split(' ')
                .filter(|word| word.chars().count() >= 3)
                .filter_map(|word| word.chars().find(|c| c.is_alphabetic()))
                .flat_map(|c| c.to_uppercase())
                .collect();
            if initials.is_empty() {
                name.chars().take(3).flat_map(|c| c.to_uppercase()).collect()
            } else {
                initials
            }
        }
        AbbreviationStrategy::UppercaseCode => {
            let len = name.chars().count();
            if (2..=5).contains(&len) && name == name.to_uppercase() {
                name.to_string()
            } else {
                String::new()
            }
        }
    }
}
