//! The in-memory rule list.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::matcher::find_first_match;
use super::model::Rule;
use crate::extract::RowData;

/// An ordered rule list. Order is priority: the first matching rule wins.
///
/// Disabled rules are kept so a row highlighted by a rule that has since been
/// disabled can be told apart from one whose rule was deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set from rules in priority order.
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Replaces the whole list.
    pub fn replace(&mut self, rules: Vec<Rule>) {
        self.rules = rules;
    }

    /// Returns the rules in priority order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the number of rules, enabled or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Looks up a rule by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id.as_str() == id)
    }

    /// Returns the first matching rule.
    #[must_use]
    pub fn first_match(&self, row: &RowData) -> Option<&Rule> {
        find_first_match(row, &self.rules)
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

/// Decodes a stored rule list.
///
/// A value that is not an array decodes as no rules. Entries that fail to
/// decode are skipped; the rest keep their order.
#[must_use]
pub fn parse_rules(value: &Value) -> Vec<Rule> {
    let Some(entries) = value.as_array() else {
        if !value.is_null() {
            warn!("Stored rules are not a list; treating as empty");
        }
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match Rule::deserialize(entry) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!(index, "Skipping malformed rule: {e}");
                None
            }
        })
        .collect()
}
