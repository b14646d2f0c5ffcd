//! Pattern matching of rules against extracted row fields.
//!
//! Patterns are literal, case-insensitive substrings. A pattern string holds
//! comma-separated alternatives; any one of them matching is a match.

use super::model::{Rule, RuleKind, split_patterns};
use crate::extract::RowData;

/// Returns `true` if `text` contains any sub-pattern of `pattern`.
///
/// Empty text or a pattern with no non-empty sub-pattern never matches.
#[must_use]
pub fn matches_any(text: &str, pattern: &str) -> bool {
    if text.is_empty() || pattern.is_empty() {
        return false;
    }
    let haystack = text.to_lowercase();
    split_patterns(pattern).any(|needle| haystack.contains(&needle.to_lowercase()))
}

/// Returns `true` if `rule` matches the row.
///
/// Disabled rules and rules without an effective pattern never match.
#[must_use]
pub fn rule_matches(row: &RowData, rule: &Rule) -> bool {
    if !rule.is_active() {
        return false;
    }
    let pattern = rule.pattern.as_str();
    match rule.kind {
        RuleKind::SenderContains => matches_any(&row.sender, pattern),
        RuleKind::SubjectContains => matches_any(&row.subject, pattern),
        RuleKind::SenderOrSubjectContains => {
            matches_any(&row.sender, pattern) || matches_any(&row.subject, pattern)
        }
        RuleKind::LabelContains => row.labels.iter().any(|label| matches_any(label, pattern)),
        RuleKind::Unknown => false,
    }
}

/// Returns the first rule, in list order, that matches the row.
#[must_use]
pub fn find_first_match<'r>(row: &RowData, rules: &'r [Rule]) -> Option<&'r Rule> {
    rules.iter().find(|rule| rule_matches(row, rule))
}
