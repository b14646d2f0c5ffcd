//! Rule data models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a rule, unique within one rule list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    /// Creates a rule ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which row field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Match against the sender.
    SenderContains,
    /// Match against the subject.
    SubjectContains,
    /// Match against the sender or the subject.
    SenderOrSubjectContains,
    /// Match against any label.
    LabelContains,
    /// A type this version does not know. Never matches.
    #[serde(other)]
    Unknown,
}

impl RuleKind {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SenderContains => "sender_contains",
            Self::SubjectContains => "subject_contains",
            Self::SenderOrSubjectContains => "sender_or_subject_contains",
            Self::LabelContains => "label_contains",
            Self::Unknown => "unknown",
        }
    }
}

/// A highlighting rule, as stored by the rule-management component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Stable identifier.
    pub id: RuleId,
    /// Which field the pattern applies to.
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Comma-separated sub-patterns, any of which may match.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub pattern: String,
    /// Fill color, applied verbatim. Empty means the fallback color.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub background_color: String,
    /// Disabled rules never match. Missing or `null` means enabled.
    #[serde(default = "enabled_default", deserialize_with = "deserialize_enabled")]
    pub enabled: bool,
}

const fn enabled_default() -> bool {
    true
}

/// Missing or `null` text fields decode as empty.
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

impl Rule {
    /// Creates an enabled rule.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: RuleKind,
        pattern: impl Into<String>,
        background_color: impl Into<String>,
    ) -> Self {
        Self {
            id: RuleId::new(id),
            kind,
            pattern: pattern.into(),
            background_color: background_color.into(),
            enabled: true,
        }
    }

    /// Returns the rule with `enabled` set.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the non-empty, trimmed sub-patterns.
    pub fn sub_patterns(&self) -> impl Iterator<Item = &str> {
        split_patterns(&self.pattern)
    }

    /// Returns `true` if at least one sub-pattern survives trimming.
    #[must_use]
    pub fn has_effective_pattern(&self) -> bool {
        self.sub_patterns().next().is_some()
    }

    /// Returns `true` if the rule can ever match.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.has_effective_pattern()
    }

    /// Returns the color to paint, falling back when the rule has none.
    #[must_use]
    pub fn effective_color<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.background_color.is_empty() {
            fallback
        } else {
            &self.background_color
        }
    }
}

/// Splits a pattern string on commas, trimming and dropping empty parts.
pub(crate) fn split_patterns(pattern: &str) -> impl Iterator<Item = &str> {
    pattern
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_stored_rule() {
        let rule: Rule = serde_json::from_str(
            r##"{"id":"r1","type":"sender_contains","pattern":"@acme.com","backgroundColor":"#FF0000","enabled":true}"##,
        )
        .unwrap();
        assert_eq!(rule.id, RuleId::new("r1"));
        assert_eq!(rule.kind, RuleKind::SenderContains);
        assert_eq!(rule.background_color, "#FF0000");
        assert!(rule.enabled);
    }

    #[test]
    fn test_enabled_defaults() {
        let missing: Rule =
            serde_json::from_str(r#"{"id":"a","type":"label_contains","pattern":"x"}"#).unwrap();
        assert!(missing.enabled);

        let null: Rule = serde_json::from_str(
            r#"{"id":"a","type":"label_contains","pattern":"x","enabled":null}"#,
        )
        .unwrap();
        assert!(null.enabled);

        let disabled: Rule = serde_json::from_str(
            r#"{"id":"a","type":"label_contains","pattern":"x","enabled":false}"#,
        )
        .unwrap();
        assert!(!disabled.enabled);
    }

    #[test]
    fn test_unknown_kind() {
        let rule: Rule =
            serde_json::from_str(r#"{"id":"a","type":"body_contains","pattern":"x"}"#).unwrap();
        assert_eq!(rule.kind, RuleKind::Unknown);
    }

    #[test]
    fn test_serialize_uses_stored_names() {
        let rule = Rule::new("a", RuleKind::SenderOrSubjectContains, "x", "#fff");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["type"], "sender_or_subject_contains");
        assert_eq!(json["backgroundColor"], "#fff");
        assert_eq!(json["id"], "a");
    }

    #[test]
    fn test_sub_patterns() {
        let rule = Rule::new("a", RuleKind::LabelContains, " Urgent, ,VIP ,", "");
        assert_eq!(rule.sub_patterns().collect::<Vec<_>>(), vec!["Urgent", "VIP"]);
        assert!(rule.is_active());

        let blank = Rule::new("b", RuleKind::LabelContains, " , ", "");
        assert!(!blank.has_effective_pattern());
        assert!(!blank.is_active());
    }

    #[test]
    fn test_effective_color() {
        let rule = Rule::new("a", RuleKind::LabelContains, "x", "");
        assert_eq!(rule.effective_color("#FFF7CC"), "#FFF7CC");
        let rule = Rule::new("a", RuleKind::LabelContains, "x", "#123456");
        assert_eq!(rule.effective_color("#FFF7CC"), "#123456");
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(RuleKind::LabelContains.as_str(), "label_contains");
    }
}
