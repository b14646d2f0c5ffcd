//! Names of the markers the engine writes onto rows.

use crate::config::MarkerConfig;

/// Resolved marker names.
///
/// Every attribute the engine writes starts with the configured prefix, so
/// our own writes can be recognised when they come back as mutation records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    prefix: String,
    /// Attribute holding the active rule ID.
    pub rule_id: String,
    /// Attribute holding the color that was painted.
    pub color: String,
    /// Attribute set once a row has been reconciled.
    pub processed: String,
    /// Attribute caching the last sender address found for the row.
    pub sender_cache: String,
    /// Class added to highlighted rows.
    pub highlight_class: String,
    /// Inline style property carrying the fill.
    pub style_property: String,
    /// Color painted for rules without one.
    pub fallback_color: String,
}

impl Markers {
    /// Derives marker names from configuration.
    #[must_use]
    pub fn new(config: &MarkerConfig) -> Self {
        let prefix = config.attribute_prefix.clone();
        Self {
            rule_id: format!("{prefix}-rule-id"),
            color: format!("{prefix}-color"),
            processed: format!("{prefix}-processed"),
            sender_cache: format!("{prefix}-sender"),
            prefix,
            highlight_class: config.highlight_class.clone(),
            style_property: config.style_property.clone(),
            fallback_color: config.fallback_color.clone(),
        }
    }

    /// Returns `true` if `name` is an attribute only the engine writes.
    #[must_use]
    pub fn is_own_attribute(&self, name: &str) -> bool {
        name.get(..self.prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&self.prefix))
    }

    /// Returns `true` if a class attribute change from `old` to `new` touched
    /// nothing but the highlight class.
    #[must_use]
    pub fn is_own_class_change(&self, old: Option<&str>, new: Option<&str>) -> bool {
        let old = class_tokens(old);
        let new = class_tokens(new);
        old.iter()
            .filter(|token| !new.contains(token))
            .chain(new.iter().filter(|token| !old.contains(token)))
            .all(|token| *token == self.highlight_class)
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new(&MarkerConfig::default())
    }
}

fn class_tokens(value: Option<&str>) -> Vec<&str> {
    value
        .map(|value| value.split_ascii_whitespace().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_share_prefix() {
        let markers = Markers::default();
        assert_eq!(markers.rule_id, "data-highlight-rule-id");
        assert_eq!(markers.color, "data-highlight-color");
        assert_eq!(markers.processed, "data-highlight-processed");
        assert!(markers.is_own_attribute(&markers.sender_cache));
        assert!(markers.is_own_attribute("DATA-HIGHLIGHT-COLOR"));
        assert!(!markers.is_own_attribute("class"));
        assert!(!markers.is_own_attribute("data-high"));
    }

    #[test]
    fn test_own_class_change() {
        let markers = Markers::default();
        assert!(markers.is_own_class_change(Some("zA"), Some("zA gmail-row-highlighter")));
        assert!(markers.is_own_class_change(Some("zA gmail-row-highlighter"), Some("zA")));
        assert!(markers.is_own_class_change(None, Some("gmail-row-highlighter")));
        assert!(markers.is_own_class_change(Some("zA zE"), Some("zE  zA")));
        assert!(!markers.is_own_class_change(Some("zA zE"), Some("zA")));
        assert!(!markers.is_own_class_change(
            Some("zA"),
            Some("zE gmail-row-highlighter")
        ));
    }
}
