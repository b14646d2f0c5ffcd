//! The semantic summary of a row.

use std::collections::BTreeSet;

/// Fields extracted from one row, used only for matching.
///
/// Every field may be empty. Labels are deduplicated and trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowData {
    /// Sender email address, or the display name when no address is found.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Label names.
    pub labels: BTreeSet<String>,
}

impl RowData {
    /// Creates row data from its parts.
    #[must_use]
    pub fn new<I, S>(sender: impl Into<String>, subject: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if at least one field carries data.
    ///
    /// A row without usable data has usually not finished rendering.
    #[must_use]
    pub fn has_usable_data(&self) -> bool {
        !self.sender.is_empty() || !self.subject.is_empty() || !self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_data() {
        assert!(!RowData::default().has_usable_data());
        assert!(RowData::new("", "", ["Work"]).has_usable_data());
        assert!(RowData::new("", "Hi", std::iter::empty::<&str>()).has_usable_data());
    }

    #[test]
    fn test_labels_deduplicate() {
        let data = RowData::new("a@b.c", "", ["VIP", "Work", "VIP"]);
        assert_eq!(data.labels.len(), 2);
    }
}
