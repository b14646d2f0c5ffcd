//! Once-per-kind reporting of degraded conditions.
//!
//! Host markup drifts; when a strategy stops working it usually stops for
//! every row at once. The first occurrence of each kind is a warning, the
//! rest are debug noise.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

/// A class of degraded, non-fatal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// No sender could be found in a rendered row.
    SenderNotFound,
    /// No subject could be found in a rendered row.
    SubjectNotFound,
    /// The sender cache could not be written back.
    SenderCacheWrite,
    /// No row container could be located.
    ContainerNotFound,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SenderNotFound => "sender not found",
            Self::SubjectNotFound => "subject not found",
            Self::SenderCacheWrite => "sender cache write failed",
            Self::ContainerNotFound => "row container not found",
        };
        f.write_str(text)
    }
}

/// Remembers which kinds have already been reported.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reported: HashSet<DiagnosticKind>,
}

impl Diagnostics {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `kind`, at warn level the first time and debug afterwards.
    ///
    /// Returns `true` if this was the first report of the kind.
    pub fn report(&mut self, kind: DiagnosticKind, detail: impl fmt::Display) -> bool {
        if self.reported.insert(kind) {
            warn!("{kind}: {detail}");
            true
        } else {
            debug!("{kind}: {detail}");
            false
        }
    }

    /// Forgets `kind` so its next occurrence warns again.
    pub fn reset(&mut self, kind: DiagnosticKind) {
        self.reported.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_once_per_kind() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.report(DiagnosticKind::SenderNotFound, "row 1"));
        assert!(!diagnostics.report(DiagnosticKind::SenderNotFound, "row 2"));
        assert!(diagnostics.report(DiagnosticKind::SubjectNotFound, "row 2"));
        assert!(!diagnostics.report(DiagnosticKind::SubjectNotFound, "row 3"));
    }

    #[test]
    fn test_reset() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(DiagnosticKind::ContainerNotFound, "");
        diagnostics.reset(DiagnosticKind::ContainerNotFound);
        assert!(diagnostics.report(DiagnosticKind::ContainerNotFound, ""));
    }
}
