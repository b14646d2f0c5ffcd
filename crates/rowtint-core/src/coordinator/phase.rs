//! Coordinator lifecycle states.

use tokio::time::Instant;

/// Where the coordinator is in its lifecycle.
///
/// ```text
/// Uninitialized -> Attaching -> Observing(container)
///                      ^               |
///                      +---------------+  container replaced or detached
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase<N> {
    /// Not started, or shut down.
    #[default]
    Uninitialized,
    /// Waiting for the host, or for a row container to appear.
    Attaching,
    /// Observing this container.
    Observing(N),
}

impl<N> Phase<N> {
    /// Returns the observed container.
    #[must_use]
    pub const fn container(&self) -> Option<&N> {
        match self {
            Self::Observing(container) => Some(container),
            Self::Uninitialized | Self::Attaching => None,
        }
    }

    /// Returns `true` while a container is observed.
    #[must_use]
    pub const fn is_observing(&self) -> bool {
        matches!(self, Self::Observing(_))
    }

    /// Returns `true` once started and until shut down.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}

/// Readiness polling schedule, present until the host looks ready or the
/// wait times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadinessWait {
    pub(crate) next_check: Instant,
    pub(crate) give_up_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_accessors() {
        let phase: Phase<u32> = Phase::default();
        assert!(!phase.is_started());
        assert_eq!(Phase::Observing(7).container(), Some(&7));
        assert!(Phase::<u32>::Attaching.is_started());
        assert!(!Phase::<u32>::Attaching.is_observing());
    }
}
