/// Engine lifecycle phases
///
/// This module defines the phases a crawl engine moves through and which moves are legal.
use std::fmt;

/// Represents the current phase of a crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    /// Engine is constructed but the loop has not started
    Idle,

    /// The dequeue/fetch/record loop is executing
    Running,

    // ===== Terminal States =====
    /// Frontier drained; every reachable item has been processed
    Completed,

    /// An unrecoverable error stopped the loop
    Failed,
}

impl EnginePhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if this phase may move to `next`
    ///
    /// `Idle -> Failed` covers errors raised before the first dequeue.
    pub fn can_transition_to(&self, next: EnginePhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Returns the lowercase name used in logs and notifications
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible phases
    pub fn all_phases() -> Vec<Self> {
        vec![Self::Idle, Self::Running, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!EnginePhase::Idle.is_terminal());
        assert!(!EnginePhase::Running.is_terminal());

        assert!(EnginePhase::Completed.is_terminal());
        assert!(EnginePhase::Failed.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(EnginePhase::Idle.can_transition_to(EnginePhase::Running));
        assert!(EnginePhase::Idle.can_transition_to(EnginePhase::Failed));
        assert!(EnginePhase::Running.can_transition_to(EnginePhase::Completed));
        assert!(EnginePhase::Running.can_transition_to(EnginePhase::Failed));
    }

    #[test]
    fn test_terminal_phases_are_final() {
        for terminal in [EnginePhase::Completed, EnginePhase::Failed] {
            for next in EnginePhase::all_phases() {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} should not move to {}",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_no_skipping_running() {
        assert!(!EnginePhase::Idle.can_transition_to(EnginePhase::Completed));
        assert!(!EnginePhase::Running.can_transition_to(EnginePhase::Idle));
        assert!(!EnginePhase::Running.can_transition_to(EnginePhase::Running));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EnginePhase::Idle), "idle");
        assert_eq!(format!("{}", EnginePhase::Completed), "completed");
        assert_eq!(format!("{}", EnginePhase::Failed), "failed");
    }
}
