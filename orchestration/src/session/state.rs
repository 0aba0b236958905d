//! Lifecycle shared by steps and sessions: pending → running → completed | failed.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Valid transitions from this status. Nothing is re-entered.
    pub fn valid_transitions(self) -> &'static [Status] {
        match self {
            Self::Pending => &[Self::Running],
            Self::Running => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    /// Check `self → to`, naming `entity` in the error.
    pub fn check_transition(self, to: Status, entity: &'static str) -> Result<(), TransitionError> {
        if self.valid_transitions().contains(&to) {
            Ok(())
        } else {
            Err(TransitionError {
                entity,
                from: self,
                to,
            })
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {entity} transition {from} → {to}")]
pub struct TransitionError {
    /// "step" or "session".
    pub entity: &'static str,
    pub from: Status,
    pub to: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        assert!(Status::Pending.check_transition(Status::Running, "step").is_ok());
        assert!(Status::Running.check_transition(Status::Failed, "step").is_ok());
        assert!(Status::Pending.check_transition(Status::Completed, "step").is_err());
        assert!(Status::Running.check_transition(Status::Pending, "step").is_err());
    }

    #[test]
    fn test_terminal_has_no_exits() {
        for status in [Status::Completed, Status::Failed] {
            assert!(status.is_terminal());
            assert!(status.valid_transitions().is_empty());
        }
    }

    #[test]
    fn test_error_message() {
        let err = Status::Completed
            .check_transition(Status::Running, "session")
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid session transition completed → running");
    }
}
