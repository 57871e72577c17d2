//! Error types for the settlement simulation.

use thiserror::Error;

use crate::jobs::JobKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors surfaced by a [`crate::session::Session`].
///
/// Corrupt saves never surface here: loading falls back to defaults instead.
#[derive(Debug, Error)]
pub enum GameError {
    /// A player action was refused; the state is unchanged.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The backing store could not be read or written.
    #[error("Storage I/O failed: {0}")]
    Storage(#[from] std::io::Error),

    /// The state could not be encoded for saving.
    #[error("Failed to serialize game state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reasons a player action was refused.
///
/// A refused action never mutates state. Callers that only care about
/// success can treat any `Err` as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The job slot for this kind of action is already occupied.
    #[error("{0} queue is busy")]
    QueueBusy(JobKind),

    /// The resource pool cannot cover the cost.
    #[error("Insufficient resources")]
    InsufficientResources,

    /// Not enough troops to launch a raid.
    #[error("Insufficient troops: need {required}, have {available}")]
    InsufficientTroops {
        /// Troops the action needs.
        required: u32,
        /// Troops currently available.
        available: u32,
    },

    /// No building exists at the requested index.
    #[error("No building at index {0}")]
    BuildingNotFound(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        assert_eq!(
            ActionError::QueueBusy(JobKind::Construction).to_string(),
            "construction queue is busy"
        );
        assert_eq!(
            ActionError::InsufficientResources.to_string(),
            "Insufficient resources"
        );
        assert_eq!(
            ActionError::InsufficientTroops {
                required: 5,
                available: 2
            }
            .to_string(),
            "Insufficient troops: need 5, have 2"
        );
        assert_eq!(
            ActionError::BuildingNotFound(3).to_string(),
            "No building at index 3"
        );
    }

    #[test]
    fn test_game_error_wraps_action() {
        let err: GameError = ActionError::InsufficientResources.into();
        assert!(matches!(
            err,
            GameError::Action(ActionError::InsufficientResources)
        ));
        assert_eq!(err.to_string(), "Insufficient resources");
    }
}
