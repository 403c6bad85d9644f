//! Error types.
//!
//! `CommandError` is the rejection taxonomy for commands; a rejected command
//! never mutates state. `ConfigError` covers loading tables and configuration.

use thiserror::Error;

use super::command::CommandKind;
use super::config::Variant;
use super::player::PlayerId;
use crate::board::LocationId;
use crate::roles::Role;

/// Why a command was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{command} is not allowed during {phase}")]
    WrongPhase { command: CommandKind, phase: String },

    #[error("{0}")]
    NotAllowed(String),

    #[error("unknown location: {0}")]
    UnknownLocation(LocationId),

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("card not in hand: {0}")]
    CardNotInHand(String),

    #[error("no actions remaining")]
    NoActionsRemaining,

    #[error("nothing to undo")]
    NothingToUndo,

    /// Reachable only through a defect in the engine.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CommandError {
    /// Shorthand for a failed precondition.
    pub fn not_allowed(message: impl Into<String>) -> Self {
        CommandError::NotAllowed(message.into())
    }
}

/// Errors from loading boards or configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown location: {0}")]
    UnknownLocation(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("duplicate location: {0}")]
    DuplicateLocation(String),

    #[error("location {0} links to itself")]
    SelfLink(String),

    #[error("infection rate schedule is empty")]
    EmptyRates,

    #[error("player count must be 2-4, got {0}")]
    PlayerCount(usize),

    #[error("escalation cards must be 4-6, got {0}")]
    EscalationCards(usize),

    #[error("expected {expected} roles, got {actual}")]
    RoleCount { expected: usize, actual: usize },

    #[error("role {role} is not available in the {variant} variant")]
    RoleUnavailable { role: Role, variant: Variant },

    #[error("duplicate role: {0}")]
    DuplicateRole(Role),

    #[error("board is for {board}, configuration is for {config}")]
    VariantMismatch { board: Variant, config: Variant },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_display() {
        let err = CommandError::WrongPhase {
            command: CommandKind::Drive,
            phase: "PreDraw".to_string(),
        };
        assert_eq!(err.to_string(), "Drive is not allowed during PreDraw");
        assert_eq!(
            CommandError::not_allowed("no station here").to_string(),
            "no station here"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::RoleUnavailable {
            role: Role::Engineer,
            variant: Variant::Classic,
        };
        assert_eq!(
            err.to_string(),
            "role Engineer is not available in the classic variant"
        );
    }
}
