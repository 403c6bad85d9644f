//! The rules engine trait and its implementation.
//!
//! `RulesEngine::try_apply` is the command pipeline: the phase gate, the
//! undo snapshot, the handler, and observer notification. `apply` is the
//! total form; a rejected command returns the previous state with a log
//! entry appended and is otherwise silent.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{actions, setup, turn};
use crate::board::{load_board, Board, BoardSource};
use crate::core::{
    Command, CommandError, CommandKind, ConfigError, GameConfig, GameState,
};
use crate::effects;
use crate::history;
use crate::observer::{self, Observer};
use crate::phase;

/// Result of a completed game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Every win condition of the variant is satisfied.
    Victory,
    Defeat { reason: String },
}

impl GameResult {
    pub fn defeat(reason: impl Into<String>) -> Self {
        GameResult::Defeat {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_victory(&self) -> bool {
        matches!(self, GameResult::Victory)
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            GameResult::Victory => "all win conditions met",
            GameResult::Defeat { reason } => reason,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Victory => f.write_str("victory"),
            GameResult::Defeat { reason } => write!(f, "defeat ({reason})"),
        }
    }
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `try_apply` must be deterministic: the only randomness is the RNG
///   carried inside the state
/// - `legal_kinds` is the phase gate only; a listed kind may still be
///   rejected by its own preconditions
/// - `is_terminal`: Return None if the game continues
pub trait RulesEngine {
    /// Static tables for the variant being played.
    fn board(&self) -> &Board;

    fn config(&self) -> &GameConfig;

    /// Command kinds the current phase accepts.
    fn legal_kinds(&self, state: &GameState) -> Vec<CommandKind>;

    /// Apply a command, or explain why it is rejected.
    fn try_apply(&self, state: &GameState, command: &Command) -> Result<GameState, CommandError>;

    /// Check if the game is over.
    fn is_terminal(&self, state: &GameState) -> Option<GameResult>;

    // === Convenience Methods ===

    /// Apply a command; a rejected command leaves the state unchanged apart
    /// from a log entry.
    fn apply(&self, state: &GameState, command: &Command) -> GameState {
        match self.try_apply(state, command) {
            Ok(next) => next,
            Err(err) => {
                debug_assert!(
                    !matches!(err, CommandError::Internal(_)),
                    "internal error: {err}"
                );
                warn!(command = %command.kind(), phase = %state.phase, error = %err, "command rejected");
                let mut unchanged = state.clone();
                unchanged.log_message(format!("rejected {}: {err}", command.kind()));
                unchanged
            }
        }
    }

    /// Apply a sequence of commands, stopping at the first rejection.
    fn apply_all(&self, state: &GameState, commands: &[Command]) -> Result<GameState, CommandError> {
        let mut current = state.clone();
        for command in commands {
            current = self.try_apply(&current, command)?;
        }
        Ok(current)
    }
}

/// The engine for one configured game.
pub struct Engine {
    board: Arc<Board>,
    config: GameConfig,
    observer: Option<Box<dyn Observer>>,
}

impl Engine {
    /// Validate `config` and load the variant's embedded tables.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        let board = load_board(BoardSource::Embedded(config.variant))?;
        Self::with_board(config, board)
    }

    /// Use custom tables.
    pub fn with_board(config: GameConfig, board: Board) -> Result<Self, ConfigError> {
        config.validate()?;
        if board.variant != config.variant {
            return Err(ConfigError::VariantMismatch {
                board: board.variant,
                config: config.variant,
            });
        }
        Ok(Self {
            board: Arc::new(board),
            config,
            observer: None,
        })
    }

    /// Attach an observer for cues and summaries.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Shared handle to the tables.
    #[must_use]
    pub fn board_handle(&self) -> Arc<Board> {
        Arc::clone(&self.board)
    }

    /// Fresh state in the `Setup` phase.
    #[must_use]
    pub fn new_game(&self) -> GameState {
        GameState::new(&self.config, &self.board)
    }

    /// Fresh state with `StartGame` already applied.
    pub fn start(&self) -> Result<GameState, CommandError> {
        self.try_apply(&self.new_game(), &Command::StartGame)
    }

    fn dispatch(&self, state: &mut GameState, command: &Command) -> Result<(), CommandError> {
        let board = self.board.as_ref();
        match command {
            Command::StartGame => setup::start_game(state, board, &self.config),
            Command::ChooseStartingLocation { player, location } => {
                setup::choose_starting_location(state, board, *player, *location)
            }
            Command::EndActions => turn::end_actions(state),
            Command::Proceed => turn::proceed(state, board),
            Command::Discard { player, card } => turn::discard(state, *player, card),
            Command::CommitBattle => actions::commit_battle(state),
            Command::ArrangeThreatCards { order } => turn::arrange_threat_cards(state, order),
            Command::ChoosePurificationRegion { region } => {
                turn::choose_purification_region(state, board, *region)
            }
            Command::PlayEvent {
                player,
                card,
                option,
                target,
            } => effects::play_event(state, board, *player, *card, *option, *target),
            Command::ResolveEvent(choice) => effects::resolve_event(state, board, choice),
            Command::CancelEvent => effects::cancel_event(state),
            Command::Undo => Err(CommandError::Internal(
                "undo reached the dispatcher".to_string(),
            )),
            action => actions::perform(state, board, action),
        }
    }
}

impl RulesEngine for Engine {
    fn board(&self) -> &Board {
        &self.board
    }

    fn config(&self) -> &GameConfig {
        &self.config
    }

    fn legal_kinds(&self, state: &GameState) -> Vec<CommandKind> {
        CommandKind::ALL
            .iter()
            .copied()
            .filter(|&kind| phase::allows(&state.phase, kind))
            .filter(|&kind| kind != CommandKind::Undo || !state.history.is_empty())
            .collect()
    }

    fn try_apply(&self, state: &GameState, command: &Command) -> Result<GameState, CommandError> {
        let kind = command.kind();
        if !phase::allows(&state.phase, kind) {
            return Err(CommandError::WrongPhase {
                command: kind,
                phase: state.phase.to_string(),
            });
        }

        let next = if kind == CommandKind::Undo {
            let restored = history::undo(state)?;
            debug!(phase = %restored.phase, "undo");
            restored
        } else {
            let reversible = history::is_reversible(command, state);
            let mut next = state.clone();
            next.last_report.clear();
            self.dispatch(&mut next, command)?;

            if kind != CommandKind::CancelEvent {
                if reversible {
                    history::record(&mut next, state, self.config.history_depth);
                } else {
                    next.history.clear();
                }
            }
            debug!(command = %kind, phase = %next.phase, turn = next.turn, "command applied");
            next
        };

        if let Some(observer) = &self.observer {
            observer::notify(observer.as_ref(), state, &next, kind);
        }
        Ok(next)
    }

    fn is_terminal(&self, state: &GameState) -> Option<GameResult> {
        if state.is_over() {
            state.outcome.clone()
        } else {
            None
        }
    }
}
