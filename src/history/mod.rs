//! Undo history.
//!
//! Before a reversible command commits, the previous state (with its own
//! history stripped) is pushed as a snapshot. Irreversible commands clear
//! the stack. Undo pops the newest snapshot and reattaches the remaining
//! history, so `undo(apply(s, cmd)) == s` field for field.

use std::sync::Arc;

use crate::core::{Command, CommandError, CommandKind, GameState};
use crate::effects::reveals_hidden;
use crate::phase::{Phase, Transient, TransientKind};

/// Check whether `command` may be undone once applied to `state`.
#[must_use]
pub fn is_reversible(command: &Command, state: &GameState) -> bool {
    match command {
        Command::PlayEvent { card, .. } => !reveals_hidden(*card),
        Command::ResolveEvent(_) => !state
            .phase
            .transient()
            .and_then(Transient::event)
            .is_some_and(|e| reveals_hidden(e.card)),
        other => other.kind().is_reversible(),
    }
}

/// Push `previous` onto the history carried by `next`.
pub fn record(next: &mut GameState, previous: &GameState, depth: usize) {
    if depth == 0 {
        next.history.clear();
        return;
    }
    let mut snapshot = previous.clone();
    snapshot.history.clear();
    next.history = previous.history.clone();
    next.history.push_back(Arc::new(snapshot));
    while next.history.len() > depth {
        next.history.pop_front();
    }
}

/// Restore the newest snapshot.
///
/// Not available while a cascade choice or battle outcome is pending.
pub fn undo(state: &GameState) -> Result<GameState, CommandError> {
    if let Phase::Resolving(t) = &state.phase {
        if matches!(
            t.kind(),
            TransientKind::PurificationChoice | TransientKind::Battle
        ) {
            return Err(CommandError::WrongPhase {
                command: CommandKind::Undo,
                phase: state.phase.to_string(),
            });
        }
    }
    let mut remaining = state.history.clone();
    let snapshot = remaining.pop_back().ok_or(CommandError::NothingToUndo)?;
    let mut restored = (*snapshot).clone();
    restored.history = remaining;
    Ok(restored)
}
