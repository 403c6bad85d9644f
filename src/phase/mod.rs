//! Phase state machine: the phase enumeration, the legality table and the
//! return-phase stack.
//!
//! ## Steady and transient phases
//!
//! Steady phases describe where a turn is. A `Resolving(Transient)` phase
//! waits for structured input for one specific sub-flow (an interactive
//! event, a pending battle, a cascade choice, a forced discard). Each
//! transient variant carries exactly the data needed to finish it.
//!
//! Entering a transient pushes the current phase onto `return_phases`;
//! exiting pops it. Nesting is therefore safe, e.g. an interactive event
//! played while discarding returns to the discard afterwards.
//!
//! ## Key Types
//!
//! - `Phase`: The full phase enumeration
//! - `Transient`: Payload of a `Resolving` phase
//! - `TransientKind`: Fieldless discriminant used for the double-entry guard

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{LocationId, RegionId};
use crate::cards::VirulentStrain;
use crate::cascade::Continuation;
use crate::core::{Color, CommandError, CommandKind, GameState, PlayerId};
use crate::effects::PlayedEvent;

/// Where the game is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    ChoosingStartingLocation,
    PlayerTurn,
    /// Event window before drawing.
    PreDraw,
    /// Each `Proceed` draws one main-deck card.
    Drawing,
    /// Event window before the threat step.
    PreThreatStep,
    /// Each `Proceed` draws one threat card.
    ThreatStep,
    /// An escalation card was drawn; `Proceed` infects from the bottom.
    Escalation { strain: Option<VirulentStrain> },
    /// A virulent strain is revealed; `Proceed` puts it into effect.
    EscalationAnnounce { strain: VirulentStrain },
    /// Event window before intensify.
    PostEscalationWindow,
    /// `Proceed` reshuffles the threat discard on top of the threat deck.
    EscalationIntensify,
    GameOver,
    Resolving(Transient),
}

impl Phase {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Phase::Resolving(_))
    }

    /// Transient payload, if resolving.
    #[must_use]
    pub fn transient(&self) -> Option<&Transient> {
        match self {
            Phase::Resolving(t) => Some(t),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Escalation { .. } => f.write_str("Escalation"),
            Phase::EscalationAnnounce { strain } => write!(f, "EscalationAnnounce({strain:?})"),
            Phase::Resolving(t) => write!(f, "Resolving({:?})", t.kind()),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Payload of a `Resolving` phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transient {
    /// `player` is over the hand limit.
    Discarding { player: PlayerId },
    /// The active player arranges the top `count` threat cards.
    Preview { count: usize },
    /// Dice are rolled; `CommitBattle` applies them.
    Battle {
        location: LocationId,
        rolls: SmallVec<[u8; 3]>,
    },
    /// A cascade is suspended on a purification-token choice.
    PurificationChoice {
        location: LocationId,
        color: Color,
        regions: SmallVec<[RegionId; 4]>,
        continuation: Box<Continuation>,
    },
    ResilientPopulation { event: PlayedEvent },
    Forecast { event: PlayedEvent, count: usize },
    NewAssignment { event: PlayedEvent },
    ReexaminedResearch { event: PlayedEvent },
    /// The top `revealed` main-deck cards are visible; `take` may be kept.
    HiddenTreasury {
        event: PlayedEvent,
        revealed: usize,
        take: usize,
    },
    Augury { event: PlayedEvent, count: usize },
    Evacuation {
        event: PlayedEvent,
        source: Option<LocationId>,
    },
    RailwayConcession { event: PlayedEvent, built: u8 },
}

/// Fieldless discriminant of `Transient`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransientKind {
    Discarding,
    Preview,
    Battle,
    PurificationChoice,
    ResilientPopulation,
    Forecast,
    NewAssignment,
    ReexaminedResearch,
    HiddenTreasury,
    Augury,
    Evacuation,
    RailwayConcession,
}

impl Transient {
    #[must_use]
    pub fn kind(&self) -> TransientKind {
        match self {
            Transient::Discarding { .. } => TransientKind::Discarding,
            Transient::Preview { .. } => TransientKind::Preview,
            Transient::Battle { .. } => TransientKind::Battle,
            Transient::PurificationChoice { .. } => TransientKind::PurificationChoice,
            Transient::ResilientPopulation { .. } => TransientKind::ResilientPopulation,
            Transient::Forecast { .. } => TransientKind::Forecast,
            Transient::NewAssignment { .. } => TransientKind::NewAssignment,
            Transient::ReexaminedResearch { .. } => TransientKind::ReexaminedResearch,
            Transient::HiddenTreasury { .. } => TransientKind::HiddenTreasury,
            Transient::Augury { .. } => TransientKind::Augury,
            Transient::Evacuation { .. } => TransientKind::Evacuation,
            Transient::RailwayConcession { .. } => TransientKind::RailwayConcession,
        }
    }

    /// The event being resolved, for event transients.
    #[must_use]
    pub fn event(&self) -> Option<&PlayedEvent> {
        match self {
            Transient::ResilientPopulation { event }
            | Transient::Forecast { event, .. }
            | Transient::NewAssignment { event }
            | Transient::ReexaminedResearch { event }
            | Transient::HiddenTreasury { event, .. }
            | Transient::Augury { event, .. }
            | Transient::Evacuation { event, .. }
            | Transient::RailwayConcession { event, .. } => Some(event),
            Transient::Discarding { .. }
            | Transient::Preview { .. }
            | Transient::Battle { .. }
            | Transient::PurificationChoice { .. } => None,
        }
    }
}

/// Check the legality table.
///
/// This is the phase gate only; command handlers check their own
/// preconditions afterwards.
#[must_use]
pub fn allows(phase: &Phase, kind: CommandKind) -> bool {
    use CommandKind as K;

    match phase {
        Phase::Setup => kind == K::StartGame,
        Phase::ChoosingStartingLocation => matches!(kind, K::ChooseStartingLocation | K::Undo),
        Phase::PlayerTurn => {
            kind.is_action() || matches!(kind, K::EndActions | K::PlayEvent | K::Undo)
        }
        Phase::PreDraw
        | Phase::PreThreatStep
        | Phase::PostEscalationWindow
        | Phase::Escalation { .. } => matches!(kind, K::Proceed | K::PlayEvent | K::Undo),
        Phase::Drawing
        | Phase::ThreatStep
        | Phase::EscalationAnnounce { .. }
        | Phase::EscalationIntensify => matches!(kind, K::Proceed | K::Undo),
        Phase::GameOver => false,
        Phase::Resolving(t) => match t.kind() {
            TransientKind::Discarding => matches!(kind, K::Discard | K::PlayEvent | K::Undo),
            TransientKind::Preview => kind == K::ArrangeThreatCards,
            TransientKind::Battle => kind == K::CommitBattle,
            TransientKind::PurificationChoice => kind == K::ChoosePurificationRegion,
            _ => matches!(kind, K::ResolveEvent | K::CancelEvent | K::Undo),
        },
    }
}

/// Enter a transient phase, remembering the current phase.
///
/// Entering the kind that is already being resolved is a defect.
pub fn enter_transient(state: &mut GameState, transient: Transient) -> Result<(), CommandError> {
    if let Phase::Resolving(current) = &state.phase {
        if current.kind() == transient.kind() {
            debug_assert!(false, "re-entered {:?}", transient.kind());
            return Err(CommandError::Internal(format!(
                "already resolving {:?}",
                transient.kind()
            )));
        }
    }
    let previous = std::mem::replace(&mut state.phase, Phase::Resolving(transient));
    state.return_phases.push_back(previous);
    Ok(())
}

/// Leave the current transient phase and restore the phase beneath it.
///
/// A restored discard that is already satisfied is left as well, and any
/// other hand over its limit opens a new discard.
pub fn exit_transient(state: &mut GameState) -> Result<(), CommandError> {
    if !state.phase.is_transient() {
        return Err(CommandError::Internal(format!(
            "no transient to exit in {}",
            state.phase
        )));
    }
    state.phase = state
        .return_phases
        .pop_back()
        .ok_or_else(|| CommandError::Internal("return-phase stack is empty".to_string()))?;

    while let Phase::Resolving(Transient::Discarding { player }) = state.phase {
        if state.over_hand_limit(player) {
            break;
        }
        state.phase = state
            .return_phases
            .pop_back()
            .ok_or_else(|| CommandError::Internal("return-phase stack is empty".to_string()))?;
    }
    settle_hand_limits(state)
}

/// Open a discard for the first player over the hand limit, unless one is
/// already open or waiting beneath the current transient.
pub fn settle_hand_limits(state: &mut GameState) -> Result<(), CommandError> {
    if state.is_over() {
        return Ok(());
    }
    let discarding = |p: &Phase| matches!(p, Phase::Resolving(Transient::Discarding { .. }));
    if discarding(&state.phase) || state.return_phases.iter().any(discarding) {
        return Ok(());
    }
    let over = state
        .players
        .iter()
        .find(|p| state.over_hand_limit(p.id))
        .map(|p| p.id);
    if let Some(player) = over {
        enter_transient(state, Transient::Discarding { player })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_turn_allows_actions() {
        assert!(allows(&Phase::PlayerTurn, CommandKind::Drive));
        assert!(allows(&Phase::PlayerTurn, CommandKind::PlayEvent));
        assert!(!allows(&Phase::PlayerTurn, CommandKind::Proceed));
    }

    #[test]
    fn test_pending_choice_blocks_everything_else() {
        let phase = Phase::Resolving(Transient::Battle {
            location: LocationId::new(0),
            rolls: SmallVec::new(),
        });
        for kind in CommandKind::ALL {
            assert_eq!(allows(&phase, kind), kind == CommandKind::CommitBattle);
        }
    }

    #[test]
    fn test_game_over_allows_nothing() {
        assert!(CommandKind::ALL.iter().all(|&k| !allows(&Phase::GameOver, k)));
    }

    #[test]
    fn test_drawing_has_no_event_window() {
        assert!(!allows(&Phase::Drawing, CommandKind::PlayEvent));
        assert!(allows(&Phase::PreDraw, CommandKind::PlayEvent));
        assert!(allows(
            &Phase::Escalation { strain: None },
            CommandKind::PlayEvent
        ));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::PreDraw.to_string(), "PreDraw");
        let phase = Phase::Resolving(Transient::Preview { count: 3 });
        assert_eq!(phase.to_string(), "Resolving(Preview)");
    }
}
