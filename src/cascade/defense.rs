//! Placement defenses, checked in priority order.
//!
//! Blocking defenses cancel a whole placement. Consumable defenses
//! (legions, purification tokens) absorb markers one for one and are
//! handled by the cascade engine itself.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::{Board, LocationId, RegionId};
use crate::core::{Color, CureStatus, GameState};

/// What stopped (or partly stopped) a placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseKind {
    /// A quarantined region borders the location.
    RegionalImmunity,
    /// A player who nullifies nearby placement is on or next to the location.
    Nullified,
    /// A player who clears cured colors stands on the location.
    CuredColorCleared,
    Eradicated,
    /// Legions at the location absorbed markers.
    Legions,
    /// Purification tokens of a bordering region absorbed markers.
    Purification(RegionId),
}

/// First blocking defense that applies, in priority order.
#[must_use]
pub fn blocking_defense(
    state: &GameState,
    board: &Board,
    location: LocationId,
    color: Color,
) -> Option<DefenseKind> {
    let target = board.location(location);

    if target.regions.iter().any(|&r| state.is_quarantined(r)) {
        return Some(DefenseKind::RegionalImmunity);
    }

    let nullified = state.players.iter().any(|p| {
        p.role.capabilities().nullifies_nearby
            && (p.location == location || target.is_linked(p.location))
    });
    if nullified {
        return Some(DefenseKind::Nullified);
    }

    if state.is_cured(color)
        && state
            .players_at(location)
            .any(|p| p.role.capabilities().clears_cured_on_entry)
    {
        return Some(DefenseKind::CuredColorCleared);
    }

    if state.cures[color] == CureStatus::Eradicated {
        return Some(DefenseKind::Eradicated);
    }

    None
}

/// Bordering regions that still hold purification tokens.
#[must_use]
pub fn eligible_regions(
    state: &GameState,
    board: &Board,
    location: LocationId,
) -> SmallVec<[RegionId; 4]> {
    board
        .location(location)
        .regions
        .iter()
        .copied()
        .filter(|&r| state.tokens_in(r) > 0)
        .collect()
}
