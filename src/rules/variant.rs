//! Per-variant rules: movement graph, cure sites and win conditions.

use std::collections::VecDeque;

use crate::board::{Board, LocationId};
use crate::core::{Color, GameState, Variant};
use crate::rules::GameResult;

/// Research stations or forts, per variant.
pub const MAX_STATIONS: usize = 6;

/// Check whether the active player may drive from `from` to `to`.
///
/// Frontier players may also ride any chain of built rail links.
#[must_use]
pub fn can_drive(state: &GameState, board: &Board, from: LocationId, to: LocationId) -> bool {
    if board.location(from).is_linked(to) {
        return true;
    }
    state.variant == Variant::Frontier && rail_reachable(state, board, from, to)
}

fn rail_reachable(state: &GameState, board: &Board, from: LocationId, to: LocationId) -> bool {
    let mut seen = vec![false; board.len()];
    let mut queue = VecDeque::from([from]);
    seen[from.index()] = true;

    while let Some(at) = queue.pop_front() {
        if at == to {
            return true;
        }
        for &next in board.neighbors(at) {
            if !seen[next.index()] && state.has_rail(at, next) {
                seen[next.index()] = true;
                queue.push_back(next);
            }
        }
    }
    false
}

/// Check whether `color` may be cured at `location`.
#[must_use]
pub fn is_cure_site(state: &GameState, location: LocationId, color: Color) -> bool {
    match state.variant {
        Variant::Classic | Variant::Siege => state.has_station(location),
        Variant::Frontier => state.hospitals[color] == Some(location),
    }
}

/// Name of the variant's station structure.
#[must_use]
pub const fn station_name(variant: Variant) -> &'static str {
    match variant {
        Variant::Classic => "research station",
        Variant::Siege => "fort",
        Variant::Frontier => "hospital",
    }
}

/// End the game in victory when every win condition holds.
pub fn check_victory(state: &mut GameState) {
    let cured = Color::STANDARD.iter().all(|&c| state.is_cured(c));
    let built = match state.variant {
        Variant::Frontier => Color::STANDARD.iter().all(|&c| state.hospitals[c].is_some()),
        Variant::Classic | Variant::Siege => true,
    };
    if cured && built {
        state.end_game(GameResult::Victory);
    }
}
