//! Follow-up input for interactive events.

use im::Vector;
use smallvec::SmallVec;

use super::play::PlayedEvent;
use crate::board::Board;
use crate::cards::{is_partial_permutation, rearrange_top};
use crate::core::{rail_key, CommandError, EventChoice, GameState, PlayerId};
use crate::phase::{self, Phase, Transient};
use crate::roles::Role;
use crate::rules::actions::move_player;

/// Apply `choice` to the event transient currently being resolved.
pub fn resolve_event(
    state: &mut GameState,
    board: &Board,
    choice: &EventChoice,
) -> Result<(), CommandError> {
    let Phase::Resolving(transient) = state.phase.clone() else {
        return Err(CommandError::Internal("resolve outside a transient".to_string()));
    };

    match (transient, choice) {
        (Transient::ResilientPopulation { event }, EventChoice::Location(location)) => {
            let pos = state
                .threat_discard
                .iter()
                .position(|c| c.location() == Some(*location))
                .ok_or_else(|| CommandError::not_allowed("that card is not in the threat discard"))?;
            let card = state.threat_discard.remove(pos);
            state.threat_removed.push_back(card);
            finish(state, &event)
        }
        (Transient::Forecast { event, count }, EventChoice::Order(order)) => {
            rearrange_top(&mut state.threat_deck, count, order, false)?;
            finish(state, &event)
        }
        (Transient::Augury { event, count }, EventChoice::Order(order)) => {
            rearrange_top(&mut state.threat_deck, count, order, event.is_corrupt())?;
            finish(state, &event)
        }
        (Transient::NewAssignment { event }, EventChoice::Role { player, role }) => {
            reassign(state, board, *player, *role)?;
            finish(state, &event)
        }
        (Transient::ReexaminedResearch { event }, EventChoice::Location(location)) => {
            let pos = state
                .player_discard
                .iter()
                .position(|c| c.location() == Some(*location))
                .ok_or_else(|| CommandError::not_allowed("that card is not in the discard pile"))?;
            let card = state.player_discard.remove(pos);
            state
                .player_mut(event.player)
                .ok_or(CommandError::UnknownPlayer(event.player))?
                .hand
                .push_back(card);
            finish(state, &event)
        }
        (
            Transient::HiddenTreasury {
                event,
                revealed,
                take,
            },
            EventChoice::Cards(picks),
        ) => {
            take_revealed(state, &event, revealed, take, picks)?;
            finish(state, &event)
        }
        (Transient::Evacuation { event, source: None }, EventChoice::Location(location)) => {
            if board.get(*location).is_none() {
                return Err(CommandError::UnknownLocation(*location));
            }
            if state.players_at(*location).next().is_none() {
                return Err(CommandError::not_allowed("nobody to evacuate there"));
            }
            state.phase = Phase::Resolving(Transient::Evacuation {
                event,
                source: Some(*location),
            });
            Ok(())
        }
        (
            Transient::Evacuation {
                event,
                source: Some(source),
            },
            EventChoice::Location(to),
        ) => {
            if board.get(*to).is_none() {
                return Err(CommandError::UnknownLocation(*to));
            }
            if !board.location(source).is_linked(*to) {
                return Err(CommandError::not_allowed("evacuation must go to a neighbor"));
            }
            let evacuees: Vec<_> = state.players_at(source).map(|p| p.id).collect();
            for player in evacuees {
                move_player(state, board, player, *to);
            }
            finish(state, &event)
        }
        (Transient::RailwayConcession { event, built }, EventChoice::Rail { from, to }) => {
            if board.get(*from).is_none() || board.get(*to).is_none() {
                return Err(CommandError::not_allowed("unknown rail endpoint"));
            }
            if !board.location(*from).is_linked(*to) {
                return Err(CommandError::not_allowed("rail links join neighbors"));
            }
            if state.rails.insert(rail_key(*from, *to)).is_some() {
                return Err(CommandError::not_allowed("that rail link already exists"));
            }
            if built + 1 >= 2 {
                finish(state, &event)
            } else {
                state.phase = Phase::Resolving(Transient::RailwayConcession {
                    event,
                    built: built + 1,
                });
                Ok(())
            }
        }
        (Transient::RailwayConcession { event, .. }, EventChoice::Done) => finish(state, &event),
        (transient, _) => Err(CommandError::not_allowed(format!(
            "that choice does not fit {:?}",
            transient.kind()
        ))),
    }
}

fn finish(state: &mut GameState, event: &PlayedEvent) -> Result<(), CommandError> {
    state.log_message(format!("{} resolved", event.card));
    phase::exit_transient(state)
}

fn reassign(state: &mut GameState, board: &Board, player: PlayerId, role: Role) -> Result<(), CommandError> {
    if !role.available_in(state.variant) {
        return Err(CommandError::not_allowed(format!("{role} is not in this game")));
    }
    if state.players.iter().any(|p| p.role == role) {
        return Err(CommandError::not_allowed(format!("{role} is already taken")));
    }
    let seat = state
        .player_mut(player)
        .ok_or(CommandError::UnknownPlayer(player))?;
    seat.role = role;
    let location = seat.location;
    // Entering play with a clearing role acts like entering the location.
    move_player(state, board, player, location);
    Ok(())
}

fn take_revealed(
    state: &mut GameState,
    event: &PlayedEvent,
    revealed: usize,
    take: usize,
    picks: &SmallVec<[usize; 4]>,
) -> Result<(), CommandError> {
    if picks.len() > take || !is_partial_permutation(picks, revealed) {
        return Err(CommandError::not_allowed(format!(
            "pick at most {take} of the {revealed} revealed cards"
        )));
    }
    let len = state.player_deck.len();
    // Revealed card i sits at deck position len - 1 - i.
    let mut positions: Vec<usize> = picks.iter().map(|&i| len - 1 - i).collect();
    if positions
        .iter()
        .any(|&pos| !state.player_deck[pos].is_holdable())
    {
        return Err(CommandError::not_allowed("only location and event cards can be taken"));
    }
    positions.sort_unstable_by(|a, b| b.cmp(a));

    let mut taken = Vector::new();
    for pos in positions {
        taken.push_back(state.player_deck.remove(pos));
    }
    state
        .player_mut(event.player)
        .ok_or(CommandError::UnknownPlayer(event.player))?
        .hand
        .append(taken);
    Ok(())
}
