//! Playing and cancelling events.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::{event_spec, reveals_hidden, Shape, Timing};
use crate::board::{Board, LocationId};
use crate::cards::{EventCard, PlayerCard};
use crate::core::{
    Color, CommandError, EventTarget, GameState, Modifier, ModifierKind, PlayerId, RiskOption,
    Variant,
};
use crate::phase::{self, Phase, Transient};
use crate::rules::actions::{move_player, place_station};

/// An event card that has been played and is being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedEvent {
    pub card: EventCard,
    pub player: PlayerId,
    pub option: RiskOption,
    /// Played from the contingency slot, so removed from the game.
    pub from_contingency: bool,
}

impl PlayedEvent {
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        self.option == RiskOption::Corrupt
    }
}

/// Play an event card held by `player`.
pub fn play_event(
    state: &mut GameState,
    board: &Board,
    player: PlayerId,
    card: EventCard,
    option: RiskOption,
    target: EventTarget,
) -> Result<(), CommandError> {
    let holder = state
        .player(player)
        .ok_or(CommandError::UnknownPlayer(player))?;
    if !holder.holds_event(card) {
        return Err(CommandError::CardNotInHand(card.to_string()));
    }

    let spec = event_spec(card);
    if spec.timing == Timing::Actions && state.phase != Phase::PlayerTurn {
        return Err(CommandError::not_allowed(format!(
            "{card} can only be played during actions"
        )));
    }
    if option == RiskOption::Corrupt && !spec.risk {
        return Err(CommandError::not_allowed(format!(
            "{card} has no corrupt option"
        )));
    }

    let from_contingency = take_event(state, player, card)?;
    let event = PlayedEvent {
        card,
        player,
        option,
        from_contingency,
    };
    debug!(card = %card, player = %player, option = ?option, "event played");
    state.log_message(format!("{player} plays {card}"));

    if event.is_corrupt() {
        state.escalate(1);
        if state.is_over() {
            return Ok(());
        }
    }

    match spec.shape {
        Shape::Immediate => apply_immediate(state, board, &event, target)?,
        Shape::Interactive => open_interactive(state, board, event)?,
    }
    phase::settle_hand_limits(state)
}

/// Move the card out of the hand (to the discard pile) or out of the
/// contingency slot (out of the game). Returns true for the latter.
fn take_event(state: &mut GameState, player: PlayerId, card: EventCard) -> Result<bool, CommandError> {
    let holder = state
        .player_mut(player)
        .ok_or(CommandError::UnknownPlayer(player))?;
    if let Some(taken) = holder.take_card(&PlayerCard::Event(card)) {
        state.player_discard.push_back(taken);
        return Ok(false);
    }
    if holder.contingency == Some(card) {
        holder.contingency = None;
        state.player_removed.push_back(PlayerCard::Event(card));
        return Ok(true);
    }
    Err(CommandError::CardNotInHand(card.to_string()))
}

fn apply_immediate(
    state: &mut GameState,
    board: &Board,
    event: &PlayedEvent,
    target: EventTarget,
) -> Result<(), CommandError> {
    let wrong_target = || CommandError::not_allowed(format!("{} needs a different target", event.card));

    match (event.card, target) {
        (EventCard::Airlift, EventTarget::Move { player, to }) => {
            check_location(board, to)?;
            state.player(player).ok_or(CommandError::UnknownPlayer(player))?;
            move_player(state, board, player, to);
        }
        (EventCard::OneQuietNight, _) => state.quiet_night = true,
        (EventCard::GovernmentGrant, EventTarget::Location(location)) => {
            check_location(board, location)?;
            if state.variant == Variant::Frontier {
                return Err(CommandError::not_allowed("no stations in this variant"));
            }
            place_station(state, location)?;
        }
        (EventCard::RemoteTreatment, EventTarget::Markers { location, color }) => {
            check_location(board, location)?;
            remove_some(state, location, color, 2)?;
        }
        (EventCard::BorrowedTime, _) => state.actions_remaining += 2,
        (EventCard::CommercialTravelBan, _) => state.modifiers.push_back(Modifier {
            kind: ModifierKind::TravelBan,
            owner: event.player,
        }),
        (EventCard::Mercenaries, EventTarget::Location(location)) => {
            check_location(board, location)?;
            if !state.has_station(location) {
                return Err(CommandError::not_allowed("mercenaries must join a fort"));
            }
            let wanted = if event.is_corrupt() { 4 } else { 2 };
            let recruited = wanted.min(state.legion_supply);
            if recruited == 0 {
                return Err(CommandError::not_allowed("no legions left in the supply"));
            }
            state.legion_supply -= recruited;
            let count = state.legions_at(location) + recruited;
            state.set_legions(location, count);
        }
        (EventCard::Bribery, EventTarget::Markers { location, color }) => {
            check_location(board, location)?;
            let count = if event.is_corrupt() { u8::MAX } else { 1 };
            remove_some(state, location, color, count)?;
        }
        (EventCard::ForcedMarch, EventTarget::Move { player, to }) => {
            check_location(board, to)?;
            let from = state
                .player(player)
                .ok_or(CommandError::UnknownPlayer(player))?
                .location;
            let reach = if event.is_corrupt() { 4 } else { 2 };
            match board.distance(from, to) {
                Some(d) if d <= reach => move_player(state, board, player, to),
                _ => {
                    return Err(CommandError::not_allowed(format!(
                        "{} is more than {reach} links away",
                        board.location(to).name
                    )))
                }
            }
        }
        (EventCard::Fortification, EventTarget::Location(location)) => {
            check_location(board, location)?;
            if !event.is_corrupt() && state.players_at(location).next().is_none() {
                return Err(CommandError::not_allowed("a fort needs a player present"));
            }
            place_station(state, location)?;
            if event.is_corrupt() && state.legion_supply > 0 {
                state.legion_supply -= 1;
                let count = state.legions_at(location) + 1;
                state.set_legions(location, count);
            }
        }
        (EventCard::Quarantine, EventTarget::Region(region)) => {
            if board.region_name(region).is_none() {
                return Err(wrong_target());
            }
            state.modifiers.push_back(Modifier {
                kind: ModifierKind::Quarantine(region),
                owner: event.player,
            });
        }
        (EventCard::WaterReserves, EventTarget::Region(region)) => {
            if board.region_name(region).is_none() {
                return Err(wrong_target());
            }
            let placed = state.purification_supply.min(2);
            if placed == 0 {
                return Err(CommandError::not_allowed("no purification tokens left"));
            }
            state.purification_supply -= placed;
            state.purification[region.index()] += placed;
        }
        (EventCard::FieldHospital, EventTarget::Location(location)) => {
            check_location(board, location)?;
            if state.players_at(location).next().is_none() {
                return Err(CommandError::not_allowed("a field hospital needs a player present"));
            }
            let color = board.location(location).color;
            remove_some(state, location, color, u8::MAX)?;
        }
        _ => return Err(wrong_target()),
    }
    Ok(())
}

fn open_interactive(state: &mut GameState, board: &Board, event: PlayedEvent) -> Result<(), CommandError> {
    let corrupt = event.is_corrupt();
    let transient = match event.card {
        EventCard::ResilientPopulation => {
            if state.threat_discard.iter().all(|c| c.location().is_none()) {
                return Err(CommandError::not_allowed("the threat discard pile is empty"));
            }
            Transient::ResilientPopulation { event }
        }
        EventCard::Forecast => Transient::Forecast {
            event,
            count: state.threat_deck.len().min(6),
        },
        EventCard::NewAssignment => Transient::NewAssignment { event },
        EventCard::ReexaminedResearch => {
            if !state.player_discard.iter().any(|c| c.location().is_some()) {
                return Err(CommandError::not_allowed("no location card in the discard pile"));
            }
            Transient::ReexaminedResearch { event }
        }
        EventCard::HiddenTreasury => {
            let (revealed, take) = if corrupt { (4, 2) } else { (2, 1) };
            Transient::HiddenTreasury {
                event,
                revealed: state.player_deck.len().min(revealed),
                take,
            }
        }
        EventCard::Augury => Transient::Augury {
            event,
            count: state.threat_deck.len().min(if corrupt { 5 } else { 3 }),
        },
        EventCard::Evacuation => Transient::Evacuation {
            event,
            source: None,
        },
        EventCard::RailwayConcession => {
            if board.variant != Variant::Frontier {
                return Err(CommandError::not_allowed("no rail links in this variant"));
            }
            Transient::RailwayConcession { event, built: 0 }
        }
        other => {
            return Err(CommandError::Internal(format!(
                "{other} is not interactive"
            )))
        }
    };
    phase::enter_transient(state, transient)
}

/// Abort the event being resolved and give the card back.
///
/// Only possible for the safe option before any step has been resolved,
/// and never once face-down cards have been shown.
pub fn cancel_event(state: &mut GameState) -> Result<(), CommandError> {
    let transient = state
        .phase
        .transient()
        .ok_or_else(|| CommandError::Internal("cancel outside a transient".to_string()))?;
    let event = *transient
        .event()
        .ok_or_else(|| CommandError::not_allowed("nothing to cancel"))?;

    let progressed = matches!(
        transient,
        Transient::Evacuation { source: Some(_), .. }
    ) || matches!(transient, Transient::RailwayConcession { built, .. } if *built > 0);
    if progressed || event.is_corrupt() || reveals_hidden(event.card) {
        return Err(CommandError::not_allowed(format!(
            "{} can no longer be cancelled",
            event.card
        )));
    }

    let card = PlayerCard::Event(event.card);
    let pile = if event.from_contingency {
        &mut state.player_removed
    } else {
        &mut state.player_discard
    };
    let pos = pile
        .iter()
        .rposition(|c| *c == card)
        .ok_or_else(|| CommandError::Internal(format!("{} is not in its pile", event.card)))?;
    pile.remove(pos);

    let holder = state
        .player_mut(event.player)
        .ok_or(CommandError::UnknownPlayer(event.player))?;
    if event.from_contingency {
        holder.contingency = Some(event.card);
    } else {
        holder.hand.push_back(card);
    }
    state.log_message(format!("{} cancelled", event.card));
    phase::exit_transient(state)
}

fn check_location(board: &Board, location: LocationId) -> Result<(), CommandError> {
    board
        .get(location)
        .map(|_| ())
        .ok_or(CommandError::UnknownLocation(location))
}

fn remove_some(
    state: &mut GameState,
    location: LocationId,
    color: Color,
    count: u8,
) -> Result<(), CommandError> {
    if state.remove_markers(location, color, count) == 0 {
        return Err(CommandError::not_allowed(format!("no {color} markers there")));
    }
    state.update_eradication();
    Ok(())
}
