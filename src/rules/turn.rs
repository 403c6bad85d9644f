//! Turn flow: draws, escalations, threat steps, discards and turn advance.
//!
//! `Proceed` performs exactly one automatic step of the current phase. A
//! cascade that suspends on a purification choice parks its continuation
//! in `Transient::PurificationChoice`; the choice resumes the cascade and
//! then finishes the step it was serving.

use smallvec::SmallVec;
use tracing::debug;

use crate::board::{Board, LocationId, RegionId};
use crate::cards::{intensify, rearrange_top, MutationCard, PlayerCard, ThreatCard, VirulentStrain};
use crate::cascade::{add_markers, resume_with_region, Cause, CascadeStatus, Continuation, ResumeTarget};
use crate::core::{Color, CommandError, GameState, PlayerId};
use crate::phase::{self, Phase, Transient};
use crate::rules::GameResult;

/// Main-deck cards drawn per turn.
const DRAWS_PER_TURN: u8 = 2;
/// Markers placed by an escalation infection.
const ESCALATION_MARKERS: u8 = 3;
/// Threat cards an Analyst previews.
const PREVIEW_CARDS: usize = 3;
/// Markers an unacceptable loss removes from the game.
const LOST_MARKERS: u8 = 4;

/// Give up the remaining actions.
pub fn end_actions(state: &mut GameState) -> Result<(), CommandError> {
    state.actions_remaining = 0;
    state.phase = Phase::PreDraw;
    Ok(())
}

/// Perform one automatic step.
pub fn proceed(state: &mut GameState, board: &Board) -> Result<(), CommandError> {
    match state.phase.clone() {
        Phase::PreDraw => {
            state.draws_remaining = DRAWS_PER_TURN;
            state.phase = Phase::Drawing;
            Ok(())
        }
        Phase::Drawing => draw_player_card(state, board),
        Phase::Escalation { strain } => escalation_infect(state, board, strain),
        Phase::EscalationAnnounce { strain } => {
            announce_strain(state, strain);
            state.phase = Phase::PostEscalationWindow;
            Ok(())
        }
        Phase::PostEscalationWindow => {
            state.phase = Phase::EscalationIntensify;
            Ok(())
        }
        Phase::EscalationIntensify => {
            intensify(&mut state.threat_deck, &mut state.threat_discard, &mut state.rng);
            after_draw(state)
        }
        Phase::PreThreatStep => {
            if state.quiet_night {
                state.quiet_night = false;
                state.log_message("a quiet night: no threat step");
                return advance_turn(state);
            }
            state.threats_remaining = if state.travel_ban() {
                1
            } else {
                board.infection_rate(state.escalations_drawn)
            };
            state.phase = Phase::ThreatStep;
            Ok(())
        }
        Phase::ThreatStep => draw_threat_card(state, board),
        other => Err(CommandError::Internal(format!("nothing to proceed in {other}"))),
    }
}

// ============================================================================
// Main deck
// ============================================================================

fn draw_player_card(state: &mut GameState, board: &Board) -> Result<(), CommandError> {
    let Some(card) = state.player_deck.pop_back() else {
        state.end_game(GameResult::defeat("the player deck ran out"));
        return Ok(());
    };
    state.draws_remaining = state.draws_remaining.saturating_sub(1);
    debug!(card = %card, "player card drawn");

    match card {
        PlayerCard::Escalation => {
            state.player_discard.push_back(card);
            state.escalations_drawn += 1;
            state.phase = Phase::Escalation { strain: None };
            Ok(())
        }
        PlayerCard::Virulent(strain) => {
            state.player_discard.push_back(card);
            state.escalations_drawn += 1;
            state.phase = Phase::Escalation {
                strain: Some(strain),
            };
            Ok(())
        }
        PlayerCard::Mutation(mutation) => {
            state.player_removed.push_back(card);
            mutate_from_bottom(state, board, mutation.markers(), ResumeTarget::MutationDraw)
        }
        PlayerCard::Location { .. } | PlayerCard::Event(_) => {
            let active = state.active;
            state
                .player_mut(active)
                .ok_or(CommandError::UnknownPlayer(active))?
                .hand
                .push_back(card);
            after_draw(state)
        }
    }
}

/// Continue drawing, or move on to the threat step.
fn after_draw(state: &mut GameState) -> Result<(), CommandError> {
    state.phase = if state.draws_remaining > 0 {
        Phase::Drawing
    } else {
        Phase::PreThreatStep
    };
    phase::settle_hand_limits(state)
}

fn escalation_infect(
    state: &mut GameState,
    board: &Board,
    strain: Option<VirulentStrain>,
) -> Result<(), CommandError> {
    let target = ResumeTarget::EscalationInfect { strain };
    let Some((location, color)) = take_bottom_location(state) else {
        return finish_step(state, target);
    };
    state.log_message(format!("escalation in {}", board.location(location).name));
    let status = add_markers(state, board, location, color, ESCALATION_MARKERS, Cause::Infection);
    handle_cascade(state, status, target)
}

/// Draw the bottom location card of the threat deck into the discard.
/// Wildcards on the way are discarded unresolved.
fn take_bottom_location(state: &mut GameState) -> Option<(LocationId, Color)> {
    while let Some(card) = state.threat_deck.pop_front() {
        state.threat_discard.push_back(card);
        if let ThreatCard::Location { location, color } = card {
            return Some((location, color));
        }
    }
    None
}

fn announce_strain(state: &mut GameState, strain: VirulentStrain) {
    let color = match state.virulent_color {
        Some(color) => color,
        None => {
            let color = Color::STANDARD
                .iter()
                .copied()
                .max_by_key(|&c| (state.on_board(c), std::cmp::Reverse(c.index())))
                .unwrap_or(Color::Blue);
            state.virulent_color = Some(color);
            color
        }
    };
    state.strains.push_back(strain);
    state.log_message(format!("{color} turns virulent: {strain:?}"));

    if strain == VirulentStrain::UnacceptableLoss {
        let lost = state.supply[color].min(LOST_MARKERS);
        state.supply[color] -= lost;
        state.removed_markers[color] += lost;
    }
}

// ============================================================================
// Threat deck
// ============================================================================

fn draw_threat_card(state: &mut GameState, board: &Board) -> Result<(), CommandError> {
    let Some(card) = state.threat_deck.pop_back() else {
        state.threats_remaining = 0;
        return finish_step(state, ResumeTarget::ThreatDraw);
    };
    state.threats_remaining = state.threats_remaining.saturating_sub(1);
    state.threat_discard.push_back(card);

    match card {
        ThreatCard::Location { location, color } => {
            let status = add_markers(state, board, location, color, 1, Cause::Infection);
            handle_cascade(state, status, ResumeTarget::ThreatDraw)
        }
        ThreatCard::Mutation => mutate_from_bottom(
            state,
            board,
            MutationCard::MutationThreatens.markers(),
            ResumeTarget::Wildcard,
        ),
    }
}

/// Place purple markers at the location of the bottom threat card, which
/// stays where it is.
fn mutate_from_bottom(
    state: &mut GameState,
    board: &Board,
    count: u8,
    target: ResumeTarget,
) -> Result<(), CommandError> {
    let bottom = state.threat_deck.iter().find_map(ThreatCard::location);
    let Some(location) = bottom else {
        return finish_step(state, target);
    };
    state.log_message(format!("mutation in {}", board.location(location).name));
    let status = add_markers(state, board, location, Color::Purple, count, Cause::Mutation);
    handle_cascade(state, status, target)
}

// ============================================================================
// Cascades
// ============================================================================

fn handle_cascade(
    state: &mut GameState,
    status: CascadeStatus,
    target: ResumeTarget,
) -> Result<(), CommandError> {
    match status {
        CascadeStatus::Done => finish_step(state, target),
        CascadeStatus::Terminal => Ok(()),
        CascadeStatus::Suspended(suspension) => {
            debug!(location = %suspension.location, "cascade waiting for a region");
            phase::enter_transient(
                state,
                Transient::PurificationChoice {
                    location: suspension.location,
                    color: suspension.color,
                    regions: suspension.regions,
                    continuation: Box::new(Continuation {
                        cascade: suspension.cascade,
                        resume: target,
                    }),
                },
            )
        }
    }
}

/// Finish the step a completed cascade was serving.
fn finish_step(state: &mut GameState, target: ResumeTarget) -> Result<(), CommandError> {
    if state.is_over() {
        return Ok(());
    }
    match target {
        ResumeTarget::ThreatDraw | ResumeTarget::Wildcard => {
            if state.threats_remaining > 0 {
                state.phase = Phase::ThreatStep;
                Ok(())
            } else {
                advance_turn(state)
            }
        }
        ResumeTarget::EscalationInfect { strain } => {
            state.phase = match strain {
                Some(strain) => Phase::EscalationAnnounce { strain },
                None => Phase::PostEscalationWindow,
            };
            Ok(())
        }
        ResumeTarget::MutationDraw => after_draw(state),
    }
}

/// Resume a suspended cascade with the chosen region.
pub fn choose_purification_region(
    state: &mut GameState,
    board: &Board,
    region: RegionId,
) -> Result<(), CommandError> {
    let Phase::Resolving(Transient::PurificationChoice { continuation, .. }) = state.phase.clone()
    else {
        return Err(CommandError::Internal("no purification choice pending".to_string()));
    };
    let Continuation { cascade, resume } = *continuation;

    match resume_with_region(state, board, cascade, region)? {
        CascadeStatus::Done => {
            phase::exit_transient(state)?;
            finish_step(state, resume)
        }
        CascadeStatus::Terminal => Ok(()),
        CascadeStatus::Suspended(suspension) => {
            state.phase = Phase::Resolving(Transient::PurificationChoice {
                location: suspension.location,
                color: suspension.color,
                regions: suspension.regions,
                continuation: Box::new(Continuation {
                    cascade: suspension.cascade,
                    resume,
                }),
            });
            Ok(())
        }
    }
}

// ============================================================================
// Turn boundaries
// ============================================================================

/// Hand the turn to the next player.
pub fn advance_turn(state: &mut GameState) -> Result<(), CommandError> {
    let count = state.player_count().max(1);
    let next = PlayerId::new(((state.active.index() + 1) % count) as u8);
    begin_turn(state, next)
}

/// Start `player`'s turn.
///
/// Modifiers owned by `player` expire here. An Analyst opens the threat
/// preview before acting.
pub fn begin_turn(state: &mut GameState, player: PlayerId) -> Result<(), CommandError> {
    let caps = state
        .capabilities(player)
        .ok_or(CommandError::UnknownPlayer(player))?;

    state.active = player;
    state.turn += 1;
    state.flags = Default::default();
    state.draws_remaining = 0;
    state.threats_remaining = 0;
    state.modifiers.retain(|m| m.owner != player);
    state.actions_remaining = caps.action_budget;
    state.phase = Phase::PlayerTurn;
    state.return_phases.clear();
    state.log_message(format!("turn {}: {player}", state.turn));
    debug!(turn = state.turn, player = %player, "turn started");

    if caps.previews_threats {
        let count = state.threat_deck.len().min(PREVIEW_CARDS);
        if count > 1 {
            phase::enter_transient(state, Transient::Preview { count })?;
        }
    }
    Ok(())
}

/// Reorder the previewed threat cards.
pub fn arrange_threat_cards(state: &mut GameState, order: &SmallVec<[usize; 6]>) -> Result<(), CommandError> {
    let Phase::Resolving(Transient::Preview { count }) = state.phase else {
        return Err(CommandError::Internal("no preview pending".to_string()));
    };
    rearrange_top(&mut state.threat_deck, count, order, false)?;
    phase::exit_transient(state)
}

/// Discard a card from a hand over the limit.
pub fn discard(state: &mut GameState, player: PlayerId, card: &PlayerCard) -> Result<(), CommandError> {
    let Phase::Resolving(Transient::Discarding { player: owing }) = state.phase else {
        return Err(CommandError::Internal("no discard pending".to_string()));
    };
    if owing != player {
        return Err(CommandError::not_allowed(format!("{owing} must discard first")));
    }
    let taken = state
        .player_mut(player)
        .ok_or(CommandError::UnknownPlayer(player))?
        .take_card(card)
        .ok_or_else(|| CommandError::CardNotInHand(card.to_string()))?;
    state.player_discard.push_back(taken);

    if state.over_hand_limit(player) {
        Ok(())
    } else {
        phase::exit_transient(state)
    }
}
