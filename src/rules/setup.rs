//! Game setup: roles, decks, initial infection and starting pieces.

use tracing::info;

use super::actions::move_player;
use super::turn::begin_turn;
use crate::board::{Board, LocationId};
use crate::cards::{add_wildcards, build_player_deck, build_threat_deck};
use crate::cascade::{add_markers, CascadeStatus, Cause};
use crate::core::{CommandError, GameConfig, GameState, Player, PlayerId, Variant};
use crate::phase::Phase;
use crate::roles::Role;

/// Markers per threat card in the three rounds of initial infection.
const INITIAL_INFECTION: [u8; 9] = [3, 3, 3, 2, 2, 2, 1, 1, 1];
/// Wildcards shuffled into the threat deck by the mutation module.
const WILDCARDS: usize = 2;

/// Deal roles and cards, infect the board and start the first turn.
pub fn start_game(state: &mut GameState, board: &Board, config: &GameConfig) -> Result<(), CommandError> {
    let roles = match &config.roles {
        Some(roles) => roles.clone(),
        None => {
            let mut pool = Role::pool(config.variant).to_vec();
            state.rng.shuffle(&mut pool);
            pool.truncate(config.player_count);
            pool
        }
    };
    if roles.len() != config.player_count {
        return Err(CommandError::Internal(format!(
            "{} roles for {} players",
            roles.len(),
            config.player_count
        )));
    }

    let deck = build_player_deck(board, config, &mut state.rng);
    let start = board.starting_location;
    let players = roles
        .into_iter()
        .zip(deck.hands)
        .enumerate()
        .map(|(i, (role, hand))| {
            let mut player = Player::new(PlayerId::new(i as u8), role, start);
            player.hand = hand.into_iter().collect();
            player
        })
        .collect();
    state.player_deck = deck.draw_pile;
    state.threat_deck = build_threat_deck(board, &mut state.rng);

    // Frontier pawns enter the board only once their owners pick a start.
    if config.variant == Variant::Frontier {
        infect_board(state, board)?;
        state.players = players;
    } else {
        state.players = players;
        infect_board(state, board)?;
    }
    if config.mutation {
        add_wildcards(&mut state.threat_deck, WILDCARDS, &mut state.rng);
    }
    place_pieces(state, board);

    info!(
        variant = %config.variant,
        players = config.player_count,
        seed = config.seed,
        "game started"
    );
    state.log_message(format!("{} begins", board.name));

    if config.variant == Variant::Frontier {
        state.awaiting_start = PlayerId::all(config.player_count).collect();
        state.phase = Phase::ChoosingStartingLocation;
        Ok(())
    } else {
        begin_turn(state, PlayerId::new(0))
    }
}

fn infect_board(state: &mut GameState, board: &Board) -> Result<(), CommandError> {
    for count in INITIAL_INFECTION {
        let Some(card) = state.threat_deck.pop_back() else {
            return Err(CommandError::Internal("threat deck too small for setup".to_string()));
        };
        state.threat_discard.push_back(card);
        let Some(location) = card.location() else {
            continue;
        };
        let color = board.location(location).color;
        match add_markers(state, board, location, color, count, Cause::Setup) {
            CascadeStatus::Done => {}
            CascadeStatus::Terminal => return Ok(()),
            CascadeStatus::Suspended(_) => {
                return Err(CommandError::Internal(
                    "setup infection asked for a purification choice".to_string(),
                ))
            }
        }
    }
    Ok(())
}

fn place_pieces(state: &mut GameState, board: &Board) {
    match state.variant {
        Variant::Classic => {
            state.stations.insert(board.starting_location);
        }
        Variant::Siege => {
            let capital = board.capital.unwrap_or(board.starting_location);
            state.stations.insert(capital);
            if state.legion_supply > 0 {
                state.legion_supply -= 1;
                state.set_legions(capital, 1);
            }
        }
        Variant::Frontier => {}
    }
}

/// Record a Frontier player's starting location.
pub fn choose_starting_location(
    state: &mut GameState,
    board: &Board,
    player: PlayerId,
    location: LocationId,
) -> Result<(), CommandError> {
    if board.get(location).is_none() {
        return Err(CommandError::UnknownLocation(location));
    }
    if !state.awaiting_start.contains(&player) {
        return Err(CommandError::not_allowed(format!("{player} has already chosen")));
    }
    if state.player(player).is_none() {
        return Err(CommandError::UnknownPlayer(player));
    }
    move_player(state, board, player, location);
    state.awaiting_start.remove(&player);
    state.log_message(format!("{player} starts in {}", board.location(location).name));

    if state.awaiting_start.is_empty() {
        begin_turn(state, PlayerId::new(0))
    } else {
        Ok(())
    }
}
