//! Action commands of the active player.
//!
//! Every action costs one action. Spending the last one moves the turn to
//! `PreDraw`. An action that opens a transient (a battle) does so after
//! the cost is paid, so the transient returns to the right phase.

use smallvec::SmallVec;
use tracing::debug;

use super::variant::{self, MAX_STATIONS};
use crate::board::{Board, LocationId, RegionId};
use crate::cards::{EventCard, PlayerCard, VirulentStrain};
use crate::core::{rail_key, Color, Command, CommandError, CureStatus, GameState, PlayerId, Variant};
use crate::phase::{self, Phase, Transient};

/// Legions recruited per action.
const RECRUITS: u8 = 3;
/// Tokens placed by one purification.
const PURIFICATION_TOKENS: u8 = 2;
/// Samples that stand in for two cure cards.
const SAMPLES_PER_CURE: u8 = 3;

/// Perform an action for the active player.
pub fn perform(state: &mut GameState, board: &Board, command: &Command) -> Result<(), CommandError> {
    if state.actions_remaining == 0 {
        return Err(CommandError::NoActionsRemaining);
    }
    let actor = state.active;

    let opened = match command {
        Command::Drive { to } => drive(state, board, actor, *to).map(|()| None),
        Command::DirectFlight { to } => direct_flight(state, board, actor, *to).map(|()| None),
        Command::CharterFlight { to } => charter_flight(state, board, actor, *to).map(|()| None),
        Command::ShuttleFlight { to } => shuttle_flight(state, board, actor, *to).map(|()| None),
        Command::BuildResearchStation => build_station(state, actor, Variant::Classic).map(|()| None),
        Command::BuildFort => build_station(state, actor, Variant::Siege).map(|()| None),
        Command::BuildHospital => build_hospital(state, board, actor).map(|()| None),
        Command::BuildRail { to } => build_rail(state, board, actor, *to).map(|()| None),
        Command::PurifyWater { region } => purify_water(state, board, actor, *region).map(|()| None),
        Command::Treat { color } => treat(state, actor, *color).map(|()| None),
        Command::ShareKnowledge { with, card, give } => {
            share_knowledge(state, actor, *with, *card, *give).map(|()| None)
        }
        Command::DiscoverCure { color } => discover_cure(state, actor, *color).map(|()| None),
        Command::RecruitLegions => recruit_legions(state, actor).map(|()| None),
        Command::Battle => battle(state, actor).map(Some),
        Command::RetrieveEvent { card } => retrieve_event(state, actor, *card).map(|()| None),
        other => {
            return Err(CommandError::Internal(format!(
                "{} is not an action",
                other.kind()
            )))
        }
    }?;

    state.actions_remaining -= 1;
    debug!(command = %command.kind(), player = %actor, left = state.actions_remaining, "action performed");
    if state.is_over() {
        return Ok(());
    }
    if state.actions_remaining == 0 && state.phase == Phase::PlayerTurn {
        state.phase = Phase::PreDraw;
    }
    if let Some(transient) = opened {
        phase::enter_transient(state, transient)?;
    }
    phase::settle_hand_limits(state)
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Move a player, applying clearing abilities on entry.
pub fn move_player(state: &mut GameState, board: &Board, player: PlayerId, to: LocationId) {
    let Some(mover) = state.player_mut(player) else {
        return;
    };
    mover.location = to;
    let clears = mover.role.capabilities().clears_cured_on_entry;
    debug!(player = %player, to = %board.location(to).name, "moved");
    if clears {
        clear_cured_at(state, to);
    }
}

/// Build a research station or fort, respecting the station cap.
pub fn place_station(state: &mut GameState, location: LocationId) -> Result<(), CommandError> {
    let name = variant::station_name(state.variant);
    if state.has_station(location) {
        return Err(CommandError::not_allowed(format!("a {name} already stands there")));
    }
    if state.stations.len() >= MAX_STATIONS {
        return Err(CommandError::not_allowed(format!("all {MAX_STATIONS} {name}s are built")));
    }
    state.stations.insert(location);
    Ok(())
}

fn clear_cured_at(state: &mut GameState, location: LocationId) {
    for color in Color::ALL {
        if state.is_cured(color) {
            state.remove_markers(location, color, u8::MAX);
        }
    }
    state.update_eradication();
}

fn require_variant(state: &GameState, variants: &[Variant], what: &str) -> Result<(), CommandError> {
    if variants.contains(&state.variant) {
        Ok(())
    } else {
        Err(CommandError::not_allowed(format!(
            "no {what} in {}",
            state.variant
        )))
    }
}

fn check_location(board: &Board, location: LocationId) -> Result<(), CommandError> {
    board
        .get(location)
        .map(|_| ())
        .ok_or(CommandError::UnknownLocation(location))
}

fn location_of(state: &GameState, player: PlayerId) -> Result<LocationId, CommandError> {
    state
        .player(player)
        .map(|p| p.location)
        .ok_or(CommandError::UnknownPlayer(player))
}

/// Move the location card for `location` from a hand to the discard pile.
fn discard_location_card(
    state: &mut GameState,
    board: &Board,
    player: PlayerId,
    location: LocationId,
) -> Result<(), CommandError> {
    let card = state
        .player_mut(player)
        .ok_or(CommandError::UnknownPlayer(player))?
        .take_location_card(location)
        .ok_or_else(|| CommandError::CardNotInHand(board.location(location).name.clone()))?;
    state.player_discard.push_back(card);
    Ok(())
}

// ============================================================================
// Movement
// ============================================================================

fn drive(state: &mut GameState, board: &Board, actor: PlayerId, to: LocationId) -> Result<(), CommandError> {
    check_location(board, to)?;
    let from = location_of(state, actor)?;
    if from == to || !variant::can_drive(state, board, from, to) {
        return Err(CommandError::not_allowed(format!(
            "cannot drive from {} to {}",
            board.location(from).name,
            board.location(to).name
        )));
    }
    move_player(state, board, actor, to);
    Ok(())
}

fn direct_flight(
    state: &mut GameState,
    board: &Board,
    actor: PlayerId,
    to: LocationId,
) -> Result<(), CommandError> {
    require_variant(state, &[Variant::Classic], "flights")?;
    check_location(board, to)?;
    if location_of(state, actor)? == to {
        return Err(CommandError::not_allowed("already there"));
    }
    discard_location_card(state, board, actor, to)?;
    move_player(state, board, actor, to);
    Ok(())
}

fn charter_flight(
    state: &mut GameState,
    board: &Board,
    actor: PlayerId,
    to: LocationId,
) -> Result<(), CommandError> {
    require_variant(state, &[Variant::Classic], "flights")?;
    check_location(board, to)?;
    let from = location_of(state, actor)?;
    if from == to {
        return Err(CommandError::not_allowed("already there"));
    }
    discard_location_card(state, board, actor, from)?;
    move_player(state, board, actor, to);
    Ok(())
}

fn shuttle_flight(
    state: &mut GameState,
    board: &Board,
    actor: PlayerId,
    to: LocationId,
) -> Result<(), CommandError> {
    require_variant(state, &[Variant::Classic], "flights")?;
    check_location(board, to)?;
    let from = location_of(state, actor)?;
    if from == to || !state.has_station(from) || !state.has_station(to) {
        return Err(CommandError::not_allowed("shuttle flights join two research stations"));
    }
    move_player(state, board, actor, to);
    Ok(())
}

// ============================================================================
// Structures
// ============================================================================

fn build_station(state: &mut GameState, actor: PlayerId, variant: Variant) -> Result<(), CommandError> {
    require_variant(state, &[variant], variant::station_name(variant))?;
    let location = location_of(state, actor)?;
    if state.has_station(location) {
        return Err(CommandError::not_allowed(format!(
            "a {} already stands there",
            variant::station_name(variant)
        )));
    }

    let free = state
        .capabilities(actor)
        .is_some_and(|c| c.builds_without_card);
    if !free {
        let holder = state.player_mut(actor).ok_or(CommandError::UnknownPlayer(actor))?;
        let card = holder
            .take_location_card(location)
            .ok_or_else(|| CommandError::CardNotInHand(format!("location {location}")))?;
        state.player_discard.push_back(card);
    }
    place_station(state, location)
}

fn build_hospital(state: &mut GameState, board: &Board, actor: PlayerId) -> Result<(), CommandError> {
    require_variant(state, &[Variant::Frontier], "hospitals")?;
    let location = location_of(state, actor)?;
    let color = board.location(location).color;
    if state.hospitals[color].is_some() {
        return Err(CommandError::not_allowed(format!("the {color} hospital is already built")));
    }
    discard_location_card(state, board, actor, location)?;
    state.hospitals[color] = Some(location);
    state.log_message(format!("{color} hospital built in {}", board.location(location).name));
    variant::check_victory(state);
    Ok(())
}

fn build_rail(state: &mut GameState, board: &Board, actor: PlayerId, to: LocationId) -> Result<(), CommandError> {
    require_variant(state, &[Variant::Frontier], "rail links")?;
    check_location(board, to)?;
    let from = location_of(state, actor)?;
    if !board.location(from).is_linked(to) {
        return Err(CommandError::not_allowed("rail links join neighbors"));
    }
    if state.has_rail(from, to) {
        return Err(CommandError::not_allowed("that rail link already exists"));
    }
    let free = state.capabilities(actor).is_some_and(|c| c.lays_rail_free);
    if !free {
        discard_location_card(state, board, actor, from)?;
    }
    state.rails.insert(rail_key(from, to));
    Ok(())
}

fn purify_water(
    state: &mut GameState,
    board: &Board,
    actor: PlayerId,
    region: RegionId,
) -> Result<(), CommandError> {
    require_variant(state, &[Variant::Frontier], "purification")?;
    let location = location_of(state, actor)?;
    if !board.location(location).borders(region) {
        return Err(CommandError::not_allowed(format!(
            "{} does not border that region",
            board.location(location).name
        )));
    }
    if state.purification_supply == 0 {
        return Err(CommandError::not_allowed("no purification tokens left"));
    }
    discard_location_card(state, board, actor, location)?;
    let placed = state.purification_supply.min(PURIFICATION_TOKENS);
    state.purification_supply -= placed;
    state.purification[region.index()] += placed;
    Ok(())
}

// ============================================================================
// Treatment and cures
// ============================================================================

fn treat(state: &mut GameState, actor: PlayerId, color: Color) -> Result<(), CommandError> {
    let location = location_of(state, actor)?;
    if state.markers_at(location, color) == 0 {
        return Err(CommandError::not_allowed(format!("no {color} markers here")));
    }
    let caps = state
        .capabilities(actor)
        .ok_or(CommandError::UnknownPlayer(actor))?;
    let count = if caps.treats_all || state.is_cured(color) {
        u8::MAX
    } else {
        1
    };
    let removed = state.remove_markers(location, color, count);

    // One treated marker per turn may be kept as a sample.
    if caps.collects_samples && !state.flags.sample_taken && removed > 0 && color != Color::Purple {
        state.supply[color] -= 1;
        if let Some(player) = state.player_mut(actor) {
            player.samples[color] += 1;
        }
        state.flags.sample_taken = true;
    }
    state.update_eradication();
    Ok(())
}

fn share_knowledge(
    state: &mut GameState,
    actor: PlayerId,
    with: PlayerId,
    card: LocationId,
    give: bool,
) -> Result<(), CommandError> {
    if actor == with {
        return Err(CommandError::not_allowed("cannot share with yourself"));
    }
    let here = location_of(state, actor)?;
    if location_of(state, with)? != here {
        return Err(CommandError::not_allowed("both players must share a location"));
    }
    let (giver, receiver) = if give { (actor, with) } else { (with, actor) };
    let any_card = state
        .capabilities(giver)
        .is_some_and(|c| c.gives_any_card);
    if card != here && !any_card {
        return Err(CommandError::not_allowed("only the card of the shared location can change hands"));
    }

    let taken = state
        .player_mut(giver)
        .ok_or(CommandError::UnknownPlayer(giver))?
        .take_location_card(card)
        .ok_or_else(|| CommandError::CardNotInHand(format!("location {card}")))?;
    state
        .player_mut(receiver)
        .ok_or(CommandError::UnknownPlayer(receiver))?
        .hand
        .push_back(taken);
    Ok(())
}

fn discover_cure(state: &mut GameState, actor: PlayerId, color: Color) -> Result<(), CommandError> {
    if color == Color::Purple {
        return Err(CommandError::not_allowed("the mutation cannot be cured"));
    }
    if state.is_cured(color) {
        return Err(CommandError::not_allowed(format!("{color} is already cured")));
    }
    let location = location_of(state, actor)?;
    if !variant::is_cure_site(state, location, color) {
        return Err(CommandError::not_allowed(format!(
            "{color} cannot be cured here without a {}",
            variant::station_name(state.variant)
        )));
    }

    let caps = state
        .capabilities(actor)
        .ok_or(CommandError::UnknownPlayer(actor))?;
    let mut needed = caps.cure_cards;
    if state.strain_applies(VirulentStrain::ComplexMolecularStructure, color) {
        needed += 1;
    }
    let holder = state.player(actor).ok_or(CommandError::UnknownPlayer(actor))?;
    let use_samples = caps.collects_samples && holder.samples[color] >= SAMPLES_PER_CURE;
    if use_samples {
        needed -= 2;
    }
    if holder.count_color(color) < needed {
        return Err(CommandError::not_allowed(format!(
            "curing {color} needs {needed} {color} cards"
        )));
    }

    let holder = state.player_mut(actor).ok_or(CommandError::UnknownPlayer(actor))?;
    let mut spent = Vec::with_capacity(needed);
    for _ in 0..needed {
        let pos = holder
            .hand
            .iter()
            .position(|c| c.color() == Some(color))
            .ok_or_else(|| CommandError::Internal("cure cards vanished".to_string()))?;
        spent.push(holder.hand.remove(pos));
    }
    if use_samples {
        holder.samples[color] -= SAMPLES_PER_CURE;
        state.supply[color] += SAMPLES_PER_CURE;
    }
    state.player_discard.extend(spent);

    state.cures[color] = CureStatus::Cured;
    state.log_message(format!("{color} cured"));
    let clearing: Vec<LocationId> = state
        .players
        .iter()
        .filter(|p| p.role.capabilities().clears_cured_on_entry)
        .map(|p| p.location)
        .collect();
    for at in clearing {
        clear_cured_at(state, at);
    }
    state.update_eradication();
    variant::check_victory(state);
    Ok(())
}

// ============================================================================
// Siege
// ============================================================================

fn recruit_legions(state: &mut GameState, actor: PlayerId) -> Result<(), CommandError> {
    require_variant(state, &[Variant::Siege], "legions")?;
    let location = location_of(state, actor)?;
    if !state.has_station(location) {
        return Err(CommandError::not_allowed("legions are recruited at a fort"));
    }
    let recruited = state.legion_supply.min(RECRUITS);
    if recruited == 0 {
        return Err(CommandError::not_allowed("no legions left in the supply"));
    }
    state.legion_supply -= recruited;
    let count = state.legions_at(location) + recruited;
    state.set_legions(location, count);
    Ok(())
}

fn battle(state: &mut GameState, actor: PlayerId) -> Result<Transient, CommandError> {
    require_variant(state, &[Variant::Siege], "battles")?;
    let location = location_of(state, actor)?;
    if state.legions_at(location) == 0 {
        return Err(CommandError::not_allowed("no legions here"));
    }
    if Color::ALL.iter().all(|&c| state.markers_at(location, c) == 0) {
        return Err(CommandError::not_allowed("no enemies here"));
    }
    let dice = 2 + state
        .capabilities(actor)
        .map_or(0, |c| c.extra_battle_dice);
    let rolls: SmallVec<[u8; 3]> = (0..dice).map(|_| state.rng.roll(6)).collect();
    debug!(location = %location, rolls = ?rolls, "battle rolled");
    Ok(Transient::Battle { location, rolls })
}

/// Apply the pending battle outcome.
///
/// A roll of 1 or 2 loses a legion; 5 or 6 removes a marker, the
/// location's most numerous color first.
pub fn commit_battle(state: &mut GameState) -> Result<(), CommandError> {
    let Phase::Resolving(Transient::Battle { location, rolls }) = state.phase.clone() else {
        return Err(CommandError::Internal("no battle pending".to_string()));
    };

    let (mut lost, mut slain) = (0, 0);
    for roll in rolls {
        match roll {
            1 | 2 => {
                let legions = state.legions_at(location);
                if legions > 0 {
                    state.set_legions(location, legions - 1);
                    state.legion_supply += 1;
                    lost += 1;
                }
            }
            5 | 6 => {
                let target = Color::ALL
                    .iter()
                    .copied()
                    .filter(|&c| state.markers_at(location, c) > 0)
                    .max_by_key(|&c| (state.markers_at(location, c), std::cmp::Reverse(c.index())));
                if let Some(color) = target {
                    slain += state.remove_markers(location, color, 1);
                }
            }
            _ => {}
        }
    }
    state.update_eradication();
    state.log_message(format!("battle: {lost} legions lost, {slain} enemies slain"));
    phase::exit_transient(state)
}

// ============================================================================
// Contingency
// ============================================================================

fn retrieve_event(state: &mut GameState, actor: PlayerId, card: EventCard) -> Result<(), CommandError> {
    let holds = state
        .capabilities(actor)
        .is_some_and(|c| c.holds_contingency);
    if !holds {
        return Err(CommandError::not_allowed("only the contingency planner retrieves events"));
    }
    if state.player(actor).is_some_and(|p| p.contingency.is_some()) {
        return Err(CommandError::not_allowed("the contingency slot is full"));
    }
    let wanted = PlayerCard::Event(card);
    let pos = state
        .player_discard
        .iter()
        .position(|c| *c == wanted)
        .ok_or_else(|| CommandError::not_allowed(format!("{card} is not in the discard pile")))?;
    state.player_discard.remove(pos);
    if let Some(player) = state.player_mut(actor) {
        player.contingency = Some(card);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{load_board, BoardSource};
    use crate::core::GameConfig;
    use crate::roles::Role;

    fn classic(roles: Vec<Role>) -> (GameState, Board) {
        let board = load_board(BoardSource::Embedded(Variant::Classic)).unwrap();
        let config = GameConfig::new(Variant::Classic, roles.len()).with_roles(roles.clone());
        let mut state = GameState::new(&config, &board);
        for (i, role) in roles.into_iter().enumerate() {
            state.players.push_back(crate::core::Player::new(
                PlayerId::new(i as u8),
                role,
                board.starting_location,
            ));
        }
        state.stations.insert(board.starting_location);
        state.phase = Phase::PlayerTurn;
        state.actions_remaining = 4;
        (state, board)
    }

    fn card(board: &Board, location: LocationId) -> PlayerCard {
        PlayerCard::Location {
            location,
            color: board.location(location).color,
        }
    }

    #[test]
    fn test_drive_to_neighbor() {
        let (mut state, board) = classic(vec![Role::Scientist, Role::Researcher]);
        let to = board.neighbors(board.starting_location)[0];

        perform(&mut state, &board, &Command::Drive { to }).unwrap();

        assert_eq!(state.players[0].location, to);
        assert_eq!(state.actions_remaining, 3);
    }

    #[test]
    fn test_last_action_moves_to_pre_draw() {
        let (mut state, board) = classic(vec![Role::Scientist, Role::Researcher]);
        state.actions_remaining = 1;
        let to = board.neighbors(board.starting_location)[0];

        perform(&mut state, &board, &Command::Drive { to }).unwrap();

        assert_eq!(state.phase, Phase::PreDraw);
    }

    #[test]
    fn test_direct_flight_needs_card() {
        let (mut state, board) = classic(vec![Role::Scientist, Role::Researcher]);
        let far = board
            .locations()
            .iter()
            .find(|l| board.distance(board.starting_location, l.id) == Some(3))
            .unwrap()
            .id;

        let err = perform(&mut state, &board, &Command::DirectFlight { to: far }).unwrap_err();
        assert!(matches!(err, CommandError::CardNotInHand(_)));

        state.players[0].hand.push_back(card(&board, far));
        perform(&mut state, &board, &Command::DirectFlight { to: far }).unwrap();
        assert_eq!(state.players[0].location, far);
        assert_eq!(state.player_discard.len(), 1);
    }

    #[test]
    fn test_medic_treats_all() {
        let (mut state, board) = classic(vec![Role::Medic, Role::Scientist]);
        let here = board.starting_location;
        let color = board.location(here).color;
        state.markers[here.index()][color] = 3;
        state.supply[color] -= 3;

        perform(&mut state, &board, &Command::Treat { color }).unwrap();

        assert_eq!(state.markers_at(here, color), 0);
        assert_eq!(state.marker_total(color), u32::from(state.initial_supply[color]));
    }

    #[test]
    fn test_field_operative_keeps_one_sample_per_turn() {
        let (mut state, board) = classic(vec![Role::FieldOperative, Role::Scientist]);
        let here = board.starting_location;
        let color = board.location(here).color;
        state.markers[here.index()][color] = 3;
        state.supply[color] -= 3;

        perform(&mut state, &board, &Command::Treat { color }).unwrap();
        perform(&mut state, &board, &Command::Treat { color }).unwrap();

        assert_eq!(state.players[0].samples[color], 1);
        assert_eq!(state.markers_at(here, color), 1);
        assert_eq!(state.marker_total(color), u32::from(state.initial_supply[color]));
    }

    #[test]
    fn test_scientist_cures_with_four_cards() {
        let (mut state, board) = classic(vec![Role::Scientist, Role::Medic]);
        let color = Color::Blue;
        let blues: Vec<_> = board
            .locations()
            .iter()
            .filter(|l| l.color == color)
            .take(4)
            .map(|l| card(&board, l.id))
            .collect();
        state.players[0].hand.extend(blues);

        perform(&mut state, &board, &Command::DiscoverCure { color }).unwrap();

        assert!(state.is_cured(color));
        assert!(state.players[0].hand.is_empty());
        assert_eq!(state.player_discard.len(), 4);
    }

    #[test]
    fn test_share_knowledge_requires_matching_card() {
        let (mut state, board) = classic(vec![Role::Scientist, Role::Medic]);
        let here = board.starting_location;
        let elsewhere = board.neighbors(here)[0];
        state.players[0].hand.push_back(card(&board, elsewhere));

        let share = Command::ShareKnowledge {
            with: PlayerId::new(1),
            card: elsewhere,
            give: true,
        };
        assert!(perform(&mut state, &board, &share).is_err());

        state.players[0].hand.push_back(card(&board, here));
        let share = Command::ShareKnowledge {
            with: PlayerId::new(1),
            card: here,
            give: true,
        };
        perform(&mut state, &board, &share).unwrap();
        assert!(state.players[1].holds_location(here));
    }

    #[test]
    fn test_no_actions_remaining() {
        let (mut state, board) = classic(vec![Role::Scientist, Role::Medic]);
        state.actions_remaining = 0;
        let to = board.neighbors(board.starting_location)[0];
        assert_eq!(
            perform(&mut state, &board, &Command::Drive { to }),
            Err(CommandError::NoActionsRemaining)
        );
    }
}
