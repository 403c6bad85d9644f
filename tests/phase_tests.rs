//! Turn flow and phase gate tests.
//!
//! These tests verify the steady phases of a turn through the engine:
//! - The legality table rejects commands outside their phases
//! - Draws, escalations, intensify and the threat step
//! - Forced discards and forced previews as transient phases
//! - Terminal transitions

use contagion::{
    Board, Color, Command, CommandError, CommandKind, Engine, GameConfig, GameState, LocationId,
    Phase, PlayerCard, PlayerId, Role, RulesEngine, ThreatCard, Transient, Variant,
    VirulentStrain,
};

/// Engine with fixed roles and seed.
fn engine(variant: Variant, roles: Vec<Role>, seed: u64) -> Engine {
    let config = GameConfig::new(variant, roles.len())
        .with_roles(roles)
        .with_seed(seed);
    Engine::new(config).unwrap()
}

/// Started game; Frontier players all take the default start.
fn started(engine: &Engine) -> GameState {
    let mut state = engine.start().unwrap();
    while state.phase == Phase::ChoosingStartingLocation {
        let player = *state.awaiting_start.iter().next().unwrap();
        state = engine
            .try_apply(
                &state,
                &Command::ChooseStartingLocation {
                    player,
                    location: engine.board().starting_location,
                },
            )
            .unwrap();
    }
    state
}

fn find(board: &Board, name: &str) -> LocationId {
    board
        .find(name)
        .unwrap_or_else(|| panic!("no location named {name}"))
}

fn location_card(board: &Board, name: &str) -> PlayerCard {
    let location = find(board, name);
    PlayerCard::Location {
        location,
        color: board.location(location).color,
    }
}

/// Run the draw and threat steps through to the next player turn.
fn settle(engine: &Engine, state: &GameState) -> GameState {
    let mut state = state.clone();
    while state.phase != Phase::PlayerTurn && !state.is_over() {
        let command = match &state.phase {
            Phase::Resolving(Transient::Discarding { player }) => Command::Discard {
                player: *player,
                card: state.player(*player).unwrap().hand[0].clone(),
            },
            Phase::Resolving(Transient::Preview { count }) => Command::ArrangeThreatCards {
                order: (0..*count).collect(),
            },
            _ => Command::Proceed,
        };
        state = engine.try_apply(&state, &command).unwrap();
    }
    state
}

fn conserved(state: &GameState) -> bool {
    Color::ALL
        .iter()
        .all(|&c| state.marker_total(c) == u32::from(state.initial_supply[c]))
}

// ============================================================================
// Phase gate
// ============================================================================

#[test]
fn test_first_turn_starts_with_budget() {
    let engine = engine(Variant::Classic, vec![Role::Generalist, Role::Medic], 1);
    let state = started(&engine);

    assert_eq!(state.phase, Phase::PlayerTurn);
    assert_eq!(state.active, PlayerId::new(0));
    assert_eq!(state.actions_remaining, 5);
    assert!(conserved(&state));
}

#[test]
fn test_wrong_phase_is_rejected() {
    let engine = engine(Variant::Classic, vec![Role::Scientist, Role::Researcher], 2);
    let state = started(&engine);

    let err = engine.try_apply(&state, &Command::Proceed).unwrap_err();
    assert!(matches!(
        err,
        CommandError::WrongPhase {
            command: CommandKind::Proceed,
            ..
        }
    ));
    assert!(!engine.legal_kinds(&state).contains(&CommandKind::Proceed));
}

/// A full round hands the turn to the next player with a fresh budget.
#[test]
fn test_turn_passes_to_next_player() {
    let engine = engine(Variant::Classic, vec![Role::Scientist, Role::Generalist], 3);
    let state = started(&engine);

    let state = engine.try_apply(&state, &Command::EndActions).unwrap();
    assert_eq!(state.phase, Phase::PreDraw);
    let state = settle(&engine, &state);

    assert_eq!(state.phase, Phase::PlayerTurn);
    assert_eq!(state.active, PlayerId::new(1));
    assert_eq!(state.turn, 2);
    assert_eq!(state.actions_remaining, 5);
    assert!(conserved(&state));
}

// ============================================================================
// Drawing
// ============================================================================

#[test]
fn test_hand_over_limit_opens_discard() {
    let engine = engine(Variant::Classic, vec![Role::Scientist, Role::Researcher], 4);
    let board = engine.board();
    let mut state = started(&engine);
    let names = ["Chicago", "Miami", "Lima", "Cairo", "Tokyo", "Seoul", "Manila"];
    state.players[0].hand = names.iter().map(|n| location_card(board, n)).collect();
    state.phase = Phase::Drawing;
    state.draws_remaining = 1;
    state.player_deck.push_back(location_card(board, "Madrid"));

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(
        state.phase,
        Phase::Resolving(Transient::Discarding {
            player: PlayerId::new(0)
        })
    );
    assert!(engine.legal_kinds(&state).contains(&CommandKind::Discard));

    let wrong = Command::Discard {
        player: PlayerId::new(1),
        card: location_card(board, "Chicago"),
    };
    assert!(engine.try_apply(&state, &wrong).is_err());

    let discard = Command::Discard {
        player: PlayerId::new(0),
        card: location_card(board, "Chicago"),
    };
    let state = engine.try_apply(&state, &discard).unwrap();
    assert_eq!(state.phase, Phase::PreThreatStep);
    assert_eq!(state.players[0].hand.len(), 7);
    assert_eq!(state.player_discard.back(), Some(&location_card(board, "Chicago")));
}

#[test]
fn test_escalation_sequence() {
    let engine = engine(Variant::Classic, vec![Role::Scientist, Role::Researcher], 5);
    let mut state = started(&engine);
    state.phase = Phase::Drawing;
    state.draws_remaining = 1;
    state.player_deck.push_back(PlayerCard::Escalation);
    let bottom = *state.threat_deck.front().unwrap();
    let location = bottom.location().unwrap();
    let color = engine.board().location(location).color;
    let threat_cards = state.threat_card_total();

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.phase, Phase::Escalation { strain: None });
    assert_eq!(state.escalations_drawn, 1);

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.phase, Phase::PostEscalationWindow);
    assert_eq!(state.markers_at(location, color), 3);
    assert_eq!(state.threat_discard.back(), Some(&bottom));

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.phase, Phase::EscalationIntensify);

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.phase, Phase::PreThreatStep);
    assert!(state.threat_discard.is_empty());
    assert_eq!(state.threat_card_total(), threat_cards);
    assert!(conserved(&state));
}

#[test]
fn test_virulent_announcement() {
    let engine = engine(Variant::Classic, vec![Role::Scientist, Role::Researcher], 6);
    let mut state = started(&engine);
    state.phase = Phase::Drawing;
    state.draws_remaining = 1;
    state
        .player_deck
        .push_back(PlayerCard::Virulent(VirulentStrain::UnacceptableLoss));

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(
        state.phase,
        Phase::EscalationAnnounce {
            strain: VirulentStrain::UnacceptableLoss
        }
    );

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.phase, Phase::PostEscalationWindow);
    let color = state.virulent_color.unwrap();
    assert_eq!(state.removed_markers[color], 4);
    assert!(state.strains.contains(&VirulentStrain::UnacceptableLoss));
    assert!(conserved(&state));
}

#[test]
fn test_empty_player_deck_is_defeat() {
    let engine = engine(Variant::Classic, vec![Role::Scientist, Role::Researcher], 7);
    let mut state = started(&engine);
    state.phase = Phase::Drawing;
    state.draws_remaining = 2;
    state.player_deck.clear();

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();

    assert_eq!(state.phase, Phase::GameOver);
    assert!(engine.is_terminal(&state).is_some());
    assert!(engine.legal_kinds(&state).is_empty());
    assert!(engine.try_apply(&state, &Command::Undo).is_err());
}

// ============================================================================
// Threat step
// ============================================================================

#[test]
fn test_threat_step_draws_infection_rate() {
    let engine = engine(Variant::Classic, vec![Role::Scientist, Role::Researcher], 8);
    let mut state = started(&engine);
    state.phase = Phase::PreThreatStep;
    let top = *state.threat_deck.back().unwrap();

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.phase, Phase::ThreatStep);
    assert_eq!(state.threats_remaining, 2);

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.threats_remaining, 1);
    assert_eq!(state.threat_discard.back(), Some(&top));
    assert!(!state.last_report.is_empty());

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();
    assert_eq!(state.active, PlayerId::new(1));
    assert_eq!(state.phase, Phase::PlayerTurn);
}

/// A mutation wildcard places a purple marker where the bottom card points.
#[test]
fn test_wildcard_marks_bottom_location() {
    let config = GameConfig::new(Variant::Classic, 2)
        .with_roles(vec![Role::Scientist, Role::Researcher])
        .with_mutation(true)
        .with_seed(9);
    let engine = Engine::new(config).unwrap();
    let mut state = started(&engine);
    state.phase = Phase::ThreatStep;
    state.threats_remaining = 1;
    state.threat_deck.push_back(ThreatCard::Mutation);
    let bottom = state
        .threat_deck
        .iter()
        .find_map(ThreatCard::location)
        .unwrap();

    let state = engine.try_apply(&state, &Command::Proceed).unwrap();

    assert_eq!(state.markers_at(bottom, Color::Purple), 1);
    assert_eq!(state.threat_deck.iter().find_map(ThreatCard::location), Some(bottom));
    assert!(conserved(&state));
}

// ============================================================================
// Forced previews
// ============================================================================

#[test]
fn test_analyst_arranges_before_acting() {
    let engine = engine(Variant::Classic, vec![Role::Analyst, Role::Scientist], 10);
    let state = started(&engine);
    assert_eq!(state.phase, Phase::Resolving(Transient::Preview { count: 3 }));
    assert_eq!(engine.legal_kinds(&state), vec![CommandKind::ArrangeThreatCards]);

    let third = state.threat_deck[state.threat_deck.len() - 3];
    let arrange = Command::ArrangeThreatCards {
        order: [2, 1, 0].into_iter().collect(),
    };
    let state = engine.try_apply(&state, &arrange).unwrap();

    assert_eq!(state.phase, Phase::PlayerTurn);
    assert_eq!(state.threat_deck.back(), Some(&third));
    assert!(state.history.is_empty());
}

#[test]
fn test_preview_rejects_bad_order() {
    let engine = engine(Variant::Classic, vec![Role::Analyst, Role::Scientist], 11);
    let state = started(&engine);

    let arrange = Command::ArrangeThreatCards {
        order: [0, 0, 1].into_iter().collect(),
    };
    assert!(engine.try_apply(&state, &arrange).is_err());
}
