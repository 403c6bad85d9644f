//! Property tests.
//!
//! These tests check invariants over generated inputs:
//! - Random command sequences conserve markers and cards
//! - Undo restores the exact previous state
//! - Cascades terminate on arbitrary graphs
//! - Suspending and resuming a cascade matches pre-selecting the region
//! - Deck partitions are fair for every table size

use contagion::cards::build_player_deck;
use contagion::cascade::{add_markers, resume_with_region, Cascade, CascadeStatus, Cause};
use contagion::history;
use contagion::{
    load_board, Board, BoardSource, Color, Command, CommandError, CommandKind, Engine, EventChoice,
    EventTarget, GameConfig, GameRng, GameState, LocationId, Phase, PlayerCard, PlayerId,
    RegionId, RiskOption, RulesEngine, Transient, Variant,
};
use proptest::prelude::*;
use smallvec::SmallVec;

const VARIANTS: [Variant; 3] = [Variant::Classic, Variant::Siege, Variant::Frontier];

fn conserved(state: &GameState) -> bool {
    Color::ALL
        .iter()
        .all(|&c| state.marker_total(c) == u32::from(state.initial_supply[c]))
}

fn without_history(state: &GameState) -> GameState {
    let mut copy = state.clone();
    copy.history.clear();
    copy
}

fn engine_for(variant: usize, seed: u64, challenges: bool) -> Engine {
    let config = GameConfig::new(VARIANTS[variant % 3], 2)
        .with_seed(seed)
        .with_virulent_strain(challenges)
        .with_mutation(challenges);
    Engine::new(config).expect("valid config")
}

// ============================================================================
// Random play
// ============================================================================

/// Default answer for phases that need no real decision.
fn default_command(engine: &Engine, state: &GameState) -> Option<Command> {
    let command = match &state.phase {
        Phase::Setup => Command::StartGame,
        Phase::ChoosingStartingLocation => Command::ChooseStartingLocation {
            player: *state.awaiting_start.iter().next()?,
            location: engine.board().starting_location,
        },
        Phase::PlayerTurn => Command::EndActions,
        Phase::GameOver => return None,
        Phase::Resolving(transient) => match transient {
            Transient::Discarding { player } => Command::Discard {
                player: *player,
                card: state.player(*player)?.hand.front()?.clone(),
            },
            Transient::Preview { count } => Command::ArrangeThreatCards {
                order: (0..*count).collect(),
            },
            Transient::PurificationChoice { regions, .. } => Command::ChoosePurificationRegion {
                region: *regions.first()?,
            },
            Transient::Battle { .. } => Command::CommitBattle,
            Transient::Forecast { count, .. } | Transient::Augury { count, .. } => {
                Command::ResolveEvent(EventChoice::Order((0..*count).collect()))
            }
            Transient::HiddenTreasury { .. } => {
                Command::ResolveEvent(EventChoice::Cards(SmallVec::new()))
            }
            Transient::RailwayConcession { .. } => Command::ResolveEvent(EventChoice::Done),
            _ => Command::CancelEvent,
        },
        _ => Command::Proceed,
    };
    Some(command)
}

/// Plausible commands for the current phase, legal or not.
fn candidates(engine: &Engine, state: &GameState) -> Vec<Command> {
    let board = engine.board();
    let mut out = Vec::new();
    if let Some(default) = default_command(engine, state) {
        out.push(default);
    }
    out.push(Command::Undo);

    let Some(player) = state.player(state.active) else {
        return out;
    };
    let here = player.location;

    if state.phase == Phase::PlayerTurn {
        for &to in board.neighbors(here) {
            out.push(Command::Drive { to });
            out.push(Command::BuildRail { to });
        }
        for color in Color::ALL {
            out.push(Command::Treat { color });
            out.push(Command::DiscoverCure { color });
        }
        for card in &player.hand {
            if let Some(to) = card.location() {
                out.push(Command::DirectFlight { to });
                out.push(Command::ShareKnowledge {
                    with: PlayerId::new(((state.active.0 + 1) % 2) as u8),
                    card: to,
                    give: true,
                });
            }
        }
        out.push(Command::BuildResearchStation);
        out.push(Command::BuildFort);
        out.push(Command::BuildHospital);
        out.push(Command::RecruitLegions);
        out.push(Command::Battle);
        for region in &board.location(here).regions {
            out.push(Command::PurifyWater { region: *region });
        }
    }

    for holder in &state.players {
        for card in holder.hand.iter().filter_map(PlayerCard::event) {
            for option in [RiskOption::Safe, RiskOption::Corrupt] {
                out.push(Command::PlayEvent {
                    player: holder.id,
                    card,
                    option,
                    target: EventTarget::Location(here),
                });
                out.push(Command::PlayEvent {
                    player: holder.id,
                    card,
                    option,
                    target: EventTarget::None,
                });
            }
        }
    }
    out
}

/// Apply `command` and fail the test on defects only.
fn apply_checked(engine: &Engine, state: &GameState, command: &Command) -> Option<GameState> {
    match engine.try_apply(state, command) {
        Ok(next) => Some(next),
        Err(CommandError::Internal(msg)) => panic!("internal error on {command:?}: {msg}"),
        Err(_) => None,
    }
}

/// Walk a game with `picks` choosing among plausible commands, checking
/// invariants after every accepted command.
fn random_walk(engine: &Engine, picks: &[usize], mut check: impl FnMut(&GameState, &Command, &GameState)) {
    let mut state = engine.start().expect("game starts");
    for &pick in picks {
        if state.is_over() {
            break;
        }
        let options = candidates(engine, &state);
        let command = &options[pick % options.len()];
        if let Some(next) = apply_checked(engine, &state, command) {
            check(&state, command, &next);
            state = next;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_random_play_conserves(
        variant in 0usize..3,
        seed in any::<u64>(),
        challenges in any::<bool>(),
        picks in prop::collection::vec(any::<usize>(), 0..300),
    ) {
        let engine = engine_for(variant, seed, challenges);
        let start = engine.start().expect("game starts");
        let player_cards = start.player_card_total();
        let threat_cards = start.threat_card_total();

        random_walk(&engine, &picks, |before, command, after| {
            assert!(conserved(after), "markers leaked on {command:?}");
            assert_eq!(after.player_card_total(), player_cards, "{command:?}");
            assert_eq!(after.threat_card_total(), threat_cards, "{command:?}");
            assert!(after.outbreaks <= after.outbreak_limit);
            if command.kind() != CommandKind::Undo {
                assert!(after.outbreaks >= before.outbreaks);
                assert!(after.escalations_drawn >= before.escalations_drawn);
            }
            match &after.phase {
                Phase::Resolving(_) => assert!(!after.return_phases.is_empty()),
                Phase::GameOver => assert!(after.outcome.is_some()),
                _ => {}
            }
            for p in &after.players {
                assert!(p.hand.iter().all(|c| c.is_holdable()));
            }
        });
    }

    #[test]
    fn prop_undo_restores_previous_state(
        variant in 0usize..3,
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<usize>(), 0..200),
    ) {
        let engine = engine_for(variant, seed, false);

        random_walk(&engine, &picks, |before, command, after| {
            let kind = command.kind();
            if kind == CommandKind::Undo {
                return;
            }
            if kind == CommandKind::CancelEvent {
                assert_eq!(after.history, before.history);
                return;
            }
            if history::is_reversible(command, before) {
                if !engine.legal_kinds(after).contains(&CommandKind::Undo) {
                    return;
                }
                let undone = engine.try_apply(after, &Command::Undo).expect("undo succeeds");
                assert_eq!(without_history(&undone), without_history(before));
            } else {
                assert!(after.history.is_empty());
            }
        });
    }

    #[test]
    fn prop_same_seed_same_game(
        variant in 0usize..3,
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<usize>(), 0..120),
    ) {
        let run = || {
            let engine = engine_for(variant, seed, true);
            let mut states = Vec::new();
            random_walk(&engine, &picks, |_, _, after| states.push(without_history(after)));
            states
        };
        prop_assert_eq!(run(), run());
    }
}

// ============================================================================
// Cascades on generated graphs
// ============================================================================

/// Board TOML for `n` blue locations joined by `edges`, each bordering the
/// regions listed for it.
fn graph_board(variant: Variant, n: usize, edges: &[(usize, usize)], regions: &[Vec<usize>]) -> Board {
    let mut text = format!(
        r#"
        name = "generated"
        variant = "{}"
        outbreak_limit = 64
        marker_supply = 64
        purification_supply = 24
        infection_rates = [2]
        starting_hands = [4, 3, 2]
        starting_location = "L0"
        regions = ["R0", "R1", "R2"]
        events = []
        "#,
        variant.name()
    );
    for i in 0..n {
        let links: Vec<String> = edges
            .iter()
            .filter(|&&(a, b)| a == i && b != i)
            .map(|&(_, b)| format!("\"L{b}\""))
            .collect();
        let bordering: Vec<String> = regions[i].iter().map(|r| format!("\"R{r}\"")).collect();
        text.push_str(&format!(
            "\n[[locations]]\nname = \"L{i}\"\ncolor = \"blue\"\nlinks = [{}]\nregions = [{}]\n",
            links.join(", "),
            bordering.join(", ")
        ));
    }
    load_board(BoardSource::Toml(&text)).expect("generated board loads")
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<Vec<usize>>)> {
    (2usize..10).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..(n * 3)),
            prop::collection::vec(prop::collection::vec(0usize..3, 0..3), n),
        )
    })
}

fn preload(state: &mut GameState, counts: &[u8]) {
    for (i, &count) in counts.iter().enumerate() {
        state.markers[i][Color::Blue] = count;
        state.supply[Color::Blue] -= count;
    }
}

/// Answer every suspension with `region` when eligible, else the first
/// eligible region.
fn run_to_end(state: &mut GameState, board: &Board, mut status: CascadeStatus, region: RegionId) -> CascadeStatus {
    while let CascadeStatus::Suspended(suspension) = status {
        let answer = if suspension.regions.contains(&region) {
            region
        } else {
            suspension.regions[0]
        };
        status = resume_with_region(state, board, suspension.cascade, answer)
            .expect("eligible region accepted");
    }
    status
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_cascade_terminates(
        (n, edges, regions) in graph_strategy(),
        start in any::<prop::sample::Index>(),
        count in 1u8..4,
    ) {
        let board = graph_board(Variant::Classic, n, &edges, &regions);
        let mut state = GameState::new(&GameConfig::new(Variant::Classic, 2), &board);
        state.phase = Phase::PlayerTurn;
        preload(&mut state, &vec![3; n]);
        let location = LocationId::new(start.index(n) as u16);

        let status = add_markers(&mut state, &board, location, Color::Blue, count, Cause::Infection);

        prop_assert!(matches!(status, CascadeStatus::Done));
        prop_assert!(usize::from(state.outbreaks) <= n);
        prop_assert!(state.outbreaks >= 1);
        prop_assert!(state.markers.iter().all(|m| m[Color::Blue] <= 3));
        prop_assert!(conserved(&state));
    }

    #[test]
    fn prop_suspend_resume_matches_preselection(
        (n, edges, regions) in graph_strategy(),
        markers in prop::collection::vec(0u8..4, 10),
        tokens in prop::collection::vec(0u8..3, 3),
        start in any::<prop::sample::Index>(),
        count in 1u8..4,
        region in 0u8..3,
    ) {
        let board = graph_board(Variant::Frontier, n, &edges, &regions);
        let mut base = GameState::new(&GameConfig::new(Variant::Frontier, 2), &board);
        base.phase = Phase::PlayerTurn;
        preload(&mut base, &markers[..n]);
        for (r, &t) in tokens.iter().enumerate() {
            base.purification[r] = t;
            base.purification_supply -= t;
        }
        let location = LocationId::new(start.index(n) as u16);
        let region = RegionId::new(region);

        let mut resumed = base.clone();
        let status = add_markers(&mut resumed, &board, location, Color::Blue, count, Cause::Infection);
        let status = run_to_end(&mut resumed, &board, status, region);

        let mut preselected = base.clone();
        let status_pre = Cascade::new(location, Color::Blue, count)
            .with_preselected_region(region)
            .run(&mut preselected, &board);
        let status_pre = run_to_end(&mut preselected, &board, status_pre, region);

        prop_assert_eq!(status, status_pre);
        prop_assert_eq!(&resumed.markers, &preselected.markers);
        prop_assert_eq!(&resumed.purification, &preselected.purification);
        prop_assert_eq!(resumed.purification_supply, preselected.purification_supply);
        prop_assert_eq!(resumed.outbreaks, preselected.outbreaks);
        prop_assert_eq!(resumed.supply, preselected.supply);
        prop_assert!(conserved(&resumed));
    }
}

// ============================================================================
// Deck fairness
// ============================================================================

proptest! {
    #[test]
    fn prop_piles_are_fair(
        variant in 0usize..3,
        players in 2usize..=4,
        escalations in 4usize..=6,
        virulent in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let variant = VARIANTS[variant];
        let board = load_board(BoardSource::Embedded(variant)).unwrap();
        let config = GameConfig::new(variant, players)
            .with_escalation_cards(escalations)
            .with_virulent_strain(virulent);

        let deck = build_player_deck(&board, &config, &mut GameRng::new(seed));

        prop_assert_eq!(deck.piles.len(), escalations);
        let sizes: Vec<usize> = deck.piles.iter().map(Vec::len).collect();
        let min = sizes.iter().copied().min().unwrap_or(0);
        let max = sizes.iter().copied().max().unwrap_or(0);
        prop_assert!(max - min <= 1);
        for pile in &deck.piles {
            prop_assert_eq!(pile.iter().filter(|c| c.is_escalation()).count(), 1);
        }
        prop_assert_eq!(sizes.iter().sum::<usize>(), deck.draw_pile.len());
        prop_assert_eq!(deck.hands.len(), players);
    }
}
