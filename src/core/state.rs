//! The game state aggregate.
//!
//! `GameState` holds everything that changes during a game. Boards and
//! configuration are not part of it. Collections are `im` persistent
//! structures, so cloning a state for an undo snapshot is cheap and
//! shares structure with the live state.
//!
//! ## Card stacks
//!
//! Draw piles keep the top card at the back. Every card of a family is
//! always in exactly one of: draw pile, discard pile, removed pile, a hand,
//! or a contingency slot.

use std::sync::Arc;

use im::{OrdMap, OrdSet, Vector};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::color::{Color, ColorMap, CureStatus};
use super::config::{GameConfig, Variant};
use super::player::{Player, PlayerId};
use super::rng::GameRng;
use crate::board::{Board, LocationId, RegionId};
use crate::cards::{PlayerCard, ThreatCard, VirulentStrain};
use crate::cascade::PlacementReport;
use crate::phase::Phase;
use crate::roles::Capabilities;
use crate::rules::GameResult;

/// Time-boxed effect that expires when its owner's next turn starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub owner: PlayerId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Threat steps draw a single card.
    TravelBan,
    /// No markers are placed on locations bordering the region.
    Quarantine(RegionId),
}

/// Flags reset at every turn advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFlags {
    pub sample_taken: bool,
}

/// One line of the bounded in-state log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub turn: u32,
    pub message: String,
}

/// The authoritative game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub variant: Variant,

    // === Progression ===
    pub phase: Phase,
    /// Phases to return to when the current transient phase exits.
    pub return_phases: Vector<Phase>,
    pub turn: u32,
    pub active: PlayerId,
    pub actions_remaining: u8,
    pub flags: TurnFlags,
    /// Main-deck draws left this turn.
    pub draws_remaining: u8,
    /// Threat draws left this turn.
    pub threats_remaining: u8,
    /// Skip the next threat step.
    pub quiet_night: bool,
    /// Players who still have to choose a starting location.
    pub awaiting_start: OrdSet<PlayerId>,

    // === Players ===
    pub players: Vector<Player>,

    // === Markers ===
    /// Marker counts per location, indexed by `LocationId`.
    pub markers: Vector<ColorMap<u8>>,
    pub supply: ColorMap<u8>,
    pub initial_supply: ColorMap<u8>,
    /// Markers permanently removed from the game.
    pub removed_markers: ColorMap<u8>,
    pub cures: ColorMap<CureStatus>,

    // === Escalation ===
    /// The escalation counter. Never decreases.
    pub outbreaks: u8,
    pub outbreak_limit: u8,
    pub escalations_drawn: u8,
    pub virulent_color: Option<Color>,
    pub strains: Vector<VirulentStrain>,

    // === Cards ===
    pub player_deck: Vector<PlayerCard>,
    pub player_discard: Vector<PlayerCard>,
    pub player_removed: Vector<PlayerCard>,
    pub threat_deck: Vector<ThreatCard>,
    pub threat_discard: Vector<ThreatCard>,
    pub threat_removed: Vector<ThreatCard>,

    // === Structures ===
    /// Research stations (Classic) or forts (Siege).
    pub stations: OrdSet<LocationId>,
    pub legions: OrdMap<LocationId, u8>,
    pub legion_supply: u8,
    pub hospitals: ColorMap<Option<LocationId>>,
    /// Rail links, stored with the lower id first.
    pub rails: OrdSet<(LocationId, LocationId)>,
    /// Purification tokens per region.
    pub purification: Vector<u8>,
    pub purification_supply: u8,

    pub modifiers: Vector<Modifier>,

    // === Bookkeeping ===
    pub outcome: Option<GameResult>,
    /// Placement reports of the last command.
    pub last_report: Vector<PlacementReport>,
    pub log: Vector<LogEntry>,
    pub log_capacity: usize,
    pub rng: GameRng,

    /// Undo snapshots, oldest first. Snapshots never carry their own history.
    #[serde(skip)]
    pub history: Vector<Arc<GameState>>,
}

impl GameState {
    /// Create an empty state in the `Setup` phase.
    #[must_use]
    pub fn new(config: &GameConfig, board: &Board) -> Self {
        let mut supply = ColorMap::splat(0);
        for color in Color::STANDARD {
            supply[color] = board.marker_supply;
        }
        if config.mutation {
            supply[Color::Purple] = board.mutation_supply;
        }

        Self {
            variant: config.variant,
            phase: Phase::Setup,
            return_phases: Vector::new(),
            turn: 0,
            active: PlayerId::new(0),
            actions_remaining: 0,
            flags: TurnFlags::default(),
            draws_remaining: 0,
            threats_remaining: 0,
            quiet_night: false,
            awaiting_start: OrdSet::new(),
            players: Vector::new(),
            markers: std::iter::repeat(ColorMap::default())
                .take(board.len())
                .collect(),
            supply,
            initial_supply: supply,
            removed_markers: ColorMap::default(),
            cures: ColorMap::default(),
            outbreaks: 0,
            outbreak_limit: board.outbreak_limit,
            escalations_drawn: 0,
            virulent_color: None,
            strains: Vector::new(),
            player_deck: Vector::new(),
            player_discard: Vector::new(),
            player_removed: Vector::new(),
            threat_deck: Vector::new(),
            threat_discard: Vector::new(),
            threat_removed: Vector::new(),
            stations: OrdSet::new(),
            legions: OrdMap::new(),
            legion_supply: board.legion_supply,
            hospitals: ColorMap::default(),
            rails: OrdSet::new(),
            purification: std::iter::repeat(0).take(board.region_count()).collect(),
            purification_supply: board.purification_supply,
            modifiers: Vector::new(),
            outcome: None,
            last_report: Vector::new(),
            log: Vector::new(),
            log_capacity: config.log_capacity,
            rng: GameRng::new(config.seed),
            history: Vector::new(),
        }
    }

    // === Players ===

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id.index())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Capabilities of a player's role.
    #[must_use]
    pub fn capabilities(&self, id: PlayerId) -> Option<Capabilities> {
        self.player(id).map(|p| p.role.capabilities())
    }

    /// Check a hand against its role-dependent limit.
    #[must_use]
    pub fn over_hand_limit(&self, id: PlayerId) -> bool {
        self.player(id)
            .is_some_and(|p| p.hand.len() > p.role.capabilities().hand_limit)
    }

    /// Players standing on `location`.
    pub fn players_at(&self, location: LocationId) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.location == location)
    }

    // === Markers ===

    #[must_use]
    pub fn markers_at(&self, location: LocationId, color: Color) -> u8 {
        self.markers
            .get(location.index())
            .map_or(0, |m| m[color])
    }

    /// Markers of `color` on the board.
    #[must_use]
    pub fn on_board(&self, color: Color) -> u32 {
        self.markers.iter().map(|m| u32::from(m[color])).sum()
    }

    /// Markers of `color` accounted for anywhere: supply, board, samples and
    /// permanently removed. Equals the initial supply.
    #[must_use]
    pub fn marker_total(&self, color: Color) -> u32 {
        let samples: u32 = self
            .players
            .iter()
            .map(|p| u32::from(p.samples[color]))
            .sum();
        u32::from(self.supply[color])
            + self.on_board(color)
            + samples
            + u32::from(self.removed_markers[color])
    }

    /// Remove up to `count` markers from a location back to the supply.
    ///
    /// Returns the number removed.
    pub fn remove_markers(&mut self, location: LocationId, color: Color, count: u8) -> u8 {
        let Some(cell) = self.markers.get_mut(location.index()) else {
            return 0;
        };
        let removed = cell[color].min(count);
        cell[color] -= removed;
        self.supply[color] += removed;
        removed
    }

    // === Cures ===

    #[must_use]
    pub fn is_cured(&self, color: Color) -> bool {
        self.cures[color].is_cured()
    }

    /// Mark cured colors with no markers left as eradicated.
    pub fn update_eradication(&mut self) {
        for color in Color::ALL {
            if self.cures[color] == CureStatus::Cured && self.on_board(color) == 0 {
                self.cures[color] = CureStatus::Eradicated;
                self.log_message(format!("{color} eradicated"));
            }
        }
    }

    /// Check whether a virulent strain applies to `color`.
    #[must_use]
    pub fn strain_applies(&self, strain: VirulentStrain, color: Color) -> bool {
        self.virulent_color == Some(color) && self.strains.contains(&strain)
    }

    // === Structures ===

    #[must_use]
    pub fn has_station(&self, location: LocationId) -> bool {
        self.stations.contains(&location)
    }

    #[must_use]
    pub fn legions_at(&self, location: LocationId) -> u8 {
        self.legions.get(&location).copied().unwrap_or(0)
    }

    /// Set the legion count at a location, dropping empty entries.
    pub fn set_legions(&mut self, location: LocationId, count: u8) {
        if count == 0 {
            self.legions.remove(&location);
        } else {
            self.legions.insert(location, count);
        }
    }

    #[must_use]
    pub fn has_rail(&self, a: LocationId, b: LocationId) -> bool {
        self.rails.contains(&rail_key(a, b))
    }

    #[must_use]
    pub fn tokens_in(&self, region: RegionId) -> u8 {
        self.purification.get(region.index()).copied().unwrap_or(0)
    }

    /// Check for an owner-expiring quarantine on `region`.
    #[must_use]
    pub fn is_quarantined(&self, region: RegionId) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.kind == ModifierKind::Quarantine(region))
    }

    #[must_use]
    pub fn travel_ban(&self) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.kind == ModifierKind::TravelBan)
    }

    // === Cards ===

    /// Player-family cards in every pile, hand and contingency slot.
    #[must_use]
    pub fn player_card_total(&self) -> usize {
        let held: usize = self
            .players
            .iter()
            .map(|p| p.hand.len() + usize::from(p.contingency.is_some()))
            .sum();
        self.player_deck.len() + self.player_discard.len() + self.player_removed.len() + held
    }

    /// Threat-family cards in every pile.
    #[must_use]
    pub fn threat_card_total(&self) -> usize {
        self.threat_deck.len() + self.threat_discard.len() + self.threat_removed.len()
    }

    // === Outcome ===

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Enter `GameOver` with a result. Pending transients are dropped.
    pub fn end_game(&mut self, result: GameResult) {
        if self.is_over() {
            return;
        }
        info!(turn = self.turn, outcome = %result, "game over");
        self.log_message(format!("game over: {result}"));
        self.phase = Phase::GameOver;
        self.return_phases.clear();
        self.outcome = Some(result);
    }

    /// Advance the escalation counter by `amount`, ending the game at the limit.
    pub fn escalate(&mut self, amount: u8) {
        self.outbreaks = self.outbreaks.saturating_add(amount).min(self.outbreak_limit);
        if self.outbreaks >= self.outbreak_limit {
            self.end_game(GameResult::defeat("escalation limit reached"));
        }
    }

    // === Log ===

    /// Append to the bounded log, dropping the oldest entry when full.
    pub fn log_message(&mut self, message: impl Into<String>) {
        self.log.push_back(LogEntry {
            turn: self.turn,
            message: message.into(),
        });
        while self.log.len() > self.log_capacity {
            self.log.pop_front();
        }
    }
}

/// Canonical key for an undirected rail link.
#[must_use]
pub fn rail_key(a: LocationId, b: LocationId) -> (LocationId, LocationId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
