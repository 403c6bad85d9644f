//! # contagion
//!
//! A deterministic rules engine for cooperative outbreak board games.
//!
//! Three variants share one engine shape: Classic (research stations and
//! flights), Siege (forts, legions and a capital that must not fall) and
//! Frontier (hospitals, rail links and regional purification tokens).
//!
//! ## Design Principles
//!
//! 1. **Commands Only**: A `GameState` changes only through
//!    `RulesEngine::try_apply`. A rejected command leaves it untouched.
//!
//! 2. **Deterministic**: All randomness comes from the seeded RNG carried
//!    inside the state, so a seed plus a command list replays a game.
//!
//! 3. **Cheap Snapshots**: State uses persistent `im` collections, so the
//!    undo history and observers can hold whole states.
//!
//! ## Modules
//!
//! - `core`: Colors, players, commands, errors, RNG, configuration, state
//! - `board`: Location graphs and per-variant tables
//! - `cards`: Card types and deck construction
//! - `roles`: Role capability lookup
//! - `cascade`: Marker placement and outbreak chains
//! - `phase`: Phase enumeration, legality table, transient phases
//! - `effects`: Event card resolution
//! - `history`: Undo snapshots
//! - `rules`: Command handlers and the rules engine
//! - `observer`: Cues and summaries for presentation layers

pub mod board;
pub mod cards;
pub mod cascade;
pub mod core;
pub mod effects;
pub mod history;
pub mod observer;
pub mod phase;
pub mod roles;
pub mod rules;

// Re-export commonly used types
pub use crate::core::{
    Color, ColorMap, Command, CommandError, CommandKind, ConfigError, CureStatus, EventChoice,
    EventTarget, GameConfig, GameRng, GameState, Player, PlayerId, RiskOption, Variant,
};

pub use crate::board::{load_board, Board, BoardSource, Location, LocationId, RegionId};

pub use crate::cards::{EventCard, MutationCard, PlayerCard, ThreatCard, VirulentStrain};

pub use crate::cascade::{add_markers, Cascade, CascadeStatus, PlacementReport};

pub use crate::phase::{Phase, Transient};

pub use crate::roles::{Capabilities, Role};

pub use crate::rules::{Engine, GameResult, RulesEngine};

pub use crate::observer::{Cue, Observer, Summary};
