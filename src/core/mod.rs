//! Core types: colors, players, commands, errors, RNG, configuration and
//! the game state aggregate.
//!
//! Everything else in the crate operates on these types.

pub mod color;
pub mod command;
pub mod config;
pub mod error;
pub mod player;
pub mod rng;
pub mod state;

pub use color::{Color, ColorMap, CureStatus};
pub use command::{Command, CommandKind, EventChoice, EventTarget, RiskOption};
pub use config::{GameConfig, Variant};
pub use error::{CommandError, ConfigError};
pub use player::{Player, PlayerId};
pub use rng::{GameRng, GameRngState};
pub use state::{rail_key, GameState, LogEntry, Modifier, ModifierKind, TurnFlags};
