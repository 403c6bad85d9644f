//! Command handlers and the rules engine.
//!
//! - `engine`: The `RulesEngine` trait, the `Engine` pipeline, `GameResult`
//! - `setup`: `StartGame` and starting-location choice
//! - `actions`: Action commands of the active player and battles
//! - `turn`: Draws, escalations, threat steps, discards and turn advance
//! - `variant`: Per-variant structures and win conditions

pub mod actions;
pub mod engine;
pub mod setup;
pub mod turn;
pub mod variant;

pub use engine::{Engine, GameResult, RulesEngine};
