//! Static per-variant tables: the location graph, regions, card pools and
//! rate schedules.
//!
//! Boards are immutable once loaded. The engine consults them read-only
//! during setup and cascades; they are never part of the game state.
//!
//! ## Key Types
//!
//! - `LocationId` / `RegionId`: Opaque indices into the tables
//! - `Location`: One node of the adjacency graph
//! - `Board`: The compiled tables for one variant
//! - `BoardSource`: Where to load tables from (embedded or a TOML string)

mod location;
mod loader;

pub use location::{Location, LocationId, RegionId};
pub use loader::{load_board, Board, BoardSource};
