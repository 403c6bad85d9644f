//! Event card resolution.
//!
//! Events are played by whoever holds them, in any event window. Immediate
//! events mutate the state at once; interactive events open their own
//! transient phase and wait for a `ResolveEvent` command carrying the
//! structured choice. Risk/reward events take a `RiskOption`: the corrupt
//! branch advances the escalation counter by one before the stronger
//! effect applies and may end the game on its own.
//!
//! After any effect, hands over their limit open a discard before the
//! game returns to the interrupted phase.
//!
//! ## Key Types
//!
//! - `PlayedEvent`: The card, its player, and the chosen option
//! - `EventSpec`: Timing, shape and risk metadata per card

mod catalog;
mod play;
mod resolve;

pub use catalog::{event_spec, reveals_hidden, EventSpec, Shape, Timing};
pub use play::{cancel_event, play_event, PlayedEvent};
pub use resolve::resolve_event;
