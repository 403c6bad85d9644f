//! Infection and outbreak cascades.
//!
//! `add_markers` places markers on a location after checking defenses in a
//! fixed priority order (regional immunity, nullifying presence, cured-color
//! clearing, eradication, consumable tokens). Overflow past the cap starts an
//! outbreak that hands markers to every neighbor, which may outbreak in turn.
//! Each location outbreaks at most once per chain.
//!
//! A placement that needs a purification-region choice suspends the
//! cascade. The caller stores the returned `Cascade` in a `Continuation`
//! and later calls `resume_with_region`.
//!
//! ## Key Types
//!
//! - `Cascade`: Explicit frame stack plus the outbreak set
//! - `CascadeStatus`: Done, suspended or terminal
//! - `Continuation`: A suspended cascade and the step it was serving
//! - `PlacementReport`: One record per placement attempt

mod defense;
mod engine;
mod report;

pub use defense::{blocking_defense, eligible_regions, DefenseKind};
pub use engine::{
    add_markers, resume_with_region, Cascade, CascadeStatus, Cause, Continuation, Frame,
    ResumeTarget, Suspension, MARKER_CAP,
};
pub use report::PlacementReport;
