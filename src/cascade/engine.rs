//! Marker placement and outbreak chains.
//!
//! A cascade is an explicit stack of frames instead of recursion:
//!
//! - `Place` puts markers on one location, after defenses.
//! - `Spread` hands one marker (or two, for the first outbreak under a
//!   highly contagious strain) to each remaining neighbor of an outbreak.
//!
//! When a `Spread` frame is popped it pushes itself back with the rest of
//! its neighbors before pushing the `Place` for the next one, so the order
//! is depth first, exactly like the recursive formulation. When a
//! placement needs an external choice, the unfinished `Place` frame is
//! pushed back and the whole `Cascade` value is returned to the caller.
//! Resuming runs the same stack again from that point.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use super::defense::{blocking_defense, eligible_regions, DefenseKind};
use super::report::PlacementReport;
use crate::board::{Board, LocationId, RegionId};
use crate::cards::VirulentStrain;
use crate::core::{Color, CommandError, GameState, Variant};
use crate::rules::GameResult;

/// Marker cap per color per location.
pub const MARKER_CAP: u8 = 3;

/// Why markers are being placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cause {
    /// Threat cards and escalation infections.
    Infection,
    /// Initial placement during setup.
    Setup,
    /// Mutation cards and wildcards.
    Mutation,
}

/// One unit of pending cascade work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    Place {
        location: LocationId,
        color: Color,
        count: u8,
    },
    Spread {
        color: Color,
        /// Neighbors still to visit, last element first.
        remaining: SmallVec<[LocationId; 6]>,
        per_neighbor: u8,
    },
}

/// An in-flight cascade.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cascade {
    frames: Vec<Frame>,
    /// Locations that have outbroken in this chain.
    pub outbroken: im::OrdSet<LocationId>,
    first_outbreak_pending: bool,
    /// Region used for every multi-region token choice where it is eligible.
    pub preselected: Option<RegionId>,
    /// One-shot answer supplied by a resume.
    choice: Option<RegionId>,
}

/// How a cascade run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CascadeStatus {
    Done,
    /// Waiting for a purification-region choice.
    Suspended(Suspension),
    /// The game ended during the cascade.
    Terminal,
}

/// A cascade paused on a token choice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suspension {
    pub location: LocationId,
    pub color: Color,
    pub regions: SmallVec<[RegionId; 4]>,
    pub cascade: Cascade,
}

/// The higher-level step a suspended cascade was serving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumeTarget {
    ThreatDraw,
    EscalationInfect { strain: Option<VirulentStrain> },
    MutationDraw,
    Wildcard,
}

/// Persisted record of a suspended cascade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    pub cascade: Cascade,
    pub resume: ResumeTarget,
}

enum Step {
    Continue,
    Suspend(SmallVec<[RegionId; 4]>, LocationId, Color),
    Terminal,
}

impl Cascade {
    /// Start a cascade placing `count` markers on `location`.
    #[must_use]
    pub fn new(location: LocationId, color: Color, count: u8) -> Self {
        Self {
            frames: vec![Frame::Place {
                location,
                color,
                count,
            }],
            outbroken: im::OrdSet::new(),
            first_outbreak_pending: true,
            preselected: None,
            choice: None,
        }
    }

    /// Pre-select the region used for token choices.
    #[must_use]
    pub fn with_preselected_region(mut self, region: RegionId) -> Self {
        self.preselected = Some(region);
        self
    }

    /// Pending frames, next first.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter().rev()
    }

    /// Run until done, suspended or terminal.
    pub fn run(mut self, state: &mut GameState, board: &Board) -> CascadeStatus {
        while let Some(frame) = self.frames.pop() {
            if state.is_over() {
                return CascadeStatus::Terminal;
            }
            match frame {
                Frame::Place {
                    location,
                    color,
                    count,
                } => match self.place(state, board, location, color, count) {
                    Step::Continue => {}
                    Step::Terminal => return CascadeStatus::Terminal,
                    Step::Suspend(regions, location, color) => {
                        return CascadeStatus::Suspended(Suspension {
                            location,
                            color,
                            regions,
                            cascade: self,
                        })
                    }
                },
                Frame::Spread {
                    color,
                    mut remaining,
                    per_neighbor,
                } => {
                    let Some(next) = remaining.pop() else {
                        continue;
                    };
                    if !remaining.is_empty() {
                        self.frames.push(Frame::Spread {
                            color,
                            remaining,
                            per_neighbor,
                        });
                    }
                    self.frames.push(Frame::Place {
                        location: next,
                        color,
                        count: per_neighbor,
                    });
                }
            }
        }

        if state.is_over() {
            CascadeStatus::Terminal
        } else {
            CascadeStatus::Done
        }
    }

    fn place(
        &mut self,
        state: &mut GameState,
        board: &Board,
        location: LocationId,
        color: Color,
        mut count: u8,
    ) -> Step {
        if let Some(kind) = blocking_defense(state, board, location, color) {
            record(state, location, color, Some(kind), 0, false);
            return Step::Continue;
        }

        let mut absorbed_by = None;
        match state.variant {
            Variant::Siege => {
                let legions = state.legions_at(location);
                let used = legions.min(count);
                if used > 0 {
                    state.set_legions(location, legions - used);
                    state.legion_supply += used;
                    count -= used;
                    absorbed_by = Some(DefenseKind::Legions);
                }
            }
            Variant::Frontier => {
                while count > 0 {
                    let regions = eligible_regions(state, board, location);
                    let region = match regions.len() {
                        0 => break,
                        1 => regions[0],
                        _ => {
                            let chosen = self
                                .choice
                                .take()
                                .filter(|r| regions.contains(r))
                                .or(self.preselected.filter(|r| regions.contains(r)));
                            match chosen {
                                Some(r) => r,
                                None => {
                                    if absorbed_by.is_some() {
                                        record(state, location, color, absorbed_by, 0, false);
                                    }
                                    self.frames.push(Frame::Place {
                                        location,
                                        color,
                                        count,
                                    });
                                    return Step::Suspend(regions, location, color);
                                }
                            }
                        }
                    };
                    state.purification[region.index()] -= 1;
                    state.purification_supply += 1;
                    count -= 1;
                    absorbed_by = Some(DefenseKind::Purification(region));
                }
            }
            Variant::Classic => {}
        }

        if count == 0 {
            record(state, location, color, absorbed_by, 0, false);
            return Step::Continue;
        }

        let room = MARKER_CAP.saturating_sub(state.markers_at(location, color));
        let added = count.min(room);
        if state.supply[color] < added {
            record(state, location, color, absorbed_by, 0, false);
            state.end_game(GameResult::defeat(format!("{color} supply exhausted")));
            return Step::Terminal;
        }
        state.markers[location.index()][color] += added;
        state.supply[color] -= added;

        let outbreak = count > room && !self.outbroken.contains(&location);
        record(state, location, color, absorbed_by, added, outbreak);

        if outbreak {
            return self.trigger_outbreak(state, board, location, color);
        }
        Step::Continue
    }

    fn trigger_outbreak(
        &mut self,
        state: &mut GameState,
        board: &Board,
        location: LocationId,
        color: Color,
    ) -> Step {
        if self.outbroken.contains(&location) || state.is_over() {
            return Step::Continue;
        }
        self.outbroken.insert(location);

        if state.variant == Variant::Siege && board.capital == Some(location) {
            state.end_game(GameResult::defeat(format!(
                "{} was overrun",
                board.location(location).name
            )));
            return Step::Terminal;
        }

        let amount = if state.strain_applies(VirulentStrain::SlipperySlope, color) {
            2
        } else {
            1
        };
        state.escalate(amount);
        debug!(
            location = %board.location(location).name,
            color = %color,
            outbreaks = state.outbreaks,
            "outbreak"
        );
        state.log_message(format!(
            "outbreak of {color} in {}",
            board.location(location).name
        ));
        if state.is_over() {
            return Step::Terminal;
        }

        let per_neighbor = if self.first_outbreak_pending
            && state.strain_applies(VirulentStrain::HighlyContagious, color)
        {
            2
        } else {
            1
        };
        self.first_outbreak_pending = false;

        let remaining: SmallVec<[LocationId; 6]> =
            board.neighbors(location).iter().rev().copied().collect();
        self.frames.push(Frame::Spread {
            color,
            remaining,
            per_neighbor,
        });
        Step::Continue
    }
}

fn record(
    state: &mut GameState,
    location: LocationId,
    color: Color,
    defended: Option<DefenseKind>,
    added: u8,
    outbreak: bool,
) {
    state.last_report.push_back(PlacementReport {
        location,
        color,
        defended,
        added,
        outbreak,
    });
}

/// Place markers and run any outbreak chain they cause.
///
/// Infections of a location holding exactly one marker of a chronic
/// virulent color place one extra marker.
pub fn add_markers(
    state: &mut GameState,
    board: &Board,
    location: LocationId,
    color: Color,
    count: u8,
    cause: Cause,
) -> CascadeStatus {
    if state.is_over() {
        return CascadeStatus::Terminal;
    }
    let mut count = count;
    if cause == Cause::Infection
        && state.strain_applies(VirulentStrain::ChronicEffect, color)
        && state.markers_at(location, color) == 1
    {
        count += 1;
    }
    Cascade::new(location, color, count).run(state, board)
}

/// Resume a suspended cascade with the chosen region.
pub fn resume_with_region(
    state: &mut GameState,
    board: &Board,
    mut cascade: Cascade,
    region: RegionId,
) -> Result<CascadeStatus, CommandError> {
    let Some(Frame::Place { location, .. }) = cascade.frames.last() else {
        return Err(CommandError::Internal(
            "suspended cascade has no pending placement".to_string(),
        ));
    };
    let regions = eligible_regions(state, board, *location);
    if !regions.contains(&region) {
        return Err(CommandError::not_allowed(format!(
            "{region} holds no tokens next to {}",
            board.location(*location).name
        )));
    }
    cascade.choice = Some(region);
    Ok(cascade.run(state, board))
}
