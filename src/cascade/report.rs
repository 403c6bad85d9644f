//! Placement reports.

use serde::{Deserialize, Serialize};

use super::defense::DefenseKind;
use crate::board::LocationId;
use crate::core::Color;

/// Result of one placement attempt, including ones a defense cancelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub location: LocationId,
    pub color: Color,
    /// Defense that cancelled or absorbed part of the placement.
    pub defended: Option<DefenseKind>,
    /// Markers actually put on the board.
    pub added: u8,
    /// The placement overflowed and started an outbreak here.
    pub outbreak: bool,
}

impl PlacementReport {
    #[must_use]
    pub fn is_defended(&self) -> bool {
        self.defended.is_some()
    }
}
