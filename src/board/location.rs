//! Location and region identifiers.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::Color;

/// Location identifier: an index into the board's location table.
///
/// The engine doesn't interpret location IDs beyond indexing; names and
/// adjacency come from the static tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub u16);

impl LocationId {
    /// Create a new location ID.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Index into per-location tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Location({})", self.0)
    }
}

/// Region identifier (Frontier variant). Regions are the areas between
/// locations where purification tokens are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u8);

impl RegionId {
    /// Create a new region ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Index into per-region tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Region({})", self.0)
    }
}

/// A node of the adjacency graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub color: Color,
    /// Adjacent locations, sorted by id.
    pub links: SmallVec<[LocationId; 6]>,
    /// Regions this location borders.
    pub regions: SmallVec<[RegionId; 4]>,
    pub capital: bool,
}

impl Location {
    /// Check whether `other` is directly linked to this location.
    #[must_use]
    pub fn is_linked(&self, other: LocationId) -> bool {
        self.links.contains(&other)
    }

    /// Check whether this location borders `region`.
    #[must_use]
    pub fn borders(&self, region: RegionId) -> bool {
        self.regions.contains(&region)
    }
}
