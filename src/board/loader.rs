//! Board loading from TOML tables.
//!
//! Each variant ships an embedded table under `data/`. Links are listed once
//! per pair; the loader makes them symmetric.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use smallvec::SmallVec;

use super::location::{Location, LocationId, RegionId};
use crate::cards::EventCard;
use crate::core::{Color, ConfigError, Variant};

/// Where to load a board from.
#[derive(Clone, Debug)]
pub enum BoardSource<'a> {
    /// The table shipped with the crate for a variant.
    Embedded(Variant),
    /// A TOML document.
    Toml(&'a str),
    /// A TOML file on disk.
    Path(String),
}

#[derive(Debug, Deserialize)]
struct RawBoard {
    name: String,
    variant: Variant,
    outbreak_limit: u8,
    marker_supply: u8,
    #[serde(default = "default_mutation_supply")]
    mutation_supply: u8,
    #[serde(default)]
    legion_supply: u8,
    #[serde(default)]
    purification_supply: u8,
    infection_rates: Vec<u8>,
    starting_hands: [usize; 3],
    starting_location: String,
    #[serde(default)]
    regions: Vec<String>,
    events: Vec<EventCard>,
    locations: Vec<RawLocation>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    name: String,
    color: Color,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    regions: Vec<String>,
    #[serde(default)]
    capital: bool,
}

fn default_mutation_supply() -> u8 {
    12
}

/// Compiled, immutable tables for one variant.
#[derive(Clone, Debug)]
pub struct Board {
    pub name: String,
    pub variant: Variant,
    locations: Vec<Location>,
    by_name: FxHashMap<String, LocationId>,
    regions: Vec<String>,
    /// Escalation counter value that ends the game.
    pub outbreak_limit: u8,
    /// Markers per standard color.
    pub marker_supply: u8,
    /// Purple markers (mutation challenge).
    pub mutation_supply: u8,
    pub legion_supply: u8,
    pub purification_supply: u8,
    /// Threat cards drawn per turn, indexed by escalation cards drawn.
    pub infection_rates: Vec<u8>,
    pub starting_location: LocationId,
    pub capital: Option<LocationId>,
    /// Event pool for this variant.
    pub events: Vec<EventCard>,
    starting_hands: [usize; 3],
}

impl Board {
    /// Get a location by ID.
    ///
    /// Panics if the ID is not from this board.
    #[must_use]
    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }

    /// Get a location by ID, if it exists.
    #[must_use]
    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    /// All locations in ID order.
    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Number of locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Check if the board has no locations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Look up a location by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<LocationId> {
        self.by_name.get(name).copied()
    }

    /// Adjacent locations.
    #[must_use]
    pub fn neighbors(&self, id: LocationId) -> &[LocationId] {
        &self.location(id).links
    }

    /// Number of regions.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Region display name.
    #[must_use]
    pub fn region_name(&self, id: RegionId) -> Option<&str> {
        self.regions.get(id.index()).map(String::as_str)
    }

    /// Look up a region by name.
    #[must_use]
    pub fn find_region(&self, name: &str) -> Option<RegionId> {
        self.regions
            .iter()
            .position(|r| r == name)
            .map(|i| RegionId::new(i as u8))
    }

    /// Threat cards drawn per turn after `escalations` escalation cards.
    #[must_use]
    pub fn infection_rate(&self, escalations: u8) -> u8 {
        let idx = usize::from(escalations).min(self.infection_rates.len() - 1);
        self.infection_rates[idx]
    }

    /// Cards dealt to each player at setup.
    #[must_use]
    pub fn starting_hand_size(&self, player_count: usize) -> usize {
        self.starting_hands[player_count.clamp(2, 4) - 2]
    }

    /// Number of links on the shortest path between two locations.
    #[must_use]
    pub fn distance(&self, from: LocationId, to: LocationId) -> Option<usize> {
        let mut seen = vec![false; self.locations.len()];
        let mut queue = VecDeque::from([(from, 0usize)]);
        seen[from.index()] = true;

        while let Some((at, dist)) = queue.pop_front() {
            if at == to {
                return Some(dist);
            }
            for &next in self.neighbors(at) {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }

    /// Locations bordering a region.
    pub fn region_locations(&self, region: RegionId) -> impl Iterator<Item = &Location> {
        self.locations.iter().filter(move |l| l.borders(region))
    }
}

/// Load and compile a board.
pub fn load_board(source: BoardSource<'_>) -> Result<Board, ConfigError> {
    let raw: RawBoard = match source {
        BoardSource::Embedded(variant) => toml::from_str(embedded_table(variant))?,
        BoardSource::Toml(text) => toml::from_str(text)?,
        BoardSource::Path(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
    };
    compile_board(raw)
}

fn embedded_table(variant: Variant) -> &'static str {
    match variant {
        Variant::Classic => include_str!("../../data/classic.toml"),
        Variant::Siege => include_str!("../../data/siege.toml"),
        Variant::Frontier => include_str!("../../data/frontier.toml"),
    }
}

fn compile_board(raw: RawBoard) -> Result<Board, ConfigError> {
    if raw.infection_rates.is_empty() {
        return Err(ConfigError::EmptyRates);
    }

    let mut by_name = FxHashMap::default();
    for (i, loc) in raw.locations.iter().enumerate() {
        if by_name.insert(loc.name.clone(), LocationId::new(i as u16)).is_some() {
            return Err(ConfigError::DuplicateLocation(loc.name.clone()));
        }
    }

    let lookup = |name: &str| {
        by_name
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownLocation(name.to_string()))
    };
    let region_lookup = |name: &str| {
        raw.regions
            .iter()
            .position(|r| r == name)
            .map(|i| RegionId::new(i as u8))
            .ok_or_else(|| ConfigError::UnknownRegion(name.to_string()))
    };

    let mut locations = Vec::with_capacity(raw.locations.len());
    for (i, loc) in raw.locations.iter().enumerate() {
        let mut regions = loc
            .regions
            .iter()
            .map(|r| region_lookup(r))
            .collect::<Result<SmallVec<[RegionId; 4]>, _>>()?;
        regions.sort();
        regions.dedup();
        locations.push(Location {
            id: LocationId::new(i as u16),
            name: loc.name.clone(),
            color: loc.color,
            links: SmallVec::new(),
            regions,
            capital: loc.capital,
        });
    }

    // Links are undirected; each pair may be listed on either side.
    for (i, loc) in raw.locations.iter().enumerate() {
        let from = LocationId::new(i as u16);
        for name in &loc.links {
            let to = lookup(name)?;
            if to == from {
                return Err(ConfigError::SelfLink(loc.name.clone()));
            }
            if !locations[from.index()].links.contains(&to) {
                locations[from.index()].links.push(to);
            }
            if !locations[to.index()].links.contains(&from) {
                locations[to.index()].links.push(from);
            }
        }
    }
    for loc in &mut locations {
        loc.links.sort();
    }

    let starting_location = lookup(&raw.starting_location)?;
    let capital = locations.iter().find(|l| l.capital).map(|l| l.id);

    Ok(Board {
        name: raw.name,
        variant: raw.variant,
        locations,
        by_name,
        regions: raw.regions,
        outbreak_limit: raw.outbreak_limit,
        marker_supply: raw.marker_supply,
        mutation_supply: raw.mutation_supply,
        legion_supply: raw.legion_supply,
        purification_supply: raw.purification_supply,
        infection_rates: raw.infection_rates,
        starting_location,
        capital,
        events: raw.events,
        starting_hands: raw.starting_hands,
    })
}
