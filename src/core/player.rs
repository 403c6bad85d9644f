//! Player identification and per-player data.
//!
//! ## PlayerId
//!
//! Type-safe player identifier. Indices are 0-based and follow seating order.
//!
//! ## Player
//!
//! Location, hand, role and the role-specific side slots (contingency card,
//! collected samples).

use im::Vector;
use serde::{Deserialize, Serialize};

use super::color::{Color, ColorMap};
use crate::board::LocationId;
use crate::cards::{EventCard, PlayerCard};
use crate::roles::Role;

/// Player identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    ///
    /// ```
    /// use contagion::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all(3).collect();
    /// assert_eq!(players, vec![PlayerId::new(0), PlayerId::new(1), PlayerId::new(2)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// One seat at the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub role: Role,
    pub location: LocationId,
    pub hand: Vector<PlayerCard>,
    /// Event stored by the contingency ability. Not part of the hand.
    pub contingency: Option<EventCard>,
    /// Markers kept as samples by the field ability.
    pub samples: ColorMap<u8>,
}

impl Player {
    /// Create a player with an empty hand.
    #[must_use]
    pub fn new(id: PlayerId, role: Role, location: LocationId) -> Self {
        Self {
            id,
            role,
            location,
            hand: Vector::new(),
            contingency: None,
            samples: ColorMap::default(),
        }
    }

    /// Check if the hand holds `card`.
    #[must_use]
    pub fn holds(&self, card: &PlayerCard) -> bool {
        self.hand.contains(card)
    }

    /// Remove one copy of `card` from the hand.
    ///
    /// Returns the card if it was found.
    pub fn take_card(&mut self, card: &PlayerCard) -> Option<PlayerCard> {
        let pos = self.hand.index_of(card)?;
        Some(self.hand.remove(pos))
    }

    /// Remove the location card for `location` from the hand.
    pub fn take_location_card(&mut self, location: LocationId) -> Option<PlayerCard> {
        let pos = self
            .hand
            .iter()
            .position(|c| c.location() == Some(location))?;
        Some(self.hand.remove(pos))
    }

    /// Check for the location card of `location`.
    #[must_use]
    pub fn holds_location(&self, location: LocationId) -> bool {
        self.hand.iter().any(|c| c.location() == Some(location))
    }

    /// Number of location cards of `color` in hand.
    #[must_use]
    pub fn count_color(&self, color: Color) -> usize {
        self.hand.iter().filter(|c| c.color() == Some(color)).count()
    }

    /// Check for an event either in hand or in the contingency slot.
    #[must_use]
    pub fn holds_event(&self, event: EventCard) -> bool {
        self.contingency == Some(event) || self.holds(&PlayerCard::Event(event))
    }
}
