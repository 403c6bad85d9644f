//! Card families: the player deck and the threat deck.
//!
//! ## Key Types
//!
//! - `PlayerCard`: Location, event, escalation, virulent escalation or mutation card
//! - `ThreatCard`: Location card or a mutation wildcard
//! - `EventCard`: The closed set of optional effects
//! - `VirulentStrain` / `MutationCard`: Challenge-module cards
//!
//! Card stacks are `im::Vector`s with the top of the pile at the back.

pub mod deck;

use serde::{Deserialize, Serialize};

use crate::board::LocationId;
use crate::core::Color;

pub use deck::{
    add_wildcards, assemble_draw_pile, build_player_deck, build_threat_deck, intensify,
    is_partial_permutation, partition_with_escalations, rearrange_top, PlayerDeck,
};

/// A card from the main (player) deck.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerCard {
    Location { location: LocationId, color: Color },
    Event(EventCard),
    Escalation,
    /// Escalation card that also carries a virulent strain.
    Virulent(VirulentStrain),
    Mutation(MutationCard),
}

impl PlayerCard {
    /// Location card for `location`, if this is one.
    #[must_use]
    pub fn location(&self) -> Option<LocationId> {
        match self {
            PlayerCard::Location { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// Color of a location card.
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        match self {
            PlayerCard::Location { color, .. } => Some(*color),
            _ => None,
        }
    }

    /// Event carried by this card.
    #[must_use]
    pub fn event(&self) -> Option<EventCard> {
        match self {
            PlayerCard::Event(e) => Some(*e),
            _ => None,
        }
    }

    /// Escalation or virulent escalation.
    #[must_use]
    pub fn is_escalation(&self) -> bool {
        matches!(self, PlayerCard::Escalation | PlayerCard::Virulent(_))
    }

    /// Cards that may sit in a player's hand.
    #[must_use]
    pub fn is_holdable(&self) -> bool {
        matches!(self, PlayerCard::Location { .. } | PlayerCard::Event(_))
    }
}

impl std::fmt::Display for PlayerCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerCard::Location { location, color } => write!(f, "{location} ({color})"),
            PlayerCard::Event(e) => write!(f, "{e}"),
            PlayerCard::Escalation => f.write_str("Escalation"),
            PlayerCard::Virulent(s) => write!(f, "Escalation: {s:?}"),
            PlayerCard::Mutation(m) => write!(f, "{m:?}"),
        }
    }
}

/// A card from the threat deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreatCard {
    Location { location: LocationId, color: Color },
    /// Places a purple marker at the location of the bottom threat card.
    Mutation,
}

impl ThreatCard {
    #[must_use]
    pub fn location(&self) -> Option<LocationId> {
        match self {
            ThreatCard::Location { location, .. } => Some(*location),
            ThreatCard::Mutation => None,
        }
    }
}

/// Optional effect cards.
///
/// Which events appear in a game is decided by the variant's event pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCard {
    Airlift,
    OneQuietNight,
    GovernmentGrant,
    RemoteTreatment,
    BorrowedTime,
    CommercialTravelBan,
    Mercenaries,
    Bribery,
    ForcedMarch,
    Fortification,
    Quarantine,
    WaterReserves,
    FieldHospital,
    ResilientPopulation,
    Forecast,
    NewAssignment,
    ReexaminedResearch,
    HiddenTreasury,
    Augury,
    Evacuation,
    RailwayConcession,
}

impl EventCard {
    /// Every event, in declaration order.
    pub const ALL: [EventCard; 21] = [
        EventCard::Airlift,
        EventCard::OneQuietNight,
        EventCard::GovernmentGrant,
        EventCard::RemoteTreatment,
        EventCard::BorrowedTime,
        EventCard::CommercialTravelBan,
        EventCard::Mercenaries,
        EventCard::Bribery,
        EventCard::ForcedMarch,
        EventCard::Fortification,
        EventCard::Quarantine,
        EventCard::WaterReserves,
        EventCard::FieldHospital,
        EventCard::ResilientPopulation,
        EventCard::Forecast,
        EventCard::NewAssignment,
        EventCard::ReexaminedResearch,
        EventCard::HiddenTreasury,
        EventCard::Augury,
        EventCard::Evacuation,
        EventCard::RailwayConcession,
    ];
}

impl std::fmt::Display for EventCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Long-lived modifier attached to escalation cards when the virulent
/// strain challenge is enabled. Applies to the virulent color only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VirulentStrain {
    /// Outbreaks advance the escalation counter by two.
    SlipperySlope,
    /// The first outbreak of a chain places two markers per neighbor.
    HighlyContagious,
    /// Infecting a location holding exactly one marker adds one more.
    ChronicEffect,
    /// Four markers leave the game permanently.
    UnacceptableLoss,
    /// Curing needs one extra card.
    ComplexMolecularStructure,
}

impl VirulentStrain {
    pub const ALL: [VirulentStrain; 5] = [
        VirulentStrain::SlipperySlope,
        VirulentStrain::HighlyContagious,
        VirulentStrain::ChronicEffect,
        VirulentStrain::UnacceptableLoss,
        VirulentStrain::ComplexMolecularStructure,
    ];
}

/// Rare main-deck cards of the mutation challenge, resolved when drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationCard {
    /// Three purple markers at the bottom threat card's location.
    MutationSpreads,
    /// One purple marker at the bottom threat card's location.
    MutationThreatens,
}

impl MutationCard {
    /// Purple markers placed.
    #[must_use]
    pub const fn markers(self) -> u8 {
        match self {
            MutationCard::MutationSpreads => 3,
            MutationCard::MutationThreatens => 1,
        }
    }
}
