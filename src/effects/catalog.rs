//! Static metadata for each event card.

use crate::cards::EventCard;

/// When an event may be played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timing {
    /// Any event window.
    Anytime,
    /// Only while the active player is taking actions.
    Actions,
}

/// How an event resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Applied when played; the phase is unchanged.
    Immediate,
    /// Opens its own transient phase and waits for `ResolveEvent`.
    Interactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSpec {
    pub timing: Timing,
    pub shape: Shape,
    /// Offers the safe/corrupt choice.
    pub risk: bool,
}

const fn spec(timing: Timing, shape: Shape, risk: bool) -> EventSpec {
    EventSpec {
        timing,
        shape,
        risk,
    }
}

/// Metadata lookup.
#[must_use]
pub const fn event_spec(card: EventCard) -> EventSpec {
    use Shape::{Immediate, Interactive};
    use Timing::{Actions, Anytime};

    match card {
        EventCard::Airlift
        | EventCard::OneQuietNight
        | EventCard::GovernmentGrant
        | EventCard::RemoteTreatment
        | EventCard::CommercialTravelBan
        | EventCard::Quarantine
        | EventCard::WaterReserves
        | EventCard::FieldHospital => spec(Anytime, Immediate, false),
        EventCard::BorrowedTime => spec(Actions, Immediate, false),
        EventCard::Mercenaries
        | EventCard::Bribery
        | EventCard::ForcedMarch
        | EventCard::Fortification => spec(Anytime, Immediate, true),
        EventCard::ResilientPopulation
        | EventCard::Forecast
        | EventCard::NewAssignment
        | EventCard::ReexaminedResearch
        | EventCard::Evacuation
        | EventCard::RailwayConcession => spec(Anytime, Interactive, false),
        EventCard::HiddenTreasury | EventCard::Augury => spec(Anytime, Interactive, true),
    }
}

/// Events that show cards from a face-down pile once opened.
#[must_use]
pub const fn reveals_hidden(card: EventCard) -> bool {
    matches!(
        card,
        EventCard::Forecast | EventCard::HiddenTreasury | EventCard::Augury
    )
}
