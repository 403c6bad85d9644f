//! Commands: the only way to mutate a game.
//!
//! Actions carry no player field; they always act for the active player.
//! Commands that any player may issue (events, discards, starting
//! locations) name the player explicitly.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::color::Color;
use super::player::PlayerId;
use crate::board::{LocationId, RegionId};
use crate::cards::{EventCard, PlayerCard};
use crate::roles::Role;

/// A player-issued command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    // === Setup ===
    StartGame,
    ChooseStartingLocation { player: PlayerId, location: LocationId },

    // === Actions ===
    Drive { to: LocationId },
    /// Discard the destination's card.
    DirectFlight { to: LocationId },
    /// Discard the current location's card.
    CharterFlight { to: LocationId },
    /// Between two research stations.
    ShuttleFlight { to: LocationId },
    BuildResearchStation,
    BuildFort,
    /// Hospital for the current location's color.
    BuildHospital,
    BuildRail { to: LocationId },
    PurifyWater { region: RegionId },
    Treat { color: Color },
    /// Give (or take) the location card `card` to (from) a co-located player.
    ShareKnowledge { with: PlayerId, card: LocationId, give: bool },
    DiscoverCure { color: Color },
    RecruitLegions,
    Battle,
    RetrieveEvent { card: EventCard },

    // === Flow ===
    EndActions,
    Proceed,
    Discard { player: PlayerId, card: PlayerCard },
    CommitBattle,
    /// New order of the previewed threat cards, top first, as indices into
    /// the preview.
    ArrangeThreatCards { order: SmallVec<[usize; 6]> },
    ChoosePurificationRegion { region: RegionId },
    Undo,

    // === Events ===
    PlayEvent {
        player: PlayerId,
        card: EventCard,
        option: RiskOption,
        target: EventTarget,
    },
    ResolveEvent(EventChoice),
    CancelEvent,
}

impl Command {
    /// Fieldless discriminant.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::StartGame => CommandKind::StartGame,
            Command::ChooseStartingLocation { .. } => CommandKind::ChooseStartingLocation,
            Command::Drive { .. } => CommandKind::Drive,
            Command::DirectFlight { .. } => CommandKind::DirectFlight,
            Command::CharterFlight { .. } => CommandKind::CharterFlight,
            Command::ShuttleFlight { .. } => CommandKind::ShuttleFlight,
            Command::BuildResearchStation => CommandKind::BuildResearchStation,
            Command::BuildFort => CommandKind::BuildFort,
            Command::BuildHospital => CommandKind::BuildHospital,
            Command::BuildRail { .. } => CommandKind::BuildRail,
            Command::PurifyWater { .. } => CommandKind::PurifyWater,
            Command::Treat { .. } => CommandKind::Treat,
            Command::ShareKnowledge { .. } => CommandKind::ShareKnowledge,
            Command::DiscoverCure { .. } => CommandKind::DiscoverCure,
            Command::RecruitLegions => CommandKind::RecruitLegions,
            Command::Battle => CommandKind::Battle,
            Command::RetrieveEvent { .. } => CommandKind::RetrieveEvent,
            Command::EndActions => CommandKind::EndActions,
            Command::Proceed => CommandKind::Proceed,
            Command::Discard { .. } => CommandKind::Discard,
            Command::CommitBattle => CommandKind::CommitBattle,
            Command::ArrangeThreatCards { .. } => CommandKind::ArrangeThreatCards,
            Command::ChoosePurificationRegion { .. } => CommandKind::ChoosePurificationRegion,
            Command::Undo => CommandKind::Undo,
            Command::PlayEvent { .. } => CommandKind::PlayEvent,
            Command::ResolveEvent(_) => CommandKind::ResolveEvent,
            Command::CancelEvent => CommandKind::CancelEvent,
        }
    }
}

/// Command discriminant, used by the legality table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandKind {
    StartGame,
    ChooseStartingLocation,
    Drive,
    DirectFlight,
    CharterFlight,
    ShuttleFlight,
    BuildResearchStation,
    BuildFort,
    BuildHospital,
    BuildRail,
    PurifyWater,
    Treat,
    ShareKnowledge,
    DiscoverCure,
    RecruitLegions,
    Battle,
    RetrieveEvent,
    EndActions,
    Proceed,
    Discard,
    CommitBattle,
    ArrangeThreatCards,
    ChoosePurificationRegion,
    Undo,
    PlayEvent,
    ResolveEvent,
    CancelEvent,
}

impl CommandKind {
    pub const ALL: [CommandKind; 27] = [
        CommandKind::StartGame,
        CommandKind::ChooseStartingLocation,
        CommandKind::Drive,
        CommandKind::DirectFlight,
        CommandKind::CharterFlight,
        CommandKind::ShuttleFlight,
        CommandKind::BuildResearchStation,
        CommandKind::BuildFort,
        CommandKind::BuildHospital,
        CommandKind::BuildRail,
        CommandKind::PurifyWater,
        CommandKind::Treat,
        CommandKind::ShareKnowledge,
        CommandKind::DiscoverCure,
        CommandKind::RecruitLegions,
        CommandKind::Battle,
        CommandKind::RetrieveEvent,
        CommandKind::EndActions,
        CommandKind::Proceed,
        CommandKind::Discard,
        CommandKind::CommitBattle,
        CommandKind::ArrangeThreatCards,
        CommandKind::ChoosePurificationRegion,
        CommandKind::Undo,
        CommandKind::PlayEvent,
        CommandKind::ResolveEvent,
        CommandKind::CancelEvent,
    ];

    /// Costs one action of the active player.
    #[must_use]
    pub const fn is_action(self) -> bool {
        matches!(
            self,
            CommandKind::Drive
                | CommandKind::DirectFlight
                | CommandKind::CharterFlight
                | CommandKind::ShuttleFlight
                | CommandKind::BuildResearchStation
                | CommandKind::BuildFort
                | CommandKind::BuildHospital
                | CommandKind::BuildRail
                | CommandKind::PurifyWater
                | CommandKind::Treat
                | CommandKind::ShareKnowledge
                | CommandKind::DiscoverCure
                | CommandKind::RecruitLegions
                | CommandKind::Battle
                | CommandKind::RetrieveEvent
        )
    }

    /// Reversibility that does not depend on the game state.
    ///
    /// Events are decided per card; see `history::is_reversible`.
    #[must_use]
    pub const fn is_reversible(self) -> bool {
        !matches!(
            self,
            CommandKind::StartGame
                | CommandKind::Proceed
                | CommandKind::Battle
                | CommandKind::CommitBattle
                | CommandKind::ChoosePurificationRegion
                | CommandKind::ArrangeThreatCards
        )
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Binary choice offered by risk/reward events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskOption {
    #[default]
    Safe,
    /// Stronger effect; advances the escalation counter by one.
    Corrupt,
}

/// Target supplied when an event is played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTarget {
    #[default]
    None,
    Move { player: PlayerId, to: LocationId },
    Location(LocationId),
    Markers { location: LocationId, color: Color },
    Region(RegionId),
}

/// Follow-up input for an interactive event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventChoice {
    Location(LocationId),
    /// Permutation of revealed cards, top first.
    Order(SmallVec<[usize; 6]>),
    /// Indices of revealed cards to take.
    Cards(SmallVec<[usize; 4]>),
    Role { player: PlayerId, role: Role },
    Rail { from: LocationId, to: LocationId },
    /// Finish a multi-step event early.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        let cmd = Command::Treat { color: Color::Red };
        assert_eq!(cmd.kind(), CommandKind::Treat);
        assert!(cmd.kind().is_action());
        assert!(!CommandKind::Proceed.is_action());
    }

    #[test]
    fn test_irreversible_kinds() {
        assert!(!CommandKind::Proceed.is_reversible());
        assert!(!CommandKind::CommitBattle.is_reversible());
        assert!(CommandKind::Drive.is_reversible());
        assert!(CommandKind::Discard.is_reversible());
    }

    #[test]
    fn test_all_kinds_unique() {
        let mut kinds = CommandKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), CommandKind::ALL.len());
    }

    #[test]
    fn test_command_serde() {
        let cmd = Command::PlayEvent {
            player: PlayerId::new(1),
            card: EventCard::Airlift,
            option: RiskOption::Safe,
            target: EventTarget::Move {
                player: PlayerId::new(0),
                to: LocationId::new(4),
            },
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, back);
    }
}
