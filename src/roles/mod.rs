//! Roles and their capability sets.
//!
//! Every per-role rule deviation is expressed as a field of `Capabilities`.
//! Command handlers and the cascade engine ask `role.capabilities()` instead
//! of comparing roles directly.

use serde::{Deserialize, Serialize};

use crate::core::Variant;

/// A role card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Medic,
    QuarantineSpecialist,
    Scientist,
    Researcher,
    OperationsExpert,
    ContingencyPlanner,
    Generalist,
    Analyst,
    Centurion,
    Engineer,
    FieldOperative,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Rule deviations granted by a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// Actions per turn.
    pub action_budget: u8,
    pub hand_limit: usize,
    /// Location cards of one color needed to cure.
    pub cure_cards: usize,
    /// Treat removes every marker of the color.
    pub treats_all: bool,
    /// Markers of cured colors are removed wherever this player stands.
    pub clears_cured_on_entry: bool,
    /// Blocks placement at the own and adjacent locations.
    pub nullifies_nearby: bool,
    /// Builds stations and forts without discarding.
    pub builds_without_card: bool,
    /// May give any location card when sharing knowledge.
    pub gives_any_card: bool,
    pub holds_contingency: bool,
    /// Arranges the top threat cards at the start of each turn.
    pub previews_threats: bool,
    pub extra_battle_dice: u8,
    pub lays_rail_free: bool,
    /// Keeps one treated marker per turn; three samples stand in for two cards.
    pub collects_samples: bool,
}

impl Capabilities {
    const BASE: Capabilities = Capabilities {
        action_budget: 4,
        hand_limit: 7,
        cure_cards: 5,
        treats_all: false,
        clears_cured_on_entry: false,
        nullifies_nearby: false,
        builds_without_card: false,
        gives_any_card: false,
        holds_contingency: false,
        previews_threats: false,
        extra_battle_dice: 0,
        lays_rail_free: false,
        collects_samples: false,
    };
}

impl Role {
    /// Capability lookup.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        let base = Capabilities::BASE;
        match self {
            Role::Medic => Capabilities {
                treats_all: true,
                clears_cured_on_entry: true,
                ..base
            },
            Role::QuarantineSpecialist => Capabilities {
                nullifies_nearby: true,
                ..base
            },
            Role::Scientist => Capabilities {
                cure_cards: 4,
                ..base
            },
            Role::Researcher => Capabilities {
                gives_any_card: true,
                ..base
            },
            Role::OperationsExpert => Capabilities {
                builds_without_card: true,
                ..base
            },
            Role::ContingencyPlanner => Capabilities {
                holds_contingency: true,
                ..base
            },
            Role::Generalist => Capabilities {
                action_budget: 5,
                ..base
            },
            Role::Analyst => Capabilities {
                previews_threats: true,
                ..base
            },
            Role::Centurion => Capabilities {
                extra_battle_dice: 1,
                ..base
            },
            Role::Engineer => Capabilities {
                lays_rail_free: true,
                ..base
            },
            Role::FieldOperative => Capabilities {
                collects_samples: true,
                ..base
            },
        }
    }

    /// Roles dealt in a variant.
    #[must_use]
    pub fn pool(variant: Variant) -> &'static [Role] {
        match variant {
            Variant::Classic => &[
                Role::Medic,
                Role::QuarantineSpecialist,
                Role::Scientist,
                Role::Researcher,
                Role::OperationsExpert,
                Role::ContingencyPlanner,
                Role::Generalist,
                Role::Analyst,
                Role::FieldOperative,
            ],
            Variant::Siege => &[
                Role::Medic,
                Role::Centurion,
                Role::Scientist,
                Role::Researcher,
                Role::OperationsExpert,
                Role::Generalist,
            ],
            Variant::Frontier => &[
                Role::Medic,
                Role::Engineer,
                Role::Scientist,
                Role::QuarantineSpecialist,
                Role::Generalist,
                Role::Analyst,
            ],
        }
    }

    /// Check availability in a variant.
    #[must_use]
    pub fn available_in(self, variant: Variant) -> bool {
        Role::pool(variant).contains(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capabilities() {
        let caps = Role::Researcher.capabilities();
        assert_eq!(caps.action_budget, 4);
        assert_eq!(caps.hand_limit, 7);
        assert_eq!(caps.cure_cards, 5);
        assert!(caps.gives_any_card);
        assert!(!caps.treats_all);
    }

    #[test]
    fn test_role_deviations() {
        assert_eq!(Role::Generalist.capabilities().action_budget, 5);
        assert_eq!(Role::Scientist.capabilities().cure_cards, 4);
        assert!(Role::Medic.capabilities().clears_cured_on_entry);
        assert!(Role::QuarantineSpecialist.capabilities().nullifies_nearby);
        assert_eq!(Role::Centurion.capabilities().extra_battle_dice, 1);
    }

    #[test]
    fn test_pools_are_variant_specific() {
        assert!(Role::Centurion.available_in(Variant::Siege));
        assert!(!Role::Centurion.available_in(Variant::Classic));
        assert!(Role::Engineer.available_in(Variant::Frontier));
        for variant in [Variant::Classic, Variant::Siege, Variant::Frontier] {
            assert!(Role::pool(variant).len() >= 4);
        }
    }
}
