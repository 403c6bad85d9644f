//! Game configuration.
//!
//! `GameConfig` selects the variant, the table size and the optional
//! challenge modules. It can be built in code with the `with_*` methods or
//! read from TOML:
//!
//! ```
//! use contagion::core::{GameConfig, Variant};
//!
//! let config = GameConfig::from_toml_str(r#"
//!     variant = "siege"
//!     player_count = 3
//!     escalation_cards = 5
//!     seed = 7
//! "#).unwrap();
//!
//! assert_eq!(config.variant, Variant::Siege);
//! assert_eq!(config.history_depth, 32);
//! ```

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::roles::Role;

/// One of the three rule sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Base game: research stations, flights.
    Classic,
    /// Escalation-themed: forts, legions, risk/reward events.
    Siege,
    /// Region-themed: hospitals, rail links, purification tokens.
    Frontier,
}

impl Variant {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Siege => "siege",
            Variant::Frontier => "frontier",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn default_escalation_cards() -> usize {
    4
}

fn default_history_depth() -> usize {
    32
}

fn default_log_capacity() -> usize {
    64
}

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub variant: Variant,

    /// Number of players (2-4).
    pub player_count: usize,

    /// Escalation cards shuffled into the main deck (4-6).
    #[serde(default = "default_escalation_cards")]
    pub escalation_cards: usize,

    /// Fixed role assignment in seating order. Dealt randomly when absent.
    #[serde(default)]
    pub roles: Option<Vec<Role>>,

    #[serde(default)]
    pub virulent_strain: bool,

    #[serde(default)]
    pub mutation: bool,

    /// Events shuffled into the main deck. Defaults to two per player.
    #[serde(default)]
    pub event_count: Option<usize>,

    #[serde(default)]
    pub seed: u64,

    /// Maximum undo snapshots kept.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,

    /// Maximum in-state log entries kept.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

impl GameConfig {
    /// Create a configuration with default options.
    #[must_use]
    pub fn new(variant: Variant, player_count: usize) -> Self {
        Self {
            variant,
            player_count,
            escalation_cards: default_escalation_cards(),
            roles: None,
            virulent_strain: false,
            mutation: false,
            event_count: None,
            seed: 0,
            history_depth: default_history_depth(),
            log_capacity: default_log_capacity(),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_escalation_cards(mut self, count: usize) -> Self {
        self.escalation_cards = count;
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = Some(roles);
        self
    }

    #[must_use]
    pub fn with_virulent_strain(mut self, enabled: bool) -> Self {
        self.virulent_strain = enabled;
        self
    }

    #[must_use]
    pub fn with_mutation(mut self, enabled: bool) -> Self {
        self.mutation = enabled;
        self
    }

    #[must_use]
    pub fn with_event_count(mut self, count: usize) -> Self {
        self.event_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    #[must_use]
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Number of events shuffled into the main deck.
    #[must_use]
    pub fn events_to_deal(&self) -> usize {
        self.event_count.unwrap_or(2 * self.player_count)
    }

    /// Check table size, escalation count and fixed roles.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=4).contains(&self.player_count) {
            return Err(ConfigError::PlayerCount(self.player_count));
        }
        if !(4..=6).contains(&self.escalation_cards) {
            return Err(ConfigError::EscalationCards(self.escalation_cards));
        }
        if let Some(roles) = &self.roles {
            if roles.len() != self.player_count {
                return Err(ConfigError::RoleCount {
                    expected: self.player_count,
                    actual: roles.len(),
                });
            }
            for (i, role) in roles.iter().enumerate() {
                if !role.available_in(self.variant) {
                    return Err(ConfigError::RoleUnavailable {
                        role: *role,
                        variant: self.variant,
                    });
                }
                if roles[..i].contains(role) {
                    return Err(ConfigError::DuplicateRole(*role));
                }
            }
        }
        Ok(())
    }
}
