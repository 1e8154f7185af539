//! Game configuration.
//!
//! Games configure the engine at startup by providing:
//! - `RoleSlot`s: which roles are in play and how many of each
//! - The ordered list of participating player ids
//! - Engine knobs (dealing seed, idle-phase limit)
//!
//! Configurations can be built in code or loaded from TOML.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::player::PlayerId;
use super::role::RoleId;

/// Default limit on consecutive phase advances with nothing resolved.
pub const DEFAULT_MAX_IDLE_PHASES: u32 = 64;

fn default_max_idle_phases() -> u32 {
    DEFAULT_MAX_IDLE_PHASES
}

/// A role in play and its population.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSlot {
    /// Role identifier, looked up in the role registry.
    pub id: RoleId,

    /// How many players hold this role.
    pub count: u32,
}

impl RoleSlot {
    /// Create a new role slot.
    pub fn new(id: impl Into<String>, count: u32) -> Self {
        Self {
            id: RoleId::new(id),
            count,
        }
    }
}

/// Complete game configuration.
///
/// ```
/// use mafia_engine::core::{GameConfig, PlayerId};
///
/// let config = GameConfig::new()
///     .with_role("assassin", 1)
///     .with_role("townsfolk", 2)
///     .with_players([1, 2, 3].map(PlayerId::new));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.population(), 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Roles in play, in win-check order.
    #[serde(default)]
    pub roles: Vec<RoleSlot>,

    /// Participating players, in seating order.
    #[serde(default)]
    pub players: Vec<PlayerId>,

    /// Seed for role dealing.
    #[serde(default)]
    pub seed: u64,

    /// Consecutive phase advances with nothing resolved before the loop
    /// reports a stall.
    #[serde(default = "default_max_idle_phases")]
    pub max_idle_phases: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: Vec::new(),
            players: Vec::new(),
            seed: 0,
            max_idle_phases: DEFAULT_MAX_IDLE_PHASES,
        }
    }

    /// Parse a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the document does not parse
    /// or fails [`GameConfig::validate`].
    pub fn from_toml_str(source: &str) -> Result<Self, EngineError> {
        let config: GameConfig =
            toml::from_str(source).map_err(|err| EngineError::invalid_config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Add a role slot.
    #[must_use]
    pub fn with_role(mut self, id: impl Into<String>, count: u32) -> Self {
        self.roles.push(RoleSlot::new(id, count));
        self
    }

    /// Add a player.
    #[must_use]
    pub fn with_player(mut self, id: PlayerId) -> Self {
        self.players.push(id);
        self
    }

    /// Add several players in order.
    #[must_use]
    pub fn with_players(mut self, ids: impl IntoIterator<Item = PlayerId>) -> Self {
        self.players.extend(ids);
        self
    }

    /// Set the dealing seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the idle-phase limit.
    #[must_use]
    pub fn with_max_idle_phases(mut self, phases: u32) -> Self {
        self.max_idle_phases = phases;
        self
    }

    /// Total population over all role slots.
    #[must_use]
    pub fn population(&self) -> usize {
        self.roles.iter().map(|slot| slot.count as usize).sum()
    }

    /// Does the configuration list the given role?
    #[must_use]
    pub fn has_role(&self, id: &RoleId) -> bool {
        self.roles.iter().any(|slot| &slot.id == id)
    }

    /// Check the configuration for structural errors.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicatePlayer`] if a player id repeats
    /// - [`EngineError::InvalidConfig`] for repeated roles, zero counts,
    ///   or a zero idle-phase limit
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen_players = FxHashSet::default();
        for &player in &self.players {
            if !seen_players.insert(player) {
                return Err(EngineError::DuplicatePlayer(player));
            }
        }

        let mut seen_roles = FxHashSet::default();
        for slot in &self.roles {
            if !seen_roles.insert(&slot.id) {
                return Err(EngineError::invalid_config(format!("role {} is listed more than once", slot.id)));
            }
            if slot.count == 0 {
                return Err(EngineError::invalid_config(format!("role {} has a population of 0", slot.id)));
            }
        }

        if self.max_idle_phases == 0 {
            return Err(EngineError::invalid_config("max_idle_phases must be at least 1"));
        }

        Ok(())
    }
}
