//! Player identification and per-player data.
//!
//! ## PlayerId
//!
//! Identifier shared with the external profile store. The engine never
//! allocates player ids itself; they come from the game configuration.
//!
//! ## Player
//!
//! A participant: the stored profile, an optional role (by id, looked up
//! in the engine's role table), the emblems currently attached, and the
//! player's own reactive hooks.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::emblem::{Emblem, EmblemKind};
use super::role::RoleId;
use crate::hooks::HookSet;

/// Player identifier, matching the profile store's key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Profile loaded once from the external store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Store key.
    pub id: PlayerId,

    /// Display name.
    pub name: String,

    /// Avatar reference, opaque to the engine.
    #[serde(default)]
    pub avatar: Option<String>,
}

impl Profile {
    /// Create a profile with no avatar.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: None,
        }
    }

    /// Set the avatar (builder pattern).
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// A participant in the game.
#[derive(Clone, Debug)]
pub struct Player {
    /// Player identifier (same as `profile.id`).
    pub id: PlayerId,

    /// Stored profile.
    pub profile: Profile,

    /// Assigned role, resolved through the engine's role table.
    pub role: Option<RoleId>,

    /// Status effects currently attached.
    pub emblems: Vector<Emblem>,

    /// Hooks owned by this player.
    pub hooks: HookSet,
}

impl Player {
    /// Create a roleless player from a profile.
    pub fn new(profile: Profile) -> Self {
        Self {
            id: profile.id,
            profile,
            role: None,
            emblems: Vector::new(),
            hooks: HookSet::new(),
        }
    }

    /// Display name from the profile.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// Does the player hold the given role?
    #[must_use]
    pub fn has_role(&self, role: &RoleId) -> bool {
        self.role.as_ref() == Some(role)
    }

    /// Does the player carry an emblem of the given kind?
    #[must_use]
    pub fn has_emblem(&self, kind: &EmblemKind) -> bool {
        self.emblems.iter().any(|e| &e.kind == kind)
    }

    /// Attach an emblem.
    pub fn add_emblem(&mut self, emblem: Emblem) {
        self.emblems.push_back(emblem);
    }

    /// Remove every emblem of the given kind. Returns how many were removed.
    pub fn remove_emblems(&mut self, kind: &EmblemKind) -> usize {
        let before = self.emblems.len();
        self.emblems.retain(|e| &e.kind != kind);
        before - self.emblems.len()
    }
}
