//! Origins and targets of events.
//!
//! An event can come from (or point at) a player, a role acting as a
//! group, the narrator, or the engine itself. Only `Actor::Player` takes
//! part in player hook dispatch.

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::role::RoleId;

/// Tagged origin/target of an event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// A single player.
    Player(PlayerId),
    /// A role acting as a group (e.g. the assassins' shared kill).
    Role(RoleId),
    /// The narrator, acting outside the game.
    Narrator,
    /// The engine itself (phase prompts, timers).
    System,
}

impl Actor {
    /// The player behind this actor, if it is one.
    #[must_use]
    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Actor::Player(id) => Some(*id),
            _ => None,
        }
    }

    /// Is this actor a player?
    #[must_use]
    pub fn is_player(&self) -> bool {
        matches!(self, Actor::Player(_))
    }
}

impl From<PlayerId> for Actor {
    fn from(id: PlayerId) -> Self {
        Actor::Player(id)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Player(id) => write!(f, "{}", id),
            Actor::Role(id) => write!(f, "Role {}", id),
            Actor::Narrator => f.write_str("Narrator"),
            Actor::System => f.write_str("System"),
        }
    }
}
