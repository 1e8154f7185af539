//! Roles: named factions with a win condition and reactive hooks.
//!
//! Roles are built from a `RoleDefinition` in the `RoleRegistry` plus a
//! population weight from the game configuration. After construction a
//! role only changes through hook registration.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::error::HookError;
use super::player::PlayerId;
use super::state::EngineState;
use crate::hooks::HookSet;

/// Role identifier ("assassin", "narrator", ...).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(pub String);

impl RoleId {
    /// Id of the built-in narrator role.
    pub const NARRATOR: &'static str = "narrator";

    /// Create a new role ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The narrator's role ID.
    #[must_use]
    pub fn narrator() -> Self {
        Self::new(Self::NARRATOR)
    }

    /// The ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a role's win predicate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Verdict {
    /// The game goes on.
    #[default]
    Undecided,
    /// The role won without naming winners.
    Won,
    /// The role won; these players are the winners.
    WonBy(Vec<PlayerId>),
}

impl Verdict {
    /// Has the role won?
    #[must_use]
    pub fn is_win(&self) -> bool {
        !matches!(self, Verdict::Undecided)
    }

    /// Winners named by the verdict (empty unless `WonBy`).
    #[must_use]
    pub fn winners(&self) -> &[PlayerId] {
        match self {
            Verdict::WonBy(players) => players,
            _ => &[],
        }
    }
}

/// Win predicate over the engine state.
pub type WinFn = Rc<dyn Fn(&EngineState) -> Result<Verdict, HookError>>;

/// A faction/identity in play.
#[derive(Clone)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,

    /// Population count from the game configuration.
    pub weight: u32,

    /// Win predicate. `None` = this role never wins on its own.
    win: Option<WinFn>,

    /// Hooks fired when a player holding this role is targeted.
    pub hooks: HookSet,
}

impl Role {
    /// Create a role with no win condition and no hooks.
    pub fn new(id: RoleId, weight: u32) -> Self {
        Self {
            id,
            weight,
            win: None,
            hooks: HookSet::new(),
        }
    }

    /// Set the win predicate (builder pattern).
    #[must_use]
    pub fn with_win(mut self, win: impl Fn(&EngineState) -> Result<Verdict, HookError> + 'static) -> Self {
        self.win = Some(Rc::new(win));
        self
    }

    /// Set the win predicate from a shared function.
    #[must_use]
    pub fn with_win_fn(mut self, win: Option<WinFn>) -> Self {
        self.win = win;
        self
    }

    /// Set the hooks (builder pattern).
    #[must_use]
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Is this the narrator role?
    #[must_use]
    pub fn is_narrator(&self) -> bool {
        self.id.as_str() == RoleId::NARRATOR
    }

    /// Evaluate the win predicate.
    pub fn evaluate(&self, state: &EngineState) -> Result<Verdict, HookError> {
        match &self.win {
            Some(win) => win(state),
            None => Ok(Verdict::Undecided),
        }
    }
}

impl std::fmt::Debug for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Role")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("has_win", &self.win.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}
