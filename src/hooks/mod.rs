//! Reactive hooks attached to roles and players.
//!
//! Hooks let role rules react to events as they are pushed: a protector
//! negates a kill aimed at its ward, a bodyguard redirects it, a silenced
//! player's vote is voided. The engine invokes them synchronously from
//! the stack's `OnPush` handler, before the event becomes visible to
//! `top`.
//!
//! ## Key Components
//!
//! - [`NamedHook`]: A named callback `(event, engine) -> Result`
//! - [`HookSet`]: Ordered `on_target` / `on_origin` hook lists
//! - [`HookFault`]: Record of a hook that failed and was skipped
//!
//! ## Dispatch Order
//!
//! For a pushed event, hooks fire in this fixed order:
//!
//! 1. For each target player holding a role: the role's `on_target` hooks
//! 2. If the origin is a player: that player's `on_origin` hooks
//! 3. For each target player: the player's own `on_target` hooks
//!
//! Within a list, hooks fire in registration order. Changing this order
//! changes game semantics.
//!
//! ## Example Usage
//!
//! ```
//! use mafia_engine::hooks::{HookCategory, HookSet};
//! use mafia_engine::stack::Negation;
//! use mafia_engine::core::Actor;
//!
//! let hooks = HookSet::new()
//!     .with_target("shield", |event, _engine| {
//!         if event.kind.as_str() == "mafiaKill" {
//!             event.negated_by = Some(Negation::Actor(Actor::Narrator));
//!         }
//!         Ok(())
//!     });
//!
//! assert_eq!(hooks.names(HookCategory::OnTarget), vec!["shield"]);
//! ```

mod dispatch;

pub(crate) use dispatch::dispatch_push_hooks;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::{HookError, Moment, PlayerId, RoleId};
use crate::engine::Engine;
use crate::stack::{Event, EventId, StackPhase};

/// Hook callback.
///
/// Receives the event being pushed (mutable, so hooks can negate or
/// retarget it) and the engine.
pub type HookFn = Rc<dyn Fn(&mut Event, &mut Engine) -> Result<(), HookError>>;

/// Which list a hook belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookCategory {
    /// Fires when the owner is targeted.
    OnTarget,
    /// Fires when the owner originates an event.
    OnOrigin,
}

/// A hook with a name, unique within its category.
#[derive(Clone)]
pub struct NamedHook {
    /// Hook name.
    pub name: String,

    hook: HookFn,
}

impl NamedHook {
    /// Create a named hook.
    pub fn new(
        name: impl Into<String>,
        hook: impl Fn(&mut Event, &mut Engine) -> Result<(), HookError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            hook: Rc::new(hook),
        }
    }

    /// Invoke the hook.
    pub fn call(&self, event: &mut Event, engine: &mut Engine) -> Result<(), HookError> {
        (self.hook)(event, engine)
    }
}

impl std::fmt::Debug for NamedHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NamedHook").field(&self.name).finish()
    }
}

/// Ordered hook lists of a role or player.
#[derive(Clone, Debug, Default)]
pub struct HookSet {
    on_target: Vec<NamedHook>,
    on_origin: Vec<NamedHook>,
}

impl HookSet {
    /// Create an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook.
    ///
    /// A hook with the same name in the same category is replaced in place,
    /// keeping its position in the order.
    pub fn register(&mut self, category: HookCategory, hook: NamedHook) {
        let list = self.list_mut(category);
        match list.iter_mut().find(|h| h.name == hook.name) {
            Some(existing) => *existing = hook,
            None => list.push(hook),
        }
    }

    /// Add an `on_target` hook (builder pattern).
    #[must_use]
    pub fn with_target(
        mut self,
        name: impl Into<String>,
        hook: impl Fn(&mut Event, &mut Engine) -> Result<(), HookError> + 'static,
    ) -> Self {
        self.register(HookCategory::OnTarget, NamedHook::new(name, hook));
        self
    }

    /// Add an `on_origin` hook (builder pattern).
    #[must_use]
    pub fn with_origin(
        mut self,
        name: impl Into<String>,
        hook: impl Fn(&mut Event, &mut Engine) -> Result<(), HookError> + 'static,
    ) -> Self {
        self.register(HookCategory::OnOrigin, NamedHook::new(name, hook));
        self
    }

    /// Remove a hook by name. Returns `true` if one was removed.
    pub fn unregister(&mut self, category: HookCategory, name: &str) -> bool {
        let list = self.list_mut(category);
        let before = list.len();
        list.retain(|h| h.name != name);
        list.len() != before
    }

    /// Hooks of a category, in registration order.
    #[must_use]
    pub fn hooks(&self, category: HookCategory) -> &[NamedHook] {
        match category {
            HookCategory::OnTarget => &self.on_target,
            HookCategory::OnOrigin => &self.on_origin,
        }
    }

    /// Hook names of a category, in registration order.
    #[must_use]
    pub fn names(&self, category: HookCategory) -> Vec<&str> {
        self.hooks(category).iter().map(|h| h.name.as_str()).collect()
    }

    /// Total number of hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.on_target.len() + self.on_origin.len()
    }

    /// Check if there are no hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn list_mut(&mut self, category: HookCategory) -> &mut Vec<NamedHook> {
        match category {
            HookCategory::OnTarget => &mut self.on_target,
            HookCategory::OnOrigin => &mut self.on_origin,
        }
    }
}

/// Where a recorded failure came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HookSource {
    /// A role's `on_target` hook.
    RoleTarget(RoleId),
    /// A player's `on_origin` hook.
    PlayerOrigin(PlayerId),
    /// A player's own `on_target` hook.
    PlayerTarget(PlayerId),
    /// A role's win predicate.
    Win(RoleId),
    /// An event's resolve effect.
    Resolve(EventId),
    /// A stack lifecycle handler.
    Handler(StackPhase),
}

/// A hook failure that was caught, recorded, and skipped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookFault {
    /// Where the failing hook lives.
    pub source: HookSource,

    /// Hook name (or event kind for resolve effects).
    pub hook: String,

    /// The failure message.
    pub reason: String,

    /// Clock moment of the failure.
    pub at: Moment,
}

impl HookFault {
    /// Create a fault record.
    pub fn new(source: HookSource, hook: impl Into<String>, reason: impl Into<String>, at: Moment) -> Self {
        Self {
            source,
            hook: hook.into(),
            reason: reason.into(),
            at,
        }
    }
}
