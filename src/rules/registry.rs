//! Role registry for definition lookup.
//!
//! The `RoleRegistry` stores every role a game knows how to play. The
//! engine instantiates the roles its configuration lists, attaching the
//! configured population as the role's weight.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::{EngineError, EngineState, HookError, Role, RoleId, Verdict, WinFn};
use crate::hooks::HookSet;

/// Static rules of a role: its win predicate and hooks.
#[derive(Clone)]
pub struct RoleDefinition {
    /// Role identifier.
    pub id: RoleId,

    /// Win predicate. `None` = never wins on its own.
    pub win: Option<WinFn>,

    /// Hooks fired when a holder of the role is targeted.
    pub hooks: HookSet,
}

impl RoleDefinition {
    /// Create a definition with no win condition and no hooks.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(id),
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

    /// Set the hooks (builder pattern).
    #[must_use]
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Build a role with the given population weight.
    #[must_use]
    pub fn instantiate(&self, weight: u32) -> Role {
        Role::new(self.id.clone(), weight)
            .with_win_fn(self.win.clone())
            .with_hooks(self.hooks.clone())
    }
}

impl std::fmt::Debug for RoleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleDefinition")
            .field("id", &self.id)
            .field("has_win", &self.win.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Registry of role definitions.
///
/// The narrator is always registered.
///
/// ## Example
///
/// ```
/// use mafia_engine::core::{RoleId, Verdict};
/// use mafia_engine::rules::{RoleDefinition, RoleRegistry};
///
/// let mut registry = RoleRegistry::new();
/// registry.register(RoleDefinition::new("assassin").with_win(|_| Ok(Verdict::Undecided)));
///
/// let role = registry.instantiate(&RoleId::new("assassin"), 2).unwrap();
/// assert_eq!(role.weight, 2);
/// assert!(registry.contains(&RoleId::narrator()));
/// ```
#[derive(Clone, Debug)]
pub struct RoleRegistry {
    roles: FxHashMap<RoleId, RoleDefinition>,
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleRegistry {
    /// Create a registry holding only the narrator.
    #[must_use]
    pub fn new() -> Self {
        let mut roles = FxHashMap::default();
        roles.insert(RoleId::narrator(), RoleDefinition::new(RoleId::NARRATOR));
        Self { roles }
    }

    /// Register a definition, returning the one it replaced.
    pub fn register(&mut self, definition: RoleDefinition) -> Option<RoleDefinition> {
        self.roles.insert(definition.id.clone(), definition)
    }

    /// Add a definition (builder pattern).
    #[must_use]
    pub fn with(mut self, definition: RoleDefinition) -> Self {
        self.register(definition);
        self
    }

    /// Get a definition by id.
    #[must_use]
    pub fn get(&self, id: &RoleId) -> Option<&RoleDefinition> {
        self.roles.get(id)
    }

    /// Is the role registered?
    #[must_use]
    pub fn contains(&self, id: &RoleId) -> bool {
        self.roles.contains_key(id)
    }

    /// Number of registered roles (including the narrator).
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Always `false`; the narrator is pre-registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Build a role from its definition.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownRole`] if the role is not registered.
    pub fn instantiate(&self, id: &RoleId, weight: u32) -> Result<Role, EngineError> {
        self.get(id)
            .map(|definition| definition.instantiate(weight))
            .ok_or_else(|| EngineError::UnknownRole(id.clone()))
    }
}
