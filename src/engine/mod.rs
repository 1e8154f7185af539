//! The engine: owns the game state and drives the resolution loop.
//!
//! ## Resolution Loop
//!
//! Every change to the live event set re-enters [`Engine::ignite`], which
//! pumps [`Engine::step`] until the loop has to stop:
//!
//! 1. a role's win predicate fires: the stack is cleared, a `win`
//!    announcement is posted, and the engine is `Won` for good
//! 2. the bound view is waiting for a human action: `AwaitingInput`
//! 3. nothing is eligible: the clock advances, emblems expire, and the
//!    stack builder's events for the new phase are pushed
//! 4. otherwise the top event resolves (unless negated) and is pulled
//!
//! Steps 3 and 4 continue the pump. Pushes and pulls made from hooks and
//! resolve effects while the pump runs do not re-enter it, so call depth
//! stays constant no matter how many phases auto-advance.
//!
//! ## Example Usage
//!
//! ```
//! use mafia_engine::core::{GameConfig, PlayerId, Profile};
//! use mafia_engine::engine::{Engine, EngineStatus};
//! use mafia_engine::stack::Event;
//! use mafia_engine::rules::{RoleDefinition, RoleRegistry};
//!
//! let config = GameConfig::new()
//!     .with_role("assassin", 1)
//!     .with_players([1, 2].map(PlayerId::new));
//! let profiles = vec![
//!     Profile::new(PlayerId::new(1), "Ada"),
//!     Profile::new(PlayerId::new(2), "Bo"),
//! ];
//!
//! let mut engine = Engine::builder(config)
//!     .registry(RoleRegistry::new().with(RoleDefinition::new("assassin")))
//!     .build_with_profiles(profiles)
//!     .unwrap();
//!
//! // Wait for input whenever something is pending.
//! engine.bind_view(|state: &mafia_engine::core::EngineState| !state.stack.is_empty());
//!
//! let status = engine.push(Event::new("citySleeps"), false).unwrap();
//! assert_eq!(status, EngineStatus::AwaitingInput);
//! assert_eq!(engine.state().stack.len(), 1);
//! ```

mod builder;
mod driver;
mod view;

pub use builder::{EngineBuilder, MemoryProfileStore, ProfileStore};
pub use driver::Step;
pub use view::{ObserverId, Unattended, View};

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::actions::EngineActions;
use crate::core::{
    EngineError, EngineState, Emblem, GameConfig, GameRng, HookError, Player, PlayerId, Role, RoleId,
};
use crate::hooks::{dispatch_push_hooks, HookFault, HookSource};
use crate::rules::StackBuilder;
use crate::stack::{Event, EventId, Negation, StackChange, StackPhase};

use view::Observer;

/// RNG stream handed to role rules.
const RULES_CONTEXT: &str = "rules";

/// Where the resolution loop stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineStatus {
    /// Not running; waiting for an external trigger.
    #[default]
    Idle,
    /// Actively resolving events.
    Draining,
    /// Suspended until the view's pending action is submitted.
    AwaitingInput,
    /// A role won. Terminal.
    Won,
    /// A fatal error stopped the loop. Terminal.
    Halted,
}

impl EngineStatus {
    /// Is this a terminal status?
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineStatus::Won | EngineStatus::Halted)
    }
}

/// The latched outcome of a won game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victory {
    /// The role whose predicate fired.
    pub role: RoleId,

    /// Winners named by the predicate (may be empty).
    pub winners: Vec<PlayerId>,
}

/// Game orchestrator.
///
/// Owns the state outright; everything else (view, observers, hooks,
/// builders) reads it through `&EngineState` or mutates it through the
/// methods here.
pub struct Engine {
    state: EngineState,
    config: GameConfig,
    builder: Box<dyn StackBuilder>,
    view: Option<Box<dyn View>>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
    status: EngineStatus,

    /// Set while the pump or a lifecycle dispatch is on the call stack.
    busy: bool,

    /// Consecutive phase advances without a resolved event.
    idle_phases: u32,

    victory: Option<Victory>,
    rng: GameRng,
}

impl Engine {
    /// Start building an engine for a configuration.
    #[must_use]
    pub fn builder(config: GameConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub(crate) fn from_parts(config: GameConfig, state: EngineState, builder: Box<dyn StackBuilder>) -> Self {
        let rng = GameRng::new(config.seed).for_context(RULES_CONTEXT);
        let mut engine = Self {
            state,
            config,
            builder,
            view: None,
            observers: Vec::new(),
            next_observer: 0,
            status: EngineStatus::Idle,
            busy: false,
            idle_phases: 0,
            victory: None,
            rng,
        };
        engine.state.stack.register(
            |event, engine| dispatch_push_hooks(event, engine).map_err(HookError::from),
            StackPhase::OnPush,
        );
        engine
    }

    // === Observation ===

    /// The observable state.
    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// The configuration the engine was built from.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current loop status.
    #[must_use]
    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// The latched victory, once a role has won.
    #[must_use]
    pub fn victory(&self) -> Option<&Victory> {
        self.victory.as_ref()
    }

    /// Deterministic RNG for role rules.
    pub fn rng(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// Bind the presentation layer. Must happen before the loop can run.
    pub fn bind_view(&mut self, view: impl View + 'static) {
        self.view = Some(Box::new(view));
    }

    /// Register a callback run after every loop step and every external
    /// mutation.
    pub fn subscribe(&mut self, observer: impl FnMut(&EngineState) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    // === Stack ===

    /// Push an event and let the loop react.
    ///
    /// Hooks run before the event becomes visible; they may negate or
    /// retarget it. If a hook fails, everything the push's hooks changed
    /// is undone. After a win the event is dropped.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Halted`] after a fatal error
    /// - [`EngineError::UnknownPlayer`] if the event references a player
    ///   outside the game
    /// - [`EngineError::DuplicateEvent`] if an explicit id is already live
    /// - any error the resolution loop raises afterwards
    pub fn push(&mut self, mut event: Event, at_front: bool) -> Result<EngineStatus, EngineError> {
        self.ensure_running()?;
        if self.victory.is_some() {
            debug!(kind = %event.kind, "game already won; event dropped");
            return Ok(self.status);
        }

        self.ensure_players(&event)?;
        self.state.stack.assign_id(&mut event);
        self.state.stack.ensure_absent(event.id)?;

        let checkpoint = self.state.clone();
        let inserted = self
            .with_busy(|engine| engine.run_stack_handlers(StackPhase::OnPush, &mut event))
            .and_then(|()| self.state.stack.insert(event, at_front));
        let change = match inserted {
            Ok(change) => change,
            Err(err) => {
                self.restore(checkpoint);
                return Err(err);
            }
        };
        self.on_stack_change(change)
    }

    /// Remove an event and let the loop react.
    ///
    /// Without `force`, only the current top is removed; anything else is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Halted`] after a fatal error
    /// - [`EngineError::UnknownEvent`] if `force` is set and the id is not
    ///   live
    pub fn pull(&mut self, id: EventId, force: bool) -> Result<EngineStatus, EngineError> {
        self.ensure_running()?;
        let now = self.state.clock.now();
        let checkpoint = self.state.clone();
        let Some((mut event, change)) = self.state.stack.pull(id, force, now)? else {
            return Ok(self.status);
        };

        if let Err(err) = self.with_busy(|engine| engine.run_stack_handlers(StackPhase::OnPull, &mut event)) {
            self.restore(checkpoint);
            return Err(err);
        }
        self.on_stack_change(change)
    }

    /// Negate a live event. It stays on the stack but will not resolve.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEvent`] if the id is not live.
    pub fn negate(&mut self, id: EventId, by: Negation) -> Result<(), EngineError> {
        self.ensure_running()?;
        self.state
            .stack
            .get_mut(id)
            .ok_or(EngineError::UnknownEvent(id))?
            .negate(by);
        self.notify_if_idle();
        Ok(())
    }

    /// Register a lifecycle handler on the stack.
    pub fn on_stack(
        &mut self,
        phase: StackPhase,
        handler: impl Fn(&mut Event, &mut Engine) -> Result<(), HookError> + 'static,
    ) {
        self.state.stack.register(handler, phase);
    }

    // === Players and roles ===

    /// Get a mutable player (for hook registration).
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.state.player_mut(id)
    }

    /// Get a mutable role (for hook registration).
    pub fn role_mut(&mut self, id: &RoleId) -> Option<&mut Role> {
        self.state.role_mut(id)
    }

    /// Attach an emblem to a player.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownPlayer`] if the player is not in the game.
    pub fn add_emblem(&mut self, player: PlayerId, emblem: Emblem) -> Result<(), EngineError> {
        self.state
            .player_mut(player)
            .ok_or(EngineError::UnknownPlayer(player))?
            .add_emblem(emblem);
        self.notify_if_idle();
        Ok(())
    }

    /// Give a player a role, replacing any role they held.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnknownRole`] if the role is not in play
    /// - [`EngineError::UnknownPlayer`] if the player is not in the game
    pub fn assign_role(&mut self, player: PlayerId, role: RoleId) -> Result<(), EngineError> {
        if self.state.role(&role).is_none() {
            return Err(EngineError::UnknownRole(role));
        }
        self.state
            .player_mut(player)
            .ok_or(EngineError::UnknownPlayer(player))?
            .role = Some(role);
        self.notify_if_idle();
        Ok(())
    }

    /// Deal every role slot to a player at random.
    ///
    /// The shuffle is seeded from the configuration, so the same seed and
    /// player list always deal the same way. Players beyond the role
    /// population stay roleless.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Overpopulated`] if there are more role slots
    /// than players.
    pub fn deal_roles(&mut self) -> Result<(), EngineError> {
        let mut deck: Vec<Option<RoleId>> = self
            .state
            .roles
            .iter()
            .flat_map(|role| std::iter::repeat(Some(role.id.clone())).take(role.weight as usize))
            .collect();

        let players = self.state.players.len();
        if deck.len() > players {
            return Err(EngineError::Overpopulated {
                population: deck.len(),
                players,
            });
        }
        deck.resize(players, None);

        let mut rng = GameRng::new(self.config.seed).for_context(crate::core::rng::DEAL_CONTEXT);
        rng.shuffle(&mut deck);

        for (player, role) in self.state.players.iter_mut().zip(deck) {
            player.role = role;
        }
        debug!(players, seed = self.config.seed, "roles dealt");
        self.notify_if_idle();
        Ok(())
    }

    // === Re-entry ===

    /// Message surface stamped with the current moment.
    pub fn actions(&mut self) -> EngineActions<'_> {
        let now = self.state.clock.now();
        EngineActions::new(&mut self.state.messages, now)
    }

    /// Apply a human action, then resume the loop.
    ///
    /// Pushes and pulls made inside `action` are batched: the loop runs
    /// once, after `action` returns.
    ///
    /// # Errors
    ///
    /// Returns the error from `action`, or any error the loop raises.
    pub fn submit(
        &mut self,
        action: impl FnOnce(&mut Engine) -> Result<(), EngineError>,
    ) -> Result<EngineStatus, EngineError> {
        self.ensure_running()?;
        self.with_busy(action)?;
        self.notify();
        self.resume()
    }

    /// Resume the loop after the view's pending action was handled.
    ///
    /// # Errors
    ///
    /// See [`Engine::ignite`].
    pub fn resume(&mut self) -> Result<EngineStatus, EngineError> {
        self.ignite()
    }

    // === Internals ===

    pub(crate) fn record_fault(&mut self, fault: HookFault) {
        warn!(
            source = ?fault.source,
            hook = %fault.hook,
            reason = %fault.reason,
            at = %fault.at,
            "hook failed; skipped"
        );
        self.state.faults.push_back(fault);
    }

    /// Hook failures caught so far, oldest first.
    #[must_use]
    pub fn faults(&self) -> &Vector<HookFault> {
        &self.state.faults
    }

    /// Put back a state captured before a failed mutation. Faults caught
    /// since the capture are kept.
    fn restore(&mut self, checkpoint: EngineState) {
        let faults = std::mem::take(&mut self.state.faults);
        self.state = checkpoint;
        self.state.faults = faults;
        debug!(now = %self.state.clock.now(), stack = self.state.stack.len(), "state restored");
        self.notify_if_idle();
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        if self.status == EngineStatus::Halted {
            return Err(EngineError::Halted);
        }
        Ok(())
    }

    fn ensure_players(&self, event: &Event) -> Result<(), EngineError> {
        match event.referenced_players().find(|&id| !self.state.has_player(id)) {
            Some(id) => Err(EngineError::UnknownPlayer(id)),
            None => Ok(()),
        }
    }

    /// Run `f` with the loop held off, restoring the previous hold after.
    fn with_busy<T>(&mut self, f: impl FnOnce(&mut Engine) -> T) -> T {
        let outer = std::mem::replace(&mut self.busy, true);
        let result = f(self);
        self.busy = outer;
        result
    }

    fn run_stack_handlers(&mut self, phase: StackPhase, event: &mut Event) -> Result<(), EngineError> {
        for handler in self.state.stack.handlers(phase) {
            match handler(event, self) {
                Ok(()) => {}
                Err(HookError::Engine(err)) => return Err(*err),
                Err(HookError::Failed { reason }) => {
                    let at = self.state.clock.now();
                    self.record_fault(HookFault::new(HookSource::Handler(phase), event.kind.as_str(), reason, at));
                }
            }
        }
        Ok(())
    }

    fn on_stack_change(&mut self, change: StackChange) -> Result<EngineStatus, EngineError> {
        trace!(change = ?change, revision = self.state.stack.revision(), "stack changed");
        if self.busy {
            return Ok(self.status);
        }
        self.notify();
        self.ignite()
    }

    fn notify(&mut self) {
        for (_, observer) in &mut self.observers {
            observer(&self.state);
        }
    }

    fn notify_if_idle(&mut self) {
        if !self.busy {
            self.notify();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("status", &self.status)
            .field("now", &self.state.clock.now())
            .field("players", &self.state.players.len())
            .field("roles", &self.state.roles.len())
            .field("stack", &self.state.stack.len())
            .field("has_view", &self.view.is_some())
            .field("observers", &self.observers.len())
            .field("victory", &self.victory)
            .finish()
    }
}
