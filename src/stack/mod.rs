//! The event stack: pending events in resolution order.
//!
//! Index 0 is the highest priority. `top(now)` returns the first live
//! event that is eligible at `now`; events scheduled for a later moment
//! wait on the stack without blocking the ones behind them.
//!
//! ## Lifecycle
//!
//! Pushing an event is a three-part operation driven by the engine
//! (`Engine::push`):
//!
//! 1. `assign_id` gives the event an id if it has none
//! 2. every `OnPush` handler runs with the event, in registration order,
//!    before the event becomes visible to `top`
//! 3. `insert` makes it live and reports a [`StackChange`]
//!
//! Every mutation returns a `StackChange`; the engine binds changes to its
//! scheduler (observers are notified and the resolution loop re-runs).
//!
//! ## Example Usage
//!
//! ```
//! use mafia_engine::core::{Moment, Phase};
//! use mafia_engine::stack::{Event, EventStack};
//!
//! let mut stack = EventStack::new();
//! let now = Moment::new(1, Phase::Night);
//!
//! let mut first = Event::new("citySleeps");
//! stack.assign_id(&mut first);
//! let first_id = first.id;
//! stack.insert(first, false).unwrap();
//!
//! let mut urgent = Event::new("hunterKill");
//! stack.assign_id(&mut urgent);
//! stack.insert(urgent, true).unwrap();
//!
//! assert_eq!(stack.top(now).unwrap().kind.as_str(), "hunterKill");
//! assert_eq!(stack.len(), 2);
//! assert!(stack.contains(first_id));
//! ```

mod event;

pub use event::{Event, EventId, EventKind, Negation, ResolveFn};

use std::rc::Rc;

use im::Vector;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::core::{EngineError, HookError, Moment};
use crate::engine::Engine;

/// Lifecycle phase a stack handler runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackPhase {
    /// Before a pushed event becomes visible.
    OnPush,
    /// After an event leaves the stack.
    OnPull,
}

/// Handler invoked for every event in a lifecycle phase.
pub type StackHandler = Rc<dyn Fn(&mut Event, &mut Engine) -> Result<(), HookError>>;

/// A change to the live event set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackChange {
    /// An event became live.
    Pushed(EventId),
    /// An event was removed.
    Pulled(EventId),
    /// The stack was emptied; carries how many events were dropped.
    Cleared(usize),
}

/// Ordered collection of pending events.
#[derive(Clone, Default)]
pub struct EventStack {
    /// Live events (index 0 = highest priority).
    entries: Vector<Event>,

    /// Lifecycle handlers in registration order.
    handlers: Vec<(StackPhase, StackHandler)>,

    /// Last allocated event id.
    next_id: u64,

    /// Bumped on every change to the live set.
    revision: u64,
}

impl EventStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the stack is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live events in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    /// Counter bumped on every change to the live set.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Is an event with this id live?
    #[must_use]
    pub fn contains(&self, id: EventId) -> bool {
        self.position(id).is_some()
    }

    /// Get a live event by id.
    #[must_use]
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Get a mutable live event by id.
    pub fn get_mut(&mut self, id: EventId) -> Option<&mut Event> {
        let index = self.position(id)?;
        self.entries.get_mut(index)
    }

    /// Give the event an id if it has none.
    pub fn assign_id(&mut self, event: &mut Event) {
        if !event.id.is_assigned() {
            self.next_id += 1;
            event.id = EventId::new(self.next_id);
        }
    }

    /// Fail if an event with this id is already live.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateEvent`] if the id is taken.
    pub fn ensure_absent(&self, id: EventId) -> Result<(), EngineError> {
        if self.contains(id) {
            return Err(EngineError::DuplicateEvent(id));
        }
        Ok(())
    }

    /// Check that a batch of events can be pushed without id collisions.
    ///
    /// Unassigned ids always pass; they are allocated on push.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateEvent`] if an explicit id is live or
    /// repeats within the batch.
    pub fn validate_batch(&self, events: &[Event]) -> Result<(), EngineError> {
        let mut seen = FxHashSet::default();
        for event in events.iter().filter(|e| e.id.is_assigned()) {
            self.ensure_absent(event.id)?;
            if !seen.insert(event.id) {
                return Err(EngineError::DuplicateEvent(event.id));
            }
        }
        Ok(())
    }

    /// Make an event live at the front or back of the priority order.
    ///
    /// Does not run handlers; `Engine::push` runs them before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateEvent`] if the id is already live.
    pub fn insert(&mut self, mut event: Event, at_front: bool) -> Result<StackChange, EngineError> {
        self.assign_id(&mut event);
        self.ensure_absent(event.id)?;
        self.next_id = self.next_id.max(event.id.raw());

        let id = event.id;
        if at_front {
            self.entries.push_front(event);
        } else {
            self.entries.push_back(event);
        }
        self.revision += 1;
        Ok(StackChange::Pushed(id))
    }

    /// Highest-priority event eligible at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyStack`] if nothing is eligible. Check
    /// [`EventStack::has_anything_to_resolve`] first.
    pub fn top(&self, now: Moment) -> Result<&Event, EngineError> {
        self.entries
            .iter()
            .find(|e| e.is_eligible(now))
            .ok_or(EngineError::EmptyStack { at: now })
    }

    /// Would `top(now)` succeed?
    #[must_use]
    pub fn has_anything_to_resolve(&self, now: Moment) -> bool {
        self.entries.iter().any(|e| e.is_eligible(now))
    }

    /// Remove an event.
    ///
    /// With `force = false` the event is only removed if it is the current
    /// top at `now`; otherwise nothing happens and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownEvent`] if `force` is set and the id is
    /// not live.
    pub fn pull(
        &mut self,
        id: EventId,
        force: bool,
        now: Moment,
    ) -> Result<Option<(Event, StackChange)>, EngineError> {
        if !force {
            let is_top = self.top(now).is_ok_and(|top| top.id == id);
            if !is_top {
                return Ok(None);
            }
        }

        let index = self.position(id).ok_or(EngineError::UnknownEvent(id))?;
        let event = self.entries.remove(index);
        self.revision += 1;
        Ok(Some((event, StackChange::Pulled(id))))
    }

    /// Drop every live event. Returns `None` if the stack was already empty.
    pub fn clear(&mut self) -> Option<StackChange> {
        if self.entries.is_empty() {
            return None;
        }
        let dropped = self.entries.len();
        self.entries.clear();
        self.revision += 1;
        Some(StackChange::Cleared(dropped))
    }

    /// Register a lifecycle handler.
    pub fn register(
        &mut self,
        handler: impl Fn(&mut Event, &mut Engine) -> Result<(), HookError> + 'static,
        phase: StackPhase,
    ) {
        self.handlers.push((phase, Rc::new(handler)));
    }

    /// Handlers for a phase, in registration order.
    #[must_use]
    pub fn handlers(&self, phase: StackPhase) -> Vec<StackHandler> {
        self.handlers
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, handler)| Rc::clone(handler))
            .collect()
    }

    fn position(&self, id: EventId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

impl std::fmt::Debug for EventStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStack")
            .field("entries", &self.entries)
            .field("handlers", &self.handlers.len())
            .field("revision", &self.revision)
            .finish()
    }
}
