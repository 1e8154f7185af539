//! Game events: units of action waiting on the stack.
//!
//! Events are built by a `StackBuilder` at the start of a phase or by
//! role hooks and resolve effects during resolution. The engine does not
//! interpret `kind`; it is an opaque key shared with the presentation
//! layer and the role rules.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::actions::MessageArg;
use crate::core::{Actor, HookError, Moment, PlayerId};
use crate::engine::Engine;

/// Unique identifier for a live event.
///
/// `EventId::UNASSIGNED` asks the stack to allocate an id on push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl EventId {
    /// Placeholder replaced by the stack on push.
    pub const UNASSIGNED: EventId = EventId(0);

    /// Create a new event ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Has the stack assigned this id yet?
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != Self::UNASSIGNED.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// Event kind ("mafiaKill", "playerLynch", ...). Games define the vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKind(pub String);

impl EventKind {
    /// Create a new event kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// The kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What negated an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Negation {
    /// Negated by an actor (a protector, the narrator).
    Actor(Actor),
    /// Negated by another event.
    Event(EventId),
}

/// Resolve effect of an event.
pub type ResolveFn = Rc<dyn Fn(&Event, &mut Engine) -> Result<(), HookError>>;

/// A pending game action.
///
/// ## Example
///
/// ```
/// use mafia_engine::core::{Actor, Moment, Phase, PlayerId};
/// use mafia_engine::stack::Event;
///
/// let kill = Event::new("mafiaKill")
///     .with_origin(Actor::Player(PlayerId::new(1)))
///     .with_target(Actor::Player(PlayerId::new(2)))
///     .scheduled_at(Moment::new(1, Phase::Night));
///
/// assert!(!kill.is_eligible(Moment::new(1, Phase::Day)));
/// assert!(kill.is_eligible(Moment::new(1, Phase::Night)));
/// assert_eq!(kill.target_players().collect::<Vec<_>>(), vec![PlayerId::new(2)]);
/// ```
#[derive(Clone)]
pub struct Event {
    /// Unique id while live.
    pub id: EventId,

    /// What kind of action this is.
    pub kind: EventKind,

    /// Who caused the event.
    pub origin: Option<Actor>,

    /// Who the event is aimed at, in order.
    pub targets: SmallVec<[Actor; 2]>,

    /// Set when the event has been negated; its effect will not run.
    pub negated_by: Option<Negation>,

    /// Earliest moment the event may resolve. `None` = any time.
    pub schedule: Option<Moment>,

    /// Positional arguments for presentation and role rules.
    pub args: Vec<MessageArg>,

    resolve: Option<ResolveFn>,
}

impl Event {
    /// Create an event with no origin, targets, or effect.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: EventId::UNASSIGNED,
            kind: EventKind::new(kind),
            origin: None,
            targets: SmallVec::new(),
            negated_by: None,
            schedule: None,
            args: Vec::new(),
            resolve: None,
        }
    }

    /// Use an explicit id (builder pattern).
    #[must_use]
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    /// Set the origin (builder pattern).
    #[must_use]
    pub fn with_origin(mut self, origin: Actor) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Add a target (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: Actor) -> Self {
        self.targets.push(target);
        self
    }

    /// Add several targets in order (builder pattern).
    #[must_use]
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = Actor>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Hold the event until `moment` (builder pattern).
    #[must_use]
    pub fn scheduled_at(mut self, moment: Moment) -> Self {
        self.schedule = Some(moment);
        self
    }

    /// Add a positional argument (builder pattern).
    #[must_use]
    pub fn with_arg(mut self, arg: MessageArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Set the resolve effect (builder pattern).
    #[must_use]
    pub fn on_resolve(
        mut self,
        resolve: impl Fn(&Event, &mut Engine) -> Result<(), HookError> + 'static,
    ) -> Self {
        self.resolve = Some(Rc::new(resolve));
        self
    }

    /// Mark the event as negated.
    pub fn negate(&mut self, by: Negation) {
        self.negated_by = Some(by);
    }

    /// Has the event been negated?
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated_by.is_some()
    }

    /// May the event resolve at `now`?
    #[must_use]
    pub fn is_eligible(&self, now: Moment) -> bool {
        self.schedule.is_none_or(|at| at <= now)
    }

    /// The resolve effect, if any.
    #[must_use]
    pub fn resolver(&self) -> Option<ResolveFn> {
        self.resolve.clone()
    }

    /// The originating player, if the origin is a player.
    #[must_use]
    pub fn origin_player(&self) -> Option<PlayerId> {
        self.origin.as_ref().and_then(Actor::as_player)
    }

    /// Targets that are players, in order.
    pub fn target_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.targets.iter().filter_map(Actor::as_player)
    }

    /// Every player the event references (origin first, then targets).
    pub fn referenced_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.origin_player().into_iter().chain(self.target_players())
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("targets", &self.targets)
            .field("negated_by", &self.negated_by)
            .field("schedule", &self.schedule)
            .field("args", &self.args)
            .field("has_effect", &self.resolve.is_some())
            .finish()
    }
}
