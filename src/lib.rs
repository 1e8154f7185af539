//! # mafia-engine
//!
//! A rules engine for hidden-role social-deduction games (day/night
//! phases, eliminations, role powers).
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: No hardcoded roles or events. Games supply role
//!    definitions, hooks, and the events that open each phase.
//!
//! 2. **Presentation-Free**: The engine decides what happens next; a view
//!    layer only reads state, says when it is waiting for a human, and
//!    renders opaque message keys.
//!
//! 3. **Deterministic**: Same configuration, seed, and inputs produce the
//!    same game.
//!
//! ## Architecture
//!
//! - **Event Stack**: Pending events in priority order. Pushing an event
//!   runs role and player hooks before it becomes visible.
//!
//! - **Resolution Loop**: An explicit pump over single steps: win check,
//!   wait for input, advance the phase, or resolve the top event.
//!
//! - **Persistent Data Structures**: Player emblems, the message log, and
//!   the stack use `im-rs` so observer snapshots are cheap.
//!
//! ## Modules
//!
//! - `core`: Clock, actors, players, roles, emblems, state, config, errors
//! - `hooks`: Named role/player hooks and their dispatch order
//! - `stack`: Events and the event stack
//! - `rules`: Role registry and stack builders
//! - `actions`: Message log and daily report
//! - `engine`: The orchestrator and resolution loop

pub mod core;
pub mod hooks;
pub mod stack;
pub mod rules;
pub mod actions;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{
    Actor, Clock, Moment, Phase,
    Emblem, EmblemKind, Until,
    EngineError, ErrorClass, HookError, StoreError,
    GameConfig, RoleSlot, GameRng,
    Player, PlayerId, Profile,
    Role, RoleId, Verdict,
    EngineState,
};

pub use crate::hooks::{HookCategory, HookFault, HookSet, HookSource, NamedHook};

pub use crate::stack::{Event, EventId, EventKind, EventStack, Negation, StackChange, StackPhase};

pub use crate::rules::{CompositeBuilder, NoEvents, PhaseBuilder, RoleDefinition, RoleRegistry, StackBuilder};

pub use crate::actions::{ActionLog, EngineActions, Message, MessageArg, MessageId, MessageKey};

pub use crate::engine::{
    Engine, EngineBuilder, EngineStatus, Victory,
    MemoryProfileStore, ProfileStore,
    ObserverId, Unattended, View,
};
