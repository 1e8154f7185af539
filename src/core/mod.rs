//! Core engine types: clock, actors, players, roles, emblems, state,
//! configuration, RNG, and errors.
//!
//! This module contains the data model the resolution loop works on.
//! None of it knows any specific game's rules; games supply those as
//! role definitions, hooks, and stack builders.

pub mod actor;
pub mod clock;
pub mod config;
pub mod emblem;
pub mod error;
pub mod player;
pub mod rng;
pub mod role;
pub mod state;

pub use actor::Actor;
pub use clock::{Clock, Moment, Phase};
pub use config::{GameConfig, RoleSlot, DEFAULT_MAX_IDLE_PHASES};
pub use emblem::{Emblem, EmblemKind, Until};
pub use error::{EngineError, ErrorClass, HookError, StoreError};
pub use player::{Player, PlayerId, Profile};
pub use rng::GameRng;
pub use role::{Role, RoleId, Verdict, WinFn};
pub use state::EngineState;
