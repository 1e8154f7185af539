//! Error types.
//!
//! Every fallible engine operation returns [`EngineError`]. Hooks, win
//! predicates, and resolve effects return [`HookError`]; recoverable hook
//! failures are recorded as faults, while engine errors raised from inside
//! a hook propagate unchanged.

use super::clock::Moment;
use super::player::PlayerId;
use super::role::RoleId;
use crate::stack::EventId;

/// Category of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid game configuration; fatal at construction.
    Configuration,
    /// An internal invariant was violated; the loop stops.
    StateCorruption,
    /// `top` was called with nothing eligible.
    EmptyStack,
    /// The engine already stopped after a fatal error.
    Halted,
}

/// Errors raised by the external profile store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or read.
    #[error("profile store unavailable: {reason}")]
    Unavailable {
        /// What went wrong.
        reason: String,
    },
}

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The game configuration is malformed.
    #[error("invalid game configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A configured player has no stored profile.
    #[error("no stored profile for {0}")]
    UnknownProfile(PlayerId),

    /// A configured role is not in the registry.
    #[error("role {0} is not registered")]
    UnknownRole(RoleId),

    /// A player id appears twice in the configuration.
    #[error("{0} is listed more than once")]
    DuplicatePlayer(PlayerId),

    /// More role slots than players when dealing roles.
    #[error("role population {population} exceeds player count {players}")]
    Overpopulated {
        /// Total population over all roles.
        population: usize,
        /// Number of players.
        players: usize,
    },

    /// The profile store failed.
    #[error(transparent)]
    ProfileStore(#[from] StoreError),

    /// An event id is already live on the stack.
    #[error("{0} is already on the stack")]
    DuplicateEvent(EventId),

    /// An event id is not on the stack.
    #[error("{0} is not on the stack")]
    UnknownEvent(EventId),

    /// A player id is not part of the game.
    #[error("{0} is not in the game")]
    UnknownPlayer(PlayerId),

    /// The loop advanced too many phases without resolving anything.
    #[error("no event resolved in {phases} consecutive phases")]
    Stalled {
        /// Consecutive idle phase advances.
        phases: u32,
    },

    /// `top` was called with nothing eligible.
    #[error("nothing to resolve at {at}")]
    EmptyStack {
        /// Clock moment of the call.
        at: Moment,
    },

    /// The engine stopped after an earlier fatal error.
    #[error("engine halted after a fatal error")]
    Halted,
}

impl EngineError {
    /// Category of this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::InvalidConfig { .. }
            | EngineError::UnknownProfile(_)
            | EngineError::UnknownRole(_)
            | EngineError::DuplicatePlayer(_)
            | EngineError::Overpopulated { .. }
            | EngineError::ProfileStore(_) => ErrorClass::Configuration,
            EngineError::DuplicateEvent(_)
            | EngineError::UnknownEvent(_)
            | EngineError::UnknownPlayer(_)
            | EngineError::Stalled { .. } => ErrorClass::StateCorruption,
            EngineError::EmptyStack { .. } => ErrorClass::EmptyStack,
            EngineError::Halted => ErrorClass::Halted,
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Errors returned by hooks, win predicates, and resolve effects.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The hook failed; it is skipped and recorded as a fault.
    #[error("{reason}")]
    Failed {
        /// What went wrong.
        reason: String,
    },

    /// An engine call made by the hook failed; this stops the loop.
    #[error(transparent)]
    Engine(Box<EngineError>),
}

impl HookError {
    /// Create a recoverable hook failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        HookError::Failed {
            reason: reason.into(),
        }
    }
}

impl From<EngineError> for HookError {
    fn from(err: EngineError) -> Self {
        HookError::Engine(Box::new(err))
    }
}
