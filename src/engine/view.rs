//! Presentation-layer seams: the bound view and state observers.

use serde::{Deserialize, Serialize};

use crate::core::EngineState;

/// The presentation layer, as seen by the resolution loop.
///
/// Consulted once per loop step, after the win check. While it reports
/// that it is waiting, the loop suspends and the engine is
/// `AwaitingInput` until something calls back into it.
pub trait View {
    /// Is a human action outstanding?
    fn is_waiting_for_actions(&self, state: &EngineState) -> bool;
}

impl<F> View for F
where
    F: Fn(&EngineState) -> bool,
{
    fn is_waiting_for_actions(&self, state: &EngineState) -> bool {
        self(state)
    }
}

/// A view that never waits: the loop drains until a win or a stall.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unattended;

impl View for Unattended {
    fn is_waiting_for_actions(&self, _state: &EngineState) -> bool {
        false
    }
}

/// Handle returned by `Engine::subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(pub u64);

/// State observer callback.
pub(crate) type Observer = Box<dyn FnMut(&EngineState)>;
