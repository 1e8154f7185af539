//! Stack builders: the events that open each phase.
//!
//! When the stack runs dry the engine advances the clock and asks its
//! builder for the next batch (night-action prompts, the day vote, ...).
//! Builders only read state; anything they want to change happens when
//! the events they return resolve.

use crate::core::{EngineState, Phase};
use crate::stack::Event;

/// Produces the events for a freshly started phase.
///
/// Must be deterministic: the same state yields the same events.
pub trait StackBuilder {
    /// Events to push, in order, for the phase the clock just entered.
    fn build(&self, state: &EngineState) -> Vec<Event>;
}

impl<F> StackBuilder for F
where
    F: Fn(&EngineState) -> Vec<Event>,
{
    fn build(&self, state: &EngineState) -> Vec<Event> {
        self(state)
    }
}

/// Builder that never produces anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvents;

impl StackBuilder for NoEvents {
    fn build(&self, _state: &EngineState) -> Vec<Event> {
        Vec::new()
    }
}

/// Dispatches to a builder per phase.
///
/// ## Example
///
/// ```
/// use mafia_engine::core::{EngineState, Phase};
/// use mafia_engine::rules::{PhaseBuilder, StackBuilder};
/// use mafia_engine::stack::Event;
///
/// let builder = PhaseBuilder::new()
///     .on(Phase::Night, |_: &EngineState| vec![Event::new("mafiaKill")])
///     .on(Phase::Day, |_: &EngineState| vec![Event::new("playerLynch")]);
///
/// let state = EngineState::default();
/// assert!(builder.build(&state).is_empty()); // the clock starts at dawn
/// ```
#[derive(Default)]
pub struct PhaseBuilder {
    phases: Vec<(Phase, Box<dyn StackBuilder>)>,
}

impl PhaseBuilder {
    /// Create a builder with no phases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `builder` for `phase` (builder pattern). Several builders for
    /// the same phase run in registration order.
    #[must_use]
    pub fn on(mut self, phase: Phase, builder: impl StackBuilder + 'static) -> Self {
        self.phases.push((phase, Box::new(builder)));
        self
    }
}

impl StackBuilder for PhaseBuilder {
    fn build(&self, state: &EngineState) -> Vec<Event> {
        let phase = state.clock.phase();
        self.phases
            .iter()
            .filter(|(p, _)| *p == phase)
            .flat_map(|(_, builder)| builder.build(state))
            .collect()
    }
}

impl std::fmt::Debug for PhaseBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phases: Vec<_> = self.phases.iter().map(|(p, _)| *p).collect();
        f.debug_struct("PhaseBuilder").field("phases", &phases).finish()
    }
}

/// Concatenates the output of several builders, in order.
#[derive(Default)]
pub struct CompositeBuilder {
    builders: Vec<Box<dyn StackBuilder>>,
}

impl CompositeBuilder {
    /// Create an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a builder (builder pattern).
    #[must_use]
    pub fn with(mut self, builder: impl StackBuilder + 'static) -> Self {
        self.builders.push(Box::new(builder));
        self
    }

    /// Number of builders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Check if there are no builders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl StackBuilder for CompositeBuilder {
    fn build(&self, state: &EngineState) -> Vec<Event> {
        self.builders.iter().flat_map(|builder| builder.build(state)).collect()
    }
}

impl std::fmt::Debug for CompositeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeBuilder").field("builders", &self.builders.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Clock, Moment};

    fn at(phase: Phase) -> EngineState {
        let mut state = EngineState::default();
        state.clock = Clock::starting_at(Moment::new(1, phase));
        state
    }

    fn kinds(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.kind.as_str()).collect()
    }

    #[test]
    fn test_closure_builder() {
        let builder = |state: &EngineState| vec![Event::new(format!("day{}", state.clock.date()))];
        assert_eq!(kinds(&builder.build(&at(Phase::Dawn))), vec!["day1"]);
    }

    #[test]
    fn test_no_events() {
        assert!(NoEvents.build(&at(Phase::Night)).is_empty());
    }

    #[test]
    fn test_phase_builder_selects_phase() {
        let builder = PhaseBuilder::new()
            .on(Phase::Night, |_: &EngineState| vec![Event::new("mafiaKill"), Event::new("angelBlessing")])
            .on(Phase::Day, |_: &EngineState| vec![Event::new("playerLynch")])
            .on(Phase::Night, |_: &EngineState| vec![Event::new("detectiveCheck")]);

        assert_eq!(
            kinds(&builder.build(&at(Phase::Night))),
            vec!["mafiaKill", "angelBlessing", "detectiveCheck"]
        );
        assert_eq!(kinds(&builder.build(&at(Phase::Day))), vec!["playerLynch"]);
        assert!(builder.build(&at(Phase::Dusk)).is_empty());
    }

    #[test]
    fn test_composite_concatenates_in_order() {
        let builder = CompositeBuilder::new()
            .with(|_: &EngineState| vec![Event::new("a")])
            .with(NoEvents)
            .with(|_: &EngineState| vec![Event::new("b"), Event::new("c")]);

        assert_eq!(builder.len(), 3);
        assert_eq!(kinds(&builder.build(&at(Phase::Dawn))), vec!["a", "b", "c"]);
    }
}
