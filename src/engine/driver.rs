//! The resolution loop.
//!
//! [`Engine::step`] performs one transition and reports what the pump
//! should do next; [`Engine::ignite`] is the pump.

use tracing::{debug, error, info};

use crate::actions::{MessageArg, MessageKey};
use crate::core::{EngineError, HookError, Moment};
use crate::hooks::{HookFault, HookSource};
use crate::stack::Event;

use super::{Engine, EngineStatus, Victory};

/// Outcome of one loop step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Something changed; run another step.
    Continue,
    /// The view is waiting for a human action.
    AwaitInput,
    /// A role has won.
    Won,
}

impl Engine {
    /// Drain the stack until the loop has to stop.
    ///
    /// Returns the resulting status. Calls made while the pump is already
    /// running (from hooks and resolve effects) return immediately; the
    /// running pump picks their changes up. Without a bound view the
    /// loop does not start.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Halted`] if an earlier error halted the engine
    /// - any state-corruption error raised while draining; the engine
    ///   halts and every later entry point returns `Halted`
    pub fn ignite(&mut self) -> Result<EngineStatus, EngineError> {
        match self.status {
            EngineStatus::Halted => return Err(EngineError::Halted),
            EngineStatus::Won => return Ok(EngineStatus::Won),
            _ => {}
        }
        if self.busy {
            return Ok(self.status);
        }
        if self.view.is_none() {
            debug!("no view bound; loop not started");
            return Ok(self.status);
        }

        self.busy = true;
        self.status = EngineStatus::Draining;
        let outcome = loop {
            match self.step() {
                Ok(Step::Continue) => self.notify(),
                Ok(Step::AwaitInput) => break Ok(EngineStatus::AwaitingInput),
                Ok(Step::Won) => break Ok(EngineStatus::Won),
                Err(err) => break Err(err),
            }
        };
        self.busy = false;

        match outcome {
            Ok(status) => {
                self.status = status;
                self.notify();
                Ok(status)
            }
            Err(err) => {
                error!(error = %err, at = %self.state.clock.now(), "resolution loop halted");
                self.status = EngineStatus::Halted;
                self.notify();
                Err(err)
            }
        }
    }

    /// Run one transition of the loop.
    ///
    /// # Errors
    ///
    /// Returns any fatal error raised by the transition.
    pub fn step(&mut self) -> Result<Step, EngineError> {
        if self.check_win()? {
            return Ok(Step::Won);
        }

        let waiting = self
            .view
            .as_ref()
            .is_some_and(|view| view.is_waiting_for_actions(&self.state));
        if waiting {
            return Ok(Step::AwaitInput);
        }

        if self.state.stack.has_anything_to_resolve(self.state.clock.now()) {
            self.resolve_next()?;
        } else {
            self.advance_phase()?;
        }
        Ok(Step::Continue)
    }

    /// Evaluate win predicates in role order; latch the first win.
    fn check_win(&mut self) -> Result<bool, EngineError> {
        if self.victory.is_some() {
            return Ok(true);
        }

        let now = self.state.clock.now();
        let mut faults = Vec::new();
        let mut winner = None;
        for role in &self.state.roles {
            match role.evaluate(&self.state) {
                Ok(verdict) if verdict.is_win() => {
                    winner = Some((role.id.clone(), verdict));
                    break;
                }
                Ok(_) => {}
                Err(HookError::Failed { reason }) => {
                    faults.push(HookFault::new(HookSource::Win(role.id.clone()), "win", reason, now));
                }
                Err(HookError::Engine(err)) => return Err(*err),
            }
        }
        for fault in faults {
            self.record_fault(fault);
        }

        let Some((role, verdict)) = winner else {
            return Ok(false);
        };

        let dropped = self.state.stack.clear();
        let winners = verdict.winners().to_vec();
        let args = winners.iter().copied().map(MessageArg::Player).collect();
        self.actions()
            .show_message(MessageKey::new("win").with(role.as_str()), args, false);

        info!(role = %role, winners = ?winners, dropped = ?dropped, at = %now, "game won");
        self.victory = Some(Victory { role, winners });
        Ok(true)
    }

    /// Move to the next phase and push its events.
    ///
    /// The whole advance is all-or-nothing: if any of the new events
    /// cannot be pushed, the state from before the advance is restored.
    fn advance_phase(&mut self) -> Result<(), EngineError> {
        if self.idle_phases >= self.config.max_idle_phases {
            return Err(EngineError::Stalled {
                phases: self.idle_phases,
            });
        }

        let checkpoint = self.state.clone();
        match self.with_busy(Self::enter_next_phase) {
            Ok(()) => {
                self.idle_phases += 1;
                Ok(())
            }
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    fn enter_next_phase(&mut self) -> Result<(), EngineError> {
        let now = self.state.clock.increment();
        if self.state.clock.is_start_of_day() {
            self.state.messages.reset_daily_report();
        }
        self.expire_emblems(now);

        let events = self.builder.build(&self.state);
        self.validate_batch(&events)?;

        debug!(phase = %now, events = events.len(), "phase advanced");
        for event in events {
            self.push(event, false)?;
        }
        Ok(())
    }

    fn validate_batch(&self, events: &[Event]) -> Result<(), EngineError> {
        self.state.stack.validate_batch(events)?;
        events.iter().try_for_each(|event| self.ensure_players(event))
    }

    fn expire_emblems(&mut self, now: Moment) {
        for player in self.state.players.iter_mut() {
            let before = player.emblems.len();
            player.emblems.retain(|emblem| emblem.is_active(now));
            let expired = before - player.emblems.len();
            if expired > 0 {
                debug!(player = %player.id, expired, phase = %now, "emblems expired");
            }
        }
    }

    /// Resolve the top event (unless negated) and pull it.
    fn resolve_next(&mut self) -> Result<(), EngineError> {
        let now = self.state.clock.now();
        let event = self.state.stack.top(now)?.clone();

        if event.is_negated() {
            debug!(event = %event.id, kind = %event.kind, negated_by = ?event.negated_by, "negated event skipped");
        } else if let Some(resolve) = event.resolver() {
            debug!(event = %event.id, kind = %event.kind, "resolving event");
            match resolve(&event, self) {
                Ok(()) => {}
                Err(HookError::Engine(err)) => return Err(*err),
                Err(HookError::Failed { reason }) => {
                    self.record_fault(HookFault::new(
                        HookSource::Resolve(event.id),
                        event.kind.as_str(),
                        reason,
                        now,
                    ));
                }
            }
        }

        self.idle_phases = 0;
        self.pull(event.id, true)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        Clock, Emblem, EmblemKind, EngineState, GameConfig, Phase, Player, PlayerId, Profile, Role, RoleId, Until,
        Verdict,
    };
    use crate::engine::Unattended;
    use crate::rules::{NoEvents, StackBuilder};
    use std::cell::Cell;
    use std::rc::Rc;

    fn engine_with(builder: impl StackBuilder + 'static, roles: Vec<Role>) -> Engine {
        let config = GameConfig::new().with_players((1..=3).map(PlayerId::new));
        let players = (1..=3)
            .map(|i| Player::new(Profile::new(PlayerId::new(i), format!("P{}", i))))
            .collect();
        Engine::from_parts(config, EngineState::new(Clock::new(), roles, players), Box::new(builder))
    }

    #[test]
    fn test_step_resolves_top_event() {
        let mut engine = engine_with(NoEvents, Vec::new());
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        engine
            .push(
                Event::new("citySleeps").on_resolve(move |_, _| {
                    counter.set(counter.get() + 1);
                    Ok(())
                }),
                false,
            )
            .unwrap();

        assert_eq!(engine.step().unwrap(), Step::Continue);
        assert_eq!(hits.get(), 1);
        assert!(engine.state().stack.is_empty());
        assert_eq!(engine.state().clock.now(), Moment::new(1, Phase::Dawn));
    }

    #[test]
    fn test_step_advances_when_nothing_eligible() {
        let mut engine = engine_with(NoEvents, Vec::new());
        engine
            .push(Event::new("later").scheduled_at(Moment::new(1, Phase::Dusk)), false)
            .unwrap();

        engine.step().unwrap();
        assert_eq!(engine.state().clock.now(), Moment::new(1, Phase::Day));
        engine.step().unwrap();
        assert_eq!(engine.state().clock.now(), Moment::new(1, Phase::Dusk));
        engine.step().unwrap();
        assert!(engine.state().stack.is_empty());
    }

    #[test]
    fn test_stall_after_idle_limit() {
        let mut engine = engine_with(NoEvents, Vec::new());
        engine.config.max_idle_phases = 3;
        engine.bind_view(Unattended);

        let err = engine.ignite().unwrap_err();
        assert!(matches!(err, EngineError::Stalled { phases: 3 }));
        assert_eq!(engine.status(), EngineStatus::Halted);
        assert_eq!(engine.state().clock.now(), Moment::new(1, Phase::Night));
        assert!(matches!(engine.ignite(), Err(EngineError::Halted)));
    }

    #[test]
    fn test_win_latches_and_clears() {
        let role = Role::new(RoleId::new("town"), 1).with_win(|_| Ok(Verdict::Won));
        let mut engine = engine_with(NoEvents, vec![role]);
        engine.push(Event::new("a"), false).unwrap();

        assert_eq!(engine.step().unwrap(), Step::Won);
        assert!(engine.state().stack.is_empty());
        assert_eq!(engine.victory().unwrap().role, RoleId::new("town"));
        assert!(engine.victory().unwrap().winners.is_empty());

        assert_eq!(engine.step().unwrap(), Step::Won);
        assert_eq!(engine.state().messages.with_root("win").count(), 1);
    }

    #[test]
    fn test_failing_win_predicate_is_skipped() {
        let broken = Role::new(RoleId::new("broken"), 1).with_win(|_| Err(HookError::failed("bad state")));
        let winner = Role::new(RoleId::new("town"), 1).with_win(|_| Ok(Verdict::WonBy(vec![PlayerId::new(2)])));
        let mut engine = engine_with(NoEvents, vec![broken, winner]);

        assert_eq!(engine.step().unwrap(), Step::Won);
        assert_eq!(engine.faults().len(), 1);
        assert_eq!(engine.faults()[0].source, HookSource::Win(RoleId::new("broken")));
        assert_eq!(engine.victory().unwrap().winners, vec![PlayerId::new(2)]);
    }

    #[test]
    fn test_advance_resets_daily_report_at_dawn() {
        let mut engine = engine_with(NoEvents, Vec::new());
        engine.state.clock = Clock::starting_at(Moment::new(1, Phase::Night));
        engine.actions().report("playerLynch", vec![]);

        engine.advance_phase().unwrap();
        assert_eq!(engine.state().clock.now(), Moment::new(2, Phase::Dawn));
        assert!(engine.state().messages.daily_report().is_empty());
    }

    #[test]
    fn test_advance_expires_emblems() {
        let mut engine = engine_with(NoEvents, Vec::new());
        engine
            .add_emblem(PlayerId::new(1), Emblem::until("blessed", Until::moment(1, Phase::Day)))
            .unwrap();
        let blessed = EmblemKind::new("blessed");

        engine.advance_phase().unwrap(); // day 1 Day
        assert!(engine.state().player(PlayerId::new(1)).unwrap().has_emblem(&blessed));
        engine.advance_phase().unwrap(); // day 1 Dusk
        assert!(!engine.state().player(PlayerId::new(1)).unwrap().has_emblem(&blessed));
    }

    #[test]
    fn test_invalid_batch_restores_checkpoint() {
        let builder = |_: &EngineState| vec![Event::new("mafiaKill").with_target(PlayerId::new(42).into())];
        let mut engine = engine_with(builder, Vec::new());
        engine
            .add_emblem(PlayerId::new(1), Emblem::until("blessed", Until::day(1)))
            .unwrap();

        let err = engine.advance_phase().unwrap_err();
        assert!(matches!(err, EngineError::UnknownPlayer(_)));
        assert_eq!(engine.state().clock.now(), Moment::new(1, Phase::Dawn));
        assert!(engine
            .state()
            .player(PlayerId::new(1))
            .unwrap()
            .has_emblem(&EmblemKind::new("blessed")));
        assert!(engine.state().stack.is_empty());
    }

    #[test]
    fn test_failing_resolve_is_recorded_and_pulled() {
        let mut engine = engine_with(NoEvents, Vec::new());
        engine
            .push(Event::new("broken").on_resolve(|_, _| Err(HookError::failed("nope"))), false)
            .unwrap();

        engine.step().unwrap();
        assert!(engine.state().stack.is_empty());
        assert!(matches!(engine.faults()[0].source, HookSource::Resolve(_)));
    }
}
