//! Event stack integration tests.
//!
//! These tests cover priority order, scheduling, negation, and the
//! lifecycle handlers, both on a bare `EventStack` and through the engine.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mafia_engine::core::{Actor, EngineError, EngineState, GameConfig, Moment, Phase, PlayerId, Profile};
use mafia_engine::engine::{Engine, EngineStatus};
use mafia_engine::stack::{Event, EventId, EventStack, Negation, StackChange, StackPhase};

fn engine() -> Engine {
    let config = GameConfig::new().with_players((1..=3).map(PlayerId::new));
    let profiles = (1..=3).map(|i| Profile::new(PlayerId::new(i), format!("P{}", i))).collect();
    Engine::builder(config).build_with_profiles(profiles).unwrap()
}

/// View that lets the loop drain and suspends once the stack is empty.
fn until_empty(state: &EngineState) -> bool {
    state.stack.is_empty()
}

fn recording(log: &Rc<RefCell<Vec<String>>>, kind: &str) -> Event {
    let log = Rc::clone(log);
    Event::new(kind).on_resolve(move |event, _| {
        log.borrow_mut().push(event.kind.to_string());
        Ok(())
    })
}

// =============================================================================
// Bare Stack
// =============================================================================

/// Scheduled events wait without blocking the ones behind them.
#[test]
fn test_top_respects_schedule() {
    let mut stack = EventStack::new();
    stack
        .insert(Event::new("bulletproofDeath").scheduled_at(Moment::new(2, Phase::Dawn)), false)
        .unwrap();
    stack.insert(Event::new("playerLynch"), false).unwrap();

    let day_one = Moment::new(1, Phase::Night);
    assert_eq!(stack.top(day_one).unwrap().kind.as_str(), "playerLynch");

    let id = stack.top(day_one).unwrap().id;
    stack.pull(id, false, day_one).unwrap();
    assert!(!stack.has_anything_to_resolve(day_one));
    assert!(matches!(stack.top(day_one), Err(EngineError::EmptyStack { .. })));
    assert!(stack.has_anything_to_resolve(Moment::new(2, Phase::Dawn)));
}

/// Every mutation reports a change.
#[test]
fn test_changes_are_reported() {
    let mut stack = EventStack::new();
    let now = Moment::new(1, Phase::Dawn);

    let change = stack.insert(Event::new("a"), false).unwrap();
    let StackChange::Pushed(id) = change else {
        panic!("expected a push, got {:?}", change);
    };
    stack.insert(Event::new("b"), false).unwrap();

    let (_, change) = stack.pull(id, true, now).unwrap().unwrap();
    assert_eq!(change, StackChange::Pulled(id));
    assert_eq!(stack.clear(), Some(StackChange::Cleared(1)));
    assert_eq!(stack.revision(), 4);
}

// =============================================================================
// Resolution Through the Engine
// =============================================================================

/// Events resolve in priority order; front pushes jump the queue.
#[test]
fn test_resolution_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut engine = engine();

    engine.push(recording(&log, "first"), false).unwrap();
    engine.push(recording(&log, "second"), false).unwrap();
    engine.push(recording(&log, "urgent"), true).unwrap();

    engine.bind_view(until_empty);
    let status = engine.resume().unwrap();

    assert_eq!(status, EngineStatus::AwaitingInput);
    assert_eq!(*log.borrow(), vec!["urgent", "first", "second"]);
}

/// A resolve effect may push; the new event resolves in the same drain.
#[test]
fn test_resolve_effect_pushes_follow_up() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut engine = engine();
    engine.bind_view(until_empty);

    let follow_up = recording(&log, "hunterKill");
    let trigger = {
        let log = Rc::clone(&log);
        Event::new("playerLynch").on_resolve(move |event, engine| {
            log.borrow_mut().push(event.kind.to_string());
            engine.push(follow_up.clone(), true)?;
            Ok(())
        })
    };

    engine.push(trigger, false).unwrap();

    assert_eq!(*log.borrow(), vec!["playerLynch", "hunterKill"]);
    assert!(engine.state().stack.is_empty());
}

/// A negated event is skipped but still removed.
#[test]
fn test_negated_event_never_resolves() {
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let mut engine = engine();
    engine.bind_view(until_empty);

    let mut event = Event::new("mafiaKill")
        .with_target(Actor::Player(PlayerId::new(2)))
        .on_resolve(move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });
    event.negate(Negation::Actor(Actor::Narrator));

    engine.push(event, false).unwrap();

    assert_eq!(hits.get(), 0);
    assert!(engine.state().stack.is_empty());
}

/// Negating a live event before the loop reaches it skips its effect.
#[test]
fn test_negate_live_event() {
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let mut engine = engine();

    engine
        .push(
            Event::new("mafiaKill").on_resolve(move |_, _| {
                counter.set(counter.get() + 1);
                Ok(())
            }),
            false,
        )
        .unwrap();
    let id = engine.state().stack.iter().next().unwrap().id;
    engine.negate(id, Negation::Event(EventId::new(77))).unwrap();

    engine.bind_view(until_empty);
    engine.resume().unwrap();

    assert_eq!(hits.get(), 0);
    assert!(!engine.state().stack.contains(id));
}

/// Explicit ids must be unique among live events.
#[test]
fn test_duplicate_explicit_id() {
    let mut engine = engine();
    engine.push(Event::new("a").with_id(EventId::new(5)), false).unwrap();

    let err = engine.push(Event::new("b").with_id(EventId::new(5)), false).unwrap_err();

    assert!(matches!(err, EngineError::DuplicateEvent(id) if id == EventId::new(5)));
    assert_eq!(engine.state().stack.len(), 1);
    assert_eq!(engine.status(), EngineStatus::Idle);
}

// =============================================================================
// Lifecycle Handlers
// =============================================================================

/// Push handlers see every event before it is visible; pull handlers see
/// it after it leaves.
#[test]
fn test_lifecycle_handlers() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut engine = engine();

    let pushed = Rc::clone(&log);
    engine.on_stack(StackPhase::OnPush, move |event, engine| {
        assert!(!engine.state().stack.contains(event.id));
        pushed.borrow_mut().push(format!("push:{}", event.kind));
        Ok(())
    });
    let pulled = Rc::clone(&log);
    engine.on_stack(StackPhase::OnPull, move |event, engine| {
        assert!(!engine.state().stack.contains(event.id));
        pulled.borrow_mut().push(format!("pull:{}", event.kind));
        Ok(())
    });

    engine.bind_view(until_empty);
    engine.push(Event::new("citySleeps"), false).unwrap();

    assert_eq!(*log.borrow(), vec!["push:citySleeps", "pull:citySleeps"]);
}

/// A failing pull handler puts the event back.
#[test]
fn test_failed_pull_handler_keeps_event() {
    let mut engine = engine();
    engine.on_stack(StackPhase::OnPull, |_, _| Err(EngineError::UnknownPlayer(PlayerId::new(9)).into()));
    engine.push(Event::new("mafiaKill"), false).unwrap();
    let id = engine.state().stack.iter().next().unwrap().id;

    let err = engine.pull(id, true).unwrap_err();

    assert!(matches!(err, EngineError::UnknownPlayer(_)));
    assert!(engine.state().stack.contains(id));
    assert_eq!(engine.status(), EngineStatus::Idle);
}
