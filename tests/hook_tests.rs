//! Hook dispatch integration tests.
//!
//! These tests push events through a real engine (no view bound, so the
//! loop never starts) and check which hooks fire, in what order, and
//! what happens when a hook fails.

use std::cell::RefCell;
use std::rc::Rc;

use mafia_engine::core::{Actor, Emblem, EmblemKind, EngineError, GameConfig, HookError, PlayerId, Profile, RoleId};
use mafia_engine::engine::{Engine, EngineStatus};
use mafia_engine::hooks::{HookCategory, HookSet, HookSource, NamedHook};
use mafia_engine::rules::{RoleDefinition, RoleRegistry};
use mafia_engine::stack::{Event, EventId, Negation};

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, label: &str) -> impl Fn(&mut Event, &mut Engine) -> Result<(), HookError> + 'static {
    let log = Rc::clone(log);
    let label = label.to_string();
    move |_, _| {
        log.borrow_mut().push(label.clone());
        Ok(())
    }
}

fn player(id: u32) -> PlayerId {
    PlayerId::new(id)
}

/// Mafia (P1), angel (P2), town (P3). Role hooks record into `log`.
fn engine(log: &Log) -> Engine {
    let config = GameConfig::new()
        .with_role("mafia", 1)
        .with_role("angel", 1)
        .with_role("town", 1)
        .with_players((1..=3).map(player));

    let registry = RoleRegistry::new()
        .with(RoleDefinition::new("mafia").with_hooks(HookSet::new().with_target("mafia", recorder(log, "role:mafia"))))
        .with(RoleDefinition::new("angel").with_hooks(HookSet::new().with_target("angel", recorder(log, "role:angel"))))
        .with(RoleDefinition::new("town").with_hooks(HookSet::new().with_target("town", recorder(log, "role:town"))));

    let profiles = (1..=3).map(|i| Profile::new(player(i), format!("P{}", i))).collect();
    let mut engine = Engine::builder(config)
        .registry(registry)
        .build_with_profiles(profiles)
        .unwrap();

    engine.assign_role(player(1), RoleId::new("mafia")).unwrap();
    engine.assign_role(player(2), RoleId::new("angel")).unwrap();
    engine.assign_role(player(3), RoleId::new("town")).unwrap();
    engine
}

fn kill(origin: u32, targets: &[u32]) -> Event {
    Event::new("mafiaKill")
        .with_origin(Actor::Player(player(origin)))
        .with_targets(targets.iter().map(|&t| Actor::Player(player(t))))
}

// =============================================================================
// Dispatch Order
// =============================================================================

/// Target roles, then the origin player, then the target players.
#[test]
fn test_dispatch_order() {
    let log = Log::default();
    let mut engine = engine(&log);

    let p1 = engine.player_mut(player(1)).unwrap();
    p1.hooks.register(HookCategory::OnOrigin, NamedHook::new("o", recorder(&log, "origin:1")));
    p1.hooks.register(HookCategory::OnTarget, NamedHook::new("t", recorder(&log, "player:1")));
    engine
        .player_mut(player(2))
        .unwrap()
        .hooks
        .register(HookCategory::OnTarget, NamedHook::new("t", recorder(&log, "player:2")));
    engine
        .player_mut(player(3))
        .unwrap()
        .hooks
        .register(HookCategory::OnTarget, NamedHook::new("t", recorder(&log, "player:3")));

    engine.push(kill(1, &[2, 3]), false).unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["role:angel", "role:town", "origin:1", "player:2", "player:3"]
    );
}

/// Hooks within a list fire in registration order.
#[test]
fn test_registration_order_within_list() {
    let log = Log::default();
    let mut engine = engine(&log);

    let hooks = &mut engine.player_mut(player(2)).unwrap().hooks;
    hooks.register(HookCategory::OnTarget, NamedHook::new("b", recorder(&log, "b")));
    hooks.register(HookCategory::OnTarget, NamedHook::new("a", recorder(&log, "a")));
    hooks.register(HookCategory::OnTarget, NamedHook::new("c", recorder(&log, "c")));

    engine.push(kill(1, &[2]), false).unwrap();

    assert_eq!(*log.borrow(), vec!["role:angel", "b", "a", "c"]);
}

/// Non-player origins and targets take no part in player dispatch.
#[test]
fn test_non_player_actors_skip_player_hooks() {
    let log = Log::default();
    let mut engine = engine(&log);

    let event = Event::new("narratorPrompt")
        .with_origin(Actor::Narrator)
        .with_target(Actor::Role(RoleId::new("mafia")));
    engine.push(event, false).unwrap();

    assert!(log.borrow().is_empty());
    assert_eq!(engine.state().stack.len(), 1);
}

/// A roleless target still fires its own hooks.
#[test]
fn test_roleless_target() {
    let log = Log::default();
    let mut engine = engine(&log);
    engine.player_mut(player(3)).unwrap().role = None;
    engine
        .player_mut(player(3))
        .unwrap()
        .hooks
        .register(HookCategory::OnTarget, NamedHook::new("t", recorder(&log, "player:3")));

    engine.push(kill(1, &[3]), false).unwrap();

    assert_eq!(*log.borrow(), vec!["player:3"]);
}

// =============================================================================
// Hooks Changing the Event
// =============================================================================

/// A protection hook negates the event before it becomes visible.
#[test]
fn test_hook_negates_event() {
    let log = Log::default();
    let mut engine = engine(&log);
    engine.role_mut(&RoleId::new("angel")).unwrap().hooks.register(
        HookCategory::OnTarget,
        NamedHook::new("protect", |event, _| {
            event.negate(Negation::Actor(Actor::Role(RoleId::new("angel"))));
            Ok(())
        }),
    );

    engine.push(kill(1, &[2]), false).unwrap();

    let event = engine.state().stack.iter().next().unwrap();
    assert_eq!(
        event.negated_by,
        Some(Negation::Actor(Actor::Role(RoleId::new("angel"))))
    );
}

/// Retargeting in a role hook changes which players' hooks fire later.
#[test]
fn test_retarget_affects_later_steps() {
    let log = Log::default();
    let mut engine = engine(&log);
    engine.role_mut(&RoleId::new("angel")).unwrap().hooks.register(
        HookCategory::OnTarget,
        NamedHook::new("redirect", |event, _| {
            event.targets.clear();
            event.targets.push(Actor::Player(PlayerId::new(3)));
            Ok(())
        }),
    );
    engine
        .player_mut(player(2))
        .unwrap()
        .hooks
        .register(HookCategory::OnTarget, NamedHook::new("t", recorder(&log, "player:2")));
    engine
        .player_mut(player(3))
        .unwrap()
        .hooks
        .register(HookCategory::OnTarget, NamedHook::new("t", recorder(&log, "player:3")));

    engine.push(kill(1, &[2]), false).unwrap();

    assert_eq!(*log.borrow(), vec!["role:angel", "player:3"]);
    let event = engine.state().stack.iter().next().unwrap();
    assert_eq!(event.target_players().collect::<Vec<_>>(), vec![player(3)]);
}

/// A hook may push a follow-up event; it lands before the triggering one.
#[test]
fn test_hook_pushes_follow_up() {
    let log = Log::default();
    let mut engine = engine(&log);
    engine.player_mut(player(1)).unwrap().hooks.register(
        HookCategory::OnOrigin,
        NamedHook::new("report", |event, engine| {
            let follow_up = Event::new("killReported").with_target(event.targets[0].clone());
            engine.push(follow_up, true)?;
            Ok(())
        }),
    );

    let status = engine.push(kill(1, &[2]), false).unwrap();

    assert_eq!(status, EngineStatus::Idle);
    let kinds: Vec<_> = engine.state().stack.iter().map(|e| e.kind.as_str().to_string()).collect();
    assert_eq!(kinds, vec!["killReported", "mafiaKill"]);
}

// =============================================================================
// Failures
// =============================================================================

/// A failing hook is recorded and skipped; the rest still fire.
#[test]
fn test_failing_hook_is_skipped() {
    let log = Log::default();
    let mut engine = engine(&log);
    let hooks = &mut engine.player_mut(player(2)).unwrap().hooks;
    hooks.register(
        HookCategory::OnTarget,
        NamedHook::new("broken", |_, _| Err(HookError::failed("lookup failed"))),
    );
    hooks.register(HookCategory::OnTarget, NamedHook::new("after", recorder(&log, "after")));

    engine.push(kill(1, &[2]), false).unwrap();

    assert_eq!(*log.borrow(), vec!["role:angel", "after"]);
    assert_eq!(engine.faults().len(), 1);
    let fault = &engine.faults()[0];
    assert_eq!(fault.source, HookSource::PlayerTarget(player(2)));
    assert_eq!(fault.hook, "broken");
    assert_eq!(fault.reason, "lookup failed");
    assert_eq!(engine.state().stack.len(), 1);
}

/// An engine error raised by a hook aborts the push without halting.
#[test]
fn test_engine_error_from_hook_aborts_push() {
    let log = Log::default();
    let mut engine = engine(&log);
    engine.role_mut(&RoleId::new("town")).unwrap().hooks.register(
        HookCategory::OnTarget,
        NamedHook::new("corrupt", |_, _| Err(EngineError::UnknownPlayer(PlayerId::new(99)).into())),
    );

    let err = engine.push(kill(1, &[3]), false).unwrap_err();

    assert!(matches!(err, EngineError::UnknownPlayer(id) if id == PlayerId::new(99)));
    assert!(engine.state().stack.is_empty());
    assert_eq!(engine.status(), EngineStatus::Idle);
    assert!(engine.push(Event::new("citySleeps"), false).is_ok());
}

/// A later hook failing undoes what earlier hooks did during the push.
#[test]
fn test_failed_push_undoes_earlier_hook_effects() {
    let log = Log::default();
    let mut engine = engine(&log);
    let hooks = &mut engine.player_mut(player(1)).unwrap().hooks;
    hooks.register(
        HookCategory::OnOrigin,
        NamedHook::new("follow", |_, engine| {
            engine.push(Event::new("followUp"), true)?;
            engine.actions().show_message("kill.planned", Vec::new(), false);
            engine.add_emblem(PlayerId::new(2), Emblem::permanent("marked"))?;
            Ok(())
        }),
    );
    hooks.register(
        HookCategory::OnOrigin,
        NamedHook::new("stale", |_, engine| {
            engine.pull(EventId::new(999), true)?;
            Ok(())
        }),
    );

    let err = engine.push(kill(1, &[2]), false).unwrap_err();

    assert!(matches!(err, EngineError::UnknownEvent(id) if id == EventId::new(999)));
    assert_eq!(engine.status(), EngineStatus::Idle);
    let state = engine.state();
    assert!(state.stack.is_empty());
    assert!(state.messages.is_empty());
    assert!(!state.player(player(2)).unwrap().has_emblem(&EmblemKind::new("marked")));
    assert_eq!(*log.borrow(), vec!["role:angel"]);
}
