//! Hook dispatch for pushed events.

use smallvec::SmallVec;

use crate::core::{EngineError, HookError, PlayerId};
use crate::engine::Engine;
use crate::stack::Event;

use super::{HookCategory, HookFault, HookSource, NamedHook};

/// Run a list of hooks against an event.
///
/// `Failed` results are recorded as faults and the remaining hooks still
/// run. Engine errors raised inside a hook stop dispatch and propagate.
fn run_hooks(
    source: HookSource,
    hooks: Vec<NamedHook>,
    event: &mut Event,
    engine: &mut Engine,
) -> Result<(), EngineError> {
    for hook in hooks {
        match hook.call(event, engine) {
            Ok(()) => {}
            Err(HookError::Engine(err)) => return Err(*err),
            Err(HookError::Failed { reason }) => {
                let at = engine.state().clock.now();
                engine.record_fault(HookFault::new(source.clone(), hook.name, reason, at));
            }
        }
    }
    Ok(())
}

/// Fire every hook interested in a pushed event.
///
/// Target lists are re-read at the start of each step, so a hook that
/// retargets the event affects the steps after it.
pub(crate) fn dispatch_push_hooks(event: &mut Event, engine: &mut Engine) -> Result<(), EngineError> {
    // 1. Roles of the targeted players
    for target in target_players(event) {
        let role_hooks = engine.state().player(target).and_then(|player| {
            let role_id = player.role.as_ref()?;
            let role = engine.state().role(role_id)?;
            Some((role_id.clone(), role.hooks.hooks(HookCategory::OnTarget).to_vec()))
        });

        if let Some((role_id, hooks)) = role_hooks {
            run_hooks(HookSource::RoleTarget(role_id), hooks, event, engine)?;
        }
    }

    // 2. The originating player
    if let Some(origin) = event.origin_player() {
        let hooks = engine
            .state()
            .player(origin)
            .map(|player| player.hooks.hooks(HookCategory::OnOrigin).to_vec())
            .unwrap_or_default();
        run_hooks(HookSource::PlayerOrigin(origin), hooks, event, engine)?;
    }

    // 3. The targeted players themselves
    for target in target_players(event) {
        let hooks = engine
            .state()
            .player(target)
            .map(|player| player.hooks.hooks(HookCategory::OnTarget).to_vec())
            .unwrap_or_default();
        run_hooks(HookSource::PlayerTarget(target), hooks, event, engine)?;
    }

    Ok(())
}

fn target_players(event: &Event) -> SmallVec<[PlayerId; 2]> {
    event.target_players().collect()
}
