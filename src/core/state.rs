//! Engine state: the observable state surface.
//!
//! The engine owns one `EngineState` and mutates it exclusively. The
//! presentation layer, win predicates, and stack builders only ever see
//! `&EngineState`.
//!
//! Players refer to their role by `RoleId`; the role table here is the
//! single owner of `Role` values and resolves those ids.

use im::Vector;
use rustc_hash::FxHashMap;

use super::clock::Clock;
use super::player::{Player, PlayerId};
use super::role::{Role, RoleId};
use crate::actions::ActionLog;
use crate::hooks::HookFault;
use crate::stack::EventStack;

/// Everything the engine knows about a game in progress.
#[derive(Clone, Debug, Default)]
pub struct EngineState {
    /// Game clock.
    pub clock: Clock,

    /// Roles in play, in win-check order.
    pub roles: Vec<Role>,

    /// Players, in seating order.
    pub players: Vec<Player>,

    /// Emitted messages and the daily report.
    pub messages: ActionLog,

    /// Pending events.
    pub stack: EventStack,

    /// Hook failures that were caught and skipped.
    pub faults: Vector<HookFault>,

    role_index: FxHashMap<RoleId, usize>,
}

impl EngineState {
    /// Create a state with the given roles and players.
    pub fn new(clock: Clock, roles: Vec<Role>, players: Vec<Player>) -> Self {
        let role_index = roles
            .iter()
            .enumerate()
            .map(|(index, role)| (role.id.clone(), index))
            .collect();

        Self {
            clock,
            roles,
            players,
            messages: ActionLog::new(),
            stack: EventStack::new(),
            faults: Vector::new(),
            role_index,
        }
    }

    // === Players ===

    /// Get a player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Get a mutable player by id.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Is the player part of the game?
    #[must_use]
    pub fn has_player(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    /// Players holding a role, in seating order.
    pub fn players_with_role<'a>(&'a self, role: &'a RoleId) -> impl Iterator<Item = &'a Player> + 'a {
        self.players.iter().filter(move |p| p.has_role(role))
    }

    // === Roles ===

    /// Get a role by id.
    #[must_use]
    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.role_index.get(id).map(|&index| &self.roles[index])
    }

    /// Get a mutable role by id (for hook registration).
    pub fn role_mut(&mut self, id: &RoleId) -> Option<&mut Role> {
        let index = *self.role_index.get(id)?;
        self.roles.get_mut(index)
    }

    /// The role held by a player.
    #[must_use]
    pub fn role_of(&self, player: PlayerId) -> Option<&Role> {
        self.player(player)?.role.as_ref().and_then(|id| self.role(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Profile;

    fn state() -> EngineState {
        let roles = vec![Role::new(RoleId::new("assassin"), 1), Role::new(RoleId::narrator(), 1)];
        let mut players: Vec<_> = (1..=3)
            .map(|i| Player::new(Profile::new(PlayerId::new(i), format!("P{}", i))))
            .collect();
        players[0].role = Some(RoleId::new("assassin"));
        EngineState::new(Clock::new(), roles, players)
    }

    #[test]
    fn test_player_lookup() {
        let state = state();
        assert_eq!(state.player(PlayerId::new(2)).unwrap().name(), "P2");
        assert!(state.player(PlayerId::new(9)).is_none());
        assert!(state.has_player(PlayerId::new(3)));
    }

    #[test]
    fn test_role_lookup() {
        let state = state();
        assert_eq!(state.role(&RoleId::narrator()).unwrap().weight, 1);
        assert!(state.role(&RoleId::new("ghost")).is_none());
        assert_eq!(state.role_of(PlayerId::new(1)).unwrap().id, RoleId::new("assassin"));
        assert!(state.role_of(PlayerId::new(2)).is_none());
    }

    #[test]
    fn test_players_with_role() {
        let state = state();
        let assassin = RoleId::new("assassin");
        let ids: Vec<_> = state.players_with_role(&assassin).map(|p| p.id).collect();
        assert_eq!(ids, vec![PlayerId::new(1)]);
    }

    #[test]
    fn test_role_mut() {
        let mut state = state();
        state
            .role_mut(&RoleId::new("assassin"))
            .unwrap()
            .hooks
            .register(crate::hooks::HookCategory::OnTarget, crate::hooks::NamedHook::new("x", |_, _| Ok(())));
        assert_eq!(state.role(&RoleId::new("assassin")).unwrap().hooks.len(), 1);
    }
}
