//! Engine construction.
//!
//! Building an engine validates the configuration, looks up every
//! player's profile, instantiates the configured roles (plus the
//! narrator), and only then hands the finished engine to `on_ready`.
//! Any configuration error aborts construction before `on_ready` runs.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::core::{Clock, EngineError, EngineState, GameConfig, Player, PlayerId, Profile, RoleId, StoreError};
use crate::rules::{NoEvents, RoleRegistry, StackBuilder};

use super::{Engine, View};

/// Persistent store of player profiles.
///
/// ## Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use mafia_engine::core::{PlayerId, Profile, StoreError};
/// use mafia_engine::engine::ProfileStore;
///
/// struct SqlStore { /* ... */ }
///
/// #[async_trait]
/// impl ProfileStore for SqlStore {
///     async fn load_profiles(&self, ids: &[PlayerId]) -> Result<Vec<Profile>, StoreError> {
///         self.query(ids).await
///     }
/// }
/// ```
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the stored profiles for `ids`.
    ///
    /// Ids with no stored profile are simply missing from the result.
    async fn load_profiles(&self, ids: &[PlayerId]) -> Result<Vec<Profile>, StoreError>;
}

/// In-memory profile store.
#[derive(Clone, Debug, Default)]
pub struct MemoryProfileStore {
    profiles: FxHashMap<PlayerId, Profile>,
}

impl MemoryProfileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a profile, replacing any with the same id.
    pub fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.id, profile);
    }

    /// Add a profile (builder pattern).
    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.insert(profile);
        self
    }

    /// Number of stored profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<Profile> for MemoryProfileStore {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let mut store = Self::new();
        for profile in iter {
            store.insert(profile);
        }
        store
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load_profiles(&self, ids: &[PlayerId]) -> Result<Vec<Profile>, StoreError> {
        Ok(ids.iter().filter_map(|id| self.profiles.get(id).cloned()).collect())
    }
}

type ReadyFn = Box<dyn FnOnce(&mut Engine)>;

/// Builder for [`Engine`]; obtained from [`Engine::builder`].
pub struct EngineBuilder {
    config: GameConfig,
    registry: RoleRegistry,
    stack_builder: Box<dyn StackBuilder>,
    view: Option<Box<dyn View>>,
    on_ready: Option<ReadyFn>,
}

impl EngineBuilder {
    /// Start from a configuration, the default registry, and no events.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            registry: RoleRegistry::new(),
            stack_builder: Box::new(NoEvents),
            view: None,
            on_ready: None,
        }
    }

    /// Role definitions to instantiate from.
    #[must_use]
    pub fn registry(mut self, registry: RoleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Events for each new phase.
    #[must_use]
    pub fn stack_builder(mut self, builder: impl StackBuilder + 'static) -> Self {
        self.stack_builder = Box::new(builder);
        self
    }

    /// Bind a view at construction.
    #[must_use]
    pub fn view(mut self, view: impl View + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    /// Callback run exactly once, after roles and players are populated.
    #[must_use]
    pub fn on_ready(mut self, on_ready: impl FnOnce(&mut Engine) + 'static) -> Self {
        self.on_ready = Some(Box::new(on_ready));
        self
    }

    /// Look the players' profiles up in `store` and build the engine.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ProfileStore`] if the store fails
    /// - see [`EngineBuilder::build_with_profiles`]
    pub async fn load<S>(self, store: &S) -> Result<Engine, EngineError>
    where
        S: ProfileStore + ?Sized,
    {
        self.config.validate()?;
        let profiles = store.load_profiles(&self.config.players).await?;
        self.build_with_profiles(profiles)
    }

    /// Build the engine from already loaded profiles.
    ///
    /// # Errors
    ///
    /// - any error from [`GameConfig::validate`]
    /// - [`EngineError::UnknownProfile`] if a configured player has no profile
    /// - [`EngineError::UnknownRole`] if a configured role is not registered
    pub fn build_with_profiles(self, profiles: Vec<Profile>) -> Result<Engine, EngineError> {
        self.config.validate()?;

        let mut by_id: FxHashMap<PlayerId, Profile> = profiles.into_iter().map(|p| (p.id, p)).collect();
        let players = self
            .config
            .players
            .iter()
            .map(|&id| by_id.remove(&id).map(Player::new).ok_or(EngineError::UnknownProfile(id)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut roles = self
            .config
            .roles
            .iter()
            .map(|slot| self.registry.instantiate(&slot.id, slot.count))
            .collect::<Result<Vec<_>, _>>()?;
        if !self.config.has_role(&RoleId::narrator()) {
            roles.push(self.registry.instantiate(&RoleId::narrator(), 1)?);
        }

        let state = EngineState::new(Clock::new(), roles, players);
        let mut engine = Engine::from_parts(self.config, state, self.stack_builder);
        engine.view = self.view;

        info!(
            players = engine.state.players.len(),
            roles = engine.state.roles.len(),
            seed = engine.config.seed,
            "engine ready"
        );

        if let Some(on_ready) = self.on_ready {
            on_ready(&mut engine);
        }
        Ok(engine)
    }
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("has_view", &self.view.is_some())
            .field("has_on_ready", &self.on_ready.is_some())
            .finish()
    }
}
