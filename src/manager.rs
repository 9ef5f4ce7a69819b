use std::fmt;
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::migrate::{Migration, Migrations};
use crate::observer::{Observer, TracingObserver};
use crate::reconcile::reconcile;
use crate::reducer::{Action, Reducer, VersionedReducer};
use crate::state::State;
use crate::versioned::VersionedState;

/// Wrap `reducer` with versioning, migration and rehydration reconciliation.
///
/// Fails if `config` has no positive version.
pub fn create_state_manager<R: Reducer>(
    reducer: R,
    config: Config,
    migrations: Migrations,
) -> Result<StateManager<R>, ConfigError> {
    StateManager::builder(reducer, config)
        .migrations(migrations)
        .build()
}

/// The enhanced root reducer.
///
/// Every action runs through the version wrapper. A rehydration action
/// additionally migrates its payload to the current schema and reconciles
/// it with what the reducer made of the action.
///
/// # Example
///
/// ```
/// use rehydrate_kit::{Action, Config, Migrations, Reducer, State, StateManager};
/// use serde_json::json;
///
/// let reducer = |state: Option<State>, _: &Action| {
///     state.unwrap_or_else(|| json!({ "count": 0 }).as_object().unwrap().clone())
/// };
///
/// let manager = StateManager::builder(reducer, Config::new(2))
///     .register_migration(2, |mut state: State| {
///         if let Some(clicks) = state.remove("clicks") {
///             state.insert("count".into(), clicks);
///         }
///         state
///     })
///     .build()
///     .unwrap();
///
/// let initial = manager.reduce(None, &Action::new("init"));
/// assert_eq!(serde_json::Value::Object(initial.clone()), json!({ "count": 0, "version": 2 }));
///
/// let stored = json!({ "clicks": 7, "version": 1 }).as_object().unwrap().clone();
/// let next = manager.reduce(Some(initial), &Action::rehydrate(stored));
/// assert_eq!(serde_json::Value::Object(next), json!({ "count": 7, "version": 2 }));
/// ```
pub struct StateManager<R> {
    reducer: VersionedReducer<R>,
    migrations: Migrations,
    observer: Arc<dyn Observer>,
    rehydrate_type: String,
}

impl<R: Reducer> StateManager<R> {
    /// Start building a manager around `reducer`.
    pub fn builder(reducer: R, config: Config) -> StateManagerBuilder<R> {
        StateManagerBuilder {
            reducer,
            config,
            migrations: Migrations::new(),
            observer: None,
        }
    }

    /// The schema version every produced state carries.
    pub fn version(&self) -> u32 {
        self.reducer.version()
    }

    /// The registered migrations.
    pub fn migrations(&self) -> &Migrations {
        &self.migrations
    }

    /// Whether `action` triggers migration and reconciliation.
    pub fn is_rehydrate(&self, action: &Action) -> bool {
        action.is(&self.rehydrate_type)
    }

    /// Reduce with the version tag kept outside the state tree.
    pub fn reduce_versioned(&self, state: Option<&VersionedState>, action: &Action) -> VersionedState {
        if !self.is_rehydrate(action) {
            return self.reducer.reduce_versioned(state, action);
        }

        let incoming = VersionedState::from_tagged(action.state_payload());
        let migrated = self
            .migrations
            .migrate(incoming, self.version(), self.observer.as_ref());
        let reduced = self.reducer.reduce_versioned(state, action);

        let empty = State::new();
        let previous = state.map_or(&empty, |versioned| &versioned.state);
        let reconciled = reconcile(previous, &migrated.state, reduced.state, self.observer.as_ref());

        VersionedState::new(reconciled, self.version())
    }
}

impl<R: Reducer> Reducer for StateManager<R> {
    fn reduce(&self, state: Option<State>, action: &Action) -> State {
        let previous = state.map(VersionedState::from_tagged);
        self.reduce_versioned(previous.as_ref(), action).into_tagged()
    }
}

impl<R> fmt::Debug for StateManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("version", &self.reducer.version())
            .field("migrations", &self.migrations)
            .field("rehydrate_type", &self.rehydrate_type)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`StateManager`].
pub struct StateManagerBuilder<R> {
    reducer: R,
    config: Config,
    migrations: Migrations,
    observer: Option<Arc<dyn Observer>>,
}

impl<R: Reducer> StateManagerBuilder<R> {
    /// Replace the registered migrations.
    pub fn migrations(mut self, migrations: Migrations) -> Self {
        self.migrations = migrations;
        self
    }

    /// Register the migration into `version`.
    pub fn register_migration(mut self, version: u32, step: impl Migration + 'static) -> Self {
        self.migrations.register(version, step);
        self
    }

    /// Send diagnostics to `observer` instead of a [`TracingObserver`]
    /// built from the configuration.
    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        let observer: Arc<dyn Observer> = Arc::new(observer);
        self.observer = Some(observer);
        self
    }

    /// Send diagnostics to a shared observer.
    pub fn shared_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate the configuration and build the manager.
    pub fn build(self) -> Result<StateManager<R>, ConfigError> {
        let version = self.config.validate()?;
        let observer: Arc<dyn Observer> = match self.observer {
            Some(observer) => observer,
            None => Arc::new(TracingObserver::from_config(&self.config)),
        };

        Ok(StateManager {
            reducer: VersionedReducer::new(self.reducer, version),
            migrations: self.migrations,
            observer,
            rehydrate_type: self.config.rehydrate_type,
        })
    }
}
