use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use crate::observer::{Diagnostic, Observer};
use crate::state::State;
use crate::versioned::VersionedState;

/// A migration that transforms state into the schema of one version.
///
/// Migrations are keyed by the version they migrate *into*. Each must be
/// pure: the same input always produces the same output. Any closure
/// `Fn(State) -> State` is a migration.
pub trait Migration: Send + Sync {
    /// Transform `state` into the target schema.
    fn migrate(&self, state: State) -> State;
}

impl<F> Migration for F
where
    F: Fn(State) -> State + Send + Sync,
{
    fn migrate(&self, state: State) -> State {
        self(state)
    }
}

/// Version-indexed migrations.
///
/// Versions need not be contiguous. When state at version N is migrated,
/// every registered step with a version strictly greater than N runs, in
/// ascending order. There is no upper bound: a step registered above the
/// current schema version also runs.
///
/// # Example
///
/// ```
/// use rehydrate_kit::{Migrations, NoopObserver, State, VersionedState};
/// use serde_json::json;
///
/// let mut migrations = Migrations::new();
/// migrations.register(1, |mut state: State| {
///     state.insert("theme".into(), json!("light"));
///     state
/// });
/// migrations.register(2, |mut state: State| {
///     state.remove("legacy");
///     state
/// });
///
/// let stored = json!({ "legacy": true }).as_object().unwrap().clone();
/// let migrated = migrations.migrate(VersionedState::new(stored, 0), 2, &NoopObserver);
///
/// assert_eq!(migrated.version, 2);
/// assert_eq!(serde_json::Value::Object(migrated.state), json!({ "theme": "light" }));
/// ```
#[derive(Default)]
pub struct Migrations {
    steps: BTreeMap<u32, Box<dyn Migration>>,
}

impl Migrations {
    /// Create an empty set of migrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the migration into `version`, replacing any previous one.
    pub fn register(&mut self, version: u32, step: impl Migration + 'static) -> &mut Self {
        self.steps.insert(version, Box::new(step));
        self
    }

    /// Builder-style [`Migrations::register`].
    pub fn with(mut self, version: u32, step: impl Migration + 'static) -> Self {
        self.register(version, step);
        self
    }

    /// Registered versions, ascending.
    pub fn versions(&self) -> Vec<u32> {
        self.steps.keys().copied().collect()
    }

    /// Number of registered migrations.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no migration is registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Versions that would run for state at `inbound`, in order.
    pub fn plan(&self, inbound: u32) -> Vec<u32> {
        self.steps
            .range((Bound::Excluded(inbound), Bound::Unbounded))
            .map(|(version, _)| *version)
            .collect()
    }

    /// Bring `incoming` up to `current_version`.
    ///
    /// - Matching versions return `incoming` unchanged.
    /// - A newer `incoming` is never downgraded: it is returned unchanged
    ///   and a [`Diagnostic::DowngradeRejected`] is reported.
    /// - Otherwise the planned steps are folded over the state and the
    ///   result is tagged with `current_version`. An empty plan leaves the
    ///   state as it was.
    ///
    /// A panicking step propagates to the caller.
    pub fn migrate(
        &self,
        incoming: VersionedState,
        current_version: u32,
        observer: &dyn Observer,
    ) -> VersionedState {
        let inbound = incoming.version;

        if inbound == 0 && !incoming.state.is_empty() {
            observer.observe(Diagnostic::UnversionedPayload {
                keys: incoming.state.len(),
            });
        }

        if inbound == current_version {
            observer.observe(Diagnostic::VersionsMatch { version: inbound });
            return incoming;
        }

        if inbound > current_version {
            observer.observe(Diagnostic::DowngradeRejected {
                inbound,
                current: current_version,
            });
            return incoming;
        }

        observer.observe(Diagnostic::MigrationPlan {
            inbound,
            versions: self.plan(inbound),
        });

        let state = self
            .steps
            .range((Bound::Excluded(inbound), Bound::Unbounded))
            .fold(incoming.state, |state, (version, step)| {
                let next = step.migrate(state);
                observer.observe(Diagnostic::MigrationApplied { version: *version });
                next
            });

        VersionedState::new(state, current_version)
    }
}

impl fmt::Debug for Migrations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrations")
            .field("versions", &self.versions())
            .finish()
    }
}

/// Bring `incoming` up to `current_version` using `migrations`.
///
/// See [`Migrations::migrate`].
pub fn migrate(
    incoming: VersionedState,
    migrations: &Migrations,
    current_version: u32,
    observer: &dyn Observer,
) -> VersionedState {
    migrations.migrate(incoming, current_version, observer)
}
