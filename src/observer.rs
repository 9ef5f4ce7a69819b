//! Diagnostics emitted at the decision points of migration and
//! reconciliation.
//!
//! The core never logs. It reports a [`Diagnostic`] to an [`Observer`] and
//! the observer decides what, if anything, to do with it.

use std::sync::Mutex;

use serde::Serialize;

use crate::config::{BuildMode, Config};

/// How the reconciler resolved a single top-level key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOutcome {
    /// The live state never declared the key; the reducer value was kept.
    NotInLiveState,
    /// The live value is structured but the incoming value is falsy; the
    /// reducer value was kept.
    ShapeMismatch,
    /// The reducer changed the key while handling the action; its value was
    /// kept.
    ReducerModified,
    /// Live and incoming objects were shallow-merged.
    Merged,
    /// The incoming value replaced the live value.
    Overwritten,
}

impl KeyOutcome {
    /// Whether the incoming value contributed to the result.
    pub fn is_rehydrated(self) -> bool {
        matches!(self, Self::Merged | Self::Overwritten)
    }
}

/// A decision point reached while rehydrating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The incoming state has keys but no version tag. Migrations run as if
    /// it were version 0.
    UnversionedPayload {
        /// Number of top-level keys in the payload.
        keys: usize,
    },
    /// Incoming and current versions match; nothing to migrate.
    VersionsMatch {
        /// The shared version.
        version: u32,
    },
    /// The incoming state is newer than the current schema and was left
    /// untouched.
    DowngradeRejected {
        /// Version of the incoming state.
        inbound: u32,
        /// Current schema version.
        current: u32,
    },
    /// The ordered list of migrations about to run.
    MigrationPlan {
        /// Version of the incoming state.
        inbound: u32,
        /// Target versions, ascending.
        versions: Vec<u32>,
    },
    /// One migration step finished.
    MigrationApplied {
        /// Target version of the step.
        version: u32,
    },
    /// The incoming state has a key the live state does not declare.
    LiveKeyMissing {
        /// Top-level key.
        key: String,
    },
    /// A live sub-state field is missing from the incoming sub-state.
    LiveFieldMissing {
        /// Top-level key.
        key: String,
        /// Field of the live sub-state absent from the incoming value.
        field: String,
    },
    /// A top-level key was resolved.
    KeyReconciled {
        /// Top-level key.
        key: String,
        /// How it was resolved.
        outcome: KeyOutcome,
    },
}

/// Receives diagnostics from the migration sequencer and the reconciler.
///
/// Observers must not influence the state being produced; they only watch.
pub trait Observer: Send + Sync {
    /// Handle one diagnostic.
    fn observe(&self, diagnostic: Diagnostic);
}

/// Discards every diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn observe(&self, _diagnostic: Diagnostic) {}
}

/// Keeps every diagnostic in memory.
///
/// Intended for tests and tooling that want to inspect what the reconciler
/// decided.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Diagnostic>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }

    /// The outcome recorded for `key`, if it was reconciled.
    pub fn outcome(&self, key: &str) -> Option<KeyOutcome> {
        self.diagnostics().into_iter().find_map(|d| match d {
            Diagnostic::KeyReconciled { key: k, outcome } if k == key => Some(outcome),
            _ => None,
        })
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.clear();
        }
    }
}

impl Observer for RecordingObserver {
    fn observe(&self, diagnostic: Diagnostic) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(diagnostic);
        }
    }
}

impl<O: Observer + ?Sized> Observer for std::sync::Arc<O> {
    fn observe(&self, diagnostic: Diagnostic) {
        (**self).observe(diagnostic)
    }
}

/// Forwards diagnostics to [`tracing`], filtered by the `log` and `debug`
/// configuration flags and the build mode.
///
/// | Diagnostic | Emitted when |
/// |------------|--------------|
/// | `MigrationPlan` | `log` |
/// | `DowngradeRejected` | `log` (error level) |
/// | `UnversionedPayload`, `LiveKeyMissing`, `LiveFieldMissing` | `log` and not production |
/// | `VersionsMatch`, `MigrationApplied`, `KeyReconciled` | `debug` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingObserver {
    log: bool,
    debug: bool,
    mode: BuildMode,
}

impl TracingObserver {
    /// Create an observer with explicit flags.
    pub fn new(log: bool, debug: bool, mode: BuildMode) -> Self {
        Self { log, debug, mode }
    }

    /// Create an observer using the flags of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.log, config.debug, config.mode)
    }

    fn advisories(&self) -> bool {
        self.log && self.mode != BuildMode::Production
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(true, false, BuildMode::default())
    }
}

impl Observer for TracingObserver {
    fn observe(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::UnversionedPayload { keys } if self.advisories() => {
                tracing::info!(
                    keys,
                    "rehydrated state has no version tag; every persisted tree needs the version key in scope. \
                     On the first run after adopting versioned state this is expected."
                );
            }
            Diagnostic::VersionsMatch { version } if self.debug => {
                tracing::debug!(version, "versions match, nothing to migrate");
            }
            Diagnostic::DowngradeRejected { inbound, current } if self.log => {
                tracing::error!(inbound, current, "downgrading state version is not supported");
            }
            Diagnostic::MigrationPlan { inbound, versions } if self.log => {
                tracing::info!(inbound, ?versions, "running state migrations");
            }
            Diagnostic::MigrationApplied { version } if self.debug => {
                tracing::debug!(version, "migration applied");
            }
            Diagnostic::LiveKeyMissing { key } if self.advisories() => {
                tracing::info!(
                    %key,
                    "live state has no key for rehydrated value; if the reducer was removed, \
                     write a migration that drops it from stored state"
                );
            }
            Diagnostic::LiveFieldMissing { key, field } if self.advisories() => {
                tracing::info!(
                    %key,
                    %field,
                    "live sub-state field is missing from rehydrated state; if it was recently \
                     added, consider setting it in a migration"
                );
            }
            Diagnostic::KeyReconciled { key, outcome } if self.debug => {
                tracing::debug!(%key, ?outcome, "key reconciled");
            }
            _ => {}
        }
    }
}
