//! # rehydrate-kit
//!
//! Versioned state migration and rehydration reconciliation for
//! unidirectional-data-flow stores.
//!
//! When an application restarts, its persisted state is loaded back into the
//! store with a *rehydrate* action. Two things can go wrong: the persisted
//! state may follow an older schema, and the reducers may already have
//! changed parts of the state while handling that very action.
//! `rehydrate-kit` handles both.
//!
//! ## How It Works
//!
//! 1. Every state the root reducer produces is tagged with the current
//!    schema version ([`VersionedReducer`]).
//! 2. On rehydration, the persisted state is run through every registered
//!    migration newer than its own version, in ascending order
//!    ([`Migrations`]).
//! 3. The migrated state is reconciled with the reducer's output key by key
//!    ([`reconcile`]): reducer changes win, untouched objects are
//!    shallow-merged, everything else is replaced.
//!
//! ## Quick Start
//!
//! ```
//! use rehydrate_kit::prelude::*;
//! use serde_json::json;
//!
//! let reducer = |state: Option<State>, _: &Action| {
//!     state.unwrap_or_else(|| json!({ "prefs": { "theme": "dark", "sound": true } })
//!         .as_object().unwrap().clone())
//! };
//!
//! let manager = StateManager::builder(reducer, Config::new(1))
//!     .register_migration(1, |mut state: State| {
//!         state.remove("obsolete");
//!         state
//!     })
//!     .build()
//!     .unwrap();
//!
//! let live = manager.reduce(None, &Action::new("init"));
//!
//! let stored = json!({ "prefs": { "theme": "light" }, "obsolete": 1 });
//! let next = manager.reduce(Some(live), &Action::rehydrate(stored.as_object().unwrap().clone()));
//!
//! assert_eq!(next["prefs"], json!({ "theme": "light", "sound": true }));
//! assert_eq!(next["version"], json!(1));
//! assert!(!next.contains_key("obsolete"));
//! ```
//!
//! ## Diagnostics
//!
//! The migration sequencer and the reconciler report each decision to an
//! [`Observer`]. By default a [`TracingObserver`] forwards them to
//! [`tracing`], filtered by the `log` and `debug` options of [`Config`].

#![warn(missing_docs)]

mod config;
mod manager;
mod migrate;
mod reconcile;
mod reducer;
mod versioned;

pub mod observer;
pub mod prelude;
pub mod state;

pub use config::{BuildMode, Config, ConfigError};
pub use manager::{create_state_manager, StateManager, StateManagerBuilder};
pub use migrate::{migrate, Migration, Migrations};
pub use observer::{Diagnostic, KeyOutcome, NoopObserver, Observer, RecordingObserver, TracingObserver};
pub use reconcile::reconcile;
pub use reducer::{wrap, Action, Reducer, VersionedReducer, REHYDRATE};
pub use state::{is_falsy, is_plain_enough, is_structured, shallow_merge, State};
pub use versioned::{VersionedState, VERSION_KEY};
