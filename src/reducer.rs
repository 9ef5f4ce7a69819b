use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::State;
use crate::versioned::{VersionedState, VERSION_KEY};

/// Action type tag emitted by the persistence layer when stored state is
/// loaded back into the store.
pub const REHYDRATE: &str = "persist/REHYDRATE";

/// An action dispatched to the store.
///
/// Serialized as `{ "type": ..., "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional action payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    /// Create an action with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    /// Create an action carrying a payload.
    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }

    /// Create a rehydration action carrying previously persisted state.
    pub fn rehydrate(persisted: State) -> Self {
        Self::with_payload(REHYDRATE, Value::Object(persisted))
    }

    /// Check the action's type tag.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// The payload as a state tree.
    ///
    /// An absent payload, or one that is not an object, reads as an empty
    /// state tree.
    pub fn state_payload(&self) -> State {
        match &self.payload {
            Some(Value::Object(map)) => map.clone(),
            _ => State::new(),
        }
    }
}

/// A reducer: computes the next state from the previous state and an action.
///
/// `None` means the store has no state yet (the first dispatch). Any closure
/// of the matching shape is a reducer.
///
/// ```
/// use rehydrate_kit::{Action, Reducer, State};
///
/// let reducer = |state: Option<State>, _action: &Action| state.unwrap_or_default();
/// assert!(reducer.reduce(None, &Action::new("init")).is_empty());
/// ```
pub trait Reducer {
    /// Produce the next state.
    fn reduce(&self, state: Option<State>, action: &Action) -> State;
}

impl<F> Reducer for F
where
    F: Fn(Option<State>, &Action) -> State,
{
    fn reduce(&self, state: Option<State>, action: &Action) -> State {
        self(state, action)
    }
}

/// Wrap `reducer` so every state it produces is tagged with `version`.
pub fn wrap<R: Reducer>(reducer: R, version: u32) -> VersionedReducer<R> {
    VersionedReducer::new(reducer, version)
}

/// A reducer wrapper that owns the schema version tag.
///
/// The inner reducer never sees the version. Its output is always tagged with
/// the configured version, whatever the inner reducer returned.
#[derive(Debug, Clone)]
pub struct VersionedReducer<R> {
    inner: R,
    version: u32,
}

impl<R> VersionedReducer<R> {
    /// Wrap `inner`, tagging its output with `version`.
    pub fn new(inner: R, version: u32) -> Self {
        Self { inner, version }
    }

    /// The version every produced state is tagged with.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The wrapped reducer.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: Reducer> VersionedReducer<R> {
    /// Run the inner reducer on the untagged state and tag the result.
    pub fn reduce_versioned(&self, state: Option<&VersionedState>, action: &Action) -> VersionedState {
        let next = self
            .inner
            .reduce(state.map(|versioned| versioned.state.clone()), action);
        let mut versioned = VersionedState::from_tagged(next);
        versioned.version = self.version;
        versioned
    }
}

impl<R: Reducer> Reducer for VersionedReducer<R> {
    fn reduce(&self, state: Option<State>, action: &Action) -> State {
        let untagged = state.map(|mut tagged| {
            tagged.remove(VERSION_KEY);
            tagged
        });
        let mut next = self.inner.reduce(untagged, action);
        next.insert(VERSION_KEY.into(), Value::from(self.version));
        next
    }
}
