//! End-to-end rehydration through a combined root reducer.
//!
//! The root reducer is built from two slice reducers, the way a store
//! composes independent sub-reducers:
//! - `foo` holds a plain string and ignores every action.
//! - `bar` holds an object and, on rehydration, replaces itself with the
//!   `barReducer` entry of the payload (or an empty object).

use std::sync::Arc;

use rehydrate_kit::prelude::*;
use rehydrate_kit::{KeyOutcome, RecordingObserver, REHYDRATE};
use serde_json::{json, Value};

fn tree(value: Value) -> State {
    value.as_object().cloned().unwrap()
}

fn foo_reducer(state: Option<Value>, _action: &Action) -> Value {
    state.unwrap_or_else(|| json!("foo-default"))
}

fn bar_reducer(state: Option<Value>, action: &Action) -> Value {
    if action.is(REHYDRATE) {
        let stored = action
            .payload
            .as_ref()
            .and_then(|payload| payload.get("barReducer"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        return Value::Object(stored);
    }
    state.unwrap_or_else(|| json!({ "random": 0.4217 }))
}

fn static_bar_reducer(state: Option<Value>, _action: &Action) -> Value {
    state.unwrap_or_else(|| json!({ "random": 0.4217 }))
}

type Slice = fn(Option<Value>, &Action) -> Value;

fn combine(slices: Vec<(&'static str, Slice)>) -> impl Fn(Option<State>, &Action) -> State {
    move |state: Option<State>, action: &Action| {
        let previous = state.unwrap_or_default();
        slices
            .iter()
            .map(|(key, slice)| (key.to_string(), slice(previous.get(*key).cloned(), action)))
            .collect()
    }
}

fn root_reducer() -> impl Fn(Option<State>, &Action) -> State {
    combine(vec![("foo", foo_reducer as Slice), ("bar", bar_reducer as Slice)])
}

fn initial_state() -> State {
    root_reducer()(None, &Action::new("@@INIT"))
}

#[test]
fn clear_stored_state_migration() {
    let migrations = Migrations::new().with(1, |_: State| State::new());
    let stored = tree(json!({
        "foo": "boo",
        "bar": { "random": "not-so-random" },
    }));

    let manager = rehydrate_kit::create_state_manager(root_reducer(), Config::new(1), migrations).unwrap();
    let next = manager.reduce(Some(initial_state()), &Action::rehydrate(stored.clone()));

    for (key, value) in &next {
        assert_ne!(Some(value), stored.get(key), "key `{key}` kept its stored value");
    }
    assert_eq!(next["foo"], json!("foo-default"));
    assert_eq!(next["version"], json!(1));
}

#[test]
fn hard_set_new_value_migration() {
    let migrations = Migrations::new().with(1, |mut state: State| {
        state.insert("foo".into(), json!(2));
        state
    });

    let manager = rehydrate_kit::create_state_manager(root_reducer(), Config::new(1), migrations).unwrap();
    let next = manager.reduce(Some(initial_state()), &Action::rehydrate(initial_state()));

    assert_eq!(next["foo"], json!(2));
}

#[test]
fn null_never_replaces_structured_live_state() {
    let reducer = combine(vec![("foo", foo_reducer as Slice), ("bar", static_bar_reducer as Slice)]);
    let live = reducer(None, &Action::new("@@INIT"));
    let recorder = Arc::new(RecordingObserver::new());

    let manager = StateManager::builder(reducer, Config::new(1))
        .shared_observer(recorder.clone())
        .build()
        .unwrap();

    let stored = tree(json!({ "foo": "boo", "bar": null, "version": 1 }));
    let next = manager.reduce(Some(live), &Action::rehydrate(stored));

    assert_eq!(next["bar"], json!({ "random": 0.4217 }));
    assert_eq!(next["foo"], json!("boo"));
    assert_eq!(recorder.outcome("bar"), Some(KeyOutcome::ShapeMismatch));
    assert_eq!(recorder.outcome("foo"), Some(KeyOutcome::Overwritten));
}

#[test]
fn reducer_handling_rehydrate_keeps_its_result() {
    let recorder = Arc::new(RecordingObserver::new());
    let manager = StateManager::builder(root_reducer(), Config::new(1))
        .shared_observer(recorder.clone())
        .build()
        .unwrap();

    let stored = tree(json!({
        "bar": { "random": "stored" },
        "barReducer": { "random": "from-reducer" },
        "version": 1,
    }));
    let next = manager.reduce(Some(initial_state()), &Action::rehydrate(stored));

    assert_eq!(next["bar"], json!({ "random": "from-reducer" }));
    assert!(!next.contains_key("barReducer"));
    assert_eq!(recorder.outcome("bar"), Some(KeyOutcome::ReducerModified));
    assert_eq!(recorder.outcome("barReducer"), Some(KeyOutcome::NotInLiveState));
}

#[test]
fn versioned_live_state_round_trips_through_dispatches() {
    let manager = StateManager::builder(root_reducer(), Config::new(3))
        .register_migration(2, |mut state: State| {
            state.insert("foo".into(), json!("v2"));
            state
        })
        .register_migration(3, |mut state: State| {
            if let Some(Value::String(foo)) = state.get("foo").cloned() {
                state.insert("foo".into(), json!(format!("{foo}+v3")));
            }
            state
        })
        .build()
        .unwrap();

    let mut state = manager.reduce(None, &Action::new("@@INIT"));
    assert_eq!(VersionedState::peek_version(&state), 3);

    let stored = tree(json!({ "foo": "v1", "version": 1 }));
    state = manager.reduce(Some(state), &Action::rehydrate(stored));
    assert_eq!(state["foo"], json!("v2+v3"));

    state = manager.reduce(Some(state), &Action::new("noop"));
    assert_eq!(state["foo"], json!("v2+v3"));
    assert_eq!(state["version"], json!(3));
}

#[test]
fn tracing_observer_runs_under_a_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let manager = StateManager::builder(root_reducer(), Config::new(2).debug(true))
        .register_migration(2, |state: State| state)
        .build()
        .unwrap();

    let stored = tree(json!({ "foo": "boo", "ghost": true }));
    let next = manager.reduce(Some(initial_state()), &Action::rehydrate(stored));
    assert_eq!(next["foo"], json!("boo"));
    assert!(!next.contains_key("ghost"));
}

#[test]
fn config_file_drives_the_manager() {
    let config = Config::from_toml_str(
        r#"
        version = 2
        log = false
        rehydrate_type = "storage/LOADED"
        "#,
    )
    .unwrap();
    let manager = StateManager::builder(root_reducer(), config).build().unwrap();
    assert_eq!(manager.version(), 2);

    let action = Action::with_payload("storage/LOADED", json!({ "foo": "boo", "version": 2 }));
    assert!(manager.is_rehydrate(&action));
    let next = manager.reduce(Some(initial_state()), &action);
    assert_eq!(next["foo"], json!("boo"));
}
