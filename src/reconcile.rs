use serde_json::Value;

use crate::observer::{Diagnostic, KeyOutcome, Observer};
use crate::state::{as_plain, is_falsy, is_structured, shallow_merge, State};

/// Combine migrated persisted state with the state the reducer produced for
/// the rehydration action.
///
/// The result starts as `reduced`. Each top-level key of `incoming` is then
/// resolved in turn:
///
/// 1. Keys the live state (`previous`) never declared keep the reducer value.
/// 2. A structured live value is never replaced by a falsy incoming value.
/// 3. Keys the reducer changed while handling the action keep the reducer
///    value.
/// 4. Otherwise the incoming value is taken: shallow-merged over the live
///    value when both are objects, verbatim when not.
///
/// Keys only present in `reduced` pass through untouched.
///
/// # Example
///
/// ```
/// use rehydrate_kit::{reconcile, NoopObserver};
/// use serde_json::json;
///
/// let previous = json!({ "prefs": { "theme": "dark", "beta": false }, "session": null });
/// let incoming = json!({ "prefs": { "theme": "light" }, "session": "abc" });
/// let reduced = json!({ "prefs": { "theme": "dark", "beta": false }, "session": "fresh" });
///
/// let result = reconcile(
///     previous.as_object().unwrap(),
///     incoming.as_object().unwrap(),
///     reduced.as_object().unwrap().clone(),
///     &NoopObserver,
/// );
///
/// // Untouched by the reducer: merged with the live defaults.
/// assert_eq!(result["prefs"], json!({ "theme": "light", "beta": false }));
/// // Changed by the reducer: the reducer wins.
/// assert_eq!(result["session"], json!("fresh"));
/// ```
pub fn reconcile(previous: &State, incoming: &State, reduced: State, observer: &dyn Observer) -> State {
    // Each incoming key is written at most once, and only after it has been
    // compared, so `result` still holds the reducer's value at comparison time.
    let mut result = reduced;

    for (key, inbound) in incoming {
        let outcome = resolve(key, previous.get(key), inbound, &mut result, observer);
        observer.observe(Diagnostic::KeyReconciled {
            key: key.clone(),
            outcome,
        });
    }

    result
}

fn resolve(
    key: &str,
    live: Option<&Value>,
    inbound: &Value,
    result: &mut State,
    observer: &dyn Observer,
) -> KeyOutcome {
    let Some(live) = live else {
        observer.observe(Diagnostic::LiveKeyMissing { key: key.into() });
        return KeyOutcome::NotInLiveState;
    };

    if let (Some(live_fields), Some(inbound_fields)) = (as_plain(live), as_plain(inbound)) {
        for field in live_fields.keys().filter(|f| !inbound_fields.contains_key(*f)) {
            observer.observe(Diagnostic::LiveFieldMissing {
                key: key.into(),
                field: field.clone(),
            });
        }
    }

    if is_structured(live) && is_falsy(inbound) {
        return KeyOutcome::ShapeMismatch;
    }

    if result.get(key) != Some(live) {
        return KeyOutcome::ReducerModified;
    }

    match (as_plain(live), as_plain(inbound)) {
        (Some(live_fields), Some(inbound_fields)) => {
            let merged = shallow_merge(live_fields, inbound_fields);
            result.insert(key.into(), Value::Object(merged));
            KeyOutcome::Merged
        }
        _ => {
            result.insert(key.into(), inbound.clone());
            KeyOutcome::Overwritten
        }
    }
}
