use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::State;

/// Reserved top-level key holding the schema version in a tagged state tree.
pub const VERSION_KEY: &str = "version";

/// A state tree together with the schema version it conforms to.
///
/// The version never lives inside `state`. It is only folded into the tree
/// when crossing the store boundary:
/// ```text
/// { ...state, "version": N }
/// ```
///
/// # Example
///
/// ```
/// use rehydrate_kit::VersionedState;
/// use serde_json::json;
///
/// let tagged = json!({ "todos": [], "version": 3 });
/// let versioned = VersionedState::from_tagged(tagged.as_object().unwrap().clone());
///
/// assert_eq!(versioned.version, 3);
/// assert!(!versioned.state.contains_key("version"));
///
/// let back = versioned.into_tagged();
/// assert_eq!(back["version"], json!(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "State", into = "State")]
pub struct VersionedState {
    /// Application state, without the version tag.
    pub state: State,
    /// Schema version of `state`. `0` means unversioned.
    pub version: u32,
}

impl VersionedState {
    /// Create a versioned state.
    pub fn new(state: State, version: u32) -> Self {
        Self { state, version }
    }

    /// Split the version tag off a flat state tree.
    ///
    /// A missing, non-integer or out-of-range tag yields version `0`.
    pub fn from_tagged(mut tagged: State) -> Self {
        let version = tagged
            .remove(VERSION_KEY)
            .as_ref()
            .and_then(parse_version)
            .unwrap_or(0);
        Self {
            state: tagged,
            version,
        }
    }

    /// Fold the version tag back into a flat state tree.
    pub fn into_tagged(self) -> State {
        let mut tagged = self.state;
        tagged.insert(VERSION_KEY.into(), Value::from(self.version));
        tagged
    }

    /// Read the version tag of a flat state tree without splitting it.
    pub fn peek_version(tagged: &State) -> u32 {
        tagged.get(VERSION_KEY).and_then(parse_version).unwrap_or(0)
    }

    /// Check if a flat state tree carries a usable version tag.
    pub fn is_versioned(tagged: &State) -> bool {
        Self::peek_version(tagged) != 0
    }
}

impl From<State> for VersionedState {
    fn from(tagged: State) -> Self {
        Self::from_tagged(tagged)
    }
}

impl From<VersionedState> for State {
    fn from(versioned: VersionedState) -> Self {
        versioned.into_tagged()
    }
}

fn parse_version(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|v| u32::try_from(v).ok())
}
