//! Convenient re-exports for common usage.
//!
//! ```
//! use rehydrate_kit::prelude::*;
//! ```

pub use crate::Action;
pub use crate::Config;
pub use crate::Migrations;
pub use crate::Reducer;
pub use crate::State;
pub use crate::StateManager;
pub use crate::VersionedState;
