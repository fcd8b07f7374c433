//! Parser/deserializer configuration.

use serde::{Deserialize, Serialize};

/// Default nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Tunables shared by the parser and the deserializer.
///
/// Derives serde so it can be embedded in a host application's config file;
/// missing fields fall back to [`Options::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Maximum object/array nesting depth. Bounds both parser recursion and
    /// the seed stack; deeper documents fail with `DepthLimitExceeded`.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
