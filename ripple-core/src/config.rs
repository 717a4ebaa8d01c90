//! Runtime Configuration
//!
//! Tunables for the reactive runtime. A configuration is installed per
//! thread with [`Runtime::configure`](crate::reactive::Runtime::configure);
//! threads that never install one use [`RuntimeConfig::default`].
//!
//! Configurations can be loaded from JSON. Missing fields fall back to their
//! defaults:
//!
//! ```rust
//! use ripple_core::config::{OverlapPolicy, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_json(r#"{ "max_stack_depth": 4 }"#).unwrap();
//! assert_eq!(config.max_stack_depth, 4);
//! assert_eq!(config.overlap_policy, OverlapPolicy::LastWriteWins);
//! ```

use serde::{Deserialize, Serialize};

/// Default bound on how often an effect may re-enter itself.
pub const DEFAULT_MAX_STACK_DEPTH: usize = 10;

/// What a resource does with a fetch that is still in flight when a newer
/// fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Let every fetch finish. Whichever completion lands last wins.
    #[default]
    LastWriteWins,

    /// Abort the older fetch as soon as a newer one starts.
    CancelSuperseded,
}

/// Per-thread runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Nested re-runs an effect tolerates before failing with
    /// [`ReactiveError::CircularDependency`](crate::ReactiveError::CircularDependency).
    pub max_stack_depth: usize,

    /// Overlap policy used by resources that do not set one explicitly.
    pub overlap_policy: OverlapPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: DEFAULT_MAX_STACK_DEPTH,
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builder-style setter for the re-entrancy bound.
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    /// Builder-style setter for the default overlap policy.
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }
}
