//! Generation lifecycle states.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the current generation is in its lifecycle.
///
/// `Parsed → Installing → Waiting → Active`; a failed install ends in
/// `Redundant` and the previously active generation keeps serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    #[default]
    Parsed,
    Installing,
    Waiting,
    Active,
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Parsed => "parsed",
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }

    /// Install may start from a fresh or a previously failed generation.
    pub fn can_install(&self) -> bool {
        matches!(self, LifecycleState::Parsed | LifecycleState::Redundant)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable lifecycle bookkeeping guarded by the manager's lock.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    pub state: LifecycleState,
    /// Skip-waiting arrived while installing; activate as soon as install ends.
    pub skip_requested: bool,
}

/// Snapshot of the manager for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatus {
    /// Store name of this manager's generation.
    pub cache_name: String,
    pub state: LifecycleState,
    /// Store name recorded as active in storage.
    pub active_generation: Option<String>,
    /// Number of forced activations requested so far.
    pub forced_activations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_install() {
        assert!(LifecycleState::Parsed.can_install());
        assert!(LifecycleState::Redundant.can_install());
        assert!(!LifecycleState::Installing.can_install());
        assert!(!LifecycleState::Waiting.can_install());
        assert!(!LifecycleState::Active.can_install());
    }

    #[test]
    fn test_state_serde_names() {
        assert_eq!(serde_json::to_string(&LifecycleState::Waiting).unwrap(), "\"waiting\"");
        assert_eq!(LifecycleState::Active.to_string(), "active");
    }
}
