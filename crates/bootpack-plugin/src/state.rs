//! Per-path plugin load state machine

/// Load state of one plugin directory
///
/// State transitions:
/// ```text
/// Unloaded → Loading → Loaded
///               │   ↖      │
///               ↓     └────┘ (re-load)
///             Failed ──→ Loading (retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Path has never been loaded
    #[default]
    Unloaded,
    /// Entry point is being evaluated
    Loading,
    /// Definition is stored in the registry
    Loaded,
    /// Last load attempt failed
    Failed,
}

impl LoadState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: LoadState) -> bool {
        use LoadState::*;
        matches!(
            (self, target),
            (Unloaded, Loading)
                | (Loading, Loaded)
                | (Loading, Failed)
                // Re-load and retry both restart the attempt
                | (Loaded, Loading)
                | (Failed, Loading)
        )
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadState::Unloaded => write!(f, "Unloaded"),
            LoadState::Loading => write!(f, "Loading"),
            LoadState::Loaded => write!(f, "Loaded"),
            LoadState::Failed => write!(f, "Failed"),
        }
    }
}
