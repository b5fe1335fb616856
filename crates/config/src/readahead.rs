use serde::{Deserialize, Serialize};

/// Per-class readahead targets, in KiB, written to the device's
/// `queue/read_ahead_kb` tunable.
///
/// These are heuristics, not derived truths; tune them per device. The
/// defaults favor deep prefetch for sequential streams and near-none for
/// random access.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Readahead {
    /// Target when the window is classified sequential.
    pub sequential_kb: u32,

    /// Target when the window is classified random.
    pub random_kb: u32,

    /// Target when the window is classified mixed.
    pub mixed_kb: u32,
}

impl Default for Readahead {
    fn default() -> Self {
        Self {
            sequential_kb: 256,
            random_kb: 16,
            mixed_kb: 64,
        }
    }
}
