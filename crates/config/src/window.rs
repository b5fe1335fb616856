use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Window {
    /// The quantum of time for the control loop. Events are aggregated for
    /// one cycle, then a single classification and actuation decision is
    /// made. **Measured in milliseconds**.
    ///
    /// ## Note
    ///
    /// Setting this too low leaves the classifier with too few events per
    /// window and makes the readahead setting flap.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub cycle: Duration,

    /// Offset delta between two consecutive requests above which the pair is
    /// counted as a "large jump", in bytes. The fraction of large jumps per
    /// window is the randomness proxy fed to the classifier.
    pub jump_threshold_bytes: u64,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            cycle: Duration::from_millis(2_500),
            jump_threshold_bytes: 1024 * 1024,
        }
    }
}
