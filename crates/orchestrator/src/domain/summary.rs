#![forbid(unsafe_code)]

use std::time::Duration;

/// Accumulated statistics for one window. Reflects exactly the events
/// observed since the last aggregator reset and never spans two windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowSummary {
    pub events: u64,
    pub reads: u64,
    pub writes: u64,
    pub total_bytes: u64,
    /// Sum of absolute offset deltas between consecutive events. Wide enough
    /// that adversarial offsets cannot overflow it within one window.
    pub delta_sum: u128,
    pub delta_count: u64,
    /// Deltas that exceeded the large-jump threshold.
    pub jumps: u64,
    pub last_offset: Option<u64>,
    /// Wall time covered by this window, measured from the previous reset.
    pub elapsed: Duration,
}
