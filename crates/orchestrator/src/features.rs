#![forbid(unsafe_code)]

use crate::domain::WindowSummary;
use std::time::Duration;

pub const FEATURE_COUNT: usize = 5;

/// Windows shorter than this produce no meaningful rates; rate features are
/// zeroed instead of dividing by a near-zero duration.
const MIN_WINDOW_SECS: f64 = 1e-6;

/// Below this IOPS the bandwidth/IOPS quotient blows up, so average request
/// size falls back to `total_bytes / events`.
const MIN_IOPS: f64 = 1e-3;

/// The feature contract with the inference service. Field order is the wire
/// order; reordering is a breaking protocol change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureVector {
    /// Mean absolute offset delta between consecutive events, bytes.
    pub avg_distance_bytes: f32,
    /// Fraction of deltas exceeding the large-jump threshold, in [0, 1].
    pub jump_ratio: f32,
    /// Mean request size, bytes.
    pub avg_io_size_bytes: f32,
    /// `1 - jump_ratio`, in [0, 1]. Higher means more sequential locality.
    pub seq_ratio: f32,
    /// Events per second over the window.
    pub iops_mean: f32,
}

impl FeatureVector {
    pub fn to_array(self) -> [f32; FEATURE_COUNT] {
        [
            self.avg_distance_bytes,
            self.jump_ratio,
            self.avg_io_size_bytes,
            self.seq_ratio,
            self.iops_mean,
        ]
    }

    pub fn from_array(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            avg_distance_bytes: values[0],
            jump_ratio: values[1],
            avg_io_size_bytes: values[2],
            seq_ratio: values[3],
            iops_mean: values[4],
        }
    }
}

/// Derive the feature vector for one completed window. Pure; never emits NaN
/// or infinity, whatever the summary contains.
pub fn encode(summary: &WindowSummary, window: Duration) -> FeatureVector {
    let events = summary.events;
    let secs = window.as_secs_f64();

    let avg_distance_bytes = if summary.delta_count > 0 {
        summary.delta_sum as f64 / summary.delta_count as f64
    } else {
        0.0
    };

    let jump_ratio = if events >= 2 {
        (summary.jumps as f64 / (events - 1) as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let seq_ratio = (1.0 - jump_ratio).clamp(0.0, 1.0);

    let (iops_mean, avg_io_size_bytes) = if events == 0 {
        (0.0, 0.0)
    } else if secs >= MIN_WINDOW_SECS {
        let iops = events as f64 / secs;
        let bandwidth = summary.total_bytes as f64 / secs;
        let avg_size = if iops > MIN_IOPS {
            bandwidth / iops
        } else {
            summary.total_bytes as f64 / events as f64
        };
        (iops, avg_size)
    } else {
        (0.0, summary.total_bytes as f64 / events as f64)
    };

    FeatureVector {
        avg_distance_bytes: avg_distance_bytes as f32,
        jump_ratio: jump_ratio as f32,
        avg_io_size_bytes: avg_io_size_bytes as f32,
        seq_ratio: seq_ratio as f32,
        iops_mean: iops_mean as f32,
    }
}
