#![forbid(unsafe_code)]

use crate::domain::{Direction, IoEvent, WindowSummary};
use crate::sampler::EventSink;
use std::time::Instant;

/// Folds block I/O events into the current [`WindowSummary`] in O(1) per
/// event. Owned exclusively by the engine; one instance tracks exactly one
/// window at a time.
#[derive(Debug)]
pub struct WindowAggregator {
    jump_threshold: u64,
    summary: WindowSummary,
    window_started: Instant,
}

impl WindowAggregator {
    pub fn new(jump_threshold: u64) -> Self {
        Self {
            jump_threshold,
            summary: WindowSummary::default(),
            window_started: Instant::now(),
        }
    }

    /// Applied on config reload; takes effect from the next observed delta.
    pub fn set_jump_threshold(&mut self, jump_threshold: u64) {
        self.jump_threshold = jump_threshold;
    }

    pub fn observe(&mut self, event: IoEvent) {
        let summary = &mut self.summary;
        summary.events += 1;
        match event.direction {
            Direction::Read => summary.reads += 1,
            Direction::Write => summary.writes += 1,
        }
        summary.total_bytes = summary.total_bytes.saturating_add(u64::from(event.size));

        // The first event of a window has no predecessor and contributes no delta.
        if let Some(last) = summary.last_offset {
            let delta = last.abs_diff(event.offset);
            summary.delta_sum += u128::from(delta);
            summary.delta_count += 1;
            if delta > self.jump_threshold {
                summary.jumps += 1;
            }
        }
        summary.last_offset = Some(event.offset);
    }

    /// Return the completed window and immediately begin a new one. No event
    /// observed after this call is attributed to the returned summary.
    pub fn finish(&mut self) -> WindowSummary {
        let mut summary = std::mem::take(&mut self.summary);
        summary.elapsed = self.window_started.elapsed();
        self.window_started = Instant::now();
        summary
    }
}

impl EventSink for WindowAggregator {
    fn observe(&mut self, event: IoEvent) {
        WindowAggregator::observe(self, event);
    }
}
