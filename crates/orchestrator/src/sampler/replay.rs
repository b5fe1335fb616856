#![forbid(unsafe_code)]

use crate::domain::IoEvent;
use crate::error::Error;
use crate::sampler::{EventSink, EventSource, SampleStats};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

/// Synthetic event source that replays canned windows, one batch per
/// `drain` call. Returns immediately instead of sleeping so tests can drive
/// the pipeline deterministically; once the batches run out it yields empty
/// windows forever.
#[derive(Debug, Default)]
pub struct ReplaySource {
    windows: VecDeque<Vec<IoEvent>>,
}

impl ReplaySource {
    pub fn new(windows: impl IntoIterator<Item = Vec<IoEvent>>) -> Self {
        Self {
            windows: windows.into_iter().collect(),
        }
    }
}

#[async_trait]
impl EventSource for ReplaySource {
    async fn drain(
        &mut self,
        _window: Duration,
        sink: &mut (dyn EventSink + Send),
    ) -> Result<SampleStats, Error> {
        let batch = self.windows.pop_front().unwrap_or_default();
        let mut events = 0u64;
        for event in batch {
            sink.observe(event);
            events += 1;
        }
        Ok(SampleStats { events, dropped: 0 })
    }
}
