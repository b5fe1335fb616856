#![forbid(unsafe_code)]

mod replay;
mod tracefs;

pub use replay::ReplaySource;
pub use tracefs::TracefsSampler;

use crate::domain::IoEvent;
use crate::error::Error;
use async_trait::async_trait;
use std::time::Duration;

/// Receives the events drained from an [`EventSource`] during one window.
pub trait EventSink {
    fn observe(&mut self, event: IoEvent);
}

/// Counters for one drained window. Dropped events were discarded between
/// the kernel reader and the queue because the queue was full; they are
/// accounted for but never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    pub events: u64,
    pub dropped: u64,
}

/// A stream of block I/O events for one device. Implemented by the
/// tracefs-backed sampler and by a synthetic replay source for tests.
#[async_trait]
pub trait EventSource: Send {
    /// Block for up to `window`, forwarding every event received in that
    /// interval to `sink`, then return the window's counters.
    async fn drain(
        &mut self,
        window: Duration,
        sink: &mut (dyn EventSink + Send),
    ) -> Result<SampleStats, Error>;
}
