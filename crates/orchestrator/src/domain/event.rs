#![forbid(unsafe_code)]

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// One block request-issue event as observed from the kernel. Consumed once
/// by the window aggregator and discarded at the window boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoEvent {
    /// Byte address of the request start (sector x 512).
    pub offset: u64,
    /// Request length in bytes.
    pub size: u32,
    pub direction: Direction,
    /// Monotonic timestamp in nanoseconds.
    pub timestamp: u64,
}
