#![forbid(unsafe_code)]

mod policy;
mod sysfs;

pub use policy::ReadaheadPolicy;
pub use sysfs::SysfsActuator;

use crate::domain::AccessPattern;
use crate::error::ActuationError;

/// What one actuation call did to the device tunable, in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationOutcome {
    /// The tunable was written with this value.
    Written(u32),
    /// The tunable already held this value; no write was issued.
    Unchanged(u32),
}

impl ActuationOutcome {
    pub fn target_kb(self) -> u32 {
        match self {
            Self::Written(kb) | Self::Unchanged(kb) => kb,
        }
    }
}

/// Converts a classification into a readahead setting. Failures are
/// per-cycle: the engine logs them and the next window retries with fresh
/// state.
pub trait Actuator: Send {
    /// Map `pattern` through the policy table and apply the target,
    /// skipping the write when the device already holds it.
    fn apply(&mut self, pattern: AccessPattern) -> Result<ActuationOutcome, ActuationError>;

    /// Replace the per-class target table (config reload).
    fn set_policy(&mut self, policy: ReadaheadPolicy);

    /// Last value successfully written this run, if any.
    fn last_written_kb(&self) -> Option<u32>;
}
