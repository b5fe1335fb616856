#![forbid(unsafe_code)]

use crate::domain::AccessPattern;

/// Per-class readahead targets in KiB. Built from the `[readahead]` config
/// section; nothing here is a hard-coded constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadaheadPolicy {
    pub sequential_kb: u32,
    pub random_kb: u32,
    pub mixed_kb: u32,
}

impl ReadaheadPolicy {
    pub fn target_kb(&self, pattern: AccessPattern) -> u32 {
        match pattern {
            AccessPattern::Sequential => self.sequential_kb,
            AccessPattern::Random => self.random_kb,
            AccessPattern::Mixed => self.mixed_kb,
        }
    }
}

impl From<&config::Readahead> for ReadaheadPolicy {
    fn from(section: &config::Readahead) -> Self {
        Self {
            sequential_kb: section.sequential_kb,
            random_kb: section.random_kb,
            mixed_kb: section.mixed_kb,
        }
    }
}
