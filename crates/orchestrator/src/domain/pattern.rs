#![forbid(unsafe_code)]

use std::fmt;

/// Access-pattern class returned by the inference service. The integer codes
/// are part of the wire protocol and must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPattern {
    Sequential,
    Random,
    Mixed,
}

impl AccessPattern {
    pub fn code(self) -> i32 {
        match self {
            Self::Sequential => 0,
            Self::Random => 1,
            Self::Mixed => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Sequential),
            1 => Some(Self::Random),
            2 => Some(Self::Mixed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for pattern in [
            AccessPattern::Sequential,
            AccessPattern::Random,
            AccessPattern::Mixed,
        ] {
            assert_eq!(AccessPattern::from_code(pattern.code()), Some(pattern));
        }
        assert_eq!(AccessPattern::from_code(3), None);
        assert_eq!(AccessPattern::from_code(-1), None);
    }
}
