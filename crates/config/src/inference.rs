use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::path::PathBuf;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Inference {
    /// Path of the Unix domain socket the prediction service listens on. One
    /// connection is opened per window and closed after the response.
    pub socket: PathBuf,

    /// Upper bound on the whole classify round trip (connect, write, read).
    /// **Measured in milliseconds**. Must be strictly shorter than
    /// `window.cycle`; validation rejects configs where it is not.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub timeout: Duration,
}

impl Default for Inference {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/tmp/ml_predictor.sock"),
            timeout: Duration::from_millis(200),
        }
    }
}
