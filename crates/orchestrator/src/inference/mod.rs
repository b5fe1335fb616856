#![forbid(unsafe_code)]

mod client;
pub mod protocol;

pub use client::UnixSocketClassifier;

use crate::domain::AccessPattern;
use crate::error::InferenceError;
use crate::features::FeatureVector;
use async_trait::async_trait;
use std::time::Duration;

/// One classification per window. Implementations must never block past
/// their configured timeout; a failed call is abandoned for the cycle and
/// the next window makes an independent attempt.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, features: &FeatureVector) -> Result<AccessPattern, InferenceError>;

    /// Applied on config reload. Default is a no-op for classifiers without
    /// a timeout notion (test stubs).
    fn set_timeout(&mut self, _timeout: Duration) {}
}
