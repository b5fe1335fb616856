use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to attach block I/O probe: {0}")]
    ProbeAttach(String),

    #[error("Event sampler stopped delivering events")]
    SamplerStopped,

    #[error("Classification failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Actuation failed: {0}")]
    Actuation(#[from] ActuationError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] config::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of one classify round trip. None of these outlive the cycle that
/// produced them; the next window makes an independent attempt.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("failed to connect to inference socket: {0}")]
    ConnectFailed(#[source] std::io::Error),

    #[error("inference round trip exceeded {0:?}")]
    Timeout(Duration),

    #[error("inference socket I/O failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("inference service closed the connection before a full response")]
    ShortResponse,

    #[error("inference service returned unknown class code {0}")]
    MalformedResponse(i32),
}

#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    #[error("permission denied writing {path:?}")]
    PermissionDenied { path: PathBuf },

    #[error("device {device} has no readahead tunable at {path:?}")]
    DeviceMissing { device: String, path: PathBuf },

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
