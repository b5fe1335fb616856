#![forbid(unsafe_code)]

use crate::domain::AccessPattern;
use crate::error::InferenceError;
use crate::features::FeatureVector;
use crate::inference::protocol::{self, REQUEST_LEN, RESPONSE_LEN};
use crate::inference::Classifier;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Classifier backed by the inference service's Unix domain socket. Opens a
/// fresh connection per window and closes it after the response: connection
/// setup is cheap locally and a crashed service never wedges a kept-alive
/// stream.
#[derive(Debug, Clone)]
pub struct UnixSocketClassifier {
    socket: PathBuf,
    timeout: Duration,
}

impl UnixSocketClassifier {
    pub fn new(socket: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket: socket.into(),
            timeout,
        }
    }

    async fn round_trip(&self, frame: [u8; REQUEST_LEN]) -> Result<[u8; RESPONSE_LEN], InferenceError> {
        let mut stream = UnixStream::connect(&self.socket)
            .await
            .map_err(InferenceError::ConnectFailed)?;
        stream.write_all(&frame).await.map_err(InferenceError::Io)?;

        let mut response = [0u8; RESPONSE_LEN];
        stream
            .read_exact(&mut response)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::UnexpectedEof => InferenceError::ShortResponse,
                _ => InferenceError::Io(err),
            })?;
        Ok(response)
    }
}

#[async_trait]
impl Classifier for UnixSocketClassifier {
    async fn classify(&self, features: &FeatureVector) -> Result<AccessPattern, InferenceError> {
        let frame = protocol::encode_request(features);
        let response = tokio::time::timeout(self.timeout, self.round_trip(frame))
            .await
            .map_err(|_| InferenceError::Timeout(self.timeout))??;
        protocol::decode_response(response)
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}
