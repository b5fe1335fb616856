use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to serialize TOML: {0}")]
    SerializeTOML(#[from] toml_edit::ser::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseTOML(#[from] toml_edit::TomlError),

    #[error("Failed to read configuration: {0}")]
    Deserialize(#[from] toml_edit::de::Error),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("inference timeout ({timeout:?}) must be shorter than the window cycle ({cycle:?})")]
    TimeoutExceedsWindow { timeout: Duration, cycle: Duration },

    #[error("window cycle must be greater than zero")]
    ZeroWindowCycle,

    #[error("device name must not be empty")]
    EmptyDevice,
}
