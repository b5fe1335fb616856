use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// ratuned: online adaptive readahead tuning
///
/// ratuned samples block I/O issue events for one device, reduces each time
/// window to an access-pattern feature vector, asks a local inference service
/// to classify it, and retunes the device's readahead accordingly.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// If not provided, the default locations are checked. They are
    /// `/etc/ratuned/config.toml` and `/etc/ratuned/config.d/*.toml`, where
    /// the latter being a glob pattern. If they don't exist, the default
    /// configuration is used.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Block device to monitor, as named under /sys/block (overrides the
    /// config file).
    #[arg(short, long)]
    pub device: Option<String>,

    /// Window duration in milliseconds (overrides the config file).
    #[arg(short, long, value_parser = validate_window_ms)]
    pub window_ms: Option<u64>,

    /// Inference service socket path (overrides the config file).
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Large-jump threshold in bytes (overrides the config file).
    #[arg(short, long)]
    pub jump_threshold: Option<u64>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

impl Cli {
    /// Fold command-line overrides into a loaded config. Flags win over
    /// every file, mirroring the precedence of the verbosity flag.
    pub fn apply_overrides(&self, config: &mut config::Config) {
        if let Some(device) = &self.device {
            config.sampler.device = device.clone();
        }
        if let Some(window_ms) = self.window_ms {
            config.window.cycle = Duration::from_millis(window_ms);
        }
        if let Some(socket) = &self.socket {
            config.inference.socket = socket.clone();
        }
        if let Some(jump_threshold) = self.jump_threshold {
            config.window.jump_threshold_bytes = jump_threshold;
        }
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

/// A zero-length window can never aggregate anything.
#[inline(always)]
fn validate_window_ms(window: &str) -> Result<u64, String> {
    let window: u64 = window
        .parse()
        .map_err(|_| format!("`{window}` is not a valid window duration"))?;
    if window > 0 {
        Ok(window)
    } else {
        Err("Window duration must be at least 1 ms".to_string())
    }
}
