#![forbid(unsafe_code)]

use crate::actuation::{ActuationOutcome, Actuator, ReadaheadPolicy};
use crate::domain::AccessPattern;
use crate::error::ActuationError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_SYSFS_ROOT: &str = "/sys/block";

/// Writes readahead targets to `<root>/<device>/queue/read_ahead_kb` as a
/// decimal ASCII integer. Remembers the last value it wrote and skips the
/// kernel write while the pattern is stable.
#[derive(Debug)]
pub struct SysfsActuator {
    device: String,
    path: PathBuf,
    policy: ReadaheadPolicy,
    last_written: Option<u32>,
}

impl SysfsActuator {
    pub fn new(device: &str, policy: ReadaheadPolicy) -> Self {
        Self::with_root(DEFAULT_SYSFS_ROOT, device, policy)
    }

    /// Root override for tests; production code uses [`SysfsActuator::new`].
    pub fn with_root(root: impl AsRef<Path>, device: &str, policy: ReadaheadPolicy) -> Self {
        let path = root
            .as_ref()
            .join(device)
            .join("queue")
            .join("read_ahead_kb");
        Self {
            device: device.to_owned(),
            path,
            policy,
            last_written: None,
        }
    }
}

impl Actuator for SysfsActuator {
    fn apply(&mut self, pattern: AccessPattern) -> Result<ActuationOutcome, ActuationError> {
        let target = self.policy.target_kb(pattern);
        if self.last_written == Some(target) {
            return Ok(ActuationOutcome::Unchanged(target));
        }

        std::fs::write(&self.path, target.to_string()).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ActuationError::DeviceMissing {
                device: self.device.clone(),
                path: self.path.clone(),
            },
            ErrorKind::PermissionDenied => ActuationError::PermissionDenied {
                path: self.path.clone(),
            },
            _ => ActuationError::Io {
                path: self.path.clone(),
                source: err,
            },
        })?;

        // Only a successful write advances the remembered state, so a failed
        // cycle retries the same value next time.
        self.last_written = Some(target);
        debug!(device = %self.device, target_kb = target, "readahead updated");
        Ok(ActuationOutcome::Written(target))
    }

    fn set_policy(&mut self, policy: ReadaheadPolicy) {
        self.policy = policy;
    }

    fn last_written_kb(&self) -> Option<u32> {
        self.last_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn policy() -> ReadaheadPolicy {
        ReadaheadPolicy {
            sequential_kb: 256,
            random_kb: 16,
            mixed_kb: 64,
        }
    }

    fn fake_sysfs(device: &str) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(device).join("queue")).unwrap();
        dir
    }

    #[test]
    fn writes_decimal_ascii_target() {
        let dir = fake_sysfs("nvme0n1");
        let mut actuator = SysfsActuator::with_root(dir.path(), "nvme0n1", policy());

        let outcome = actuator.apply(AccessPattern::Sequential).unwrap();
        assert_eq!(outcome, ActuationOutcome::Written(256));

        let written =
            std::fs::read_to_string(dir.path().join("nvme0n1/queue/read_ahead_kb")).unwrap();
        assert_eq!(written, "256");
    }

    #[test]
    fn repeated_pattern_writes_once() {
        let dir = fake_sysfs("nvme0n1");
        let mut actuator = SysfsActuator::with_root(dir.path(), "nvme0n1", policy());

        assert_eq!(
            actuator.apply(AccessPattern::Sequential).unwrap(),
            ActuationOutcome::Written(256)
        );
        // Make a second write detectable, then check none happens.
        std::fs::write(dir.path().join("nvme0n1/queue/read_ahead_kb"), "sentinel").unwrap();
        assert_eq!(
            actuator.apply(AccessPattern::Sequential).unwrap(),
            ActuationOutcome::Unchanged(256)
        );
        let contents =
            std::fs::read_to_string(dir.path().join("nvme0n1/queue/read_ahead_kb")).unwrap();
        assert_eq!(contents, "sentinel");
    }

    #[test]
    fn pattern_change_writes_again() {
        let dir = fake_sysfs("nvme0n1");
        let mut actuator = SysfsActuator::with_root(dir.path(), "nvme0n1", policy());

        actuator.apply(AccessPattern::Sequential).unwrap();
        assert_eq!(
            actuator.apply(AccessPattern::Random).unwrap(),
            ActuationOutcome::Written(16)
        );
        assert_eq!(actuator.last_written_kb(), Some(16));
    }

    #[test]
    fn missing_device_maps_to_device_missing() {
        let dir = tempdir().unwrap();
        let mut actuator = SysfsActuator::with_root(dir.path(), "nvme9n9", policy());

        let err = actuator.apply(AccessPattern::Mixed).unwrap_err();
        assert!(matches!(err, ActuationError::DeviceMissing { .. }));
        // Failed writes leave the remembered state alone.
        assert_eq!(actuator.last_written_kb(), None);
    }

    #[test]
    fn reload_swaps_policy_but_keeps_state() {
        let dir = fake_sysfs("nvme0n1");
        let mut actuator = SysfsActuator::with_root(dir.path(), "nvme0n1", policy());
        actuator.apply(AccessPattern::Sequential).unwrap();

        actuator.set_policy(ReadaheadPolicy {
            sequential_kb: 512,
            random_kb: 8,
            mixed_kb: 64,
        });
        // Same class, new target: the changed table forces a real write.
        assert_eq!(
            actuator.apply(AccessPattern::Sequential).unwrap(),
            ActuationOutcome::Written(512)
        );
    }
}
