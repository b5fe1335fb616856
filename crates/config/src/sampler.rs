use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Sampler {
    /// Basename of the block device to monitor, as it appears under
    /// `/sys/block` (for example `nvme0n1` or `sda`). Partition names are
    /// accepted too; readahead is still tuned on the queue of the named node.
    pub device: String,

    /// Capacity of the queue between the kernel event reader and the control
    /// loop. Events arriving while the queue is full are dropped and counted;
    /// they never block the reader.
    ///
    /// ## Note
    ///
    /// The default is generous for a single device. Raising it only helps if
    /// the cycle summary regularly reports non-zero drops.
    pub queue_capacity: usize,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            device: "nvme0n1".into(),
            queue_capacity: 65_536,
        }
    }
}
