#![forbid(unsafe_code)]

use crate::domain::{Direction, IoEvent};
use crate::error::Error;
use crate::sampler::{EventSink, EventSource, SampleStats};
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace, warn};

const SECTOR_BYTES: u64 = 512;

/// Samples `block:block_rq_issue` tracepoint events for one device through a
/// private tracefs instance. A dedicated thread parses `trace_pipe` and
/// pushes events into a bounded queue; a full queue drops (and counts) the
/// event rather than stalling the reader.
pub struct TracefsSampler {
    rx: flume::Receiver<IoEvent>,
    dropped: Arc<AtomicU64>,
    _instance: Option<TraceInstance>,
}

/// Owns the tracefs instance directory; disables the event and removes the
/// directory when the sampler goes away.
struct TraceInstance {
    dir: PathBuf,
}

impl Drop for TraceInstance {
    fn drop(&mut self) {
        let _ = fs::write(self.dir.join(ENABLE_PATH), "0");
        let _ = fs::remove_dir(&self.dir);
    }
}

const ENABLE_PATH: &str = "events/block/block_rq_issue/enable";

impl TracefsSampler {
    /// Attach the probe for `device`. Any failure here (tracefs missing,
    /// unknown device, insufficient privilege) means there is no event
    /// source at all, which is fatal to the control loop.
    pub fn attach(device: &str, queue_capacity: usize) -> Result<Self, Error> {
        let dev = resolve_device(device)?;
        let root = tracefs_root().ok_or_else(|| {
            Error::ProbeAttach(
                "tracefs not available (looked under /sys/kernel/tracing and \
                 /sys/kernel/debug/tracing)"
                    .into(),
            )
        })?;

        let dir = root
            .join("instances")
            .join(format!("ratuned-{}", std::process::id()));
        fs::create_dir(&dir).map_err(|err| {
            Error::ProbeAttach(format!(
                "cannot create trace instance {}: {err}",
                dir.display()
            ))
        })?;
        let instance = TraceInstance { dir };

        fs::write(instance.dir.join(ENABLE_PATH), "1").map_err(|err| {
            Error::ProbeAttach(format!("cannot enable block_rq_issue: {err}"))
        })?;
        let pipe = File::open(instance.dir.join("trace_pipe")).map_err(|err| {
            Error::ProbeAttach(format!("cannot open trace_pipe: {err}"))
        })?;

        let (tx, rx) = flume::bounded(queue_capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));
        let reader_dropped = Arc::clone(&dropped);
        std::thread::Builder::new()
            .name("ratuned-sampler".into())
            .spawn(move || reader_loop(pipe, tx, reader_dropped, dev))
            .map_err(|err| Error::ProbeAttach(format!("cannot spawn reader thread: {err}")))?;

        debug!(device, major = dev.0, minor = dev.1, "block probe attached");
        Ok(Self {
            rx,
            dropped,
            _instance: Some(instance),
        })
    }

    #[cfg(test)]
    fn from_channel(rx: flume::Receiver<IoEvent>, dropped: Arc<AtomicU64>) -> Self {
        Self {
            rx,
            dropped,
            _instance: None,
        }
    }
}

#[async_trait]
impl EventSource for TracefsSampler {
    async fn drain(
        &mut self,
        window: Duration,
        sink: &mut (dyn EventSink + Send),
    ) -> Result<SampleStats, Error> {
        let deadline = tokio::time::Instant::now() + window;
        let mut events = 0u64;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, self.rx.recv_async()).await {
                Ok(Ok(event)) => {
                    sink.observe(event);
                    events += 1;
                }
                // Reader thread gone: the probe is effectively detached.
                Ok(Err(_)) => return Err(Error::SamplerStopped),
                // Window elapsed.
                Err(_) => break,
            }
        }
        Ok(SampleStats {
            events,
            dropped: self.dropped.swap(0, Ordering::Relaxed),
        })
    }
}

fn reader_loop(
    pipe: File,
    tx: flume::Sender<IoEvent>,
    dropped: Arc<AtomicU64>,
    dev: (u32, u32),
) {
    let reader = BufReader::new(pipe);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "trace_pipe read failed; sampler thread exiting");
                break;
            }
        };
        let Some(event) = parse_line(&line, dev) else {
            continue;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(_)) => {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(flume::TrySendError::Disconnected(_)) => break,
        }
    }
    trace!("sampler reader thread stopped");
}

/// Parse one `block_rq_issue` line. The tracer prints, after the common
/// prefix: `<maj>,<min> <rwbs> <bytes> (<cmd>) <sector> + <nr_sectors> [comm]`,
/// for example:
///
/// `fio-1234  [002] d..1. 8112.290212: block_rq_issue: 259,0 R 4096 () 7864320 + 8 [fio]`
fn parse_line(line: &str, dev: (u32, u32)) -> Option<IoEvent> {
    let (head, body) = line.split_once("block_rq_issue: ")?;
    let timestamp_tok = head.split_whitespace().last()?;
    let secs: f64 = timestamp_tok.strip_suffix(':')?.parse().ok()?;

    let mut fields = body.split_whitespace();
    let dev_tok = fields.next()?;
    let (major, minor) = dev_tok.split_once(',')?;
    if (major.parse::<u32>().ok()?, minor.parse::<u32>().ok()?) != dev {
        return None;
    }
    let rwbs = fields.next()?;
    let bytes: u32 = fields.next()?.parse().ok()?;
    if bytes == 0 {
        // Flush/barrier records carry no data and no meaningful offset.
        return None;
    }
    // Skip the optional command tokens up to the sector field.
    let sector = fields.find_map(|tok| tok.parse::<u64>().ok())?;

    let direction = if rwbs.contains('W') {
        Direction::Write
    } else {
        Direction::Read
    };
    Some(IoEvent {
        offset: sector.saturating_mul(SECTOR_BYTES),
        size: bytes,
        direction,
        timestamp: (secs * 1e9) as u64,
    })
}

fn tracefs_root() -> Option<PathBuf> {
    ["/sys/kernel/tracing", "/sys/kernel/debug/tracing"]
        .iter()
        .map(PathBuf::from)
        .find(|root| root.join("trace_pipe").exists())
}

/// Resolve a device basename to its `major,minor` pair via the /dev node, so
/// events for other devices on the same tracepoint can be filtered out.
fn resolve_device(device: &str) -> Result<(u32, u32), Error> {
    let path = Path::new("/dev").join(device);
    let st = nix::sys::stat::stat(&path).map_err(|err| {
        Error::ProbeAttach(format!("cannot stat {}: {err}", path.display()))
    })?;
    let rdev = st.st_rdev;
    Ok((
        nix::sys::stat::major(rdev) as u32,
        nix::sys::stat::minor(rdev) as u32,
    ))
}
