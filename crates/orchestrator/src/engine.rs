#![forbid(unsafe_code)]

use crate::actuation::{ActuationOutcome, Actuator, ReadaheadPolicy};
use crate::domain::{AccessPattern, WindowSummary};
use crate::error::Error;
use crate::features::{FeatureVector, encode};
use crate::inference::Classifier;
use crate::sampler::{EventSource, SampleStats};
use crate::window::WindowAggregator;
use config::Config;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct Services {
    pub sampler: Box<dyn EventSource + Send>,
    pub classifier: Box<dyn Classifier + Send + Sync>,
    pub actuator: Box<dyn Actuator + Send>,
}

pub enum ControlEvent {
    Reload(Box<Config>),
    DumpStatus,
}

/// Everything one cycle produced, for logging and tests. Classification and
/// actuation failures are recorded here rather than propagated.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: u64,
    pub sample: SampleStats,
    pub summary: WindowSummary,
    pub features: FeatureVector,
    pub prediction: Option<AccessPattern>,
    pub actuation: Option<ActuationOutcome>,
    pub inference_error: Option<String>,
    pub actuation_error: Option<String>,
}

/// The control loop driver: drain, aggregate, encode, classify, actuate,
/// once per window, strictly sequentially.
pub struct TunerEngine {
    config: Config,
    services: Services,
    aggregator: WindowAggregator,
    cycle_id: u64,
}

impl TunerEngine {
    pub fn new(config: Config, services: Services) -> Self {
        let aggregator = WindowAggregator::new(config.window.jump_threshold_bytes);
        Self {
            config,
            services,
            aggregator,
            cycle_id: 0,
        }
    }

    /// Execute a single drain/encode/classify/actuate cycle. Only a sampler
    /// failure propagates; classify and actuate failures degrade the cycle
    /// and are carried in the report.
    pub async fn tick(&mut self) -> Result<CycleReport, Error> {
        self.cycle_id = self.cycle_id.saturating_add(1);

        let sample = self
            .services
            .sampler
            .drain(self.config.window.cycle, &mut self.aggregator)
            .await?;
        let summary = self.aggregator.finish();
        let features = encode(&summary, summary.elapsed);

        let (prediction, inference_error) =
            match self.services.classifier.classify(&features).await {
                Ok(pattern) => (Some(pattern), None),
                Err(err) => {
                    warn!(cycle = self.cycle_id, %err, "classification failed");
                    (None, Some(err.to_string()))
                }
            };

        // No classification, no actuation: the tunable keeps its last value.
        let (actuation, actuation_error) = match prediction {
            Some(pattern) => match self.services.actuator.apply(pattern) {
                Ok(outcome) => (Some(outcome), None),
                Err(err) => {
                    warn!(cycle = self.cycle_id, %err, "actuation failed");
                    (None, Some(err.to_string()))
                }
            },
            None => (None, None),
        };

        let report = CycleReport {
            cycle_id: self.cycle_id,
            sample,
            summary,
            features,
            prediction,
            actuation,
            inference_error,
            actuation_error,
        };
        self.log_cycle(&report);
        Ok(report)
    }

    /// Run cycles until the token is cancelled. Cancellation is checked only
    /// at the cycle boundary, so an in-flight cycle always completes its
    /// actuation step before the loop stops.
    pub async fn run_until(
        &mut self,
        cancel: CancellationToken,
        mut control_rx: mpsc::UnboundedReceiver<ControlEvent>,
    ) -> Result<(), Error> {
        while !cancel.is_cancelled() {
            while let Ok(event) = control_rx.try_recv() {
                self.handle_control(event);
            }
            self.tick().await?;
        }
        info!("shutdown requested");
        Ok(())
    }

    fn handle_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Reload(config) => {
                self.apply_reload(*config);
                info!("config reloaded");
            }
            ControlEvent::DumpStatus => self.dump_status(),
        }
    }

    /// Adopt a reloaded config. The device and socket identify resources
    /// acquired at startup and cannot change without a restart; requests to
    /// change them are ignored with a warning.
    fn apply_reload(&mut self, mut config: Config) {
        if config.sampler.device != self.config.sampler.device {
            warn!(
                current = %self.config.sampler.device,
                requested = %config.sampler.device,
                "ignoring device change during reload"
            );
            config.sampler.device = self.config.sampler.device.clone();
        }
        if config.inference.socket != self.config.inference.socket {
            warn!(
                current = ?self.config.inference.socket,
                requested = ?config.inference.socket,
                "ignoring inference socket change during reload"
            );
            config.inference.socket = self.config.inference.socket.clone();
        }

        self.aggregator
            .set_jump_threshold(config.window.jump_threshold_bytes);
        self.services.classifier.set_timeout(config.inference.timeout);
        self.services
            .actuator
            .set_policy(ReadaheadPolicy::from(&config.readahead));
        self.config = config;
    }

    fn dump_status(&self) {
        info!(?self.config, "current config");
        info!(
            cycle = self.cycle_id,
            last_readahead_kb = self.services.actuator.last_written_kb(),
            "actuation state"
        );
    }

    /// Exactly one summary line per cycle, errors or not; external monitors
    /// key off this instead of parsing kernel internals.
    fn log_cycle(&self, report: &CycleReport) {
        info!(
            cycle = report.cycle_id,
            events = report.sample.events,
            dropped = report.sample.dropped,
            reads = report.summary.reads,
            writes = report.summary.writes,
            avg_distance = report.features.avg_distance_bytes,
            jump_ratio = report.features.jump_ratio,
            avg_io_size = report.features.avg_io_size_bytes,
            seq_ratio = report.features.seq_ratio,
            iops = report.features.iops_mean,
            prediction = report.prediction.map(AccessPattern::as_str),
            actuation = ?report.actuation,
            inference_error = report.inference_error.as_deref(),
            actuation_error = report.actuation_error.as_deref(),
            "cycle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, IoEvent};
    use crate::error::{ActuationError, InferenceError};
    use crate::sampler::ReplaySource;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn read(offset: u64) -> IoEvent {
        IoEvent {
            offset,
            size: 4096,
            direction: Direction::Read,
            timestamp: 0,
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.window.cycle = Duration::from_millis(10);
        config.inference.timeout = Duration::from_millis(5);
        config
    }

    #[derive(Debug, Clone)]
    struct StaticClassifier(AccessPattern);

    #[async_trait]
    impl Classifier for StaticClassifier {
        async fn classify(
            &self,
            _features: &FeatureVector,
        ) -> Result<AccessPattern, InferenceError> {
            Ok(self.0)
        }
    }

    #[derive(Debug, Clone)]
    struct RefusingClassifier;

    #[async_trait]
    impl Classifier for RefusingClassifier {
        async fn classify(
            &self,
            _features: &FeatureVector,
        ) -> Result<AccessPattern, InferenceError> {
            Err(InferenceError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )))
        }
    }

    #[derive(Debug, Clone, Default)]
    struct SpyActuator {
        applied: Arc<Mutex<Vec<AccessPattern>>>,
        writes: Arc<Mutex<u32>>,
        last: Option<u32>,
        fail: bool,
    }

    impl Actuator for SpyActuator {
        fn apply(&mut self, pattern: AccessPattern) -> Result<ActuationOutcome, ActuationError> {
            self.applied.lock().unwrap().push(pattern);
            if self.fail {
                return Err(ActuationError::PermissionDenied {
                    path: "/sys/block/x/queue/read_ahead_kb".into(),
                });
            }
            let target = match pattern {
                AccessPattern::Sequential => 256,
                AccessPattern::Random => 16,
                AccessPattern::Mixed => 64,
            };
            if self.last == Some(target) {
                return Ok(ActuationOutcome::Unchanged(target));
            }
            *self.writes.lock().unwrap() += 1;
            self.last = Some(target);
            Ok(ActuationOutcome::Written(target))
        }

        fn set_policy(&mut self, _policy: ReadaheadPolicy) {}

        fn last_written_kb(&self) -> Option<u32> {
            self.last
        }
    }

    #[tokio::test]
    async fn tick_flows_events_to_actuation() {
        let sampler = ReplaySource::new([vec![read(0), read(4096), read(8192)]]);
        let actuator = SpyActuator::default();
        let applied = Arc::clone(&actuator.applied);

        let mut engine = TunerEngine::new(
            test_config(),
            Services {
                sampler: Box::new(sampler),
                classifier: Box::new(StaticClassifier(AccessPattern::Sequential)),
                actuator: Box::new(actuator),
            },
        );

        let report = engine.tick().await.unwrap();
        assert_eq!(report.cycle_id, 1);
        assert_eq!(report.sample.events, 3);
        assert_eq!(report.summary.events, 3);
        assert_eq!(report.prediction, Some(AccessPattern::Sequential));
        assert_eq!(report.actuation, Some(ActuationOutcome::Written(256)));
        assert_eq!(applied.lock().unwrap().as_slice(), &[AccessPattern::Sequential]);
    }

    #[tokio::test]
    async fn classification_failure_skips_actuation() {
        let sampler = ReplaySource::new([vec![read(0), read(4096)]]);
        let actuator = SpyActuator::default();
        let applied = Arc::clone(&actuator.applied);

        let mut engine = TunerEngine::new(
            test_config(),
            Services {
                sampler: Box::new(sampler),
                classifier: Box::new(RefusingClassifier),
                actuator: Box::new(actuator),
            },
        );

        let report = engine.tick().await.unwrap();
        assert_eq!(report.prediction, None);
        assert_eq!(report.actuation, None);
        assert!(report.inference_error.is_some());
        // The actuator must not be touched; its state survives unchanged.
        assert!(applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn actuation_failure_degrades_cycle_not_loop() {
        let sampler = ReplaySource::new([vec![read(0)], vec![read(4096)]]);
        let actuator = SpyActuator {
            fail: true,
            ..SpyActuator::default()
        };

        let mut engine = TunerEngine::new(
            test_config(),
            Services {
                sampler: Box::new(sampler),
                classifier: Box::new(StaticClassifier(AccessPattern::Mixed)),
                actuator: Box::new(actuator),
            },
        );

        let first = engine.tick().await.unwrap();
        assert!(first.actuation_error.is_some());
        assert_eq!(first.actuation, None);

        // The loop itself keeps going.
        let second = engine.tick().await.unwrap();
        assert_eq!(second.cycle_id, 2);
        assert!(second.actuation_error.is_some());
    }

    #[tokio::test]
    async fn stable_pattern_writes_kernel_once() {
        let sampler = ReplaySource::new([vec![read(0)], vec![read(4096)]]);
        let actuator = SpyActuator::default();
        let writes = Arc::clone(&actuator.writes);

        let mut engine = TunerEngine::new(
            test_config(),
            Services {
                sampler: Box::new(sampler),
                classifier: Box::new(StaticClassifier(AccessPattern::Sequential)),
                actuator: Box::new(actuator),
            },
        );

        let first = engine.tick().await.unwrap();
        let second = engine.tick().await.unwrap();
        assert_eq!(first.actuation, Some(ActuationOutcome::Written(256)));
        assert_eq!(second.actuation, Some(ActuationOutcome::Unchanged(256)));
        assert_eq!(*writes.lock().unwrap(), 1);
    }

    /// Event source that cancels the loop while its own drain is running, to
    /// prove an in-flight cycle still reaches actuation.
    struct CancellingSource {
        inner: ReplaySource,
        cancel: CancellationToken,
        drains: u64,
        cancel_on: u64,
    }

    #[async_trait]
    impl EventSource for CancellingSource {
        async fn drain(
            &mut self,
            window: Duration,
            sink: &mut (dyn crate::sampler::EventSink + Send),
        ) -> Result<SampleStats, Error> {
            self.drains += 1;
            if self.drains >= self.cancel_on {
                self.cancel.cancel();
            }
            self.inner.drain(window, sink).await
        }
    }

    #[tokio::test]
    async fn cancellation_completes_inflight_cycle() {
        let cancel = CancellationToken::new();
        let sampler = CancellingSource {
            inner: ReplaySource::new([vec![read(0)], vec![read(4096)], vec![read(8192)]]),
            cancel: cancel.clone(),
            drains: 0,
            cancel_on: 2,
        };
        let actuator = SpyActuator::default();
        let applied = Arc::clone(&actuator.applied);

        let mut engine = TunerEngine::new(
            test_config(),
            Services {
                sampler: Box::new(sampler),
                classifier: Box::new(StaticClassifier(AccessPattern::Random)),
                actuator: Box::new(actuator),
            },
        );

        let (_tx, rx) = mpsc::unbounded_channel();
        engine.run_until(cancel, rx).await.unwrap();

        // Two full cycles ran: the one that observed cancellation still
        // classified and actuated before the loop stopped.
        assert_eq!(applied.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn precancelled_loop_runs_no_cycle() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let actuator = SpyActuator::default();
        let applied = Arc::clone(&actuator.applied);

        let mut engine = TunerEngine::new(
            test_config(),
            Services {
                sampler: Box::new(ReplaySource::default()),
                classifier: Box::new(StaticClassifier(AccessPattern::Random)),
                actuator: Box::new(actuator),
            },
        );

        let (_tx, rx) = mpsc::unbounded_channel();
        engine.run_until(cancel, rx).await.unwrap();
        assert!(applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reload_keeps_device_and_socket() {
        let actuator = SpyActuator::default();
        let mut engine = TunerEngine::new(
            test_config(),
            Services {
                sampler: Box::new(ReplaySource::default()),
                classifier: Box::new(StaticClassifier(AccessPattern::Random)),
                actuator: Box::new(actuator),
            },
        );

        let mut reloaded = test_config();
        reloaded.sampler.device = "sdz".into();
        reloaded.inference.socket = "/tmp/other.sock".into();
        reloaded.window.jump_threshold_bytes = 42;
        engine.apply_reload(reloaded);

        assert_eq!(engine.config.sampler.device, "nvme0n1");
        assert_eq!(
            engine.config.inference.socket,
            std::path::PathBuf::from("/tmp/ml_predictor.sock")
        );
        assert_eq!(engine.config.window.jump_threshold_bytes, 42);
    }
}
