#![forbid(unsafe_code)]

pub mod actuation;
pub mod domain;
pub mod engine;
pub mod error;
pub mod features;
pub mod inference;
pub mod sampler;
pub mod window;

pub use actuation::{ActuationOutcome, Actuator, ReadaheadPolicy, SysfsActuator};
pub use domain::{AccessPattern, Direction, IoEvent, WindowSummary};
pub use engine::{ControlEvent, CycleReport, Services, TunerEngine};
pub use error::{ActuationError, Error, InferenceError};
pub use features::{FeatureVector, encode};
pub use inference::{Classifier, UnixSocketClassifier};
pub use sampler::{EventSink, EventSource, ReplaySource, SampleStats, TracefsSampler};
pub use window::WindowAggregator;
