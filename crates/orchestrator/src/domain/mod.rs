#![forbid(unsafe_code)]

mod event;
mod pattern;
mod summary;

pub use event::{Direction, IoEvent};
pub use pattern::AccessPattern;
pub use summary::WindowSummary;
