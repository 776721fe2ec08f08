pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::TelemetryEvent;
pub use metrics::{compute_snapshot, ObservationStats, QueryStats, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
