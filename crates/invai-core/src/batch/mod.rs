//! Batch orchestration: intake filter, windowed concurrency, failure
//! isolation and progress reporting.

mod processor;
pub mod progress;

pub use processor::{BatchOutcome, BatchProcessor, BatchSummary, FileFailure, FileSuccess};
pub use progress::{InFlightTracker, NoProgress, ProgressEvent, ProgressObserver};
