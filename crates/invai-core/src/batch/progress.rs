//! Progress events emitted while a batch runs.

use std::collections::BTreeSet;
use std::sync::Mutex;

/// A step in the life of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Intake passed; `total` files will be processed.
    BatchStarted { total: usize },
    /// A window is about to run; `files` is the processing set.
    WindowStarted { index: usize, files: Vec<String> },
    /// A file resolved, with records or with a failure.
    FileFinished { file: String, succeeded: bool },
    /// Every window completed.
    BatchFinished { succeeded: usize, failed: usize },
}

/// Receives progress events. Called from the task driving the batch.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Tracks the processing set: files announced by a window and not yet
/// finished.
#[derive(Debug, Default)]
pub struct InFlightTracker {
    state: Mutex<InFlight>,
}

#[derive(Debug, Default)]
struct InFlight {
    files: BTreeSet<String>,
    peak: usize,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files currently being processed, sorted by name.
    pub fn current(&self) -> Vec<String> {
        self.lock().files.iter().cloned().collect()
    }

    /// Largest processing set seen so far.
    pub fn peak(&self) -> usize {
        self.lock().peak
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InFlight> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressObserver for InFlightTracker {
    fn on_event(&self, event: &ProgressEvent) {
        let mut state = self.lock();
        match event {
            ProgressEvent::WindowStarted { files, .. } => {
                state.files.extend(files.iter().cloned());
                state.peak = state.peak.max(state.files.len());
            }
            ProgressEvent::FileFinished { file, .. } => {
                state.files.remove(file);
            }
            ProgressEvent::BatchStarted { .. } | ProgressEvent::BatchFinished { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tracker_follows_windows() {
        let tracker = InFlightTracker::new();
        tracker.on_event(&ProgressEvent::WindowStarted {
            index: 0,
            files: vec!["b.pdf".into(), "a.pdf".into()],
        });
        assert_eq!(tracker.current(), vec!["a.pdf", "b.pdf"]);

        tracker.on_event(&ProgressEvent::FileFinished {
            file: "a.pdf".into(),
            succeeded: true,
        });
        assert_eq!(tracker.current(), vec!["b.pdf"]);
        assert_eq!(tracker.peak(), 2);
    }

    #[test]
    fn closures_are_observers() {
        let seen = Mutex::new(Vec::new());
        let observer = |event: &ProgressEvent| seen.lock().unwrap().push(event.clone());
        observer.on_event(&ProgressEvent::BatchStarted { total: 4 });
        assert_eq!(
            seen.into_inner().unwrap(),
            vec![ProgressEvent::BatchStarted { total: 4 }]
        );
    }
}
