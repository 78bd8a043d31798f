//! Progress accounting.
//!
//! Progress is the share of input bytes processed, as a percentage. Workers
//! report into one [`ProgressTracker`]; events are emitted while its lock is
//! held, so observers see a non-decreasing sequence that starts at 0 and
//! reaches 100 exactly once, just before the request turns `Complete`.

use crate::state::RequestState;
use crate::store::CompressionResult;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Highest percentage reported before the request completes.
pub const MAX_RUNNING_PERCENT: f64 = 99.0;

/// A progress update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Percentage complete, 0-100.
    pub percent: f64,
    /// Input bytes processed so far.
    pub bytes_done: u64,
    /// Total input bytes.
    pub bytes_total: u64,
}

/// Receives lifecycle callbacks for one request.
///
/// Called from worker threads; every method defaults to doing nothing.
pub trait RequestObserver: Send + Sync {
    /// Progress moved forward.
    fn on_progress(&self, _event: ProgressEvent) {}

    /// The request changed state.
    fn on_state(&self, _state: RequestState) {}

    /// The archive is published. Called once, before the `Complete` state.
    fn on_complete(&self, _result: &CompressionResult) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl RequestObserver for NoProgress {}

impl<F> RequestObserver for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent) {
        self(event);
    }
}

#[derive(Debug)]
struct TrackerState {
    done: u64,
    last_percent: Option<f64>,
    completed: bool,
}

/// Shared byte accumulator that turns work done into [`ProgressEvent`]s.
pub struct ProgressTracker<'a> {
    observer: &'a dyn RequestObserver,
    total: u64,
    step: f64,
    state: Mutex<TrackerState>,
}

impl<'a> ProgressTracker<'a> {
    /// Track `total` input bytes, reporting moves of at least `step` percent.
    pub fn new(observer: &'a dyn RequestObserver, total: u64, step: f64) -> Self {
        Self {
            observer,
            total,
            step,
            state: Mutex::new(TrackerState {
                done: 0,
                last_percent: None,
                completed: false,
            }),
        }
    }

    /// Emit the initial 0% event.
    pub fn start(&self) {
        let mut state = self.lock();
        self.emit(&mut state, 0.0, true);
    }

    /// Add `bytes` to the processed count.
    pub fn advance(&self, bytes: u64) {
        let mut state = self.lock();
        let done = state.done.saturating_add(bytes).min(self.total);
        self.update(&mut state, done);
    }

    /// Set the processed count; values below the current count are ignored.
    pub fn set_done(&self, done: u64) {
        let mut state = self.lock();
        let done = done.min(self.total).max(state.done);
        self.update(&mut state, done);
    }

    /// Emit the single 100% event. Later calls do nothing.
    pub fn complete(&self) {
        let mut state = self.lock();
        if state.completed {
            return;
        }
        state.completed = true;
        state.done = self.total;
        self.emit(&mut state, 100.0, true);
    }

    /// Last percentage emitted.
    pub fn percent(&self) -> f64 {
        self.lock().last_percent.unwrap_or(0.0)
    }

    fn update(&self, state: &mut TrackerState, done: u64) {
        if state.completed {
            return;
        }
        state.done = done;
        let percent = if self.total == 0 {
            0.0
        } else {
            (done as f64 * 100.0 / self.total as f64).min(MAX_RUNNING_PERCENT)
        };
        self.emit(state, percent, false);
    }

    fn emit(&self, state: &mut TrackerState, percent: f64, force: bool) {
        if let Some(last) = state.last_percent {
            if percent < last || (!force && percent - last < self.step) || percent == last {
                return;
            }
        }
        state.last_percent = Some(percent);
        self.observer.on_progress(ProgressEvent {
            percent,
            bytes_done: state.done,
            bytes_total: self.total,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collect(run: impl FnOnce(&ProgressTracker<'_>)) -> Vec<f64> {
        let seen = Mutex::new(Vec::new());
        let observer = |event: ProgressEvent| seen.lock().unwrap().push(event.percent);
        let tracker = ProgressTracker::new(&observer, 200, 1.0);
        run(&tracker);
        drop(tracker);
        seen.into_inner().unwrap()
    }

    #[test]
    fn test_sequence() {
        let events = collect(|t| {
            t.start();
            t.advance(50);
            t.advance(50);
            t.advance(100);
            t.complete();
        });
        assert_eq!(events, vec![0.0, 25.0, 50.0, 99.0, 100.0]);
    }

    #[test]
    fn test_single_hundred() {
        let events = collect(|t| {
            t.start();
            t.set_done(200);
            t.complete();
            t.complete();
            t.advance(10);
        });
        assert_eq!(events.iter().filter(|&&p| p == 100.0).count(), 1);
        assert_eq!(events.last(), Some(&100.0));
    }

    #[test]
    fn test_small_steps_coalesce() {
        let events = collect(|t| {
            t.start();
            for _ in 0..4 {
                t.advance(1);
            }
        });
        // 4 bytes of 200 is 2%, reported as 1% then 2%
        assert_eq!(events, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_set_done_never_goes_back() {
        let events = collect(|t| {
            t.start();
            t.set_done(100);
            t.set_done(20);
        });
        assert_eq!(events, vec![0.0, 50.0]);
    }

    #[test]
    fn test_empty_input() {
        let seen = Mutex::new(Vec::new());
        let observer = |event: ProgressEvent| seen.lock().unwrap().push(event.percent);
        let tracker = ProgressTracker::new(&observer, 0, 1.0);
        tracker.start();
        tracker.advance(0);
        tracker.complete();
        drop(tracker);
        assert_eq!(seen.into_inner().unwrap(), vec![0.0, 100.0]);
    }
}
