//! Begin/complete/failed logging around a unit of work
//!
//! - Logs the begin event on creation
//! - Logs the complete event from `complete()`, with `elapsed_ms`
//! - Logs the failed event from `fail()`, or on drop if neither was called

use std::time::{Duration, Instant};

use super::events::Event;
use super::logger::{Logger, Severity};

/// Scope that logs a begin/complete/failed event triple
///
/// ```ignore
/// let scope = ObservationScope::new(
///     [Event::BatchBegin, Event::BatchComplete, Event::BatchFailed],
///     vec![("batch_size", "3".to_string())],
/// );
/// // ... run the batch ...
/// scope.complete();
/// ```
pub struct ObservationScope {
    complete: Event,
    failed: Event,
    fields: Vec<(&'static str, String)>,
    timer: Timer,
    finished: bool,
}

impl ObservationScope {
    /// Opens a scope, logging `events[0]`; `events[1]` and `events[2]` are
    /// the completion and failure events
    pub fn new(events: [Event; 3], fields: Vec<(&'static str, String)>) -> Self {
        let [begin, complete, failed] = events;
        let scope = Self {
            complete,
            failed,
            fields,
            timer: Timer::new(),
            finished: false,
        };
        scope.emit(begin, begin.severity(), &[]);
        scope
    }

    /// Logs the completion event
    pub fn complete(mut self) {
        self.finished = true;
        let elapsed = self.timer.elapsed_ms();
        self.emit(self.complete, self.complete.severity(), &[("elapsed_ms", &elapsed)]);
    }

    /// Logs the failure event with a reason
    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        self.emit(self.failed, self.failed.severity(), &[("reason", reason)]);
    }

    fn emit(&self, event: Event, severity: Severity, extra: &[(&str, &str)]) {
        let mut fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        fields.extend(extra.iter().copied());
        Logger::log(severity, event.as_str(), &fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(
                self.failed,
                Severity::Warn,
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Elapsed-time timer for metadata and log fields
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed whole milliseconds
    pub fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Elapsed milliseconds as a log field
    pub fn elapsed_ms(&self) -> String {
        self.elapsed_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
