//! Query lifecycle events
//!
//! Events are explicit and typed; each has a fixed severity.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded from disk
    ConfigLoaded,

    // Single query
    /// Query accepted by the router
    QueryReceived,
    /// Adapter classified and execution path chosen
    QueryRouted,
    /// Fallback drain finished
    AdapterDrainComplete,
    /// Query produced a result
    QueryExecuted,
    /// Query failed
    QueryFailed,

    // Batch
    /// Batch execution begins
    BatchBegin,
    /// Every query in the batch succeeded
    BatchComplete,
    /// At least one query in the batch failed
    BatchFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryReceived => "QUERY_RECEIVED",
            Event::QueryRouted => "QUERY_ROUTED",
            Event::AdapterDrainComplete => "ADAPTER_DRAIN_COMPLETE",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::BatchBegin => "BATCH_BEGIN",
            Event::BatchComplete => "BATCH_COMPLETE",
            Event::BatchFailed => "BATCH_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryReceived | Event::QueryRouted | Event::AdapterDrainComplete => {
                Severity::Trace
            }
            Event::ConfigLoaded
            | Event::QueryExecuted
            | Event::BatchBegin
            | Event::BatchComplete => Severity::Info,
            Event::QueryFailed | Event::BatchFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::QueryReceived,
            Event::QueryRouted,
            Event::AdapterDrainComplete,
            Event::QueryExecuted,
            Event::QueryFailed,
            Event::BatchBegin,
            Event::BatchComplete,
            Event::BatchFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failure_events_are_errors() {
        assert_eq!(Event::QueryFailed.severity(), Severity::Error);
        assert_eq!(Event::BatchFailed.severity(), Severity::Error);
        assert_eq!(Event::QueryExecuted.severity(), Severity::Info);
        assert_eq!(Event::QueryRouted.severity(), Severity::Trace);
    }
}
