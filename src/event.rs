//! Diagnostic notifications emitted by the pool

use std::fmt;

/// Severity of a pool event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Debug,
    Warn,
    Error,
}

/// Receives leveled diagnostic events from a pool.
///
/// Events are informational only; the pool never changes course based on
/// them. Implementations must not panic.
///
/// # Examples
///
/// ```
/// use simple_objectpool::{EventSink, Severity};
/// use std::fmt;
///
/// struct Stderr;
///
/// impl EventSink for Stderr {
///     fn new_event(&self, severity: Severity, message: fmt::Arguments<'_>) {
///         eprintln!("[{severity:?}] {message}");
///     }
/// }
/// ```
pub trait EventSink: Send + Sync {
    fn new_event(&self, severity: Severity, message: fmt::Arguments<'_>);
}

/// Discards every event. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn new_event(&self, _severity: Severity, _message: fmt::Arguments<'_>) {}
}

/// Forwards events to `tracing` under the `simple_objectpool` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn new_event(&self, severity: Severity, message: fmt::Arguments<'_>) {
        match severity {
            Severity::Info => tracing::info!(target: "simple_objectpool", "{}", message),
            Severity::Debug => tracing::debug!(target: "simple_objectpool", "{}", message),
            Severity::Warn => tracing::warn!(target: "simple_objectpool", "{}", message),
            Severity::Error => tracing::error!(target: "simple_objectpool", "{}", message),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Captures events so tests can assert on them.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        events: Mutex<Vec<(Severity, String)>>,
    }

    impl RecordingSink {
        pub(crate) fn events(&self) -> Vec<(Severity, String)> {
            self.events.lock().clone()
        }

        pub(crate) fn count(&self, severity: Severity) -> usize {
            self.events.lock().iter().filter(|(s, _)| *s == severity).count()
        }
    }

    impl EventSink for RecordingSink {
        fn new_event(&self, severity: Severity, message: fmt::Arguments<'_>) {
            self.events.lock().push((severity, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn test_recording_sink_formats_arguments() {
        let sink = RecordingSink::default();
        sink.new_event(Severity::Warn, format_args!("object {} gone", 3));
        assert_eq!(sink.events(), vec![(Severity::Warn, "object 3 gone".to_string())]);
        assert_eq!(sink.count(Severity::Warn), 1);
        assert_eq!(sink.count(Severity::Error), 0);
    }

    #[test]
    fn test_builtin_sinks_accept_every_severity() {
        for severity in [Severity::Info, Severity::Debug, Severity::Warn, Severity::Error] {
            NoopEventSink.new_event(severity, format_args!("ignored"));
            TracingEventSink.new_event(severity, format_args!("forwarded {}", 1));
        }
    }
}
