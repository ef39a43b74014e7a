//! Logging facade.
//!
//! A connection can carry an optional user-supplied sink. Every record is
//! also emitted as a `tracing` event, so binaries that install a subscriber
//! see connection activity even when no sink is set.

use crate::error::CallSite;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Component identifier stamped on records emitted by a connection.
pub const CONNECTION_COMPONENT: &str = "serial_conn.connection";

/// Numeric severity of a log record. Lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum LogLevel {
    Fatal = 1,
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
    Verbose = 6,
}

impl LogLevel {
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
            Self::Verbose => "VERBOSE",
        };
        f.write_str(name)
    }
}

/// A single log event as handed to a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub file: &'a str,
    pub line: u32,
    pub function: &'a str,
    pub component: &'a str,
    pub level: LogLevel,
    pub message: &'a str,
}

/// User-supplied log callback.
pub type LogSink = Arc<dyn Fn(&LogRecord<'_>) + Send + Sync>;

/// Best-effort logger owned by a connection.
#[derive(Clone)]
pub struct Logger {
    component: &'static str,
    sink: Option<LogSink>,
}

impl Logger {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: LogSink) {
        self.sink = Some(sink);
    }

    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Emit a record. Never fails: a panicking sink is contained here.
    pub fn log(&self, site: CallSite, level: LogLevel, message: &str) {
        self.trace(site, level, message);

        let Some(sink) = &self.sink else {
            return;
        };
        let record = LogRecord {
            file: site.file_name(),
            line: site.line,
            function: site.function,
            component: self.component,
            level,
            message,
        };
        let _ = panic::catch_unwind(AssertUnwindSafe(|| sink(&record)));
    }

    fn trace(&self, site: CallSite, level: LogLevel, message: &str) {
        let component = self.component;
        let function = site.function;
        match level {
            LogLevel::Fatal | LogLevel::Error => {
                tracing::error!(target: "serial_conn", component, function, "{message}")
            }
            LogLevel::Warning => {
                tracing::warn!(target: "serial_conn", component, function, "{message}")
            }
            LogLevel::Info => {
                tracing::info!(target: "serial_conn", component, function, "{message}")
            }
            LogLevel::Debug => {
                tracing::debug!(target: "serial_conn", component, function, "{message}")
            }
            LogLevel::Verbose => {
                tracing::trace!(target: "serial_conn", component, function, "{message}")
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("component", &self.component)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_level_codes() {
        assert_eq!(LogLevel::Fatal.code(), 1);
        assert_eq!(LogLevel::Info.code(), 4);
        assert_eq!(LogLevel::Verbose.code(), 6);
        assert!(LogLevel::Error < LogLevel::Debug);
    }

    #[test]
    fn test_no_sink_is_silent() {
        let logger = Logger::new(CONNECTION_COMPONENT);
        assert!(!logger.has_sink());
        logger.log(crate::call_site!("test"), LogLevel::Error, "nobody listens");
    }

    #[test]
    fn test_sink_receives_stamped_record() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);

        let mut logger = Logger::new(CONNECTION_COMPONENT);
        logger.set_sink(Arc::new(move |record: &LogRecord<'_>| {
            captured.lock().push((
                record.file.to_string(),
                record.function.to_string(),
                record.component.to_string(),
                record.level,
                record.message.to_string(),
            ));
        }));

        logger.log(crate::call_site!("open"), LogLevel::Info, "opened 'COM1'");

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "log.rs");
        assert_eq!(seen[0].1, "open");
        assert_eq!(seen[0].2, CONNECTION_COMPONENT);
        assert_eq!(seen[0].3, LogLevel::Info);
        assert_eq!(seen[0].4, "opened 'COM1'");
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let mut logger = Logger::new(CONNECTION_COMPONENT);
        logger.set_sink(Arc::new(|_: &LogRecord<'_>| panic!("sink failure")));
        logger.log(crate::call_site!("close"), LogLevel::Error, "boom");

        logger.clear_sink();
        assert!(!logger.has_sink());
    }
}
