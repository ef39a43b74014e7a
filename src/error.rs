//! Connection-level error type.
//!
//! Every public operation of [`SerialConnection`](crate::SerialConnection)
//! reports failure as a [`SerialError`]. Errors form a chain: the outermost
//! link names the call site that failed, inner links carry the reason, and
//! the innermost link is usually the [`PortError`] raised by the transport.

use crate::port::PortError;
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// A specialized `Result` type for connection operations.
pub type SerialResult<T> = Result<T, SerialError>;

/// Category of a [`SerialError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration field was outside its legal set. Carries the field name.
    InvalidArgument(String),
    /// The operation is not allowed in the current connection state.
    IllegalState(String),
    /// The transport failed.
    IoFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(field) => write!(f, "invalid argument '{field}'"),
            Self::IllegalState(reason) => write!(f, "illegal state: {reason}"),
            Self::IoFailure => write!(f, "I/O failure"),
        }
    }
}

/// Source location of a failing or logging operation.
///
/// Built with the [`call_site!`](crate::call_site) macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub function: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(function: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            function,
            file,
            line,
        }
    }

    /// File name without its directory components.
    pub fn file_name(&self) -> &'static str {
        Path::new(self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(self.file)
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}:{})", self.function, self.file_name(), self.line)
    }
}

/// Capture the current file and line together with a function name.
///
/// ```
/// let site = serial_conn::call_site!("open");
/// assert_eq!(site.function, "open");
/// assert!(site.to_string().starts_with("open("));
/// ```
#[macro_export]
macro_rules! call_site {
    ($function:expr) => {
        $crate::error::CallSite::new($function, file!(), line!())
    };
}

/// Structured, chainable connection error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SerialError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl SerialError {
    /// Create an `InvalidArgument` error naming the offending field.
    pub fn invalid_argument(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: field.clone(),
            kind: ErrorKind::InvalidArgument(field),
            source: None,
        }
    }

    /// Create an `IllegalState` error with the given reason.
    pub fn illegal_state(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            message: reason.clone(),
            kind: ErrorKind::IllegalState(reason),
            source: None,
        }
    }

    /// Wrap a transport failure.
    pub fn io(cause: PortError) -> Self {
        Self {
            kind: ErrorKind::IoFailure,
            message: "transport error".to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// Nest this error under a new link naming `site`.
    ///
    /// The new link keeps the kind of the wrapped error so callers can match
    /// on the outermost error without walking the chain.
    pub fn at(self, site: CallSite) -> Self {
        Self {
            kind: self.kind.clone(),
            message: site.to_string(),
            source: Some(Box::new(self)),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidArgument(_))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self.kind, ErrorKind::IllegalState(_))
    }

    pub fn is_io_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::IoFailure)
    }

    /// Iterate over this error and every nested cause, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let mut next: Option<&(dyn StdError + 'static)> = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.source();
            Some(current)
        })
    }

    /// The innermost cause in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        self.chain().last().unwrap_or(self)
    }

    /// The transport error at the bottom of the chain, if any.
    pub fn port_error(&self) -> Option<&PortError> {
        self.chain().find_map(|e| e.downcast_ref::<PortError>())
    }

    /// Render the whole chain on one line, e.g.
    /// `open(mod.rs:80): open_config(mod.rs:120): transport error: Serial port not found: COM9`.
    pub fn report(&self) -> String {
        self.chain()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ")
    }
}
