//! Error types carried by intents and returned by the dispatcher.
//!
//! [`IntentError`] is the error state of one in-flight request. It is what a
//! client eventually sees, so it carries a stable dotted `code`, a human
//! message and an HTTP-like `status`. [`DispatchError`] covers failures of the
//! dispatcher itself (nothing to do with a particular request's outcome).

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Boxed error cause attached to an [`IntentError`].
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Default status for errors created without an explicit one.
pub const DEFAULT_ERROR_STATUS: u16 = 400;

/// The error state of an intent.
///
/// # Example
///
/// ```rust
/// use vista_dispatch::IntentError;
///
/// let err = IntentError::new("USER.NOT_FOUND", "No such user").with_status(404);
/// assert_eq!(err.status, 404);
/// assert_eq!(err.to_string(), "USER.NOT_FOUND: No such user");
/// ```
#[derive(Clone, Error)]
#[error("{code}: {message}")]
pub struct IntentError {
    /// Dotted error code, e.g. `"RENDER.ERROR"`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// HTTP-like status code.
    pub status: u16,
    /// The underlying cause, if any.
    #[source]
    pub source: Option<ErrorSource>,
}

impl IntentError {
    /// Creates an error with the default status (400).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: DEFAULT_ERROR_STATUS,
            source: None,
        }
    }

    /// Sets the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Attaches an already shared cause.
    pub fn with_shared_source(mut self, source: ErrorSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Converts a handler error into an intent error.
    ///
    /// An `IntentError` wrapped in the `anyhow::Error` is returned as is;
    /// anything else becomes `SERVER.ERROR` with status 500 and the original
    /// error kept as the cause.
    pub fn from_handler(err: anyhow::Error) -> Self {
        match err.downcast::<IntentError>() {
            Ok(intent_err) => intent_err,
            Err(other) => {
                let message = other.to_string();
                let source: Box<dyn std::error::Error + Send + Sync + 'static> = other.into();
                IntentError::new("SERVER.ERROR", message)
                    .with_status(500)
                    .with_shared_source(Arc::from(source))
            }
        }
    }
}

impl fmt::Debug for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentError")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("status", &self.status)
            .field("source", &self.source.as_ref().map(|s| s.to_string()))
            .finish()
    }
}

impl PartialEq for IntentError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message && self.status == other.status
    }
}

// The cause stays out of response bodies.
impl Serialize for IntentError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("IntentError", 3)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("status", &self.status)?;
        state.end()
    }
}

/// Errors returned by the [`Dispatcher`](crate::Dispatcher) itself.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No action is registered under the requested name.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The intent was already finalized.
    #[error("intent for action {0} was already sent")]
    AlreadySent(String),
}
