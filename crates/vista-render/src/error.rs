//! Error types for rendering.
//!
//! - [`EngineError`]: what a [`TemplateEngine`](crate::TemplateEngine) reports.
//!   Abstracts over the underlying engine so its error type does not leak.
//! - [`RenderError`]: what the [`Renderer`](crate::Renderer) returns. Every
//!   failure is one of two conditions, `RENDER.ERROR` or `RENDER.NOT_READY`,
//!   and converts into an [`IntentError`] for the request.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use vista_dispatch::{ErrorSource, IntentError};

/// Boxed error returned by callback engines.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error code of a failed render attempt.
pub const RENDER_ERROR: &str = "RENDER.ERROR";

/// Error code used when no engine can handle a template.
pub const RENDER_NOT_READY: &str = "RENDER.NOT_READY";

/// Error reported by a template engine.
#[derive(Debug)]
pub enum EngineError {
    /// The engine could not find the template.
    TemplateNotFound(String),

    /// Template syntax error, undefined value, unknown filter and the like.
    TemplateError(String),

    /// Other engine-side failure.
    OperationError(String),

    /// A callback engine returned an error.
    Callback(BoxError),

    /// The engine panicked while rendering.
    Panicked(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::TemplateNotFound(name) => write!(f, "template not found: {}", name),
            EngineError::TemplateError(msg) => write!(f, "template error: {}", msg),
            EngineError::OperationError(msg) => write!(f, "{}", msg),
            EngineError::Callback(err) => write!(f, "render callback failed: {}", err),
            EngineError::Panicked(msg) => write!(f, "render engine panicked: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Callback(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<minijinja::Error> for EngineError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => EngineError::TemplateNotFound(err.to_string()),
            ErrorKind::SyntaxError
            | ErrorKind::BadEscape
            | ErrorKind::UndefinedError
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction
            | ErrorKind::UnknownFilter
            | ErrorKind::UnknownMethod => EngineError::TemplateError(err.to_string()),
            _ => EngineError::OperationError(err.to_string()),
        }
    }
}

/// Error returned by [`Renderer::render`](crate::Renderer::render).
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// No engine is configured for a template that needs one.
    #[error("Render engine is not ready.")]
    NotReady,

    /// Reading or rendering the template failed.
    #[error("Failed to render page {template}: {source}")]
    Render {
        /// The template name as requested.
        template: String,
        /// The original cause (I/O error or engine error).
        #[source]
        source: ErrorSource,
    },
}

impl RenderError {
    /// Wraps a cause into a `RENDER.ERROR`.
    pub fn render<E>(template: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RenderError::Render {
            template: template.into(),
            source: Arc::new(source),
        }
    }

    /// The dotted error code of this condition.
    pub fn code(&self) -> &'static str {
        match self {
            RenderError::NotReady => RENDER_NOT_READY,
            RenderError::Render { .. } => RENDER_ERROR,
        }
    }

    /// The status the request ends with.
    pub fn status(&self) -> u16 {
        500
    }
}

impl From<RenderError> for IntentError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::NotReady => IntentError::new(RENDER_NOT_READY, "Render engine is not ready.")
                .with_status(500),
            RenderError::Render { source, .. } => {
                IntentError::new(RENDER_ERROR, "Failed to render page")
                    .with_status(500)
                    .with_shared_source(source)
            }
        }
    }
}
