//! The in-flight request and the response it finalizes into.
//!
//! An [`Intent`] accumulates the outcome of one action invocation: a
//! structured result, an error, or a raw (already serialized) body. Exactly
//! one [`Response`] is produced from it by [`Intent::send`].
//!
//! # Response Precedence
//!
//! | State | Response |
//! |-------|----------|
//! | raw result set | `200`, [`Body::Html`] |
//! | error set | error status, `{"error": {...}}` |
//! | result set | `200`, `{"result": ...}` |
//! | nothing | `200`, [`Body::Empty`] |

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::IntentError;

/// One in-flight request.
#[derive(Debug)]
pub struct Intent {
    action: String,
    input: Value,
    result: Option<Value>,
    raw_result: Option<String>,
    error: Option<IntentError>,
    finalized: bool,
}

impl Intent {
    /// Creates an intent for the given action with the request input.
    pub fn new(action: impl Into<String>, input: Value) -> Self {
        Self {
            action: action.into(),
            input,
            result: None,
            raw_result: None,
            error: None,
            finalized: false,
        }
    }

    /// The name of the action this intent was dispatched to.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The request input.
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// The structured result, if one was set.
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Sets the structured result.
    pub fn set_result(&mut self, result: Value) -> &mut Self {
        self.result = Some(result);
        self
    }

    /// Returns true if the intent ended in error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error state, if any.
    pub fn error(&self) -> Option<&IntentError> {
        self.error.as_ref()
    }

    /// Sets the error state, replacing any previous error.
    pub fn set_error(&mut self, error: IntentError) -> &mut Self {
        self.error = Some(error);
        self
    }

    /// Clears the error state, returning the previous error.
    pub fn clear_error(&mut self) -> Option<IntentError> {
        self.error.take()
    }

    /// Returns true if a raw body was attached.
    pub fn has_raw_result(&self) -> bool {
        self.raw_result.is_some()
    }

    /// The raw body, if one was attached.
    pub fn raw_result(&self) -> Option<&str> {
        self.raw_result.as_deref()
    }

    /// Attaches a raw (already serialized) body.
    pub fn set_raw_result(&mut self, body: impl Into<String>) -> &mut Self {
        self.raw_result = Some(body.into());
        self
    }

    /// Returns true once [`send`](Self::send) has produced the response.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Finalizes the intent into a response.
    ///
    /// Returns `None` if the intent was already sent.
    pub fn send(&mut self) -> Option<Response> {
        if self.finalized {
            return None;
        }
        self.finalized = true;

        let response = if let Some(raw) = self.raw_result.take() {
            Response::html(raw)
        } else if let Some(err) = &self.error {
            Response {
                status: err.status,
                body: Body::Json(json!({ "error": err })),
            }
        } else if let Some(result) = self.result.take() {
            Response::json(json!({ "result": result }))
        } else {
            Response::empty()
        };
        Some(response)
    }
}

// Exposed to templates under the `intent` local.
impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Intent", 4)?;
        state.serialize_field("action", &self.action)?;
        state.serialize_field("input", &self.input)?;
        state.serialize_field("result", &self.result)?;
        state.serialize_field("error", &self.error)?;
        state.end()
    }
}

/// The body of a finalized response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured payload, serialized as JSON by the response writer.
    Json(Value),
    /// Already rendered HTML.
    Html(String),
    /// No body.
    Empty,
}

/// A finalized response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP-like status code.
    pub status: u16,
    /// The response body.
    pub body: Body,
}

impl Response {
    /// A `200` HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: Body::Html(body.into()),
        }
    }

    /// A `200` JSON response.
    pub fn json(value: Value) -> Self {
        Self {
            status: 200,
            body: Body::Json(value),
        }
    }

    /// A `200` response without a body.
    pub fn empty() -> Self {
        Self {
            status: 200,
            body: Body::Empty,
        }
    }

    /// The content type a response writer should announce.
    pub fn content_type(&self) -> &'static str {
        match self.body {
            Body::Html(_) => "text/html; charset=utf-8",
            Body::Json(_) | Body::Empty => "application/json",
        }
    }

    /// Returns the HTML body, if this is an HTML response.
    pub fn as_html(&self) -> Option<&str> {
        match &self.body {
            Body::Html(html) => Some(html),
            _ => None,
        }
    }

    /// Returns the JSON body, if this is a JSON response.
    pub fn as_json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }
}
