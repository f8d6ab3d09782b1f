//! Values available to every template.
//!
//! A render sees two layers, merged per call:
//!
//! 1. [`GlobalLocals`]: process-wide entries shared by all renders of one
//!    [`Renderer`](crate::Renderer) (`environment`, `config`, `app`, plus
//!    whatever the application adds with `add_local`).
//! 2. [`Locals`]: per-call values, usually the intent being finalized.
//!
//! Per-call values win on collision. Rendering never writes to the global
//! layer.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use vista_dispatch::Intent;

/// Per-call template values.
#[derive(Debug, Clone, Default)]
pub enum Locals<'a> {
    /// No per-call values.
    #[default]
    None,
    /// Exposes the intent as `intent`.
    Intent(&'a Intent),
    /// Arbitrary entries.
    Map(Map<String, Value>),
}

impl<'a> From<&'a Intent> for Locals<'a> {
    fn from(intent: &'a Intent) -> Self {
        Locals::Intent(intent)
    }
}

impl From<Map<String, Value>> for Locals<'_> {
    fn from(map: Map<String, Value>) -> Self {
        Locals::Map(map)
    }
}

impl From<Value> for Locals<'_> {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Locals::Map(map),
            _ => Locals::None,
        }
    }
}

impl Locals<'_> {
    fn into_map(self) -> Map<String, Value> {
        match self {
            Locals::None => Map::new(),
            Locals::Map(map) => map,
            Locals::Intent(intent) => match serde_json::to_value(intent) {
                Ok(value) => {
                    let mut map = Map::new();
                    map.insert("intent".to_string(), value);
                    map
                }
                Err(err) => {
                    tracing::warn!(action = %intent.action(), error = %err, "Intent could not be exposed to the template");
                    Map::new()
                }
            },
        }
    }
}

/// Process-wide template values.
///
/// Cloning is cheap and clones share the same entries.
///
/// ```rust
/// use vista_render::GlobalLocals;
/// use serde_json::json;
///
/// let globals = GlobalLocals::new();
/// globals.add_local("site", "Example");
/// globals.extend_locals(json!({"year": 2024}));
///
/// assert_eq!(globals.get("site"), Some(json!("Example")));
/// assert_eq!(globals.snapshot().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GlobalLocals {
    inner: Arc<RwLock<Map<String, Value>>>,
}

impl GlobalLocals {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding `seed`.
    pub fn with_entries(seed: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(seed)),
        }
    }

    /// Sets `key` to `value`. An empty key or an unserializable value is
    /// ignored.
    pub fn add_local<V: Serialize>(&self, key: &str, value: V) -> &Self {
        if key.is_empty() {
            return self;
        }
        match serde_json::to_value(value) {
            Ok(value) => {
                self.inner.write().insert(key.to_string(), value);
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Ignoring unserializable template local");
            }
        }
        self
    }

    /// Merges the entries of a JSON object. Anything else is ignored.
    pub fn extend_locals(&self, value: Value) -> &Self {
        if let Value::Object(map) = value {
            self.inner.write().extend(map);
        }
        self
    }

    /// Returns a copy of one entry.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// Returns a copy of all entries.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.read().clone()
    }

    /// Builds the values one render sees: globals overlaid with `locals`.
    pub fn compose(&self, locals: Locals<'_>) -> Map<String, Value> {
        let mut merged = self.snapshot();
        merged.extend(locals.into_map());
        merged
    }
}
