//! Lifecycle events and finalize interception.
//!
//! Two extension points let plugins take part in a request without
//! subclassing the host types:
//!
//! - [`Events`]: named `before`/`after` observers registered on an action.
//!   Plugins fire them at the points they define (e.g. `"render"`).
//! - [`FinalizeInterceptor`]: runs after the pipeline and before the intent
//!   is turned into a response. It may rewrite the intent's outcome.
//!
//! # Pipeline Position
//!
//! ```text
//! dispatch(action, input)
//!   → stage 0 … stage N        (user handlers, plugin stages)
//!   → FINALIZE INTERCEPTORS ← (may replace result/error)
//!   → intent.send()            (response)
//! ```
//!
//! # Typed Payloads
//!
//! Observers are typed by their payload. Firing an event with payload `P`
//! only calls the observers registered for `P`; others under the same name
//! are skipped. Observers cannot abort anything: they are notified, not
//! consulted.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::action::Action;
use crate::handler::RequestContext;
use crate::intent::Intent;

/// When an observer runs relative to the event it watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the event's work happens.
    Before,
    /// After the event's work happened.
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => write!(f, "before"),
            Phase::After => write!(f, "after"),
        }
    }
}

/// Type alias for a lifecycle observer receiving payload `P`.
pub type ObserverFn<P> = Arc<dyn Fn(&Intent, &P) + Send + Sync>;

/// Named lifecycle observers of one action.
#[derive(Default)]
pub struct Events {
    observers: HashMap<(Phase, String), Vec<Box<dyn Any + Send + Sync>>>,
}

impl Events {
    /// Creates an empty observer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for `(phase, event)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use vista_dispatch::{Events, Intent, Phase};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// struct Saved { id: u64 }
    ///
    /// let seen = Arc::new(AtomicUsize::new(0));
    /// let seen_clone = seen.clone();
    ///
    /// let mut events = Events::new();
    /// events.on(Phase::After, "save", move |_intent: &Intent, saved: &Saved| {
    ///     seen_clone.fetch_add(saved.id as usize, Ordering::SeqCst);
    /// });
    ///
    /// let intent = Intent::new("users.save", serde_json::Value::Null);
    /// events.fire(Phase::After, "save", &intent, &Saved { id: 3 });
    /// assert_eq!(seen.load(Ordering::SeqCst), 3);
    /// ```
    pub fn on<P, F>(&mut self, phase: Phase, event: impl Into<String>, f: F)
    where
        P: 'static,
        F: Fn(&Intent, &P) + Send + Sync + 'static,
    {
        let observer: ObserverFn<P> = Arc::new(f);
        self.observers
            .entry((phase, event.into()))
            .or_default()
            .push(Box::new(observer));
    }

    /// Returns true if any observer is registered for `(phase, event)`.
    pub fn has(&self, phase: Phase, event: &str) -> bool {
        self.observers
            .get(&(phase, event.to_string()))
            .map(|list| !list.is_empty())
            .unwrap_or(false)
    }

    /// Calls, in registration order, every observer of `(phase, event)` that
    /// accepts payload type `P`. Returns how many observers ran.
    pub fn fire<P: 'static>(&self, phase: Phase, event: &str, intent: &Intent, payload: &P) -> usize {
        let Some(list) = self.observers.get(&(phase, event.to_string())) else {
            return 0;
        };
        let mut called = 0;
        for boxed in list {
            if let Some(observer) = boxed.downcast_ref::<ObserverFn<P>>() {
                observer(intent, payload);
                called += 1;
            }
        }
        called
    }

    /// Returns true if no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.values().all(Vec::is_empty)
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .observers
            .iter()
            .map(|((phase, name), list)| format!("{}:{}({})", phase, name, list.len()))
            .collect();
        keys.sort();
        f.debug_struct("Events").field("observers", &keys).finish()
    }
}

/// Hook into the finalize step of every dispatched request.
///
/// Interceptors run after the pipeline, in registration order, with the
/// [`RequestContext`] the pipeline stages wrote into.
#[async_trait]
pub trait FinalizeInterceptor: Send + Sync {
    /// Called once per request right before the intent is sent.
    async fn before_send(&self, action: &Action, intent: &mut Intent, ctx: &mut RequestContext);
}
