//! Pipeline stage types.
//!
//! Every action owns an ordered list of [`Stage`]s. The dispatcher runs them
//! in order for each request; the first stage that fails sets the intent's
//! error and stops the pipeline.
//!
//! # State: Action Extensions vs Request Context
//!
//! | Container | Lifetime | Purpose |
//! |-----------|----------|---------|
//! | [`Action::extensions`](crate::Action::extensions) | Process (read-only after setup) | Plugin configuration attached to an action |
//! | [`RequestContext::extensions`] | One request | Per-request records created by stages |
//!
//! Plugins use the first to attach their per-action configuration without
//! the host knowing about it, and the second to hand a record from a
//! pipeline stage to a [`FinalizeInterceptor`](crate::FinalizeInterceptor).
//!
//! # Core Types
//!
//! - [`Extensions`]: Type-safe container for plugin state
//! - [`RequestContext`]: Per-request record passed alongside the intent
//! - [`Stage`]: Trait for pipeline stages
//! - [`FnStage`]: Closure-backed user handler stage

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::action::Action;
use crate::intent::Intent;

/// Stage kind of user handlers registered with [`Action::handle`](crate::Action::handle).
pub const HANDLER_STAGE: &str = "handler";

/// Type-safe container for plugin state.
///
/// # Warning: Clone Behavior
///
/// `Extensions` is **not** cloned when the container is cloned. Cloning an
/// `Extensions` instance results in a new, empty map, because the boxed
/// values cannot be cloned generically. Wrap shared state in `Arc<T>`.
///
/// # Example
///
/// ```rust
/// use vista_dispatch::Extensions;
///
/// struct Marker { hits: u32 }
///
/// let mut ext = Extensions::new();
/// ext.insert(Marker { hits: 1 });
/// ext.get_mut::<Marker>().unwrap().hits += 1;
/// assert_eq!(ext.get::<Marker>().unwrap().hits, 2);
/// ```
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Creates a new empty extensions container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value into the extensions.
    ///
    /// If a value of this type already exists, it is replaced and returned.
    pub fn insert<T: Send + Sync + 'static>(&mut self, val: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(val))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    /// Gets a reference to a value of the specified type.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Gets a mutable reference to a value of the specified type.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Removes a value of the specified type, returning it if it existed.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    /// Returns `true` if the extensions contain a value of the specified type.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of extensions stored.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no extensions are stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish_non_exhaustive()
    }
}

impl Clone for Extensions {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Per-request record passed alongside the [`Intent`] through the pipeline
/// and into finalize interceptors.
///
/// The dispatcher creates a fresh context for every request.
#[derive(Debug, Default)]
pub struct RequestContext {
    /// Per-request state created by stages.
    pub extensions: Extensions,
}

impl RequestContext {
    /// Creates an empty request context.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A step of an action's pipeline.
///
/// Stages run synchronously, in order. Plugins implement this trait to
/// hook into every request of an action without wrapping the user handlers.
pub trait Stage: Send + Sync {
    /// Short identifier for this kind of stage (e.g. `"handler"`, `"render"`).
    fn kind(&self) -> &str;

    /// Runs the stage. An error stops the pipeline and becomes the intent's error.
    fn run(
        &self,
        action: &Action,
        intent: &mut Intent,
        ctx: &mut RequestContext,
    ) -> anyhow::Result<()>;
}

/// A stage backed by a user closure.
///
/// # Example
///
/// ```rust
/// use vista_dispatch::{Action, FnStage, Intent, RequestContext, Stage};
/// use serde_json::json;
///
/// let stage = FnStage::new(|intent: &mut Intent| {
///     intent.set_result(json!({"ok": true}));
///     Ok(())
/// });
///
/// let action = Action::new("ping");
/// let mut intent = Intent::new("ping", json!(null));
/// stage.run(&action, &mut intent, &mut RequestContext::new()).unwrap();
/// assert_eq!(intent.result(), Some(&json!({"ok": true})));
/// ```
pub struct FnStage<F> {
    f: F,
}

impl<F> FnStage<F>
where
    F: Fn(&mut Intent) -> anyhow::Result<()> + Send + Sync,
{
    /// Wraps the given closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(&mut Intent) -> anyhow::Result<()> + Send + Sync,
{
    fn kind(&self) -> &str {
        HANDLER_STAGE
    }

    fn run(
        &self,
        _action: &Action,
        intent: &mut Intent,
        _ctx: &mut RequestContext,
    ) -> anyhow::Result<()> {
        (self.f)(intent)
    }
}
