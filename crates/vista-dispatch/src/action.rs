//! Actions: named request handlers with a stage pipeline.
//!
//! An [`Action`] is built once at startup with a fluent builder and is
//! read-only once registered with the [`Dispatcher`](crate::Dispatcher).
//!
//! ```rust
//! use vista_dispatch::{Action, Intent};
//! use serde_json::json;
//!
//! let action = Action::new("users.list")
//!     .alias("GET", "/users")
//!     .handle(|intent: &mut Intent| {
//!         intent.set_result(json!([]));
//!         Ok(())
//!     });
//!
//! assert_eq!(action.name(), "users.list");
//! assert_eq!(action.stages().len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::handler::{Extensions, FnStage, Stage};
use crate::hooks::{Events, Phase};
use crate::intent::Intent;

/// A route under which an action is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// Request verb, e.g. `"GET"`.
    pub verb: String,
    /// Route path, e.g. `"/users"`.
    pub path: String,
}

/// Shared map from action name to the path of its first alias.
///
/// Clones share their entries.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl AliasTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `action`'s first alias, or forgets the action if it has none.
    pub fn record(&self, action: &Action) {
        let mut entries = self.inner.write();
        match action.aliases().first() {
            Some(alias) => {
                entries.insert(action.name().to_string(), alias.path.clone());
            }
            None => {
                entries.remove(action.name());
            }
        }
    }

    /// The first alias path of `action`.
    pub fn path(&self, action: &str) -> Option<String> {
        self.inner.read().get(action).cloned()
    }

    /// Number of actions with an alias.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if no action has an alias.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// A named request handler.
pub struct Action {
    name: String,
    aliases: Vec<Alias>,
    stages: Vec<Arc<dyn Stage>>,
    events: Events,
    extensions: Extensions,
}

impl Action {
    /// Creates an action with an empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            stages: Vec::new(),
            events: Events::new(),
            extensions: Extensions::new(),
        }
    }

    /// The action's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a route alias.
    pub fn alias(mut self, verb: impl Into<String>, path: impl Into<String>) -> Self {
        self.aliases.push(Alias {
            verb: verb.into().to_uppercase(),
            path: path.into(),
        });
        self
    }

    /// The registered aliases, in registration order.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// Appends a user handler to the pipeline.
    pub fn handle<F>(self, f: F) -> Self
    where
        F: Fn(&mut Intent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.stage(Arc::new(FnStage::new(f)))
    }

    /// Appends a stage to the pipeline.
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Inserts a stage at `index` (clamped to the pipeline length).
    pub fn insert_stage(&mut self, index: usize, stage: Arc<dyn Stage>) {
        let index = index.min(self.stages.len());
        self.stages.insert(index, stage);
    }

    /// The pipeline, in execution order.
    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    /// Registers a `before` observer for `event`.
    pub fn before<P, F>(mut self, event: impl Into<String>, f: F) -> Self
    where
        P: 'static,
        F: Fn(&Intent, &P) + Send + Sync + 'static,
    {
        self.events.on(Phase::Before, event, f);
        self
    }

    /// Registers an `after` observer for `event`.
    pub fn after<P, F>(mut self, event: impl Into<String>, f: F) -> Self
    where
        P: 'static,
        F: Fn(&Intent, &P) + Send + Sync + 'static,
    {
        self.events.on(Phase::After, event, f);
        self
    }

    /// The action's lifecycle observers.
    pub fn events(&self) -> &Events {
        &self.events
    }

    /// Plugin state attached to this action.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable plugin state, available while the action is being built.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<&str> = self.stages.iter().map(|s| s.kind()).collect();
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("stages", &stages)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
