//! Request dispatch.
//!
//! The [`Dispatcher`] owns the registered actions and the finalize
//! interceptors. For every request it:
//!
//! 1. creates a fresh [`Intent`] and [`RequestContext`],
//! 2. runs the action's stages in order (the first failure becomes the
//!    intent's error and stops the pipeline),
//! 3. runs every [`FinalizeInterceptor`] in registration order,
//! 4. sends the intent.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::action::{Action, AliasTable};
use crate::error::{DispatchError, IntentError};
use crate::handler::RequestContext;
use crate::hooks::FinalizeInterceptor;
use crate::intent::{Intent, Response};

/// Registry of actions plus the finalize interceptors applied to all of them.
#[derive(Default)]
pub struct Dispatcher {
    actions: HashMap<String, Arc<Action>>,
    aliases: AliasTable,
    interceptors: Vec<Arc<dyn FinalizeInterceptor>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action. An action with the same name is replaced.
    pub fn add_action(&mut self, action: Action) -> Arc<Action> {
        let action = Arc::new(action);
        self.aliases.record(&action);
        if self
            .actions
            .insert(action.name().to_string(), action.clone())
            .is_some()
        {
            tracing::warn!(action = %action.name(), "Action registered twice, replacing previous definition");
        }
        action
    }

    /// Looks up an action by name.
    pub fn action(&self, name: &str) -> Option<&Arc<Action>> {
        self.actions.get(name)
    }

    /// All registered actions, in no particular order.
    pub fn actions(&self) -> impl Iterator<Item = &Arc<Action>> {
        self.actions.values()
    }

    /// Returns the path of the first alias of an action, or `""`.
    ///
    /// Useful for linking to an action rather than to one of its routes.
    pub fn action_alias(&self, name: &str) -> String {
        self.aliases.path(name).unwrap_or_default()
    }

    /// The live alias table, shared with template engines.
    pub fn alias_table(&self) -> &AliasTable {
        &self.aliases
    }

    /// Registers a finalize interceptor.
    pub fn intercept(&mut self, interceptor: Arc<dyn FinalizeInterceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Dispatches one request to the named action.
    pub async fn dispatch(&self, name: &str, input: Value) -> Result<Response, DispatchError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| DispatchError::UnknownAction(name.to_string()))?;

        let mut intent = Intent::new(name, input);
        let mut ctx = RequestContext::new();
        run_pipeline(action, &mut intent, &mut ctx);
        self.finalize(action, &mut intent, &mut ctx).await
    }

    /// Runs the finalize interceptors and sends the intent.
    pub async fn finalize(
        &self,
        action: &Action,
        intent: &mut Intent,
        ctx: &mut RequestContext,
    ) -> Result<Response, DispatchError> {
        if intent.is_finalized() {
            return Err(DispatchError::AlreadySent(action.name().to_string()));
        }
        for interceptor in &self.interceptors {
            interceptor.before_send(action, intent, ctx).await;
        }
        intent
            .send()
            .ok_or_else(|| DispatchError::AlreadySent(action.name().to_string()))
    }
}

/// Runs the stages of `action` against `intent`, stopping at the first error.
pub fn run_pipeline(action: &Action, intent: &mut Intent, ctx: &mut RequestContext) {
    for stage in action.stages() {
        if let Err(err) = stage.run(action, intent, ctx) {
            let err = IntentError::from_handler(err);
            tracing::debug!(
                action = %action.name(),
                stage = %stage.kind(),
                code = %err.code,
                "Pipeline stopped by stage error"
            );
            intent.set_error(err);
            break;
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.actions.keys().collect();
        names.sort();
        f.debug_struct("Dispatcher")
            .field("actions", &names)
            .field("interceptor_count", &self.interceptors.len())
            .finish()
    }
}
