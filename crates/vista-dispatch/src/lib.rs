//! Action pipelines, intents and lifecycle events for in-process dispatch.
//!
//! `vista-dispatch` is the host surface the `vista` render layer plugs into.
//! It knows nothing about templates: it runs an action's stages against an
//! [`Intent`], lets interceptors adjust the outcome, and turns the intent into
//! a [`Response`].
//!
//! # Features
//!
//! - **Actions**: named pipelines of [`Stage`]s built with a fluent builder
//! - **Intents**: per-request result/error/raw-body state, finalized once
//! - **Lifecycle events**: typed `before`/`after` observers per event name
//! - **Finalize interception**: async hooks run right before a response is produced
//! - **Extensions**: type-keyed plugin state on actions and requests
//!
//! # Usage
//!
//! ```rust
//! use vista_dispatch::{Action, Dispatcher, Intent};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add_action(
//!     Action::new("greet")
//!         .alias("GET", "/hello")
//!         .handle(|intent: &mut Intent| {
//!             let name = intent.input()["name"].as_str().unwrap_or("world").to_string();
//!             intent.set_result(json!({ "greeting": format!("hello {}", name) }));
//!             Ok(())
//!         }),
//! );
//!
//! let response = dispatcher.dispatch("greet", json!({"name": "ada"})).await.unwrap();
//! assert_eq!(response.as_json().unwrap()["result"]["greeting"], "hello ada");
//! # }
//! ```

mod action;
mod dispatch;
mod error;
mod handler;
mod hooks;
mod intent;

pub use action::{Action, Alias, AliasTable};

pub use dispatch::{run_pipeline, Dispatcher};

pub use error::{DispatchError, ErrorSource, IntentError, DEFAULT_ERROR_STATUS};

pub use handler::{Extensions, FnStage, RequestContext, Stage, HANDLER_STAGE};

pub use hooks::{Events, FinalizeInterceptor, ObserverFn, Phase};

pub use intent::{Body, Intent, Response};

// For interceptor implementors.
pub use async_trait::async_trait;
