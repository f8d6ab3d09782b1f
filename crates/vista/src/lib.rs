//! # Vista - Conditional View Rendering for Action Pipelines
//!
//! Vista lets an action declare which template to render for which outcome
//! (success, a specific error status, any error, or always). When the
//! request finalizes, vista picks the template from the intent's actual
//! result/error, renders it, and substitutes the HTML for the JSON payload.
//!
//! ## Core Concepts
//!
//! - [`RenderActionExt`]: `.render(...)` / `.render_when(...)` on actions
//! - [`RuleSet`]: the per-action rules and their priority
//! - [`resolve_template`]: outcome → template name, firing `before render`
//! - [`RenderHook`]: the finalize interceptor doing the render
//! - [`Vista`]: plugin entry point wiring options, engine and dispatcher
//!
//! Rendering itself lives in [`vista_render`]; the host surface (actions,
//! intents, dispatcher) in [`vista_dispatch`]. Both are re-exported.
//!
//! ## Quick Start
//!
//! ```rust
//! use vista::{AppInfo, RenderActionExt, RenderOptions, Vista};
//! use vista_dispatch::{Action, Dispatcher, IntentError};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let dir = tempfile::tempdir().unwrap();
//! let vista = Vista::new(&AppInfo::new("shop").root(dir.path()), RenderOptions::new());
//! let views = vista.renderer().view_root().to_path_buf();
//! std::fs::write(views.join("item.jinja"), "<h1>{{ intent.result.title }}</h1>").unwrap();
//! std::fs::write(views.join("404.html"), "<h1>Not found</h1>").unwrap();
//!
//! let mut dispatcher = Dispatcher::new();
//! vista.install(&mut dispatcher);
//! dispatcher.add_action(
//!     Action::new("items.show")
//!         .handle(|intent| {
//!             match intent.input()["id"].as_u64() {
//!                 Some(1) => { intent.set_result(json!({"title": "Lamp"})); }
//!                 _ => return Err(IntentError::new("ITEM.NOT_FOUND", "no item").with_status(404).into()),
//!             }
//!             Ok(())
//!         })
//!         .render_when("item.jinja", "success")
//!         .render_when("404.html", 404),
//! );
//!
//! let found = dispatcher.dispatch("items.show", json!({"id": 1})).await.unwrap();
//! assert_eq!(found.as_html(), Some("<h1>Lamp</h1>"));
//!
//! let missing = dispatcher.dispatch("items.show", json!({"id": 2})).await.unwrap();
//! assert_eq!(missing.as_html(), Some("<h1>Not found</h1>"));
//! # }
//! ```
//!
//! ## Logging
//!
//! Vista logs through `tracing` and never installs a subscriber. Runtime
//! events carry the configured channel as the `channel` field.

mod action_ext;
pub mod hook;
mod options;
mod plugin;
pub mod resolve;
pub mod rules;
mod setup;

pub use action_ext::RenderActionExt;
pub use hook::{AfterRender, RenderContext, RenderHook, RenderPhase, RenderStage, RENDER_STAGE};
pub use options::{
    AppInfo, EngineChoice, RenderOptions, DEFAULT_CHANNEL, DEFAULT_ENGINE, DEFAULT_VIEW_PATH,
    PRODUCTION,
};
pub use plugin::Vista;
pub use resolve::{resolve_for_channel, resolve_template, BeforeRender, RENDER_EVENT};
pub use rules::{
    AppliesTo, IntoWhen, ParseWhenError, RenderRule, RulePanic, RuleSet, TemplateFn, TemplateSource,
    When,
};
pub use setup::{ensure_view_root, view_root, SetupError};

pub use vista_dispatch;
pub use vista_render;
pub use vista_render::{GlobalLocals, Locals, RenderError, Renderer};
