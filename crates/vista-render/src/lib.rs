//! View rendering for vista: engines, static views and shared locals.
//!
//! `vista-render` turns a template name plus data into HTML. It has no
//! knowledge of rules or request lifecycles; the `vista` crate decides
//! *which* template to render and calls in here to render it.
//!
//! # Rendering Paths
//!
//! ```text
//! Renderer::render(name, locals)
//!   ├─ *.html | *.htm | *.txt → FileCache → contents verbatim
//!   ├─ no engine              → RenderError::NotReady
//!   └─ otherwise              → TemplateEngine::render(path, globals ⊕ locals)
//! ```
//!
//! # Key Types
//!
//! - [`Renderer`]: the engine adapter; path resolution, engine choice, locals
//! - [`TemplateEngine`]: async engine trait, with [`MiniJinjaEngine`] and
//!   [`CallbackEngine`] implementations
//! - [`FileCache`]: read-through cache for static views
//! - [`GlobalLocals`] / [`Locals`]: process-wide and per-call template values
//! - [`RenderError`]: `RENDER.ERROR` and `RENDER.NOT_READY`, convertible to
//!   [`IntentError`](vista_dispatch::IntentError)
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vista_render::{GlobalLocals, Locals, MiniJinjaEngine, Renderer};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("hi.jinja"), "hi {{ who }} from {{ site }}").unwrap();
//!
//! let engine = Arc::new(MiniJinjaEngine::new(dir.path(), false));
//! let renderer = Renderer::new(dir.path(), Some(engine), false, GlobalLocals::new());
//! renderer.add_local("site", "vista");
//!
//! let html = renderer.render("hi.jinja", Locals::from(json!({"who": "ada"}))).await.unwrap();
//! assert_eq!(html, "hi ada from vista");
//! # }
//! ```

pub mod error;
mod file_cache;
mod locals;
mod renderer;
pub mod template;

pub use error::{BoxError, EngineError, RenderError, RENDER_ERROR, RENDER_NOT_READY};
pub use file_cache::FileCache;
pub use locals::{GlobalLocals, Locals};
pub use renderer::{Renderer, PASSTHROUGH_EXTENSIONS};
pub use template::{
    panic_message, register_action_aliases, register_helpers, CallbackEngine, EngineCallback,
    MiniJinjaEngine, TemplateEngine,
};

// For engine implementors.
pub use async_trait::async_trait;
