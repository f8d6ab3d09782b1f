//! Template engines.
//!
//! The [`Renderer`](crate::Renderer) serves `.html`, `.htm` and `.txt` files
//! itself and hands every other template to a [`TemplateEngine`]:
//!
//! ```text
//! render("users/list.jinja", locals)
//!   → resolve against the view root
//!   → engine.render(path, global locals ⊕ locals)
//! ```
//!
//! ## Key Types
//!
//! - [`TemplateEngine`]: async trait every engine implements
//! - [`MiniJinjaEngine`]: the default engine, file-backed MiniJinja
//! - [`CallbackEngine`]: adapter for a host-provided render function
//! - [`register_helpers`]: template functions vista adds to MiniJinja

mod engine;
pub mod filters;

pub use engine::{panic_message, CallbackEngine, EngineCallback, MiniJinjaEngine, TemplateEngine};
pub use filters::{register_action_aliases, register_helpers};
