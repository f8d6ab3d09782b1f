//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait the [`Renderer`](crate::Renderer)
//! hands non-HTML templates to. Two implementations ship with the crate:
//!
//! - [`MiniJinjaEngine`]: file-backed MiniJinja environment rooted at the
//!   view directory.
//! - [`CallbackEngine`]: wraps a plain function, for hosts that bring their
//!   own engine.
//!
//! Both implementations render on tokio's blocking pool, so template loading
//! and user callbacks never stall the async workers. A panic comes back as
//! [`EngineError::Panicked`].

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use minijinja::Environment;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use vista_dispatch::AliasTable;

use crate::error::{BoxError, EngineError};
use crate::template::filters::{register_action_aliases, register_helpers};

/// A template engine that renders a template file with a locals map.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Renders the template at `path` (absolute, already resolved against
    /// the view root) with `locals`.
    async fn render(&self, path: &Path, locals: &Map<String, Value>) -> Result<String, EngineError>;

    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Access to the concrete engine, for configuration escape hatches.
    fn as_any(&self) -> &dyn Any;
}

/// MiniJinja-based template engine.
///
/// Templates are loaded from disk on first use. Relative names passed to
/// `{% include %}` or `{% extends %}` resolve against the view root; absolute
/// names are read as-is. Block trimming (`trim_blocks`, `lstrip_blocks`) is
/// enabled.
///
/// With `auto_reload` the compiled templates are dropped before every render,
/// so edits show up without a restart.
///
/// # Example
///
/// ```rust
/// use vista_render::{MiniJinjaEngine, TemplateEngine};
/// use serde_json::{json, Map};
///
/// # #[tokio::main]
/// # async fn main() {
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("hello.jinja"), "Hello, {{ name }}!").unwrap();
///
/// let engine = MiniJinjaEngine::new(dir.path(), false);
/// let mut locals = Map::new();
/// locals.insert("name".into(), json!("World"));
///
/// let output = engine.render(&dir.path().join("hello.jinja"), &locals).await.unwrap();
/// assert_eq!(output, "Hello, World!");
/// # }
/// ```
pub struct MiniJinjaEngine {
    env: Arc<RwLock<Environment<'static>>>,
    root: PathBuf,
    auto_reload: bool,
}

impl MiniJinjaEngine {
    /// Creates an engine rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, auto_reload: bool) -> Self {
        let root = root.into();
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_loader(view_loader(root.clone()));
        register_helpers(&mut env);
        Self {
            env: Arc::new(RwLock::new(env)),
            root,
            auto_reload,
        }
    }

    /// The directory relative template names resolve against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether compiled templates are dropped before every render.
    pub fn auto_reload(&self) -> bool {
        self.auto_reload
    }

    /// Runs `f` with mutable access to the MiniJinja environment.
    ///
    /// This allows registering custom filters, functions or globals.
    ///
    /// ```rust
    /// use vista_render::MiniJinjaEngine;
    ///
    /// let engine = MiniJinjaEngine::new("app/views", false);
    /// engine.with_environment(|env| {
    ///     env.add_filter("shout", |s: String| s.to_uppercase());
    /// });
    /// ```
    pub fn with_environment<R>(&self, f: impl FnOnce(&mut Environment<'static>) -> R) -> R {
        f(&mut self.env.write())
    }

    /// Lets templates resolve `action_alias(name)` against `aliases`.
    pub fn set_action_aliases(&self, aliases: AliasTable) {
        register_action_aliases(&mut self.env.write(), aliases);
    }
}

fn render_sync(
    env: &RwLock<Environment<'static>>,
    auto_reload: bool,
    name: &str,
    locals: &Map<String, Value>,
) -> Result<String, EngineError> {
    if auto_reload {
        env.write().clear_templates();
    }
    let env = env.read();
    let template = env.get_template(name)?;
    Ok(template.render(locals)?)
}

#[async_trait]
impl TemplateEngine for MiniJinjaEngine {
    async fn render(&self, path: &Path, locals: &Map<String, Value>) -> Result<String, EngineError> {
        let env = self.env.clone();
        let auto_reload = self.auto_reload;
        let name = path.to_string_lossy().into_owned();
        let locals = locals.clone();
        blocking(move || render_sync(&env, auto_reload, &name, &locals)).await
    }

    fn name(&self) -> &str {
        "minijinja"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn view_loader(
    root: PathBuf,
) -> impl Fn(&str) -> Result<Option<String>, minijinja::Error> + Send + Sync + 'static {
    move |name| {
        let candidate = Path::new(name);
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        };
        match std::fs::read_to_string(&path) {
            Ok(source) => Ok(Some(source)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(minijinja::Error::new(
                minijinja::ErrorKind::InvalidOperation,
                format!("could not read template {}", path.display()),
            )
            .with_source(err)),
        }
    }
}

/// Signature of the function wrapped by [`CallbackEngine`].
pub type EngineCallback =
    dyn Fn(&Path, &Map<String, Value>) -> Result<String, BoxError> + Send + Sync;

/// Engine backed by a plain function.
///
/// ```rust
/// use vista_render::{CallbackEngine, TemplateEngine};
/// use serde_json::Map;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let engine = CallbackEngine::new(|path, _locals| Ok(format!("rendered {}", path.display())));
/// let out = engine.render(Path::new("/views/a.tpl"), &Map::new()).await.unwrap();
/// assert_eq!(out, "rendered /views/a.tpl");
/// # }
/// ```
#[derive(Clone)]
pub struct CallbackEngine {
    callback: Arc<EngineCallback>,
}

impl CallbackEngine {
    /// Wraps `callback`.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Path, &Map<String, Value>) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

#[async_trait]
impl TemplateEngine for CallbackEngine {
    async fn render(&self, path: &Path, locals: &Map<String, Value>) -> Result<String, EngineError> {
        let callback = self.callback.clone();
        let path = path.to_path_buf();
        let locals = locals.clone();
        blocking(move || callback(&path, &locals).map_err(EngineError::Callback)).await
    }

    fn name(&self) -> &str {
        "callback"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for CallbackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackEngine").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for MiniJinjaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniJinjaEngine")
            .field("root", &self.root)
            .field("auto_reload", &self.auto_reload)
            .finish_non_exhaustive()
    }
}

/// Runs `f` on the blocking pool, turning a panic into [`EngineError::Panicked`].
async fn blocking<F>(f: F) -> Result<String, EngineError>
where
    F: FnOnce() -> Result<String, EngineError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(err) => match err.try_into_panic() {
            Ok(payload) => Err(EngineError::Panicked(panic_message(payload.as_ref()))),
            Err(err) => Err(EngineError::Panicked(err.to_string())),
        },
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
