//! The engine adapter.
//!
//! [`Renderer`] is the single entry point for turning a template name into
//! HTML. It decides between the passthrough path (static files through the
//! [`FileCache`]) and the configured [`TemplateEngine`], composes the
//! template locals, and normalizes every failure into a [`RenderError`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::RenderError;
use crate::file_cache::FileCache;
use crate::locals::{GlobalLocals, Locals};
use crate::template::TemplateEngine;

/// Extensions served verbatim, without an engine.
pub const PASSTHROUGH_EXTENSIONS: &[&str] = &["html", "htm", "txt"];

/// Renders view templates for one application.
///
/// # Example
///
/// ```rust
/// use vista_render::{GlobalLocals, Locals, Renderer};
///
/// # #[tokio::main]
/// # async fn main() {
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("about.html"), "<h1>About</h1>").unwrap();
///
/// let renderer = Renderer::new(dir.path(), None, false, GlobalLocals::new());
/// let html = renderer.render("about.html", Locals::None).await.unwrap();
/// assert_eq!(html, "<h1>About</h1>");
/// # }
/// ```
pub struct Renderer {
    root: PathBuf,
    engine: Option<Arc<dyn TemplateEngine>>,
    files: FileCache,
    locals: GlobalLocals,
}

impl Renderer {
    /// Creates a renderer.
    ///
    /// `root` is the view directory relative names resolve against. Without
    /// an engine only passthrough templates can be rendered. `cache_files`
    /// turns on the passthrough cache.
    pub fn new(
        root: impl Into<PathBuf>,
        engine: Option<Arc<dyn TemplateEngine>>,
        cache_files: bool,
        locals: GlobalLocals,
    ) -> Self {
        Self {
            root: root.into(),
            engine,
            files: FileCache::new(cache_files),
            locals,
        }
    }

    /// The view directory.
    pub fn view_root(&self) -> &Path {
        &self.root
    }

    /// The configured engine, if any.
    pub fn instance(&self) -> Option<&Arc<dyn TemplateEngine>> {
        self.engine.as_ref()
    }

    /// The passthrough cache.
    pub fn file_cache(&self) -> &FileCache {
        &self.files
    }

    /// The process-wide template values.
    pub fn locals(&self) -> &GlobalLocals {
        &self.locals
    }

    /// Sets one process-wide template value.
    pub fn add_local<V: Serialize>(&self, key: &str, value: V) -> &Self {
        self.locals.add_local(key, value);
        self
    }

    /// Merges a JSON object into the process-wide template values.
    pub fn extend_locals(&self, value: Value) -> &Self {
        self.locals.extend_locals(value);
        self
    }

    /// Resolves `template` against the view root. Absolute paths are kept.
    pub fn resolve_path(&self, template: &str) -> PathBuf {
        let path = Path::new(template);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Renders `template` with the global locals overlaid by `locals`.
    pub async fn render(&self, template: &str, locals: Locals<'_>) -> Result<String, RenderError> {
        let path = self.resolve_path(template);

        if is_passthrough(&path) {
            tracing::debug!(template = %template, "Serving static view");
            return self
                .files
                .read(&path)
                .await
                .map_err(|err| RenderError::render(template, err));
        }

        let Some(engine) = self.engine.as_ref() else {
            return Err(RenderError::NotReady);
        };

        let data = self.locals.compose(locals);
        tracing::debug!(template = %template, engine = %engine.name(), "Rendering view");
        engine
            .render(&path, &data)
            .await
            .map_err(|err| RenderError::render(template, err))
    }
}

fn is_passthrough(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PASSTHROUGH_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("root", &self.root)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}
