//! Plugin initialization.

use std::sync::Arc;

use vista_dispatch::Dispatcher;
use vista_render::{GlobalLocals, MiniJinjaEngine, Renderer, TemplateEngine};

use crate::hook::RenderHook;
use crate::options::{AppInfo, EngineChoice, RenderOptions};
use crate::setup::{ensure_view_root, view_root};

/// The render plugin of one application.
///
/// Creating it resolves the view directory, creates it if missing, picks the
/// engine and seeds the global locals. [`install`](Vista::install) hooks the
/// renderer into a dispatcher.
///
/// ```rust
/// use vista::{AppInfo, RenderActionExt, RenderOptions, Vista};
/// use vista_dispatch::{Action, Dispatcher};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let dir = tempfile::tempdir().unwrap();
/// let app = AppInfo::new("demo").root(dir.path());
/// let vista = Vista::new(&app, RenderOptions::new());
/// std::fs::write(vista.renderer().view_root().join("hi.jinja"), "hi {{ app.name }}").unwrap();
///
/// let mut dispatcher = Dispatcher::new();
/// vista.install(&mut dispatcher);
/// dispatcher.add_action(Action::new("hi").render("hi.jinja"));
///
/// let response = dispatcher.dispatch("hi", json!(null)).await.unwrap();
/// assert_eq!(response.as_html(), Some("hi demo"));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Vista {
    renderer: Arc<Renderer>,
    options: RenderOptions,
}

impl Vista {
    /// Initializes the plugin for `app`.
    ///
    /// Configuration problems are logged and degrade the plugin: an
    /// unsupported engine leaves only static views renderable, and a view
    /// directory that cannot be created surfaces later as render errors.
    pub fn new(app: &AppInfo, options: RenderOptions) -> Self {
        let root = view_root(&app.root, &options.path);
        let caching = app.is_production();

        match ensure_view_root(&root) {
            Ok(true) => tracing::debug!(channel = %options.logger, path = %root.display(), "Created view directory"),
            Ok(false) => {}
            Err(err) => tracing::warn!(channel = %options.logger, error = %err, "View directory unavailable"),
        }

        let engine: Option<Arc<dyn TemplateEngine>> = match options.engine_choice() {
            EngineChoice::MiniJinja => Some(Arc::new(MiniJinjaEngine::new(&root, !caching))),
            EngineChoice::Html => None,
            EngineChoice::Callback(callback) => Some(Arc::new(callback)),
            EngineChoice::Unsupported(name) => {
                tracing::error!(channel = %options.logger, engine = %name, "Unsupported render engine");
                None
            }
        };

        tracing::debug!(
            channel = %options.logger,
            path = %root.display(),
            engine = engine.as_ref().map(|e| e.name()).unwrap_or("none"),
            caching,
            "Render plugin initialized"
        );

        let locals = GlobalLocals::with_entries(app.template_locals());
        Self {
            renderer: Arc::new(Renderer::new(root, engine, caching, locals)),
            options,
        }
    }

    /// Hooks rendering into `dispatcher`'s finalize step.
    ///
    /// MiniJinja templates can then call `action_alias(name)` for any action
    /// registered on `dispatcher`, before or after this call.
    pub fn install(&self, dispatcher: &mut Dispatcher) {
        if let Some(jinja) = self
            .renderer
            .instance()
            .and_then(|engine| engine.as_any().downcast_ref::<MiniJinjaEngine>())
        {
            jinja.set_action_aliases(dispatcher.alias_table().clone());
        }
        dispatcher.intercept(Arc::new(RenderHook::new(
            self.renderer.clone(),
            self.options.logger.clone(),
        )));
    }

    /// The engine adapter.
    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    /// The options the plugin was created with.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }
}
