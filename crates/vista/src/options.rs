//! Plugin configuration and host identity.
//!
//! [`RenderOptions`] can be built in code or deserialized from YAML/JSON:
//!
//! ```yaml
//! engine: minijinja   # or "html" for static views only
//! path: app/views     # relative to the application root
//! logger: render      # `channel` field on log events
//! ```
//!
//! Every field is optional; missing fields take the defaults above.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use vista_render::{BoxError, CallbackEngine};

use crate::setup::SetupError;

/// Default engine name.
pub const DEFAULT_ENGINE: &str = "minijinja";

/// Default view directory, relative to the application root.
pub const DEFAULT_VIEW_PATH: &str = "app/views";

/// Default log channel.
pub const DEFAULT_CHANNEL: &str = "render";

/// Environment name that turns on caching.
pub const PRODUCTION: &str = "production";

/// Render plugin options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Template engine name: `"minijinja"` or `"html"`.
    pub engine: String,
    /// View directory.
    pub path: String,
    /// Log channel.
    pub logger: String,
    #[serde(skip)]
    callback: Option<CallbackEngine>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            path: DEFAULT_VIEW_PATH.to_string(),
            logger: DEFAULT_CHANNEL.to_string(),
            callback: None,
        }
    }
}

/// The engine the options select.
#[derive(Debug, Clone)]
pub enum EngineChoice {
    /// File-backed MiniJinja.
    MiniJinja,
    /// Static views only.
    Html,
    /// A host-provided render function.
    Callback(CallbackEngine),
    /// An engine name vista does not know.
    Unsupported(String),
}

impl RenderOptions {
    /// Options with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a YAML document.
    ///
    /// ```rust
    /// use vista::RenderOptions;
    ///
    /// let options = RenderOptions::from_yaml("engine: html\npath: views").unwrap();
    /// assert_eq!(options.engine, "html");
    /// assert_eq!(options.logger, "render");
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, SetupError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses options from a JSON value.
    pub fn from_json(value: Value) -> Result<Self, SetupError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Sets the engine name.
    pub fn engine(mut self, name: impl Into<String>) -> Self {
        self.engine = name.into();
        self
    }

    /// Sets the view directory.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the log channel.
    pub fn logger(mut self, channel: impl Into<String>) -> Self {
        self.logger = channel.into();
        self
    }

    /// Renders non-static templates with `f` instead of a named engine.
    pub fn with_callback_engine<F>(mut self, f: F) -> Self
    where
        F: Fn(&std::path::Path, &Map<String, Value>) -> Result<String, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.callback = Some(CallbackEngine::new(f));
        self
    }

    /// The engine these options select. A callback wins over the name.
    pub fn engine_choice(&self) -> EngineChoice {
        if let Some(callback) = &self.callback {
            return EngineChoice::Callback(callback.clone());
        }
        match self.engine.to_ascii_lowercase().as_str() {
            "minijinja" => EngineChoice::MiniJinja,
            "html" => EngineChoice::Html,
            _ => EngineChoice::Unsupported(self.engine.clone()),
        }
    }
}

/// Identity of the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Instance identifier.
    pub id: String,
    /// Environment name; `"production"` enables caching.
    pub environment: String,
    /// Application root; relative view paths resolve against it.
    pub root: PathBuf,
    /// Application configuration, exposed to templates as `config`.
    pub config: Value,
}

impl AppInfo {
    /// Creates an identity for `name` in the `development` environment,
    /// rooted at the current directory.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            version: "0.0.0".to_string(),
            environment: "development".to_string(),
            root: PathBuf::from("."),
            config: Value::Object(Map::new()),
        }
    }

    /// Sets the version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the instance identifier.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the environment name.
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Sets the application root.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Returns true in the caching environment.
    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION
    }

    /// The values every template starts with.
    pub fn template_locals(&self) -> Map<String, Value> {
        let mut locals = Map::new();
        locals.insert("environment".to_string(), json!(self.environment));
        locals.insert("config".to_string(), self.config.clone());
        locals.insert(
            "app".to_string(),
            json!({ "name": self.name, "version": self.version, "id": self.id }),
        );
        locals
    }
}
