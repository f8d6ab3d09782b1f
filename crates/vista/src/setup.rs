//! Startup helpers and their error type.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for setup operations.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Options could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The view directory could not be created.
    #[error("could not create view directory {}: {source}", .path.display())]
    ViewRoot {
        /// The directory that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl From<serde_yaml::Error> for SetupError {
    fn from(e: serde_yaml::Error) -> Self {
        SetupError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for SetupError {
    fn from(e: serde_json::Error) -> Self {
        SetupError::Config(e.to_string())
    }
}

/// Resolves the configured view path. Relative paths are joined to `app_root`.
pub fn view_root(app_root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        app_root.join(path)
    }
}

/// Creates the view directory if it does not exist yet.
///
/// Returns true if the directory was created.
pub fn ensure_view_root(path: &Path) -> Result<bool, SetupError> {
    if path.is_dir() {
        return Ok(false);
    }
    std::fs::create_dir_all(path).map_err(|source| SetupError::ViewRoot {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
