//! Read-through cache for static view files.
//!
//! `.html`, `.htm` and `.txt` templates bypass the template engine and are
//! served verbatim. In caching mode each file is read once and kept for the
//! lifetime of the process; there is no invalidation.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

/// Path → contents cache for passthrough templates.
#[derive(Debug, Default)]
pub struct FileCache {
    enabled: bool,
    entries: RwLock<HashMap<PathBuf, String>>,
}

impl FileCache {
    /// Creates a cache. With `enabled == false` every read hits storage.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Whether reads are cached.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the contents of `path`.
    ///
    /// Read failures are returned as-is and never cached.
    pub async fn read(&self, path: &Path) -> io::Result<String> {
        if self.enabled {
            let hit = self.entries.read().get(path).cloned();
            if let Some(contents) = hit {
                tracing::trace!(path = %path.display(), "File cache hit");
                return Ok(contents);
            }
        }

        let contents = tokio::fs::read_to_string(path).await?;
        if self.enabled {
            self.entries
                .write()
                .insert(path.to_path_buf(), contents.clone());
        }
        Ok(contents)
    }
}
