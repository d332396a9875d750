//! Content factory for loading session content from a data directory.

use std::path::{Path, PathBuf};

use runner_core::SessionConfig;

use crate::loaders::{LoadResult, SessionLoader, StageLoader, StageTable};

/// Content factory that loads all session content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── session.toml
/// └── stages.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load session configuration from `session.toml`.
    pub fn load_session(&self) -> LoadResult<SessionConfig> {
        SessionLoader::load(&self.data_dir.join("session.toml"))
    }

    /// Load the chapter stage table from `stages.ron`.
    pub fn load_stages(&self) -> LoadResult<StageTable> {
        StageLoader::load(&self.data_dir.join("stages.ron"))
    }

    /// Factory over the bundled data directory.
    ///
    /// Looks in this order:
    /// 1. `RUNNER_DATA_DIR` environment variable
    /// 2. Relative to the current executable (`../../crates/game/content/data`)
    /// 3. Relative to the current directory (`crates/game/content/data`)
    pub fn default_paths() -> Self {
        const BUNDLED: &str = "crates/game/content/data";

        let data_dir = if let Ok(env_dir) = std::env::var("RUNNER_DATA_DIR") {
            PathBuf::from(env_dir)
        } else {
            std::env::current_exe()
                .ok()
                .and_then(|exe| {
                    exe.ancestors()
                        .nth(3)
                        .map(|root| root.join(BUNDLED))
                        .filter(|dir| dir.is_dir())
                })
                .unwrap_or_else(|| PathBuf::from(BUNDLED))
        };

        Self::new(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
