//! Session configuration loader.

use std::path::Path;

use runner_core::SessionConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for session configuration from TOML files.
pub struct SessionLoader;

impl SessionLoader {
    /// Load and validate a [`SessionConfig`] from a TOML file.
    ///
    /// Missing keys fall back to [`SessionConfig::default`]. Arbitrary-precision
    /// stats may be written as strings (`"1.5e30"`) or plain numbers.
    pub fn load(path: &Path) -> LoadResult<SessionConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SessionConfig> {
        let config: SessionConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse session TOML: {}", e))?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid session config: {}", e))?;

        Ok(config)
    }
}
