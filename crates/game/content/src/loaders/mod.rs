//! Content loaders for reading session data from files.

pub mod factory;
pub mod session;
pub mod stages;

pub use factory::ContentFactory;
pub use session::SessionLoader;
pub use stages::{StageLoader, StageTable};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
