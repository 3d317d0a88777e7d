//! Character kit override loader.

use std::path::Path;

use tracing::debug;

use crate::kits::{KitCatalog, KitOverride};
use crate::loaders::{LoadResult, read_file};

/// Loader for kit overrides from RON files.
pub struct KitLoader;

impl KitLoader {
    /// Load `Vec<KitOverride>` from a RON file and apply it to the built-in
    /// kits.
    ///
    /// Every resulting kit is validated; a malformed binding fails the whole
    /// load.
    pub fn load(path: &Path) -> LoadResult<KitCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<KitCatalog> {
        let overrides: Vec<KitOverride> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse kit RON: {}", e))?;
        let catalog = KitCatalog::with_overrides(&overrides)
            .map_err(|e| anyhow::anyhow!("Invalid kit override: {}", e))?;
        debug!(overrides = overrides.len(), "kit catalog loaded");
        Ok(catalog)
    }
}
