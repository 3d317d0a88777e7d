//! Content factory for loading a whole data directory.

use std::path::{Path, PathBuf};

use arena_core::CombatConfig;
use tracing::info;

use crate::kits::KitCatalog;
use crate::loaders::{ArenaMap, ConfigLoader, KitLoader, LoadResult, MapLoader};

/// Content factory that loads arena content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── kits.ron
/// └── maps/
///     └── arena.ron
/// ```
///
/// `config.toml` and `kits.ron` are optional; built-in values are used when
/// they are absent.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load combat configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            info!(path = %path.display(), "no combat config, using defaults");
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load the kit catalog from `kits.ron`.
    pub fn load_kits(&self) -> LoadResult<KitCatalog> {
        let path = self.data_dir.join("kits.ron");
        if !path.exists() {
            info!(path = %path.display(), "no kit overrides, using built-in kits");
            return Ok(KitCatalog::builtin());
        }
        KitLoader::load(&path)
    }

    /// Load a map from `maps/{map_name}.ron`.
    pub fn load_map(&self, map_name: &str) -> LoadResult<ArenaMap> {
        let path = self.data_dir.join("maps").join(format!("{}.ron", map_name));
        MapLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn optional_files_fall_back_to_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap(), CombatConfig::default());
        assert_eq!(factory.load_kits().unwrap(), KitCatalog::builtin());
        assert!(factory.load_map("arena").is_err());
    }

    #[test]
    fn loads_a_full_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "tick_hz = 30\n").unwrap();
        std::fs::create_dir(dir.path().join("maps")).unwrap();
        std::fs::write(
            dir.path().join("maps").join("arena.ron"),
            "(dimensions: (20, 20), walled: true, spawns: [(48.0, 48.0)])",
        )
        .unwrap();

        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.load_config().unwrap().tick_hz, 30);
        assert_eq!(factory.load_map("arena").unwrap().spawns.len(), 1);
    }
}
