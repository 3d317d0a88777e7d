//! Arena map loader.
//!
//! Loads the walkability grid and spawn points from map RON files.

use std::path::Path;

use arena_core::{TerrainKind, TileGrid, Vec2};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Map data structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapDataRon {
    dimensions: (u32, u32),
    #[serde(default = "default_tile_size")]
    tile_size: f64,
    #[serde(default)]
    tiles: Vec<(u32, u32, TerrainKind)>, // (x, y, terrain)
    /// Fills the outermost ring of tiles with walls.
    #[serde(default)]
    walled: bool,
    spawns: Vec<(f64, f64)>,
}

fn default_tile_size() -> f64 {
    arena_core::CombatConfig::DEFAULT_TILE_SIZE
}

/// A loaded arena: terrain plus the points new actors appear at.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaMap {
    pub grid: TileGrid,
    pub spawns: Vec<Vec2>,
}

impl ArenaMap {
    /// Spawn point for the `index`-th member, cycling through the list.
    pub fn spawn_point(&self, index: usize) -> Option<Vec2> {
        if self.spawns.is_empty() {
            return None;
        }
        self.spawns.get(index % self.spawns.len()).copied()
    }
}

/// Loader for arena maps from RON files.
pub struct MapLoader;

impl MapLoader {
    /// Load a map from a RON file.
    ///
    /// Tiles default to floor; listed tiles override them. Every spawn point
    /// must lie on a floor tile.
    pub fn load(path: &Path) -> LoadResult<ArenaMap> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<ArenaMap> {
        let data: MapDataRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse map RON: {}", e))?;

        let (width, height) = data.dimensions;
        if width == 0 || height == 0 {
            anyhow::bail!("Map dimensions must be non-zero, got {}x{}", width, height);
        }
        if !(data.tile_size > 0.0) {
            anyhow::bail!("Map tile size must be positive, got {}", data.tile_size);
        }

        let mut grid = TileGrid::new(width, height, data.tile_size);
        if data.walled {
            for x in 0..width {
                grid.set(x, 0, TerrainKind::Wall);
                grid.set(x, height - 1, TerrainKind::Wall);
            }
            for y in 0..height {
                grid.set(0, y, TerrainKind::Wall);
                grid.set(width - 1, y, TerrainKind::Wall);
            }
        }
        for (x, y, terrain) in data.tiles {
            if x >= width || y >= height {
                anyhow::bail!("Tile ({}, {}) lies outside the {}x{} map", x, y, width, height);
            }
            grid.set(x, y, terrain);
        }

        let spawns: Vec<Vec2> = data
            .spawns
            .into_iter()
            .map(|(x, y)| Vec2::new(x, y))
            .collect();
        if spawns.is_empty() {
            anyhow::bail!("Map defines no spawn points");
        }
        if let Some(blocked) = spawns.iter().find(|p| !grid.is_open_at(**p)) {
            anyhow::bail!("Spawn point ({}, {}) is not on a floor tile", blocked.x, blocked.y);
        }

        Ok(ArenaMap { grid, spawns })
    }
}

#[cfg(test)]
mod tests {
    use arena_core::Walkability;

    use super::*;

    const ARENA: &str = r#"(
        dimensions: (10, 8),
        walled: true,
        tiles: [(5, 3, Wall), (5, 4, Wall)],
        spawns: [(40.0, 40.0), (120.0, 40.0)],
    )"#;

    #[test]
    fn walled_map_with_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.ron");
        std::fs::write(&path, ARENA).unwrap();

        let map = MapLoader::load(&path).unwrap();
        assert_eq!(map.grid.width(), 10);
        assert_eq!(map.grid.tile_size(), 16.0);
        assert_eq!(map.grid.terrain(0, 0), Some(TerrainKind::Wall));
        assert_eq!(map.grid.terrain(5, 3), Some(TerrainKind::Wall));
        assert_eq!(map.grid.terrain(2, 2), Some(TerrainKind::Floor));
        assert!(map.grid.is_walkable(Vec2::new(40.0, 40.0), 6.0));
        assert_eq!(map.spawn_point(3), Some(Vec2::new(120.0, 40.0)));
    }

    #[test]
    fn spawn_on_wall_is_rejected() {
        let err = MapLoader::parse("(dimensions: (4, 4), walled: true, spawns: [(8.0, 8.0)])")
            .unwrap_err();
        assert!(err.to_string().contains("not on a floor tile"));
    }

    #[test]
    fn out_of_range_tile_is_rejected() {
        let map = "(dimensions: (4, 4), tiles: [(9, 0, Wall)], spawns: [(8.0, 8.0)])";
        assert!(MapLoader::parse(map).is_err());
    }
}
