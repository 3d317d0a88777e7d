use std::f64::consts::FRAC_1_SQRT_2;

use crate::env::Walkability;
use crate::geometry::Vec2;

/// Terrain of one walkability tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerrainKind {
    #[default]
    Floor,
    Wall,
}

impl TerrainKind {
    pub fn is_passable(self) -> bool {
        matches!(self, TerrainKind::Floor)
    }
}

/// Rectangular tile map. Everything outside the grid counts as wall.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: f64,
    tiles: Vec<TerrainKind>,
}

impl TileGrid {
    /// An all-floor grid.
    pub fn new(width: u32, height: u32, tile_size: f64) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![TerrainKind::Floor; width as usize * height as usize],
        }
    }

    /// Builds a grid from text rows where `#` marks a wall.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], tile_size: f64) -> Self {
        let height = rows.len() as u32;
        let width = rows
            .iter()
            .map(|row| row.as_ref().chars().count())
            .max()
            .unwrap_or(0) as u32;
        let mut grid = Self::new(width, height, tile_size);
        for (ty, row) in rows.iter().enumerate() {
            for (tx, ch) in row.as_ref().chars().enumerate() {
                if ch == '#' {
                    grid.set(tx as u32, ty as u32, TerrainKind::Wall);
                }
            }
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// World-space extent of the grid.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(
            f64::from(self.width) * self.tile_size,
            f64::from(self.height) * self.tile_size,
        )
    }

    pub fn set(&mut self, tx: u32, ty: u32, terrain: TerrainKind) {
        if tx < self.width && ty < self.height {
            let idx = (ty * self.width + tx) as usize;
            self.tiles[idx] = terrain;
        }
    }

    pub fn terrain(&self, tx: i64, ty: i64) -> Option<TerrainKind> {
        if tx < 0 || ty < 0 || tx >= i64::from(self.width) || ty >= i64::from(self.height) {
            return None;
        }
        self.tiles
            .get((ty as u64 * u64::from(self.width) + tx as u64) as usize)
            .copied()
    }

    /// True when the world point lies on a passable tile.
    pub fn is_open_at(&self, point: Vec2) -> bool {
        if !point.is_finite() || !(self.tile_size > 0.0) {
            return false;
        }
        let tx = (point.x / self.tile_size).floor() as i64;
        let ty = (point.y / self.tile_size).floor() as i64;
        self.terrain(tx, ty).is_some_and(TerrainKind::is_passable)
    }
}

impl Walkability for TileGrid {
    /// Probes the centre and eight points on the rim of the disk.
    fn is_walkable(&self, point: Vec2, radius: f64) -> bool {
        let r = radius.max(0.0);
        let d = r * FRAC_1_SQRT_2;
        let probes = [
            Vec2::new(0.0, 0.0),
            Vec2::new(-r, 0.0),
            Vec2::new(r, 0.0),
            Vec2::new(0.0, -r),
            Vec2::new(0.0, r),
            Vec2::new(-d, -d),
            Vec2::new(d, -d),
            Vec2::new(-d, d),
            Vec2::new(d, d),
        ];
        probes
            .iter()
            .all(|offset| self.is_open_at(point + *offset))
    }
}
