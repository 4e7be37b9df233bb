/// TileWorld: the terrain grid.
///
/// Fixed dimensions at creation. Mutated only by the carving operations
/// below, which run during world generation and never during play.
/// Coordinates here are tile indices; pixel helpers divide by `tile_size`.
///
/// Out-of-bounds queries return `None`, which every caller treats as
/// blocking, so edge checks fail safe instead of panicking.

use rand::Rng;

use super::tile::TileKind;

/// Inclusive tile rectangle (used for the restricted boss region).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl TileRect {
    pub fn contains(&self, tx: i32, ty: i32) -> bool {
        tx >= self.x0 && tx <= self.x1 && ty >= self.y0 && ty <= self.y1
    }
}

/// How a tree grove picks its dense cells.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lattice {
    /// Dense where both offsets are multiples of `step` (scattered clumps).
    Points { step: i32 },
    /// Dense where either offset is a multiple of `step` (maze walls).
    Lines { step: i32 },
}

impl Lattice {
    fn is_dense(self, ox: i32, oy: i32) -> bool {
        match self {
            Lattice::Points { step } => ox % step == 0 && oy % step == 0,
            Lattice::Lines { step } => ox % step == 0 || oy % step == 0,
        }
    }
}

/// A rectangular tree-scatter region.
#[derive(Clone, Copy, Debug)]
pub struct Grove {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub lattice: Lattice,
    /// Tree probability on lattice cells.
    pub dense: f64,
    /// Tree probability elsewhere.
    pub sparse: f64,
}

#[derive(Clone, Debug)]
pub struct TileWorld {
    width: usize,
    height: usize,
    tile_size: f32,
    tiles: Vec<TileKind>,
}

// ── Queries ──

impl TileWorld {
    pub fn filled(width: usize, height: usize, tile_size: f32, kind: TileKind) -> Self {
        TileWorld { width, height, tile_size, tiles: vec![kind; width * height] }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn tile_size(&self) -> f32 { self.tile_size }

    /// World extent in pixels.
    pub fn pixel_size(&self) -> (f32, f32) {
        (self.width as f32 * self.tile_size, self.height as f32 * self.tile_size)
    }

    /// Terrain at a tile index. `None` outside the grid.
    #[inline]
    pub fn tile_at(&self, tx: i32, ty: i32) -> Option<TileKind> {
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
            return None;
        }
        Some(self.tiles[ty as usize * self.width + tx as usize])
    }

    /// Pixel coordinate → tile index (floor division, negative-safe).
    #[inline]
    pub fn to_tile(&self, px: f32) -> i32 {
        (px / self.tile_size).floor() as i32
    }

    /// Terrain under a pixel position.
    #[inline]
    pub fn tile_at_px(&self, px: f32, py: f32) -> Option<TileKind> {
        self.tile_at(self.to_tile(px), self.to_tile(py))
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|&&t| t == kind).count()
    }

    /// Build a grid from ASCII rows (see `TileKind::from_char`).
    #[cfg(test)]
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut world = TileWorld::filled(width, height, tile_size, TileKind::Grass);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                world.set(x as i32, y as i32, TileKind::from_char(ch));
            }
        }
        world
    }
}

// ── Generation ──

impl TileWorld {
    #[inline]
    fn set(&mut self, tx: i32, ty: i32, kind: TileKind) {
        if tx >= 0 && ty >= 0 && (tx as usize) < self.width && (ty as usize) < self.height {
            self.tiles[ty as usize * self.width + tx as usize] = kind;
        }
    }

    /// Fill a rectangle (clipped to the grid) with `kind`.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, kind: TileKind) {
        for ty in y..y + h {
            for tx in x..x + w {
                self.set(tx, ty, kind);
            }
        }
    }

    /// Raise a grass island. Clipped to the grid.
    pub fn carve_island(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.fill_rect(x, y, w, h, TileKind::Grass);
    }

    /// Lay a 3-wide bridge band between two points.
    ///
    /// Horizontal bridges run along `y1` from `min(x1,x2)` to `max(x1,x2)`;
    /// vertical ones run along `x1`. The band covers the centerline and one
    /// tile either side, inclusive of both endpoints.
    pub fn carve_bridge(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, horizontal: bool) {
        if horizontal {
            for x in x1.min(x2)..=x1.max(x2) {
                for dy in -1..=1 {
                    self.set(x, y1 + dy, TileKind::Bridge);
                }
            }
        } else {
            for y in y1.min(y2)..=y1.max(y2) {
                for dx in -1..=1 {
                    self.set(x1 + dx, y, TileKind::Bridge);
                }
            }
        }
    }

    /// Scatter trees over the grass of a grove, then clear its middle row
    /// and middle column so the region stays traversable.
    pub fn scatter_trees(&mut self, grove: &Grove, rng: &mut impl Rng) {
        for ty in grove.y..grove.y + grove.h {
            for tx in grove.x..grove.x + grove.w {
                if self.tile_at(tx, ty) != Some(TileKind::Grass) { continue; }
                let p = if grove.lattice.is_dense(tx - grove.x, ty - grove.y) {
                    grove.dense
                } else {
                    grove.sparse
                };
                if rng.random_bool(p.clamp(0.0, 1.0)) {
                    self.set(tx, ty, TileKind::Tree);
                }
            }
        }

        let mid_x = grove.x + grove.w / 2;
        let mid_y = grove.y + grove.h / 2;
        for tx in grove.x..grove.x + grove.w {
            if self.tile_at(tx, mid_y) == Some(TileKind::Tree) {
                self.set(tx, mid_y, TileKind::Grass);
            }
        }
        for ty in grove.y..grove.y + grove.h {
            if self.tile_at(mid_x, ty) == Some(TileKind::Tree) {
                self.set(mid_x, ty, TileKind::Grass);
            }
        }
    }

    /// Place a structure footprint (house, rock). Structures only sit on
    /// land: water tiles under the footprint are left alone.
    pub fn place_structure(&mut self, x: i32, y: i32, w: i32, h: i32, kind: TileKind) {
        for ty in y..y + h {
            for tx in x..x + w {
                match self.tile_at(tx, ty) {
                    Some(TileKind::Water) | None => {}
                    Some(_) => self.set(tx, ty, kind),
                }
            }
        }
    }

    /// Lay dock planks. Docks overwrite anything, including water,
    /// so they can stick out from a shore.
    pub fn carve_dock(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.fill_rect(x, y, w, h, TileKind::Dock);
    }

    /// Drop single rocks at random grass cells inside `[margin, dim - margin)`.
    pub fn scatter_rocks(&mut self, attempts: u32, margin: i32, chance: f64, rng: &mut impl Rng) {
        let (w, h) = (self.width as i32, self.height as i32);
        if w <= 2 * margin || h <= 2 * margin { return; }
        for _ in 0..attempts {
            let tx = rng.random_range(margin..w - margin);
            let ty = rng.random_range(margin..h - margin);
            if self.tile_at(tx, ty) == Some(TileKind::Grass) && rng.random_bool(chance.clamp(0.0, 1.0)) {
                self.set(tx, ty, TileKind::Rock);
            }
        }
    }

    /// Turn trees and rocks inside the rectangle back into grass.
    /// Houses, water and planks are kept.
    pub fn clear_obstacles(&mut self, x: i32, y: i32, w: i32, h: i32) {
        for ty in y..y + h {
            for tx in x..x + w {
                if matches!(self.tile_at(tx, ty), Some(TileKind::Tree | TileKind::Rock)) {
                    self.set(tx, ty, TileKind::Grass);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn water(w: usize, h: usize) -> TileWorld {
        TileWorld::filled(w, h, 16.0, TileKind::Water)
    }

    #[test]
    fn out_of_bounds_is_none() {
        let world = water(4, 3);
        assert_eq!(world.tile_at(-1, 0), None);
        assert_eq!(world.tile_at(0, -1), None);
        assert_eq!(world.tile_at(4, 0), None);
        assert_eq!(world.tile_at(0, 3), None);
        assert_eq!(world.tile_at(3, 2), Some(TileKind::Water));
    }

    #[test]
    fn pixel_lookup_floors() {
        let world = TileWorld::from_rows(&["~.", ".."], 16.0);
        assert_eq!(world.tile_at_px(15.9, 15.9), Some(TileKind::Water));
        assert_eq!(world.tile_at_px(16.0, 0.0), Some(TileKind::Grass));
        assert_eq!(world.tile_at_px(-0.1, 0.0), None);
    }

    #[test]
    fn island_is_clipped_to_grid() {
        let mut world = water(5, 5);
        world.carve_island(3, 3, 10, 10);
        assert_eq!(world.count(TileKind::Grass), 4);
        assert_eq!(world.tile_at(4, 4), Some(TileKind::Grass));
    }

    #[test]
    fn horizontal_bridge_is_three_wide() {
        let mut world = water(10, 7);
        world.carve_bridge(7, 3, 2, 5, true);
        for x in 2..=7 {
            for y in 2..=4 {
                assert_eq!(world.tile_at(x, y), Some(TileKind::Bridge), "({x},{y})");
            }
        }
        assert_eq!(world.tile_at(1, 3), Some(TileKind::Water));
        assert_eq!(world.tile_at(8, 3), Some(TileKind::Water));
        assert_eq!(world.tile_at(4, 5), Some(TileKind::Water));
        assert_eq!(world.count(TileKind::Bridge), 18);
    }

    #[test]
    fn vertical_bridge_is_three_wide() {
        let mut world = water(5, 8);
        world.carve_bridge(2, 1, 2, 6, false);
        for y in 1..=6 {
            for x in 1..=3 {
                assert_eq!(world.tile_at(x, y), Some(TileKind::Bridge));
            }
        }
        assert_eq!(world.tile_at(2, 0), Some(TileKind::Water));
        assert_eq!(world.tile_at(2, 7), Some(TileKind::Water));
    }

    #[test]
    fn bridge_at_edge_does_not_panic() {
        let mut world = water(3, 3);
        world.carve_bridge(0, 0, 2, 0, true);
        assert_eq!(world.count(TileKind::Bridge), 6);
    }

    #[test]
    fn scatter_keeps_midlines_clear() {
        let mut world = water(20, 20);
        world.carve_island(0, 0, 20, 20);
        let grove = Grove {
            x: 2, y: 3, w: 15, h: 11,
            lattice: Lattice::Points { step: 3 },
            dense: 1.0, sparse: 1.0,
        };
        let mut rng = Pcg32::seed_from_u64(7);
        world.scatter_trees(&grove, &mut rng);

        let mid_x = 2 + 15 / 2;
        let mid_y = 3 + 11 / 2;
        for x in 2..17 {
            assert_eq!(world.tile_at(x, mid_y), Some(TileKind::Grass));
        }
        for y in 3..14 {
            assert_eq!(world.tile_at(mid_x, y), Some(TileKind::Grass));
        }
        // Everything else in the grove became a tree.
        assert_eq!(world.tile_at(2, 3), Some(TileKind::Tree));
        // Outside the grove untouched.
        assert_eq!(world.tile_at(0, 0), Some(TileKind::Grass));
    }

    #[test]
    fn scatter_only_touches_grass() {
        let mut world = TileWorld::from_rows(&[
            "~~~~",
            "~..~",
            "~==~",
        ], 16.0);
        let grove = Grove {
            x: 0, y: 0, w: 4, h: 3,
            lattice: Lattice::Lines { step: 4 },
            dense: 1.0, sparse: 1.0,
        };
        world.scatter_trees(&grove, &mut Pcg32::seed_from_u64(1));
        assert_eq!(world.count(TileKind::Water), 8);
        assert_eq!(world.count(TileKind::Bridge), 2);
    }

    #[test]
    fn zero_probability_grove_plants_nothing() {
        let mut world = TileWorld::filled(8, 8, 16.0, TileKind::Grass);
        let grove = Grove {
            x: 0, y: 0, w: 8, h: 8,
            lattice: Lattice::Lines { step: 4 },
            dense: 0.0, sparse: 0.0,
        };
        world.scatter_trees(&grove, &mut Pcg32::seed_from_u64(3));
        assert_eq!(world.count(TileKind::Tree), 0);
    }

    #[test]
    fn lattice_shapes() {
        assert!(Lattice::Points { step: 3 }.is_dense(3, 6));
        assert!(!Lattice::Points { step: 3 }.is_dense(3, 1));
        assert!(Lattice::Lines { step: 4 }.is_dense(4, 1));
        assert!(!Lattice::Lines { step: 4 }.is_dense(1, 2));
    }

    #[test]
    fn structure_skips_water() {
        let mut world = TileWorld::from_rows(&["..", ".~"], 16.0);
        world.place_structure(0, 0, 2, 2, TileKind::House);
        assert_eq!(world.count(TileKind::House), 3);
        assert_eq!(world.tile_at(1, 1), Some(TileKind::Water));
    }

    #[test]
    fn dock_overwrites_water() {
        let mut world = water(6, 6);
        world.carve_dock(1, 2, 3, 2);
        assert_eq!(world.count(TileKind::Dock), 6);
        assert_eq!(world.tile_at(3, 3), Some(TileKind::Dock));
    }

    #[test]
    fn rocks_land_only_on_grass_inside_margin() {
        let mut world = TileWorld::filled(20, 20, 16.0, TileKind::Grass);
        world.scatter_rocks(200, 5, 1.0, &mut Pcg32::seed_from_u64(9));
        assert!(world.count(TileKind::Rock) > 0);
        for y in 0..20 {
            for x in 0..20 {
                if world.tile_at(x, y) == Some(TileKind::Rock) {
                    assert!((5..15).contains(&x) && (5..15).contains(&y));
                }
            }
        }
    }

    #[test]
    fn clearing_keeps_structures() {
        let mut world = TileWorld::from_rows(&["To", "H~"], 16.0);
        world.clear_obstacles(0, 0, 2, 2);
        assert_eq!(world.count(TileKind::Grass), 2);
        assert_eq!(world.tile_at(0, 1), Some(TileKind::House));
        assert_eq!(world.tile_at(1, 1), Some(TileKind::Water));
    }

    #[test]
    fn rect_is_inclusive() {
        let r = TileRect { x0: 170, y0: 10, x1: 185, y1: 20 };
        assert!(r.contains(170, 10));
        assert!(r.contains(185, 20));
        assert!(!r.contains(186, 20));
        assert!(!r.contains(170, 9));
    }
}
