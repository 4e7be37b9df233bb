/// Movement and collision against the tile grid.
///
/// Everything here is a pure function of (terrain, position, delta):
/// the step loop feeds results back into the entities.
///
/// Corner test: an axis-aligned box of side `size` at `pos` occupies the
/// pixels `pos .. pos + size - 1`. The box is blocked if any of its four
/// corner pixels lies outside the grid or on a tile that blocks its class.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec2;

use super::tile::MoveClass;
use super::tilemap::{TileRect, TileWorld};

/// The four corner pixels of a box.
#[inline]
pub fn corners(pos: Vec2, size: f32) -> [Vec2; 4] {
    let far = size - 1.0;
    [
        pos,
        Vec2::new(pos.x + far, pos.y),
        Vec2::new(pos.x, pos.y + far),
        Vec2::new(pos.x + far, pos.y + far),
    ]
}

/// Would a box of `size` at `pos` overlap anything blocking for `class`?
pub fn is_blocked(world: &TileWorld, pos: Vec2, size: f32, class: MoveClass) -> bool {
    corners(pos, size).iter().any(|c| match world.tile_at_px(c.x, c.y) {
        Some(t) => t.blocks(class),
        None => true,
    })
}

/// Turn a raw input axis into a velocity. Diagonals are scaled by 1/√2
/// on both axes so the speed is the same in every direction.
pub fn input_velocity(dx: f32, dy: f32, speed: f32) -> Vec2 {
    let v = Vec2::new(dx, dy) * speed;
    if dx != 0.0 && dy != 0.0 { v * FRAC_1_SQRT_2 } else { v }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// Inputs the player resolver needs besides terrain.
#[derive(Clone, Copy, Debug)]
pub struct PlayerBody<'a> {
    pub size: f32,
    pub on_boat: bool,
    /// Region a player on foot may never enter.
    pub restricted: Option<&'a TileRect>,
}

impl PlayerBody<'_> {
    fn class(&self) -> MoveClass {
        if self.on_boat { MoveClass::Water } else { MoveClass::Land }
    }

    fn gate_allows(&self, world: &TileWorld, pos: Vec2) -> bool {
        if self.on_boat { return true; }
        match self.restricted {
            Some(r) => !r.contains(world.to_tile(pos.x), world.to_tile(pos.y)),
            None => true,
        }
    }
}

/// Per-axis resolution: X first, then Y. Each axis is accepted on its own
/// if the corner test passes, then reverted if it would put a player on
/// foot inside the restricted region.
pub fn slide_player(world: &TileWorld, body: &PlayerBody, pos: Vec2, delta: Vec2) -> Vec2 {
    let class = body.class();
    let mut p = pos;

    if delta.x != 0.0 {
        let cand = Vec2::new(p.x + delta.x, p.y);
        if !is_blocked(world, cand, body.size, class) && body.gate_allows(world, cand) {
            p = cand;
        }
    }
    if delta.y != 0.0 {
        let cand = Vec2::new(p.x, p.y + delta.y);
        if !is_blocked(world, cand, body.size, class) && body.gate_allows(world, cand) {
            p = cand;
        }
    }
    p
}

/// Hard clamp to `[tile, world - 2 * tile]` on both axes.
/// Applied after collision regardless of its result.
pub fn clamp_to_world(world: &TileWorld, pos: Vec2) -> Vec2 {
    let ts = world.tile_size();
    let (w, h) = world.pixel_size();
    Vec2::new(
        pos.x.min(w - 2.0 * ts).max(ts),
        pos.y.min(h - 2.0 * ts).max(ts),
    )
}

/// Full player move: slide, then clamp.
pub fn resolve_player_move(world: &TileWorld, body: &PlayerBody, pos: Vec2, delta: Vec2) -> Vec2 {
    clamp_to_world(world, slide_player(world, body, pos, delta))
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Enemy step: full vector, else (with `slide`) X only, else Y only.
/// Enemies only respect water; forests and houses do not stop them.
pub fn resolve_enemy_step(world: &TileWorld, pos: Vec2, size: f32, delta: Vec2, slide: bool) -> Vec2 {
    let class = MoveClass::Roamer;
    let full = pos + delta;
    if !is_blocked(world, full, size, class) {
        return full;
    }
    if !slide {
        return pos;
    }
    let x_only = Vec2::new(pos.x + delta.x, pos.y);
    if !is_blocked(world, x_only, size, class) {
        return x_only;
    }
    let y_only = Vec2::new(pos.x, pos.y + delta.y);
    if !is_blocked(world, y_only, size, class) {
        return y_only;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileKind;
    use proptest::prelude::*;

    const TS: f32 = 16.0;

    fn world_from(rows: &[&str]) -> TileWorld {
        TileWorld::from_rows(rows, TS)
    }

    fn on_foot() -> PlayerBody<'static> {
        PlayerBody { size: 16.0, on_boat: false, restricted: None }
    }

    fn at(tx: f32, ty: f32) -> Vec2 {
        Vec2::new(tx * TS, ty * TS)
    }

    // ── corner test ──

    #[test]
    fn box_flush_with_tile_fits() {
        let w = world_from(&["...", ".T.", "..."]);
        assert!(!is_blocked(&w, at(0.0, 0.0), 16.0, MoveClass::Land));
        // One pixel to the right touches the tree column.
        assert!(is_blocked(&w, Vec2::new(1.0, 16.0), 16.0, MoveClass::Land));
    }

    #[test]
    fn outside_grid_blocks_everyone() {
        let w = world_from(&["..", ".."]);
        for class in [MoveClass::Land, MoveClass::Water, MoveClass::Roamer] {
            assert!(is_blocked(&w, Vec2::new(-1.0, 0.0), 16.0, class));
            assert!(is_blocked(&w, Vec2::new(17.0, 0.0), 16.0, class));
        }
    }

    #[test]
    fn boat_floats_on_water_and_docks() {
        let w = world_from(&["~~D.", "~~D."]);
        assert!(!is_blocked(&w, at(0.0, 0.0), 16.0, MoveClass::Water));
        assert!(!is_blocked(&w, at(2.0, 0.0), 16.0, MoveClass::Water));
        assert!(is_blocked(&w, at(3.0, 0.0), 16.0, MoveClass::Water));
        assert!(is_blocked(&w, at(0.0, 0.0), 16.0, MoveClass::Land));
    }

    // ── diagonal ──

    #[test]
    fn diagonal_is_scaled() {
        let v = input_velocity(1.0, -1.0, 6.0);
        assert!((v.x - 6.0 * FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((v.y + 6.0 * FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(input_velocity(0.0, 1.0, 6.0), Vec2::new(0.0, 6.0));
        assert_eq!(input_velocity(0.0, 0.0, 6.0), Vec2::ZERO);
    }

    // ── player slide ──

    #[test]
    fn player_slides_along_wall() {
        let w = world_from(&[
            "......",
            "......",
            "TTTTTT",
        ]);
        // Pressing down-right against a tree row: X moves, Y is refused.
        let p = slide_player(&w, &on_foot(), at(1.0, 1.0), Vec2::new(4.0, 4.0));
        assert_eq!(p, Vec2::new(20.0, 16.0));
    }

    #[test]
    fn player_blocked_by_water_on_foot() {
        let w = world_from(&["..~", "..~"]);
        let p = slide_player(&w, &on_foot(), at(1.0, 0.0), Vec2::new(6.0, 0.0));
        assert_eq!(p, at(1.0, 0.0));
    }

    #[test]
    fn gate_reverts_each_axis() {
        let w = TileWorld::filled(20, 20, TS, TileKind::Grass);
        let gate = TileRect { x0: 10, y0: 0, x1: 19, y1: 19 };
        let body = PlayerBody { size: 16.0, on_boat: false, restricted: Some(&gate) };
        // X would enter tile 10: reverted. Y alone is fine.
        let start = Vec2::new(9.0 * TS + 10.0, 5.0 * TS);
        let p = slide_player(&w, &body, start, Vec2::new(6.0, 6.0));
        assert_eq!(p, Vec2::new(start.x, start.y + 6.0));
    }

    #[test]
    fn gate_opens_on_boat() {
        let w = TileWorld::filled(20, 20, TS, TileKind::Water);
        let gate = TileRect { x0: 10, y0: 0, x1: 19, y1: 19 };
        let body = PlayerBody { size: 16.0, on_boat: true, restricted: Some(&gate) };
        let start = Vec2::new(9.0 * TS + 10.0, 5.0 * TS);
        let p = slide_player(&w, &body, start, Vec2::new(6.0, 0.0));
        assert_eq!(world_tile(&w, p), (10, 5));
    }

    fn world_tile(w: &TileWorld, p: Vec2) -> (i32, i32) {
        (w.to_tile(p.x), w.to_tile(p.y))
    }

    #[test]
    fn clamp_keeps_one_tile_margin() {
        let w = TileWorld::filled(10, 10, TS, TileKind::Grass);
        assert_eq!(clamp_to_world(&w, Vec2::new(0.0, 500.0)), Vec2::new(16.0, 128.0));
        assert_eq!(clamp_to_world(&w, Vec2::new(50.0, 60.0)), Vec2::new(50.0, 60.0));
    }

    // ── enemy step ──

    #[test]
    fn enemy_walks_through_trees() {
        let w = world_from(&["TTTT", "TTTT"]);
        let p = resolve_enemy_step(&w, Vec2::ZERO, 16.0, Vec2::new(3.0, 2.0), true);
        assert_eq!(p, Vec2::new(3.0, 2.0));
    }

    #[test]
    fn enemy_falls_back_to_single_axis() {
        let w = world_from(&[
            "....",
            "....",
            "~~~~",
        ]);
        // Diagonal dips into water; X-only works.
        let p = resolve_enemy_step(&w, at(1.0, 1.0), 16.0, Vec2::new(2.0, 2.0), true);
        assert_eq!(p, Vec2::new(18.0, 16.0));
        // Without sliding, the step is refused outright.
        let p = resolve_enemy_step(&w, at(1.0, 1.0), 16.0, Vec2::new(2.0, 2.0), false);
        assert_eq!(p, at(1.0, 1.0));
    }

    #[test]
    fn enemy_y_only_when_x_blocked() {
        let w = world_from(&[
            "..~",
            "..~",
            "..~",
        ]);
        let p = resolve_enemy_step(&w, at(1.0, 0.0), 16.0, Vec2::new(3.0, 3.0), true);
        assert_eq!(p, Vec2::new(16.0, 3.0));
    }

    // ── properties ──

    fn arb_world() -> impl Strategy<Value = TileWorld> {
        prop::collection::vec(
            prop::sample::select(vec!['.', '.', '.', '~', 'T', 'H', 'o', '=', 'D']),
            12 * 12,
        )
        .prop_map(|cells| {
            let rows: Vec<String> = cells.chunks(12).map(|c| c.iter().collect()).collect();
            let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
            let mut w = TileWorld::from_rows(&refs, TS);
            // Guarantee a legal start tile.
            w.carve_island(5, 5, 1, 1);
            w
        })
    }

    proptest! {
        #[test]
        fn land_player_never_overlaps_blocking(
            world in arb_world(),
            deltas in prop::collection::vec((-8.0f32..8.0, -8.0f32..8.0), 1..60),
        ) {
            let body = on_foot();
            let mut p = at(5.0, 5.0);
            for (dx, dy) in deltas {
                p = slide_player(&world, &body, p, Vec2::new(dx, dy));
                for c in corners(p, body.size) {
                    let t = world.tile_at_px(c.x, c.y);
                    prop_assert!(t.is_some());
                    prop_assert!(!t.unwrap().blocks_land(), "corner on {:?}", t);
                }
            }
        }

        #[test]
        fn speed_is_direction_invariant(
            speed in 0.5f32..20.0,
            dx in prop::sample::select(vec![-1.0f32, 0.0, 1.0]),
            dy in prop::sample::select(vec![-1.0f32, 0.0, 1.0]),
        ) {
            prop_assume!(dx != 0.0 || dy != 0.0);
            let v = input_velocity(dx, dy, speed);
            prop_assert!((v.length() - speed).abs() < 1e-4);
        }

        #[test]
        fn restricted_region_unreachable_on_foot(
            deltas in prop::collection::vec((-9.0f32..9.0, -9.0f32..9.0), 1..200),
        ) {
            let world = TileWorld::filled(30, 30, TS, TileKind::Grass);
            let gate = TileRect { x0: 12, y0: 12, x1: 17, y1: 17 };
            let body = PlayerBody { size: 16.0, on_boat: false, restricted: Some(&gate) };
            let mut p = at(3.0, 3.0);
            for (dx, dy) in deltas {
                p = resolve_player_move(&world, &body, p, Vec2::new(dx, dy));
                prop_assert!(!gate.contains(world.to_tile(p.x), world.to_tile(p.y)));
            }
        }
    }
}
