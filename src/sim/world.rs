/// WorldState: the complete snapshot of a running game.
///
/// ## Layers
///
///   - `terrain`   : the carved tile grid. Immutable after generation.
///   - `entities`  : enemies, items and projectiles in id-stable arenas.
///   - `player`, `boat`: singletons.
///
/// ## Camera / Viewport
///
/// World and screen coordinates are separate:
///   - `camera` holds the top-left world pixel of the viewport and its
///     size in pixels (set by the renderer from the terminal size).
///   - The camera centers on the player and is clamped to the world, so
///     it never shows anything outside `[0, world]`.

use rand_pcg::Pcg32;

use crate::config::SimConfig;
use crate::domain::entity::{Boat, Player};
use crate::domain::tilemap::{TileRect, TileWorld};
use super::arena::Entities;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
    Won,
}

/// Camera: a viewport into the world, in pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub view_w: f32,
    pub view_h: f32,
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    /// Top-left of a `view`-sized window centered on `target`, clamped so
    /// it stays inside the world. Worlds smaller than the view pin to 0.
    pub fn centered(target: (f32, f32), view: (f32, f32), world: (f32, f32)) -> (f32, f32) {
        let x = (target.0 - view.0 / 2.0).min(world.0 - view.0).max(0.0);
        let y = (target.1 - view.1 / 2.0).min(world.1 - view.1).max(0.0);
        (x, y)
    }

    pub fn follow(&mut self, target_x: f32, target_y: f32, world_w: f32, world_h: f32) {
        let (x, y) = Camera::centered(
            (target_x, target_y),
            (self.view_w, self.view_h),
            (world_w, world_h),
        );
        self.x = x;
        self.y = y;
    }

    pub fn set_viewport(&mut self, view_w: f32, view_h: f32) {
        self.view_w = view_w;
        self.view_h = view_h;
    }
}

pub struct WorldState {
    // ── Terrain ──
    pub terrain: TileWorld,
    /// Tile region a land-walking player may not enter (the boss island).
    pub restricted: Option<TileRect>,

    // ── Entities ──
    pub entities: Entities,
    pub player: Player,
    /// Absent on maps without water travel.
    pub boat: Option<Boat>,

    // ── Config / randomness ──
    pub config: SimConfig,
    pub rng: Pcg32,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,
    pub tick: u64,
    pub level_name: &'static str,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,

    // ── Camera / Viewport ──
    pub camera: Camera,
}

impl WorldState {
    pub fn new(
        terrain: TileWorld,
        player: Player,
        config: SimConfig,
        rng: Pcg32,
        level_name: &'static str,
    ) -> Self {
        WorldState {
            terrain,
            restricted: None,
            entities: Entities::default(),
            player,
            boat: None,
            config,
            rng,
            phase: Phase::Playing,
            paused: false,
            tick: 0,
            level_name,
            message: String::new(),
            message_timer: 0,
            camera: Camera::new(),
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }

    /// Re-center the camera on the player's position.
    pub fn follow_player(&mut self) {
        let (w, h) = self.terrain.pixel_size();
        self.camera.follow(self.player.pos.x, self.player.pos.y, w, h);
    }
}
