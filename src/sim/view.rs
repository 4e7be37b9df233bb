/// Observable state: everything a front-end needs to draw one frame.
///
/// `build_view` is a pure read of `WorldState`. Positions are screen
/// pixels relative to the camera; the renderer decides how pixels map to
/// terminal cells.

use crate::domain::entity::{EnemyKind, Facing, ItemKind, Owner, Weapon};
use crate::domain::rules::{self, BoatAction};
use crate::domain::tile::TileKind;
use super::world::{Phase, WorldState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileCell {
    pub kind: TileKind,
    pub tx: i32,
    pub ty: i32,
    pub sx: f32,
    pub sy: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpriteKind {
    Boat { repaired: bool },
    Item(ItemKind),
    Enemy { kind: EnemyKind, health: i32, max_health: i32 },
    Arrow { owner: Owner, heading: Facing },
    Player { facing: Facing, attacking: bool, on_boat: bool, weapon: Weapon },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub sx: f32,
    pub sy: f32,
    /// Off-phase of the invulnerability blink: skip drawing this frame.
    pub hidden: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hud {
    pub health: u32,
    pub max_health: u32,
    pub currency: u32,
    pub keys: u32,
    pub ammo: u32,
    pub weapon: Option<Weapon>,
    pub has_shield: bool,
    pub has_bomb: bool,
    /// Stocked items with counts, in a stable order.
    pub inventory: Vec<(ItemKind, u32)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameView {
    pub tile_size: f32,
    pub tiles: Vec<TileCell>,
    /// Draw order: boat, items, enemies, projectiles, player.
    pub sprites: Vec<Sprite>,
    pub hud: Hud,
    pub prompt: Option<&'static str>,
    pub phase: Phase,
    pub paused: bool,
    pub message: Option<String>,
}

pub fn boat_prompt(action: BoatAction) -> &'static str {
    match action {
        BoatAction::Repair => "PRESS E TO REPAIR BOAT",
        BoatAction::Board => "PRESS E TO BOARD BOAT",
        BoatAction::Disembark => "PRESS E TO DISEMBARK",
    }
}

/// Which way an arrow points, from its velocity.
fn heading(vx: f32, vy: f32) -> Facing {
    if vx.abs() >= vy.abs() {
        if vx < 0.0 { Facing::Left } else { Facing::Right }
    } else if vy < 0.0 {
        Facing::Up
    } else {
        Facing::Down
    }
}

pub fn build_view(world: &WorldState) -> FrameView {
    let cam = &world.camera;
    let ts = world.terrain.tile_size();

    // ── Tiles ──
    let tx0 = world.terrain.to_tile(cam.x).max(0);
    let ty0 = world.terrain.to_tile(cam.y).max(0);
    let tx1 = world.terrain.to_tile(cam.x + cam.view_w).min(world.terrain.width() as i32 - 1);
    let ty1 = world.terrain.to_tile(cam.y + cam.view_h).min(world.terrain.height() as i32 - 1);
    let mut tiles = Vec::new();
    for ty in ty0..=ty1 {
        for tx in tx0..=tx1 {
            if let Some(kind) = world.terrain.tile_at(tx, ty) {
                tiles.push(TileCell {
                    kind,
                    tx,
                    ty,
                    sx: tx as f32 * ts - cam.x,
                    sy: ty as f32 * ts - cam.y,
                });
            }
        }
    }

    // ── Sprites ──
    let visible = |x: f32, y: f32, size: f32| {
        x + size > cam.x && x < cam.x + cam.view_w && y + size > cam.y && y < cam.y + cam.view_h
    };
    let mut sprites = Vec::new();
    let mut push = |kind, x: f32, y: f32, size: f32, hidden: bool| {
        if visible(x, y, size) {
            sprites.push(Sprite { kind, sx: x - cam.x, sy: y - cam.y, hidden });
        }
    };

    let player = &world.player;
    if let Some(boat) = &world.boat {
        // A boarded boat is drawn under the player.
        push(SpriteKind::Boat { repaired: boat.repaired }, boat.pos.x, boat.pos.y, ts, false);
    }
    for (_, item) in world.entities.items.iter().filter(|(_, i)| !i.collected) {
        push(SpriteKind::Item(item.kind), item.pos.x, item.pos.y, ts, false);
    }
    for (_, e) in world.entities.enemies.iter() {
        let kind = SpriteKind::Enemy { kind: e.kind, health: e.health, max_health: e.max_health };
        push(kind, e.pos.x, e.pos.y, world.config.enemy_size, false);
    }
    for (_, p) in world.entities.projectiles.iter() {
        let kind = SpriteKind::Arrow { owner: p.owner, heading: heading(p.vel.x, p.vel.y) };
        push(kind, p.pos.x, p.pos.y, 1.0, false);
    }
    let blink_off = player.is_invulnerable() && (player.invulnerable_timer / 4) % 2 == 1;
    push(
        SpriteKind::Player {
            facing: player.facing,
            attacking: player.attacking,
            on_boat: player.on_boat,
            weapon: player.weapon(),
        },
        player.pos.x,
        player.pos.y,
        player.size,
        blink_off,
    );

    // ── HUD ──
    let hud = Hud {
        health: player.health,
        max_health: player.max_health,
        currency: player.currency,
        keys: player.keys(),
        ammo: player.ammo(),
        weapon: player.has_sword.then(|| player.weapon()),
        has_shield: player.has_shield,
        has_bomb: player.has_bomb,
        inventory: player
            .inventory
            .iter()
            .filter(|(k, _)| k.is_stocked())
            .map(|(k, n)| (*k, *n))
            .collect(),
    };

    // ── Prompt ──
    let prompt = world
        .boat
        .as_ref()
        .filter(|b| world.phase == Phase::Playing && rules::boat_in_reach(player, b, world.config.boat_range))
        .and_then(|b| rules::offered_boat_action(player, b))
        .map(boat_prompt);

    FrameView {
        tile_size: ts,
        tiles,
        sprites,
        hud,
        prompt,
        phase: world.phase,
        paused: world.paused,
        message: (!world.message.is_empty()).then(|| world.message.clone()),
    }
}
