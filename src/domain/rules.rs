/// Progression rules: item pickup effects and the boat state machine.
///
/// Boat:  Unrepaired ──(material)──▶ Repaired ──(board)──▶ Boarded
///                                       ▲                    │
///                                       └────(disembark)─────┘
///
/// Treasure that requires a key ends the game when touched with a key in
/// hand; without one it stays where it is.

use glam::Vec2;

use super::entity::{Boat, Item, ItemKind, Player};
use super::tile::TileKind;
use super::tilemap::TileWorld;

// ══════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PickupOutcome {
    Collected(ItemKind),
    /// Key-gated treasure touched without a key.
    Locked,
    /// Key-gated treasure opened.
    Won,
}

/// Apply an item's effect to the player and mark it collected.
/// Returns `None` for items already collected, so effects apply once.
pub fn try_pickup(player: &mut Player, item: &mut Item, currency_value: u32) -> Option<PickupOutcome> {
    if item.collected { return None; }

    if item.requires_key {
        if !player.take_item(ItemKind::Key) {
            return Some(PickupOutcome::Locked);
        }
        item.collected = true;
        return Some(PickupOutcome::Won);
    }

    item.collected = true;
    match item.kind {
        ItemKind::Currency => player.currency += currency_value,
        ItemKind::Heart => player.heal(1),
        ItemKind::Bomb => player.has_bomb = true,
        ItemKind::Weapon => {
            player.has_crossbow = true;
            player.add_item(ItemKind::Weapon);
        }
        ItemKind::Key | ItemKind::Material | ItemKind::Ammo => player.add_item(item.kind),
        ItemKind::Treasure => {}
    }
    Some(PickupOutcome::Collected(item.kind))
}

// ══════════════════════════════════════════════════════════════
// Boat
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoatState {
    Unrepaired,
    Repaired,
    Boarded,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoatAction {
    Repair,
    Board,
    Disembark,
}

pub fn boat_state(player: &Player, boat: &Boat) -> BoatState {
    if player.on_boat {
        BoatState::Boarded
    } else if boat.repaired {
        BoatState::Repaired
    } else {
        BoatState::Unrepaired
    }
}

pub fn boat_in_reach(player: &Player, boat: &Boat, range: f32) -> bool {
    player.pos.distance_squared(boat.pos) < range * range
}

/// What pressing interact next to the boat would attempt, if anything.
/// Used for the on-screen prompt; terrain is not consulted.
pub fn offered_boat_action(player: &Player, boat: &Boat) -> Option<BoatAction> {
    match boat_state(player, boat) {
        BoatState::Unrepaired => player.has_material().then_some(BoatAction::Repair),
        BoatState::Repaired => Some(BoatAction::Board),
        BoatState::Boarded => Some(BoatAction::Disembark),
    }
}

/// Run one boat interaction. The caller checks reach.
/// Returns the transition taken, or `None` if nothing changed.
pub fn interact_with_boat(
    player: &mut Player,
    boat: &mut Boat,
    world: &TileWorld,
    dock_radius: i32,
) -> Option<BoatAction> {
    match boat_state(player, boat) {
        BoatState::Unrepaired => {
            if !player.take_item(ItemKind::Material) { return None; }
            boat.repaired = true;
            Some(BoatAction::Repair)
        }
        BoatState::Repaired => {
            player.on_boat = true;
            player.pos = boat.pos;
            Some(BoatAction::Board)
        }
        BoatState::Boarded => {
            let underfoot = world.tile_at_px(player.pos.x, player.pos.y);
            if !underfoot.is_some_and(TileKind::is_landing) { return None; }
            player.on_boat = false;
            if let Some(dock) = nearest_dock(world, boat.pos, dock_radius) {
                boat.pos = dock;
            }
            Some(BoatAction::Disembark)
        }
    }
}

/// Pixel position of the closest dock tile within `radius` tiles
/// (Chebyshev window) of `from`. Ties go to the first in row-major order.
pub fn nearest_dock(world: &TileWorld, from: Vec2, radius: i32) -> Option<Vec2> {
    let cx = world.to_tile(from.x);
    let cy = world.to_tile(from.y);
    let ts = world.tile_size();

    let mut best: Option<(i32, i32, i32)> = None;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if world.tile_at(cx + dx, cy + dy) != Some(TileKind::Dock) { continue; }
            let d2 = dx * dx + dy * dy;
            if best.map_or(true, |(b, _, _)| d2 < b) {
                best = Some((d2, cx + dx, cy + dy));
            }
        }
    }
    best.map(|(_, tx, ty)| Vec2::new(tx as f32 * ts, ty as f32 * ts))
}
