/// The step function: advances the world by one frame.
///
/// Processing order:
///   1. Player movement (the boat follows a boarded player)
///   2. Attack (melee swing or crossbow shot)
///   3. Weapon switch
///   4. Boat interaction
///   5. Player timers (attack cooldown, invulnerability)
///   6. Enemies: AI movement, archer shots, contact damage
///   7. Item pickup
///   8. Player arrows, then enemy arrows
///   9. Compaction of dead records, camera
///
/// The step stops early as soon as the phase leaves `Playing`.
/// One-shot actions (weapon switch, interact) are released after they
/// are read, so a held key acts once.

use glam::Vec2;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::SimConfig;
use crate::domain::ai;
use crate::domain::combat::{self, DropPolicy};
use crate::domain::controls::{Action, Controls};
use crate::domain::entity::{EnemyKind, ItemKind, Owner, Player};
use crate::domain::physics::{self, PlayerBody};
use crate::domain::rules::{self, BoatAction, PickupOutcome};
use super::arena::{Entities, EntityId};
use super::event::GameEvent;
use super::level;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, controls: &mut Controls) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    resolve_player_movement(world, controls);
    resolve_attack(world, controls, &mut events);
    resolve_weapon_switch(world, controls, &mut events);
    resolve_boat(world, controls, &mut events);
    resolve_player_timers(world);

    if resolve_enemies(world, &mut events) {
        return finish(world, Phase::GameOver, events);
    }
    if resolve_items(world, &mut events) {
        return finish(world, Phase::Won, events);
    }
    resolve_player_arrows(world, &mut events);
    if resolve_enemy_arrows(world, &mut events) {
        return finish(world, Phase::GameOver, events);
    }

    end_frame(world);
    events
}

/// Rebuild the world from the same config. The new seed is drawn from
/// the current RNG, so a seeded run restarts into a reproducible map.
pub fn restart(world: &mut WorldState) {
    let seed = world.rng.random::<u64>();
    let (view_w, view_h) = (world.camera.view_w, world.camera.view_h);
    *world = level::build_world(world.config.clone(), Pcg32::seed_from_u64(seed));
    world.camera.set_viewport(view_w, view_h);
    world.follow_player();
    info!("world restarted");
}

fn end_frame(world: &mut WorldState) {
    world.entities.compact();
    world.follow_player();
}

fn finish(world: &mut WorldState, phase: Phase, mut events: Vec<GameEvent>) -> Vec<GameEvent> {
    world.phase = phase;
    match phase {
        Phase::GameOver => {
            info!("game over at tick {} with {} currency", world.tick, world.player.currency);
            events.push(GameEvent::GameOver);
        }
        Phase::Won => {
            info!("treasure opened at tick {} with {} currency", world.tick, world.player.currency);
            events.push(GameEvent::Won);
        }
        Phase::Playing => {}
    }
    end_frame(world);
    events
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, controls: &Controls) {
    if let Some(facing) = controls.facing() {
        world.player.facing = facing;
    }
    let (dx, dy) = controls.axis();
    if dx == 0.0 && dy == 0.0 { return; }

    let delta = physics::input_velocity(dx, dy, world.player.speed);
    let body = PlayerBody {
        size: world.player.size,
        on_boat: world.player.on_boat,
        restricted: world.restricted.as_ref(),
    };
    world.player.pos = physics::resolve_player_move(&world.terrain, &body, world.player.pos, delta);

    if world.player.on_boat {
        if let Some(boat) = world.boat.as_mut() {
            boat.pos = world.player.pos;
        }
    }
}

fn resolve_attack(world: &mut WorldState, controls: &Controls, events: &mut Vec<GameEvent>) {
    if !controls.is_held(Action::Attack) || world.player.attack_cooldown > 0 { return; }

    world.player.attacking = true;
    world.player.attack_cooldown = world.config.attack_cooldown;

    if world.player.using_crossbow {
        fire_crossbow(world, events);
    } else {
        swing_sword(world, events);
    }
}

fn swing_sword(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let WorldState { entities, player, config, rng, .. } = world;

    let mut slain = Vec::new();
    for (id, enemy) in entities.enemies.iter_mut() {
        if combat::within(enemy.pos, player.pos, config.melee_range)
            && combat::apply_damage(enemy, config.melee_damage)
        {
            slain.push(id);
        }
    }
    for id in slain {
        slay(entities, id, &config.drops, rng, events);
    }
}

fn fire_crossbow(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.take_item(ItemKind::Ammo) {
        events.push(GameEvent::OutOfAmmo);
        return;
    }
    let arrow = combat::player_arrow(&world.player, world.config.arrow_speed, world.config.arrow_damage);
    world.entities.projectiles.insert(arrow);
    events.push(GameEvent::ArrowFired { owner: Owner::Player });
}

fn resolve_weapon_switch(world: &mut WorldState, controls: &mut Controls, events: &mut Vec<GameEvent>) {
    if !controls.take(Action::SwitchWeapon) || !world.player.has_crossbow { return; }
    world.player.using_crossbow = !world.player.using_crossbow;
    events.push(GameEvent::WeaponSwitched(world.player.weapon()));
}

fn resolve_boat(world: &mut WorldState, controls: &mut Controls, events: &mut Vec<GameEvent>) {
    if !controls.take(Action::Interact) { return; }

    let WorldState { player, boat, terrain, config, .. } = world;
    let Some(boat) = boat.as_mut() else { return };
    if !rules::boat_in_reach(player, boat, config.boat_range) { return; }

    match rules::interact_with_boat(player, boat, terrain, config.dock_radius) {
        Some(BoatAction::Repair) => {
            info!("boat repaired");
            events.push(GameEvent::BoatRepaired);
        }
        Some(BoatAction::Board) => {
            info!("boarded boat at ({:.0}, {:.0})", boat.pos.x, boat.pos.y);
            events.push(GameEvent::Boarded);
        }
        Some(BoatAction::Disembark) => {
            info!("disembarked; boat parked at ({:.0}, {:.0})", boat.pos.x, boat.pos.y);
            events.push(GameEvent::Disembarked);
        }
        None => {}
    }
}

fn resolve_player_timers(world: &mut WorldState) {
    let p = &mut world.player;
    p.attack_cooldown = p.attack_cooldown.saturating_sub(1);
    if p.attack_cooldown == 0 {
        p.attacking = false;
    }
    p.invulnerable_timer = p.invulnerable_timer.saturating_sub(1);
}

/// One point of damage plus the invulnerability window.
/// Returns true if the player died.
fn hurt_player(player: &mut Player, config: &SimConfig, events: &mut Vec<GameEvent>) -> bool {
    let dead = player.hurt(1);
    player.invulnerable_timer = config.invulnerability_frames;
    events.push(GameEvent::PlayerHurt { health: player.health });
    dead
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Returns true if contact damage killed the player.
fn resolve_enemies(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let WorldState { entities, player, terrain, config, .. } = world;

    for (_, enemy) in entities.enemies.iter_mut() {
        // Contact uses the distance from before this frame's move.
        let distance = enemy.pos.distance(player.pos);
        let decision = ai::decide(enemy, player.pos, &config.ai);

        if let Some(step) = decision.step {
            enemy.pos = physics::resolve_enemy_step(terrain, enemy.pos, config.enemy_size, step.delta, step.slide);
        }

        if enemy.kind == EnemyKind::Archer {
            if let Some(dir) = decision.shoot {
                let origin = enemy.pos + Vec2::splat(config.enemy_size / 2.0);
                entities.projectiles.insert(combat::enemy_arrow(
                    origin,
                    dir,
                    config.enemy_arrow_speed,
                    config.enemy_arrow_life,
                ));
                events.push(GameEvent::ArrowFired { owner: Owner::Enemy });
            }
            ai::tick_shoot_cooldown(enemy, decision.shoot.is_some(), &config.ai);
        }

        if distance < config.contact_range && !player.is_invulnerable() && hurt_player(player, config, events) {
            return true;
        }
    }
    false
}

/// Remove a dead enemy and roll its drop.
fn slay(
    entities: &mut Entities,
    id: EntityId,
    drops: &DropPolicy,
    rng: &mut Pcg32,
    events: &mut Vec<GameEvent>,
) {
    let Some(enemy) = entities.enemies.get(id).cloned() else { return };
    entities.enemies.kill(id);
    debug!("{:?} {:?} slain at ({:.0}, {:.0})", enemy.kind, id, enemy.pos.x, enemy.pos.y);
    events.push(GameEvent::EnemyKilled { id, kind: enemy.kind, pos: enemy.pos });

    if let Some(drop) = combat::roll_drop(&enemy, drops, rng) {
        let kind = drop.kind;
        let item_id = entities.items.insert(drop);
        debug!("dropped {:?} as {:?}", kind, item_id);
        events.push(GameEvent::ItemDropped { id: item_id, kind });
    }
}

// ══════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════

/// Returns true if the locked treasure was opened.
fn resolve_items(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let WorldState { entities, player, config, .. } = world;

    for (_, item) in entities.items.iter_mut() {
        if item.collected || !combat::within(item.pos, player.pos, config.pickup_radius) {
            continue;
        }
        match rules::try_pickup(player, item, config.currency_value) {
            Some(PickupOutcome::Collected(kind)) => {
                debug!("picked up {}", kind.label());
                events.push(GameEvent::ItemPicked { kind });
            }
            Some(PickupOutcome::Locked) => events.push(GameEvent::TreasureLocked),
            Some(PickupOutcome::Won) => return true,
            None => {}
        }
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Projectiles
// ══════════════════════════════════════════════════════════════

fn resolve_player_arrows(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let WorldState { entities, terrain, config, rng, .. } = world;

    let mut spent = Vec::new();
    let mut slain = Vec::new();
    for (pid, arrow) in entities.projectiles.iter_mut() {
        if arrow.owner != Owner::Player { continue; }
        arrow.advance();

        let hit = entities
            .enemies
            .iter_mut()
            .find(|(_, e)| !e.is_dead() && combat::within(arrow.pos, e.pos, config.arrow_hit_radius));
        if let Some((eid, enemy)) = hit {
            if combat::apply_damage(enemy, arrow.damage) {
                slain.push(eid);
            }
            spent.push(pid);
        } else if combat::projectile_spent(terrain, arrow) {
            spent.push(pid);
        }
    }

    for pid in spent {
        entities.projectiles.kill(pid);
    }
    for eid in slain {
        slay(entities, eid, &config.drops, rng, events);
    }
}

/// Returns true if an arrow killed the player.
fn resolve_enemy_arrows(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let WorldState { entities, player, terrain, config, .. } = world;

    let mut spent = Vec::new();
    let mut killed = false;
    for (id, arrow) in entities.projectiles.iter_mut() {
        if arrow.owner != Owner::Enemy { continue; }
        arrow.advance();

        // Arrows pass through an invulnerable player.
        if !player.is_invulnerable() && combat::within(arrow.pos, player.center(), config.enemy_arrow_hit_radius) {
            spent.push(id);
            if hurt_player(player, config, events) {
                killed = true;
                break;
            }
        } else if combat::projectile_spent(terrain, arrow) {
            spent.push(id);
        }
    }

    for id in spent {
        entities.projectiles.kill(id);
    }
    killed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Boat, Enemy, Facing, Item, Weapon};
    use crate::domain::tilemap::TileWorld;

    const FIELD: [&str; 20] = ["...................."; 20];

    fn world_from(rows: &[&str], player_at: Vec2) -> WorldState {
        let terrain = TileWorld::from_rows(rows, 16.0);
        let config = SimConfig::archipelago();
        let player = Player::new(player_at, config.player_size, config.player_speed, config.player_health);
        WorldState::new(terrain, player, config, Pcg32::seed_from_u64(7), "test")
    }

    fn field() -> WorldState {
        world_from(&FIELD, Vec2::new(100.0, 100.0))
    }

    fn held(actions: &[Action]) -> Controls {
        let mut c = Controls::new();
        for &a in actions {
            c.press(a);
        }
        c
    }

    // ── movement ──

    #[test]
    fn moving_right_updates_position_and_facing() {
        let mut world = field();
        step(&mut world, &mut held(&[Action::Right]));
        assert_eq!(world.player.pos, Vec2::new(106.0, 100.0));
        assert_eq!(world.player.facing, Facing::Right);
        assert_eq!(world.tick, 1);
    }

    #[test]
    fn diagonal_is_not_faster() {
        let mut world = field();
        step(&mut world, &mut held(&[Action::Right, Action::Down]));
        let moved = world.player.pos - Vec2::new(100.0, 100.0);
        assert!((moved.length() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn paused_world_does_not_advance() {
        let mut world = field();
        world.paused = true;
        let events = step(&mut world, &mut held(&[Action::Right]));
        assert!(events.is_empty());
        assert_eq!(world.player.pos, Vec2::new(100.0, 100.0));
        assert_eq!(world.tick, 0);
    }

    // ── melee ──

    #[test]
    fn melee_kills_one_hp_enemy_with_one_drop() {
        let mut world = field();
        world.entities.enemies.insert(Enemy::new(EnemyKind::Grunt, Vec2::new(125.0, 100.0), 1, 2.0));

        let events = step(&mut world, &mut held(&[Action::Attack]));

        assert!(world.entities.enemies.is_empty());
        assert_eq!(world.entities.items.len(), 1);
        let (_, drop) = world.entities.items.iter().next().unwrap();
        assert!((drop.pos.x - 125.0).abs() <= 4.0 && (drop.pos.y - 100.0).abs() <= 4.0);
        assert!(!drop.collected, "drop lands outside pickup range");
        let kills = events.iter().filter(|e| matches!(e, GameEvent::EnemyKilled { .. })).count();
        let drops = events.iter().filter(|e| matches!(e, GameEvent::ItemDropped { .. })).count();
        assert_eq!((kills, drops), (1, 1));
    }

    #[test]
    fn attack_cooldown_gates_swings() {
        let mut world = field();
        let mut c = held(&[Action::Attack]);
        step(&mut world, &mut c);
        assert!(world.player.attacking);
        assert_eq!(world.player.attack_cooldown, 9);
        for _ in 0..9 {
            step(&mut world, &mut c);
        }
        assert_eq!(world.player.attack_cooldown, 0);
        assert!(!world.player.attacking);
        step(&mut world, &mut c);
        assert_eq!(world.player.attack_cooldown, 9);
    }

    #[test]
    fn boss_kill_leaves_a_key() {
        let mut world = field();
        world.entities.enemies.insert(Enemy::new(EnemyKind::Boss, Vec2::new(125.0, 100.0), 1, 1.5));
        step(&mut world, &mut held(&[Action::Attack]));
        let kinds: Vec<_> = world.entities.items.iter().map(|(_, i)| i.kind).collect();
        assert_eq!(kinds, vec![ItemKind::Key]);
    }

    // ── crossbow ──

    #[test]
    fn switch_then_shoot_spends_ammo() {
        let mut world = field();
        world.player.has_crossbow = true;
        world.player.add_item(ItemKind::Ammo);

        let mut c = held(&[Action::SwitchWeapon]);
        let events = step(&mut world, &mut c);
        assert_eq!(events, vec![GameEvent::WeaponSwitched(Weapon::Crossbow)]);
        assert!(!c.is_held(Action::SwitchWeapon), "switch is one-shot");

        let events = step(&mut world, &mut held(&[Action::Attack]));
        assert_eq!(events, vec![GameEvent::ArrowFired { owner: Owner::Player }]);
        assert_eq!(world.player.ammo(), 0);
        assert_eq!(world.entities.projectiles.len(), 1);
    }

    #[test]
    fn empty_quiver_reports_out_of_ammo() {
        let mut world = field();
        world.player.has_crossbow = true;
        world.player.using_crossbow = true;
        let events = step(&mut world, &mut held(&[Action::Attack]));
        assert_eq!(events, vec![GameEvent::OutOfAmmo]);
        assert!(world.entities.projectiles.is_empty());
    }

    #[test]
    fn switch_without_crossbow_does_nothing() {
        let mut world = field();
        let events = step(&mut world, &mut held(&[Action::SwitchWeapon]));
        assert!(events.is_empty());
        assert_eq!(world.player.weapon(), Weapon::Sword);
    }

    #[test]
    fn player_arrow_kills_distant_enemy() {
        let mut world = field();
        world.player.has_crossbow = true;
        world.player.using_crossbow = true;
        world.player.facing = Facing::Right;
        world.player.add_item(ItemKind::Ammo);
        world.entities.enemies.insert(Enemy::new(EnemyKind::Grunt, Vec2::new(200.0, 100.0), 2, 2.0));

        step(&mut world, &mut held(&[Action::Attack]));
        for _ in 0..10 {
            if world.entities.enemies.is_empty() { break; }
            step(&mut world, &mut Controls::new());
        }
        assert!(world.entities.enemies.is_empty());
        assert!(world.entities.projectiles.is_empty());
    }

    #[test]
    fn arrow_stops_at_tree() {
        let mut rows = FIELD;
        rows[6] = "..........T.........";
        let mut world = world_from(&rows, Vec2::new(100.0, 100.0));
        world.player.using_crossbow = true;
        world.player.facing = Facing::Right;
        world.player.add_item(ItemKind::Ammo);

        step(&mut world, &mut held(&[Action::Attack]));
        for _ in 0..6 {
            step(&mut world, &mut Controls::new());
        }
        assert!(world.entities.projectiles.is_empty());
    }

    // ── enemies ──

    #[test]
    fn archer_arrow_hurts_and_grants_invulnerability() {
        let mut world = field();
        world.entities.enemies.insert(Enemy::new(EnemyKind::Archer, Vec2::new(200.0, 100.0), 4, 2.0));

        let mut hurt_at = None;
        for frame in 0..40 {
            let events = step(&mut world, &mut Controls::new());
            if events.iter().any(|e| matches!(e, GameEvent::PlayerHurt { .. })) {
                hurt_at = Some(frame);
                break;
            }
        }
        assert!(hurt_at.is_some());
        assert_eq!(world.player.health, 5);
        assert_eq!(world.player.invulnerable_timer, 40);
        assert!(world.entities.projectiles.is_empty());
    }

    #[test]
    fn contact_death_ends_the_game_and_freezes_it() {
        let mut world = field();
        world.player.health = 1;
        world.entities.enemies.insert(Enemy::new(EnemyKind::Grunt, Vec2::new(110.0, 100.0), 2, 2.0));

        let events = step(&mut world, &mut Controls::new());
        assert_eq!(world.phase, Phase::GameOver);
        assert_eq!(world.player.health, 0);
        assert_eq!(events.last(), Some(&GameEvent::GameOver));

        let before = world.player.pos;
        assert!(step(&mut world, &mut held(&[Action::Right, Action::Attack])).is_empty());
        assert_eq!(world.player.pos, before);
        assert_eq!(world.player.health, 0);
    }

    #[test]
    fn invulnerability_blocks_repeat_contact() {
        let mut world = field();
        world.entities.enemies.insert(Enemy::new(EnemyKind::Grunt, Vec2::new(110.0, 100.0), 2, 2.0));
        for _ in 0..10 {
            step(&mut world, &mut Controls::new());
        }
        assert_eq!(world.player.health, 5);
    }

    // ── items ──

    #[test]
    fn locked_treasure_needs_a_key_to_win() {
        let mut world = field();
        world.entities.items.insert(Item::locked_treasure(Vec2::new(110.0, 100.0)));

        let events = step(&mut world, &mut Controls::new());
        assert_eq!(events, vec![GameEvent::TreasureLocked]);
        assert_eq!(world.phase, Phase::Playing);

        world.player.add_item(ItemKind::Key);
        let events = step(&mut world, &mut Controls::new());
        assert_eq!(events, vec![GameEvent::Won]);
        assert_eq!(world.phase, Phase::Won);
        assert_eq!(world.player.keys(), 0);
    }

    #[test]
    fn pickups_apply_once() {
        let mut world = field();
        world.entities.items.insert(Item::new(ItemKind::Currency, Vec2::new(105.0, 100.0)));
        step(&mut world, &mut Controls::new());
        step(&mut world, &mut Controls::new());
        assert_eq!(world.player.currency, 5);
    }

    // ── boat ──

    fn harbor() -> WorldState {
        let mut world = world_from(
            &["~~~~~~~~~~", "~~~~~~~~~~", "~~~~~~~~~~", "..DD......", ".........."],
            Vec2::new(48.0, 56.0),
        );
        world.boat = Some(Boat::new(Vec2::new(48.0, 32.0)));
        world
    }

    #[test]
    fn repair_board_and_sail() {
        let mut world = harbor();

        let mut c = held(&[Action::Interact]);
        assert!(step(&mut world, &mut c).is_empty(), "no material, no repair");
        assert!(!c.is_held(Action::Interact));

        world.player.add_item(ItemKind::Material);
        assert_eq!(step(&mut world, &mut held(&[Action::Interact])), vec![GameEvent::BoatRepaired]);
        assert!(!world.player.has_material());

        assert_eq!(step(&mut world, &mut held(&[Action::Interact])), vec![GameEvent::Boarded]);
        assert_eq!(world.player.pos, Vec2::new(48.0, 32.0));

        step(&mut world, &mut held(&[Action::Up]));
        assert_eq!(world.player.pos, Vec2::new(48.0, 26.0));
        assert_eq!(world.boat.as_ref().map(|b| b.pos), Some(world.player.pos));
    }

    #[test]
    fn interact_out_of_reach_is_ignored() {
        let mut world = harbor();
        world.player.pos = Vec2::new(128.0, 56.0);
        world.player.add_item(ItemKind::Material);
        assert!(step(&mut world, &mut held(&[Action::Interact])).is_empty());
        assert!(world.player.has_material());
    }

    // ── restart ──

    #[test]
    fn restart_rebuilds_a_fresh_world() {
        let mut world = level::build_world(SimConfig::archipelago(), Pcg32::seed_from_u64(1));
        world.camera.set_viewport(320.0, 240.0);
        world.player.health = 0;
        world.phase = Phase::GameOver;

        restart(&mut world);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.player.health, 6);
        assert_eq!(world.entities.enemies.len(), 15);
        assert_eq!(world.camera.view_w, 320.0);
    }
}
