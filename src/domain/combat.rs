/// Combat resolution: damage, death drops, projectile spawning and expiry.
///
/// All functions are pure or take an injected RNG, so every rule here
/// can be tested without a running world.

use glam::Vec2;
use rand::Rng;

use super::entity::{Enemy, Item, ItemKind, Owner, Player, Projectile};
use super::tilemap::TileWorld;

/// What a dying non-boss enemy leaves behind.
#[derive(Clone, Debug, PartialEq)]
pub struct DropPolicy {
    /// Probability that anything drops at all.
    pub chance: f64,
    /// Weighted item kinds. Weights need not sum to 1.
    pub table: Vec<(ItemKind, f64)>,
    /// Max positional offset per axis, in pixels.
    pub jitter: f32,
}

impl DropPolicy {
    /// Unconditional drops: 60% currency, 30% heart, 10% bomb, ±4 px.
    pub fn generous() -> Self {
        DropPolicy {
            chance: 1.0,
            table: vec![(ItemKind::Currency, 0.6), (ItemKind::Heart, 0.3), (ItemKind::Bomb, 0.1)],
            jitter: 4.0,
        }
    }

    /// Coin-flip drops: 70% currency, 30% heart, exact position.
    pub fn sparse() -> Self {
        DropPolicy {
            chance: 0.5,
            table: vec![(ItemKind::Currency, 0.7), (ItemKind::Heart, 0.3)],
            jitter: 0.0,
        }
    }

    /// Weighted pick from the table. `None` for an empty or zero-weight table.
    pub fn pick(&self, rng: &mut impl Rng) -> Option<ItemKind> {
        let total: f64 = self.table.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 { return None; }
        let mut r = rng.random::<f64>() * total;
        for &(kind, w) in &self.table {
            let w = w.max(0.0);
            if r < w { return Some(kind); }
            r -= w;
        }
        self.table.iter().rev().find(|(_, w)| *w > 0.0).map(|(k, _)| *k)
    }
}

/// Subtract `damage` from an enemy. Returns true if it is now dead.
pub fn apply_damage(enemy: &mut Enemy, damage: i32) -> bool {
    enemy.health -= damage;
    enemy.is_dead()
}

/// Is `b` strictly within `radius` of `a`?
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

fn jittered(pos: Vec2, jitter: f32, rng: &mut impl Rng) -> Vec2 {
    if jitter <= 0.0 { return pos; }
    let mut off = || (rng.random::<f32>() * 2.0 - 1.0) * jitter;
    Vec2::new(pos.x + off(), pos.y + off())
}

/// Roll the drop for a dead enemy. Bosses always leave a key;
/// everyone else goes through the policy.
pub fn roll_drop(enemy: &Enemy, policy: &DropPolicy, rng: &mut impl Rng) -> Option<Item> {
    if enemy.is_boss() {
        return Some(Item::new(ItemKind::Key, jittered(enemy.pos, policy.jitter, rng)));
    }
    if !rng.random_bool(policy.chance.clamp(0.0, 1.0)) {
        return None;
    }
    let kind = policy.pick(rng)?;
    Some(Item::new(kind, jittered(enemy.pos, policy.jitter, rng)))
}

// ── Projectiles ──

/// Player arrow: from the player's center along the facing direction.
pub fn player_arrow(player: &Player, speed: f32, damage: i32) -> Projectile {
    Projectile::arrow(
        Owner::Player,
        player.center(),
        player.facing.unit() * speed,
        damage,
        None,
    )
}

/// Enemy arrow: from the shooter's center along `dir` (normalized here).
pub fn enemy_arrow(origin: Vec2, dir: Vec2, speed: f32, life: u32) -> Projectile {
    Projectile::arrow(Owner::Enemy, origin, dir.normalize_or_zero() * speed, 1, Some(life))
}

/// Should this projectile be removed (ignoring hits)?
/// Expired lifetime, outside `[0, world]`, or on an arrow-blocking tile.
pub fn projectile_spent(world: &TileWorld, p: &Projectile) -> bool {
    if p.expired() { return true; }
    let (w, h) = world.pixel_size();
    if p.pos.x < 0.0 || p.pos.x > w || p.pos.y < 0.0 || p.pos.y > h {
        return true;
    }
    world.tile_at_px(p.pos.x, p.pos.y).is_some_and(|t| t.blocks_arrows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EnemyKind, Facing};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grunt(hp: i32) -> Enemy {
        Enemy::new(EnemyKind::Grunt, Vec2::new(200.0, 200.0), hp, 2.0)
    }

    #[test]
    fn one_hp_enemy_dies_to_one_hit_and_drops_once() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut e = grunt(1);
        assert!(apply_damage(&mut e, 1));
        let policy = DropPolicy::generous();
        let drop = roll_drop(&e, &policy, &mut rng).expect("generous policy always drops");
        assert!((drop.pos.x - 200.0).abs() <= 4.0);
        assert!((drop.pos.y - 200.0).abs() <= 4.0);
        assert!(matches!(drop.kind, ItemKind::Currency | ItemKind::Heart | ItemKind::Bomb));
        assert!(!drop.collected);
    }

    #[test]
    fn survivors_keep_health() {
        let mut e = grunt(3);
        assert!(!apply_damage(&mut e, 2));
        assert_eq!(e.health, 1);
    }

    #[test]
    fn boss_always_drops_key() {
        let mut rng = Pcg32::seed_from_u64(1);
        let boss = Enemy::new(EnemyKind::Boss, Vec2::new(2750.0, 250.0), 10, 1.5);
        let never = DropPolicy { chance: 0.0, ..DropPolicy::generous() };
        for _ in 0..20 {
            let d = roll_drop(&boss, &never, &mut rng).unwrap();
            assert_eq!(d.kind, ItemKind::Key);
            assert!((d.pos.x - boss.pos.x).abs() <= 4.0);
            assert!((d.pos.y - boss.pos.y).abs() <= 4.0);
        }
    }

    #[test]
    fn zero_chance_never_drops() {
        let mut rng = Pcg32::seed_from_u64(5);
        let never = DropPolicy { chance: 0.0, ..DropPolicy::generous() };
        for _ in 0..50 {
            assert!(roll_drop(&grunt(0), &never, &mut rng).is_none());
        }
    }

    #[test]
    fn sparse_policy_drops_in_place() {
        let mut rng = Pcg32::seed_from_u64(11);
        let policy = DropPolicy { chance: 1.0, ..DropPolicy::sparse() };
        let d = roll_drop(&grunt(0), &policy, &mut rng).unwrap();
        assert_eq!(d.pos, Vec2::new(200.0, 200.0));
    }

    #[test]
    fn weighted_pick_tracks_weights() {
        let mut rng = Pcg32::seed_from_u64(99);
        let policy = DropPolicy::generous();
        let mut counts = [0u32; 3];
        for _ in 0..10_000 {
            match policy.pick(&mut rng) {
                Some(ItemKind::Currency) => counts[0] += 1,
                Some(ItemKind::Heart) => counts[1] += 1,
                Some(ItemKind::Bomb) => counts[2] += 1,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!((5500..6500).contains(&counts[0]), "{counts:?}");
        assert!((2500..3500).contains(&counts[1]), "{counts:?}");
        assert!((600..1400).contains(&counts[2]), "{counts:?}");
    }

    #[test]
    fn empty_table_picks_nothing() {
        let p = DropPolicy { chance: 1.0, table: vec![], jitter: 0.0 };
        assert_eq!(p.pick(&mut Pcg32::seed_from_u64(0)), None);
    }

    #[test]
    fn leftward_arrow_travels_n_times_speed() {
        let mut player = Player::new(Vec2::new(400.0, 600.0), 16.0, 6.0, 6);
        player.facing = Facing::Left;
        let mut arrow = player_arrow(&player, 12.0, 2);
        let spawn = arrow.pos;
        for _ in 0..7 { arrow.advance(); }
        assert_eq!(arrow.pos.x, spawn.x - 7.0 * 12.0);
        assert_eq!(arrow.pos.y, spawn.y);
        assert_eq!(spawn, Vec2::new(408.0, 608.0));
    }

    #[test]
    fn enemy_arrow_is_normalized() {
        let a = enemy_arrow(Vec2::ZERO, Vec2::new(30.0, 40.0), 4.0, 120);
        assert!((a.vel.length() - 4.0).abs() < 1e-5);
        assert_eq!(a.life, Some(120));
        assert_eq!(a.owner, Owner::Enemy);
    }

    #[test]
    fn projectiles_stop_on_trees_and_edges() {
        let world = TileWorld::from_rows(&["..T", "~~."], 16.0);
        let at = |x: f32, y: f32| Projectile::arrow(Owner::Player, Vec2::new(x, y), Vec2::X, 2, None);
        assert!(!projectile_spent(&world, &at(8.0, 8.0)));
        assert!(!projectile_spent(&world, &at(8.0, 24.0)), "water does not stop arrows");
        assert!(projectile_spent(&world, &at(40.0, 8.0)));
        assert!(projectile_spent(&world, &at(-0.5, 8.0)));
        assert!(projectile_spent(&world, &at(8.0, 33.0)));
        assert!(!projectile_spent(&world, &at(48.0, 32.0)), "edge itself is inside");
    }

    #[test]
    fn within_is_strict() {
        assert!(within(Vec2::ZERO, Vec2::new(19.9, 0.0), 20.0));
        assert!(!within(Vec2::ZERO, Vec2::new(20.0, 0.0), 20.0));
    }
}
