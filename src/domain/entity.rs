/// Entities: Player, Enemy, Item, Projectile, Boat.
/// Plain data records. Behavior lives in physics / combat / rules,
/// except for small self-contained bookkeeping (inventory, timers).
///
/// Positions are continuous pixel coordinates of the top-left corner
/// of the entity's bounding box.

use std::collections::BTreeMap;

use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    /// Unit vector in screen space (y grows downward).
    pub fn unit(self) -> Vec2 {
        match self {
            Facing::Up => Vec2::new(0.0, -1.0),
            Facing::Down => Vec2::new(0.0, 1.0),
            Facing::Left => Vec2::new(-1.0, 0.0),
            Facing::Right => Vec2::new(1.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ItemKind {
    Currency,
    Heart,
    Bomb,
    Key,
    Treasure,
    Material,
    Weapon,
    Ammo,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Currency => "Rupee",
            ItemKind::Heart => "Heart",
            ItemKind::Bomb => "Bomb",
            ItemKind::Key => "Golden Key",
            ItemKind::Treasure => "Treasure",
            ItemKind::Material => "Wood Plank",
            ItemKind::Weapon => "Crossbow",
            ItemKind::Ammo => "Arrow",
        }
    }

    /// Kinds that are counted in the inventory when picked up.
    pub fn is_stocked(self) -> bool {
        matches!(self, ItemKind::Key | ItemKind::Material | ItemKind::Weapon | ItemKind::Ammo)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Weapon {
    Sword,
    Crossbow,
}

// ── Player ──

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    pub facing: Facing,
    pub health: u32,
    pub max_health: u32,
    pub attack_cooldown: u32,
    /// Attack pose; held until the cooldown runs out.
    pub attacking: bool,
    pub invulnerable_timer: u32,
    pub currency: u32,
    pub inventory: BTreeMap<ItemKind, u32>,
    pub has_sword: bool,
    pub has_shield: bool,
    pub has_bomb: bool,
    pub has_crossbow: bool,
    pub using_crossbow: bool,
    pub on_boat: bool,
}

impl Player {
    pub fn new(pos: Vec2, size: f32, speed: f32, max_health: u32) -> Self {
        Player {
            pos,
            size,
            speed,
            facing: Facing::Down,
            health: max_health,
            max_health,
            attack_cooldown: 0,
            attacking: false,
            invulnerable_timer: 0,
            currency: 0,
            inventory: BTreeMap::new(),
            has_sword: true,
            has_shield: true,
            has_bomb: true,
            has_crossbow: false,
            using_crossbow: false,
            on_boat: false,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size / 2.0)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn count(&self, kind: ItemKind) -> u32 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }

    pub fn keys(&self) -> u32 { self.count(ItemKind::Key) }
    pub fn ammo(&self) -> u32 { self.count(ItemKind::Ammo) }
    pub fn has_material(&self) -> bool { self.count(ItemKind::Material) > 0 }

    pub fn add_item(&mut self, kind: ItemKind) {
        *self.inventory.entry(kind).or_insert(0) += 1;
    }

    /// Consume one unit. Returns false (and changes nothing) if none held.
    pub fn take_item(&mut self, kind: ItemKind) -> bool {
        match self.inventory.get_mut(&kind) {
            Some(n) if *n > 1 => { *n -= 1; true }
            Some(_) => { self.inventory.remove(&kind); true }
            None => false,
        }
    }

    pub fn weapon(&self) -> Weapon {
        if self.using_crossbow { Weapon::Crossbow } else { Weapon::Sword }
    }

    /// Heal by `amount`, never above max.
    pub fn heal(&mut self, amount: u32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    /// Take `amount` damage, never below zero. Returns true if this killed the player.
    pub fn hurt(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }
}

// ── Enemy ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    /// Weak melee chaser.
    Grunt,
    /// Strong melee chaser.
    Brute,
    /// Keeps distance and shoots.
    Archer,
    Boss,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub shoot_cooldown: u32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, pos: Vec2, health: i32, speed: f32) -> Self {
        Enemy { kind, pos, health, max_health: health, speed, shoot_cooldown: 0 }
    }

    pub fn is_boss(&self) -> bool {
        self.kind == EnemyKind::Boss
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

// ── Item ──

#[derive(Clone, Debug)]
pub struct Item {
    pub kind: ItemKind,
    pub pos: Vec2,
    /// Once set, never cleared: the item is inert and hidden.
    pub collected: bool,
    pub requires_key: bool,
}

impl Item {
    pub fn new(kind: ItemKind, pos: Vec2) -> Self {
        Item { kind, pos, collected: false, requires_key: false }
    }

    pub fn locked_treasure(pos: Vec2) -> Self {
        Item { kind: ItemKind::Treasure, pos, collected: false, requires_key: true }
    }
}

// ── Projectile ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub owner: Owner,
    pub pos: Vec2,
    /// Pixels per frame, fixed at spawn.
    pub vel: Vec2,
    pub damage: i32,
    /// Remaining frames, or `None` for bounds/terrain-only expiry.
    pub life: Option<u32>,
}

impl Projectile {
    pub fn arrow(owner: Owner, pos: Vec2, vel: Vec2, damage: i32, life: Option<u32>) -> Self {
        Projectile { owner, pos, vel, damage, life }
    }

    /// Move one frame and burn one frame of life.
    pub fn advance(&mut self) {
        self.pos += self.vel;
        if let Some(l) = self.life.as_mut() {
            *l = l.saturating_sub(1);
        }
    }

    pub fn expired(&self) -> bool {
        self.life == Some(0)
    }
}

// ── Boat ──

#[derive(Clone, Debug)]
pub struct Boat {
    pub pos: Vec2,
    pub repaired: bool,
}

impl Boat {
    pub fn new(pos: Vec2) -> Self {
        Boat { pos, repaired: false }
    }
}
