/// World presets and world generation.
///
/// A `LevelDef` is plain data: what to carve and what to spawn. Two
/// built-in maps exist, selected by `Preset`:
///
///   archipelago  nine islands on open water, bridges between the main
///                ones, a boat dock, and an isolated boss island.
///   overworld    one bordered valley split by a river with two bridges
///                and six tree mazes.
///
/// `build_world` carves the grid in a fixed order (islands, bridges,
/// docks, groves, houses, rocks, then clears spawn footprints) so a seed
/// always yields the same map.

use glam::Vec2;
use log::info;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::{Preset, SimConfig};
use crate::domain::entity::{Boat, Enemy, EnemyKind, Item, ItemKind, Player};
use crate::domain::tile::TileKind;
use crate::domain::tilemap::{Grove, Lattice, TileRect, TileWorld};
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Level data
// ══════════════════════════════════════════════════════════════

/// Tile rectangle given as origin plus size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

const fn span(x: i32, y: i32, w: i32, h: i32) -> Span {
    Span { x, y, w, h }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BridgeDef {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub horizontal: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub speed: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemSpawn {
    pub kind: ItemKind,
    pub x: f32,
    pub y: f32,
    pub locked: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RockScatter {
    pub attempts: u32,
    pub margin: i32,
    pub chance: f64,
}

#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: &'static str,
    /// Size in tiles.
    pub width: usize,
    pub height: usize,
    /// Tile the grid starts as.
    pub base: TileKind,
    /// Water carved into the base (borders, rivers).
    pub water: Vec<Span>,
    pub islands: Vec<Span>,
    pub bridges: Vec<BridgeDef>,
    pub docks: Vec<Span>,
    pub groves: Vec<Grove>,
    /// Top-left tiles of 2×2 houses.
    pub houses: Vec<(i32, i32)>,
    pub rocks: Option<RockScatter>,
    pub restricted: Option<TileRect>,
    pub player_start: Vec2,
    pub boat_start: Option<Vec2>,
    pub enemies: Vec<EnemySpawn>,
    pub items: Vec<ItemSpawn>,
}

fn enemy(kind: EnemyKind, x: f32, y: f32, health: i32, speed: f32) -> EnemySpawn {
    EnemySpawn { kind, x, y, health, speed }
}

fn item(kind: ItemKind, x: f32, y: f32) -> ItemSpawn {
    ItemSpawn { kind, x, y, locked: false }
}

fn chest(x: f32, y: f32) -> ItemSpawn {
    ItemSpawn { kind: ItemKind::Treasure, x, y, locked: true }
}

pub fn level_for(preset: Preset) -> LevelDef {
    match preset {
        Preset::Archipelago => archipelago(),
        Preset::Overworld => overworld(),
    }
}

// ── Archipelago ──

pub fn archipelago() -> LevelDef {
    use EnemyKind::{Archer, Boss, Brute, Grunt};
    use ItemKind::{Ammo, Bomb, Currency, Heart, Material, Weapon};

    let grove = |x, y, w, h| Grove {
        x, y, w, h,
        lattice: Lattice::Points { step: 3 },
        dense: 0.4,
        sparse: 0.15,
    };
    let bridge = |x1, y1, x2, y2, horizontal| BridgeDef { x1, y1, x2, y2, horizontal };

    LevelDef {
        name: "Archipelago",
        width: 200,
        height: 150,
        base: TileKind::Water,
        water: vec![],
        islands: vec![
            span(10, 10, 35, 25),   // start
            span(55, 8, 35, 30),
            span(5, 45, 40, 30),    // wood
            span(55, 50, 35, 25),   // treasure
            span(25, 25, 30, 20),   // central
            span(100, 30, 25, 20),
            span(20, 80, 30, 25),
            span(80, 75, 25, 20),
            span(170, 10, 15, 10),  // boss
        ],
        bridges: vec![
            bridge(45, 20, 55, 20, true),
            bridge(25, 35, 25, 45, false),
            bridge(55, 35, 55, 50, false),
            bridge(45, 55, 55, 60, true),
            bridge(40, 30, 55, 25, true),
            bridge(90, 35, 100, 40, true),
            bridge(35, 65, 35, 80, false),
            bridge(80, 70, 80, 75, false),
        ],
        docks: vec![span(175, 19, 3, 2), span(24, 35, 3, 4)],
        groves: vec![
            grove(15, 15, 30, 20),
            grove(60, 15, 25, 20),
            grove(10, 50, 30, 20),
            grove(30, 30, 20, 15),
            grove(105, 35, 15, 10),
            grove(25, 85, 20, 15),
            grove(85, 80, 15, 10),
        ],
        houses: vec![(20, 20), (65, 25), (15, 55), (35, 35), (110, 40), (30, 90), (90, 85)],
        rocks: None,
        restricted: Some(TileRect { x0: 170, y0: 10, x1: 185, y1: 20 }),
        player_start: Vec2::new(400.0, 600.0),
        boat_start: Some(Vec2::new(384.0, 576.0)),
        enemies: vec![
            enemy(Grunt, 200.0, 200.0, 2, 2.0),
            enemy(Grunt, 350.0, 250.0, 2, 2.0),
            enemy(Brute, 950.0, 200.0, 3, 2.5),
            enemy(Brute, 1100.0, 300.0, 3, 2.5),
            enemy(Brute, 200.0, 800.0, 3, 2.5),
            enemy(Grunt, 350.0, 900.0, 2, 3.0),
            enemy(Brute, 500.0, 500.0, 4, 3.0),
            enemy(Brute, 600.0, 550.0, 4, 3.0),
            enemy(Archer, 1700.0, 600.0, 4, 2.0),
            enemy(Archer, 1800.0, 650.0, 4, 2.0),
            enemy(Brute, 400.0, 1400.0, 3, 2.5),
            enemy(Archer, 500.0, 1450.0, 4, 2.0),
            enemy(Archer, 1350.0, 1300.0, 4, 2.0),
            enemy(Archer, 1450.0, 1350.0, 5, 2.0),
            enemy(Boss, 2750.0, 250.0, 10, 1.5),
        ],
        items: vec![
            // start island
            item(Currency, 180.0, 180.0),
            item(Heart, 320.0, 280.0),
            item(Ammo, 280.0, 320.0),
            item(Heart, 250.0, 300.0),
            item(Heart, 380.0, 200.0),
            // top-right
            item(Currency, 980.0, 250.0),
            item(Bomb, 1050.0, 200.0),
            item(Weapon, 900.0, 180.0),
            item(Ammo, 1100.0, 250.0),
            item(Ammo, 950.0, 300.0),
            item(Heart, 1000.0, 350.0),
            item(Heart, 1150.0, 180.0),
            // bottom-left
            item(Material, 250.0, 850.0),
            item(Currency, 180.0, 950.0),
            item(Ammo, 300.0, 900.0),
            item(Ammo, 220.0, 800.0),
            item(Heart, 150.0, 850.0),
            item(Heart, 320.0, 950.0),
            // central
            item(Bomb, 550.0, 480.0),
            item(Heart, 480.0, 520.0),
            item(Ammo, 520.0, 450.0),
            item(Ammo, 600.0, 500.0),
            item(Heart, 450.0, 480.0),
            // far right
            item(Heart, 1750.0, 580.0),
            item(Ammo, 1650.0, 620.0),
            item(Ammo, 1850.0, 600.0),
            item(Heart, 1800.0, 550.0),
            // far bottom
            item(Currency, 450.0, 1380.0),
            item(Ammo, 350.0, 1450.0),
            item(Bomb, 550.0, 1420.0),
            item(Heart, 400.0, 1450.0),
            // bottom-right far
            item(Heart, 1400.0, 1280.0),
            item(Ammo, 1300.0, 1350.0),
            item(Ammo, 1500.0, 1320.0),
            item(Heart, 1350.0, 1400.0),
            // treasure island
            chest(1200.0, 900.0),
            item(Currency, 1150.0, 950.0),
            item(Ammo, 1250.0, 850.0),
            item(Ammo, 1100.0, 920.0),
            // boss island
            item(Ammo, 2700.0, 200.0),
            item(Ammo, 2800.0, 280.0),
            item(Ammo, 2780.0, 220.0),
        ],
    }
}

// ── Overworld ──

pub fn overworld() -> LevelDef {
    use EnemyKind::{Brute, Grunt};
    use ItemKind::{Bomb, Currency, Heart, Key};

    let (w, h) = (64i32, 48i32);
    let river = h / 2;
    let b1 = w / 3;
    let b2 = 2 * w / 3;
    let ts = 16.0;

    let maze = |x0: i32, y0: i32, x1: i32, y1: i32| Grove {
        x: x0,
        y: y0,
        w: x1 - x0,
        h: y1 - y0,
        lattice: Lattice::Lines { step: 4 },
        dense: 0.7,
        sparse: 0.3,
    };

    LevelDef {
        name: "Overworld",
        width: w as usize,
        height: h as usize,
        base: TileKind::Grass,
        water: vec![
            span(0, 0, w, 2),
            span(0, h - 2, w, 2),
            span(0, 0, 2, h),
            span(w - 2, 0, 2, h),
            span(0, river - 1, w, 3),
        ],
        islands: vec![],
        bridges: vec![
            BridgeDef { x1: b1, y1: river - 1, x2: b1, y2: river + 1, horizontal: false },
            BridgeDef { x1: b2, y1: river - 1, x2: b2, y2: river + 1, horizontal: false },
        ],
        docks: vec![],
        groves: vec![
            maze(5, 5, b1 - 2, river - 3),
            maze(b1 + 4, 5, b2 - 2, river - 3),
            maze(b2 + 4, 5, w - 5, river - 3),
            maze(5, river + 4, b1 - 2, h - 5),
            maze(b1 + 4, river + 4, b2 - 2, h - 5),
            maze(b2 + 4, river + 4, w - 5, h - 5),
        ],
        houses: vec![(15, 8), (w - 15, h - 8)],
        rocks: Some(RockScatter { attempts: 20, margin: 5, chance: 0.3 }),
        restricted: None,
        player_start: Vec2::new(256.0, 300.0),
        boat_start: None,
        enemies: vec![
            enemy(Grunt, 150.0, 120.0, 2, 3.0),
            enemy(Grunt, 350.0, 150.0, 2, 3.0),
            enemy(Brute, 500.0, 180.0, 3, 2.5),
            enemy(Grunt, 200.0, 450.0, 2, 3.0),
            enemy(Brute, 600.0, 500.0, 3, 2.5),
        ],
        items: vec![
            item(Currency, 120.0, 100.0),
            item(Heart, b1 as f32 * ts, (river - 5) as f32 * ts),
            item(Bomb, b2 as f32 * ts, (river + 6) as f32 * ts),
            item(Currency, 450.0, 520.0),
            item(Currency, 300.0, 300.0),
            item(Key, 180.0, 480.0),
            chest(600.0, 120.0),
        ],
    }
}

// ══════════════════════════════════════════════════════════════
// Generation
// ══════════════════════════════════════════════════════════════

/// Carve the terrain for `def`. Deterministic for a given RNG state.
pub fn carve(def: &LevelDef, tile_size: f32, rng: &mut impl Rng) -> TileWorld {
    let mut tiles = TileWorld::filled(def.width, def.height, tile_size, def.base);

    for s in &def.water {
        tiles.fill_rect(s.x, s.y, s.w, s.h, TileKind::Water);
    }
    for s in &def.islands {
        tiles.carve_island(s.x, s.y, s.w, s.h);
    }
    for b in &def.bridges {
        tiles.carve_bridge(b.x1, b.y1, b.x2, b.y2, b.horizontal);
    }
    for s in &def.docks {
        tiles.carve_dock(s.x, s.y, s.w, s.h);
    }
    for g in &def.groves {
        tiles.scatter_trees(g, rng);
    }
    for &(x, y) in &def.houses {
        tiles.place_structure(x, y, 2, 2, TileKind::House);
    }
    if let Some(r) = def.rocks {
        tiles.scatter_rocks(r.attempts, r.margin, r.chance, rng);
    }

    // Nothing may spawn inside a tree or rock.
    clear_footprint(&mut tiles, def.player_start, tile_size);
    for it in &def.items {
        clear_footprint(&mut tiles, Vec2::new(it.x, it.y), tile_size);
    }

    tiles
}

fn clear_footprint(tiles: &mut TileWorld, pos: Vec2, size: f32) {
    let x0 = tiles.to_tile(pos.x);
    let y0 = tiles.to_tile(pos.y);
    let x1 = tiles.to_tile(pos.x + size - 1.0);
    let y1 = tiles.to_tile(pos.y + size - 1.0);
    tiles.clear_obstacles(x0, y0, x1 - x0 + 1, y1 - y0 + 1);
}

/// Build a fresh, playing world for `config.preset`.
pub fn build_world(config: SimConfig, mut rng: Pcg32) -> WorldState {
    let def = level_for(config.preset);
    let terrain = carve(&def, config.tile_size, &mut rng);

    let player = Player::new(
        def.player_start,
        config.player_size,
        config.player_speed,
        config.player_health,
    );

    info!(
        "generated {}: {}x{} tiles, {} trees, {} rocks, {} enemies, {} items",
        def.name,
        terrain.width(),
        terrain.height(),
        terrain.count(TileKind::Tree),
        terrain.count(TileKind::Rock),
        def.enemies.len(),
        def.items.len(),
    );

    let mut world = WorldState::new(terrain, player, config, rng, def.name);
    world.restricted = def.restricted;
    world.boat = def.boat_start.map(Boat::new);

    for e in &def.enemies {
        world.entities.enemies.insert(Enemy::new(e.kind, Vec2::new(e.x, e.y), e.health, e.speed));
    }
    for it in &def.items {
        let pos = Vec2::new(it.x, it.y);
        let spawned = if it.locked { Item::locked_treasure(pos) } else { Item::new(it.kind, pos) };
        world.entities.items.insert(spawned);
    }

    world.follow_player();
    world
}
