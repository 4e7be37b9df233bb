/// External configuration loader and simulation tunables.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.config/islequest`. Every key has a default, so a missing or
/// partial file is fine. A broken one falls back to defaults and the
/// error is handed back to the caller for logging.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::ai::AiParams;
use crate::domain::combat::DropPolicy;
use crate::domain::entity::ItemKind;

// ── Errors ──

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

// ── Simulation Tunables ──

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Archipelago,
    Overworld,
}

/// Every number the simulation reads. Distances are pixels, durations
/// are frames.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub preset: Preset,
    pub tile_size: f32,

    pub player_size: f32,
    pub player_speed: f32,
    pub player_health: u32,
    pub invulnerability_frames: u32,

    pub attack_cooldown: u32,
    pub melee_range: f32,
    pub melee_damage: i32,
    pub arrow_speed: f32,
    pub arrow_damage: i32,
    /// Player arrow vs enemy top-left.
    pub arrow_hit_radius: f32,

    pub enemy_size: f32,
    pub enemy_arrow_speed: f32,
    pub enemy_arrow_life: u32,
    /// Enemy arrow vs player center.
    pub enemy_arrow_hit_radius: f32,
    pub contact_range: f32,
    pub ai: AiParams,

    pub pickup_radius: f32,
    pub currency_value: u32,
    pub boat_range: f32,
    pub dock_radius: i32,

    pub drops: DropPolicy,
}

impl SimConfig {
    /// Multi-island world with a boat and a gated boss island.
    pub fn archipelago() -> Self {
        SimConfig {
            preset: Preset::Archipelago,
            tile_size: 16.0,
            player_size: 16.0,
            player_speed: 6.0,
            player_health: 6,
            invulnerability_frames: 40,
            attack_cooldown: 10,
            melee_range: 28.0,
            melee_damage: 1,
            arrow_speed: 12.0,
            arrow_damage: 2,
            arrow_hit_radius: 20.0,
            enemy_size: 16.0,
            enemy_arrow_speed: 4.0,
            enemy_arrow_life: 120,
            enemy_arrow_hit_radius: 12.0,
            contact_range: 20.0,
            ai: AiParams {
                flee_range: 80.0,
                shoot_range: 150.0,
                shoot_cooldown: 60,
                chase_min: 20.0,
                chase_max: 120.0,
            },
            pickup_radius: 20.0,
            currency_value: 5,
            boat_range: 30.0,
            dock_radius: 3,
            drops: DropPolicy::generous(),
        }
    }

    /// Single river valley: faster hero, tighter combat, sparse drops.
    pub fn overworld() -> Self {
        let base = SimConfig::archipelago();
        SimConfig {
            preset: Preset::Overworld,
            player_speed: 8.0,
            invulnerability_frames: 30,
            attack_cooldown: 8,
            melee_range: 24.0,
            ai: AiParams { chase_max: 100.0, ..base.ai },
            drops: DropPolicy::sparse(),
            ..base
        }
    }

    pub fn for_preset(preset: Preset) -> Self {
        match preset {
            Preset::Archipelago => SimConfig::archipelago(),
            Preset::Overworld => SimConfig::overworld(),
        }
    }
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub sim: SimConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    pub preset: Preset,
    /// `None` seeds from entropy.
    pub seed: Option<u64>,
    pub frame_ms: u64,
    pub log_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub attack: Vec<String>,
    pub interact: Vec<String>,
    pub switch_weapon: Vec<String>,
    pub pause: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    combat: TomlCombat,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    preset: Preset,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_log_file")]
    log_file: String,
}

#[derive(Deserialize, Debug, Default)]
struct TomlCombat {
    #[serde(default)]
    drop_chance: Option<f64>,
    #[serde(default)]
    drop_jitter: Option<f32>,
    #[serde(default)]
    drop_table: Option<Vec<TomlDrop>>,
}

#[derive(Deserialize, Debug)]
struct TomlDrop {
    item: String,
    weight: f64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_attack")]
    attack: Vec<String>,
    #[serde(default = "default_interact")]
    interact: Vec<String>,
    #[serde(default = "default_switch_weapon")]
    switch_weapon: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }     // ~60 Hz
fn default_log_file() -> String { "islequest.log".into() }

fn default_attack() -> Vec<String> { vec!["A".into(), "R1".into()] }
fn default_interact() -> Vec<String> { vec!["B".into(), "L1".into()] }
fn default_switch_weapon() -> Vec<String> { vec!["Y".into(), "X".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_restart() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            preset: Preset::default(),
            seed: None,
            frame_ms: default_frame_ms(),
            log_file: default_log_file(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            attack: default_attack(),
            interact: default_interact(),
            switch_weapon: default_switch_weapon(),
            pause: default_pause(),
            restart: default_restart(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let general = TomlGeneral::default();
        GameConfig {
            general: GeneralConfig {
                preset: general.preset,
                seed: general.seed,
                frame_ms: general.frame_ms,
                log_file: PathBuf::from(general.log_file),
            },
            sim: SimConfig::for_preset(general.preset),
            gamepad: TomlGamepad::default().into(),
        }
    }
}

impl From<TomlGamepad> for GamepadConfig {
    fn from(t: TomlGamepad) -> Self {
        GamepadConfig {
            attack: t.attack,
            interact: t.interact,
            switch_weapon: t.switch_weapon,
            pause: t.pause,
            restart: t.restart,
        }
    }
}

// ── Parsing ──

fn droppable_from_name(name: &str) -> Option<ItemKind> {
    match name.to_lowercase().as_str() {
        "currency" | "rupee" => Some(ItemKind::Currency),
        "heart" => Some(ItemKind::Heart),
        "bomb" => Some(ItemKind::Bomb),
        "ammo" | "arrow" => Some(ItemKind::Ammo),
        _ => None,
    }
}

fn apply_combat(drops: &mut DropPolicy, combat: TomlCombat) -> Result<(), ConfigError> {
    if let Some(chance) = combat.drop_chance {
        if !(0.0..=1.0).contains(&chance) {
            return Err(ConfigError::Invalid(format!("drop_chance {chance} outside 0.0..=1.0")));
        }
        drops.chance = chance;
    }
    if let Some(jitter) = combat.drop_jitter {
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(ConfigError::Invalid(format!("drop_jitter {jitter} must be >= 0")));
        }
        drops.jitter = jitter;
    }
    if let Some(entries) = combat.drop_table {
        let mut table = Vec::with_capacity(entries.len());
        for entry in entries {
            let kind = droppable_from_name(&entry.item)
                .ok_or_else(|| ConfigError::Invalid(format!("'{}' cannot be dropped", entry.item)))?;
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(ConfigError::Invalid(format!("weight for '{}' must be >= 0", entry.item)));
            }
            table.push((kind, entry.weight));
        }
        if table.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(ConfigError::Invalid("drop_table needs a positive total weight".into()));
        }
        drops.table = table;
    }
    Ok(())
}

impl GameConfig {
    /// Parse and validate a config document. Relative `log_file` paths
    /// are resolved against `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: TomlConfig = toml::from_str(text)?;
        if raw.general.frame_ms == 0 {
            return Err(ConfigError::Invalid("frame_ms must be > 0".into()));
        }

        let mut sim = SimConfig::for_preset(raw.general.preset);
        apply_combat(&mut sim.drops, raw.combat)?;

        let log_file = PathBuf::from(&raw.general.log_file);
        let log_file = if log_file.is_absolute() { log_file } else { base_dir.join(log_file) };

        Ok(GameConfig {
            general: GeneralConfig {
                preset: raw.general.preset,
                seed: raw.general.seed,
                frame_ms: raw.general.frame_ms,
                log_file,
            },
            sim,
            gamepad: raw.gamepad.into(),
        })
    }

    /// Load config from `config.toml`. Never fails: on a read, parse or
    /// validation error the defaults are returned together with the error
    /// so the caller can log it once logging is up.
    pub fn load() -> (Self, Option<ConfigError>) {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() { continue; }
            let parsed = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io { path: path.clone(), source })
                .and_then(|text| GameConfig::from_toml_str(&text, &dir));
            return match parsed {
                Ok(cfg) => (cfg, None),
                Err(e) => (GameConfig::default(), Some(e)),
            };
        }
        (GameConfig::default(), None)
    }
}

/// Candidate directories to search: exe dir + CWD + user config dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. ~/.config/islequest
    if let Ok(home) = std::env::var("HOME") {
        let user = PathBuf::from(&home).join(".config/islequest");
        if user.is_dir() && !dirs.iter().any(|d| d == &user) {
            dirs.push(user);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
