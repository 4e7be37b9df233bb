/// Events emitted during a simulation step.
/// The front-end turns these into status messages and log lines.

use glam::Vec2;

use crate::domain::entity::{EnemyKind, ItemKind, Owner, Weapon};
use super::arena::EntityId;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    EnemyKilled { id: EntityId, kind: EnemyKind, pos: Vec2 },
    ItemDropped { id: EntityId, kind: ItemKind },
    ItemPicked { kind: ItemKind },
    /// Key-gated treasure touched without a key.
    TreasureLocked,
    ArrowFired { owner: Owner },
    /// Attack pressed with the crossbow out and an empty quiver.
    OutOfAmmo,
    WeaponSwitched(Weapon),
    BoatRepaired,
    Boarded,
    Disembarked,
    PlayerHurt { health: u32 },
    GameOver,
    Won,
}

/// Frames a status message stays on screen.
const SHORT: u32 = 60;
const LONG: u32 = 150;

impl GameEvent {
    /// Status line for events the player should be told about, with how
    /// many frames to show it.
    pub fn message(&self) -> Option<(String, u32)> {
        let msg = match self {
            GameEvent::EnemyKilled { kind: EnemyKind::Boss, .. } => ("The guardian falls! It dropped something...".to_string(), LONG),
            GameEvent::ItemPicked { kind: ItemKind::Weapon } => ("Got the Crossbow! Q switches weapons".to_string(), LONG),
            GameEvent::ItemPicked { kind: ItemKind::Treasure } => return None,
            GameEvent::ItemPicked { kind } => (format!("Got {}", kind.label()), SHORT),
            GameEvent::TreasureLocked => ("The treasure is locked. Find a key.".to_string(), SHORT),
            GameEvent::OutOfAmmo => ("Out of arrows".to_string(), SHORT),
            GameEvent::WeaponSwitched(Weapon::Sword) => ("Sword ready".to_string(), SHORT),
            GameEvent::WeaponSwitched(Weapon::Crossbow) => ("Crossbow ready".to_string(), SHORT),
            GameEvent::BoatRepaired => ("The boat is seaworthy again".to_string(), SHORT),
            GameEvent::Boarded => ("Setting sail".to_string(), SHORT),
            GameEvent::Disembarked => ("Back on land".to_string(), SHORT),
            GameEvent::GameOver => ("You have fallen".to_string(), LONG),
            GameEvent::Won => ("The treasure is yours!".to_string(), LONG),
            GameEvent::EnemyKilled { .. }
            | GameEvent::ItemDropped { .. }
            | GameEvent::ArrowFired { .. }
            | GameEvent::PlayerHurt { .. } => return None,
        };
        Some(msg)
    }
}
