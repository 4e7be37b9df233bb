/// Enemy AI: per-frame decisions.
///
/// `decide` is pure. It looks at one enemy and the player's position
/// and returns what the enemy wants to do; the step loop resolves the
/// movement against terrain and spawns any projectile.
///
///   Archer: flee inside `flee_range`, shoot inside `shoot_range` when
///           the cooldown is spent.
///   Others: chase while the player is inside the engagement band.

use glam::Vec2;

use super::entity::{Enemy, EnemyKind};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AiParams {
    pub flee_range: f32,
    pub shoot_range: f32,
    pub shoot_cooldown: u32,
    /// Chase only while `chase_min < distance < chase_max`.
    pub chase_min: f32,
    pub chase_max: f32,
}

/// A requested step. `slide` lets the resolver fall back to single axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub delta: Vec2,
    pub slide: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Decision {
    pub step: Option<Step>,
    /// Unit direction to fire in.
    pub shoot: Option<Vec2>,
}

pub fn decide(enemy: &Enemy, player_pos: Vec2, params: &AiParams) -> Decision {
    let to_player = player_pos - enemy.pos;
    let dist = to_player.length();
    if dist <= f32::EPSILON {
        return Decision::default();
    }
    let dir = to_player / dist;

    match enemy.kind {
        EnemyKind::Archer => Decision {
            step: (dist < params.flee_range).then(|| Step {
                delta: -dir * enemy.speed,
                slide: false,
            }),
            shoot: (dist < params.shoot_range && enemy.shoot_cooldown == 0).then_some(dir),
        },
        EnemyKind::Grunt | EnemyKind::Brute | EnemyKind::Boss => Decision {
            step: (dist > params.chase_min && dist < params.chase_max).then(|| Step {
                delta: dir * enemy.speed,
                slide: true,
            }),
            shoot: None,
        },
    }
}

/// Archer cooldown bookkeeping for one frame: reset on a shot,
/// then count down.
pub fn tick_shoot_cooldown(enemy: &mut Enemy, fired: bool, params: &AiParams) {
    if fired {
        enemy.shoot_cooldown = params.shoot_cooldown;
    }
    enemy.shoot_cooldown = enemy.shoot_cooldown.saturating_sub(1);
}
