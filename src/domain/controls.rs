/// Logical input state read by the simulation.
///
/// Front-ends (keyboard, gamepad) write held/not-held flags on key edges.
/// The core only ever sees held state; one-shot actions are debounced by
/// the core itself via `take()`, which clears the flag after acting.

use super::entity::Facing;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Attack,
    Interact,
    SwitchWeapon,
    Pause,
    Restart,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Up, Action::Down, Action::Left, Action::Right,
        Action::Attack, Action::Interact, Action::SwitchWeapon,
        Action::Pause, Action::Restart,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Default, Debug)]
pub struct Controls {
    held: [bool; Action::ALL.len()],
}

impl Controls {
    pub fn new() -> Self {
        Controls::default()
    }

    pub fn press(&mut self, action: Action) {
        self.held[action.index()] = true;
    }

    pub fn release(&mut self, action: Action) {
        self.held[action.index()] = false;
    }

    pub fn set(&mut self, action: Action, held: bool) {
        self.held[action.index()] = held;
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held[action.index()]
    }

    /// Read-and-clear: true at most once per physical press.
    pub fn take(&mut self, action: Action) -> bool {
        let was = self.is_held(action);
        self.release(action);
        was
    }

    pub fn clear(&mut self) {
        self.held = [false; Action::ALL.len()];
    }

    /// Raw direction from held arrows, each axis in {-1, 0, 1}.
    /// Opposite keys cancel on the same axis.
    pub fn axis(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.is_held(Action::Up) { dy -= 1.0; }
        if self.is_held(Action::Down) { dy += 1.0; }
        if self.is_held(Action::Left) { dx -= 1.0; }
        if self.is_held(Action::Right) { dx += 1.0; }
        (dx, dy)
    }

    /// Facing implied by held arrows. Horizontal wins over vertical,
    /// later keys in Up, Down, Left, Right order win over earlier ones.
    pub fn facing(&self) -> Option<Facing> {
        [
            (Action::Right, Facing::Right),
            (Action::Left, Facing::Left),
            (Action::Down, Facing::Down),
            (Action::Up, Facing::Up),
        ]
        .into_iter()
        .find(|(a, _)| self.is_held(*a))
        .map(|(_, f)| f)
    }
}
