/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   A / R1                →  Attack
///   B / L1                →  Interact (repair, board, disembark)
///   Y / X                 →  Switch weapon
///   Start                 →  Pause
///   Select                →  Restart

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use log::info;

use crate::config::GamepadConfig;
use crate::domain::controls::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    attack: Vec<Btn>,
    interact: Vec<Btn>,
    switch_weapon: Vec<Btn>,
    pause: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            attack:        vec![Btn::A, Btn::R1],
            interact:      vec![Btn::B, Btn::L1],
            switch_weapon: vec![Btn::Y, Btn::X],
            pause:         vec![Btn::Start],
            restart:       vec![Btn::Select],
        }
    }
}

impl ActionMap {
    /// Buttons bound to a non-directional action.
    fn buttons(&self, action: Action) -> &[Btn] {
        match action {
            Action::Attack => &self.attack,
            Action::Interact => &self.interact,
            Action::SwitchWeapon => &self.switch_weapon,
            Action::Pause => &self.pause,
            Action::Restart => &self.restart,
            Action::Up | Action::Down | Action::Left | Action::Right => &[],
        }
    }
}

/// Index into the direction arrays.
fn dir_index(action: Action) -> Option<usize> {
    match action {
        Action::Up => Some(0),
        Action::Down => Some(1),
        Action::Left => Some(2),
        Action::Right => Some(3),
        _ => None,
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    // Up, Down, Left, Right
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    info!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Unknown names are skipped; a list
    /// with no valid names keeps the default binding.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn apply(target: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *target = parsed;
            }
        }
        let map = &mut self.action_map;
        apply(&mut map.attack, &cfg.attack);
        apply(&mut map.interact, &cfg.interact);
        apply(&mut map.switch_weapon, &cfg.switch_weapon);
        apply(&mut map.pause, &cfg.pause);
        apply(&mut map.restart, &cfg.restart);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        self.derive_stick();
    }

    /// Turn the analog stick position into four digital directions.
    fn derive_stick(&mut self) {
        let (x, y) = (self.stick_x, self.stick_y);
        self.stick[0].set(y > STICK_DEADZONE);
        self.stick[1].set(y < -STICK_DEADZONE);
        self.stick[2].set(x < -STICK_DEADZONE);
        self.stick[3].set(x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        let dir = match gilrs_btn {
            Button::DPadUp    => Some(0),
            Button::DPadDown  => Some(1),
            Button::DPadLeft  => Some(2),
            Button::DPadRight => Some(3),
            _ => None,
        };
        if let Some(i) = dir {
            self.dpad[i].set(held);
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn_index(btn)].set(held);
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    // ── Action queries (config-driven) ──

    /// Is any control bound to `action` held right now?
    pub fn held(&self, action: Action) -> bool {
        if let Some(i) = dir_index(action) {
            return self.dpad[i].held || self.stick[i].held;
        }
        self.action_map
            .buttons(action)
            .iter()
            .any(|&b| self.buttons[btn_index(b)].held)
    }

    /// Was a control bound to `action` pressed since the last update?
    pub fn pressed(&self, action: Action) -> bool {
        if let Some(i) = dir_index(action) {
            return self.dpad[i].just_pressed || self.stick[i].just_pressed;
        }
        self.action_map
            .buttons(action)
            .iter()
            .any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
