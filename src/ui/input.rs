/// Keyboard input tracker.
///
/// Tracks which keys are currently held down and turns them into
/// `Controls` flags for the simulation:
///   - Movement and attack mirror the held state every frame
///   - Interact and weapon switch are set on the initial press only;
///     the simulation clears them after acting
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::controls::{Action, Controls};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key Bindings ──

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_ATTACK: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('j'), KeyCode::Char('J')];
const KEYS_INTERACT: &[KeyCode] = &[KeyCode::Char('e'), KeyCode::Char('E'), KeyCode::Char('k'), KeyCode::Char('K')];
const KEYS_SWITCH: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc];

pub fn bindings(action: Action) -> &'static [KeyCode] {
    match action {
        Action::Up => KEYS_UP,
        Action::Down => KEYS_DOWN,
        Action::Left => KEYS_LEFT,
        Action::Right => KEYS_RIGHT,
        Action::Attack => KEYS_ATTACK,
        Action::Interact => KEYS_INTERACT,
        Action::SwitchWeapon => KEYS_SWITCH,
        Action::Pause => KEYS_PAUSE,
        Action::Restart => KEYS_RESTART,
    }
}

/// Actions the simulation reads as continuously held.
const HELD_ACTIONS: [Action; 5] = [Action::Up, Action::Down, Action::Left, Action::Right, Action::Attack];

/// Actions the simulation reads once and clears.
const ONE_SHOT_ACTIONS: [Action; 2] = [Action::Interact, Action::SwitchWeapon];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // Enhancement not confirmed; rely on timeout-based expiry.
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Convenience: is any of these keys held?
    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn action_held(&self, action: Action) -> bool {
        self.any_held(bindings(action))
    }

    pub fn action_pressed(&self, action: Action) -> bool {
        self.any_pressed(bindings(action))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Write this frame's keyboard state into `controls`. `extra_held` and
    /// `extra_pressed` let another device (a gamepad) contribute too.
    pub fn write_controls(
        &self,
        controls: &mut Controls,
        extra_held: impl Fn(Action) -> bool,
        extra_pressed: impl Fn(Action) -> bool,
    ) {
        for action in HELD_ACTIONS {
            controls.set(action, self.action_held(action) || extra_held(action));
        }
        for action in ONE_SHOT_ACTIONS {
            if self.action_pressed(action) || extra_pressed(action) {
                controls.press(action);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn press_is_held_and_fresh_once() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.record(press(KeyCode::Char('d')), now);
        input.record(press(KeyCode::Char('d')), now);
        assert!(input.action_held(Action::Right));
        assert!(input.action_pressed(Action::Right));
        assert_eq!(input.fresh_presses.len(), 1);
    }

    #[test]
    fn release_only_counts_when_honored() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.record(press(KeyCode::Char(' ')), now);
        input.record(release(KeyCode::Char(' ')), now);
        assert!(input.action_held(Action::Attack), "release ignored without enhancement");

        input.honor_release = true;
        input.record(release(KeyCode::Char(' ')), now);
        assert!(!input.action_held(Action::Attack));
    }

    #[test]
    fn one_shot_actions_only_press_on_edges() {
        let mut input = InputState::new();
        input.record(press(KeyCode::Char('e')), Instant::now());
        input.record(press(KeyCode::Up), Instant::now());

        let mut controls = Controls::new();
        input.write_controls(&mut controls, |_| false, |_| false);
        assert!(controls.is_held(Action::Interact));
        assert!(controls.is_held(Action::Up));

        // Core consumed the interact; the key is still down but no new edge.
        controls.take(Action::Interact);
        input.fresh_presses.clear();
        input.write_controls(&mut controls, |_| false, |_| false);
        assert!(!controls.is_held(Action::Interact));
        assert!(controls.is_held(Action::Up));
    }

    #[test]
    fn other_devices_contribute() {
        let input = InputState::new();
        let mut controls = Controls::new();
        input.write_controls(&mut controls, |a| a == Action::Left, |a| a == Action::SwitchWeapon);
        assert!(controls.is_held(Action::Left));
        assert!(controls.is_held(Action::SwitchWeapon));
        assert!(!controls.is_held(Action::Attack));
    }

    #[test]
    fn ctrl_c_is_detected() {
        let mut input = InputState::new();
        input.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(input.ctrl_c_pressed());
    }

    #[test]
    fn every_action_has_a_binding() {
        for action in Action::ALL {
            assert!(!bindings(action).is_empty());
        }
    }
}
