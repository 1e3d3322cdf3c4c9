//! Per-frame button snapshot

use std::collections::HashMap;

/// Well-known button names read by the default handlers
pub mod buttons {
    pub const P1_UP: &str = "p1_up";
    pub const P1_DOWN: &str = "p1_down";
    pub const P1_LEFT: &str = "p1_left";
    pub const P1_RIGHT: &str = "p1_right";
    pub const P1_FIRE: &str = "p1_fire";
    pub const P1_FIRE2: &str = "p1_fire2";
    pub const P1_START: &str = "p1_start";

    pub const P2_UP: &str = "p2_up";
    pub const P2_DOWN: &str = "p2_down";
    pub const P2_LEFT: &str = "p2_left";
    pub const P2_RIGHT: &str = "p2_right";
    pub const P2_FIRE: &str = "p2_fire";
    pub const P2_FIRE2: &str = "p2_fire2";
    pub const P2_START: &str = "p2_start";

    pub const COIN1: &str = "coin1";
    pub const COIN2: &str = "coin2";
    pub const SERVICE: &str = "service";
    pub const TILT: &str = "tilt";

    pub const ALL: [&str; 18] = [
        P1_UP, P1_DOWN, P1_LEFT, P1_RIGHT, P1_FIRE, P1_FIRE2, P1_START, P2_UP, P2_DOWN, P2_LEFT,
        P2_RIGHT, P2_FIRE, P2_FIRE2, P2_START, COIN1, COIN2, SERVICE, TILT,
    ];
}

/// Sparse named-boolean snapshot; anything not present reads as released
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    buttons: HashMap<String, bool>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`InputState::set`] with the button held down
    pub fn with(mut self, name: &str) -> Self {
        self.set(name, true);
        self
    }

    pub fn set(&mut self, name: &str, pressed: bool) {
        self.buttons.insert(name.to_string(), pressed);
    }

    pub fn is_pressed(&self, name: &str) -> bool {
        self.buttons.get(name).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.buttons.clear();
    }

    /// OR together `bit` for every `(button, bit)` pair that is held
    pub fn mask(&self, bits: &[(&str, u8)]) -> u8 {
        bits.iter()
            .filter(|(name, _)| self.is_pressed(name))
            .fold(0, |acc, (_, bit)| acc | bit)
    }
}

impl<'a> FromIterator<(&'a str, bool)> for InputState {
    fn from_iter<I: IntoIterator<Item = (&'a str, bool)>>(iter: I) -> Self {
        let mut state = InputState::new();
        for (name, pressed) in iter {
            state.set(name, pressed);
        }
        state
    }
}
