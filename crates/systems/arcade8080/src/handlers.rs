//! Port handler kinds and the name registry
//!
//! Port slots hold plain kind tags. Resolving a config name to a kind checks
//! the game's [`HandlerOverrides`] first (in insertion order), then the
//! default registry.

use serde::{Deserialize, Serialize};

/// Highest `sound_N` channel the registry accepts
pub const MAX_SOUND_CHANNEL: u8 = 8;

/// Behaviour of an IN port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InHandler {
    DipSwitches,
    Player1,
    Player2,
    /// Midway cabinet port: coin, starts, bit 3 high, player 1 fire/left/right
    PlayerControls,
    Coin,
    ShiftResult,
    SoundStatus,
    Watchdog,
    /// DIP value with player 2 fire/left/right in bits 4-6
    DipWithPlayer2,
    /// Bit 3 high plus player 1 fire/left/right in bits 4-6
    CabinetControls,
    /// Player 1 with the periscope position in the high nibble
    PeriscopePlayer1,
    Stub,
}

/// Behaviour of an OUT port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutHandler {
    ShiftOffset,
    ShiftData,
    /// Sound latch, channel 1..=8
    Sound(u8),
    WatchdogReset,
    CoinCounter,
    VideoSelect,
    FlipScreen,
    ColorBank,
    Speech,
    SpeechData,
    Stub,
}

/// Default IN registry
pub fn default_in_handler(name: &str) -> Option<InHandler> {
    match name {
        "dip_switches" => Some(InHandler::DipSwitches),
        "player_1" => Some(InHandler::Player1),
        "player_2" => Some(InHandler::Player2),
        "player_controls" => Some(InHandler::PlayerControls),
        "coin" => Some(InHandler::Coin),
        "shift_register" => Some(InHandler::ShiftResult),
        "sound_status" => Some(InHandler::SoundStatus),
        "watchdog" => Some(InHandler::Watchdog),
        _ => None,
    }
}

/// Default OUT registry
pub fn default_out_handler(name: &str) -> Option<OutHandler> {
    match name {
        "shift_offset" => Some(OutHandler::ShiftOffset),
        "shift_data" => Some(OutHandler::ShiftData),
        "watchdog" | "watchdog_reset" => Some(OutHandler::WatchdogReset),
        "coin_counter" => Some(OutHandler::CoinCounter),
        "video_select" => Some(OutHandler::VideoSelect),
        _ => parse_sound_channel(name).map(OutHandler::Sound),
    }
}

fn parse_sound_channel(name: &str) -> Option<u8> {
    let channel: u8 = name.strip_prefix("sound_")?.parse().ok()?;
    (1..=MAX_SOUND_CHANNEL).contains(&channel).then_some(channel)
}

/// Per-game handler overrides, consulted before the default registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOverrides {
    inputs: Vec<(String, InHandler)>,
    outputs: Vec<(String, OutHandler)>,
}

impl HandlerOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_in(mut self, name: &str, handler: InHandler) -> Self {
        self.inputs.push((name.to_string(), handler));
        self
    }

    pub fn with_out(mut self, name: &str, handler: OutHandler) -> Self {
        self.outputs.push((name.to_string(), handler));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// First override with this name, else the default registry
    pub fn resolve_in(&self, name: &str) -> Option<InHandler> {
        self.inputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, h)| *h)
            .or_else(|| default_in_handler(name))
    }

    pub fn resolve_out(&self, name: &str) -> Option<OutHandler> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, h)| *h)
            .or_else(|| default_out_handler(name))
    }
}
