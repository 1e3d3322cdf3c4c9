//! Board device state behind the port handlers
//!
//! Every IN/OUT handler kind is served by one `match` over this struct, so the
//! whole observable board state lives here and can be saved as a unit.

use crate::handlers::{InHandler, OutHandler, MAX_SOUND_CHANNEL};
use crate::input::{buttons, InputState};
use crate::shifter::ShiftRegister;
use emu_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};

pub const SOUND_CHANNELS: usize = MAX_SOUND_CHANNEL as usize;

const PLAYER_1_BITS: [(&str, u8); 7] = [
    (buttons::P1_UP, 0x01),
    (buttons::P1_DOWN, 0x02),
    (buttons::P1_LEFT, 0x04),
    (buttons::P1_RIGHT, 0x08),
    (buttons::P1_FIRE, 0x10),
    (buttons::P1_FIRE2, 0x20),
    (buttons::P1_START, 0x40),
];

const PLAYER_2_BITS: [(&str, u8); 7] = [
    (buttons::P2_UP, 0x01),
    (buttons::P2_DOWN, 0x02),
    (buttons::P2_LEFT, 0x04),
    (buttons::P2_RIGHT, 0x08),
    (buttons::P2_FIRE, 0x10),
    (buttons::P2_FIRE2, 0x20),
    (buttons::P2_START, 0x40),
];

const COIN_BITS: [(&str, u8); 3] = [
    (buttons::COIN1, 0x01),
    (buttons::COIN2, 0x02),
    (buttons::SERVICE, 0x04),
];

// Midway 8080 cabinet port: bit 3 is wired high
const CABINET_BITS: [(&str, u8); 6] = [
    (buttons::COIN1, 0x01),
    (buttons::P2_START, 0x02),
    (buttons::P1_START, 0x04),
    (buttons::P1_FIRE, 0x10),
    (buttons::P1_LEFT, 0x20),
    (buttons::P1_RIGHT, 0x40),
];

const P1_SHOOTER_BITS: [(&str, u8); 3] = [
    (buttons::P1_FIRE, 0x10),
    (buttons::P1_LEFT, 0x20),
    (buttons::P1_RIGHT, 0x40),
];

const P2_SHOOTER_BITS: [(&str, u8); 4] = [
    (buttons::TILT, 0x04),
    (buttons::P2_FIRE, 0x10),
    (buttons::P2_LEFT, 0x20),
    (buttons::P2_RIGHT, 0x40),
];

const ALWAYS_HIGH: u8 = 0x08;
const PERISCOPE_MAX: u8 = 0x0F;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devices {
    pub shifter: ShiftRegister,
    /// Last value written to each `sound_N` latch, channel N at index N-1
    pub sound: [u8; SOUND_CHANNELS],
    pub video_page: u8,
    pub flip_screen: bool,
    pub color_bank: u8,
    pub speech_active: bool,
    pub speech_data: u8,
    pub watchdog_resets: u64,
    pub coin_counter_latch: u8,
    pub coins_counted: u32,
    pub dip: u8,
    pub periscope: u8,
    #[serde(skip)]
    input: InputState,
}

impl Devices {
    pub fn new(dip: u8) -> Self {
        Self {
            dip,
            ..Self::default()
        }
    }

    /// Power-on state; the DIP value is a property of the cabinet and survives
    pub fn reset(&mut self, dip: u8) {
        *self = Self::new(dip);
    }

    /// Take this frame's input snapshot; also moves mechanical controls
    pub fn latch_input(&mut self, input: &InputState) {
        if input.is_pressed(buttons::P1_LEFT) {
            self.periscope = self.periscope.saturating_sub(1);
        }
        if input.is_pressed(buttons::P1_RIGHT) {
            self.periscope = (self.periscope + 1).min(PERISCOPE_MAX);
        }
        self.input = input.clone();
    }

    /// Take saved device state, keeping the current input snapshot
    pub fn restore(&mut self, saved: Devices) {
        let input = std::mem::take(&mut self.input);
        *self = saved;
        self.input = input;
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn read(&mut self, handler: InHandler, port: u8) -> u8 {
        match handler {
            InHandler::DipSwitches => self.dip,
            InHandler::Player1 => self.input.mask(&PLAYER_1_BITS),
            InHandler::Player2 => self.input.mask(&PLAYER_2_BITS),
            InHandler::PlayerControls => ALWAYS_HIGH | self.input.mask(&CABINET_BITS),
            InHandler::Coin => self.input.mask(&COIN_BITS),
            InHandler::ShiftResult => self.shifter.result(),
            InHandler::SoundStatus => self
                .sound
                .iter()
                .enumerate()
                .filter(|(_, latch)| **latch != 0)
                .fold(0u8, |acc, (i, _)| acc | (1u8 << i)),
            InHandler::Watchdog => 0,
            InHandler::DipWithPlayer2 => self.dip | self.input.mask(&P2_SHOOTER_BITS),
            InHandler::CabinetControls => ALWAYS_HIGH | self.input.mask(&P1_SHOOTER_BITS),
            InHandler::PeriscopePlayer1 => {
                self.input.mask(&PLAYER_1_BITS) | ((self.periscope & PERISCOPE_MAX) << 4)
            }
            InHandler::Stub => {
                log(LogCategory::Stubs, LogLevel::Trace, || {
                    format!("IN 0x{:02X} read from stub handler", port)
                });
                0
            }
        }
    }

    pub fn write(&mut self, handler: OutHandler, port: u8, val: u8) {
        match handler {
            OutHandler::ShiftOffset => self.shifter.set_offset(val),
            OutHandler::ShiftData => self.shifter.push_data(val),
            OutHandler::Sound(channel) => {
                if let Some(latch) = (channel as usize)
                    .checked_sub(1)
                    .and_then(|i| self.sound.get_mut(i))
                {
                    *latch = val;
                }
            }
            OutHandler::WatchdogReset => self.watchdog_resets += 1,
            OutHandler::CoinCounter => {
                if val & 0x01 != 0 && self.coin_counter_latch & 0x01 == 0 {
                    self.coins_counted += 1;
                }
                self.coin_counter_latch = val;
            }
            OutHandler::VideoSelect => self.video_page = val & 0x01,
            OutHandler::FlipScreen => self.flip_screen = val & 0x01 != 0,
            OutHandler::ColorBank => self.color_bank = val & 0x07,
            OutHandler::Speech => self.speech_active = val != 0,
            OutHandler::SpeechData => self.speech_data = val,
            OutHandler::Stub => {
                log(LogCategory::Stubs, LogLevel::Trace, || {
                    format!("OUT 0x{:02X} <- 0x{:02X} discarded by stub handler", port, val)
                });
            }
        }
    }
}
