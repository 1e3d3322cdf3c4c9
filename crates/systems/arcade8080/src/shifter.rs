//! Midway-style barrel shifter
//!
//! 8080 boards without a hardware blitter shift sprites by writing bytes into
//! a 16-bit register and reading back an 8-bit window of it. Games rely on the
//! exact window position for diagonal sprite compositing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRegister {
    value: u16,
    offset: u8,
}

impl ShiftRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// OUT to the offset port: only the low 3 bits are latched
    pub fn set_offset(&mut self, val: u8) {
        self.offset = val & 0x07;
    }

    /// OUT to the data port: new byte enters the high half, old high byte drops to the low half
    pub fn push_data(&mut self, val: u8) {
        self.value = ((val as u16) << 8) | (self.value >> 8);
    }

    /// IN from the result port
    pub fn result(&self) -> u8 {
        ((self.value >> (8 - self.offset)) & 0xFF) as u8
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }
}
