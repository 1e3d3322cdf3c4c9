//! Generic Intel 8080 arcade board
//!
//! One board model covers the whole family of early-80s 8080 cabinets
//! (Midway's Space Invaders line, Taito and Sega/Gremlin boards). A game is a
//! [`HardwareConfig`] value: ROM/RAM/video regions, port-to-handler bindings,
//! an interrupt schedule and a default DIP value. Per-game quirks live in a
//! [`HandlerOverrides`] list consulted before the default handler registry.
//!
//! # Architecture
//!
//! - **CPU**: Intel 8080 @ 2 MHz ([`emu_core::cpu_8080`])
//! - **Bus**: flat 64 KB, 256 IN + 256 OUT port slots holding handler kinds
//! - **Devices**: barrel shifter, sound latches, watchdog, coin counter, DIP
//! - **Video**: 1bpp bitmap (optionally rotated) or 2bpp colour bitmap
//! - **Scheduler**: fixed cycle budget per frame, then periodic RST interrupts

mod adapter;
mod bus;
mod config;
mod devices;
mod handlers;
mod input;
pub mod presets;
mod rom;
mod shifter;
mod system;
mod video;

pub use adapter::HardwareAdapter;
pub use bus::{ArcadeBus, PortTable, MEMORY_SIZE};
pub use config::{
    DipSettings, DisplayConfig, FrameTiming, HardwareConfig, InterruptSchedule, MemoryMap,
    PortBindings, RamRegion, RomRegion, VideoFormat, VideoRegion,
};
pub use devices::{Devices, SOUND_CHANNELS};
pub use handlers::{default_in_handler, default_out_handler, HandlerOverrides, InHandler, OutHandler};
pub use input::{buttons, InputState};
pub use rom::{DirRomSource, LoadedRom, RomLoadReport, RomSource};
pub use shifter::ShiftRegister;
pub use system::ArcadeSystem;

use thiserror::Error;

/// Arcade board errors
///
/// Only configuration and media boundaries fail; emulation itself never does.
#[derive(Debug, Error)]
pub enum ArcadeError {
    #[error("Invalid hardware config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid {kind} region 0x{start:04X}-0x{end:04X}: {reason}")]
    InvalidRegion {
        kind: &'static str,
        start: u16,
        end: u16,
        reason: String,
    },

    #[error("Interrupt vector {vector} has a period of 0 frames")]
    InvalidInterruptPeriod { vector: u8 },

    #[error("Invalid display size {width}x{height}")]
    InvalidDisplay { width: u32, height: u32 },

    #[error("Invalid frame timing: {clock_hz} Hz clock at {refresh_hz} Hz refresh")]
    InvalidTiming { clock_hz: u32, refresh_hz: u32 },

    #[error("Invalid mount point: {0}")]
    InvalidMountPoint(String),

    #[error("Save state is for {found}, running {expected}")]
    StateMismatch { expected: String, found: String },

    #[error("Unsupported save state version {0}")]
    UnsupportedStateVersion(u32),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("ROM source error: {0}")]
    Io(#[from] std::io::Error),
}
