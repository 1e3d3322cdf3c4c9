//! Arcade board main system implementation

use crate::adapter::HardwareAdapter;
use crate::bus::ArcadeBus;
use crate::config::RomRegion;
use crate::devices::Devices;
use crate::input::InputState;
use crate::presets;
use crate::rom::{self, RomLoadReport, RomSource};
use crate::ArcadeError;
use emu_core::cpu_8080::{Cpu8080, Cpu8080State};
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::{DisplayInfo, Frame};
use emu_core::{MountPointInfo, System};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RamSnapshot {
    start: u16,
    bytes: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArcadeState {
    system: String,
    version: u32,
    game: String,
    frame_index: u64,
    cpu: Cpu8080State,
    devices: Devices,
    ram: Vec<RamSnapshot>,
}

/// An 8080 arcade board running one game
pub struct ArcadeSystem {
    cpu: Cpu8080<ArcadeBus>,
    adapter: HardwareAdapter,
    input: InputState,
    frame_index: u64,
    cycles_per_frame: u32,
    last_frame_cycles: u32,
    mounted: BTreeSet<String>,
}

impl ArcadeSystem {
    /// Create a board and bind `adapter` to it
    pub fn new(adapter: HardwareAdapter) -> Self {
        let cycles_per_frame = adapter.config().cycles_per_frame();
        let mut cpu = Cpu8080::new(ArcadeBus::new());
        adapter.bind(&mut cpu);
        Self {
            cpu,
            adapter,
            input: InputState::new(),
            frame_index: 0,
            cycles_per_frame,
            last_frame_cycles: 0,
            mounted: BTreeSet::new(),
        }
    }

    /// Create a board for one of the built-in games
    pub fn from_preset(key: &str) -> Result<Self, ArcadeError> {
        Ok(Self::new(presets::find(key)?.adapter()?))
    }

    /// Replace the running game. Memory, registers and ports are all reset.
    pub fn switch_game(&mut self, adapter: HardwareAdapter) {
        log(LogCategory::Bus, LogLevel::Info, || {
            format!(
                "Switching from {} to {}",
                self.adapter.config().name,
                adapter.config().name
            )
        });
        adapter.bind(&mut self.cpu);
        self.cycles_per_frame = adapter.config().cycles_per_frame();
        self.adapter = adapter;
        self.input.clear();
        self.frame_index = 0;
        self.last_frame_cycles = 0;
        self.mounted.clear();
    }

    /// Place ROM images by file name; unmatched files are skipped
    pub fn load_roms<I, N, D>(&mut self, files: I) -> RomLoadReport
    where
        I: IntoIterator<Item = (N, D)>,
        N: AsRef<str>,
        D: AsRef<[u8]>,
    {
        let report = self.adapter.load_roms(&mut self.cpu.memory, files);
        for loaded in &report.loaded {
            self.mounted.insert(loaded.file_match.clone());
        }
        report
    }

    pub fn load_roms_from(
        &mut self,
        source: &dyn RomSource,
    ) -> Result<RomLoadReport, ArcadeError> {
        let files = source.rom_files()?;
        Ok(self.load_roms(files))
    }

    /// Input snapshot read by the port handlers from the next frame on
    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    /// Run one frame: the cycle budget, then scheduled interrupts, then video
    pub fn run_frame(&mut self) -> Frame {
        self.cpu.memory.devices.latch_input(&self.input);

        let budget = self.cycles_per_frame;
        let mut cycles: u32 = 0;
        while cycles < budget {
            cycles += self.cpu.step();
        }
        self.last_frame_cycles = cycles;

        for irq in &self.adapter.config().interrupts {
            if self.frame_index % u64::from(irq.period) == 0 {
                self.cpu.raise_interrupt(irq.vector);
            }
        }

        let frame = self.adapter.render(&self.cpu.memory);
        self.frame_index += 1;
        frame
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn cycles_per_frame(&self) -> u32 {
        self.cycles_per_frame
    }

    /// Cycles actually executed by the last frame (budget plus overshoot)
    pub fn last_frame_cycles(&self) -> u32 {
        self.last_frame_cycles
    }

    pub fn adapter(&self) -> &HardwareAdapter {
        &self.adapter
    }

    pub fn cpu(&self) -> &Cpu8080<ArcadeBus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu8080<ArcadeBus> {
        &mut self.cpu
    }

    pub fn display_info(&self) -> DisplayInfo {
        self.adapter.display_info()
    }

    pub fn debug_state(&self) -> Value {
        let cpu = &self.cpu;
        let devices = &cpu.memory.devices;
        serde_json::json!({
            "game": self.adapter.config().name,
            "frame": self.frame_index,
            "cycles_per_frame": self.cycles_per_frame,
            "last_frame_cycles": self.last_frame_cycles,
            "cpu": {
                "pc": cpu.pc,
                "sp": cpu.sp,
                "a": cpu.a,
                "bc": cpu.bc(),
                "de": cpu.de(),
                "hl": cpu.hl(),
                "flags": cpu.flags,
                "inte": cpu.inte,
                "halted": cpu.halted,
                "pending_interrupt": cpu.pending_interrupt(),
                "cycles": cpu.cycles,
            },
            "devices": {
                "shift_value": devices.shifter.value(),
                "shift_offset": devices.shifter.offset(),
                "sound": devices.sound,
                "watchdog_resets": devices.watchdog_resets,
                "coins_counted": devices.coins_counted,
                "flip_screen": devices.flip_screen,
                "color_bank": devices.color_bank,
            },
            "mounted": self.mounted,
        })
    }

    /// Load a save state produced by [`System::save_state`] for this game
    pub fn restore_state(&mut self, v: &Value) -> Result<(), ArcadeError> {
        let state = ArcadeState::deserialize(v)?;
        if state.version != STATE_VERSION {
            return Err(ArcadeError::UnsupportedStateVersion(state.version));
        }
        if state.game != self.adapter.config().name {
            return Err(ArcadeError::StateMismatch {
                expected: self.adapter.config().name.clone(),
                found: state.game,
            });
        }

        self.cpu.restore(&state.cpu);
        self.cpu.memory.devices.restore(state.devices);
        for region in &state.ram {
            self.cpu.memory.load(region.start, &region.bytes);
        }
        self.frame_index = state.frame_index;
        Ok(())
    }

    fn find_rom_region(&self, mount_point_id: &str) -> Result<RomRegion, ArcadeError> {
        self.adapter
            .config()
            .memory_map
            .rom
            .iter()
            .find(|r| r.file_match.eq_ignore_ascii_case(mount_point_id))
            .cloned()
            .ok_or_else(|| ArcadeError::InvalidMountPoint(mount_point_id.to_string()))
    }
}

impl System for ArcadeSystem {
    type Error = ArcadeError;

    /// Power-on reset. ROM and RAM contents are kept.
    fn reset(&mut self) {
        self.cpu.reset();
        self.cpu
            .memory
            .devices
            .reset(self.adapter.config().dip_settings.default);
        self.frame_index = 0;
        self.last_frame_cycles = 0;
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        Ok(self.run_frame())
    }

    fn save_state(&self) -> Value {
        let ram = self
            .adapter
            .config()
            .memory_map
            .ram
            .iter()
            .map(|r| RamSnapshot {
                start: r.start,
                bytes: self.cpu.memory.read_range(r.start, r.size),
            })
            .collect();
        let state = ArcadeState {
            system: "arcade8080".to_string(),
            version: STATE_VERSION,
            game: self.adapter.config().name.clone(),
            frame_index: self.frame_index,
            cpu: self.cpu.snapshot(),
            devices: self.cpu.memory.devices.clone(),
            ram,
        };
        match serde_json::to_value(&state) {
            Ok(value) => value,
            Err(e) => {
                log(LogCategory::Bus, LogLevel::Error, || {
                    format!("{}: save state serialization failed: {}", state.game, e)
                });
                Value::Null
            }
        }
    }

    fn load_state(&mut self, v: &Value) -> Result<(), serde_json::Error> {
        use serde::de::Error as _;

        self.restore_state(v).map_err(|e| match e {
            ArcadeError::Config(err) => err,
            other => serde_json::Error::custom(other),
        })
    }

    fn supports_save_states(&self) -> bool {
        true
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        self.adapter
            .config()
            .memory_map
            .rom
            .iter()
            .map(|r| MountPointInfo {
                id: r.file_match.clone(),
                name: format!("ROM 0x{:04X}-0x{:04X}", r.start, r.end),
                extensions: Vec::new(),
                required: true,
            })
            .collect()
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        let region = self.find_rom_region(mount_point_id)?;
        self.cpu.memory.fill(region.start, region.size, 0);
        rom::load_into_region(&mut self.cpu.memory, &region, mount_point_id, data);
        self.mounted.insert(region.file_match);
        Ok(())
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        let region = self.find_rom_region(mount_point_id)?;
        self.cpu.memory.fill(region.start, region.size, 0);
        self.mounted.remove(&region.file_match);
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        self.find_rom_region(mount_point_id)
            .map(|r| self.mounted.contains(&r.file_match))
            .unwrap_or(false)
    }
}
