//! Binds a [`HardwareConfig`] onto a CPU and its bus

use crate::bus::ArcadeBus;
use crate::config::HardwareConfig;
use crate::handlers::{HandlerOverrides, InHandler, OutHandler};
use crate::rom::{self, RomLoadReport};
use crate::video;
use emu_core::cpu_8080::Cpu8080;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::{DisplayInfo, Frame};

/// Highest vector an RST instruction can encode
const MAX_RST_VECTOR: u8 = 7;

/// One game's configuration plus its handler overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareAdapter {
    config: HardwareConfig,
    overrides: HandlerOverrides,
}

impl HardwareAdapter {
    pub fn new(config: HardwareConfig) -> Self {
        Self::with_overrides(config, HandlerOverrides::new())
    }

    pub fn with_overrides(config: HardwareConfig, overrides: HandlerOverrides) -> Self {
        Self { config, overrides }
    }

    pub fn config(&self) -> &HardwareConfig {
        &self.config
    }

    pub fn overrides(&self) -> &HandlerOverrides {
        &self.overrides
    }

    /// Reset the CPU, zero the address space and rebuild the port table
    pub fn bind(&self, cpu: &mut Cpu8080<ArcadeBus>) {
        cpu.reset();
        let bus = &mut cpu.memory;
        bus.clear_memory();
        bus.ports.clear();
        bus.devices.reset(self.config.dip_settings.default);

        for (&port, name) in &self.config.ports.inputs {
            bus.ports.bind_in(port, self.resolve_in(port, name));
        }
        for (&port, name) in &self.config.ports.outputs {
            bus.ports.bind_out(port, self.resolve_out(port, name));
        }

        let (ins, outs) = bus.ports.bound_count();
        log(LogCategory::Bus, LogLevel::Info, || {
            format!(
                "{}: bound {} IN and {} OUT ports",
                self.config.name, ins, outs
            )
        });

        for irq in &self.config.interrupts {
            if irq.vector > MAX_RST_VECTOR {
                log(LogCategory::Interrupts, LogLevel::Warn, || {
                    format!(
                        "{}: interrupt vector {} is not an RST number, service jumps to 0x{:04X}",
                        self.config.name,
                        irq.vector,
                        u16::from(irq.vector).wrapping_mul(8)
                    )
                });
            }
        }
    }

    fn resolve_in(&self, port: u8, name: &str) -> InHandler {
        self.overrides.resolve_in(name).unwrap_or_else(|| {
            log(LogCategory::Stubs, LogLevel::Warn, || {
                format!(
                    "{}: unknown IN handler '{}' on port 0x{:02X}, reads will return 0",
                    self.config.name, name, port
                )
            });
            InHandler::Stub
        })
    }

    fn resolve_out(&self, port: u8, name: &str) -> OutHandler {
        self.overrides.resolve_out(name).unwrap_or_else(|| {
            log(LogCategory::Stubs, LogLevel::Warn, || {
                format!(
                    "{}: unknown OUT handler '{}' on port 0x{:02X}, writes will be discarded",
                    self.config.name, name, port
                )
            });
            OutHandler::Stub
        })
    }

    /// Place ROM images into the declared ROM regions
    pub fn load_roms<I, N, D>(&self, bus: &mut ArcadeBus, files: I) -> RomLoadReport
    where
        I: IntoIterator<Item = (N, D)>,
        N: AsRef<str>,
        D: AsRef<[u8]>,
    {
        rom::load_rom_set(&self.config.memory_map.rom, bus, files)
    }

    pub fn render(&self, bus: &ArcadeBus) -> Frame {
        video::render(&self.config, bus)
    }

    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo {
            rotation: self.config.video.rotation,
            color: self.config.video.color,
        }
    }
}
