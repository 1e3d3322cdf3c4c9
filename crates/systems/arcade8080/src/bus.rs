//! Arcade memory bus and I/O port dispatch
//!
//! Memory Map: one flat 64 KB array. ROM, RAM and video RAM are regions of it
//! by convention only; writes to "ROM" land like any other write.
//!
//! I/O Ports: 256 IN and 256 OUT slots, each empty or holding a handler kind.
//! Empty IN slots read 0, empty OUT slots drop the write.

use crate::devices::Devices;
use crate::handlers::{InHandler, OutHandler};
use emu_core::cpu_8080::Memory8080;
use emu_core::logging::{log, LogCategory, LogLevel};

pub const MEMORY_SIZE: usize = 0x10000;

/// Port number to handler kind, rebuilt on every adapter bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTable {
    inputs: [Option<InHandler>; 256],
    outputs: [Option<OutHandler>; 256],
}

impl Default for PortTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PortTable {
    pub fn new() -> Self {
        Self {
            inputs: [None; 256],
            outputs: [None; 256],
        }
    }

    pub fn clear(&mut self) {
        self.inputs = [None; 256];
        self.outputs = [None; 256];
    }

    pub fn bind_in(&mut self, port: u8, handler: InHandler) {
        self.inputs[port as usize] = Some(handler);
    }

    pub fn bind_out(&mut self, port: u8, handler: OutHandler) {
        self.outputs[port as usize] = Some(handler);
    }

    pub fn in_handler(&self, port: u8) -> Option<InHandler> {
        self.inputs[port as usize]
    }

    pub fn out_handler(&self, port: u8) -> Option<OutHandler> {
        self.outputs[port as usize]
    }

    /// Number of bound (IN, OUT) slots
    pub fn bound_count(&self) -> (usize, usize) {
        (
            self.inputs.iter().filter(|h| h.is_some()).count(),
            self.outputs.iter().filter(|h| h.is_some()).count(),
        )
    }
}

pub struct ArcadeBus {
    memory: Vec<u8>,
    pub ports: PortTable,
    pub devices: Devices,
}

impl Default for ArcadeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; MEMORY_SIZE],
            ports: PortTable::new(),
            devices: Devices::default(),
        }
    }

    /// Zero the whole address space
    pub fn clear_memory(&mut self) {
        self.memory.fill(0);
    }

    /// Copy `data` in at `start`, wrapping past 0xFFFF
    pub fn load(&mut self, start: u16, data: &[u8]) {
        let mut addr = start;
        for &byte in data {
            self.memory[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Copy of `len` bytes from `start`, wrapping past 0xFFFF
    pub fn read_range(&self, start: u16, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.memory[(start as usize + i) % MEMORY_SIZE])
            .collect()
    }

    /// Set `len` bytes from `start` to `val`, wrapping past 0xFFFF
    pub fn fill(&mut self, start: u16, len: usize, val: u8) {
        for i in 0..len {
            self.memory[(start as usize + i) % MEMORY_SIZE] = val;
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }
}

impl Memory8080 for ArcadeBus {
    fn read(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.memory[addr as usize] = val;
    }

    fn io_read(&mut self, port: u8) -> u8 {
        match self.ports.in_handler(port) {
            Some(handler) => self.devices.read(handler, port),
            None => {
                log(LogCategory::Io, LogLevel::Trace, || {
                    format!("IN 0x{:02X}: unbound port", port)
                });
                0
            }
        }
    }

    fn io_write(&mut self, port: u8, val: u8) {
        match self.ports.out_handler(port) {
            Some(handler) => self.devices.write(handler, port, val),
            None => {
                log(LogCategory::Io, LogLevel::Trace, || {
                    format!("OUT 0x{:02X} <- 0x{:02X}: unbound port", port, val)
                });
            }
        }
    }
}
