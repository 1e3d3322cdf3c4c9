//! Intel 8080 CPU core implementation
//!
//! This module provides a reusable 8080 interpreter for arcade boards by
//! implementing the `Memory8080` trait for the board's bus.
//!
//! Decoding goes through [`OPCODE_TABLE`], a 256-entry table built at compile
//! time, and timing through [`CYCLE_TABLE`], the documented per-opcode state
//! counts. Conditional CALL/RET cost 6 more states when taken.
//!
//! The interrupt line is a single pending slot plus the INTE flip-flop: a
//! second [`Cpu8080::raise_interrupt`] before the first is serviced replaces
//! the pending vector.

use crate::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};

/// Memory interface trait for the 8080 CPU
///
/// Systems using the 8080 must implement this trait to provide memory access.
pub trait Memory8080 {
    /// Read a byte from memory at the given address
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to memory at the given address
    fn write(&mut self, addr: u16, val: u8);

    /// Read a byte from I/O port (for IN instruction)
    fn io_read(&mut self, port: u8) -> u8 {
        let _ = port;
        0 // Unbound ports read as zero
    }

    /// Write a byte to I/O port (for OUT instruction)
    fn io_write(&mut self, port: u8, val: u8) {
        let _ = (port, val);
    }
}

// Flag bit positions
pub const FLAG_S: u8 = 0b1000_0000; // Sign
pub const FLAG_Z: u8 = 0b0100_0000; // Zero
pub const FLAG_AC: u8 = 0b0001_0000; // Auxiliary Carry (half-carry)
pub const FLAG_P: u8 = 0b0000_0100; // Parity
pub const FLAG_C: u8 = 0b0000_0001; // Carry

const FLAG_MASK: u8 = FLAG_S | FLAG_Z | FLAG_AC | FLAG_P | FLAG_C;
/// Bit 1 of the PSW byte reads back as 1 on real silicon
const PSW_FIXED_BITS: u8 = 0b0000_0010;

/// Cycles consumed while halted and by unknown opcodes
const IDLE_CYCLES: u32 = 4;
/// Cycles consumed by the interrupt acknowledge (push + jump)
pub const INTERRUPT_CYCLES: u32 = 11;
/// Extra cycles for a taken conditional CALL or RET
const BRANCH_TAKEN_EXTRA: u32 = 6;

/// 8-bit operand encoded in bits 0-2 or 3-5 of an opcode. `M` is memory at HL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    B,
    C,
    D,
    E,
    H,
    L,
    M,
    A,
}

impl Reg {
    const fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Reg::B,
            1 => Reg::C,
            2 => Reg::D,
            3 => Reg::E,
            4 => Reg::H,
            5 => Reg::L,
            6 => Reg::M,
            _ => Reg::A,
        }
    }
}

/// Register pair encoded in bits 4-5 (LXI, INX, DCX, DAD)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pair {
    BC,
    DE,
    HL,
    SP,
}

impl Pair {
    const fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => Pair::BC,
            1 => Pair::DE,
            2 => Pair::HL,
            _ => Pair::SP,
        }
    }
}

/// Register pair as used by PUSH/POP, where SP's slot is the PSW
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPair {
    BC,
    DE,
    HL,
    PSW,
}

impl StackPair {
    const fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => StackPair::BC,
            1 => StackPair::DE,
            2 => StackPair::HL,
            _ => StackPair::PSW,
        }
    }
}

/// Branch condition encoded in bits 3-5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
    PO,
    PE,
    P,
    M,
}

impl Cond {
    const fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => Cond::NZ,
            1 => Cond::Z,
            2 => Cond::NC,
            3 => Cond::C,
            4 => Cond::PO,
            5 => Cond::PE,
            6 => Cond::P,
            _ => Cond::M,
        }
    }
}

/// Accumulator operation encoded in bits 3-5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbb,
    Ana,
    Xra,
    Ora,
    Cmp,
}

impl AluOp {
    const fn from_code(code: u8) -> Self {
        match code & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbb,
            4 => AluOp::Ana,
            5 => AluOp::Xra,
            6 => AluOp::Ora,
            _ => AluOp::Cmp,
        }
    }
}

/// Decoded form of one opcode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    Lxi(Pair),
    Stax(Pair),
    Ldax(Pair),
    Inx(Pair),
    Dcx(Pair),
    Dad(Pair),
    Inr(Reg),
    Dcr(Reg),
    Mvi(Reg),
    Mov(Reg, Reg),
    Alu(AluOp, Reg),
    AluImm(AluOp),
    Rlc,
    Rrc,
    Ral,
    Rar,
    Daa,
    Cma,
    Stc,
    Cmc,
    Shld,
    Lhld,
    Sta,
    Lda,
    Hlt,
    Jmp,
    Jcc(Cond),
    Call,
    Ccc(Cond),
    Ret,
    Rcc(Cond),
    Rst(u8),
    Push(StackPair),
    Pop(StackPair),
    Out,
    In,
    Xthl,
    Xchg,
    Pchl,
    Sphl,
    Ei,
    Di,
    /// Undocumented opcode (0x08, 0xCB, 0xD9, ...)
    Unknown,
}

const fn decode(op: u8) -> Instruction {
    use Instruction::*;
    match op {
        0x00 => Nop,
        0x76 => Hlt,
        0x40..=0x7F => Mov(Reg::from_code(op >> 3), Reg::from_code(op)),
        0x80..=0xBF => Alu(AluOp::from_code(op >> 3), Reg::from_code(op)),
        0x02 => Stax(Pair::BC),
        0x12 => Stax(Pair::DE),
        0x0A => Ldax(Pair::BC),
        0x1A => Ldax(Pair::DE),
        0x07 => Rlc,
        0x0F => Rrc,
        0x17 => Ral,
        0x1F => Rar,
        0x22 => Shld,
        0x27 => Daa,
        0x2A => Lhld,
        0x2F => Cma,
        0x32 => Sta,
        0x37 => Stc,
        0x3A => Lda,
        0x3F => Cmc,
        0xC3 => Jmp,
        0xC9 => Ret,
        0xCD => Call,
        0xD3 => Out,
        0xDB => In,
        0xE3 => Xthl,
        0xE9 => Pchl,
        0xEB => Xchg,
        0xF3 => Di,
        0xF9 => Sphl,
        0xFB => Ei,
        _ if op & 0xCF == 0x01 => Lxi(Pair::from_code(op >> 4)),
        _ if op & 0xCF == 0x03 => Inx(Pair::from_code(op >> 4)),
        _ if op & 0xCF == 0x09 => Dad(Pair::from_code(op >> 4)),
        _ if op & 0xCF == 0x0B => Dcx(Pair::from_code(op >> 4)),
        _ if op & 0xC7 == 0x04 => Inr(Reg::from_code(op >> 3)),
        _ if op & 0xC7 == 0x05 => Dcr(Reg::from_code(op >> 3)),
        _ if op & 0xC7 == 0x06 => Mvi(Reg::from_code(op >> 3)),
        _ if op & 0xC7 == 0xC0 => Rcc(Cond::from_code(op >> 3)),
        _ if op & 0xC7 == 0xC2 => Jcc(Cond::from_code(op >> 3)),
        _ if op & 0xC7 == 0xC4 => Ccc(Cond::from_code(op >> 3)),
        _ if op & 0xC7 == 0xC6 => AluImm(AluOp::from_code(op >> 3)),
        _ if op & 0xC7 == 0xC7 => Rst((op >> 3) & 0x07),
        _ if op & 0xCF == 0xC1 => Pop(StackPair::from_code(op >> 4)),
        _ if op & 0xCF == 0xC5 => Push(StackPair::from_code(op >> 4)),
        _ => Unknown,
    }
}

const fn build_opcode_table() -> [Instruction; 256] {
    let mut table = [Instruction::Unknown; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode(i as u8);
        i += 1;
    }
    table
}

/// Opcode byte to instruction, built once at compile time
pub static OPCODE_TABLE: [Instruction; 256] = build_opcode_table();

/// Base state count per opcode (conditional CALL/RET listed untaken)
#[rustfmt::skip]
pub static CYCLE_TABLE: [u8; 256] = [
//  0   1   2   3   4   5   6   7   8   9   A   B   C   D   E   F
    4, 10,  7,  5,  5,  5,  7,  4,  4, 10,  7,  5,  5,  5,  7,  4, // 0
    4, 10,  7,  5,  5,  5,  7,  4,  4, 10,  7,  5,  5,  5,  7,  4, // 1
    4, 10, 16,  5,  5,  5,  7,  4,  4, 10, 16,  5,  5,  5,  7,  4, // 2
    4, 10, 13,  5, 10, 10, 10,  4,  4, 10, 13,  5,  5,  5,  7,  4, // 3
    5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 4
    5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 5
    5,  5,  5,  5,  5,  5,  7,  5,  5,  5,  5,  5,  5,  5,  7,  5, // 6
    7,  7,  7,  7,  7,  7,  7,  7,  5,  5,  5,  5,  5,  5,  7,  5, // 7
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 8
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // 9
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // A
    4,  4,  4,  4,  4,  4,  7,  4,  4,  4,  4,  4,  4,  4,  7,  4, // B
    5, 10, 10, 10, 11, 11,  7, 11,  5, 10, 10,  4, 11, 17,  7, 11, // C
    5, 10, 10, 10, 11, 11,  7, 11,  5,  4, 10, 10, 11,  4,  7, 11, // D
    5, 10, 10, 18, 11, 11,  7, 11,  5,  5, 10,  4, 11,  4,  7, 11, // E
    5, 10, 10,  4, 11, 11,  7, 11,  5,  5, 10,  4, 11,  4,  7, 11, // F
];

/// Serializable register file and interrupt line, used by save states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cpu8080State {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub flags: u8,
    pub inte: bool,
    pub halted: bool,
    pub pending_interrupt: Option<u8>,
    pub cycles: u64,
}

/// Intel 8080 CPU state and execution engine
#[derive(Debug)]
pub struct Cpu8080<M: Memory8080> {
    /// Accumulator register
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    /// Stack pointer
    pub sp: u16,
    /// Program counter
    pub pc: u16,
    /// Flags register (S Z - AC - P - C); the fixed PSW bits are not stored
    pub flags: u8,
    /// Total cycles executed since reset
    pub cycles: u64,
    /// Memory interface
    pub memory: M,
    /// Interrupt enable flip-flop
    pub inte: bool,
    /// Halted flag
    pub halted: bool,
    /// Vector waiting to be serviced (RST number, 0-7 for real boards)
    pending_interrupt: Option<u8>,
}

impl<M: Memory8080> Cpu8080<M> {
    /// Create a new 8080 CPU with the given memory interface
    pub fn new(memory: M) -> Self {
        Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            flags: 0,
            cycles: 0,
            memory,
            inte: false,
            halted: false,
            pending_interrupt: None,
        }
    }

    /// Zero every register, the flags, the interrupt line and the halt latch.
    /// Memory is left untouched.
    pub fn reset(&mut self) {
        self.a = 0;
        self.b = 0;
        self.c = 0;
        self.d = 0;
        self.e = 0;
        self.h = 0;
        self.l = 0;
        self.sp = 0;
        self.pc = 0;
        self.flags = 0;
        self.cycles = 0;
        self.inte = false;
        self.halted = false;
        self.pending_interrupt = None;
    }

    /// Execute one instruction, or service the pending interrupt, and return
    /// the cycles consumed.
    pub fn step(&mut self) -> u32 {
        let cycles = if self.inte && self.pending_interrupt.is_some() {
            self.service_interrupt()
        } else if self.halted {
            IDLE_CYCLES
        } else {
            let opcode = self.read_pc();
            self.execute(opcode)
        };
        self.cycles += u64::from(cycles);
        cycles
    }

    /// Latch `vector` on the interrupt line. Replaces any vector still pending.
    pub fn raise_interrupt(&mut self, vector: u8) {
        if let Some(previous) = self.pending_interrupt.replace(vector) {
            log(LogCategory::Interrupts, LogLevel::Debug, || {
                format!(
                    "8080: interrupt vector {} dropped, replaced by {} before service",
                    previous, vector
                )
            });
        }
        log(LogCategory::Interrupts, LogLevel::Trace, || {
            format!("8080: raise vector {} (INTE={})", vector, self.inte)
        });
    }

    /// Vector waiting on the interrupt line, if any
    pub fn pending_interrupt(&self) -> Option<u8> {
        self.pending_interrupt
    }

    fn service_interrupt(&mut self) -> u32 {
        let vector = self.pending_interrupt.take().unwrap_or_default();
        self.inte = false;
        self.halted = false;
        self.push_u16(self.pc);
        self.pc = u16::from(vector).wrapping_mul(8);
        log(LogCategory::Interrupts, LogLevel::Trace, || {
            format!("8080: service vector {} -> PC=0x{:04X}", vector, self.pc)
        });
        INTERRUPT_CYCLES
    }

    /// Copy of the register file and interrupt line
    pub fn snapshot(&self) -> Cpu8080State {
        Cpu8080State {
            a: self.a,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            sp: self.sp,
            pc: self.pc,
            flags: self.flags,
            inte: self.inte,
            halted: self.halted,
            pending_interrupt: self.pending_interrupt,
            cycles: self.cycles,
        }
    }

    pub fn restore(&mut self, state: &Cpu8080State) {
        self.a = state.a;
        self.b = state.b;
        self.c = state.c;
        self.d = state.d;
        self.e = state.e;
        self.h = state.h;
        self.l = state.l;
        self.sp = state.sp;
        self.pc = state.pc;
        self.flags = state.flags & FLAG_MASK;
        self.inte = state.inte;
        self.halted = state.halted;
        self.pending_interrupt = state.pending_interrupt;
        self.cycles = state.cycles;
    }

    // Helper methods
    fn read_pc(&mut self) -> u8 {
        let val = self.memory.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        val
    }

    fn read_pc_u16(&mut self) -> u16 {
        let lo = self.read_pc() as u16;
        let hi = self.read_pc() as u16;
        (hi << 8) | lo
    }

    pub fn push_u16(&mut self, val: u16) {
        self.sp = self.sp.wrapping_sub(1);
        self.memory.write(self.sp, (val >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        self.memory.write(self.sp, val as u8);
    }

    pub fn pop_u16(&mut self) -> u16 {
        let lo = self.memory.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        let hi = self.memory.read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        (hi << 8) | lo
    }

    // Register pair accessors
    pub fn bc(&self) -> u16 {
        ((self.b as u16) << 8) | (self.c as u16)
    }

    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn de(&self) -> u16 {
        ((self.d as u16) << 8) | (self.e as u16)
    }

    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn hl(&self) -> u16 {
        ((self.h as u16) << 8) | (self.l as u16)
    }

    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }

    /// Accumulator and flags as pushed by PUSH PSW
    pub fn psw(&self) -> u16 {
        ((self.a as u16) << 8) | ((self.flags & FLAG_MASK) | PSW_FIXED_BITS) as u16
    }

    fn set_psw(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.flags = (val as u8) & FLAG_MASK;
    }

    fn reg(&self, reg: Reg) -> u8 {
        match reg {
            Reg::B => self.b,
            Reg::C => self.c,
            Reg::D => self.d,
            Reg::E => self.e,
            Reg::H => self.h,
            Reg::L => self.l,
            Reg::M => self.memory.read(self.hl()),
            Reg::A => self.a,
        }
    }

    fn set_reg(&mut self, reg: Reg, val: u8) {
        match reg {
            Reg::B => self.b = val,
            Reg::C => self.c = val,
            Reg::D => self.d = val,
            Reg::E => self.e = val,
            Reg::H => self.h = val,
            Reg::L => self.l = val,
            Reg::M => self.memory.write(self.hl(), val),
            Reg::A => self.a = val,
        }
    }

    fn pair(&self, pair: Pair) -> u16 {
        match pair {
            Pair::BC => self.bc(),
            Pair::DE => self.de(),
            Pair::HL => self.hl(),
            Pair::SP => self.sp,
        }
    }

    fn set_pair(&mut self, pair: Pair, val: u16) {
        match pair {
            Pair::BC => self.set_bc(val),
            Pair::DE => self.set_de(val),
            Pair::HL => self.set_hl(val),
            Pair::SP => self.sp = val,
        }
    }

    // Flag operations
    fn set_flag(&mut self, flag: u8, val: bool) {
        if val {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    pub fn get_flag(&self, flag: u8) -> bool {
        (self.flags & flag) != 0
    }

    fn condition(&self, cond: Cond) -> bool {
        match cond {
            Cond::NZ => !self.get_flag(FLAG_Z),
            Cond::Z => self.get_flag(FLAG_Z),
            Cond::NC => !self.get_flag(FLAG_C),
            Cond::C => self.get_flag(FLAG_C),
            Cond::PO => !self.get_flag(FLAG_P),
            Cond::PE => self.get_flag(FLAG_P),
            Cond::P => !self.get_flag(FLAG_S),
            Cond::M => self.get_flag(FLAG_S),
        }
    }

    fn update_flags_szp(&mut self, val: u8) {
        self.set_flag(FLAG_S, (val & 0x80) != 0);
        self.set_flag(FLAG_Z, val == 0);
        self.set_flag(FLAG_P, val.count_ones() % 2 == 0);
    }

    fn update_flags_ac_add(&mut self, a: u8, b: u8, carry: u8) {
        self.set_flag(FLAG_AC, ((a & 0x0F) + (b & 0x0F) + carry) > 0x0F);
    }

    fn update_flags_ac_sub(&mut self, a: u8, b: u8, borrow: u8) {
        // Set on a borrow out of bit 4
        self.set_flag(FLAG_AC, (a & 0x0F) < ((b & 0x0F) + borrow));
    }

    // Arithmetic operations
    fn add(&mut self, val: u8, carry: bool) {
        let c = u8::from(carry && self.get_flag(FLAG_C));
        let result = self.a as u16 + val as u16 + c as u16;

        self.update_flags_ac_add(self.a, val, c);
        self.set_flag(FLAG_C, result > 0xFF);
        self.a = result as u8;
        self.update_flags_szp(self.a);
    }

    fn sub(&mut self, val: u8, carry: bool) {
        let c = u8::from(carry && self.get_flag(FLAG_C));
        let result = self.a as i16 - val as i16 - c as i16;

        self.update_flags_ac_sub(self.a, val, c);
        self.set_flag(FLAG_C, result < 0);
        self.a = result as u8;
        self.update_flags_szp(self.a);
    }

    fn ana(&mut self, val: u8) {
        // The 8080 ALU leaves the OR of both operands' bit 3 in AC for ANA/ANI.
        self.set_flag(FLAG_AC, ((self.a | val) & 0x08) != 0);
        self.a &= val;
        self.set_flag(FLAG_C, false);
        self.update_flags_szp(self.a);
    }

    fn xra(&mut self, val: u8) {
        self.a ^= val;
        self.set_flag(FLAG_C, false);
        self.set_flag(FLAG_AC, false);
        self.update_flags_szp(self.a);
    }

    fn ora(&mut self, val: u8) {
        self.a |= val;
        self.set_flag(FLAG_C, false);
        self.set_flag(FLAG_AC, false);
        self.update_flags_szp(self.a);
    }

    fn cmp(&mut self, val: u8) {
        let result = self.a as i16 - val as i16;
        self.update_flags_ac_sub(self.a, val, 0);
        self.set_flag(FLAG_C, result < 0);
        self.update_flags_szp(result as u8);
    }

    fn alu(&mut self, op: AluOp, val: u8) {
        match op {
            AluOp::Add => self.add(val, false),
            AluOp::Adc => self.add(val, true),
            AluOp::Sub => self.sub(val, false),
            AluOp::Sbb => self.sub(val, true),
            AluOp::Ana => self.ana(val),
            AluOp::Xra => self.xra(val),
            AluOp::Ora => self.ora(val),
            AluOp::Cmp => self.cmp(val),
        }
    }

    fn inr(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        self.update_flags_ac_add(val, 1, 0);
        self.update_flags_szp(result);
        result
    }

    fn dcr(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        self.update_flags_ac_sub(val, 1, 0);
        self.update_flags_szp(result);
        result
    }

    fn daa(&mut self) {
        let mut correction = 0u8;
        let mut carry = self.get_flag(FLAG_C);
        if self.get_flag(FLAG_AC) || (self.a & 0x0F) > 9 {
            correction |= 0x06;
        }
        if carry || self.a > 0x99 {
            correction |= 0x60;
            carry = true;
        }
        self.add(correction, false);
        self.set_flag(FLAG_C, carry);
    }

    /// Execute a single decoded opcode
    fn execute(&mut self, opcode: u8) -> u32 {
        let instruction = OPCODE_TABLE[opcode as usize];
        let mut cycles = CYCLE_TABLE[opcode as usize] as u32;

        log(LogCategory::CPU, LogLevel::Trace, || {
            format!(
                "8080: {:04X}  {:02X}  {:?}  A={:02X} F={:02X} BC={:04X} DE={:04X} HL={:04X} SP={:04X}",
                self.pc.wrapping_sub(1),
                opcode,
                instruction,
                self.a,
                self.flags,
                self.bc(),
                self.de(),
                self.hl(),
                self.sp
            )
        });

        match instruction {
            Instruction::Nop => {}

            Instruction::Lxi(pair) => {
                let val = self.read_pc_u16();
                self.set_pair(pair, val);
            }
            Instruction::Stax(pair) => self.memory.write(self.pair(pair), self.a),
            Instruction::Ldax(pair) => self.a = self.memory.read(self.pair(pair)),
            Instruction::Inx(pair) => self.set_pair(pair, self.pair(pair).wrapping_add(1)),
            Instruction::Dcx(pair) => self.set_pair(pair, self.pair(pair).wrapping_sub(1)),
            Instruction::Dad(pair) => {
                let (result, carry) = self.hl().overflowing_add(self.pair(pair));
                self.set_flag(FLAG_C, carry);
                self.set_hl(result);
            }

            Instruction::Inr(reg) => {
                let result = self.inr(self.reg(reg));
                self.set_reg(reg, result);
            }
            Instruction::Dcr(reg) => {
                let result = self.dcr(self.reg(reg));
                self.set_reg(reg, result);
            }
            Instruction::Mvi(reg) => {
                let val = self.read_pc();
                self.set_reg(reg, val);
            }
            Instruction::Mov(dst, src) => {
                let val = self.reg(src);
                self.set_reg(dst, val);
            }
            Instruction::Alu(op, reg) => {
                let val = self.reg(reg);
                self.alu(op, val);
            }
            Instruction::AluImm(op) => {
                let val = self.read_pc();
                self.alu(op, val);
            }

            // RLC / RRC / RAL / RAR touch only Carry
            Instruction::Rlc => {
                let carry = (self.a & 0x80) != 0;
                self.a = self.a.rotate_left(1);
                self.set_flag(FLAG_C, carry);
            }
            Instruction::Rrc => {
                let carry = (self.a & 0x01) != 0;
                self.a = self.a.rotate_right(1);
                self.set_flag(FLAG_C, carry);
            }
            Instruction::Ral => {
                let old_carry = u8::from(self.get_flag(FLAG_C));
                let new_carry = (self.a & 0x80) != 0;
                self.a = (self.a << 1) | old_carry;
                self.set_flag(FLAG_C, new_carry);
            }
            Instruction::Rar => {
                let old_carry = if self.get_flag(FLAG_C) { 0x80 } else { 0 };
                let new_carry = (self.a & 0x01) != 0;
                self.a = (self.a >> 1) | old_carry;
                self.set_flag(FLAG_C, new_carry);
            }

            Instruction::Daa => self.daa(),
            Instruction::Cma => self.a = !self.a,
            Instruction::Stc => self.set_flag(FLAG_C, true),
            Instruction::Cmc => self.set_flag(FLAG_C, !self.get_flag(FLAG_C)),

            Instruction::Shld => {
                let addr = self.read_pc_u16();
                self.memory.write(addr, self.l);
                self.memory.write(addr.wrapping_add(1), self.h);
            }
            Instruction::Lhld => {
                let addr = self.read_pc_u16();
                self.l = self.memory.read(addr);
                self.h = self.memory.read(addr.wrapping_add(1));
            }
            Instruction::Sta => {
                let addr = self.read_pc_u16();
                self.memory.write(addr, self.a);
            }
            Instruction::Lda => {
                let addr = self.read_pc_u16();
                self.a = self.memory.read(addr);
            }

            Instruction::Hlt => self.halted = true,

            Instruction::Jmp => self.pc = self.read_pc_u16(),
            Instruction::Jcc(cond) => {
                let addr = self.read_pc_u16();
                if self.condition(cond) {
                    self.pc = addr;
                }
            }
            Instruction::Call => {
                let addr = self.read_pc_u16();
                self.push_u16(self.pc);
                self.pc = addr;
            }
            Instruction::Ccc(cond) => {
                let addr = self.read_pc_u16();
                if self.condition(cond) {
                    self.push_u16(self.pc);
                    self.pc = addr;
                    cycles += BRANCH_TAKEN_EXTRA;
                }
            }
            Instruction::Ret => self.pc = self.pop_u16(),
            Instruction::Rcc(cond) => {
                if self.condition(cond) {
                    self.pc = self.pop_u16();
                    cycles += BRANCH_TAKEN_EXTRA;
                }
            }
            Instruction::Rst(n) => {
                self.push_u16(self.pc);
                self.pc = u16::from(n) * 8;
            }

            Instruction::Push(pair) => {
                let val = match pair {
                    StackPair::BC => self.bc(),
                    StackPair::DE => self.de(),
                    StackPair::HL => self.hl(),
                    StackPair::PSW => self.psw(),
                };
                self.push_u16(val);
            }
            Instruction::Pop(pair) => {
                let val = self.pop_u16();
                match pair {
                    StackPair::BC => self.set_bc(val),
                    StackPair::DE => self.set_de(val),
                    StackPair::HL => self.set_hl(val),
                    StackPair::PSW => self.set_psw(val),
                }
            }

            Instruction::Out => {
                let port = self.read_pc();
                self.memory.io_write(port, self.a);
            }
            Instruction::In => {
                let port = self.read_pc();
                self.a = self.memory.io_read(port);
            }

            Instruction::Xthl => {
                let l = self.l;
                let h = self.h;
                self.l = self.memory.read(self.sp);
                self.h = self.memory.read(self.sp.wrapping_add(1));
                self.memory.write(self.sp, l);
                self.memory.write(self.sp.wrapping_add(1), h);
            }
            Instruction::Xchg => {
                let de = self.de();
                let hl = self.hl();
                self.set_de(hl);
                self.set_hl(de);
            }
            Instruction::Pchl => self.pc = self.hl(),
            Instruction::Sphl => self.sp = self.hl(),

            Instruction::Ei => self.inte = true,
            Instruction::Di => self.inte = false,

            Instruction::Unknown => {
                log(LogCategory::CPU, LogLevel::Warn, || {
                    format!(
                        "8080: unimplemented opcode 0x{:02X} at PC=0x{:04X}, treated as NOP",
                        opcode,
                        self.pc.wrapping_sub(1)
                    )
                });
                cycles = IDLE_CYCLES;
            }
        }

        cycles
    }
}

impl<M: Memory8080> crate::Cpu for Cpu8080<M> {
    fn reset(&mut self) {
        self.reset();
    }

    fn step(&mut self) -> u32 {
        self.step()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat RAM that records every OUT
    struct TestMemory {
        ram: Vec<u8>,
        outputs: Vec<(u8, u8)>,
        inputs: [u8; 256],
    }

    impl TestMemory {
        fn new() -> Self {
            Self {
                ram: vec![0; 0x10000],
                outputs: Vec::new(),
                inputs: [0; 256],
            }
        }
    }

    impl Memory8080 for TestMemory {
        fn read(&self, addr: u16) -> u8 {
            self.ram[addr as usize]
        }

        fn write(&mut self, addr: u16, val: u8) {
            self.ram[addr as usize] = val;
        }

        fn io_read(&mut self, port: u8) -> u8 {
            self.inputs[port as usize]
        }

        fn io_write(&mut self, port: u8, val: u8) {
            self.outputs.push((port, val));
        }
    }

    fn cpu_with_program(program: &[u8]) -> Cpu8080<TestMemory> {
        let mut memory = TestMemory::new();
        memory.ram[..program.len()].copy_from_slice(program);
        Cpu8080::new(memory)
    }

    #[test]
    fn test_opcode_table_decoding() {
        assert_eq!(OPCODE_TABLE[0x00], Instruction::Nop);
        assert_eq!(OPCODE_TABLE[0x41], Instruction::Mov(Reg::B, Reg::C));
        assert_eq!(OPCODE_TABLE[0x77], Instruction::Mov(Reg::M, Reg::A));
        assert_eq!(OPCODE_TABLE[0x76], Instruction::Hlt);
        assert_eq!(OPCODE_TABLE[0x86], Instruction::Alu(AluOp::Add, Reg::M));
        assert_eq!(OPCODE_TABLE[0xA7], Instruction::Alu(AluOp::Ana, Reg::A));
        assert_eq!(OPCODE_TABLE[0x31], Instruction::Lxi(Pair::SP));
        assert_eq!(OPCODE_TABLE[0x39], Instruction::Dad(Pair::SP));
        assert_eq!(OPCODE_TABLE[0x34], Instruction::Inr(Reg::M));
        assert_eq!(OPCODE_TABLE[0xF5], Instruction::Push(StackPair::PSW));
        assert_eq!(OPCODE_TABLE[0xE1], Instruction::Pop(StackPair::HL));
        assert_eq!(OPCODE_TABLE[0xE0], Instruction::Rcc(Cond::PO));
        assert_eq!(OPCODE_TABLE[0xFA], Instruction::Jcc(Cond::M));
        assert_eq!(OPCODE_TABLE[0xDC], Instruction::Ccc(Cond::C));
        assert_eq!(OPCODE_TABLE[0xFE], Instruction::AluImm(AluOp::Cmp));
        assert_eq!(OPCODE_TABLE[0xD7], Instruction::Rst(2));

        let undocumented = [
            0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0xCB, 0xD9, 0xDD, 0xED, 0xFD,
        ];
        let unknown: Vec<u8> = (0..=255u8)
            .filter(|&op| OPCODE_TABLE[op as usize] == Instruction::Unknown)
            .collect();
        assert_eq!(unknown, undocumented);
    }

    #[test]
    fn test_add_flags_exhaustive() {
        let mut cpu = cpu_with_program(&[0x80]); // ADD B
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                cpu.pc = 0;
                cpu.a = a;
                cpu.b = b;
                cpu.step();

                let sum = a as u16 + b as u16;
                let result = sum as u8;
                assert_eq!(cpu.a, result);
                assert_eq!(cpu.get_flag(FLAG_C), sum > 0xFF, "C for {a:02X}+{b:02X}");
                assert_eq!(
                    cpu.get_flag(FLAG_AC),
                    (a & 0x0F) + (b & 0x0F) > 0x0F,
                    "AC for {a:02X}+{b:02X}"
                );
                assert_eq!(cpu.get_flag(FLAG_Z), result == 0);
                assert_eq!(cpu.get_flag(FLAG_S), result & 0x80 != 0);
                assert_eq!(cpu.get_flag(FLAG_P), result.count_ones() % 2 == 0);
            }
        }
    }

    #[test]
    fn test_push_pop_roundtrip() {
        let mut cpu = cpu_with_program(&[]);
        for &x in &[0x0000u16, 0x1234, 0xBEEF, 0xFFFF] {
            cpu.sp = 0x2400;
            cpu.push_u16(x);
            assert_eq!(cpu.sp, 0x23FE);
            assert_eq!(cpu.pop_u16(), x);
            assert_eq!(cpu.sp, 0x2400);
        }

        // Stack pointer wraps at the bottom of the address space
        cpu.sp = 0x0000;
        cpu.push_u16(0xA55A);
        assert_eq!(cpu.sp, 0xFFFE);
        assert_eq!(cpu.pop_u16(), 0xA55A);
        assert_eq!(cpu.sp, 0x0000);
    }

    #[test]
    fn test_interrupt_service() {
        let mut cpu = cpu_with_program(&[]);
        cpu.sp = 0x2400;
        cpu.pc = 0x1234;
        cpu.inte = true;
        cpu.raise_interrupt(2);

        let cycles = cpu.step();

        assert_eq!(cycles, 11);
        assert!(!cpu.inte);
        assert_eq!(cpu.pc, 16);
        assert_eq!(cpu.pending_interrupt(), None);
        assert_eq!(cpu.pop_u16(), 0x1234);
    }

    #[test]
    fn test_interrupt_vector_beyond_rst_range() {
        let mut cpu = cpu_with_program(&[]);
        cpu.sp = 0x2400;
        cpu.inte = true;
        cpu.raise_interrupt(8);
        assert_eq!(cpu.step(), 11);
        assert_eq!(cpu.pc, 0x0040);

        cpu.inte = true;
        cpu.raise_interrupt(0xFF);
        cpu.step();
        assert_eq!(cpu.pc, 0x07F8);
    }

    #[test]
    fn test_interrupt_waits_for_enable() {
        // DI; NOP; EI; NOP
        let mut cpu = cpu_with_program(&[0xF3, 0x00, 0xFB, 0x00]);
        cpu.sp = 0x2400;
        cpu.raise_interrupt(1);

        assert_eq!(cpu.step(), 4); // DI
        assert_eq!(cpu.step(), 4); // NOP, still masked
        assert_eq!(cpu.pending_interrupt(), Some(1));
        assert_eq!(cpu.step(), 4); // EI
        assert_eq!(cpu.step(), 11); // serviced before the next fetch
        assert_eq!(cpu.pc, 0x08);
    }

    #[test]
    fn test_second_interrupt_replaces_pending() {
        let mut cpu = cpu_with_program(&[]);
        cpu.sp = 0x2400;
        cpu.raise_interrupt(1);
        cpu.raise_interrupt(2);
        cpu.inte = true;

        cpu.step();
        assert_eq!(cpu.pc, 0x10);
        assert_eq!(cpu.pending_interrupt(), None);
    }

    #[test]
    fn test_halt_until_interrupt() {
        let mut cpu = cpu_with_program(&[0xFB, 0x76]); // EI; HLT
        cpu.sp = 0x2400;
        cpu.step();
        assert_eq!(cpu.step(), 7);
        assert!(cpu.halted);

        for _ in 0..3 {
            assert_eq!(cpu.step(), 4);
            assert_eq!(cpu.pc, 2);
        }

        cpu.raise_interrupt(1);
        assert_eq!(cpu.step(), 11);
        assert!(!cpu.halted);
        assert_eq!(cpu.pc, 0x08);
        assert_eq!(cpu.pop_u16(), 2);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut cpu = cpu_with_program(&[]);
        cpu.a = 1;
        cpu.b = 2;
        cpu.c = 3;
        cpu.d = 4;
        cpu.e = 5;
        cpu.h = 6;
        cpu.l = 7;
        cpu.sp = 0x1234;
        cpu.pc = 0x5678;
        cpu.flags = FLAG_MASK;
        cpu.inte = true;
        cpu.halted = true;
        cpu.raise_interrupt(3);

        for _ in 0..2 {
            cpu.reset();
            assert_eq!(cpu.snapshot(), Cpu8080State::default());
        }
    }

    #[test]
    fn test_end_to_end_program() {
        // MVI A,05; MVI B,03; ADD B; OUT 0; HLT
        let mut cpu = cpu_with_program(&[0x3E, 0x05, 0x06, 0x03, 0x80, 0xD3, 0x00, 0x76]);

        let cycles: Vec<u32> = (0..4).map(|_| cpu.step()).collect();
        assert_eq!(cycles, vec![7, 7, 4, 10]);
        assert_eq!(cpu.memory.outputs, vec![(0x00, 0x08)]);
        assert!(!cpu.halted);

        cpu.step();
        assert!(cpu.halted);
        assert_eq!(cpu.a, 0x08);
        assert!(!cpu.get_flag(FLAG_C));
        assert!(!cpu.get_flag(FLAG_Z));
    }

    #[test]
    fn test_unknown_opcode_is_four_cycle_nop() {
        let mut cpu = cpu_with_program(&[0xCB, 0xDD, 0x00]);
        cpu.a = 0x42;
        assert_eq!(cpu.step(), 4);
        assert_eq!(cpu.pc, 1);
        assert_eq!(cpu.step(), 4);
        assert_eq!(cpu.pc, 2);
        assert_eq!(cpu.a, 0x42);
    }

    #[test]
    fn test_sub_and_compare_flags() {
        // SUI 01 with A=0 borrows through both nibbles
        let mut cpu = cpu_with_program(&[0xD6, 0x01, 0xFE, 0x10]);
        cpu.step();
        assert_eq!(cpu.a, 0xFF);
        assert!(cpu.get_flag(FLAG_C));
        assert!(cpu.get_flag(FLAG_AC));
        assert!(cpu.get_flag(FLAG_S));

        // CPI 10 with A=FF: no borrow, A unchanged
        cpu.step();
        assert_eq!(cpu.a, 0xFF);
        assert!(!cpu.get_flag(FLAG_C));
        assert!(!cpu.get_flag(FLAG_Z));
    }

    #[test]
    fn test_sbb_uses_carry() {
        let mut cpu = cpu_with_program(&[0x37, 0x98]); // STC; SBB B
        cpu.a = 0x10;
        cpu.b = 0x05;
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x0A);
        assert!(!cpu.get_flag(FLAG_C));
    }

    #[test]
    fn test_logic_ops_clear_carry() {
        let mut cpu = cpu_with_program(&[0x37, 0xA0, 0x37, 0xB0, 0x37, 0xA8]);
        cpu.a = 0x0C;
        cpu.b = 0x0A;

        cpu.step();
        cpu.step(); // ANA B
        assert_eq!(cpu.a, 0x08);
        assert!(!cpu.get_flag(FLAG_C));
        assert!(cpu.get_flag(FLAG_AC)); // bit 3 set in an operand

        cpu.step();
        cpu.step(); // ORA B
        assert_eq!(cpu.a, 0x0A);
        assert!(!cpu.get_flag(FLAG_C));
        assert!(!cpu.get_flag(FLAG_AC));

        cpu.step();
        cpu.step(); // XRA B
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.get_flag(FLAG_Z));
        assert!(cpu.get_flag(FLAG_P));
        assert!(!cpu.get_flag(FLAG_C));
    }

    #[test]
    fn test_ana_aux_carry_from_operand_bit3() {
        let mut cpu = cpu_with_program(&[0xE6, 0x30]); // ANI 30
        cpu.a = 0x41;
        cpu.step();
        assert_eq!(cpu.a, 0x00);
        assert!(!cpu.get_flag(FLAG_AC));
    }

    #[test]
    fn test_inr_dcr_preserve_carry() {
        let mut cpu = cpu_with_program(&[0x37, 0x04, 0x0D]); // STC; INR B; DCR C
        cpu.b = 0xFF;
        cpu.c = 0x01;
        cpu.step();
        cpu.step();
        assert_eq!(cpu.b, 0x00);
        assert!(cpu.get_flag(FLAG_Z));
        assert!(cpu.get_flag(FLAG_AC));
        assert!(cpu.get_flag(FLAG_C));

        cpu.step();
        assert_eq!(cpu.c, 0x00);
        assert!(cpu.get_flag(FLAG_Z));
        assert!(cpu.get_flag(FLAG_C));
    }

    #[test]
    fn test_inr_dcr_memory() {
        let mut cpu = cpu_with_program(&[0x21, 0x00, 0x20, 0x34, 0x35, 0x35]);
        cpu.memory.ram[0x2000] = 0x7F;
        cpu.step();
        assert_eq!(cpu.step(), 10);
        assert_eq!(cpu.memory.ram[0x2000], 0x80);
        assert!(cpu.get_flag(FLAG_S));
        cpu.step();
        cpu.step();
        assert_eq!(cpu.memory.ram[0x2000], 0x7E);
    }

    #[test]
    fn test_dad_only_touches_carry() {
        let mut cpu = cpu_with_program(&[0x09]); // DAD B
        cpu.set_hl(0xFFFF);
        cpu.set_bc(0x0002);
        cpu.flags = FLAG_Z | FLAG_S;
        assert_eq!(cpu.step(), 10);
        assert_eq!(cpu.hl(), 0x0001);
        assert!(cpu.get_flag(FLAG_C));
        assert!(cpu.get_flag(FLAG_Z));
        assert!(cpu.get_flag(FLAG_S));
    }

    #[test]
    fn test_lxi_little_endian_and_pairs() {
        // LXI B,1234; LXI D,5678; LXI H,9ABC; LXI SP,2400; INX B; DCX D
        let mut cpu = cpu_with_program(&[
            0x01, 0x34, 0x12, 0x11, 0x78, 0x56, 0x21, 0xBC, 0x9A, 0x31, 0x00, 0x24, 0x03, 0x1B,
        ]);
        for _ in 0..6 {
            cpu.step();
        }
        assert_eq!(cpu.bc(), 0x1235);
        assert_eq!(cpu.de(), 0x5677);
        assert_eq!(cpu.hl(), 0x9ABC);
        assert_eq!(cpu.sp, 0x2400);
    }

    #[test]
    fn test_conditional_call_and_return_timing() {
        // CZ 0010 (not taken); CNZ 0010 (taken) ... at 0x10: RNZ (taken)
        let mut program = vec![0xCC, 0x10, 0x00, 0xC4, 0x10, 0x00, 0x00];
        program.resize(0x10, 0x00);
        program.push(0xC0);
        let mut cpu = cpu_with_program(&program);
        cpu.sp = 0x2400;

        assert_eq!(cpu.step(), 11);
        assert_eq!(cpu.pc, 3);
        assert_eq!(cpu.step(), 17);
        assert_eq!(cpu.pc, 0x10);
        assert_eq!(cpu.step(), 11);
        assert_eq!(cpu.pc, 6);
        assert_eq!(cpu.sp, 0x2400);
    }

    #[test]
    fn test_untaken_return_and_jumps() {
        // STC; RNC (not taken); JC 0010; ... at 0x10: JNC 0000 (not taken)
        let mut program = vec![0x37, 0xD0, 0xDA, 0x10, 0x00];
        program.resize(0x10, 0x00);
        program.extend_from_slice(&[0xD2, 0x00, 0x00]);
        let mut cpu = cpu_with_program(&program);

        cpu.step();
        assert_eq!(cpu.step(), 5);
        assert_eq!(cpu.step(), 10);
        assert_eq!(cpu.pc, 0x10);
        assert_eq!(cpu.step(), 10);
        assert_eq!(cpu.pc, 0x13);
    }

    #[test]
    fn test_push_pop_psw() {
        // PUSH PSW; POP B
        let mut cpu = cpu_with_program(&[0xF5, 0xC1, 0xF1]);
        cpu.sp = 0x2400;
        cpu.a = 0x9C;
        cpu.flags = FLAG_S | FLAG_C;
        cpu.step();
        cpu.step();
        assert_eq!(cpu.b, 0x9C);
        assert_eq!(cpu.c, FLAG_S | FLAG_C | 0x02);

        // POP PSW drops the unused bits
        cpu.sp = 0x23FE;
        cpu.memory.ram[0x23FE] = 0xFF;
        cpu.memory.ram[0x23FF] = 0x11;
        cpu.step();
        assert_eq!(cpu.a, 0x11);
        assert_eq!(cpu.flags, FLAG_MASK);
    }

    #[test]
    fn test_rotates() {
        // RLC; RRC; RAL; RAR
        let mut cpu = cpu_with_program(&[0x07, 0x0F, 0x17, 0x1F]);
        cpu.a = 0x81;
        cpu.step();
        assert_eq!(cpu.a, 0x03);
        assert!(cpu.get_flag(FLAG_C));
        cpu.step();
        assert_eq!(cpu.a, 0x81);
        assert!(cpu.get_flag(FLAG_C));
        cpu.step();
        assert_eq!(cpu.a, 0x03);
        assert!(cpu.get_flag(FLAG_C));
        cpu.step();
        assert_eq!(cpu.a, 0x81);
        assert!(cpu.get_flag(FLAG_C));
    }

    #[test]
    fn test_daa_after_bcd_add() {
        // MVI A,38; ADI 45; DAA  -> 83
        let mut cpu = cpu_with_program(&[0x3E, 0x38, 0xC6, 0x45, 0x27]);
        for _ in 0..3 {
            cpu.step();
        }
        assert_eq!(cpu.a, 0x83);
        assert!(!cpu.get_flag(FLAG_C));
    }

    #[test]
    fn test_memory_moves() {
        // LXI H,2000; MVI M,5A; MOV E,M; STA 2001; LHLD 2000; XCHG
        let mut cpu = cpu_with_program(&[
            0x21, 0x00, 0x20, 0x36, 0x5A, 0x5E, 0x32, 0x01, 0x20, 0x2A, 0x00, 0x20, 0xEB,
        ]);
        cpu.a = 0xC3;
        let cycles: Vec<u32> = (0..6).map(|_| cpu.step()).collect();
        assert_eq!(cycles, vec![10, 10, 7, 13, 16, 4]);
        assert_eq!(cpu.de(), 0xC35A);
        assert_eq!(cpu.hl(), 0x005A);
    }

    #[test]
    fn test_xthl_and_sphl() {
        let mut cpu = cpu_with_program(&[0xE3, 0xF9]);
        cpu.sp = 0x2400;
        cpu.memory.ram[0x2400] = 0x34;
        cpu.memory.ram[0x2401] = 0x12;
        cpu.set_hl(0xABCD);
        assert_eq!(cpu.step(), 18);
        assert_eq!(cpu.hl(), 0x1234);
        assert_eq!(cpu.memory.ram[0x2400], 0xCD);
        assert_eq!(cpu.memory.ram[0x2401], 0xAB);
        assert_eq!(cpu.step(), 5);
        assert_eq!(cpu.sp, 0x1234);
    }

    #[test]
    fn test_in_reads_port() {
        let mut cpu = cpu_with_program(&[0xDB, 0x03]);
        cpu.memory.inputs[3] = 0x5A;
        assert_eq!(cpu.step(), 10);
        assert_eq!(cpu.a, 0x5A);
    }

    #[test]
    fn test_rst_pushes_return_address() {
        let mut cpu = cpu_with_program(&[0x00, 0xEF]); // NOP; RST 5
        cpu.sp = 0x2400;
        cpu.step();
        assert_eq!(cpu.step(), 11);
        assert_eq!(cpu.pc, 0x28);
        assert_eq!(cpu.pop_u16(), 2);
    }

    #[test]
    fn test_pc_wraps_at_top_of_memory() {
        let mut cpu = cpu_with_program(&[]);
        cpu.pc = 0xFFFF;
        cpu.step();
        assert_eq!(cpu.pc, 0x0000);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut cpu = cpu_with_program(&[0x3E, 0x77, 0xFB]);
        cpu.step();
        cpu.step();
        cpu.raise_interrupt(1);
        let state = cpu.snapshot();

        let mut other = cpu_with_program(&[]);
        other.restore(&state);
        assert_eq!(other.a, 0x77);
        assert!(other.inte);
        assert_eq!(other.pending_interrupt(), Some(1));
        assert_eq!(other.cycles, 11);
    }
}
