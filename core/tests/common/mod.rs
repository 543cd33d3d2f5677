#![allow(dead_code)]

use orchard_core::core::{Bus, BusMaster, SignalLines};
use orchard_core::cpu::M65C02;

/// Minimal bus for testing: flat 64KB read/write memory, no peripherals.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub signals: SignalLines,
    /// Number of `warm_reset` calls received.
    pub warm_resets: u32,
    /// Every write, in order.
    pub writes: Vec<(u16, u8)>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            signals: SignalLines::default(),
            warm_resets: 0,
            writes: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn set_vector(&mut self, vector: u16, target: u16) {
        self.load(vector, &target.to_le_bytes());
    }
}

impl Bus for TestBus {
    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.writes.push((addr, data));
    }

    fn signals(&mut self) -> &mut SignalLines {
        &mut self.signals
    }

    fn warm_reset(&mut self) {
        self.warm_resets += 1;
    }
}

/// Load `program` at `origin`, point PC at it and decode the first opcode.
pub fn start(cpu: &mut M65C02, bus: &mut TestBus, origin: u16, program: &[u8]) {
    bus.load(origin, program);
    cpu.regs.pc = origin;
    cpu.prime(bus);
}

/// Execute `n` instruction steps; returns the cycles consumed.
pub fn step(cpu: &mut M65C02, bus: &mut TestBus, n: usize) -> u32 {
    (0..n).map(|_| cpu.cycle(bus).unwrap()).sum()
}
