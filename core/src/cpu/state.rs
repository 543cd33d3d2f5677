//! CPU state snapshot types and traits

/// Trait for CPU types that can provide state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
}

/// M65C02 CPU state snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct M65C02State {
    pub a: u8,   // Accumulator
    pub x: u8,   // X index register
    pub y: u8,   // Y index register
    pub pc: u16, // Program counter (address of the next step)
    pub s: u8,   // Stack pointer (page 1)
    pub p: u8,   // Status register (flags)
}
