/// Generic CPU interface
pub trait Cpu: CpuStateTrait {
    /// Queue a reset sequence as the next step.
    fn reset(&mut self);

    /// Query if the CPU is halted (host HLT latched)
    fn is_sleeping(&self) -> bool;

    /// Total cycles consumed since power-on.
    fn total_cycles(&self) -> u64;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, M65C02State};

pub mod m65c02;
pub use m65c02::M65C02;
