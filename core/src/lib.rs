pub mod core;
pub mod cpu;
pub mod device;
pub mod memory;

pub use crate::core::CoreError;

pub mod prelude {
    pub use crate::core::machine::{Machine, RunOutcome};
    pub use crate::core::scheduler::{ComponentId, Pacing, Scheduler, StopHandle};
    pub use crate::core::{Bus, BusMaster, Component, CoreError, Interrupt, SignalLines};
    pub use crate::cpu::Cpu;
    pub use crate::memory::{MemoryAction, MemoryBus, SoftSwitch};
}
