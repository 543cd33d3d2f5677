use super::error::CoreError;
use super::scheduler::StopHandle;
use crate::cpu::state::M65C02State;

/// How a bounded run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The requested number of cycles elapsed.
    Completed,
    /// A stop was requested through the machine's [`StopHandle`].
    Interrupted,
}

/// Machine-agnostic interface for emulated systems.
///
/// Each machine assembles a CPU, a bus and its peripherals behind this trait
/// so the frontend can drive it without knowing about soft switches, slot
/// cards or clock ratios.
pub trait Machine {
    /// Run one video frame's worth of CPU cycles.
    fn run_frame(&mut self) -> Result<RunOutcome, CoreError>;

    /// Run for a number of CPU cycles.
    fn run_cycles(&mut self, cycles: u64) -> Result<RunOutcome, CoreError>;

    /// Warm reset: queue a RES on the interrupt lines.
    fn reset(&mut self);

    /// Power cycle: clear memory, restore switches and cold-reset every component.
    fn power_cycle(&mut self);

    /// Host-originated halt. The CPU warm-resets the bus once and then idles
    /// until the next [`reset`](Self::reset).
    fn halt(&mut self);

    /// Queue a key code (7-bit ASCII) for the keyboard latch.
    fn type_key(&mut self, key: u8);

    /// Current CPU register snapshot.
    fn cpu_state(&self) -> M65C02State;

    /// Total CPU cycles executed since power-on.
    fn cpu_cycles(&self) -> u64;

    /// Pace emulation at `percent` of real time, letting the emulated clock
    /// lead by up to `granularity` scheduler units. `0` runs unpaced.
    fn set_speed(&mut self, percent: u32, granularity: u64);

    /// Handle used to interrupt a running (or pacing) machine.
    fn stop_handle(&self) -> StopHandle;
}
