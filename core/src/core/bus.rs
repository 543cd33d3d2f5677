use super::error::CoreError;

/// Identifies who is accessing the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusMaster {
    Cpu(usize), // CPU 0, CPU 1, etc.
    Dma,        // Peripheral-driven transfers; decoded exactly like CPU accesses
    Observer,   // Side-effect-free access (video fetches, debuggers, test harnesses)
}

impl BusMaster {
    /// Whether an access by this master may mutate soft switches or latches.
    #[inline]
    pub fn has_side_effects(self) -> bool {
        !matches!(self, BusMaster::Observer)
    }
}

/// 8-bit address/data bus shared by the CPU and all peripherals.
///
/// The bus also owns the [`SignalLines`] (interrupt latch and cycle-steal
/// request) so that any component can raise a signal from inside its own
/// `cycle()` without holding a reference to the CPU.
pub trait Bus {
    fn read(&mut self, master: BusMaster, addr: u16) -> u8;
    fn write(&mut self, master: BusMaster, addr: u16, data: u8);

    /// Shared interrupt / cycle-steal lines, sampled by the CPU between steps.
    fn signals(&mut self) -> &mut SignalLines;

    /// Restore soft switches to their power-on defaults without touching
    /// memory contents. Flat buses have nothing to restore.
    fn warm_reset(&mut self) {}
}

/// Interrupt sources, in ascending priority order.
///
/// These double as the CPU's synthetic pseudo-opcodes: a pending interrupt
/// replaces the next fetched opcode at an instruction boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interrupt {
    Irq,
    Nmi,
    /// Host-originated halt. Sticky until a RES is raised.
    Hlt,
    Res,
}

/// Single pending-interrupt slot.
///
/// Raising an interrupt of lower priority than the one already pending is
/// ignored; equal or higher priority replaces it.
#[derive(Clone, Debug, Default)]
pub struct InterruptLatch {
    pending: Option<Interrupt>,
}

impl InterruptLatch {
    pub fn raise(&mut self, interrupt: Interrupt) {
        if self.pending.is_none_or(|current| interrupt >= current) {
            self.pending = Some(interrupt);
        }
    }

    pub fn pending(&self) -> Option<Interrupt> {
        self.pending
    }

    pub fn take(&mut self) -> Option<Interrupt> {
        self.pending.take()
    }

    /// Clear the latch only if `interrupt` is the one pending
    /// (e.g. a device dropping its IRQ line).
    pub fn clear(&mut self, interrupt: Interrupt) {
        if self.pending == Some(interrupt) {
            self.pending = None;
        }
    }
}

/// Signals written by peripherals and consumed by the CPU.
#[derive(Clone, Debug, Default)]
pub struct SignalLines {
    pub interrupts: InterruptLatch,
    stolen_cycles: u32,
}

impl SignalLines {
    /// Force the CPU to idle for `cycles` extra cycles on its next step
    /// (DMA-style contention). Valid range is 1..=5.
    pub fn request_cycle_steal(&mut self, cycles: u8) -> Result<(), CoreError> {
        if !(1..=5).contains(&cycles) {
            return Err(CoreError::CycleStealOutOfRange(cycles));
        }
        self.stolen_cycles += cycles as u32;
        Ok(())
    }

    /// Consume all outstanding stolen cycles.
    pub fn take_stolen_cycles(&mut self) -> u32 {
        std::mem::take(&mut self.stolen_cycles)
    }
}
