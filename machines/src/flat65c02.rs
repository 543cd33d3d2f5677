use orchard_core::core::{Bus, BusMaster, CoreError, Interrupt, SignalLines};
use orchard_core::cpu::state::M65C02State;
use orchard_core::cpu::{CpuStateTrait, M65C02};

/// Flat 64KB RAM with no I/O, for running bare 65C02 programs.
pub struct FlatMemory {
    ram: Box<[u8]>,
    signals: SignalLines,
}

impl Bus for FlatMemory {
    fn read(&mut self, _master: BusMaster, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn write(&mut self, _master: BusMaster, addr: u16, data: u8) {
        self.ram[addr as usize] = data;
    }

    fn signals(&mut self) -> &mut SignalLines {
        &mut self.signals
    }
}

/// A 65C02 wired to [`FlatMemory`], stepped directly without a scheduler.
pub struct Flat65C02System {
    pub cpu: M65C02,
    memory: FlatMemory,
    clock: u64,
}

impl Default for Flat65C02System {
    fn default() -> Self {
        Self::new()
    }
}

impl Flat65C02System {
    pub fn new() -> Self {
        Self {
            cpu: M65C02::new(),
            memory: FlatMemory {
                ram: vec![0; 0x10000].into_boxed_slice(),
                signals: SignalLines::default(),
            },
            clock: 0,
        }
    }

    /// Execute one instruction step.
    pub fn tick(&mut self) -> Result<u32, CoreError> {
        let cycles = self.cpu.cycle(&mut self.memory)?;
        self.clock += cycles as u64;
        Ok(cycles)
    }

    /// Step until `pc` reaches `addr` or `max_cycles` have elapsed. Returns
    /// whether `addr` was reached.
    pub fn run_to(&mut self, addr: u16, max_cycles: u64) -> Result<bool, CoreError> {
        let limit = self.clock + max_cycles;
        while self.clock < limit {
            if self.cpu.regs.pc == addr {
                return Ok(true);
            }
            self.tick()?;
        }
        Ok(self.cpu.regs.pc == addr)
    }

    pub fn load_program(&mut self, offset: usize, data: &[u8]) {
        if offset + data.len() <= self.memory.ram.len() {
            self.memory.ram[offset..offset + data.len()].copy_from_slice(data);
        }
    }

    /// Cold-reset the CPU; the next step runs RES through $FFFC.
    pub fn power_on(&mut self, reset_vector: u16) {
        self.load_program(0xFFFC, &reset_vector.to_le_bytes());
        self.cpu.cold_reset(&mut self.memory);
        self.clock = 0;
    }

    pub fn raise(&mut self, interrupt: Interrupt) {
        self.memory.signals.interrupts.raise(interrupt);
    }

    pub fn ram(&self) -> &[u8] {
        &self.memory.ram
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn get_cpu_state(&self) -> M65C02State {
        self.cpu.snapshot()
    }
}
