use orchard_core::core::machine::{Machine, RunOutcome};
use orchard_core::core::{
    Bus, ComponentId, CoreError, Interrupt, Pacing, Scheduler, StepOutcome, StopHandle,
};
use orchard_core::cpu::state::M65C02State;
use orchard_core::cpu::{Cpu, CpuStateTrait, M65C02};
use orchard_core::device::video_scanner::CYCLES_PER_FRAME;
use orchard_core::device::{Keyboard, Speaker, VideoScanner};
use orchard_core::memory::{MemoryBus, ROM_SIZE};
use tracing::{debug, info};

use crate::registry::MachineEntry;
use crate::rom_loader::{RomEntry, RomLoadError, RomRegion, RomSet};

// ---------------------------------------------------------------------------
// Apple IIe (enhanced) ROM definitions
//
// Two 8K chips: CD ROM at $C000-$DFFF and EF ROM at $E000-$FFFF. A single
// pre-assembled 16K (or 12K, $D000-$FFFF) image is accepted as well.
// ---------------------------------------------------------------------------

/// File name of a pre-assembled system ROM image.
pub const APPLE2E_IMAGE: &str = "apple2e.rom";

pub static APPLE2E_ROM: RomRegion = RomRegion {
    size: ROM_SIZE,
    entries: &[
        RomEntry {
            name: "342-0304-a.e10",
            size: 0x2000,
            offset: 0x0000,
            crc32: &[],
        },
        RomEntry {
            name: "342-0303-a.e8",
            size: 0x2000,
            offset: 0x2000,
            crc32: &[],
        },
    ],
};

/// Scheduler units per CPU cycle: the 14.318 MHz master clock divided down
/// to the 1.023 MHz CPU clock.
pub const UNITS_PER_CYCLE: u64 = 14;

/// Wall-clock length of one scheduler unit at 100% speed.
const NANOS_PER_UNIT: u64 = 70;

/// CPU cycles between speaker samples (about 22 kHz).
const SPEAKER_INTERVAL: u32 = 46;

/// Apple IIe: 65C02, IIe memory bus and the scanner, speaker and keyboard
/// devices, interleaved by one scheduler.
pub struct Apple2e {
    scheduler: Scheduler<MemoryBus>,
    cpu: ComponentId,
    video: ComponentId,
    speaker: ComponentId,
    keyboard: ComponentId,
}

impl Apple2e {
    /// Build and power on a machine from a 16K or 12K ROM image.
    pub fn new(rom: &[u8]) -> Result<Self, CoreError> {
        let mut scheduler = Scheduler::new(MemoryBus::new(rom)?);
        let cpu = scheduler.register(M65C02::new(), UNITS_PER_CYCLE);
        let video = scheduler.register(VideoScanner::new(), UNITS_PER_CYCLE);
        let speaker = scheduler.register(Speaker::new(SPEAKER_INTERVAL), UNITS_PER_CYCLE);
        let keyboard = scheduler.register(Keyboard::new(), UNITS_PER_CYCLE);
        scheduler.cold_reset();
        info!(rom_bytes = rom.len(), "apple2e powered on");
        Ok(Self {
            scheduler,
            cpu,
            video,
            speaker,
            keyboard,
        })
    }

    /// Build from a ROM set holding either [`APPLE2E_IMAGE`] or the two
    /// motherboard chips.
    pub fn from_rom_set(rom_set: &RomSet, verify_checksums: bool) -> Result<Self, RomLoadError> {
        let image = match rom_set.get(APPLE2E_IMAGE) {
            Some(image) => image.to_vec(),
            None if verify_checksums => APPLE2E_ROM.load(rom_set)?,
            None => APPLE2E_ROM.load_skip_checksums(rom_set)?,
        };
        Ok(Self::new(&image)?)
    }

    pub fn bus(&self) -> &MemoryBus {
        self.scheduler.context()
    }

    pub fn bus_mut(&mut self) -> &mut MemoryBus {
        self.scheduler.context_mut()
    }

    pub fn cpu(&self) -> Option<&M65C02> {
        self.scheduler.component::<M65C02>(self.cpu)
    }

    pub fn video(&self) -> Option<&VideoScanner> {
        self.scheduler.component::<VideoScanner>(self.video)
    }

    pub fn speaker_mut(&mut self) -> Option<&mut Speaker> {
        self.scheduler.component_mut::<Speaker>(self.speaker)
    }

    pub fn scheduler(&self) -> &Scheduler<MemoryBus> {
        &self.scheduler
    }

    /// Scheduler time at which the CPU next runs.
    pub fn cpu_timestamp(&self) -> u64 {
        self.scheduler.timestamp_of(self.cpu)
    }

    /// Queue text for the keyboard; newlines become returns.
    pub fn type_text(&mut self, text: &str) {
        if let Some(keyboard) = self.scheduler.component_mut::<Keyboard>(self.keyboard) {
            keyboard.push_str(text);
        }
    }
}

impl Machine for Apple2e {
    fn run_frame(&mut self) -> Result<RunOutcome, CoreError> {
        self.run_cycles(CYCLES_PER_FRAME)
    }

    fn run_cycles(&mut self, cycles: u64) -> Result<RunOutcome, CoreError> {
        match self.scheduler.run_for(cycles * UNITS_PER_CYCLE)? {
            StepOutcome::Interrupted => Ok(RunOutcome::Interrupted),
            StepOutcome::Ran { .. } | StepOutcome::Idle => Ok(RunOutcome::Completed),
        }
    }

    fn reset(&mut self) {
        debug!("apple2e reset requested");
        self.bus_mut().signals().interrupts.raise(Interrupt::Res);
    }

    fn power_cycle(&mut self) {
        self.bus_mut().cold_reset();
        self.scheduler.cold_reset();
        info!("apple2e power cycled");
    }

    fn halt(&mut self) {
        self.bus_mut().signals().interrupts.raise(Interrupt::Hlt);
    }

    fn type_key(&mut self, key: u8) {
        if let Some(keyboard) = self.scheduler.component_mut::<Keyboard>(self.keyboard) {
            keyboard.push(key);
        }
    }

    fn cpu_state(&self) -> M65C02State {
        self.cpu().map(|cpu| cpu.snapshot()).unwrap_or_default()
    }

    fn cpu_cycles(&self) -> u64 {
        self.cpu().map_or(0, |cpu| cpu.total_cycles())
    }

    fn set_speed(&mut self, percent: u32, granularity: u64) {
        let pacing = (percent > 0).then(|| Pacing {
            nanos_per_unit: (NANOS_PER_UNIT * 100 / percent as u64).max(1),
            granularity,
        });
        self.scheduler.set_pacing(pacing);
    }

    fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }
}

fn create_machine(rom_set: &RomSet) -> Result<Box<dyn Machine>, RomLoadError> {
    Ok(Box::new(Apple2e::from_rom_set(rom_set, true)?))
}

inventory::submit! {
    MachineEntry::new("apple2e", "apple2ee", APPLE2E_IMAGE, create_machine)
}
