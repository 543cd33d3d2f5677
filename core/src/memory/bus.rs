use tracing::debug;

use super::MemoryAction;
use super::block_map::BlockMap;
use super::switches::{SoftSwitch, SwitchState};
use crate::core::{Bus, BusMaster, CoreError, SignalLines};

/// Full $C000-$FFFF ROM image.
pub const ROM_SIZE: usize = 0x4000;
/// $D000-$FFFF only; $C100-$CFFF internal ROM reads as zero.
pub const ROM_SIZE_NO_SLOTS: usize = 0x3000;

const RAM_SIZE: usize = 0x10000;

/// Which 64K RAM plane an access lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    Main,
    Aux,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    ZeroPage,
    Banked,
    Switches,
    SlotIo,
    SlotRom,
    ExpansionRom,
    Upper,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SwitchRead {
    Keyboard,
    KeyStrobe,
    Status,
    Speaker,
    Display,
    Annunciator,
    LanguageCard,
    Floating,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SwitchWrite {
    Memory,
    KeyStrobe,
    Speaker,
    Display,
    Annunciator,
    LanguageCard,
    Ignore,
}

// $C000-$C00F write pairs: even address clears, odd sets.
const MEMORY_PAIRS: [SoftSwitch; 8] = [
    SoftSwitch::Store80,
    SoftSwitch::RamRd,
    SoftSwitch::RamWrt,
    SoftSwitch::IntCxRom,
    SoftSwitch::AltZp,
    SoftSwitch::SlotC3Rom,
    SoftSwitch::Col80,
    SoftSwitch::AltCharSet,
];

const DISPLAY_PAIRS: [SoftSwitch; 4] = [
    SoftSwitch::Text,
    SoftSwitch::Mixed,
    SoftSwitch::Page2,
    SoftSwitch::Hires,
];

const ANNUNCIATOR_PAIRS: [SoftSwitch; 4] = [
    SoftSwitch::An0,
    SoftSwitch::An1,
    SoftSwitch::An2,
    SoftSwitch::An3,
];

/// Apple IIe memory bus.
///
/// Owns both RAM planes, the ROM image, the soft switches, the slot cards
/// and the shared signal lines. Every CPU access is decoded through a
/// change-point [`BlockMap`] to one of the region handlers below.
pub struct MemoryBus {
    main: Box<[u8]>,
    aux: Box<[u8]>,
    rom: Box<[u8]>,
    switches: SwitchState,

    regions: BlockMap<Region>,
    switch_reads: BlockMap<SwitchRead>,
    switch_writes: BlockMap<SwitchWrite>,

    cards: [Option<Box<dyn MemoryAction>>; 8],
    /// Slot whose expansion ROM currently owns $C800-$CFFF.
    expansion_slot: Option<usize>,

    key_latch: u8,
    any_key_down: bool,
    floating: u8,
    vertical_blank: bool,

    signals: SignalLines,
}

impl MemoryBus {
    /// Build a bus around a 16K ($C000-$FFFF) or 12K ($D000-$FFFF) ROM image.
    pub fn new(rom: &[u8]) -> Result<Self, CoreError> {
        let mut image = vec![0u8; ROM_SIZE].into_boxed_slice();
        match rom.len() {
            ROM_SIZE => image.copy_from_slice(rom),
            ROM_SIZE_NO_SLOTS => image[ROM_SIZE - ROM_SIZE_NO_SLOTS..].copy_from_slice(rom),
            actual => {
                return Err(CoreError::UnsupportedMemorySize {
                    region: "ROM",
                    expected: "16384 or 12288 bytes",
                    actual,
                });
            }
        }

        Ok(Self {
            main: vec![0u8; RAM_SIZE].into_boxed_slice(),
            aux: vec![0u8; RAM_SIZE].into_boxed_slice(),
            rom: image,
            switches: SwitchState::default(),
            regions: BlockMap::from_change_points([
                (0x0000, Region::ZeroPage),
                (0x0200, Region::Banked),
                (0xC000, Region::Switches),
                (0xC090, Region::SlotIo),
                (0xC100, Region::SlotRom),
                (0xC800, Region::ExpansionRom),
                (0xD000, Region::Upper),
            ]),
            switch_reads: BlockMap::from_change_points([
                (0xC000, SwitchRead::Keyboard),
                (0xC010, SwitchRead::KeyStrobe),
                (0xC011, SwitchRead::Status),
                (0xC020, SwitchRead::Floating),
                (0xC030, SwitchRead::Speaker),
                (0xC040, SwitchRead::Floating),
                (0xC050, SwitchRead::Display),
                (0xC058, SwitchRead::Annunciator),
                (0xC060, SwitchRead::Floating),
                (0xC080, SwitchRead::LanguageCard),
            ]),
            switch_writes: BlockMap::from_change_points([
                (0xC000, SwitchWrite::Memory),
                (0xC010, SwitchWrite::KeyStrobe),
                (0xC020, SwitchWrite::Ignore),
                (0xC030, SwitchWrite::Speaker),
                (0xC040, SwitchWrite::Ignore),
                (0xC050, SwitchWrite::Display),
                (0xC058, SwitchWrite::Annunciator),
                (0xC060, SwitchWrite::Ignore),
                (0xC080, SwitchWrite::LanguageCard),
            ]),
            cards: std::array::from_fn(|_| None),
            expansion_slot: None,
            key_latch: 0,
            any_key_down: false,
            floating: 0,
            vertical_blank: false,
            signals: SignalLines::default(),
        })
    }

    // -----------------------------------------------------------------------
    // Host / peripheral surface
    // -----------------------------------------------------------------------

    /// Power cycle: clear both RAM planes, the keyboard and the signal
    /// lines, then restore switch defaults.
    pub fn cold_reset(&mut self) {
        self.main.fill(0);
        self.aux.fill(0);
        self.key_latch = 0;
        self.any_key_down = false;
        self.signals = SignalLines::default();
        self.restore_switches();
        debug!("memory bus cold reset");
    }

    fn restore_switches(&mut self) {
        self.switches.restore_defaults();
        self.expansion_slot = None;
    }

    /// Install a peripheral card in slot 1..=7, replacing any previous card.
    pub fn install_card(
        &mut self,
        slot: usize,
        card: Box<dyn MemoryAction>,
    ) -> Result<(), CoreError> {
        if !(1..=7).contains(&slot) {
            return Err(CoreError::InvalidSlot(slot));
        }
        self.cards[slot] = Some(card);
        debug!(slot, "card installed");
        Ok(())
    }

    pub fn remove_card(&mut self, slot: usize) -> Option<Box<dyn MemoryAction>> {
        self.cards.get_mut(slot).and_then(Option::take)
    }

    /// Latch a key (7-bit code) and raise the strobe.
    pub fn press_key(&mut self, code: u8) {
        self.key_latch = code | 0x80;
        self.any_key_down = true;
    }

    pub fn release_key(&mut self) {
        self.any_key_down = false;
    }

    /// Whether the keyboard strobe is still set (key not yet consumed).
    pub fn key_strobe(&self) -> bool {
        self.key_latch & 0x80 != 0
    }

    pub fn set_floating_bus(&mut self, value: u8) {
        self.floating = value;
    }

    pub fn floating_bus(&self) -> u8 {
        self.floating
    }

    pub fn set_vertical_blank(&mut self, active: bool) {
        self.vertical_blank = active;
    }

    pub fn switches(&self) -> &SwitchState {
        &self.switches
    }

    pub fn switches_mut(&mut self) -> &mut SwitchState {
        &mut self.switches
    }

    pub fn ram(&self, plane: Plane) -> &[u8] {
        match plane {
            Plane::Main => &self.main,
            Plane::Aux => &self.aux,
        }
    }

    pub fn ram_mut(&mut self, plane: Plane) -> &mut [u8] {
        match plane {
            Plane::Main => &mut self.main,
            Plane::Aux => &mut self.aux,
        }
    }

    /// The 16K ROM image as mapped at $C000.
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    /// Byte the video circuit fetches from main RAM. No side effects.
    pub fn video_fetch(&self, addr: u16) -> u8 {
        self.main[addr as usize]
    }

    /// Side-effect-free read through the current memory map.
    pub fn peek(&mut self, addr: u16) -> u8 {
        self.read(BusMaster::Observer, addr)
    }

    /// Side-effect-free write through the current memory map. Soft switches
    /// are not touched.
    pub fn poke(&mut self, addr: u16, data: u8) {
        self.write(BusMaster::Observer, addr, data);
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    #[inline]
    fn zp_plane(&self) -> Plane {
        if self.switches.get(SoftSwitch::AltZp) {
            Plane::Aux
        } else {
            Plane::Main
        }
    }

    /// Plane for $0200-$BFFF. With 80STORE, the text page (and with HIRES
    /// also hires page 1) follows PAGE2 instead of RAMRD/RAMWRT.
    fn banked_plane(&self, addr: u16, write: bool) -> Plane {
        let s = &self.switches;
        if s.get(SoftSwitch::Store80) {
            let display = (0x0400..0x0800).contains(&addr)
                || (s.get(SoftSwitch::Hires) && (0x2000..0x4000).contains(&addr));
            if display {
                return if s.get(SoftSwitch::Page2) { Plane::Aux } else { Plane::Main };
            }
        }
        let aux = if write {
            s.get(SoftSwitch::RamWrt)
        } else {
            s.get(SoftSwitch::RamRd)
        };
        if aux { Plane::Aux } else { Plane::Main }
    }

    /// RAM offset for $D000-$FFFF: bank 1 of the $D000 window lives at $C000.
    #[inline]
    fn upper_offset(&self, addr: u16) -> usize {
        if self.switches.get(SoftSwitch::Bank1) && addr < 0xE000 {
            (addr - 0x1000) as usize
        } else {
            addr as usize
        }
    }

    #[inline]
    fn rom_byte(&self, addr: u16) -> u8 {
        self.rom[(addr - 0xC000) as usize]
    }

    // -----------------------------------------------------------------------
    // Soft switches
    // -----------------------------------------------------------------------

    fn status(&self, addr: u16) -> u8 {
        let s = &self.switches;
        let on = match addr & 0x0F {
            0x1 => !s.get(SoftSwitch::Bank1),
            0x2 => s.get(SoftSwitch::HRamRd),
            0x3 => s.get(SoftSwitch::RamRd),
            0x4 => s.get(SoftSwitch::RamWrt),
            0x5 => s.get(SoftSwitch::IntCxRom),
            0x6 => s.get(SoftSwitch::AltZp),
            0x7 => s.get(SoftSwitch::SlotC3Rom),
            0x8 => s.get(SoftSwitch::Store80),
            0x9 => !self.vertical_blank,
            0xA => s.get(SoftSwitch::Text),
            0xB => s.get(SoftSwitch::Mixed),
            0xC => s.get(SoftSwitch::Page2),
            0xD => s.get(SoftSwitch::Hires),
            0xE => s.get(SoftSwitch::AltCharSet),
            0xF => s.get(SoftSwitch::Col80),
            _ => false,
        };
        ((on as u8) << 7) | (self.floating & 0x7F)
    }

    /// $C080-$C08F. Two consecutive odd-address reads enable RAM writes;
    /// any even address or any write breaks the sequence.
    fn language_card(&mut self, addr: u16, write: bool) {
        let s = &mut self.switches;
        let mode = addr & 0x03;
        s.set(SoftSwitch::Bank1, addr & 0x08 != 0);
        s.set(SoftSwitch::HRamRd, mode == 0 || mode == 3);

        if addr & 0x01 == 0 {
            s.set(SoftSwitch::PreWrite, false);
            s.set(SoftSwitch::HRamWrt, false);
        } else if write {
            s.set(SoftSwitch::PreWrite, false);
        } else {
            if s.get(SoftSwitch::PreWrite) {
                s.set(SoftSwitch::HRamWrt, true);
            }
            s.set(SoftSwitch::PreWrite, true);
        }
    }

    fn read_switch(&mut self, master: BusMaster, addr: u16) -> u8 {
        let Some(handler) = self.switch_reads.resolve(addr) else {
            return self.floating;
        };
        if handler == SwitchRead::Keyboard {
            return self.key_latch;
        }
        if handler == SwitchRead::Status {
            return self.status(addr);
        }
        if handler == SwitchRead::KeyStrobe {
            let value = ((self.any_key_down as u8) << 7) | (self.key_latch & 0x7F);
            if master.has_side_effects() {
                self.key_latch &= 0x7F;
            }
            return value;
        }
        if master.has_side_effects() {
            self.touch_switch(handler, addr);
        }
        self.floating
    }

    /// Side effects of reading an any-access switch.
    fn touch_switch(&mut self, handler: SwitchRead, addr: u16) {
        let pair = ((addr >> 1) & 0x03) as usize;
        let on = addr & 0x01 != 0;
        match handler {
            SwitchRead::Speaker => self.switches.toggle(SoftSwitch::Speaker),
            SwitchRead::Display => {
                self.switches.set(DISPLAY_PAIRS[pair], on);
            }
            SwitchRead::Annunciator => {
                self.switches.set(ANNUNCIATOR_PAIRS[pair], on);
            }
            SwitchRead::LanguageCard => self.language_card(addr, false),
            SwitchRead::Keyboard
            | SwitchRead::KeyStrobe
            | SwitchRead::Status
            | SwitchRead::Floating => {}
        }
    }

    fn write_switch(&mut self, master: BusMaster, addr: u16) {
        if !master.has_side_effects() {
            return;
        }
        let Some(handler) = self.switch_writes.resolve(addr) else {
            return;
        };
        let pair = ((addr >> 1) & 0x03) as usize;
        let on = addr & 0x01 != 0;
        match handler {
            SwitchWrite::Memory => {
                self.switches.set(MEMORY_PAIRS[((addr >> 1) & 0x07) as usize], on);
            }
            SwitchWrite::KeyStrobe => self.key_latch &= 0x7F,
            SwitchWrite::Speaker => self.switches.toggle(SoftSwitch::Speaker),
            SwitchWrite::Display => {
                self.switches.set(DISPLAY_PAIRS[pair], on);
            }
            SwitchWrite::Annunciator => {
                self.switches.set(ANNUNCIATOR_PAIRS[pair], on);
            }
            SwitchWrite::LanguageCard => self.language_card(addr, true),
            SwitchWrite::Ignore => {}
        }
    }

    // -----------------------------------------------------------------------
    // Slots
    // -----------------------------------------------------------------------

    #[inline]
    fn io_slot(addr: u16) -> usize {
        ((addr >> 4) & 0x07) as usize
    }

    #[inline]
    fn rom_slot(addr: u16) -> usize {
        ((addr >> 8) & 0x07) as usize
    }

    /// Whether $Cn00-$CnFF is served by internal ROM. Touching the internal
    /// $C3 page latches INTC8ROM.
    fn internal_slot_rom(&mut self, master: BusMaster, addr: u16) -> bool {
        if self.switches.get(SoftSwitch::IntCxRom) {
            return true;
        }
        if Self::rom_slot(addr) == 3 && !self.switches.get(SoftSwitch::SlotC3Rom) {
            if master.has_side_effects() {
                self.switches.set(SoftSwitch::IntC8Rom, true);
            }
            return true;
        }
        if master.has_side_effects() {
            self.expansion_slot = Some(Self::rom_slot(addr));
        }
        false
    }

    fn expansion_internal(&self) -> bool {
        self.switches.get(SoftSwitch::IntCxRom) || self.switches.get(SoftSwitch::IntC8Rom)
    }

    /// $CFFF deselects every expansion ROM.
    fn release_expansion(&mut self, master: BusMaster, addr: u16) {
        if addr == 0xCFFF && master.has_side_effects() {
            self.switches.set(SoftSwitch::IntC8Rom, false);
            self.expansion_slot = None;
        }
    }
}

impl Bus for MemoryBus {
    fn read(&mut self, master: BusMaster, addr: u16) -> u8 {
        match self.regions.resolve(addr) {
            Some(Region::ZeroPage) => self.ram(self.zp_plane())[addr as usize],
            Some(Region::Banked) => self.ram(self.banked_plane(addr, false))[addr as usize],
            Some(Region::Switches) => self.read_switch(master, addr),
            Some(Region::SlotIo) => {
                if !master.has_side_effects() {
                    return self.floating;
                }
                let slot = Self::io_slot(addr);
                match self.cards[slot].as_mut() {
                    Some(card) => card.read(addr),
                    None => self.floating,
                }
            }
            Some(Region::SlotRom) => {
                if self.internal_slot_rom(master, addr) {
                    return self.rom_byte(addr);
                }
                let slot = Self::rom_slot(addr);
                match self.cards[slot].as_mut() {
                    Some(card) => card.read(addr),
                    None => self.floating,
                }
            }
            Some(Region::ExpansionRom) => {
                let value = if self.expansion_internal() {
                    self.rom_byte(addr)
                } else if let Some(slot) = self.expansion_slot
                    && let Some(card) = self.cards[slot].as_mut()
                {
                    card.read(addr)
                } else {
                    self.floating
                };
                self.release_expansion(master, addr);
                value
            }
            Some(Region::Upper) => {
                if self.switches.get(SoftSwitch::HRamRd) {
                    let offset = self.upper_offset(addr);
                    self.ram(self.zp_plane())[offset]
                } else {
                    self.rom_byte(addr)
                }
            }
            None => self.floating,
        }
    }

    fn write(&mut self, master: BusMaster, addr: u16, data: u8) {
        match self.regions.resolve(addr) {
            Some(Region::ZeroPage) => {
                let plane = self.zp_plane();
                self.ram_mut(plane)[addr as usize] = data;
            }
            Some(Region::Banked) => {
                let plane = self.banked_plane(addr, true);
                self.ram_mut(plane)[addr as usize] = data;
            }
            Some(Region::Switches) => self.write_switch(master, addr),
            Some(Region::SlotIo) => {
                if master.has_side_effects()
                    && let Some(card) = self.cards[Self::io_slot(addr)].as_mut()
                {
                    card.write(addr, data);
                }
            }
            Some(Region::SlotRom) => {
                if !self.internal_slot_rom(master, addr)
                    && let Some(card) = self.cards[Self::rom_slot(addr)].as_mut()
                {
                    card.write(addr, data);
                }
            }
            Some(Region::ExpansionRom) => {
                if !self.expansion_internal()
                    && let Some(slot) = self.expansion_slot
                    && let Some(card) = self.cards[slot].as_mut()
                {
                    card.write(addr, data);
                }
                self.release_expansion(master, addr);
            }
            Some(Region::Upper) => {
                if self.switches.get(SoftSwitch::HRamWrt) {
                    let plane = self.zp_plane();
                    let offset = self.upper_offset(addr);
                    self.ram_mut(plane)[offset] = data;
                }
            }
            None => {}
        }
    }

    fn signals(&mut self) -> &mut SignalLines {
        &mut self.signals
    }

    /// Restore soft-switch defaults; RAM is preserved.
    fn warm_reset(&mut self) {
        self.restore_switches();
        debug!("memory bus warm reset");
    }
}
