use std::cell::RefCell;
use std::rc::Rc;

use orchard_core::core::{Bus, BusMaster};
use orchard_core::memory::{MemoryAction, MemoryBus, Plane, ROM_SIZE, SoftSwitch};

const CPU: BusMaster = BusMaster::Cpu(0);

/// ROM whose every byte holds the high byte of its own address.
fn rom() -> Vec<u8> {
    (0..ROM_SIZE).map(|i| ((0xC000 + i) >> 8) as u8).collect()
}

fn bus() -> MemoryBus {
    MemoryBus::new(&rom()).unwrap()
}

// =============================================================================
// Soft-switch round trips
// =============================================================================

/// (switch, clear address, set address, status address)
const WRITE_PAIRS: [(SoftSwitch, u16, u16, u16); 8] = [
    (SoftSwitch::Store80, 0xC000, 0xC001, 0xC018),
    (SoftSwitch::RamRd, 0xC002, 0xC003, 0xC013),
    (SoftSwitch::RamWrt, 0xC004, 0xC005, 0xC014),
    (SoftSwitch::IntCxRom, 0xC006, 0xC007, 0xC015),
    (SoftSwitch::AltZp, 0xC008, 0xC009, 0xC016),
    (SoftSwitch::SlotC3Rom, 0xC00A, 0xC00B, 0xC017),
    (SoftSwitch::Col80, 0xC00C, 0xC00D, 0xC01F),
    (SoftSwitch::AltCharSet, 0xC00E, 0xC00F, 0xC01E),
];

const ACCESS_PAIRS: [(SoftSwitch, u16, u16, u16); 4] = [
    (SoftSwitch::Text, 0xC050, 0xC051, 0xC01A),
    (SoftSwitch::Mixed, 0xC052, 0xC053, 0xC01B),
    (SoftSwitch::Page2, 0xC054, 0xC055, 0xC01C),
    (SoftSwitch::Hires, 0xC056, 0xC057, 0xC01D),
];

#[test]
fn test_write_only_pairs_round_trip() {
    let mut bus = bus();
    for (switch, off, on, status) in WRITE_PAIRS {
        bus.write(CPU, on, 0);
        assert!(bus.switches().get(switch), "{}", switch.name());
        assert_eq!(bus.read(CPU, status) & 0x80, 0x80, "{}", switch.name());
        bus.write(CPU, off, 0);
        assert!(!bus.switches().get(switch), "{}", switch.name());
        assert_eq!(bus.read(CPU, status) & 0x80, 0x00, "{}", switch.name());
    }
}

#[test]
fn test_write_only_pairs_ignore_reads() {
    let mut bus = bus();
    bus.read(CPU, 0xC003);
    assert!(!bus.switches().get(SoftSwitch::RamRd));
}

#[test]
fn test_repeated_switch_writes_count_once() {
    let mut bus = bus();
    let start = bus.switches().iteration();
    for _ in 0..4 {
        bus.write(CPU, 0xC003, 0);
    }
    assert_eq!(bus.switches().iteration(), start + 1);
    assert_eq!(bus.switches().transitions(SoftSwitch::RamRd), 1);

    bus.read(CPU, 0xC013);
    bus.write(CPU, 0xC002, 0);
    bus.write(CPU, 0xC002, 0);
    assert_eq!(bus.switches().iteration(), start + 2);
}

#[test]
fn test_display_pairs_respond_to_reads_and_writes() {
    let mut bus = bus();
    for (switch, off, on, status) in ACCESS_PAIRS {
        bus.read(CPU, on);
        assert!(bus.switches().get(switch), "{}", switch.name());
        assert_eq!(bus.read(CPU, status) & 0x80, 0x80);
        bus.write(CPU, off, 0);
        assert!(!bus.switches().get(switch), "{}", switch.name());
        assert_eq!(bus.read(CPU, status) & 0x80, 0x00);
        bus.write(CPU, on, 0);
        assert!(bus.switches().get(switch), "{}", switch.name());
        bus.read(CPU, off);
        assert!(!bus.switches().get(switch), "{}", switch.name());
    }
}

#[test]
fn test_annunciators() {
    let mut bus = bus();
    let ans = [SoftSwitch::An0, SoftSwitch::An1, SoftSwitch::An2, SoftSwitch::An3];
    for (i, an) in ans.into_iter().enumerate() {
        let off = 0xC058 + 2 * i as u16;
        bus.read(CPU, off + 1);
        assert!(bus.switches().get(an));
        bus.write(CPU, off, 0);
        assert!(!bus.switches().get(an));
    }
}

#[test]
fn test_status_low_bits_are_floating_bus() {
    let mut bus = bus();
    bus.set_floating_bus(0x5A);
    assert_eq!(bus.read(CPU, 0xC01A), 0x80 | 0x5A); // TEXT on at reset
    assert_eq!(bus.read(CPU, 0xC01C), 0x5A);
    // Unassigned switch space reads the floating bus too
    assert_eq!(bus.read(CPU, 0xC020), 0x5A);
    assert_eq!(bus.read(CPU, 0xC064), 0x5A);
}

#[test]
fn test_vbl_status_is_inverted() {
    let mut bus = bus();
    bus.set_vertical_blank(false);
    assert_eq!(bus.read(CPU, 0xC019) & 0x80, 0x80);
    bus.set_vertical_blank(true);
    assert_eq!(bus.read(CPU, 0xC019) & 0x80, 0x00);
}

#[test]
fn test_speaker_toggles_on_any_access() {
    let mut bus = bus();
    let before = bus.switches().iteration();
    bus.read(CPU, 0xC030);
    assert!(bus.switches().get(SoftSwitch::Speaker));
    bus.write(CPU, 0xC03F, 0);
    assert!(!bus.switches().get(SoftSwitch::Speaker));
    assert_eq!(bus.switches().iteration(), before + 2);
}

#[test]
fn test_keyboard_latch_and_strobe() {
    let mut bus = bus();
    bus.press_key(b'A');
    assert_eq!(bus.read(CPU, 0xC000), 0xC1);
    assert_eq!(bus.read(CPU, 0xC00F), 0xC1);
    assert_eq!(bus.read(CPU, 0xC010), 0xC1); // key down, clears strobe
    assert_eq!(bus.read(CPU, 0xC000), 0x41);
    bus.release_key();
    assert_eq!(bus.read(CPU, 0xC010) & 0x80, 0);
    bus.press_key(b'B');
    bus.write(CPU, 0xC01F, 0);
    assert!(!bus.key_strobe());
}

// =============================================================================
// Banked RAM routing
// =============================================================================

#[test]
fn test_ramrd_ramwrt_select_planes() {
    let mut bus = bus();
    bus.write(CPU, 0xC005, 0); // RAMWRT on
    bus.write(CPU, 0x1000, 0xAA);
    assert_eq!(bus.ram(Plane::Aux)[0x1000], 0xAA);
    assert_eq!(bus.ram(Plane::Main)[0x1000], 0x00);
    assert_eq!(bus.read(CPU, 0x1000), 0x00); // still reading main
    bus.write(CPU, 0xC003, 0); // RAMRD on
    assert_eq!(bus.read(CPU, 0x1000), 0xAA);
}

#[test]
fn test_80store_hires_steers_by_page2_not_ramwrt() {
    let mut bus = bus();
    bus.write(CPU, 0xC001, 0); // 80STORE
    bus.read(CPU, 0xC057); // HIRES
    bus.write(CPU, 0xC005, 0); // RAMWRT on: must not matter

    bus.read(CPU, 0xC054); // PAGE2 off
    bus.write(CPU, 0x2050, 0x11);
    assert_eq!(bus.ram(Plane::Main)[0x2050], 0x11);
    assert_eq!(bus.ram(Plane::Aux)[0x2050], 0x00);

    bus.read(CPU, 0xC055); // PAGE2 on
    bus.write(CPU, 0x2050, 0x22);
    assert_eq!(bus.ram(Plane::Aux)[0x2050], 0x22);
    assert_eq!(bus.ram(Plane::Main)[0x2050], 0x11);

    bus.write(CPU, 0xC004, 0); // RAMWRT off: still PAGE2
    bus.write(CPU, 0x2050, 0x33);
    assert_eq!(bus.ram(Plane::Aux)[0x2050], 0x33);

    // Outside the display pages RAMWRT decides again
    bus.write(CPU, 0xC005, 0);
    bus.write(CPU, 0x6000, 0x44);
    assert_eq!(bus.ram(Plane::Aux)[0x6000], 0x44);
}

#[test]
fn test_80store_without_hires_leaves_hires_page_alone() {
    let mut bus = bus();
    bus.write(CPU, 0xC001, 0);
    bus.read(CPU, 0xC055);
    bus.write(CPU, 0x2050, 0x11);
    assert_eq!(bus.ram(Plane::Main)[0x2050], 0x11);
    bus.write(CPU, 0x0400, 0x22);
    assert_eq!(bus.ram(Plane::Aux)[0x0400], 0x22);
}

#[test]
fn test_altzp_moves_stack_and_zero_page() {
    let mut bus = bus();
    bus.write(CPU, 0xC009, 0);
    bus.write(CPU, 0x01FF, 0x77);
    assert_eq!(bus.ram(Plane::Aux)[0x01FF], 0x77);
    assert_eq!(bus.ram(Plane::Main)[0x01FF], 0x00);
    bus.write(CPU, 0xC008, 0);
    assert_eq!(bus.read(CPU, 0x01FF), 0x00);
}

// =============================================================================
// Language card
// =============================================================================

#[test]
fn test_language_card_write_enable_needs_two_reads() {
    let mut bus = bus();
    // Clear the power-on write enable first
    bus.read(CPU, 0xC080);
    assert!(!bus.switches().get(SoftSwitch::HRamWrt));

    bus.read(CPU, 0xC083);
    assert!(bus.switches().get(SoftSwitch::PreWrite));
    assert!(!bus.switches().get(SoftSwitch::HRamWrt));
    bus.read(CPU, 0xC083);
    assert!(bus.switches().get(SoftSwitch::HRamWrt));
    assert!(bus.switches().get(SoftSwitch::HRamRd));
    assert!(!bus.switches().get(SoftSwitch::Bank1));
}

#[test]
fn test_language_card_write_breaks_prewrite() {
    let mut bus = bus();
    bus.read(CPU, 0xC080);
    bus.read(CPU, 0xC081);
    bus.write(CPU, 0xC081, 0);
    bus.read(CPU, 0xC081);
    assert!(!bus.switches().get(SoftSwitch::HRamWrt));
    bus.read(CPU, 0xC081);
    assert!(bus.switches().get(SoftSwitch::HRamWrt));
    // $C081 reads ROM
    assert!(!bus.switches().get(SoftSwitch::HRamRd));
}

#[test]
fn test_language_card_banks_overlap() {
    let mut bus = bus();
    // Bank 2, read RAM, write enabled
    bus.read(CPU, 0xC083);
    bus.read(CPU, 0xC083);
    bus.write(CPU, 0xD000, 0x22);
    bus.write(CPU, 0xE000, 0xEE);
    assert_eq!(bus.read(CPU, 0xD000), 0x22);

    // Bank 1
    bus.read(CPU, 0xC08B);
    bus.read(CPU, 0xC08B);
    assert!(bus.switches().get(SoftSwitch::Bank1));
    bus.write(CPU, 0xD000, 0x11);
    assert_eq!(bus.ram(Plane::Main)[0xC000], 0x11);
    assert_eq!(bus.read(CPU, 0xD000), 0x11);
    assert_eq!(bus.read(CPU, 0xE000), 0xEE); // shared above $E000
    assert_eq!(bus.read(CPU, 0xC011) & 0x80, 0x00); // BANK2 status clear

    // ROM again; writes still land in RAM
    bus.read(CPU, 0xC089);
    assert_eq!(bus.read(CPU, 0xD000), 0xD0);
    assert_eq!(bus.read(CPU, 0xC012) & 0x80, 0x00);
}

#[test]
fn test_upper_writes_dropped_when_protected() {
    let mut bus = bus();
    bus.read(CPU, 0xC080); // read RAM, write protect
    bus.write(CPU, 0xF000, 0x99);
    assert_eq!(bus.read(CPU, 0xF000), 0x00);
    assert_eq!(bus.rom()[0x3000], 0xF0);
}

// =============================================================================
// Slot ROM and expansion ROM
// =============================================================================

struct Card {
    id: u8,
    log: Rc<RefCell<Vec<(u16, Option<u8>)>>>,
}

impl MemoryAction for Card {
    fn read(&mut self, addr: u16) -> u8 {
        self.log.borrow_mut().push((addr, None));
        self.id
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.log.borrow_mut().push((addr, Some(data)));
    }
}

#[test]
fn test_slot_card_rom_and_io() {
    let mut bus = bus();
    let log = Rc::new(RefCell::new(Vec::new()));
    bus.install_card(6, Box::new(Card { id: 0x66, log: log.clone() }))
        .unwrap();

    assert_eq!(bus.read(CPU, 0xC600), 0x66);
    assert_eq!(bus.read(CPU, 0xC0E0), 0x66);
    bus.write(CPU, 0xC0EC, 0x5A);
    assert_eq!(
        *log.borrow(),
        vec![(0xC600, None), (0xC0E0, None), (0xC0EC, Some(0x5A))]
    );

    // Empty slot reads the floating bus
    bus.set_floating_bus(0x12);
    assert_eq!(bus.read(CPU, 0xC500), 0x12);
}

#[test]
fn test_intcxrom_hides_cards() {
    let mut bus = bus();
    let log = Rc::new(RefCell::new(Vec::new()));
    bus.install_card(6, Box::new(Card { id: 0x66, log })).unwrap();
    bus.write(CPU, 0xC007, 0);
    assert_eq!(bus.read(CPU, 0xC600), 0xC6);
    assert_eq!(bus.read(CPU, 0xC800), 0xC8);
}

#[test]
fn test_expansion_rom_selection_and_cfff_release() {
    let mut bus = bus();
    let log = Rc::new(RefCell::new(Vec::new()));
    bus.install_card(6, Box::new(Card { id: 0x66, log })).unwrap();
    bus.set_floating_bus(0x00);

    assert_eq!(bus.read(CPU, 0xC800), 0x00); // nothing selected yet
    bus.read(CPU, 0xC6FF);
    assert_eq!(bus.read(CPU, 0xC800), 0x66);
    bus.read(CPU, 0xCFFF);
    assert_eq!(bus.read(CPU, 0xC800), 0x00);
}

#[test]
fn test_internal_c3_rom_latches_intc8rom() {
    let mut bus = bus();
    let log = Rc::new(RefCell::new(Vec::new()));
    bus.install_card(6, Box::new(Card { id: 0x66, log })).unwrap();
    bus.read(CPU, 0xC600); // select slot 6 expansion ROM

    // SLOTC3ROM off: $C300 is internal and latches INTC8ROM
    assert_eq!(bus.read(CPU, 0xC300), 0xC3);
    assert!(bus.switches().get(SoftSwitch::IntC8Rom));
    assert_eq!(bus.read(CPU, 0xC900), 0xC9);

    // $CFFF clears the latch
    bus.read(CPU, 0xCFFF);
    assert!(!bus.switches().get(SoftSwitch::IntC8Rom));

    // SLOTC3ROM on: $C3xx goes to the (empty) slot
    bus.write(CPU, 0xC00B, 0);
    bus.set_floating_bus(0x01);
    assert_eq!(bus.read(CPU, 0xC300), 0x01);
    assert!(!bus.switches().get(SoftSwitch::IntC8Rom));
}

// =============================================================================
// Resets and observer access
// =============================================================================

#[test]
fn test_warm_reset_restores_defaults_and_keeps_ram() {
    let mut bus = bus();
    bus.write(CPU, 0x1234, 0x56);
    bus.write(CPU, 0xC003, 0);
    bus.write(CPU, 0xC001, 0);
    bus.read(CPU, 0xC050);
    bus.read(CPU, 0xC08B);
    let before = bus.switches().iteration();

    bus.warm_reset();
    let s = bus.switches();
    assert!(s.get(SoftSwitch::Text));
    assert!(s.get(SoftSwitch::HRamWrt));
    assert!(!s.get(SoftSwitch::RamRd));
    assert!(!s.get(SoftSwitch::Store80));
    assert!(!s.get(SoftSwitch::Bank1));
    assert!(!s.get(SoftSwitch::SlotC3Rom));
    assert!(s.iteration() > before);
    assert_eq!(bus.ram(Plane::Main)[0x1234], 0x56);
}

#[test]
fn test_cold_reset_clears_ram() {
    let mut bus = bus();
    bus.write(CPU, 0x1234, 0x56);
    bus.write(CPU, 0xC005, 0);
    bus.write(CPU, 0x1234, 0x78);
    bus.cold_reset();
    assert_eq!(bus.ram(Plane::Main)[0x1234], 0);
    assert_eq!(bus.ram(Plane::Aux)[0x1234], 0);
    assert!(!bus.switches().get(SoftSwitch::RamWrt));
}

#[test]
fn test_peek_poke_have_no_switch_side_effects() {
    let mut bus = bus();
    bus.poke(0xC001, 0);
    bus.peek(0xC030);
    bus.peek(0xC083);
    bus.peek(0xC083);
    bus.press_key(b'Z');
    bus.peek(0xC010);
    assert!(!bus.switches().get(SoftSwitch::Store80));
    assert!(!bus.switches().get(SoftSwitch::Speaker));
    assert!(!bus.switches().get(SoftSwitch::HRamRd));
    assert!(bus.key_strobe());
    assert_eq!(bus.switches().iteration(), 0);

    bus.poke(0x0300, 0xAB);
    assert_eq!(bus.peek(0x0300), 0xAB);
}
