use orchard_core::CoreError;
use orchard_core::cpu::M65C02;
use orchard_core::cpu::m65c02::StatusFlag;
mod common;
use common::{TestBus, start, step};

fn flags(cpu: &M65C02) -> (bool, bool, bool, bool) {
    (
        cpu.regs.flag(StatusFlag::N),
        cpu.regs.flag(StatusFlag::Z),
        cpu.regs.flag(StatusFlag::C),
        cpu.regs.flag(StatusFlag::V),
    )
}

// =============================================================================
// Arithmetic and compare
// =============================================================================

#[test]
fn test_adc_signed_overflow() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x50;
    start(&mut cpu, &mut bus, 0x0200, &[0x18, 0x69, 0x50]); // CLC; ADC #$50
    step(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0xA0);
    assert_eq!(flags(&cpu), (true, false, false, true));
}

#[test]
fn test_adc_carry_out_to_zero() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0xFF;
    start(&mut cpu, &mut bus, 0x0200, &[0x38, 0x69, 0x00]); // SEC; ADC #$00
    step(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0x00);
    assert_eq!(flags(&cpu), (false, true, true, false));
}

#[test]
fn test_sbc_borrow() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x10;
    start(&mut cpu, &mut bus, 0x0200, &[0x38, 0xE9, 0x20]); // SEC; SBC #$20
    step(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0xF0);
    assert_eq!(flags(&cpu), (true, false, false, false));
}

#[test]
fn test_sbc_signed_overflow() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x80;
    start(&mut cpu, &mut bus, 0x0200, &[0x38, 0xE9, 0x01]); // $80 - 1 = $7F
    step(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0x7F);
    assert_eq!(flags(&cpu), (false, false, true, true));
}

#[test]
fn test_compare_flags() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x40;
    cpu.regs.x = 0x40;
    cpu.regs.y = 0x10;
    start(&mut cpu, &mut bus, 0x0200, &[0xC9, 0x41, 0xE0, 0x40, 0xC0, 0x01]);

    step(&mut cpu, &mut bus, 1); // CMP #$41: less
    assert!(cpu.regs.flag(StatusFlag::N));
    assert!(!cpu.regs.flag(StatusFlag::C));
    assert!(!cpu.regs.flag(StatusFlag::Z));

    step(&mut cpu, &mut bus, 1); // CPX #$40: equal
    assert!(cpu.regs.flag(StatusFlag::C));
    assert!(cpu.regs.flag(StatusFlag::Z));

    step(&mut cpu, &mut bus, 1); // CPY #$01: greater
    assert!(cpu.regs.flag(StatusFlag::C));
    assert!(!cpu.regs.flag(StatusFlag::Z));
    assert!(!cpu.regs.flag(StatusFlag::N));
}

#[test]
fn test_compare_leaves_overflow() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.set_flag(StatusFlag::V, true);
    start(&mut cpu, &mut bus, 0x0200, &[0xC9, 0x80]);
    step(&mut cpu, &mut bus, 1);
    assert!(cpu.regs.flag(StatusFlag::V));
}

#[test]
fn test_decimal_mode_fails_before_mutation() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x15;
    start(&mut cpu, &mut bus, 0x0200, &[0xF8, 0x69, 0x27]); // SED; ADC #$27
    step(&mut cpu, &mut bus, 1);
    let before = cpu.regs;
    assert_eq!(
        cpu.cycle(&mut bus),
        Err(CoreError::DecimalMode {
            opcode: 0x69,
            pc: 0x0201
        })
    );
    assert_eq!(cpu.regs, before);
}

// =============================================================================
// 65C02 additions
// =============================================================================

#[test]
fn test_bit_immediate_touches_only_z() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x01;
    start(&mut cpu, &mut bus, 0x0200, &[0x89, 0xC0]);
    step(&mut cpu, &mut bus, 1);
    assert!(cpu.regs.flag(StatusFlag::Z));
    assert!(!cpu.regs.flag(StatusFlag::N));
    assert!(!cpu.regs.flag(StatusFlag::V));
}

#[test]
fn test_bit_memory_copies_n_v() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0xFF;
    bus.memory[0x10] = 0xC0;
    start(&mut cpu, &mut bus, 0x0200, &[0x24, 0x10]);
    step(&mut cpu, &mut bus, 1);
    assert_eq!(flags(&cpu), (true, false, false, true));
}

#[test]
fn test_tsb_trb() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x0F;
    bus.memory[0x10] = 0xF0;
    start(&mut cpu, &mut bus, 0x0200, &[0x04, 0x10, 0x14, 0x10]);
    assert_eq!(step(&mut cpu, &mut bus, 1), 5);
    assert_eq!(bus.memory[0x10], 0xFF);
    assert!(cpu.regs.flag(StatusFlag::Z)); // A & original == 0
    step(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x10], 0xF0);
    assert!(!cpu.regs.flag(StatusFlag::Z));
}

#[test]
fn test_stz_and_zp_indirect() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0x3000] = 0x55;
    bus.memory[0x3001] = 0x66;
    bus.load(0x20, &[0x00, 0x30]);
    cpu.regs.x = 1;
    // STZ $3000; LDA ($20); STZ $3000,X
    start(&mut cpu, &mut bus, 0x0200, &[0x9C, 0x00, 0x30, 0xB2, 0x20, 0x9E, 0x00, 0x30]);
    step(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x3000], 0x00);
    assert_eq!(step(&mut cpu, &mut bus, 1), 5);
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.flag(StatusFlag::Z));
    step(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x3001], 0x00);
}

#[test]
fn test_zero_page_indirect_pointer_wraps() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0xFF] = 0x00;
    bus.memory[0x00] = 0x40;
    bus.memory[0x4000] = 0x77;
    start(&mut cpu, &mut bus, 0x0200, &[0xB2, 0xFF]);
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0x77);
}

#[test]
fn test_zero_page_x_wraps() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.x = 0x20;
    bus.memory[0x10] = 0xAB;
    start(&mut cpu, &mut bus, 0x0200, &[0xB5, 0xF0]);
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0xAB);
}

#[test]
fn test_inc_dec_accumulator() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0xFF;
    start(&mut cpu, &mut bus, 0x0200, &[0x1A, 0x3A]);
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.flag(StatusFlag::Z));
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0xFF);
    assert!(cpu.regs.flag(StatusFlag::N));
}

#[test]
fn test_phx_ply() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.x = 0x80;
    start(&mut cpu, &mut bus, 0x0200, &[0xDA, 0x7A]);
    assert_eq!(step(&mut cpu, &mut bus, 1), 3);
    assert_eq!(bus.memory[0x01FF], 0x80);
    assert_eq!(cpu.regs.s, 0xFE);
    assert_eq!(step(&mut cpu, &mut bus, 1), 4);
    assert_eq!(cpu.regs.y, 0x80);
    assert!(cpu.regs.flag(StatusFlag::N));
    assert_eq!(cpu.regs.s, 0xFF);
}

// =============================================================================
// Shifts
// =============================================================================

#[test]
fn test_rotates_through_carry() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x81;
    // SEC; ROL A; ROR A; LSR A
    start(&mut cpu, &mut bus, 0x0200, &[0x38, 0x2A, 0x6A, 0x4A]);
    step(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0x03);
    assert!(cpu.regs.flag(StatusFlag::C));
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0x81);
    assert!(cpu.regs.flag(StatusFlag::C));
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.a, 0x40);
    assert!(cpu.regs.flag(StatusFlag::C));
}

#[test]
fn test_rmw_writes_once() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0x3000] = 0x40;
    start(&mut cpu, &mut bus, 0x0200, &[0x0E, 0x00, 0x30]); // ASL $3000
    step(&mut cpu, &mut bus, 1);
    assert_eq!(bus.writes, vec![(0x3000, 0x80)]);
}

// =============================================================================
// Jumps and subroutines
// =============================================================================

#[test]
fn test_jmp_indirect_page_quirk() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    bus.memory[0x30FF] = 0x34;
    bus.memory[0x3000] = 0x12; // high byte fetched from the start of the page
    bus.memory[0x3100] = 0x99;
    start(&mut cpu, &mut bus, 0x0200, &[0x6C, 0xFF, 0x30]);
    assert_eq!(step(&mut cpu, &mut bus, 1), 6);
    assert_eq!(cpu.regs.pc, 0x1234);
}

#[test]
fn test_jsr_rts() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    bus.load(0x3000, &[0x60]); // RTS
    start(&mut cpu, &mut bus, 0x0200, &[0x20, 0x00, 0x30, 0xEA]);
    assert_eq!(step(&mut cpu, &mut bus, 1), 6);
    assert_eq!(cpu.regs.pc, 0x3000);
    // Return address is the last byte of the JSR
    assert_eq!(bus.memory[0x01FF], 0x02);
    assert_eq!(bus.memory[0x01FE], 0x02);
    assert_eq!(step(&mut cpu, &mut bus, 1), 6);
    assert_eq!(cpu.regs.pc, 0x0203);
}

#[test]
fn test_brk_rti() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    bus.set_vector(0xFFFE, 0x4000);
    bus.load(0x4000, &[0x40]); // RTI
    cpu.regs.p = 0x28 | StatusFlag::C as u8; // D and C set, I clear
    start(&mut cpu, &mut bus, 0x0200, &[0x00, 0xEE, 0xEA]);

    assert_eq!(step(&mut cpu, &mut bus, 1), 7);
    assert_eq!(cpu.regs.pc, 0x4000);
    assert!(cpu.regs.flag(StatusFlag::I));
    assert!(!cpu.regs.flag(StatusFlag::D));
    // PC+2 and P with B|U set
    assert_eq!(&bus.memory[0x01FD..=0x01FF], &[0x39, 0x02, 0x02]);

    assert_eq!(step(&mut cpu, &mut bus, 1), 6);
    assert_eq!(cpu.regs.pc, 0x0202);
    assert!(cpu.regs.flag(StatusFlag::D));
    assert!(!cpu.regs.flag(StatusFlag::I));
}

#[test]
fn test_plp_forces_unused_bit() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.s = 0xFE;
    bus.memory[0x01FF] = 0x00;
    start(&mut cpu, &mut bus, 0x0200, &[0x28]);
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.p, 0x20);
}

#[test]
fn test_php_sets_break_and_unused() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.p = 0x20;
    start(&mut cpu, &mut bus, 0x0200, &[0x08]);
    step(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x01FF], 0x30);
}

#[test]
fn test_transfers() {
    let mut cpu = M65C02::new();
    let mut bus = TestBus::new();
    cpu.regs.a = 0x80;
    // TAX; TXS; LDX #0; TSX
    start(&mut cpu, &mut bus, 0x0200, &[0xAA, 0x9A, 0xA2, 0x00, 0xBA]);
    step(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.s, 0x80);
    step(&mut cpu, &mut bus, 1);
    assert!(cpu.regs.flag(StatusFlag::Z));
    step(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.x, 0x80);
    assert!(cpu.regs.flag(StatusFlag::N));
}
