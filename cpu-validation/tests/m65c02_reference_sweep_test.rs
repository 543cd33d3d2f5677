//! One-step equivalence between the core engine and the reference model
//! across all 256 opcodes, from randomized machine state.

use orchard_core::cpu::M65C02;
use orchard_core::cpu::m65c02::{Mnemonic, OPCODES, RegisterFile, StatusFlag};
use orchard_cpu_validation::reference::Model;
use orchard_cpu_validation::{TracingBus, execute_one};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CASES_PER_OPCODE: usize = 200;

fn random_state(rng: &mut StdRng, opcode: u8) -> (RegisterFile, TracingBus) {
    let mut bus = TracingBus::new();
    rng.fill(&mut bus.memory[..]);
    let mut regs = RegisterFile {
        a: rng.r#gen(),
        x: rng.r#gen(),
        y: rng.r#gen(),
        s: rng.r#gen(),
        pc: rng.r#gen(),
        p: rng.r#gen(),
    };
    if matches!(OPCODES[opcode as usize].mnemonic, Mnemonic::Adc | Mnemonic::Sbc) {
        regs.set_flag(StatusFlag::D, false);
    }
    bus.memory[regs.pc as usize] = opcode;
    (regs, bus)
}

fn model_from(regs: &RegisterFile, bus: &TracingBus) -> Model {
    let mut model = Model::new(&bus.memory);
    model.a = regs.a;
    model.x = regs.x;
    model.y = regs.y;
    model.s = regs.s;
    model.p = regs.p;
    model.pc = regs.pc;
    model
}

fn check_opcode(rng: &mut StdRng, opcode: u8) {
    for case in 0..CASES_PER_OPCODE {
        let (regs, mut bus) = random_state(rng, opcode);
        let mut model = model_from(&regs, &bus);
        let mut cpu = M65C02::new();
        cpu.regs = regs;

        let label = format!("opcode {opcode:02X} case {case} from {regs:02X?}");
        let cycles = execute_one(&mut cpu, &mut bus).unwrap_or_else(|e| panic!("{label}: {e}"));
        let expected = model.step().unwrap_or_else(|| panic!("{label}: model refused"));

        assert_eq!(cycles, expected, "{label}: cycles");
        assert_eq!(cpu.regs.a, model.a, "{label}: A");
        assert_eq!(cpu.regs.x, model.x, "{label}: X");
        assert_eq!(cpu.regs.y, model.y, "{label}: Y");
        assert_eq!(cpu.regs.s, model.s, "{label}: S");
        assert_eq!(cpu.regs.p, model.p, "{label}: P");
        assert_eq!(cpu.regs.pc, model.pc, "{label}: PC");
        assert_eq!(bus.writes(), model.writes, "{label}: writes");
    }
}

#[test]
fn test_all_opcodes_match_reference() {
    let mut rng = StdRng::seed_from_u64(0x65C0_2E1E);
    for opcode in 0..=255u8 {
        check_opcode(&mut rng, opcode);
    }
}

#[test]
fn test_decimal_arithmetic_fails_on_both() {
    let mut rng = StdRng::seed_from_u64(0xDEC1_3A11);
    let decimal_ops = OPCODES
        .iter()
        .filter(|d| matches!(d.mnemonic, Mnemonic::Adc | Mnemonic::Sbc))
        .filter_map(|d| d.code);
    for opcode in decimal_ops {
        let (mut regs, mut bus) = random_state(&mut rng, opcode);
        regs.set_flag(StatusFlag::D, true);
        let mut model = model_from(&regs, &bus);
        let mut cpu = M65C02::new();
        cpu.regs = regs;

        assert!(execute_one(&mut cpu, &mut bus).is_err(), "opcode {opcode:02X}");
        assert_eq!(model.step(), None, "opcode {opcode:02X}");
        assert_eq!(cpu.regs, regs, "opcode {opcode:02X}: state changed");
        assert!(bus.writes().is_empty());
    }
}

#[test]
fn test_page_boundary_operands_match_reference() {
    // Bias pointers and bases onto $xxFF so every indexed and indirect mode
    // crosses or wraps.
    let mut rng = StdRng::seed_from_u64(0x0000_20FF);
    for opcode in 0..=255u8 {
        for _ in 0..20 {
            let (regs, mut bus) = random_state(&mut rng, opcode);
            let operand = regs.pc.wrapping_add(1) as usize;
            bus.memory[operand] = 0xFF;
            let mut model = model_from(&regs, &bus);
            let mut cpu = M65C02::new();
            cpu.regs = regs;

            let cycles = execute_one(&mut cpu, &mut bus).expect("binary-mode step");
            assert_eq!(Some(cycles), model.step(), "opcode {opcode:02X}: cycles");
            assert_eq!(cpu.regs.pc, model.pc, "opcode {opcode:02X}: PC");
            assert_eq!(bus.writes(), model.writes, "opcode {opcode:02X}: writes");
        }
    }
}
