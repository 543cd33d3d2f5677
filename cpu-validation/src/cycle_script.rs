//! Expand an opcode's micro-step script into the bus cycles it implies.
//!
//! Fetches, pointer reads, effective accesses, stack traffic and vector
//! fetches land on addresses the instruction fixes; those cycles are
//! `exact` and a recorded trace must agree with them. Dead cycles carry
//! whatever the part is holding on the address bus. Here that is the byte
//! after the opcode for the first dead cycle, the zero-page base while
//! indexing zero page, the return address for the last cycle of RTS, the
//! stack slot for internal cycles of stack instructions, and otherwise the
//! previous cycle's address.

use orchard_core::cpu::m65c02::microcode::{MicroStep, program, program_crossed};
use orchard_core::cpu::m65c02::{
    AddressingMode, IRQ_VECTOR, Mnemonic, NMI_VECTOR, OpcodeDescriptor, RES_VECTOR, RegisterFile,
};

use crate::{BusCycle, BusOp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptedCycle {
    pub step: MicroStep,
    pub addr: u16,
    pub op: BusOp,
    /// `addr` is fixed by the instruction rather than by the dead-cycle rule.
    pub exact: bool,
}

impl ScriptedCycle {
    /// Whether a recorded cycle in vector-file form agrees with this one.
    /// Internal cycles show up as reads on real hardware.
    pub fn matches(&self, addr: u16, op: &str) -> bool {
        let op_ok = match self.op {
            BusOp::Internal => op == "read" || op == "internal",
            scripted => op == scripted.as_str(),
        };
        op_ok && (!self.exact || addr == self.addr)
    }
}

/// Addresses an instruction resolves before touching its operand.
struct Resolved {
    pointer: u16,
    pointer_hi: u16,
    effective: u16,
    crossed: bool,
}

fn resolve(desc: &OpcodeDescriptor, regs: &RegisterFile, memory: &[u8]) -> Resolved {
    use AddressingMode::*;

    let read = |addr: u16| memory[addr as usize];
    let word = |lo: u16, hi: u16| u16::from_le_bytes([read(lo), read(hi)]);
    let operand = regs.pc.wrapping_add(1);
    let zp = read(operand);
    let abs = word(operand, operand.wrapping_add(1));

    let direct = |effective: u16| Resolved {
        pointer: 0,
        pointer_hi: 0,
        effective,
        crossed: false,
    };
    let via = |pointer: u16, pointer_hi: u16, index: u8| {
        let base = word(pointer, pointer_hi);
        let effective = base.wrapping_add(index as u16);
        Resolved {
            pointer,
            pointer_hi,
            effective,
            crossed: (base ^ effective) & 0xFF00 != 0,
        }
    };
    let indexed = |index: u8| {
        let effective = abs.wrapping_add(index as u16);
        Resolved {
            crossed: (abs ^ effective) & 0xFF00 != 0,
            ..direct(effective)
        }
    };

    match desc.mode {
        Implied | Accumulator | Immediate | Relative => direct(operand),
        ZeroPage => direct(zp as u16),
        ZeroPageX => direct(zp.wrapping_add(regs.x) as u16),
        ZeroPageY => direct(zp.wrapping_add(regs.y) as u16),
        Absolute => direct(abs),
        AbsoluteX => indexed(regs.x),
        AbsoluteY => indexed(regs.y),
        IndirectX => {
            let ptr = zp.wrapping_add(regs.x);
            via(ptr as u16, ptr.wrapping_add(1) as u16, 0)
        }
        IndirectY => via(zp as u16, zp.wrapping_add(1) as u16, regs.y),
        ZeroPageIndirect => via(zp as u16, zp.wrapping_add(1) as u16, 0),
        // The high pointer byte never leaves the pointer's page.
        Indirect => via(abs, (abs & 0xFF00) | (abs.wrapping_add(1) & 0x00FF), 0),
        AbsoluteIndexedIndirect => {
            let ptr = abs.wrapping_add(regs.x as u16);
            via(ptr, ptr.wrapping_add(1), 0)
        }
    }
}

/// Bus cycles of the instruction at `regs.pc`, branch extras excluded.
/// `memory` is the full 64K image before the step; the page-crossed script
/// is chosen when the operand's indexing crosses a page.
pub fn scripted_cycles(
    desc: &OpcodeDescriptor,
    regs: &RegisterFile,
    memory: &[u8],
) -> Vec<ScriptedCycle> {
    use MicroStep::*;

    let resolved = resolve(desc, regs, memory);
    let script = if resolved.crossed {
        program_crossed(desc)
    } else {
        program(desc)
    };

    let pc = regs.pc;
    let vector = match desc.mnemonic {
        Mnemonic::Nmi => NMI_VECTOR,
        Mnemonic::Res => RES_VECTOR,
        _ => IRQ_VECTOR,
    };
    // Interrupt sequences fetch an opcode they never execute.
    let after_opcode = match desc.mnemonic {
        Mnemonic::Irq | Mnemonic::Nmi | Mnemonic::Res => pc,
        _ => pc.wrapping_add(1),
    };
    let stack_internal = matches!(
        desc.mnemonic,
        Mnemonic::Jsr
            | Mnemonic::Rts
            | Mnemonic::Rti
            | Mnemonic::Pla
            | Mnemonic::Plp
            | Mnemonic::Plx
            | Mnemonic::Ply
            | Mnemonic::Res
    );
    let zp_indexed = matches!(
        desc.mode,
        AddressingMode::ZeroPageX | AddressingMode::ZeroPageY | AddressingMode::IndirectX
    );

    let mut s = regs.s;
    let mut prev = pc;
    let mut pulled = Vec::with_capacity(3);
    let mut cycles = Vec::with_capacity(script.len());
    for (i, &step) in script.steps().iter().enumerate() {
        let (addr, op, exact) = match step {
            FetchOpcode => (pc, BusOp::Read, true),
            FetchOperandLo | ReadImmediate => (pc.wrapping_add(1), BusOp::Read, true),
            FetchOperandHi => (pc.wrapping_add(2), BusOp::Read, true),
            ReadPointerLo => (resolved.pointer, BusOp::Read, true),
            ReadPointerHi => (resolved.pointer_hi, BusOp::Read, true),
            ReadEffective => (resolved.effective, BusOp::Read, true),
            WriteEffective | WriteEffectiveDummy => (resolved.effective, BusOp::Write, true),
            ReadVectorLo => (vector, BusOp::Read, true),
            ReadVectorHi => (vector.wrapping_add(1), BusOp::Read, true),
            Push => {
                let addr = 0x0100 | s as u16;
                s = s.wrapping_sub(1);
                (addr, BusOp::Write, true)
            }
            Pull => {
                s = s.wrapping_add(1);
                let addr = 0x0100 | s as u16;
                pulled.push(memory[addr as usize]);
                (addr, BusOp::Read, true)
            }
            DummyRead => {
                let addr = match pulled[..] {
                    _ if i == 1 => after_opcode,
                    [lo, hi] if desc.mnemonic == Mnemonic::Rts => u16::from_le_bytes([lo, hi]),
                    _ if zp_indexed => memory[pc.wrapping_add(1) as usize] as u16,
                    _ => prev,
                };
                (addr, BusOp::Read, false)
            }
            ReadEffectiveDummy => (prev, BusOp::Read, false),
            Internal if stack_internal => (0x0100 | s as u16, BusOp::Internal, false),
            Internal => (prev, BusOp::Internal, false),
        };
        prev = addr;
        cycles.push(ScriptedCycle {
            step,
            addr,
            op,
            exact,
        });
    }
    cycles
}

/// Lay an engine trace over a script. Each exact cycle takes its data from
/// the engine access at the same address, and every other cycle reads
/// `memory`, the image before the step.
///
/// Fails with the first engine access that no exact cycle accounts for.
pub fn align_trace(
    script: &[ScriptedCycle],
    trace: &[BusCycle],
    memory: &[u8],
) -> Result<Vec<BusCycle>, BusCycle> {
    let mut used = vec![false; trace.len()];
    let mut aligned = Vec::with_capacity(script.len());
    for cycle in script {
        let hit = cycle
            .exact
            .then(|| {
                trace
                    .iter()
                    .enumerate()
                    .position(|(i, c)| !used[i] && c.addr == cycle.addr && c.op == cycle.op)
            })
            .flatten();
        let data = match hit {
            Some(i) => {
                used[i] = true;
                trace[i].data
            }
            None => memory[cycle.addr as usize],
        };
        aligned.push(BusCycle {
            addr: cycle.addr,
            data,
            op: cycle.op,
        });
    }
    match used.iter().position(|&u| !u) {
        Some(i) => Err(trace[i].clone()),
        None => Ok(aligned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchard_core::cpu::m65c02::OPCODES;

    fn regs_at(pc: u16) -> RegisterFile {
        RegisterFile {
            pc,
            s: 0xFD,
            ..RegisterFile::default()
        }
    }

    #[test]
    fn rts_ends_on_return_address() {
        let mut memory = vec![0u8; 0x10000];
        memory[0x0300] = 0x60;
        memory[0x01FE] = 0x45;
        memory[0x01FF] = 0x12;
        let cycles = scripted_cycles(&OPCODES[0x60], &regs_at(0x0300), &memory);
        let addrs: Vec<u16> = cycles.iter().map(|c| c.addr).collect();
        assert_eq!(addrs, [0x0300, 0x0301, 0x01FD, 0x01FE, 0x01FF, 0x1245]);
    }

    #[test]
    fn jmp_indirect_keeps_pointer_page() {
        let mut memory = vec![0u8; 0x10000];
        memory[0x0300..0x0303].copy_from_slice(&[0x6C, 0xFF, 0x20]);
        let cycles = scripted_cycles(&OPCODES[0x6C], &regs_at(0x0300), &memory);
        assert_eq!(cycles[4].addr, 0x20FF);
        assert_eq!(cycles[5].addr, 0x2000);
    }

    #[test]
    fn internal_matches_read_or_internal() {
        let cycle = ScriptedCycle {
            step: MicroStep::Internal,
            addr: 0x01FD,
            op: BusOp::Internal,
            exact: false,
        };
        assert!(cycle.matches(0x1234, "read"));
        assert!(cycle.matches(0x01FD, "internal"));
        assert!(!cycle.matches(0x01FD, "write"));

        let push = ScriptedCycle {
            step: MicroStep::Push,
            addr: 0x01FD,
            op: BusOp::Write,
            exact: true,
        };
        assert!(push.matches(0x01FD, "write"));
        assert!(!push.matches(0x01FC, "write"));
    }
}
