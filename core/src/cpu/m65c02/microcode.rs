//! Per-cycle bus-access scripts for every opcode.
//!
//! The instruction engine executes whole steps; these scripts describe what
//! the real part does on each cycle of a step. They drive the cycle
//! predictor and the cycle-granular validation tests.
//!
//! Script length equals the opcode's base cycle count. The page-crossed
//! variant of an opcode that pays the page penalty is one cycle longer: an
//! extra `ReadEffectiveDummy` (the read from the un-carried address) sits
//! before the effective access. Taken-branch extras are not scripted.

use super::opcodes::{AddressingMode, Mnemonic, OPCODES, OpcodeDescriptor};

/// How a mnemonic touches its effective address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusAccess {
    None,
    Read,
    Write,
    ReadModifyWrite,
}

impl Mnemonic {
    pub fn access(self) -> BusAccess {
        use Mnemonic::*;
        match self {
            Adc | And | Bit | Cmp | Cpx | Cpy | Eor | Lda | Ldx | Ldy | Ora | Sbc => {
                BusAccess::Read
            }
            Sta | Stx | Sty | Stz => BusAccess::Write,
            Asl | Lsr | Rol | Ror | Inc | Dec | Tsb | Trb => BusAccess::ReadModifyWrite,
            _ => BusAccess::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MicroStep {
    FetchOpcode,
    FetchOperandLo,
    FetchOperandHi,
    DummyRead,
    ReadEffective,
    ReadEffectiveDummy,
    WriteEffective,
    WriteEffectiveDummy,
    ReadImmediate,
    ReadPointerLo,
    ReadPointerHi,
    Push,
    Pull,
    ReadVectorLo,
    ReadVectorHi,
    Internal,
}

impl MicroStep {
    pub fn is_write(self) -> bool {
        matches!(
            self,
            MicroStep::WriteEffective | MicroStep::WriteEffectiveDummy | MicroStep::Push
        )
    }

    /// Whether the cycle has an effect visible outside the CPU: a data
    /// access at the effective address, a stack access or a vector fetch.
    pub fn is_observable(self) -> bool {
        use MicroStep::*;
        matches!(
            self,
            ReadEffective
                | WriteEffective
                | WriteEffectiveDummy
                | Push
                | Pull
                | ReadVectorLo
                | ReadVectorHi
        )
    }
}

/// Ordered micro-steps of one opcode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MicrocodeProgram {
    steps: Vec<MicroStep>,
}

impl MicrocodeProgram {
    pub fn steps(&self) -> &[MicroStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of cycles that drive the data bus.
    pub fn writes(&self) -> usize {
        self.steps.iter().filter(|s| s.is_write()).count()
    }

    /// Leading cycles with no externally observable effect.
    pub fn quiet_cycles(&self) -> usize {
        self.steps
            .iter()
            .position(|s| s.is_observable())
            .unwrap_or(self.steps.len())
    }
}

/// Script for the non-crossed case.
pub fn program(desc: &OpcodeDescriptor) -> MicrocodeProgram {
    build(desc, false)
}

/// Script for the page-crossed case. Identical to [`program`] for opcodes
/// that do not pay the page penalty.
pub fn program_crossed(desc: &OpcodeDescriptor) -> MicrocodeProgram {
    build(desc, desc.takes_page_penalty())
}

/// Script for an opcode byte.
pub fn program_for(code: u8) -> MicrocodeProgram {
    program(&OPCODES[code as usize])
}

fn build(desc: &OpcodeDescriptor, crossed: bool) -> MicrocodeProgram {
    use Mnemonic::*;
    use MicroStep::*;

    let mut steps = vec![FetchOpcode];
    match desc.mnemonic {
        Irq | Nmi => steps.extend([DummyRead, Push, Push, Push, ReadVectorLo, ReadVectorHi]),
        Res => steps.extend([DummyRead, Internal, Internal, Internal, ReadVectorLo, ReadVectorHi]),
        Hlt => {}
        Brk => steps.extend([ReadImmediate, Push, Push, Push, ReadVectorLo, ReadVectorHi]),
        Jsr => steps.extend([FetchOperandLo, Internal, Push, Push, FetchOperandHi]),
        Rts => steps.extend([DummyRead, Internal, Pull, Pull, DummyRead]),
        Rti => steps.extend([DummyRead, Internal, Pull, Pull, Pull]),
        Pha | Php | Phx | Phy => steps.extend([DummyRead, Push]),
        Pla | Plp | Plx | Ply => steps.extend([DummyRead, Internal, Pull]),
        Jmp if desc.mode == AddressingMode::Absolute => {
            steps.extend([FetchOperandLo, FetchOperandHi])
        }
        Jmp => steps.extend([
            FetchOperandLo,
            FetchOperandHi,
            Internal,
            ReadPointerLo,
            ReadPointerHi,
        ]),
        m if m.is_branch() => steps.push(ReadImmediate),
        _ => addressed(desc, crossed, &mut steps),
    }

    // Undefined opcodes burn their remaining cycles re-reading the bus.
    if desc.mnemonic == Nop {
        while steps.len() < desc.cycles as usize {
            steps.push(DummyRead);
        }
    }

    MicrocodeProgram { steps }
}

fn addressed(desc: &OpcodeDescriptor, crossed: bool, steps: &mut Vec<MicroStep>) {
    use AddressingMode::*;
    use MicroStep::*;

    let access = desc.mnemonic.access();
    match desc.mode {
        Implied | Accumulator => {
            if desc.cycles > 1 {
                steps.push(DummyRead);
            }
            return;
        }
        Immediate | Relative => {
            steps.push(ReadImmediate);
            return;
        }
        ZeroPage => steps.push(FetchOperandLo),
        ZeroPageX | ZeroPageY => steps.extend([FetchOperandLo, DummyRead]),
        Absolute => steps.extend([FetchOperandLo, FetchOperandHi]),
        AbsoluteX | AbsoluteY => {
            steps.extend([FetchOperandLo, FetchOperandHi]);
            // Stores and INC/DEC always spend the fix-up cycle.
            let always_fixup = access == BusAccess::Write
                || (access == BusAccess::ReadModifyWrite && !desc.mnemonic.is_shift());
            if crossed || always_fixup {
                steps.push(ReadEffectiveDummy);
            }
        }
        IndirectX => steps.extend([FetchOperandLo, DummyRead, ReadPointerLo, ReadPointerHi]),
        IndirectY => {
            steps.extend([FetchOperandLo, ReadPointerLo, ReadPointerHi]);
            if crossed || access == BusAccess::Write {
                steps.push(ReadEffectiveDummy);
            }
        }
        ZeroPageIndirect => steps.extend([FetchOperandLo, ReadPointerLo, ReadPointerHi]),
        Indirect | AbsoluteIndexedIndirect => {
            steps.extend([FetchOperandLo, FetchOperandHi, Internal, ReadPointerLo, ReadPointerHi]);
            return;
        }
    }

    match access {
        BusAccess::Read => steps.push(ReadEffective),
        BusAccess::Write => steps.push(WriteEffective),
        BusAccess::ReadModifyWrite => {
            steps.extend([ReadEffective, ReadEffectiveDummy, WriteEffective])
        }
        // Undefined-opcode NOPs with a memory operand read it and discard it.
        BusAccess::None => steps.push(ReadEffective),
    }
}

/// Outcome of [`predict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CyclePrediction {
    /// Total cycles of the step (branch extras excluded).
    pub total: u32,
    /// Leading cycles with no externally observable effect.
    pub quiet: u32,
    /// Index of the final, committing cycle.
    pub commit: u32,
}

/// Predict a step's cycle shape from its base and effective addresses.
/// The page-cross unit is added only when the high bytes differ and the
/// opcode pays the penalty.
pub fn predict(desc: &OpcodeDescriptor, base: u16, effective: u16) -> CyclePrediction {
    let crossed = (base ^ effective) & 0xFF00 != 0;
    let script = if crossed { program_crossed(desc) } else { program(desc) };
    let total = script.len() as u32;
    CyclePrediction {
        total,
        quiet: script.quiet_cycles() as u32,
        commit: total.saturating_sub(1),
    }
}
