//! 65C02 opcode decode table.
//!
//! One record per opcode byte: mnemonic, addressing mode, instruction size and
//! base cycle count, transcribed as data from the 65C02 datasheet so the
//! table can be audited line by line. Page-crossing and branch penalties are
//! added at execute time, never folded into the table.
//!
//! Opcodes the 65C02 leaves undefined decode as NOPs with the size and
//! timing of a non-Rockwell part: `$x3 $x7 $xB $xF` are 1-byte 1-cycle NOPs,
//! `$x2` are 2-byte immediate NOPs, `$44 $54 $D4 $F4 $5C $DC $FC` read an
//! operand they discard.

use std::fmt;

use crate::core::Interrupt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// (zp,X)
    IndirectX,
    /// (zp),Y
    IndirectY,
    /// (zp)
    ZeroPageIndirect,
    Relative,
    /// (abs), JMP only
    Indirect,
    /// (abs,X), JMP only
    AbsoluteIndexedIndirect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Bra,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Phx,
    Phy,
    Pla,
    Plp,
    Plx,
    Ply,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Stz,
    Tax,
    Tay,
    Trb,
    Tsb,
    Tsx,
    Txa,
    Txs,
    Tya,
    // Synthetic pseudo-opcodes (no byte encoding)
    Irq,
    Nmi,
    Res,
    Hlt,
}

impl Mnemonic {
    pub fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bit => "BIT",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Bra => "BRA",
            Brk => "BRK",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Phx => "PHX",
            Phy => "PHY",
            Pla => "PLA",
            Plp => "PLP",
            Plx => "PLX",
            Ply => "PLY",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Stz => "STZ",
            Tax => "TAX",
            Tay => "TAY",
            Trb => "TRB",
            Tsb => "TSB",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
            Irq => "IRQ",
            Nmi => "NMI",
            Res => "RES",
            Hlt => "HLT",
        }
    }

    pub fn is_branch(self) -> bool {
        use Mnemonic::*;
        matches!(self, Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bra | Bvc | Bvs)
    }

    /// Shift/rotate instructions; on the 65C02 these keep the page-cross
    /// penalty in ABS,X form while INC/DEC ABS,X always take 7 cycles.
    pub fn is_shift(self) -> bool {
        use Mnemonic::*;
        matches!(self, Asl | Lsr | Rol | Ror)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable decode record for one opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    /// Byte encoding; `None` for the synthetic interrupt pseudo-opcodes.
    pub code: Option<u8>,
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Instruction size in bytes (0 for pseudo-opcodes, which do not advance PC).
    pub size: u8,
    /// Base cycle count before page-cross and branch penalties.
    pub cycles: u8,
}

impl OpcodeDescriptor {
    /// Whether a page crossing in the effective-address computation costs an
    /// extra cycle. Only indexed reads (and shift-class RMW) pay it; stores
    /// and INC/DEC ABS,X have the fix-up cycle built into their base count.
    pub fn takes_page_penalty(&self) -> bool {
        use super::microcode::BusAccess;
        use AddressingMode::*;
        if !matches!(self.mode, AbsoluteX | AbsoluteY | IndirectY) {
            return false;
        }
        match self.mnemonic.access() {
            BusAccess::Read => true,
            BusAccess::ReadModifyWrite => self.mnemonic.is_shift(),
            BusAccess::Write | BusAccess::None => false,
        }
    }

    pub fn is_pseudo(&self) -> bool {
        self.code.is_none()
    }
}

const fn op(
    code: u8,
    mnemonic: Mnemonic,
    mode: AddressingMode,
    size: u8,
    cycles: u8,
) -> OpcodeDescriptor {
    OpcodeDescriptor {
        code: Some(code),
        mnemonic,
        mode,
        size,
        cycles,
    }
}

const fn pseudo(mnemonic: Mnemonic, cycles: u8) -> OpcodeDescriptor {
    OpcodeDescriptor {
        code: None,
        mnemonic,
        mode: AddressingMode::Implied,
        size: 0,
        cycles,
    }
}

const IMP: AddressingMode = AddressingMode::Implied;
const ACC: AddressingMode = AddressingMode::Accumulator;
const IMM: AddressingMode = AddressingMode::Immediate;
const ZPG: AddressingMode = AddressingMode::ZeroPage;
const ZPX: AddressingMode = AddressingMode::ZeroPageX;
const ZPY: AddressingMode = AddressingMode::ZeroPageY;
const ABS: AddressingMode = AddressingMode::Absolute;
const ABX: AddressingMode = AddressingMode::AbsoluteX;
const ABY: AddressingMode = AddressingMode::AbsoluteY;
const IZX: AddressingMode = AddressingMode::IndirectX;
const IZY: AddressingMode = AddressingMode::IndirectY;
const IZP: AddressingMode = AddressingMode::ZeroPageIndirect;
const REL: AddressingMode = AddressingMode::Relative;
const IND: AddressingMode = AddressingMode::Indirect;
const IAX: AddressingMode = AddressingMode::AbsoluteIndexedIndirect;

/// Complete 256-entry decode table indexed by opcode byte.
#[rustfmt::skip]
pub static OPCODES: [OpcodeDescriptor; 256] = {
    use Mnemonic::*;
    [
        // $0x
        op(0x00, Brk, IMP, 2, 7), op(0x01, Ora, IZX, 2, 6), op(0x02, Nop, IMM, 2, 2), op(0x03, Nop, IMP, 1, 1),
        op(0x04, Tsb, ZPG, 2, 5), op(0x05, Ora, ZPG, 2, 3), op(0x06, Asl, ZPG, 2, 5), op(0x07, Nop, IMP, 1, 1),
        op(0x08, Php, IMP, 1, 3), op(0x09, Ora, IMM, 2, 2), op(0x0A, Asl, ACC, 1, 2), op(0x0B, Nop, IMP, 1, 1),
        op(0x0C, Tsb, ABS, 3, 6), op(0x0D, Ora, ABS, 3, 4), op(0x0E, Asl, ABS, 3, 6), op(0x0F, Nop, IMP, 1, 1),
        // $1x
        op(0x10, Bpl, REL, 2, 2), op(0x11, Ora, IZY, 2, 5), op(0x12, Ora, IZP, 2, 5), op(0x13, Nop, IMP, 1, 1),
        op(0x14, Trb, ZPG, 2, 5), op(0x15, Ora, ZPX, 2, 4), op(0x16, Asl, ZPX, 2, 6), op(0x17, Nop, IMP, 1, 1),
        op(0x18, Clc, IMP, 1, 2), op(0x19, Ora, ABY, 3, 4), op(0x1A, Inc, ACC, 1, 2), op(0x1B, Nop, IMP, 1, 1),
        op(0x1C, Trb, ABS, 3, 6), op(0x1D, Ora, ABX, 3, 4), op(0x1E, Asl, ABX, 3, 6), op(0x1F, Nop, IMP, 1, 1),
        // $2x
        op(0x20, Jsr, ABS, 3, 6), op(0x21, And, IZX, 2, 6), op(0x22, Nop, IMM, 2, 2), op(0x23, Nop, IMP, 1, 1),
        op(0x24, Bit, ZPG, 2, 3), op(0x25, And, ZPG, 2, 3), op(0x26, Rol, ZPG, 2, 5), op(0x27, Nop, IMP, 1, 1),
        op(0x28, Plp, IMP, 1, 4), op(0x29, And, IMM, 2, 2), op(0x2A, Rol, ACC, 1, 2), op(0x2B, Nop, IMP, 1, 1),
        op(0x2C, Bit, ABS, 3, 4), op(0x2D, And, ABS, 3, 4), op(0x2E, Rol, ABS, 3, 6), op(0x2F, Nop, IMP, 1, 1),
        // $3x
        op(0x30, Bmi, REL, 2, 2), op(0x31, And, IZY, 2, 5), op(0x32, And, IZP, 2, 5), op(0x33, Nop, IMP, 1, 1),
        op(0x34, Bit, ZPX, 2, 4), op(0x35, And, ZPX, 2, 4), op(0x36, Rol, ZPX, 2, 6), op(0x37, Nop, IMP, 1, 1),
        op(0x38, Sec, IMP, 1, 2), op(0x39, And, ABY, 3, 4), op(0x3A, Dec, ACC, 1, 2), op(0x3B, Nop, IMP, 1, 1),
        op(0x3C, Bit, ABX, 3, 4), op(0x3D, And, ABX, 3, 4), op(0x3E, Rol, ABX, 3, 6), op(0x3F, Nop, IMP, 1, 1),
        // $4x
        op(0x40, Rti, IMP, 1, 6), op(0x41, Eor, IZX, 2, 6), op(0x42, Nop, IMM, 2, 2), op(0x43, Nop, IMP, 1, 1),
        op(0x44, Nop, ZPG, 2, 3), op(0x45, Eor, ZPG, 2, 3), op(0x46, Lsr, ZPG, 2, 5), op(0x47, Nop, IMP, 1, 1),
        op(0x48, Pha, IMP, 1, 3), op(0x49, Eor, IMM, 2, 2), op(0x4A, Lsr, ACC, 1, 2), op(0x4B, Nop, IMP, 1, 1),
        op(0x4C, Jmp, ABS, 3, 3), op(0x4D, Eor, ABS, 3, 4), op(0x4E, Lsr, ABS, 3, 6), op(0x4F, Nop, IMP, 1, 1),
        // $5x
        op(0x50, Bvc, REL, 2, 2), op(0x51, Eor, IZY, 2, 5), op(0x52, Eor, IZP, 2, 5), op(0x53, Nop, IMP, 1, 1),
        op(0x54, Nop, ZPX, 2, 4), op(0x55, Eor, ZPX, 2, 4), op(0x56, Lsr, ZPX, 2, 6), op(0x57, Nop, IMP, 1, 1),
        op(0x58, Cli, IMP, 1, 2), op(0x59, Eor, ABY, 3, 4), op(0x5A, Phy, IMP, 1, 3), op(0x5B, Nop, IMP, 1, 1),
        op(0x5C, Nop, ABS, 3, 8), op(0x5D, Eor, ABX, 3, 4), op(0x5E, Lsr, ABX, 3, 6), op(0x5F, Nop, IMP, 1, 1),
        // $6x
        op(0x60, Rts, IMP, 1, 6), op(0x61, Adc, IZX, 2, 6), op(0x62, Nop, IMM, 2, 2), op(0x63, Nop, IMP, 1, 1),
        op(0x64, Stz, ZPG, 2, 3), op(0x65, Adc, ZPG, 2, 3), op(0x66, Ror, ZPG, 2, 5), op(0x67, Nop, IMP, 1, 1),
        op(0x68, Pla, IMP, 1, 4), op(0x69, Adc, IMM, 2, 2), op(0x6A, Ror, ACC, 1, 2), op(0x6B, Nop, IMP, 1, 1),
        op(0x6C, Jmp, IND, 3, 6), op(0x6D, Adc, ABS, 3, 4), op(0x6E, Ror, ABS, 3, 6), op(0x6F, Nop, IMP, 1, 1),
        // $7x
        op(0x70, Bvs, REL, 2, 2), op(0x71, Adc, IZY, 2, 5), op(0x72, Adc, IZP, 2, 5), op(0x73, Nop, IMP, 1, 1),
        op(0x74, Stz, ZPX, 2, 4), op(0x75, Adc, ZPX, 2, 4), op(0x76, Ror, ZPX, 2, 6), op(0x77, Nop, IMP, 1, 1),
        op(0x78, Sei, IMP, 1, 2), op(0x79, Adc, ABY, 3, 4), op(0x7A, Ply, IMP, 1, 4), op(0x7B, Nop, IMP, 1, 1),
        op(0x7C, Jmp, IAX, 3, 6), op(0x7D, Adc, ABX, 3, 4), op(0x7E, Ror, ABX, 3, 6), op(0x7F, Nop, IMP, 1, 1),
        // $8x
        op(0x80, Bra, REL, 2, 2), op(0x81, Sta, IZX, 2, 6), op(0x82, Nop, IMM, 2, 2), op(0x83, Nop, IMP, 1, 1),
        op(0x84, Sty, ZPG, 2, 3), op(0x85, Sta, ZPG, 2, 3), op(0x86, Stx, ZPG, 2, 3), op(0x87, Nop, IMP, 1, 1),
        op(0x88, Dey, IMP, 1, 2), op(0x89, Bit, IMM, 2, 2), op(0x8A, Txa, IMP, 1, 2), op(0x8B, Nop, IMP, 1, 1),
        op(0x8C, Sty, ABS, 3, 4), op(0x8D, Sta, ABS, 3, 4), op(0x8E, Stx, ABS, 3, 4), op(0x8F, Nop, IMP, 1, 1),
        // $9x
        op(0x90, Bcc, REL, 2, 2), op(0x91, Sta, IZY, 2, 6), op(0x92, Sta, IZP, 2, 5), op(0x93, Nop, IMP, 1, 1),
        op(0x94, Sty, ZPX, 2, 4), op(0x95, Sta, ZPX, 2, 4), op(0x96, Stx, ZPY, 2, 4), op(0x97, Nop, IMP, 1, 1),
        op(0x98, Tya, IMP, 1, 2), op(0x99, Sta, ABY, 3, 5), op(0x9A, Txs, IMP, 1, 2), op(0x9B, Nop, IMP, 1, 1),
        op(0x9C, Stz, ABS, 3, 4), op(0x9D, Sta, ABX, 3, 5), op(0x9E, Stz, ABX, 3, 5), op(0x9F, Nop, IMP, 1, 1),
        // $Ax
        op(0xA0, Ldy, IMM, 2, 2), op(0xA1, Lda, IZX, 2, 6), op(0xA2, Ldx, IMM, 2, 2), op(0xA3, Nop, IMP, 1, 1),
        op(0xA4, Ldy, ZPG, 2, 3), op(0xA5, Lda, ZPG, 2, 3), op(0xA6, Ldx, ZPG, 2, 3), op(0xA7, Nop, IMP, 1, 1),
        op(0xA8, Tay, IMP, 1, 2), op(0xA9, Lda, IMM, 2, 2), op(0xAA, Tax, IMP, 1, 2), op(0xAB, Nop, IMP, 1, 1),
        op(0xAC, Ldy, ABS, 3, 4), op(0xAD, Lda, ABS, 3, 4), op(0xAE, Ldx, ABS, 3, 4), op(0xAF, Nop, IMP, 1, 1),
        // $Bx
        op(0xB0, Bcs, REL, 2, 2), op(0xB1, Lda, IZY, 2, 5), op(0xB2, Lda, IZP, 2, 5), op(0xB3, Nop, IMP, 1, 1),
        op(0xB4, Ldy, ZPX, 2, 4), op(0xB5, Lda, ZPX, 2, 4), op(0xB6, Ldx, ZPY, 2, 4), op(0xB7, Nop, IMP, 1, 1),
        op(0xB8, Clv, IMP, 1, 2), op(0xB9, Lda, ABY, 3, 4), op(0xBA, Tsx, IMP, 1, 2), op(0xBB, Nop, IMP, 1, 1),
        op(0xBC, Ldy, ABX, 3, 4), op(0xBD, Lda, ABX, 3, 4), op(0xBE, Ldx, ABY, 3, 4), op(0xBF, Nop, IMP, 1, 1),
        // $Cx
        op(0xC0, Cpy, IMM, 2, 2), op(0xC1, Cmp, IZX, 2, 6), op(0xC2, Nop, IMM, 2, 2), op(0xC3, Nop, IMP, 1, 1),
        op(0xC4, Cpy, ZPG, 2, 3), op(0xC5, Cmp, ZPG, 2, 3), op(0xC6, Dec, ZPG, 2, 5), op(0xC7, Nop, IMP, 1, 1),
        op(0xC8, Iny, IMP, 1, 2), op(0xC9, Cmp, IMM, 2, 2), op(0xCA, Dex, IMP, 1, 2), op(0xCB, Nop, IMP, 1, 1),
        op(0xCC, Cpy, ABS, 3, 4), op(0xCD, Cmp, ABS, 3, 4), op(0xCE, Dec, ABS, 3, 6), op(0xCF, Nop, IMP, 1, 1),
        // $Dx
        op(0xD0, Bne, REL, 2, 2), op(0xD1, Cmp, IZY, 2, 5), op(0xD2, Cmp, IZP, 2, 5), op(0xD3, Nop, IMP, 1, 1),
        op(0xD4, Nop, ZPX, 2, 4), op(0xD5, Cmp, ZPX, 2, 4), op(0xD6, Dec, ZPX, 2, 6), op(0xD7, Nop, IMP, 1, 1),
        op(0xD8, Cld, IMP, 1, 2), op(0xD9, Cmp, ABY, 3, 4), op(0xDA, Phx, IMP, 1, 3), op(0xDB, Nop, IMP, 1, 1),
        op(0xDC, Nop, ABS, 3, 4), op(0xDD, Cmp, ABX, 3, 4), op(0xDE, Dec, ABX, 3, 7), op(0xDF, Nop, IMP, 1, 1),
        // $Ex
        op(0xE0, Cpx, IMM, 2, 2), op(0xE1, Sbc, IZX, 2, 6), op(0xE2, Nop, IMM, 2, 2), op(0xE3, Nop, IMP, 1, 1),
        op(0xE4, Cpx, ZPG, 2, 3), op(0xE5, Sbc, ZPG, 2, 3), op(0xE6, Inc, ZPG, 2, 5), op(0xE7, Nop, IMP, 1, 1),
        op(0xE8, Inx, IMP, 1, 2), op(0xE9, Sbc, IMM, 2, 2), op(0xEA, Nop, IMP, 1, 2), op(0xEB, Nop, IMP, 1, 1),
        op(0xEC, Cpx, ABS, 3, 4), op(0xED, Sbc, ABS, 3, 4), op(0xEE, Inc, ABS, 3, 6), op(0xEF, Nop, IMP, 1, 1),
        // $Fx
        op(0xF0, Beq, REL, 2, 2), op(0xF1, Sbc, IZY, 2, 5), op(0xF2, Sbc, IZP, 2, 5), op(0xF3, Nop, IMP, 1, 1),
        op(0xF4, Nop, ZPX, 2, 4), op(0xF5, Sbc, ZPX, 2, 4), op(0xF6, Inc, ZPX, 2, 6), op(0xF7, Nop, IMP, 1, 1),
        op(0xF8, Sed, IMP, 1, 2), op(0xF9, Sbc, ABY, 3, 4), op(0xFA, Plx, IMP, 1, 4), op(0xFB, Nop, IMP, 1, 1),
        op(0xFC, Nop, ABS, 3, 4), op(0xFD, Sbc, ABX, 3, 4), op(0xFE, Inc, ABX, 3, 7), op(0xFF, Nop, IMP, 1, 1),
    ]
};

pub static IRQ: OpcodeDescriptor = pseudo(Mnemonic::Irq, 7);
pub static NMI: OpcodeDescriptor = pseudo(Mnemonic::Nmi, 7);
pub static RES: OpcodeDescriptor = pseudo(Mnemonic::Res, 7);
pub static HLT: OpcodeDescriptor = pseudo(Mnemonic::Hlt, 1);

/// Pseudo-opcode substituted for a pending interrupt.
pub fn pseudo_opcode(interrupt: Interrupt) -> &'static OpcodeDescriptor {
    match interrupt {
        Interrupt::Irq => &IRQ,
        Interrupt::Nmi => &NMI,
        Interrupt::Res => &RES,
        Interrupt::Hlt => &HLT,
    }
}
