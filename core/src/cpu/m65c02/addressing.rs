use super::M65C02;
use super::opcodes::AddressingMode;
use crate::core::Bus;

/// Resolved operand of the current step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Operand {
    /// Effective address (or, for IMM/REL, the address of the operand byte).
    pub ptr: u16,
    /// Base and effective address differ in their high byte.
    pub crossed: bool,
}

impl Operand {
    #[inline]
    fn at(ptr: u16) -> Self {
        Self {
            ptr,
            crossed: false,
        }
    }

    #[inline]
    fn indexed(base: u16, index: u8) -> Self {
        let ptr = base.wrapping_add(index as u16);
        Self {
            ptr,
            crossed: (base ^ ptr) & 0xFF00 != 0,
        }
    }
}

impl M65C02 {
    /// Little-endian word at `addr`, high byte from `addr + 1` with 16-bit wrap.
    #[inline]
    pub(crate) fn read_word<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(self.master, addr);
        let hi = bus.read(self.master, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Pointer stored in zero page; the high byte wraps from $FF to $00.
    #[inline]
    fn read_zp_word<B: Bus + ?Sized>(&mut self, bus: &mut B, zp: u8) -> u16 {
        let lo = bus.read(self.master, zp as u16);
        let hi = bus.read(self.master, zp.wrapping_add(1) as u16);
        u16::from_le_bytes([lo, hi])
    }

    /// Fetch operand bytes following the opcode at `pc` and compute the
    /// effective address for `mode`.
    pub(crate) fn resolve_operand<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        pc: u16,
    ) -> Operand {
        use AddressingMode::*;
        let arg = pc.wrapping_add(1);
        match mode {
            Implied | Accumulator => Operand::default(),
            Immediate | Relative => Operand::at(arg),
            ZeroPage => Operand::at(bus.read(self.master, arg) as u16),
            ZeroPageX => {
                let zp = bus.read(self.master, arg).wrapping_add(self.regs.x);
                Operand::at(zp as u16)
            }
            ZeroPageY => {
                let zp = bus.read(self.master, arg).wrapping_add(self.regs.y);
                Operand::at(zp as u16)
            }
            Absolute => Operand::at(self.read_word(bus, arg)),
            AbsoluteX => {
                let base = self.read_word(bus, arg);
                Operand::indexed(base, self.regs.x)
            }
            AbsoluteY => {
                let base = self.read_word(bus, arg);
                Operand::indexed(base, self.regs.y)
            }
            IndirectX => {
                let zp = bus.read(self.master, arg).wrapping_add(self.regs.x);
                Operand::at(self.read_zp_word(bus, zp))
            }
            IndirectY => {
                let zp = bus.read(self.master, arg);
                let base = self.read_zp_word(bus, zp);
                Operand::indexed(base, self.regs.y)
            }
            ZeroPageIndirect => {
                let zp = bus.read(self.master, arg);
                Operand::at(self.read_zp_word(bus, zp))
            }
            Indirect => {
                // High byte comes from the start of the same page when the
                // pointer sits at $xxFF.
                let ptr = self.read_word(bus, arg);
                let lo = bus.read(self.master, ptr);
                let hi = bus.read(self.master, (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF));
                Operand::at(u16::from_le_bytes([lo, hi]))
            }
            AbsoluteIndexedIndirect => {
                let ptr = self.read_word(bus, arg).wrapping_add(self.regs.x as u16);
                Operand::at(self.read_word(bus, ptr))
            }
        }
    }
}
