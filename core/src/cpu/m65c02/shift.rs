use super::addressing::Operand;
use super::opcodes::AddressingMode;
use super::{M65C02, StatusFlag};
use crate::core::Bus;

impl M65C02 {
    /// Apply `f` to A (accumulator mode) or to the byte at the effective
    /// address, writing the result back once.
    #[inline]
    fn modify<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
        f: impl FnOnce(&mut Self, u8) -> u8,
    ) {
        if mode == AddressingMode::Accumulator {
            let a = self.regs.a;
            self.regs.a = f(self, a);
        } else {
            let value = bus.read(self.master, operand.ptr);
            let result = f(self, value);
            bus.write(self.master, operand.ptr, result);
        }
    }

    /// Set N, Z, C flags for shift/rotate operations.
    #[inline]
    fn set_flags_shift(&mut self, result: u8, carry: bool) {
        self.regs.set_nz(result);
        self.regs.set_flag(StatusFlag::C, carry);
    }

    /// ASL - C <- [76543210] <- 0
    pub(crate) fn op_asl<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
    ) {
        self.modify(bus, mode, operand, |cpu, v| {
            let r = v << 1;
            cpu.set_flags_shift(r, v & 0x80 != 0);
            r
        });
    }

    /// LSR - 0 -> [76543210] -> C
    pub(crate) fn op_lsr<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
    ) {
        self.modify(bus, mode, operand, |cpu, v| {
            let r = v >> 1;
            cpu.set_flags_shift(r, v & 0x01 != 0);
            r
        });
    }

    /// ROL - C <- [76543210] <- C
    pub(crate) fn op_rol<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
    ) {
        self.modify(bus, mode, operand, |cpu, v| {
            let r = (v << 1) | cpu.regs.carry();
            cpu.set_flags_shift(r, v & 0x80 != 0);
            r
        });
    }

    /// ROR - C -> [76543210] -> C
    pub(crate) fn op_ror<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
    ) {
        self.modify(bus, mode, operand, |cpu, v| {
            let r = (v >> 1) | (cpu.regs.carry() << 7);
            cpu.set_flags_shift(r, v & 0x01 != 0);
            r
        });
    }

    /// INC (memory or A) - N, Z affected.
    pub(crate) fn op_inc<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
    ) {
        self.modify(bus, mode, operand, |cpu, v| {
            let r = v.wrapping_add(1);
            cpu.regs.set_nz(r);
            r
        });
    }

    /// DEC (memory or A) - N, Z affected.
    pub(crate) fn op_dec<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
    ) {
        self.modify(bus, mode, operand, |cpu, v| {
            let r = v.wrapping_sub(1);
            cpu.regs.set_nz(r);
            r
        });
    }
}
