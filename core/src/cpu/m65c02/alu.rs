use super::addressing::Operand;
use super::opcodes::AddressingMode;
use super::{M65C02, StatusFlag};
use crate::core::Bus;

impl M65C02 {
    // ---- Arithmetic helpers ----

    /// Binary A = A + M + C. Sets N, Z, C, V.
    #[inline]
    pub(crate) fn add_with_carry(&mut self, operand: u8) {
        let a = self.regs.a;
        let sum = a as u16 + operand as u16 + self.regs.carry() as u16;
        let result = sum as u8;
        self.regs.set_flag(StatusFlag::C, sum > 0xFF);
        self.regs
            .set_flag(StatusFlag::V, (a ^ result) & (operand ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.set_nz(result);
    }

    /// `reg + !m + 1`; N, Z, C from the sum. V untouched.
    #[inline]
    pub(crate) fn compare(&mut self, reg: u8, operand: u8) {
        let sum = reg as u16 + (!operand) as u16 + 1;
        self.regs.set_flag(StatusFlag::C, sum > 0xFF);
        self.regs.set_nz(sum as u8);
    }

    // ---- Instructions ----

    /// ADC - N, Z, C, V affected. The caller has already rejected decimal mode.
    pub(crate) fn op_adc<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        let m = bus.read(self.master, operand.ptr);
        self.add_with_carry(m);
    }

    /// SBC - A + !M + C. N, Z, C, V affected.
    pub(crate) fn op_sbc<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        let m = bus.read(self.master, operand.ptr);
        self.add_with_carry(!m);
    }

    pub(crate) fn op_and<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        self.regs.a &= bus.read(self.master, operand.ptr);
        self.regs.set_nz(self.regs.a);
    }

    pub(crate) fn op_ora<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        self.regs.a |= bus.read(self.master, operand.ptr);
        self.regs.set_nz(self.regs.a);
    }

    pub(crate) fn op_eor<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        self.regs.a ^= bus.read(self.master, operand.ptr);
        self.regs.set_nz(self.regs.a);
    }

    /// CMP/CPX/CPY share one flag computation; `reg` is the register compared.
    pub(crate) fn op_compare<B: Bus + ?Sized>(&mut self, bus: &mut B, reg: u8, operand: Operand) {
        let m = bus.read(self.master, operand.ptr);
        self.compare(reg, m);
    }

    /// BIT - Z from A & M. Memory forms also copy M bits 7/6 into N/V;
    /// the immediate form touches Z only.
    pub(crate) fn op_bit<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mode: AddressingMode,
        operand: Operand,
    ) {
        let m = bus.read(self.master, operand.ptr);
        self.regs.set_flag(StatusFlag::Z, self.regs.a & m == 0);
        if mode != AddressingMode::Immediate {
            self.regs.set_flag(StatusFlag::N, m & 0x80 != 0);
            self.regs.set_flag(StatusFlag::V, m & 0x40 != 0);
        }
    }

    /// TSB - M |= A, Z from A & M (original value).
    pub(crate) fn op_tsb<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        let m = bus.read(self.master, operand.ptr);
        self.regs.set_flag(StatusFlag::Z, self.regs.a & m == 0);
        bus.write(self.master, operand.ptr, m | self.regs.a);
    }

    /// TRB - M &= !A, Z from A & M (original value).
    pub(crate) fn op_trb<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        let m = bus.read(self.master, operand.ptr);
        self.regs.set_flag(StatusFlag::Z, self.regs.a & m == 0);
        bus.write(self.master, operand.ptr, m & !self.regs.a);
    }
}
