use super::M65C02;
use super::addressing::Operand;
use crate::core::Bus;

impl M65C02 {
    // ---- Loads ----

    /// LDA - N, Z affected.
    pub(crate) fn op_lda<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        self.regs.a = bus.read(self.master, operand.ptr);
        self.regs.set_nz(self.regs.a);
    }

    pub(crate) fn op_ldx<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        self.regs.x = bus.read(self.master, operand.ptr);
        self.regs.set_nz(self.regs.x);
    }

    pub(crate) fn op_ldy<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        self.regs.y = bus.read(self.master, operand.ptr);
        self.regs.set_nz(self.regs.y);
    }

    // ---- Stores (no flags) ----

    /// STA/STX/STY/STZ - `value` is the register being stored (0 for STZ).
    pub(crate) fn op_store<B: Bus + ?Sized>(&mut self, bus: &mut B, value: u8, operand: Operand) {
        bus.write(self.master, operand.ptr, value);
    }

    // ---- Register transfers and increments ----

    /// TAX/TAY/TXA/TYA/TSX and INX/INY/DEX/DEY all set N, Z from the result.
    /// TXS is the one transfer that leaves flags alone.
    #[inline]
    pub(crate) fn load_register(&mut self, result: u8) -> u8 {
        self.regs.set_nz(result);
        result
    }
}
