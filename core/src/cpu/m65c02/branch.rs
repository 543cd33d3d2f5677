use super::M65C02;
use super::addressing::Operand;
use crate::core::Bus;

impl M65C02 {
    /// Conditional (or, for BRA, unconditional) relative branch.
    ///
    /// `regs.pc` already holds the address of the next instruction. Returns
    /// the extra cycles: +1 if taken, +1 more if the target lies on a
    /// different page than the next instruction.
    pub(crate) fn op_branch<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        operand: Operand,
        taken: bool,
    ) -> u32 {
        let offset = bus.read(self.master, operand.ptr) as i8;
        if !taken {
            return 0;
        }
        let next_pc = self.regs.pc;
        let target = next_pc.wrapping_add(offset as i16 as u16);
        self.regs.pc = target;
        if (target ^ next_pc) & 0xFF00 != 0 { 2 } else { 1 }
    }

    /// JMP abs / (abs) / (abs,X) - the operand already holds the target.
    pub(crate) fn op_jmp(&mut self, operand: Operand) {
        self.regs.pc = operand.ptr;
    }

    /// JSR - push the address of the last operand byte, then jump.
    pub(crate) fn op_jsr<B: Bus + ?Sized>(&mut self, bus: &mut B, operand: Operand) {
        let ret = self.regs.pc.wrapping_sub(1);
        self.push_word(bus, ret);
        self.regs.pc = operand.ptr;
    }

    /// RTS - pull the return address and resume one past it.
    pub(crate) fn op_rts<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.regs.pc = self.pull_word(bus).wrapping_add(1);
    }
}
