use tracing::{debug, warn};

use super::{M65C02, StatusFlag};
use crate::core::{Bus, Interrupt};

/// Reset vector.
pub const RES_VECTOR: u16 = 0xFFFC;
/// Non-maskable interrupt vector.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// IRQ and BRK share this vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;

impl M65C02 {
    // ---- Stack primitives (page 1, descending) ----

    #[inline]
    pub(crate) fn push<B: Bus + ?Sized>(&mut self, bus: &mut B, data: u8) {
        bus.write(self.master, 0x0100 | self.regs.s as u16, data);
        self.regs.s = self.regs.s.wrapping_sub(1);
    }

    #[inline]
    pub(crate) fn pull<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        self.regs.s = self.regs.s.wrapping_add(1);
        bus.read(self.master, 0x0100 | self.regs.s as u16)
    }

    /// Push high byte first so the word reads little-endian on the stack.
    pub(crate) fn push_word<B: Bus + ?Sized>(&mut self, bus: &mut B, word: u16) {
        let [lo, hi] = word.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    pub(crate) fn pull_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    // ---- Register pushes and pulls ----

    /// PHP - B and U are always set in the pushed copy.
    pub(crate) fn op_php<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let p = self.regs.p | StatusFlag::B as u8 | StatusFlag::U as u8;
        self.push(bus, p);
    }

    /// PLP - U forced on.
    pub(crate) fn op_plp<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let p = self.pull(bus);
        self.regs.set_p(p);
    }

    /// PLA/PLX/PLY - N, Z affected.
    pub(crate) fn pull_register<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let value = self.pull(bus);
        self.regs.set_nz(value);
        value
    }

    // ---- Interrupt sequences ----

    /// Shared tail of BRK/IRQ/NMI: push PC and P, mask IRQ, leave decimal
    /// mode, jump through `vector`.
    fn interrupt<B: Bus + ?Sized>(&mut self, bus: &mut B, vector: u16, brk: bool) {
        self.push_word(bus, self.regs.pc);
        let mut p = self.regs.p | StatusFlag::U as u8;
        if brk {
            p |= StatusFlag::B as u8;
        } else {
            p &= !(StatusFlag::B as u8);
        }
        self.push(bus, p);
        self.regs.set_flag(StatusFlag::I, true);
        self.regs.set_flag(StatusFlag::D, false);
        self.regs.pc = self.read_word(bus, vector);
    }

    /// BRK - pushes PC+2 (the signature byte is skipped) with B set.
    pub(crate) fn op_brk<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.interrupt(bus, IRQ_VECTOR, true);
    }

    pub(crate) fn op_irq<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.interrupt(bus, IRQ_VECTOR, false);
    }

    pub(crate) fn op_nmi<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.interrupt(bus, NMI_VECTOR, false);
    }

    /// RTI - pull P (U forced on), then PCL, PCH. No +1 adjustment.
    pub(crate) fn op_rti<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let p = self.pull(bus);
        self.regs.set_p(p);
        self.regs.pc = self.pull_word(bus);
    }

    /// RES - nothing is pushed and S is left alone. Clears the halt latch.
    pub(crate) fn op_res<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.regs.set_flag(StatusFlag::I, true);
        self.regs.set_flag(StatusFlag::D, false);
        self.regs.pc = self.read_word(bus, RES_VECTOR);
        self.halt_acknowledged = false;
        bus.signals().interrupts.clear(Interrupt::Hlt);
        debug!(pc = format_args!("${:04X}", self.regs.pc), "m65c02 reset");
    }

    /// HLT - the first execution after a RES warm-resets the bus; later ones
    /// idle. The latch keeps HLT pending until RES replaces it.
    pub(crate) fn op_hlt<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if !self.halt_acknowledged {
            warn!(pc = format_args!("${:04X}", self.regs.pc), "host halt: warm-resetting bus");
            bus.warm_reset();
            self.halt_acknowledged = true;
        }
    }
}
