//! WDC 65C02 instruction engine.
//!
//! The CPU executes one whole instruction per `cycle()` call and reports the
//! cycles it consumed. Decode is pipelined: at the end of each step the next
//! opcode (or a pending interrupt's pseudo-opcode) is resolved into
//! `pending_step`, so `regs.pc` always names the address of the step that
//! will run next.

mod addressing;
mod alu;
mod branch;
mod load_store;
pub mod microcode;
pub mod opcodes;
mod registers;
mod shift;
mod stack;

pub use addressing::Operand;
pub use opcodes::{AddressingMode, Mnemonic, OPCODES, OpcodeDescriptor};
pub use registers::{RegisterFile, StatusFlag};
pub use stack::{IRQ_VECTOR, NMI_VECTOR, RES_VECTOR};

use tracing::debug;

use crate::core::{Bus, BusMaster, Component, CoreError, Interrupt};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, M65C02State},
};

/// A decoded step: the descriptor to execute and the address it was fetched from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Step {
    op: &'static OpcodeDescriptor,
    pc: u16,
}

impl Step {
    fn reset() -> Self {
        Self {
            op: &opcodes::RES,
            pc: 0,
        }
    }
}

pub struct M65C02 {
    pub regs: RegisterFile,

    current_step: Step,
    pending_step: Step,
    /// Set once a HLT has warm-reset the bus; cleared by RES.
    halt_acknowledged: bool,
    total_cycles: u64,
    master: BusMaster,
}

impl Default for M65C02 {
    fn default() -> Self {
        Self::new()
    }
}

impl M65C02 {
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::power_on(),
            current_step: Step::reset(),
            pending_step: Step::reset(),
            halt_acknowledged: false,
            total_cycles: 0,
            master: BusMaster::Cpu(0),
        }
    }

    /// Power-on: registers to their power-on values, halt latch cleared and
    /// RES queued as the next step.
    pub fn cold_reset<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.regs = RegisterFile::power_on();
        self.halt_acknowledged = false;
        self.total_cycles = 0;
        self.pending_step = Step::reset();
        self.current_step = self.pending_step;
        bus.signals().interrupts.clear(Interrupt::Hlt);
        debug!("m65c02 cold reset");
    }

    /// Re-decode the pending step from the byte at `regs.pc`. Needed after
    /// a host writes registers directly.
    pub fn prime<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let code = bus.read(self.master, self.regs.pc);
        self.pending_step = Step {
            op: &OPCODES[code as usize],
            pc: self.regs.pc,
        };
    }

    /// Descriptor of the step that will run on the next `cycle()`.
    pub fn pending_opcode(&self) -> &'static OpcodeDescriptor {
        self.pending_step.op
    }

    /// Descriptor of the step most recently executed.
    pub fn current_opcode(&self) -> &'static OpcodeDescriptor {
        self.current_step.op
    }

    /// Execute one instruction step and return the cycles it consumed.
    pub fn cycle<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u32, CoreError> {
        let step = self.pending_step;
        let op = step.op;

        if matches!(op.mnemonic, Mnemonic::Adc | Mnemonic::Sbc) && self.regs.flag(StatusFlag::D) {
            return Err(CoreError::DecimalMode {
                opcode: op.code.unwrap_or_default(),
                pc: step.pc,
            });
        }

        self.current_step = step;
        let operand = self.resolve_operand(bus, op.mode, step.pc);
        self.regs.pc = step.pc.wrapping_add(op.size as u16);

        let mut cycles = op.cycles as u32;
        if operand.crossed && op.takes_page_penalty() {
            cycles += 1;
        }
        cycles += self.dispatch(bus, step, operand)?;
        cycles += bus.signals().take_stolen_cycles();

        self.pending_step = self.next_step(bus);
        self.total_cycles += cycles as u64;
        Ok(cycles)
    }

    /// Sample the interrupt latch at the instruction boundary. IRQ is masked
    /// by I; everything else is taken. HLT stays latched.
    fn next_step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Step {
        let pc = self.regs.pc;
        let masked_irq = self.regs.flag(StatusFlag::I);
        let interrupts = &mut bus.signals().interrupts;
        if let Some(interrupt) = interrupts.pending()
            && !(interrupt == Interrupt::Irq && masked_irq)
        {
            if interrupt != Interrupt::Hlt {
                interrupts.take();
            }
            return Step {
                op: opcodes::pseudo_opcode(interrupt),
                pc,
            };
        }
        let code = bus.read(self.master, pc);
        Step {
            op: &OPCODES[code as usize],
            pc,
        }
    }

    /// Run the execute handler for `step`. Returns extra cycles beyond the
    /// table count (taken branches only).
    fn dispatch<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        step: Step,
        operand: Operand,
    ) -> Result<u32, CoreError> {
        use Mnemonic::*;
        use StatusFlag::{C, D, I, N, V, Z};

        let mode = step.op.mode;
        match step.op.mnemonic {
            // ALU
            Adc => self.op_adc(bus, operand),
            Sbc => self.op_sbc(bus, operand),
            And => self.op_and(bus, operand),
            Ora => self.op_ora(bus, operand),
            Eor => self.op_eor(bus, operand),
            Cmp => self.op_compare(bus, self.regs.a, operand),
            Cpx => self.op_compare(bus, self.regs.x, operand),
            Cpy => self.op_compare(bus, self.regs.y, operand),
            Bit => self.op_bit(bus, mode, operand),
            Tsb => self.op_tsb(bus, operand),
            Trb => self.op_trb(bus, operand),

            // Shifts and increments
            Asl => self.op_asl(bus, mode, operand),
            Lsr => self.op_lsr(bus, mode, operand),
            Rol => self.op_rol(bus, mode, operand),
            Ror => self.op_ror(bus, mode, operand),
            Inc => self.op_inc(bus, mode, operand),
            Dec => self.op_dec(bus, mode, operand),
            Inx => self.regs.x = self.load_register(self.regs.x.wrapping_add(1)),
            Iny => self.regs.y = self.load_register(self.regs.y.wrapping_add(1)),
            Dex => self.regs.x = self.load_register(self.regs.x.wrapping_sub(1)),
            Dey => self.regs.y = self.load_register(self.regs.y.wrapping_sub(1)),

            // Loads, stores, transfers
            Lda => self.op_lda(bus, operand),
            Ldx => self.op_ldx(bus, operand),
            Ldy => self.op_ldy(bus, operand),
            Sta => self.op_store(bus, self.regs.a, operand),
            Stx => self.op_store(bus, self.regs.x, operand),
            Sty => self.op_store(bus, self.regs.y, operand),
            Stz => self.op_store(bus, 0, operand),
            Tax => self.regs.x = self.load_register(self.regs.a),
            Tay => self.regs.y = self.load_register(self.regs.a),
            Txa => self.regs.a = self.load_register(self.regs.x),
            Tya => self.regs.a = self.load_register(self.regs.y),
            Tsx => self.regs.x = self.load_register(self.regs.s),
            Txs => self.regs.s = self.regs.x,

            // Flags
            Clc => self.regs.set_flag(C, false),
            Sec => self.regs.set_flag(C, true),
            Cli => self.regs.set_flag(I, false),
            Sei => self.regs.set_flag(I, true),
            Cld => self.regs.set_flag(D, false),
            Sed => self.regs.set_flag(D, true),
            Clv => self.regs.set_flag(V, false),

            // Branches and jumps
            Bcc => return Ok(self.op_branch(bus, operand, !self.regs.flag(C))),
            Bcs => return Ok(self.op_branch(bus, operand, self.regs.flag(C))),
            Bne => return Ok(self.op_branch(bus, operand, !self.regs.flag(Z))),
            Beq => return Ok(self.op_branch(bus, operand, self.regs.flag(Z))),
            Bpl => return Ok(self.op_branch(bus, operand, !self.regs.flag(N))),
            Bmi => return Ok(self.op_branch(bus, operand, self.regs.flag(N))),
            Bvc => return Ok(self.op_branch(bus, operand, !self.regs.flag(V))),
            Bvs => return Ok(self.op_branch(bus, operand, self.regs.flag(V))),
            Bra => return Ok(self.op_branch(bus, operand, true)),
            Jmp => self.op_jmp(operand),
            Jsr => self.op_jsr(bus, operand),
            Rts => self.op_rts(bus),

            // Stack
            Pha => self.push(bus, self.regs.a),
            Phx => self.push(bus, self.regs.x),
            Phy => self.push(bus, self.regs.y),
            Php => self.op_php(bus),
            Pla => self.regs.a = self.pull_register(bus),
            Plx => self.regs.x = self.pull_register(bus),
            Ply => self.regs.y = self.pull_register(bus),
            Plp => self.op_plp(bus),
            Brk => self.op_brk(bus),
            Rti => self.op_rti(bus),

            Nop => {}

            // Pseudo-opcodes only arrive through the interrupt latch.
            Irq | Nmi | Res | Hlt if !step.op.is_pseudo() => {
                return Err(CoreError::UnimplementedOpcode {
                    mnemonic: step.op.mnemonic.name(),
                    pc: step.pc,
                });
            }
            Irq => self.op_irq(bus),
            Nmi => self.op_nmi(bus),
            Res => self.op_res(bus),
            Hlt => self.op_hlt(bus),
        }
        Ok(0)
    }
}

impl<B: Bus + 'static> Component<B> for M65C02 {
    fn cold_reset(&mut self, bus: &mut B) {
        M65C02::cold_reset(self, bus);
    }

    fn cycle(&mut self, bus: &mut B) -> Result<u32, CoreError> {
        M65C02::cycle(self, bus)
    }

    fn name(&self) -> &'static str {
        "m65c02"
    }
}

impl Cpu for M65C02 {
    fn reset(&mut self) {
        self.pending_step = Step {
            op: &opcodes::RES,
            pc: self.regs.pc,
        };
    }

    fn is_sleeping(&self) -> bool {
        self.halt_acknowledged && self.current_step.op.mnemonic == Mnemonic::Hlt
    }

    fn total_cycles(&self) -> u64 {
        self.total_cycles
    }
}

impl CpuStateTrait for M65C02 {
    type Snapshot = M65C02State;

    fn snapshot(&self) -> M65C02State {
        M65C02State {
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            pc: self.regs.pc,
            s: self.regs.s,
            p: self.regs.p,
        }
    }
}
