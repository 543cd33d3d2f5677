//! Independent instruction-level model of the 65C02.
//!
//! Used as the oracle for the opcode sweep. Decode works from the opcode's
//! bit fields rather than a lookup table, and cycle counts are derived from
//! addressing-mode rules, so a transcription slip in the core's decode table
//! shows up as a mismatch instead of being mirrored here.
//!
//! Behavior deliberately tracks the core where the core departs from
//! silicon: JMP (abs) keeps the page-wrap quirk, undefined opcodes are
//! NOPs, and decimal-mode ADC/SBC is refused.

const C: u8 = 0x01;
const Z: u8 = 0x02;
const I: u8 = 0x04;
const D: u8 = 0x08;
const B: u8 = 0x10;
const U: u8 = 0x20;
const V: u8 = 0x40;
const N: u8 = 0x80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Imp,
    Acc,
    Imm,
    Zp,
    Zpx,
    Zpy,
    Abs,
    Abx,
    Aby,
    Izx,
    Izy,
    Izp,
    Rel,
    Ind,
    Iax,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reg {
    A,
    X,
    Y,
    S,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Ora,
    And,
    Eor,
    Adc,
    Sta,
    Lda,
    Cmp,
    Sbc,
    Asl,
    Rol,
    Lsr,
    Ror,
    Stx,
    Ldx,
    Dec,
    Inc,
    Bit,
    Tsb,
    Trb,
    Stz,
    Sty,
    Ldy,
    Cpx,
    Cpy,
    /// Branch on `flag == set`; BRA is `Branch(0, false)` with flag mask 0.
    Branch(u8, bool),
    Jmp,
    Jsr,
    Rts,
    Rti,
    Brk,
    Push(Reg),
    Pull(Reg),
    Php,
    Plp,
    /// Register transfer `from -> to`; TXS leaves the flags alone.
    Transfer(Reg, Reg),
    /// Increment (+1) or decrement (-1) an index register.
    Step(Reg, i8),
    /// Set or clear a status bit.
    Flag(u8, bool),
    Nop,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Class {
    Read,
    Write,
    Modify,
    Control,
}

impl Op {
    fn class(self) -> Class {
        use Op::*;
        match self {
            Ora | And | Eor | Adc | Lda | Cmp | Sbc | Ldx | Bit | Ldy | Cpx | Cpy | Nop => {
                Class::Read
            }
            Sta | Stx | Stz | Sty => Class::Write,
            Asl | Rol | Lsr | Ror | Dec | Inc | Tsb | Trb => Class::Modify,
            _ => Class::Control,
        }
    }
}

const ALU: [Op; 8] = [Op::Ora, Op::And, Op::Eor, Op::Adc, Op::Sta, Op::Lda, Op::Cmp, Op::Sbc];
const RMW: [Op; 8] = [Op::Asl, Op::Rol, Op::Lsr, Op::Ror, Op::Stx, Op::Ldx, Op::Dec, Op::Inc];

fn decode(opcode: u8) -> (Op, Mode) {
    let aaa = (opcode >> 5) as usize;
    let bbb = (opcode >> 2) & 7;
    match opcode & 3 {
        1 => {
            if opcode == 0x89 {
                return (Op::Bit, Mode::Imm);
            }
            let mode = [
                Mode::Izx,
                Mode::Zp,
                Mode::Imm,
                Mode::Abs,
                Mode::Izy,
                Mode::Zpx,
                Mode::Aby,
                Mode::Abx,
            ][bbb as usize];
            (ALU[aaa], mode)
        }
        2 => decode_group_two(opcode, aaa, bbb),
        3 => (Op::Nop, Mode::Imp),
        _ => decode_group_zero(opcode),
    }
}

fn decode_group_two(opcode: u8, aaa: usize, bbb: u8) -> (Op, Mode) {
    let op = RMW[aaa];
    let index_y = matches!(op, Op::Stx | Op::Ldx);
    match bbb {
        0 if opcode == 0xA2 => (Op::Ldx, Mode::Imm),
        0 => (Op::Nop, Mode::Imm),
        1 => (op, Mode::Zp),
        2 => match opcode {
            0x8A => (Op::Transfer(Reg::X, Reg::A), Mode::Imp),
            0xAA => (Op::Transfer(Reg::A, Reg::X), Mode::Imp),
            0xCA => (Op::Step(Reg::X, -1), Mode::Imp),
            0xEA => (Op::Nop, Mode::Imp),
            _ => (op, Mode::Acc),
        },
        3 => (op, Mode::Abs),
        4 => (ALU[aaa], Mode::Izp),
        5 if index_y => (op, Mode::Zpy),
        5 => (op, Mode::Zpx),
        6 => match opcode {
            0x1A => (Op::Inc, Mode::Acc),
            0x3A => (Op::Dec, Mode::Acc),
            0x5A => (Op::Push(Reg::Y), Mode::Imp),
            0x7A => (Op::Pull(Reg::Y), Mode::Imp),
            0x9A => (Op::Transfer(Reg::X, Reg::S), Mode::Imp),
            0xBA => (Op::Transfer(Reg::S, Reg::X), Mode::Imp),
            0xDA => (Op::Push(Reg::X), Mode::Imp),
            _ => (Op::Pull(Reg::X), Mode::Imp),
        },
        _ => match opcode {
            0x9E => (Op::Stz, Mode::Abx),
            0xBE => (Op::Ldx, Mode::Aby),
            _ => (op, Mode::Abx),
        },
    }
}

fn decode_group_zero(opcode: u8) -> (Op, Mode) {
    use Mode::*;
    if opcode & 0x1F == 0x10 {
        let flag = [N, V, C, Z][(opcode >> 6) as usize];
        return (Op::Branch(flag, opcode & 0x20 != 0), Rel);
    }
    match opcode {
        0x00 => (Op::Brk, Imp),
        0x20 => (Op::Jsr, Abs),
        0x40 => (Op::Rti, Imp),
        0x60 => (Op::Rts, Imp),
        0x80 => (Op::Branch(0, false), Rel),
        0xA0 => (Op::Ldy, Imm),
        0xC0 => (Op::Cpy, Imm),
        0xE0 => (Op::Cpx, Imm),

        0x04 => (Op::Tsb, Zp),
        0x24 => (Op::Bit, Zp),
        0x44 => (Op::Nop, Zp),
        0x64 => (Op::Stz, Zp),
        0x84 => (Op::Sty, Zp),
        0xA4 => (Op::Ldy, Zp),
        0xC4 => (Op::Cpy, Zp),
        0xE4 => (Op::Cpx, Zp),

        0x08 => (Op::Php, Imp),
        0x28 => (Op::Plp, Imp),
        0x48 => (Op::Push(Reg::A), Imp),
        0x68 => (Op::Pull(Reg::A), Imp),
        0x88 => (Op::Step(Reg::Y, -1), Imp),
        0xA8 => (Op::Transfer(Reg::A, Reg::Y), Imp),
        0xC8 => (Op::Step(Reg::Y, 1), Imp),
        0xE8 => (Op::Step(Reg::X, 1), Imp),

        0x0C => (Op::Tsb, Abs),
        0x2C => (Op::Bit, Abs),
        0x4C => (Op::Jmp, Abs),
        0x6C => (Op::Jmp, Ind),
        0x8C => (Op::Sty, Abs),
        0xAC => (Op::Ldy, Abs),
        0xCC => (Op::Cpy, Abs),
        0xEC => (Op::Cpx, Abs),

        0x14 => (Op::Trb, Zp),
        0x34 => (Op::Bit, Zpx),
        0x74 => (Op::Stz, Zpx),
        0x94 => (Op::Sty, Zpx),
        0xB4 => (Op::Ldy, Zpx),
        0x54 | 0xD4 | 0xF4 => (Op::Nop, Zpx),

        0x18 => (Op::Flag(C, false), Imp),
        0x38 => (Op::Flag(C, true), Imp),
        0x58 => (Op::Flag(I, false), Imp),
        0x78 => (Op::Flag(I, true), Imp),
        0x98 => (Op::Transfer(Reg::Y, Reg::A), Imp),
        0xB8 => (Op::Flag(V, false), Imp),
        0xD8 => (Op::Flag(D, false), Imp),
        0xF8 => (Op::Flag(D, true), Imp),

        0x1C => (Op::Trb, Abs),
        0x3C => (Op::Bit, Abx),
        0x7C => (Op::Jmp, Iax),
        0x9C => (Op::Stz, Abs),
        0xBC => (Op::Ldy, Abx),
        // $5C $DC $FC
        _ => (Op::Nop, Abs),
    }
}

fn operand_bytes(mode: Mode) -> u16 {
    match mode {
        Mode::Imp | Mode::Acc => 0,
        Mode::Abs | Mode::Abx | Mode::Aby | Mode::Ind | Mode::Iax => 2,
        _ => 1,
    }
}

/// Cycle count before page-cross and branch extras.
fn base_cycles(opcode: u8, op: Op, mode: Mode) -> u32 {
    use Mode::*;
    if opcode & 3 == 3 {
        return 1;
    }
    if opcode == 0x5C {
        return 8;
    }
    match op.class() {
        Class::Read => match mode {
            Imp | Imm => 2,
            Zp => 3,
            Zpx | Zpy | Abs | Abx | Aby => 4,
            Izy | Izp => 5,
            _ => 6,
        },
        Class::Write => match mode {
            Zp => 3,
            Zpx | Zpy | Abs => 4,
            Abx | Aby | Izp => 5,
            _ => 6,
        },
        Class::Modify => match mode {
            Acc => 2,
            Zp => 5,
            Zpx | Abs => 6,
            _ if matches!(op, Op::Inc | Op::Dec) => 7,
            _ => 6,
        },
        Class::Control => match op {
            Op::Brk => 7,
            Op::Jsr | Op::Rts | Op::Rti => 6,
            Op::Jmp if mode == Abs => 3,
            Op::Jmp => 6,
            Op::Push(_) | Op::Php => 3,
            Op::Pull(_) | Op::Plp => 4,
            _ => 2,
        },
    }
}

fn pays_page_penalty(op: Op, mode: Mode) -> bool {
    if !matches!(mode, Mode::Abx | Mode::Aby | Mode::Izy) {
        return false;
    }
    match op.class() {
        Class::Read => true,
        Class::Modify => matches!(op, Op::Asl | Op::Rol | Op::Lsr | Op::Ror),
        _ => false,
    }
}

/// Reference CPU with its own flat 64K memory.
pub struct Model {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: u8,
    pub pc: u16,
    pub memory: Box<[u8]>,
    /// Every write made by the last step, in order.
    pub writes: Vec<(u16, u8)>,
}

impl Model {
    pub fn new(memory: &[u8]) -> Self {
        let mut image = vec![0; 0x10000];
        let len = memory.len().min(image.len());
        image[..len].copy_from_slice(&memory[..len]);
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFF,
            p: U | I,
            pc: 0,
            memory: image.into_boxed_slice(),
            writes: Vec::new(),
        }
    }

    fn read(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.writes.push((addr, data));
    }

    fn word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    fn zp_word(&self, zp: u8) -> u16 {
        u16::from_le_bytes([self.read(zp as u16), self.read(zp.wrapping_add(1) as u16)])
    }

    fn push(&mut self, data: u8) {
        self.write(0x0100 + self.s as u16, data);
        self.s = self.s.wrapping_sub(1);
    }

    fn pull(&mut self) -> u8 {
        self.s = self.s.wrapping_add(1);
        self.read(0x0100 + self.s as u16)
    }

    fn set(&mut self, mask: u8, on: bool) {
        self.p = if on { self.p | mask } else { self.p & !mask };
    }

    fn nz(&mut self, value: u8) -> u8 {
        self.set(N, value & 0x80 != 0);
        self.set(Z, value == 0);
        value
    }

    fn reg(&self, reg: Reg) -> u8 {
        match reg {
            Reg::A => self.a,
            Reg::X => self.x,
            Reg::Y => self.y,
            Reg::S => self.s,
        }
    }

    fn set_reg(&mut self, reg: Reg, value: u8) {
        match reg {
            Reg::A => self.a = value,
            Reg::X => self.x = value,
            Reg::Y => self.y = value,
            Reg::S => self.s = value,
        }
    }

    /// Effective address and whether indexing crossed a page.
    fn effective(&self, mode: Mode, arg: u16) -> (u16, bool) {
        let indexed = |base: u16, index: u8| {
            let ea = base.wrapping_add(index as u16);
            (ea, ea >> 8 != base >> 8)
        };
        let zp = self.read(arg);
        match mode {
            Mode::Zp => (zp as u16, false),
            Mode::Zpx => (zp.wrapping_add(self.x) as u16, false),
            Mode::Zpy => (zp.wrapping_add(self.y) as u16, false),
            Mode::Abs => (self.word(arg), false),
            Mode::Abx => indexed(self.word(arg), self.x),
            Mode::Aby => indexed(self.word(arg), self.y),
            Mode::Izx => (self.zp_word(zp.wrapping_add(self.x)), false),
            Mode::Izy => indexed(self.zp_word(zp), self.y),
            Mode::Izp => (self.zp_word(zp), false),
            Mode::Ind => {
                let ptr = self.word(arg);
                let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                (u16::from_le_bytes([self.read(ptr), self.read(hi_addr)]), false)
            }
            Mode::Iax => (self.word(self.word(arg).wrapping_add(self.x as u16)), false),
            Mode::Imp | Mode::Acc | Mode::Imm | Mode::Rel => (arg, false),
        }
    }

    fn add(&mut self, m: u8) {
        let sum = self.a as u16 + m as u16 + (self.p & C) as u16;
        let result = sum as u8;
        self.set(C, sum > 0xFF);
        self.set(V, (!(self.a ^ m) & (self.a ^ result) & 0x80) != 0);
        self.a = self.nz(result);
    }

    fn compare(&mut self, reg: u8, m: u8) {
        self.set(C, reg >= m);
        self.nz(reg.wrapping_sub(m));
    }

    fn modify(&mut self, op: Op, value: u8) -> u8 {
        let carry_in = self.p & C;
        let result = match op {
            Op::Asl => {
                self.set(C, value & 0x80 != 0);
                value << 1
            }
            Op::Lsr => {
                self.set(C, value & 0x01 != 0);
                value >> 1
            }
            Op::Rol => {
                self.set(C, value & 0x80 != 0);
                (value << 1) | carry_in
            }
            Op::Ror => {
                self.set(C, value & 0x01 != 0);
                (value >> 1) | (carry_in << 7)
            }
            Op::Inc => value.wrapping_add(1),
            _ => value.wrapping_sub(1),
        };
        self.nz(result)
    }

    fn interrupt(&mut self, return_pc: u16, vector: u16) {
        let [lo, hi] = return_pc.to_le_bytes();
        self.push(hi);
        self.push(lo);
        self.push(self.p | U | B);
        self.set(I, true);
        self.set(D, false);
        self.pc = self.word(vector);
    }

    /// Execute the instruction at `pc`. Returns the cycles it took, or
    /// `None` for ADC/SBC with D set, which the model refuses without
    /// changing any state.
    pub fn step(&mut self) -> Option<u32> {
        self.writes.clear();
        let opcode = self.read(self.pc);
        let (op, mode) = decode(opcode);
        if matches!(op, Op::Adc | Op::Sbc) && self.p & D != 0 {
            return None;
        }

        let arg = self.pc.wrapping_add(1);
        let next = arg.wrapping_add(operand_bytes(mode));
        let (ea, crossed) = self.effective(mode, arg);
        let mut cycles = base_cycles(opcode, op, mode);
        if crossed && pays_page_penalty(op, mode) {
            cycles += 1;
        }
        self.pc = next;

        match op {
            Op::Ora => self.a = self.nz(self.a | self.read(ea)),
            Op::And => self.a = self.nz(self.a & self.read(ea)),
            Op::Eor => self.a = self.nz(self.a ^ self.read(ea)),
            Op::Adc => self.add(self.read(ea)),
            Op::Sbc => self.add(!self.read(ea)),
            Op::Lda => self.a = self.nz(self.read(ea)),
            Op::Ldx => self.x = self.nz(self.read(ea)),
            Op::Ldy => self.y = self.nz(self.read(ea)),
            Op::Cmp => self.compare(self.a, self.read(ea)),
            Op::Cpx => self.compare(self.x, self.read(ea)),
            Op::Cpy => self.compare(self.y, self.read(ea)),
            Op::Bit => {
                let m = self.read(ea);
                self.set(Z, self.a & m == 0);
                if mode != Mode::Imm {
                    self.set(N, m & N != 0);
                    self.set(V, m & V != 0);
                }
            }
            Op::Sta => self.write(ea, self.a),
            Op::Stx => self.write(ea, self.x),
            Op::Sty => self.write(ea, self.y),
            Op::Stz => self.write(ea, 0),
            Op::Tsb | Op::Trb => {
                let m = self.read(ea);
                self.set(Z, self.a & m == 0);
                let result = if op == Op::Tsb { m | self.a } else { m & !self.a };
                self.write(ea, result);
            }
            Op::Asl | Op::Rol | Op::Lsr | Op::Ror | Op::Inc | Op::Dec => {
                if mode == Mode::Acc {
                    self.a = self.modify(op, self.a);
                } else {
                    let result = self.modify(op, self.read(ea));
                    self.write(ea, result);
                }
            }
            Op::Branch(flag, set) => {
                let taken = flag == 0 || (self.p & flag != 0) == set;
                if taken {
                    let target = next.wrapping_add(self.read(ea) as i8 as u16);
                    cycles += if target >> 8 != next >> 8 { 2 } else { 1 };
                    self.pc = target;
                }
            }
            Op::Jmp => self.pc = ea,
            Op::Jsr => {
                let [lo, hi] = next.wrapping_sub(1).to_le_bytes();
                self.push(hi);
                self.push(lo);
                self.pc = ea;
            }
            Op::Rts => {
                let lo = self.pull();
                let hi = self.pull();
                self.pc = u16::from_le_bytes([lo, hi]).wrapping_add(1);
            }
            Op::Rti => {
                self.p = self.pull() | U;
                let lo = self.pull();
                let hi = self.pull();
                self.pc = u16::from_le_bytes([lo, hi]);
            }
            Op::Brk => self.interrupt(self.pc.wrapping_add(1), 0xFFFE),
            Op::Push(reg) => self.push(self.reg(reg)),
            Op::Pull(reg) => {
                let value = self.pull();
                let value = self.nz(value);
                self.set_reg(reg, value);
            }
            Op::Php => self.push(self.p | B | U),
            Op::Plp => self.p = self.pull() | U,
            Op::Transfer(from, Reg::S) => self.s = self.reg(from),
            Op::Transfer(from, to) => {
                let value = self.nz(self.reg(from));
                self.set_reg(to, value);
            }
            Op::Step(reg, delta) => {
                let value = self.nz(self.reg(reg).wrapping_add(delta as u8));
                self.set_reg(reg, value);
            }
            Op::Flag(mask, on) => self.set(mask, on),
            Op::Nop => {}
        }
        Some(cycles)
    }
}
