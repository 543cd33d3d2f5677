#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break
    U = 0x20, // Unused (always 1)
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

/// 65C02 programmer-visible registers.
///
/// Native `u8`/`u16` storage with wrapping arithmetic keeps the 8-bit
/// registers inside 0xFF and PC inside 0xFFFF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub pc: u16,
    pub p: u8,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::power_on()
    }
}

impl RegisterFile {
    /// Power-on values: A=X=Y=0, S=$FF, I and U set.
    pub fn power_on() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFF,
            pc: 0,
            p: StatusFlag::U as u8 | StatusFlag::I as u8,
        }
    }

    #[inline]
    pub fn flag(&self, flag: StatusFlag) -> bool {
        self.p & flag as u8 != 0
    }

    #[inline]
    pub fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        if set {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    /// Set N, Z flags from result (for loads, transfers, logical ops).
    #[inline]
    pub fn set_nz(&mut self, result: u8) {
        self.set_flag(StatusFlag::N, result & 0x80 != 0);
        self.set_flag(StatusFlag::Z, result == 0);
    }

    /// Carry as 0/1 for add/subtract chains.
    #[inline]
    pub fn carry(&self) -> u8 {
        self.p & StatusFlag::C as u8
    }

    /// Load P from a pulled byte; the unused bit always reads as 1.
    #[inline]
    pub fn set_p(&mut self, value: u8) {
        self.p = value | StatusFlag::U as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_values() {
        let r = RegisterFile::power_on();
        assert_eq!((r.a, r.x, r.y, r.s), (0, 0, 0, 0xFF));
        assert!(r.flag(StatusFlag::I));
        assert!(r.flag(StatusFlag::U));
        assert!(!r.flag(StatusFlag::D));
    }

    #[test]
    fn set_nz_tracks_result() {
        let mut r = RegisterFile::power_on();
        r.set_nz(0);
        assert!(r.flag(StatusFlag::Z) && !r.flag(StatusFlag::N));
        r.set_nz(0x80);
        assert!(!r.flag(StatusFlag::Z) && r.flag(StatusFlag::N));
    }

    #[test]
    fn set_p_forces_unused_bit() {
        let mut r = RegisterFile::power_on();
        r.set_p(0x00);
        assert_eq!(r.p, 0x20);
        r.set_p(0xFF);
        assert_eq!(r.p, 0xFF);
    }
}
