use std::collections::VecDeque;

use crate::core::{Component, CoreError};
use crate::memory::MemoryBus;

/// Cycles between keyboard polls (about 1 ms at 1.023 MHz).
pub const POLL_INTERVAL: u32 = 1023;

/// Host-side typeahead buffer feeding the IIe keyboard latch.
///
/// A queued key is latched once the program has cleared the strobe from
/// the previous one, so pasted text is not lost.
#[derive(Debug, Default)]
pub struct Keyboard {
    queue: VecDeque<u8>,
    holding: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 7-bit key code.
    pub fn push(&mut self, code: u8) {
        self.queue.push_back(code & 0x7F);
    }

    pub fn push_str(&mut self, text: &str) {
        for b in text.bytes().filter(u8::is_ascii) {
            // The IIe keyboard sends CR for newline.
            self.push(if b == b'\n' { b'\r' } else { b });
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Component<MemoryBus> for Keyboard {
    fn cold_reset(&mut self, bus: &mut MemoryBus) {
        self.queue.clear();
        self.holding = false;
        bus.release_key();
    }

    fn cycle(&mut self, bus: &mut MemoryBus) -> Result<u32, CoreError> {
        if self.holding {
            bus.release_key();
            self.holding = false;
        }
        if !bus.key_strobe()
            && let Some(code) = self.queue.pop_front()
        {
            bus.press_key(code);
            self.holding = true;
        }
        Ok(POLL_INTERVAL)
    }

    fn name(&self) -> &'static str {
        "keyboard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bus, BusMaster};
    use crate::memory::ROM_SIZE;

    #[test]
    fn feeds_next_key_after_strobe_clear() {
        let mut bus = MemoryBus::new(&[0u8; ROM_SIZE]).unwrap();
        let mut kbd = Keyboard::new();
        kbd.cold_reset(&mut bus);
        kbd.push_str("HI\n");

        kbd.cycle(&mut bus).unwrap();
        assert_eq!(bus.read(BusMaster::Cpu(0), 0xC000), b'H' | 0x80);

        // strobe still set: nothing new is latched
        kbd.cycle(&mut bus).unwrap();
        assert_eq!(bus.read(BusMaster::Cpu(0), 0xC000), b'H' | 0x80);

        bus.read(BusMaster::Cpu(0), 0xC010);
        kbd.cycle(&mut bus).unwrap();
        assert_eq!(bus.read(BusMaster::Cpu(0), 0xC000), b'I' | 0x80);

        bus.write(BusMaster::Cpu(0), 0xC010, 0);
        kbd.cycle(&mut bus).unwrap();
        assert_eq!(bus.read(BusMaster::Cpu(0), 0xC000), b'\r' | 0x80);
        assert_eq!(kbd.pending(), 0);
    }

    #[test]
    fn any_key_down_drops_after_release() {
        let mut bus = MemoryBus::new(&[0u8; ROM_SIZE]).unwrap();
        let mut kbd = Keyboard::new();
        kbd.push(b'A');
        kbd.cycle(&mut bus).unwrap();
        assert_eq!(bus.read(BusMaster::Cpu(0), 0xC010) & 0x80, 0x80);
        kbd.cycle(&mut bus).unwrap();
        assert_eq!(bus.read(BusMaster::Cpu(0), 0xC010) & 0x80, 0);
    }
}
