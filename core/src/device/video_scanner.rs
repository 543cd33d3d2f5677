use crate::core::{Component, CoreError};
use crate::memory::{MemoryBus, SoftSwitch};

pub const CYCLES_PER_LINE: u16 = 65;
pub const LINES_PER_FRAME: u16 = 262;
pub const VISIBLE_LINES: u16 = 192;
pub const CYCLES_PER_FRAME: u64 = CYCLES_PER_LINE as u64 * LINES_PER_FRAME as u64;

/// First horizontal count of the 40 visible columns; earlier counts are
/// horizontal blanking.
const FIRST_VISIBLE_COLUMN: u16 = 25;
/// Lines from this one on show text when MIXED is set.
const MIXED_TEXT_LINE: u16 = 160;

/// Video address counter.
///
/// Tracks the beam position one CPU cycle at a time, publishes the byte
/// the video circuit fetches as the floating-bus value and drives the VBL
/// status bit. It renders nothing.
#[derive(Debug, Default)]
pub struct VideoScanner {
    line: u16,
    column: u16,
    frames: u64,
}

impl VideoScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> u16 {
        self.line
    }

    pub fn column(&self) -> u16 {
        self.column
    }

    /// Completed frames since cold reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn in_vertical_blank(&self) -> bool {
        self.line >= VISIBLE_LINES
    }

    /// Address the video circuit reads at the current beam position.
    ///
    /// Blanking-interval fetches are folded onto the visible rows; the
    /// bytes they return are the ones programs see through the floating
    /// bus during blanking.
    pub fn scan_address(&self, bus: &MemoryBus) -> u16 {
        let s = bus.switches();
        let v = self.line % VISIBLE_LINES;
        let column = if self.column >= FIRST_VISIBLE_COLUMN {
            self.column - FIRST_VISIBLE_COLUMN
        } else {
            // hblank fetches the 24 bytes preceding the row
            (self.column + 0x68) & 0x7F
        };
        // With 80STORE, PAGE2 selects the aux plane instead of page 2.
        let page2 = s.get(SoftSwitch::Page2) && !s.get(SoftSwitch::Store80);
        let row = ((v >> 3) & 0x07) * 0x80 + (v >> 6) * 0x28;

        let graphics_hires = !s.get(SoftSwitch::Text)
            && s.get(SoftSwitch::Hires)
            && !(s.get(SoftSwitch::Mixed) && v >= MIXED_TEXT_LINE);
        if graphics_hires {
            let base = if page2 { 0x4000 } else { 0x2000 };
            base + (v & 0x07) * 0x400 + row + column
        } else {
            let base = if page2 { 0x0800 } else { 0x0400 };
            base + ((row + column) & 0x3FF)
        }
    }

    fn advance(&mut self) {
        self.column += 1;
        if self.column == CYCLES_PER_LINE {
            self.column = 0;
            self.line += 1;
            if self.line == LINES_PER_FRAME {
                self.line = 0;
                self.frames += 1;
            }
        }
    }
}

impl Component<MemoryBus> for VideoScanner {
    fn cold_reset(&mut self, bus: &mut MemoryBus) {
        *self = Self::default();
        bus.set_vertical_blank(false);
    }

    fn cycle(&mut self, bus: &mut MemoryBus) -> Result<u32, CoreError> {
        let addr = self.scan_address(bus);
        bus.set_floating_bus(bus.video_fetch(addr));
        bus.set_vertical_blank(self.in_vertical_blank());
        self.advance();
        Ok(1)
    }

    fn name(&self) -> &'static str {
        "video"
    }
}
