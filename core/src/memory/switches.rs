use tracing::trace;

/// Boolean soft switches of the IIe memory and display logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoftSwitch {
    Store80,
    Hires,
    RamRd,
    RamWrt,
    Text,
    Page2,
    Mixed,
    AltZp,
    /// Language card bank 1 selected for $D000-$DFFF.
    Bank1,
    /// Language card RAM readable at $D000-$FFFF.
    HRamRd,
    /// Language card RAM writable at $D000-$FFFF.
    HRamWrt,
    /// First of the two odd-address reads that enable HRAMWRT.
    PreWrite,
    IntCxRom,
    SlotC3Rom,
    IntC8Rom,
    Col80,
    AltCharSet,
    An0,
    An1,
    An2,
    An3,
    Speaker,
}

impl SoftSwitch {
    pub const COUNT: usize = 22;

    pub const ALL: [SoftSwitch; Self::COUNT] = [
        SoftSwitch::Store80,
        SoftSwitch::Hires,
        SoftSwitch::RamRd,
        SoftSwitch::RamWrt,
        SoftSwitch::Text,
        SoftSwitch::Page2,
        SoftSwitch::Mixed,
        SoftSwitch::AltZp,
        SoftSwitch::Bank1,
        SoftSwitch::HRamRd,
        SoftSwitch::HRamWrt,
        SoftSwitch::PreWrite,
        SoftSwitch::IntCxRom,
        SoftSwitch::SlotC3Rom,
        SoftSwitch::IntC8Rom,
        SoftSwitch::Col80,
        SoftSwitch::AltCharSet,
        SoftSwitch::An0,
        SoftSwitch::An1,
        SoftSwitch::An2,
        SoftSwitch::An3,
        SoftSwitch::Speaker,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoftSwitch::Store80 => "80STORE",
            SoftSwitch::Hires => "HIRES",
            SoftSwitch::RamRd => "RAMRD",
            SoftSwitch::RamWrt => "RAMWRT",
            SoftSwitch::Text => "TEXT",
            SoftSwitch::Page2 => "PAGE2",
            SoftSwitch::Mixed => "MIXED",
            SoftSwitch::AltZp => "ALTZP",
            SoftSwitch::Bank1 => "BANK1",
            SoftSwitch::HRamRd => "HRAMRD",
            SoftSwitch::HRamWrt => "HRAMWRT",
            SoftSwitch::PreWrite => "PREWRITE",
            SoftSwitch::IntCxRom => "INTCXROM",
            SoftSwitch::SlotC3Rom => "SLOTC3ROM",
            SoftSwitch::IntC8Rom => "INTC8ROM",
            SoftSwitch::Col80 => "80COL",
            SoftSwitch::AltCharSet => "ALTCHARSET",
            SoftSwitch::An0 => "AN0",
            SoftSwitch::An1 => "AN1",
            SoftSwitch::An2 => "AN2",
            SoftSwitch::An3 => "AN3",
            SoftSwitch::Speaker => "SPEAKER",
        }
    }
}

/// Current value of every soft switch plus change counters.
///
/// `iteration` increases by one for every mutation that actually changes a
/// value, so observers can detect "anything changed" with one compare.
/// Writes that store the value a switch already holds are not counted.
#[derive(Clone, Debug)]
pub struct SwitchState {
    values: [bool; SoftSwitch::COUNT],
    transitions: [u64; SoftSwitch::COUNT],
    iteration: u64,
}

impl Default for SwitchState {
    fn default() -> Self {
        let mut state = Self {
            values: [false; SoftSwitch::COUNT],
            transitions: [0; SoftSwitch::COUNT],
            iteration: 0,
        };
        state.values[SoftSwitch::Text as usize] = true;
        state.values[SoftSwitch::HRamWrt as usize] = true;
        state
    }
}

impl SwitchState {
    #[inline]
    pub fn get(&self, switch: SoftSwitch) -> bool {
        self.values[switch as usize]
    }

    /// Set `switch`; returns whether the value changed. Only a change
    /// bumps `iteration` and the switch's transition count.
    pub fn set(&mut self, switch: SoftSwitch, on: bool) -> bool {
        let slot = &mut self.values[switch as usize];
        if *slot == on {
            return false;
        }
        *slot = on;
        self.transitions[switch as usize] += 1;
        self.iteration += 1;
        trace!(switch = switch.name(), on, "soft switch");
        true
    }

    pub fn toggle(&mut self, switch: SoftSwitch) {
        let on = !self.get(switch);
        self.set(switch, on);
    }

    /// Changes seen so far, plus one per [`restore_defaults`](Self::restore_defaults).
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Number of value changes `switch` has seen.
    pub fn transitions(&self, switch: SoftSwitch) -> u64 {
        self.transitions[switch as usize]
    }

    /// Restore power-on values (TEXT and HRAMWRT on, everything else off).
    /// Counters keep running so observers see the change.
    pub fn restore_defaults(&mut self) {
        let defaults = SwitchState::default();
        for switch in SoftSwitch::ALL {
            self.set(switch, defaults.get(switch));
        }
        self.iteration += 1;
    }
}
