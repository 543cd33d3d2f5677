use std::collections::VecDeque;

use crate::core::{Component, CoreError};
use crate::memory::{MemoryBus, SoftSwitch};

/// Samples kept before the oldest are dropped.
const MAX_BUFFERED: usize = 8192;

/// One-bit speaker.
///
/// Wakes every `interval` CPU cycles, counts SPEAKER transitions since the
/// previous wake-up and emits one sample from the current cone position.
/// Audio synthesis and resampling belong to the host.
#[derive(Debug)]
pub struct Speaker {
    interval: u32,
    last_iteration: u64,
    last_transitions: u64,
    toggles: u64,
    samples: VecDeque<Sample>,
}

/// One output interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Cone position at the end of the interval.
    pub level: bool,
    /// Transitions seen during the interval.
    pub toggles: u32,
}

impl Speaker {
    /// `interval` is clamped to at least one cycle.
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            last_iteration: 0,
            last_transitions: 0,
            toggles: 0,
            samples: VecDeque::new(),
        }
    }

    /// Total transitions observed since cold reset.
    pub fn toggles(&self) -> u64 {
        self.toggles
    }

    pub fn drain_samples(&mut self) -> impl Iterator<Item = Sample> + '_ {
        self.samples.drain(..)
    }

    pub fn buffered(&self) -> usize {
        self.samples.len()
    }
}

impl Component<MemoryBus> for Speaker {
    fn cold_reset(&mut self, bus: &mut MemoryBus) {
        self.last_iteration = bus.switches().iteration();
        self.last_transitions = bus.switches().transitions(SoftSwitch::Speaker);
        self.toggles = 0;
        self.samples.clear();
    }

    fn cycle(&mut self, bus: &mut MemoryBus) -> Result<u32, CoreError> {
        let switches = bus.switches();
        let mut toggles = 0;
        if switches.iteration() != self.last_iteration {
            self.last_iteration = switches.iteration();
            let transitions = switches.transitions(SoftSwitch::Speaker);
            toggles = (transitions - self.last_transitions) as u32;
            self.last_transitions = transitions;
        }
        self.toggles += toggles as u64;

        if self.samples.len() == MAX_BUFFERED {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample {
            level: switches.get(SoftSwitch::Speaker),
            toggles,
        });
        Ok(self.interval)
    }

    fn name(&self) -> &'static str {
        "speaker"
    }
}
