//! Event-driven scheduler interleaving independently clocked components.
//!
//! Components sit in a priority queue ordered by `(timestamp, id)`. Each step
//! pops the earliest-due component, optionally waits for wall-clock time to
//! catch up, runs one `cycle()` and re-inserts the component at its new
//! timestamp. Ids are issued by a monotonic counter at registration, so
//! components due at the same timestamp always run in registration order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use super::component::Component;
use super::error::CoreError;

/// Stable identity of a registered component. Also the tie-break key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(u64);

impl ComponentId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared flag used to interrupt a running (possibly sleeping) scheduler
/// from another thread.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the handle after a stop has been observed.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Real-time pacing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Wall-clock nanoseconds per scheduler unit.
    pub nanos_per_unit: u64,
    /// How many units the emulated clock may run ahead of wall-clock time
    /// before the scheduler sleeps.
    pub granularity: u64,
}

struct Pacer {
    pacing: Pacing,
    origin: Instant,
    origin_units: u64,
}

/// Longest single sleep; bounds the latency of a stop request.
const SLEEP_SLICE: Duration = Duration::from_millis(1);

impl Pacer {
    fn new(pacing: Pacing, now: u64) -> Self {
        Self {
            pacing,
            origin: Instant::now(),
            origin_units: now,
        }
    }

    /// Sleep until wall-clock time reaches `timestamp`. Returns false if the
    /// wait was interrupted.
    fn wait_until(&self, timestamp: u64, stop: &StopHandle) -> bool {
        let ahead = timestamp.saturating_sub(self.origin_units);
        let target = Duration::from_nanos(ahead.saturating_mul(self.pacing.nanos_per_unit));
        let slack = Duration::from_nanos(
            self.pacing
                .granularity
                .saturating_mul(self.pacing.nanos_per_unit),
        );
        if self.origin.elapsed() + slack >= target {
            return true;
        }
        loop {
            if stop.is_stopped() {
                return false;
            }
            let elapsed = self.origin.elapsed();
            if elapsed >= target {
                return true;
            }
            std::thread::sleep((target - elapsed).min(SLEEP_SLICE));
        }
    }
}

struct Entry<C: ?Sized> {
    component: Box<dyn Component<C>>,
    timestamp: u64,
    units_per_cycle: u64,
}

/// Result of a single scheduler step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A component ran one cycle that started at `timestamp`.
    Ran { id: ComponentId, timestamp: u64 },
    /// A stop was requested; queue state is unchanged.
    Interrupted,
    /// No components are registered.
    Idle,
}

pub struct Scheduler<C> {
    context: C,
    entries: Vec<Entry<C>>,
    queue: BinaryHeap<Reverse<(u64, ComponentId)>>,
    now: u64,
    stagger_at: u64,
    stagger_next: u64,
    pacer: Option<Pacer>,
    stop: StopHandle,
}

impl<C: 'static> Scheduler<C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            entries: Vec::new(),
            queue: BinaryHeap::new(),
            now: 0,
            stagger_at: 0,
            stagger_next: 0,
            pacer: None,
            stop: StopHandle::default(),
        }
    }

    /// Register a component. It becomes due at the current time.
    pub fn register<T: Component<C>>(&mut self, component: T, units_per_cycle: u64) -> ComponentId {
        let id = ComponentId(self.entries.len() as u64);
        debug!(component = component.name(), %id, units_per_cycle, "registered");
        self.entries.push(Entry {
            component: Box::new(component),
            timestamp: self.now,
            units_per_cycle: units_per_cycle.max(1),
        });
        self.queue.push(Reverse((self.now, id)));
        id
    }

    /// Run every component's `cold_reset` once, in registration order, and
    /// re-baseline all timestamps. The stagger restarts from zero, so
    /// repeating a cold reset at the same time lands on the same timestamps.
    pub fn cold_reset(&mut self) {
        self.stagger_at = self.now;
        self.stagger_next = 0;
        for entry in &mut self.entries {
            entry.component.cold_reset(&mut self.context);
        }
        let ids: Vec<_> = (0..self.entries.len() as u64).map(ComponentId).collect();
        for id in ids {
            self.rebaseline(id);
        }
        self.rebuild_queue();
        if let Some(pacer) = &mut self.pacer {
            *pacer = Pacer::new(pacer.pacing, self.now);
        }
    }

    /// Re-baseline one component's timestamp to the current time. The k-th
    /// component reset at the same scheduler time is staggered by k units so
    /// relative phase is reproducible.
    pub fn reset_cycle_count(&mut self, id: ComponentId) {
        self.rebaseline(id);
        self.rebuild_queue();
    }

    fn rebaseline(&mut self, id: ComponentId) {
        if self.stagger_at != self.now {
            self.stagger_at = self.now;
            self.stagger_next = 0;
        }
        self.entries[id.index()].timestamp = self.now + self.stagger_next;
        self.stagger_next += 1;
    }

    fn rebuild_queue(&mut self) {
        self.queue = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| Reverse((e.timestamp, ComponentId(i as u64))))
            .collect();
    }

    /// Enable or disable real-time pacing.
    pub fn set_pacing(&mut self, pacing: Option<Pacing>) {
        self.pacer = pacing.map(|p| Pacer::new(p, self.now));
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Pop the earliest-due component and run one of its cycles.
    pub fn step(&mut self) -> Result<StepOutcome, CoreError> {
        if self.stop.is_stopped() {
            return Ok(StepOutcome::Interrupted);
        }
        let Some(Reverse((timestamp, id))) = self.queue.pop() else {
            return Ok(StepOutcome::Idle);
        };
        if let Some(pacer) = &self.pacer
            && !pacer.wait_until(timestamp, &self.stop)
        {
            self.queue.push(Reverse((timestamp, id)));
            return Ok(StepOutcome::Interrupted);
        }
        self.now = timestamp;

        let entry = &mut self.entries[id.index()];
        let cost = match entry.component.cycle(&mut self.context) {
            Ok(cost) => cost,
            Err(e) => {
                error!(component = entry.component.name(), %id, timestamp, "fatal: {e}");
                self.queue.push(Reverse((timestamp, id)));
                return Err(e);
            }
        };
        // A zero-cost cycle would starve every other component.
        entry.timestamp = timestamp + cost.max(1) as u64 * entry.units_per_cycle;
        self.queue.push(Reverse((entry.timestamp, id)));
        Ok(StepOutcome::Ran { id, timestamp })
    }

    /// Run until the earliest-due component is at or past `deadline`.
    /// Returns `StepOutcome::Interrupted` if a stop was requested.
    pub fn run_until(&mut self, deadline: u64) -> Result<StepOutcome, CoreError> {
        while let Some(&Reverse((timestamp, _))) = self.queue.peek() {
            if timestamp >= deadline {
                break;
            }
            if self.step()? == StepOutcome::Interrupted {
                return Ok(StepOutcome::Interrupted);
            }
        }
        self.now = self.now.max(deadline);
        Ok(StepOutcome::Idle)
    }

    /// Run for `units` scheduler units from the current time.
    pub fn run_for(&mut self, units: u64) -> Result<StepOutcome, CoreError> {
        self.run_until(self.now + units)
    }

    /// Timestamp of the most recently started cycle (or the last deadline reached).
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn timestamp_of(&self, id: ComponentId) -> u64 {
        self.entries[id.index()].timestamp
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn component<T: Component<C>>(&self, id: ComponentId) -> Option<&T> {
        let entry = self.entries.get(id.index())?;
        super::component::AsAny::as_any(&*entry.component).downcast_ref::<T>()
    }

    pub fn component_mut<T: Component<C>>(&mut self, id: ComponentId) -> Option<&mut T> {
        let entry = self.entries.get_mut(id.index())?;
        super::component::AsAny::as_any_mut(&mut *entry.component).downcast_mut::<T>()
    }

    /// Borrow a component together with the shared context, e.g. to prime a
    /// CPU against the bus from host code.
    pub fn with_component<T: Component<C>, R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut T, &mut C) -> R,
    ) -> Option<R> {
        let entry = self.entries.get_mut(id.index())?;
        let component =
            super::component::AsAny::as_any_mut(&mut *entry.component).downcast_mut::<T>()?;
        Some(f(component, &mut self.context))
    }
}
