//! Property-based tests for scheduler ordering.

use orchard_core::core::{Component, CoreError, Scheduler, StepOutcome};
use proptest::prelude::*;

#[derive(Default)]
struct Trace;

/// Component with a fixed per-cycle cost.
struct Fixed {
    index: usize,
    cost: u32,
}

impl Component<Trace> for Fixed {
    fn cold_reset(&mut self, _ctx: &mut Trace) {}

    fn cycle(&mut self, _ctx: &mut Trace) -> Result<u32, CoreError> {
        Ok(self.cost)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn run(specs: &[(u32, u64)], steps: usize) -> Vec<(usize, u64)> {
    let mut scheduler = Scheduler::new(Trace::default());
    for (index, &(cost, units)) in specs.iter().enumerate() {
        scheduler.register(Fixed { index, cost }, units);
    }
    scheduler.cold_reset();
    let mut order = Vec::new();
    for _ in 0..steps {
        match scheduler.step().unwrap() {
            StepOutcome::Ran { id, timestamp } => {
                let index = scheduler.component::<Fixed>(id).map(|c| c.index);
                order.push((index.unwrap_or(usize::MAX), timestamp));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    order
}

proptest! {
    /// Property: two schedulers built the same way run in the same order.
    #[test]
    fn prop_runs_are_reproducible(
        specs in prop::collection::vec((1u32..8, 1u64..4), 1..6),
        steps in 1usize..200,
    ) {
        prop_assert_eq!(run(&specs, steps), run(&specs, steps));
    }

    /// Property: timestamps never go backwards, and equal timestamps run in
    /// registration order.
    #[test]
    fn prop_order_is_total(
        specs in prop::collection::vec((1u32..8, 1u64..4), 1..6),
        steps in 1usize..200,
    ) {
        let order = run(&specs, steps);
        for pair in order.windows(2) {
            let (a, ta) = pair[0];
            let (b, tb) = pair[1];
            prop_assert!(ta <= tb);
            if ta == tb {
                prop_assert!(a < b);
            }
        }
    }

    /// Property: with identical clocks, the cold-reset stagger keeps
    /// components in registration order on every round.
    #[test]
    fn prop_equal_clocks_round_robin(count in 1usize..6, rounds in 1usize..20) {
        let specs = vec![(1u32, count as u64 + 1); count];
        let order = run(&specs, count * rounds);
        for (i, (index, _)) in order.iter().enumerate() {
            prop_assert_eq!(*index, i % count);
        }
    }
}
