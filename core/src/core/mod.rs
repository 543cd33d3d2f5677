pub mod bus;
pub mod component;
pub mod error;
pub mod machine;
pub mod scheduler;

pub use bus::{Bus, BusMaster, Interrupt, InterruptLatch, SignalLines};
pub use component::{AsAny, Component};
pub use error::CoreError;
pub use machine::{Machine, RunOutcome};
pub use scheduler::{ComponentId, Pacing, Scheduler, StepOutcome, StopHandle};
