use std::any::Any;

use super::error::CoreError;

/// Downcasting support for boxed components.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Anything that advances by discrete time units (CPU, video scanner, speaker, ...).
///
/// `C` is the shared hardware context the component works against, normally
/// the memory bus. Components never hold references to each other; everything
/// they exchange goes through the context.
pub trait Component<C: ?Sized>: AsAny {
    /// Power-on initialization. Called once per component at startup.
    fn cold_reset(&mut self, ctx: &mut C);

    /// Perform one unit of work and return its cost in this component's cycles.
    /// The scheduler multiplies the cost by the component's units-per-cycle.
    fn cycle(&mut self, ctx: &mut C) -> Result<u32, CoreError>;

    /// Short name used in log output.
    fn name(&self) -> &'static str;
}
