pub mod apple2e;
pub mod flat65c02;
pub mod registry;
pub mod rom_loader;

pub use apple2e::Apple2e;
pub use flat65c02::Flat65C02System;
pub use registry::MachineEntry;
pub use rom_loader::{RomLoadError, RomSet};
