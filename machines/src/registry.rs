//! Link-time machine registry.
//!
//! Machines announce themselves with [`inventory::submit!`]; the frontend
//! looks them up by name and never needs a hand-maintained list.

use orchard_core::core::machine::Machine;

use crate::rom_loader::{RomLoadError, RomSet};

/// Builds a ready-to-run machine from its ROM files.
pub type MachineFactory = fn(&RomSet) -> Result<Box<dyn Machine>, RomLoadError>;

pub struct MachineEntry {
    /// Selector on the command line and in config files.
    pub name: &'static str,
    /// Stem of the ZIP archive searched for in a ROM directory.
    pub rom_name: &'static str,
    /// Key a bare single-file system image is stored under.
    pub image_name: &'static str,
    pub create: MachineFactory,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        rom_name: &'static str,
        image_name: &'static str,
        create: MachineFactory,
    ) -> Self {
        Self {
            name,
            rom_name,
            image_name,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Every registered machine in name order.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Comma-separated machine names, for diagnostics.
pub fn names() -> String {
    all().iter().map(|e| e.name).collect::<Vec<_>>().join(", ")
}

pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name.eq_ignore_ascii_case(name))
}
