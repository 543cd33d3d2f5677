//! IIe memory map: RAM planes, ROM, soft switches and slot cards.

mod block_map;
mod bus;
mod switches;

pub use block_map::BlockMap;
pub use bus::{MemoryBus, Plane, ROM_SIZE, ROM_SIZE_NO_SLOTS};
pub use switches::{SoftSwitch, SwitchState};

/// Byte-level accessor for a peripheral card.
///
/// A card installed in slot *n* sees every access to its I/O window
/// ($C080+16n-$C08F+16n), its ROM page ($Cn00-$CnFF) and, once selected,
/// the shared expansion ROM ($C800-$CFFF). It receives the full CPU address.
pub trait MemoryAction {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}
