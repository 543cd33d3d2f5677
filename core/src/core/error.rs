use thiserror::Error;

/// Fatal core errors. Every variant aborts the run loop; there is no retry
/// and no partial-instruction recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A peripheral asked for a cycle steal outside 1..=5.
    #[error("cycle steal of {0} cycles is outside the supported range 1..=5")]
    CycleStealOutOfRange(u8),

    /// A memory image of an unsupported size was supplied.
    #[error("unsupported {region} size: expected {expected}, got {actual} bytes")]
    UnsupportedMemorySize {
        region: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// ADC/SBC executed with the D flag set. Decimal arithmetic is not
    /// implemented, and computing a binary result instead would silently
    /// corrupt state.
    #[error("decimal mode arithmetic (opcode ${opcode:02X} at ${pc:04X}) is not implemented")]
    DecimalMode { opcode: u8, pc: u16 },

    /// The execute dispatch reached a mnemonic it has no handler for.
    #[error("no execute handler for {mnemonic} at ${pc:04X}")]
    UnimplementedOpcode { mnemonic: &'static str, pc: u16 },

    /// Peripheral card slot number outside 1..=7.
    #[error("slot {0} is not a valid peripheral slot (1..=7)")]
    InvalidSlot(usize),
}
