//! Error types for chip model operations

/// Errors raised by a [`ChipModel`](crate::ChipModel).
///
/// Only contract violations surface here. Writes to registers a variant
/// reserves but tolerates are reported as
/// [`WriteOutcome::Tolerated`](crate::WriteOutcome::Tolerated) instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChipError {
    /// Register address outside the variant's declared register range
    #[error("{chip}: register 0x{register:02X} outside range 0x00..0x{count:02X}")]
    InvalidRegister {
        /// Human-readable chip name
        chip: &'static str,
        /// Offending register address
        register: u16,
        /// Number of registers the variant declares
        count: u16,
    },
}

/// Result type for chip operations
pub type Result<T> = std::result::Result<T, ChipError>;
