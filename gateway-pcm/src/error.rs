//! Error taxonomy shared by the driver, the command protocol and the call session.

/// Errors surfaced by the PCM transport.
///
/// Transient underflow/overflow never shows up here: the transfer engine
/// absorbs it with its threshold policy (see [`crate::engine`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PcmError {
    /// The exclusive device (or its interrupt line) is already held.
    #[error("device busy")]
    Busy,
    /// No space / no data right now; retry later.
    #[error("operation would block")]
    WouldBlock,
    /// Unknown command code or out-of-range argument.
    #[error("invalid argument")]
    InvalidArgument,
    /// A transfer moved a different number of bytes than the protocol requires.
    #[error("short transfer: expected {expected} bytes, got {actual}")]
    InvalidData {
        /// Bytes the caller asked for.
        expected: usize,
        /// Bytes actually transferred.
        actual: usize,
    },
    /// The register block could not be acquired at install time.
    #[error("hardware fault: PCM register block unavailable")]
    HardwareFault,
}

impl PcmError {
    /// Negative errno equivalent, as a character-device caller would see it.
    pub const fn errno(self) -> i32 {
        match self {
            PcmError::Busy => -16,
            PcmError::WouldBlock => -11,
            PcmError::InvalidArgument | PcmError::InvalidData { .. } => -22,
            PcmError::HardwareFault => -5,
        }
    }

    /// Whether the caller should simply retry the same operation later.
    pub const fn is_transient(self) -> bool {
        matches!(self, PcmError::WouldBlock)
    }
}
