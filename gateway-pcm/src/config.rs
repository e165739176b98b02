//! Transport configuration.
//!
//! # Board variants
//!
//! | Board   | Peripheral base | PCM block     | PCM IRQ |
//! |---------|-----------------|---------------|---------|
//! | Pi Zero | `0x2000_0000`   | `0x2020_3000` | 79      |
//! | Pi 3    | `0x3F00_0000`   | `0x3F20_3000` | 85      |
//!
//! # Frame geometry (master mode)
//!
//! One 384-clock frame (`FLEN = 383`) with a single-clock frame sync and one
//! 8-bit channel at position 0. At a 3.072 MHz bit clock this gives the
//! 8 kHz telephony sample rate.

use crate::constants::{
    CLOCK_OFFSET, DEFAULT_BATCH_LIMIT, DEFAULT_CALL_SETTLE_NS, DEFAULT_ERROR_THRESHOLD,
    DEFAULT_FIFO_CLEAR_SETTLE_NS, PCM_OFFSET,
};
use crate::error::PcmError;

/// Supported Raspberry Pi variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Board {
    /// BCM2835 (Pi Zero / Pi 1).
    #[default]
    PiZero,
    /// BCM2837 (Pi 3).
    Pi3,
}

impl Board {
    /// Physical base of the peripheral window.
    pub const fn peripheral_base(self) -> usize {
        match self {
            Board::PiZero => 0x2000_0000,
            Board::Pi3 => 0x3F00_0000,
        }
    }

    /// Physical address of the PCM register block.
    pub const fn pcm_base(self) -> usize {
        self.peripheral_base() + PCM_OFFSET
    }

    /// Physical address of the clock manager block.
    pub const fn clock_base(self) -> usize {
        self.peripheral_base() + CLOCK_OFFSET
    }

    /// Interrupt line of the PCM block.
    pub const fn pcm_irq(self) -> u32 {
        match self {
            Board::PiZero => 79,
            Board::Pi3 => 85,
        }
    }
}

/// Who drives the bit clock and frame sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PcmMode {
    /// This block generates the clock and frame sync.
    #[default]
    Master,
    /// The peripheral (GSM module) drives the clock and frame sync.
    Slave,
}

/// Knobs of the interrupt-context transfer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    /// Maximum samples moved per direction per interrupt.
    pub batch_limit: u32,
    /// Underflow events tolerated before transmit is shut down.
    pub underflow_threshold: u32,
    /// Overflow events tolerated before receive is shut down.
    pub overflow_threshold: u32,
}

impl TransferConfig {
    /// Reference values: 64-sample batches, one million events per direction.
    pub const fn reference() -> Self {
        Self {
            batch_limit: DEFAULT_BATCH_LIMIT,
            underflow_threshold: DEFAULT_ERROR_THRESHOLD,
            overflow_threshold: DEFAULT_ERROR_THRESHOLD,
        }
    }

    /// Reject zero batch limits and zero thresholds.
    pub fn validate(&self) -> Result<(), PcmError> {
        if self.batch_limit == 0 || self.underflow_threshold == 0 || self.overflow_threshold == 0
        {
            return Err(PcmError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Driver-level configuration applied at install time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    /// Board the driver runs on; selects the interrupt line.
    pub board: Board,
    /// Which side generates the bit and frame clocks.
    pub mode: PcmMode,
    /// Nanoseconds to wait between requesting a FIFO clear and re-enabling.
    pub fifo_clear_settle_ns: u32,
}

impl DriverConfig {
    /// Pi Zero, master mode.
    pub const fn reference() -> Self {
        Self {
            board: Board::PiZero,
            mode: PcmMode::Master,
            fifo_clear_settle_ns: DEFAULT_FIFO_CLEAR_SETTLE_NS,
        }
    }

    /// Reject a zero FIFO clear settle time.
    pub fn validate(&self) -> Result<(), PcmError> {
        if self.fifo_clear_settle_ns == 0 {
            return Err(PcmError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Call session sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CallConfig {
    /// Wait after clearing the FIFOs before enabling receive.
    pub settle_ns: u32,
}

impl CallConfig {
    /// 5 µs settle.
    pub const fn reference() -> Self {
        Self {
            settle_ns: DEFAULT_CALL_SETTLE_NS,
        }
    }

    /// Reject a zero settle time.
    pub fn validate(&self) -> Result<(), PcmError> {
        if self.settle_ns == 0 {
            return Err(PcmError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self::reference()
    }
}
