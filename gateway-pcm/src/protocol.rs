//! Device command protocol.
//!
//! Commands travel as Linux ioctl request codes (type `'i'`) plus one
//! integer argument. Setters take `0` or `1`; queries return a count.
//!
//! | Code | Name            | Direction | Argument | Result          |
//! |------|-----------------|-----------|----------|-----------------|
//! | 0    | `SET_EN`        | write     | 0 / 1    | 0               |
//! | 1    | `SET_TXON`      | write     | 0 / 1    | 0               |
//! | 2    | `SET_RXON`      | write     | 0 / 1    | 0               |
//! | 3    | `TX_BUFF_SPACE` | read      | ignored  | free TX slots   |
//! | 4    | `RX_BUFF_ITEMS` | read      | ignored  | queued RX items |
//! | 5    | `CLEAR_TX_BUFF` | write     | ignored  | 0               |
//! | 6    | `CLEAR_RX_BUFF` | write     | ignored  | 0               |
//! | 15   | `CLR_TX_FIFO`   | write     | ignored  | 0               |
//! | 16   | `CLR_RX_FIFO`   | write     | ignored  | 0               |

use crate::error::PcmError;

/// ioctl type byte.
pub const IOC_TYPE: u8 = b'i';

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

const IOC_WRITE: u32 = 1;
const IOC_READ: u32 = 2;

const fn ioc(dir: u32, nr: u32, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT)
        | (size << IOC_SIZESHIFT)
        | ((IOC_TYPE as u32) << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
}

/// `_IOW('i', nr, char)`.
pub const fn iow(nr: u32) -> u32 {
    ioc(IOC_WRITE, nr, 1)
}

/// `_IOR('i', nr, int)`.
pub const fn ior(nr: u32) -> u32 {
    ioc(IOC_READ, nr, 4)
}

/// Enable (1) or disable (0) the interface.
pub const PCM_SET_EN: u32 = iow(0);
/// Transmit on (1) or off (0).
pub const PCM_SET_TXON: u32 = iow(1);
/// Receive on (1) or off (0).
pub const PCM_SET_RXON: u32 = iow(2);
/// Free TX ring slots.
pub const PCM_TX_BUFF_SPACE: u32 = ior(3);
/// Queued RX ring samples.
pub const PCM_RX_BUFF_ITEMS: u32 = ior(4);
/// Empty the TX ring.
pub const PCM_CLEAR_TX_BUFF: u32 = iow(5);
/// Empty the RX ring.
pub const PCM_CLEAR_RX_BUFF: u32 = iow(6);
/// Flush the hardware TX FIFO.
pub const PCM_CLR_TX_FIFO: u32 = iow(15);
/// Flush the hardware RX FIFO.
pub const PCM_CLR_RX_FIFO: u32 = iow(16);

/// A decoded device command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Enable or disable the whole interface.
    SetEnable(bool),
    /// Enable or disable transmit.
    SetTxOn(bool),
    /// Enable or disable receive.
    SetRxOn(bool),
    /// Free slots in the TX ring.
    TxBufferSpace,
    /// Samples waiting in the RX ring.
    RxBufferItems,
    /// Drop everything queued for transmit.
    ClearTxBuffer,
    /// Drop everything received.
    ClearRxBuffer,
    /// Flush the hardware TX FIFO.
    ClearTxFifo,
    /// Flush the hardware RX FIFO.
    ClearRxFifo,
}

fn flag(arg: usize) -> Result<bool, PcmError> {
    match arg {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(PcmError::InvalidArgument),
    }
}

impl Command {
    /// Decode a request code and its argument.
    pub fn decode(code: u32, arg: usize) -> Result<Self, PcmError> {
        let cmd = match code {
            PCM_SET_EN => Command::SetEnable(flag(arg)?),
            PCM_SET_TXON => Command::SetTxOn(flag(arg)?),
            PCM_SET_RXON => Command::SetRxOn(flag(arg)?),
            PCM_TX_BUFF_SPACE => Command::TxBufferSpace,
            PCM_RX_BUFF_ITEMS => Command::RxBufferItems,
            PCM_CLEAR_TX_BUFF => Command::ClearTxBuffer,
            PCM_CLEAR_RX_BUFF => Command::ClearRxBuffer,
            PCM_CLR_TX_FIFO => Command::ClearTxFifo,
            PCM_CLR_RX_FIFO => Command::ClearRxFifo,
            _ => return Err(PcmError::InvalidArgument),
        };
        Ok(cmd)
    }

    /// Request code for this command.
    pub const fn code(self) -> u32 {
        match self {
            Command::SetEnable(_) => PCM_SET_EN,
            Command::SetTxOn(_) => PCM_SET_TXON,
            Command::SetRxOn(_) => PCM_SET_RXON,
            Command::TxBufferSpace => PCM_TX_BUFF_SPACE,
            Command::RxBufferItems => PCM_RX_BUFF_ITEMS,
            Command::ClearTxBuffer => PCM_CLEAR_TX_BUFF,
            Command::ClearRxBuffer => PCM_CLEAR_RX_BUFF,
            Command::ClearTxFifo => PCM_CLR_TX_FIFO,
            Command::ClearRxFifo => PCM_CLR_RX_FIFO,
        }
    }

    /// Argument word for this command.
    pub const fn arg(self) -> usize {
        match self {
            Command::SetEnable(on) | Command::SetTxOn(on) | Command::SetRxOn(on) => on as usize,
            _ => 0,
        }
    }

    /// Whether the command returns a count.
    pub const fn is_query(self) -> bool {
        matches!(self, Command::TxBufferSpace | Command::RxBufferItems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_linux_encoding() {
        // _IOW('i', 0, char) = 0x4001_6900
        assert_eq!(PCM_SET_EN, 0x4001_6900);
        assert_eq!(PCM_SET_TXON, 0x4001_6901);
        // _IOR('i', 3, int) = 0x8004_6903
        assert_eq!(PCM_TX_BUFF_SPACE, 0x8004_6903);
        assert_eq!(PCM_RX_BUFF_ITEMS, 0x8004_6904);
        assert_eq!(PCM_CLR_TX_FIFO, 0x4001_690F);
        assert_eq!(PCM_CLR_RX_FIFO, 0x4001_6910);
    }

    #[test]
    fn decode_recovers_every_command() {
        let all = [
            Command::SetEnable(true),
            Command::SetEnable(false),
            Command::SetTxOn(true),
            Command::SetRxOn(false),
            Command::TxBufferSpace,
            Command::RxBufferItems,
            Command::ClearTxBuffer,
            Command::ClearRxBuffer,
            Command::ClearTxFifo,
            Command::ClearRxFifo,
        ];
        for cmd in all {
            assert_eq!(Command::decode(cmd.code(), cmd.arg()), Ok(cmd));
        }
    }

    #[test]
    fn unknown_code_is_invalid() {
        assert_eq!(Command::decode(iow(7), 0), Err(PcmError::InvalidArgument));
        assert_eq!(Command::decode(0, 0), Err(PcmError::InvalidArgument));
        // Right number, wrong direction.
        assert_eq!(Command::decode(ior(0), 1), Err(PcmError::InvalidArgument));
    }

    #[test]
    fn enable_argument_must_be_boolean() {
        assert_eq!(Command::decode(PCM_SET_TXON, 2), Err(PcmError::InvalidArgument));
        assert_eq!(Command::decode(PCM_SET_RXON, usize::MAX), Err(PcmError::InvalidArgument));
        // Queries ignore their argument.
        assert_eq!(Command::decode(PCM_TX_BUFF_SPACE, 99), Ok(Command::TxBufferSpace));
    }

    #[test]
    fn only_counts_are_queries() {
        assert!(Command::TxBufferSpace.is_query());
        assert!(Command::RxBufferItems.is_query());
        assert!(!Command::ClearTxFifo.is_query());
    }
}
