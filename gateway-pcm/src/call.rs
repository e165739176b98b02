//! Call session manager.
//!
//! Sequences a telephony call over an open PCM device and exchanges audio
//! in fixed 160-sample frames (20 ms at 8 kHz, one byte per sample).
//!
//! The manager only speaks the command protocol, so it runs the same over
//! a [`crate::driver::DeviceSession`] or any other [`PcmDevice`].

use embedded_hal::delay::DelayNs;

use crate::config::CallConfig;
use crate::constants::FRAME_SAMPLES;
use crate::error::PcmError;
use crate::protocol::Command;

/// One frame of call audio.
pub type Frame = [u8; FRAME_SAMPLES];

const SILENCE: Frame = [0; FRAME_SAMPLES];

/// An open PCM device.
pub trait PcmDevice {
    /// Execute a command, returning its count (queries) or 0.
    fn command(&mut self, cmd: Command) -> Result<u32, PcmError>;

    /// Copy received bytes into `buf`, returning how many were copied.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PcmError>;

    /// Queue bytes for transmission, returning how many were queued.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, PcmError>;
}

/// Something a [`PcmDevice`] can be opened from.
pub trait PcmPort {
    /// The session type handed out by [`open`](Self::open).
    type Device: PcmDevice;

    /// Open the device exclusively.
    fn open(self) -> Result<Self::Device, PcmError>;
}

/// An active call.
///
/// Dropping a call without [`stop`](Self::stop) still disables receive
/// then transmit before the device closes, ignoring errors.
pub struct CallSession<Dev: PcmDevice> {
    device: Dev,
    streaming: bool,
}

impl<Dev: PcmDevice> CallSession<Dev> {
    /// Open the device and start streaming.
    ///
    /// Both rings and both FIFOs are flushed, receive is enabled, the TX
    /// ring is primed with silence and only then is transmit enabled.
    pub fn start<P, D>(port: P, delay: &mut D, config: CallConfig) -> Result<Self, PcmError>
    where
        P: PcmPort<Device = Dev>,
        D: DelayNs,
    {
        config.validate()?;
        let mut device = port.open()?;

        device.command(Command::ClearRxBuffer)?;
        device.command(Command::ClearTxBuffer)?;
        device.command(Command::ClearTxFifo)?;
        device.command(Command::ClearRxFifo)?;

        delay.delay_ns(config.settle_ns);

        device.command(Command::SetRxOn(true))?;

        let mut primed = 0usize;
        loop {
            let space = device.command(Command::TxBufferSpace)? as usize;
            if space == 0 {
                break;
            }
            let n = match device.write(&SILENCE[..space.min(FRAME_SAMPLES)]) {
                Ok(0) | Err(PcmError::WouldBlock) => break,
                Ok(n) => n,
                Err(e) => return Err(e),
            };
            primed += n;
        }

        device.command(Command::SetTxOn(true))?;

        tracing::info!("call started, {} samples of silence primed", primed);
        Ok(Self {
            device,
            streaming: true,
        })
    }

    /// Stop both directions and close the device.
    pub fn stop(mut self) -> Result<(), PcmError> {
        let result = self.halt();
        drop(self);

        tracing::info!("call stopped");
        result
    }

    fn halt(&mut self) -> Result<(), PcmError> {
        self.streaming = false;
        let rx = self.device.command(Command::SetRxOn(false));
        let tx = self.device.command(Command::SetTxOn(false));
        rx.and(tx).map(|_| ())
    }

    /// Queue one frame for transmission.
    ///
    /// Fails with [`PcmError::WouldBlock`] unless the TX ring has room for
    /// strictly more than one frame; nothing is queued in that case.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), PcmError> {
        if self.tx_space()? as usize <= FRAME_SAMPLES {
            return Err(PcmError::WouldBlock);
        }

        let written = self.device.write(frame)?;
        if written != FRAME_SAMPLES {
            return Err(PcmError::InvalidData {
                expected: FRAME_SAMPLES,
                actual: written,
            });
        }
        Ok(())
    }

    /// Take one received frame, if strictly more than a frame is queued.
    ///
    /// A read that delivers fewer than 160 bytes is reported as
    /// [`PcmError::InvalidData`].
    pub fn read_frame(&mut self) -> Result<Option<Frame>, PcmError> {
        if self.rx_items()? as usize <= FRAME_SAMPLES {
            return Ok(None);
        }

        let mut frame = SILENCE;
        let got = self.device.read(&mut frame)?;
        if got != FRAME_SAMPLES {
            tracing::warn!("short frame read: {} of {} bytes", got, FRAME_SAMPLES);
            return Err(PcmError::InvalidData {
                expected: FRAME_SAMPLES,
                actual: got,
            });
        }
        Ok(Some(frame))
    }

    /// Free TX ring slots.
    pub fn tx_space(&mut self) -> Result<u32, PcmError> {
        self.device.command(Command::TxBufferSpace)
    }

    /// Queued RX samples.
    pub fn rx_items(&mut self) -> Result<u32, PcmError> {
        self.device.command(Command::RxBufferItems)
    }

    /// The underlying device.
    pub fn device(&mut self) -> &mut Dev {
        &mut self.device
    }
}

impl<Dev: PcmDevice> Drop for CallSession<Dev> {
    fn drop(&mut self) {
        if self.streaming {
            tracing::warn!("call dropped without stop, disabling RX and TX");
            let _ = self.halt();
        }
    }
}
