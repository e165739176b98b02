//! # gateway-pcm
//!
//! A `no_std`, allocation-free PCM/I2S audio transport for the BCM2835
//! family (Raspberry Pi Zero / Pi 3). It carries 8 kHz, 8-bit telephony
//! audio between a GSM module's PCM port and a call-processing process.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Hardware | [`regs`] | Barrier-guarded access to the PCM register block |
//! | Buffering | [`ring`] | Lock-free SPSC sample rings |
//! | Interrupt | [`engine`] | Shared context, FIFO ⇄ ring service routine, shutdown policy |
//! | Device | [`driver`] / [`protocol`] | Install, exclusive open, read/write, commands |
//! | Call | [`call`] | Start/stop sequencing and 160-sample frame I/O |
//! | Clock | [`clock`] | 3.072 MHz bit clock for master mode |
//! | Support | [`config`] / [`constants`] / [`error`] | Configuration, defaults, error type |
//! | Testing | [`sim`] | Software model of the register block (feature-gated) |
//!
//! ## Data flow
//!
//! ```text
//! CallSession ⇄ DeviceSession ⇄ SampleRing ⇄ TransferEngine ⇄ FIFO_A ⇄ PCM pins
//!   (process context)                        (interrupt context)
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use gateway_pcm::prelude::*;
//!
//! static CTX: PcmContext<MmioRegisters> = PcmContext::new(mmio, TransferConfig::reference());
//!
//! let driver = PcmDriver::install(&CTX, irq, delay, DriverConfig::reference())?;
//!
//! // interrupt handler:
//! driver.on_interrupt();
//!
//! // call thread:
//! let mut call = CallSession::start(&driver, &mut delay, CallConfig::reference())?;
//! loop {
//!     if let Some(frame) = call.read_frame()? {
//!         call.write_frame(&frame)?; // echo
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `sim` | no | [`sim`] module (uses `heapless`) |
//! | `defmt` | no | `defmt::Format` on public enums |
//!
//! ## Audio parameters
//!
//! - **Frame size:** 160 samples ([`constants::FRAME_SAMPLES`])
//! - **Sample rate:** 8 kHz (384-clock frames at 3.072 MHz)
//! - **Sample format:** one byte per sample on the byte stream, one 32-bit word at the FIFO
//! - **Ring capacity:** 16 000 samples per direction ([`constants::SAMPLE_BUFFER_LEN`])

#![cfg_attr(not(test), no_std)]

pub mod call;
pub mod clock;
pub mod config;
pub mod constants;
pub mod driver;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod regs;
pub mod ring;

#[cfg(any(test, feature = "sim"))]
pub mod sim;


/// Common imports.
pub mod prelude {
    pub use crate::call::{CallSession, Frame, PcmDevice, PcmPort};
    pub use crate::clock::{ClockManager, PcmClock};
    pub use crate::config::{Board, CallConfig, DriverConfig, PcmMode, TransferConfig};
    pub use crate::driver::{DeviceSession, InterruptLine, PcmDriver};
    pub use crate::engine::{IrqReturn, PcmContext};
    pub use crate::error::PcmError;
    pub use crate::protocol::Command;
    pub use crate::regs::{MmioRegisters, RegisterBus};
}
