//! PCM bit clock generator.
//!
//! In master mode the PCM block needs a 3.072 MHz bit clock from the
//! general-purpose clock manager. The window handed to [`ClockManager`]
//! starts at the clock manager base (peripheral base + `0x10_1000`).
//!
//! ```text
//! 19.2 MHz oscillator / (6 + 1024/4096) = 3.072 MHz
//! 3.072 MHz / 384 clocks per frame      = 8 kHz
//! ```
//!
//! Every clock manager write must carry the `0x5A` password in the top
//! byte or the hardware ignores it.

use embedded_hal::delay::DelayNs;

use crate::constants::DEFAULT_CALL_SETTLE_NS;
use crate::regs::RegisterBus;

/// Byte offset of CM_PCMCTL in the clock manager window.
pub const CM_PCMCTL: usize = 0x98;
/// Byte offset of CM_PCMDIV in the clock manager window.
pub const CM_PCMDIV: usize = 0x9C;

/// Clock manager write password.
pub const CM_PASSWD: u32 = 0x5A00_0000;

/// CM_PCMCTL bits.
pub mod ctl {
    /// Generator enable.
    pub const ENAB: u32 = 1 << 4;
    /// Oscillator (19.2 MHz) as source.
    pub const SRC_OSC: u32 = 1;

    /// MASH noise-shaping stage count.
    pub const fn mash(stages: u32) -> u32 {
        (stages & 0x3) << 9
    }
}

/// CM_PCMDIV fields.
pub mod div {
    /// Integer part of the divisor.
    pub const fn divi(val: u32) -> u32 {
        (val & 0xFFF) << 12
    }

    /// Fractional part of the divisor, in 1/4096.
    pub const fn divf(val: u32) -> u32 {
        val & 0xFFF
    }
}

/// Control of the external bit clock.
pub trait PcmClock {
    /// Start the bit clock.
    fn clock_up(&mut self);

    /// Stop the bit clock.
    fn clock_down(&mut self);
}

/// Register-level driver for the PCM clock generator.
pub struct ClockManager<B, D> {
    bus: B,
    delay: D,
    settle_ns: u32,
}

impl<B: RegisterBus, D: DelayNs> ClockManager<B, D> {
    /// Manager over the clock block at `bus`, with the default settle time.
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            bus,
            delay,
            settle_ns: DEFAULT_CALL_SETTLE_NS,
        }
    }

    /// Override the wait between programming the divisor and enabling.
    pub fn with_settle_ns(mut self, settle_ns: u32) -> Self {
        self.settle_ns = settle_ns;
        self
    }

    /// Give back the bus and delay provider.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }
}

impl<B: RegisterBus, D: DelayNs> PcmClock for ClockManager<B, D> {
    fn clock_up(&mut self) {
        // Generator must be stopped while the divisor changes.
        self.bus.write(CM_PCMCTL, CM_PASSWD | ctl::mash(1));
        self.bus
            .write(CM_PCMDIV, CM_PASSWD | div::divi(6) | div::divf(1024));

        self.delay.delay_ns(self.settle_ns);

        self.bus
            .write(CM_PCMCTL, CM_PASSWD | ctl::mash(1) | ctl::ENAB | ctl::SRC_OSC);
        tracing::info!("PCM clock started (3.072 MHz)");
    }

    fn clock_down(&mut self) {
        self.bus.write(CM_PCMCTL, CM_PASSWD);
        self.bus.write(CM_PCMDIV, CM_PASSWD);
        tracing::info!("PCM clock stopped");
    }
}
