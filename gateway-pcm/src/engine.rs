//! Interrupt-context transfer engine.
//!
//! [`PcmContext`] is the explicit replacement for driver-global state: the
//! register block, both sample rings, the error counters and the fault
//! flags. It is shared by reference between the interrupt domain
//! ([`TransferEngine`]) and the process domain ([`crate::driver`]).
//!
//! # Service routine
//!
//! On every transfer-ready interrupt [`TransferEngine::service`]:
//!
//! 1. masks interrupts for its whole body (`critical_section::with`),
//! 2. if `INTSTC.TXW`: moves up to `batch_limit` samples TX ring → FIFO,
//! 3. if `INTSTC.RXR`: moves up to `batch_limit` samples FIFO → RX ring,
//! 4. acknowledges every status flag (`INTSTC = 0x0F`).
//!
//! A starved TX ring or saturated RX ring ends that direction's batch and
//! bumps its counter once. When a counter reaches its threshold the
//! direction is switched off in hardware, two dummy samples are pushed
//! (TX) or drained (RX) to drop the ready condition, the counter resets and
//! a sticky fault flag is raised for the process context to report.
//!
//! Nothing in this path allocates, blocks or logs.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::config::TransferConfig;
use crate::constants::SAMPLE_BUFFER_SLOTS;
use crate::regs::{cs, int, PcmRegisters, Reg, RegisterBus};
use crate::ring::SampleRing;

/// Outcome of an interrupt dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// The interrupt was not ours (no handler registered).
    None,
    /// The interrupt was serviced.
    Handled,
}

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Tx,
    Rx,
}

/// Saturating underflow / overflow counters.
pub struct ErrorCounters {
    tx_underflow: AtomicU32,
    rx_overflow: AtomicU32,
}

impl ErrorCounters {
    /// Both counters at zero.
    pub const fn new() -> Self {
        Self {
            tx_underflow: AtomicU32::new(0),
            rx_overflow: AtomicU32::new(0),
        }
    }

    fn counter(&self, dir: Direction) -> &AtomicU32 {
        match dir {
            Direction::Tx => &self.tx_underflow,
            Direction::Rx => &self.rx_overflow,
        }
    }

    /// Bump the counter for `dir`, returning the new value.
    ///
    /// Only the interrupt domain increments, so a load/store pair suffices.
    pub fn record(&self, dir: Direction) -> u32 {
        let c = self.counter(dir);
        let n = c.load(Ordering::Relaxed).saturating_add(1);
        c.store(n, Ordering::Relaxed);
        n
    }

    /// Starved TX service cycles since open or the last TX shutdown.
    pub fn tx_underflow(&self) -> u32 {
        self.tx_underflow.load(Ordering::Relaxed)
    }

    /// Saturated RX service cycles since open or the last RX shutdown.
    pub fn rx_overflow(&self) -> u32 {
        self.rx_overflow.load(Ordering::Relaxed)
    }

    /// Zero one counter.
    pub fn reset_dir(&self, dir: Direction) {
        self.counter(dir).store(0, Ordering::Relaxed);
    }

    /// Zero both counters.
    pub fn reset(&self) {
        self.reset_dir(Direction::Tx);
        self.reset_dir(Direction::Rx);
    }
}

impl Default for ErrorCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of pending shutdown reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Faults {
    /// Transmit was disabled after too many underflows.
    pub tx_shutdown: bool,
    /// Receive was disabled after too many overflows.
    pub rx_shutdown: bool,
}

impl Faults {
    /// Nothing to report.
    pub const fn is_empty(&self) -> bool {
        !self.tx_shutdown && !self.rx_shutdown
    }
}

const TX_SHUTDOWN: u8 = 1 << 0;
const RX_SHUTDOWN: u8 = 1 << 1;

/// Sticky emergency-shutdown flags.
///
/// Raised by the engine, taken by the process context.
pub struct FaultFlags {
    pending: AtomicU8,
    /// Shutdowns since construction (never cleared).
    total: AtomicU32,
}

impl FaultFlags {
    /// No pending reports.
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
            total: AtomicU32::new(0),
        }
    }

    /// Record a shutdown of `dir`.
    pub fn raise(&self, dir: Direction) {
        let bit = match dir {
            Direction::Tx => TX_SHUTDOWN,
            Direction::Rx => RX_SHUTDOWN,
        };
        self.total.fetch_add(1, Ordering::Relaxed);
        self.pending.fetch_or(bit, Ordering::Release);
    }

    /// Pending reports without clearing them.
    pub fn peek(&self) -> Faults {
        Self::decode(self.pending.load(Ordering::Acquire))
    }

    /// Pending reports, clearing them.
    pub fn take(&self) -> Faults {
        Self::decode(self.pending.swap(0, Ordering::AcqRel))
    }

    /// Total shutdowns recorded.
    pub fn total(&self) -> u32 {
        self.total.load(Ordering::Relaxed)
    }

    fn decode(bits: u8) -> Faults {
        Faults {
            tx_shutdown: bits & TX_SHUTDOWN != 0,
            rx_shutdown: bits & RX_SHUTDOWN != 0,
        }
    }
}

impl Default for FaultFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by the transfer engine and the device session.
pub struct PcmContext<B, const SLOTS: usize = SAMPLE_BUFFER_SLOTS> {
    regs: PcmRegisters<B>,
    tx: SampleRing<SLOTS>,
    rx: SampleRing<SLOTS>,
    counters: ErrorCounters,
    faults: FaultFlags,
    transfer: TransferConfig,
}

impl<B: RegisterBus, const SLOTS: usize> PcmContext<B, SLOTS> {
    /// Build a context over `bus` with empty rings.
    pub const fn new(bus: B, transfer: TransferConfig) -> Self {
        Self {
            regs: PcmRegisters::new(bus),
            tx: SampleRing::new(),
            rx: SampleRing::new(),
            counters: ErrorCounters::new(),
            faults: FaultFlags::new(),
            transfer,
        }
    }

    /// The PCM register block.
    pub fn regs(&self) -> &PcmRegisters<B> {
        &self.regs
    }

    /// Samples waiting to go out (written by the session, read by the engine).
    pub fn tx_ring(&self) -> &SampleRing<SLOTS> {
        &self.tx
    }

    /// Samples received (written by the engine, read by the session).
    pub fn rx_ring(&self) -> &SampleRing<SLOTS> {
        &self.rx
    }

    /// Underflow / overflow counters driving the shutdown policy.
    pub fn counters(&self) -> &ErrorCounters {
        &self.counters
    }

    /// Shutdowns not yet reported to the process context.
    pub fn faults(&self) -> &FaultFlags {
        &self.faults
    }

    /// Batch limit and shutdown thresholds.
    pub fn transfer_config(&self) -> &TransferConfig {
        &self.transfer
    }

    /// Interrupt-context view of this context.
    pub fn engine(&self) -> TransferEngine<'_, B, SLOTS> {
        TransferEngine { ctx: self }
    }
}

/// Moves samples between the hardware FIFO and the sample rings.
pub struct TransferEngine<'c, B, const SLOTS: usize> {
    ctx: &'c PcmContext<B, SLOTS>,
}

impl<B: RegisterBus, const SLOTS: usize> TransferEngine<'_, B, SLOTS> {
    /// Service one transfer-ready interrupt.
    pub fn service(&self) -> IrqReturn {
        critical_section::with(|_cs| {
            let regs = &self.ctx.regs;

            if regs.read(Reg::Intstc) & int::TXW != 0 {
                self.fill_tx();
            }

            if regs.read(Reg::Intstc) & int::RXR != 0 {
                self.drain_rx();
            }

            regs.write(Reg::Intstc, int::ALL);
        });

        IrqReturn::Handled
    }

    fn fill_tx(&self) {
        let ctx = self.ctx;
        for _ in 0..ctx.transfer.batch_limit {
            if !ctx.regs.test_bits(Reg::Cs, cs::TXD) {
                break;
            }

            match ctx.tx.try_read() {
                Some(sample) => ctx.regs.write(Reg::Fifo, sample),
                None => {
                    if ctx.counters.record(Direction::Tx) >= ctx.transfer.underflow_threshold {
                        ctx.regs.clear_bits(Reg::Cs, cs::TXON);
                        // Two dummy words drop TXW.
                        ctx.regs.write(Reg::Fifo, 0);
                        ctx.regs.write(Reg::Fifo, 0);
                        ctx.counters.reset_dir(Direction::Tx);
                        ctx.faults.raise(Direction::Tx);
                    }
                    break;
                }
            }
        }
    }

    fn drain_rx(&self) {
        let ctx = self.ctx;
        for _ in 0..ctx.transfer.batch_limit {
            if !ctx.regs.test_bits(Reg::Cs, cs::RXD) {
                break;
            }

            if ctx.rx.is_full() {
                if ctx.counters.record(Direction::Rx) >= ctx.transfer.overflow_threshold {
                    ctx.regs.clear_bits(Reg::Cs, cs::RXON);
                    // Two discarded reads drop RXR.
                    let _ = ctx.regs.read(Reg::Fifo);
                    let _ = ctx.regs.read(Reg::Fifo);
                    ctx.counters.reset_dir(Direction::Rx);
                    ctx.faults.raise(Direction::Rx);
                }
                break;
            }

            let sample = ctx.regs.read(Reg::Fifo);
            // Cannot fail: the engine is the only RX writer and the ring had room.
            let _ = ctx.rx.try_write(sample);
        }
    }
}
