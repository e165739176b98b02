//! Software model of the PCM block for host tests and demos.
//!
//! [`SimulatedPcm`] implements [`RegisterBus`] with the parts of the
//! hardware the transport relies on:
//!
//! - 64-word TX and RX FIFOs behind `FIFO_A`,
//! - live `CS_A` status bits (`TXD`, `RXD`, `TXW`, `RXR`, `TXE`, `RXF`)
//!   while `EN` is set, with `TXW` / `RXR` also gated on `TXON` / `RXON`,
//! - self-clearing `TXCLR` / `RXCLR`,
//! - sticky `TXERR` / `RXERR`, write 1 to clear,
//! - `INTSTC_A` latching with write-1-to-clear.
//!
//! Nothing moves until [`SimulatedPcm::tick`] is called; one tick is one
//! PCM frame (one sample each way). Transmitted words go to a line-out
//! queue, received words come from a line-in queue, or with loopback the
//! transmitted word is received directly. An idle line (or a TX underrun)
//! carries nothing.
//!
//! Simplifications: `TXW` / `RXR` latch only while the matching direction
//! is on, and clear requests take effect immediately.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use critical_section::Mutex;
use heapless::Deque;

use crate::constants::HW_FIFO_DEPTH;
use crate::driver::{InterruptLine, IrqUnavailable};
use crate::regs::{cs, int, Reg, RegionBusy, RegisterBus};

/// Words each line queue holds before dropping.
pub const LINE_DEPTH: usize = 1024;

const CS_WRITABLE: u32 = cs::EN
    | cs::RXON
    | cs::TXON
    | cs::TXTHR_MASK
    | cs::RXTHR_MASK
    | cs::DMAEN
    | cs::RXSEX
    | cs::SYNC
    | cs::STBY;

struct SimState {
    cs: u32,
    mode: u32,
    rxc: u32,
    txc: u32,
    dreq: u32,
    inten: u32,
    intstc: u32,
    gray: u32,
    tx_err: bool,
    rx_err: bool,
    tx_fifo: Deque<u32, HW_FIFO_DEPTH>,
    rx_fifo: Deque<u32, HW_FIFO_DEPTH>,
    line_in: Deque<u32, LINE_DEPTH>,
    line_out: Deque<u32, LINE_DEPTH>,
    loopback: bool,
    acquired: bool,
    fail_acquire: bool,
    tx_clears: u32,
    rx_clears: u32,
    clears_while_enabled: u32,
}

impl SimState {
    const fn new() -> Self {
        Self {
            cs: 0,
            mode: 0,
            rxc: 0,
            txc: 0,
            dreq: 0,
            inten: 0,
            intstc: 0,
            gray: 0,
            tx_err: false,
            rx_err: false,
            tx_fifo: Deque::new(),
            rx_fifo: Deque::new(),
            line_in: Deque::new(),
            line_out: Deque::new(),
            loopback: false,
            acquired: false,
            fail_acquire: false,
            tx_clears: 0,
            rx_clears: 0,
            clears_while_enabled: 0,
        }
    }

    fn tx_needs_write(&self) -> bool {
        match cs::txthr_of(self.cs) {
            0 => self.tx_fifo.is_empty(),
            _ => !self.tx_fifo.is_full(),
        }
    }

    fn rx_needs_read(&self) -> bool {
        match cs::rxthr_of(self.cs) {
            0 => !self.rx_fifo.is_empty(),
            _ => self.rx_fifo.is_full(),
        }
    }

    fn read_cs(&self) -> u32 {
        let mut v = self.cs;
        let flag = |cond: bool, bit: u32| if cond { bit } else { 0 };
        v |= flag(self.tx_err, cs::TXERR);
        v |= flag(self.rx_err, cs::RXERR);
        if self.cs & cs::EN == 0 {
            return v;
        }

        let tx_on = self.cs & cs::TXON != 0;
        let rx_on = self.cs & cs::RXON != 0;
        v |= flag(!self.tx_fifo.is_full(), cs::TXD);
        v |= flag(self.tx_fifo.is_empty(), cs::TXE);
        v |= flag(!self.rx_fifo.is_empty(), cs::RXD);
        v |= flag(self.rx_fifo.is_full(), cs::RXF);
        v |= flag(tx_on && self.tx_needs_write(), cs::TXW);
        v |= flag(rx_on && self.rx_needs_read(), cs::RXR);
        v | cs::TXSYNC | cs::RXSYNC
    }

    fn write_cs(&mut self, value: u32) {
        if value & cs::TXERR != 0 {
            self.tx_err = false;
        }
        if value & cs::RXERR != 0 {
            self.rx_err = false;
        }
        if value & (cs::TXCLR | cs::RXCLR) != 0 && value & cs::EN != 0 {
            self.clears_while_enabled += 1;
        }
        if value & cs::TXCLR != 0 {
            self.tx_fifo.clear();
            self.tx_clears += 1;
        }
        if value & cs::RXCLR != 0 {
            self.rx_fifo.clear();
            self.rx_clears += 1;
        }
        self.cs = value & CS_WRITABLE;
    }

    fn read(&mut self, reg: Reg) -> u32 {
        match reg {
            Reg::Cs => self.read_cs(),
            Reg::Fifo => self.rx_fifo.pop_front().unwrap_or(0),
            Reg::Mode => self.mode,
            Reg::Rxc => self.rxc,
            Reg::Txc => self.txc,
            Reg::Dreq => self.dreq,
            Reg::Inten => self.inten,
            Reg::Intstc => self.intstc,
            Reg::Gray => self.gray,
        }
    }

    fn write(&mut self, reg: Reg, value: u32) {
        match reg {
            Reg::Cs => self.write_cs(value),
            Reg::Fifo => {
                if self.tx_fifo.push_back(value).is_err() {
                    self.tx_err = true;
                }
            }
            Reg::Mode => self.mode = value,
            Reg::Rxc => self.rxc = value,
            Reg::Txc => self.txc = value,
            Reg::Dreq => self.dreq = value,
            Reg::Inten => self.inten = value & int::ALL,
            Reg::Intstc => self.intstc &= !value,
            Reg::Gray => self.gray = value,
        }
    }

    fn tick(&mut self) {
        if self.cs & cs::EN == 0 {
            return;
        }

        let sent = if self.cs & cs::TXON != 0 {
            let word = self.tx_fifo.pop_front();
            if word.is_none() {
                self.tx_err = true;
            }
            word
        } else {
            None
        };

        if let (Some(word), false) = (sent, self.loopback) {
            let _ = self.line_out.push_back(word);
        }

        if self.cs & cs::RXON != 0 {
            let received = if self.loopback {
                sent
            } else {
                self.line_in.pop_front()
            };
            if let Some(word) = received {
                if self.rx_fifo.push_back(word).is_err() {
                    self.rx_err = true;
                }
            }
        }

        if self.cs & cs::TXON != 0 && self.tx_needs_write() {
            self.intstc |= int::TXW;
        }
        if self.cs & cs::RXON != 0 && self.rx_needs_read() {
            self.intstc |= int::RXR;
        }
        if self.tx_err {
            self.intstc |= int::TXERR;
        }
        if self.rx_err {
            self.intstc |= int::RXERR;
        }
    }
}

/// Simulated PCM register block.
pub struct SimulatedPcm {
    state: Mutex<RefCell<SimState>>,
}

impl SimulatedPcm {
    /// Powered-down block: all registers zero, FIFOs and line empty.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SimState::new())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        critical_section::with(|token| f(&mut self.state.borrow_ref_mut(token)))
    }

    /// Advance one PCM frame.
    pub fn tick(&self) {
        self.with(SimState::tick);
    }

    /// Whether an enabled interrupt condition is latched.
    pub fn irq_pending(&self) -> bool {
        self.with(|s| s.intstc & s.inten != 0)
    }

    /// Route transmitted words straight back into the receiver.
    pub fn set_loopback(&self, on: bool) {
        self.with(|s| s.loopback = on);
    }

    /// Queue a word arriving from the peer.
    pub fn feed_line_in(&self, word: u32) -> Result<(), u32> {
        self.with(|s| s.line_in.push_back(word))
    }

    /// Oldest word sent to the peer.
    pub fn take_line_out(&self) -> Option<u32> {
        self.with(|s| s.line_out.pop_front())
    }

    /// Words sent to the peer and not yet taken.
    pub fn line_out_len(&self) -> usize {
        self.with(|s| s.line_out.len())
    }

    /// Make the next [`RegisterBus::acquire`] fail.
    pub fn set_fail_acquire(&self, fail: bool) {
        self.with(|s| s.fail_acquire = fail);
    }

    /// Whether a driver holds the region.
    pub fn is_acquired(&self) -> bool {
        self.with(|s| s.acquired)
    }

    /// Register value as the driver would read it, without FIFO side effects.
    pub fn register(&self, reg: Reg) -> u32 {
        match reg {
            Reg::Fifo => 0,
            _ => self.with(|s| s.read(reg)),
        }
    }

    /// Put a word straight into the TX FIFO.
    pub fn push_tx_fifo(&self, word: u32) {
        self.with(|s| s.write(Reg::Fifo, word));
    }

    /// Words in the TX FIFO.
    pub fn tx_fifo_len(&self) -> usize {
        self.with(|s| s.tx_fifo.len())
    }

    /// Words in the RX FIFO.
    pub fn rx_fifo_len(&self) -> usize {
        self.with(|s| s.rx_fifo.len())
    }

    /// (TX, RX) FIFO clear requests seen.
    pub fn fifo_clears(&self) -> (u32, u32) {
        self.with(|s| (s.tx_clears, s.rx_clears))
    }

    /// Clear requests issued while the interface was enabled.
    pub fn clears_while_enabled(&self) -> u32 {
        self.with(|s| s.clears_while_enabled)
    }
}

impl Default for SimulatedPcm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimulatedPcm {
    fn read(&self, offset: usize) -> u32 {
        match Reg::from_offset(offset) {
            Some(reg) => self.with(|s| s.read(reg)),
            None => 0,
        }
    }

    fn write(&self, offset: usize, value: u32) {
        if let Some(reg) = Reg::from_offset(offset) {
            self.with(|s| s.write(reg, value));
        }
    }

    fn acquire(&self) -> Result<(), RegionBusy> {
        self.with(|s| {
            if s.fail_acquire || s.acquired {
                return Err(RegionBusy);
            }
            s.acquired = true;
            Ok(())
        })
    }

    fn release(&self) {
        self.with(|s| s.acquired = false);
    }
}

/// Interrupt line that only records registration.
pub struct SoftIrq {
    registered: AtomicBool,
    refuse: AtomicBool,
    requests: AtomicU32,
}

impl SoftIrq {
    /// Free line that accepts requests.
    pub const fn new() -> Self {
        Self {
            registered: AtomicBool::new(false),
            refuse: AtomicBool::new(false),
            requests: AtomicU32::new(0),
        }
    }

    /// Make requests fail, as if another driver held the line.
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::Relaxed);
    }

    /// Whether a handler is registered.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    /// Successful registrations so far.
    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl Default for SoftIrq {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptLine for SoftIrq {
    fn request(&self, _irq: u32) -> Result<(), IrqUnavailable> {
        if self.refuse.load(Ordering::Relaxed) || self.registered.swap(true, Ordering::AcqRel) {
            return Err(IrqUnavailable);
        }
        self.requests.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn free(&self, _irq: u32) {
        self.registered.store(false, Ordering::Release);
    }
}

/// Plain word-addressed register window, e.g. for the clock manager.
pub struct ScratchRegisters<const WORDS: usize> {
    words: [AtomicU32; WORDS],
}

impl<const WORDS: usize> ScratchRegisters<WORDS> {
    /// All words zero.
    pub const fn new() -> Self {
        Self {
            words: [const { AtomicU32::new(0) }; WORDS],
        }
    }

    /// Word at byte `offset`.
    pub fn word(&self, offset: usize) -> u32 {
        self.words[offset / 4].load(Ordering::Relaxed)
    }
}

impl<const WORDS: usize> Default for ScratchRegisters<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> RegisterBus for ScratchRegisters<WORDS> {
    fn read(&self, offset: usize) -> u32 {
        self.word(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        self.words[offset / 4].store(value, Ordering::Relaxed);
    }
}
