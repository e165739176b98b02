//! BCM2835 PCM/I2S register block.
//!
//! Register offsets and bitfield definitions follow the BCM2835 ARM
//! Peripherals datasheet, section 8 (PCM / I2S Audio). All registers are
//! 32 bits wide.
//!
//! [`PcmRegisters`] is the single owner of the block: every access from the
//! transfer engine and from the device session goes through it. A write
//! barrier precedes every write and a read barrier precedes every read, so
//! the order in which callers touch the hardware is the order the hardware
//! observes.

use core::ptr::NonNull;
use core::sync::atomic::{fence, Ordering};

// ── Register offsets ──────────────────────────────────────────────────────

/// Named registers of the PCM block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum Reg {
    /// CS_A: control and status.
    Cs = 0x00,
    /// FIFO_A: FIFO data (write: TX, read: RX).
    Fifo = 0x04,
    /// MODE_A: frame geometry and clocking mode.
    Mode = 0x08,
    /// RXC_A: receive channel configuration.
    Rxc = 0x0C,
    /// TXC_A: transmit channel configuration.
    Txc = 0x10,
    /// DREQ_A: DMA request and panic levels.
    Dreq = 0x14,
    /// INTEN_A: interrupt enables.
    Inten = 0x18,
    /// INTSTC_A: interrupt status, write 1 to clear.
    Intstc = 0x1C,
    /// GRAY: gray code mode control (diagnostic).
    Gray = 0x20,
}

impl Reg {
    /// All registers in address order.
    pub const ALL: [Reg; 9] = [
        Reg::Cs,
        Reg::Fifo,
        Reg::Mode,
        Reg::Rxc,
        Reg::Txc,
        Reg::Dreq,
        Reg::Inten,
        Reg::Intstc,
        Reg::Gray,
    ];

    /// Byte offset from the block base.
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Look a register up by byte offset.
    pub fn from_offset(offset: usize) -> Option<Reg> {
        Reg::ALL.iter().copied().find(|r| r.offset() == offset)
    }
}

// ── CS_A ──────────────────────────────────────────────────────────────────

/// CS_A bits.
pub mod cs {
    /// Leave standby (RAM powered).
    pub const STBY: u32 = 1 << 25;
    /// PCM clock sync helper.
    pub const SYNC: u32 = 1 << 24;
    /// Sign-extend RX samples.
    pub const RXSEX: u32 = 1 << 23;
    /// RX FIFO is full (read-only).
    pub const RXF: u32 = 1 << 22;
    /// TX FIFO is empty (read-only).
    pub const TXE: u32 = 1 << 21;
    /// RX FIFO contains data (read-only).
    pub const RXD: u32 = 1 << 20;
    /// TX FIFO can accept data (read-only).
    pub const TXD: u32 = 1 << 19;
    /// RX FIFO needs reading (read-only, level per RXTHR).
    pub const RXR: u32 = 1 << 18;
    /// TX FIFO needs writing (read-only, level per TXTHR).
    pub const TXW: u32 = 1 << 17;
    /// RX FIFO overflowed; write 1 to clear.
    pub const RXERR: u32 = 1 << 16;
    /// TX FIFO underflowed; write 1 to clear.
    pub const TXERR: u32 = 1 << 15;
    /// RX FIFO in sync with the data frame (read-only).
    pub const RXSYNC: u32 = 1 << 14;
    /// TX FIFO in sync with the data frame (read-only).
    pub const TXSYNC: u32 = 1 << 13;
    /// DMA DREQ enable.
    pub const DMAEN: u32 = 1 << 9;
    /// Clear RX FIFO (takes two PCM clocks).
    pub const RXCLR: u32 = 1 << 4;
    /// Clear TX FIFO (takes two PCM clocks).
    pub const TXCLR: u32 = 1 << 3;
    /// Transmit enable.
    pub const TXON: u32 = 1 << 2;
    /// Receive enable.
    pub const RXON: u32 = 1 << 1;
    /// Interface enable.
    pub const EN: u32 = 1 << 0;

    const RXTHR_POS: u32 = 7;
    const TXTHR_POS: u32 = 5;
    /// RXTHR field mask.
    pub const RXTHR_MASK: u32 = 0x3 << RXTHR_POS;
    /// TXTHR field mask.
    pub const TXTHR_MASK: u32 = 0x3 << TXTHR_POS;

    /// RX threshold: 0 = single sample, 3 = FIFO full.
    pub const fn rxthr(val: u32) -> u32 {
        (val << RXTHR_POS) & RXTHR_MASK
    }

    /// TX threshold: 0 = FIFO empty, 1 = less than full.
    pub const fn txthr(val: u32) -> u32 {
        (val << TXTHR_POS) & TXTHR_MASK
    }

    /// Extract the RXTHR field.
    pub const fn rxthr_of(cs: u32) -> u32 {
        (cs & RXTHR_MASK) >> RXTHR_POS
    }

    /// Extract the TXTHR field.
    pub const fn txthr_of(cs: u32) -> u32 {
        (cs & TXTHR_MASK) >> TXTHR_POS
    }
}

// ── MODE_A ────────────────────────────────────────────────────────────────

/// MODE_A bits.
pub mod mode {
    /// Disable the PCM clock.
    pub const CLK_DIS: u32 = 1 << 28;
    /// PDM decimation factor.
    pub const PDMN: u32 = 1 << 27;
    /// PDM input mode enable.
    pub const PDME: u32 = 1 << 26;
    /// Receive frame packed mode.
    pub const FRXP: u32 = 1 << 25;
    /// Transmit frame packed mode.
    pub const FTXP: u32 = 1 << 24;
    /// Clock is an input (slave).
    pub const CLKM: u32 = 1 << 23;
    /// Invert the clock.
    pub const CLKI: u32 = 1 << 22;
    /// Frame sync is an input (slave).
    pub const FSM: u32 = 1 << 21;
    /// Invert frame sync.
    pub const FSI: u32 = 1 << 20;

    const FLEN_POS: u32 = 10;
    const FSLEN_POS: u32 = 0;
    /// FLEN field mask.
    pub const FLEN_MASK: u32 = 0x3FF << FLEN_POS;
    /// FSLEN field mask.
    pub const FSLEN_MASK: u32 = 0x3FF << FSLEN_POS;

    /// Frame length in clocks, minus one.
    pub const fn flen(val: u32) -> u32 {
        (val << FLEN_POS) & FLEN_MASK
    }

    /// Frame sync length in clocks.
    pub const fn fslen(val: u32) -> u32 {
        (val << FSLEN_POS) & FSLEN_MASK
    }
}

// ── RXC_A / TXC_A ─────────────────────────────────────────────────────────

/// Channel configuration bits, identical layout for RXC_A and TXC_A.
pub mod chan {
    /// Channel 1 width extension.
    pub const CH1WEX: u32 = 1 << 31;
    /// Channel 1 enable.
    pub const CH1EN: u32 = 1 << 30;
    /// Channel 2 width extension.
    pub const CH2WEX: u32 = 1 << 15;
    /// Channel 2 enable.
    pub const CH2EN: u32 = 1 << 14;

    const CH1POS_POS: u32 = 20;
    const CH1WID_POS: u32 = 16;
    const CH2POS_POS: u32 = 4;
    const CH2WID_POS: u32 = 0;

    /// Channel 1 position: clock of the first bit after frame sync.
    pub const fn ch1pos(val: u32) -> u32 {
        (val << CH1POS_POS) & (0x3FF << CH1POS_POS)
    }

    /// Channel 1 width: `val + 8` bits.
    pub const fn ch1wid(val: u32) -> u32 {
        (val << CH1WID_POS) & (0xF << CH1WID_POS)
    }

    /// Channel 2 position.
    pub const fn ch2pos(val: u32) -> u32 {
        (val << CH2POS_POS) & (0x3FF << CH2POS_POS)
    }

    /// Channel 2 width: `val + 8` bits.
    pub const fn ch2wid(val: u32) -> u32 {
        (val << CH2WID_POS) & (0xF << CH2WID_POS)
    }
}

// ── DREQ_A ────────────────────────────────────────────────────────────────

/// DMA request levels.
pub mod dreq {
    /// TX panic level.
    pub const fn tx_panic(val: u32) -> u32 {
        (val & 0x7F) << 24
    }

    /// RX panic level.
    pub const fn rx_panic(val: u32) -> u32 {
        (val & 0x7F) << 16
    }

    /// TX request level.
    pub const fn tx(val: u32) -> u32 {
        (val & 0x7F) << 8
    }

    /// RX request level.
    pub const fn rx(val: u32) -> u32 {
        val & 0x7F
    }
}

// ── INTEN_A / INTSTC_A ────────────────────────────────────────────────────

/// Interrupt enable / status bits, shared layout.
pub mod int {
    /// RX FIFO error.
    pub const RXERR: u32 = 1 << 3;
    /// TX FIFO error.
    pub const TXERR: u32 = 1 << 2;
    /// RX FIFO needs reading.
    pub const RXR: u32 = 1 << 1;
    /// TX FIFO needs writing.
    pub const TXW: u32 = 1 << 0;
    /// Every status flag, as written to INTSTC_A to acknowledge.
    pub const ALL: u32 = RXERR | TXERR | RXR | TXW;
}

// ── GRAY ──────────────────────────────────────────────────────────────────

/// GRAY bits (only touched on reset).
pub mod gray {
    /// Flush the gray-mode RX buffer.
    pub const FLUSH: u32 = 1 << 2;
    /// Clear the gray-mode logic.
    pub const CLR: u32 = 1 << 1;
    /// Enable gray mode.
    pub const EN: u32 = 1 << 0;
}

// ── Bus abstraction ───────────────────────────────────────────────────────

/// Error returned when the register region cannot be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBusy;

/// Raw 32-bit access to a memory-mapped register window.
///
/// Implementations only move words; ordering is handled by
/// [`PcmRegisters`]. Methods take `&self` because the transfer engine and
/// the device session share the block.
pub trait RegisterBus {
    /// Read the word at `offset` bytes from the base.
    fn read(&self, offset: usize) -> u32;

    /// Write `value` to the word at `offset` bytes from the base.
    fn write(&self, offset: usize, value: u32);

    /// Claim the memory region for exclusive use.
    fn acquire(&self) -> Result<(), RegionBusy> {
        Ok(())
    }

    /// Give the memory region back.
    fn release(&self) {}
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }

    fn acquire(&self) -> Result<(), RegionBusy> {
        (**self).acquire()
    }

    fn release(&self) {
        (**self).release()
    }
}

/// Volatile MMIO window over a mapped register block.
pub struct MmioRegisters {
    base: NonNull<u32>,
    len: usize,
}

// SAFETY: the window is only touched through volatile word accesses; the
// hardware is the synchronization point and `PcmRegisters` adds barriers.
unsafe impl Send for MmioRegisters {}
unsafe impl Sync for MmioRegisters {}

impl MmioRegisters {
    /// Wrap a mapped register window of `len` bytes.
    ///
    /// # Safety
    ///
    /// `base` must point to `len` bytes of mapped device memory that stays
    /// mapped for the lifetime of the returned value, and nothing else may
    /// access that range.
    pub const unsafe fn new(base: NonNull<u32>, len: usize) -> Self {
        Self { base, len }
    }

    fn word(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.len);
        // SAFETY: offset is inside the window per the constructor contract.
        unsafe { self.base.as_ptr().add(offset / 4) }
    }
}

impl RegisterBus for MmioRegisters {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: aligned word inside the mapped window.
        unsafe { self.word(offset).read_volatile() }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: aligned word inside the mapped window.
        unsafe { self.word(offset).write_volatile(value) }
    }
}

// ── Typed owner ───────────────────────────────────────────────────────────

#[inline(always)]
fn wmb() {
    fence(Ordering::SeqCst);
}

#[inline(always)]
fn rmb() {
    fence(Ordering::SeqCst);
}

/// Typed, barrier-guarded view of the PCM register block.
pub struct PcmRegisters<B> {
    bus: B,
}

impl<B: RegisterBus> PcmRegisters<B> {
    /// Take ownership of the bus.
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Read a register.
    #[inline]
    pub fn read(&self, reg: Reg) -> u32 {
        rmb();
        self.bus.read(reg.offset())
    }

    /// Write a register.
    #[inline]
    pub fn write(&self, reg: Reg, value: u32) {
        wmb();
        self.bus.write(reg.offset(), value);
    }

    /// Read-modify-write: `new = (current & !mask) | value`.
    pub fn modify(&self, reg: Reg, value: u32, mask: u32) -> u32 {
        let new_val = (self.read(reg) & !mask) | value;
        self.write(reg, new_val);
        new_val
    }

    /// Set `bits` in `reg`.
    pub fn set_bits(&self, reg: Reg, bits: u32) {
        self.modify(reg, bits, 0);
    }

    /// Clear `bits` in `reg`.
    pub fn clear_bits(&self, reg: Reg, bits: u32) {
        self.modify(reg, 0, bits);
    }

    /// Whether every bit of `bits` is set in `reg`.
    pub fn test_bits(&self, reg: Reg, bits: u32) -> bool {
        self.read(reg) & bits == bits
    }

    /// Zero every control register, returning the block to its reset state.
    pub fn reset(&self) {
        self.write(Reg::Cs, 0);
        self.write(Reg::Mode, 0);
        self.write(Reg::Txc, 0);
        self.write(Reg::Rxc, 0);
        self.write(Reg::Inten, 0);
        self.write(Reg::Intstc, 0);
        self.write(Reg::Gray, 0);
    }

    /// Borrow the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give the bus back.
    pub fn release(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    /// Register file that records every write in order.
    struct MockBus {
        regs: RefCell<[u32; 9]>,
        log: RefCell<std::vec::Vec<(usize, u32)>>,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                regs: RefCell::new([0; 9]),
                log: RefCell::new(std::vec::Vec::new()),
            }
        }
    }

    impl RegisterBus for MockBus {
        fn read(&self, offset: usize) -> u32 {
            self.regs.borrow()[offset / 4]
        }

        fn write(&self, offset: usize, value: u32) {
            self.regs.borrow_mut()[offset / 4] = value;
            self.log.borrow_mut().push((offset, value));
        }
    }

    #[test]
    fn offsets_match_datasheet() {
        assert_eq!(Reg::Cs.offset(), 0x00);
        assert_eq!(Reg::Fifo.offset(), 0x04);
        assert_eq!(Reg::Intstc.offset(), 0x1C);
        assert_eq!(Reg::Gray.offset(), 0x20);
        assert_eq!(Reg::Gray.offset() + 4, crate::constants::PCM_SIZE);
    }

    #[test]
    fn from_offset_round_trips() {
        for reg in Reg::ALL {
            assert_eq!(Reg::from_offset(reg.offset()), Some(reg));
        }
        assert_eq!(Reg::from_offset(0x24), None);
        assert_eq!(Reg::from_offset(0x02), None);
    }

    #[test]
    fn field_builders_mask_overflow() {
        assert_eq!(cs::txthr(1), 1 << 5);
        assert_eq!(cs::rxthr(3), 3 << 7);
        assert_eq!(cs::rxthr(7), 3 << 7);
        assert_eq!(cs::rxthr_of(cs::rxthr(2) | cs::EN), 2);
        assert_eq!(mode::flen(383), 383 << 10);
        assert_eq!(mode::fslen(1), 1);
        assert_eq!(mode::flen(0x7FF), 0x3FF << 10);
        assert_eq!(chan::ch1pos(0) | chan::ch1wid(0), 0);
        assert_eq!(chan::ch1wid(8), 8 << 16);
        assert_eq!(dreq::tx(0x80), 0);
    }

    #[test]
    fn set_and_clear_bits_preserve_others() {
        let regs = PcmRegisters::new(MockBus::new());
        regs.write(Reg::Cs, cs::EN | cs::STBY);
        regs.set_bits(Reg::Cs, cs::TXON);
        assert_eq!(regs.read(Reg::Cs), cs::EN | cs::STBY | cs::TXON);
        regs.clear_bits(Reg::Cs, cs::EN);
        assert_eq!(regs.read(Reg::Cs), cs::STBY | cs::TXON);
        assert!(regs.test_bits(Reg::Cs, cs::STBY | cs::TXON));
        assert!(!regs.test_bits(Reg::Cs, cs::EN));
    }

    #[test]
    fn reset_zeroes_control_registers_in_order() {
        let regs = PcmRegisters::new(MockBus::new());
        regs.write(Reg::Mode, 0xFFFF);
        regs.bus().log.borrow_mut().clear();

        regs.reset();

        let log = regs.bus().log.borrow();
        let offsets: std::vec::Vec<usize> = log.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, [0x00, 0x08, 0x10, 0x0C, 0x18, 0x1C, 0x20]);
        assert!(log.iter().all(|(_, v)| *v == 0));
    }

    #[test]
    fn mmio_reads_and_writes_words() {
        let mut window = [0u32; 9];
        let base = NonNull::new(window.as_mut_ptr()).unwrap();
        // SAFETY: `window` outlives `mmio` and is not touched directly meanwhile.
        let mmio = unsafe { MmioRegisters::new(base, crate::constants::PCM_SIZE) };
        mmio.write(Reg::Mode.offset(), 0xABCD);
        assert_eq!(mmio.read(Reg::Mode.offset()), 0xABCD);
        drop(mmio);
        assert_eq!(window[2], 0xABCD);
    }
}
