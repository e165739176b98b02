//! PCM driver and exclusive device session.
//!
//! [`PcmDriver::install`] claims the register block and programs the
//! interface; [`PcmDriver::open`] hands out the single [`DeviceSession`]
//! through which process context moves samples and issues
//! [`Command`]s. Dropping the session closes it.
//!
//! ```ignore
//! static CTX: PcmContext<MmioRegisters> = PcmContext::new(mmio, TransferConfig::reference());
//!
//! let driver = PcmDriver::install(&CTX, irq_line, delay, DriverConfig::reference())?;
//! let mut session = driver.open()?;
//! session.command(Command::SetRxOn(true))?;
//! session.write(&frame)?;
//!
//! // interrupt handler:
//! driver.on_interrupt();
//! ```

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;

use crate::call::{PcmDevice, PcmPort};
use crate::config::{DriverConfig, PcmMode};
use crate::constants::{BYTES_PER_SAMPLE, DEVICE_NAME, SAMPLE_BUFFER_SLOTS};
use crate::engine::{IrqReturn, PcmContext};
use crate::error::PcmError;
use crate::protocol::Command;
use crate::regs::{chan, cs, int, mode, Reg, RegisterBus};
use crate::ring::SampleRing;

/// The interrupt line could not be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqUnavailable;

/// Registration of the PCM interrupt with the platform.
///
/// The platform routes the interrupt to [`PcmDriver::on_interrupt`] while
/// the line is registered.
pub trait InterruptLine {
    /// Register the handler for `irq`.
    fn request(&self, irq: u32) -> Result<(), IrqUnavailable>;

    /// Unregister the handler for `irq`.
    fn free(&self, irq: u32);
}

impl<T: InterruptLine + ?Sized> InterruptLine for &T {
    fn request(&self, irq: u32) -> Result<(), IrqUnavailable> {
        (**self).request(irq)
    }

    fn free(&self, irq: u32) {
        (**self).free(irq)
    }
}

/// An installed PCM interface.
pub struct PcmDriver<'c, B, I, D, const SLOTS: usize = SAMPLE_BUFFER_SLOTS> {
    ctx: &'c PcmContext<B, SLOTS>,
    irq: I,
    delay: Mutex<RefCell<D>>,
    config: DriverConfig,
    in_use: AtomicBool,
    irq_registered: AtomicBool,
    usage: AtomicU32,
}

impl<'c, B, I, D, const SLOTS: usize> PcmDriver<'c, B, I, D, SLOTS>
where
    B: RegisterBus,
    I: InterruptLine,
    D: DelayNs,
{
    /// Claim the register block and bring the interface up.
    ///
    /// Leaves the interface enabled with both directions off and both
    /// FIFOs cleared. Fails with [`PcmError::HardwareFault`] if the region
    /// is held elsewhere and [`PcmError::InvalidArgument`] on a bad config.
    pub fn install(
        ctx: &'c PcmContext<B, SLOTS>,
        irq: I,
        delay: D,
        config: DriverConfig,
    ) -> Result<Self, PcmError> {
        config.validate()?;
        ctx.transfer_config().validate()?;

        if ctx.regs().bus().acquire().is_err() {
            tracing::error!("{}: failed to map register block", DEVICE_NAME);
            return Err(PcmError::HardwareFault);
        }

        ctx.tx_ring().clear();
        ctx.rx_ring().clear();
        ctx.counters().reset();
        let _ = ctx.faults().take();

        let regs = ctx.regs();
        regs.write(Reg::Cs, 0);
        regs.write(Reg::Mode, 0);
        regs.write(Reg::Txc, 0);
        regs.write(Reg::Rxc, 0);
        regs.write(Reg::Gray, 0);

        match config.mode {
            PcmMode::Master => regs.write(Reg::Mode, mode::flen(383) | mode::fslen(1)),
            PcmMode::Slave => regs.write(Reg::Mode, mode::CLKM | mode::FSM),
        }

        // One 8-bit channel at the start of the frame.
        let channel = chan::CH1EN | chan::ch1pos(0) | chan::ch1wid(0);
        regs.write(Reg::Rxc, channel);
        regs.write(Reg::Txc, channel);

        regs.set_bits(Reg::Cs, cs::STBY);
        regs.set_bits(Reg::Cs, cs::TXCLR | cs::RXCLR);
        regs.set_bits(Reg::Cs, cs::txthr(1) | cs::rxthr(3));
        regs.write(Reg::Inten, int::TXW | int::RXR);
        regs.set_bits(Reg::Cs, cs::EN);

        tracing::info!(
            "{}: installed ({:?}, {:?}, irq {})",
            DEVICE_NAME,
            config.board,
            config.mode,
            config.board.pcm_irq()
        );

        Ok(Self {
            ctx,
            irq,
            delay: Mutex::new(RefCell::new(delay)),
            config,
            in_use: AtomicBool::new(false),
            irq_registered: AtomicBool::new(false),
            usage: AtomicU32::new(0),
        })
    }

    /// Shut the interface down and release the register block.
    ///
    /// Returns the interrupt line and delay provider.
    pub fn remove(self) -> (I, D) {
        let regs = self.ctx.regs();
        regs.clear_bits(Reg::Cs, cs::TXON);
        regs.reset();
        regs.bus().release();

        tracing::info!("{}: removed", DEVICE_NAME);

        (self.irq, self.delay.into_inner().into_inner())
    }

    /// Interrupt entry point.
    ///
    /// Runs the transfer engine while a session holds the line.
    pub fn on_interrupt(&self) -> IrqReturn {
        if !self.irq_registered.load(Ordering::Acquire) {
            return IrqReturn::None;
        }
        self.ctx.engine().service()
    }

    /// Open the device.
    ///
    /// Fails with [`PcmError::Busy`] if a session is already open or the
    /// interrupt line cannot be registered; in both cases nothing changes.
    pub fn open(&self) -> Result<DeviceSession<'_, 'c, B, I, D, SLOTS>, PcmError> {
        if self
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("{}: open refused, device in use", DEVICE_NAME);
            return Err(PcmError::Busy);
        }

        let irq = self.config.board.pcm_irq();
        if self.irq.request(irq).is_err() {
            self.in_use.store(false, Ordering::Release);
            tracing::warn!("{}: failed to acquire interrupt {}", DEVICE_NAME, irq);
            return Err(PcmError::Busy);
        }

        self.ctx.counters().reset();
        let _ = self.ctx.faults().take();
        self.irq_registered.store(true, Ordering::Release);
        self.usage.fetch_add(1, Ordering::AcqRel);

        tracing::info!("{}: opened, interrupts enabled", DEVICE_NAME);
        Ok(DeviceSession { driver: self })
    }

    fn close_session(&self) {
        self.irq_registered.store(false, Ordering::Release);
        self.irq.free(self.config.board.pcm_irq());
        self.ctx.counters().reset();
        self.usage.fetch_sub(1, Ordering::AcqRel);
        self.in_use.store(false, Ordering::Release);

        tracing::info!("{}: closed", DEVICE_NAME);
    }

    /// Whether a session is open.
    pub fn is_open(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    /// Open sessions holding the driver.
    pub fn usage_count(&self) -> u32 {
        self.usage.load(Ordering::Acquire)
    }

    /// Shared state the interrupt handler works on.
    pub fn context(&self) -> &'c PcmContext<B, SLOTS> {
        self.ctx
    }

    /// Configuration the driver was installed with.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    // ── Hardware helpers ───────────────────────────────────────────────

    fn set_control(&self, bit: u32, on: bool, name: &str) {
        if on {
            self.ctx.regs().set_bits(Reg::Cs, bit);
        } else {
            self.ctx.regs().clear_bits(Reg::Cs, bit);
        }
        tracing::info!("{}: {} {}", DEVICE_NAME, name, if on { "enabled" } else { "disabled" });
    }

    /// Flush one hardware FIFO. The interface must be off while the clear
    /// bit is set, and stays off for two PCM clocks.
    fn clear_fifo(&self, clear_bit: u32) {
        let regs = self.ctx.regs();
        regs.clear_bits(Reg::Cs, cs::EN);
        regs.set_bits(Reg::Cs, clear_bit);
        critical_section::with(|token| {
            self.delay
                .borrow_ref_mut(token)
                .delay_ns(self.config.fifo_clear_settle_ns)
        });
        regs.set_bits(Reg::Cs, cs::EN);
        tracing::debug!(
            "{}: {} FIFO cleared",
            DEVICE_NAME,
            if clear_bit == cs::TXCLR { "TX" } else { "RX" }
        );
    }

    fn report_faults(&self) {
        let faults = self.ctx.faults().take();
        if faults.tx_shutdown {
            tracing::warn!("{}: buffer underflow limit reached, TX disabled", DEVICE_NAME);
        }
        if faults.rx_shutdown {
            tracing::warn!("{}: buffer overflow limit reached, RX disabled", DEVICE_NAME);
        }
    }
}

/// The open device.
///
/// At most one exists per driver. Closed on drop.
pub struct DeviceSession<'d, 'c, B, I, D, const SLOTS: usize = SAMPLE_BUFFER_SLOTS>
where
    B: RegisterBus,
    I: InterruptLine,
    D: DelayNs,
{
    driver: &'d PcmDriver<'c, B, I, D, SLOTS>,
}

impl<B, I, D, const SLOTS: usize> DeviceSession<'_, '_, B, I, D, SLOTS>
where
    B: RegisterBus,
    I: InterruptLine,
    D: DelayNs,
{
    /// Copy received samples into `buf`, one byte per sample.
    ///
    /// Never blocks; returns the number of bytes written, 0 if nothing is
    /// queued.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let rx = self.driver.ctx.rx_ring();
        let mut n = 0;
        for (slot, sample) in buf
            .chunks_exact_mut(BYTES_PER_SAMPLE)
            .zip(core::iter::from_fn(|| rx.try_read()))
        {
            slot.copy_from_slice(&sample.to_le_bytes()[..BYTES_PER_SAMPLE]);
            n += BYTES_PER_SAMPLE;
        }
        n
    }

    /// Queue `bytes` for transmission, one sample per byte.
    ///
    /// Fails with [`PcmError::WouldBlock`] only if the TX ring has no room
    /// at all. Otherwise queues what fits, drops the rest and returns the
    /// number of bytes actually queued.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, PcmError> {
        let tx = self.driver.ctx.tx_ring();
        if tx.remaining_space() == 0 {
            return Err(PcmError::WouldBlock);
        }

        let mut stored = 0;
        for chunk in bytes.chunks_exact(BYTES_PER_SAMPLE) {
            let mut word = [0u8; 4];
            word[..BYTES_PER_SAMPLE].copy_from_slice(chunk);
            if tx.try_write(u32::from_le_bytes(word)).is_ok() {
                stored += BYTES_PER_SAMPLE;
            }
        }
        Ok(stored)
    }

    /// Execute a command, returning its count (queries) or 0.
    pub fn command(&mut self, cmd: Command) -> Result<u32, PcmError> {
        let driver = self.driver;
        let ctx = driver.ctx;

        driver.report_faults();

        match cmd {
            Command::SetEnable(on) => driver.set_control(cs::EN, on, "PCM interface"),
            Command::SetTxOn(on) => driver.set_control(cs::TXON, on, "TX"),
            Command::SetRxOn(on) => driver.set_control(cs::RXON, on, "RX"),
            Command::TxBufferSpace => return Ok(count(ctx.tx_ring().remaining_space())),
            Command::RxBufferItems => return Ok(count(ctx.rx_ring().item_count())),
            Command::ClearTxBuffer => clear_ring(ctx.tx_ring()),
            Command::ClearRxBuffer => clear_ring(ctx.rx_ring()),
            Command::ClearTxFifo => driver.clear_fifo(cs::TXCLR),
            Command::ClearRxFifo => driver.clear_fifo(cs::RXCLR),
        }
        Ok(0)
    }

    /// Decode and execute a raw request code.
    pub fn ioctl(&mut self, code: u32, arg: usize) -> Result<u32, PcmError> {
        let cmd = Command::decode(code, arg)?;
        self.command(cmd)
    }

    /// Close the session.
    pub fn close(self) {}
}

/// Empty `ring` with the transfer engine held off, so the engine never
/// sees the head and tail from different generations.
fn clear_ring<const SLOTS: usize>(ring: &SampleRing<SLOTS>) {
    critical_section::with(|_| ring.clear());
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl<B, I, D, const SLOTS: usize> Drop for DeviceSession<'_, '_, B, I, D, SLOTS>
where
    B: RegisterBus,
    I: InterruptLine,
    D: DelayNs,
{
    fn drop(&mut self) {
        self.driver.close_session();
    }
}

impl<'d, 'c, B, I, D, const SLOTS: usize> PcmPort for &'d PcmDriver<'c, B, I, D, SLOTS>
where
    B: RegisterBus,
    I: InterruptLine,
    D: DelayNs,
{
    type Device = DeviceSession<'d, 'c, B, I, D, SLOTS>;

    fn open(self) -> Result<Self::Device, PcmError> {
        PcmDriver::open(self)
    }
}

impl<B, I, D, const SLOTS: usize> PcmDevice for DeviceSession<'_, '_, B, I, D, SLOTS>
where
    B: RegisterBus,
    I: InterruptLine,
    D: DelayNs,
{
    fn command(&mut self, cmd: Command) -> Result<u32, PcmError> {
        DeviceSession::command(self, cmd)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, PcmError> {
        Ok(DeviceSession::read(self, buf))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, PcmError> {
        DeviceSession::write(self, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferConfig;
    use crate::protocol::{PCM_RX_BUFF_ITEMS, PCM_SET_TXON};
    use crate::sim::{SimulatedPcm, SoftIrq};

    // ── Mock delay (no-op) ────────────────────────────────────────────

    struct MockDelay;

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    type Ctx = PcmContext<SimulatedPcm, 32>;
    type Driver<'a> = PcmDriver<'a, SimulatedPcm, &'a SoftIrq, MockDelay, 32>;

    fn context() -> Ctx {
        PcmContext::new(SimulatedPcm::new(), TransferConfig::reference())
    }

    fn install<'a>(ctx: &'a Ctx, irq: &'a SoftIrq) -> Driver<'a> {
        PcmDriver::install(ctx, irq, MockDelay, DriverConfig::reference()).unwrap()
    }

    #[test]
    fn install_programs_master_mode() {
        let ctx = context();
        let irq = SoftIrq::new();
        let _driver = install(&ctx, &irq);

        let sim = ctx.regs().bus();
        assert!(sim.is_acquired());
        assert_eq!(sim.register(Reg::Mode), mode::flen(383) | mode::fslen(1));
        assert_eq!(sim.register(Reg::Txc), chan::CH1EN);
        assert_eq!(sim.register(Reg::Rxc), chan::CH1EN);
        assert_eq!(sim.register(Reg::Inten), int::TXW | int::RXR);

        let cs_val = sim.register(Reg::Cs);
        assert_eq!(cs_val & (cs::EN | cs::STBY), cs::EN | cs::STBY);
        assert_eq!(cs_val & (cs::TXON | cs::RXON), 0);
        assert_eq!(cs::txthr_of(cs_val), 1);
        assert_eq!(cs::rxthr_of(cs_val), 3);
        assert_eq!(sim.fifo_clears(), (1, 1));
    }

    #[test]
    fn install_programs_slave_mode() {
        let ctx = context();
        let irq = SoftIrq::new();
        let config = DriverConfig {
            mode: PcmMode::Slave,
            ..DriverConfig::reference()
        };
        let _driver: Driver<'_> = PcmDriver::install(&ctx, &irq, MockDelay, config).unwrap();

        assert_eq!(ctx.regs().bus().register(Reg::Mode), mode::CLKM | mode::FSM);
    }

    #[test]
    fn install_fails_when_region_unavailable() {
        let ctx = context();
        ctx.regs().bus().set_fail_acquire(true);
        let irq = SoftIrq::new();

        let result: Result<Driver<'_>, _> =
            PcmDriver::install(&ctx, &irq, MockDelay, DriverConfig::reference());

        assert_eq!(result.err(), Some(PcmError::HardwareFault));
        assert_eq!(ctx.regs().bus().register(Reg::Cs), 0);
    }

    #[test]
    fn install_rejects_bad_transfer_config() {
        let ctx: Ctx = PcmContext::new(
            SimulatedPcm::new(),
            TransferConfig {
                batch_limit: 0,
                ..TransferConfig::reference()
            },
        );
        let irq = SoftIrq::new();

        let result: Result<Driver<'_>, _> =
            PcmDriver::install(&ctx, &irq, MockDelay, DriverConfig::reference());

        assert_eq!(result.err(), Some(PcmError::InvalidArgument));
        assert!(!ctx.regs().bus().is_acquired());
    }

    #[test]
    fn remove_resets_and_releases() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        {
            let mut s = driver.open().unwrap();
            s.command(Command::SetTxOn(true)).unwrap();
        }

        let _ = driver.remove();

        let sim = ctx.regs().bus();
        assert!(!sim.is_acquired());
        for reg in [Reg::Cs, Reg::Mode, Reg::Txc, Reg::Rxc, Reg::Inten, Reg::Gray] {
            assert_eq!(sim.register(reg), 0, "{reg:?} not reset");
        }
    }

    #[test]
    fn second_open_is_busy_until_close() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);

        let first = driver.open().unwrap();
        assert!(driver.is_open());
        assert_eq!(driver.usage_count(), 1);
        assert!(matches!(driver.open(), Err(PcmError::Busy)));
        assert_eq!(driver.usage_count(), 1);
        assert_eq!(irq.request_count(), 1);

        // Dirty the counters while open.
        ctx.counters().record(crate::engine::Direction::Tx);
        first.close();

        assert!(!driver.is_open());
        assert_eq!(driver.usage_count(), 0);
        assert!(!irq.is_registered());
        assert_eq!(ctx.counters().tx_underflow(), 0);

        let _second = driver.open().unwrap();
        assert_eq!(ctx.counters().tx_underflow(), 0);
        assert_eq!(ctx.counters().rx_overflow(), 0);
    }

    #[test]
    fn irq_failure_leaves_device_closed() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        irq.set_refuse(true);

        assert!(matches!(driver.open(), Err(PcmError::Busy)));
        assert!(!driver.is_open());
        assert_eq!(driver.usage_count(), 0);

        irq.set_refuse(false);
        assert!(driver.open().is_ok());
    }

    #[test]
    fn interrupt_ignored_without_session() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);

        assert_eq!(driver.on_interrupt(), IrqReturn::None);
        let _s = driver.open().unwrap();
        assert_eq!(driver.on_interrupt(), IrqReturn::Handled);
    }

    #[test]
    fn write_stores_what_fits() {
        let ctx = context(); // capacity 31
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        let mut s = driver.open().unwrap();

        assert_eq!(s.write(&[1; 20]), Ok(20));
        assert_eq!(s.write(&[2; 20]), Ok(11));
        assert_eq!(s.command(Command::TxBufferSpace), Ok(0));
        assert_eq!(s.write(&[3]), Err(PcmError::WouldBlock));
        assert_eq!(ctx.tx_ring().item_count(), 31);
    }

    #[test]
    fn read_drains_low_bytes() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        let mut s = driver.open().unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(s.read(&mut buf), 0);

        for w in [0x0000_0110, 0x22, 0x33] {
            ctx.rx_ring().try_write(w).unwrap();
        }
        assert_eq!(s.ioctl(PCM_RX_BUFF_ITEMS, 0), Ok(3));
        assert_eq!(s.read(&mut buf[..2]), 2);
        assert_eq!(buf[..2], [0x10, 0x22]);
        assert_eq!(s.read(&mut buf), 1);
        assert_eq!(buf[0], 0x33);
    }

    #[test]
    fn enable_commands_toggle_bits() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        let mut s = driver.open().unwrap();
        let cs_now = || ctx.regs().bus().register(Reg::Cs);

        s.ioctl(PCM_SET_TXON, 1).unwrap();
        s.command(Command::SetRxOn(true)).unwrap();
        assert_eq!(cs_now() & (cs::TXON | cs::RXON), cs::TXON | cs::RXON);

        s.command(Command::SetRxOn(false)).unwrap();
        assert_eq!(cs_now() & cs::RXON, 0);

        s.command(Command::SetEnable(false)).unwrap();
        assert_eq!(cs_now() & cs::EN, 0);

        assert_eq!(s.ioctl(PCM_SET_TXON, 2), Err(PcmError::InvalidArgument));
        assert_eq!(s.ioctl(0xDEAD, 0), Err(PcmError::InvalidArgument));
    }

    #[test]
    fn fifo_clear_disables_interface_first() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        let mut s = driver.open().unwrap();
        let sim = ctx.regs().bus();

        sim.push_tx_fifo(5);
        s.command(Command::ClearTxFifo).unwrap();
        s.command(Command::ClearRxFifo).unwrap();

        assert_eq!(sim.tx_fifo_len(), 0);
        assert_eq!(sim.fifo_clears(), (2, 2));
        assert_eq!(sim.clears_while_enabled(), 0);
        assert!(sim.register(Reg::Cs) & cs::EN != 0);
    }

    #[test]
    fn buffer_clears_empty_rings() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        let mut s = driver.open().unwrap();

        s.write(&[9; 5]).unwrap();
        ctx.rx_ring().try_write(1).unwrap();
        s.command(Command::ClearTxBuffer).unwrap();
        s.command(Command::ClearRxBuffer).unwrap();

        assert_eq!(s.command(Command::TxBufferSpace), Ok(31));
        assert_eq!(s.command(Command::RxBufferItems), Ok(0));
    }

    #[test]
    fn tx_buffer_clear_holds_off_running_engine() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        let mut s = driver.open().unwrap();
        s.command(Command::SetTxOn(true)).unwrap();

        let running = AtomicBool::new(true);
        let mut leftovers = 0;
        std::thread::scope(|scope| {
            scope.spawn(|| {
                let sim = ctx.regs().bus();
                while running.load(Ordering::Acquire) {
                    sim.tick();
                    let _ = driver.on_interrupt();
                }
            });

            for _ in 0..2_000 {
                let _ = s.write(&[1; 20]);
                s.command(Command::ClearTxBuffer).unwrap();
                // The engine only drains TX, so nothing can reappear.
                if s.command(Command::TxBufferSpace) != Ok(31) {
                    leftovers += 1;
                }
            }
            running.store(false, Ordering::Release);
        });

        assert_eq!(leftovers, 0);
    }

    #[test]
    fn pending_faults_are_consumed_by_next_command() {
        let ctx = context();
        let irq = SoftIrq::new();
        let driver = install(&ctx, &irq);
        let mut s = driver.open().unwrap();

        ctx.faults().raise(crate::engine::Direction::Tx);
        s.command(Command::TxBufferSpace).unwrap();

        assert!(ctx.faults().peek().is_empty());
        assert_eq!(ctx.faults().total(), 1);
    }
}
