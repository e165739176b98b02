//! Frame echo: a call over the simulated PCM block in loopback.
//!
//! A "line clock" thread ticks the simulated hardware at 8 kHz and runs the
//! interrupt handler whenever the block raises an interrupt. The main
//! thread starts a call, writes one frame every 15 ms with a rolling
//! counter in sample 0 and logs the counters that come back.
//!
//! ```text
//!   main: CallSession ─► DeviceSession ─► TX ring
//!   clock thread: tick ─► on_interrupt ─► FIFO ⇄ rings (loopback wire)
//!   main: RX ring ─► DeviceSession ─► CallSession ─► log
//! ```
//!
//! `RUST_LOG=debug cargo run -p gateway-pcm-demos --bin frame_echo`
//! Set `FRAME_ECHO_FRAMES` to change how many frames are sent (default 100).

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use gateway_pcm::prelude::*;
use gateway_pcm::sim::{ScratchRegisters, SimulatedPcm, SoftIrq};
use tracing_subscriber::EnvFilter;

/// Frames per 1 ms wake-up of the line clock (8 kHz).
const TICKS_PER_MS: usize = 8;

/// Interval between transmitted frames.
const WRITE_PERIOD: Duration = Duration::from_millis(15);

/// Clock manager window: up to and including CM_PCMDIV.
const CLOCK_WORDS: usize = 0x28;

/// Sleep-based `DelayNs`.
struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let frames: u32 = std::env::var("FRAME_ECHO_FRAMES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);

    let clock_regs = ScratchRegisters::<CLOCK_WORDS>::new();
    let mut clock = ClockManager::new(&clock_regs, StdDelay);
    clock.clock_up();

    let ctx: Box<PcmContext<SimulatedPcm>> =
        Box::new(PcmContext::new(SimulatedPcm::new(), TransferConfig::reference()));
    ctx.regs().bus().set_loopback(true);

    let irq = SoftIrq::new();
    let driver = PcmDriver::install(&*ctx, &irq, StdDelay, DriverConfig::reference())?;
    let running = AtomicBool::new(true);

    thread::scope(|s| -> Result<(), PcmError> {
        s.spawn(|| line_clock(&driver, &running));

        let result = echo(&driver, frames);
        running.store(false, Ordering::Release);
        result
    })?;

    let _ = driver.remove();
    clock.clock_down();
    Ok(())
}

/// Tick the simulated block in real time until told to stop.
fn line_clock<I: InterruptLine, D: DelayNs>(
    driver: &PcmDriver<'_, SimulatedPcm, I, D>,
    running: &AtomicBool,
) {
    let sim = driver.context().regs().bus();
    while running.load(Ordering::Acquire) {
        for _ in 0..TICKS_PER_MS {
            sim.tick();
            if sim.irq_pending() {
                driver.on_interrupt();
            }
        }
        thread::sleep(Duration::from_millis(1));
    }
}

fn echo<I: InterruptLine, D: DelayNs>(
    driver: &PcmDriver<'_, SimulatedPcm, I, D>,
    frames: u32,
) -> Result<(), PcmError> {
    let mut call = CallSession::start(driver, &mut StdDelay, CallConfig::reference())?;

    let mut counter: u32 = 0;
    let mut echoed: u32 = 0;
    let mut frame: Frame = [0; 160];

    while counter < frames {
        // Counter 0 would be indistinguishable from silence.
        frame[0] = (counter % 255 + 1) as u8;
        match call.write_frame(&frame) {
            Ok(()) => {
                tracing::debug!("sent frame {}", frame[0]);
                counter += 1;
            }
            Err(PcmError::WouldBlock) => tracing::debug!("TX ring full, retrying"),
            Err(e) => return Err(e),
        }

        while let Some(rx) = call.read_frame()? {
            if let Some(pos) = rx.iter().position(|&b| b != 0) {
                echoed += 1;
                tracing::info!("echo of frame {} at offset {}", rx[pos], pos);
            }
        }

        thread::sleep(WRITE_PERIOD);
    }

    tracing::info!(
        "sent {} frames, {} echoed, tx space {}, rx backlog {}",
        counter,
        echoed,
        call.tx_space()?,
        call.rx_items()?
    );
    call.stop()
}
