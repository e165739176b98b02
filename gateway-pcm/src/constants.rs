/// Number of samples per call-audio frame (20 ms at 8 kHz).
pub const FRAME_SAMPLES: usize = 160;

/// Width of one sample on the byte-stream interface.
pub const BYTES_PER_SAMPLE: usize = 1;

/// Usable capacity of each software sample ring.
pub const SAMPLE_BUFFER_LEN: usize = 16_000;

/// Backing slots of each software sample ring (one slot is the full/empty sentinel).
pub const SAMPLE_BUFFER_SLOTS: usize = SAMPLE_BUFFER_LEN + 1;

/// Depth of each hardware FIFO in 32-bit words.
pub const HW_FIFO_DEPTH: usize = 64;

/// Maximum samples moved per direction in one service-routine invocation.
pub const DEFAULT_BATCH_LIMIT: u32 = 64;

/// Consecutive starved/saturated service cycles before a direction is shut down.
pub const DEFAULT_ERROR_THRESHOLD: u32 = 1_000_000;

/// Hardware latency budget after a FIFO clear request (two PCM clocks at 3.072 MHz, rounded up).
pub const DEFAULT_FIFO_CLEAR_SETTLE_NS: u32 = 1_000;

/// Settle time the call session waits after clearing the FIFOs.
pub const DEFAULT_CALL_SETTLE_NS: u32 = 5_000;

/// Offset of the PCM/I2S register block from the peripheral base.
pub const PCM_OFFSET: usize = 0x0020_3000;

/// Size of the PCM/I2S register block in bytes.
pub const PCM_SIZE: usize = 0x24;

/// Offset of the clock manager from the peripheral base.
pub const CLOCK_OFFSET: usize = 0x0010_1000;

/// Name the driver registers its memory region and interrupt under.
pub const DEVICE_NAME: &str = "bcm2835_pcm";
