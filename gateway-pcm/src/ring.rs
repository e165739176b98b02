//! Lock-free single-producer single-consumer sample ring.
//!
//! Decouples the transfer engine (interrupt context) from the device session
//! (process context). Each ring has exactly one writer domain and one reader
//! domain:
//!
//! | Ring | Writer            | Reader            |
//! |------|-------------------|-------------------|
//! | TX   | device session    | transfer engine   |
//! | RX   | transfer engine   | device session    |
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`try_write()`](SampleRing::try_write).
//! - Only ONE context may call [`try_read()`](SampleRing::try_read).
//! - [`clear()`](SampleRing::clear) touches both indices; the opposite
//!   domain must be quiesced (direction disabled) while it runs.
//!
//! Slots are atomics, so breaking the contract loses or duplicates samples
//! but is never undefined behaviour.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Returned by [`SampleRing::try_write`] when no slot is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Full(pub u32);

/// Fixed-capacity circular buffer of 32-bit samples.
///
/// The usable capacity is `SLOTS - 1`; one slot distinguishes full from
/// empty.
pub struct SampleRing<const SLOTS: usize> {
    slots: [AtomicU32; SLOTS],
    /// Next slot to write (advanced by the writer only).
    head: AtomicUsize,
    /// Next slot to read (advanced by the reader only).
    tail: AtomicUsize,
}

impl<const SLOTS: usize> SampleRing<SLOTS> {
    /// Create an empty ring.
    pub const fn new() -> Self {
        assert!(SLOTS >= 2, "sample ring needs at least 2 slots (1 usable)");

        SampleRing {
            slots: [const { AtomicU32::new(0) }; SLOTS],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Usable capacity in samples.
    pub const fn capacity(&self) -> usize {
        SLOTS - 1
    }

    /// Append a sample (writer side).
    pub fn try_write(&self, sample: u32) -> Result<(), Full> {
        let head = self.head.load(Ordering::Relaxed);
        let next_head = (head + 1) % SLOTS;

        if next_head == self.tail.load(Ordering::Acquire) {
            return Err(Full(sample));
        }

        self.slots[head].store(sample, Ordering::Relaxed);
        // Publish the slot before the index.
        self.head.store(next_head, Ordering::Release);
        Ok(())
    }

    /// Remove the oldest sample (reader side).
    pub fn try_read(&self) -> Option<u32> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        let sample = self.slots[tail].load(Ordering::Relaxed);
        self.tail.store((tail + 1) % SLOTS, Ordering::Release);
        Some(sample)
    }

    /// Samples currently stored.
    pub fn item_count(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + SLOTS - tail) % SLOTS
    }

    /// Free slots, `capacity() - item_count()`.
    pub fn remaining_space(&self) -> usize {
        self.capacity() - self.item_count()
    }

    /// Whether no sample is stored.
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    /// Whether every usable slot is occupied.
    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + 1) % SLOTS == tail
    }

    /// Drop every stored sample.
    ///
    /// The two index stores are not atomic together: the producer and
    /// consumer must both be held off while this runs.
    pub fn clear(&self) {
        self.tail.store(0, Ordering::Release);
        self.head.store(0, Ordering::Release);
    }
}

impl<const SLOTS: usize> Default for SampleRing<SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_ring_hands_back_rejected_sample() {
        let r: SampleRing<4> = SampleRing::new(); // capacity 3
        assert_eq!(r.try_read(), None);
        assert_eq!(r.remaining_space(), 3);

        for (i, s) in [0x10, 0x20, 0x30].into_iter().enumerate() {
            r.try_write(s).unwrap();
            assert_eq!(r.item_count(), i + 1);
            assert_eq!(r.remaining_space(), 2 - i);
        }
        assert!(r.is_full());
        assert_eq!(r.try_write(0x40), Err(Full(0x40)));
        assert_eq!(r.item_count(), 3);

        // Draining one slot makes room for exactly one more.
        assert_eq!(r.try_read(), Some(0x10));
        assert_eq!(r.try_write(0x40), Ok(()));
        assert_eq!(r.try_write(0x50), Err(Full(0x50)));
    }

    #[test]
    fn two_slot_ring_holds_one_sample() {
        let r: SampleRing<2> = SampleRing::new();
        assert_eq!(r.capacity(), 1);
        assert!(r.is_empty() && !r.is_full());

        for s in 0..5 {
            r.try_write(s).unwrap();
            assert!(r.is_full());
            assert_eq!(r.remaining_space(), 0);
            assert_eq!(r.try_read(), Some(s));
        }
        assert!(r.is_empty());
    }

    #[test]
    fn space_accounting_across_wrap() {
        let r: SampleRing<5> = SampleRing::new(); // capacity 4

        // Park head and tail near the end so the next writes wrap.
        for s in 0..3 {
            r.try_write(s).unwrap();
        }
        for _ in 0..3 {
            r.try_read();
        }

        // head wraps past tail's index: 3, 4, 0, 1.
        let mut queued = 0;
        for s in 100..104 {
            r.try_write(s).unwrap();
            queued += 1;
            assert_eq!(r.item_count(), queued);
            assert_eq!(r.remaining_space(), 4 - queued);
        }
        assert!(r.is_full());

        assert_eq!(r.try_read(), Some(100));
        assert_eq!(r.try_read(), Some(101));
        assert_eq!(r.item_count(), 2);
        assert_eq!(r.remaining_space(), 2);

        // Clearing with wrapped indices restarts from an empty ring.
        r.clear();
        assert_eq!(r.remaining_space(), 4);
        r.try_write(7).unwrap();
        assert_eq!(r.item_count(), 1);
        assert_eq!(r.try_read(), Some(7));
        assert_eq!(r.try_read(), None);
    }

    #[test]
    fn clear_empties_after_wrap() {
        let r: SampleRing<5> = SampleRing::new();
        for i in 0..3 {
            r.try_write(i).unwrap();
        }
        r.try_read();
        r.try_read();
        r.try_write(7).unwrap();
        r.try_write(8).unwrap();

        r.clear();
        assert!(r.is_empty());
        assert_eq!(r.item_count(), 0);
        assert_eq!(r.remaining_space(), 4);
        assert_eq!(r.try_read(), None);
    }

    #[test]
    fn reference_capacity_matches_buffer_len() {
        let r: std::boxed::Box<SampleRing<{ crate::constants::SAMPLE_BUFFER_SLOTS }>> =
            std::boxed::Box::new(SampleRing::new());
        assert_eq!(r.capacity(), crate::constants::SAMPLE_BUFFER_LEN);
        assert_eq!(r.remaining_space(), 16_000);
    }

    #[test]
    fn concurrent_writer_and_reader_preserve_order() {
        use std::sync::Arc;

        let r: Arc<SampleRing<64>> = Arc::new(SampleRing::new());
        let writer = {
            let r = Arc::clone(&r);
            std::thread::spawn(move || {
                let mut next = 0u32;
                while next < 10_000 {
                    if r.try_write(next).is_ok() {
                        next += 1;
                    }
                }
            })
        };

        let mut expected = 0u32;
        while expected < 10_000 {
            if let Some(s) = r.try_read() {
                assert_eq!(s, expected);
                expected += 1;
            }
        }
        writer.join().unwrap();
        assert!(r.is_empty());
    }
}
