//! Byte-stream and baud-rate seams between the driver and the HAL.
//!
//! The module speaks plain UART. The driver needs slightly more than
//! `embedded-io` offers: a count of buffered bytes, and reads that give up
//! after the HAL's own timeout and report what they got. [`Transport`]
//! captures exactly that, and [`BaudRateControl`] lets the driver retune
//! the UART when it enters or leaves PROGRAM mode.

/// Serial stream connected to the module's RXD/TXD lines.
///
/// Implementations own the timeout policy of [`read`](Transport::read): it
/// should block until `buf` is full or the stream's read timeout expires, and
/// report how many bytes were stored.
pub trait Transport {
    /// Writes `bytes` and returns how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Fills `buf` as far as possible and returns the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Number of bytes that can be read without blocking.
    fn available(&mut self) -> usize;

    /// Blocks until all written bytes have left the UART.
    fn flush(&mut self);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> usize {
        T::write(self, bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        T::read(self, buf)
    }

    fn available(&mut self) -> usize {
        T::available(self)
    }

    fn flush(&mut self) {
        T::flush(self)
    }
}

/// Strategy used to change the UART line rate on the MCU side.
///
/// Any `FnMut(u32)` closure works.
pub trait BaudRateControl {
    /// Reconfigures the UART to `baud` bits per second.
    fn set_baud_rate(&mut self, baud: u32);
}

impl<F: FnMut(u32)> BaudRateControl for F {
    fn set_baud_rate(&mut self, baud: u32) {
        self(baud)
    }
}

/// Placeholder baud strategy type for drivers built without one.
pub type NoBaudControl = fn(u32);

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted serial link and clock for unit tests.
    #![allow(dead_code)]

    use super::Transport;
    use embedded_hal::delay::DelayNs;
    use std::collections::VecDeque;

    /// A serial link whose module side is scripted by the test.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        /// Bytes waiting to be read by the driver.
        pub rx: VecDeque<u8>,
        /// Everything the driver wrote.
        pub tx: Vec<u8>,
        /// Replies released into `rx`, one per `write` call.
        pub replies: VecDeque<Vec<u8>>,
        /// Accept at most this many bytes per write.
        pub write_limit: Option<usize>,
        /// Number of `read` calls.
        pub reads: usize,
        /// Number of `flush` calls.
        pub flushes: usize,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues bytes as if the module had already sent them.
        pub fn preload(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes.iter().copied());
        }

        /// Queues a reply that appears after the next write.
        pub fn reply(&mut self, bytes: &[u8]) {
            self.replies.push_back(bytes.to_vec());
        }
    }

    impl Transport for MockTransport {
        fn write(&mut self, bytes: &[u8]) -> usize {
            let accepted = self.write_limit.map_or(bytes.len(), |l| l.min(bytes.len()));
            self.tx.extend_from_slice(&bytes[..accepted]);
            if let Some(reply) = self.replies.pop_front() {
                self.rx.extend(reply);
            }
            accepted
        }

        fn read(&mut self, buf: &mut [u8]) -> usize {
            self.reads += 1;
            let mut n = 0;
            while n < buf.len() {
                match self.rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            n
        }

        fn available(&mut self) -> usize {
            self.rx.len()
        }

        fn flush(&mut self) {
            self.flushes += 1;
        }
    }

    /// A delay that returns immediately and remembers what it was asked for.
    #[derive(Debug, Default)]
    pub struct RecordingDelay {
        /// Millisecond delays in call order.
        pub ms: Vec<u32>,
        /// Total requested time in nanoseconds.
        pub total_ns: u64,
    }

    impl RecordingDelay {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn total_ms(&self) -> u64 {
            self.total_ns / 1_000_000
        }
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.ms.push(ms);
            self.total_ns += u64::from(ms) * 1_000_000;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;

    fn exchange<T: Transport>(mut link: T) -> usize {
        let _ = link.write(&[0xC1, 0x00, 0x06]);
        let mut buf = [0u8; 4];
        link.read(&mut buf)
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut link = MockTransport::new();
        link.reply(&[1, 2, 3]);
        assert_eq!(exchange(&mut link), 3);
        assert_eq!(link.tx, [0xC1, 0x00, 0x06]);
        assert_eq!(link.available(), 0);
    }

    #[test]
    fn test_closure_as_baud_control() {
        let mut seen = 0u32;
        {
            let mut control = |baud: u32| seen = baud;
            control.set_baud_rate(115_200);
        }
        assert_eq!(seen, 115_200);
    }
}
