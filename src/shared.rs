//! Interrupt-safe global slot for a driver.
//!
//! [`SharedE220`] wraps `critical_section::Mutex<RefCell<Option<E220>>>` so a
//! driver can live in a `static` and be used from both the main loop and an
//! interrupt handler. Each [`with`](SharedE220::with) call runs inside one
//! critical section, which makes a whole session (for example a
//! `read_parameters` exchange) a single exclusive-access scope.
//!
//! ## Example
//!
//! ```rust,ignore
//! use e220::shared::SharedE220;
//!
//! static RADIO: SharedE220<Uart, M0, M1, Aux, Delay> = SharedE220::new();
//!
//! fn main() {
//!     RADIO.install(E220::new(uart, m0, m1, Some(aux), delay));
//!     RADIO.with(|radio| radio.init());
//! }
//!
//! #[interrupt]
//! fn USART1() {
//!     let _ = RADIO.with(|radio| radio.get_byte());
//! }
//! ```

use core::cell::RefCell;
use core::fmt;
use critical_section::Mutex;

use crate::driver::E220;
use crate::transport::NoBaudControl;

/// A global, lazily installed [`E220`].
pub struct SharedE220<T, M0, M1, AUX, D, B = NoBaudControl> {
    slot: Mutex<RefCell<Option<E220<T, M0, M1, AUX, D, B>>>>,
}

impl<T, M0, M1, AUX, D, B> SharedE220<T, M0, M1, AUX, D, B> {
    /// An empty slot, usable in a `static` initializer.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Stores `driver`, returning the one it replaces.
    pub fn install(&self, driver: E220<T, M0, M1, AUX, D, B>) -> Option<E220<T, M0, M1, AUX, D, B>> {
        critical_section::with(|cs| self.slot.borrow(cs).replace(Some(driver)))
    }

    /// Removes the driver, leaving the slot empty.
    pub fn take(&self) -> Option<E220<T, M0, M1, AUX, D, B>> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }

    /// True when a driver is installed.
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).borrow().is_some())
    }

    /// Runs `f` on the installed driver inside a critical section.
    ///
    /// Returns `None` when the slot is empty.
    pub fn with<R>(&self, f: impl FnOnce(&mut E220<T, M0, M1, AUX, D, B>) -> R) -> Option<R> {
        critical_section::with(|cs| self.slot.borrow(cs).borrow_mut().as_mut().map(f))
    }
}

impl<T, M0, M1, AUX, D, B> fmt::Debug for SharedE220<T, M0, M1, AUX, D, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedE220").finish_non_exhaustive()
    }
}

impl<T, M0, M1, AUX, D, B> Default for SharedE220<T, M0, M1, AUX, D, B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::tests::{TestRadio, finish, radio};
    use crate::mode::Mode;
    use crate::transport::mock::{MockTransport, RecordingDelay};
    use embedded_hal_mock::eh1::digital::Mock as PinMock;

    type SharedRadio = SharedE220<MockTransport, PinMock, PinMock, PinMock, RecordingDelay>;

    #[test]
    fn test_empty_slot() {
        let shared = SharedRadio::new();
        assert!(!shared.is_installed());
        assert_eq!(shared.with(|radio| radio.available()), None);
        assert!(shared.take().is_none());
    }

    #[test]
    fn test_session_through_slot() {
        let shared = SharedRadio::new();
        let mut link = MockTransport::new();
        link.reply(&[0xC1, 0x00, 0x06, 0x00, 0x09, 0x62, 0x00, 0x11, 0x03]);
        assert!(shared.install(radio(link, &[Mode::Program, Mode::Normal])).is_none());

        let result = shared.with(|radio| radio.read_parameters());
        assert_eq!(result, Some(Ok(())));
        assert_eq!(shared.with(|radio| radio.config().channel), Some(0x11));

        let radio: TestRadio = shared.take().unwrap();
        assert!(!shared.is_installed());
        let _ = finish(radio);
    }
}
