//! Error types returned by the driver.
//!
//! None of these are fatal. The staged configuration survives every failure
//! and the caller may simply retry the whole session.

use embedded_hal::digital::ErrorKind;
use thiserror::Error;

/// Why an operation refused to talk to the module.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Precondition {
    /// RSSI registers are only readable with ambient noise detection enabled.
    #[error("ambient noise detection is disabled")]
    AmbientNoiseDisabled,
    /// The module must be in NORMAL mode.
    #[error("module is not in normal mode")]
    NotInNormalMode,
}

/// Errors reported by [`E220`](crate::driver::E220) operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// The transport accepted fewer bytes than requested.
    #[error("short write: {written} of {expected} bytes accepted")]
    ShortWrite {
        /// Bytes handed to the transport.
        expected: usize,
        /// Bytes the transport reported as written.
        written: usize,
    },
    /// The transport returned fewer bytes than requested.
    #[error("short read: {received} of {expected} bytes received")]
    ShortRead {
        /// Bytes requested.
        expected: usize,
        /// Bytes actually received.
        received: usize,
    },
    /// A receive was asked for more bytes than the buffer can hold.
    #[error("requested {requested} bytes, buffer holds {capacity}")]
    BufferTooSmall {
        /// Bytes requested.
        requested: usize,
        /// Capacity of the buffer.
        capacity: usize,
    },
    /// The module answered with an unexpected command byte.
    #[error("module echoed command {received:#04x}, expected {expected:#04x}")]
    EchoMismatch {
        /// The marker that should have come back.
        expected: u8,
        /// The byte that did.
        received: u8,
    },
    /// The operation's required mode or feature flag is not set.
    #[error("precondition not met: {0}")]
    Precondition(Precondition),
    /// A mode or AUX pin could not be driven or read.
    #[error("pin error: {0:?}")]
    Pin(ErrorKind),
}

impl Error {
    /// Converts any `embedded-hal` digital error into [`Error::Pin`].
    pub(crate) fn pin<E: embedded_hal::digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }

    /// Compares a requested and a reported write count.
    pub(crate) fn check_write(expected: usize, written: usize) -> Result<(), Self> {
        if written == expected {
            Ok(())
        } else {
            warn!("short write: {} of {} bytes accepted", written, expected);
            Err(Error::ShortWrite { expected, written })
        }
    }

    /// Compares a requested and a reported read count.
    pub(crate) fn check_read(expected: usize, received: usize) -> Result<(), Self> {
        if received == expected {
            Ok(())
        } else {
            warn!("short read: {} of {} bytes received", received, expected);
            Err(Error::ShortRead { expected, received })
        }
    }
}

impl From<Precondition> for Error {
    fn from(value: Precondition) -> Self {
        Error::Precondition(value)
    }
}
