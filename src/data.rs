//! Transparent data transfer and RSSI readout.
//!
//! In NORMAL (and WOR) mode the module forwards whatever the UART delivers
//! over the air and hands received payloads back over the UART. These
//! methods are thin wrappers that add the AUX handshake after each transfer
//! and pick up the optional trailing RSSI byte.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::consts::{RSSI_AMBIENT_OFFSET, RSSI_LAST_RECEIVE_OFFSET, RSSI_QUERY, RSSI_REPLY_LEN};
use crate::driver::E220;
use crate::error::{Error, Precondition};
use crate::mode::Mode;
use crate::transport::{BaudRateControl, Transport};

/// Converts a raw RSSI register value to dBm.
///
/// Register values are `0..=255`. Anything outside the `i16` range after the
/// offset saturates.
///
/// ```rust
/// assert_eq!(e220::data::noise_dbm(0), -256);
/// assert_eq!(e220::data::noise_dbm(200), -56);
/// ```
pub const fn noise_dbm(raw: i16) -> i16 {
    raw.saturating_sub(256)
}

/// Signal strength samples reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Rssi {
    /// Raw RSSI sample shared by two sources, whichever wrote last:
    /// the ambient noise reading from [`query_rssi`](E220::query_rssi), or
    /// the trailing RSSI byte of a payload taken by
    /// [`receive`](E220::receive) (then [`available`](Self::available) is set).
    pub ambient: u8,
    /// Signal strength of the last received packet.
    pub last_receive: u8,
    /// Set when the last [`receive`](E220::receive) captured a trailing byte.
    pub available: bool,
}

impl Rssi {
    /// [`ambient`](Self::ambient) in dBm.
    pub const fn ambient_dbm(&self) -> i16 {
        noise_dbm(self.ambient as i16)
    }

    /// [`last_receive`](Self::last_receive) in dBm.
    pub const fn last_receive_dbm(&self) -> i16 {
        noise_dbm(self.last_receive as i16)
    }
}

impl<T, M0, M1, AUX, D, B> E220<T, M0, M1, AUX, D, B>
where
    T: Transport,
    M0: OutputPin,
    M1: OutputPin,
    AUX: InputPin,
    D: DelayNs,
    B: BaudRateControl,
{
    /// Transmits `payload` and waits for the module to go idle.
    ///
    /// In fixed transmission mode the first three bytes must be the target
    /// address and channel.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        let written = self.transport.write(payload);
        let timeout = self.ctrl.timings().data_aux_timeout_ms;
        self.ctrl.wait_ready(timeout)?;
        Error::check_write(payload.len(), written)
    }

    /// Fills `buf` with a received payload.
    ///
    /// When the trailing RSSI byte is enabled in the staged configuration, a
    /// byte arriving right after the payload is stored in
    /// [`rssi`](Self::rssi) and flagged as available.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        self.rssi.available = false;
        let received = self.transport.read(buf);

        if self.config.rssi_byte() {
            let window = self.ctrl.timings().rssi_byte_window_ms;
            if self.ctrl.wait_available(&mut self.transport, window) {
                let mut byte = [0u8; 1];
                if self.transport.read(&mut byte) == 1 {
                    self.rssi.ambient = byte[0];
                    self.rssi.available = true;
                }
            }
        }

        let timeout = self.ctrl.timings().data_aux_timeout_ms;
        self.ctrl.wait_ready(timeout)?;
        Error::check_read(buf.len(), received)
    }

    /// Receives a `len` byte payload into an owned buffer.
    ///
    /// Fails with [`Error::BufferTooSmall`] without touching the transport
    /// when `len` exceeds the capacity `N`.
    pub fn receive_packet<const N: usize>(&mut self, len: usize) -> Result<Vec<u8, N>, Error> {
        let mut packet = Vec::new();
        packet
            .resize_default(len)
            .map_err(|_| Error::BufferTooSmall {
                requested: len,
                capacity: N,
            })?;
        self.receive(&mut packet)?;
        Ok(packet)
    }

    /// Writes a single byte without waiting for AUX.
    pub fn send_byte(&mut self, byte: u8) -> Result<(), Error> {
        Error::check_write(1, self.transport.write(&[byte]))
    }

    /// Reads one byte if one is buffered.
    pub fn get_byte(&mut self) -> nb::Result<u8, Error> {
        if self.transport.available() == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let mut byte = [0u8; 1];
        match self.transport.read(&mut byte) {
            1 => Ok(byte[0]),
            _ => Err(nb::Error::WouldBlock),
        }
    }

    /// Number of received bytes waiting in the transport.
    pub fn available(&mut self) -> usize {
        self.transport.available()
    }

    /// Blocks until the transport has sent everything.
    pub fn flush(&mut self) {
        self.transport.flush();
    }

    /// Asks the module for its ambient noise and last-packet RSSI.
    ///
    /// Requires ambient noise detection in the staged configuration and the
    /// module in NORMAL mode. Neither condition is checked against the module
    /// itself; nothing is sent when either fails.
    pub fn query_rssi(&mut self) -> Result<Rssi, Error> {
        if !self.config.ambient_noise() {
            return Err(Precondition::AmbientNoiseDisabled.into());
        }
        if self.ctrl.last_mode() != Some(Mode::Normal) {
            return Err(Precondition::NotInNormalMode.into());
        }

        let timings = *self.ctrl.timings();
        if let Err(err) = self.send(&RSSI_QUERY) {
            self.ctrl.wait_ready(timings.mode_aux_timeout_ms)?;
            return Err(err);
        }
        self.ctrl.delay_ms(timings.reply_delay_ms);

        let mut reply = [0u8; RSSI_REPLY_LEN];
        let received = self.transport.read(&mut reply);
        if received == reply.len() {
            self.rssi.ambient = reply[RSSI_AMBIENT_OFFSET];
            self.rssi.last_receive = reply[RSSI_LAST_RECEIVE_OFFSET];
            trace!("rssi ambient {} last {}", self.rssi.ambient, self.rssi.last_receive);
        }
        self.ctrl.wait_ready(timings.mode_aux_timeout_ms)?;

        Error::check_read(reply.len(), received)?;
        Ok(self.rssi)
    }
}
