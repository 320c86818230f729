//! M0/M1 mode switching and AUX handshaking.
//!
//! The module samples its M0 and M1 inputs to pick an operating mode and
//! pulls AUX low while it is busy. Every mode change goes through
//! [`ModeController::set_mode`]. It drains whatever the module chattered
//! during the switch and waits for AUX before recording the new mode.
//!
//! AUX waits never fail. Some boards tie AUX high through a pull-up or leave
//! it floating low, so a timeout simply logs and carries on. Callers that
//! need to detect a dead module should read the configuration back.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::config::Timings;
use crate::consts::PROGRAM_BAUD;
use crate::error::Error;
use crate::registers::UartBaudRate;
use crate::transport::{BaudRateControl, NoBaudControl, Transport};

/// Operating mode selected by the M0/M1 pins.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Mode {
    /// M0 = 0, M1 = 0. UART open, radio transmits and receives.
    #[default]
    Normal,
    /// M0 = 1, M1 = 0. Transmissions are prefixed with a wake-up preamble.
    WorTransmit,
    /// M0 = 0, M1 = 1. Radio listens on the WOR cycle; transmit is disabled.
    WorReceive,
    /// M0 = 1, M1 = 1. Radio off, UART accepts programming frames at 9600 8N1.
    Program,
}

impl Mode {
    /// Deep sleep shares the programming pin pattern.
    pub const DEEP_SLEEP: Mode = Mode::Program;

    /// Pin levels as `(M0, M1)`.
    pub const fn pins(self) -> (PinState, PinState) {
        match self {
            Mode::Normal => (PinState::Low, PinState::Low),
            Mode::WorTransmit => (PinState::High, PinState::Low),
            Mode::WorReceive => (PinState::Low, PinState::High),
            Mode::Program => (PinState::High, PinState::High),
        }
    }
}

/// Drain cap in bytes per second: what a 115200 baud 8N1 line can deliver.
const MAX_LINE_BYTES_PER_SEC: u32 = 115_200 / 10;

/// Owns the mode pins, the optional AUX input and the delay source.
///
/// ## Type Parameters
///
/// - `M0`, `M1`: mode select outputs
/// - `AUX`: busy input, high when the module is idle
/// - `D`: delay provider, also used as the clock for every timeout
/// - `B`: baud strategy, see [`BaudRateControl`]
#[derive(Debug)]
pub struct ModeController<M0, M1, AUX, D, B = NoBaudControl> {
    m0: M0,
    m1: M1,
    aux: Option<AUX>,
    delay: D,
    baud: Option<B>,
    current_baud: UartBaudRate,
    last_mode: Option<Mode>,
    timings: Timings,
}

impl<M0, M1, AUX, D> ModeController<M0, M1, AUX, D, NoBaudControl>
where
    M0: OutputPin,
    M1: OutputPin,
    AUX: InputPin,
    D: DelayNs,
{
    /// Creates a controller without automatic baud switching.
    ///
    /// The pins are left untouched until the first [`set_mode`](Self::set_mode).
    pub fn new(m0: M0, m1: M1, aux: Option<AUX>, delay: D) -> Self {
        Self {
            m0,
            m1,
            aux,
            delay,
            baud: None,
            current_baud: UartBaudRate::Baud9600,
            last_mode: None,
            timings: Timings::default(),
        }
    }
}

impl<M0, M1, AUX, D, B> ModeController<M0, M1, AUX, D, B>
where
    M0: OutputPin,
    M1: OutputPin,
    AUX: InputPin,
    D: DelayNs,
    B: BaudRateControl,
{
    /// Registers a strategy that retunes the MCU UART around PROGRAM mode.
    pub fn with_baud_control<B2: BaudRateControl>(
        self,
        control: B2,
    ) -> ModeController<M0, M1, AUX, D, B2> {
        ModeController {
            m0: self.m0,
            m1: self.m1,
            aux: self.aux,
            delay: self.delay,
            baud: Some(control),
            current_baud: self.current_baud,
            last_mode: self.last_mode,
            timings: self.timings,
        }
    }

    /// Replaces the delay and timeout table.
    pub fn set_timings(&mut self, timings: Timings) {
        self.timings = timings;
    }

    /// The active delay and timeout table.
    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// The last mode set, or `None` before the first transition.
    pub fn last_mode(&self) -> Option<Mode> {
        self.last_mode
    }

    /// True when a baud strategy is registered.
    pub fn auto_baud(&self) -> bool {
        self.baud.is_some()
    }

    /// The UART rate the baud strategy last applied.
    pub fn current_baud(&self) -> UartBaudRate {
        self.current_baud
    }

    /// Puts the MCU UART at the programming rate before the first exchange.
    ///
    /// Returns `false` when no strategy is registered.
    pub(crate) fn reset_baud(&mut self) -> bool {
        match self.baud.as_mut() {
            Some(control) => {
                control.set_baud_rate(PROGRAM_BAUD);
                self.current_baud = UartBaudRate::Baud9600;
                true
            }
            None => false,
        }
    }

    /// Switches the module to `target`.
    ///
    /// `configured` is the staged UART rate; it decides whether the baud
    /// strategy has to run.
    ///
    /// # Sequence
    /// 1. settle delay
    /// 2. drive M0/M1
    /// 3. retune the MCU UART (only with a baud strategy)
    /// 4. settle delay
    /// 5. drain stale input
    /// 6. wait for AUX (or a blind delay without AUX)
    /// 7. record `target`
    pub fn set_mode<T: Transport>(
        &mut self,
        transport: &mut T,
        target: Mode,
        configured: UartBaudRate,
    ) -> Result<(), Error> {
        trace!("set mode {:?}", target);
        self.delay.delay_ms(self.timings.pin_recover_ms);

        let (m0, m1) = target.pins();
        self.m0.set_state(m0).map_err(Error::pin)?;
        self.m1.set_state(m1).map_err(Error::pin)?;

        if let Some(control) = self.baud.as_mut() {
            if target == Mode::Program {
                if configured != UartBaudRate::Baud9600 {
                    control.set_baud_rate(PROGRAM_BAUD);
                    self.current_baud = UartBaudRate::Baud9600;
                }
            } else if self.current_baud != configured {
                control.set_baud_rate(configured.baud());
                self.current_baud = configured;
            }
        }

        self.delay.delay_ms(self.timings.pin_recover_ms);
        let _ = self.clear_buffer(transport);
        self.wait_ready(self.timings.mode_aux_timeout_ms)?;
        self.last_mode = Some(target);
        Ok(())
    }

    /// Reads AUX once. `None` when no AUX pin is wired.
    pub fn aux(&mut self) -> Result<Option<bool>, Error> {
        match self.aux.as_mut() {
            Some(pin) => pin.is_high().map(Some).map_err(Error::pin),
            None => Ok(None),
        }
    }

    /// Non-blocking readiness check: `WouldBlock` while AUX is low.
    ///
    /// Without an AUX pin the module is always assumed ready.
    pub fn poll_ready(&mut self) -> nb::Result<(), Error> {
        match self.aux()? {
            Some(false) => Err(nb::Error::WouldBlock),
            _ => Ok(()),
        }
    }

    /// Waits until AUX goes high or `timeout_ms` elapses, then settles.
    ///
    /// Without an AUX pin this is a fixed blind delay. A timeout is not an
    /// error.
    pub fn wait_ready(&mut self, timeout_ms: u32) -> Result<(), Error> {
        if self.aux.is_some() {
            let mut waited = 0;
            loop {
                match self.poll_ready() {
                    Ok(()) => break,
                    Err(nb::Error::WouldBlock) if waited >= timeout_ms => {
                        warn!("AUX still busy after {} ms, continuing", timeout_ms);
                        break;
                    }
                    Err(nb::Error::WouldBlock) => {
                        self.delay.delay_ms(1);
                        waited += 1;
                    }
                    Err(nb::Error::Other(err)) => return Err(err),
                }
            }
        } else {
            self.delay.delay_ms(self.timings.blind_wait_ms);
        }
        self.delay.delay_ms(self.timings.aux_settle_ms);
        Ok(())
    }

    /// Polls once per millisecond until input is buffered or `timeout_ms` passes.
    pub fn wait_available<T: Transport>(&mut self, transport: &mut T, timeout_ms: u32) -> bool {
        let mut waited = 0;
        loop {
            if transport.available() > 0 {
                return true;
            }
            if waited >= timeout_ms {
                return false;
            }
            self.delay.delay_ms(1);
            waited += 1;
        }
    }

    /// Discards buffered input.
    ///
    /// Gives up once more bytes have been drained than a 115200 baud line
    /// could deliver in `clear_buffer_timeout_ms`, so a stream that never
    /// runs dry cannot stall the driver. Returns the number of bytes dropped.
    ///
    /// The bound is a byte count, not elapsed time. It assumes
    /// [`Transport::read`] returns without blocking once
    /// [`Transport::available`] has reported pending bytes.
    pub fn clear_buffer<T: Transport>(&mut self, transport: &mut T) -> usize {
        let budget = (MAX_LINE_BYTES_PER_SEC as usize)
            .saturating_mul(self.timings.clear_buffer_timeout_ms as usize)
            / 1_000;
        let mut scratch = [0u8; 32];
        let mut dropped = 0;
        loop {
            let pending = transport.available();
            if pending == 0 {
                break;
            }
            if dropped >= budget {
                warn!("input never ran dry, abandoning drain after {} bytes", dropped);
                break;
            }
            let chunk = pending.min(scratch.len()).min(budget - dropped);
            let n = transport.read(&mut scratch[..chunk]);
            if n == 0 {
                break;
            }
            dropped += n;
        }
        if dropped > 0 {
            trace!("dropped {} stale bytes", dropped);
        }
        dropped
    }

    /// Blocking delay through the owned delay provider.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Gives back the pins and the delay provider.
    pub fn release(self) -> (M0, M1, Option<AUX>, D) {
        (self.m0, self.m1, self.aux, self.delay)
    }
}
