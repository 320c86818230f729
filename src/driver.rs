//! The E220 driver and its configuration session.
//!
//! [`E220`] owns the serial transport, the mode controller and the staged
//! [`Configuration`]. Programming exchanges (`read_parameters`,
//! `save_parameters`, `set_crypt_key`) always put the module back into
//! NORMAL mode before reporting how the exchange went, so a failed session
//! never leaves the radio stuck in PROGRAM.
//!
//! Data transfer lives in [`crate::data`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use e220::driver::E220;
//! use e220::frame::Persistence;
//! use e220::registers::TransmitPower;
//!
//! let mut radio = E220::new(uart, m0, m1, Some(aux), delay);
//! radio.init()?;
//! radio.config_mut().channel = 0x17;
//! radio.config_mut().set_transmit_power(TransmitPower::Low);
//! radio.save_parameters(Persistence::Permanent)?;
//! radio.send(b"hello")?;
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{Configuration, Timings};
use crate::consts::{CMD_READ_CONFIGURATION, CMD_RETURNED, CMD_WRONG_FORMAT, CRYPT_FRAME_LEN};
use crate::data::Rssi;
use crate::error::Error;
use crate::frame::{ConfigurationFrame, Persistence, crypt_key_command};
use crate::mode::{Mode, ModeController};
use crate::registers::UartBaudRate;
use crate::transport::{BaudRateControl, NoBaudControl, Transport};

/// Driver for one EBYTE E220 module.
///
/// ## Type Parameters
///
/// - `T`: the UART, see [`Transport`]
/// - `M0`, `M1`: mode select outputs
/// - `AUX`: busy input (optional at runtime)
/// - `D`: delay provider, also the clock behind every timeout
/// - `B`: baud strategy, [`NoBaudControl`] unless one is registered
#[derive(Debug)]
pub struct E220<T, M0, M1, AUX, D, B = NoBaudControl> {
    pub(crate) transport: T,
    pub(crate) ctrl: ModeController<M0, M1, AUX, D, B>,
    pub(crate) config: Configuration,
    /// Latest signal strength samples.
    pub rssi: Rssi,
}

impl<T, M0, M1, AUX, D> E220<T, M0, M1, AUX, D, NoBaudControl>
where
    T: Transport,
    M0: OutputPin,
    M1: OutputPin,
    AUX: InputPin,
    D: DelayNs,
{
    /// Wraps the module's UART and control pins.
    ///
    /// Nothing is driven until [`init`](Self::init) or the first session.
    pub fn new(transport: T, m0: M0, m1: M1, aux: Option<AUX>, delay: D) -> Self {
        Self {
            transport,
            ctrl: ModeController::new(m0, m1, aux, delay),
            config: Configuration::default(),
            rssi: Rssi::default(),
        }
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
    /// Lets the driver retune the MCU UART when entering and leaving PROGRAM.
    ///
    /// Without a strategy the UART must already run at the module's
    /// configured rate, and configuration exchanges only work when that rate
    /// is 9600.
    pub fn with_baud_control<B2: BaudRateControl>(
        self,
        control: B2,
    ) -> E220<T, M0, M1, AUX, D, B2> {
        E220 {
            transport: self.transport,
            ctrl: self.ctrl.with_baud_control(control),
            config: self.config,
            rssi: self.rssi,
        }
    }

    /// Replaces the default delays and timeouts.
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.ctrl.set_timings(timings);
        self
    }

    /// Brings the module up and loads its configuration.
    ///
    /// With a baud strategy the MCU UART is first put at 9600, the module's
    /// factory rate. The module is then switched to NORMAL and its parameters
    /// are read back into [`config`](Self::config).
    pub fn init(&mut self) -> Result<(), Error> {
        if self.ctrl.reset_baud() {
            self.config.set_uart_baud_rate(UartBaudRate::Baud9600);
        }
        self.set_mode(Mode::Normal)?;
        let settle = self.ctrl.timings().init_settle_ms;
        self.ctrl.delay_ms(settle);
        self.read_parameters()
    }

    /// Switches the module into `mode`.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error> {
        self.ctrl
            .set_mode(&mut self.transport, mode, self.config.uart_baud_rate())
    }

    /// The last mode set, or `None` before the first transition.
    pub fn last_mode(&self) -> Option<Mode> {
        self.ctrl.last_mode()
    }

    /// Reads the AUX pin once; `None` without an AUX pin.
    pub fn aux(&mut self) -> Result<Option<bool>, Error> {
        self.ctrl.aux()
    }

    /// Non-blocking busy check, see [`ModeController::poll_ready`].
    pub fn poll_ready(&mut self) -> nb::Result<(), Error> {
        self.ctrl.poll_ready()
    }

    /// The staged configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Mutable access to the staged configuration. Changes reach the module
    /// on the next [`save_parameters`](Self::save_parameters).
    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// The active delay and timeout table.
    pub fn timings(&self) -> &Timings {
        self.ctrl.timings()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Loads the module's configuration into [`config`](Self::config).
    ///
    /// The reply overwrites the staged image even when it is short or carries
    /// the wrong marker; positions the module did not send keep their staged
    /// values. The module is back in NORMAL when this returns.
    pub fn read_parameters(&mut self) -> Result<(), Error> {
        let staged = self.config.frame(CMD_READ_CONFIGURATION);
        self.set_mode(Mode::Program)?;

        let request = staged.to_short_bytes();
        trace!("read request {:?}", request);
        let written = self.transport.write(&request);
        let reply_delay = self.ctrl.timings().reply_delay_ms;
        self.ctrl.delay_ms(reply_delay);

        let mut reply = staged.to_bytes();
        let received = self.transport.read(&mut reply);
        trace!("read reply {:?}", reply);
        let frame = ConfigurationFrame::from_bytes(&reply);
        self.config.apply_frame(&frame);

        self.set_mode(Mode::Normal)?;

        Error::check_write(ConfigurationFrame::SHORT_LEN, written)?;
        Error::check_read(reply.len(), received)?;
        if frame.command != CMD_RETURNED {
            if frame.command == CMD_WRONG_FORMAT {
                warn!("module rejected the read request as malformed");
            } else {
                warn!("module echoed {:#x} to a read request", frame.command);
            }
            return Err(Error::EchoMismatch {
                expected: CMD_RETURNED,
                received: frame.command,
            });
        }
        debug!(
            "configuration read: address {:#x} channel {}",
            frame.address(),
            frame.channel
        );
        Ok(())
    }

    /// Writes the staged configuration to the module.
    ///
    /// Only the length of the module's echo is checked. Call
    /// [`read_parameters`](Self::read_parameters) afterwards to verify the
    /// contents.
    pub fn save_parameters(&mut self, persistence: Persistence) -> Result<(), Error> {
        let frame = self.config.frame(persistence.command());
        let timings = *self.ctrl.timings();
        self.set_mode(Mode::Program)?;
        self.ctrl.delay_ms(timings.program_write_delay_ms);

        let bytes = frame.to_bytes();
        trace!("save frame {:?}", bytes);
        let written = self.transport.write(&bytes);
        self.ctrl.wait_ready(timings.data_aux_timeout_ms)?;

        if !self
            .ctrl
            .wait_available(&mut self.transport, timings.save_reply_timeout_ms)
        {
            warn!(
                "no save acknowledgement after {} ms",
                timings.save_reply_timeout_ms
            );
        }
        let mut echo = [0u8; ConfigurationFrame::LEN];
        let received = self.transport.read(&mut echo);
        self.ctrl.wait_ready(timings.mode_aux_timeout_ms)?;

        self.set_mode(Mode::Normal)?;

        Error::check_write(bytes.len(), written)?;
        Error::check_read(echo.len(), received)?;
        debug!("configuration saved ({:?})", persistence);
        Ok(())
    }

    /// Sets the module's two-byte crypt key.
    ///
    /// The key is write-only on the module and is always stored permanently.
    /// Both ends of a link must use the same key.
    pub fn set_crypt_key(&mut self, key: u16) -> Result<(), Error> {
        let timings = *self.ctrl.timings();
        self.set_mode(Mode::Program)?;
        self.ctrl.delay_ms(timings.program_write_delay_ms);

        let command = crypt_key_command(key);
        let written = self.transport.write(&command);
        self.ctrl.delay_ms(timings.reply_delay_ms);

        let mut reply = [0u8; CRYPT_FRAME_LEN];
        let received = self.transport.read(&mut reply);
        self.ctrl.wait_ready(timings.mode_aux_timeout_ms)?;

        self.set_mode(Mode::Normal)?;

        Error::check_write(command.len(), written)?;
        Error::check_read(reply.len(), received)?;
        debug!("crypt key set");
        Ok(())
    }

    /// Gives back the transport, the pins and the delay provider.
    pub fn release(self) -> (T, M0, M1, Option<AUX>, D) {
        let (m0, m1, aux, delay) = self.ctrl.release();
        (self.transport, m0, m1, aux, delay)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::registers::{TransmitPower, WorCycle};
    use crate::transport::mock::{MockTransport, RecordingDelay};
    use embedded_hal::digital::PinState;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as MockState, Transaction as PinTransaction,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) type TestRadio<B = NoBaudControl> =
        E220<MockTransport, PinMock, PinMock, PinMock, RecordingDelay, B>;

    fn level(state: PinState) -> MockState {
        match state {
            PinState::Low => MockState::Low,
            PinState::High => MockState::High,
        }
    }

    /// Pin mocks expecting the given mode transitions, in order.
    pub(crate) fn mode_pins(modes: &[Mode]) -> (PinMock, PinMock) {
        let (m0, m1): (Vec<_>, Vec<_>) = modes
            .iter()
            .map(|mode| {
                let (m0, m1) = mode.pins();
                (PinTransaction::set(level(m0)), PinTransaction::set(level(m1)))
            })
            .unzip();
        (PinMock::new(&m0), PinMock::new(&m1))
    }

    /// A radio without AUX whose pins expect `modes`.
    pub(crate) fn radio(link: MockTransport, modes: &[Mode]) -> TestRadio {
        let (m0, m1) = mode_pins(modes);
        E220::new(link, m0, m1, None, RecordingDelay::new())
    }

    /// Checks the pin expectations and hands back the link and the clock.
    pub(crate) fn finish<B: BaudRateControl>(
        radio: TestRadio<B>,
    ) -> (MockTransport, RecordingDelay) {
        let (link, mut m0, mut m1, _, delay) = radio.release();
        m0.done();
        m1.done();
        (link, delay)
    }

    const SESSION: [Mode; 2] = [Mode::Program, Mode::Normal];

    #[test]
    fn test_read_parameters() {
        let mut link = MockTransport::new();
        link.reply(&[0xC1, 0x00, 0x06, 0x12, 0x34, 0x62, 0x00, 0x17, 0x03]);
        let mut radio = radio(link, &SESSION);

        radio.read_parameters().unwrap();

        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        assert_eq!(radio.config().address(), 0x1234);
        assert_eq!(radio.config().channel, 0x17);
        assert_eq!(radio.config().uart_baud_rate(), UartBaudRate::Baud9600);
        assert_eq!(radio.config().wor_cycle(), WorCycle::Ms2000);
        let (link, delay) = finish(radio);
        assert_eq!(link.tx, [0xC1, 0x00, 0x06]);
        assert_eq!(delay.ms, [15, 15, 1_000, 20, 50, 15, 15, 1_000, 20]);
    }

    #[test]
    fn test_read_parameters_echo_mismatch() {
        let mut link = MockTransport::new();
        link.reply(&[0xFF, 0x00, 0x06, 0x00, 0x00, 0x62, 0x00, 0x17, 0x03]);
        let mut radio = radio(link, &SESSION);

        assert_eq!(
            radio.read_parameters(),
            Err(Error::EchoMismatch {
                expected: 0xC1,
                received: 0xFF
            })
        );
        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        assert_eq!(radio.config().last_command, 0xFF);
        let _ = finish(radio);
    }

    #[test]
    fn test_read_parameters_short_reply_keeps_staged_tail() {
        let mut link = MockTransport::new();
        link.reply(&[0xC1, 0x00, 0x06, 0x55]);
        let mut radio = radio(link, &SESSION);
        radio.config_mut().set_address(0xABCD);
        radio.config_mut().channel = 0x17;

        assert_eq!(
            radio.read_parameters(),
            Err(Error::ShortRead {
                expected: 9,
                received: 4
            })
        );
        assert_eq!(radio.config().address(), 0x55CD);
        assert_eq!(radio.config().channel, 0x17);
        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let _ = finish(radio);
    }

    #[test]
    fn test_read_parameters_short_request() {
        let mut link = MockTransport::new();
        link.write_limit = Some(1);
        link.reply(&[0xC1, 0x00, 0x06, 0x00, 0x00, 0x62, 0x00, 0x17, 0x03]);
        let mut radio = radio(link, &SESSION);

        assert_eq!(
            radio.read_parameters(),
            Err(Error::ShortWrite {
                expected: 3,
                written: 1
            })
        );
        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let (link, _) = finish(radio);
        assert_eq!(link.tx, [0xC1]);
    }

    #[test]
    fn test_save_parameters() {
        let mut link = MockTransport::new();
        link.reply(&[0xC2, 0x00, 0x06, 0x00, 0x2A, 0x62, 0x03, 0x17, 0x03]);
        let mut radio = radio(link, &SESSION);
        radio.config_mut().set_address(0x002A);
        radio.config_mut().channel = 0x17;
        radio.config_mut().set_transmit_power(TransmitPower::Low);

        radio.save_parameters(Persistence::Temporary).unwrap();

        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let (link, delay) = finish(radio);
        assert_eq!(
            link.tx,
            [0xC2, 0x00, 0x06, 0x00, 0x2A, 0x62, 0x03, 0x17, 0x03]
        );
        assert_eq!(
            delay.ms,
            [15, 15, 1_000, 20, 5, 1_000, 20, 1_000, 20, 15, 15, 1_000, 20]
        );
    }

    #[test]
    fn test_save_parameters_short_echo() {
        let mut link = MockTransport::new();
        link.reply(&[0xC0, 0x00, 0x06]);
        let mut radio = radio(link, &SESSION);

        assert_eq!(
            radio.save_parameters(Persistence::Permanent),
            Err(Error::ShortRead {
                expected: 9,
                received: 3
            })
        );
        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let (link, _) = finish(radio);
        assert_eq!(link.tx[0], 0xC0);
        assert_eq!(link.tx.len(), 9);
    }

    #[test]
    fn test_save_parameters_reports_short_write_first() {
        let mut link = MockTransport::new();
        link.write_limit = Some(4);
        let mut radio = radio(link, &SESSION).with_timings(Timings {
            save_reply_timeout_ms: 10,
            ..Timings::default()
        });

        assert_eq!(
            radio.save_parameters(Persistence::Permanent),
            Err(Error::ShortWrite {
                expected: 9,
                written: 4
            })
        );
        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let (_, delay) = finish(radio);
        assert_eq!(delay.ms.iter().filter(|&&ms| ms == 1).count(), 10);
    }

    #[test]
    fn test_set_crypt_key() {
        let mut link = MockTransport::new();
        link.reply(&[0xC1, 0x06, 0x02, 0xBE, 0xEF]);
        let mut radio = radio(link, &SESSION);

        radio.set_crypt_key(0xBEEF).unwrap();

        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let (link, delay) = finish(radio);
        assert_eq!(link.tx, [0xC0, 0x06, 0x02, 0xBE, 0xEF]);
        assert_eq!(
            delay.ms,
            [15, 15, 1_000, 20, 5, 50, 1_000, 20, 15, 15, 1_000, 20]
        );
    }

    #[test]
    fn test_set_crypt_key_without_reply() {
        let radio_link = MockTransport::new();
        let mut radio = radio(radio_link, &SESSION);

        assert_eq!(
            radio.set_crypt_key(0x0001),
            Err(Error::ShortRead {
                expected: 5,
                received: 0
            })
        );
        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let _ = finish(radio);
    }

    #[test]
    fn test_init_with_baud_control() {
        let calls: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();

        let mut link = MockTransport::new();
        // module reports 115200 baud
        link.reply(&[0xC1, 0x00, 0x06, 0x00, 0x00, 0xE2, 0x00, 0x17, 0x03]);
        let mut radio = radio(link, &[Mode::Normal, Mode::Program, Mode::Normal])
            .with_baud_control(move |baud: u32| sink.borrow_mut().push(baud));

        radio.init().unwrap();

        assert_eq!(radio.config().uart_baud_rate(), UartBaudRate::Baud115200);
        assert_eq!(*calls.borrow(), [9_600, 115_200]);
        let (_, delay) = finish(radio);
        assert_eq!(&delay.ms[..5], [15, 15, 1_000, 20, 100]);
    }

    #[test]
    fn test_init_without_baud_control() {
        let mut link = MockTransport::new();
        link.reply(&[0xC1, 0x00, 0x06, 0x00, 0x00, 0x62, 0x00, 0x00, 0x03]);
        let mut radio = radio(link, &[Mode::Normal, Mode::Program, Mode::Normal]);
        radio.config_mut().set_uart_baud_rate(UartBaudRate::Baud57600);

        radio.init().unwrap();

        assert_eq!(radio.config().uart_baud_rate(), UartBaudRate::Baud9600);
        assert_eq!(radio.last_mode(), Some(Mode::Normal));
        let _ = finish(radio);
    }

    #[test]
    fn test_drains_noise_before_programming() {
        let mut link = MockTransport::new();
        link.preload(&[0x00, 0x11, 0x22]);
        link.reply(&[0xC1, 0x00, 0x06, 0x00, 0x07, 0x62, 0x00, 0x02, 0x03]);
        let mut radio = radio(link, &SESSION);

        radio.read_parameters().unwrap();

        assert_eq!(radio.config().address(), 0x0007);
        assert_eq!(radio.config().channel, 0x02);
        let _ = finish(radio);
    }
}
