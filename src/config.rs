//! In-memory configuration image and driver timing knobs.
//!
//! [`Configuration`] is the staged copy of the module's six-byte parameter
//! block. Setters only touch this copy. Nothing reaches the module until
//! [`E220::save_parameters`](crate::driver::E220::save_parameters) is called,
//! and [`E220::read_parameters`](crate::driver::E220::read_parameters)
//! overwrites it with what the module reports.

use core::fmt;

use crate::consts::{
    AUX_SETTLE_MS, BLIND_WAIT_MS, CLEAR_BUFFER_TIMEOUT_MS, DATA_AUX_TIMEOUT_MS, INIT_SETTLE_MS,
    MODE_AUX_TIMEOUT_MS, PIN_RECOVER_MS, PROGRAM_WRITE_DELAY_MS, REPLY_DELAY_MS,
    RSSI_BYTE_WINDOW_MS, SAVE_REPLY_TIMEOUT_MS,
};
use crate::frame::ConfigurationFrame;
use crate::registers::{
    AirDataRate, Parity, Reg0, Reg1, Reg3, SubPacketSize, TransmissionMode, TransmitPower,
    UartBaudRate, WorCycle,
};

/// Staged copy of the module's parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Configuration {
    /// Command byte of the last frame read back from the module.
    pub last_command: u8,
    /// Module address, high byte.
    pub address_high: u8,
    /// Module address, low byte.
    pub address_low: u8,
    /// Channel (`REG2`). Frequency is 850.125 MHz + channel × 1 MHz on 900 MHz
    /// parts, 410.125 MHz + channel × 1 MHz on 400 MHz parts.
    pub channel: u8,
    /// `REG0` codec.
    pub reg0: Reg0,
    /// `REG1` codec.
    pub reg1: Reg1,
    /// `REG3` codec.
    pub reg3: Reg3,
}

impl Configuration {
    /// The 16-bit module address.
    pub const fn address(&self) -> u16 {
        u16::from_be_bytes([self.address_high, self.address_low])
    }

    /// Splits `address` into the high and low bytes.
    pub fn set_address(&mut self, address: u16) {
        [self.address_high, self.address_low] = address.to_be_bytes();
    }

    /// Stages a frame carrying this configuration under `command`.
    pub const fn frame(&self, command: u8) -> ConfigurationFrame {
        ConfigurationFrame::new(
            command,
            self.address(),
            self.reg0.bits(),
            self.reg1.bits(),
            self.channel,
            self.reg3.bits(),
        )
    }

    /// Replaces the image with the parameters carried by `frame`.
    pub fn apply_frame(&mut self, frame: &ConfigurationFrame) {
        self.last_command = frame.command;
        self.address_high = frame.address_high;
        self.address_low = frame.address_low;
        self.channel = frame.channel;
        self.reg0 = Reg0::from_bits(frame.reg0);
        self.reg1 = Reg1::from_bits(frame.reg1);
        self.reg3 = Reg3::from_bits(frame.reg3);
    }

    /// UART rate the module is (or will be) configured for.
    pub const fn uart_baud_rate(&self) -> UartBaudRate {
        self.reg0.uart_baud_rate()
    }

    /// Stages a UART rate.
    pub fn set_uart_baud_rate(&mut self, value: UartBaudRate) {
        self.reg0.set_uart_baud_rate(value);
    }

    /// UART parity.
    pub const fn parity(&self) -> Parity {
        self.reg0.parity()
    }

    /// Stages a UART parity.
    pub fn set_parity(&mut self, value: Parity) {
        self.reg0.set_parity(value);
    }

    /// Air data rate.
    pub const fn air_data_rate(&self) -> AirDataRate {
        self.reg0.air_data_rate()
    }

    /// Stages an air data rate.
    pub fn set_air_data_rate(&mut self, value: AirDataRate) {
        self.reg0.set_air_data_rate(value);
    }

    /// Sub-packet size.
    pub const fn sub_packet_size(&self) -> SubPacketSize {
        self.reg1.sub_packet_size()
    }

    /// Stages a sub-packet size.
    pub fn set_sub_packet_size(&mut self, value: SubPacketSize) {
        self.reg1.set_sub_packet_size(value);
    }

    /// Whether ambient noise RSSI is enabled.
    pub const fn ambient_noise(&self) -> bool {
        self.reg1.ambient_noise()
    }

    /// Stages the ambient noise RSSI enable.
    pub fn set_ambient_noise(&mut self, value: bool) {
        self.reg1.set_ambient_noise(value);
    }

    /// Transmit power.
    pub const fn transmit_power(&self) -> TransmitPower {
        self.reg1.transmit_power()
    }

    /// Stages a transmit power.
    pub fn set_transmit_power(&mut self, value: TransmitPower) {
        self.reg1.set_transmit_power(value);
    }

    /// Whether received payloads carry a trailing RSSI byte.
    pub const fn rssi_byte(&self) -> bool {
        self.reg3.rssi_byte()
    }

    /// Stages the trailing RSSI byte enable.
    pub fn set_rssi_byte(&mut self, value: bool) {
        self.reg3.set_rssi_byte(value);
    }

    /// Transmission mode.
    pub const fn transmission_mode(&self) -> TransmissionMode {
        self.reg3.transmission_mode()
    }

    /// Stages a transmission mode.
    pub fn set_transmission_mode(&mut self, value: TransmissionMode) {
        self.reg3.set_transmission_mode(value);
    }

    /// Whether listen-before-talk is enabled.
    pub const fn lbt(&self) -> bool {
        self.reg3.lbt()
    }

    /// Stages the listen-before-talk enable.
    pub fn set_lbt(&mut self, value: bool) {
        self.reg3.set_lbt(value);
    }

    /// Wake-on-radio cycle.
    pub const fn wor_cycle(&self) -> WorCycle {
        self.reg3.wor_cycle()
    }

    /// Stages a wake-on-radio cycle.
    pub fn set_wor_cycle(&mut self, value: WorCycle) {
        self.reg3.set_wor_cycle(value);
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "command      {:#04x}", self.last_command)?;
        writeln!(f, "address      {:#06x}", self.address())?;
        writeln!(f, "channel      {}", self.channel)?;
        writeln!(f, "reg0         {:#010b}", self.reg0.bits())?;
        writeln!(f, "reg1         {:#010b}", self.reg1.bits())?;
        writeln!(f, "reg3         {:#010b}", self.reg3.bits())?;
        writeln!(f, "uart         {} baud {:?}", self.uart_baud_rate().baud(), self.parity())?;
        writeln!(f, "air rate     {:?}", self.air_data_rate())?;
        writeln!(f, "packet size  {} bytes", self.sub_packet_size().bytes())?;
        writeln!(f, "tx power     {:?}", self.transmit_power())?;
        writeln!(f, "ambient rssi {}", self.ambient_noise())?;
        writeln!(f, "rssi byte    {}", self.rssi_byte())?;
        writeln!(f, "tx mode      {:?}", self.transmission_mode())?;
        writeln!(f, "lbt          {}", self.lbt())?;
        write!(f, "wor cycle    {} ms", self.wor_cycle().millis())
    }
}

/// Delays and timeouts used by the driver, all in milliseconds.
///
/// The defaults are conservative. Modules that respond quickly can be driven
/// faster by lowering them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Timings {
    /// Wait before and after driving M0/M1.
    pub pin_recover_ms: u32,
    /// Settle time after AUX reports ready.
    pub aux_settle_ms: u32,
    /// Fixed wait used when no AUX pin is configured.
    pub blind_wait_ms: u32,
    /// AUX timeout after mode changes and programming exchanges.
    pub mode_aux_timeout_ms: u32,
    /// AUX timeout after data transfers.
    pub data_aux_timeout_ms: u32,
    /// Wait between entering NORMAL and the first read in `init`.
    pub init_settle_ms: u32,
    /// Wait between entering PROGRAM and writing a frame.
    pub program_write_delay_ms: u32,
    /// Wait between a request and reading its reply.
    pub reply_delay_ms: u32,
    /// Upper bound on waiting for a save acknowledgement.
    pub save_reply_timeout_ms: u32,
    /// Window for the optional trailing RSSI byte.
    pub rssi_byte_window_ms: u32,
    /// Upper bound on draining stale input.
    pub clear_buffer_timeout_ms: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            pin_recover_ms: PIN_RECOVER_MS,
            aux_settle_ms: AUX_SETTLE_MS,
            blind_wait_ms: BLIND_WAIT_MS,
            mode_aux_timeout_ms: MODE_AUX_TIMEOUT_MS,
            data_aux_timeout_ms: DATA_AUX_TIMEOUT_MS,
            init_settle_ms: INIT_SETTLE_MS,
            program_write_delay_ms: PROGRAM_WRITE_DELAY_MS,
            reply_delay_ms: REPLY_DELAY_MS,
            save_reply_timeout_ms: SAVE_REPLY_TIMEOUT_MS,
            rssi_byte_window_ms: RSSI_BYTE_WINDOW_MS,
            clear_buffer_timeout_ms: CLEAR_BUFFER_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_split() {
        let mut config = Configuration::default();
        config.set_address(0xA1B2);
        assert_eq!(config.address_high, 0xA1);
        assert_eq!(config.address_low, 0xB2);
        assert_eq!(config.address(), 0xA1B2);
    }

    #[test]
    fn test_setters_keep_frame_in_sync() {
        let mut config = Configuration::default();
        config.set_uart_baud_rate(UartBaudRate::Baud115200);
        config.set_transmit_power(TransmitPower::Low);
        config.set_rssi_byte(true);
        config.channel = 0x17;

        let frame = config.frame(0xC0);
        assert_eq!(frame.reg0, 0b111_00_010);
        assert_eq!(frame.reg1, 0b00_0_000_11);
        assert_eq!(frame.reg3, 0b1000_0011);
        assert_eq!(frame.channel, 0x17);
    }

    #[test]
    fn test_apply_frame_unpacks_registers() {
        let frame =
            ConfigurationFrame::from_bytes(&[0xC1, 0x00, 0x06, 0x00, 0x2A, 0xE5, 0x21, 0x41, 0xD4]);
        let mut config = Configuration::default();
        config.apply_frame(&frame);

        assert_eq!(config.last_command, 0xC1);
        assert_eq!(config.address(), 0x002A);
        assert_eq!(config.uart_baud_rate(), UartBaudRate::Baud115200);
        assert_eq!(config.parity(), Parity::None);
        assert_eq!(config.air_data_rate(), AirDataRate::Bps19200);
        assert_eq!(config.sub_packet_size(), SubPacketSize::Bytes200);
        assert!(config.ambient_noise());
        assert_eq!(config.transmit_power(), TransmitPower::High);
        assert_eq!(config.channel, 0x41);
        assert!(config.rssi_byte());
        assert_eq!(config.transmission_mode(), TransmissionMode::Fixed);
        assert!(config.lbt());
        assert_eq!(config.wor_cycle(), WorCycle::Ms2500);
    }

    #[test]
    fn test_display_lists_every_field() {
        let text = format!("{}", Configuration::default());
        assert!(text.contains("9600 baud"));
        assert!(text.contains("wor cycle    2000 ms"));
        assert_eq!(text.lines().count(), 15);
    }
}
