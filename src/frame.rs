//! Programming frames exchanged with the module in PROGRAM mode.
//!
//! The configuration block travels as
//! `[command, start_addr, length, addr_high, addr_low, reg0, reg1, channel, reg3]`.
//! A read request sends only the three header bytes; the module answers with
//! the full nine.

use crate::consts::{
    CMD_WRITE_PWR_DOWN_SAVE, CMD_WRITE_PWR_DOWN_TEMP, CONFIG_PARAM_LEN, CONFIG_START_ADDRESS,
    CRYPT_FRAME_LEN, CRYPT_KEY_LEN, CRYPT_START_ADDRESS, FRAME_HEADER_LEN, FRAME_LEN,
};

/// Whether a configuration write survives a power cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Persistence {
    /// Store in flash (`0xC0`).
    #[default]
    Permanent,
    /// Apply until the next power down (`0xC2`).
    Temporary,
}

impl Persistence {
    /// The command byte selecting this persistence.
    pub const fn command(self) -> u8 {
        match self {
            Persistence::Permanent => CMD_WRITE_PWR_DOWN_SAVE,
            Persistence::Temporary => CMD_WRITE_PWR_DOWN_TEMP,
        }
    }
}

/// The nine-byte configuration frame, byte for byte as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ConfigurationFrame {
    /// Command code (`0xC0`, `0xC1` or `0xC2`; echoed `0xC1` on read replies).
    pub command: u8,
    /// First register addressed.
    pub start_address: u8,
    /// Number of parameter bytes following the header.
    pub length: u8,
    /// Module address, high byte.
    pub address_high: u8,
    /// Module address, low byte.
    pub address_low: u8,
    /// Packed `REG0`.
    pub reg0: u8,
    /// Packed `REG1`.
    pub reg1: u8,
    /// `REG2`, the channel number.
    pub channel: u8,
    /// Packed `REG3`.
    pub reg3: u8,
}

impl ConfigurationFrame {
    /// Wire size of a full frame.
    pub const LEN: usize = FRAME_LEN;

    /// Wire size of the read-request form.
    pub const SHORT_LEN: usize = FRAME_HEADER_LEN;

    /// Builds a frame addressing the whole configuration block.
    pub const fn new(command: u8, address: u16, reg0: u8, reg1: u8, channel: u8, reg3: u8) -> Self {
        let [address_high, address_low] = address.to_be_bytes();
        Self {
            command,
            start_address: CONFIG_START_ADDRESS,
            length: CONFIG_PARAM_LEN,
            address_high,
            address_low,
            reg0,
            reg1,
            channel,
            reg3,
        }
    }

    /// The full nine-byte wire form.
    pub const fn to_bytes(&self) -> [u8; FRAME_LEN] {
        [
            self.command,
            self.start_address,
            self.length,
            self.address_high,
            self.address_low,
            self.reg0,
            self.reg1,
            self.channel,
            self.reg3,
        ]
    }

    /// The three-byte header used as a read request.
    pub const fn to_short_bytes(&self) -> [u8; FRAME_HEADER_LEN] {
        [self.command, self.start_address, self.length]
    }

    /// Parses a frame positionally from its wire form.
    pub const fn from_bytes(bytes: &[u8; FRAME_LEN]) -> Self {
        Self {
            command: bytes[0],
            start_address: bytes[1],
            length: bytes[2],
            address_high: bytes[3],
            address_low: bytes[4],
            reg0: bytes[5],
            reg1: bytes[6],
            channel: bytes[7],
            reg3: bytes[8],
        }
    }

    /// The 16-bit module address carried by the frame.
    pub const fn address(&self) -> u16 {
        u16::from_be_bytes([self.address_high, self.address_low])
    }
}

/// Builds the write-and-save command for the two crypt key registers.
///
/// The key lives outside the six-byte configuration block, so it is written
/// with its own short command rather than through [`ConfigurationFrame`].
pub const fn crypt_key_command(key: u16) -> [u8; CRYPT_FRAME_LEN] {
    let [high, low] = key.to_be_bytes();
    [
        CMD_WRITE_PWR_DOWN_SAVE,
        CRYPT_START_ADDRESS,
        CRYPT_KEY_LEN,
        high,
        low,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_frame_layout() {
        let frame = ConfigurationFrame::new(0xC0, 0x1234, 0x62, 0x00, 0x17, 0x03);
        assert_eq!(
            frame.to_bytes(),
            [0xC0, 0x00, 0x06, 0x12, 0x34, 0x62, 0x00, 0x17, 0x03]
        );
        assert_eq!(frame.to_short_bytes(), [0xC0, 0x00, 0x06]);
        assert_eq!(frame.address(), 0x1234);
    }

    #[test]
    fn test_parse_positions() {
        let frame =
            ConfigurationFrame::from_bytes(&[0xC1, 0x00, 0x06, 0xAB, 0xCD, 0x11, 0x22, 0x33, 0x44]);
        assert_eq!(frame.command, 0xC1);
        assert_eq!(frame.address_high, 0xAB);
        assert_eq!(frame.address_low, 0xCD);
        assert_eq!(frame.reg0, 0x11);
        assert_eq!(frame.reg1, 0x22);
        assert_eq!(frame.channel, 0x33);
        assert_eq!(frame.reg3, 0x44);
    }

    #[test]
    fn test_persistence_codes() {
        assert_eq!(Persistence::Permanent.command(), 0xC0);
        assert_eq!(Persistence::Temporary.command(), 0xC2);
    }

    #[test]
    fn test_crypt_command() {
        assert_eq!(crypt_key_command(0xBEEF), [0xC0, 0x06, 0x02, 0xBE, 0xEF]);
    }
}
