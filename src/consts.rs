//! Constants used across the E220 programming protocol.
//!
//! This module collects the command codes, register addresses, frame sizes
//! and default timing values the driver relies on.
//!
//! ## Key Concepts
//!
//! - **Commands**: the first byte of every programming frame selects read,
//!   write-and-save or write-temporary.
//! - **Frames**: the configuration block is a 3-byte header followed by six
//!   parameter bytes starting at address `0x00`.
//! - **Timing**: the module needs time after every M0/M1 change before it will
//!   listen on the UART again. The defaults below are what has proven reliable
//!   in practice, not the (shorter) data sheet minimums.
//!
//! All timing values are in milliseconds.

/// Write configuration and keep it across power cycles.
pub const CMD_WRITE_PWR_DOWN_SAVE: u8 = 0xC0;

/// Read the configuration block.
pub const CMD_READ_CONFIGURATION: u8 = 0xC1;

/// Write configuration, lost on power down.
pub const CMD_WRITE_PWR_DOWN_TEMP: u8 = 0xC2;

/// Command byte the module echoes in front of a configuration read reply.
pub const CMD_RETURNED: u8 = 0xC1;

/// Answer from the module when it could not parse a programming frame.
pub const CMD_WRONG_FORMAT: u8 = 0xFF;

/// First register of the configuration block (`ADDH`).
pub const CONFIG_START_ADDRESS: u8 = 0x00;

/// Number of parameter bytes in the configuration block.
pub const CONFIG_PARAM_LEN: u8 = 6;

/// Length of the programming header (command, address, length).
pub const FRAME_HEADER_LEN: usize = 3;

/// Full configuration frame: header plus parameter bytes.
pub const FRAME_LEN: usize = FRAME_HEADER_LEN + CONFIG_PARAM_LEN as usize;

/// Register address of the crypt key high byte.
pub const CRYPT_START_ADDRESS: u8 = 0x06;

/// The crypt key is two bytes wide.
pub const CRYPT_KEY_LEN: u8 = 2;

/// Size of the crypt-set command and of the module's reply to it.
pub const CRYPT_FRAME_LEN: usize = FRAME_HEADER_LEN + CRYPT_KEY_LEN as usize;

/// Diagnostic command asking for the ambient and last-packet RSSI registers.
pub const RSSI_QUERY: [u8; 6] = [0xC0, 0xC1, 0xC2, 0xC3, 0x00, 0x02];

/// Reply length of [`RSSI_QUERY`].
pub const RSSI_REPLY_LEN: usize = 5;

/// Offset of the ambient noise sample in the RSSI reply.
pub const RSSI_AMBIENT_OFFSET: usize = 3;

/// Offset of the last-receive sample in the RSSI reply.
pub const RSSI_LAST_RECEIVE_OFFSET: usize = 4;

/// The module only accepts programming frames at 9600 8N1.
pub const PROGRAM_BAUD: u32 = 9_600;

/// Delay on both sides of an M0/M1 change.
pub const PIN_RECOVER_MS: u32 = 15;

/// Extra settle time once AUX has gone high (data sheet says 2 ms).
pub const AUX_SETTLE_MS: u32 = 20;

/// Fixed wait used in place of AUX polling when no AUX pin is wired.
pub const BLIND_WAIT_MS: u32 = 1_000;

/// AUX timeout used after a mode change or a programming exchange.
pub const MODE_AUX_TIMEOUT_MS: u32 = 4_000;

/// AUX timeout used after a data send or receive.
pub const DATA_AUX_TIMEOUT_MS: u32 = 1_000;

/// Delay between entering NORMAL and the first parameter read in `init`.
pub const INIT_SETTLE_MS: u32 = 100;

/// Delay between entering PROGRAM and writing a frame.
pub const PROGRAM_WRITE_DELAY_MS: u32 = 5;

/// Delay between a request and reading its reply.
pub const REPLY_DELAY_MS: u32 = 50;

/// Upper bound on waiting for the first byte of a save acknowledgement.
pub const SAVE_REPLY_TIMEOUT_MS: u32 = 5_000;

/// Window after a payload in which a trailing RSSI byte may arrive.
pub const RSSI_BYTE_WINDOW_MS: u32 = 5;

/// Upper bound on draining the receive buffer.
pub const CLEAR_BUFFER_TIMEOUT_MS: u32 = 5_000;
