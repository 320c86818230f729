//! # e220
//!
//! A portable, no_std Rust driver for EBYTE E220 series UART LoRa modules
//! (E220-900T22D, E220-400T22D and friends).
//!
//! The module does the radio work itself. The host drives two mode pins
//! (M0, M1), watches an optional busy pin (AUX) and talks to it over a plain
//! UART. This crate wraps that in:
//! - `embedded-hal` traits for the mode pins, the AUX pin and delays
//! - a small [`Transport`](transport::Transport) trait for the UART
//! - typed register codecs for the configuration block
//! - interrupt-safe global access with `critical-section`
//!
//! ## Crate features
//! | Feature            | Description |
//! |--------------------|-------------|
//! | `std`              | Disables `#![no_std]` |
//! | `critical-section` | Enables [`shared::SharedE220`] for use from interrupt handlers |
//! | `defmt-0-3`        | Uses `defmt` logging |
//! | `log`              | Uses `log` logging |
//!
//! ## Software Features
//!
//! - **Mode switching** with AUX handshaking, or fixed delays when AUX is not wired
//! - **Configuration** read, save (permanent or temporary) and crypt key programming
//! - **Automatic baud switching** around PROGRAM mode through a user callback
//! - **Transparent data** send and receive, with the optional trailing RSSI byte
//! - **RSSI queries** for ambient noise and last packet strength
//!
//! ## Usage
//!
//! ```rust,ignore
//! use e220::driver::E220;
//! use e220::frame::Persistence;
//! use e220::registers::AirDataRate;
//!
//! let mut radio = E220::new(uart, m0, m1, Some(aux), delay)
//!     .with_baud_control(|baud| uart_set_baud(baud));
//! radio.init()?;
//!
//! radio.config_mut().channel = 0x12;
//! radio.config_mut().set_air_data_rate(AirDataRate::Bps9600);
//! radio.save_parameters(Persistence::Temporary)?;
//!
//! radio.send(b"ping")?;
//! let reply = radio.receive_packet::<32>(4)?;
//! ```
//!
//! ## Integration Notes
//!
//! - The module only accepts programming frames at 9600 8N1. Without a baud
//!   strategy the UART must already run at 9600 for configuration exchanges.
//! - Every timeout counts 1 ms calls on the supplied delay, so the delay
//!   provider is also the driver's clock.
//! - AUX timeouts are logged, never reported as errors.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "critical-section")]
pub use critical_section;

pub use heapless;

#[macro_use]
mod fmt;

pub mod config;
pub mod consts;
pub mod data;
pub mod driver;
pub mod error;
pub mod frame;
pub mod mode;
pub mod registers;
#[cfg(feature = "critical-section")]
pub mod shared;
pub mod transport;

pub use config::{Configuration, Timings};
pub use data::Rssi;
pub use driver::E220;
pub use error::{Error, Precondition};
pub use frame::Persistence;
pub use mode::Mode;
pub use transport::{BaudRateControl, NoBaudControl, Transport};
