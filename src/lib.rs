//! usbkbd - device-side USB stack for a composite HID keyboard + mouse.
//!
//! The crate is the protocol core of the firmware: setup packet decoding,
//! the control request dispatcher, the descriptor tables, per-endpoint
//! toggle/handshake state and the HID report emitter. Board support code
//! implements [`usb::UsbLink`] for the real peripheral and feeds interrupt
//! flags to [`usb::UsbDevice::advance`].
//!
//! Everything is `no_std` and allocation-free, so the state machines run
//! unchanged in host tests.

#![cfg_attr(not(test), no_std)]

// Must come first: the logging macros are used by every module below.
mod fmt;

pub mod config;
pub mod error;
pub mod hid;
pub mod usb;

pub use error::Error;
pub use hid::{HidReport, KeyboardReport, LedState, MouseReport, Protocol};
pub use usb::{SharedDevice, UsbDevice, UsbEvent, UsbLink};
