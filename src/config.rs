//! Application-wide constants and compile-time configuration.
//!
//! Descriptor contents, endpoint layout and timing parameters live here so
//! the descriptor tables, the control dispatcher and the report emitter all
//! agree on one set of numbers.

// USB device identity

/// USB VID/PID reported in the device descriptor.
pub const USB_VID: u16 = 0x413D;
pub const USB_PID: u16 = 0x2107;

/// Device release number (BCD).
pub const USB_DEVICE_RELEASE: u16 = 0x0000;

/// USB device strings (ASCII only, encoded as UTF-16LE at compile time).
pub const USB_MANUFACTURER: &str = "wch.cn";
pub const USB_PRODUCT: &str = "CH57x";

/// Maximum bus current drawn, in mA.
pub const USB_MAX_POWER_MA: u16 = 100;

// Endpoints

/// Maximum packet size of the default control endpoint.
pub const EP0_MAX_PACKET: usize = 64;

/// Capacity of each endpoint buffer (one per direction).
pub const EP_BUFFER_SIZE: usize = 64;

/// Number of non-zero endpoints (each with an IN and an OUT half).
pub const NUM_ENDPOINTS: usize = 4;

/// Interrupt endpoints carrying HID traffic.
pub const KEYBOARD_ENDPOINT: u8 = 1;
pub const MOUSE_ENDPOINT: u8 = 2;

/// Interface numbers inside the single configuration.
pub const KEYBOARD_INTERFACE: u8 = 0;
pub const MOUSE_INTERFACE: u8 = 1;
pub const NUM_INTERFACES: u8 = 2;

/// The only configuration value the device accepts besides 0.
pub const CONFIGURATION_VALUE: u8 = 1;

/// HID interrupt endpoint polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 1;

// Key matrix

/// Number of scan lines in the key matrix.
pub const MATRIX_ROWS: usize = 2;
