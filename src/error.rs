//! Unified error type for usbkbd.
//!
//! We avoid `alloc` - all error variants carry no data, so the enum is
//! `Copy` and cheap to hand back from the interrupt path.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the crate.
///
/// Every variant that reaches the control dispatcher ends the current
/// control transfer with a STALL on both directions of endpoint 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Control requests
    /// Unknown `bRequest`, vendor request, or unsupported recipient.
    UnsupportedRequest,

    /// String, HID or report descriptor index out of range.
    UnsupportedDescriptorIndex,

    /// A feature or status request names an endpoint the device does not have.
    InvalidEndpointAddress,

    /// Setup stage delivered fewer than 8 bytes.
    MalformedSetup,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}
