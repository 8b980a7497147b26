//! USB device stack - presents a composite HID device to the host.
//!
//! The device exposes one configuration with two HID interfaces:
//!
//! - Interface 0: Keyboard (boot subclass), interrupt IN on EP1
//! - Interface 1: Mouse    (boot subclass), interrupt IN on EP2
//!
//! Endpoint 0 runs the control transfers that drive enumeration and HID
//! class negotiation. Endpoints 1-4 each have an IN and an OUT half with
//! their own toggle and handshake state. Everything here is a pure state
//! machine; the hardware is reached only through [`UsbLink`].

pub mod buffers;
pub mod control;
pub mod descriptor;
pub mod device;
pub mod endpoint;
pub mod link;
pub mod setup;
pub mod shared;
pub mod transfer;

pub use control::{DeviceConfigState, DeviceContext};
pub use device::{ControlStage, UsbDevice, UsbEvent};
pub use endpoint::{Direction, Response, Toggle};
pub use link::UsbLink;
pub use setup::{Request, SetupPacket};
pub use shared::SharedDevice;
pub use transfer::TransferCursor;
