//! HID report types, report descriptors and the key-matrix translator.

pub mod keyboard;
pub mod keycode;
pub mod matrix;
pub mod mouse;
pub mod report_descriptor;

#[cfg(test)]
mod tests;

pub use keyboard::{KeyboardReport, LedState};
pub use mouse::MouseReport;

use crate::config::{KEYBOARD_ENDPOINT, KEYBOARD_INTERFACE, MOUSE_ENDPOINT, MOUSE_INTERFACE};

/// HID protocol selected by SET_PROTOCOL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Protocol {
    Boot = 0,
    Report = 1,
}

impl Protocol {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Protocol::Boot),
            1 => Some(Protocol::Report),
            _ => None,
        }
    }
}

/// An input report bound for one of the two HID interfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
}

impl HidReport {
    /// Serialise in the layout `protocol` calls for.
    pub fn serialize(&self, protocol: Protocol, buf: &mut [u8]) -> usize {
        match (self, protocol) {
            (HidReport::Keyboard(k), Protocol::Report) => k.serialize(buf),
            (HidReport::Keyboard(k), Protocol::Boot) => k.serialize_boot(buf),
            (HidReport::Mouse(m), Protocol::Report) => m.serialize(buf),
            (HidReport::Mouse(m), Protocol::Boot) => m.serialize_boot(buf),
        }
    }

    /// Interrupt IN endpoint the report travels on.
    pub fn endpoint(&self) -> u8 {
        match self {
            HidReport::Keyboard(_) => KEYBOARD_ENDPOINT,
            HidReport::Mouse(_) => MOUSE_ENDPOINT,
        }
    }

    /// Interface the report belongs to.
    pub fn interface(&self) -> u8 {
        match self {
            HidReport::Keyboard(_) => KEYBOARD_INTERFACE,
            HidReport::Mouse(_) => MOUSE_INTERFACE,
        }
    }

    #[cfg(test)]
    pub fn is_keyboard(&self) -> bool {
        matches!(self, HidReport::Keyboard(_))
    }

    #[cfg(test)]
    pub fn is_mouse(&self) -> bool {
        matches!(self, HidReport::Mouse(_))
    }
}
