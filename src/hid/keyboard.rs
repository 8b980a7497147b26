//! USB HID keyboard report (bitmap / n-key rollover).
//!
//! Report protocol layout (16 bytes):
//! ```text
//! Byte 0:     Modifier keys (bitfield)
//!             Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!             Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!             Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!             Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1:     Reserved (0x00)
//! Byte 2-15:  Key bitmap, bit n set = usage n pressed (usages 0x00..=0x6F)
//! ```
//!
//! Boot protocol layout (8 bytes): modifier, reserved, up to 6 key codes.

use super::keycode;

/// Keyboard report size in bytes (report protocol).
pub const KEYBOARD_REPORT_SIZE: usize = 16;

/// Keyboard report size in bytes (boot protocol).
pub const KEYBOARD_BOOT_REPORT_SIZE: usize = 8;

/// Number of bitmap bytes following the modifier and reserved bytes.
pub const KEY_BITMAP_SIZE: usize = KEYBOARD_REPORT_SIZE - 2;

/// Number of key codes in a boot-protocol report.
const BOOT_KEY_SLOTS: usize = 6;

/// Bitmap keyboard input report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (always 0x00 per HID spec).
    pub reserved: u8,
    /// One bit per key usage `0x00..=0x6F`.
    pub keys: [u8; KEY_BITMAP_SIZE],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keys: [0; KEY_BITMAP_SIZE],
        }
    }

    /// Mark a key as pressed.
    ///
    /// Modifier usages (`0xE0..=0xE7`) set the corresponding modifier bit.
    /// Returns `false` when the usage is outside the bitmap range.
    pub fn press(&mut self, usage: u8) -> bool {
        if let Some(bit) = keycode::modifier_bit(usage) {
            self.modifier |= bit;
            return true;
        }
        match Self::bitmap_slot(usage) {
            Some((byte, mask)) => {
                self.keys[byte] |= mask;
                true
            }
            None => false,
        }
    }

    /// Mark a key as released.
    pub fn release(&mut self, usage: u8) {
        if let Some(bit) = keycode::modifier_bit(usage) {
            self.modifier &= !bit;
        } else if let Some((byte, mask)) = Self::bitmap_slot(usage) {
            self.keys[byte] &= !mask;
        }
    }

    /// Returns `true` if `usage` is currently pressed.
    pub fn is_pressed(&self, usage: u8) -> bool {
        if let Some(bit) = keycode::modifier_bit(usage) {
            return self.modifier & bit != 0;
        }
        Self::bitmap_slot(usage).is_some_and(|(byte, mask)| self.keys[byte] & mask != 0)
    }

    /// Iterate over the pressed (non-modifier) usages in ascending order.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        (0..(KEY_BITMAP_SIZE * 8) as u8).filter(move |&usage| {
            let (byte, mask) = (usage as usize / 8, 1u8 << (usage % 8));
            self.keys[byte] & mask != 0
        })
    }

    /// Returns `true` if no keys are pressed (release event).
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keys.iter().all(|&k| k == 0)
    }

    /// Serialise the report-protocol layout into `buf`.
    /// Returns the number of bytes written (always 16, or 0 if `buf` is too small).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..KEYBOARD_REPORT_SIZE].copy_from_slice(&self.keys);
        KEYBOARD_REPORT_SIZE
    }

    /// Serialise the boot-protocol layout into `buf`.
    ///
    /// More than six pressed keys fill every slot with ErrorRollOver, as
    /// the boot keyboard definition requires.
    pub fn serialize_boot(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_BOOT_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        let slots = &mut buf[2..KEYBOARD_BOOT_REPORT_SIZE];
        slots.fill(0);
        if self.pressed().count() > BOOT_KEY_SLOTS {
            slots.fill(keycode::ERROR_ROLL_OVER);
        } else {
            for (slot, usage) in slots.iter_mut().zip(self.pressed()) {
                *slot = usage;
            }
        }
        KEYBOARD_BOOT_REPORT_SIZE
    }

    fn bitmap_slot(usage: u8) -> Option<(usize, u8)> {
        let byte = usage as usize / 8;
        if byte < KEY_BITMAP_SIZE {
            Some((byte, 1 << (usage % 8)))
        } else {
            None
        }
    }
}

/// Keyboard LED state carried by the output report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedState {
    pub num_lock: bool,
    pub caps_lock: bool,
    pub scroll_lock: bool,
}

impl From<u8> for LedState {
    fn from(byte: u8) -> Self {
        Self {
            num_lock: (byte & 0x01) != 0,
            caps_lock: (byte & 0x02) != 0,
            scroll_lock: (byte & 0x04) != 0,
        }
    }
}

impl LedState {
    /// Parse the 1-byte keyboard output report. Empty payloads are ignored.
    pub fn from_output_report(data: &[u8]) -> Option<Self> {
        data.first().map(|&byte| Self::from(byte))
    }
}

// USB HID report descriptor for the bitmap keyboard

/// USB HID Report Descriptor for the keyboard interface.
///
/// This descriptor tells the USB host that we are a keyboard with:
///   - 8 modifier key bits (input)
///   - 1 reserved byte (input)
///   - 3 LED indicators + 5 padding bits (output)
///   - 112 key bits, usages 0x00..=0x6F (input)
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    //   - Modifier keys (8 bits) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Reserved byte -
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) - padding
    //
    //   - LED output (3 bits + 5 padding) -
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x03, //   Usage Maximum (Scroll Lock)
    0x95, 0x03, //   Report Count (3)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x05, //   Report Size (5)
    0x91, 0x01, //   Output (Constant) - padding
    //
    //   - Key bitmap (112 bits) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x6F, //   Usage Maximum (0x6F)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x70, //   Report Count (112)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];
