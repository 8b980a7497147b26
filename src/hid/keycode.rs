//! USB HID key codes (Usage Page 0x07).
//!
//! Reference: USB HID Usage Tables 1.12, Section 10 (Keyboard/Keypad Page).
//! Only the usages the default keymap needs are named here.

pub const NO_EVENT: u8 = 0x00;
pub const ERROR_ROLL_OVER: u8 = 0x01;

// Letters A-Z (0x04 - 0x1D)
pub const KEY_A: u8 = 0x04;
pub const KEY_D: u8 = 0x07;
pub const KEY_E: u8 = 0x08;
pub const KEY_F: u8 = 0x09;
pub const KEY_G: u8 = 0x0A;
pub const KEY_H: u8 = 0x0B;
pub const KEY_I: u8 = 0x0C;
pub const KEY_J: u8 = 0x0D;
pub const KEY_K: u8 = 0x0E;
pub const KEY_Q: u8 = 0x14;
pub const KEY_R: u8 = 0x15;
pub const KEY_S: u8 = 0x16;
pub const KEY_T: u8 = 0x17;
pub const KEY_U: u8 = 0x18;
pub const KEY_W: u8 = 0x1A;
pub const KEY_Y: u8 = 0x1C;

// Modifiers (0xE0 - 0xE7)
pub const KEY_LEFT_CTRL: u8 = 0xE0;
pub const KEY_LEFT_SHIFT: u8 = 0xE1;
pub const KEY_LEFT_ALT: u8 = 0xE2;
pub const KEY_LEFT_GUI: u8 = 0xE3;
pub const KEY_RIGHT_CTRL: u8 = 0xE4;
pub const KEY_RIGHT_SHIFT: u8 = 0xE5;
pub const KEY_RIGHT_ALT: u8 = 0xE6;
pub const KEY_RIGHT_GUI: u8 = 0xE7;

/// Modifier-byte bit for a modifier usage, `None` for ordinary keys.
pub const fn modifier_bit(usage: u8) -> Option<u8> {
    if usage >= KEY_LEFT_CTRL && usage <= KEY_RIGHT_GUI {
        Some(1 << (usage - KEY_LEFT_CTRL))
    } else {
        None
    }
}
