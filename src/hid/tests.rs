//! Unit tests for HID report layout and serialization.
//!
//! These tests run on the host (not embedded) and verify the pure
//! logic of report building and serialization.

use super::keyboard::{
    KeyboardReport, LedState, KEYBOARD_BOOT_REPORT_SIZE, KEYBOARD_REPORT_DESCRIPTOR,
    KEYBOARD_REPORT_SIZE,
};
use super::keycode::*;
use super::mouse::{MouseReport, MOUSE_REPORT_DESCRIPTOR, MOUSE_REPORT_SIZE};
use super::report_descriptor::{Application, ReportLayout};
use super::{HidReport, Protocol};

// ═══════════════════════════════════════════════════════════════════════════
// Keyboard Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn keyboard_report_empty() {
    let report = KeyboardReport::empty();
    assert!(report.is_empty());
    assert_eq!(report.modifier, 0);
    assert_eq!(report.pressed().count(), 0);
}

#[test]
fn keyboard_press_sets_bitmap_bit() {
    let mut report = KeyboardReport::empty();
    assert!(report.press(KEY_A)); // usage 0x04 -> byte 0, bit 4
    assert_eq!(report.keys[0], 0x10);
    assert!(report.is_pressed(KEY_A));
    assert!(!report.is_empty());

    report.release(KEY_A);
    assert!(report.is_empty());
}

#[test]
fn keyboard_press_modifier_uses_modifier_byte() {
    let mut report = KeyboardReport::empty();
    report.press(KEY_LEFT_SHIFT);
    report.press(KEY_RIGHT_GUI);
    assert_eq!(report.modifier, 0x82);
    assert!(report.keys.iter().all(|&b| b == 0));
    assert!(report.is_pressed(KEY_LEFT_SHIFT));
}

#[test]
fn keyboard_press_out_of_bitmap_range_is_rejected() {
    let mut report = KeyboardReport::empty();
    assert!(!report.press(0x70));
    assert!(report.is_empty());
}

#[test]
fn keyboard_serialize_report_protocol() {
    let mut report = KeyboardReport::empty();
    report.press(KEY_LEFT_CTRL);
    report.press(KEY_Q); // 0x14 -> byte 2, bit 4

    let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
    assert_eq!(report.serialize(&mut buf), 16);
    assert_eq!(buf[0], 0x01);
    assert_eq!(buf[1], 0x00);
    assert_eq!(buf[2 + 2], 0x10);
}

#[test]
fn keyboard_serialize_buffer_too_small() {
    let report = KeyboardReport::empty();
    let mut small_buf = [0u8; 8];
    assert_eq!(report.serialize(&mut small_buf), 0);
    let mut tiny = [0u8; 4];
    assert_eq!(report.serialize_boot(&mut tiny), 0);
}

#[test]
fn keyboard_serialize_boot_lists_keys_in_order() {
    let mut report = KeyboardReport::empty();
    report.press(KEY_S);
    report.press(KEY_A);
    report.press(KEY_LEFT_ALT);

    let mut buf = [0xAAu8; KEYBOARD_BOOT_REPORT_SIZE];
    assert_eq!(report.serialize_boot(&mut buf), 8);
    assert_eq!(buf, [0x04, 0x00, KEY_A, KEY_S, 0, 0, 0, 0]);
}

#[test]
fn keyboard_serialize_boot_rollover() {
    let mut report = KeyboardReport::empty();
    for usage in [KEY_Q, KEY_W, KEY_E, KEY_R, KEY_T, KEY_Y, KEY_U] {
        report.press(usage);
    }
    let mut buf = [0u8; 8];
    report.serialize_boot(&mut buf);
    assert_eq!(&buf[2..], &[ERROR_ROLL_OVER; 6]);
}

#[test]
fn led_state_from_output_report() {
    let leds = LedState::from_output_report(&[0x03]).unwrap();
    assert!(leds.num_lock);
    assert!(leds.caps_lock);
    assert!(!leds.scroll_lock);
    assert!(LedState::from_output_report(&[]).is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// Mouse Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn mouse_report_empty() {
    let report = MouseReport::empty();
    assert!(report.is_idle());
    assert_eq!(report.buttons, 0);
    assert_eq!(report.x, 0);
    assert_eq!(report.y, 0);
    assert_eq!(report.wheel, 0);
}

#[test]
fn mouse_report_serialize_signed_deltas() {
    let original = MouseReport {
        buttons: 0x05,
        x: -100,
        y: 50,
        wheel: -2,
    };

    let mut buf = [0u8; 4];
    let written = original.serialize(&mut buf);

    assert_eq!(written, 4);
    assert_eq!(buf[0], 0x05);
    assert_eq!(buf[1] as i8, -100);
    assert_eq!(buf[2] as i8, 50);
    assert_eq!(buf[3] as i8, -2);
}

#[test]
fn mouse_report_serialize_boot_drops_wheel() {
    let report = MouseReport {
        buttons: 0x02,
        x: 1,
        y: -1,
        wheel: 3,
    };
    let mut buf = [0u8; 4];
    assert_eq!(report.serialize_boot(&mut buf), 3);
    assert_eq!(&buf[..3], &[0x02, 0x01, 0xFF]);
    assert_eq!(buf[3], 0);
}

#[test]
fn mouse_report_is_not_idle_when_moving() {
    let report = MouseReport {
        buttons: 0,
        x: 1,
        y: 0,
        wheel: 0,
    };
    assert!(!report.is_idle());
}

// ═══════════════════════════════════════════════════════════════════════════
// Report Descriptor Agreement Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn keyboard_descriptor_matches_report_widths() {
    let layout = ReportLayout::parse(KEYBOARD_REPORT_DESCRIPTOR).unwrap();
    assert_eq!(layout.application, Application::Keyboard);
    assert_eq!(layout.input_bytes(), KEYBOARD_REPORT_SIZE);
    assert_eq!(layout.output_bytes(), 1);
}

#[test]
fn mouse_descriptor_matches_report_width() {
    let layout = ReportLayout::parse(MOUSE_REPORT_DESCRIPTOR).unwrap();
    assert_eq!(layout.application, Application::Mouse);
    assert_eq!(layout.input_bytes(), MOUSE_REPORT_SIZE);
    assert_eq!(layout.output_bits, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// HidReport Enum Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn hid_report_serialize_follows_protocol() {
    let mut kb = KeyboardReport::empty();
    kb.press(KEY_A);
    let report = HidReport::Keyboard(kb);

    let mut buf = [0u8; 16];
    assert_eq!(report.serialize(Protocol::Report, &mut buf), 16);
    assert_eq!(report.serialize(Protocol::Boot, &mut buf), 8);
    assert_eq!(buf[2], KEY_A);
}

#[test]
fn hid_report_routing() {
    let kb = HidReport::Keyboard(KeyboardReport::empty());
    assert!(kb.is_keyboard());
    assert_eq!(kb.endpoint(), 1);
    assert_eq!(kb.interface(), 0);

    let mouse = HidReport::Mouse(MouseReport::empty());
    assert!(mouse.is_mouse());
    assert_eq!(mouse.endpoint(), 2);
    assert_eq!(mouse.interface(), 1);
}

#[test]
fn protocol_from_u8() {
    assert_eq!(Protocol::from_u8(0), Some(Protocol::Boot));
    assert_eq!(Protocol::from_u8(1), Some(Protocol::Report));
    assert_eq!(Protocol::from_u8(2), None);
}
