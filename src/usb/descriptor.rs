//! Descriptor store - the byte tables served by GET_DESCRIPTOR.
//!
//! All tables are built at compile time. The configuration block is
//! assembled from per-interface blocks, and the HID class descriptors that
//! GET_DESCRIPTOR(HID) returns are addressed as named sub-ranges of that
//! block rather than by hand-counted offsets.
//!
//! Configuration layout (59 bytes):
//! ```text
//!  0..9    Configuration header
//!  9..18   Interface 0 (keyboard, boot subclass)
//! 18..27   HID class descriptor, interface 0
//! 27..34   Endpoint 0x81, interrupt IN
//! 34..43   Interface 1 (mouse, boot subclass)
//! 43..52   HID class descriptor, interface 1
//! 52..59   Endpoint 0x82, interrupt IN
//! ```

use core::ops::Range;

use crate::config::*;
use crate::error::Error;
use crate::hid::keyboard::{KEYBOARD_REPORT_DESCRIPTOR, KEYBOARD_REPORT_SIZE};
use crate::hid::mouse::{MOUSE_REPORT_DESCRIPTOR, MOUSE_REPORT_SIZE};

/// Descriptor type codes (high byte of `wValue` in GET_DESCRIPTOR).
pub mod descriptor_type {
    pub const DEVICE: u8 = 0x01;
    pub const CONFIGURATION: u8 = 0x02;
    pub const STRING: u8 = 0x03;
    pub const INTERFACE: u8 = 0x04;
    pub const ENDPOINT: u8 = 0x05;
    pub const DEVICE_QUALIFIER: u8 = 0x06;
    pub const OTHER_SPEED_CONFIGURATION: u8 = 0x07;
    pub const HID: u8 = 0x21;
    pub const REPORT: u8 = 0x22;
}

use descriptor_type::*;

pub const DEVICE_DESCRIPTOR_LEN: usize = 18;
pub const CONFIGURATION_HEADER_LEN: usize = 9;
pub const INTERFACE_DESCRIPTOR_LEN: usize = 9;
pub const HID_DESCRIPTOR_LEN: usize = 9;
pub const ENDPOINT_DESCRIPTOR_LEN: usize = 7;
pub const QUALIFIER_DESCRIPTOR_LEN: usize = 10;

/// Interface + HID + endpoint descriptor for one HID interface.
const INTERFACE_BLOCK_LEN: usize =
    INTERFACE_DESCRIPTOR_LEN + HID_DESCRIPTOR_LEN + ENDPOINT_DESCRIPTOR_LEN;

/// `wTotalLength` of the configuration block.
pub const CONFIGURATION_TOTAL_LEN: usize =
    CONFIGURATION_HEADER_LEN + NUM_INTERFACES as usize * INTERFACE_BLOCK_LEN;

const USB_VERSION: u16 = 0x0200;
/// bcdHID per interface: the keyboard declares HID 1.11, the mouse 1.10.
const KEYBOARD_HID_VERSION: u16 = 0x0111;
const MOUSE_HID_VERSION: u16 = 0x0110;
const CLASS_HID: u8 = 0x03;
const SUBCLASS_BOOT: u8 = 0x01;
const PROTOCOL_KEYBOARD: u8 = 0x01;
const PROTOCOL_MOUSE: u8 = 0x02;
const TRANSFER_INTERRUPT: u8 = 0x03;
/// bmAttributes: bus powered, remote wakeup capable.
const ATTRIBUTES: u8 = 0xA0;

const STRING_MANUFACTURER: u8 = 1;
const STRING_PRODUCT: u8 = 2;

const fn lo(value: usize) -> u8 {
    value as u8
}

const fn hi(value: usize) -> u8 {
    (value >> 8) as u8
}

const fn interface_block_offset(interface: u8) -> usize {
    CONFIGURATION_HEADER_LEN + interface as usize * INTERFACE_BLOCK_LEN
}

/// Byte range of the HID class descriptor embedded for `interface`.
pub const fn hid_descriptor_range(interface: u8) -> Range<usize> {
    let start = interface_block_offset(interface) + INTERFACE_DESCRIPTOR_LEN;
    start..start + HID_DESCRIPTOR_LEN
}

// Device

pub static DEVICE_DESCRIPTOR: [u8; DEVICE_DESCRIPTOR_LEN] = [
    DEVICE_DESCRIPTOR_LEN as u8, // bLength
    DEVICE,                      // bDescriptorType
    lo(USB_VERSION as usize),    // bcdUSB 2.00
    hi(USB_VERSION as usize),
    0x00,                  // bDeviceClass (per interface)
    0x00,                  // bDeviceSubClass
    0x00,                  // bDeviceProtocol
    EP0_MAX_PACKET as u8,  // bMaxPacketSize0
    lo(USB_VID as usize),  // idVendor
    hi(USB_VID as usize),
    lo(USB_PID as usize),  // idProduct
    hi(USB_PID as usize),
    lo(USB_DEVICE_RELEASE as usize), // bcdDevice
    hi(USB_DEVICE_RELEASE as usize),
    STRING_MANUFACTURER, // iManufacturer
    STRING_PRODUCT,      // iProduct
    0x00,                // iSerialNumber
    0x01,                // bNumConfigurations
];

// Configuration

const fn interface_block(
    number: u8,
    protocol: u8,
    hid_version: u16,
    report_descriptor_len: usize,
    endpoint: u8,
    max_packet: usize,
) -> [u8; INTERFACE_BLOCK_LEN] {
    [
        // Interface
        INTERFACE_DESCRIPTOR_LEN as u8,
        INTERFACE,
        number,
        0x00, // bAlternateSetting
        0x01, // bNumEndpoints
        CLASS_HID,
        SUBCLASS_BOOT,
        protocol,
        0x00, // iInterface
        // HID class descriptor
        HID_DESCRIPTOR_LEN as u8,
        HID,
        lo(hid_version as usize),
        hi(hid_version as usize),
        0x00, // bCountryCode
        0x01, // bNumDescriptors
        REPORT,
        lo(report_descriptor_len),
        hi(report_descriptor_len),
        // Endpoint
        ENDPOINT_DESCRIPTOR_LEN as u8,
        ENDPOINT,
        0x80 | endpoint, // IN
        TRANSFER_INTERRUPT,
        lo(max_packet),
        hi(max_packet),
        USB_HID_POLL_MS,
    ]
}

const fn build_configuration(descriptor_type: u8) -> [u8; CONFIGURATION_TOTAL_LEN] {
    let header: [u8; CONFIGURATION_HEADER_LEN] = [
        CONFIGURATION_HEADER_LEN as u8,
        descriptor_type,
        lo(CONFIGURATION_TOTAL_LEN),
        hi(CONFIGURATION_TOTAL_LEN),
        NUM_INTERFACES,
        CONFIGURATION_VALUE,
        0x00, // iConfiguration
        ATTRIBUTES,
        (USB_MAX_POWER_MA / 2) as u8, // bMaxPower, 2 mA units
    ];
    let keyboard = interface_block(
        KEYBOARD_INTERFACE,
        PROTOCOL_KEYBOARD,
        KEYBOARD_HID_VERSION,
        KEYBOARD_REPORT_DESCRIPTOR.len(),
        KEYBOARD_ENDPOINT,
        KEYBOARD_REPORT_SIZE,
    );
    let mouse = interface_block(
        MOUSE_INTERFACE,
        PROTOCOL_MOUSE,
        MOUSE_HID_VERSION,
        MOUSE_REPORT_DESCRIPTOR.len(),
        MOUSE_ENDPOINT,
        MOUSE_REPORT_SIZE,
    );

    let mut out = [0u8; CONFIGURATION_TOTAL_LEN];
    let mut i = 0;
    while i < CONFIGURATION_HEADER_LEN {
        out[i] = header[i];
        i += 1;
    }
    let kb_at = interface_block_offset(KEYBOARD_INTERFACE);
    let mouse_at = interface_block_offset(MOUSE_INTERFACE);
    let mut j = 0;
    while j < INTERFACE_BLOCK_LEN {
        out[kb_at + j] = keyboard[j];
        out[mouse_at + j] = mouse[j];
        j += 1;
    }
    out
}

pub static CONFIGURATION_DESCRIPTOR: [u8; CONFIGURATION_TOTAL_LEN] =
    build_configuration(CONFIGURATION);

/// Full-speed only: the other-speed configuration mirrors the normal one.
pub static OTHER_SPEED_DESCRIPTOR: [u8; CONFIGURATION_TOTAL_LEN] =
    build_configuration(OTHER_SPEED_CONFIGURATION);

pub static QUALIFIER_DESCRIPTOR: [u8; QUALIFIER_DESCRIPTOR_LEN] = [
    QUALIFIER_DESCRIPTOR_LEN as u8,
    DEVICE_QUALIFIER,
    lo(USB_VERSION as usize),
    hi(USB_VERSION as usize),
    0xFF, // bDeviceClass (vendor specific)
    0x00, // bDeviceSubClass
    0xFF, // bDeviceProtocol
    EP0_MAX_PACKET as u8,
    0x01, // bNumConfigurations
    0x00, // bReserved
];

// Strings

/// Language table: US English only.
pub static LANGUAGE_DESCRIPTOR: [u8; 4] = [0x04, STRING, 0x09, 0x04];

const fn string_descriptor_len(s: &str) -> usize {
    2 + 2 * s.len()
}

/// UTF-16LE string descriptor from an ASCII string.
const fn string_descriptor<const N: usize>(s: &str) -> [u8; N] {
    let bytes = s.as_bytes();
    let mut out = [0u8; N];
    out[0] = N as u8;
    out[1] = STRING;
    let mut i = 0;
    while i < bytes.len() && 3 + 2 * i < N {
        out[2 + 2 * i] = bytes[i];
        i += 1;
    }
    out
}

const MANUFACTURER_LEN: usize = string_descriptor_len(USB_MANUFACTURER);
const PRODUCT_LEN: usize = string_descriptor_len(USB_PRODUCT);

pub static MANUFACTURER_DESCRIPTOR: [u8; MANUFACTURER_LEN] = string_descriptor(USB_MANUFACTURER);

pub static PRODUCT_DESCRIPTOR: [u8; PRODUCT_LEN] = string_descriptor(USB_PRODUCT);

// Lookup

/// A resolved descriptor: the bytes plus the length the descriptor declares
/// for itself (`bLength`, `wTotalLength`, or the full report descriptor).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub bytes: &'static [u8],
    pub declared_len: u16,
}

impl Descriptor {
    fn new(descriptor_type: u8, bytes: &'static [u8]) -> Self {
        let declared_len = match descriptor_type {
            CONFIGURATION | OTHER_SPEED_CONFIGURATION => u16::from_le_bytes([bytes[2], bytes[3]]),
            REPORT => bytes.len() as u16,
            _ => bytes[0] as u16,
        };
        Self {
            bytes,
            declared_len,
        }
    }
}

/// Resolve a GET_DESCRIPTOR request.
///
/// `index` is the low byte of `wValue` (string index); `w_index` selects the
/// interface for HID and report descriptors.
pub fn lookup(descriptor_type: u8, index: u8, w_index: u16) -> Result<Descriptor, Error> {
    let bytes: &'static [u8] = match descriptor_type {
        DEVICE => &DEVICE_DESCRIPTOR,
        CONFIGURATION => &CONFIGURATION_DESCRIPTOR,
        HID => hid_class_descriptor(interface_number(w_index))?,
        REPORT => report_descriptor(interface_number(w_index))?,
        STRING => string_descriptor_for(index)?,
        DEVICE_QUALIFIER => &QUALIFIER_DESCRIPTOR,
        OTHER_SPEED_CONFIGURATION => &OTHER_SPEED_DESCRIPTOR,
        _ => return Err(Error::UnsupportedRequest),
    };
    Ok(Descriptor::new(descriptor_type, bytes))
}

/// Interface selected by a HID or report descriptor request: the low byte
/// of `wIndex`.
fn interface_number(w_index: u16) -> u8 {
    w_index as u8
}

/// The 9-byte HID class descriptor of `interface`, borrowed from the
/// configuration block.
pub fn hid_class_descriptor(interface: u8) -> Result<&'static [u8], Error> {
    match interface {
        KEYBOARD_INTERFACE | MOUSE_INTERFACE => {
            Ok(&CONFIGURATION_DESCRIPTOR[hid_descriptor_range(interface)])
        }
        _ => Err(Error::UnsupportedDescriptorIndex),
    }
}

pub fn report_descriptor(interface: u8) -> Result<&'static [u8], Error> {
    match interface {
        KEYBOARD_INTERFACE => Ok(KEYBOARD_REPORT_DESCRIPTOR),
        MOUSE_INTERFACE => Ok(MOUSE_REPORT_DESCRIPTOR),
        _ => Err(Error::UnsupportedDescriptorIndex),
    }
}

fn string_descriptor_for(index: u8) -> Result<&'static [u8], Error> {
    match index {
        0 => Ok(&LANGUAGE_DESCRIPTOR),
        STRING_MANUFACTURER => Ok(&MANUFACTURER_DESCRIPTOR),
        STRING_PRODUCT => Ok(&PRODUCT_DESCRIPTOR),
        _ => Err(Error::UnsupportedDescriptorIndex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walk the configuration block descriptor by descriptor.
    fn walk(block: &[u8]) -> heapless::Vec<(usize, u8), 16> {
        let mut found = heapless::Vec::new();
        let mut at = 0;
        while at < block.len() {
            found.push((at, block[at + 1])).unwrap();
            at += block[at] as usize;
        }
        assert_eq!(at, block.len());
        found
    }

    #[test]
    fn every_table_starts_with_its_own_length() {
        for (descriptor_type, index, w_index) in [
            (DEVICE, 0, 0),
            (CONFIGURATION, 0, 0),
            (HID, 0, 0),
            (HID, 0, 1),
            (STRING, 0, 0),
            (STRING, 1, 0x0409),
            (STRING, 2, 0x0409),
            (DEVICE_QUALIFIER, 0, 0),
            (OTHER_SPEED_CONFIGURATION, 0, 0),
        ] {
            let descriptor = lookup(descriptor_type, index, w_index).unwrap();
            let bytes = descriptor.bytes;
            assert_eq!(bytes[1], descriptor_type);
            match descriptor_type {
                CONFIGURATION | OTHER_SPEED_CONFIGURATION => {
                    assert_eq!(bytes[0] as usize, CONFIGURATION_HEADER_LEN);
                    assert_eq!(descriptor.declared_len as usize, bytes.len());
                }
                _ => assert_eq!(bytes[0] as usize, bytes.len()),
            }
        }
    }

    #[test]
    fn configuration_total_length_is_59() {
        assert_eq!(CONFIGURATION_TOTAL_LEN, 59);
        let descriptor = lookup(CONFIGURATION, 0, 0).unwrap();
        assert_eq!(descriptor.declared_len, 59);
        assert_eq!(CONFIGURATION_DESCRIPTOR[2], 59);
        assert_eq!(CONFIGURATION_DESCRIPTOR[3], 0);
    }

    #[test]
    fn configuration_block_sequence() {
        let types: heapless::Vec<u8, 16> = walk(&CONFIGURATION_DESCRIPTOR)
            .iter()
            .map(|&(_, t)| t)
            .collect();
        assert_eq!(
            &types[..],
            &[CONFIGURATION, INTERFACE, HID, ENDPOINT, INTERFACE, HID, ENDPOINT]
        );
    }

    #[test]
    fn hid_descriptors_sit_at_named_offsets() {
        assert_eq!(hid_descriptor_range(0), 18..27);
        assert_eq!(hid_descriptor_range(1), 43..52);
        for (at, t) in walk(&CONFIGURATION_DESCRIPTOR) {
            if t == HID {
                assert!(at == 18 || at == 43);
            }
        }
    }

    #[test]
    fn hid_descriptor_declares_report_descriptor_length() {
        let kb = hid_class_descriptor(0).unwrap();
        assert_eq!(kb[6], REPORT);
        assert_eq!(
            u16::from_le_bytes([kb[7], kb[8]]) as usize,
            KEYBOARD_REPORT_DESCRIPTOR.len()
        );
        let mouse = hid_class_descriptor(1).unwrap();
        assert_eq!(
            u16::from_le_bytes([mouse[7], mouse[8]]) as usize,
            MOUSE_REPORT_DESCRIPTOR.len()
        );
        assert_eq!(MOUSE_REPORT_DESCRIPTOR.len(), 52);
    }

    #[test]
    fn endpoints_match_report_sizes() {
        let ep = &CONFIGURATION_DESCRIPTOR[27..34];
        assert_eq!(ep[2], 0x81);
        assert_eq!(ep[4] as usize, KEYBOARD_REPORT_SIZE);
        let ep = &CONFIGURATION_DESCRIPTOR[52..59];
        assert_eq!(ep[2], 0x82);
        assert_eq!(ep[4] as usize, MOUSE_REPORT_SIZE);
    }

    #[test]
    fn qualifier_bytes() {
        assert_eq!(
            QUALIFIER_DESCRIPTOR,
            [0x0A, 0x06, 0x00, 0x02, 0xFF, 0x00, 0xFF, 0x40, 0x01, 0x00]
        );
    }

    #[test]
    fn hid_class_descriptor_versions_per_interface() {
        let kb_len = KEYBOARD_REPORT_DESCRIPTOR.len() as u8;
        assert_eq!(
            CONFIGURATION_DESCRIPTOR[18..27],
            [0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, kb_len, 0x00]
        );
        assert_eq!(
            CONFIGURATION_DESCRIPTOR[43..52],
            [0x09, 0x21, 0x10, 0x01, 0x00, 0x01, 0x22, 0x34, 0x00]
        );
    }

    #[test]
    fn other_speed_mirrors_configuration() {
        assert_eq!(OTHER_SPEED_DESCRIPTOR[1], OTHER_SPEED_CONFIGURATION);
        assert_eq!(OTHER_SPEED_DESCRIPTOR[2..], CONFIGURATION_DESCRIPTOR[2..]);
    }

    #[test]
    fn device_descriptor_fields() {
        assert_eq!(DEVICE_DESCRIPTOR[7], 64);
        assert_eq!(u16::from_le_bytes([DEVICE_DESCRIPTOR[8], DEVICE_DESCRIPTOR[9]]), USB_VID);
        assert_eq!(u16::from_le_bytes([DEVICE_DESCRIPTOR[10], DEVICE_DESCRIPTOR[11]]), USB_PID);
        assert_eq!(DEVICE_DESCRIPTOR[17], 1);
    }

    #[test]
    fn strings_are_utf16() {
        assert_eq!(
            &MANUFACTURER_DESCRIPTOR[..],
            &[0x0E, 0x03, b'w', 0, b'c', 0, b'h', 0, b'.', 0, b'c', 0, b'n', 0]
        );
        assert_eq!(
            &PRODUCT_DESCRIPTOR[..],
            &[0x0C, 0x03, b'C', 0, b'H', 0, b'5', 0, b'7', 0, b'x', 0]
        );
    }

    #[test]
    fn report_descriptor_lookup_reports_full_length() {
        let descriptor = lookup(REPORT, 0, 0).unwrap();
        assert_eq!(descriptor.bytes, KEYBOARD_REPORT_DESCRIPTOR);
        assert_eq!(descriptor.declared_len as usize, KEYBOARD_REPORT_DESCRIPTOR.len());
    }

    #[test]
    fn out_of_range_indices() {
        assert_eq!(lookup(STRING, 3, 0), Err(Error::UnsupportedDescriptorIndex));
        assert_eq!(lookup(HID, 0, 2), Err(Error::UnsupportedDescriptorIndex));
        assert_eq!(lookup(REPORT, 0, 0x0102), Err(Error::UnsupportedDescriptorIndex));
        assert_eq!(lookup(0x0F, 0, 0), Err(Error::UnsupportedRequest));
    }

    #[test]
    fn interface_comes_from_low_byte_of_w_index() {
        let descriptor = lookup(REPORT, 0, 0x0101).unwrap();
        assert_eq!(descriptor.bytes, MOUSE_REPORT_DESCRIPTOR);
        let descriptor = lookup(HID, 0, 0xFF00).unwrap();
        assert_eq!(descriptor.bytes, &CONFIGURATION_DESCRIPTOR[18..27]);
    }
}
