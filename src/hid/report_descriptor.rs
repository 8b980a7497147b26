//! HID report descriptor introspection.
//!
//! Walks the item stream of a report descriptor and computes the size of
//! the input, output and feature reports it declares, plus the usage of
//! the top-level application collection. Board code and the test suite use
//! it to check a report descriptor against the report struct it describes.
//!
//! ## Limitations
//!
//! - Report IDs are not supported (the device uses none)
//! - Push/Pop state is not supported
//! - Long items are rejected

/// Application collection kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Application {
    Keyboard,
    Mouse,
    Other(u16, u16),
}

/// Usage page codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsagePage {
    /// Generic Desktop (mouse, keyboard, joystick).
    GenericDesktop,
    /// Keyboard/Keypad.
    Keyboard,
    /// LEDs.
    Led,
    /// Button.
    Button,
    /// Unknown/unsupported.
    Unknown(u16),
}

impl From<u16> for UsagePage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => UsagePage::GenericDesktop,
            0x07 => UsagePage::Keyboard,
            0x08 => UsagePage::Led,
            0x09 => UsagePage::Button,
            other => UsagePage::Unknown(other),
        }
    }
}

/// Sizes declared by a report descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportLayout {
    pub application: Application,
    pub input_bits: u32,
    pub output_bits: u32,
    pub feature_bits: u32,
}

impl ReportLayout {
    /// Input report length in bytes.
    pub fn input_bytes(&self) -> usize {
        self.input_bits.div_ceil(8) as usize
    }

    /// Output report length in bytes.
    pub fn output_bytes(&self) -> usize {
        self.output_bits.div_ceil(8) as usize
    }

    /// Parse a HID Report Descriptor.
    ///
    /// Returns `None` for truncated items, long items, report IDs,
    /// unbalanced collections, or a descriptor without an application
    /// collection.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut layout = ReportLayout {
            application: Application::Other(0, 0),
            input_bits: 0,
            output_bits: 0,
            feature_bits: 0,
        };

        // Parser state.
        let mut usage_page: u16 = 0;
        let mut usage: u16 = 0;
        let mut report_size: u32 = 0;
        let mut report_count: u32 = 0;
        let mut depth: u8 = 0;
        let mut found_application = false;

        let mut i = 0;
        while i < data.len() {
            let prefix = data[i];
            if prefix == 0xFE {
                return None;
            }
            let tag = (prefix >> 4) & 0x0F;
            let item_type = (prefix >> 2) & 0x03;
            let size = match prefix & 0x03 {
                0 => 0,
                1 => 1,
                2 => 2,
                _ => 4,
            };

            if i + 1 + size > data.len() {
                return None;
            }

            let value: u32 = match size {
                0 => 0,
                1 => data[i + 1] as u32,
                2 => u16::from_le_bytes([data[i + 1], data[i + 2]]) as u32,
                _ => u32::from_le_bytes([data[i + 1], data[i + 2], data[i + 3], data[i + 4]]),
            };

            match item_type {
                // Main items
                0 => match tag {
                    // Input
                    0x08 => {
                        layout.input_bits =
                            field_bits(layout.input_bits, report_size, report_count)?
                    }
                    // Output
                    0x09 => {
                        layout.output_bits =
                            field_bits(layout.output_bits, report_size, report_count)?
                    }
                    // Feature
                    0x0B => {
                        layout.feature_bits =
                            field_bits(layout.feature_bits, report_size, report_count)?
                    }
                    // Collection
                    0x0A => {
                        if depth == 0 && value == 0x01 && !found_application {
                            layout.application = match (UsagePage::from(usage_page), usage) {
                                (UsagePage::GenericDesktop, 0x06) => Application::Keyboard,
                                (UsagePage::GenericDesktop, 0x02) => Application::Mouse,
                                (_, other) => Application::Other(usage_page, other),
                            };
                            found_application = true;
                        }
                        depth = depth.checked_add(1)?;
                    }
                    // End Collection
                    0x0C => depth = depth.checked_sub(1)?,
                    _ => {}
                },
                // Global items
                1 => match tag {
                    // Usage Page
                    0x00 => usage_page = value as u16,
                    // Report Size
                    0x07 => report_size = value,
                    // Report ID
                    0x08 => return None,
                    // Report Count
                    0x09 => report_count = value,
                    _ => {}
                },
                // Local items
                2 => {
                    if tag == 0x00 {
                        usage = value as u16;
                    }
                }
                _ => {}
            }

            i += 1 + size;
        }

        if depth == 0 && found_application {
            Some(layout)
        } else {
            debug!("report descriptor: unbalanced or no application collection");
            None
        }
    }
}

/// Add one main item's `size x count` bits to a running total.
fn field_bits(total: u32, report_size: u32, report_count: u32) -> Option<u32> {
    let bits = report_size.checked_mul(report_count);
    if bits.is_none() {
        debug!("report descriptor: field size overflows");
    }
    total.checked_add(bits?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_truncated_item() {
        assert!(ReportLayout::parse(&[0x05]).is_none());
    }

    #[test]
    fn rejects_unbalanced_collection() {
        assert!(ReportLayout::parse(&[0x05, 0x01, 0x09, 0x06, 0xA1, 0x01]).is_none());
        assert!(ReportLayout::parse(&[0xC0]).is_none());
    }

    #[test]
    fn rejects_report_ids() {
        let desc = [0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, 0x85, 0x01, 0xC0];
        assert!(ReportLayout::parse(&desc).is_none());
    }

    #[test]
    fn rejects_oversized_fields() {
        // Report Size and Report Count of 0x0001_0000 each
        let desc = [
            0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, //
            0x77, 0x00, 0x00, 0x01, 0x00, //
            0x97, 0x00, 0x00, 0x01, 0x00, //
            0x81, 0x02, 0xC0,
        ];
        assert!(ReportLayout::parse(&desc).is_none());

        // Each field fits, the running total does not.
        let desc = [
            0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, //
            0x77, 0x00, 0x00, 0x00, 0x80, // size 0x8000_0000
            0x95, 0x01, 0x81, 0x02, // one field
            0x81, 0x02, // and another
            0xC0,
        ];
        assert!(ReportLayout::parse(&desc).is_none());
    }

    #[test]
    fn counts_feature_bits() {
        let desc = [
            0x06, 0x00, 0xFF, // Usage Page (Vendor 0xFF00)
            0x09, 0x01, // Usage (1)
            0xA1, 0x01, // Collection (Application)
            0x75, 0x08, 0x95, 0x04, // 4 x 8 bits
            0xB1, 0x02, // Feature
            0xC0,
        ];
        let layout = ReportLayout::parse(&desc).unwrap();
        assert_eq!(layout.application, Application::Other(0xFF00, 0x01));
        assert_eq!(layout.feature_bits, 32);
        assert_eq!(layout.input_bits, 0);
    }
}
