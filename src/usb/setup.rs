//! Setup packet parsing and request decoding.
//!
//! A setup packet is decoded exactly once into a [`Request`]; the control
//! dispatcher then matches on the variant and never looks at raw
//! `bmRequestType` bits again.

use crate::hid::Protocol;

/// Length of a setup packet on the wire.
pub const SETUP_PACKET_SIZE: usize = 8;

/// Standard request codes (USB 2.0 table 9-4).
pub mod request {
    pub const GET_STATUS: u8 = 0x00;
    pub const CLEAR_FEATURE: u8 = 0x01;
    pub const SET_FEATURE: u8 = 0x03;
    pub const SET_ADDRESS: u8 = 0x05;
    pub const GET_DESCRIPTOR: u8 = 0x06;
    pub const GET_CONFIGURATION: u8 = 0x08;
    pub const SET_CONFIGURATION: u8 = 0x09;
    pub const GET_INTERFACE: u8 = 0x0A;
    pub const SET_INTERFACE: u8 = 0x0B;
}

/// HID class request codes (HID 1.11 section 7.2).
pub mod hid_request {
    pub const GET_REPORT: u8 = 0x01;
    pub const GET_IDLE: u8 = 0x02;
    pub const GET_PROTOCOL: u8 = 0x03;
    pub const SET_REPORT: u8 = 0x09;
    pub const SET_IDLE: u8 = 0x0A;
    pub const SET_PROTOCOL: u8 = 0x0B;
}

/// Feature selectors.
pub mod feature {
    pub const ENDPOINT_HALT: u16 = 0;
    pub const DEVICE_REMOTE_WAKEUP: u16 = 1;
}

/// Data stage direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestKind {
    Standard,
    Class,
    Vendor,
    Reserved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}

/// The `bmRequestType` bitfield.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestType(pub u8);

impl RequestType {
    #[inline]
    pub fn direction(&self) -> Direction {
        if self.0 & 0x80 == 0 {
            Direction::HostToDevice
        } else {
            Direction::DeviceToHost
        }
    }

    #[inline]
    pub fn kind(&self) -> RequestKind {
        match (self.0 >> 5) & 0b11 {
            0 => RequestKind::Standard,
            1 => RequestKind::Class,
            2 => RequestKind::Vendor,
            _ => RequestKind::Reserved,
        }
    }

    #[inline]
    pub fn recipient(&self) -> Recipient {
        match self.0 & 0b1_1111 {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            _ => Recipient::Reserved,
        }
    }
}

/// An 8-byte setup packet. Immutable once received.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupPacket {
    pub request_type: RequestType,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    /// Parse the little-endian wire format. Extra bytes are ignored.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < SETUP_PACKET_SIZE {
            return None;
        }
        Some(Self {
            request_type: RequestType(data[0]),
            request: data[1],
            value: u16::from_le_bytes([data[2], data[3]]),
            index: u16::from_le_bytes([data[4], data[5]]),
            length: u16::from_le_bytes([data[6], data[7]]),
        })
    }

    /// Wire format of this packet.
    pub fn to_bytes(&self) -> [u8; SETUP_PACKET_SIZE] {
        let [v0, v1] = self.value.to_le_bytes();
        let [i0, i1] = self.index.to_le_bytes();
        let [l0, l1] = self.length.to_le_bytes();
        [self.request_type.0, self.request, v0, v1, i0, i1, l0, l1]
    }

    /// High byte of `wValue`.
    #[inline]
    pub fn value_high(&self) -> u8 {
        (self.value >> 8) as u8
    }

    /// Low byte of `wValue`.
    #[inline]
    pub fn value_low(&self) -> u8 {
        self.value as u8
    }

    /// Low byte of `wIndex` (interface number or endpoint address).
    #[inline]
    pub fn index_low(&self) -> u8 {
        self.index as u8
    }
}

/// Target of a GET_STATUS / CLEAR_FEATURE / SET_FEATURE request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    Device,
    Interface(u8),
    /// Raw endpoint address, bit 7 = IN.
    Endpoint(u8),
}

/// HID report type carried in the high byte of `wValue`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportType {
    Input,
    Output,
    Feature,
    Reserved(u8),
}

impl From<u8> for ReportType {
    fn from(value: u8) -> Self {
        match value {
            1 => ReportType::Input,
            2 => ReportType::Output,
            3 => ReportType::Feature,
            other => ReportType::Reserved(other),
        }
    }
}

/// A decoded control request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    GetStatus(Target),
    ClearFeature { target: Target, feature: u16 },
    SetFeature { target: Target, feature: u16 },
    SetAddress(u16),
    GetDescriptor { descriptor_type: u8, index: u8, w_index: u16 },
    GetConfiguration,
    SetConfiguration(u16),
    GetInterface(u8),
    SetInterface { interface: u8, alternate: u16 },

    GetReport { interface: u8, report_type: ReportType, report_id: u8 },
    SetReport { interface: u8, report_type: ReportType, report_id: u8 },
    GetIdle { interface: u8, report_id: u8 },
    SetIdle { interface: u8, report_id: u8, duration: u8 },
    GetProtocol { interface: u8 },
    /// `None` when `wValue` names neither boot nor report protocol.
    SetProtocol { interface: u8, protocol: Option<Protocol> },

    /// Vendor requests, reserved types, and codes the device does not know.
    Unsupported,
}

impl Request {
    /// Classify a setup packet by type, recipient and code.
    pub fn decode(setup: &SetupPacket) -> Self {
        match setup.request_type.kind() {
            RequestKind::Standard => Self::decode_standard(setup),
            RequestKind::Class => Self::decode_class(setup),
            RequestKind::Vendor | RequestKind::Reserved => Request::Unsupported,
        }
    }

    fn decode_standard(setup: &SetupPacket) -> Self {
        let target = match setup.request_type.recipient() {
            Recipient::Device => Some(Target::Device),
            Recipient::Interface => Some(Target::Interface(setup.index_low())),
            Recipient::Endpoint => Some(Target::Endpoint(setup.index_low())),
            Recipient::Other | Recipient::Reserved => None,
        };

        match (setup.request, target) {
            (request::GET_STATUS, Some(target)) => Request::GetStatus(target),
            (request::CLEAR_FEATURE, Some(target)) => Request::ClearFeature {
                target,
                feature: setup.value,
            },
            (request::SET_FEATURE, Some(target)) => Request::SetFeature {
                target,
                feature: setup.value,
            },
            (request::SET_ADDRESS, _) => Request::SetAddress(setup.value),
            // Report descriptors are requested with an interface recipient,
            // so the recipient is not checked here.
            (request::GET_DESCRIPTOR, _) => Request::GetDescriptor {
                descriptor_type: setup.value_high(),
                index: setup.value_low(),
                w_index: setup.index,
            },
            (request::GET_CONFIGURATION, _) => Request::GetConfiguration,
            (request::SET_CONFIGURATION, _) => Request::SetConfiguration(setup.value),
            (request::GET_INTERFACE, _) => Request::GetInterface(setup.index_low()),
            (request::SET_INTERFACE, _) => Request::SetInterface {
                interface: setup.index_low(),
                alternate: setup.value,
            },
            _ => Request::Unsupported,
        }
    }

    fn decode_class(setup: &SetupPacket) -> Self {
        if setup.request_type.recipient() != Recipient::Interface {
            return Request::Unsupported;
        }
        let interface = setup.index_low();
        match setup.request {
            hid_request::GET_REPORT => Request::GetReport {
                interface,
                report_type: ReportType::from(setup.value_high()),
                report_id: setup.value_low(),
            },
            hid_request::SET_REPORT => Request::SetReport {
                interface,
                report_type: ReportType::from(setup.value_high()),
                report_id: setup.value_low(),
            },
            hid_request::GET_IDLE => Request::GetIdle {
                interface,
                report_id: setup.value_low(),
            },
            hid_request::SET_IDLE => Request::SetIdle {
                interface,
                report_id: setup.value_low(),
                duration: setup.value_high(),
            },
            hid_request::GET_PROTOCOL => Request::GetProtocol { interface },
            hid_request::SET_PROTOCOL => Request::SetProtocol {
                interface,
                protocol: u8::try_from(setup.value).ok().and_then(Protocol::from_u8),
            },
            _ => Request::Unsupported,
        }
    }
}
