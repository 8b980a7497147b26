//! Control request dispatcher.
//!
//! [`handle_setup`] turns one setup packet into a decision about the data
//! stage of the control transfer. It validates everything a request names
//! before it mutates the [`DeviceContext`], so a request that ends in a
//! STALL leaves no partial side effects behind.

use heapless::Vec;

use crate::config::*;
use crate::error::Error;
use crate::hid::keyboard::KEYBOARD_REPORT_SIZE;
use crate::hid::{HidReport, KeyboardReport, LedState, MouseReport, Protocol};
use crate::usb::descriptor;
use crate::usb::endpoint::{EndpointAddress, Endpoints};
use crate::usb::setup::{feature, Direction, ReportType, Request, SetupPacket, Target};
use crate::usb::transfer::TransferCursor;

/// Largest reply built from device state (a full keyboard report).
pub const MAX_REPLY_LEN: usize = KEYBOARD_REPORT_SIZE;

pub type Reply = Vec<u8, MAX_REPLY_LEN>;

/// Device-level state negotiated with the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfigState {
    /// 0..=127; only changes once a SET_ADDRESS status stage completes.
    pub address: u8,
    /// 0 (addressed) or [`CONFIGURATION_VALUE`] (configured).
    pub configuration: u8,
    /// SET_IDLE duration in 4 ms units, 0 = report only on change.
    pub idle_rate: u8,
    pub protocol: Protocol,
    pub remote_wakeup: bool,
    pub suspended: bool,
}

impl DeviceConfigState {
    pub const fn new() -> Self {
        Self {
            address: 0,
            configuration: 0,
            idle_rate: 0,
            protocol: Protocol::Report,
            remote_wakeup: false,
            suspended: false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configuration != 0
    }
}

impl Default for DeviceConfigState {
    fn default() -> Self {
        Self::new()
    }
}

/// All mutable protocol state of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceContext {
    pub config: DeviceConfigState,
    pub endpoints: Endpoints,
    pub leds: LedState,
    /// Last reports handed to the emitter, served by GET_REPORT.
    pub last_keyboard: KeyboardReport,
    pub last_mouse: MouseReport,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceContext {
    pub const fn new() -> Self {
        Self {
            config: DeviceConfigState::new(),
            endpoints: Endpoints::new(),
            leds: LedState {
                num_lock: false,
                caps_lock: false,
                scroll_lock: false,
            },
            last_keyboard: KeyboardReport::empty(),
            last_mouse: MouseReport::empty(),
        }
    }

    pub fn last_report(&self, interface: u8) -> Option<HidReport> {
        match interface {
            KEYBOARD_INTERFACE => Some(HidReport::Keyboard(self.last_keyboard)),
            MOUSE_INTERFACE => Some(HidReport::Mouse(self.last_mouse)),
            _ => None,
        }
    }
}

/// What happens in the data stage of an accepted request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataStage {
    /// No data stage; the status stage is a zero-length IN.
    None,
    /// Upload from the descriptor store, one EP0 packet per IN token.
    Descriptor(TransferCursor),
    /// Short upload built from device state.
    Reply(Reply),
    /// The host sends a report in an OUT data stage.
    Receive { interface: u8, report_type: ReportType },
}

/// Deferred until the status stage completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusAction {
    None,
    SetAddress(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accepted {
    pub data: DataStage,
    pub after_status: StatusAction,
}

impl Accepted {
    fn with(data: DataStage) -> Self {
        Self {
            data,
            after_status: StatusAction::None,
        }
    }
}

/// Dispatch one setup packet.
///
/// `Err` means the transfer must be aborted with a STALL on both directions
/// of endpoint 0. Endpoint-0 toggles are the caller's business.
pub fn handle_setup(ctx: &mut DeviceContext, setup: &SetupPacket) -> Result<Accepted, Error> {
    let request = Request::decode(setup);
    trace!("setup {}", request);

    if let Some(expected) = data_direction(&request) {
        if setup.request_type.direction() != expected {
            return Err(Error::UnsupportedRequest);
        }
    }

    let data = match request {
        Request::GetStatus(target) => {
            let status = get_status(ctx, target)?;
            reply(&status.to_le_bytes(), setup.length)?
        }
        Request::ClearFeature { target, feature } => {
            set_feature(ctx, target, feature, false)?;
            DataStage::None
        }
        Request::SetFeature { target, feature } => {
            set_feature(ctx, target, feature, true)?;
            DataStage::None
        }
        Request::SetAddress(value) => {
            let address = u8::try_from(value)
                .ok()
                .filter(|a| *a <= 127)
                .ok_or(Error::UnsupportedRequest)?;
            return Ok(Accepted {
                data: DataStage::None,
                after_status: StatusAction::SetAddress(address),
            });
        }
        Request::GetDescriptor {
            descriptor_type,
            index,
            w_index,
        } => {
            let found = descriptor::lookup(descriptor_type, index, w_index)?;
            DataStage::Descriptor(TransferCursor::start(
                found.bytes,
                found.declared_len,
                setup.length,
                EP0_MAX_PACKET,
            ))
        }
        Request::GetConfiguration => reply(&[ctx.config.configuration], setup.length)?,
        Request::SetConfiguration(value) => {
            set_configuration(ctx, value)?;
            DataStage::None
        }
        Request::GetInterface(interface) => {
            check_interface(interface)?;
            reply(&[0], setup.length)?
        }
        Request::SetInterface {
            interface,
            alternate,
        } => {
            check_interface(interface)?;
            if alternate != 0 {
                return Err(Error::UnsupportedRequest);
            }
            DataStage::None
        }

        Request::GetReport {
            interface,
            report_type,
            ..
        } => {
            let report = ctx
                .last_report(interface)
                .ok_or(Error::UnsupportedDescriptorIndex)?;
            if report_type != ReportType::Input {
                return Err(Error::UnsupportedRequest);
            }
            let mut buf = [0u8; MAX_REPLY_LEN];
            let len = report.serialize(ctx.config.protocol, &mut buf);
            reply(&buf[..len], setup.length)?
        }
        Request::SetReport {
            interface,
            report_type,
            ..
        } => {
            check_interface(interface)?;
            // The OUT data stage is handled as a single EP0 packet.
            if setup.length as usize > EP0_MAX_PACKET {
                return Err(Error::BufferOverflow);
            }
            if setup.length == 0 {
                DataStage::None
            } else {
                DataStage::Receive {
                    interface,
                    report_type,
                }
            }
        }
        Request::GetIdle { interface, .. } => {
            check_interface(interface)?;
            reply(&[ctx.config.idle_rate], setup.length)?
        }
        Request::SetIdle {
            interface,
            duration,
            ..
        } => {
            check_interface(interface)?;
            ctx.config.idle_rate = duration;
            DataStage::None
        }
        Request::GetProtocol { interface } => {
            check_interface(interface)?;
            reply(&[ctx.config.protocol as u8], setup.length)?
        }
        Request::SetProtocol {
            interface,
            protocol,
        } => {
            check_interface(interface)?;
            let protocol = protocol.ok_or(Error::UnsupportedRequest)?;
            ctx.config.protocol = protocol;
            debug!("protocol {}", protocol);
            DataStage::None
        }

        Request::Unsupported => return Err(Error::UnsupportedRequest),
    };

    Ok(Accepted::with(data))
}

/// Direction a request's data stage must have, if it has one.
fn data_direction(request: &Request) -> Option<Direction> {
    match request {
        Request::GetStatus(_)
        | Request::GetDescriptor { .. }
        | Request::GetConfiguration
        | Request::GetInterface(_)
        | Request::GetReport { .. }
        | Request::GetIdle { .. }
        | Request::GetProtocol { .. } => Some(Direction::DeviceToHost),
        Request::Unsupported => None,
        _ => Some(Direction::HostToDevice),
    }
}

fn reply(data: &[u8], requested: u16) -> Result<DataStage, Error> {
    let len = data.len().min(requested as usize);
    Reply::from_slice(&data[..len])
        .map(DataStage::Reply)
        .map_err(|_| Error::BufferOverflow)
}

fn check_interface(interface: u8) -> Result<(), Error> {
    if interface < NUM_INTERFACES {
        Ok(())
    } else {
        Err(Error::UnsupportedDescriptorIndex)
    }
}

/// GET_STATUS payload.
fn get_status(ctx: &DeviceContext, target: Target) -> Result<u16, Error> {
    match target {
        // bit 0 self powered (never), bit 1 remote wakeup armed
        Target::Device => Ok((ctx.config.remote_wakeup as u16) << 1),
        Target::Interface(interface) => {
            check_interface(interface)?;
            Ok(0)
        }
        // The control endpoint only stalls for the current transfer.
        Target::Endpoint(raw) if raw & 0x7F == 0 => Ok(0),
        Target::Endpoint(raw) => {
            let address = EndpointAddress::from_raw(raw)?;
            let halted = ctx.endpoints.at(address).is_halted(address.direction);
            Ok(halted as u16)
        }
    }
}

/// SET_FEATURE (`set`) or CLEAR_FEATURE.
fn set_feature(
    ctx: &mut DeviceContext,
    target: Target,
    selector: u16,
    set: bool,
) -> Result<(), Error> {
    match (target, selector) {
        (Target::Device, feature::DEVICE_REMOTE_WAKEUP) => {
            ctx.config.remote_wakeup = set;
            debug!("remote wakeup armed: {}", set);
        }
        (Target::Endpoint(raw), feature::ENDPOINT_HALT) => {
            let address = EndpointAddress::from_raw(raw)?;
            let endpoint = ctx.endpoints.at_mut(address);
            if set {
                endpoint.halt(address.direction);
            } else {
                endpoint.clear_halt(address.direction);
            }
            debug!("EP {=u8:#x} halted: {}", address.raw(), set);
        }
        _ => return Err(Error::UnsupportedRequest),
    }
    Ok(())
}

fn set_configuration(ctx: &mut DeviceContext, value: u16) -> Result<(), Error> {
    let value = match value {
        0 => 0,
        v if v == CONFIGURATION_VALUE as u16 => CONFIGURATION_VALUE,
        _ => return Err(Error::UnsupportedRequest),
    };
    ctx.config.configuration = value;
    for endpoint in ctx.endpoints.interrupt_mut() {
        endpoint.reconfigure();
    }
    info!("configuration {=u8}", value);
    Ok(())
}
