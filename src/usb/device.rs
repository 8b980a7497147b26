//! The device state machine.
//!
//! [`UsbDevice::advance`] is called once per link interrupt with the event
//! that fired. It runs to completion, issues commands against the
//! [`UsbLink`], and never blocks.

use crate::config::{
    EP0_MAX_PACKET, EP_BUFFER_SIZE, KEYBOARD_ENDPOINT, KEYBOARD_INTERFACE, NUM_ENDPOINTS,
};
use crate::error::Error;
use crate::hid::keyboard::KEYBOARD_REPORT_SIZE;
use crate::hid::{HidReport, KeyboardReport, LedState, MouseReport};
use crate::usb::buffers::EndpointBuffers;
use crate::usb::control::{self, DataStage, DeviceConfigState, DeviceContext, StatusAction};
use crate::usb::endpoint::{Direction, Endpoints, Response};
use crate::usb::link::UsbLink;
use crate::usb::setup::{ReportType, SetupPacket, SETUP_PACKET_SIZE};
use crate::usb::transfer::TransferCursor;

/// Interrupt sources reported by the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbEvent {
    /// A setup packet is waiting on endpoint 0.
    Setup,
    /// An IN transaction on `endpoint` was acknowledged by the host.
    TransferIn { endpoint: u8 },
    /// An OUT transaction on `endpoint` completed. `toggle_ok` is false when
    /// the packet's data PID did not match, i.e. the host re-sent it.
    TransferOut { endpoint: u8, toggle_ok: bool },
    BusReset,
    /// `true` on suspend, `false` on resume.
    Suspend(bool),
}

/// Where the current control transfer stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlStage {
    Idle,
    /// Uploading; the host answers with a zero-length OUT when done.
    DataIn,
    /// Waiting for the host's report in an OUT data stage.
    DataOut { interface: u8, report_type: ReportType },
    /// Zero-length IN queued as the status stage.
    StatusIn,
    /// Upload finished; waiting for the host's zero-length OUT.
    StatusOut,
}

pub struct UsbDevice {
    ctx: DeviceContext,
    stage: ControlStage,
    cursor: TransferCursor,
    after_status: StatusAction,
    buffers: EndpointBuffers,
}

impl Default for UsbDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbDevice {
    pub const fn new() -> Self {
        Self {
            ctx: DeviceContext::new(),
            stage: ControlStage::Idle,
            cursor: TransferCursor::idle(),
            after_status: StatusAction::None,
            buffers: EndpointBuffers::new(),
        }
    }

    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    pub fn config(&self) -> &DeviceConfigState {
        &self.ctx.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.ctx.endpoints
    }

    pub fn leds(&self) -> LedState {
        self.ctx.leds
    }

    pub fn stage(&self) -> ControlStage {
        self.stage
    }

    pub fn cursor(&self) -> &TransferCursor {
        &self.cursor
    }

    pub fn buffers(&self) -> &EndpointBuffers {
        &self.buffers
    }

    /// Handle one link event.
    pub fn advance<L: UsbLink>(&mut self, event: UsbEvent, link: &mut L) {
        match event {
            UsbEvent::Setup => {
                if let Err(e) = self.setup(link) {
                    warn!("control transfer stalled: {}", e);
                    self.abort_control();
                }
                // Feature and configuration requests touch the interrupt
                // endpoints too.
                self.sync_all(link);
            }
            UsbEvent::TransferIn { endpoint: 0 } => {
                if let Err(e) = self.control_in(link) {
                    warn!("control transfer stalled: {}", e);
                    self.abort_control();
                }
                self.sync_endpoint(link, 0);
            }
            UsbEvent::TransferOut {
                endpoint: 0,
                toggle_ok,
            } => {
                if let Err(e) = self.control_out(link, toggle_ok) {
                    warn!("control transfer stalled: {}", e);
                    self.abort_control();
                }
                self.sync_endpoint(link, 0);
            }
            UsbEvent::TransferIn { endpoint } => {
                if let Some(state) = self.ctx.endpoints.get_mut(endpoint) {
                    state.complete_in();
                    self.sync_endpoint(link, endpoint);
                }
            }
            UsbEvent::TransferOut {
                endpoint,
                toggle_ok,
            } => self.interrupt_out(link, endpoint, toggle_ok),
            UsbEvent::BusReset => self.bus_reset(link),
            UsbEvent::Suspend(suspended) => {
                self.ctx.config.suspended = suspended;
                info!("bus {}", if suspended { "suspended" } else { "resumed" });
            }
        }
    }

    // Control endpoint

    fn setup<L: UsbLink>(&mut self, link: &mut L) -> Result<(), Error> {
        // A new setup stage cancels whatever transfer was in flight.
        self.cursor = TransferCursor::idle();
        self.after_status = StatusAction::None;
        self.stage = ControlStage::Idle;
        self.ctx.endpoints.ep0.begin_setup();

        let mut raw = [0u8; SETUP_PACKET_SIZE];
        let len = link.read_setup(&mut raw).min(SETUP_PACKET_SIZE);
        let setup = SetupPacket::parse(&raw[..len]).ok_or(Error::MalformedSetup)?;
        let accepted = control::handle_setup(&mut self.ctx, &setup)?;
        self.after_status = accepted.after_status;

        match accepted.data {
            DataStage::None => self.send_status(link),
            DataStage::Descriptor(cursor) if cursor.is_empty() => self.send_status(link),
            DataStage::Descriptor(cursor) => {
                self.cursor = cursor;
                let chunk = self.cursor.next_chunk().unwrap_or(&[]);
                self.stage = ControlStage::DataIn;
                self.send_ep0(link, chunk)
            }
            DataStage::Reply(bytes) if bytes.is_empty() => self.send_status(link),
            DataStage::Reply(bytes) => {
                self.stage = ControlStage::DataIn;
                self.send_ep0(link, &bytes)
            }
            DataStage::Receive {
                interface,
                report_type,
            } => {
                self.stage = ControlStage::DataOut {
                    interface,
                    report_type,
                };
                Ok(())
            }
        }
    }

    fn control_in<L: UsbLink>(&mut self, link: &mut L) -> Result<(), Error> {
        self.ctx.endpoints.ep0.complete_in();
        match self.stage {
            ControlStage::DataIn => match self.cursor.next_chunk() {
                Some(chunk) => self.send_ep0(link, chunk),
                None => {
                    self.stage = ControlStage::StatusOut;
                    Ok(())
                }
            },
            ControlStage::StatusIn => {
                self.stage = ControlStage::Idle;
                if let StatusAction::SetAddress(address) = self.after_status {
                    // Only now: the status stage was answered from the old address.
                    link.set_device_address(address);
                    self.ctx.config.address = address;
                    info!("address {=u8}", address);
                }
                self.after_status = StatusAction::None;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn control_out<L: UsbLink>(&mut self, link: &mut L, toggle_ok: bool) -> Result<(), Error> {
        if !self.ctx.endpoints.ep0.complete_out(toggle_ok) {
            debug!("EP0 OUT duplicate dropped");
            return Ok(());
        }
        let data = receive(&mut self.buffers, link, 0);

        match self.stage {
            ControlStage::DataOut {
                interface,
                report_type,
            } => {
                if interface == KEYBOARD_INTERFACE && report_type == ReportType::Output {
                    if let Some(leds) = LedState::from_output_report(data) {
                        set_leds(&mut self.ctx, leds);
                    }
                }
                self.send_status(link)
            }
            // Status stage of an upload, possibly cut short by the host.
            ControlStage::DataIn | ControlStage::StatusOut => {
                self.cursor = TransferCursor::idle();
                self.stage = ControlStage::Idle;
                self.ctx.endpoints.ep0.tx.response = Response::Nak;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn send_status<L: UsbLink>(&mut self, link: &mut L) -> Result<(), Error> {
        self.stage = ControlStage::StatusIn;
        self.send_ep0(link, &[])
    }

    fn send_ep0<L: UsbLink>(&mut self, link: &mut L, data: &[u8]) -> Result<(), Error> {
        debug_assert!(data.len() <= EP0_MAX_PACKET);
        let staged = self.buffers.stage_in(0, data)?;
        link.queue_in(0, staged);
        self.ctx.endpoints.ep0.arm_in();
        Ok(())
    }

    /// STALL both directions of endpoint 0 and drop the transfer.
    fn abort_control(&mut self) {
        self.cursor = TransferCursor::idle();
        self.after_status = StatusAction::None;
        self.stage = ControlStage::Idle;
        self.ctx.endpoints.ep0.stall();
    }

    // Interrupt endpoints

    fn interrupt_out<L: UsbLink>(&mut self, link: &mut L, endpoint: u8, toggle_ok: bool) {
        let Some(state) = self.ctx.endpoints.get_mut(endpoint) else {
            warn!("OUT on unknown endpoint {=u8}", endpoint);
            return;
        };
        if !state.complete_out(toggle_ok) {
            debug!("EP{=u8} OUT duplicate dropped", endpoint);
            return;
        }
        let data = receive(&mut self.buffers, link, endpoint);
        if endpoint == KEYBOARD_ENDPOINT {
            if let Some(leds) = LedState::from_output_report(data) {
                set_leds(&mut self.ctx, leds);
            }
        }
        self.sync_endpoint(link, endpoint);
    }

    fn bus_reset<L: UsbLink>(&mut self, link: &mut L) {
        *self = Self::new();
        link.set_device_address(0);
        self.sync_all(link);
        info!("bus reset");
    }

    fn sync_all<L: UsbLink>(&self, link: &mut L) {
        for number in 0..=NUM_ENDPOINTS as u8 {
            self.sync_endpoint(link, number);
        }
    }

    /// Push the stored toggle and response of both halves to the link.
    fn sync_endpoint<L: UsbLink>(&self, link: &mut L, endpoint: u8) {
        let Some(state) = self.ctx.endpoints.get(endpoint) else {
            return;
        };
        for direction in [Direction::Out, Direction::In] {
            let half = state.half(direction);
            link.set_toggle(endpoint, direction, half.toggle);
            link.set_response(endpoint, direction, half.response);
        }
    }

    // Report emitter

    pub fn emit_keyboard<L: UsbLink>(
        &mut self,
        link: &mut L,
        report: KeyboardReport,
    ) -> Result<(), Error> {
        self.emit(link, HidReport::Keyboard(report))
    }

    pub fn emit_mouse<L: UsbLink>(
        &mut self,
        link: &mut L,
        report: MouseReport,
    ) -> Result<(), Error> {
        self.emit(link, HidReport::Mouse(report))
    }

    /// Stage `report` on its interrupt IN endpoint in the current protocol
    /// layout. A report the host has not collected yet is overwritten.
    pub fn emit<L: UsbLink>(&mut self, link: &mut L, report: HidReport) -> Result<(), Error> {
        match report {
            HidReport::Keyboard(k) => self.ctx.last_keyboard = k,
            HidReport::Mouse(m) => self.ctx.last_mouse = m,
        }
        let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
        let len = report.serialize(self.ctx.config.protocol, &mut buf);
        let endpoint = report.endpoint();

        let staged = self.buffers.stage_in(endpoint, &buf[..len])?;
        link.queue_in(endpoint, staged);
        if let Some(state) = self.ctx.endpoints.get_mut(endpoint) {
            state.arm_in();
        }
        self.sync_endpoint(link, endpoint);
        trace!("EP{=u8} report {=usize} bytes", endpoint, len);
        Ok(())
    }

    /// Signal resume to the host. Only allowed while the bus is suspended
    /// and the host armed remote wakeup; returns whether it was signalled.
    pub fn remote_wakeup<L: UsbLink>(&mut self, link: &mut L) -> bool {
        let config = &mut self.ctx.config;
        if !(config.remote_wakeup && config.suspended) {
            return false;
        }
        link.remote_wakeup();
        config.suspended = false;
        info!("remote wakeup");
        true
    }
}

/// Pull the packet received on `endpoint` into its OUT buffer.
fn receive<'a, L: UsbLink>(
    buffers: &'a mut EndpointBuffers,
    link: &mut L,
    endpoint: u8,
) -> &'a [u8] {
    let Some(slot) = buffers.out_slot(endpoint) else {
        return &[];
    };
    let len = link.read_out(endpoint, slot).min(EP_BUFFER_SIZE);
    buffers.commit_out(endpoint, len).unwrap_or(&[])
}

fn set_leds(ctx: &mut DeviceContext, leds: LedState) {
    if ctx.leds != leds {
        info!(
            "LEDs num={} caps={} scroll={}",
            leds.num_lock,
            leds.caps_lock,
            leds.scroll_lock
        );
    }
    ctx.leds = leds;
}
