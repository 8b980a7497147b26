//! The physical link contract.
//!
//! The protocol core never touches peripheral registers. Board support code
//! implements [`UsbLink`] on top of the real USB controller and forwards its
//! interrupt flags to [`UsbDevice::advance`](super::UsbDevice::advance) as
//! [`UsbEvent`](super::UsbEvent)s.

use super::endpoint::{Direction, Response, Toggle};
use super::setup::SETUP_PACKET_SIZE;

pub trait UsbLink {
    /// Copy the setup stage that just arrived on endpoint 0 into `buf`;
    /// returns the number of bytes received.
    fn read_setup(&mut self, buf: &mut [u8; SETUP_PACKET_SIZE]) -> usize;

    /// Load `data` into the IN buffer of `endpoint` for the next IN token.
    /// An empty slice is a zero-length packet.
    fn queue_in(&mut self, endpoint: u8, data: &[u8]);

    /// Copy the packet received on `endpoint` into `buf`; returns its length.
    fn read_out(&mut self, endpoint: u8, buf: &mut [u8]) -> usize;

    fn set_toggle(&mut self, endpoint: u8, direction: Direction, toggle: Toggle);

    fn set_response(&mut self, endpoint: u8, direction: Direction, response: Response);

    /// Program the device address register.
    fn set_device_address(&mut self, address: u8);

    /// Drive resume signalling on a suspended bus.
    fn remote_wakeup(&mut self);
}
