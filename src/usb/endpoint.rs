//! Per-endpoint handshake state: data toggle x response code, tracked
//! independently for the IN and OUT half of every endpoint.

use crate::config::NUM_ENDPOINTS;
use crate::error::Error;

/// DATA0 / DATA1 toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Toggle {
    Data0,
    Data1,
}

impl Toggle {
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Toggle::Data0 => Toggle::Data1,
            Toggle::Data1 => Toggle::Data0,
        }
    }
}

/// Handshake the hardware answers the next token with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Ack,
    Nak,
    Stall,
}

/// Transfer direction from the host's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Out,
    In,
}

/// One direction of one endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointHalf {
    pub toggle: Toggle,
    pub response: Response,
}

impl EndpointHalf {
    const fn new(response: Response) -> Self {
        Self {
            toggle: Toggle::Data0,
            response,
        }
    }
}

/// Both halves of an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointState {
    /// OUT (host to device).
    pub rx: EndpointHalf,
    /// IN (device to host).
    pub tx: EndpointHalf,
}

impl Default for EndpointState {
    fn default() -> Self {
        Self::reset()
    }
}

impl EndpointState {
    /// Bus-reset state: DATA0 both ways, ready to receive, nothing to send.
    pub const fn reset() -> Self {
        Self {
            rx: EndpointHalf::new(Response::Ack),
            tx: EndpointHalf::new(Response::Nak),
        }
    }

    pub fn half(&self, direction: Direction) -> &EndpointHalf {
        match direction {
            Direction::Out => &self.rx,
            Direction::In => &self.tx,
        }
    }

    fn half_mut(&mut self, direction: Direction) -> &mut EndpointHalf {
        match direction {
            Direction::Out => &mut self.rx,
            Direction::In => &mut self.tx,
        }
    }

    /// An OUT transaction completed. `toggle_ok` is the hardware's
    /// toggle-match flag; a mismatch means the host re-sent a packet we
    /// already accepted, so nothing changes.
    ///
    /// Returns `true` if the payload is new and should be handled.
    pub fn complete_out(&mut self, toggle_ok: bool) -> bool {
        if !toggle_ok {
            return false;
        }
        self.rx.toggle = self.rx.toggle.flip();
        true
    }

    /// An IN transaction completed: flip and stop sending until re-armed.
    pub fn complete_in(&mut self) {
        self.tx.toggle = self.tx.toggle.flip();
        self.tx.response = Response::Nak;
    }

    /// Data has been queued for the next IN token. A halted endpoint stays
    /// halted.
    pub fn arm_in(&mut self) {
        if self.tx.response != Response::Stall {
            self.tx.response = Response::Ack;
        }
    }

    pub fn halt(&mut self, direction: Direction) {
        *self.half_mut(direction) = EndpointHalf::new(Response::Stall);
    }

    /// Clear a halt. The direction returns to its idle response with DATA0.
    pub fn clear_halt(&mut self, direction: Direction) {
        let idle = Self::reset();
        *self.half_mut(direction) = *idle.half(direction);
    }

    pub fn is_halted(&self, direction: Direction) -> bool {
        self.half(direction).response == Response::Stall
    }

    /// SET_CONFIGURATION: halts are lifted and both toggles go back to
    /// DATA0. A report already armed stays armed.
    pub fn reconfigure(&mut self) {
        for direction in [Direction::Out, Direction::In] {
            if self.is_halted(direction) {
                self.clear_halt(direction);
            }
        }
        self.rx.toggle = Toggle::Data0;
        self.tx.toggle = Toggle::Data0;
    }

    /// Endpoint 0 at the start of a setup stage: DATA1 both ways, ready to
    /// receive, nothing to send yet.
    pub fn begin_setup(&mut self) {
        self.rx = EndpointHalf {
            toggle: Toggle::Data1,
            response: Response::Ack,
        };
        self.tx = EndpointHalf {
            toggle: Toggle::Data1,
            response: Response::Nak,
        };
    }

    /// Abort the control transfer: STALL both directions.
    pub fn stall(&mut self) {
        self.rx.response = Response::Stall;
        self.tx.response = Response::Stall;
    }
}

/// A validated interrupt endpoint address (number 1..=NUM_ENDPOINTS).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointAddress {
    pub number: u8,
    pub direction: Direction,
}

impl EndpointAddress {
    /// Parse a `wIndex` endpoint address, bit 7 = IN.
    pub fn from_raw(raw: u8) -> Result<Self, Error> {
        if raw & 0x70 != 0 {
            return Err(Error::InvalidEndpointAddress);
        }
        let number = raw & 0x0F;
        if number == 0 || number as usize > NUM_ENDPOINTS {
            return Err(Error::InvalidEndpointAddress);
        }
        let direction = if raw & 0x80 != 0 {
            Direction::In
        } else {
            Direction::Out
        };
        Ok(Self { number, direction })
    }

    pub fn raw(&self) -> u8 {
        match self.direction {
            Direction::In => 0x80 | self.number,
            Direction::Out => self.number,
        }
    }
}

/// Endpoint 0 plus the interrupt endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoints {
    pub ep0: EndpointState,
    interrupt: [EndpointState; NUM_ENDPOINTS],
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new()
    }
}

impl Endpoints {
    pub const fn new() -> Self {
        Self {
            ep0: EndpointState::reset(),
            interrupt: [EndpointState::reset(); NUM_ENDPOINTS],
        }
    }

    /// State of endpoint `number`; 0 is the control endpoint.
    pub fn get(&self, number: u8) -> Option<&EndpointState> {
        match number {
            0 => Some(&self.ep0),
            n => self.interrupt.get(n as usize - 1),
        }
    }

    pub fn get_mut(&mut self, number: u8) -> Option<&mut EndpointState> {
        match number {
            0 => Some(&mut self.ep0),
            n => self.interrupt.get_mut(n as usize - 1),
        }
    }

    pub fn at(&self, address: EndpointAddress) -> &EndpointState {
        &self.interrupt[address.number as usize - 1]
    }

    pub fn at_mut(&mut self, address: EndpointAddress) -> &mut EndpointState {
        &mut self.interrupt[address.number as usize - 1]
    }

    /// Interrupt endpoints only.
    pub fn interrupt_mut(&mut self) -> impl Iterator<Item = &mut EndpointState> {
        self.interrupt.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_state() {
        let ep = EndpointState::reset();
        assert_eq!(ep.rx.toggle, Toggle::Data0);
        assert_eq!(ep.rx.response, Response::Ack);
        assert_eq!(ep.tx.toggle, Toggle::Data0);
        assert_eq!(ep.tx.response, Response::Nak);
    }

    #[test]
    fn out_flips_once_per_new_packet() {
        let mut ep = EndpointState::reset();
        assert!(ep.complete_out(true));
        assert_eq!(ep.rx.toggle, Toggle::Data1);
        // Re-sent packet
        assert!(!ep.complete_out(false));
        assert_eq!(ep.rx.toggle, Toggle::Data1);
        assert_eq!(ep.rx.response, Response::Ack);
    }

    #[test]
    fn in_completion_flips_and_naks() {
        let mut ep = EndpointState::reset();
        ep.arm_in();
        assert_eq!(ep.tx.response, Response::Ack);
        ep.complete_in();
        assert_eq!(ep.tx.toggle, Toggle::Data1);
        assert_eq!(ep.tx.response, Response::Nak);
    }

    #[test]
    fn halt_and_clear() {
        let mut ep = EndpointState::reset();
        ep.complete_in();
        ep.halt(Direction::In);
        assert!(ep.is_halted(Direction::In));
        assert!(!ep.is_halted(Direction::Out));
        // Queuing data does not lift a halt.
        ep.arm_in();
        assert!(ep.is_halted(Direction::In));

        ep.clear_halt(Direction::In);
        assert_eq!(ep.tx.toggle, Toggle::Data0);
        assert_eq!(ep.tx.response, Response::Nak);
    }

    #[test]
    fn setup_forces_data1() {
        let mut ep = EndpointState::reset();
        ep.stall();
        ep.begin_setup();
        assert_eq!(ep.rx.toggle, Toggle::Data1);
        assert_eq!(ep.tx.toggle, Toggle::Data1);
        assert_eq!(ep.rx.response, Response::Ack);
        assert_eq!(ep.tx.response, Response::Nak);
    }

    #[test]
    fn endpoint_addresses() {
        let ep = EndpointAddress::from_raw(0x81).unwrap();
        assert_eq!(ep.number, 1);
        assert_eq!(ep.direction, Direction::In);
        assert_eq!(ep.raw(), 0x81);
        assert_eq!(EndpointAddress::from_raw(0x04).unwrap().direction, Direction::Out);

        for raw in [0x00, 0x80, 0x05, 0x85, 0x91, 0x0F] {
            assert_eq!(
                EndpointAddress::from_raw(raw),
                Err(Error::InvalidEndpointAddress)
            );
        }
    }

    #[test]
    fn endpoints_lookup() {
        let mut eps = Endpoints::new();
        assert!(eps.get(0).is_some());
        assert!(eps.get(4).is_some());
        assert!(eps.get(5).is_none());
        eps.get_mut(2).unwrap().halt(Direction::Out);
        let addr = EndpointAddress::from_raw(0x02).unwrap();
        assert!(eps.at(addr).is_halted(Direction::Out));
        assert!(!eps.at(addr).is_halted(Direction::In));
    }
}
