//! Endpoint buffer set.
//!
//! One fixed-capacity buffer per endpoint direction. The device writes an IN
//! buffer and then hands the slice to the link; the link fills an OUT buffer
//! before the device reads it. Each buffer has exactly one writer at a time.

use heapless::Vec;

use crate::config::{EP_BUFFER_SIZE, NUM_ENDPOINTS};
use crate::error::Error;
use crate::usb::endpoint::Direction;

pub type PacketBuffer = Vec<u8, EP_BUFFER_SIZE>;

#[derive(Clone, Debug, Default)]
pub struct BufferPair {
    pub rx: PacketBuffer,
    pub tx: PacketBuffer,
}

impl BufferPair {
    const fn new() -> Self {
        Self {
            rx: Vec::new(),
            tx: Vec::new(),
        }
    }
}

const EMPTY_PAIR: BufferPair = BufferPair::new();

/// Buffers for endpoint 0 and the interrupt endpoints.
#[derive(Clone, Debug)]
pub struct EndpointBuffers {
    pairs: [BufferPair; NUM_ENDPOINTS + 1],
}

impl Default for EndpointBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointBuffers {
    pub const fn new() -> Self {
        Self {
            pairs: [EMPTY_PAIR; NUM_ENDPOINTS + 1],
        }
    }

    pub fn get(&self, endpoint: u8, direction: Direction) -> Option<&[u8]> {
        let pair = self.pairs.get(endpoint as usize)?;
        Some(match direction {
            Direction::Out => pair.rx.as_slice(),
            Direction::In => pair.tx.as_slice(),
        })
    }

    /// Replace the IN buffer of `endpoint` and return the staged bytes.
    pub fn stage_in(&mut self, endpoint: u8, data: &[u8]) -> Result<&[u8], Error> {
        let pair = self
            .pairs
            .get_mut(endpoint as usize)
            .ok_or(Error::InvalidEndpointAddress)?;
        pair.tx.clear();
        pair.tx
            .extend_from_slice(data)
            .map_err(|_| Error::BufferOverflow)?;
        Ok(pair.tx.as_slice())
    }

    /// Mutable OUT buffer of `endpoint`, sized to full capacity for the
    /// link to fill. Call [`Self::commit_out`] with the received length.
    pub fn out_slot(&mut self, endpoint: u8) -> Option<&mut [u8]> {
        let pair = self.pairs.get_mut(endpoint as usize)?;
        // Capacity equals the resize target, so this cannot fail.
        let _ = pair.rx.resize(EP_BUFFER_SIZE, 0);
        Some(pair.rx.as_mut_slice())
    }

    pub fn commit_out(&mut self, endpoint: u8, len: usize) -> Option<&[u8]> {
        let pair = self.pairs.get_mut(endpoint as usize)?;
        pair.rx.truncate(len);
        Some(pair.rx.as_slice())
    }
}
