//! Multi-packet upload cursor for the endpoint-0 data stage.
//!
//! Only one control transfer is in flight at a time, so the device owns a
//! single cursor. It borrows the descriptor bytes and never copies them.

/// Position within an in-flight descriptor upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferCursor {
    source: &'static [u8],
    offset: usize,
    len: usize,
    packet_size: usize,
    zlp_pending: bool,
}

impl Default for TransferCursor {
    fn default() -> Self {
        Self::idle()
    }
}

impl TransferCursor {
    /// No transfer in progress.
    pub const fn idle() -> Self {
        Self {
            source: &[],
            offset: 0,
            len: 0,
            packet_size: 1,
            zlp_pending: false,
        }
    }

    /// Start an upload of `min(requested, declared_len)` bytes of `source`.
    ///
    /// The host stops reading on a short packet or once it has `requested`
    /// bytes. If the effective length is shorter than `requested` and ends
    /// exactly on a packet boundary, a zero-length packet terminates the
    /// data stage.
    pub fn start(
        source: &'static [u8],
        declared_len: u16,
        requested: u16,
        packet_size: usize,
    ) -> Self {
        let packet_size = packet_size.max(1);
        let len = source
            .len()
            .min(declared_len as usize)
            .min(requested as usize);
        let zlp_pending = len < requested as usize && len != 0 && len % packet_size == 0;
        Self {
            source,
            offset: 0,
            len,
            packet_size,
            zlp_pending,
        }
    }

    /// Total bytes this transfer will deliver.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.len - self.offset
    }

    /// True while there is data or a terminating ZLP left to send.
    pub fn is_active(&self) -> bool {
        self.offset < self.len || self.zlp_pending
    }

    /// Next packet to queue on EP0 IN, advancing the cursor. `Some(&[])`
    /// is the terminating zero-length packet; `None` means the data stage
    /// is complete.
    pub fn next_chunk(&mut self) -> Option<&'static [u8]> {
        if self.offset < self.len {
            let end = self.len.min(self.offset + self.packet_size);
            let chunk = &self.source[self.offset..end];
            self.offset = end;
            Some(chunk)
        } else if self.zlp_pending {
            self.zlp_pending = false;
            Some(&[])
        } else {
            None
        }
    }
}
