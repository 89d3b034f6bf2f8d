//! # WOU-frame construction (C3)
//!
//! A `FrameSlot` is the per-slot buffer the builder fills with WOU packets
//! (§4.3) and the window later seals (§4.4). This module owns the pure,
//! non-blocking mechanics: packet layout, header field placement, and CRC
//! sealing. The window (`crate::window`) owns the array of slots and the
//! Go-Back-N cursor arithmetic; the cooperative "block until a slot frees"
//! half of `eof()` lives in `crate::board`, which is the one place that can
//! see both the window and the scheduler.

use bytes::BytesMut;

use crate::constants::{
    MAX_DSIZE, MAX_FRAME_SIZE, WB_ADDR_SIZE, WB_RD_CMD, WB_WR_CMD, WOUF_HDR_SIZE, WOUF_PREAMBLE,
    WOUF_SOFD, WOU_HDR_SIZE,
};
use crate::crc;
use crate::error::ConfigError;

/// One slot of the circular frame buffer.
#[derive(Debug)]
pub struct FrameSlot {
    buf: BytesMut,
    /// Header + payload length, *before* the trailing CRC is appended.
    fsize: usize,
    /// Bytes of reply payload the remote is expected to send back: starts
    /// at a baseline of 1 (the ack header byte, per `wouf_init()`) and
    /// grows by `WOU_HDR_SIZE + dsize` per read command appended (§4.3).
    pload_size_rx: usize,
    /// Go-Back-N "in flight, not yet acknowledged" flag.
    pub in_use: bool,
}

impl FrameSlot {
    pub fn new_empty() -> Self {
        let mut slot = FrameSlot {
            buf: BytesMut::with_capacity(MAX_FRAME_SIZE),
            fsize: 0,
            pload_size_rx: 0,
            in_use: false,
        };
        slot.reset();
        slot
    }

    /// Re-initializes the slot to an empty header, per `wouf_init()`.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.buf.resize(WOUF_HDR_SIZE, 0);
        self.buf[0] = WOUF_PREAMBLE;
        self.buf[1] = WOUF_PREAMBLE;
        self.buf[2] = WOUF_SOFD;
        self.buf[3] = 0xFF; // PLOAD_SIZE_TX placeholder
        self.buf[4] = 0xFF; // TID placeholder
        self.buf[5] = 0xFF; // PLOAD_SIZE_RX placeholder
        self.fsize = WOUF_HDR_SIZE;
        // Baseline of 1, matching wouf_init()'s PLOAD_SIZE_RX of 1 for a
        // slot with no read commands appended yet.
        self.pload_size_rx = 1;
        self.in_use = false;
    }

    /// Bytes of WOU-packet stream appended so far (excludes the 6-byte header).
    pub fn payload_tx_len(&self) -> usize {
        self.fsize - WOUF_HDR_SIZE
    }

    /// Would appending one more packet of `(func, dsize)` overflow this slot?
    /// Mirrors the overflow check in `wou_append()` (§4.3).
    pub fn would_overflow(&self, func: u8, dsize: u8) -> bool {
        let dsize = dsize as usize;
        match func {
            WB_WR_CMD => self.payload_tx_len() + WOU_HDR_SIZE + dsize > crate::constants::MAX_PSIZE,
            WB_RD_CMD => {
                self.payload_tx_len() + WOU_HDR_SIZE > crate::constants::MAX_PSIZE
                    || self.pload_size_rx + WOU_HDR_SIZE + dsize > crate::constants::MAX_PSIZE
            }
            _ => false,
        }
    }

    /// Appends one WOU packet to this slot. Caller must have already called
    /// `eof()` on this slot if `would_overflow` reported true.
    pub fn append_packet(
        &mut self,
        func: u8,
        addr: u16,
        dsize: u8,
        data: Option<&[u8]>,
    ) -> Result<(), ConfigError> {
        if func != WB_RD_CMD && func != WB_WR_CMD {
            return Err(ConfigError::InvalidFunc(func));
        }
        if dsize == 0 || dsize > MAX_DSIZE {
            return Err(ConfigError::InvalidDsize(dsize));
        }
        if func == WB_WR_CMD {
            let data = data.ok_or(ConfigError::DataLengthMismatch {
                want: dsize,
                got: 0,
            })?;
            if data.len() != dsize as usize {
                return Err(ConfigError::DataLengthMismatch {
                    want: dsize,
                    got: data.len(),
                });
            }
        }

        let func_dsize = func | (dsize & MAX_DSIZE);
        self.buf.extend_from_slice(&[func_dsize]);
        self.buf.extend_from_slice(&addr.to_le_bytes());
        debug_assert_eq!(WB_ADDR_SIZE, 2);

        if func == WB_WR_CMD {
            let data = data.expect("validated above");
            self.buf.extend_from_slice(data);
            self.fsize += WOU_HDR_SIZE + dsize as usize;
        } else {
            self.fsize += WOU_HDR_SIZE;
            self.pload_size_rx += WOU_HDR_SIZE + dsize as usize;
        }
        Ok(())
    }

    /// Seals the slot: writes PLOAD_SIZE_TX/TID/PLOAD_SIZE_RX, appends the
    /// CRC, and marks it in-flight. Per §4.4 steps 1-3 (the cursor advance
    /// and re-init of the *next* slot are the window's job).
    pub fn seal(&mut self, tid: u8) {
        let pload_size_tx = self.payload_tx_len() as u8;
        self.buf[3] = pload_size_tx;
        self.buf[4] = tid;
        self.buf[5] = self.pload_size_rx as u8;

        let crc = crc::compute(&self.buf[3..self.fsize]);
        self.buf.extend_from_slice(&crc::to_wire_bytes(crc));
        self.fsize += crate::constants::CRC_SIZE;
        self.in_use = true;
    }

    /// The full sealed frame (header + payload + CRC), ready for TX.
    pub fn wire_bytes(&self) -> &[u8] {
        &self.buf[..self.fsize]
    }

    pub fn fsize(&self) -> usize {
        self.fsize
    }

    /// Bytes of reply payload expected from the remote for this frame,
    /// per §4.7.1 step 2 (`pload_size_rx + WOUF_HDR_SIZE + 1 + CRC_SIZE`).
    pub fn expected_reply_len(&self) -> usize {
        self.pload_size_rx + WOUF_HDR_SIZE + 1 + crate::constants::CRC_SIZE
    }
}
