//! # Sliding window / Go-Back-N bookkeeping (C4)
//!
//! Owns the 256-slot circular "CLOCK" array of [`FrameSlot`]s and the four
//! cursors that drive Go-Back-N ARQ over it (§3, §4.4, §4.5):
//!
//! - `sb` — oldest slot not yet acknowledged.
//! - `sn` — next slot to copy into a TX burst.
//! - `clock` — slot currently being filled by `append()`.
//! - `sm` — window ceiling, always `sb + NR_OF_WIN` (mod `NR_OF_CLK`).
//! - `tid` — next transaction id to hand out on seal.
//! - `tid_sb` — transaction id of the slot at `sb`.
//!
//! All cursors are `u8` and wrap at 256, matching `NR_OF_CLK`. Modular
//! distance is always computed via `wrapping_sub`/`wrapping_add` so the
//! arithmetic is correct across a wraparound without a branch.

use bytes::BytesMut;

use crate::constants::NR_OF_CLK;
use crate::frame::FrameSlot;

/// Result of feeding an inbound transaction id through the Go-Back-N
/// decision in `wouf_parse()` (§4.5).
#[derive(Debug, PartialEq, Eq)]
pub enum AckOutcome {
    /// `tid_r` acknowledged `by` additional slots; the window advanced.
    Advanced { by: u8 },
    /// `tid_r` was not the next expected id (including a NAK echoing the
    /// last acked id back, `advance == 0`). The send cursor is rewound to
    /// `sb` so the next `drain_pending` retransmits everything still
    /// outstanding.
    Retransmit,
}

pub struct Window {
    slots: Vec<FrameSlot>,
    sm: u8,
    sn: u8,
    sb: u8,
    tid_sb: u8,
    tid: u8,
    clock: u8,
}

impl Window {
    pub fn new() -> Self {
        let slots = (0..NR_OF_CLK).map(|_| FrameSlot::new_empty()).collect();
        Window {
            slots,
            sm: crate::constants::NR_OF_WIN,
            sn: 0,
            sb: 0,
            tid_sb: 0,
            tid: 0,
            clock: 0,
        }
    }

    pub fn current_mut(&mut self) -> &mut FrameSlot {
        &mut self.slots[self.clock as usize]
    }

    /// True once `NR_OF_WIN` frames are outstanding unacknowledged, i.e.
    /// `clock` has advanced `sm`'s distance from `sb` or further (§8
    /// scenario 5: sealing the `NR_OF_WIN+1`-th frame with the peer silent
    /// must block). `eof()` spins while this holds.
    pub fn would_block(&self) -> bool {
        let outstanding = self.clock.wrapping_sub(self.sb);
        let window_size = self.sm.wrapping_sub(self.sb);
        outstanding >= window_size
    }

    /// Writes the header/CRC into the current slot, marks it in-flight, and
    /// advances `clock`/`tid`. Returns the transaction id that was assigned.
    /// Caller (the board's `eof()`) is responsible for checking
    /// `would_block()` first and pumping the scheduler until it clears.
    pub fn seal_current(&mut self) -> u8 {
        let tid = self.tid;
        self.slots[self.clock as usize].seal(tid);
        self.tid = self.tid.wrapping_add(1);
        self.clock = self.clock.wrapping_add(1);
        tid
    }

    /// Copies sealed, unsent frames (`sn..clock`) into one TX burst capped
    /// at `max_bytes`, advancing `sn` over what was copied. Returns the
    /// bytes to submit and the total reply payload the remote is now
    /// expected to send back, per §4.7.1 step 2.
    pub fn drain_pending(&mut self, max_bytes: usize) -> (BytesMut, usize) {
        let mut out = BytesMut::new();
        let mut rx_req = 0usize;
        let mut i = self.sn;
        let window_size = self.sm.wrapping_sub(self.sb);
        while i != self.clock {
            if i.wrapping_sub(self.sb) >= window_size {
                break;
            }
            let slot = &self.slots[i as usize];
            if !slot.in_use {
                break;
            }
            if out.len() + slot.fsize() > max_bytes {
                break;
            }
            out.extend_from_slice(slot.wire_bytes());
            rx_req += slot.expected_reply_len();
            i = i.wrapping_add(1);
        }
        self.sn = i;
        (out, rx_req)
    }

    /// The Go-Back-N decision from `wouf_parse()` (§4.5): does `tid_r`
    /// extend the acknowledged prefix, or must we rewind and retransmit?
    pub fn on_ack(&mut self, tid_r: u8) -> AckOutcome {
        let advance = tid_r.wrapping_sub(self.tid_sb);
        if advance > 0 && advance < crate::constants::NR_OF_WIN {
            for _ in 0..advance {
                let idx = self.sb as usize;
                self.slots[idx].reset();
                self.sb = self.sb.wrapping_add(1);
            }
            self.tid_sb = tid_r;
            self.sm = self.sb.wrapping_add(crate::constants::NR_OF_WIN);
            AckOutcome::Advanced { by: advance }
        } else {
            self.rewind_to_sb();
            AckOutcome::Retransmit
        }
    }

    /// Rewinds the send cursor to the oldest unacknowledged slot, forcing
    /// the next `drain_pending` to retransmit. Used both for an unexpected
    /// `tid_r` and for the TX wall-clock timeout (§4.7.2).
    pub fn rewind_to_sb(&mut self) {
        self.sn = self.sb;
    }

    pub fn tid_sb(&self) -> u8 {
        self.tid_sb
    }

    pub fn sb(&self) -> u8 {
        self.sb
    }

    pub fn sn(&self) -> u8 {
        self.sn
    }

    pub fn clock(&self) -> u8 {
        self.clock
    }

    pub fn sm(&self) -> u8 {
        self.sm
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}
