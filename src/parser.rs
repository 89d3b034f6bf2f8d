//! # Streaming receive parser (C5)
//!
//! Scans an inbound byte stream for WOU-frames, resyncing after noise or a
//! CRC failure, and commits each validated frame's WB_WR_CMD packets into
//! the shadow register map. Ported from the `SYNC`/`PLOAD_CRC` state
//! machine in `wou_recv()`, but with an explicit "found" index instead of
//! a reused `memcmp` return value carried across loop iterations (the bug
//! flagged against the original).
//!
//! A hand-rolled byte-scanner, not `nom`: the parser must retain partial
//! state (a dangling sync match, a header whose payload hasn't arrived
//! yet) across independent `feed()` calls on whatever chunk size the USB
//! endpoint handed back, which doesn't fit nom's whole-slice combinator
//! model.

use bytes::{Buf, BytesMut};

use crate::constants::{CRC_SIZE, MAX_DSIZE, WB_ADDR_SIZE, WOUF_PREAMBLE, WOUF_SOFD, WOU_HDR_SIZE};
use crate::crc;
use crate::regs::ShadowRegisters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sync,
    PloadCrc,
}

/// Outcome of one `poll()` step.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseEvent {
    /// Buffered bytes aren't enough to complete a frame yet; call `feed()`
    /// again before polling further.
    NeedMoreData,
    /// A frame passed CRC and its packets were committed to the register
    /// map. Carries the transaction id for the caller to run through the
    /// window's Go-Back-N decision.
    FrameReceived { tid: u8 },
    /// A candidate frame failed its CRC check and was discarded. The
    /// parser has already rewound to resync on the remaining bytes.
    CrcError,
}

pub struct ReceiveParser {
    buf: BytesMut,
    state: State,
}

impl ReceiveParser {
    pub fn new() -> Self {
        ReceiveParser {
            buf: BytesMut::new(),
            state: State::Sync,
        }
    }

    /// Appends newly-received bytes to the internal buffer.
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Advances the state machine by as much as the buffered data allows.
    /// Call in a loop until it returns `NeedMoreData`.
    pub fn poll(&mut self, regs: &mut ShadowRegisters) -> ParseEvent {
        match self.state {
            State::Sync => self.poll_sync(),
            State::PloadCrc => self.poll_pload_crc(regs),
        }
    }

    fn poll_sync(&mut self) -> ParseEvent {
        let sync = [WOUF_PREAMBLE, WOUF_PREAMBLE, WOUF_SOFD];
        let mut found: Option<usize> = None;
        if self.buf.len() >= sync.len() {
            for i in 0..=(self.buf.len() - sync.len()) {
                if self.buf[i..i + sync.len()] == sync {
                    found = Some(i);
                    break;
                }
            }
        }

        match found {
            Some(i) => {
                self.buf.advance(i + sync.len());
                self.state = State::PloadCrc;
                ParseEvent::NeedMoreData
            }
            None => {
                // Keep a short tail in case a sync pattern straddles this
                // feed() boundary; everything before it is noise.
                let keep = sync.len().saturating_sub(1).min(self.buf.len());
                let drop = self.buf.len() - keep;
                self.buf.advance(drop);
                ParseEvent::NeedMoreData
            }
        }
    }

    fn poll_pload_crc(&mut self, regs: &mut ShadowRegisters) -> ParseEvent {
        if self.buf.is_empty() {
            return ParseEvent::NeedMoreData;
        }
        let pload_size_tx = self.buf[0] as usize;
        let needed = 3 + pload_size_tx + CRC_SIZE; // PLOAD_SIZE_TX, TID, PLOAD_SIZE_RX, payload, crc
        if self.buf.len() < needed {
            return ParseEvent::NeedMoreData;
        }

        let computed = crc::compute(&self.buf[0..3 + pload_size_tx]);
        let wire_crc = crc::from_wire_bytes([
            self.buf[3 + pload_size_tx],
            self.buf[3 + pload_size_tx + 1],
        ]);

        if computed != wire_crc {
            // Don't trust the claimed PLOAD_SIZE_TX that got us here; drop
            // one byte and let `poll_sync` look for the next valid preamble.
            self.buf.advance(1);
            self.state = State::Sync;
            return ParseEvent::CrcError;
        }

        let tid = self.buf[1];
        let payload = self.buf[3..3 + pload_size_tx].to_vec();
        self.buf.advance(needed);
        self.state = State::Sync;

        commit_packets(&payload, regs);
        ParseEvent::FrameReceived { tid }
    }
}

impl Default for ReceiveParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks the WOU packet stream of a validated frame, committing each
/// packet's data to the shadow register map (§4.6 "Payload parse").
fn commit_packets(payload: &[u8], regs: &mut ShadowRegisters) {
    let mut i = 0;
    while i + WOU_HDR_SIZE <= payload.len() {
        let dsize = (payload[i] & MAX_DSIZE) as usize;
        let addr = u16::from_le_bytes([payload[i + 1], payload[i + 2]]);
        i += WOU_HDR_SIZE;
        debug_assert_eq!(WB_ADDR_SIZE, 2);
        if i + dsize > payload.len() {
            break;
        }
        regs.apply(addr, &payload[i..i + dsize]);
        i += dsize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{WB_WR_CMD, WOUF_HDR_SIZE};
    use crate::frame::FrameSlot;

    fn one_sealed_write_frame(tid: u8, addr: u16, data: &[u8]) -> Vec<u8> {
        crc::init();
        let mut slot = FrameSlot::new_empty();
        slot.append_packet(WB_WR_CMD, addr, data.len() as u8, Some(data))
            .unwrap();
        slot.seal(tid);
        slot.wire_bytes().to_vec()
    }

    #[test]
    fn parses_a_single_clean_frame() {
        let mut regs = ShadowRegisters::new();
        let mut parser = ReceiveParser::new();
        let wire = one_sealed_write_frame(7, 0x0040, &[1, 2, 3, 4]);
        parser.feed(&wire);

        let mut events = Vec::new();
        loop {
            let e = parser.poll(&mut regs);
            let done = e == ParseEvent::NeedMoreData;
            events.push(e);
            if done {
                break;
            }
        }
        assert!(events.contains(&ParseEvent::FrameReceived { tid: 7 }));
        assert_eq!(regs.read(0x0040, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn resyncs_past_leading_garbage() {
        let mut regs = ShadowRegisters::new();
        let mut parser = ReceiveParser::new();
        let mut stream = vec![0x00, 0x11, 0x22, WOUF_PREAMBLE]; // dangling partial sync too
        stream.extend(one_sealed_write_frame(1, 0x0000, &[9]));
        parser.feed(&stream);

        let mut got_frame = false;
        loop {
            match parser.poll(&mut regs) {
                ParseEvent::NeedMoreData => break,
                ParseEvent::FrameReceived { tid } => {
                    assert_eq!(tid, 1);
                    got_frame = true;
                }
                ParseEvent::CrcError => {}
            }
        }
        assert!(got_frame);
    }

    #[test]
    fn corrupted_crc_is_reported_and_parser_resyncs_on_next_frame() {
        let mut regs = ShadowRegisters::new();
        let mut parser = ReceiveParser::new();
        let mut corrupt = one_sealed_write_frame(2, 0x0000, &[5]);
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0xFF; // flip a CRC byte
        let mut stream = corrupt;
        stream.extend(one_sealed_write_frame(3, 0x0010, &[6]));
        parser.feed(&stream);

        let mut saw_crc_error = false;
        let mut good_tid = None;
        loop {
            match parser.poll(&mut regs) {
                ParseEvent::NeedMoreData => break,
                ParseEvent::CrcError => saw_crc_error = true,
                ParseEvent::FrameReceived { tid } => good_tid = Some(tid),
            }
        }
        assert!(saw_crc_error);
        assert_eq!(good_tid, Some(3));
    }

    #[test]
    fn partial_frame_split_across_two_feeds_waits_for_more_data() {
        let mut regs = ShadowRegisters::new();
        let mut parser = ReceiveParser::new();
        let wire = one_sealed_write_frame(9, 0x0000, &[1, 2]);
        let (first, second) = wire.split_at(WOUF_HDR_SIZE);

        parser.feed(first);
        assert_eq!(parser.poll(&mut regs), ParseEvent::NeedMoreData);

        parser.feed(second);
        let mut got = false;
        loop {
            match parser.poll(&mut regs) {
                ParseEvent::NeedMoreData => break,
                ParseEvent::FrameReceived { tid } => {
                    assert_eq!(tid, 9);
                    got = true;
                }
                ParseEvent::CrcError => {}
            }
        }
        assert!(got);
    }
}
