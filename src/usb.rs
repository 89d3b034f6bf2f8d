//! # Async USB bulk endpoint abstraction
//!
//! `UsbEndpoint` models the FTDI bulk in/out pair exactly as the original
//! engine drove it: one transfer in flight per direction, submitted and
//! polled to completion by the cooperative scheduler (C6) rather than
//! awaited directly, since the scheduler must interleave TX and RX polling
//! within a single `eof()` drive loop.
//!
//! [`MockUsbEndpoint`] is the test double standing in for the real FTDI
//! peer: it records what was written and lets a test queue up exactly the
//! reply bytes (clean, corrupted, dropped, or out-of-order) a real FPGA
//! might send back.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::frame::FrameSlot;

#[async_trait]
pub trait UsbEndpoint: Send {
    /// Submits `data` as the (only) outstanding write transfer. Must not be
    /// called again until the previous write completed or was cancelled.
    async fn submit_write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Non-blocking poll of the outstanding write. `Ok(true)` means it
    /// completed; `Ok(false)` means still in flight.
    async fn poll_write(&mut self) -> Result<bool, TransportError>;

    /// Cancels the outstanding write, if any.
    fn cancel_write(&mut self);

    /// Submits a read request for up to `max_len` bytes.
    async fn submit_read(&mut self, max_len: usize) -> Result<(), TransportError>;

    /// Non-blocking poll of the outstanding read. `Ok(Some(bytes))` means
    /// data arrived (possibly fewer bytes than requested); `Ok(None)` means
    /// still in flight.
    async fn poll_read(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Cancels the outstanding read, if any.
    fn cancel_read(&mut self);

    /// Flushes both directions; called when the window resets after an
    /// unexpected TID or a TX timeout.
    fn purge(&mut self);

    fn write_chunk_size(&self) -> usize;
    fn read_chunk_size(&self) -> usize;
}

/// In-memory stand-in for the FTDI bridge, used by integration tests and
/// the fuzz target. Not compiled into non-test builds.
pub struct MockUsbEndpoint {
    write_chunk: usize,
    read_chunk: usize,
    captured_writes: Vec<u8>,
    inbound: VecDeque<u8>,
    pending_read_len: Option<usize>,
    fail_next_write: bool,
    fail_next_read: bool,
}

impl MockUsbEndpoint {
    pub fn new() -> Self {
        MockUsbEndpoint {
            write_chunk: crate::constants::TX_CHUNK_SIZE,
            read_chunk: crate::constants::RX_CHUNK_SIZE,
            captured_writes: Vec::new(),
            inbound: VecDeque::new(),
            pending_read_len: None,
            fail_next_write: false,
            fail_next_read: false,
        }
    }

    /// Queues bytes that a subsequent `poll_read` will hand back.
    pub fn queue_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Everything written so far, for assertions.
    pub fn captured_writes(&self) -> &[u8] {
        &self.captured_writes
    }

    pub fn clear_captured_writes(&mut self) {
        self.captured_writes.clear();
    }

    pub fn fail_next_write(&mut self) {
        self.fail_next_write = true;
    }

    pub fn fail_next_read(&mut self) {
        self.fail_next_read = true;
    }
}

impl Default for MockUsbEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsbEndpoint for MockUsbEndpoint {
    async fn submit_write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(TransportError::UsbError("mock write failure".into()));
        }
        self.captured_writes.extend_from_slice(data);
        Ok(())
    }

    async fn poll_write(&mut self) -> Result<bool, TransportError> {
        Ok(true)
    }

    fn cancel_write(&mut self) {}

    async fn submit_read(&mut self, max_len: usize) -> Result<(), TransportError> {
        self.pending_read_len = Some(max_len);
        Ok(())
    }

    async fn poll_read(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.fail_next_read {
            self.fail_next_read = false;
            return Err(TransportError::UsbError("mock read failure".into()));
        }
        let max_len = match self.pending_read_len.take() {
            Some(n) => n,
            None => return Ok(None),
        };
        if self.inbound.is_empty() {
            return Ok(None);
        }
        let n = max_len.min(self.inbound.len());
        let data: Vec<u8> = self.inbound.drain(..n).collect();
        Ok(Some(data))
    }

    fn cancel_read(&mut self) {
        self.pending_read_len = None;
    }

    fn purge(&mut self) {
        self.inbound.clear();
    }

    fn write_chunk_size(&self) -> usize {
        self.write_chunk
    }

    fn read_chunk_size(&self) -> usize {
        self.read_chunk
    }
}

/// Builds the wire bytes for a bare acknowledgement frame (no WOU packets)
/// carrying transaction id `tid`, as a real FPGA reply would look once it
/// has nothing left to echo back.
pub fn build_ack_frame(tid: u8) -> Vec<u8> {
    crate::crc::init();
    let mut slot = FrameSlot::new_empty();
    slot.seal(tid);
    slot.wire_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_captures_submitted_writes() {
        let mut ep = MockUsbEndpoint::new();
        ep.submit_write(&[1, 2, 3]).await.unwrap();
        assert_eq!(ep.captured_writes(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn mock_hands_back_queued_inbound_on_read() {
        let mut ep = MockUsbEndpoint::new();
        ep.queue_inbound(&[9, 8, 7]);
        ep.submit_read(16).await.unwrap();
        let data = ep.poll_read().await.unwrap();
        assert_eq!(data, Some(vec![9, 8, 7]));
    }

    #[tokio::test]
    async fn mock_read_without_submit_is_none() {
        let mut ep = MockUsbEndpoint::new();
        ep.queue_inbound(&[1]);
        assert_eq!(ep.poll_read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn fail_next_write_surfaces_transport_error_once() {
        let mut ep = MockUsbEndpoint::new();
        ep.fail_next_write();
        assert!(ep.submit_write(&[1]).await.is_err());
        assert!(ep.submit_write(&[1]).await.is_ok());
    }

    #[test]
    fn ack_frame_round_trips_through_the_parser() {
        let wire = build_ack_frame(42);
        let mut regs = crate::regs::ShadowRegisters::new();
        let mut parser = crate::parser::ReceiveParser::new();
        parser.feed(&wire);
        let mut tid_seen = None;
        loop {
            match parser.poll(&mut regs) {
                crate::parser::ParseEvent::NeedMoreData => break,
                crate::parser::ParseEvent::FrameReceived { tid } => tid_seen = Some(tid),
                crate::parser::ParseEvent::CrcError => panic!("unexpected CRC error"),
            }
        }
        assert_eq!(tid_seen, Some(42));
    }
}
