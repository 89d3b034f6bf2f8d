//! # TX/RX scheduler (C6)
//!
//! Drives one [`UsbEndpoint`] through the single-in-flight-transfer-per-
//! direction discipline the original `wou_send()`/`wou_recv()` used: at
//! most one write and one read outstanding at a time, polled to completion
//! rather than awaited, so a caller can interleave both directions in one
//! drive loop (`Board::eof()`, C7). There is no locking here — by design
//! (spec §5), the `Scheduler` is the only thing that ever touches the USB
//! endpoint, and `Board` is the only thing that ever touches the
//! `Scheduler`.

use tokio::time::Instant;

use crate::config::BoardConfig;
use crate::error::TransportError;
use crate::logging::{log_debug, log_warn};
use crate::parser::{ParseEvent, ReceiveParser};
use crate::regs::ShadowRegisters;
use crate::usb::UsbEndpoint;
use crate::window::{AckOutcome, Window};

pub struct Scheduler<E: UsbEndpoint> {
    endpoint: E,
    config: BoardConfig,
    tx_in_flight: bool,
    tx_deadline: Option<Instant>,
    rx_in_flight: bool,
}

impl<E: UsbEndpoint> Scheduler<E> {
    pub fn new(endpoint: E, config: BoardConfig) -> Self {
        Scheduler {
            endpoint,
            config,
            tx_in_flight: false,
            tx_deadline: None,
            rx_in_flight: false,
        }
    }

    pub fn endpoint_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    /// One non-blocking step of the send side (`wou_send()`, §4.7.1):
    /// finish polling an outstanding write, declare a timeout if the wall
    /// clock says the remote went silent, or stage and submit the next
    /// burst drained from the window.
    pub async fn wou_send(&mut self, window: &mut Window) -> Result<(), TransportError> {
        if self.tx_in_flight {
            if self.endpoint.poll_write().await? {
                self.tx_in_flight = false;
                self.tx_deadline = None;
            } else if self
                .tx_deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
            {
                log_warn("TX burst timed out; rewinding window and flushing endpoint");
                self.endpoint.cancel_write();
                self.endpoint.purge();
                self.tx_in_flight = false;
                self.tx_deadline = None;
                window.rewind_to_sb();
            } else {
                return Ok(());
            }
        }

        let (bytes, _rx_req) = window.drain_pending(self.config.tx_burst_max);
        if bytes.len() >= self.config.tx_burst_min
            || (!bytes.is_empty() && window.sn() == window.clock())
        {
            log_debug(&format!("submitting TX burst of {} bytes", bytes.len()));
            self.endpoint.submit_write(&bytes).await?;
            self.tx_in_flight = true;
            self.tx_deadline = Some(Instant::now() + self.config.tx_timeout);
        }
        Ok(())
    }

    /// One non-blocking step of the receive side (`wou_recv()`, §4.7.2):
    /// finish polling an outstanding read, feed whatever arrived through
    /// the parser, and run each validated frame's TID through the
    /// window's Go-Back-N decision. Re-arms the read whenever none is
    /// outstanding.
    pub async fn wou_recv(
        &mut self,
        window: &mut Window,
        parser: &mut ReceiveParser,
        regs: &mut ShadowRegisters,
    ) -> Result<Vec<AckOutcome>, TransportError> {
        let mut outcomes = Vec::new();

        if self.rx_in_flight {
            if let Some(data) = self.endpoint.poll_read().await? {
                self.rx_in_flight = false;
                parser.feed(&data);
                loop {
                    match parser.poll(regs) {
                        ParseEvent::NeedMoreData => break,
                        ParseEvent::FrameReceived { tid } => {
                            outcomes.push(window.on_ack(tid));
                        }
                        ParseEvent::CrcError => {
                            log_warn("discarded a frame with a bad CRC");
                        }
                    }
                }
            }
        }

        if !self.rx_in_flight {
            self.endpoint.submit_read(self.config.rx_burst_min).await?;
            self.rx_in_flight = true;
        }

        Ok(outcomes)
    }
}
