//! # Public board API (C7)
//!
//! `Board` is the single entry point a caller holds: `connect()` to open
//! it, `append()` to stage Wishbone reads/writes, `eof()` to seal and
//! drive the current frame to completion, `read_shadow()`/`status()` to
//! inspect state. Everything below this is single-threaded and owned
//! exclusively by the `Board` that created it — there is no `Arc`, no
//! `Mutex`, nothing to hand to a second task (spec §5).
//!
//! `BOARD_TABLE` mirrors the original's static `board_table[]`: one entry
//! per supported board, naming the chip it carries. Loading a bitstream
//! onto that chip is outside this crate's scope (spec Non-goals) and is
//! delegated to a caller-supplied [`Bootstrap`].

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;
use tokio::time::Instant;

use crate::bootstrap::Bootstrap;
use crate::config::BoardConfig;
use crate::crc;
use crate::error::{BoardError, ConfigError, TransportError};
use crate::logging::log_warn;
use crate::parser::ReceiveParser;
use crate::regs::ShadowRegisters;
use crate::transport::Scheduler;
use crate::usb::UsbEndpoint;
use crate::window::{AckOutcome, Window};

#[derive(Debug, Clone, Copy)]
pub struct BoardSpec {
    pub board_type: &'static str,
    pub chip_type: &'static str,
}

lazy_static! {
    /// Catalogue of supported boards. The original carries exactly one
    /// entry (`7i43u`); a real deployment grows this table as new carrier
    /// boards are qualified.
    pub static ref BOARD_TABLE: HashMap<&'static str, BoardSpec> = {
        let mut m = HashMap::new();
        m.insert(
            "7i43u",
            BoardSpec {
                board_type: "7i43u",
                chip_type: "3s400tq144",
            },
        );
        m
    };
}

/// Snapshot of a board's running state, per the supplemental status/uptime
/// accounting recovered from the original's TX/RX byte counters.
#[derive(Debug, Serialize)]
pub struct BoardStatus {
    pub board_type: String,
    pub chip_type: String,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub uptime_secs: f64,
    pub window_sb: u8,
    pub window_sn: u8,
    pub window_clock: u8,
}

pub struct Board<E: UsbEndpoint> {
    scheduler: Scheduler<E>,
    window: Window,
    parser: ReceiveParser,
    regs: ShadowRegisters,
    board_type: String,
    chip_type: String,
    poisoned: Option<TransportError>,
    tx_bytes: u64,
    rx_bytes: u64,
    opened_at: Instant,
    eof_spin_sleep: std::time::Duration,
}

impl<E: UsbEndpoint> Board<E> {
    /// Looks up `board_type` in [`BOARD_TABLE`], resets it through
    /// `bootstrap`, and returns a ready-to-use handle over `endpoint`,
    /// using the default pacing/timeout tunables.
    pub async fn connect(
        board_type: &str,
        endpoint: E,
        bootstrap: &mut dyn Bootstrap,
    ) -> Result<Self, BoardError> {
        Self::connect_with_config(board_type, endpoint, bootstrap, BoardConfig::default()).await
    }

    /// Same as [`Board::connect`], but with caller-supplied burst/timeout
    /// tunables (spec §6's tunable side of the ambient configuration
    /// layer).
    pub async fn connect_with_config(
        board_type: &str,
        endpoint: E,
        bootstrap: &mut dyn Bootstrap,
        config: BoardConfig,
    ) -> Result<Self, BoardError> {
        let spec = *BOARD_TABLE
            .get(board_type)
            .ok_or_else(|| ConfigError::UnknownBoardType(board_type.to_string()))?;
        bootstrap.reset().map_err(BoardError::from)?;
        crc::init();

        Ok(Board {
            scheduler: Scheduler::new(endpoint, config.clone()),
            window: Window::new(),
            parser: ReceiveParser::new(),
            regs: ShadowRegisters::new(),
            board_type: spec.board_type.to_string(),
            chip_type: spec.chip_type.to_string(),
            poisoned: None,
            tx_bytes: 0,
            rx_bytes: 0,
            opened_at: Instant::now(),
            eof_spin_sleep: config.eof_spin_sleep,
        })
    }

    /// Appends one Wishbone read or write to the frame currently being
    /// built, sealing and draining the prior frame first if this packet
    /// wouldn't fit (§4.3).
    pub async fn append(
        &mut self,
        func: u8,
        addr: u16,
        dsize: u8,
        data: Option<&[u8]>,
    ) -> Result<(), BoardError> {
        self.check_poisoned()?;
        if self.window.current_mut().would_overflow(func, dsize) {
            self.eof().await?;
        }
        self.window.current_mut().append_packet(func, addr, dsize, data)?;
        if let Some(d) = data {
            self.tx_bytes += d.len() as u64;
        }
        Ok(())
    }

    /// Seals the frame being built and drives TX/RX until it, and every
    /// frame still outstanding ahead of it, is no longer in flight — or
    /// until the sliding window itself is completely full, in which case
    /// this cooperatively spins (§4.4 step 5).
    pub async fn eof(&mut self) -> Result<(), BoardError> {
        self.check_poisoned()?;
        self.window.seal_current();
        loop {
            self.pump().await.map_err(|e| self.poison(e))?;
            if !self.window.would_block() {
                break;
            }
            tokio::time::sleep(self.eof_spin_sleep).await;
        }
        Ok(())
    }

    async fn pump(&mut self) -> Result<(), TransportError> {
        self.scheduler.wou_send(&mut self.window).await?;
        let outcomes = self
            .scheduler
            .wou_recv(&mut self.window, &mut self.parser, &mut self.regs)
            .await?;
        for outcome in &outcomes {
            if matches!(outcome, AckOutcome::Retransmit) {
                log_warn("unexpected transaction id in reply; retransmitting from Sb");
            }
        }
        Ok(())
    }

    /// Reads back `len` bytes from the shadow Wishbone register map at
    /// `addr`. Reflects whatever the most recent `eof()` committed; does
    /// not itself perform I/O.
    pub fn read_shadow(&self, addr: u16, len: u16) -> Vec<u8> {
        self.regs.read(addr, len)
    }

    pub fn status(&self) -> BoardStatus {
        BoardStatus {
            board_type: self.board_type.clone(),
            chip_type: self.chip_type.clone(),
            tx_bytes: self.tx_bytes,
            rx_bytes: self.rx_bytes,
            uptime_secs: self.opened_at.elapsed().as_secs_f64(),
            window_sb: self.window.sb(),
            window_sn: self.window.sn(),
            window_clock: self.window.clock(),
        }
    }

    /// Consumes the handle. No further I/O is attempted; the endpoint is
    /// dropped along with everything else.
    pub fn close(self) {}

    fn check_poisoned(&self) -> Result<(), BoardError> {
        match &self.poisoned {
            Some(e) => Err(BoardError::Transport(TransportError::Poisoned(e.to_string()))),
            None => Ok(()),
        }
    }

    fn poison(&mut self, err: TransportError) -> BoardError {
        self.poisoned = Some(err.clone());
        BoardError::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::NullBootstrap;
    use crate::constants::{WB_RD_CMD, WB_WR_CMD};
    use crate::usb::{build_ack_frame, MockUsbEndpoint};

    #[tokio::test]
    async fn unknown_board_type_is_rejected() {
        let mut bootstrap = NullBootstrap;
        let err = Board::connect("not-a-real-board", MockUsbEndpoint::new(), &mut bootstrap)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Config(ConfigError::UnknownBoardType(_))));
    }

    #[tokio::test]
    async fn single_write_then_eof_drains_and_acks() {
        let mut bootstrap = NullBootstrap;
        let mut board = Board::connect("7i43u", MockUsbEndpoint::new(), &mut bootstrap)
            .await
            .unwrap();
        board
            .append(WB_WR_CMD, 0x0100, 2, Some(&[0xAB, 0xCD]))
            .await
            .unwrap();

        // Queue the FPGA's ack for tid 0 before eof() starts polling reads.
        let ack = build_ack_frame(0);
        board.scheduler.endpoint_mut().queue_inbound(&ack);

        board.eof().await.unwrap();
        assert_eq!(board.window.sb(), 1);
    }

    #[tokio::test]
    async fn read_command_populates_shadow_map_from_reply_payload() {
        let mut bootstrap = NullBootstrap;
        let mut board = Board::connect("7i43u", MockUsbEndpoint::new(), &mut bootstrap)
            .await
            .unwrap();
        board.append(WB_RD_CMD, 0x0200, 4, None).await.unwrap();

        // Build a reply that both acks tid 0 and carries the read result.
        crc::init();
        let mut reply = crate::frame::FrameSlot::new_empty();
        reply
            .append_packet(WB_WR_CMD, 0x0200, 4, Some(&[1, 2, 3, 4]))
            .unwrap();
        reply.seal(0);
        board
            .scheduler
            .endpoint_mut()
            .queue_inbound(reply.wire_bytes());

        board.eof().await.unwrap();
        assert_eq!(board.read_shadow(0x0200, 4), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn connect_with_config_honors_overridden_burst_min() {
        let mut bootstrap = NullBootstrap;
        let config = BoardConfig {
            tx_burst_min: 1,
            ..BoardConfig::default()
        };
        let mut board = Board::connect_with_config(
            "7i43u",
            MockUsbEndpoint::new(),
            &mut bootstrap,
            config,
        )
        .await
        .unwrap();
        board.append(WB_WR_CMD, 0, 1, Some(&[1])).await.unwrap();
        board.eof().await.unwrap();
        assert_eq!(board.status().window_sb, board.status().window_clock);
    }

    #[tokio::test]
    async fn status_reports_board_identity() {
        let mut bootstrap = NullBootstrap;
        let board = Board::connect("7i43u", MockUsbEndpoint::new(), &mut bootstrap)
            .await
            .unwrap();
        let status = board.status();
        assert_eq!(status.board_type, "7i43u");
        assert_eq!(status.chip_type, "3s400tq144");
    }
}
