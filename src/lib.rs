//! # wou-transport
//!
//! A reliable, ordered, framed transport for Wishbone bus reads and writes
//! carried over an unreliable USB bulk channel (an FTDI FT245-style
//! bridge) between a host and an FPGA. The engine is single-threaded and
//! cooperative: one [`board::Board`] owns its USB endpoint exclusively,
//! staging Wishbone transactions into frames (`frame`), sealing and
//! retransmitting them with a Go-Back-N sliding window (`window`), and
//! parsing the reply stream back into a shadow register map (`parser`,
//! `regs`).
//!
//! See `board::Board` for the entry point.

pub mod board;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod crc;
pub mod error;
pub mod frame;
pub mod logging;
pub mod parser;
pub mod regs;
pub mod transport;
pub mod usb;
pub mod window;

pub use board::{Board, BoardStatus, BOARD_TABLE};
pub use bootstrap::{Bootstrap, NullBootstrap};
pub use config::BoardConfig;
pub use error::{BoardError, ConfigError, TransportError};
pub use usb::UsbEndpoint;
