//! # WOU Error Handling
//!
//! This module defines the two error enums surfaced by the public API, per
//! the taxonomy in spec §7: configuration errors (synchronous, recoverable
//! by the caller) and transport errors (fatal, poison the board handle).

use thiserror::Error;

/// Errors surfaced synchronously from `init`, `connect`, and `append`.
#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    /// `init` was given a `device_type` not present in the board table.
    #[error("unknown board type: {0}")]
    UnknownBoardType(String),

    /// The chip type reported by the board table didn't match the bitstream.
    #[error("chip/bitstream mismatch: board expects {expected}, bitstream targets {found}")]
    ChipMismatch { expected: String, found: String },

    /// `append` was called with a func byte that is neither WB_RD_CMD nor WB_WR_CMD.
    #[error("invalid WOU function code: 0x{0:02X}")]
    InvalidFunc(u8),

    /// `append` was called with `dsize` exceeding `MAX_DSIZE`, or zero.
    #[error("invalid data size {0} (must be 1..=127)")]
    InvalidDsize(u8),

    /// A write `append` call didn't supply `dsize` bytes of data.
    #[error("data length {got} does not match dsize {want}")]
    DataLengthMismatch { want: u8, got: usize },

    /// The bitfile could not be read or was not a recognized target format.
    #[error("bootstrap failed: {0}")]
    BootstrapFailed(String),
}

/// Fatal transport errors, per spec §7: once one of these is returned, the
/// `Board` handle that produced it is no longer usable.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The USB endpoint failed to submit, poll, or complete a transfer.
    #[error("USB transfer failed: {0}")]
    UsbError(String),

    /// The USB endpoint (or the device behind it) disconnected.
    #[error("device disconnected")]
    Disconnected,

    /// An operation was attempted on a handle that already hit a fatal error.
    #[error("board handle is poisoned by a previous fatal error: {0}")]
    Poisoned(String),
}

impl Clone for TransportError {
    fn clone(&self) -> Self {
        match self {
            TransportError::UsbError(s) => TransportError::UsbError(s.clone()),
            TransportError::Disconnected => TransportError::Disconnected,
            TransportError::Poisoned(s) => TransportError::Poisoned(s.clone()),
        }
    }
}

/// Unified error type for the public `Board` API, which can fail either
/// synchronously (bad arguments) or fatally (the USB link died underneath
/// it).
#[derive(Debug, Error, Clone)]
pub enum BoardError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
