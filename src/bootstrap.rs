//! # FPGA bootstrap (C8)
//!
//! The board table (`crate::board::BOARD_TABLE`) names a `program_funct`
//! per board type in the original (`m7i43u_program_fpga` for the one
//! cataloged board). That function lives outside the transport core's
//! scope (spec Non-goals): it is the caller's job to get a bitstream onto
//! the FPGA before `connect()`. This module only defines the seam a real
//! loader plugs into, plus a no-op used by tests and by boards that are
//! already programmed.

use crate::error::ConfigError;

/// Resets the board and loads a bitstream onto it. Implementations are
/// expected to be synchronous/blocking: bootstrap happens once, before the
/// single-threaded transport engine starts running.
pub trait Bootstrap: Send {
    fn reset(&mut self) -> Result<(), ConfigError>;
    fn load_bitstream(&mut self, path: &str) -> Result<(), ConfigError>;
}

/// Stands in for a board that is already programmed, or for tests that
/// don't exercise bootstrap at all.
#[derive(Debug, Default)]
pub struct NullBootstrap;

impl Bootstrap for NullBootstrap {
    fn reset(&mut self) -> Result<(), ConfigError> {
        Ok(())
    }

    fn load_bitstream(&mut self, _path: &str) -> Result<(), ConfigError> {
        Ok(())
    }
}
