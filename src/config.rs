//! # Per-connection configuration
//!
//! `BoardConfig` carries the tunables spec §6 allows a deployment to
//! adjust (burst sizes, TX timeout, USB chunk sizes) as constructible
//! fields, mirroring the teacher's split between `constants.rs` (the
//! fixed wire format) and a `SerialConfig`-style struct for everything a
//! deployment might reasonably override. The wire-format constants
//! (`WOUF_HDR_SIZE`, `CRC_SIZE`, `NR_OF_CLK`, ...) stay compile-time, as
//! they describe the protocol itself rather than one connection's pacing.

use std::time::Duration;

use crate::constants;

#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Minimum bytes staged before a TX burst is submitted.
    pub tx_burst_min: usize,
    /// Maximum bytes submitted in a single TX burst.
    pub tx_burst_max: usize,
    /// Minimum/step size requested for a single RX burst.
    pub rx_burst_min: usize,
    /// Wall-clock budget for one outstanding TX burst before it's lost.
    pub tx_timeout: Duration,
    /// Cooperative nap taken by `eof()` while the sliding window is full.
    pub eof_spin_sleep: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            tx_burst_min: constants::TX_BURST_MIN,
            tx_burst_max: constants::TX_BURST_MAX,
            rx_burst_min: constants::RX_BURST_MIN,
            tx_timeout: constants::TX_TIMEOUT,
            eof_spin_sleep: constants::EOF_SPIN_SLEEP,
        }
    }
}
