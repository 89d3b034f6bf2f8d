//! Wishbone-over-USB wire-format and tuning constants.
//!
//! These mirror the compile-time constants a real deployment would pull
//! from `wb_regs.h`/`bitfile.h` on the FPGA side (spec §6). The wire
//! format is fixed, so these are plain `const`s rather than runtime
//! configuration.

use std::time::Duration;

/// First preamble byte of a WOU-frame.
pub const WOUF_PREAMBLE: u8 = 0xA5;
/// Start-of-frame delimiter, immediately after the two preamble bytes.
pub const WOUF_SOFD: u8 = 0x5A;

/// Frame header size: PREAMBLE, PREAMBLE, SOFD, PLOAD_SIZE_TX, TID, PLOAD_SIZE_RX.
pub const WOUF_HDR_SIZE: usize = 6;
/// Size of the trailing CRC-16 field.
pub const CRC_SIZE: usize = 2;
/// Size of one WOU packet header: FUNC_DSIZE + WB_ADDR.
pub const WOU_HDR_SIZE: usize = 3;
/// Width of a Wishbone address field on the wire.
pub const WB_ADDR_SIZE: usize = 2;

/// Top bit of FUNC_DSIZE selects read vs write.
pub const WB_WR_CMD: u8 = 0x80;
pub const WB_RD_CMD: u8 = 0x00;
/// Low 7 bits of FUNC_DSIZE are the data size; top bit is reserved for FUNC.
pub const MAX_DSIZE: u8 = 0x7F;

/// Maximum WOU-packet payload carried by one frame (excludes header/CRC).
pub const MAX_PSIZE: usize = 252;

/// Size of the shadow Wishbone register map.
pub const WB_REG_SIZE: usize = 4096;

/// Number of slots in the circular frame buffer (the "CLOCK").
pub const NR_OF_CLK: usize = 256;
/// Sliding window size; must be `<= NR_OF_CLK - 1`.
pub const NR_OF_WIN: u8 = 64;

/// Minimum bytes staged before a TX burst is submitted.
pub const TX_BURST_MIN: usize = 16;
/// Maximum bytes submitted in a single TX burst.
pub const TX_BURST_MAX: usize = 4096;
/// Minimum/step size requested for a single RX burst.
pub const RX_BURST_MIN: usize = 4096;

/// Wall-clock budget for one outstanding TX burst before it is considered lost.
pub const TX_TIMEOUT: Duration = Duration::from_millis(50);

/// FTDI-style USB endpoint tuning (spec §6 "Environment").
pub const TX_CHUNK_SIZE: usize = 4096;
pub const RX_CHUNK_SIZE: usize = 4096;
pub const LATENCY_TIMER: Duration = Duration::from_millis(1);
pub const USB_READ_TIMEOUT: Duration = Duration::from_secs(1);
pub const USB_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Cooperative nap taken by `eof()` while the sliding window is full.
pub const EOF_SPIN_SLEEP: Duration = Duration::from_micros(300);

/// Largest buffer a single WOU-frame slot can occupy.
pub const MAX_FRAME_SIZE: usize = WOUF_HDR_SIZE + MAX_PSIZE + CRC_SIZE;
