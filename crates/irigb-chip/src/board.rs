//! Board hardware IDs.
//!
//! Each carrier board straps a 3-bit ID onto FPGA general-purpose inputs
//! GPI13..GPI15, which land in the input half of [`PORT_DATA`].
//!
//! ```text
//! ID  Board                  Ports wired
//! ──  ─────────────────────  ──────────────────────────────────────────
//!  1  DA-IRIGB-4DIO-PCI104   Port1 in/out, 4 DI + 4 DO
//!  2  DE2-IRIGB-4DIO         Fiber in (TTL), Port1 in/out, 4 DI + 4 DO
//!  7  DA-IRIGB-S             Fiber in (TTL), Port1 in, Port1..4 out
//! ```
//!
//! [`PORT_DATA`]: crate::regs::PORT_DATA

use crate::regs::port_data;

/// DA-IRIGB-4DIO-PCI104 (DA-682A expansion module).
pub const DA_IRIGB_4DIO_PCI104: u32 = 1;
/// DE2-IRIGB-4DIO.
pub const DE2_IRIGB_4DIO: u32 = 2;
/// DA-IRIGB-S (DA-820 expansion module).
pub const DA_IRIGB_S: u32 = 7;

/// First GPI bit carrying the hardware ID.
pub const HW_ID_SHIFT: u32 = 13;

/// Extract the hardware ID from a raw `PORT_DATA` read.
#[must_use]
pub const fn hw_id_from_port_data(port_data_value: u32) -> u32 {
    ((port_data_value >> port_data::INPUT_SHIFT) & port_data::HALF_MASK) >> HW_ID_SHIFT
}
