//! Silicon model for the Moxa IRIG-B PCI timing card.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the FPGA: register addresses, bit fields, PCI identifiers
//! and the board hardware IDs strapped onto the port-data inputs.
//!
//! Register addresses are small indices, not byte offsets: the kernel driver
//! takes the index and does the MMIO itself.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`pcie`] | Vendor/device IDs, device node name |
//! | [`regs`] | Register indices and every bit field the driver touches |
//! | [`board`] | Board hardware IDs (GPI13..15 strap) |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod board;
pub mod pcie;
pub mod regs;
