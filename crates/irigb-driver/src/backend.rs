//! Register access abstraction
//!
//! Every hardware interaction goes through [`RegisterPort`]. The kernel
//! backend forwards to the `moxa_irigb` ioctls; the simulated backend keeps
//! the register file in memory for tests and CI.

use std::fmt::Debug;

use irigb_chip::pcie::MAX_PAIRS;
use irigb_chip::regs;

use crate::error::{IrigbError, Result};

/// Register transport - one implementation per way of reaching the card.
///
/// Batched calls carry 1..=4 registers and reach the card as a single
/// transport call, so a batched read of the RTC words is one snapshot.
pub trait RegisterPort: Debug + Send {
    /// Read `addrs.len()` registers into `values` in one call.
    ///
    /// # Errors
    ///
    /// Returns error if the batch size is out of range or the transport fails.
    fn read_registers(&mut self, addrs: &[usize], values: &mut [u32]) -> Result<()>;

    /// Write 1..=4 `(register, value)` pairs in one call.
    ///
    /// # Errors
    ///
    /// Returns error if the batch size is out of range or the transport fails.
    fn write_registers(&mut self, pairs: &[(usize, u32)]) -> Result<()>;

    /// Atomically set then clear bits of one register.
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails.
    fn set_clear_bits(&mut self, addr: usize, set: u32, clear: u32) -> Result<()>;

    /// Read the interrupt status latched by the kernel driver.
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails.
    fn read_source_status(&mut self) -> Result<u32>;

    /// Read one register.
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails.
    fn read_register(&mut self, addr: usize) -> Result<u32> {
        let mut value = [0u32];
        self.read_registers(&[addr], &mut value)?;
        Ok(value[0])
    }

    /// Write one register.
    ///
    /// # Errors
    ///
    /// Returns error if the transport fails.
    fn write_register(&mut self, addr: usize, value: u32) -> Result<()> {
        self.write_registers(&[(addr, value)])
    }
}

/// Reject batches the transport cannot carry.
pub(crate) fn check_batch(len: usize) -> Result<()> {
    if (1..=MAX_PAIRS).contains(&len) {
        Ok(())
    } else {
        Err(IrigbError::validation(
            "register batch size",
            len,
            "must be 1..=4",
        ))
    }
}

/// Reject register indices outside the register file.
pub(crate) fn check_addr(addr: usize) -> Result<()> {
    if addr < regs::REGISTER_COUNT {
        Ok(())
    } else {
        Err(IrigbError::validation(
            "register address",
            addr,
            "outside the register file",
        ))
    }
}
