//! Simulated backend
//!
//! An in-memory register file that behaves like the card closely enough
//! for the driver's sequences to be tested without hardware:
//!
//! - `PORT_DATA` carries the board's hardware-ID strap from construction
//! - a write to `RTC_DATA1` with the commit flag set latches and clears it
//! - every write and set/clear is logged in order
//! - faults can be injected per operation and register
//!
//! Clones share the same card, so a test can hand one clone to an
//! [`crate::IrigbDevice`] and keep the other to inspect what was written.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use irigb_chip::board::HW_ID_SHIFT;
use irigb_chip::pcie::IRIGB_DEVICE_ID;
use irigb_chip::regs::{self, rtc_data};

use crate::backend::{check_addr, check_batch, RegisterPort};
use crate::error::{IrigbError, Result};
use crate::variant::BoardVariant;

/// Firmware date the simulated FPGA reports.
pub const SIMULATED_DATE_CODE: u32 = 0x2014_0101;

/// Register operation a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultOp {
    /// Register reads, including the source status read.
    Read,
    /// Batched register writes.
    Write,
    /// Masked set/clear writes.
    SetClear,
}

/// One logged mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Plain write.
    Write {
        /// Register index.
        addr: usize,
        /// Value written.
        value: u32,
    },
    /// Masked write.
    SetClear {
        /// Register index.
        addr: usize,
        /// Bits set.
        set: u32,
        /// Bits cleared.
        clear: u32,
    },
}

impl Access {
    /// Register this access touched.
    #[must_use]
    pub const fn addr(&self) -> usize {
        match *self {
            Self::Write { addr, .. } | Self::SetClear { addr, .. } => addr,
        }
    }
}

#[derive(Debug)]
struct State {
    regs: [u32; regs::REGISTER_COUNT],
    source_status: u32,
    log: Vec<Access>,
    faults: Vec<(FaultOp, usize)>,
}

impl State {
    fn check_fault(&self, op: FaultOp, addrs: impl IntoIterator<Item = usize>) -> Result<()> {
        for addr in addrs {
            if self.faults.contains(&(op, addr)) {
                return Err(IrigbError::transport(
                    match op {
                        FaultOp::Read => "read",
                        FaultOp::Write => "write",
                        FaultOp::SetClear => "set/clear",
                    },
                    io::Error::other(format!("injected fault on {}", regs::name(addr))),
                ));
            }
        }
        Ok(())
    }

    fn store(&mut self, addr: usize, value: u32) {
        self.regs[addr] = if addr == regs::RTC_DATA1 {
            value & !rtc_data::COMMIT_TIME
        } else {
            value
        };
    }
}

/// In-memory IRIG-B card.
#[derive(Debug, Clone)]
pub struct SimulatedCard {
    state: Arc<Mutex<State>>,
}

impl SimulatedCard {
    /// Power-on card of the given variant, RTC at 2024-01-01 00:00:00.
    #[must_use]
    pub fn new(variant: BoardVariant) -> Self {
        Self::with_hw_id(variant.hw_id())
    }

    /// Card whose strap carries an arbitrary hardware ID.
    #[must_use]
    pub fn with_hw_id(hw_id: u32) -> Self {
        let mut regs = [0u32; regs::REGISTER_COUNT];
        regs[regs::DEVICE_ID] = u32::from(IRIGB_DEVICE_ID);
        regs[regs::DATE_CODE] = SIMULATED_DATE_CODE;
        regs[regs::PORT_DATA] = (hw_id & 0x7) << HW_ID_SHIFT;
        regs[regs::RTC_DATA0] = 0x0100_0000;
        regs[regs::RTC_DATA1] = 0x0020_2401;
        Self {
            state: Arc::new(Mutex::new(State {
                regs,
                source_status: 0,
                log: Vec::new(),
                faults: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current value of a register, bypassing faults and the log.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is outside the register file.
    #[must_use]
    pub fn register(&self, addr: usize) -> u32 {
        self.lock().regs[addr]
    }

    /// Set a register as the hardware would, without logging.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is outside the register file.
    pub fn set_register(&self, addr: usize, value: u32) {
        self.lock().regs[addr] = value;
    }

    /// Set the interrupt status the kernel driver would have latched.
    pub fn set_source_status(&self, value: u32) {
        self.lock().source_status = value;
    }

    /// Mutations since construction or the last [`Self::clear_log`].
    #[must_use]
    pub fn writes(&self) -> Vec<Access> {
        self.lock().log.clone()
    }

    /// Forget logged mutations.
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Make every `op` touching `addr` fail with a transport error.
    pub fn inject_fault(&self, op: FaultOp, addr: usize) {
        let mut state = self.lock();
        if !state.faults.contains(&(op, addr)) {
            state.faults.push((op, addr));
        }
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }
}

impl RegisterPort for SimulatedCard {
    fn read_registers(&mut self, addrs: &[usize], values: &mut [u32]) -> Result<()> {
        check_batch(addrs.len())?;
        if values.len() != addrs.len() {
            return Err(IrigbError::validation(
                "read buffer length",
                values.len(),
                "must match the address count",
            ));
        }
        addrs.iter().try_for_each(|&a| check_addr(a))?;
        let state = self.lock();
        state.check_fault(FaultOp::Read, addrs.iter().copied())?;
        for (value, &addr) in values.iter_mut().zip(addrs) {
            *value = state.regs[addr];
        }
        Ok(())
    }

    fn write_registers(&mut self, pairs: &[(usize, u32)]) -> Result<()> {
        check_batch(pairs.len())?;
        pairs.iter().try_for_each(|&(a, _)| check_addr(a))?;
        let mut state = self.lock();
        state.check_fault(FaultOp::Write, pairs.iter().map(|&(a, _)| a))?;
        for &(addr, value) in pairs {
            state.store(addr, value);
            state.log.push(Access::Write { addr, value });
        }
        Ok(())
    }

    fn set_clear_bits(&mut self, addr: usize, set: u32, clear: u32) -> Result<()> {
        check_addr(addr)?;
        let mut state = self.lock();
        state.check_fault(FaultOp::SetClear, [addr])?;
        let value = (state.regs[addr] & !clear) | set;
        state.store(addr, value);
        state.log.push(Access::SetClear { addr, set, clear });
        Ok(())
    }

    fn read_source_status(&mut self) -> Result<u32> {
        let state = self.lock();
        state.check_fault(FaultOp::Read, [regs::INT_STATUS])?;
        Ok(state.source_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strap_matches_variant() {
        for v in BoardVariant::ALL {
            let card = SimulatedCard::new(v);
            assert_eq!(BoardVariant::from_port_data(card.register(regs::PORT_DATA)).unwrap(), v);
        }
    }

    #[test]
    fn clones_share_state() {
        let card = SimulatedCard::new(BoardVariant::DaIrigbS);
        let mut port = card.clone();
        port.write_register(regs::PPS_CONFIG, 0x1234).unwrap();
        assert_eq!(card.register(regs::PPS_CONFIG), 0x1234);
        assert_eq!(
            card.writes(),
            [Access::Write {
                addr: regs::PPS_CONFIG,
                value: 0x1234
            }]
        );
    }

    #[test]
    fn set_clear_applies_clear_then_set() {
        let mut card = SimulatedCard::new(BoardVariant::DaIrigbS);
        card.set_register(regs::OUTPUT_PORT_CONFIG, 0xFF);
        card.set_clear_bits(regs::OUTPUT_PORT_CONFIG, 0x100, 0x0F).unwrap();
        assert_eq!(card.register(regs::OUTPUT_PORT_CONFIG), 0x1F0);
    }

    #[test]
    fn commit_flag_latches_and_clears() {
        let mut card = SimulatedCard::new(BoardVariant::DaIrigbS);
        card.write_register(regs::RTC_DATA1, rtc_data::COMMIT_TIME | 0x0020_2512)
            .unwrap();
        assert_eq!(card.register(regs::RTC_DATA1), 0x0020_2512);
    }

    #[test]
    fn faulted_batch_writes_nothing() {
        let mut card = SimulatedCard::new(BoardVariant::DaIrigbS);
        card.inject_fault(FaultOp::Write, regs::RTC_DATA1);
        let err = card
            .write_registers(&[(regs::RTC_DATA0, 1), (regs::RTC_DATA1, 2)])
            .unwrap_err();
        assert!(matches!(err, IrigbError::Transport { op: "write", .. }));
        assert!(card.writes().is_empty());
        assert_eq!(card.register(regs::RTC_DATA0), 0x0100_0000);

        card.clear_faults();
        card.write_registers(&[(regs::RTC_DATA0, 1)]).unwrap();
    }

    #[test]
    fn rejects_oversized_batch() {
        let mut card = SimulatedCard::new(BoardVariant::DaIrigbS);
        let mut values = [0u32; 5];
        assert!(card.read_registers(&[0, 1, 2, 3, 4], &mut values).is_err());
        assert!(card.read_registers(&[0, 1], &mut values[..1]).is_err());
    }

    #[test]
    fn source_status_read() {
        let mut card = SimulatedCard::new(BoardVariant::De2Irigb4Dio);
        card.set_source_status(0x0C);
        assert_eq!(card.read_source_status().unwrap(), 0x0C);
        card.inject_fault(FaultOp::Read, regs::INT_STATUS);
        assert!(card.read_source_status().is_err());
    }
}
