//! Kernel backend
//!
//! Register access through `/dev/moxa_irigb*` ioctls. Requires the
//! `moxa_irigb` kernel module.

use std::path::{Path, PathBuf};

use crate::backend::{check_addr, check_batch, RegisterPort};
use crate::error::{IrigbError, Result};
use crate::io::IoHandle;

/// Kernel driver backend
#[derive(Debug)]
pub struct KernelPort {
    io: IoHandle,
    path: PathBuf,
}

impl KernelPort {
    /// Open the device node at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if the node is missing, or a transport error
    /// if it cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Opening {}", path.display());
        let io = IoHandle::open(path)?;
        Ok(Self {
            io,
            path: path.to_path_buf(),
        })
    }

    /// Device node this port was opened on.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterPort for KernelPort {
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
        self.io.get_registers(addrs, values)
    }

    fn write_registers(&mut self, pairs: &[(usize, u32)]) -> Result<()> {
        check_batch(pairs.len())?;
        pairs.iter().try_for_each(|&(a, _)| check_addr(a))?;
        self.io.set_registers(pairs)
    }

    fn set_clear_bits(&mut self, addr: usize, set: u32, clear: u32) -> Result<()> {
        check_addr(addr)?;
        self.io.set_clear(addr, set, clear)
    }

    fn read_source_status(&mut self) -> Result<u32> {
        self.io.timesrc_status()
    }
}

impl Drop for KernelPort {
    fn drop(&mut self) {
        tracing::debug!("Closing {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires hardware
    fn read_device_id() {
        let mut port = KernelPort::open(irigb_chip::pcie::DEVICE_NODE).expect("open device");
        let id = port.read_register(irigb_chip::regs::DEVICE_ID).expect("read");
        println!("DEVICEID = {id:#010x}");
    }

    #[test]
    fn missing_node_is_device_not_found() {
        let err = KernelPort::open("/dev/moxa_irigb_missing").unwrap_err();
        assert!(matches!(err, IrigbError::DeviceNotFound { .. }));
    }
}
