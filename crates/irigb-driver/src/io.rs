//! Low-level ioctl calls into the `moxa_irigb` kernel driver
//!
//! The kernel driver owns the BAR mapping; userspace only ever passes
//! register indices and values through four ioctls. Struct layouts match
//! the driver's `reg_val_pair_struct` / `reg_bit_pair_struct`.
//!
//! ioctls use libc: rustix's typed ioctl wrappers need an `Ioctl` impl per
//! request, which buys nothing for four fixed-layout calls.

use std::os::raw::c_ulong;
use std::os::unix::io::{AsRawFd, OwnedFd};
use std::path::Path;

use irigb_chip::pcie::MAX_PAIRS;
use rustix::fs::{Mode, OFlags};
use tracing::debug;

use crate::error::{IrigbError, Result};

/// ioctl request numbers.
///
/// `_IOC(dir, type, nr, size) = dir << 30 | size << 16 | type << 8 | nr`.
/// The kernel header does not mask `nr`, and these numbers spill into the
/// type byte; the values below reproduce that exactly.
mod ioctls {
    use irigb_chip::pcie::IOCTL_TYPE;
    use std::os::raw::c_ulong;

    const IOC_WRITE: c_ulong = 1;
    const IOC_READ: c_ulong = 2;

    #[allow(clippy::cast_possible_truncation)]
    const fn ioc(dir: c_ulong, ty: u8, nr: c_ulong) -> c_ulong {
        let size = std::mem::size_of::<c_ulong>() as c_ulong;
        (dir << 30) | (size << 16) | ((ty as c_ulong) << 8) | nr
    }

    pub const GET_REGISTER: c_ulong = ioc(IOC_READ, IOCTL_TYPE, 0x800);
    pub const SET_REGISTER: c_ulong = ioc(IOC_WRITE, IOCTL_TYPE, 0x801);
    pub const SETCLR_REGISTER_BIT: c_ulong = ioc(IOC_WRITE, IOCTL_TYPE, 0x802);
    pub const GET_TIMESRC_STATUS: c_ulong = ioc(IOC_WRITE, IOCTL_TYPE, 0x803);
}

// Fields are `unsigned long long` in the kernel header on every target;
// only the size baked into the request numbers is `unsigned long`.
#[repr(C)]
#[derive(Debug, Default)]
struct RegValPairs {
    count: u64,
    addr: [u64; MAX_PAIRS],
    val: [u64; MAX_PAIRS],
}

#[repr(C)]
#[derive(Debug)]
struct RegBitPair {
    addr: u64,
    set_bit: u64,
    clear_bit: u64,
}

/// Open handle on a `moxa_irigb` device node.
#[derive(Debug)]
pub struct IoHandle {
    fd: OwnedFd,
}

impl IoHandle {
    /// Open the device node read/write.
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if the node does not exist, or a transport
    /// error if it cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(IrigbError::device_not_found(path));
        }
        let fd = rustix::fs::open(path, OFlags::RDWR | OFlags::CLOEXEC, Mode::empty())
            .map_err(|e| IrigbError::transport("open", e.into()))?;
        Ok(Self { fd })
    }

    /// Batched register read.
    ///
    /// `addrs` and `values` have the same length, already checked to be 1..=4.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn get_registers(&self, addrs: &[usize], values: &mut [u32]) -> Result<()> {
        let mut get = RegValPairs {
            count: addrs.len() as u64,
            ..RegValPairs::default()
        };
        for (slot, &addr) in get.addr.iter_mut().zip(addrs) {
            *slot = addr as u64;
        }

        // SAFETY: fd is open for the lifetime of self; GET_REGISTER reads
        // `count` addresses from the struct and writes back as many values.
        // The struct layout matches reg_val_pair_struct and outlives the call.
        let ret = unsafe {
            libc::ioctl(self.fd.as_raw_fd(), ioctls::GET_REGISTER as _, &raw mut get)
        };
        if ret < 0 {
            return Err(IrigbError::transport("read", std::io::Error::last_os_error()));
        }

        // Registers are 32 bits wide.
        for (value, &raw) in values.iter_mut().zip(&get.val) {
            *value = raw as u32;
        }
        debug!("GET_REGISTER {addrs:?} -> {values:#x?}");
        Ok(())
    }

    /// Batched register write, 1..=4 pairs.
    pub(crate) fn set_registers(&self, pairs: &[(usize, u32)]) -> Result<()> {
        let mut set = RegValPairs {
            count: pairs.len() as u64,
            ..RegValPairs::default()
        };
        for (i, &(addr, value)) in pairs.iter().enumerate() {
            set.addr[i] = addr as u64;
            set.val[i] = u64::from(value);
        }
        debug!("SET_REGISTER {pairs:#x?}");

        // SAFETY: fd is open for the lifetime of self; SET_REGISTER only
        // reads the struct, whose layout matches reg_val_pair_struct.
        let ret = unsafe {
            libc::ioctl(self.fd.as_raw_fd(), ioctls::SET_REGISTER as _, &raw const set)
        };
        if ret < 0 {
            return Err(IrigbError::transport("write", std::io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Set-then-clear bits of one register.
    pub(crate) fn set_clear(&self, addr: usize, set_bits: u32, clear_bits: u32) -> Result<()> {
        let pair = RegBitPair {
            addr: addr as u64,
            set_bit: u64::from(set_bits),
            clear_bit: u64::from(clear_bits),
        };
        debug!("SETCLR_REGISTER_BIT addr={addr} set={set_bits:#x} clear={clear_bits:#x}");

        // SAFETY: fd is open for the lifetime of self; SETCLR_REGISTER_BIT
        // only reads the struct, whose layout matches reg_bit_pair_struct.
        let ret = unsafe {
            libc::ioctl(self.fd.as_raw_fd(), ioctls::SETCLR_REGISTER_BIT as _, &raw const pair)
        };
        if ret < 0 {
            return Err(IrigbError::transport("set/clear", std::io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Latched time-source status word.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn timesrc_status(&self) -> Result<u32> {
        let mut status: c_ulong = 0;

        // SAFETY: fd is open for the lifetime of self; GET_TIMESRC_STATUS
        // writes one unsigned long through the pointer.
        let ret = unsafe {
            libc::ioctl(self.fd.as_raw_fd(), ioctls::GET_TIMESRC_STATUS as _, &raw mut status)
        };
        if ret < 0 {
            return Err(IrigbError::transport(
                "source status",
                std::io::Error::last_os_error(),
            ));
        }
        Ok(status as u32)
    }
}
