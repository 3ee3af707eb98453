//! Userspace driver for the Moxa IRIG-B PCI timing card.
//!
//! The card decodes IRIG-B from a fiber or electrical input, disciplines an
//! onboard RTC from it and re-emits IRIG-B or PPS on up to four outputs.
//! This crate models the card's registers and keeps the host clock aligned
//! with the RTC.
//!
//! # Layers
//!
//! ```text
//! SyncController ─▶ IrigbDevice ─▶ routing / rtc / variant (pure)
//!                        │
//!                        ▼
//!                  RegisterPort ─▶ KernelPort (/dev/moxa_irigb ioctls)
//!                               └▶ SimulatedCard (in memory)
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use irigb_driver::{IrigbDevice, Port, SignalType, SyncSource, SystemClock};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut dev = IrigbDevice::open(0)?;
//! println!("{} firmware {}", dev.variant(), dev.firmware_date()?);
//!
//! dev.set_input(Port::Port1, SignalType::Differential, false)?;
//! dev.set_sync_source(SyncSource::Port1)?;
//! println!("RTC {}", dev.read_time()?);
//!
//! dev.sync_host_from_rtc(&mut SystemClock)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
mod cancel;
mod clock;
mod device;
mod error;
mod io;
pub mod routing;
pub mod rtc;
mod sync;
pub mod variant;

/// Hardware identification constants (re-exported from irigb-chip).
pub mod pcie_ids {
    pub use irigb_chip::pcie::{lspci_filter, DEVICE_NODE, IRIGB_DEVICE_ID, MOXA_VENDOR_ID};
}

pub use backend::RegisterPort;
pub use irigb_chip::regs::name as register_name;
pub use backends::{KernelPort, SimulatedCard};
pub use cancel::CancelToken;
pub use clock::{HostClock, SystemClock};
pub use device::{device_path, IrigbDevice, DEVICE_ENV, MAX_PPS_WIDTH_MS};
pub use error::{ApplyStep, IrigbError, Result};
pub use routing::{
    DigitalLevel, InputConfig, OutputConfig, OutputMode, ParityMode, Port, SignalStatus,
    SignalType, SyncSource,
};
pub use rtc::{CalendarTime, FirmwareDate, LeapSign, TimeQuality};
pub use sync::{
    SyncConfig, SyncController, SyncDirection, SyncInterval, SyncReport, SyncState,
    MAX_INTERVAL_SECS,
};
pub use variant::BoardVariant;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        BoardVariant, CalendarTime, CancelToken, IrigbDevice, IrigbError, OutputMode, ParityMode,
        Port, Result, SignalType, SyncConfig, SyncController, SyncSource, SystemClock,
    };
}
