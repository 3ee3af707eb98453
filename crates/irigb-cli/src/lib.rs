//! Shared argument types for the `irigb` and `irigb-syncd` binaries.
//!
//! The driver's enums stay free of clap; these mirror them as
//! [`ValueEnum`]s and convert at the process boundary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use irigb_driver::{
    DigitalLevel, IrigbDevice, OutputMode, ParityMode, Port, SignalType, SyncDirection, SyncSource,
};
use tracing_subscriber::EnvFilter;

/// Electrical signal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SignalTypeArg {
    /// Single-ended TTL.
    Ttl,
    /// Differential (RS-422/485).
    #[value(alias = "differential")]
    Diff,
}

impl From<SignalTypeArg> for SignalType {
    fn from(arg: SignalTypeArg) -> Self {
        match arg {
            SignalTypeArg::Ttl => Self::Ttl,
            SignalTypeArg::Diff => Self::Differential,
        }
    }
}

/// RTC sync source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Internal oscillator.
    FreeRun,
    /// Fiber input.
    Fiber,
    /// Port 1 input.
    Port1,
}

impl From<SourceArg> for SyncSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::FreeRun => Self::FreeRun,
            SourceArg::Fiber => Self::Fiber,
            SourceArg::Port1 => Self::Port1,
        }
    }
}

/// Front-panel port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PortArg {
    /// Fiber receiver.
    Fiber,
    /// Port 1.
    Port1,
    /// Port 2.
    Port2,
    /// Port 3.
    Port3,
    /// Port 4.
    Port4,
}

impl From<PortArg> for Port {
    fn from(arg: PortArg) -> Self {
        match arg {
            PortArg::Fiber => Self::Fiber,
            PortArg::Port1 => Self::Port1,
            PortArg::Port2 => Self::Port2,
            PortArg::Port3 => Self::Port3,
            PortArg::Port4 => Self::Port4,
        }
    }
}

/// Output source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Pass through the fiber input.
    FromFiber,
    /// Pass through the port 1 input.
    FromPort1,
    /// IRIG-B from the RTC.
    Irigb,
    /// PPS from the RTC.
    Pps,
}

impl From<ModeArg> for OutputMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::FromFiber => Self::FromFiberIn,
            ModeArg::FromPort1 => Self::FromPort1In,
            ModeArg::Irigb => Self::IrigbEncode,
            ModeArg::Pps => Self::PpsEncode,
        }
    }
}

/// Parity check mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ParityArg {
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
    /// No parity check.
    None,
}

impl From<ParityArg> for ParityMode {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::Even => Self::Even,
            ParityArg::Odd => Self::Odd,
            ParityArg::None => Self::Disabled,
        }
    }
}

/// Digital line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    /// Logic low.
    #[value(alias = "0")]
    Low,
    /// Logic high.
    #[value(alias = "1")]
    High,
}

impl From<LevelArg> for DigitalLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Low => Self::Low,
            LevelArg::High => Self::High,
        }
    }
}

/// Which clock the sync loop sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Host clock follows the card.
    RtcToHost,
    /// Card follows the host clock.
    HostToRtc,
}

impl From<DirectionArg> for SyncDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::RtcToHost => Self::HostFromRtc,
            DirectionArg::HostToRtc => Self::RtcFromHost,
        }
    }
}

/// Install the fmt subscriber, honouring `RUST_LOG` over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

/// Open the card at `path`, or card 0 when no path was given.
///
/// # Errors
///
/// Returns the driver's open error with the device named.
pub fn open_device(path: Option<&Path>) -> Result<IrigbDevice> {
    let path: PathBuf = path.map_or_else(|| irigb_driver::device_path(0), Path::to_path_buf);
    IrigbDevice::open_path(&path).with_context(|| format!("Cannot open {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_names() {
        assert_eq!(
            SignalTypeArg::from_str("diff", true).map(SignalType::from),
            Ok(SignalType::Differential)
        );
        assert_eq!(
            SourceArg::from_str("free-run", true).map(SyncSource::from),
            Ok(SyncSource::FreeRun)
        );
        assert_eq!(
            ParityArg::from_str("none", true).map(ParityMode::from),
            Ok(ParityMode::Disabled)
        );
        assert_eq!(
            ModeArg::from_str("from-port1", true).map(OutputMode::from),
            Ok(OutputMode::FromPort1In)
        );
        assert_eq!(
            DirectionArg::from_str("host-to-rtc", true).map(SyncDirection::from),
            Ok(SyncDirection::RtcFromHost)
        );
    }

    #[test]
    fn aliases() {
        assert_eq!(SignalTypeArg::from_str("differential", true), Ok(SignalTypeArg::Diff));
        assert_eq!(LevelArg::from_str("1", true), Ok(LevelArg::High));
    }
}
