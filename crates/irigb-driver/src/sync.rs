//! Host/RTC synchronization controller
//!
//! ```text
//! Idle ──run──▶ Configuring ──ok──▶ Syncing ⇄ Waiting
//!                    │                  │        │
//!                    └──error──▶ Stopped ◀──cancel┘
//! ```
//!
//! Configuration errors stop the controller. A failed sync iteration is
//! logged and counted and the loop carries on at the next interval.
//! Cancellation is observed at the top of each iteration and while
//! waiting, never inside a register sequence.

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::clock::HostClock;
use crate::device::IrigbDevice;
use crate::error::{IrigbError, Result};
use crate::routing::{self, ParityMode, SignalType, SyncSource};
use crate::variant::BoardVariant;

/// Longest sync interval, one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Validated sync interval, 1..=86 400 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyncInterval(u64);

impl SyncInterval {
    /// Interval of `secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns `Validation` outside 1..=86 400.
    pub fn new(secs: u64) -> Result<Self> {
        if (1..=MAX_INTERVAL_SECS).contains(&secs) {
            Ok(Self(secs))
        } else {
            Err(IrigbError::validation("sync interval", secs, "must be 1..=86400 s"))
        }
    }

    /// Seconds.
    #[must_use]
    pub const fn secs(self) -> u64 {
        self.0
    }

    /// As a [`Duration`].
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for SyncInterval {
    fn default() -> Self {
        Self(10)
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Which clock is set on each iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncDirection {
    /// Host clock follows the RTC.
    #[default]
    HostFromRtc,
    /// RTC follows the host clock.
    RtcFromHost,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HostFromRtc => "host <- RTC",
            Self::RtcFromHost => "RTC <- host",
        })
    }
}

/// Controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// RTC sync source.
    pub source: SyncSource,
    /// Receiver type of the source's input.
    pub signal_type: SignalType,
    /// Invert the source's input.
    pub invert: bool,
    /// Parity check mode of the source's decoder.
    pub parity: ParityMode,
    /// Time between iterations.
    pub interval: SyncInterval,
    /// Direction of each iteration after the startup sync.
    pub direction: SyncDirection,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: SyncSource::Port1,
            signal_type: SignalType::Differential,
            invert: false,
            parity: ParityMode::Even,
            interval: SyncInterval::default(),
            direction: SyncDirection::HostFromRtc,
        }
    }
}

impl SyncConfig {
    /// Check this configuration against a board without touching it.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCombination` if the board does not run the sync
    /// loop from this source, or has no such receiver on the source's port.
    pub fn validate(&self, variant: BoardVariant) -> Result<()> {
        if !variant.layout().daemon_sources.contains(&self.source) {
            return Err(IrigbError::unsupported(
                format!("syncing from {}", self.source),
                variant,
            ));
        }
        if let Some(port) = self.source.port() {
            routing::plan_input(variant, port, self.signal_type, self.invert)?;
            routing::plan_input_parity(variant, self.source, self.parity)?;
        }
        Ok(())
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Not started.
    Idle,
    /// Applying the configuration.
    Configuring,
    /// Running one sync iteration.
    Syncing,
    /// Sleeping until the next iteration.
    Waiting,
    /// Finished.
    Stopped,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Syncing => "syncing",
            Self::Waiting => "waiting",
            Self::Stopped => "stopped",
        })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Sync iterations attempted, the startup sync included.
    pub iterations: u64,
    /// Iterations that failed.
    pub failures: u64,
}

/// Drives the configure / sync / wait loop on one device.
#[derive(Debug)]
pub struct SyncController<'a, C: HostClock> {
    device: &'a mut IrigbDevice,
    clock: C,
    config: SyncConfig,
    cancel: CancelToken,
    state: SyncState,
}

impl<'a, C: HostClock> SyncController<'a, C> {
    /// New controller in [`SyncState::Idle`].
    pub fn new(device: &'a mut IrigbDevice, clock: C, config: SyncConfig, cancel: CancelToken) -> Self {
        Self {
            device,
            clock,
            config,
            cancel,
            state: SyncState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// The host clock, for inspection after a run.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    fn transition(&mut self, next: SyncState) {
        debug!("Sync state {} -> {next}", self.state);
        self.state = next;
    }

    /// Configure the device, then sync until cancelled.
    ///
    /// # Errors
    ///
    /// Returns the configuration error that stopped the controller. Sync
    /// iteration failures are only counted in the report.
    pub fn run(&mut self) -> Result<SyncReport> {
        self.transition(SyncState::Configuring);
        if let Err(e) = self.configure() {
            error!("Sync configuration failed: {e}");
            self.transition(SyncState::Stopped);
            return Err(e);
        }

        let mut report = SyncReport::default();

        // Startup sync always pulls the RTC into the host.
        self.transition(SyncState::Syncing);
        report.iterations += 1;
        if let Err(e) = self.device.sync_host_from_rtc(&mut self.clock) {
            warn!("Startup sync failed: {e}");
            report.failures += 1;
        }

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            self.transition(SyncState::Waiting);
            if self.cancel.wait_timeout(self.config.interval.as_duration()) {
                break;
            }

            self.transition(SyncState::Syncing);
            report.iterations += 1;
            if let Err(e) = self.sync_once() {
                warn!("Sync iteration {} failed: {e}", report.iterations);
                report.failures += 1;
            }
        }

        self.transition(SyncState::Stopped);
        info!(
            "Sync stopped after {} iterations ({} failed)",
            report.iterations, report.failures
        );
        Ok(report)
    }

    fn configure(&mut self) -> Result<()> {
        let config = self.config;
        config.validate(self.device.variant())?;

        if let Some(port) = config.source.port() {
            self.device.set_input(port, config.signal_type, config.invert)?;
            self.device.set_input_parity(config.source, config.parity)?;
        }
        // Last, so the RX LED reflects the input just applied.
        self.device.set_sync_source(config.source)?;

        info!(
            "Syncing {} every {} from {} ({} input, invert {}, {} parity)",
            config.direction,
            config.interval,
            config.source,
            config.signal_type,
            config.invert,
            config.parity
        );
        Ok(())
    }

    fn sync_once(&mut self) -> Result<()> {
        let time = match self.config.direction {
            SyncDirection::HostFromRtc => self.device.sync_host_from_rtc(&mut self.clock)?,
            SyncDirection::RtcFromHost => self.device.sync_rtc_from_host(&mut self.clock)?,
        };
        debug!("Synced {time}");
        Ok(())
    }
}
