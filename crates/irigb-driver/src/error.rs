//! Error types for IRIG-B card operations

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::variant::BoardVariant;

/// Result type alias for IRIG-B operations
pub type Result<T> = std::result::Result<T, IrigbError>;

/// Step of a multi-register sequence that failed after earlier steps landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStep {
    /// Electrical-type bit in the port-data register.
    SignalType,
    /// Re-applying outputs that mirror the port 1 input.
    MirrorFixup,
    /// Restoring the RTC sync source after a time write.
    RestoreSyncSource,
}

impl fmt::Display for ApplyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SignalType => "signal type",
            Self::MirrorFixup => "mirror fix-up",
            Self::RestoreSyncSource => "restore sync source",
        })
    }
}

/// Errors that can occur during IRIG-B card operations
#[derive(Debug, Error)]
pub enum IrigbError {
    /// Register transport call failed
    #[error("Register {op} failed: {source}")]
    Transport {
        /// Transport operation that failed
        op: &'static str,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Device node not found
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Hardware ID does not match any known board
    #[error("Unknown board hardware ID {hw_id}")]
    UnknownVariant {
        /// ID read from the port-data strap bits
        hw_id: u32,
    },

    /// Requested combination is not wired on this board
    #[error("{what} is not supported on {variant}")]
    UnsupportedCombination {
        /// Description of the rejected request
        what: String,
        /// Board the request was made against
        variant: BoardVariant,
    },

    /// Argument out of range
    #[error("Invalid {field} {value}: {reason}")]
    Validation {
        /// Field name
        field: &'static str,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A multi-step register sequence failed part way; earlier steps stay applied
    #[error("Partially applied, {step} failed: {source}")]
    PartialApply {
        /// Step that failed
        step: ApplyStep,
        /// Error from that step
        #[source]
        source: Box<IrigbError>,
    },

    /// Hardware returned a value the model cannot interpret
    #[error("Unexpected value {value:#x} in {register}")]
    UnexpectedValue {
        /// Register name
        register: &'static str,
        /// Raw value read
        value: u32,
    },

    /// Reading or setting the host clock failed
    #[error("Host clock error: {reason}")]
    HostClock {
        /// Reason for failure
        reason: String,
    },
}

impl IrigbError {
    /// Create a transport error from an OS error
    pub const fn transport(op: &'static str, source: std::io::Error) -> Self {
        Self::Transport { op, source }
    }

    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create an unsupported combination error
    pub fn unsupported(what: impl Into<String>, variant: BoardVariant) -> Self {
        Self::UnsupportedCombination {
            what: what.into(),
            variant,
        }
    }

    /// Create a validation error
    pub fn validation(field: &'static str, value: impl fmt::Display, reason: &'static str) -> Self {
        Self::Validation {
            field,
            value: value.to_string(),
            reason,
        }
    }

    /// Wrap an error as the failing step of a partially applied sequence
    pub fn partial(step: ApplyStep, source: Self) -> Self {
        Self::PartialApply {
            step,
            source: Box::new(source),
        }
    }

    /// Create a host clock error
    pub fn host_clock(reason: impl Into<String>) -> Self {
        Self::HostClock {
            reason: reason.into(),
        }
    }

    /// True for errors raised before any register was touched.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::UnsupportedCombination { .. }
        )
    }
}
