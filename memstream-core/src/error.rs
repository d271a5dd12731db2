//! Error types for stream operations.

use snafu::Snafu;

/// A data fault raised by a stream operation.
///
/// Programming faults (misaligned typed access, using a detached stream)
/// are never represented here: they always panic.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StreamError {
    /// A write, seek or padding request would run past the end of the region.
    #[snafu(display(
        "{op}: buffer overrun writing {type_name}: requested {requested} bytes at offset {position}, only {remaining} remaining"
    ))]
    Overrun {
        /// Operation that failed.
        op: &'static str,
        /// Type being written.
        type_name: &'static str,
        /// Bytes requested (or target offset, for seeks).
        requested: usize,
        /// Cursor position at the time of the fault.
        position: usize,
        /// Bytes left in the region (or region length, for seeks).
        remaining: usize,
    },

    /// A read, seek or padding request would run past the end of the region.
    #[snafu(display(
        "{op}: buffer underrun reading {type_name}: requested {requested} bytes at offset {position}, only {remaining} remaining"
    ))]
    Underrun {
        /// Operation that failed.
        op: &'static str,
        /// Type being read.
        type_name: &'static str,
        /// Bytes requested (or target offset, for seeks).
        requested: usize,
        /// Cursor position at the time of the fault.
        position: usize,
        /// Bytes left in the region (or region length, for seeks).
        remaining: usize,
    },

    /// The bytes do not decode to a valid value, or a value has no valid
    /// encoding (a string with an interior NUL).
    #[snafu(display("invalid data at offset {position}: {message}"))]
    InvalidData {
        /// Error description.
        message: &'static str,
        /// Cursor position at the time of the fault.
        position: usize,
    },
}

impl StreamError {
    /// Bytes that the failing operation asked for, if it was a bounds fault.
    #[must_use]
    pub fn requested(&self) -> Option<usize> {
        match self {
            Self::Overrun { requested, .. } | Self::Underrun { requested, .. } => Some(*requested),
            Self::InvalidData { .. } => None,
        }
    }

    /// Bytes that were left in the region, if it was a bounds fault.
    #[must_use]
    pub fn remaining(&self) -> Option<usize> {
        match self {
            Self::Overrun { remaining, .. } | Self::Underrun { remaining, .. } => Some(*remaining),
            Self::InvalidData { .. } => None,
        }
    }

    /// Cursor position at which the fault was raised.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::Overrun { position, .. }
            | Self::Underrun { position, .. }
            | Self::InvalidData { position, .. } => *position,
        }
    }
}

/// Result type for stream operations.
pub type Result<T> = core::result::Result<T, StreamError>;

/// How a stream surfaces data faults (overrun, underrun, invalid data).
///
/// Chosen per stream at construction. The `fail-fast` feature only changes
/// which policy [`Default`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Panic with the fault description.
    Fatal,
    /// Return the fault as an `Err`.
    Report,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        if cfg!(feature = "fail-fast") {
            Self::Fatal
        } else {
            Self::Report
        }
    }
}

impl ErrorPolicy {
    /// Apply the policy to a fault.
    #[track_caller]
    pub(crate) fn raise<T>(self, err: StreamError) -> Result<T> {
        match self {
            Self::Fatal => {
                tracing::error!(%err, "fatal stream fault");
                panic!("{err}");
            }
            Self::Report => {
                tracing::debug!(%err, "stream fault");
                Err(err)
            }
        }
    }
}
