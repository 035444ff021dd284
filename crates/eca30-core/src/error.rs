//! Error types shared by the engine, the device adapter and config loading.

use std::io;

use thiserror::Error;

/// Failure reported by a [`SeedSource`](crate::source::SeedSource).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SeedError(pub String);

impl SeedError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors surfaced to callers of the engine and device.
///
/// Pool exhaustion is not listed: it is resolved internally by a reseed.
#[derive(Error, Debug)]
pub enum Error {
    /// Copying output to the caller failed. `delivered` bytes were copied
    /// before the fault and count as a successful partial read.
    #[error("transfer fault after {delivered} bytes: {source}")]
    Transfer {
        delivered: usize,
        #[source]
        source: io::Error,
    },

    /// The seed source could not produce a nonzero pool. `delivered` bytes of
    /// the failed request had already reached the caller.
    #[error("entropy source unavailable after {attempts} attempt(s): {reason}")]
    EntropyUnavailable {
        attempts: u32,
        reason: String,
        delivered: usize,
    },

    /// Write attempted on a device opened read-only.
    #[error("device is read-only")]
    ReadOnly,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed configuration file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Bytes handed to the caller before the request failed.
    pub fn delivered(&self) -> usize {
        match self {
            Error::Transfer { delivered, .. } | Error::EntropyUnavailable { delivered, .. } => {
                *delivered
            }
            _ => 0,
        }
    }

    /// Record how much of a request reached the caller before this error.
    pub(crate) fn with_delivered(self, count: usize) -> Self {
        match self {
            Error::EntropyUnavailable {
                attempts, reason, ..
            } => Error::EntropyUnavailable {
                attempts,
                reason,
                delivered: count,
            },
            other => other,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Transfer { source, .. } => source,
            Error::Io(e) => e,
            other => {
                let kind = match &other {
                    Error::ReadOnly => io::ErrorKind::PermissionDenied,
                    Error::Config(_) | Error::Json(_) => io::ErrorKind::InvalidInput,
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_keeps_partial_count() {
        let err = Error::Transfer {
            delivered: 128,
            source: io::Error::new(io::ErrorKind::BrokenPipe, "closed"),
        };
        assert_eq!(err.delivered(), 128);
        assert!(err.to_string().contains("128"));
    }

    #[test]
    fn test_transfer_maps_to_source_kind() {
        let err = Error::Transfer {
            delivered: 0,
            source: io::Error::new(io::ErrorKind::BrokenPipe, "closed"),
        };
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_read_only_maps_to_permission_denied() {
        let io_err: io::Error = Error::ReadOnly.into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_entropy_unavailable_message() {
        let err = Error::EntropyUnavailable {
            attempts: 3,
            reason: "no device".to_string(),
            delivered: 0,
        };
        assert_eq!(
            err.to_string(),
            "entropy source unavailable after 3 attempt(s): no device"
        );
        assert_eq!(err.delivered(), 0);
    }
}
