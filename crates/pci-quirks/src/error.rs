use std::path::PathBuf;

use thiserror::Error;

use crate::PciAddress;

pub type Result<T> = std::result::Result<T, QuirkError>;

/// Unified error type for loading rules, enumerating devices and writing quirks.
///
/// None of these are fatal on their own: the caller decides whether a failure escalates (rule
/// file, slots list) or is absorbed (one device, one control-file write).
#[derive(Debug, Error)]
pub enum QuirkError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse rule file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("quirk rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("invalid PCI address {0:?}")]
    InvalidAddress(String),

    #[error("field size {0} is not a byte width in 1..=4")]
    InvalidFieldSize(u8),

    #[error("resolve identity of {address}: {reason}")]
    Resolve { address: PciAddress, reason: String },
}

impl QuirkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A condition that ends the run before any quirk is written.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("No quirks found.")]
    NoQuirks {
        #[source]
        cause: Option<QuirkError>,
    },

    #[error("No pciback device found.")]
    NoDevices {
        #[source]
        cause: Option<QuirkError>,
    },
}

impl RunError {
    /// Process exit status for this failure.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NoQuirks { .. } => 2,
            Self::NoDevices { .. } => 3,
        }
    }

    pub fn cause(&self) -> Option<&QuirkError> {
        match self {
            Self::NoQuirks { cause } | Self::NoDevices { cause } => cause.as_ref(),
        }
    }
}
