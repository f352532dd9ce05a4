//! Encoding matched overrides and writing them to the pciback `quirks` control file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::error::{QuirkError, Result};
use crate::identity::DeviceIdentity;
use crate::matcher::QuirkMatch;
use crate::rules::FieldOverride;

/// Encodes one directive as `DDDD:BB:SS.F-RRRRRRRR:Z:MMMMMMMM`.
///
/// The kernel parses this with fixed widths, so every field is zero-padded lowercase hex. A size
/// outside 1..=4 is refused rather than encoded.
pub fn encode(device: &DeviceIdentity, field: &FieldOverride) -> Result<String> {
    let size = field.checked_size()?;
    Ok(format!(
        "{}-{:08x}:{}:{:08x}",
        device.address,
        field.register,
        size.bytes(),
        field.mask
    ))
}

/// Destination for encoded quirk directives.
pub trait QuirkSink {
    /// Writes one directive as its own transaction.
    fn write_override(&mut self, encoded: &str) -> Result<()>;

    fn describe(&self) -> String;
}

/// The pciback `quirks` file. Every directive opens, writes and closes the file; the kernel
/// accepts one directive per write.
#[derive(Clone, Debug)]
pub struct ControlFile {
    path: PathBuf,
}

impl ControlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QuirkSink for ControlFile {
    fn write_override(&mut self, encoded: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| QuirkError::io(&self.path, e))?;
        // `write_all` turns a short write into an error instead of a half-written directive.
        file.write_all(encoded.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| QuirkError::io(&self.path, e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Outcome of applying a batch of matches.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ApplyReport {
    /// Directives written successfully.
    pub applied: usize,
    /// Overrides that could not be encoded; nothing was written for these.
    pub rejected: usize,
    /// Directives whose write failed.
    pub failed: usize,
}

/// Encodes and writes every match in order. Individual failures are logged and counted; they
/// never stop the remaining writes.
pub fn apply_overrides(matches: &[QuirkMatch], sink: &mut dyn QuirkSink) -> ApplyReport {
    let mut report = ApplyReport::default();
    for m in matches {
        let encoded = match encode(&m.device, &m.field) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(address = %m.device.address, register = m.field.register, "{err}");
                report.rejected += 1;
                continue;
            }
        };
        match sink.write_override(&encoded) {
            Ok(()) => {
                tracing::debug!(directive = %encoded, "quirk written");
                report.applied += 1;
            }
            Err(err) => {
                tracing::warn!(directive = %encoded, "write failed: {err}");
                report.failed += 1;
            }
        }
    }
    report
}
