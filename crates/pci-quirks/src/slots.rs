//! Reading the list of devices currently bound to pciback.

use std::fs;
use std::path::Path;

use crate::error::{QuirkError, Result};
use crate::PciAddress;

/// Reads the pciback `slots` listing. Lines that are not a bare `DDDD:BB:SS.F` address are
/// skipped, including lines that are not valid UTF-8.
pub fn read_bound_devices(path: &Path) -> Result<Vec<PciAddress>> {
    let listing = fs::read(path).map_err(|e| QuirkError::io(path, e))?;
    Ok(parse_bound_devices(&listing))
}

pub fn parse_bound_devices(listing: &[u8]) -> Vec<PciAddress> {
    listing
        .split(|&b| b == b'\n')
        .filter_map(|line| {
            let parsed = std::str::from_utf8(line)
                .ok()
                .and_then(|line| line.parse::<PciAddress>().ok());
            if parsed.is_none() && !line.is_empty() {
                tracing::trace!(line = %String::from_utf8_lossy(line), "skipping slots line");
            }
            parsed
        })
        .collect()
}
