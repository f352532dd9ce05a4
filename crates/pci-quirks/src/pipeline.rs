//! The single pass: load rules, enumerate bound devices, resolve, match, write.

use std::path::Path;

use crate::error::RunError;
use crate::identity::{DeviceIdentity, DeviceResolver};
use crate::loader::load_rules;
use crate::matcher::match_all_devices;
use crate::slots::read_bound_devices;
use crate::writer::{apply_overrides, ApplyReport, QuirkSink};
use crate::PciAddress;

/// Resolves every address in order.
///
/// A device whose identity cannot be read contributes nothing, same as a device no rule matches.
/// The failure is logged so the two cases can still be told apart.
pub fn resolve_devices(
    addresses: &[PciAddress],
    resolver: &dyn DeviceResolver,
) -> Vec<DeviceIdentity> {
    addresses
        .iter()
        .filter_map(|&address| match resolver.resolve(address) {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::warn!(%address, "cannot resolve device identity: {err}");
                None
            }
        })
        .collect()
}

/// Runs the whole pass and returns what was written.
///
/// Rules are loaded before the slots listing is touched, so an empty rule file never reads
/// device state.
pub fn run(
    rules_path: &Path,
    slots_path: &Path,
    resolver: &dyn DeviceResolver,
    sink: &mut dyn QuirkSink,
) -> Result<ApplyReport, RunError> {
    let rules = load_rules(rules_path).map_err(|e| RunError::NoQuirks { cause: Some(e) })?;
    if rules.is_empty() {
        return Err(RunError::NoQuirks { cause: None });
    }
    tracing::info!(rules = rules.len(), path = %rules_path.display(), "loaded quirk rules");

    let addresses =
        read_bound_devices(slots_path).map_err(|e| RunError::NoDevices { cause: Some(e) })?;
    if addresses.is_empty() {
        return Err(RunError::NoDevices { cause: None });
    }
    tracing::info!(devices = addresses.len(), "found pciback devices");

    let devices = resolve_devices(&addresses, resolver);
    let matches = match_all_devices(&rules, &devices);
    let report = apply_overrides(&matches, sink);
    tracing::info!(
        applied = report.applied,
        rejected = report.rejected,
        failed = report.failed,
        target = %sink.describe(),
        "quirk pass finished"
    );
    Ok(report)
}
