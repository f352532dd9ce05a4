//! Matching resolved devices against quirk rules.
//!
//! Output ordering is part of the contract: devices in enumeration order, then rules in load
//! order, then each rule's fields in file order. A device may match several rules and every
//! match contributes all of its fields.

use crate::identity::DeviceIdentity;
use crate::rules::{FieldOverride, QuirkRule};

/// One override to apply to one device.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QuirkMatch {
    pub device: DeviceIdentity,
    pub field: FieldOverride,
}

pub fn find_matches(rule: &QuirkRule, device: &DeviceIdentity) -> bool {
    rule.matches(device)
}

pub fn collect_overrides(rules: &[QuirkRule], device: &DeviceIdentity) -> Vec<QuirkMatch> {
    rules
        .iter()
        .filter(|rule| find_matches(rule, device))
        .flat_map(|rule| {
            rule.fields.iter().map(|field| QuirkMatch {
                device: *device,
                field: *field,
            })
        })
        .collect()
}

pub fn match_all_devices(rules: &[QuirkRule], devices: &[DeviceIdentity]) -> Vec<QuirkMatch> {
    devices
        .iter()
        .flat_map(|device| {
            let matches = collect_overrides(rules, device);
            tracing::debug!(
                address = %device.address,
                overrides = matches.len(),
                "matched device"
            );
            matches
        })
        .collect()
}
