//! PCI quirk matching for devices bound to Xen `pciback`.
//!
//! A quirk rule names a device by vendor/device/subsystem IDs (each either exact or the `0xffff`
//! wildcard) and lists config-space registers the pass-through driver should let the guest
//! write. This crate loads rules from JSON, resolves the devices listed in pciback's `slots`
//! file, matches the two, and writes one `DDDD:BB:SS.F-RRRRRRRR:Z:MMMMMMMM` directive per matched
//! register to pciback's `quirks` control file.

#![forbid(unsafe_code)]

mod address;
pub mod config;
pub mod error;
pub mod identity;
pub mod loader;
pub mod matcher;
pub mod pipeline;
pub mod rules;
pub mod slots;
pub mod writer;

#[cfg(test)]
mod proptests;

pub use address::PciAddress;
pub use config::PcibackPaths;
pub use error::{QuirkError, Result, RunError};
pub use identity::{DeviceIdentity, DeviceResolver, SysfsResolver};
pub use loader::{load_rules, parse_rules};
pub use matcher::{collect_overrides, find_matches, match_all_devices, QuirkMatch};
pub use pipeline::{resolve_devices, run};
pub use rules::{FieldOverride, FieldSize, IdPattern, QuirkRule, WILDCARD_ID};
pub use slots::{parse_bound_devices, read_bound_devices};
pub use writer::{apply_overrides, encode, ApplyReport, ControlFile, QuirkSink};
