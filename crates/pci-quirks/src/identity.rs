//! Resolving a PCI address to the identity fields quirk rules match on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{QuirkError, Result};
use crate::rules::parse_hex_u16;
use crate::PciAddress;

/// Config-space offset of the subsystem vendor ID (type 0 header).
pub const PCI_SUBSYSTEM_VENDOR_ID: usize = 0x2c;
/// Config-space offset of the subsystem ID (type 0 header).
pub const PCI_SUBSYSTEM_ID: usize = 0x2e;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DeviceIdentity {
    pub address: PciAddress,
    pub vendor_id: u16,
    pub device_id: u16,
    pub subsystem_vendor_id: u16,
    pub subsystem_device_id: u16,
}

pub trait DeviceResolver {
    fn resolve(&self, address: PciAddress) -> Result<DeviceIdentity>;
}

/// Reads identity attributes from `/sys/bus/pci/devices/<address>/`.
#[derive(Clone, Debug)]
pub struct SysfsResolver {
    devices_dir: PathBuf,
}

impl SysfsResolver {
    pub fn new(devices_dir: impl Into<PathBuf>) -> Self {
        Self {
            devices_dir: devices_dir.into(),
        }
    }

    fn read_id(&self, address: PciAddress, dir: &Path, attr: &str) -> Result<u16> {
        let path = dir.join(attr);
        let text = fs::read_to_string(&path).map_err(|e| QuirkError::io(&path, e))?;
        parse_hex_u16(&text).ok_or_else(|| QuirkError::Resolve {
            address,
            reason: format!("malformed {attr} attribute {:?}", text.trim()),
        })
    }

    /// Subsystem attributes are missing for some header types and older kernels; fall back to
    /// the raw config space when that happens.
    fn read_subsystem_id(
        &self,
        address: PciAddress,
        dir: &Path,
        attr: &str,
        config_offset: usize,
    ) -> Result<u16> {
        match self.read_id(address, dir, attr) {
            Err(QuirkError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                read_config_word(address, &dir.join("config"), config_offset)
            }
            other => other,
        }
    }
}

impl DeviceResolver for SysfsResolver {
    fn resolve(&self, address: PciAddress) -> Result<DeviceIdentity> {
        let dir = self.devices_dir.join(address.to_string());
        Ok(DeviceIdentity {
            address,
            vendor_id: self.read_id(address, &dir, "vendor")?,
            device_id: self.read_id(address, &dir, "device")?,
            subsystem_vendor_id: self.read_subsystem_id(
                address,
                &dir,
                "subsystem_vendor",
                PCI_SUBSYSTEM_VENDOR_ID,
            )?,
            subsystem_device_id: self.read_subsystem_id(
                address,
                &dir,
                "subsystem_device",
                PCI_SUBSYSTEM_ID,
            )?,
        })
    }
}

fn read_config_word(address: PciAddress, path: &Path, offset: usize) -> Result<u16> {
    let config = fs::read(path).map_err(|e| QuirkError::io(path, e))?;
    match config.get(offset..offset + 2) {
        Some(word) => Ok(u16::from_le_bytes([word[0], word[1]])),
        None => Err(QuirkError::Resolve {
            address,
            reason: format!(
                "config space is {} bytes, need offset {offset:#x}",
                config.len()
            ),
        }),
    }
}
