use std::env;
use std::path::PathBuf;

/// Listing of devices bound to pciback, one address per line.
pub const PCIBACK_SLOTS_FILE: &str = "/sys/bus/pci/drivers/pciback/slots";
/// Write-only control file accepting one quirk directive per write.
pub const PCIBACK_QUIRKS_FILE: &str = "/sys/bus/pci/drivers/pciback/quirks";
/// Per-device sysfs directories, named by PCI address.
pub const PCI_DEVICES_DIR: &str = "/sys/bus/pci/devices";

pub const ENV_SLOTS_FILE: &str = "PCIBACK_SLOTS_FILE";
pub const ENV_QUIRKS_FILE: &str = "PCIBACK_QUIRKS_FILE";
pub const ENV_DEVICES_DIR: &str = "PCI_DEVICES_DIR";

/// Locations of the kernel interfaces the tool reads and writes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PcibackPaths {
    pub slots: PathBuf,
    pub quirks: PathBuf,
    pub devices_dir: PathBuf,
}

impl Default for PcibackPaths {
    fn default() -> Self {
        Self {
            slots: PathBuf::from(PCIBACK_SLOTS_FILE),
            quirks: PathBuf::from(PCIBACK_QUIRKS_FILE),
            devices_dir: PathBuf::from(PCI_DEVICES_DIR),
        }
    }
}

impl PcibackPaths {
    /// Sysfs defaults, overridden by `PCIBACK_SLOTS_FILE`, `PCIBACK_QUIRKS_FILE` and
    /// `PCI_DEVICES_DIR` when set (useful for dry runs against a scratch directory).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key).map(PathBuf::from))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            slots: lookup(ENV_SLOTS_FILE).unwrap_or(defaults.slots),
            quirks: lookup(ENV_QUIRKS_FILE).unwrap_or(defaults.quirks),
            devices_dir: lookup(ENV_DEVICES_DIR).unwrap_or(defaults.devices_dir),
        }
    }
}
