use std::fmt;
use std::str::FromStr;

use crate::error::QuirkError;

/// PCI domain/bus/device/function address, as used in sysfs names (`0000:03:00.1`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PciAddress {
    domain: u16,
    bus: u8,
    device: u8,
    function: u8,
}

impl PciAddress {
    pub const MAX_DEVICE: u8 = 0x1f;
    pub const MAX_FUNCTION: u8 = 0x7;

    /// Returns `None` if `device > 31` or `function > 7`.
    pub const fn new(domain: u16, bus: u8, device: u8, function: u8) -> Option<Self> {
        if device > Self::MAX_DEVICE || function > Self::MAX_FUNCTION {
            return None;
        }
        Some(Self {
            domain,
            bus,
            device,
            function,
        })
    }

    pub const fn domain(self) -> u16 {
        self.domain
    }

    pub const fn bus(self) -> u8 {
        self.bus
    }

    pub const fn device(self) -> u8 {
        self.device
    }

    pub const fn function(self) -> u8 {
        self.function
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

/// Parses exactly `DDDD:BB:SS.F` (hex digits, either case). Surrounding whitespace is ignored.
impl FromStr for PciAddress {
    type Err = QuirkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || QuirkError::InvalidAddress(s.to_string());
        let text = s.trim();

        let (domain, rest) = text.split_once(':').ok_or_else(invalid)?;
        let (bus, rest) = rest.split_once(':').ok_or_else(invalid)?;
        let (device, function) = rest.split_once('.').ok_or_else(invalid)?;

        let domain = parse_hex_field(domain, 4).ok_or_else(invalid)?;
        let bus = parse_hex_field(bus, 2).ok_or_else(invalid)?;
        let device = parse_hex_field(device, 2).ok_or_else(invalid)?;
        let function = parse_hex_field(function, 1).ok_or_else(invalid)?;

        Self::new(domain, bus as u8, device as u8, function as u8).ok_or_else(invalid)
    }
}

fn parse_hex_field(field: &str, width: usize) -> Option<u16> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(field, 16).ok()
}
