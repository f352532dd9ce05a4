//! Quirk rule data model.

use crate::error::{QuirkError, Result};
use crate::identity::DeviceIdentity;

/// Identity value that stands for "any device".
pub const WILDCARD_ID: u16 = 0xffff;

/// One identity predicate of a [`QuirkRule`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum IdPattern {
    Any,
    Exact(u16),
}

impl IdPattern {
    pub const fn matches(self, value: u16) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(id) => id == value,
        }
    }
}

impl From<u16> for IdPattern {
    fn from(value: u16) -> Self {
        if value == WILDCARD_ID {
            Self::Any
        } else {
            Self::Exact(value)
        }
    }
}

/// Byte width of a config-space register write, limited to what the control interface accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct FieldSize(u8);

impl FieldSize {
    pub const fn new(bytes: u8) -> Option<Self> {
        match bytes {
            1..=4 => Some(Self(bytes)),
            _ => None,
        }
    }

    pub const fn bytes(self) -> u8 {
        self.0
    }
}

/// One register override granted to a matching device.
///
/// `size` is kept as the raw digit from the rule file; it is range-checked when the override is
/// encoded (see [`FieldOverride::checked_size`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct FieldOverride {
    pub register: u32,
    pub size: u8,
    pub mask: u32,
}

impl FieldOverride {
    pub fn checked_size(&self) -> Result<FieldSize> {
        FieldSize::new(self.size).ok_or(QuirkError::InvalidFieldSize(self.size))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QuirkRule {
    pub vendor: IdPattern,
    pub device: IdPattern,
    pub subvendor: IdPattern,
    pub subdevice: IdPattern,
    pub fields: Vec<FieldOverride>,
}

impl QuirkRule {
    /// All four identity predicates must hold.
    pub fn matches(&self, dev: &DeviceIdentity) -> bool {
        self.vendor.matches(dev.vendor_id)
            && self.device.matches(dev.device_id)
            && self.subvendor.matches(dev.subsystem_vendor_id)
            && self.subdevice.matches(dev.subsystem_device_id)
    }
}

/// Strips an optional `0x` prefix and surrounding whitespace; `None` unless what remains is a
/// non-empty run of hex digits.
fn hex_digits(text: &str) -> Option<&str> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(digits)
}

pub(crate) fn parse_hex_u16(text: &str) -> Option<u16> {
    u16::from_str_radix(hex_digits(text)?, 16).ok()
}

pub(crate) fn parse_hex_u32(text: &str) -> Option<u32> {
    u32::from_str_radix(hex_digits(text)?, 16).ok()
}
