use crate::consts::{MAX_GROUP_ADDRESS, MAX_SHORT_ADDRESS};
use std::fmt;

/// Target of a DALI command: either one ballast or a group of them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Address {
    /// Individually addressed device, 0-63.
    Short(u8),
    /// Group of devices, 0-15. Writable, but can't be queried.
    Group(u8),
}

impl Address {
    pub fn new(value: u8, group: bool) -> anyhow::Result<Self> {
        if group {
            Self::group(value)
        } else {
            Self::short(value)
        }
    }

    pub fn short(value: u8) -> anyhow::Result<Self> {
        if value > MAX_SHORT_ADDRESS {
            anyhow::bail!(
                "Short address {} is out of range 0-{}",
                value,
                MAX_SHORT_ADDRESS
            );
        }
        Ok(Self::Short(value))
    }

    pub fn group(value: u8) -> anyhow::Result<Self> {
        if value > MAX_GROUP_ADDRESS {
            anyhow::bail!(
                "Group address {} is out of range 0-{}",
                value,
                MAX_GROUP_ADDRESS
            );
        }
        Ok(Self::Group(value))
    }

    /// Numeric part of the address, without the variant.
    pub fn value(&self) -> u8 {
        match self {
            Self::Short(value) | Self::Group(value) => *value,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// First byte of a forward frame. Bit 0 (selector) is left cleared;
    /// it's set by the command encoder for non-DAPC commands.
    pub fn to_frame_byte(&self) -> u8 {
        match self {
            Self::Short(value) => (value & 0x3F) << 1,
            Self::Group(value) => 0x80 | ((value & 0x0F) << 1),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short(value) => write!(f, "{}", value),
            Self::Group(value) => write!(f, "<group {}>", value),
        }
    }
}
