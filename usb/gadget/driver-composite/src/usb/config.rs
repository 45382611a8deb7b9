use plain::Plain;

use super::DescriptorKind;

bitflags::bitflags! {
    /// bmAttributes of a configuration descriptor (USB2 Table 9-10).
    #[derive(Default)]
    #[repr(transparent)]
    pub struct ConfigAttributes: u8 {
        const REMOTE_WAKEUP = 1 << 5;
        const SELF_POWERED = 1 << 6;
        // bit 7 is reserved and must always be set for USB 1.1 compatibility
        const BUS_POWERED = 1 << 7;
    }
}

/// The header of a configuration descriptor.
///
/// On the wire it is followed by every interface, endpoint and class specific descriptor of the
/// configuration; `total_length` covers all of them.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfigDescriptor {
    pub length: u8,
    pub kind: u8,
    pub total_length: u16,
    pub interfaces: u8,
    pub configuration_value: u8,
    pub configuration_str: u8,
    pub attributes: u8,
    /// Maximum bus current in 2mA units.
    pub max_power: u8,
}

unsafe impl Plain for ConfigDescriptor {}

impl ConfigDescriptor {
    pub const SIZE: usize = 9;

    /// A header for configuration 1 with the length fields left at zero.
    pub fn new(attributes: ConfigAttributes, max_power: u8) -> Self {
        Self {
            length: Self::SIZE as u8,
            kind: DescriptorKind::Configuration as u8,
            total_length: 0,
            interfaces: 0,
            configuration_value: 1,
            configuration_str: 0,
            attributes: (attributes | ConfigAttributes::BUS_POWERED).bits(),
            max_power,
        }
    }

    pub fn attributes(&self) -> ConfigAttributes {
        ConfigAttributes::from_bits_truncate(self.attributes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { plain::as_bytes(self) }
    }
}
