use plain::Plain;

use super::DescriptorKind;

/// USB2 9.6.5, Table 9-12
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub length: u8,
    pub kind: u8,
    pub number: u8,
    pub alternate_setting: u8,
    pub endpoints: u8,
    pub class: u8,
    pub sub_class: u8,
    pub protocol: u8,
    pub interface_str: u8,
}

unsafe impl Plain for InterfaceDescriptor {}

impl InterfaceDescriptor {
    pub const SIZE: usize = 9;

    pub fn new(number: u8) -> Self {
        Self {
            length: Self::SIZE as u8,
            kind: DescriptorKind::Interface as u8,
            number,
            ..Self::default()
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { plain::as_bytes(self) }
    }
}
