use plain::Plain;

use super::DescriptorKind;

/// The descriptor for a USB Endpoint.
///
/// Each endpoint for a particular interface has its own descriptor. The information in this
/// structure is used by the host to determine the bandwidth requirements of the endpoint.
///
/// It is only ever sent as part of a configuration descriptor, and cannot be requested
/// individually.
///
/// See USB2 9.6.6, the offsets for the fields in the packet are described in USB2 Table 9-13
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub length: u8,
    pub kind: u8,
    pub address: u8,
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
}

unsafe impl Plain for EndpointDescriptor {}

/// Mask that is ANDed to the [EndpointDescriptor].attributes buffer to get the endpoint type.
pub const ENDP_ATTR_TY_MASK: u8 = 0x3;
/// Direction bit of an endpoint address; set for IN (device to host) endpoints.
pub const ENDP_ADDR_DIR_IN: u8 = 0x80;
/// Mask that is ANDed to an endpoint address, or to wIndex of an endpoint request, to get the
/// endpoint number.
pub const ENDP_ADDR_NUM_MASK: u8 = 0x7F;

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EndpointTy {
    Ctrl = 0,
    Isoch = 1,
    Bulk = 2,
    Interrupt = 3,
}

impl EndpointTy {
    pub fn from_attributes(attributes: u8) -> Self {
        match attributes & ENDP_ATTR_TY_MASK {
            0 => EndpointTy::Ctrl,
            1 => EndpointTy::Isoch,
            2 => EndpointTy::Bulk,
            3 => EndpointTy::Interrupt,
            _ => unreachable!(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EndpDirection {
    Out,
    In,
}

impl EndpDirection {
    pub fn from_address(address: u8) -> Self {
        if address & ENDP_ADDR_DIR_IN != 0 {
            EndpDirection::In
        } else {
            EndpDirection::Out
        }
    }
}

/// Builds an endpoint address from its number and direction.
pub const fn endpoint_address(number: u8, direction: EndpDirection) -> u8 {
    match direction {
        EndpDirection::In => ENDP_ADDR_DIR_IN | (number & ENDP_ADDR_NUM_MASK),
        EndpDirection::Out => number & ENDP_ADDR_NUM_MASK,
    }
}

impl EndpointDescriptor {
    pub const SIZE: usize = 7;

    pub fn new(address: u8, attributes: u8, max_packet_size: u16, interval: u8) -> Self {
        Self {
            length: Self::SIZE as u8,
            kind: DescriptorKind::Endpoint as u8,
            address,
            attributes,
            max_packet_size,
            interval,
        }
    }

    pub fn ty(&self) -> EndpointTy {
        EndpointTy::from_attributes(self.attributes)
    }

    pub fn number(&self) -> u8 {
        self.address & ENDP_ADDR_NUM_MASK
    }

    pub fn direction(&self) -> EndpDirection {
        EndpDirection::from_address(self.address)
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { plain::as_bytes(self) }
    }
}
