use plain::Plain;

use super::DescriptorKind;

/// The eight byte SETUP packet that opens every control transfer (USB2 9.3).
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Setup {
    /// bmRequestType
    pub kind: u8,
    /// bRequest
    pub request: u8,
    /// wValue
    pub value: u16,
    /// wIndex
    pub index: u16,
    /// wLength
    pub length: u16,
}

unsafe impl Plain for Setup {}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReqDirection {
    HostToDevice = 0,
    DeviceToHost = 1,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReqType {
    /// Standard device requests, such as SET_ADDRESS and SET_CONFIGURATION. These are answered by
    /// the device core itself.
    Standard = 0,

    /// Class specific requests, forwarded to the interface that owns the recipient.
    Class = 1,

    /// Vendor specific requests, forwarded like class requests.
    Vendor = 2,

    /// Reserved
    Reserved = 3,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReqRecipient {
    Device = 0,
    Interface = 1,
    Endpoint = 2,
    Other = 3,
    // 4..=30 are reserved
    VendorSpecific = 31,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SetupReq {
    GetStatus = 0x00,
    ClearFeature = 0x01,
    SetFeature = 0x03,
    SetAddress = 0x05,
    GetDescriptor = 0x06,
    SetDescriptor = 0x07,
    GetConfiguration = 0x08,
    SetConfiguration = 0x09,
    GetInterface = 0x0A,
    SetInterface = 0x0B,
    SynchFrame = 0x0C,
}

impl TryFrom<u8> for SetupReq {
    type Error = u8;

    fn try_from(request: u8) -> Result<Self, Self::Error> {
        Ok(match request {
            0x00 => Self::GetStatus,
            0x01 => Self::ClearFeature,
            0x03 => Self::SetFeature,
            0x05 => Self::SetAddress,
            0x06 => Self::GetDescriptor,
            0x07 => Self::SetDescriptor,
            0x08 => Self::GetConfiguration,
            0x09 => Self::SetConfiguration,
            0x0A => Self::GetInterface,
            0x0B => Self::SetInterface,
            0x0C => Self::SynchFrame,
            other => return Err(other),
        })
    }
}

/// Feature selectors (USB2 Table 9-6).
pub const FEATURE_ENDPOINT_HALT: u16 = 0;
pub const FEATURE_DEVICE_REMOTE_WAKEUP: u16 = 1;

pub const USB_SETUP_DIR_BIT: u8 = 1 << 7;
pub const USB_SETUP_REQ_TY_MASK: u8 = 0x60;
pub const USB_SETUP_REQ_TY_SHIFT: u8 = 5;
pub const USB_SETUP_RECIPIENT_MASK: u8 = 0x1F;
pub const USB_SETUP_RECIPIENT_SHIFT: u8 = 0;

impl Setup {
    pub const SIZE: usize = 8;

    /// Reads a SETUP packet as received on endpoint 0. Returns `None` for short packets.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        plain::from_bytes::<Self>(bytes).ok().copied()
    }

    pub fn direction(&self) -> ReqDirection {
        if self.kind & USB_SETUP_DIR_BIT == 0 {
            ReqDirection::HostToDevice
        } else {
            ReqDirection::DeviceToHost
        }
    }

    pub const fn req_ty(&self) -> u8 {
        (self.kind & USB_SETUP_REQ_TY_MASK) >> USB_SETUP_REQ_TY_SHIFT
    }

    pub const fn req_recipient(&self) -> u8 {
        (self.kind & USB_SETUP_RECIPIENT_MASK) >> USB_SETUP_RECIPIENT_SHIFT
    }

    pub fn is_standard(&self) -> bool {
        self.req_ty() == ReqType::Standard as u8
    }

    pub fn recipient_is(&self, recipient: ReqRecipient) -> bool {
        self.req_recipient() == recipient as u8
    }

    /// The high byte of wValue. For GET_DESCRIPTOR this is the descriptor type.
    pub fn value_high(&self) -> u8 {
        (self.value >> 8) as u8
    }

    /// The low byte of wValue. For GET_DESCRIPTOR this is the descriptor index.
    pub fn value_low(&self) -> u8 {
        (self.value & 0xFF) as u8
    }

    pub const fn get_status(recipient: ReqRecipient, index: u16) -> Self {
        Self {
            kind: 0b1000_0000 | recipient as u8,
            request: 0x00,
            value: 0,
            index,
            length: 2,
        }
    }

    pub const fn clear_feature(recipient: ReqRecipient, feature: u16, index: u16) -> Self {
        Self {
            kind: 0b0000_0000 | recipient as u8,
            request: 0x01,
            value: feature,
            index,
            length: 0,
        }
    }

    pub const fn set_feature(recipient: ReqRecipient, feature: u16, index: u16) -> Self {
        Self {
            kind: 0b0000_0000 | recipient as u8,
            request: 0x03,
            value: feature,
            index,
            length: 0,
        }
    }

    pub const fn set_address(address: u16) -> Self {
        Self {
            kind: 0b0000_0000,
            request: 0x05,
            value: address,
            index: 0,
            length: 0,
        }
    }

    pub const fn get_descriptor(
        kind: DescriptorKind,
        index: u8,
        language: u16,
        length: u16,
    ) -> Self {
        Self {
            kind: 0b1000_0000,
            request: 0x06,
            value: ((kind as u16) << 8) | (index as u16),
            index: language,
            length,
        }
    }

    pub const fn set_descriptor(kind: u8, index: u8, language: u16, length: u16) -> Self {
        Self {
            kind: 0b0000_0000,
            request: 0x07,
            value: ((kind as u16) << 8) | (index as u16),
            index: language,
            length,
        }
    }

    pub const fn get_configuration() -> Self {
        Self {
            kind: 0b1000_0000,
            request: 0x08,
            value: 0,
            index: 0,
            length: 1,
        }
    }

    pub const fn set_configuration(value: u8) -> Self {
        Self {
            kind: 0b0000_0000,
            request: 0x09,
            value: value as u16,
            index: 0,
            length: 0,
        }
    }

    pub const fn set_interface(interface: u8, alternate_setting: u8) -> Self {
        Self {
            kind: 0b0000_0001,
            request: 0x0B,
            value: alternate_setting as u16,
            index: interface as u16,
            length: 0,
        }
    }
}
