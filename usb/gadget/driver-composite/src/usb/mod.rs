//! The Universal Serial Bus (USB) descriptor model.
//!
//! Plain binary records for the descriptors a USB 2.0 device reports to the host, and the SETUP
//! packet that opens a control transfer. Every record is `repr(C, packed)` and implements
//! [plain::Plain], so its in-memory layout is its little-endian wire layout.
//!
//! The [Universal Serial Bus Specification](https://www.usb.org/document-library/usb-20-specification)
//! (USB2) is the document that informs this implementation; chapter 9 in particular.
pub use self::config::{ConfigAttributes, ConfigDescriptor};
pub use self::device::DeviceDescriptor;
pub use self::endpoint::{
    endpoint_address, EndpDirection, EndpointDescriptor, EndpointTy, ENDP_ADDR_DIR_IN,
    ENDP_ADDR_NUM_MASK, ENDP_ATTR_TY_MASK,
};
pub use self::interface::InterfaceDescriptor;
pub use self::setup::{
    ReqDirection, ReqRecipient, ReqType, Setup, SetupReq, FEATURE_DEVICE_REMOTE_WAKEUP,
    FEATURE_ENDPOINT_HALT,
};
pub use self::string::{StringDescriptor, LANGUAGE_TABLE, STRING_DESC_MAX_CHARS};

/// Enumerates the descriptor kinds a USB 2.0 device can report. (See USB2 Table 9-5)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum DescriptorKind {
    /// A Device Descriptor. See [DeviceDescriptor]
    Device = 1,
    /// A Configuration Descriptor. See [ConfigDescriptor]
    Configuration = 2,
    /// A String Descriptor. See [StringDescriptor]
    String = 3,
    /// An Interface Descriptor. See [InterfaceDescriptor]
    Interface = 4,
    /// An Endpoint Descriptor. See [EndpointDescriptor]
    Endpoint = 5,
    /// A Device Qualifier, only sent by high-speed capable devices.
    DeviceQualifier = 6,
    /// The "Other Speed Configuration" descriptor (USB2 9.6.4)
    OtherSpeedConfiguration = 7,
    InterfacePower = 8,
    /// Interface Association Descriptor (USB2 ECN), grouping the interfaces of one function.
    InterfaceAssociation = 11,
    /// HID class descriptor. Fetched from the owning interface.
    Hid = 33,
    /// HID report descriptor. Fetched from the owning interface.
    HidReport = 34,
}

impl DescriptorKind {
    pub fn from_u8(kind: u8) -> Option<Self> {
        Some(match kind {
            1 => Self::Device,
            2 => Self::Configuration,
            3 => Self::String,
            4 => Self::Interface,
            5 => Self::Endpoint,
            6 => Self::DeviceQualifier,
            7 => Self::OtherSpeedConfiguration,
            8 => Self::InterfacePower,
            11 => Self::InterfaceAssociation,
            33 => Self::Hid,
            34 => Self::HidReport,
            _ => return None,
        })
    }
}

pub(crate) mod config;
pub(crate) mod device;
pub(crate) mod endpoint;
pub(crate) mod interface;
pub(crate) mod setup;
pub(crate) mod string;
