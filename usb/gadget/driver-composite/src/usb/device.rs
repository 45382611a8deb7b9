//! Implements the "Device" USB Descriptor.
//!
//! This descriptor is described in USB2 section 9.6.1

use plain::Plain;

use super::DescriptorKind;

/// A USB Device Descriptor.
///
/// "A device descriptor describes general information about a USB device" (USB2 9.6.1). The host
/// asks for it first during enumeration, usually truncated to eight bytes so that it can learn
/// the maximum packet size of endpoint 0.
///
/// A given device will only have one device descriptor.
///
/// USB2 Table 9-8 describes the packet offsets of the fields described by this structure.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// bLength, always [DeviceDescriptor::SIZE]
    pub length: u8,
    /// bDescriptorType, always [DescriptorKind::Device]
    pub kind: u8,
    /// The USB standard version in binary-coded decimal (bcdUSB). 2.0 is encoded as 200H.
    pub usb: u16,
    /// bDeviceClass.
    ///
    /// Composite devices either report 0 (every interface carries its own class) or EFH with
    /// sub class 02H and protocol 01H to announce interface association descriptors.
    pub class: u8,
    /// bDeviceSubClass
    pub sub_class: u8,
    /// bDeviceProtocol
    pub protocol: u8,
    /// The maximum packet size for endpoint 0 (bMaxPacketSize0). Only 8, 16, 32 and 64 are valid.
    pub packet_size: u8,
    /// idVendor
    pub vendor: u16,
    /// idProduct
    pub product: u16,
    /// The device release number in binary-coded decimal (bcdDevice).
    pub release: u16,
    /// Index of the String Descriptor describing the manufacturer (iManufacturer)
    pub manufacturer_str: u8,
    /// Index of the String Descriptor describing the product (iProduct)
    pub product_str: u8,
    /// Index of the String Descriptor holding the serial number (iSerialNumber)
    pub serial_str: u8,
    /// bNumConfigurations
    pub configurations: u8,
}

unsafe impl Plain for DeviceDescriptor {}

impl DeviceDescriptor {
    pub const SIZE: usize = 18;

    /// A USB 2.0 device with a single configuration whose strings live at the conventional
    /// indices 1 (manufacturer), 2 (product) and 3 (serial number).
    pub const fn new(vendor: u16, product: u16, release: u16) -> Self {
        Self {
            length: Self::SIZE as u8,
            kind: DescriptorKind::Device as u8,
            usb: 0x0200,
            class: 0,
            sub_class: 0,
            protocol: 0,
            packet_size: 64,
            vendor,
            product,
            release,
            manufacturer_str: 1,
            product_str: 2,
            serial_str: 3,
            configurations: 1,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { plain::as_bytes(self) }
    }
}
