//! The contract every logical function of the composite device implements.

use crate::endpoint::{ControlPipe, UsbEndpoint};
use crate::error::{Fault, Result, UsbError};
use crate::usb::{InterfaceDescriptor, Setup};

/// bmAttributes and bInterval of one endpoint of an interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EndpointInfo {
    pub attributes: u8,
    pub interval: u8,
}

/// Static description of a logical function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub alternate: u8,
    /// bNumEndpoints: 1 (IN only) or 2 (IN and OUT).
    pub endpoints: u8,
    pub class: u8,
    pub sub_class: u8,
    pub protocol: u8,
    pub interface_str: u8,
    pub ep_in: EndpointInfo,
    /// Attributes of the OUT endpoint, defaulting to those of the IN endpoint.
    pub ep_out: Option<EndpointInfo>,
    /// Endpoint numbers this interface consumes.
    ///
    /// A two endpoint interface consuming one number gets IN and OUT at the same number, which
    /// some vendor classes expect. Consuming two numbers puts OUT one number above IN.
    pub allocate_endpoints: u8,
}

impl InterfaceInfo {
    /// A single IN endpoint interface.
    pub const fn new(class: u8, sub_class: u8, protocol: u8, ep_in: EndpointInfo) -> Self {
        Self {
            alternate: 0,
            endpoints: 1,
            class,
            sub_class,
            protocol,
            interface_str: 0,
            ep_in,
            ep_out: None,
            allocate_endpoints: 1,
        }
    }

    /// Adds an OUT endpoint, consuming `allocate` endpoint numbers in total.
    pub const fn with_out(mut self, ep_out: EndpointInfo, allocate: u8) -> Self {
        self.endpoints = 2;
        self.ep_out = Some(ep_out);
        self.allocate_endpoints = allocate;
        self
    }

    pub fn out_endpoint(&self) -> EndpointInfo {
        self.ep_out.unwrap_or(self.ep_in)
    }

    pub fn descriptor(&self, number: u8) -> InterfaceDescriptor {
        InterfaceDescriptor {
            alternate_setting: self.alternate,
            endpoints: self.endpoints,
            class: self.class,
            sub_class: self.sub_class,
            protocol: self.protocol,
            interface_str: self.interface_str,
            ..InterfaceDescriptor::new(number)
        }
    }

    /// Checks `1 <= allocate_endpoints <= endpoints <= 2`.
    pub fn validate(&self, index: u8) -> core::result::Result<(), Fault> {
        let ok = (1..=2).contains(&self.allocate_endpoints)
            && self.allocate_endpoints <= self.endpoints
            && self.endpoints <= 2;
        if ok {
            Ok(())
        } else {
            Err(Fault::InvalidEndpointLayout {
                index,
                endpoints: self.endpoints,
                allocate: self.allocate_endpoints,
            })
        }
    }
}

/// The endpoints assigned to one interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceEndpoints {
    pub in_ep: Option<UsbEndpoint>,
    pub out_ep: Option<UsbEndpoint>,
}

impl InterfaceEndpoints {
    pub fn owns(&self, number: u8) -> bool {
        self.iter().any(|ep| ep.number() == number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UsbEndpoint> {
        self.in_ep.iter().chain(self.out_ep.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut UsbEndpoint> {
        self.in_ep.iter_mut().chain(self.out_ep.iter_mut())
    }
}

/// A logical function of the composite device (CDC serial, HID, mass storage, ...).
pub trait UsbInterface {
    fn info(&self) -> InterfaceInfo;

    /// Class specific descriptors emitted right after the interface descriptor, such as CDC
    /// functional descriptors or the HID class descriptor.
    fn supplemental_descriptor(&self) -> &[u8] {
        &[]
    }

    /// Standard requests the device core does not answer itself, like GET_DESCRIPTOR for a HID
    /// report descriptor or SET_INTERFACE.
    fn handle_standard_request(&mut self, ctrl: &mut ControlPipe<'_>, setup: &Setup) -> Result<()> {
        let _ = (ctrl, setup);
        Err(UsbError::NotSupported)
    }

    fn handle_class_request(&mut self, ctrl: &mut ControlPipe<'_>, setup: &Setup) -> Result<()> {
        let _ = (ctrl, setup);
        Err(UsbError::NotSupported)
    }

    /// Called on every USB interrupt; the interface services whatever activity its own endpoints
    /// have.
    fn handle_endpoint_interrupt(&mut self, endpoints: &mut InterfaceEndpoints);
}
