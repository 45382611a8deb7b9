//! Registered interfaces and their endpoint numbers.

use log::{debug, trace};
use smallvec::SmallVec;

use crate::endpoint::UsbEndpoint;
use crate::error::{Fault, Result, UsbError};
use crate::interface::{InterfaceEndpoints, UsbInterface};
use crate::usb::EndpDirection;

pub struct InterfaceEntry {
    iface: Box<dyn UsbInterface>,
    index: u8,
    endpoints: InterfaceEndpoints,
}

impl InterfaceEntry {
    /// bInterfaceNumber, which is also the position in registration order.
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn interface(&self) -> &dyn UsbInterface {
        self.iface.as_ref()
    }

    pub fn interface_mut(&mut self) -> &mut dyn UsbInterface {
        self.iface.as_mut()
    }

    pub fn endpoints(&self) -> &InterfaceEndpoints {
        &self.endpoints
    }

    pub fn in_ep(&self) -> Option<&UsbEndpoint> {
        self.endpoints.in_ep.as_ref()
    }

    pub fn out_ep(&self) -> Option<&UsbEndpoint> {
        self.endpoints.out_ep.as_ref()
    }

    pub(crate) fn endpoints_mut(&mut self) -> &mut InterfaceEndpoints {
        &mut self.endpoints
    }

    pub(crate) fn split_mut(&mut self) -> (&mut dyn UsbInterface, &mut InterfaceEndpoints) {
        (self.iface.as_mut(), &mut self.endpoints)
    }
}

/// Interfaces in registration order, which is also the order they appear in the configuration
/// descriptor. There is no removal.
/// bEndpointAddress has four bits for the endpoint number.
pub const MAX_ENDPOINTS: u8 = 16;

pub struct InterfaceRegistry {
    entries: SmallVec<[InterfaceEntry; 4]>,
    endpoints_used: u8,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
            // endpoint 0 is the control endpoint
            endpoints_used: 1,
        }
    }

    /// Endpoint numbers claimed so far, endpoint 0 included.
    pub fn endpoints_used(&self) -> u8 {
        self.endpoints_used
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<&InterfaceEntry> {
        self.entries.get(index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InterfaceEntry> {
        self.entries.iter_mut()
    }

    /// Appends `iface`, claiming the endpoint numbers it declares.
    ///
    /// Returns the interface number. Fails without touching the registry when `budget` endpoint
    /// numbers, capped at [MAX_ENDPOINTS], are not enough.
    pub fn register(&mut self, iface: Box<dyn UsbInterface>, budget: u8) -> Result<u8> {
        let info = iface.info();
        let index = self.entries.len() as u8;
        info.validate(index)?;

        let requested = info.allocate_endpoints;
        let available = budget.min(MAX_ENDPOINTS).saturating_sub(self.endpoints_used);
        if requested > available {
            return Err(UsbError::NoResources {
                requested,
                available,
            });
        }

        debug!(
            "interface {} class {:02x}.{:02x} proto {:02x} takes {} endpoint(s)",
            index, info.class, info.sub_class, info.protocol, requested
        );

        self.entries.push(InterfaceEntry {
            iface,
            index,
            endpoints: InterfaceEndpoints::default(),
        });
        self.endpoints_used += requested;

        Ok(index)
    }

    /// Reassigns endpoint numbers from scratch.
    ///
    /// Every interface gets an IN endpoint at the next free number; two endpoint interfaces also
    /// get an OUT endpoint, at the same number or the one after depending on how many numbers
    /// they allocate. The previous endpoint objects are dropped.
    pub fn finalize_endpoints(&mut self) -> core::result::Result<(), Fault> {
        let mut next: u8 = 1;

        for entry in self.entries.iter_mut() {
            let info = entry.iface.info();
            info.validate(entry.index)?;

            let in_ep = UsbEndpoint::new(
                next,
                EndpDirection::In,
                info.ep_in.attributes,
                info.ep_in.interval,
            );
            let out_ep = if info.endpoints > 1 {
                let out = info.out_endpoint();
                Some(UsbEndpoint::new(
                    next + info.allocate_endpoints - 1,
                    EndpDirection::Out,
                    out.attributes,
                    out.interval,
                ))
            } else {
                None
            };

            trace!(
                "interface {}: in {:?} out {:?}",
                entry.index,
                in_ep.number(),
                out_ep.as_ref().map(UsbEndpoint::number)
            );

            entry.endpoints = InterfaceEndpoints {
                in_ep: Some(in_ep),
                out_ep,
            };
            next += info.allocate_endpoints;
        }

        if next != self.endpoints_used {
            return Err(Fault::EndpointCountMismatch {
                expected: self.endpoints_used,
                assigned: next,
            });
        }

        Ok(())
    }
}

impl Default for InterfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
