use crate::error::Result;
use crate::platform::UsbPlatform;
use crate::usb::{endpoint_address, EndpDirection, EndpointTy};

/// One hardware endpoint as the core tracks it.
///
/// Registry entries own their endpoints exclusively; all of them are dropped and recreated when
/// endpoint numbers are reassigned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsbEndpoint {
    number: u8,
    direction: EndpDirection,
    attributes: u8,
    interval: u8,
    halted: bool,
}

impl UsbEndpoint {
    pub fn new(number: u8, direction: EndpDirection, attributes: u8, interval: u8) -> Self {
        Self {
            number,
            direction,
            attributes,
            interval,
            halted: false,
        }
    }

    pub fn control(direction: EndpDirection) -> Self {
        Self::new(0, direction, EndpointTy::Ctrl as u8, 0)
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn direction(&self) -> EndpDirection {
        self.direction
    }

    /// bEndpointAddress, with the direction bit set for IN endpoints.
    pub fn address(&self) -> u8 {
        endpoint_address(self.number, self.direction)
    }

    pub fn attributes(&self) -> u8 {
        self.attributes
    }

    pub fn interval(&self) -> u8 {
        self.interval
    }

    pub fn ty(&self) -> EndpointTy {
        EndpointTy::from_attributes(self.attributes)
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn stall(&mut self) {
        self.halted = true;
    }

    pub fn clear_stall(&mut self) {
        self.halted = false;
    }
}

/// The IN half of endpoint 0, with the number of bytes the host still expects in the data stage
/// of the current control transfer.
#[derive(Debug)]
pub struct ControlEndpoint {
    ep: UsbEndpoint,
    pending: u16,
}

impl ControlEndpoint {
    pub fn new() -> Self {
        Self {
            ep: UsbEndpoint::control(EndpDirection::In),
            pending: 0,
        }
    }

    pub fn endpoint(&self) -> &UsbEndpoint {
        &self.ep
    }

    /// Bytes of the current request that have not been answered yet.
    pub fn pending(&self) -> u16 {
        self.pending
    }

    pub(crate) fn begin(&mut self, length: u16) {
        self.ep.clear_stall();
        self.pending = length;
    }

    pub(crate) fn clear_stall(&mut self) {
        self.ep.clear_stall();
    }
}

impl Default for ControlEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle through which a request handler answers the current control transfer.
///
/// Every answer, data or zero-length, consumes the outstanding response length. Responses longer
/// than wLength are cut to what the host asked for.
pub struct ControlPipe<'a> {
    ep: &'a mut ControlEndpoint,
    platform: &'a mut dyn UsbPlatform,
}

impl<'a> ControlPipe<'a> {
    pub(crate) fn new(ep: &'a mut ControlEndpoint, platform: &'a mut dyn UsbPlatform) -> Self {
        Self { ep, platform }
    }

    /// wLength of the request being answered, minus what was already sent.
    pub fn requested_len(&self) -> u16 {
        self.ep.pending
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        let len = buf.len().min(self.ep.pending as usize);
        self.ep.pending = 0;
        self.platform.transmit_control(&buf[..len])?;
        Ok(())
    }

    /// Acknowledges a request without data.
    pub fn zlp(&mut self) -> Result<()> {
        self.write(&[])
    }

    pub fn stall(&mut self) {
        self.ep.pending = 0;
        self.ep.ep.stall();
        self.platform.stall_control();
    }

    pub fn is_stalled(&self) -> bool {
        self.ep.ep.is_halted()
    }
}
