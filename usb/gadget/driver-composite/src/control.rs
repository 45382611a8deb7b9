//! Control transfer handling on endpoint 0.
//!
//! Standard requests are answered here (USB2 9.4); class and vendor requests, and standard
//! requests the core has no business answering, go to the interface that owns the recipient.
//! Whatever cannot be answered is stalled.

use log::{debug, trace, warn};

use crate::device::{DeviceStatus, UsbDevice};
use crate::endpoint::ControlPipe;
use crate::error::{Fault, Result, UsbError};
use crate::platform::UsbPlatform;
use crate::usb::{
    DescriptorKind, ReqDirection, ReqRecipient, Setup, SetupReq, ENDP_ADDR_NUM_MASK,
    FEATURE_DEVICE_REMOTE_WAKEUP,
};

/// How a control transfer ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlOutcome {
    Responded,
    Stalled,
}

impl<P: UsbPlatform> UsbDevice<P> {
    /// Handles a raw SETUP packet as read from endpoint 0.
    pub fn handle_setup_packet(&mut self, raw: &[u8]) -> Result<ControlOutcome> {
        match Setup::from_bytes(raw) {
            Some(setup) => self.handle_setup(&setup),
            None => {
                warn!("short SETUP packet of {} bytes", raw.len());
                self.pipe().stall();
                Ok(ControlOutcome::Stalled)
            }
        }
    }

    /// Runs one control transfer.
    ///
    /// Protocol errors end in a stall and `Ok(ControlOutcome::Stalled)`. Only consistency faults,
    /// already escalated to the platform, are returned as errors.
    pub fn handle_setup(&mut self, setup: &Setup) -> Result<ControlOutcome> {
        let Setup {
            kind,
            request,
            value,
            index,
            length,
        } = *setup;
        debug!(
            "SETUP req={:02x} type={:02x} val={:04x} idx={:04x} len={}",
            request, kind, value, index, length
        );

        self.ctrl_in.begin(length);

        let result = if setup.is_standard() {
            self.standard_request(setup)
        } else {
            self.interface_request(setup, true)
        };

        let mut fault = None;
        let outcome = match result {
            Ok(()) => ControlOutcome::Responded,
            Err(err) => {
                match err {
                    UsbError::ConsistencyFault(f) => fault = Some(f),
                    err => warn!("stalling request {:02x}: {}", request, err),
                }
                self.pipe().stall();
                ControlOutcome::Stalled
            }
        };

        // every answer, stall included, consumes the response length
        let residual = self.ctrl_in.pending();
        if fault.is_none() && residual != 0 {
            fault = Some(Fault::ResidualResponse(residual));
        }

        match fault {
            Some(fault) => Err(self.fatal(fault)),
            None => Ok(outcome),
        }
    }

    fn standard_request(&mut self, setup: &Setup) -> Result<()> {
        let req = match SetupReq::try_from(setup.request) {
            Ok(req) => req,
            Err(_) => return self.forward_standard(setup),
        };

        match req {
            SetupReq::GetStatus => {
                let status = if setup.direction() == ReqDirection::DeviceToHost
                    && setup.recipient_is(ReqRecipient::Device)
                {
                    self.status.bits()
                } else {
                    0
                };
                self.pipe().write(&status.to_le_bytes())
            }
            SetupReq::ClearFeature => {
                if setup.direction() == ReqDirection::HostToDevice {
                    if setup.recipient_is(ReqRecipient::Device)
                        && setup.value == FEATURE_DEVICE_REMOTE_WAKEUP
                    {
                        self.status.remove(DeviceStatus::REMOTE_WAKEUP);
                    }
                    if setup.recipient_is(ReqRecipient::Endpoint) {
                        self.clear_halt(setup.index as u8 & ENDP_ADDR_NUM_MASK);
                    }
                }
                self.pipe().zlp()
            }
            SetupReq::SetFeature => {
                if setup.direction() == ReqDirection::HostToDevice
                    && setup.recipient_is(ReqRecipient::Device)
                    && setup.value == FEATURE_DEVICE_REMOTE_WAKEUP
                {
                    self.status.insert(DeviceStatus::REMOTE_WAKEUP);
                }
                self.pipe().zlp()
            }
            SetupReq::SetAddress => {
                // the status stage goes out at the old address
                self.pipe().zlp()?;
                self.platform.set_address(setup.value_low() & 0x7F);
                Ok(())
            }
            SetupReq::GetDescriptor => self.get_descriptor(setup),
            SetupReq::SetDescriptor => Err(UsbError::NotSupported),
            SetupReq::GetConfiguration => self.pipe().write(&[1]),
            SetupReq::SetConfiguration => {
                if setup.recipient_is(ReqRecipient::Device) {
                    self.configuration = setup.value_low();
                    self.pipe().zlp()
                } else {
                    Err(UsbError::NotSupported)
                }
            }
            SetupReq::GetInterface | SetupReq::SetInterface | SetupReq::SynchFrame => {
                self.forward_standard(setup)
            }
        }
    }

    /// Standard requests the core does not answer belong to an interface, if they are addressed
    /// to one.
    fn forward_standard(&mut self, setup: &Setup) -> Result<()> {
        if setup.recipient_is(ReqRecipient::Interface) || setup.recipient_is(ReqRecipient::Endpoint)
        {
            self.interface_request(setup, false)
        } else {
            Err(UsbError::NotSupported)
        }
    }

    fn get_descriptor(&mut self, setup: &Setup) -> Result<()> {
        match DescriptorKind::from_u8(setup.value_high()) {
            Some(DescriptorKind::Configuration) => {
                // faults are escalated once, by handle_setup
                let buf = self
                    .descriptors
                    .build_configuration_descriptor(&self.registry, self.platform.max_packet_size())?;
                self.pipe().write(&buf)
            }
            Some(DescriptorKind::Device) => {
                let desc = *self.descriptors.device_descriptor();
                self.pipe().write(desc.as_bytes())
            }
            Some(DescriptorKind::String) => {
                let desc = self.descriptors.string_descriptor(setup.value_low())?;
                self.pipe().write(desc.as_bytes())
            }
            _ => self.interface_request(setup, false),
        }
    }

    fn clear_halt(&mut self, number: u8) {
        if number == 0 {
            self.ctrl_in.clear_stall();
            self.ctrl_out.clear_stall();
            return;
        }

        for entry in self.registry.iter_mut() {
            for ep in entry.endpoints_mut().iter_mut() {
                if ep.number() == number {
                    ep.clear_stall();
                    self.platform.clear_endpoint_halt(ep.address());
                }
            }
        }
    }

    /// Offers the request to every interface owning its recipient, in registration order, until
    /// one of them handles it.
    fn interface_request(&mut self, setup: &Setup, class: bool) -> Result<()> {
        let (iface_idx, ep_idx) = if setup.recipient_is(ReqRecipient::Interface) {
            (Some((setup.index & 0xFF) as u8), None)
        } else if setup.recipient_is(ReqRecipient::Endpoint) {
            (None, Some(setup.index as u8 & ENDP_ADDR_NUM_MASK))
        } else {
            (None, None)
        };

        trace!("iface req: iface={:?} ep={:?}", iface_idx, ep_idx);

        let mut pipe = ControlPipe::new(&mut self.ctrl_in, &mut self.platform);
        for entry in self.registry.iter_mut() {
            let owns = Some(entry.index()) == iface_idx
                || ep_idx.map_or(false, |ep| entry.endpoints().owns(ep));
            if !owns {
                continue;
            }

            let res = if class {
                entry.interface_mut().handle_class_request(&mut pipe, setup)
            } else {
                entry.interface_mut().handle_standard_request(&mut pipe, setup)
            };
            trace!("iface {} req res={:?}", entry.index(), res);

            match res {
                Ok(()) => return Ok(()),
                Err(err) if err.is_fatal() => return Err(err),
                Err(_) => {}
            }
        }

        Err(UsbError::NotSupported)
    }
}
