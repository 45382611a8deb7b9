//! The device controller: owns the interfaces, the descriptor tables and endpoint 0.

use log::{debug, error, info};

use crate::config::{UsbConfig, DEFAULT_CONFIG};
use crate::descriptors::DescriptorSet;
use crate::endpoint::{ControlEndpoint, ControlPipe, UsbEndpoint};
use crate::error::{Fault, Result, UsbError};
use crate::interface::UsbInterface;
use crate::platform::UsbPlatform;
use crate::registry::{InterfaceEntry, InterfaceRegistry};
use crate::usb::{ConfigAttributes, DeviceDescriptor, EndpDirection, StringDescriptor};

bitflags::bitflags! {
    /// The status word returned by GET_STATUS(device) (USB2 Figure 9-4).
    #[derive(Default)]
    #[repr(transparent)]
    pub struct DeviceStatus: u16 {
        const SELF_POWERED = 1 << 0;
        const REMOTE_WAKEUP = 1 << 1;
    }
}

pub struct UsbDevice<P: UsbPlatform> {
    pub(crate) platform: P,
    pub(crate) registry: InterfaceRegistry,
    pub(crate) descriptors: DescriptorSet,
    pub(crate) ctrl_in: ControlEndpoint,
    pub(crate) ctrl_out: UsbEndpoint,
    pub(crate) status: DeviceStatus,
    /// Value of the last SET_CONFIGURATION.
    pub(crate) configuration: u8,
    configured: bool,
    start_delay: u8,
}

impl<P: UsbPlatform> UsbDevice<P> {
    /// A device presenting the identity from the embedded `usb.toml`.
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, &DEFAULT_CONFIG)
    }

    pub fn with_config(platform: P, config: &UsbConfig) -> Self {
        let mut descriptors = DescriptorSet::new(
            config.device_descriptor(),
            config.config_attributes(),
            config.max_power,
        );
        descriptors.set_strings(config.strings.iter().cloned().map(Some));

        let mut status = DeviceStatus::empty();
        status.set(DeviceStatus::SELF_POWERED, config.self_powered);

        Self {
            platform,
            registry: InterfaceRegistry::new(),
            descriptors,
            ctrl_in: ControlEndpoint::new(),
            ctrl_out: UsbEndpoint::control(EndpDirection::Out),
            status,
            configuration: 0,
            configured: false,
            start_delay: config.start_delay,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Replaces the device descriptor reported to the host.
    pub fn set_device_descriptor(&mut self, device: DeviceDescriptor) {
        self.descriptors.set_device_descriptor(device);
    }

    /// Replaces the string table; entry `n` is served as string descriptor `n + 1`.
    pub fn set_strings<I>(&mut self, strings: I)
    where
        I: IntoIterator<Item = Option<String>>,
    {
        self.descriptors.set_strings(strings);
    }

    /// Number of `start` calls, including the one that configures the device.
    pub fn set_start_delay(&mut self, delay: u8) {
        self.start_delay = delay;
    }

    /// Registers a logical function and reassigns endpoint numbers.
    ///
    /// Returns the interface number. Only valid before [UsbDevice::start] configured the device.
    pub fn add_interface(&mut self, iface: Box<dyn UsbInterface>) -> Result<u8> {
        if self.configured {
            return Err(self.fatal(Fault::RegisteredAfterConfigure));
        }

        let budget = self.platform.endpoint_budget();
        let index = match self.registry.register(iface, budget) {
            Ok(index) => index,
            Err(UsbError::ConsistencyFault(fault)) => return Err(self.fatal(fault)),
            Err(err) => return Err(err),
        };

        if let Err(fault) = self.finalize_endpoints() {
            return Err(self.fatal(fault));
        }

        Ok(index)
    }

    /// Brings the device up.
    ///
    /// The first `start_delay - 1` calls do nothing so that other subsystems can finish booting
    /// first. Calls after the device is configured are no-ops.
    pub fn start(&mut self) -> Result<()> {
        if self.start_delay > 1 {
            self.start_delay -= 1;
            debug!("USB start delayed, {} call(s) to go", self.start_delay);
            return Ok(());
        }

        if self.platform.endpoint_budget() == 0 {
            return Err(UsbError::NotSupported);
        }

        if self.configured {
            return Ok(());
        }

        if let Err(fault) = self.finalize_endpoints() {
            return Err(self.fatal(fault));
        }

        let count = self.registry.endpoints_used();
        self.platform.configure_endpoints(count)?;
        self.configured = true;

        info!(
            "USB started: {} interface(s), {} endpoint(s)",
            self.registry.len(),
            count
        );

        Ok(())
    }

    /// Lets every interface service its endpoints, in registration order.
    pub fn on_bus_interrupt(&mut self) {
        for entry in self.registry.iter_mut() {
            let (iface, endpoints) = entry.split_mut();
            iface.handle_endpoint_interrupt(endpoints);
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Whether the host selected a configuration with SET_CONFIGURATION.
    pub fn is_initialised(&self) -> bool {
        self.configuration > 0
    }

    pub fn configuration_value(&self) -> u8 {
        self.configuration
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn remote_wakeup_enabled(&self) -> bool {
        self.status.contains(DeviceStatus::REMOTE_WAKEUP)
    }

    pub fn config_attributes(&self) -> ConfigAttributes {
        self.descriptors.config_attributes()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceEntry> {
        self.registry.iter()
    }

    pub fn interface(&self, index: u8) -> Option<&InterfaceEntry> {
        self.registry.get(index)
    }

    /// Endpoint numbers in use, endpoint 0 included.
    pub fn endpoints_used(&self) -> u8 {
        self.registry.endpoints_used()
    }

    /// The IN and OUT halves of endpoint 0.
    pub fn control_endpoints(&self) -> (&UsbEndpoint, &UsbEndpoint) {
        (self.ctrl_in.endpoint(), &self.ctrl_out)
    }

    pub fn device_descriptor(&self) -> &DeviceDescriptor {
        self.descriptors.device_descriptor()
    }

    pub fn string_descriptor(&mut self, index: u8) -> Result<StringDescriptor> {
        match self.descriptors.string_descriptor(index) {
            Err(UsbError::ConsistencyFault(fault)) => Err(self.fatal(fault)),
            other => other,
        }
    }

    pub fn build_configuration_descriptor(&mut self) -> Result<Vec<u8>> {
        let max_packet_size = self.platform.max_packet_size();
        self.descriptors
            .build_configuration_descriptor(&self.registry, max_packet_size)
            .map_err(|fault| self.fatal(fault))
    }

    pub(crate) fn pipe(&mut self) -> ControlPipe<'_> {
        ControlPipe::new(&mut self.ctrl_in, &mut self.platform)
    }

    /// Endpoint objects, control endpoints included, are rebuilt from scratch.
    fn finalize_endpoints(&mut self) -> core::result::Result<(), Fault> {
        self.ctrl_in = ControlEndpoint::new();
        self.ctrl_out = UsbEndpoint::control(EndpDirection::Out);
        self.registry.finalize_endpoints()
    }

    /// Escalates `fault` to the platform and hands back the error for the caller to return.
    pub(crate) fn fatal(&mut self, fault: Fault) -> UsbError {
        let err = UsbError::ConsistencyFault(fault);
        error!("USB assertion failed: {}", err);
        self.platform.raise_fatal_fault(&err);
        err
    }
}
