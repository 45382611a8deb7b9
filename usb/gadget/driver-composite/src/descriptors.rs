//! Descriptor tables of the device, and synthesis of the composite configuration descriptor.

use log::trace;
use smallvec::SmallVec;

use crate::error::{Fault, Result, UsbError};
use crate::registry::InterfaceRegistry;
use crate::usb::{
    ConfigAttributes, ConfigDescriptor, DeviceDescriptor, EndpointDescriptor,
    InterfaceDescriptor, StringDescriptor,
};

pub struct DescriptorSet {
    device: DeviceDescriptor,
    config: ConfigDescriptor,
    /// String descriptor `n` lives at `strings[n - 1]`; index 0 is the language table.
    strings: SmallVec<[Option<String>; 4]>,
}

impl DescriptorSet {
    pub fn new(device: DeviceDescriptor, attributes: ConfigAttributes, max_power: u8) -> Self {
        Self {
            device,
            config: ConfigDescriptor::new(attributes, max_power),
            strings: SmallVec::new(),
        }
    }

    pub fn device_descriptor(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub fn set_device_descriptor(&mut self, device: DeviceDescriptor) {
        self.device = device;
    }

    pub fn config_attributes(&self) -> ConfigAttributes {
        self.config.attributes()
    }

    pub fn set_strings<I>(&mut self, strings: I)
    where
        I: IntoIterator<Item = Option<String>>,
    {
        self.strings = strings.into_iter().collect();
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// String descriptor `index`, transcoded to UTF-16LE.
    pub fn string_descriptor(&self, index: u8) -> Result<StringDescriptor> {
        if index as usize > self.strings.len() {
            return Err(UsbError::NotSupported);
        }
        if index == 0 {
            return Ok(StringDescriptor::language_table());
        }

        let s = self.strings[index as usize - 1]
            .as_deref()
            .ok_or(UsbError::NotSupported)?;
        StringDescriptor::encode(s)
            .map_err(|units| Fault::StringTooLong { index, units }.into())
    }

    /// wTotalLength of the configuration descriptor for the current registry.
    pub fn configuration_length(registry: &InterfaceRegistry) -> usize {
        ConfigDescriptor::SIZE
            + registry
                .iter()
                .map(|entry| {
                    let info = entry.interface().info();
                    InterfaceDescriptor::SIZE
                        + info.endpoints as usize * EndpointDescriptor::SIZE
                        + entry.interface().supplemental_descriptor().len()
                })
                .sum::<usize>()
    }

    /// Serializes the configuration descriptor together with every interface, class specific
    /// and endpoint descriptor, in registration order.
    pub fn build_configuration_descriptor(
        &self,
        registry: &InterfaceRegistry,
        max_packet_size: u16,
    ) -> core::result::Result<Vec<u8>, Fault> {
        let total = Self::configuration_length(registry);
        let total_length = u16::try_from(total).map_err(|_| Fault::DescriptorTooLong(total))?;

        let header = ConfigDescriptor {
            total_length,
            interfaces: registry.len() as u8,
            ..self.config
        };

        let mut buf = Vec::with_capacity(total);
        buf.extend_from_slice(header.as_bytes());

        for entry in registry.iter() {
            let iface = entry.interface();
            let info = iface.info();

            buf.extend_from_slice(info.descriptor(entry.index()).as_bytes());
            buf.extend_from_slice(iface.supplemental_descriptor());

            let in_ep = entry.in_ep().ok_or(Fault::InvalidEndpointLayout {
                index: entry.index(),
                endpoints: info.endpoints,
                allocate: info.allocate_endpoints,
            })?;
            let desc = EndpointDescriptor::new(
                in_ep.address(),
                info.ep_in.attributes,
                max_packet_size,
                info.ep_in.interval,
            );
            buf.extend_from_slice(desc.as_bytes());

            match (info.endpoints, entry.out_ep()) {
                (1, _) => {}
                (2, Some(out_ep)) => {
                    let out = info.out_endpoint();
                    let desc = EndpointDescriptor::new(
                        out_ep.address(),
                        out.attributes,
                        max_packet_size,
                        out.interval,
                    );
                    buf.extend_from_slice(desc.as_bytes());
                }
                _ => {
                    return Err(Fault::InvalidEndpointLayout {
                        index: entry.index(),
                        endpoints: info.endpoints,
                        allocate: info.allocate_endpoints,
                    })
                }
            }
        }

        if buf.len() != total {
            return Err(Fault::DescriptorLengthMismatch {
                expected: total,
                written: buf.len(),
            });
        }

        trace!(
            "configuration descriptor: {} interfaces, {} bytes",
            registry.len(),
            total
        );

        Ok(buf)
    }
}
