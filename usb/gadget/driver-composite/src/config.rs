//! Boot-time identity of the device.
//!
//! Firmware images either embed their own TOML file and parse it with [UsbConfig::from_toml], or
//! fall back to [DEFAULT_CONFIG], parsed from the `usb.toml` shipped with this crate.

use lazy_static::lazy_static;
use serde::Deserialize;
use thiserror::Error;

use crate::usb::{ConfigAttributes, DeviceDescriptor, STRING_DESC_MAX_CHARS};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UsbConfig {
    pub vendor: u16,
    pub product: u16,
    pub release: u16,
    #[serde(default)]
    pub class: u8,
    #[serde(default)]
    pub sub_class: u8,
    #[serde(default)]
    pub protocol: u8,
    /// bMaxPacketSize0
    #[serde(default = "default_packet_size")]
    pub packet_size: u8,
    /// Bus current in 2mA units.
    #[serde(default = "default_max_power")]
    pub max_power: u8,
    #[serde(default)]
    pub self_powered: bool,
    /// Advertise remote wakeup support in the configuration descriptor.
    #[serde(default)]
    pub remote_wakeup: bool,
    /// Number of `start` calls needed before the device is configured.
    #[serde(default = "default_start_delay")]
    pub start_delay: u8,
    /// Manufacturer, product and serial number, at string indices 1, 2 and 3.
    #[serde(default)]
    pub strings: Vec<String>,
}

fn default_packet_size() -> u8 {
    64
}

fn default_max_power() -> u8 {
    250
}

fn default_start_delay() -> u8 {
    1
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid control endpoint packet size {0}")]
    PacketSize(u8),

    #[error("{0} strings do not fit in the string index space")]
    TooManyStrings(usize),

    #[error("string {index} is longer than {max} characters")]
    StringTooLong { index: usize, max: usize },
}

impl UsbConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.packet_size, 8 | 16 | 32 | 64) {
            return Err(ConfigError::PacketSize(self.packet_size));
        }
        if self.strings.len() >= u8::MAX as usize {
            return Err(ConfigError::TooManyStrings(self.strings.len()));
        }
        if let Some(index) = self
            .strings
            .iter()
            .position(|s| s.encode_utf16().count() > STRING_DESC_MAX_CHARS)
        {
            return Err(ConfigError::StringTooLong {
                index: index + 1,
                max: STRING_DESC_MAX_CHARS,
            });
        }
        Ok(())
    }

    pub fn device_descriptor(&self) -> DeviceDescriptor {
        let string_index = |n: u8| if self.strings.len() >= n as usize { n } else { 0 };

        DeviceDescriptor {
            class: self.class,
            sub_class: self.sub_class,
            protocol: self.protocol,
            packet_size: self.packet_size,
            manufacturer_str: string_index(1),
            product_str: string_index(2),
            serial_str: string_index(3),
            ..DeviceDescriptor::new(self.vendor, self.product, self.release)
        }
    }

    pub fn config_attributes(&self) -> ConfigAttributes {
        let mut attributes = ConfigAttributes::BUS_POWERED;
        attributes.set(ConfigAttributes::SELF_POWERED, self.self_powered);
        attributes.set(ConfigAttributes::REMOTE_WAKEUP, self.remote_wakeup);
        attributes
    }
}

lazy_static! {
    pub static ref DEFAULT_CONFIG: UsbConfig = {
        const TOML: &'static [u8] = include_bytes!("../usb.toml");

        toml::from_slice::<UsbConfig>(TOML).expect("Failed to parse internally embedded config file")
    };
}
