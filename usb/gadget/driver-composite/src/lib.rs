//! USB 2.0 Composite Device Core
//!
//! This crate implements the device side of a USB 2.0 composite device for firmware running on a
//! microcontroller. Several logical functions (a serial port, a HID keyboard, a mass storage
//! device and so on) are presented to the host behind a single address, each one as its own
//! interface of the one configuration the device offers.
//!
//! The core owns endpoint 0. It answers the standard requests of enumeration (USB2 9.4),
//! synthesizes the configuration descriptor from whatever interfaces were registered, hands out
//! endpoint numbers, and routes class and vendor requests to the interface they address.
//! Interfaces implement [UsbInterface]; the device controller hardware is reached through
//! [UsbPlatform].
//!
//! A typical bring-up registers the interfaces, then calls [UsbDevice::start] and forwards every
//! USB interrupt to [UsbDevice::on_bus_interrupt] and every SETUP packet to
//! [UsbDevice::handle_setup_packet].
//!
//! This documentation will refer directly to the relevant standards, which are as follows:
//!
//! - USB2  - [Universal Serial Bus Specification](https://www.usb.org/document-library/usb-20-specification)
//!
pub extern crate plain;

mod config;
mod control;
mod descriptors;
mod device;
mod endpoint;
mod error;
mod interface;
mod platform;
mod registry;
pub mod usb;

pub use config::{ConfigError, UsbConfig, DEFAULT_CONFIG};
pub use control::ControlOutcome;
pub use descriptors::DescriptorSet;
pub use device::{DeviceStatus, UsbDevice};
pub use endpoint::{ControlEndpoint, ControlPipe, UsbEndpoint};
pub use error::{Fault, PlatformError, Result, UsbError};
pub use interface::{EndpointInfo, InterfaceEndpoints, InterfaceInfo, UsbInterface};
pub use platform::UsbPlatform;
pub use registry::{InterfaceEntry, InterfaceRegistry, MAX_ENDPOINTS};
