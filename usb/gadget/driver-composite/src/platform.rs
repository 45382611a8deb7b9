use crate::error::{PlatformError, UsbError};

/// The hardware side of the device core.
///
/// Implemented once per USB device controller. The core never touches registers itself; every
/// transmission, address change and endpoint setup goes through this trait.
pub trait UsbPlatform {
    /// Number of hardware endpoint numbers, endpoint 0 included. Zero means the part has no
    /// usable USB device controller.
    fn endpoint_budget(&self) -> u8;

    /// wMaxPacketSize reported for every non-control endpoint.
    fn max_packet_size(&self) -> u16;

    /// Queues `buf` on the IN side of endpoint 0. An empty buffer sends a zero-length packet.
    fn transmit_control(&mut self, buf: &[u8]) -> Result<(), PlatformError>;

    /// Answers the current control transfer with a STALL handshake.
    fn stall_control(&mut self);

    /// Latches a new device address. Only called after the status stage of SET_ADDRESS has been
    /// queued.
    fn set_address(&mut self, address: u8);

    /// Enables endpoints `0..count` in hardware.
    fn configure_endpoints(&mut self, count: u8) -> Result<(), PlatformError>;

    /// Clears the halt condition of the endpoint at `address` (direction bit included).
    fn clear_endpoint_halt(&mut self, address: u8) {
        let _ = address;
    }

    /// Escalates an internal consistency fault.
    ///
    /// On hardware this is expected to not return (panic, reset, or park the core). The caller
    /// still gets the error back from the operation that failed when it does return.
    fn raise_fatal_fault(&mut self, error: &UsbError);
}
