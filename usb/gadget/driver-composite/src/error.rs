use thiserror::Error;

/// An internal invariant of the device core was violated.
///
/// These are programming errors in the firmware (or in an interface implementation), never
/// something the host can cause. They are escalated through
/// [UsbPlatform::raise_fatal_fault](crate::UsbPlatform::raise_fatal_fault).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("interface registered after the device was configured")]
    RegisteredAfterConfigure,

    #[error("interface {index} declares {endpoints} endpoints and allocates {allocate}")]
    InvalidEndpointLayout { index: u8, endpoints: u8, allocate: u8 },

    #[error("assigned {assigned} endpoint numbers, registration accounted for {expected}")]
    EndpointCountMismatch { expected: u8, assigned: u8 },

    #[error("configuration descriptor is {written} bytes, header claims {expected}")]
    DescriptorLengthMismatch { expected: usize, written: usize },

    #[error("configuration descriptor of {0} bytes does not fit wTotalLength")]
    DescriptorTooLong(usize),

    #[error("string {index} needs {units} UTF-16 code units")]
    StringTooLong { index: u8, units: usize },

    #[error("{0} response bytes left outstanding on the control endpoint")]
    ResidualResponse(u16),
}

/// A hardware operation requested from the platform did not complete.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("control endpoint transmit failed")]
    Transmit,

    #[error("could not configure {0} endpoints")]
    Configure(u8),

    #[error("platform error {0}")]
    Other(i32),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UsbError {
    #[error("endpoint budget exhausted: {requested} requested, {available} available")]
    NoResources { requested: u8, available: u8 },

    #[error("request not supported")]
    NotSupported,

    #[error("consistency fault: {0}")]
    ConsistencyFault(#[from] Fault),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl UsbError {
    /// Whether this error is a programming fault rather than a protocol level condition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UsbError::ConsistencyFault(_))
    }
}

pub type Result<T, E = UsbError> = core::result::Result<T, E>;
