use std::cell::RefCell;
use std::rc::Rc;

use driver_composite::usb::{
    DescriptorKind, ReqRecipient, Setup, SetupReq, FEATURE_DEVICE_REMOTE_WAKEUP,
    FEATURE_ENDPOINT_HALT,
};
use driver_composite::{
    ControlOutcome, ControlPipe, EndpointInfo, Fault, InterfaceEndpoints, InterfaceInfo,
    PlatformError, UsbConfig, UsbDevice, UsbError, UsbInterface, UsbPlatform,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Event {
    Transmit(Vec<u8>),
    Stall,
    Address(u8),
    Configure(u8),
    ClearHalt(u8),
    Fault(UsbError),
}

struct MockPlatform {
    budget: u8,
    events: Vec<Event>,
}

impl MockPlatform {
    fn new(budget: u8) -> Self {
        Self {
            budget,
            events: Vec::new(),
        }
    }
}

impl UsbPlatform for MockPlatform {
    fn endpoint_budget(&self) -> u8 {
        self.budget
    }

    fn max_packet_size(&self) -> u16 {
        64
    }

    fn transmit_control(&mut self, buf: &[u8]) -> Result<(), PlatformError> {
        self.events.push(Event::Transmit(buf.to_vec()));
        Ok(())
    }

    fn stall_control(&mut self) {
        self.events.push(Event::Stall);
    }

    fn set_address(&mut self, address: u8) {
        self.events.push(Event::Address(address));
    }

    fn configure_endpoints(&mut self, count: u8) -> Result<(), PlatformError> {
        self.events.push(Event::Configure(count));
        Ok(())
    }

    fn clear_endpoint_halt(&mut self, address: u8) {
        self.events.push(Event::ClearHalt(address));
    }

    fn raise_fatal_fault(&mut self, error: &UsbError) {
        self.events.push(Event::Fault(error.clone()));
    }
}

const INT_IN: EndpointInfo = EndpointInfo {
    attributes: 0x03,
    interval: 1,
};
const BULK: EndpointInfo = EndpointInfo {
    attributes: 0x02,
    interval: 0,
};

// Usage Page (Generic Desktop), Usage (Keyboard)
const REPORT: [u8; 4] = [0x05, 0x01, 0x09, 0x06];

/// A logical function that records what the core asked of it.
struct Function {
    name: &'static str,
    info: InterfaceInfo,
    log: Rc<RefCell<Vec<String>>>,
}

impl UsbInterface for Function {
    fn info(&self) -> InterfaceInfo {
        self.info
    }

    fn handle_standard_request(
        &mut self,
        ctrl: &mut ControlPipe<'_>,
        setup: &Setup,
    ) -> driver_composite::Result<()> {
        self.log
            .borrow_mut()
            .push(format!("{} std {:02x}", self.name, setup.request));
        if setup.request == SetupReq::GetDescriptor as u8
            && setup.value_high() == DescriptorKind::HidReport as u8
        {
            ctrl.write(&REPORT)
        } else {
            Err(UsbError::NotSupported)
        }
    }

    fn handle_class_request(
        &mut self,
        ctrl: &mut ControlPipe<'_>,
        setup: &Setup,
    ) -> driver_composite::Result<()> {
        self.log
            .borrow_mut()
            .push(format!("{} class {:02x}", self.name, setup.request));
        // GET_LINE_CODING
        if setup.request == 0x21 {
            ctrl.write(&[0x00, 0xC2, 0x01, 0x00, 0x00, 0x00, 0x08])
        } else {
            Err(UsbError::NotSupported)
        }
    }

    fn handle_endpoint_interrupt(&mut self, endpoints: &mut InterfaceEndpoints) {
        let numbers: Vec<String> = endpoints.iter().map(|ep| ep.address().to_string()).collect();
        self.log
            .borrow_mut()
            .push(format!("{} irq {}", self.name, numbers.join(",")));
    }
}

struct Fixture {
    device: UsbDevice<MockPlatform>,
    log: Rc<RefCell<Vec<String>>>,
}

impl Fixture {
    fn new(budget: u8) -> Self {
        Self {
            device: UsbDevice::new(MockPlatform::new(budget)),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Interface A (one IN endpoint) and interface B (IN and OUT, two endpoint numbers).
    fn with_a_and_b(budget: u8) -> Self {
        let mut fixture = Self::new(budget);
        assert_eq!(fixture.add("A", InterfaceInfo::new(0x02, 0x02, 0x01, INT_IN)), Ok(0));
        assert_eq!(
            fixture.add("B", InterfaceInfo::new(0x03, 0, 0, BULK).with_out(BULK, 2)),
            Ok(1)
        );
        fixture
    }

    fn add(&mut self, name: &'static str, info: InterfaceInfo) -> driver_composite::Result<u8> {
        self.device.add_interface(Box::new(Function {
            name,
            info,
            log: self.log.clone(),
        }))
    }

    fn events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.device.platform_mut().events)
    }

    fn log(&self) -> Vec<String> {
        self.log.borrow_mut().drain(..).collect()
    }
}

#[test]
fn composite_enumeration() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    assert!(fixture.device.is_configured());
    assert_eq!(fixture.events(), vec![Event::Configure(4)]);

    let a = fixture.device.interface(0).unwrap();
    assert_eq!(a.in_ep().unwrap().address(), 0x81);
    assert!(a.out_ep().is_none());
    let b = fixture.device.interface(1).unwrap();
    assert_eq!(b.in_ep().unwrap().address(), 0x82);
    assert_eq!(b.out_ep().unwrap().address(), 0x03);

    let desc = fixture.device.build_configuration_descriptor().unwrap();
    assert_eq!(desc.len(), 9 + 9 * 2 + 7 * 3);
    assert_eq!(&desc[..9], &[9, 2, 48, 0, 2, 1, 0, 0x80, 250]);
    assert_eq!(&desc[9..18], &[9, 4, 0, 0, 1, 0x02, 0x02, 0x01, 0]);
    assert_eq!(&desc[18..25], &[7, 5, 0x81, 0x03, 64, 0, 1]);
    assert_eq!(&desc[25..34], &[9, 4, 1, 0, 2, 0x03, 0, 0, 0]);
    assert_eq!(&desc[34..41], &[7, 5, 0x82, 0x02, 64, 0, 0]);
    assert_eq!(&desc[41..48], &[7, 5, 0x03, 0x02, 64, 0, 0]);

    // the host reads the header first, then the whole thing
    let header = Setup::get_descriptor(DescriptorKind::Configuration, 0, 0, 9);
    let full = Setup::get_descriptor(DescriptorKind::Configuration, 0, 0, 0xFF);
    fixture.device.handle_setup(&header).unwrap();
    fixture.device.handle_setup(&full).unwrap();
    assert_eq!(
        fixture.events(),
        vec![Event::Transmit(desc[..9].to_vec()), Event::Transmit(desc)]
    );
}

#[test]
fn set_address_then_configuration() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    fixture.events();

    fixture.device.handle_setup(&Setup::set_address(7)).unwrap();
    assert_eq!(
        fixture.events(),
        vec![Event::Transmit(vec![]), Event::Address(7)]
    );

    assert!(!fixture.device.is_initialised());
    fixture
        .device
        .handle_setup(&Setup::set_configuration(1))
        .unwrap();
    assert!(fixture.device.is_initialised());
    assert_eq!(fixture.device.configuration_value(), 1);

    fixture
        .device
        .handle_setup(&Setup::get_configuration())
        .unwrap();
    assert_eq!(
        fixture.events(),
        vec![Event::Transmit(vec![]), Event::Transmit(vec![1])]
    );
}

#[test]
fn device_status_and_remote_wakeup() {
    let mut fixture = Fixture::new(8);
    let get_status = Setup::get_status(ReqRecipient::Device, 0);

    fixture.device.handle_setup(&get_status).unwrap();
    fixture
        .device
        .handle_setup(&Setup::set_feature(
            ReqRecipient::Device,
            FEATURE_DEVICE_REMOTE_WAKEUP,
            0,
        ))
        .unwrap();
    assert!(fixture.device.remote_wakeup_enabled());
    fixture.device.handle_setup(&get_status).unwrap();

    assert_eq!(
        fixture.events(),
        vec![
            Event::Transmit(vec![0x00, 0x00]),
            Event::Transmit(vec![]),
            Event::Transmit(vec![0x02, 0x00]),
        ]
    );
}

#[test]
fn strings() {
    let mut fixture = Fixture::new(8);

    let languages = Setup::get_descriptor(DescriptorKind::String, 0, 0, 0xFF);
    fixture.device.handle_setup(&languages).unwrap();

    let serial = Setup::get_descriptor(DescriptorKind::String, 3, 0x0409, 0xFF);
    fixture.device.handle_setup(&serial).unwrap();

    let missing = Setup::get_descriptor(DescriptorKind::String, 4, 0x0409, 0xFF);
    assert_eq!(
        fixture.device.handle_setup(&missing),
        Ok(ControlOutcome::Stalled)
    );

    assert_eq!(
        fixture.events(),
        vec![
            Event::Transmit(vec![4, 3, 0x09, 0x04]),
            Event::Transmit(vec![10, 3, b'4', 0, b'2', 0, b'4', 0, b'2', 0]),
            Event::Stall,
        ]
    );
}

#[test]
fn class_request_by_endpoint() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    fixture.events();

    // addressed to endpoint 0x03, the OUT endpoint of B
    let setup = Setup {
        kind: 0b1010_0010,
        request: 0x21,
        value: 0,
        index: 0x03,
        length: 7,
    };
    assert_eq!(
        fixture.device.handle_setup(&setup),
        Ok(ControlOutcome::Responded)
    );
    assert_eq!(
        fixture.events(),
        vec![Event::Transmit(vec![0x00, 0xC2, 0x01, 0x00, 0x00, 0x00, 0x08])]
    );
    assert_eq!(fixture.log(), vec!["B class 21"]);
}

#[test]
fn unhandled_class_request_stalls() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    fixture.events();

    // SET_CONTROL_LINE_STATE to interface 0
    let setup = Setup {
        kind: 0b0010_0001,
        request: 0x22,
        value: 3,
        index: 0,
        length: 0,
    };
    assert_eq!(
        fixture.device.handle_setup(&setup),
        Ok(ControlOutcome::Stalled)
    );
    assert_eq!(fixture.events(), vec![Event::Stall]);
    assert_eq!(fixture.log(), vec!["A class 22"]);
}

#[test]
fn unknown_standard_request_stalls() {
    let mut fixture = Fixture::with_a_and_b(8);
    let setup = Setup {
        kind: 0b1000_0000,
        request: 0x33,
        value: 0,
        index: 0,
        length: 16,
    };
    assert_eq!(
        fixture.device.handle_setup(&setup),
        Ok(ControlOutcome::Stalled)
    );
    assert_eq!(fixture.events(), vec![Event::Stall]);
    assert!(fixture.log().is_empty());
}

#[test]
fn start_is_delayed() {
    let config = UsbConfig {
        start_delay: 3,
        ..UsbConfig::clone(&driver_composite::DEFAULT_CONFIG)
    };
    let mut device = UsbDevice::with_config(MockPlatform::new(8), &config);

    device.start().unwrap();
    device.start().unwrap();
    assert!(!device.is_configured());
    assert!(device.platform().events.is_empty());

    device.start().unwrap();
    assert!(device.is_configured());
    device.start().unwrap();
    assert_eq!(device.platform().events, vec![Event::Configure(1)]);
}

#[test]
fn no_controller() {
    let mut fixture = Fixture::new(0);
    assert_eq!(fixture.device.start(), Err(UsbError::NotSupported));
    assert!(!fixture.device.is_configured());
    assert!(fixture.events().is_empty());
}

#[test]
fn budget_exhausted() {
    let mut fixture = Fixture::with_a_and_b(4);
    assert_eq!(
        fixture.add("C", InterfaceInfo::new(0x08, 0x06, 0x50, BULK).with_out(BULK, 2)),
        Err(UsbError::NoResources {
            requested: 2,
            available: 0
        })
    );
    assert_eq!(fixture.device.interfaces().count(), 2);
    assert_eq!(fixture.device.endpoints_used(), 4);
    assert!(fixture.events().is_empty());
}

#[test]
fn registration_after_start_is_a_fault() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    fixture.events();

    let err = UsbError::ConsistencyFault(Fault::RegisteredAfterConfigure);
    assert_eq!(
        fixture.add("C", InterfaceInfo::new(0x03, 0, 0, INT_IN)),
        Err(err.clone())
    );
    assert_eq!(fixture.events(), vec![Event::Fault(err)]);
    assert_eq!(fixture.device.interfaces().count(), 2);
}

#[test]
fn interrupts_reach_every_interface() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();

    fixture.device.on_bus_interrupt();
    assert_eq!(fixture.log(), vec!["A irq 129", "B irq 130,3"]);
}

#[test]
fn clear_halt_on_shared_endpoint_number() {
    let mut fixture = Fixture::new(8);
    fixture
        .add("V", InterfaceInfo::new(0xff, 0, 0, BULK).with_out(BULK, 1))
        .unwrap();
    fixture.device.start().unwrap();
    fixture.events();

    fixture
        .device
        .handle_setup(&Setup::clear_feature(
            ReqRecipient::Endpoint,
            FEATURE_ENDPOINT_HALT,
            0x01,
        ))
        .unwrap();
    assert_eq!(
        fixture.events(),
        vec![
            Event::ClearHalt(0x81),
            Event::ClearHalt(0x01),
            Event::Transmit(vec![]),
        ]
    );
}

#[test]
fn set_configuration_to_interface_stalls() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    fixture.events();

    let setup = Setup {
        kind: 0b0000_0001,
        request: SetupReq::SetConfiguration as u8,
        value: 1,
        index: 0,
        length: 0,
    };
    assert_eq!(
        fixture.device.handle_setup(&setup),
        Ok(ControlOutcome::Stalled)
    );
    assert_eq!(fixture.events(), vec![Event::Stall]);
    assert!(!fixture.device.is_initialised());
    assert!(fixture.log().is_empty());
}

#[test]
fn report_descriptor_from_interface() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    fixture.events();

    // GET_DESCRIPTOR(HID report) to interface 1
    let setup = Setup {
        kind: 0b1000_0001,
        request: SetupReq::GetDescriptor as u8,
        value: (DescriptorKind::HidReport as u16) << 8,
        index: 1,
        length: 0x40,
    };
    assert_eq!(
        fixture.device.handle_setup(&setup),
        Ok(ControlOutcome::Responded)
    );
    assert_eq!(fixture.events(), vec![Event::Transmit(REPORT.to_vec())]);
    assert_eq!(fixture.log(), vec!["B std 06"]);
}

#[test]
fn device_qualifier_stalls() {
    let mut fixture = Fixture::with_a_and_b(8);
    fixture.device.start().unwrap();
    fixture.events();

    let setup = Setup::get_descriptor(DescriptorKind::DeviceQualifier, 0, 0, 10);
    assert_eq!(
        fixture.device.handle_setup(&setup),
        Ok(ControlOutcome::Stalled)
    );
    assert_eq!(fixture.events(), vec![Event::Stall]);
    assert!(fixture.log().is_empty());
}
