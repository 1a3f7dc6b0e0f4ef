use crate::error::Error;
use crate::transport::Transport;
use crate::usb_midi::{SysExAssembler, packetize};
use bytes::Bytes;
use nusb::{DeviceInfo, Interface, transfer::RequestBuffer};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Product string the Gemini enumerates with
pub const PRODUCT_NAME: &str = "Gemini";

/// MIDIStreaming interface (interface 0 is AudioControl)
pub const DEFAULT_INTERFACE: u8 = 1;
pub const ENDPOINT_OUT: u8 = 0x01;
pub const ENDPOINT_IN: u8 = 0x81;

// bulk-IN request size
const READ_BUFFER_SIZE: usize = 512;

/// Where to find the device and which endpoints carry MIDI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Substring the USB product string must contain
    pub product: String,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub interface: u8,
    pub endpoint_out: u8,
    pub endpoint_in: u8,
    /// USB-MIDI virtual cable number (0..=15)
    pub cable: u8,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            product: PRODUCT_NAME.to_string(),
            vendor_id: None,
            product_id: None,
            interface: DEFAULT_INTERFACE,
            endpoint_out: ENDPOINT_OUT,
            endpoint_in: ENDPOINT_IN,
            cable: 0,
        }
    }
}

impl DeviceConfig {
    pub fn matches(&self, info: &DeviceInfo) -> bool {
        if self.vendor_id.is_some_and(|vid| vid != info.vendor_id()) {
            return false;
        }
        if self.product_id.is_some_and(|pid| pid != info.product_id()) {
            return false;
        }
        info.product_string()
            .is_some_and(|name| name.contains(self.product.as_str()))
    }

    fn check(&self) -> Result<(), Error> {
        if self.cable > 0x0F {
            return Err(Error::InvalidValue(format!("cable {} outside 0..=15", self.cable)));
        }
        if self.endpoint_in & 0x80 == 0 {
            return Err(Error::InvalidValue(format!(
                "IN endpoint {:#04x} lacks the direction bit",
                self.endpoint_in
            )));
        }
        if self.endpoint_out & 0x80 != 0 {
            return Err(Error::InvalidValue(format!(
                "OUT endpoint {:#04x} has the direction bit set",
                self.endpoint_out
            )));
        }
        Ok(())
    }
}

/// SysEx transport over the device's USB-MIDI bulk endpoints.
///
/// The claimed interface is released when the transport is dropped.
pub struct UsbMidiTransport {
    interface: Interface,
    config: DeviceConfig,
    assembler: SysExAssembler,
    pending: VecDeque<Bytes>,
}

impl UsbMidiTransport {
    /// Find the first matching device and claim its MIDIStreaming interface.
    pub fn open(config: DeviceConfig) -> Result<Self, Error> {
        config.check()?;
        info!("Searching for {}...", config.product);
        let device_info = nusb::list_devices()?
            .find(|d| config.matches(d))
            .ok_or(Error::DeviceNotFound)?;

        info!(
            "Found device {:04x}:{:04x} on bus {} addr {}",
            device_info.vendor_id(),
            device_info.product_id(),
            device_info.bus_number(),
            device_info.device_address()
        );

        let device = device_info.open()?;
        let interface = device.detach_and_claim_interface(config.interface)?;
        info!(interface = config.interface, "Interface claimed successfully.");

        Ok(Self {
            interface,
            assembler: SysExAssembler::new(config.cable),
            config,
            pending: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}

impl Transport for UsbMidiTransport {
    async fn send(&mut self, frame: Bytes) -> Result<(), Error> {
        let data = packetize(&frame, self.config.cable);
        debug!(bytes = hex::encode(&data), "USB Write");
        let completion = self.interface.bulk_out(self.config.endpoint_out, data).await;
        completion.into_result()?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<Bytes, Error> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }
            let completion = self
                .interface
                .bulk_in(self.config.endpoint_in, RequestBuffer::new(READ_BUFFER_SIZE))
                .await;
            let data = completion.into_result()?;
            debug!(bytes = hex::encode(&data), "USB Read");
            self.pending.extend(self.assembler.push(&data));
        }
    }
}
