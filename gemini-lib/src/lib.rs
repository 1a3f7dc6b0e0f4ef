pub mod command;
pub mod constants;
pub mod error;
pub mod fix16;
pub mod frame;
pub mod nibble;
pub mod session;
pub mod settings;
pub mod transport;
pub mod usb;
pub mod usb_midi;

pub use command::{Command, LutChannel};
pub use error::Error;
pub use frame::Frame;
pub use session::Session;
pub use settings::Settings;
pub use transport::Transport;
pub use usb::{DeviceConfig, UsbMidiTransport};
