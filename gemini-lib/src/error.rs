use crate::command::Command;
use nusb::transfer::TransferError;
use std::array::TryFromSliceError;
use thiserror::Error;

/// The primary error type for the `gemini-lib` library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("USB device not found. Is the Gemini connected?")]
    DeviceNotFound,

    /// Opening, claiming or listing USB devices failed.
    #[error("USB error: {0}")]
    Usb(#[from] std::io::Error),

    #[error("USB transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Transport closed before a reply arrived")]
    Disconnected,

    #[error("Malformed frame: {0}")]
    FrameFormat(String),

    #[error("Short reply to {command}: expected at least {expected} payload bytes, got {actual}")]
    ShortReply {
        command: Command,
        expected: usize,
        actual: usize,
    },

    #[error("Nibble decode length mismatch: expected {expected} input bytes, got {actual}")]
    CodecLength { expected: usize, actual: usize },

    #[error("{command} failed at chunk {chunk}: {source}")]
    Chunk {
        command: Command,
        chunk: u8,
        #[source]
        source: Box<Error>,
    },

    #[error("Unknown command byte {0:#04x}")]
    UnknownCommand(u8),

    #[error("Data byte {value:#04x} at payload offset {offset} does not fit in 7 bits")]
    DataByteOutOfRange { offset: usize, value: u8 },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl From<TryFromSliceError> for Error {
    fn from(_: TryFromSliceError) -> Self {
        Error::FrameFormat("Failed to convert slice to array".to_string())
    }
}
