use crate::command::Command;
use crate::constants::{MAX_DATA_BYTE, MIN_FRAME_SIZE, SYSEX_END, SYSEX_MARKER, SYSEX_START};
use crate::error::Error;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::warn;

/// One SysEx frame: `[0xF0, 0x77, command, payload..., 0xF7]`.
///
/// The command is kept as a raw byte so replies with opcodes this library
/// does not know still parse; use [`Frame::command`] for the typed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: u8,
    pub payload: Bytes,
}

impl Frame {
    /// Build an outgoing frame. Every payload byte must fit in 7 bits.
    pub fn new(command: Command, payload: impl Into<Bytes>) -> Result<Self, Error> {
        let payload = payload.into();
        if let Some((offset, &value)) = payload.iter().enumerate().find(|(_, b)| **b > MAX_DATA_BYTE) {
            return Err(Error::DataByteOutOfRange { offset, value });
        }
        Ok(Self {
            command: command.into(),
            payload,
        })
    }

    pub fn command(&self) -> Result<Command, Error> {
        Command::from_byte(self.command)
    }

    /// Size of the frame on the wire.
    pub fn wire_len(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }
}

impl From<Frame> for Bytes {
    fn from(frame: Frame) -> Self {
        let mut buf = BytesMut::with_capacity(frame.wire_len());
        buf.put_u8(SYSEX_START);
        buf.put_u8(SYSEX_MARKER);
        buf.put_u8(frame.command);
        buf.put_slice(&frame.payload);
        buf.put_u8(SYSEX_END);
        buf.freeze()
    }
}

impl TryFrom<Bytes> for Frame {
    type Error = Error;

    fn try_from(bytes: Bytes) -> Result<Self, Self::Error> {
        let first = *bytes
            .first()
            .ok_or_else(|| Error::FrameFormat("Empty frame".to_string()))?;
        if first != SYSEX_START {
            return Err(Error::FrameFormat(format!(
                "Expected start byte {:#04x}, got {:#04x}",
                SYSEX_START, first
            )));
        }
        // `first` exists, so `last` does too
        let last = bytes[bytes.len() - 1];
        if last != SYSEX_END {
            return Err(Error::FrameFormat(format!(
                "Expected end byte {:#04x}, got {:#04x}",
                SYSEX_END, last
            )));
        }
        if bytes.len() < MIN_FRAME_SIZE {
            return Err(Error::FrameFormat(format!(
                "Frame too short: {} bytes, need at least {}",
                bytes.len(),
                MIN_FRAME_SIZE
            )));
        }
        if bytes[1] != SYSEX_MARKER {
            warn!(marker = bytes[1], "Frame carries an unexpected marker byte");
        }
        Ok(Self {
            command: bytes[2],
            payload: bytes.slice(3..bytes.len() - 1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_hello() {
        let frame = Frame::new(Command::Hello, Bytes::new()).unwrap();
        assert_eq!(Bytes::from(frame).as_ref(), &[0xF0, 0x77, 0x01, 0xF7]);
    }

    #[test]
    fn test_build_with_payload() {
        let frame = Frame::new(Command::ReadSettings, vec![0x03]).unwrap();
        assert_eq!(Bytes::from(frame).as_ref(), &[0xF0, 0x77, 0x08, 0x03, 0xF7]);
    }

    #[test]
    fn test_rejects_high_data_byte() {
        match Frame::new(Command::SetDac, vec![0x01, 0x80]) {
            Err(Error::DataByteOutOfRange { offset, value }) => {
                assert_eq!(offset, 1);
                assert_eq!(value, 0x80);
            }
            other => panic!("Expected DataByteOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_splits_command_and_payload() {
        let frame = Frame::try_from(Bytes::from_static(&[0xF0, 0x77, 0x04, 0x01, 0x02, 0x03, 0x04, 0xF7])).unwrap();
        assert_eq!(frame.command, 0x04);
        assert_eq!(frame.command().unwrap(), Command::ReadAdc);
        assert_eq!(frame.payload.as_ref(), &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_parse_unknown_command_byte() {
        let frame = Frame::try_from(Bytes::from_static(&[0xF0, 0x77, 0x42, 0xF7])).unwrap();
        assert!(frame.payload.is_empty());
        assert!(matches!(frame.command(), Err(Error::UnknownCommand(0x42))));
    }

    #[test]
    fn test_parse_rejects_bad_sentinels() {
        let cases: Vec<(&[u8], &str)> = vec![
            (&[], "empty"),
            (&[0xF0], "start only"),
            (&[0xF0, 0xF7], "no marker or command"),
            (&[0xF0, 0x77, 0xF7], "no command"),
            (&[0x00, 0x77, 0x01, 0xF7], "wrong start"),
            (&[0xF0, 0x77, 0x01, 0x00], "wrong end"),
            (&[0xF0, 0x77, 0x01], "truncated"),
        ];
        for (bytes, description) in cases {
            match Frame::try_from(Bytes::copy_from_slice(bytes)) {
                Err(Error::FrameFormat(_)) => {}
                other => panic!("{}: expected FrameFormat, got {:?}", description, other),
            }
        }
    }
}
