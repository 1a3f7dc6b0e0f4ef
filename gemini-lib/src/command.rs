use crate::error::Error;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Opcodes understood by the Gemini calibration firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Command {
    #[strum(to_string = "HELLO")]
    Hello = 0x01,
    #[strum(to_string = "WRITE_ADC_GAIN")]
    WriteAdcGain = 0x02,
    #[strum(to_string = "WRITE_ADC_OFFSET")]
    WriteAdcOffset = 0x03,
    #[strum(to_string = "READ_ADC")]
    ReadAdc = 0x04,
    #[strum(to_string = "SET_DAC")]
    SetDac = 0x05,
    #[strum(to_string = "SET_FREQ")]
    SetFreq = 0x06,
    #[strum(to_string = "RESET_SETTINGS")]
    ResetSettings = 0x07,
    #[strum(to_string = "READ_SETTINGS")]
    ReadSettings = 0x08,
    #[strum(to_string = "WRITE_SETTINGS")]
    WriteSettings = 0x09,
    #[strum(to_string = "WRITE_LUT_ENTRY")]
    WriteLutEntry = 0x0A,
    #[strum(to_string = "WRITE_LUT")]
    WriteLut = 0x0B,
    #[strum(to_string = "ERASE_LUT")]
    EraseLut = 0x0C,
    #[strum(to_string = "DISABLE_ADC_CORR")]
    DisableAdcCorr = 0x0D,
    #[strum(to_string = "ENABLE_ADC_CORR")]
    EnableAdcCorr = 0x0E,
}

impl Command {
    /// Parse a raw command byte.
    pub fn from_byte(byte: u8) -> Result<Self, Error> {
        Command::try_from(byte).map_err(|_| Error::UnknownCommand(byte))
    }
}

/// Oscillator a lookup-table entry belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LutChannel {
    #[strum(to_string = "castor")]
    Castor = 0,
    #[strum(to_string = "pollux")]
    Pollux = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes() {
        assert_eq!(u8::from(Command::Hello), 0x01);
        assert_eq!(u8::from(Command::ReadSettings), 0x08);
        assert_eq!(u8::from(Command::EnableAdcCorr), 0x0E);
    }

    #[test]
    fn test_from_byte() {
        assert_eq!(Command::from_byte(0x09).unwrap(), Command::WriteSettings);
        assert!(matches!(Command::from_byte(0x00), Err(Error::UnknownCommand(0x00))));
        assert!(matches!(Command::from_byte(0x0F), Err(Error::UnknownCommand(0x0F))));
    }

    #[test]
    fn test_display_uses_wire_names() {
        assert_eq!(Command::WriteLutEntry.to_string(), "WRITE_LUT_ENTRY");
        assert_eq!(LutChannel::Pollux.to_string(), "pollux");
    }
}
