//! The persisted settings record and its 49-byte big-endian wire layout.

use crate::constants::{
    ADC_GAIN_CORR_MAX, ADC_GAIN_CORR_MIN, LED_BRIGHTNESS_MAX, SETTINGS_BUFFER_LEN, SETTINGS_LEN, SETTINGS_MARKER,
};
use crate::error::Error;
use crate::fix16;
use serde::{Deserialize, Serialize};
use std::fmt;
use zerocopy::byteorder::big_endian::{I16, I32, U16};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Wire image of the settings record. Field order and widths are fixed by the firmware.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SettingsRaw {
    pub magic: u8,
    pub adc_gain_corr: U16,
    pub adc_offset_corr: I16,
    pub led_brightness: U16,
    pub castor_knob_min: I32,
    pub castor_knob_max: I32,
    pub pollux_knob_min: I32,
    pub pollux_knob_max: I32,
    pub chorus_max_intensity: I32,
    pub chorus_frequency: I32,
    pub knob_offset_corr: I32,
    pub knob_gain_corr: I32,
    pub smooth_initial_gain: I32,
    pub smooth_sensitivity: I32,
    pub pollux_follower_threshold: U16,
}

const _: () = assert!(std::mem::size_of::<SettingsRaw>() == SETTINGS_LEN);

/// Device configuration. The 32-bit tuning values are 16.16 fixed point (see [`fix16`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub magic: u8,
    /// ADC gain correction, 2048 == unity
    pub adc_gain_corr: u16,
    /// ADC offset correction in code points
    pub adc_offset_corr: i16,
    pub led_brightness: u16,
    pub castor_knob_min: i32,
    pub castor_knob_max: i32,
    pub pollux_knob_min: i32,
    pub pollux_knob_max: i32,
    pub chorus_max_intensity: i32,
    pub chorus_frequency: i32,
    pub knob_offset_corr: i32,
    pub knob_gain_corr: i32,
    pub smooth_initial_gain: i32,
    pub smooth_sensitivity: i32,
    pub pollux_follower_threshold: u16,
}

impl Default for Settings {
    /// The values the firmware falls back to when its stored record is invalid.
    fn default() -> Self {
        Self {
            magic: SETTINGS_MARKER,
            adc_gain_corr: 2048,
            adc_offset_corr: 0,
            led_brightness: 127,
            castor_knob_min: fix16::from_f64(-1.01),
            castor_knob_max: fix16::from_f64(1.01),
            pollux_knob_min: fix16::from_f64(-1.01),
            pollux_knob_max: fix16::from_f64(1.01),
            chorus_max_intensity: fix16::from_f64(0.05),
            chorus_frequency: fix16::from_f64(0.2),
            knob_offset_corr: fix16::from_f64(0.0),
            knob_gain_corr: fix16::from_f64(1.0),
            smooth_initial_gain: fix16::from_f64(0.1),
            smooth_sensitivity: fix16::from_f64(20.0),
            pollux_follower_threshold: 6,
        }
    }
}

impl From<SettingsRaw> for Settings {
    fn from(raw: SettingsRaw) -> Self {
        Self {
            magic: raw.magic,
            adc_gain_corr: raw.adc_gain_corr.get(),
            adc_offset_corr: raw.adc_offset_corr.get(),
            led_brightness: raw.led_brightness.get(),
            castor_knob_min: raw.castor_knob_min.get(),
            castor_knob_max: raw.castor_knob_max.get(),
            pollux_knob_min: raw.pollux_knob_min.get(),
            pollux_knob_max: raw.pollux_knob_max.get(),
            chorus_max_intensity: raw.chorus_max_intensity.get(),
            chorus_frequency: raw.chorus_frequency.get(),
            knob_offset_corr: raw.knob_offset_corr.get(),
            knob_gain_corr: raw.knob_gain_corr.get(),
            smooth_initial_gain: raw.smooth_initial_gain.get(),
            smooth_sensitivity: raw.smooth_sensitivity.get(),
            pollux_follower_threshold: raw.pollux_follower_threshold.get(),
        }
    }
}

impl From<Settings> for SettingsRaw {
    fn from(settings: Settings) -> Self {
        Self {
            magic: settings.magic,
            adc_gain_corr: U16::new(settings.adc_gain_corr),
            adc_offset_corr: I16::new(settings.adc_offset_corr),
            led_brightness: U16::new(settings.led_brightness),
            castor_knob_min: I32::new(settings.castor_knob_min),
            castor_knob_max: I32::new(settings.castor_knob_max),
            pollux_knob_min: I32::new(settings.pollux_knob_min),
            pollux_knob_max: I32::new(settings.pollux_knob_max),
            chorus_max_intensity: I32::new(settings.chorus_max_intensity),
            chorus_frequency: I32::new(settings.chorus_frequency),
            knob_offset_corr: I32::new(settings.knob_offset_corr),
            knob_gain_corr: I32::new(settings.knob_gain_corr),
            smooth_initial_gain: I32::new(settings.smooth_initial_gain),
            smooth_sensitivity: I32::new(settings.smooth_sensitivity),
            pollux_follower_threshold: U16::new(settings.pollux_follower_threshold),
        }
    }
}

impl Settings {
    /// Serialize to the 49-byte big-endian layout.
    pub fn pack(&self) -> [u8; SETTINGS_LEN] {
        let raw = SettingsRaw::from(*self);
        zerocopy::transmute!(raw)
    }

    /// Exact inverse of [`Settings::pack`]. No validation is applied.
    pub fn unpack(bytes: &[u8; SETTINGS_LEN]) -> Self {
        let raw: SettingsRaw = zerocopy::transmute!(*bytes);
        Settings::from(raw)
    }

    /// Unpack from the front of a longer buffer, e.g. the 64-byte padded image.
    pub fn unpack_prefix(bytes: &[u8]) -> Result<Self, Error> {
        let raw = SettingsRaw::read_from_prefix(bytes)
            .map(|(raw, _)| raw)
            .map_err(|_| Error::CodecLength {
                expected: SETTINGS_LEN,
                actual: bytes.len(),
            })?;
        Ok(Settings::from(raw))
    }

    /// The packed record zero-extended to the 64-byte transfer buffer.
    pub fn to_padded(&self) -> [u8; SETTINGS_BUFFER_LEN] {
        let mut buffer = [0u8; SETTINGS_BUFFER_LEN];
        buffer[..SETTINGS_LEN].copy_from_slice(&self.pack());
        buffer
    }

    /// Apply the same acceptance checks the firmware runs when it loads settings.
    pub fn validate(&self) -> Result<(), Error> {
        if self.magic != SETTINGS_MARKER {
            return Err(Error::InvalidSettings(format!(
                "magic is {:#04x}, expected {:#04x}",
                self.magic, SETTINGS_MARKER
            )));
        }
        if !(ADC_GAIN_CORR_MIN..=ADC_GAIN_CORR_MAX).contains(&self.adc_gain_corr) {
            return Err(Error::InvalidSettings(format!(
                "adc_gain_corr {} outside {}..={}",
                self.adc_gain_corr, ADC_GAIN_CORR_MIN, ADC_GAIN_CORR_MAX
            )));
        }
        if self.led_brightness > LED_BRIGHTNESS_MAX {
            return Err(Error::InvalidSettings(format!(
                "led_brightness {} above {}",
                self.led_brightness, LED_BRIGHTNESS_MAX
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Settings:")?;
        writeln!(f, "  Magic: {:#04x}", self.magic)?;
        writeln!(f, "  ADC offset: {} code points", self.adc_offset_corr)?;
        writeln!(f, "  ADC gain: {}", self.adc_gain_corr)?;
        writeln!(f, "  LED brightness: {} / {}", self.led_brightness, LED_BRIGHTNESS_MAX)?;
        writeln!(f, "  Castor knob min: {:.2} v/oct", fix16::to_f64(self.castor_knob_min))?;
        writeln!(f, "  Castor knob max: {:.2} v/oct", fix16::to_f64(self.castor_knob_max))?;
        writeln!(f, "  Pollux knob min: {:.2} v/oct", fix16::to_f64(self.pollux_knob_min))?;
        writeln!(f, "  Pollux knob max: {:.2} v/oct", fix16::to_f64(self.pollux_knob_max))?;
        writeln!(f, "  Chorus frequency: {:.2} Hz", fix16::to_f64(self.chorus_frequency))?;
        writeln!(f, "  Chorus intensity: {:.2} v/oct", fix16::to_f64(self.chorus_max_intensity))?;
        writeln!(f, "  Knob offset: {:.2} code points", fix16::to_f64(self.knob_offset_corr))?;
        writeln!(f, "  Knob gain: {:.2}", fix16::to_f64(self.knob_gain_corr))?;
        writeln!(f, "  Smooth initial gain: {:.2}", fix16::to_f64(self.smooth_initial_gain))?;
        writeln!(f, "  Smooth sensitivity: {:.2}", fix16::to_f64(self.smooth_sensitivity))?;
        write!(f, "  Pollux follower threshold: {} code points", self.pollux_follower_threshold)
    }
}
