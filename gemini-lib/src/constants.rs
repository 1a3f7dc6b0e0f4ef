// Protocol constants for the Gemini SysEx command set

/// SysEx start sentinel
pub const SYSEX_START: u8 = 0xF0;

/// SysEx end sentinel
pub const SYSEX_END: u8 = 0xF7;

/// Marker byte identifying Gemini calibration frames
pub const SYSEX_MARKER: u8 = 0x77;

/// Smallest well-formed frame: start, marker, command, end
pub const MIN_FRAME_SIZE: usize = 4;

/// Highest value a SysEx data byte may carry
pub const MAX_DATA_BYTE: u8 = 0x7F;

/// Packed size of the settings record (49 bytes)
pub const SETTINGS_LEN: usize = 49;

/// Zero-padded working buffer the settings record travels in
pub const SETTINGS_BUFFER_LEN: usize = 64;

/// Nibble-encoded size of the settings buffer
pub const SETTINGS_ENCODED_LEN: usize = SETTINGS_BUFFER_LEN * 2;

/// Encoded bytes carried by one settings chunk
pub const SETTINGS_CHUNK_LEN: usize = 16;

/// Number of chunks in a settings read or write
pub const SETTINGS_CHUNK_COUNT: u8 = (SETTINGS_ENCODED_LEN / SETTINGS_CHUNK_LEN) as u8;

/// Value of `magic` the firmware accepts as a valid record
pub const SETTINGS_MARKER: u8 = 0x63;

/// Scale applied to ADC gain ratios before transmission (1.0 == 2048)
pub const ADC_GAIN_SCALE: f64 = 2048.0;

/// Accepted range of `adc_gain_corr`
pub const ADC_GAIN_CORR_MIN: u16 = 512;
pub const ADC_GAIN_CORR_MAX: u16 = 4096;

/// Largest accepted `led_brightness`
pub const LED_BRIGHTNESS_MAX: u16 = 255;
