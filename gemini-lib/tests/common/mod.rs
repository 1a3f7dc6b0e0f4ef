//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use gemini_lib::{Command, Error, Frame, LutChannel, Session, Settings, Transport};

use std::collections::VecDeque;

/// One step of traffic seen by the mock, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Sent(Bytes),
    Received(Bytes),
}

/// Transport that records sent frames and replays queued replies.
///
/// Running out of replies yields `Error::Disconnected` instead of blocking.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: VecDeque<Bytes>,
    pub log: Vec<Event>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn with_replies<I: IntoIterator<Item = Bytes>>(replies: I) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            log: Vec::new(),
        }
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.log
            .iter()
            .filter_map(|e| match e {
                Event::Sent(b) => Some(b.clone()),
                Event::Received(_) => None,
            })
            .collect()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, frame: Bytes) -> Result<(), Error> {
        self.log.push(Event::Sent(frame));
        Ok(())
    }

    async fn receive(&mut self) -> Result<Bytes, Error> {
        let frame = self.replies.pop_front().ok_or(Error::Disconnected)?;
        self.log.push(Event::Received(frame.clone()));
        Ok(frame)
    }
}

/// Wrap `payload` in a reply frame for `command`.
#[allow(dead_code)]
pub fn reply(command: Command, payload: &[u8]) -> Bytes {
    let mut out = vec![0xF0, 0x77, u8::from(command)];
    out.extend_from_slice(payload);
    out.push(0xF7);
    Bytes::from(out)
}

/// Decode a hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

/// Record used by the settings scenarios; every signed field is negative somewhere.
#[allow(dead_code)]
pub fn scenario_settings() -> Settings {
    Settings {
        magic: 1,
        adc_gain_corr: 100,
        adc_offset_corr: -5,
        led_brightness: 200,
        castor_knob_min: -1000,
        castor_knob_max: 1000,
        pollux_knob_min: -2000,
        pollux_knob_max: 2000,
        chorus_max_intensity: 3277,
        chorus_frequency: 13107,
        knob_offset_corr: -42,
        knob_gain_corr: 65536,
        smooth_initial_gain: 6554,
        smooth_sensitivity: 1_310_720,
        pollux_follower_threshold: 6,
    }
}

/// The eight READ_SETTINGS replies a device holding `settings` would send.
#[allow(dead_code)]
pub fn settings_replies(settings: &Settings) -> Vec<Bytes> {
    let encoded = gemini_lib::nibble::encode(&settings.to_padded());
    encoded
        .chunks_exact(16)
        .map(|chunk| reply(Command::ReadSettings, chunk))
        .collect()
}
