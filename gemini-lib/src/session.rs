//! The command session: one request, then exactly one reply, in order.
//!
//! Replies are correlated purely by ordering; the session never has more
//! than one request outstanding and never retries. Multi-chunk exchanges run
//! their chunks strictly in sequence and abandon the whole operation at the
//! first failing chunk. A failed settings write is not rolled back, so the
//! device may hold a mix of old and new chunks until a full write succeeds.

use crate::command::{Command, LutChannel};
use crate::constants::{
    ADC_GAIN_SCALE, SETTINGS_BUFFER_LEN, SETTINGS_CHUNK_COUNT, SETTINGS_CHUNK_LEN, SETTINGS_ENCODED_LEN,
};
use crate::error::Error;
use crate::frame::Frame;
use crate::nibble;
use crate::settings::Settings;
use crate::transport::Transport;
use bytes::{Bytes, BytesMut};
use tracing::{debug, info};

/// Drives the calibration command set over an exclusively owned transport.
pub struct Session<T: Transport> {
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// End the session and hand the transport back.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send one frame without waiting for anything back.
    async fn send(&mut self, command: Command, payload: &[u8]) -> Result<(), Error> {
        let frame = Frame::new(command, Bytes::copy_from_slice(payload))?;
        let bytes = Bytes::from(frame);
        debug!(%command, bytes = hex::encode(&bytes), "Sending frame");
        self.transport.send(bytes).await
    }

    /// Wait for the next frame and parse it.
    async fn receive(&mut self) -> Result<Frame, Error> {
        let bytes = self.transport.receive().await?;
        debug!(bytes = hex::encode(&bytes), "Received frame");
        Frame::try_from(bytes)
    }

    /// Send `command` and return the single reply that follows it.
    async fn transact(&mut self, command: Command, payload: &[u8]) -> Result<Frame, Error> {
        self.send(command, payload).await?;
        self.receive().await
    }

    fn require_payload(command: Command, frame: &Frame, expected: usize) -> Result<(), Error> {
        if frame.payload.len() < expected {
            return Err(Error::ShortReply {
                command,
                expected,
                actual: frame.payload.len(),
            });
        }
        Ok(())
    }

    /// Greet the device and return the version byte it reports.
    pub async fn hello(&mut self) -> Result<u8, Error> {
        let reply = self.transact(Command::Hello, &[]).await?;
        Self::require_payload(Command::Hello, &reply, 1)?;
        let version = reply.payload[0];
        info!(version, "Device answered HELLO");
        Ok(version)
    }

    /// Read one analog input channel.
    pub async fn read_adc(&mut self, channel: u8) -> Result<u32, Error> {
        let reply = self.transact(Command::ReadAdc, &[channel]).await?;
        Self::require_payload(Command::ReadAdc, &reply, 4)?;
        let b = &reply.payload;
        // The middle shifts are 8 and 4, not 8 and 8; this is what the device expects.
        let value = (b[0] as u32) << 16 | (b[1] as u32) << 8 | (b[2] as u32) << 4 | b[3] as u32;
        debug!(channel, value, "ADC reading");
        Ok(value)
    }

    /// Drive an analog output. Fire-and-forget.
    pub async fn set_dac(&mut self, channel: u8, value: u16, gain: u8) -> Result<(), Error> {
        let mut payload = vec![channel, gain];
        payload.extend_from_slice(&nibble::encode_u16(value));
        self.send(Command::SetDac, &payload).await
    }

    /// Set an oscillator's period. Fire-and-forget.
    pub async fn set_period(&mut self, channel: u8, period: u16) -> Result<(), Error> {
        let mut payload = vec![channel];
        payload.extend_from_slice(&nibble::encode_u16(period));
        self.send(Command::SetFreq, &payload).await
    }

    /// Write an already scaled ADC gain correction (2048 == unity).
    pub async fn set_adc_gain_error_raw(&mut self, value: u16) -> Result<(), Error> {
        self.send(Command::WriteAdcGain, &nibble::encode_u16(value)).await
    }

    /// Write an ADC gain correction given as a ratio; scaled by 2048 and truncated.
    pub async fn set_adc_gain_error(&mut self, ratio: f64) -> Result<(), Error> {
        let scaled = (ratio * ADC_GAIN_SCALE).trunc();
        if !(0.0..=u16::MAX as f64).contains(&scaled) {
            return Err(Error::InvalidValue(format!("ADC gain ratio {} out of range", ratio)));
        }
        self.set_adc_gain_error_raw(scaled as u16).await
    }

    /// Write the ADC offset correction in code points.
    pub async fn set_adc_offset_error(&mut self, offset: i16) -> Result<(), Error> {
        self.send(Command::WriteAdcOffset, &nibble::encode_u16(offset as u16))
            .await
    }

    pub async fn enable_adc_error_correction(&mut self) -> Result<(), Error> {
        self.send(Command::EnableAdcCorr, &[]).await
    }

    pub async fn disable_adc_error_correction(&mut self) -> Result<(), Error> {
        self.send(Command::DisableAdcCorr, &[]).await
    }

    /// Ask the device to restore its factory settings.
    pub async fn reset_settings(&mut self) -> Result<(), Error> {
        self.send(Command::ResetSettings, &[]).await
    }

    /// Read the settings record in eight 16-byte chunks.
    pub async fn read_settings(&mut self) -> Result<Settings, Error> {
        let mut encoded = BytesMut::zeroed(SETTINGS_ENCODED_LEN);
        for chunk in 0..SETTINGS_CHUNK_COUNT {
            let reply = self
                .read_settings_chunk(chunk)
                .await
                .map_err(|e| chunk_error(Command::ReadSettings, chunk, e))?;
            let offset = chunk as usize * SETTINGS_CHUNK_LEN;
            encoded[offset..offset + SETTINGS_CHUNK_LEN].copy_from_slice(&reply[..SETTINGS_CHUNK_LEN]);
        }

        let mut buffer = [0u8; SETTINGS_BUFFER_LEN];
        nibble::decode_into(&encoded, &mut buffer)?;
        let settings = Settings::unpack_prefix(&buffer)?;
        info!("Settings read");
        Ok(settings)
    }

    async fn read_settings_chunk(&mut self, chunk: u8) -> Result<Bytes, Error> {
        let reply = self.transact(Command::ReadSettings, &[chunk]).await?;
        Self::require_payload(Command::ReadSettings, &reply, SETTINGS_CHUNK_LEN)?;
        Ok(reply.payload)
    }

    /// Write the settings record in eight chunks, waiting for an ack after each.
    pub async fn write_settings(&mut self, settings: &Settings) -> Result<(), Error> {
        let encoded = nibble::encode(&settings.to_padded());
        for (chunk, data) in (0..SETTINGS_CHUNK_COUNT).zip(encoded.chunks_exact(SETTINGS_CHUNK_LEN)) {
            let mut payload = Vec::with_capacity(1 + SETTINGS_CHUNK_LEN);
            payload.push(chunk);
            payload.extend_from_slice(data);
            self.transact(Command::WriteSettings, &payload)
                .await
                .map_err(|e| chunk_error(Command::WriteSettings, chunk, e))?;
            debug!(chunk, "Settings chunk acknowledged");
        }
        info!("Settings written");
        Ok(())
    }

    /// Write one lookup-table entry and wait for the device to acknowledge it.
    pub async fn write_lut_entry(&mut self, entry: u8, channel: LutChannel, value: u16) -> Result<(), Error> {
        let mut payload = vec![entry, channel.into()];
        payload.extend_from_slice(&nibble::encode_u16(value));
        self.transact(Command::WriteLutEntry, &payload).await?;
        debug!(entry, %channel, value, "LUT entry acknowledged");
        Ok(())
    }

    /// Commit the entries written so far.
    pub async fn write_lut(&mut self) -> Result<(), Error> {
        self.send(Command::WriteLut, &[]).await
    }

    pub async fn erase_lut(&mut self) -> Result<(), Error> {
        self.send(Command::EraseLut, &[]).await
    }
}

fn chunk_error(command: Command, chunk: u8, source: Error) -> Error {
    Error::Chunk {
        command,
        chunk,
        source: Box::new(source),
    }
}
