use crate::error::Error;
use bytes::Bytes;

/// A duplex channel carrying whole SysEx frames.
///
/// `receive` suspends until one complete frame is available. There is no
/// timeout; a silent device stalls the caller.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Transmit one frame atomically.
    async fn send(&mut self, frame: Bytes) -> Result<(), Error>;

    /// Wait for the next complete frame.
    async fn receive(&mut self) -> Result<Bytes, Error>;
}

impl<T: Transport> Transport for &mut T {
    async fn send(&mut self, frame: Bytes) -> Result<(), Error> {
        (**self).send(frame).await
    }

    async fn receive(&mut self) -> Result<Bytes, Error> {
        (**self).receive().await
    }
}
