use std::io::Write;

use nsbox_transport::{write_full, TransportError};
use tracing::trace;

use crate::codec::{PacketHeader, MAX_PAYLOAD};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
pub struct PacketWriter<T> {
    inner: T,
}

impl<T: Write> PacketWriter<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Write a header followed by its payload (blocking).
    pub fn write_raw(&mut self, header: PacketHeader, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        write_full(&mut self.inner, &header.to_bytes()).map_err(closed_to_frame_error)?;
        write_full(&mut self.inner, payload).map_err(closed_to_frame_error)?;
        self.flush()?;

        trace!(id = header.id, length = payload.len(), "wrote frame");
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Transport(TransportError::Io(err))),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn closed_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Closed { .. } => FrameError::ConnectionClosed,
        other => FrameError::Transport(other),
    }
}
