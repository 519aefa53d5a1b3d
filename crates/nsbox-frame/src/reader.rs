use std::io::Read;

use bytes::{Bytes, BytesMut};
use nsbox_transport::{read_full, TransportError};
use tracing::trace;

use crate::codec::{PacketHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get a whole header and
/// payload or an error.
pub struct PacketReader<T> {
    inner: T,
}

impl<T: Read> PacketReader<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read the next frame (blocking).
    ///
    /// The header is validated before any payload byte is read. EOF on a frame
    /// boundary yields [`FrameError::Disconnected`], EOF inside a frame
    /// [`FrameError::ConnectionClosed`].
    pub fn read_raw(&mut self) -> Result<(PacketHeader, Bytes)> {
        let mut raw = [0u8; HEADER_SIZE];
        read_full(&mut self.inner, &mut raw).map_err(|err| eof_to_frame_error(err, true))?;

        let header = PacketHeader::from_bytes(raw);
        let len = header.payload_len()?;

        let mut payload = BytesMut::zeroed(len);
        read_full(&mut self.inner, &mut payload).map_err(|err| eof_to_frame_error(err, false))?;

        trace!(id = header.id, length = len, "read frame");
        Ok((header, payload.freeze()))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn eof_to_frame_error(err: TransportError, at_boundary: bool) -> FrameError {
    match err {
        TransportError::Closed { transferred: 0, .. } if at_boundary => FrameError::Disconnected,
        TransportError::Closed { .. } => FrameError::ConnectionClosed,
        other => FrameError::Transport(other),
    }
}
