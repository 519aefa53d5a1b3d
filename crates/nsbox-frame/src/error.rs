use nsbox_transport::TransportError;

/// Errors raised by [`ByteBuffer`](crate::ByteBuffer) accessors.
///
/// A failed access never moves the cursor or touches the backing storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// A read or write would run past the end of the buffer.
    #[error("buffer overflow ({requested} bytes requested, {remaining} remaining)")]
    Overflow { requested: usize, remaining: usize },

    /// A cursor move targeted a position beyond the capacity.
    #[error("position {position} out of bounds (capacity {capacity})")]
    PositionOutOfBounds { position: usize, capacity: usize },
}

/// Errors that can occur while encoding, decoding or transferring packets.
///
/// Apart from [`FrameError::Disconnected`], every variant leaves the stream in
/// an unknown state; callers escalate them through the fail-fast policy.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A buffer access failed while encoding or decoding a payload.
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// The header declared a payload length outside `0..=MAX_PAYLOAD`.
    #[error("header length was too large or too small: {0}")]
    LengthOutOfBounds(i32),

    /// The encoded payload does not fit in a single frame.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// No decoder is registered for the packet id.
    #[error("unknown packet id {0}")]
    UnknownPacketId(i32),

    /// Packet id 0 is the error sentinel and cannot be registered.
    #[error("packet id 0 is reserved")]
    ReservedPacketId,

    /// A decoder for the packet id is already registered.
    #[error("packet id {0} is already registered")]
    DuplicatePacketId(i32),

    /// A transport error occurred while reading or writing a frame.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),

    /// The stream ended in the middle of a frame.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The stream ended cleanly on a frame boundary.
    #[error("peer disconnected")]
    Disconnected,

    /// A thread panicked while holding a direction lock.
    #[error("{0} lock poisoned, stream is desynchronized")]
    Poisoned(&'static str),
}

pub type Result<T> = std::result::Result<T, FrameError>;
