use bytes::{Bytes, BytesMut};

use crate::buffer::ByteBuffer;
use crate::error::{FrameError, Result};
use crate::packet::Packet;
use crate::registry::PacketRegistry;

/// Frame header: id (4) + length (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest payload a single frame may carry.
pub const MAX_PAYLOAD: usize = 4096;

/// The fixed-size prefix of every frame.
///
/// Wire format (native byte order, signed fields):
/// ```text
/// ┌──────────────┬──────────────┬─────────────────┐
/// │ Id (4B)      │ Length (4B)  │ Payload         │
/// │              │ 0..=4096     │ (Length bytes)  │
/// └──────────────┴──────────────┴─────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub id: i32,
    pub length: i32,
}

impl PacketHeader {
    pub fn new(id: i32, length: i32) -> Self {
        Self { id, length }
    }

    /// Serialize to the 8-byte wire form.
    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut raw = [0u8; HEADER_SIZE];
        raw[..4].copy_from_slice(&self.id.to_ne_bytes());
        raw[4..].copy_from_slice(&self.length.to_ne_bytes());
        raw
    }

    /// Parse the 8-byte wire form. Does not validate the length.
    pub fn from_bytes(raw: [u8; HEADER_SIZE]) -> Self {
        let [a, b, c, d, e, f, g, h] = raw;
        Self {
            id: i32::from_ne_bytes([a, b, c, d]),
            length: i32::from_ne_bytes([e, f, g, h]),
        }
    }

    /// The payload length, if it lies in `0..=MAX_PAYLOAD`.
    pub fn payload_len(&self) -> Result<usize> {
        match usize::try_from(self.length) {
            Ok(len) if len <= MAX_PAYLOAD => Ok(len),
            _ => Err(FrameError::LengthOutOfBounds(self.length)),
        }
    }
}

/// Encode a packet into its header and payload.
///
/// The payload is built in a `MAX_PAYLOAD` scratch buffer; a packet that does
/// not fit fails with a buffer overflow rather than being split across frames.
pub fn encode_packet(packet: &Packet) -> Result<(PacketHeader, Bytes)> {
    let mut scratch = ByteBuffer::new(MAX_PAYLOAD);
    packet.encode(&mut scratch)?;

    let length = i32::try_from(scratch.position()).map_err(|_| FrameError::PayloadTooLarge {
        size: scratch.position(),
        max: MAX_PAYLOAD,
    })?;
    Ok((
        PacketHeader::new(packet.id(), length),
        scratch.freeze_written(),
    ))
}

/// Encode a packet into one contiguous frame: header followed by payload.
pub fn encode_frame(packet: &Packet, dst: &mut BytesMut) -> Result<()> {
    let (header, payload) = encode_packet(packet)?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.extend_from_slice(&header.to_bytes());
    dst.extend_from_slice(&payload);
    Ok(())
}

/// Decode a received payload through the registry.
pub fn decode_packet(
    registry: &PacketRegistry,
    header: PacketHeader,
    payload: Bytes,
) -> Result<Packet> {
    let mut buffer = ByteBuffer::from(payload);
    registry.decode(header.id, &mut buffer)
}
