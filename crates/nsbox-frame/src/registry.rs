use std::collections::HashMap;

use crate::buffer::ByteBuffer;
use crate::error::{FrameError, Result};
use crate::packet::{Packet, VersionPacket, VERSION_PACKET_ID};

/// Constructs a packet and decodes its payload.
pub type Decoder = fn(&mut ByteBuffer) -> Result<Packet>;

/// Maps packet ids to decoders.
///
/// Extending the protocol means adding a [`Packet`] variant and registering
/// its decoder here.
#[derive(Debug, Clone)]
pub struct PacketRegistry {
    decoders: HashMap<i32, Decoder>,
}

impl PacketRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// The registry with every built-in packet.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.decoders.insert(VERSION_PACKET_ID, decode_version);
        registry
    }

    /// Register a decoder for `id`.
    pub fn register(&mut self, id: i32, decoder: Decoder) -> Result<()> {
        if id == 0 {
            return Err(FrameError::ReservedPacketId);
        }
        if self.decoders.contains_key(&id) {
            return Err(FrameError::DuplicatePacketId(id));
        }
        self.decoders.insert(id, decoder);
        Ok(())
    }

    /// True when a decoder exists for `id`.
    pub fn contains(&self, id: i32) -> bool {
        self.decoders.contains_key(&id)
    }

    /// Decode the payload of a packet with the given id.
    pub fn decode(&self, id: i32, payload: &mut ByteBuffer) -> Result<Packet> {
        let decoder = self
            .decoders
            .get(&id)
            .ok_or(FrameError::UnknownPacketId(id))?;
        decoder(payload)
    }
}

impl Default for PacketRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn decode_version(payload: &mut ByteBuffer) -> Result<Packet> {
    let mut packet = VersionPacket::current();
    packet.decode(payload)?;
    Ok(Packet::Version(packet))
}
