use crate::buffer::ByteBuffer;
use crate::error::Result;

/// Id of [`VersionPacket`]. Id 0 is reserved as an error sentinel.
pub const VERSION_PACKET_ID: i32 = 1;

/// Trailing field of the version payload.
pub const VERSION_TERMINATOR: i32 = -1;

/// All packets understood by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Version advertisement of the launcher.
    Version(VersionPacket),
}

impl Packet {
    /// Numeric wire id of this packet.
    pub fn id(&self) -> i32 {
        match self {
            Packet::Version(_) => VERSION_PACKET_ID,
        }
    }

    /// Serialize the payload starting at the buffer's cursor.
    pub fn encode(&self, buffer: &mut ByteBuffer) -> Result<()> {
        match self {
            Packet::Version(packet) => packet.encode(buffer),
        }
    }
}

impl From<VersionPacket> for Packet {
    fn from(packet: VersionPacket) -> Self {
        Packet::Version(packet)
    }
}

/// Advertises the launcher version to the guest.
///
/// The guest never sends version data of its own: decoding skips the payload
/// and leaves the packet as constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPacket {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
}

impl VersionPacket {
    pub fn new(major: i32, minor: i32, patch: i32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The version of this build.
    pub fn current() -> Self {
        Self::new(
            parse_component(env!("CARGO_PKG_VERSION_MAJOR")),
            parse_component(env!("CARGO_PKG_VERSION_MINOR")),
            parse_component(env!("CARGO_PKG_VERSION_PATCH")),
        )
    }

    /// Write `major, minor, patch, -1` as native-order `i32`s.
    pub fn encode(&self, buffer: &mut ByteBuffer) -> Result<()> {
        buffer.write_i32(self.major)?;
        buffer.write_i32(self.minor)?;
        buffer.write_i32(self.patch)?;
        buffer.write_i32(VERSION_TERMINATOR)?;
        Ok(())
    }

    /// One-way advertisement: the payload is ignored.
    pub fn decode(&mut self, _buffer: &mut ByteBuffer) -> Result<()> {
        Ok(())
    }
}

impl Default for VersionPacket {
    fn default() -> Self {
        Self::current()
    }
}

fn parse_component(raw: &str) -> i32 {
    raw.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ne(value: i32) -> [u8; 4] {
        value.to_ne_bytes()
    }

    #[test]
    fn version_payload_layout() {
        let mut buf = ByteBuffer::new(64);
        Packet::from(VersionPacket::new(1, 2, 3))
            .encode(&mut buf)
            .unwrap();

        let expected: Vec<u8> = [ne(1), ne(2), ne(3), ne(-1)].concat();
        assert_eq!(buf.written(), expected.as_slice());
        assert_eq!(buf.position(), 16);
    }

    #[test]
    fn version_payload_is_little_endian_on_common_targets() {
        if cfg!(target_endian = "little") {
            let mut buf = ByteBuffer::new(16);
            VersionPacket::new(1, 2, 3).encode(&mut buf).unwrap();
            assert_eq!(
                buf.written(),
                &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]
            );
        }
    }

    #[test]
    fn encode_starts_at_cursor() {
        let mut buf = ByteBuffer::new(24);
        buf.set_position(8).unwrap();
        VersionPacket::new(4, 5, 6).encode(&mut buf).unwrap();
        assert_eq!(&buf.as_slice()[..8], &[0u8; 8]);
        assert_eq!(&buf.as_slice()[8..12], &ne(4));
    }

    #[test]
    fn encode_into_short_buffer_fails() {
        let mut buf = ByteBuffer::new(12);
        assert!(VersionPacket::new(1, 2, 3).encode(&mut buf).is_err());
    }

    #[test]
    fn decode_leaves_fields_untouched() {
        let mut packet = VersionPacket::new(7, 8, 9);
        let mut payload = ByteBuffer::from_slice(&[0xAA; 16]);
        packet.decode(&mut payload).unwrap();
        assert_eq!(packet, VersionPacket::new(7, 8, 9));
        assert_eq!(payload.position(), 0);
    }

    #[test]
    fn current_matches_crate_version() {
        let current = VersionPacket::current();
        let rendered = format!("{}.{}.{}", current.major, current.minor, current.patch);
        assert_eq!(rendered, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn packet_id_is_never_zero() {
        assert_eq!(Packet::from(VersionPacket::default()).id(), VERSION_PACKET_ID);
        assert_ne!(VERSION_PACKET_ID, 0);
    }
}
