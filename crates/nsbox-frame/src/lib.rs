//! Packet framing for the nsbox launcher/guest channel.
//!
//! Every packet travels as an 8-byte header followed by its payload:
//! - A 4-byte native-order packet id (0 is never assigned)
//! - A 4-byte native-order payload length in `0..=4096`
//!
//! Payloads are built and parsed through the fixed-capacity [`ByteBuffer`];
//! ids resolve to decoders through the [`PacketRegistry`].

pub mod buffer;
pub mod channel;
pub mod codec;
pub mod error;
pub mod packet;
pub mod reader;
pub mod registry;
pub mod writer;

pub use buffer::ByteBuffer;
pub use channel::IpcChannel;
pub use codec::{
    decode_packet, encode_frame, encode_packet, PacketHeader, HEADER_SIZE, MAX_PAYLOAD,
};
pub use error::{BufferError, FrameError, Result};
pub use packet::{Packet, VersionPacket, VERSION_PACKET_ID, VERSION_TERMINATOR};
pub use reader::PacketReader;
pub use registry::{Decoder, PacketRegistry};
pub use writer::PacketWriter;
