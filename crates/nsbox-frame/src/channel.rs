use std::io::{Read, Write};
use std::os::fd::{FromRawFd, RawFd};
use std::sync::{Mutex, MutexGuard};

use nsbox_transport::{PipeReader, PipeWriter};
use tracing::debug;

use crate::codec::{decode_packet, encode_packet};
use crate::error::{FrameError, Result};
use crate::packet::Packet;
use crate::reader::PacketReader;
use crate::registry::PacketRegistry;
use crate::writer::PacketWriter;

/// A full-duplex packet channel over one inbound and one outbound stream.
///
/// Each direction has its own lock, held only for the transfer of one
/// header+payload pair. One thread may `receive` while another `send`s;
/// concurrent callers on the same direction are serialized.
pub struct IpcChannel<R = PipeReader, W = PipeWriter> {
    reader: Mutex<PacketReader<R>>,
    writer: Mutex<PacketWriter<W>>,
    registry: PacketRegistry,
}

impl IpcChannel<PipeReader, PipeWriter> {
    /// Adopt a raw descriptor pair handed over by the launcher.
    ///
    /// # Safety
    ///
    /// Both descriptors must be open, owned by nothing else, and refer to the
    /// read and write ends of pipes respectively. The channel closes them on drop.
    pub unsafe fn from_raw_fds(read_fd: RawFd, write_fd: RawFd) -> Self {
        Self::new(PipeReader::from_raw_fd(read_fd), PipeWriter::from_raw_fd(write_fd))
    }
}

impl<R: Read, W: Write> IpcChannel<R, W> {
    /// Create a channel that understands the standard packet set.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_registry(reader, writer, PacketRegistry::standard())
    }

    /// Create a channel with an explicit packet registry.
    pub fn with_registry(reader: R, writer: W, registry: PacketRegistry) -> Self {
        Self {
            reader: Mutex::new(PacketReader::new(reader)),
            writer: Mutex::new(PacketWriter::new(writer)),
            registry,
        }
    }

    /// Receive the next packet (blocking).
    ///
    /// The read lock is released once the payload is in memory, so decoding
    /// overlaps with the next `receive` on another thread.
    pub fn receive(&self) -> Result<Packet> {
        let (header, payload) = {
            let mut reader = lock(&self.reader, "read")?;
            reader.read_raw()?
        };

        debug!(id = header.id, length = header.length, "received packet");
        decode_packet(&self.registry, header, payload)
    }

    /// Send a packet (blocking).
    ///
    /// Encoding happens before the write lock is taken; the lock is acquired
    /// once and covers the header and the payload.
    pub fn send(&self, packet: &Packet) -> Result<()> {
        let (header, payload) = encode_packet(packet)?;

        let mut writer = lock(&self.writer, "write")?;
        writer.write_raw(header, &payload)?;
        drop(writer);

        debug!(id = header.id, length = header.length, "sent packet");
        Ok(())
    }

    /// The registry used to decode inbound packets.
    pub fn registry(&self) -> &PacketRegistry {
        &self.registry
    }

    /// Consume the channel and return the underlying streams.
    pub fn into_inner(self) -> Result<(R, W)> {
        let reader = self
            .reader
            .into_inner()
            .map_err(|_| FrameError::Poisoned("read"))?;
        let writer = self
            .writer
            .into_inner()
            .map_err(|_| FrameError::Poisoned("write"))?;
        Ok((reader.into_inner(), writer.into_inner()))
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, direction: &'static str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| FrameError::Poisoned(direction))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::thread;

    use bytes::BytesMut;
    use nsbox_transport::pipe;

    use super::*;
    use crate::codec::{encode_frame, PacketHeader, HEADER_SIZE};
    use crate::packet::VersionPacket;

    fn loopback() -> IpcChannel {
        let (reader, writer) = pipe().unwrap();
        IpcChannel::new(reader, writer)
    }

    #[test]
    fn send_writes_header_plus_payload() {
        let channel = IpcChannel::new(Cursor::new(Vec::<u8>::new()), Cursor::new(Vec::new()));
        channel
            .send(&Packet::from(VersionPacket::new(1, 2, 3)))
            .unwrap();

        let (_, writer) = channel.into_inner().unwrap();
        let wire = writer.into_inner();
        assert_eq!(wire.len(), HEADER_SIZE + 16);
        assert_eq!(&wire[..HEADER_SIZE], &PacketHeader::new(1, 16).to_bytes());
    }

    #[test]
    fn sent_bytes_reconstruct_packet() {
        let sender = IpcChannel::new(Cursor::new(Vec::<u8>::new()), Cursor::new(Vec::new()));
        let packet = Packet::from(VersionPacket::current());
        sender.send(&packet).unwrap();
        let (_, writer) = sender.into_inner().unwrap();

        let receiver = IpcChannel::new(Cursor::new(writer.into_inner()), std::io::sink());
        assert_eq!(receiver.receive().unwrap(), packet);
    }

    #[test]
    fn receive_rejects_out_of_bounds_length() {
        for length in [5000, -1] {
            let mut wire = PacketHeader::new(1, length).to_bytes().to_vec();
            wire.extend_from_slice(&[0u8; 64]);
            let channel = IpcChannel::new(Cursor::new(wire), std::io::sink());

            let err = channel.receive().unwrap_err();
            assert!(matches!(err, FrameError::LengthOutOfBounds(l) if l == length));

            let (reader, _) = channel.into_inner().unwrap();
            assert_eq!(reader.position(), HEADER_SIZE as u64);
        }
    }

    #[test]
    fn receive_rejects_unknown_id() {
        let wire = PacketHeader::new(77, 0).to_bytes().to_vec();
        let channel = IpcChannel::new(Cursor::new(wire), std::io::sink());
        assert!(matches!(
            channel.receive(),
            Err(FrameError::UnknownPacketId(77))
        ));
    }

    #[test]
    fn receive_reports_disconnect_on_eof() {
        let (reader, writer) = pipe().unwrap();
        drop(writer);
        let channel = IpcChannel::new(reader, std::io::sink());
        assert!(matches!(channel.receive(), Err(FrameError::Disconnected)));
    }

    #[test]
    fn empty_registry_rejects_everything() {
        let mut wire = BytesMut::new();
        encode_frame(&Packet::from(VersionPacket::new(1, 2, 3)), &mut wire).unwrap();
        let channel = IpcChannel::with_registry(
            Cursor::new(wire.to_vec()),
            std::io::sink(),
            PacketRegistry::empty(),
        );
        assert!(matches!(channel.receive(), Err(FrameError::UnknownPacketId(1))));
    }

    #[test]
    fn pipe_roundtrip() {
        let channel = loopback();
        let packet = Packet::from(VersionPacket::new(3, 2, 1));
        channel.send(&packet).unwrap();
        assert!(matches!(channel.receive().unwrap(), Packet::Version(_)));
    }

    #[test]
    fn concurrent_send_and_receive_do_not_deadlock() {
        const COUNT: usize = 2_000;
        let channel = Arc::new(loopback());

        let receiver = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for _ in 0..COUNT {
                    let packet = channel.receive().unwrap();
                    assert_eq!(packet.id(), 1);
                }
            })
        };

        for _ in 0..COUNT {
            channel
                .send(&Packet::from(VersionPacket::current()))
                .unwrap();
        }

        receiver.join().unwrap();
    }

    #[test]
    fn concurrent_senders_never_interleave_frames() {
        const SENDERS: usize = 4;
        const PER_SENDER: usize = 500;
        let (reader, writer) = pipe().unwrap();
        let channel = Arc::new(IpcChannel::new(std::io::empty(), writer));

        let senders: Vec<_> = (0..SENDERS)
            .map(|i| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || {
                    for j in 0..PER_SENDER {
                        let packet = VersionPacket::new(i as i32, j as i32, 0);
                        channel.send(&Packet::from(packet)).unwrap();
                    }
                })
            })
            .collect();

        let mut raw = PacketReader::new(reader);
        let mut seen = vec![0usize; SENDERS];
        for _ in 0..SENDERS * PER_SENDER {
            let (header, payload) = raw.read_raw().unwrap();
            assert_eq!(header, PacketHeader::new(1, 16));

            let sender = i32::from_ne_bytes(payload[..4].try_into().unwrap()) as usize;
            let sequence = i32::from_ne_bytes(payload[4..8].try_into().unwrap()) as usize;
            assert_eq!(&payload[12..], &(-1i32).to_ne_bytes());
            assert_eq!(sequence, seen[sender], "frames from one sender stay ordered");
            seen[sender] += 1;
        }

        for sender in senders {
            sender.join().unwrap();
        }
        assert!(seen.iter().all(|n| *n == PER_SENDER));
    }

    #[test]
    fn concurrent_receivers_each_get_whole_packets() {
        const RECEIVERS: usize = 3;
        const PER_RECEIVER: usize = 300;
        let (reader, mut writer) = pipe().unwrap();
        let channel = Arc::new(IpcChannel::new(reader, std::io::sink()));

        let receivers: Vec<_> = (0..RECEIVERS)
            .map(|_| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || {
                    for _ in 0..PER_RECEIVER {
                        assert_eq!(channel.receive().unwrap().id(), 1);
                    }
                })
            })
            .collect();

        let mut wire = BytesMut::new();
        for _ in 0..RECEIVERS * PER_RECEIVER {
            wire.clear();
            encode_frame(&Packet::from(VersionPacket::current()), &mut wire).unwrap();
            writer.write_all(&wire).unwrap();
        }

        for receiver in receivers {
            receiver.join().unwrap();
        }
    }

    #[test]
    fn adopts_raw_descriptors() {
        use std::os::fd::IntoRawFd;

        let (read_a, write_a) = pipe().unwrap();
        let (read_b, write_b) = pipe().unwrap();

        // SAFETY: the raw descriptors come straight from `into_raw_fd`.
        let left = unsafe { IpcChannel::from_raw_fds(read_a.into_raw_fd(), write_b.into_raw_fd()) };
        let right = IpcChannel::new(read_b, write_a);

        left.send(&Packet::from(VersionPacket::current())).unwrap();
        assert_eq!(right.receive().unwrap().id(), 1);
        right.send(&Packet::from(VersionPacket::current())).unwrap();
        assert_eq!(left.receive().unwrap().id(), 1);
    }
}
