use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TransportError};

/// Read exactly `buf.len()` bytes (blocking).
///
/// Short and interrupted reads are retried. EOF before the buffer is full is
/// reported as [`TransportError::Closed`] with the number of bytes already read.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match reader.read(&mut buf[offset..]) {
            Ok(0) => {
                return Err(TransportError::Closed {
                    expected: buf.len(),
                    transferred: offset,
                })
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}

/// Write all of `buf` (blocking).
///
/// Short and interrupted writes are retried. A write that accepts zero bytes
/// means the peer is gone and is reported as [`TransportError::Closed`].
/// Descriptors must be blocking: `WouldBlock` is returned as an error, the
/// same as in [`read_full`].
pub fn write_full<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match writer.write(&buf[offset..]) {
            Ok(0) => {
                return Err(TransportError::Closed {
                    expected: buf.len(),
                    transferred: offset,
                })
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_exact_length_from_cursor() {
        let mut cursor = Cursor::new(b"abcdef".to_vec());
        let mut buf = [0u8; 4];
        read_full(&mut cursor, &mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn byte_by_byte_reader_is_reassembled() {
        let mut reader = ByteByByteReader {
            bytes: b"slow".to_vec(),
            pos: 0,
        };
        let mut buf = [0u8; 4];
        read_full(&mut reader, &mut buf).unwrap();
        assert_eq!(&buf, b"slow");
    }

    #[test]
    fn eof_reports_bytes_transferred() {
        let mut cursor = Cursor::new(b"ab".to_vec());
        let mut buf = [0u8; 8];
        let err = read_full(&mut cursor, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Closed {
                expected: 8,
                transferred: 2
            }
        ));
        assert!(!err.is_clean_close());
    }

    #[test]
    fn eof_before_any_byte_is_clean_close() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let mut buf = [0u8; 8];
        let err = read_full(&mut cursor, &mut buf).unwrap_err();
        assert!(err.is_clean_close());
    }

    #[test]
    fn interrupted_read_retries() {
        let mut reader = InterruptedOnce {
            fired: false,
            inner: Cursor::new(b"ok".to_vec()),
        };
        let mut buf = [0u8; 2];
        read_full(&mut reader, &mut buf).unwrap();
        assert_eq!(&buf, b"ok");
    }

    #[test]
    fn would_block_read_propagates() {
        let mut reader = WouldBlockReader;
        let mut buf = [0u8; 2];
        let err = read_full(&mut reader, &mut buf).unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = OneBytePerWrite { data: Vec::new() };
        write_full(&mut writer, b"partial").unwrap();
        assert_eq!(writer.data, b"partial");
    }

    #[test]
    fn would_block_write_propagates() {
        let err = write_full(&mut WouldBlockWriter, b"x").unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn zero_write_is_closed() {
        let err = write_full(&mut ZeroWriter, b"x").unwrap_err();
        assert!(matches!(
            err,
            TransportError::Closed {
                expected: 1,
                transferred: 0
            }
        ));
    }

    #[test]
    fn broken_pipe_is_io_error() {
        let (reader, mut writer) = crate::stream::pipe().unwrap();
        drop(reader);

        // SIGPIPE is ignored by the Rust runtime, so the write surfaces EPIPE.
        let err = write_full(&mut writer, b"lost").unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedOnce {
        fired: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.fired {
                self.fired = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct WouldBlockReader;

    impl Read for WouldBlockReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }

    struct OneBytePerWrite {
        data: Vec<u8>,
    }

    impl Write for OneBytePerWrite {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.data.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct WouldBlockWriter;

    impl Write for WouldBlockWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
