use bytes::{Bytes, BytesMut};

use crate::error::BufferError;

/// A fixed-capacity byte container with an absolute cursor.
///
/// Capacity is set at construction and never changes: writes do not grow the
/// buffer, and accesses that would cross the end fail without side effects.
/// Typed accessors use native byte order.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: BytesMut,
    pos: usize,
}

type Result<T> = std::result::Result<T, BufferError>;

macro_rules! typed_accessors {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            #[doc = concat!("Write a native-order `", stringify!($ty), "` at the cursor.")]
            pub fn $write(&mut self, value: $ty) -> Result<()> {
                self.write(&value.to_ne_bytes())
            }

            #[doc = concat!("Read a native-order `", stringify!($ty), "` at the cursor.")]
            pub fn $read(&mut self) -> Result<$ty> {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                self.read(&mut raw)?;
                Ok(<$ty>::from_ne_bytes(raw))
            }
        )*
    };
}

impl ByteBuffer {
    /// Create a zero-filled buffer of `capacity` bytes with the cursor at 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: BytesMut::zeroed(capacity),
            pos: 0,
        }
    }

    /// Create a buffer holding a copy of `bytes`, cursor at 0.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
            pos: 0,
        }
    }

    /// Total size of the buffer.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor to `position`, returning the previous position.
    pub fn set_position(&mut self, position: usize) -> Result<usize> {
        if position > self.capacity() {
            return Err(BufferError::PositionOutOfBounds {
                position,
                capacity: self.capacity(),
            });
        }
        Ok(std::mem::replace(&mut self.pos, position))
    }

    /// Bytes between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.pos
    }

    /// Copy `bytes` in at the cursor and advance past them.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.checked_end(bytes.len())?;
        self.data[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    /// Fill `out` from the cursor and advance past the copied bytes.
    pub fn read(&mut self, out: &mut [u8]) -> Result<()> {
        let end = self.checked_end(out.len())?;
        out.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    typed_accessors! {
        u8 => write_u8, read_u8;
        u16 => write_u16, read_u16;
        u32 => write_u32, read_u32;
        u64 => write_u64, read_u64;
        i8 => write_i8, read_i8;
        i16 => write_i16, read_i16;
        i32 => write_i32, read_i32;
        i64 => write_i64, read_i64;
    }

    /// The whole backing storage, independent of the cursor.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The bytes before the cursor.
    pub fn written(&self) -> &[u8] {
        &self.data[..self.pos]
    }

    /// Consume the buffer, keeping only the bytes before the cursor.
    pub fn freeze_written(mut self) -> Bytes {
        self.data.truncate(self.pos);
        self.data.freeze()
    }

    fn checked_end(&self, len: usize) -> Result<usize> {
        if len > self.remaining() {
            return Err(BufferError::Overflow {
                requested: len,
                remaining: self.remaining(),
            });
        }
        Ok(self.pos + len)
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(bytes: Bytes) -> Self {
        Self {
            data: BytesMut::from(bytes.as_ref()),
            pos: 0,
        }
    }
}
