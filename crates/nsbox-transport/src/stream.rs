use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};

use tracing::debug;

use crate::error::{Result, TransportError};

/// Create a unidirectional pipe.
///
/// The descriptors are created without `O_CLOEXEC` so they survive an `exec`
/// into a guest program; ends a process does not own must be dropped explicitly.
pub fn pipe() -> Result<(PipeReader, PipeWriter)> {
    let mut fds = [0 as libc::c_int; 2];

    // SAFETY: `fds` is a valid, writable array of two `c_int` as `pipe(2)` requires.
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if rc != 0 {
        return Err(TransportError::Pipe(std::io::Error::last_os_error()));
    }

    // SAFETY: on success both descriptors are freshly opened and owned by nobody else.
    let (read, write) = unsafe { (PipeReader::from_raw_fd(fds[0]), PipeWriter::from_raw_fd(fds[1])) };
    debug!(read_fd = fds[0], write_fd = fds[1], "created pipe");
    Ok((read, write))
}

/// The read end of a pipe. Implements [`Read`].
pub struct PipeReader {
    inner: File,
}

/// The write end of a pipe. Implements [`Write`].
pub struct PipeWriter {
    inner: File,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

macro_rules! impl_fd_traits {
    ($ty:ident) => {
        impl $ty {
            /// Duplicate the underlying descriptor.
            pub fn try_clone(&self) -> Result<Self> {
                Ok(Self {
                    inner: self.inner.try_clone()?,
                })
            }
        }

        impl From<OwnedFd> for $ty {
            fn from(fd: OwnedFd) -> Self {
                Self {
                    inner: File::from(fd),
                }
            }
        }

        impl From<$ty> for OwnedFd {
            fn from(end: $ty) -> Self {
                OwnedFd::from(end.inner)
            }
        }

        impl FromRawFd for $ty {
            unsafe fn from_raw_fd(fd: RawFd) -> Self {
                Self {
                    inner: File::from_raw_fd(fd),
                }
            }
        }

        impl AsRawFd for $ty {
            fn as_raw_fd(&self) -> RawFd {
                self.inner.as_raw_fd()
            }
        }

        impl AsFd for $ty {
            fn as_fd(&self) -> BorrowedFd<'_> {
                self.inner.as_fd()
            }
        }

        impl IntoRawFd for $ty {
            fn into_raw_fd(self) -> RawFd {
                self.inner.into_raw_fd()
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("fd", &self.inner.as_raw_fd())
                    .finish()
            }
        }
    };
}

impl_fd_traits!(PipeReader);
impl_fd_traits!(PipeWriter);
