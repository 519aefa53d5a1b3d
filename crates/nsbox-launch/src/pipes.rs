use nsbox_transport::{pipe, PipeReader, PipeWriter};

use crate::error::Result;

/// One role's pair of pipe ends.
#[derive(Debug)]
pub struct RoleEnds {
    pub read: PipeReader,
    pub write: PipeWriter,
}

/// Two pipes, A and B, wired crosswise between the parent and child roles.
///
/// The parent reads A and writes B; the child reads B and writes A.
#[derive(Debug)]
pub struct CrossedPipes {
    a: (PipeReader, PipeWriter),
    b: (PipeReader, PipeWriter),
}

impl CrossedPipes {
    pub fn new() -> Result<Self> {
        let a = pipe()?;
        let b = pipe()?;
        Ok(Self { a, b })
    }

    /// Split into `(parent, child)` ends.
    ///
    /// Each process drops the other role's ends right after the split so the
    /// peer sees EOF once the owning process exits.
    pub fn into_ends(self) -> (RoleEnds, RoleEnds) {
        let (read_a, write_a) = self.a;
        let (read_b, write_b) = self.b;
        (
            RoleEnds {
                read: read_a,
                write: write_b,
            },
            RoleEnds {
                read: read_b,
                write: write_a,
            },
        )
    }
}
