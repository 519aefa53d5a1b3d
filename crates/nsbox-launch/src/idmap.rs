use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{LaunchError, Result};

const PROC_SELF: &str = "/proc/self";

/// Writes the uid/gid maps that make the caller root inside its user namespace.
#[derive(Debug, Clone)]
pub struct IdMapWriter {
    root: PathBuf,
}

impl IdMapWriter {
    /// Target `/proc/self`.
    pub fn new() -> Self {
        Self::with_root(PROC_SELF)
    }

    /// Target another directory holding `uid_map`, `setgroups` and `gid_map`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map namespace uid 0 to `uid` and gid 0 to `gid`.
    ///
    /// The kernel only accepts an unprivileged gid map once `setgroups` has
    /// been set to `deny`, so the writes happen in a fixed order: uid map,
    /// setgroups, gid map. The first failure stops the sequence.
    pub fn map_root(&self, uid: u32, gid: u32) -> Result<()> {
        self.write("uid_map", &format!("0 {uid} 1\n"))?;
        self.write("setgroups", "deny\n")?;
        self.write("gid_map", &format!("0 {gid} 1\n"))?;

        debug!(uid, gid, "mapped caller to namespace root");
        Ok(())
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.root.join(name);
        let result = OpenOptions::new()
            .write(true)
            .open(&path)
            .and_then(|mut file| file.write_all(contents.as_bytes()));

        result.map_err(|source| LaunchError::IdMap { path, source })
    }
}

impl Default for IdMapWriter {
    fn default() -> Self {
        Self::new()
    }
}
