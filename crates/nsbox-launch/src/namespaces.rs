/// The namespaces the sandboxed child is cloned into.
///
/// The user namespace is not listed: the launcher always enters it first,
/// before the split, since it is what grants the right to create the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespaces {
    pub mount: bool,
    pub pid: bool,
    pub ipc: bool,
    pub net: bool,
    /// Off by default: a private hostname breaks X11 clients on the host display.
    pub uts: bool,
}

impl Namespaces {
    /// No namespaces beyond the user namespace.
    pub const fn none() -> Self {
        Self {
            mount: false,
            pid: false,
            ipc: false,
            net: false,
            uts: false,
        }
    }

    /// `CLONE_NEW*` flags for the enabled namespaces.
    pub fn clone_flags(&self) -> u64 {
        [
            (self.mount, libc::CLONE_NEWNS),
            (self.pid, libc::CLONE_NEWPID),
            (self.ipc, libc::CLONE_NEWIPC),
            (self.net, libc::CLONE_NEWNET),
            (self.uts, libc::CLONE_NEWUTS),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(0, |flags, (_, flag)| flags | flag as u64)
    }

    /// Short kernel names of the enabled namespaces, for logs and reports.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.mount, "mnt"),
            (self.pid, "pid"),
            (self.ipc, "ipc"),
            (self.net, "net"),
            (self.uts, "uts"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            mount: true,
            pid: true,
            ipc: true,
            net: true,
            uts: false,
        }
    }
}
